//! JSON report printed for each allocation call.

use fleet_allocation::IntakeError;
use fleet_types::{AllocationPlan, CapacityUnit, RejectionReason};
use serde::Serialize;

/// Outcome of one `allocate` invocation.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AllocationReport {
	Allocated {
		plan: AllocationPlan,
		/// Snapshot after the plan was committed, when requested.
		#[serde(skip_serializing_if = "Option::is_none")]
		units: Option<Vec<CapacityUnit>>,
	},
	Rejected {
		reason: RejectionReason,
	},
	Invalid {
		error: String,
	},
}

impl AllocationReport {
	pub fn from_result(order_id: &str, result: Result<AllocationPlan, IntakeError>) -> Self {
		match result {
			Ok(plan) => Self::Allocated { plan, units: None },
			Err(IntakeError::Rejected(reason)) => Self::Rejected { reason },
			Err(e) => Self::Invalid {
				error: format!("Order {}: {}", order_id, e),
			},
		}
	}

	pub fn is_allocated(&self) -> bool {
		matches!(self, Self::Allocated { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use fleet_allocation::CompositionError;
	use fleet_types::RejectionKind;

	#[test]
	fn test_report_shapes() {
		let report = AllocationReport::from_result(
			"o",
			Ok(AllocationPlan {
				order_id: "o".to_string(),
				strategy: "single_unit".to_string(),
				allocations: vec![],
			}),
		);
		let json = serde_json::to_value(&report).unwrap();
		assert_eq!(json["status"], "allocated");
		assert!(json.get("units").is_none());
		assert!(report.is_allocated());

		let report = AllocationReport::from_result(
			"o",
			Err(IntakeError::Rejected(RejectionReason::new(
				RejectionKind::NoCapacity,
				"full",
			))),
		);
		let json = serde_json::to_value(&report).unwrap();
		assert_eq!(json["status"], "rejected");
		assert_eq!(json["reason"]["kind"], "NO_CAPACITY");

		let report =
			AllocationReport::from_result("o", Err(IntakeError::Composition(CompositionError::Empty)));
		let json = serde_json::to_value(&report).unwrap();
		assert_eq!(json["status"], "invalid");
		assert_eq!(json["error"], "Order o: Invalid order: Order has no line items");
	}
}
