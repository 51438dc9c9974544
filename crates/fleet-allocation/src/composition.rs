//! Order composition: turns catalog-resolved line items into a demand.
//!
//! This is the gate in front of every strategy. Orders that mix cold and
//! non-cold goods are refused here unless the policy explicitly allows them.

use fleet_types::{round_kg, LineItem, OrderDemand, RejectionKind, RejectionReason};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Business rules applied while composing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompositionPolicy {
	/// Accept orders whose items mix cold and non-cold goods.
	#[serde(default)]
	pub allow_mixed_temperature: bool,
}

/// Errors that can occur while composing an order.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompositionError {
	#[error("Order has no line items")]
	Empty,
	#[error("Line item '{sku}' is invalid: {reason}")]
	InvalidItem { sku: String, reason: String },
	#[error("Order mixes cold items {cold:?} with non-cold items {non_cold:?}")]
	MixedTemperature {
		cold: Vec<String>,
		non_cold: Vec<String>,
	},
}

impl CompositionError {
	/// Converts the error into the rejection surfaced to the originator.
	pub fn to_rejection(&self, order_id: &str) -> RejectionReason {
		let kind = match self {
			Self::MixedTemperature { .. } => RejectionKind::MixedOrderNotAllowed,
			_ => RejectionKind::Unknown,
		};
		let reason = RejectionReason::new(kind, self.to_string()).with_detail("order_id", order_id);

		match self {
			Self::MixedTemperature { cold, non_cold } => reason
				.with_detail("cold_items", cold.clone())
				.with_detail("non_cold_items", non_cold.clone()),
			_ => reason,
		}
	}
}

/// Builds an [`OrderDemand`] from line items.
pub fn compose_demand(
	order_id: &str,
	items: &[LineItem],
	policy: &CompositionPolicy,
) -> Result<OrderDemand, CompositionError> {
	if items.is_empty() {
		return Err(CompositionError::Empty);
	}

	let mut cold_kg = 0.0;
	let mut non_cold_kg = 0.0;
	let mut cold = Vec::new();
	let mut non_cold = Vec::new();

	for item in items {
		if item.quantity == 0 {
			return Err(CompositionError::InvalidItem {
				sku: item.sku.clone(),
				reason: "quantity must be at least 1".to_string(),
			});
		}
		if !item.unit_weight_kg.is_finite() || item.unit_weight_kg <= 0.0 {
			return Err(CompositionError::InvalidItem {
				sku: item.sku.clone(),
				reason: format!("unit weight {} is not positive", item.unit_weight_kg),
			});
		}

		if item.requires_cold {
			cold_kg = round_kg(cold_kg + item.weight_kg());
			cold.push(item.sku.clone());
		} else {
			non_cold_kg = round_kg(non_cold_kg + item.weight_kg());
			non_cold.push(item.sku.clone());
		}
	}

	if !cold.is_empty() && !non_cold.is_empty() && !policy.allow_mixed_temperature {
		return Err(CompositionError::MixedTemperature { cold, non_cold });
	}

	Ok(OrderDemand::split(order_id, cold_kg, non_cold_kg))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_homogeneous_orders() {
		let items = vec![
			LineItem::new("yoghurt", 10, 0.5, true),
			LineItem::new("cheese", 3, 1.2, true),
		];
		let demand = compose_demand("o-1", &items, &CompositionPolicy::default()).unwrap();
		assert_eq!(demand.total_weight_kg, 8.6);
		assert_eq!(demand.cold_weight_kg, 8.6);
		assert!(demand.requires_cold);
		assert!(demand.validate().is_ok());

		let items = vec![LineItem::new("flour", 4, 2.5, false)];
		let demand = compose_demand("o-2", &items, &CompositionPolicy::default()).unwrap();
		assert_eq!(demand, OrderDemand::new("o-2", 10.0, false));
	}

	#[test]
	fn test_mixed_order_rejected_by_default() {
		let items = vec![
			LineItem::new("fish", 1, 3.0, true),
			LineItem::new("bread", 2, 0.8, false),
		];
		let err = compose_demand("o-3", &items, &CompositionPolicy::default()).unwrap_err();

		let reason = err.to_rejection("o-3");
		assert_eq!(reason.kind, RejectionKind::MixedOrderNotAllowed);
		assert_eq!(reason.details["cold_items"][0], "fish");
		assert_eq!(reason.details["non_cold_items"][0], "bread");
	}

	#[test]
	fn test_mixed_order_allowed_by_policy() {
		let items = vec![
			LineItem::new("fish", 1, 3.0, true),
			LineItem::new("bread", 2, 0.8, false),
		];
		let policy = CompositionPolicy {
			allow_mixed_temperature: true,
		};
		let demand = compose_demand("o-4", &items, &policy).unwrap();
		assert_eq!(demand.cold_weight_kg, 3.0);
		assert_eq!(demand.non_cold_weight_kg, 1.6);
		assert_eq!(demand.total_weight_kg, 4.6);
	}

	#[test]
	fn test_invalid_items() {
		let policy = CompositionPolicy::default();
		assert_eq!(compose_demand("o", &[], &policy), Err(CompositionError::Empty));

		let items = vec![LineItem::new("ghost", 0, 1.0, false)];
		assert!(matches!(
			compose_demand("o", &items, &policy),
			Err(CompositionError::InvalidItem { .. })
		));

		let items = vec![LineItem::new("feather", 1, -0.1, false)];
		assert!(matches!(
			compose_demand("o", &items, &policy),
			Err(CompositionError::InvalidItem { .. })
		));
	}
}
