//! Typed allocation failures.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Machine-readable failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionKind {
	/// Line items mix cold and non-cold goods. Raised before allocation.
	MixedOrderNotAllowed,
	/// Order exceeds the strategy's single-unit ceiling.
	OrderTooHeavy,
	/// Not enough powered cold-capable capacity.
	NoColdStorage,
	/// Not enough powered capacity at all.
	NoCapacity,
	/// None of the above explains the failure.
	Unknown,
}

impl std::fmt::Display for RejectionKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let code = match self {
			Self::MixedOrderNotAllowed => "MIXED_ORDER_NOT_ALLOWED",
			Self::OrderTooHeavy => "ORDER_TOO_HEAVY",
			Self::NoColdStorage => "NO_COLD_STORAGE",
			Self::NoCapacity => "NO_CAPACITY",
			Self::Unknown => "UNKNOWN",
		};
		write!(f, "{}", code)
	}
}

/// Explained failure returned to the order originator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct RejectionReason {
	pub kind: RejectionKind,
	pub message: String,
	#[serde(default)]
	pub details: BTreeMap<String, Value>,
}

impl RejectionReason {
	pub fn new(kind: RejectionKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
			details: BTreeMap::new(),
		}
	}

	/// Adds a machine-readable detail entry.
	pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.details.insert(key.into(), value.into());
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rejection_wire_format() {
		let reason = RejectionReason::new(RejectionKind::OrderTooHeavy, "too heavy")
			.with_detail("total_weight_kg", 400.0)
			.with_detail("ceiling_kg", 350.0);

		let json = serde_json::to_value(&reason).unwrap();
		assert_eq!(json["kind"], "ORDER_TOO_HEAVY");
		assert_eq!(json["details"]["ceiling_kg"], 350.0);
		assert_eq!(reason.to_string(), "ORDER_TOO_HEAVY: too heavy");
	}
}
