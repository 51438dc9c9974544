//! Order demand: the weight and temperature requirement of one order.

use crate::weight::{approx_eq_kg, is_positive_kg, round_kg};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when an order demand breaks its invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DemandError {
	/// A weight is negative, NaN or infinite.
	#[error("Invalid weight for field '{field}': {value}")]
	InvalidWeight { field: &'static str, value: f64 },
	/// The cold and non-cold parts do not add up to the total.
	#[error("Cold ({cold}) and non-cold ({non_cold}) weights do not sum to total ({total})")]
	WeightMismatch { total: f64, cold: f64, non_cold: f64 },
	/// `requires_cold` disagrees with the cold sub-weight.
	#[error("requires_cold is {requires_cold} but cold weight is {cold}")]
	ColdFlagMismatch { requires_cold: bool, cold: f64 },
}

/// Weight and temperature requirement derived from a customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDemand {
	pub id: String,
	pub total_weight_kg: f64,
	pub requires_cold: bool,
	pub cold_weight_kg: f64,
	pub non_cold_weight_kg: f64,
}

impl OrderDemand {
	/// Creates a temperature-homogeneous demand.
	pub fn new(id: impl Into<String>, total_weight_kg: f64, requires_cold: bool) -> Self {
		let total_weight_kg = round_kg(total_weight_kg);
		let (cold_weight_kg, non_cold_weight_kg) = if requires_cold {
			(total_weight_kg, 0.0)
		} else {
			(0.0, total_weight_kg)
		};

		Self {
			id: id.into(),
			total_weight_kg,
			requires_cold,
			cold_weight_kg,
			non_cold_weight_kg,
		}
	}

	/// Creates a demand with independent cold and non-cold parts.
	pub fn split(id: impl Into<String>, cold_weight_kg: f64, non_cold_weight_kg: f64) -> Self {
		let cold_weight_kg = round_kg(cold_weight_kg);
		let non_cold_weight_kg = round_kg(non_cold_weight_kg);

		Self {
			id: id.into(),
			total_weight_kg: round_kg(cold_weight_kg + non_cold_weight_kg),
			requires_cold: is_positive_kg(cold_weight_kg),
			cold_weight_kg,
			non_cold_weight_kg,
		}
	}

	/// Whether the order carries both cold and non-cold weight.
	pub fn is_mixed(&self) -> bool {
		is_positive_kg(self.cold_weight_kg) && is_positive_kg(self.non_cold_weight_kg)
	}

	/// Checks the weight invariants.
	pub fn validate(&self) -> Result<(), DemandError> {
		for (field, value) in [
			("total_weight_kg", self.total_weight_kg),
			("cold_weight_kg", self.cold_weight_kg),
			("non_cold_weight_kg", self.non_cold_weight_kg),
		] {
			if !value.is_finite() || value < 0.0 {
				return Err(DemandError::InvalidWeight { field, value });
			}
		}

		if !approx_eq_kg(
			self.cold_weight_kg + self.non_cold_weight_kg,
			self.total_weight_kg,
		) {
			return Err(DemandError::WeightMismatch {
				total: self.total_weight_kg,
				cold: self.cold_weight_kg,
				non_cold: self.non_cold_weight_kg,
			});
		}

		if self.requires_cold != is_positive_kg(self.cold_weight_kg) {
			return Err(DemandError::ColdFlagMismatch {
				requires_cold: self.requires_cold,
				cold: self.cold_weight_kg,
			});
		}

		Ok(())
	}
}

/// One named line of a customer order, already resolved from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
	pub sku: String,
	pub quantity: u32,
	pub unit_weight_kg: f64,
	#[serde(default)]
	pub requires_cold: bool,
}

impl LineItem {
	pub fn new(sku: impl Into<String>, quantity: u32, unit_weight_kg: f64, requires_cold: bool) -> Self {
		Self {
			sku: sku.into(),
			quantity,
			unit_weight_kg,
			requires_cold,
		}
	}

	/// Total weight of the line.
	pub fn weight_kg(&self) -> f64 {
		round_kg(self.unit_weight_kg * f64::from(self.quantity))
	}
}
