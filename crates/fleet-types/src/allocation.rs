//! Allocation results produced by the strategies.

use crate::capacity::CapacityUnit;
use crate::lifecycle::{CompartmentEvent, TransitionError};
use crate::weight::{round_kg, WEIGHT_TOLERANCE_KG};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Temperature class an allocation was made under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureClass {
	/// Cold weight of a split order.
	Cold,
	/// Non-cold weight of a split order.
	NonCold,
	/// Whole non-cold order placed on a single unit.
	Standard,
}

impl TemperatureClass {
	pub fn is_cold(self) -> bool {
		matches!(self, Self::Cold)
	}
}

/// A (unit, weight, temperature class) binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
	pub unit_id: String,
	pub weight_kg: f64,
	pub temperature_class: TemperatureClass,
}

impl Allocation {
	pub fn new(unit_id: impl Into<String>, weight_kg: f64, temperature_class: TemperatureClass) -> Self {
		Self {
			unit_id: unit_id.into(),
			weight_kg: round_kg(weight_kg),
			temperature_class,
		}
	}
}

/// Errors raised when applying a plan to a unit snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommitError {
	#[error("Unit {0} is not part of the snapshot")]
	UnknownUnit(String),
	#[error("Unit {unit_id} has {residual_kg} kg left but the plan needs {requested_kg} kg")]
	Overdraw {
		unit_id: String,
		requested_kg: f64,
		residual_kg: f64,
	},
	#[error("Unit {unit_id}: {source}")]
	Lifecycle {
		unit_id: String,
		#[source]
		source: TransitionError,
	},
}

/// Successful outcome of one allocation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
	pub order_id: String,
	/// Name of the strategy that produced the plan.
	pub strategy: String,
	pub allocations: Vec<Allocation>,
}

impl AllocationPlan {
	pub fn total_weight_kg(&self) -> f64 {
		round_kg(self.allocations.iter().map(|a| a.weight_kg).sum())
	}

	/// Weight per unit, in first-touched order.
	pub fn weight_by_unit(&self) -> Vec<(String, f64)> {
		let mut totals: Vec<(String, f64)> = Vec::new();
		for allocation in &self.allocations {
			match totals.iter_mut().find(|(id, _)| *id == allocation.unit_id) {
				Some((_, kg)) => *kg = round_kg(*kg + allocation.weight_kg),
				None => totals.push((allocation.unit_id.clone(), allocation.weight_kg)),
			}
		}
		totals
	}

	/// Applies the plan to the caller's snapshot.
	///
	/// Decrements each touched unit's residual and moves it to `Assigned`.
	/// Everything is checked before the first mutation, so on error the
	/// slice is left as it was.
	pub fn commit(&self, units: &mut [CapacityUnit]) -> Result<(), CommitError> {
		let index: HashMap<&str, usize> = units
			.iter()
			.enumerate()
			.map(|(i, unit)| (unit.id.as_str(), i))
			.collect();

		let mut staged = Vec::new();
		for (unit_id, weight_kg) in self.weight_by_unit() {
			let &position = index
				.get(unit_id.as_str())
				.ok_or_else(|| CommitError::UnknownUnit(unit_id.clone()))?;
			let unit = &units[position];

			if weight_kg > unit.residual_kg + WEIGHT_TOLERANCE_KG {
				return Err(CommitError::Overdraw {
					unit_id,
					requested_kg: weight_kg,
					residual_kg: unit.residual_kg,
				});
			}

			let next_state = unit
				.state
				.transition(CompartmentEvent::Assign)
				.map_err(|source| CommitError::Lifecycle {
					unit_id: unit_id.clone(),
					source,
				})?;
			staged.push((position, weight_kg, next_state));
		}

		for (position, weight_kg, next_state) in staged {
			let unit = &mut units[position];
			unit.consume(weight_kg);
			unit.state = next_state;
		}

		Ok(())
	}
}
