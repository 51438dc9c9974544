//! Capacity units: vehicle and compartment pairs offered to the engine.

use crate::lifecycle::{CompartmentEvent, CompartmentState, TransitionError};
use crate::weight::{is_positive_kg, round_kg};
use serde::{Deserialize, Serialize};

/// An available vehicle + compartment pair.
///
/// `residual_kg` starts equal to `capacity_kg` and is only ever decreased
/// by allocations. It never goes negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CapacityUnitRecord")]
pub struct CapacityUnit {
	pub id: String,
	pub capacity_kg: f64,
	pub is_cold_capable: bool,
	/// Charge / availability gate for the vehicle.
	pub is_powered: bool,
	pub residual_kg: f64,
	pub state: CompartmentState,
}

/// Wire form of a unit snapshot. `residual_kg` may be omitted, in which
/// case the unit is treated as empty.
#[derive(Deserialize)]
struct CapacityUnitRecord {
	id: String,
	capacity_kg: f64,
	#[serde(default)]
	is_cold_capable: bool,
	#[serde(default = "default_powered")]
	is_powered: bool,
	residual_kg: Option<f64>,
	#[serde(default)]
	state: CompartmentState,
}

fn default_powered() -> bool {
	true
}

impl From<CapacityUnitRecord> for CapacityUnit {
	fn from(record: CapacityUnitRecord) -> Self {
		let capacity_kg = record.capacity_kg.max(0.0);
		let residual_kg = record
			.residual_kg
			.unwrap_or(capacity_kg)
			.clamp(0.0, capacity_kg);

		Self {
			id: record.id,
			capacity_kg,
			is_cold_capable: record.is_cold_capable,
			is_powered: record.is_powered,
			residual_kg: round_kg(residual_kg),
			state: record.state,
		}
	}
}

impl CapacityUnit {
	/// Creates an empty, available unit.
	pub fn new(
		id: impl Into<String>,
		capacity_kg: f64,
		is_cold_capable: bool,
		is_powered: bool,
	) -> Self {
		Self {
			id: id.into(),
			capacity_kg,
			is_cold_capable,
			is_powered,
			residual_kg: capacity_kg,
			state: CompartmentState::Available,
		}
	}

	pub fn with_residual(mut self, residual_kg: f64) -> Self {
		self.residual_kg = round_kg(residual_kg.clamp(0.0, self.capacity_kg));
		self
	}

	pub fn with_state(mut self, state: CompartmentState) -> Self {
		self.state = state;
		self
	}

	/// Powered and in a lifecycle state that takes cargo.
	pub fn is_available(&self) -> bool {
		self.is_powered && self.state.accepts_cargo()
	}

	/// Available with a non-negligible residual.
	pub fn has_room(&self) -> bool {
		self.is_available() && is_positive_kg(self.residual_kg)
	}

	/// Available and able to take `weight_kg` in one piece.
	pub fn can_take_whole(&self, weight_kg: f64, requires_cold: bool) -> bool {
		self.is_available()
			&& self.residual_kg >= weight_kg
			&& (!requires_cold || self.is_cold_capable)
	}

	/// Removes `weight_kg` from the residual. Clamps at zero.
	pub fn consume(&mut self, weight_kg: f64) {
		self.residual_kg = round_kg((self.residual_kg - weight_kg).max(0.0));
	}

	/// Drives the compartment lifecycle.
	///
	/// A released compartment is empty again, so returning to `Available`
	/// restores the full capacity. The unit is left untouched on error.
	pub fn apply(&mut self, event: CompartmentEvent) -> Result<(), TransitionError> {
		let next = self.state.transition(event)?;
		if next == CompartmentState::Available {
			self.residual_kg = self.capacity_kg;
		}
		self.state = next;
		Ok(())
	}
}
