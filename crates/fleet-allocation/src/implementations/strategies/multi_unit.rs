//! Multi-unit split strategy.
//!
//! Partitions an order's cold and non-cold weight across as many units as
//! needed. Cold weight is placed first, always on the cold-capable unit with
//! the largest residual. Non-cold weight follows and may use any unit,
//! including whatever cold capacity is left over.

use fleet_types::{
	is_positive_kg, round_kg, Allocation, CapacityUnit, ConfigSchema, Field, FieldType, OrderDemand,
	Schema, TemperatureClass, ValidationError,
};
use tracing::debug;

use super::single_unit::{ceiling_field, read_ceiling};
use crate::ordering::by_residual_desc;
use crate::{AllocationError, AllocationStrategy};

/// Registry name of this strategy.
pub const NAME: &str = "multi_unit";

/// Strategy that splits orders across units, revisiting a unit across
/// phases when it still has room.
pub struct MultiUnitStrategy {
	ceiling_kg: Option<f64>,
}

impl MultiUnitStrategy {
	/// `ceiling_kg` is only enforced when set.
	pub fn new(ceiling_kg: Option<f64>) -> Self {
		Self { ceiling_kg }
	}
}

/// Configuration schema shared by the split strategies.
pub struct SplitStrategySchema;

impl ConfigSchema for SplitStrategySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(
			vec![],
			vec![
				Field::new("enforce_unit_ceiling", FieldType::Boolean),
				ceiling_field(),
			],
		)
		.strict()
		.validate(config)
	}
}

/// Resolves the optional ceiling of a split strategy from its table.
pub(crate) fn split_ceiling(strategy: &str, config: &toml::Value) -> Result<Option<f64>, AllocationError> {
	SplitStrategySchema
		.validate(config)
		.map_err(|source| AllocationError::InvalidConfig {
			strategy: strategy.to_string(),
			source,
		})?;

	let enforce = config
		.get("enforce_unit_ceiling")
		.and_then(|v| v.as_bool())
		.unwrap_or(false);

	Ok(enforce.then(|| read_ceiling(config)))
}

/// Repeatedly places `remaining` on the eligible unit with the largest
/// residual until it is covered or no eligible unit has room.
///
/// Returns the weight left unplaced.
fn drain(
	working: &mut [CapacityUnit],
	mut remaining: f64,
	class: TemperatureClass,
	eligible: impl Fn(&CapacityUnit) -> bool,
	allocations: &mut Vec<Allocation>,
) -> f64 {
	while is_positive_kg(remaining) {
		let Some(unit) = working
			.iter_mut()
			.filter(|u| u.has_room() && eligible(u))
			.min_by(|a, b| by_residual_desc(a, b))
		else {
			break;
		};

		let take = round_kg(remaining.min(unit.residual_kg));
		unit.consume(take);
		remaining = round_kg(remaining - take);

		debug!(unit_id = %unit.id, take, remaining, ?class, "Placed split weight");
		allocations.push(Allocation::new(unit.id.clone(), take, class));
	}

	remaining
}

impl AllocationStrategy for MultiUnitStrategy {
	fn name(&self) -> &'static str {
		NAME
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(SplitStrategySchema)
	}

	fn capacity_ceiling_kg(&self) -> Option<f64> {
		self.ceiling_kg
	}

	fn splits_orders(&self) -> bool {
		true
	}

	fn fill(&self, order: &OrderDemand, working: &mut [CapacityUnit]) -> Option<Vec<Allocation>> {
		let mut allocations = Vec::new();

		let cold_left = drain(
			working,
			order.cold_weight_kg,
			TemperatureClass::Cold,
			|u| u.is_cold_capable,
			&mut allocations,
		);
		if is_positive_kg(cold_left) {
			debug!(order_id = %order.id, cold_left, "Cold weight could not be placed");
			return None;
		}

		let non_cold_left = drain(
			working,
			order.non_cold_weight_kg,
			TemperatureClass::NonCold,
			|_| true,
			&mut allocations,
		);
		if is_positive_kg(round_kg(cold_left + non_cold_left)) {
			debug!(order_id = %order.id, non_cold_left, "Non-cold weight could not be placed");
			return None;
		}

		Some(allocations)
	}
}

/// Factory function to create the strategy from configuration.
///
/// Configuration parameters:
/// - `enforce_unit_ceiling`: reject orders above the single-unit ceiling (default: false)
/// - `max_unit_capacity_kg`: the ceiling used when enforced (default: 350.0)
pub fn create_strategy(config: &toml::Value) -> Result<Box<dyn AllocationStrategy>, AllocationError> {
	Ok(Box::new(MultiUnitStrategy::new(split_ceiling(NAME, config)?)))
}
