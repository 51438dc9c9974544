//! Single-unit exact-fit strategy.
//!
//! Places the whole order on exactly one unit, choosing the largest eligible
//! unit so that small cold units stay free for later cold-only demand.

use fleet_types::{
	is_positive_kg, Allocation, CapacityUnit, ConfigSchema, Field, FieldType, OrderDemand, Schema,
	TemperatureClass, ValidationError,
};
use tracing::debug;

use crate::ordering::by_capacity_desc;
use crate::{AllocationError, AllocationStrategy};

/// Registry name of this strategy.
pub const NAME: &str = "single_unit";

/// Largest unit ever provisioned, in kilograms.
pub const DEFAULT_MAX_UNIT_CAPACITY_KG: f64 = 350.0;

/// Strategy that never splits an order.
pub struct SingleUnitStrategy {
	/// System-wide single-unit ceiling.
	max_unit_capacity_kg: f64,
}

impl SingleUnitStrategy {
	pub fn new(max_unit_capacity_kg: f64) -> Self {
		Self {
			max_unit_capacity_kg,
		}
	}
}

impl Default for SingleUnitStrategy {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_UNIT_CAPACITY_KG)
	}
}

/// Configuration schema for SingleUnitStrategy.
pub struct SingleUnitSchema;

impl ConfigSchema for SingleUnitSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![ceiling_field()]).strict().validate(config)
	}
}

/// Positive `max_unit_capacity_kg` field shared by all strategy schemas.
pub(crate) fn ceiling_field() -> Field {
	Field::new(
		"max_unit_capacity_kg",
		FieldType::Number {
			min: None,
			max: None,
		},
	)
	.with_validator(|value| {
		let kg = value
			.as_float()
			.or_else(|| value.as_integer().map(|i| i as f64))
			.unwrap_or_default();
		if kg > 0.0 {
			Ok(())
		} else {
			Err(format!("ceiling must be positive, got {}", kg))
		}
	})
}

/// Reads `max_unit_capacity_kg`, falling back to the default ceiling.
pub(crate) fn read_ceiling(config: &toml::Value) -> f64 {
	config
		.get("max_unit_capacity_kg")
		.and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
		.unwrap_or(DEFAULT_MAX_UNIT_CAPACITY_KG)
}

impl AllocationStrategy for SingleUnitStrategy {
	fn name(&self) -> &'static str {
		NAME
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(SingleUnitSchema)
	}

	fn capacity_ceiling_kg(&self) -> Option<f64> {
		Some(self.max_unit_capacity_kg)
	}

	fn splits_orders(&self) -> bool {
		false
	}

	fn fill(&self, order: &OrderDemand, working: &mut [CapacityUnit]) -> Option<Vec<Allocation>> {
		let weight = order.total_weight_kg;
		if weight > self.max_unit_capacity_kg {
			return None;
		}
		if !is_positive_kg(weight) {
			return Some(Vec::new());
		}

		let unit = working
			.iter()
			.filter(|u| u.can_take_whole(weight, order.requires_cold))
			.min_by(|a, b| by_capacity_desc(a, b))?;

		debug!(order_id = %order.id, unit_id = %unit.id, weight, "Selected single unit");

		let class = if order.requires_cold {
			TemperatureClass::Cold
		} else {
			TemperatureClass::Standard
		};
		Some(vec![Allocation::new(unit.id.clone(), weight, class)])
	}
}

/// Factory function to create the strategy from configuration.
///
/// Configuration parameters:
/// - `max_unit_capacity_kg`: single-unit ceiling (default: 350.0)
pub fn create_strategy(config: &toml::Value) -> Result<Box<dyn AllocationStrategy>, AllocationError> {
	SingleUnitSchema
		.validate(config)
		.map_err(|source| AllocationError::InvalidConfig {
			strategy: NAME.to_string(),
			source,
		})?;

	Ok(Box::new(SingleUnitStrategy::new(read_ceiling(config))))
}
