//! Phased dynamic strategy.
//!
//! Works over two pools partitioned and sorted once up front: cold-capable
//! units and standard units, each by descending capacity. Cold weight drains
//! the cold pool; non-cold weight then drains the rest of the cold pool
//! followed by the standard pool. A unit is used at most once per order and
//! leaves its pool as soon as it receives any weight.

use fleet_types::{
	is_positive_kg, round_kg, Allocation, CapacityUnit, ConfigSchema, OrderDemand, TemperatureClass,
};
use tracing::debug;

use super::multi_unit::{split_ceiling, SplitStrategySchema};
use crate::ordering::by_capacity_desc;
use crate::{AllocationError, AllocationStrategy};

/// Registry name of this strategy.
pub const NAME: &str = "phased";

/// Two-pass, pre-sorted variant of the split strategy.
pub struct PhasedStrategy {
	ceiling_kg: Option<f64>,
}

impl PhasedStrategy {
	/// `ceiling_kg` is only enforced when set.
	pub fn new(ceiling_kg: Option<f64>) -> Self {
		Self { ceiling_kg }
	}
}

/// Places weight on successive units of `pool`, one allocation per unit.
/// Returns the weight left unplaced.
fn drain_pool<'a>(
	pool: &mut impl Iterator<Item = &'a mut CapacityUnit>,
	mut remaining: f64,
	class: TemperatureClass,
	allocations: &mut Vec<Allocation>,
) -> f64 {
	while is_positive_kg(remaining) {
		let Some(unit) = pool.next() else {
			break;
		};

		let take = round_kg(remaining.min(unit.residual_kg));
		unit.consume(take);
		remaining = round_kg(remaining - take);
		allocations.push(Allocation::new(unit.id.clone(), take, class));
	}

	remaining
}

impl AllocationStrategy for PhasedStrategy {
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
		let (mut cold_pool, mut standard_pool): (Vec<_>, Vec<_>) = working
			.iter_mut()
			.filter(|u| u.has_room())
			.partition(|u| u.is_cold_capable);
		cold_pool.sort_by(|a, b| by_capacity_desc(a, b));
		standard_pool.sort_by(|a, b| by_capacity_desc(a, b));

		let mut allocations = Vec::new();
		let mut cold_pool = cold_pool.into_iter();

		let cold_left = drain_pool(
			&mut cold_pool,
			order.cold_weight_kg,
			TemperatureClass::Cold,
			&mut allocations,
		);
		if is_positive_kg(cold_left) {
			debug!(order_id = %order.id, cold_left, "Cold pool exhausted");
			return None;
		}

		let mut merged = cold_pool.chain(standard_pool);
		let non_cold_left = drain_pool(
			&mut merged,
			order.non_cold_weight_kg,
			TemperatureClass::NonCold,
			&mut allocations,
		);
		if is_positive_kg(round_kg(cold_left + non_cold_left)) {
			debug!(order_id = %order.id, non_cold_left, "Merged pools exhausted");
			return None;
		}

		Some(allocations)
	}
}

/// Factory function to create the strategy from configuration.
///
/// Accepts the same parameters as the multi-unit strategy.
pub fn create_strategy(config: &toml::Value) -> Result<Box<dyn AllocationStrategy>, AllocationError> {
	Ok(Box::new(PhasedStrategy::new(split_ceiling(NAME, config)?)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use fleet_types::RejectionKind;

	fn depot() -> Vec<CapacityUnit> {
		vec![
			CapacityUnit::new("cold-5", 5.0, true, true),
			CapacityUnit::new("cold-8", 8.0, true, true),
			CapacityUnit::new("dry-12", 12.0, false, true),
		]
	}

	#[test]
	fn test_cold_then_merged_pools() {
		let plan = PhasedStrategy::new(None)
			.allocate(&OrderDemand::split("o", 6.0, 10.0), &depot())
			.unwrap();

		// cold-8 leaves the pool after the cold pass; the merged pass starts
		// with the remaining cold unit before the standard pool
		assert_eq!(
			plan.allocations,
			vec![
				Allocation::new("cold-8", 6.0, TemperatureClass::Cold),
				Allocation::new("cold-5", 5.0, TemperatureClass::NonCold),
				Allocation::new("dry-12", 5.0, TemperatureClass::NonCold),
			]
		);
	}

	#[test]
	fn test_unit_used_once_per_order() {
		let plan = PhasedStrategy::new(None)
			.allocate(&OrderDemand::split("o", 10.0, 8.0), &depot())
			.unwrap();

		assert_eq!(
			plan.allocations,
			vec![
				Allocation::new("cold-8", 8.0, TemperatureClass::Cold),
				Allocation::new("cold-5", 2.0, TemperatureClass::Cold),
				Allocation::new("dry-12", 8.0, TemperatureClass::NonCold),
			]
		);
		let touched = plan.weight_by_unit();
		assert_eq!(touched.len(), plan.allocations.len());
	}

	#[test]
	fn test_pools_sorted_by_capacity_not_residual() {
		let units = vec![
			CapacityUnit::new("big-half-full", 20.0, false, true).with_residual(4.0),
			CapacityUnit::new("small-empty", 10.0, false, true),
		];
		let plan = PhasedStrategy::new(None)
			.allocate(&OrderDemand::new("o", 9.0, false), &units)
			.unwrap();

		assert_eq!(plan.allocations[0], Allocation::new("big-half-full", 4.0, TemperatureClass::NonCold));
		assert_eq!(plan.allocations[1], Allocation::new("small-empty", 5.0, TemperatureClass::NonCold));
	}

	#[test]
	fn test_scenario_b_cold_shortfall() {
		let reason = PhasedStrategy::new(None)
			.allocate(&OrderDemand::split("o", 18.0, 0.0), &depot())
			.unwrap_err();
		assert_eq!(reason.kind, RejectionKind::NoColdStorage);
	}

	#[test]
	fn test_sub_tolerance_remainders_add_up() {
		// each part is within tolerance on its own, together they are not
		let units = vec![CapacityUnit::new("cold-10", 10.0, true, true)];
		let order = OrderDemand::split("o", 0.01, 0.01);
		let strategy = PhasedStrategy::new(None);

		let mut working = units.clone();
		assert!(strategy.fill(&order, &mut working).is_none());
		assert!(strategy.allocate(&order, &units).is_err());
	}

	#[test]
	fn test_fragmentation_is_unclassified() {
		// the partially used cold-5 leaves the pool with 3 kg unused, so the
		// pooled capacity checks pass while the strategy fails
		let units = vec![
			CapacityUnit::new("cold-5", 5.0, true, true),
			CapacityUnit::new("cold-8", 8.0, true, true),
			CapacityUnit::new("dry-3", 3.0, false, true),
		];
		let order = OrderDemand::split("o", 10.0, 5.0);

		assert!(crate::implementations::strategies::multi_unit::MultiUnitStrategy::new(None)
			.allocate(&order, &units)
			.is_ok());

		let reason = PhasedStrategy::new(None).allocate(&order, &units).unwrap_err();
		assert_eq!(reason.kind, RejectionKind::Unknown);
	}
}
