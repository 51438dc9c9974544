//! Allocation engine for the fleet allocator.
//!
//! Matches one or more capacity units to an order under weight, temperature
//! and availability constraints. Strategies are interchangeable
//! implementations of [`AllocationStrategy`], selected by name through the
//! [`StrategyRegistry`]. The engine performs no I/O and never mutates the
//! caller's unit snapshot: every call works on an owned copy, and the caller
//! commits a successful plan with [`AllocationPlan::commit`].

use fleet_types::{
	approx_eq_kg, round_kg, Allocation, AllocationPlan, CapacityUnit, ConfigSchema, DemandError, LineItem,
	OrderDemand, RejectionKind, RejectionReason, ValidationError, WEIGHT_TOLERANCE_KG,
};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub mod composition;
pub mod diagnostics;
pub mod registry;

mod ordering;

/// Re-export implementations
pub mod implementations {
	pub mod strategies {
		pub mod multi_unit;
		pub mod phased;
		pub mod single_unit;
	}
}

pub use composition::{compose_demand, CompositionError, CompositionPolicy};
pub use diagnostics::{diagnose, DiagnosticContext};
pub use registry::{StrategyFactory, StrategyRegistry};

/// Errors that can occur while building strategies.
#[derive(Debug, Error)]
pub enum AllocationError {
	/// No factory is registered under the requested name.
	#[error("Unknown allocation strategy: {0}")]
	UnknownStrategy(String),
	/// The strategy's configuration table failed schema validation.
	#[error("Invalid configuration for strategy '{strategy}': {source}")]
	InvalidConfig {
		strategy: String,
		#[source]
		source: ValidationError,
	},
}

/// Errors surfaced by [`AllocationService`] for one order.
#[derive(Debug, Error)]
pub enum IntakeError {
	/// The order is well formed but cannot be served.
	#[error(transparent)]
	Rejected(#[from] RejectionReason),
	/// The line items could not be turned into a demand.
	#[error("Invalid order: {0}")]
	Composition(#[from] CompositionError),
	/// The demand breaks its weight invariants.
	#[error("Invalid order demand: {0}")]
	Demand(#[from] DemandError),
}

/// Trait defining the interface for allocation strategies.
///
/// Implementations only provide [`fill`](AllocationStrategy::fill); the
/// provided [`allocate`](AllocationStrategy::allocate) wraps it with the
/// copy-on-call, ceiling, verification and diagnostics steps shared by
/// every strategy.
pub trait AllocationStrategy: Send + Sync {
	/// Registry name of the strategy.
	fn name(&self) -> &'static str;

	/// Returns the configuration schema for this strategy.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Largest weight this strategy will place for one order, if any.
	///
	/// Used both as a pre-check and by the `ORDER_TOO_HEAVY` diagnostic.
	fn capacity_ceiling_kg(&self) -> Option<f64>;

	/// Whether the strategy may split an order across several units.
	fn splits_orders(&self) -> bool;

	/// Computes allocations over a working copy of the snapshot.
	///
	/// May mutate `working` freely. Returns `None` when the order cannot be
	/// fully served.
	fn fill(&self, order: &OrderDemand, working: &mut [CapacityUnit]) -> Option<Vec<Allocation>>;

	/// Allocates an order against a unit snapshot.
	///
	/// The snapshot is never mutated. On failure the rejection is classified
	/// against the snapshot as it was passed in.
	fn allocate(
		&self,
		order: &OrderDemand,
		units: &[CapacityUnit],
	) -> Result<AllocationPlan, RejectionReason> {
		if let Err(e) = order.validate() {
			return Err(RejectionReason::new(
				RejectionKind::Unknown,
				format!("Order {} has an invalid demand: {}", order.id, e),
			)
			.with_detail("order_id", order.id.clone()));
		}

		let context = DiagnosticContext {
			ceiling_kg: self.capacity_ceiling_kg(),
			splits_orders: self.splits_orders(),
		};

		let within_ceiling = context
			.ceiling_kg
			.map_or(true, |ceiling| order.total_weight_kg <= ceiling);

		if within_ceiling {
			let mut working = units.to_vec();
			if let Some(allocations) = self.fill(order, &mut working) {
				let plan = AllocationPlan {
					order_id: order.id.clone(),
					strategy: self.name().to_string(),
					allocations,
				};
				return match verify_plan(order, units, &plan) {
					Ok(()) => Ok(plan),
					Err(defect) => {
						error!(
							order_id = %order.id,
							strategy = self.name(),
							"Allocation plan failed verification: {}",
							defect
						);
						Err(RejectionReason::new(RejectionKind::Unknown, defect)
							.with_detail("order_id", order.id.clone())
							.with_detail("strategy", self.name()))
					}
				};
			}
		}

		Err(diagnose(order, units, &context).with_detail("strategy", self.name()))
	}
}

/// Checks completeness, capacity and temperature safety of a plan.
fn verify_plan(
	order: &OrderDemand,
	units: &[CapacityUnit],
	plan: &AllocationPlan,
) -> Result<(), String> {
	let total = plan.total_weight_kg();
	if !approx_eq_kg(total, order.total_weight_kg) {
		return Err(format!(
			"Allocated {} kg for an order of {} kg",
			total, order.total_weight_kg
		));
	}

	let cold: f64 = round_kg(
		plan.allocations
			.iter()
			.filter(|a| a.temperature_class.is_cold())
			.map(|a| a.weight_kg)
			.sum(),
	);
	if order.requires_cold && cold + WEIGHT_TOLERANCE_KG < order.cold_weight_kg {
		return Err(format!(
			"Only {} kg of {} kg cold weight placed under cold",
			cold, order.cold_weight_kg
		));
	}

	let by_id: HashMap<&str, &CapacityUnit> = units.iter().map(|u| (u.id.as_str(), u)).collect();
	for allocation in &plan.allocations {
		let unit = by_id
			.get(allocation.unit_id.as_str())
			.ok_or_else(|| format!("Unit {} is not in the snapshot", allocation.unit_id))?;
		if allocation.temperature_class.is_cold() && !unit.is_cold_capable {
			return Err(format!("Cold weight placed on non-cold unit {}", unit.id));
		}
	}

	for (unit_id, weight_kg) in plan.weight_by_unit() {
		if let Some(unit) = by_id.get(unit_id.as_str()) {
			if weight_kg > unit.residual_kg + WEIGHT_TOLERANCE_KG {
				return Err(format!(
					"Unit {} given {} kg with only {} kg residual",
					unit_id, weight_kg, unit.residual_kg
				));
			}
		}
	}

	Ok(())
}

/// Service that applies the configured strategy to incoming orders.
///
/// Holds no unit state between calls. Callers must serialise allocation
/// decisions per unit and pass a fresh snapshot each time.
pub struct AllocationService {
	/// The strategy used for every order.
	strategy: Box<dyn AllocationStrategy>,
	/// Upstream composition rules for line-item orders.
	policy: CompositionPolicy,
}

impl AllocationService {
	/// Creates a new AllocationService with the given strategy and policy.
	pub fn new(strategy: Box<dyn AllocationStrategy>, policy: CompositionPolicy) -> Self {
		Self { strategy, policy }
	}

	/// Name of the strategy in use.
	pub fn strategy_name(&self) -> &'static str {
		self.strategy.name()
	}

	/// Allocates a resolved order demand.
	pub fn allocate(
		&self,
		order: &OrderDemand,
		units: &[CapacityUnit],
	) -> Result<AllocationPlan, IntakeError> {
		order.validate()?;

		debug!(
			order_id = %order.id,
			strategy = self.strategy.name(),
			total_kg = order.total_weight_kg,
			cold_kg = order.cold_weight_kg,
			units = units.len(),
			"Allocating order"
		);

		match self.strategy.allocate(order, units) {
			Ok(plan) => {
				info!(
					order_id = %order.id,
					strategy = self.strategy.name(),
					allocations = plan.allocations.len(),
					"Order allocated"
				);
				Ok(plan)
			}
			Err(reason) => {
				warn!(
					order_id = %order.id,
					strategy = self.strategy.name(),
					kind = %reason.kind,
					"Order rejected: {}",
					reason.message
				);
				Err(reason.into())
			}
		}
	}

	/// Whether the order could be allocated against `units` right now.
	///
	/// Allocates nothing and logs nothing above debug level.
	pub fn can_fulfill(&self, order: &OrderDemand, units: &[CapacityUnit]) -> bool {
		if order.validate().is_err() {
			return false;
		}

		let feasible = self.strategy.allocate(order, units).is_ok();
		debug!(
			order_id = %order.id,
			strategy = self.strategy.name(),
			feasible,
			"Checked order feasibility"
		);
		feasible
	}

	/// Composes a demand from line items, then allocates it.
	///
	/// Mixed-temperature orders are rejected with `MIXED_ORDER_NOT_ALLOWED`
	/// unless the policy allows them.
	pub fn allocate_items(
		&self,
		order_id: &str,
		items: &[LineItem],
		units: &[CapacityUnit],
	) -> Result<AllocationPlan, IntakeError> {
		let demand = match compose_demand(order_id, items, &self.policy) {
			Ok(demand) => demand,
			Err(e @ CompositionError::MixedTemperature { .. }) => {
				warn!(order_id, "Order rejected: {}", e);
				return Err(e.to_rejection(order_id).into());
			}
			Err(e) => return Err(e.into()),
		};

		self.allocate(&demand, units)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::strategies::{multi_unit, phased, single_unit};
	use fleet_types::TemperatureClass;

	fn fleet() -> Vec<CapacityUnit> {
		vec![
			CapacityUnit::new("cold-5", 5.0, true, true),
			CapacityUnit::new("cold-8", 8.0, true, true),
			CapacityUnit::new("dry-12", 12.0, false, true),
		]
	}

	fn all_strategies() -> Vec<Box<dyn AllocationStrategy>> {
		vec![
			Box::new(single_unit::SingleUnitStrategy::new(350.0)),
			Box::new(multi_unit::MultiUnitStrategy::new(None)),
			Box::new(phased::PhasedStrategy::new(None)),
		]
	}

	fn assert_plan_invariants(order: &OrderDemand, units: &[CapacityUnit], plan: &AllocationPlan) {
		assert!(approx_eq_kg(plan.total_weight_kg(), order.total_weight_kg));
		for (unit_id, kg) in plan.weight_by_unit() {
			let unit = units.iter().find(|u| u.id == unit_id).unwrap();
			assert!(kg <= unit.capacity_kg + WEIGHT_TOLERANCE_KG);
		}
		for allocation in &plan.allocations {
			let unit = units.iter().find(|u| u.id == allocation.unit_id).unwrap();
			if allocation.temperature_class == TemperatureClass::Cold {
				assert!(unit.is_cold_capable);
			}
		}
	}

	#[test]
	fn test_properties_hold_for_every_strategy() {
		let units = fleet();
		let orders = [
			OrderDemand::new("dry-4", 4.0, false),
			OrderDemand::new("cold-7", 7.0, true),
			OrderDemand::split("mixed", 10.0, 8.0),
			OrderDemand::split("cold-only", 13.0, 0.0),
		];

		for strategy in all_strategies() {
			for order in &orders {
				if let Ok(plan) = strategy.allocate(order, &units) {
					assert_plan_invariants(order, &units, &plan);
					assert_eq!(plan.strategy, strategy.name());
				}
			}
		}
	}

	#[test]
	fn test_snapshot_is_never_mutated() {
		let units = fleet();
		let before = units.clone();

		for strategy in all_strategies() {
			let _ = strategy.allocate(&OrderDemand::split("o", 10.0, 8.0), &units);
			let _ = strategy.allocate(&OrderDemand::split("o", 18.0, 0.0), &units);
		}

		assert_eq!(units, before);
	}

	#[test]
	fn test_determinism() {
		let units = vec![
			CapacityUnit::new("b", 10.0, false, true),
			CapacityUnit::new("a", 10.0, false, true),
			CapacityUnit::new("c", 10.0, true, true),
		];
		let order = OrderDemand::split("o", 3.0, 14.0);

		for strategy in all_strategies() {
			let first = strategy.allocate(&order, &units);
			for _ in 0..5 {
				assert_eq!(strategy.allocate(&order, &units), first);
			}
		}

		let plan = multi_unit::MultiUnitStrategy::new(None)
			.allocate(&order, &units)
			.unwrap();
		let ids: Vec<&str> = plan.allocations.iter().map(|a| a.unit_id.as_str()).collect();
		assert_eq!(ids, vec!["c", "a", "b"]);
	}

	#[test]
	fn test_monotonic_rejection() {
		let units = fleet();
		let eligible: f64 = units.iter().map(|u| u.residual_kg).sum();

		for strategy in all_strategies() {
			for extra in [0.05, 1.0, 25.0, 500.0] {
				let order = OrderDemand::new("heavy", eligible + extra, false);
				assert!(strategy.allocate(&order, &units).is_err());
			}
		}
	}

	#[test]
	fn test_invalid_demand_is_reported() {
		let mut order = OrderDemand::split("o", 1.0, 1.0);
		order.total_weight_kg = 5.0;

		let reason = multi_unit::MultiUnitStrategy::new(None)
			.allocate(&order, &fleet())
			.unwrap_err();
		assert_eq!(reason.kind, RejectionKind::Unknown);

		let service = AllocationService::new(
			Box::new(multi_unit::MultiUnitStrategy::new(None)),
			CompositionPolicy::default(),
		);
		assert!(matches!(
			service.allocate(&order, &fleet()),
			Err(IntakeError::Demand(DemandError::WeightMismatch { .. }))
		));
	}

	#[test]
	fn test_service_rejects_mixed_line_items() {
		let service = AllocationService::new(
			Box::new(single_unit::SingleUnitStrategy::new(350.0)),
			CompositionPolicy::default(),
		);
		let items = vec![
			LineItem::new("ice-cream", 2, 1.5, true),
			LineItem::new("rice", 1, 5.0, false),
		];

		match service.allocate_items("o-9", &items, &fleet()) {
			Err(IntakeError::Rejected(reason)) => {
				assert_eq!(reason.kind, RejectionKind::MixedOrderNotAllowed)
			}
			other => panic!("Expected mixed-order rejection, got {:?}", other),
		}
	}

	#[test]
	fn test_service_allocates_line_items() {
		let service = AllocationService::new(
			Box::new(multi_unit::MultiUnitStrategy::new(None)),
			CompositionPolicy {
				allow_mixed_temperature: true,
			},
		);
		let items = vec![
			LineItem::new("ice-cream", 4, 2.5, true),
			LineItem::new("rice", 2, 4.0, false),
		];
		let mut units = fleet();

		let plan = service.allocate_items("o-10", &items, &units).unwrap();
		assert_eq!(plan.total_weight_kg(), 18.0);
		assert_eq!(service.strategy_name(), "multi_unit");

		plan.commit(&mut units).unwrap();
		let remaining: f64 = units.iter().map(|u| u.residual_kg).sum();
		assert!(approx_eq_kg(remaining, 7.0));
	}

	#[test]
	fn test_service_feasibility_check() {
		let service = AllocationService::new(
			Box::new(single_unit::SingleUnitStrategy::new(350.0)),
			CompositionPolicy::default(),
		);
		let units = fleet();

		assert!(service.can_fulfill(&OrderDemand::new("o", 8.0, true), &units));
		assert!(!service.can_fulfill(&OrderDemand::new("o", 9.0, true), &units));
		assert!(service.can_fulfill(&OrderDemand::new("o", 12.0, false), &units));
		assert!(!service.can_fulfill(&OrderDemand::new("o", 400.0, false), &units));

		let invalid = OrderDemand {
			total_weight_kg: 5.0,
			..OrderDemand::new("o", 2.0, false)
		};
		assert!(!service.can_fulfill(&invalid, &units));

		assert_eq!(units, fleet());
	}
}
