//! Rejection diagnostics.
//!
//! Classifies why a strategy could not serve an order. Checks run in a
//! fixed priority order: ceiling, cold storage, overall capacity, and
//! finally `UNKNOWN`. Reaching `UNKNOWN` means the strategy failed for a
//! reason the capacity checks do not capture, e.g. fragmentation in the
//! phased strategy.

use fleet_types::{
	is_positive_kg, round_kg, CapacityUnit, OrderDemand, RejectionKind, RejectionReason,
	WEIGHT_TOLERANCE_KG,
};
use tracing::debug;

/// Strategy-supplied parameters for classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticContext {
	/// Single-unit ceiling to check against, if the strategy enforces one.
	pub ceiling_kg: Option<f64>,
	/// Split strategies are judged on pooled residual capacity rather than
	/// on the best single unit.
	pub splits_orders: bool,
}

/// Classifies an allocation failure against the snapshot the strategy saw.
pub fn diagnose(
	order: &OrderDemand,
	units: &[CapacityUnit],
	context: &DiagnosticContext,
) -> RejectionReason {
	let reason = classify(order, units, context).with_detail("order_id", order.id.clone());
	debug!(order_id = %order.id, kind = %reason.kind, "Classified rejection");
	reason
}

fn classify(
	order: &OrderDemand,
	units: &[CapacityUnit],
	context: &DiagnosticContext,
) -> RejectionReason {
	let total = order.total_weight_kg;

	if let Some(ceiling) = context.ceiling_kg {
		if total > ceiling {
			return RejectionReason::new(
				RejectionKind::OrderTooHeavy,
				format!(
					"Order weighs {} kg, more than the {} kg a single unit can carry",
					total, ceiling
				),
			)
			.with_detail("total_weight_kg", total)
			.with_detail("ceiling_kg", ceiling);
		}
	}

	let available: Vec<&CapacityUnit> = units.iter().filter(|u| u.is_available()).collect();

	if context.splits_orders {
		let cold_kg = pooled(available.iter().copied().filter(|u| u.is_cold_capable));
		if order.requires_cold && cold_kg + WEIGHT_TOLERANCE_KG < order.cold_weight_kg {
			return RejectionReason::new(
				RejectionKind::NoColdStorage,
				format!(
					"Order needs {} kg of cold storage but only {} kg is available",
					order.cold_weight_kg, cold_kg
				),
			)
			.with_detail("cold_weight_kg", order.cold_weight_kg)
			.with_detail("available_cold_kg", cold_kg);
		}

		let all_kg = pooled(available.iter().copied());
		if all_kg + WEIGHT_TOLERANCE_KG < total {
			return RejectionReason::new(
				RejectionKind::NoCapacity,
				format!(
					"Order needs {} kg but only {} kg of capacity is available",
					total, all_kg
				),
			)
			.with_detail("total_weight_kg", total)
			.with_detail("available_kg", all_kg);
		}
	} else {
		if order.requires_cold && !available.iter().any(|u| u.can_take_whole(total, true)) {
			let cold_units = available.iter().filter(|u| u.is_cold_capable).count();
			return RejectionReason::new(
				RejectionKind::NoColdStorage,
				format!("No powered cold-capable unit can take {} kg", total),
			)
			.with_detail("total_weight_kg", total)
			.with_detail("cold_capable_units", cold_units);
		}

		if !available.iter().any(|u| u.can_take_whole(total, false)) {
			let largest = available
				.iter()
				.map(|u| u.residual_kg)
				.fold(0.0_f64, f64::max);
			return RejectionReason::new(
				RejectionKind::NoCapacity,
				format!("No powered unit has {} kg of residual capacity", total),
			)
			.with_detail("total_weight_kg", total)
			.with_detail("largest_residual_kg", largest);
		}
	}

	RejectionReason::new(
		RejectionKind::Unknown,
		"Allocation failed although capacity checks passed",
	)
	.with_detail("total_weight_kg", total)
	.with_detail("available_units", available.len())
}

fn pooled<'a>(units: impl Iterator<Item = &'a CapacityUnit>) -> f64 {
	round_kg(
		units
			.filter(|u| is_positive_kg(u.residual_kg))
			.map(|u| u.residual_kg)
			.sum(),
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	const SINGLE: DiagnosticContext = DiagnosticContext {
		ceiling_kg: Some(350.0),
		splits_orders: false,
	};
	const SPLIT: DiagnosticContext = DiagnosticContext {
		ceiling_kg: None,
		splits_orders: true,
	};

	#[test]
	fn test_order_too_heavy() {
		let units = vec![CapacityUnit::new("truck", 1000.0, true, true)];
		let order = OrderDemand::new("o", 400.0, false);

		let reason = diagnose(&order, &units, &SINGLE);
		assert_eq!(reason.kind, RejectionKind::OrderTooHeavy);
		assert_eq!(reason.details["ceiling_kg"], 350.0);

		// without a ceiling the same order is judged on capacity
		assert_eq!(diagnose(&order, &units, &SPLIT).kind, RejectionKind::Unknown);
	}

	#[test]
	fn test_ceiling_overshoot_is_not_tolerated() {
		let units = vec![CapacityUnit::new("truck", 1000.0, true, true)];

		let order = OrderDemand::new("o", 350.01, false);
		assert_eq!(diagnose(&order, &units, &SINGLE).kind, RejectionKind::OrderTooHeavy);

		let order = OrderDemand::new("o", 350.0, false);
		assert_ne!(diagnose(&order, &units, &SINGLE).kind, RejectionKind::OrderTooHeavy);
	}

	#[test]
	fn test_no_cold_storage() {
		let units = vec![
			CapacityUnit::new("a", 50.0, false, true),
			CapacityUnit::new("b", 50.0, false, true),
		];
		let order = OrderDemand::new("o", 10.0, true);

		assert_eq!(diagnose(&order, &units, &SINGLE).kind, RejectionKind::NoColdStorage);
		assert_eq!(diagnose(&order, &units, &SPLIT).kind, RejectionKind::NoColdStorage);
	}

	#[test]
	fn test_cold_unit_too_small_for_single() {
		let units = vec![
			CapacityUnit::new("cold", 5.0, true, true),
			CapacityUnit::new("dry", 50.0, false, true),
		];
		let order = OrderDemand::new("o", 10.0, true);

		let reason = diagnose(&order, &units, &SINGLE);
		assert_eq!(reason.kind, RejectionKind::NoColdStorage);
		assert_eq!(reason.details["cold_capable_units"], 1);
	}

	#[test]
	fn test_unpowered_units_do_not_count() {
		let units = vec![
			CapacityUnit::new("a", 50.0, true, false),
			CapacityUnit::new("b", 5.0, false, true),
		];
		let order = OrderDemand::new("o", 10.0, false);

		assert_eq!(diagnose(&order, &units, &SINGLE).kind, RejectionKind::NoCapacity);
		let reason = diagnose(&order, &units, &SPLIT);
		assert_eq!(reason.kind, RejectionKind::NoCapacity);
		assert_eq!(reason.details["available_kg"], 5.0);
	}

	#[test]
	fn test_empty_snapshot() {
		let order = OrderDemand::new("o", 1.0, false);
		assert_eq!(diagnose(&order, &[], &SINGLE).kind, RejectionKind::NoCapacity);
		assert_eq!(diagnose(&order, &[], &SPLIT).kind, RejectionKind::NoCapacity);
	}

	#[test]
	fn test_unknown_when_capacity_suffices() {
		let units = vec![CapacityUnit::new("a", 50.0, false, true)];
		let order = OrderDemand::new("o", 10.0, false);

		let reason = diagnose(&order, &units, &SINGLE);
		assert_eq!(reason.kind, RejectionKind::Unknown);
		assert_eq!(reason.details["order_id"], "o");
	}
}
