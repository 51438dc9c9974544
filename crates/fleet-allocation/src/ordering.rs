//! Total orders over capacity units used for deterministic selection.

use fleet_types::CapacityUnit;
use std::cmp::Ordering;

/// Largest capacity first, then unit id ascending.
pub(crate) fn by_capacity_desc(a: &CapacityUnit, b: &CapacityUnit) -> Ordering {
	b.capacity_kg
		.total_cmp(&a.capacity_kg)
		.then_with(|| a.id.cmp(&b.id))
}

/// Largest residual first, then [`by_capacity_desc`].
pub(crate) fn by_residual_desc(a: &CapacityUnit, b: &CapacityUnit) -> Ordering {
	b.residual_kg
		.total_cmp(&a.residual_kg)
		.then_with(|| by_capacity_desc(a, b))
}
