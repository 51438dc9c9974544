//! Weight arithmetic shared by every strategy.

/// Tolerance under which two weights are considered equal, in kilograms.
pub const WEIGHT_TOLERANCE_KG: f64 = 0.01;

/// Rounds a weight to two decimal places.
///
/// Applied after every arithmetic step so that drift does not compound
/// across many small allocations.
pub fn round_kg(value: f64) -> f64 {
	(value * 100.0).round() / 100.0
}

/// Returns true when `a` and `b` differ by no more than the weight tolerance.
pub fn approx_eq_kg(a: f64, b: f64) -> bool {
	// small epsilon so that 0.01 apart after rounding still compares equal
	(a - b).abs() <= WEIGHT_TOLERANCE_KG + 1e-9
}

/// Returns true when `value` is a meaningful, non-negligible weight.
pub fn is_positive_kg(value: f64) -> bool {
	value > WEIGHT_TOLERANCE_KG
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_round_kg() {
		assert_eq!(round_kg(1.005_1), 1.01);
		assert_eq!(round_kg(2.994), 2.99);
		assert_eq!(round_kg(0.1 + 0.2), 0.3);
	}

	#[test]
	fn test_tolerance() {
		assert!(approx_eq_kg(10.0, 10.01));
		assert!(!approx_eq_kg(10.0, 10.02));
		assert!(!is_positive_kg(0.01));
		assert!(is_positive_kg(0.02));
	}
}
