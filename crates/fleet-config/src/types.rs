//! Configuration types.

use fleet_allocation::{
	implementations::strategies::multi_unit, AllocationError, AllocationStrategy, CompositionPolicy,
	StrategyRegistry,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete allocator configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FleetConfig {
	/// Engine identity and logging
	#[serde(default)]
	pub engine: EngineSettings,
	/// Strategy selection and settings
	#[serde(default)]
	pub allocation: AllocationConfig,
}

/// Engine identity and logging
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineSettings {
	/// Name used in log output
	#[serde(default = "default_name")]
	pub name: String,
	/// Default log filter when RUST_LOG is not set
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

fn default_name() -> String {
	"fleet-allocator".to_string()
}

fn default_log_level() -> String {
	"info".to_string()
}

impl Default for EngineSettings {
	fn default() -> Self {
		Self {
			name: default_name(),
			log_level: default_log_level(),
		}
	}
}

/// Allocation configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AllocationConfig {
	/// Name of the strategy to use: "single_unit", "multi_unit" or "phased"
	#[serde(default = "default_strategy")]
	pub strategy: String,
	/// Accept orders that mix cold and non-cold items
	#[serde(default)]
	pub allow_mixed_temperature: bool,
	/// Strategy-specific settings, keyed by strategy name
	#[serde(default)]
	pub strategies: BTreeMap<String, toml::Value>,
}

fn default_strategy() -> String {
	multi_unit::NAME.to_string()
}

impl Default for AllocationConfig {
	fn default() -> Self {
		Self {
			strategy: default_strategy(),
			allow_mixed_temperature: false,
			strategies: BTreeMap::new(),
		}
	}
}

impl AllocationConfig {
	/// Settings table for the named strategy, or an empty table.
	pub fn settings_for(&self, name: &str) -> toml::Value {
		self.strategies
			.get(name)
			.cloned()
			.unwrap_or_else(|| toml::Value::Table(toml::Table::new()))
	}

	pub fn composition_policy(&self) -> CompositionPolicy {
		CompositionPolicy {
			allow_mixed_temperature: self.allow_mixed_temperature,
		}
	}

	/// Builds the selected strategy through the registry.
	pub fn build_strategy(
		&self,
		registry: &StrategyRegistry,
	) -> Result<Box<dyn AllocationStrategy>, AllocationError> {
		registry.build(&self.strategy, &self.settings_for(&self.strategy))
	}
}
