//! Name-to-factory table for allocation strategies.

use std::collections::BTreeMap;
use tracing::debug;

use crate::implementations::strategies::{multi_unit, phased, single_unit};
use crate::{AllocationError, AllocationStrategy};

/// Builds a strategy from its configuration table.
pub type StrategyFactory = fn(&toml::Value) -> Result<Box<dyn AllocationStrategy>, AllocationError>;

/// Registry for selecting a strategy by configured name.
pub struct StrategyRegistry {
	factories: BTreeMap<String, StrategyFactory>,
}

impl Default for StrategyRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl StrategyRegistry {
	/// Create a registry with the built-in strategies.
	pub fn new() -> Self {
		let mut registry = Self {
			factories: BTreeMap::new(),
		};
		registry.register(single_unit::NAME, single_unit::create_strategy);
		registry.register(multi_unit::NAME, multi_unit::create_strategy);
		registry.register(phased::NAME, phased::create_strategy);
		registry
	}

	/// Register a factory, replacing any existing one with the same name.
	pub fn register(&mut self, name: impl Into<String>, factory: StrategyFactory) {
		let name = name.into();
		debug!("Registering allocation strategy: {}", name);
		self.factories.insert(name, factory);
	}

	/// Registered strategy names, sorted.
	pub fn names(&self) -> Vec<&str> {
		self.factories.keys().map(String::as_str).collect()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.factories.contains_key(name)
	}

	/// Build the named strategy from its configuration table.
	pub fn build(
		&self,
		name: &str,
		config: &toml::Value,
	) -> Result<Box<dyn AllocationStrategy>, AllocationError> {
		let factory = self
			.factories
			.get(name)
			.ok_or_else(|| AllocationError::UnknownStrategy(name.to_string()))?;
		factory(config)
	}
}
