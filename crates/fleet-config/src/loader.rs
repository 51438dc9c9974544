//! Configuration loading from files and environment.

use crate::types::FleetConfig;
use crate::ConfigError;
use fleet_allocation::StrategyRegistry;
use regex::Regex;
use std::env;
use std::path::Path;
use tracing::{debug, info};

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "FLEET_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	/// Loads, overrides and validates the configuration.
	pub async fn load(&self) -> Result<FleetConfig, ConfigError> {
		let Some(file_path) = &self.file_path else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};

		let mut config = self.load_from_file(file_path).await?;
		self.apply_env_overrides(&mut config)?;
		Self::validate_config(&config)?;

		info!(
			strategy = %config.allocation.strategy,
			"Configuration loaded from {}", file_path
		);
		Ok(config)
	}

	/// Builds the default configuration with environment overrides applied,
	/// for runs without a configuration file.
	pub fn load_defaults(&self) -> Result<FleetConfig, ConfigError> {
		let mut config = FleetConfig::default();
		self.apply_env_overrides(&mut config)?;
		Self::validate_config(&config)?;

		debug!(
			strategy = %config.allocation.strategy,
			"Using default configuration"
		);
		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<FleetConfig, ConfigError> {
		if !Path::new(file_path).exists() {
			return Err(ConfigError::FileNotFound(file_path.to_string()));
		}

		let content = tokio::fs::read_to_string(file_path).await?;
		let substituted = Self::substitute_env_vars(&content)?;

		match Path::new(file_path).extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml(&substituted),
			Some("json") => Self::from_json(&substituted),
			Some("yaml") | Some("yml") => Self::from_yaml(&substituted),
			_ => Err(ConfigError::ParseError(format!(
				"Unsupported config format: {}",
				file_path
			))),
		}
	}

	/// Load from TOML string
	pub fn from_toml(contents: &str) -> Result<FleetConfig, ConfigError> {
		toml::from_str(contents).map_err(|e| ConfigError::ParseError(format!("TOML: {}", e)))
	}

	/// Load from JSON string
	pub fn from_json(contents: &str) -> Result<FleetConfig, ConfigError> {
		serde_json::from_str(contents).map_err(|e| ConfigError::ParseError(format!("JSON: {}", e)))
	}

	/// Load from YAML string
	pub fn from_yaml(contents: &str) -> Result<FleetConfig, ConfigError> {
		serde_yaml::from_str(contents).map_err(|e| ConfigError::ParseError(format!("YAML: {}", e)))
	}

	/// Replaces `${VAR_NAME}` patterns with environment values.
	fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
		let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::ParseError(e.to_string()))?;
		let mut result = content.to_string();

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut FleetConfig) -> Result<(), ConfigError> {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			debug!("Overriding log level from environment");
			config.engine.log_level = log_level;
		}

		if let Ok(strategy) = env::var(format!("{}STRATEGY", self.env_prefix)) {
			debug!("Overriding allocation strategy from environment");
			config.allocation.strategy = strategy;
		}

		if let Ok(mixed) = env::var(format!("{}ALLOW_MIXED_TEMPERATURE", self.env_prefix)) {
			config.allocation.allow_mixed_temperature = mixed.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid ALLOW_MIXED_TEMPERATURE: {}", e))
			})?;
		}

		Ok(())
	}

	/// Checks the selected strategy exists and every configured strategy
	/// table passes its own schema.
	pub fn validate_config(config: &FleetConfig) -> Result<(), ConfigError> {
		let registry = StrategyRegistry::new();
		let selected = &config.allocation.strategy;

		if !registry.contains(selected) {
			return Err(ConfigError::ValidationError(format!(
				"Unknown allocation strategy '{}', expected one of {:?}",
				selected,
				registry.names()
			)));
		}

		if !config.allocation.strategies.is_empty()
			&& !config.allocation.strategies.contains_key(selected)
		{
			return Err(ConfigError::ValidationError(format!(
				"Selected strategy '{}' not configured",
				selected
			)));
		}

		for (name, settings) in &config.allocation.strategies {
			registry
				.build(name, settings)
				.map_err(|e| ConfigError::ValidationError(e.to_string()))?;
		}

		Ok(())
	}
}
