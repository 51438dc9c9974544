//! Schema validation for strategy configuration tables.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// Error that occurs when a required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// Error that occurs when a field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// Error that occurs when field type is incorrect.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
	/// Error that occurs when a field is not part of the schema.
	#[error("Unknown field: {0}")]
	UnknownField(String),
}

impl ValidationError {
	/// Prefixes the field path with the name of the enclosing table.
	fn nested_in(self, parent: &str) -> Self {
		let join = |field: String| format!("{}.{}", parent, field);
		match self {
			Self::MissingField(f) => Self::MissingField(join(f)),
			Self::UnknownField(f) => Self::UnknownField(join(f)),
			Self::InvalidValue { field, message } => Self::InvalidValue {
				field: join(field),
				message,
			},
			Self::TypeMismatch {
				field,
				expected,
				actual,
			} => Self::TypeMismatch {
				field: join(field),
				expected,
				actual,
			},
		}
	}
}

/// Type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	/// Floating point value. Integers are accepted and widened.
	Number { min: Option<f64>, max: Option<f64> },
	Boolean,
	Table(Schema),
}

/// Type alias for field validator functions.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A field definition with name and type.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	/// Creates a new field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator to this field.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		validate_field_type(&self.name, value, &self.field_type)?;

		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}

		Ok(())
	}
}

/// Schema definition with required and optional fields.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
	/// Reject keys that are neither required nor optional.
	pub strict: bool,
}

impl Schema {
	/// Creates a new schema with required and optional fields.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self {
			required,
			optional,
			strict: false,
		}
	}

	/// Makes the schema reject unknown keys.
	pub fn strict(mut self) -> Self {
		self.strict = true;
		self
	}

	/// Validates a TOML value against this schema.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		if self.strict {
			let known = |key: &str| {
				self.required
					.iter()
					.chain(self.optional.iter())
					.any(|f| f.name == key)
			};
			if let Some(key) = table.keys().find(|key| !known(key)) {
				return Err(ValidationError::UnknownField(key.clone()));
			}
		}

		Ok(())
	}
}

fn type_mismatch(field_name: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn check_bounds(
	field_name: &str,
	value: f64,
	min: Option<f64>,
	max: Option<f64>,
) -> Result<(), ValidationError> {
	if let Some(min_val) = min {
		if value < min_val {
			return Err(ValidationError::InvalidValue {
				field: field_name.to_string(),
				message: format!("Value {} is less than minimum {}", value, min_val),
			});
		}
	}

	if let Some(max_val) = max {
		if value > max_val {
			return Err(ValidationError::InvalidValue {
				field: field_name.to_string(),
				message: format!("Value {} is greater than maximum {}", value, max_val),
			});
		}
	}

	Ok(())
}

/// Validates that a value matches the expected field type.
fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	match expected_type {
		FieldType::Boolean if !value.is_bool() => Err(type_mismatch(field_name, "boolean", value)),
		FieldType::Boolean => Ok(()),
		FieldType::Number { min, max } => {
			let num_val = value
				.as_float()
				.or_else(|| value.as_integer().map(|i| i as f64))
				.ok_or_else(|| type_mismatch(field_name, "number", value))?;
			check_bounds(field_name, num_val, *min, *max)
		}
		FieldType::Table(schema) => schema
			.validate(value)
			.map_err(|e| e.nested_in(field_name)),
	}
}

/// Trait defining a configuration schema that can validate TOML values.
pub trait ConfigSchema: Send + Sync {
	/// Validates a TOML configuration value against this schema.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
