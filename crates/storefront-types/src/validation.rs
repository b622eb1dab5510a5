//! Configuration validation types for ensuring type-safe configurations.
//!
//! Every pluggable implementation (storage backends, auth providers)
//! validates its TOML configuration through a [`Schema`] before it is
//! constructed, so misconfiguration fails at startup with a field-level
//! message instead of surfacing later as a runtime error.

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
	/// Error that occurs when a field has the wrong type.
	#[error("Type mismatch for field '{field}': expected {expected}")]
	TypeMismatch {
		field: String,
		expected: &'static str,
	},
}

/// Trait implemented by every configurable component.
///
/// Implementations return a validator for their own TOML section; the
/// builder runs it before constructing the component.
pub trait ConfigSchema: Send + Sync {
	/// Validates the raw TOML configuration for this component.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

/// Type alias for field validator functions.
///
/// Validators run after the type check and can reject values the type
/// system cannot, returning a message describing the problem.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// The expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	/// A string value.
	String,
	/// An integer value with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	/// A boolean value.
	Boolean,
}

/// One field of a configuration schema.
pub struct Field {
	/// Name of the field as it appears in the TOML section.
	pub name: String,
	/// Expected type.
	pub field_type: FieldType,
	/// Optional custom validator run after the type check.
	pub validator: Option<FieldValidator>,
}

impl Field {
	/// Creates a field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Attaches a custom validator to this field.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		match &self.field_type {
			FieldType::String => {
				if !value.is_str() {
					return Err(ValidationError::TypeMismatch {
						field: self.name.clone(),
						expected: "string",
					});
				}
			}
			FieldType::Integer { min, max } => {
				let n = value
					.as_integer()
					.ok_or_else(|| ValidationError::TypeMismatch {
						field: self.name.clone(),
						expected: "integer",
					})?;
				if min.is_some_and(|lo| n < lo) || max.is_some_and(|hi| n > hi) {
					return Err(ValidationError::InvalidValue {
						field: self.name.clone(),
						message: format!("{} is out of range", n),
					});
				}
			}
			FieldType::Boolean => {
				if !value.is_bool() {
					return Err(ValidationError::TypeMismatch {
						field: self.name.clone(),
						expected: "boolean",
					});
				}
			}
		}
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
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

/// A validation schema for one TOML configuration section.
///
/// Required fields must be present and well-typed; optional fields are
/// checked only when present.
#[derive(Debug, Default)]
pub struct Schema {
	required: Vec<Field>,
	optional: Vec<Field>,
}

impl Schema {
	/// Creates a schema from required and optional fields.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		for field in &self.required {
			match config.get(&field.name) {
				Some(value) => field.check(value)?,
				None => return Err(ValidationError::MissingField(field.name.clone())),
			}
		}
		for field in &self.optional {
			if let Some(value) = config.get(&field.name) {
				field.check(value)?;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn schema() -> Schema {
		Schema::new(
			vec![Field::new("path", FieldType::String)],
			vec![Field::new(
				"poll_interval_secs",
				FieldType::Integer {
					min: Some(1),
					max: None,
				},
			)],
		)
	}

	#[test]
	fn missing_required_field_is_rejected() {
		let config: toml::Value = toml::from_str("poll_interval_secs = 5").unwrap();
		assert!(matches!(
			schema().validate(&config),
			Err(ValidationError::MissingField(_))
		));
	}

	#[test]
	fn out_of_range_integer_is_rejected() {
		let config: toml::Value =
			toml::from_str("path = \"/tmp/x\"\npoll_interval_secs = 0").unwrap();
		assert!(matches!(
			schema().validate(&config),
			Err(ValidationError::InvalidValue { .. })
		));
	}

	#[test]
	fn valid_config_passes() {
		let config: toml::Value =
			toml::from_str("path = \"/tmp/x\"\npoll_interval_secs = 5").unwrap();
		assert!(schema().validate(&config).is_ok());
	}
}
