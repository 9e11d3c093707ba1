use thiserror::Error;

use crate::config::{GeneratorSettings, ItemBounds, Settings};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_generator(&settings.generator) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_generator(generator: &GeneratorSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        Self::check_bounds("generator.typed_items", &generator.typed_items, &mut errors);
        Self::check_bounds(
            "generator.document_items",
            &generator.document_items,
            &mut errors,
        );

        if generator.number_min >= generator.number_max {
            errors.push(ValidationError::InvalidValue {
                field: "generator.number_min".to_string(),
                reason: format!(
                    "must be below generator.number_max ({} >= {})",
                    generator.number_min, generator.number_max
                ),
            });
        }

        if generator.max_depth == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "generator.max_depth".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if generator.max_nodes == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "generator.max_nodes".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if generator.string_max_length == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "generator.string_max_length".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if generator.pattern_max_repeat == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "generator.pattern_max_repeat".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check_bounds(field: &str, bounds: &ItemBounds, errors: &mut Vec<ValidationError>) {
        if bounds.min > bounds.max {
            errors.push(ValidationError::InvalidValue {
                field: field.to_string(),
                reason: format!("min ({}) exceeds max ({})", bounds.min, bounds.max),
            });
        }
    }
}
