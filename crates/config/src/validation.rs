//! Validation helpers for configuration sections

use std::fmt;

/// One problem with one field, e.g. `library.popular_limit must be between 1 and 100 (got 0)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted key as written in the TOML file
    pub field: String,
    pub message: String,
    /// Offending value, when it is worth echoing back
    pub value: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    pub fn with_value(field: impl Into<String>, message: impl Into<String>, value: impl ToString) -> Self {
        Self {
            value: Some(value.to_string()),
            ..Self::new(field, message)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)?;
        match &self.value {
            Some(value) => write!(f, " (got {})", value),
            None => Ok(()),
        }
    }
}

impl std::error::Error for ValidationError {}

/// A configuration section that can check and merge itself
///
/// `AppConfig` and `LibraryConfig` implement this so `Config` can validate and
/// merge section by section.
pub trait ConfigSection: Default {
    /// Returns every problem found; `Ok` means the section is usable
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Merges another section into this one, `other` taking precedence
    fn merge(&mut self, other: Self);

    /// Section name used in error reporting
    fn section_name(&self) -> &'static str;
}

/// Common validators for config values
pub struct Validator;

impl Validator {
    /// Validates that a numeric value is within an inclusive range
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            Err(ValidationError::with_value(
                field,
                format!("must be between {} and {}", min, max),
                value,
            ))
        } else {
            Ok(())
        }
    }

    /// Validates that a string has non-whitespace content
    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            Err(ValidationError::new(field, "must not be empty"))
        } else {
            Ok(())
        }
    }

    /// Collects multiple validation results into a single result
    pub fn collect_errors(
        results: Vec<Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = results.into_iter().filter_map(|r| r.err()).collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
