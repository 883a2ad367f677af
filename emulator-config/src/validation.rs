//! Validation shared by the configuration domains

use crate::error::{ConfigError, ConfigResult};
use std::collections::HashSet;
use std::fmt::Display;

/// A configuration section that can check itself
pub trait Validatable {
    fn validate(&self) -> ConfigResult<()>;

    /// Section name used in error messages
    fn domain_name(&self) -> &'static str;

    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        invalid(self.domain_name(), message)
    }
}

fn invalid(domain: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::DomainError {
        domain: domain.to_string(),
        message: message.into(),
    }
}

pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(invalid(domain, format!("{} cannot be empty", field_name)));
    }
    Ok(())
}

/// Reject zero and negative values
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + Display,
{
    if value > T::default() {
        Ok(())
    } else {
        Err(invalid(
            domain,
            format!("{} must be greater than 0, got {}", field_name, value),
        ))
    }
}

/// Reject negative values; NaN is rejected too
pub fn validate_non_negative<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + Display,
{
    if value >= T::default() {
        Ok(())
    } else {
        Err(invalid(
            domain,
            format!("{} cannot be negative, got {}", field_name, value),
        ))
    }
}

/// Reject a name that appears twice
pub fn validate_unique<'a>(
    names: impl IntoIterator<Item = &'a str>,
    field_name: &str,
    domain: &str,
) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    match names.into_iter().find(|name| !seen.insert(*name)) {
        Some(name) => Err(invalid(domain, format!("duplicate {} '{}'", field_name, name))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(1, "threads", "test").is_ok());
        assert!(validate_positive(0, "threads", "test").is_err());
        assert!(validate_positive(0.5, "timeout", "test").is_ok());
    }

    #[test]
    fn test_validate_unique() {
        assert!(validate_unique(["a", "b"], "endpoint", "test").is_ok());

        let err = validate_unique(["a", "b", "a"], "endpoint", "test").unwrap_err();
        assert!(err.to_string().contains("duplicate endpoint 'a'"));
    }
}
