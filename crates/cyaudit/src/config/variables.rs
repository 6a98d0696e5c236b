//! `$VAR` / `${VAR}` substitution for configuration values.

use crate::error::ConfigError;

/// Substitutes a single configuration value.
///
/// A value starting with `$` is a whole-value reference, either `$VAR` or
/// `${VAR}`; the referenced variable must exist. Empty values become `None`
/// so they behave like missing keys. Anything else is returned as-is.
pub fn substitute_env_vars<F>(value: &str, lookup: F) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(reference) = value.strip_prefix('$') {
        let name = match reference.strip_prefix('{') {
            Some(braced) => braced.strip_suffix('}').ok_or_else(|| ConfigError::InvalidValue {
                field: value.to_string(),
                reason: "unterminated ${...} reference".to_string(),
            })?,
            None => reference,
        };

        if name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: value.to_string(),
                reason: "empty environment variable name".to_string(),
            });
        }

        return lookup(name)
            .map(|v| if v.is_empty() { None } else { Some(v) })
            .ok_or_else(|| ConfigError::MissingEnvVar {
                name: name.to_string(),
            });
    }

    if value.is_empty() {
        return Ok(None);
    }

    Ok(Some(value.to_string()))
}

/// Parses a boolean flag value after substitution.
pub(crate) fn parse_flag(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}
