//! Environment-variable references inside configuration values.
//!
//! Any string value in the TOML config may reference the environment:
//!
//! - `$VAR` / `${VAR}`: required; resolution fails when the variable is unset.
//! - `${VAR:-fallback}`: optional; `fallback` is used when the variable is
//!   unset or blank.
//!
//! Strings that match none of these patterns are returned unchanged.

use crate::error::Error;

/// Reads a variable from the process environment, treating blank values as unset.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve a single reference using `lookup` to read variables.
///
/// # Errors
///
/// Returns an error if a required variable is not set.
pub fn resolve_env_with<F>(value: &str, lookup: F) -> Result<String, Error>
where
    F: Fn(&str) -> Option<String>,
{
    // ${VAR} and ${VAR:-fallback}
    if let Some(inner) = value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        if let Some((var_name, fallback)) = inner.split_once(":-") {
            return Ok(lookup(var_name).unwrap_or_else(|| fallback.to_owned()));
        }
        return lookup(inner).ok_or_else(|| {
            Error::config(format!(
                "env var '{inner}' not found (referenced as '{value}')"
            ))
        });
    }
    // $VAR
    if let Some(var_name) = value.strip_prefix('$')
        && !var_name.is_empty()
        && var_name.chars().all(|c| c.is_alphanumeric() || c == '_')
    {
        return lookup(var_name).ok_or_else(|| {
            Error::config(format!(
                "env var '{var_name}' not found (referenced as '{value}')"
            ))
        });
    }
    Ok(value.to_owned())
}

/// Resolve every string inside a TOML document in place.
///
/// # Errors
///
/// Returns the first unresolvable reference.
pub fn resolve_toml_with<F>(value: &mut toml::Value, lookup: &F) -> Result<(), Error>
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        toml::Value::String(s) => *s = resolve_env_with(s, lookup)?,
        toml::Value::Array(items) => {
            for item in items {
                resolve_toml_with(item, lookup)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                resolve_toml_with(item, lookup)?;
            }
        }
        _ => {}
    }
    Ok(())
}
