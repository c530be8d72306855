// ABOUTME: Environment variable parsing utilities
// ABOUTME: Provides helper functions for parsing and validating environment variables

use std::str::FromStr;

/// Parse an environment variable with a fallback default value
/// Returns the parsed value or the default if the variable is not set or cannot be parsed
pub fn parse_env_or_default<T>(var_name: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(var_name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Parse an environment variable with validation
/// Returns the parsed value if it passes validation, otherwise returns the default
/// Logs warnings when environment variables are set but fail validation or parsing
pub fn parse_env_or_default_with_validation<T, F>(var_name: &str, default: T, validator: F) -> T
where
    T: FromStr + Copy + std::fmt::Display,
    F: Fn(T) -> bool,
{
    match std::env::var(var_name) {
        Ok(raw_value) => match raw_value.parse::<T>() {
            Ok(parsed_value) => {
                if validator(parsed_value) {
                    parsed_value
                } else {
                    tracing::warn!(
                        "Environment variable {} has invalid value '{}', using default: {}",
                        var_name,
                        raw_value,
                        default
                    );
                    default
                }
            }
            Err(_) => {
                tracing::warn!(
                    "Environment variable {} has unparseable value '{}', using default: {}",
                    var_name,
                    raw_value,
                    default
                );
                default
            }
        },
        Err(_) => {
            // Variable not set - no warning needed, this is expected behavior
            default
        }
    }
}

/// Parse an environment variable with fallback to another variable
/// Tries the primary variable first, then falls back to the secondary, then to the default
pub fn parse_env_with_fallback<T>(primary_var: &str, fallback_var: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(primary_var)
        .or_else(|_| std::env::var(fallback_var))
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Read a string environment variable, treating empty or whitespace-only
/// values as unset
pub fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a string environment variable with a default
pub fn env_string_or(var_name: &str, default: &str) -> String {
    env_string(var_name).unwrap_or_else(|| default.to_string())
}
