//! Scenebox configuration - environment variable constants and parsing.

pub mod constants;
pub mod env;
pub mod settings;

pub use env::{
    env_string, env_string_or, parse_env_or_default, parse_env_or_default_with_validation,
    parse_env_with_fallback,
};
pub use settings::Settings;
