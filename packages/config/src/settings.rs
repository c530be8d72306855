use crate::constants;
use crate::env::{env_string, env_string_or, parse_env_or_default_with_validation, parse_env_with_fallback};

/// Process-wide settings, resolved from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Bind address for the HTTP server
    pub host: String,
    /// Bind port for the HTTP server
    pub port: u16,

    /// Provider API key; allocation fails without one
    pub e2b_api_key: Option<String>,
    /// Provider control-plane base URL
    pub e2b_api_url: String,
    /// Public domain used for templated preview URLs
    pub e2b_domain: String,
    /// Template id override (wins over template name)
    pub template_id: Option<String>,
    /// Template name used when no id is configured
    pub template_name: String,

    /// Fixed dev-server port inside the sandbox
    pub studio_port: u16,
    /// Pre-provisioned project directory inside the sandbox
    pub base_project_dir: String,
    /// Host-side project directory for local push (falls back to base_project_dir)
    pub local_project_dir: Option<String>,

    /// Readiness probe attempt ceiling
    pub ready_attempts: u32,
    /// Sleep between readiness probe iterations, in milliseconds
    pub ready_interval_ms: u64,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            host: env_string_or(constants::SCENEBOX_HOST, "0.0.0.0"),
            port: parse_env_with_fallback(constants::SCENEBOX_PORT, constants::PORT, 8080),
            e2b_api_key: env_string(constants::E2B_API_KEY),
            e2b_api_url: env_string_or(constants::E2B_API_URL, "https://api.e2b.dev"),
            e2b_domain: env_string_or(constants::E2B_DOMAIN, "e2b.app"),
            template_id: env_string(constants::TEMPLATE_ID),
            template_name: env_string_or(constants::TEMPLATE_NAME, "scenebox-studio-template"),
            studio_port: parse_env_or_default_with_validation(
                constants::STUDIO_PORT,
                3000,
                |p: u16| p > 0,
            ),
            base_project_dir: env_string_or(constants::BASE_PROJECT_DIR, "/app"),
            local_project_dir: env_string(constants::LOCAL_PROJECT_DIR),
            ready_attempts: parse_env_or_default_with_validation(
                constants::SCENEBOX_READY_ATTEMPTS,
                60,
                |a: u32| a > 0,
            ),
            ready_interval_ms: parse_env_or_default_with_validation(
                constants::SCENEBOX_READY_INTERVAL_MS,
                1000,
                |ms: u64| ms > 0,
            ),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}
