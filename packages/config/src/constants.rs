// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Scenebox

// Server Configuration
pub const SCENEBOX_HOST: &str = "SCENEBOX_HOST";
pub const SCENEBOX_PORT: &str = "SCENEBOX_PORT";
pub const PORT: &str = "PORT"; // Legacy

// Sandbox Provider Configuration
pub const E2B_API_KEY: &str = "E2B_API_KEY";
pub const E2B_API_URL: &str = "E2B_API_URL";
pub const E2B_DOMAIN: &str = "E2B_DOMAIN";
pub const TEMPLATE_ID: &str = "TEMPLATE_ID";
pub const TEMPLATE_NAME: &str = "TEMPLATE_NAME";

// Preview Configuration
pub const STUDIO_PORT: &str = "STUDIO_PORT";
pub const BASE_PROJECT_DIR: &str = "BASE_PROJECT_DIR";
pub const LOCAL_PROJECT_DIR: &str = "LOCAL_PROJECT_DIR";

// Readiness Probe Configuration
pub const SCENEBOX_READY_ATTEMPTS: &str = "SCENEBOX_READY_ATTEMPTS";
pub const SCENEBOX_READY_INTERVAL_MS: &str = "SCENEBOX_READY_INTERVAL_MS";
