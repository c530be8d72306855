// ABOUTME: Provider trait and implementations for remote sandbox backends
// ABOUTME: Defines the abstract capability interface for sandbox lifecycle, exec, and file I/O

use async_trait::async_trait;
use thiserror::Error;

pub mod e2b;

pub use e2b::E2bProvider;

#[derive(Error, Debug)]
pub enum ProviderError {
    /// Transient control-plane unavailability. The only retryable class.
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Provider API error: {0}")]
    Api(String),

    /// The sandbox is confirmed gone; never retried.
    #[error("Sandbox stopped: {0}")]
    SandboxStopped(String),

    #[error("Sandbox not found: {0}")]
    NotFound(String),

    #[error("Command failed with exit code {exit_code}: {detail}")]
    CommandFailed { exit_code: i64, detail: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),
}

impl ProviderError {
    /// Whether a bounded-backoff retry is worthwhile for this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Connectivity(_))
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Opaque reference to a running remote environment. Created on allocation,
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxHandle {
    pub sandbox_id: String,
    pub template: String,
}

/// Options for running a shell command inside a sandbox.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub cwd: Option<String>,
    pub background: bool,
}

impl RunOptions {
    pub fn background() -> Self {
        Self {
            cwd: None,
            background: true,
        }
    }
}

/// Output of a (foreground) command executed inside a sandbox.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i64,
}

/// Capability interface every sandbox compute provider must implement.
///
/// Feature variance between providers is adapter selection at construction
/// time; callers never probe for optional methods at runtime.
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    /// Create an isolated environment from a template name or id.
    async fn create_sandbox(&self, template: &str) -> Result<SandboxHandle>;

    /// Run a shell command in the sandbox, optionally backgrounded.
    async fn run_command(
        &self,
        sandbox_id: &str,
        command: &str,
        opts: RunOptions,
    ) -> Result<CommandOutput>;

    /// Write a file at an absolute path inside the sandbox.
    async fn write_file(&self, sandbox_id: &str, path: &str, content: &str) -> Result<()>;

    /// Expose a TCP port publicly. A no-op on providers where ports are
    /// always public.
    async fn expose_port(&self, sandbox_id: &str, port: u16) -> Result<()>;

    /// Fully-resolved public URL for a port, if the provider offers one.
    async fn resolve_public_url(&self, sandbox_id: &str, port: u16) -> Result<Option<String>>;

    /// Public hostname for a port, if the provider offers one. Callers
    /// prefix a secure scheme.
    async fn resolve_host(&self, sandbox_id: &str, port: u16) -> Result<Option<String>>;

    /// Domain used for the deterministic templated-URL fallback.
    fn public_domain(&self) -> &str;

    /// Release the sandbox. Unknown ids are a provider-side no-op.
    async fn destroy_sandbox(&self, sandbox_id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_connectivity_is_retryable() {
        assert!(ProviderError::Connectivity("fetch failed".into()).is_retryable());
        assert!(!ProviderError::Api("500".into()).is_retryable());
        assert!(!ProviderError::SandboxStopped("gone".into()).is_retryable());
        assert!(!ProviderError::Config("missing key".into()).is_retryable());
    }
}
