// ABOUTME: E2B provider adapter over the REST control plane and the in-sandbox agent HTTP API
// ABOUTME: The canonical remote-sandbox implementation of the SandboxProvider capability

use super::{CommandOutput, ProviderError, Result, RunOptions, SandboxHandle, SandboxProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Port the in-sandbox agent (envd) listens on.
const ENVD_PORT: u16 = 49983;

/// Sandbox idle timeout requested at creation, in seconds.
const SANDBOX_TIMEOUT_SECS: u64 = 1800;

#[derive(Debug, Serialize)]
struct CreateSandboxBody<'a> {
    #[serde(rename = "templateID")]
    template_id: &'a str,
    timeout: u64,
}

#[derive(Debug, Deserialize)]
struct CreateSandboxResponse {
    #[serde(rename = "sandboxID")]
    sandbox_id: String,
}

#[derive(Debug, Serialize)]
struct RunCommandBody<'a> {
    cmd: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cwd: Option<&'a str>,
    background: bool,
}

#[derive(Debug, Deserialize, Default)]
struct RunCommandResponse {
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    #[serde(default, rename = "exitCode")]
    exit_code: i64,
}

/// E2B sandbox provider. Talks to the provider control plane for lifecycle
/// and to the per-sandbox agent endpoint for command execution and file I/O.
pub struct E2bProvider {
    api_key: Option<String>,
    api_url: String,
    domain: String,
    client: reqwest::Client,
}

impl E2bProvider {
    pub fn new(api_key: Option<String>, api_url: String, domain: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            domain,
            client,
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ProviderError::Config("E2B_API_KEY is required".to_string()))
    }

    fn envd_url(&self, sandbox_id: &str, path: &str) -> String {
        format!("https://{ENVD_PORT}-{sandbox_id}.{}{path}", self.domain)
    }

    fn map_transport_error(err: reqwest::Error) -> ProviderError {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            ProviderError::Connectivity(err.to_string())
        } else {
            ProviderError::Api(err.to_string())
        }
    }

    /// Distinguish "the sandbox is gone" from other agent-side failures.
    async fn check_envd_response(
        sandbox_id: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::NOT_FOUND
            || status == reqwest::StatusCode::BAD_GATEWAY
            || body.contains("not running")
        {
            return Err(ProviderError::SandboxStopped(format!(
                "sandbox {sandbox_id} is not running anymore (status {status})"
            )));
        }

        Err(ProviderError::Api(format!(
            "sandbox agent returned {status}: {body}"
        )))
    }
}

#[async_trait]
impl SandboxProvider for E2bProvider {
    async fn create_sandbox(&self, template: &str) -> Result<SandboxHandle> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .post(format!("{}/sandboxes", self.api_url))
            .header("X-API-KEY", api_key)
            .json(&CreateSandboxBody {
                template_id: template,
                timeout: SANDBOX_TIMEOUT_SECS,
            })
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!(
                "create sandbox failed with {status}: {body}"
            )));
        }

        let created: CreateSandboxResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Api(format!("invalid create response: {e}")))?;

        debug!(sandbox_id = %created.sandbox_id, template, "created sandbox");

        Ok(SandboxHandle {
            sandbox_id: created.sandbox_id,
            template: template.to_string(),
        })
    }

    async fn run_command(
        &self,
        sandbox_id: &str,
        command: &str,
        opts: RunOptions,
    ) -> Result<CommandOutput> {
        let response = self
            .client
            .post(self.envd_url(sandbox_id, "/commands"))
            .json(&RunCommandBody {
                cmd: command,
                cwd: opts.cwd.as_deref(),
                background: opts.background,
            })
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let response = Self::check_envd_response(sandbox_id, response).await?;

        // Background commands return before producing output.
        if opts.background {
            return Ok(CommandOutput::default());
        }

        let run: RunCommandResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Api(format!("invalid command response: {e}")))?;

        if run.exit_code != 0 {
            return Err(ProviderError::CommandFailed {
                exit_code: run.exit_code,
                detail: if run.stderr.is_empty() {
                    run.stdout
                } else {
                    run.stderr
                },
            });
        }

        Ok(CommandOutput {
            stdout: run.stdout,
            stderr: run.stderr,
            exit_code: run.exit_code,
        })
    }

    async fn write_file(&self, sandbox_id: &str, path: &str, content: &str) -> Result<()> {
        let response = self
            .client
            .put(self.envd_url(sandbox_id, "/files"))
            .query(&[("path", path)])
            .body(content.to_string())
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        Self::check_envd_response(sandbox_id, response).await?;
        Ok(())
    }

    async fn expose_port(&self, _sandbox_id: &str, _port: u16) -> Result<()> {
        // Every sandbox port is reachable through the public gateway already.
        Ok(())
    }

    async fn resolve_public_url(&self, _sandbox_id: &str, _port: u16) -> Result<Option<String>> {
        // The control plane does not hand out pre-resolved URLs; callers
        // build one from the hostname below.
        Ok(None)
    }

    async fn resolve_host(&self, sandbox_id: &str, port: u16) -> Result<Option<String>> {
        Ok(Some(format!("{port}-{sandbox_id}.{}", self.domain)))
    }

    fn public_domain(&self) -> &str {
        &self.domain
    }

    async fn destroy_sandbox(&self, sandbox_id: &str) -> Result<()> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .delete(format!("{}/sandboxes/{sandbox_id}", self.api_url))
            .header("X-API-KEY", api_key)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        // Destroying an already-gone sandbox is a no-op.
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::Api(format!(
            "destroy sandbox failed with {status}: {body}"
        )))
    }
}
