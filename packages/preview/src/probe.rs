// ABOUTME: Dual-vantage readiness probing - loopback from inside the sandbox, HTTP from outside
// ABOUTME: Bounded loop that degrades to a diagnostic snapshot instead of failing on exhaustion

use crate::types::{EndpointProbe, PreviewError, PreviewResult, ProbeSnapshot, VantageProbe};
use scenebox_sandbox::{ProviderError, RunOptions, SandboxProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Readiness prober configuration and clients.
///
/// The internal vantage runs `curl` against loopback inside the sandbox with
/// a short timeout; the external vantage requests the public preview URL from
/// this process with a longer timeout, since it traverses the provider edge.
pub struct ReadinessProber {
    provider: Arc<dyn SandboxProvider>,
    client: reqwest::Client,
    pub attempts: u32,
    pub interval: Duration,
    pub external_timeout: Duration,
    pub internal_timeout_secs: u32,
}

impl ReadinessProber {
    pub fn new(provider: Arc<dyn SandboxProvider>, attempts: u32, interval: Duration) -> Self {
        Self {
            provider,
            client: reqwest::Client::new(),
            attempts,
            interval,
            external_timeout: Duration::from_secs(8),
            internal_timeout_secs: 2,
        }
    }

    async fn external_endpoint(&self, url: &str, head_first: bool) -> EndpointProbe {
        if head_first {
            if let Ok(response) = self
                .client
                .head(url)
                .timeout(self.external_timeout)
                .send()
                .await
            {
                let status = response.status().as_u16();
                // Some dev servers reject HEAD; retry the target with GET
                // before counting it against readiness.
                if (200..500).contains(&status) {
                    return EndpointProbe::from_status(status);
                }
            }
        }

        match self
            .client
            .get(url)
            .timeout(self.external_timeout)
            .send()
            .await
        {
            Ok(response) => EndpointProbe::from_status(response.status().as_u16()),
            Err(e) => EndpointProbe::from_error(e),
        }
    }

    /// Probe the public preview URL from this process.
    pub async fn probe_external(&self, preview_url: &str) -> VantageProbe {
        let base = preview_url.trim_end_matches('/');
        let root = self.external_endpoint(&format!("{base}/"), false).await;
        let bundle = self
            .external_endpoint(&format!("{base}/bundle.js"), true)
            .await;
        VantageProbe { root, bundle }
    }

    async fn internal_endpoint(
        &self,
        sandbox_id: &str,
        port: u16,
        path: &str,
    ) -> Result<EndpointProbe, PreviewError> {
        let command = format!(
            r#"bash -lc "curl -s -o /dev/null -m {timeout} -w '%{{http_code}}' http://127.0.0.1:{port}{path} || true""#,
            timeout = self.internal_timeout_secs,
        );

        match self
            .provider
            .run_command(sandbox_id, &command, RunOptions::default())
            .await
        {
            Ok(output) => {
                let code = output.stdout.trim();
                match code.parse::<u16>() {
                    Ok(status) if status > 0 => Ok(EndpointProbe::from_status(status)),
                    _ => Ok(EndpointProbe::from_error(format!(
                        "no HTTP response on loopback port {port}"
                    ))),
                }
            }
            // A stopped sandbox is terminal for the whole call.
            Err(ProviderError::SandboxStopped(message)) => {
                Err(PreviewError::SandboxStopped { message })
            }
            Err(e) => Ok(EndpointProbe::from_error(e)),
        }
    }

    /// Probe loopback from inside the sandbox.
    pub async fn probe_internal(
        &self,
        sandbox_id: &str,
        port: u16,
    ) -> Result<VantageProbe, PreviewError> {
        let root = self.internal_endpoint(sandbox_id, port, "/").await?;
        let bundle = self.internal_endpoint(sandbox_id, port, "/bundle.js").await?;
        Ok(VantageProbe { root, bundle })
    }

    /// Run the readiness loop. Returns the last snapshot and whether the dev
    /// server became ready within the attempt budget.
    ///
    /// Exhaustion is not an error: the caller receives the diagnostics and
    /// decides whether to retry. The only hard failure is a sandbox that
    /// stopped mid-wait.
    pub async fn wait_until_ready(
        &self,
        sandbox_id: &str,
        port: u16,
        preview_url: &str,
    ) -> PreviewResult<(ProbeSnapshot, bool)> {
        let mut snapshot = ProbeSnapshot::default();

        for attempt in 1..=self.attempts.max(1) {
            // Both directions complete before the iteration's decision; they
            // are independent checks, not required to interleave.
            let (internal, external) = tokio::join!(
                self.probe_internal(sandbox_id, port),
                self.probe_external(preview_url),
            );
            let internal = internal?;

            snapshot = ProbeSnapshot { internal, external };

            if snapshot.ready() {
                info!(sandbox_id, attempt, "dev server ready");
                return Ok((snapshot, true));
            }

            debug!(
                sandbox_id,
                attempt,
                max_attempts = self.attempts,
                external_root = ?snapshot.external.root.status,
                external_bundle = ?snapshot.external.bundle.status,
                internal_root = ?snapshot.internal.root.status,
                "dev server not ready yet"
            );

            if attempt < self.attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        warn!(
            sandbox_id,
            attempts = self.attempts,
            "dev server not ready within probe budget, returning diagnostics"
        );
        Ok((snapshot, false))
    }
}
