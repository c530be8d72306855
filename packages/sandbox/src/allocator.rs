// ABOUTME: Sandbox allocator - lifecycle of sandbox handles with identity-scoped reuse
// ABOUTME: Resolves templates and ports, probes cached sandboxes, falls back to fresh creation

use crate::providers::{ProviderError, Result, RunOptions, SandboxHandle, SandboxProvider};
use crate::reuse::ReuseCache;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Allocator-level defaults applied when a request leaves a field empty.
#[derive(Debug, Clone)]
pub struct AllocatorConfig {
    pub template_id: Option<String>,
    pub template_name: String,
    pub studio_port: u16,
}

/// Per-call allocation overrides.
#[derive(Debug, Clone, Default)]
pub struct AllocateRequest {
    pub user_id: Option<String>,
    pub template_id: Option<String>,
    pub template_name: Option<String>,
    pub studio_port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateResult {
    pub sandbox_id: String,
    pub preview_url: String,
}

/// Lifecycle status of a sandbox as known to the allocator.
/// Placeholder for future lifecycle tracking; currently always `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxStatus {
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResult {
    pub sandbox_id: String,
    pub status: SandboxStatus,
}

/// Manages sandbox handles for their lifetime: allocate with reuse, destroy,
/// status. The reuse cache is injected and owned explicitly; only sandboxes
/// this allocator created are ever cached.
pub struct SandboxAllocator {
    provider: Arc<dyn SandboxProvider>,
    config: AllocatorConfig,
    cache: ReuseCache,
    handles: RwLock<HashMap<String, SandboxHandle>>,
}

impl SandboxAllocator {
    pub fn new(provider: Arc<dyn SandboxProvider>, config: AllocatorConfig, cache: ReuseCache) -> Self {
        Self {
            provider,
            config,
            cache,
            handles: RwLock::new(HashMap::new()),
        }
    }

    pub fn provider(&self) -> Arc<dyn SandboxProvider> {
        Arc::clone(&self.provider)
    }

    /// Generate a fresh job id.
    pub fn create_job_id(&self) -> String {
        nanoid::nanoid!()
    }

    /// Template priority: per-call id, configured id, per-call name,
    /// configured name.
    fn resolve_template(&self, request: &AllocateRequest) -> String {
        request
            .template_id
            .clone()
            .or_else(|| self.config.template_id.clone())
            .or_else(|| request.template_name.clone())
            .unwrap_or_else(|| self.config.template_name.clone())
    }

    /// Preview URL for a sandbox port. Provider URL first, then hostname
    /// with a secure scheme, then the deterministic templated fallback.
    /// Resolution failures are swallowed; the fallback is always computable.
    pub async fn preview_url_for(&self, sandbox_id: &str, port: u16) -> String {
        match self.provider.resolve_public_url(sandbox_id, port).await {
            Ok(Some(url)) => return url,
            Ok(None) => {}
            Err(e) => debug!(sandbox_id, %e, "public URL resolution failed"),
        }

        match self.provider.resolve_host(sandbox_id, port).await {
            Ok(Some(host)) => return format!("https://{host}"),
            Ok(None) => {}
            Err(e) => debug!(sandbox_id, %e, "host resolution failed"),
        }

        format!(
            "https://{port}-{sandbox_id}.{}",
            self.provider.public_domain()
        )
    }

    /// Cheap liveness probe against a cached sandbox.
    async fn probe_liveness(&self, sandbox_id: &str) -> Result<()> {
        self.provider
            .run_command(sandbox_id, r#"bash -lc "echo ping""#, RunOptions::default())
            .await
            .map(|_| ())
    }

    /// Allocate a sandbox, reusing a cached one for the same identity,
    /// template, and port when it still answers a liveness probe.
    ///
    /// Concurrent calls for the same identity may race and each create a
    /// sandbox; the cache keeps whichever registered last.
    pub async fn allocate(&self, request: AllocateRequest) -> Result<AllocateResult> {
        let template = self.resolve_template(&request);
        let port = request.studio_port.unwrap_or(self.config.studio_port);

        let reuse_key = ReuseCache::key(&template, port, request.user_id.as_deref());

        if let Some(key) = &reuse_key {
            if let Some(entry) = self.cache.get(key).await {
                let known = self.handles.read().await.contains_key(&entry.sandbox_id);
                if known {
                    match self.probe_liveness(&entry.sandbox_id).await {
                        Ok(()) => {
                            let preview_url = self.preview_url_for(&entry.sandbox_id, port).await;
                            self.cache.touch(key).await;
                            info!(sandbox_id = %entry.sandbox_id, %key, "reusing cached sandbox");
                            return Ok(AllocateResult {
                                sandbox_id: entry.sandbox_id,
                                preview_url,
                            });
                        }
                        Err(e) => {
                            warn!(sandbox_id = %entry.sandbox_id, %e, "cached sandbox unresponsive, recreating");
                        }
                    }
                }
                self.cache.evict(key).await;
            }
        }

        let handle = self.provider.create_sandbox(&template).await?;
        let sandbox_id = handle.sandbox_id.clone();

        self.handles
            .write()
            .await
            .insert(sandbox_id.clone(), handle);

        let preview_url = self.preview_url_for(&sandbox_id, port).await;

        if let Some(key) = &reuse_key {
            self.cache.insert(key, &sandbox_id).await;
        }

        info!(%sandbox_id, %template, port, "allocated sandbox");

        Ok(AllocateResult {
            sandbox_id,
            preview_url,
        })
    }

    /// Whether this allocator created (and still tracks) the sandbox.
    pub async fn knows(&self, sandbox_id: &str) -> bool {
        self.handles.read().await.contains_key(sandbox_id)
    }

    /// Lifecycle status. Stub returning `unknown` until real tracking lands.
    pub async fn status(&self, sandbox_id: &str) -> StatusResult {
        StatusResult {
            sandbox_id: sandbox_id.to_string(),
            status: SandboxStatus::Unknown,
        }
    }

    /// Release a sandbox. Unknown ids are a no-op.
    pub async fn destroy(&self, sandbox_id: &str) -> Result<()> {
        let removed = self.handles.write().await.remove(sandbox_id);
        if removed.is_none() {
            debug!(sandbox_id, "destroy for unknown sandbox, ignoring");
            return Ok(());
        }

        match self.provider.destroy_sandbox(sandbox_id).await {
            Ok(()) => Ok(()),
            Err(ProviderError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
