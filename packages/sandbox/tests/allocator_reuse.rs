// ABOUTME: Integration tests for allocator reuse semantics with a scripted provider
// ABOUTME: Covers cache hits, liveness-probe eviction, destroy tolerance, and URL fallback

use async_trait::async_trait;
use scenebox_sandbox::{
    AllocateRequest, AllocatorConfig, CommandOutput, ProviderError, ReuseCache, RunOptions,
    SandboxAllocator, SandboxHandle, SandboxProvider, SandboxStatus,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Scripted in-memory provider. Counts creations and can be told to fail
/// liveness probes or host resolution.
#[derive(Default)]
struct ScriptedProvider {
    created: AtomicUsize,
    destroyed: AtomicUsize,
    fail_commands: AtomicBool,
    resolve_host: AtomicBool,
}

impl ScriptedProvider {
    fn with_host_resolution() -> Self {
        let p = Self::default();
        p.resolve_host.store(true, Ordering::SeqCst);
        p
    }
}

#[async_trait]
impl SandboxProvider for ScriptedProvider {
    async fn create_sandbox(&self, template: &str) -> Result<SandboxHandle, ProviderError> {
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SandboxHandle {
            sandbox_id: format!("sbx-{n}"),
            template: template.to_string(),
        })
    }

    async fn run_command(
        &self,
        sandbox_id: &str,
        _command: &str,
        _opts: RunOptions,
    ) -> Result<CommandOutput, ProviderError> {
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(ProviderError::SandboxStopped(format!(
                "sandbox {sandbox_id} is not running anymore"
            )));
        }
        Ok(CommandOutput {
            stdout: "ping\n".to_string(),
            ..Default::default()
        })
    }

    async fn write_file(
        &self,
        _sandbox_id: &str,
        _path: &str,
        _content: &str,
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn expose_port(&self, _sandbox_id: &str, _port: u16) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn resolve_public_url(
        &self,
        _sandbox_id: &str,
        _port: u16,
    ) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }

    async fn resolve_host(
        &self,
        sandbox_id: &str,
        port: u16,
    ) -> Result<Option<String>, ProviderError> {
        if self.resolve_host.load(Ordering::SeqCst) {
            Ok(Some(format!("{port}-{sandbox_id}.edge.mock.dev")))
        } else {
            Ok(None)
        }
    }

    fn public_domain(&self) -> &str {
        "mock.dev"
    }

    async fn destroy_sandbox(&self, _sandbox_id: &str) -> Result<(), ProviderError> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn allocator_with(provider: Arc<ScriptedProvider>) -> SandboxAllocator {
    SandboxAllocator::new(
        provider,
        AllocatorConfig {
            template_id: None,
            template_name: "studio-template".to_string(),
            studio_port: 3000,
        },
        ReuseCache::new(),
    )
}

fn request_for(user: &str) -> AllocateRequest {
    AllocateRequest {
        user_id: Some(user.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn same_identity_reuses_sandbox_while_alive() {
    let provider = Arc::new(ScriptedProvider::default());
    let allocator = allocator_with(Arc::clone(&provider));

    let first = allocator.allocate(request_for("u1")).await.unwrap();
    let second = allocator.allocate(request_for("u1")).await.unwrap();

    assert_eq!(first.sandbox_id, second.sandbox_id);
    assert_eq!(provider.created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_liveness_probe_evicts_and_recreates() {
    let provider = Arc::new(ScriptedProvider::default());
    let allocator = allocator_with(Arc::clone(&provider));

    let first = allocator.allocate(request_for("u1")).await.unwrap();

    provider.fail_commands.store(true, Ordering::SeqCst);
    // create still works; only the probe path fails
    let second = allocator.allocate(request_for("u1")).await.unwrap();

    assert_ne!(first.sandbox_id, second.sandbox_id);
    assert_eq!(provider.created.load(Ordering::SeqCst), 2);

    // The stale entry is gone: with probes healthy again, the new sandbox is
    // the one that gets reused.
    provider.fail_commands.store(false, Ordering::SeqCst);
    let third = allocator.allocate(request_for("u1")).await.unwrap();
    assert_eq!(second.sandbox_id, third.sandbox_id);
    assert_eq!(provider.created.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn anonymous_callers_never_share() {
    let provider = Arc::new(ScriptedProvider::default());
    let allocator = allocator_with(Arc::clone(&provider));

    let first = allocator.allocate(AllocateRequest::default()).await.unwrap();
    let second = allocator.allocate(AllocateRequest::default()).await.unwrap();

    assert_ne!(first.sandbox_id, second.sandbox_id);
    assert_eq!(provider.created.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn distinct_ports_get_distinct_sandboxes() {
    let provider = Arc::new(ScriptedProvider::default());
    let allocator = allocator_with(Arc::clone(&provider));

    let a = allocator
        .allocate(AllocateRequest {
            user_id: Some("u1".to_string()),
            studio_port: Some(3000),
            ..Default::default()
        })
        .await
        .unwrap();
    let b = allocator
        .allocate(AllocateRequest {
            user_id: Some("u1".to_string()),
            studio_port: Some(3100),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_ne!(a.sandbox_id, b.sandbox_id);
}

#[tokio::test]
async fn preview_url_uses_host_then_template_fallback() {
    let with_host = Arc::new(ScriptedProvider::with_host_resolution());
    let allocator = allocator_with(Arc::clone(&with_host));
    let result = allocator.allocate(AllocateRequest::default()).await.unwrap();
    assert_eq!(result.preview_url, "https://3000-sbx-1.edge.mock.dev");

    let without_host = Arc::new(ScriptedProvider::default());
    let allocator = allocator_with(Arc::clone(&without_host));
    let result = allocator.allocate(AllocateRequest::default()).await.unwrap();
    assert_eq!(result.preview_url, "https://3000-sbx-1.mock.dev");
}

#[tokio::test]
async fn destroy_unknown_id_is_noop() {
    let provider = Arc::new(ScriptedProvider::default());
    let allocator = allocator_with(Arc::clone(&provider));

    allocator.destroy("never-created").await.unwrap();
    assert_eq!(provider.destroyed.load(Ordering::SeqCst), 0);

    let created = allocator.allocate(AllocateRequest::default()).await.unwrap();
    allocator.destroy(&created.sandbox_id).await.unwrap();
    assert_eq!(provider.destroyed.load(Ordering::SeqCst), 1);
    assert!(!allocator.knows(&created.sandbox_id).await);
}

#[tokio::test]
async fn status_is_unknown_stub() {
    let provider = Arc::new(ScriptedProvider::default());
    let allocator = allocator_with(provider);

    let status = allocator.status("whatever").await;
    assert_eq!(status.status, SandboxStatus::Unknown);
    assert_eq!(status.sandbox_id, "whatever");
}
