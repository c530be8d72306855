// ABOUTME: Preview orchestrator - the sequential phase machine from allocation to readiness
// ABOUTME: Deploys the compiled file set into a sandbox and confirms the dev server is serving

use crate::probe::ReadinessProber;
use crate::retry::{run_with_retries, RetryPolicy};
use crate::paths::sanitize_relative_path;
use crate::types::{
    PreviewError, PreviewRequest, PreviewResponse, PreviewResult, ReadinessReport, StepOutcome,
};
use futures::future::try_join_all;
use scenebox_config::Settings;
use scenebox_sandbox::{
    AllocateRequest, RunOptions, SandboxAllocator, SandboxProvider,
};
use scenebox_scenes::{
    build_from_bundle, build_from_sources, SceneFile, SceneInput, MANIFEST_FILE, SCENES_DIR,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed orchestration parameters, resolved once at startup.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Fixed dev-server port. Not randomized: nonstandard ports are fragile
    /// to route through the provider edge.
    pub studio_port: u16,
    /// Fixed, pre-provisioned project directory inside the sandbox.
    pub project_dir: String,
    pub warmup_attempts: u32,
    pub warmup_base_delay: Duration,
    pub ready_attempts: u32,
    pub ready_interval: Duration,
    pub write_batch_size: usize,
}

impl PreviewConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            studio_port: settings.studio_port,
            project_dir: settings.base_project_dir.clone(),
            warmup_attempts: 5,
            warmup_base_delay: Duration::from_millis(800),
            ready_attempts: settings.ready_attempts,
            ready_interval: Duration::from_millis(settings.ready_interval_ms),
            write_batch_size: 50,
        }
    }
}

struct PendingWrite {
    remote_path: String,
    code: String,
}

/// Composes the allocator, the scene compiler, and the provider capability
/// into the preview-creation state machine.
pub struct PreviewFlow {
    allocator: Arc<SandboxAllocator>,
    provider: Arc<dyn SandboxProvider>,
    config: PreviewConfig,
}

impl PreviewFlow {
    pub fn new(allocator: Arc<SandboxAllocator>, config: PreviewConfig) -> Self {
        let provider = allocator.provider();
        Self {
            allocator,
            provider,
            config,
        }
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.warmup_attempts, self.config.warmup_base_delay)
    }

    /// Create a preview: allocate, warm up, verify, compile, deploy, expose,
    /// and (optionally) wait for the dev server to answer.
    pub async fn create_preview(&self, request: PreviewRequest) -> PreviewResult<PreviewResponse> {
        // Phase 1: identifiers
        let job_id = request
            .job_id
            .clone()
            .unwrap_or_else(|| self.allocator.create_job_id());
        let port = self.config.studio_port;
        let project_dir = self.config.project_dir.clone();

        info!(
            %job_id,
            port,
            start_dev = request.start_dev,
            wait_for_ready = request.wait_for_ready,
            "creating preview"
        );

        // Phase 2: allocate
        let allocated = self
            .allocator
            .allocate(AllocateRequest {
                user_id: request.user_id.clone(),
                template_id: request.template_id.clone(),
                template_name: request.template_name.clone(),
                studio_port: Some(port),
            })
            .await?;
        let sandbox_id = allocated.sandbox_id.clone();
        info!(%sandbox_id, preview_url = %allocated.preview_url, "sandbox allocated");

        // Phase 3: warm-up absorbs the control plane's occasional
        // not-yet-ready state
        run_with_retries(self.retry_policy(), || {
            self.provider
                .run_command(&sandbox_id, r#"bash -lc "echo envd_ok""#, RunOptions::default())
        })
        .await?;
        debug!(%sandbox_id, "warm-up complete");

        // Phase 4: the project skeleton must already be provisioned
        self.verify_project_dir(&sandbox_id, &project_dir).await?;

        // Phase 5: compile & classify
        let input = SceneInput::classify(request.bundle.clone(), request.scenes.clone())?;
        let (files, compiler_mode) = match &input {
            SceneInput::Bundle(bundle) => (build_from_bundle(bundle)?.files, true),
            SceneInput::Sources(sources) => (build_from_sources(sources)?.files, true),
            SceneInput::Files(files) => (files.clone(), false),
        };
        info!(%sandbox_id, files = files.len(), compiler_mode, "input compiled");

        // Phase 6: stale scenes must never linger under a fresh manifest
        if compiler_mode {
            let outcome = self.clear_scenes(&sandbox_id, &project_dir).await;
            if let StepOutcome::Failed(reason) = &outcome {
                warn!(%sandbox_id, %reason, "clearing previous scenes failed, continuing");
            }
        }

        // Phase 7: materialize
        self.write_files(&sandbox_id, &project_dir, &files).await?;

        // Phase 8: port exposure is best-effort; the dev process may already
        // be listening from sandbox boot
        if request.start_dev {
            let outcome = self.ensure_port_exposed(&sandbox_id, port).await;
            if let StepOutcome::Failed(reason) = &outcome {
                warn!(%sandbox_id, port, %reason, "port exposure failed, continuing");
            }
        }

        // Phase 9: readiness
        let readiness = if request.start_dev && request.wait_for_ready {
            let prober = ReadinessProber::new(
                Arc::clone(&self.provider),
                self.config.ready_attempts,
                self.config.ready_interval,
            );
            let (snapshot, ready) = prober
                .wait_until_ready(&sandbox_id, port, &allocated.preview_url)
                .await?;
            Some(ReadinessReport::from_snapshot(&snapshot, ready))
        } else {
            None
        };

        Ok(PreviewResponse {
            sandbox_id,
            job_id,
            preview_url: allocated.preview_url,
            project_dir,
            readiness,
        })
    }

    /// Confirm the project directory carries recognizable project markers.
    /// Retried under the warm-up policy: the check rides the same
    /// control-plane readiness as phase 3.
    async fn verify_project_dir(&self, sandbox_id: &str, project_dir: &str) -> PreviewResult<()> {
        let command = format!(
            r#"bash -lc 'if [ -f "{dir}/package.json" ] || [ -f "{dir}/remotion.config.ts" ]; then echo present; else echo missing; fi'"#,
            dir = project_dir,
        );

        let output = run_with_retries(self.retry_policy(), || {
            self.provider
                .run_command(sandbox_id, &command, RunOptions::default())
        })
        .await?;

        if output.stdout.contains("present") {
            debug!(sandbox_id, project_dir, "project markers found");
            Ok(())
        } else {
            Err(PreviewError::ProjectMissing {
                dir: project_dir.to_string(),
            })
        }
    }

    /// Best-effort removal of previously generated scene files and manifest.
    async fn clear_scenes(&self, sandbox_id: &str, project_dir: &str) -> StepOutcome {
        let command = format!(
            r#"bash -lc 'rm -f "{dir}/{scenes}/"*.tsx "{dir}/{scenes}/{manifest}"'"#,
            dir = project_dir,
            scenes = SCENES_DIR,
            manifest = MANIFEST_FILE,
        );

        match self
            .provider
            .run_command(sandbox_id, &command, RunOptions::default())
            .await
        {
            Ok(_) => {
                debug!(sandbox_id, "cleared previous scenes");
                StepOutcome::Completed
            }
            Err(e) => StepOutcome::Failed(e.to_string()),
        }
    }

    /// Create parent directories, then write all files in sequential batches
    /// with concurrent writes inside each batch. Batching bounds peak
    /// concurrency on the sandbox file channel.
    async fn write_files(
        &self,
        sandbox_id: &str,
        project_dir: &str,
        files: &[SceneFile],
    ) -> PreviewResult<()> {
        let mut dirs: BTreeSet<String> = BTreeSet::new();
        let mut writes: Vec<PendingWrite> = Vec::with_capacity(files.len());

        for file in files {
            let rel = sanitize_relative_path(&file.file_path)?;
            let remote_path = format!("{project_dir}/{rel}");
            if let Some(parent) = remote_path.rsplit_once('/').map(|(d, _)| d.to_string()) {
                if !parent.is_empty() {
                    dirs.insert(parent);
                }
            }
            writes.push(PendingWrite {
                remote_path,
                code: file.code.clone(),
            });
        }

        if !dirs.is_empty() {
            let quoted: Vec<String> = dirs.iter().map(|d| format!("'{d}'")).collect();
            let command = format!(r#"bash -lc "mkdir -p {}""#, quoted.join(" "));
            self.provider
                .run_command(sandbox_id, &command, RunOptions::default())
                .await?;
        }

        info!(sandbox_id, files = writes.len(), "writing files");
        for batch in writes.chunks(self.config.write_batch_size) {
            try_join_all(batch.iter().map(|w| {
                self.provider
                    .write_file(sandbox_id, &w.remote_path, &w.code)
            }))
            .await?;
        }

        Ok(())
    }

    /// Try each supported exposure mechanism in sequence. All failures are
    /// recorded rather than thrown.
    async fn ensure_port_exposed(&self, sandbox_id: &str, port: u16) -> StepOutcome {
        let mut failures: Vec<String> = Vec::new();

        match self.provider.expose_port(sandbox_id, port).await {
            Ok(()) => {
                debug!(sandbox_id, port, mechanism = "expose_port", "port exposed");
                return StepOutcome::Completed;
            }
            Err(e) => failures.push(format!("expose_port: {e}")),
        }

        match self.provider.resolve_public_url(sandbox_id, port).await {
            Ok(Some(_)) => {
                debug!(sandbox_id, port, mechanism = "resolve_public_url", "port exposed");
                return StepOutcome::Completed;
            }
            Ok(None) => {}
            Err(e) => failures.push(format!("resolve_public_url: {e}")),
        }

        match self.provider.resolve_host(sandbox_id, port).await {
            Ok(Some(_)) => {
                debug!(sandbox_id, port, mechanism = "resolve_host", "port exposed");
                return StepOutcome::Completed;
            }
            Ok(None) => {}
            Err(e) => failures.push(format!("resolve_host: {e}")),
        }

        if failures.is_empty() {
            StepOutcome::Skipped
        } else {
            StepOutcome::Failed(failures.join("; "))
        }
    }
}
