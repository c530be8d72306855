use scenebox_sandbox::ProviderError;
use scenebox_scenes::{SceneBundle, SceneEntry, SceneError};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Request for one preview orchestration call.
///
/// Exactly one of `bundle` or `scenes` must be present; `scenes` is either
/// all source strings or all `{filePath, code}` objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub user_id: Option<String>,
    pub job_id: Option<String>,
    pub template_id: Option<String>,
    pub template_name: Option<String>,

    #[serde(default)]
    pub bundle: Option<SceneBundle>,
    #[serde(default)]
    pub scenes: Option<Vec<SceneEntry>>,

    #[serde(default = "default_true")]
    pub start_dev: bool,
    #[serde(default)]
    pub wait_for_ready: bool,
}

/// Diagnostic state of one probed endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointProbe {
    pub status: Option<u16>,
    pub error: Option<String>,
}

impl EndpointProbe {
    pub fn from_status(status: u16) -> Self {
        Self {
            status: Some(status),
            error: None,
        }
    }

    pub fn from_error(error: impl ToString) -> Self {
        Self {
            status: None,
            error: Some(error.to_string()),
        }
    }

    /// Reachable: answered with anything below a server error.
    pub fn ok(&self) -> bool {
        matches!(self.status, Some(s) if (200..500).contains(&s))
    }
}

/// Both probe targets as seen from one vantage point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VantageProbe {
    pub root: EndpointProbe,
    pub bundle: EndpointProbe,
}

impl VantageProbe {
    /// The bundle asset is decisive: compile/reload windows can make the
    /// document root transiently slow without the app being broken.
    pub fn ready(&self) -> bool {
        self.bundle.ok()
    }
}

/// One readiness iteration's view from both sides of the sandbox boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeSnapshot {
    pub internal: VantageProbe,
    pub external: VantageProbe,
}

impl ProbeSnapshot {
    /// The caller consumes the public URL, so the external vantage decides.
    pub fn ready(&self) -> bool {
        self.external.ready()
    }
}

/// Reachability diagnostics returned to the caller when a readiness probe
/// ran. Flattened into the preview response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    pub ready: bool,

    pub dev_server_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_server_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_server_error: Option<String>,

    pub dev_bundle_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_bundle_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_bundle_error: Option<String>,

    pub sandbox_server_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_server_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_server_error: Option<String>,

    pub sandbox_bundle_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_bundle_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_bundle_error: Option<String>,
}

impl ReadinessReport {
    pub fn from_snapshot(snapshot: &ProbeSnapshot, ready: bool) -> Self {
        Self {
            ready,
            dev_server_reachable: snapshot.external.root.ok(),
            dev_server_status: snapshot.external.root.status,
            dev_server_error: snapshot.external.root.error.clone(),
            dev_bundle_reachable: snapshot.external.bundle.ok(),
            dev_bundle_status: snapshot.external.bundle.status,
            dev_bundle_error: snapshot.external.bundle.error.clone(),
            sandbox_server_reachable: snapshot.internal.root.ok(),
            sandbox_server_status: snapshot.internal.root.status,
            sandbox_server_error: snapshot.internal.root.error.clone(),
            sandbox_bundle_reachable: snapshot.internal.bundle.ok(),
            sandbox_bundle_status: snapshot.internal.bundle.status,
            sandbox_bundle_error: snapshot.internal.bundle.error.clone(),
        }
    }
}

/// Result of one preview orchestration call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub sandbox_id: String,
    pub job_id: String,
    pub preview_url: String,
    pub project_dir: String,

    /// Present only when a readiness probe ran; `None` flattens to nothing.
    #[serde(flatten)]
    pub readiness: Option<ReadinessReport>,
}

/// Outcome of a best-effort step: recorded and logged, never propagated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Skipped,
    Failed(String),
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

/// Failures raised by the preview orchestrator and local push.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// Malformed or ambiguous input. Never retried.
    #[error(transparent)]
    Validation(#[from] SceneError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("invalid filePath: {path}")]
    InvalidPath { path: String },

    #[error("project directory {dir} is missing expected project markers")]
    ProjectMissing { dir: String },

    #[error("sandbox stopped while waiting for dev server: {message}")]
    SandboxStopped { message: String },

    #[error("projectDir must be an absolute path: {dir}")]
    RelativeProjectDir { dir: String },

    #[error("subdirectory writes are not allowed when pushing straight into a scenes dir: {path}")]
    SubdirInScenesDir { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PreviewError {
    /// Whether this is a caller-input problem rather than a system fault.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PreviewError::Validation(_)
                | PreviewError::InvalidPath { .. }
                | PreviewError::RelativeProjectDir { .. }
                | PreviewError::SubdirInScenesDir { .. }
        )
    }
}

/// Result type for preview operations.
pub type PreviewResult<T> = Result<T, PreviewError>;
