//! Scenebox Preview - the preview orchestration engine.
//!
//! Composes the sandbox allocator and the scene compiler with the provider
//! capability: allocates a sandbox, deploys the compiled file set, exposes
//! the dev port, and runs a dual-vantage readiness probe whose exhaustion
//! degrades to diagnostics instead of an error.
//!
//! A secondary local-push boundary writes the same compiled file set to a
//! host path for local development loops.

pub mod flow;
pub mod local_push;
pub mod paths;
pub mod probe;
pub mod retry;
pub mod types;

pub use flow::{PreviewConfig, PreviewFlow};
pub use local_push::{LocalPushReport, LocalPushRequest, LocalPusher, PushMode};
pub use probe::ReadinessProber;
pub use retry::{run_with_retries, RetryPolicy};
pub use types::{
    EndpointProbe, PreviewError, PreviewRequest, PreviewResponse, PreviewResult, ProbeSnapshot,
    ReadinessReport, StepOutcome, VantageProbe,
};
