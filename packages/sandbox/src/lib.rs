//! Scenebox Sandbox - provider capability and identity-scoped allocation.
//!
//! The [`SandboxProvider`] trait is the system's sole external contract with
//! sandbox compute: create/destroy an isolated environment, run a shell
//! command (optionally backgrounded), write a file, expose a TCP port, and
//! resolve a public URL for a port. [`SandboxAllocator`] composes a provider
//! with an injected [`ReuseCache`] to avoid re-provisioning sandboxes for the
//! same logical caller.

pub mod allocator;
pub mod providers;
pub mod reuse;

pub use allocator::{
    AllocateRequest, AllocateResult, AllocatorConfig, SandboxAllocator, SandboxStatus, StatusResult,
};
pub use providers::{
    CommandOutput, E2bProvider, ProviderError, RunOptions, SandboxHandle, SandboxProvider,
};
pub use reuse::{ReuseCache, ReuseEntry};
