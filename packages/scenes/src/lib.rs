//! Scenebox Scenes - the scene compiler.
//!
//! Validates and normalizes heterogeneous scene input (a metadata bundle, a
//! flat array of self-describing sources, or direct file writes) into a
//! deterministic set of `(path, content)` writes plus a manifest describing
//! each scene's id, display name, and duration.
//!
//! Compilation is pure: the same input always yields byte-identical output.

pub mod compiler;
pub mod ids;
pub mod input;
pub mod metadata;
pub mod normalize;
pub mod types;

pub use compiler::{build_from_bundle, build_from_sources, manifest_path, render_manifest, scene_component_path};
pub use input::{SceneEntry, SceneInput};
pub use normalize::{maybe_unescape_code, normalize_scene_code};
pub use types::{
    BuildOutput, EnrichedScene, Manifest, ManifestScene, SceneBundle, SceneError, SceneFile,
    SceneResult, DEFAULT_DURATION_FRAMES, FPS, MANIFEST_FILE, SCENES_DIR,
};
