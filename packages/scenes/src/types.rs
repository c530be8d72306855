use serde::{Deserialize, Serialize};

/// Frame rate used for all duration math and the emitted manifest.
pub const FPS: u32 = 30;

/// Duration assigned to a scene when nothing declares one.
pub const DEFAULT_DURATION_FRAMES: u32 = 90;

/// Directory (relative to the project root) that holds generated scenes.
pub const SCENES_DIR: &str = "src/scenes";

/// Manifest file name inside [`SCENES_DIR`].
pub const MANIFEST_FILE: &str = "manifest.json";

/// A single file write: relative path plus content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneFile {
    pub file_path: String,
    pub code: String,
}

/// Paired-input mode: scene metadata (JSON) and scene sources supplied
/// separately by the upstream generator.
///
/// The snake_case keys are part of the generator's wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneBundle {
    pub json_string: String,
    pub code_array: Vec<String>,
}

/// A scene after normalization and metadata derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedScene {
    pub id: String,
    pub name: String,
    pub duration_in_frames: u32,
    pub code: String,
}

/// Manifest entry for one scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestScene {
    pub id: String,
    pub name: String,
    pub duration_in_frames: u32,
    pub component: String,
}

/// Generated manifest enumerating all scenes plus fixed presentation
/// parameters. Regenerated in full on every compile, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub theme: String,
    pub scenes: Vec<ManifestScene>,
}

impl Manifest {
    pub fn new(scenes: Vec<ManifestScene>) -> Self {
        Self {
            version: "1.0.0".to_string(),
            fps: FPS,
            width: 1920,
            height: 1080,
            theme: "tech".to_string(),
            scenes,
        }
    }
}

/// Result of a compile: enriched scenes, the manifest, and the ordered file
/// set to deploy (one file per scene, manifest last).
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub enriched_scenes: Vec<EnrichedScene>,
    pub manifest: Manifest,
    pub files: Vec<SceneFile>,
}

/// Validation failures raised while classifying or compiling scene input.
/// Never retried; always surfaced with the offending index or field.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("scenes must be a non-empty array")]
    EmptyInput,

    #[error("scenes[{index}] must be a non-empty string")]
    EmptyScene { index: usize },

    #[error("scenes[{index}] must contain an `export default` component")]
    MissingDefaultExport { index: usize },

    #[error("scenes[{index}] has no extractable function name; use `export default function Name()`")]
    MissingFunctionName { index: usize },

    #[error("invalid scene id: {id:?}")]
    InvalidSceneId { id: String },

    #[error("json_string must be a non-empty string")]
    EmptyBundleJson,

    #[error("code_array must be a non-empty array")]
    EmptyBundleCode,

    #[error("failed to parse json_string: {reason}")]
    BundleJsonParse { reason: String },

    #[error("json_string must contain a non-empty `scenes` array")]
    MissingScenesArray,

    #[error("code_array contains no sources with an `export default` component")]
    NoUsableSources,

    #[error("no source code left for scene: {id}")]
    NoSourceForScene { id: String },

    #[error("scenes must be all source strings or all {{filePath, code}} objects")]
    MixedSceneShapes,

    #[error("request must provide exactly one of `bundle` or `scenes`")]
    AmbiguousInput,

    #[error("request must provide `bundle` or `scenes`")]
    MissingInput,
}

/// Result type for scene compilation operations.
pub type SceneResult<T> = Result<T, SceneError>;
