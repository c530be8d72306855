use crate::types::{SceneBundle, SceneError, SceneFile, SceneResult};
use serde::{Deserialize, Serialize};

/// One element of the `scenes` request array: either a raw source string or
/// a direct `{filePath, code}` file write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SceneEntry {
    Source(String),
    File(SceneFile),
}

/// Classified scene input. Exactly one shape per request; mixing is rejected
/// during classification.
#[derive(Debug, Clone)]
pub enum SceneInput {
    /// Metadata JSON + source array, reconciled by the compiler.
    Bundle(SceneBundle),
    /// Self-describing source strings.
    Sources(Vec<String>),
    /// Direct file writes, deployed verbatim.
    Files(Vec<SceneFile>),
}

impl SceneInput {
    /// Classify the raw request parts into exactly one input shape.
    ///
    /// A request carrying both a bundle and a scenes array is ambiguous and
    /// rejected outright; a scenes array mixing strings and file objects is
    /// rejected as well.
    pub fn classify(
        bundle: Option<SceneBundle>,
        scenes: Option<Vec<SceneEntry>>,
    ) -> SceneResult<Self> {
        match (bundle, scenes) {
            (Some(_), Some(_)) => Err(SceneError::AmbiguousInput),
            (None, None) => Err(SceneError::MissingInput),
            (Some(bundle), None) => Ok(SceneInput::Bundle(bundle)),
            (None, Some(entries)) => {
                if entries.is_empty() {
                    return Err(SceneError::EmptyInput);
                }

                let all_sources = entries.iter().all(|e| matches!(e, SceneEntry::Source(_)));
                let all_files = entries.iter().all(|e| matches!(e, SceneEntry::File(_)));

                if all_sources {
                    Ok(SceneInput::Sources(
                        entries
                            .into_iter()
                            .map(|e| match e {
                                SceneEntry::Source(s) => s,
                                SceneEntry::File(_) => unreachable!(),
                            })
                            .collect(),
                    ))
                } else if all_files {
                    Ok(SceneInput::Files(
                        entries
                            .into_iter()
                            .map(|e| match e {
                                SceneEntry::File(f) => f,
                                SceneEntry::Source(_) => unreachable!(),
                            })
                            .collect(),
                    ))
                } else {
                    Err(SceneError::MixedSceneShapes)
                }
            }
        }
    }
}
