// ABOUTME: Local push - writes the compiled scene file set straight to a host filesystem path
// ABOUTME: Shares the compiler and batching with the sandbox flow but skips allocation and readiness

use crate::paths::sanitize_relative_path;
use crate::types::{PreviewError, PreviewResult};
use futures::future::try_join_all;
use scenebox_scenes::{
    build_from_bundle, build_from_sources, maybe_unescape_code, SceneBundle, SceneEntry, SceneFile,
    SceneInput, MANIFEST_FILE,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPushRequest {
    /// Absolute host path: either a project root or a scenes directory
    /// (a path ending in `src/scenes`). Falls back to the configured local
    /// project dir, then the base project dir.
    pub project_dir: Option<String>,

    /// Clear previously generated `*.tsx` + manifest before writing.
    /// Applies to compiler modes only.
    #[serde(default = "default_true")]
    pub clear_scenes: bool,

    #[serde(default)]
    pub bundle: Option<SceneBundle>,
    #[serde(default)]
    pub scenes: Option<Vec<SceneEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushMode {
    /// Input went through the scene compiler.
    Compiled,
    /// Direct `{filePath, code}` writes.
    Files,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPushReport {
    pub project_dir: String,
    pub scenes_dir: String,
    pub base_is_scenes_dir: bool,
    pub mode: PushMode,
    pub cleared: bool,
    pub written_count: usize,
    pub written_files: Vec<String>,
}

/// Writes compiled scene files to a directory on the host running the
/// service. Used for local development loops; no sandbox involved.
pub struct LocalPusher {
    default_project_dir: Option<String>,
    base_project_dir: String,
    write_batch_size: usize,
}

impl LocalPusher {
    pub fn new(default_project_dir: Option<String>, base_project_dir: String) -> Self {
        Self {
            default_project_dir,
            base_project_dir,
            write_batch_size: 50,
        }
    }

    pub async fn push(&self, request: LocalPushRequest) -> PreviewResult<LocalPushReport> {
        let raw_dir = request
            .project_dir
            .clone()
            .or_else(|| self.default_project_dir.clone())
            .unwrap_or_else(|| self.base_project_dir.clone());
        let project_dir = raw_dir.trim().trim_end_matches(['/', '\\']).to_string();

        if !Path::new(&project_dir).is_absolute() {
            return Err(PreviewError::RelativeProjectDir { dir: project_dir });
        }

        let base_is_scenes_dir = project_dir
            .replace('\\', "/")
            .to_lowercase()
            .ends_with("/src/scenes");
        let scenes_dir: PathBuf = if base_is_scenes_dir {
            PathBuf::from(&project_dir)
        } else {
            Path::new(&project_dir).join("src").join("scenes")
        };

        let input = SceneInput::classify(request.bundle.clone(), request.scenes.clone())?;
        let (files, mode) = match &input {
            SceneInput::Bundle(bundle) => (build_from_bundle(bundle)?.files, PushMode::Compiled),
            SceneInput::Sources(sources) => {
                (build_from_sources(sources)?.files, PushMode::Compiled)
            }
            SceneInput::Files(files) => (files.clone(), PushMode::Files),
        };

        let cleared = if mode == PushMode::Compiled && request.clear_scenes {
            clear_scenes_dir(&scenes_dir).await;
            true
        } else {
            false
        };

        let files: Vec<SceneFile> = files
            .into_iter()
            .map(|f| SceneFile {
                code: maybe_unescape_code(&f.code),
                ..f
            })
            .collect();

        let mut written_files = Vec::with_capacity(files.len());
        for batch in files.chunks(self.write_batch_size) {
            let batch_written = try_join_all(batch.iter().map(|file| async {
                let rel = sanitize_relative_path(&file.file_path)?;
                let (abs, out) =
                    self.map_write_path(&rel, base_is_scenes_dir, &project_dir, &scenes_dir)?;

                if let Some(parent) = abs.parent() {
                    fs::create_dir_all(parent).await?;
                }
                fs::write(&abs, &file.code).await?;
                Ok::<String, PreviewError>(out)
            }))
            .await?;
            written_files.extend(batch_written);
        }

        info!(
            %project_dir,
            written = written_files.len(),
            cleared,
            "local push complete"
        );

        Ok(LocalPushReport {
            project_dir,
            scenes_dir: scenes_dir.to_string_lossy().to_string(),
            base_is_scenes_dir,
            mode,
            cleared,
            written_count: written_files.len(),
            written_files,
        })
    }

    /// When the base is already a scenes dir, accept both `src/scenes/x.tsx`
    /// (prefix stripped) and bare `x.tsx`, but never subdirectories.
    fn map_write_path(
        &self,
        rel: &str,
        base_is_scenes_dir: bool,
        project_dir: &str,
        scenes_dir: &Path,
    ) -> PreviewResult<(PathBuf, String)> {
        if !base_is_scenes_dir {
            return Ok((Path::new(project_dir).join(rel), rel.to_string()));
        }

        let out = rel.strip_prefix("src/scenes/").unwrap_or(rel);
        if out.contains('/') {
            return Err(PreviewError::SubdirInScenesDir {
                path: rel.to_string(),
            });
        }
        Ok((scenes_dir.join(out), out.to_string()))
    }
}

/// Best-effort removal of generated files in a scenes directory. Errors are
/// ignored; a missing directory simply means nothing to clear.
async fn clear_scenes_dir(scenes_dir: &Path) {
    if let Ok(mut entries) = fs::read_dir(scenes_dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let is_tsx = path.extension().is_some_and(|ext| ext == "tsx");
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_tsx && is_file {
                let _ = fs::remove_file(&path).await;
            }
        }
    }

    let _ = fs::remove_file(scenes_dir.join(MANIFEST_FILE)).await;
    debug!(scenes_dir = %scenes_dir.display(), "cleared scenes directory");
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenebox_scenes::SceneEntry;

    fn source_entry(name: &str) -> SceneEntry {
        SceneEntry::Source(format!(
            "export default function {name}() {{ return null; }}"
        ))
    }

    fn pusher() -> LocalPusher {
        LocalPusher::new(None, "/unused".to_string())
    }

    #[tokio::test]
    async fn test_push_compiles_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let report = pusher()
            .push(LocalPushRequest {
                project_dir: Some(dir.path().to_string_lossy().to_string()),
                clear_scenes: true,
                bundle: None,
                scenes: Some(vec![source_entry("Intro")]),
            })
            .await
            .unwrap();

        assert_eq!(report.mode, PushMode::Compiled);
        assert!(report.cleared);
        assert_eq!(report.written_count, 2);
        assert!(dir.path().join("src/scenes/intro.tsx").exists());
        assert!(dir.path().join("src/scenes/manifest.json").exists());
    }

    #[tokio::test]
    async fn test_push_clears_stale_scenes() {
        let dir = tempfile::tempdir().unwrap();
        let scenes = dir.path().join("src/scenes");
        fs::create_dir_all(&scenes).await.unwrap();
        fs::write(scenes.join("stale.tsx"), "old").await.unwrap();
        fs::write(scenes.join("manifest.json"), "{}").await.unwrap();
        fs::write(scenes.join("keep.ts"), "helper").await.unwrap();

        pusher()
            .push(LocalPushRequest {
                project_dir: Some(dir.path().to_string_lossy().to_string()),
                clear_scenes: true,
                bundle: None,
                scenes: Some(vec![source_entry("Fresh")]),
            })
            .await
            .unwrap();

        assert!(!scenes.join("stale.tsx").exists());
        assert!(scenes.join("fresh.tsx").exists());
        assert!(scenes.join("keep.ts").exists());
    }

    #[tokio::test]
    async fn test_push_into_scenes_dir_strips_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let scenes = dir.path().join("src").join("scenes");
        fs::create_dir_all(&scenes).await.unwrap();

        let report = pusher()
            .push(LocalPushRequest {
                project_dir: Some(scenes.to_string_lossy().to_string()),
                clear_scenes: false,
                bundle: None,
                scenes: Some(vec![source_entry("Direct")]),
            })
            .await
            .unwrap();

        assert!(report.base_is_scenes_dir);
        assert_eq!(report.written_files, vec!["direct.tsx", "manifest.json"]);
        assert!(scenes.join("direct.tsx").exists());
    }

    #[tokio::test]
    async fn test_push_rejects_subdir_when_base_is_scenes_dir() {
        let dir = tempfile::tempdir().unwrap();
        let scenes = dir.path().join("src").join("scenes");
        fs::create_dir_all(&scenes).await.unwrap();

        let err = pusher()
            .push(LocalPushRequest {
                project_dir: Some(scenes.to_string_lossy().to_string()),
                clear_scenes: false,
                bundle: None,
                scenes: Some(vec![SceneEntry::File(SceneFile {
                    file_path: "nested/dir/file.tsx".to_string(),
                    code: "x".to_string(),
                })]),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PreviewError::SubdirInScenesDir { .. }));
    }

    #[tokio::test]
    async fn test_push_rejects_relative_project_dir() {
        let err = pusher()
            .push(LocalPushRequest {
                project_dir: Some("relative/path".to_string()),
                clear_scenes: false,
                bundle: None,
                scenes: Some(vec![source_entry("X")]),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PreviewError::RelativeProjectDir { .. }));
    }

    #[tokio::test]
    async fn test_push_unescapes_double_escaped_code() {
        let dir = tempfile::tempdir().unwrap();
        pusher()
            .push(LocalPushRequest {
                project_dir: Some(dir.path().to_string_lossy().to_string()),
                clear_scenes: false,
                bundle: None,
                scenes: Some(vec![SceneEntry::File(SceneFile {
                    file_path: "src/scenes/escaped.tsx".to_string(),
                    code: "line1\\nline2".to_string(),
                })]),
            })
            .await
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("src/scenes/escaped.tsx")).unwrap();
        assert_eq!(written, "line1\nline2");
    }

    #[tokio::test]
    async fn test_files_mode_never_clears() {
        let dir = tempfile::tempdir().unwrap();
        let scenes = dir.path().join("src/scenes");
        fs::create_dir_all(&scenes).await.unwrap();
        fs::write(scenes.join("stale.tsx"), "old").await.unwrap();

        let report = pusher()
            .push(LocalPushRequest {
                project_dir: Some(dir.path().to_string_lossy().to_string()),
                clear_scenes: true,
                bundle: None,
                scenes: Some(vec![SceneEntry::File(SceneFile {
                    file_path: "src/scenes/new.tsx".to_string(),
                    code: "x".to_string(),
                })]),
            })
            .await
            .unwrap();

        assert_eq!(report.mode, PushMode::Files);
        assert!(!report.cleared);
        assert!(scenes.join("stale.tsx").exists());
    }
}
