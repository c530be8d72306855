// ABOUTME: Scene compiler - turns normalized scene sources into enriched scenes, manifest, files
// ABOUTME: Pure and deterministic; identical input yields byte-identical output

use crate::ids;
use crate::metadata;
use crate::normalize;
use crate::types::{
    BuildOutput, EnrichedScene, Manifest, ManifestScene, SceneBundle, SceneError, SceneFile,
    SceneResult, DEFAULT_DURATION_FRAMES, FPS, MANIFEST_FILE, SCENES_DIR,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Relative path of the component file generated for a scene id.
pub fn scene_component_path(id: &str) -> String {
    format!("{SCENES_DIR}/{id}.tsx")
}

/// Relative path of the generated manifest file.
pub fn manifest_path() -> String {
    format!("{SCENES_DIR}/{MANIFEST_FILE}")
}

fn assemble(enriched_scenes: Vec<EnrichedScene>) -> BuildOutput {
    let manifest = Manifest::new(
        enriched_scenes
            .iter()
            .map(|s| ManifestScene {
                id: s.id.clone(),
                name: s.name.clone(),
                duration_in_frames: s.duration_in_frames,
                component: format!("{}.tsx", s.id),
            })
            .collect(),
    );

    let mut files: Vec<SceneFile> = enriched_scenes
        .iter()
        .map(|s| SceneFile {
            file_path: scene_component_path(&s.id),
            code: s.code.clone(),
        })
        .collect();

    files.push(SceneFile {
        file_path: manifest_path(),
        code: render_manifest(&manifest),
    });

    BuildOutput {
        enriched_scenes,
        manifest,
        files,
    }
}

/// Serialize a manifest as pretty-printed JSON with a trailing newline.
pub fn render_manifest(manifest: &Manifest) -> String {
    let mut json = serde_json::to_string_pretty(manifest).expect("manifest serializes");
    json.push('\n');
    json
}

fn derive_duration(code: &str, bundle_seconds: Option<f64>) -> u32 {
    if let Some(frames) = metadata::extract_duration_comment(code) {
        return frames;
    }
    if let Some(frames) = metadata::extract_duration_frames(code, FPS) {
        return frames;
    }
    if let Some(sec) = bundle_seconds {
        if sec.is_finite() && sec > 0.0 {
            return ((sec * FPS as f64).round() as u32).max(1);
        }
    }
    DEFAULT_DURATION_FRAMES
}

/// Compile a flat array of self-describing scene sources.
pub fn build_from_sources(sources: &[String]) -> SceneResult<BuildOutput> {
    if sources.is_empty() {
        return Err(SceneError::EmptyInput);
    }

    let mut used_ids = HashSet::new();
    let mut enriched = Vec::with_capacity(sources.len());

    for (index, raw) in sources.iter().enumerate() {
        let code = normalize::normalize_scene_code(raw);
        if code.is_empty() {
            return Err(SceneError::EmptyScene { index });
        }
        if !code.contains("export default") {
            return Err(SceneError::MissingDefaultExport { index });
        }

        let function_name = metadata::extract_function_name(&code)
            .ok_or(SceneError::MissingFunctionName { index })?
            .to_string();

        let base_id = match metadata::extract_scene_id(&code) {
            Some(declared) => ids::sanitize_scene_id(declared)?,
            None => ids::sanitize_scene_id(&ids::function_name_to_id(&function_name))?,
        };
        let id = ids::ensure_unique_id(&base_id, &mut used_ids);

        let name = metadata::extract_scene_name(&code)
            .or_else(|| metadata::extract_scene_target(&code))
            .unwrap_or_else(|| ids::function_name_to_display(&function_name));

        let duration_in_frames = derive_duration(&code, None);

        enriched.push(EnrichedScene {
            id,
            name,
            duration_in_frames,
            code,
        });
    }

    Ok(assemble(enriched))
}

/// Compile paired bundle input: a JSON document declaring scenes, plus an
/// array of source strings matched to those declarations.
///
/// Pairing policy: first match by embedded (sanitized) id comment over
/// not-yet-consumed sources, then first available source in array order.
/// Callers rely on both the explicit pairing and the positional fallback.
pub fn build_from_bundle(bundle: &SceneBundle) -> SceneResult<BuildOutput> {
    if bundle.json_string.trim().is_empty() {
        return Err(SceneError::EmptyBundleJson);
    }
    if bundle.code_array.is_empty() {
        return Err(SceneError::EmptyBundleCode);
    }

    let raw = normalize::strip_outer_markdown_fence(&bundle.json_string).trim().to_string();
    let script: Value =
        serde_json::from_str(&raw).map_err(|e| SceneError::BundleJsonParse {
            reason: e.to_string(),
        })?;

    let declared = script
        .get("scenes")
        .and_then(Value::as_array)
        .filter(|scenes| !scenes.is_empty())
        .ok_or(SceneError::MissingScenesArray)?;

    let candidates: Vec<String> = bundle
        .code_array
        .iter()
        .map(|c| normalize::normalize_scene_code(c))
        .filter(|c| !c.is_empty() && c.contains("export default"))
        .collect();
    if candidates.is_empty() {
        return Err(SceneError::NoUsableSources);
    }

    // Index sources by their embedded id comment; invalid ids are ignored.
    let mut by_id: HashMap<String, usize> = HashMap::new();
    for (i, code) in candidates.iter().enumerate() {
        if let Some(declared_id) = metadata::extract_scene_id(code) {
            if let Ok(id) = ids::sanitize_scene_id(declared_id) {
                by_id.insert(id, i);
            }
        }
    }

    let mut used_ids = HashSet::new();
    let mut consumed = vec![false; candidates.len()];
    let mut enriched = Vec::with_capacity(declared.len());

    for (idx, entry) in declared.iter().enumerate() {
        let raw_id = entry.get("id").and_then(Value::as_str).unwrap_or("");
        let raw_name = entry.get("target").and_then(Value::as_str).unwrap_or("");
        let bundle_seconds = entry
            .get("estimated_duration_seconds")
            .and_then(Value::as_f64);

        let base_id = if raw_id.is_empty() {
            ids::sanitize_scene_id(&format!("scene_{}", idx + 1))?
        } else {
            ids::sanitize_scene_id(raw_id)?
        };
        let id = ids::ensure_unique_id(&base_id, &mut used_ids);

        let source_index = match by_id.get(&id) {
            Some(&i) if !consumed[i] => i,
            _ => (0..candidates.len())
                .find(|&i| !consumed[i])
                .ok_or_else(|| SceneError::NoSourceForScene { id: id.clone() })?,
        };
        consumed[source_index] = true;
        let code = candidates[source_index].clone();

        let name = metadata::extract_scene_name(&code)
            .or_else(|| {
                if raw_name.is_empty() {
                    None
                } else {
                    Some(raw_name.to_string())
                }
            })
            .or_else(|| {
                metadata::extract_function_name(&code).map(ids::function_name_to_display)
            })
            .unwrap_or_else(|| id.clone());

        let duration_in_frames = derive_duration(&code, bundle_seconds);

        enriched.push(EnrichedScene {
            id,
            name,
            duration_in_frames,
            code,
        });
    }

    Ok(assemble(enriched))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scene_source(function_name: &str) -> String {
        format!("export default function {function_name}() {{ return null; }}")
    }

    #[test]
    fn test_one_file_per_scene_plus_manifest() {
        let sources = vec![scene_source("Intro"), scene_source("Outro")];
        let out = build_from_sources(&sources).unwrap();

        assert_eq!(out.files.len(), 3);
        assert_eq!(out.manifest.scenes.len(), 2);
        assert_eq!(out.files[0].file_path, "src/scenes/intro.tsx");
        assert_eq!(out.files[1].file_path, "src/scenes/outro.tsx");
        assert_eq!(out.files[2].file_path, "src/scenes/manifest.json");
    }

    #[test]
    fn test_duplicate_names_get_suffixed() {
        let sources = vec![scene_source("SceneIntro"), scene_source("SceneIntro")];
        let out = build_from_sources(&sources).unwrap();

        assert_eq!(out.enriched_scenes[0].id, "scene_intro");
        assert_eq!(out.enriched_scenes[1].id, "scene_intro_2");
    }

    #[test]
    fn test_missing_default_export_names_index() {
        let sources = vec![scene_source("Ok"), "const x = 1;".to_string()];
        let err = build_from_sources(&sources).unwrap_err();
        assert!(matches!(err, SceneError::MissingDefaultExport { index: 1 }));
    }

    #[test]
    fn test_arrow_default_export_rejected() {
        let sources = vec!["export default () => null;".to_string()];
        let err = build_from_sources(&sources).unwrap_err();
        assert!(matches!(err, SceneError::MissingFunctionName { index: 0 }));
    }

    #[test]
    fn test_hello_end_to_end() {
        let sources = vec![scene_source("Hello")];
        let out = build_from_sources(&sources).unwrap();

        let scene = &out.manifest.scenes[0];
        assert_eq!(scene.id, "hello");
        assert_eq!(scene.name, "Hello");
        assert_eq!(scene.duration_in_frames, 90);
        assert_eq!(scene.component, "hello.tsx");
    }

    #[test]
    fn test_comment_metadata_wins() {
        let sources = vec![format!(
            "// @scene Grand Opening\n// @duration 150\n{}",
            scene_source("Intro")
        )];
        let out = build_from_sources(&sources).unwrap();

        assert_eq!(out.enriched_scenes[0].name, "Grand Opening");
        assert_eq!(out.enriched_scenes[0].duration_in_frames, 150);
    }

    #[test]
    fn test_script_duration_comment() {
        let sources = vec![format!("// 持续时间: 2秒\n{}", scene_source("Body"))];
        let out = build_from_sources(&sources).unwrap();
        assert_eq!(out.enriched_scenes[0].duration_in_frames, 60);

        let sources = vec![format!("// 持续时间：2.0 秒 (61 帧)\n{}", scene_source("Body"))];
        let out = build_from_sources(&sources).unwrap();
        assert_eq!(out.enriched_scenes[0].duration_in_frames, 61);
    }

    #[test]
    fn test_fenced_source_unwrapped() {
        let sources = vec![format!("```tsx\n{}\n```", scene_source("Fenced"))];
        let out = build_from_sources(&sources).unwrap();
        assert_eq!(out.enriched_scenes[0].id, "fenced");
        assert!(!out.enriched_scenes[0].code.contains("```"));
    }

    #[test]
    fn test_idempotent_compiles() {
        let sources = vec![
            format!("// @duration 45\n{}", scene_source("One")),
            scene_source("Two"),
        ];
        let a = build_from_sources(&sources).unwrap();
        let b = build_from_sources(&sources).unwrap();

        let a_files: Vec<_> = a.files.iter().map(|f| (&f.file_path, &f.code)).collect();
        let b_files: Vec<_> = b.files.iter().map(|f| (&f.file_path, &f.code)).collect();
        assert_eq!(a_files, b_files);
    }

    #[test]
    fn test_manifest_round_trip() {
        let sources = vec![scene_source("Alpha"), scene_source("Beta")];
        let out = build_from_sources(&sources).unwrap();

        let manifest_file = out.files.last().unwrap();
        let reparsed: Manifest = serde_json::from_str(&manifest_file.code).unwrap();
        assert_eq!(reparsed, out.manifest);
        assert!(manifest_file.code.ends_with('\n'));
        assert!(manifest_file.code.contains("\"durationInFrames\""));
    }

    fn bundle(json: &str, codes: &[&str]) -> SceneBundle {
        SceneBundle {
            json_string: json.to_string(),
            code_array: codes.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_bundle_pairing_by_id_then_position() {
        let json = r#"{"scenes": [
            {"id": "scene_intro", "target": "Opening"},
            {"id": "scene_body", "target": "Middle"}
        ]}"#;
        // Only the second source declares an id; it must be claimed by
        // scene_intro, leaving the first source for scene_body by position.
        let unmarked = scene_source("Anything");
        let marked = format!("// Scene ID: scene_intro\n{}", scene_source("Opening"));
        let b = bundle(json, &[&unmarked, &marked]);

        let out = build_from_bundle(&b).unwrap();
        assert_eq!(out.enriched_scenes[0].id, "scene_intro");
        assert!(out.enriched_scenes[0].code.contains("function Opening"));
        assert_eq!(out.enriched_scenes[1].id, "scene_body");
        assert!(out.enriched_scenes[1].code.contains("function Anything"));
    }

    #[test]
    fn test_bundle_duration_from_metadata() {
        let json = r#"{"scenes": [{"id": "s1", "estimated_duration_seconds": 2.5}]}"#;
        let b = bundle(json, &[&scene_source("One")]);
        let out = build_from_bundle(&b).unwrap();
        assert_eq!(out.enriched_scenes[0].duration_in_frames, 75);
    }

    #[test]
    fn test_bundle_comment_duration_wins_over_metadata() {
        let json = r#"{"scenes": [{"id": "s1", "estimated_duration_seconds": 10}]}"#;
        let marked = format!("// @duration 33\n{}", scene_source("One"));
        let b = bundle(json, &[&marked]);
        let out = build_from_bundle(&b).unwrap();
        assert_eq!(out.enriched_scenes[0].duration_in_frames, 33);
    }

    #[test]
    fn test_bundle_name_falls_back_to_target() {
        let json = r#"{"scenes": [{"id": "s1", "target": "The Goal"}]}"#;
        let b = bundle(json, &[&scene_source("One")]);
        let out = build_from_bundle(&b).unwrap();
        assert_eq!(out.enriched_scenes[0].name, "The Goal");
    }

    #[test]
    fn test_bundle_fenced_json_unwrapped() {
        let json = "```json\n{\"scenes\": [{\"id\": \"s1\"}]}\n```";
        let b = bundle(json, &[&scene_source("One")]);
        let out = build_from_bundle(&b).unwrap();
        assert_eq!(out.enriched_scenes[0].id, "s1");
    }

    #[test]
    fn test_bundle_missing_scenes_array() {
        let b = bundle(r#"{"notScenes": []}"#, &[&scene_source("One")]);
        assert!(matches!(
            build_from_bundle(&b).unwrap_err(),
            SceneError::MissingScenesArray
        ));
    }

    #[test]
    fn test_bundle_runs_out_of_sources() {
        let json = r#"{"scenes": [{"id": "a"}, {"id": "b"}]}"#;
        let b = bundle(json, &[&scene_source("Only")]);
        let err = build_from_bundle(&b).unwrap_err();
        assert!(matches!(err, SceneError::NoSourceForScene { id } if id == "b"));
    }

    #[test]
    fn test_bundle_ignores_non_component_sources() {
        let json = r#"{"scenes": [{"id": "a"}]}"#;
        let b = bundle(json, &["just markdown, no component", &scene_source("Real")]);
        let out = build_from_bundle(&b).unwrap();
        assert!(out.enriched_scenes[0].code.contains("function Real"));
    }

    #[test]
    fn test_bundle_unnamed_scene_gets_positional_id() {
        let json = r#"{"scenes": [{}, {}]}"#;
        let b = bundle(json, &[&scene_source("One"), &scene_source("Two")]);
        let out = build_from_bundle(&b).unwrap();
        assert_eq!(out.enriched_scenes[0].id, "scene_1");
        assert_eq!(out.enriched_scenes[1].id, "scene_2");
    }
}
