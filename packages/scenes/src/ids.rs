// ABOUTME: Scene identifier derivation - sanitization, function-name conversion, uniqueness
// ABOUTME: Ids are lowercase snake_case and unique within one compilation

use crate::types::{SceneError, SceneResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static CAPITAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z])").expect("valid regex"));

static WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));

static DIGIT_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z])([0-9])").expect("valid regex"));

static UNDERSCORE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").expect("valid regex"));

/// Sanitize a candidate scene id: lowercase, hyphens to underscores, anything
/// outside `[a-z0-9_]` to underscore, runs collapsed, edges trimmed.
/// An id that sanitizes to nothing is rejected.
pub fn sanitize_scene_id(input: &str) -> SceneResult<String> {
    let lowered = input.trim().to_lowercase();
    let replaced: String = lowered
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            _ => '_',
        })
        .collect();
    let collapsed = UNDERSCORE_RUN.replace_all(&replaced, "_");
    let id = collapsed.trim_matches('_').to_string();

    if id.is_empty() {
        return Err(SceneError::InvalidSceneId {
            id: input.to_string(),
        });
    }
    Ok(id)
}

/// Derive a scene id from an exported function name:
/// underscore before each internal capital, then lowercase.
/// `SceneTitle` becomes `scene_title`.
pub fn function_name_to_id(function_name: &str) -> String {
    CAPITAL
        .replace_all(function_name, "_$1")
        .to_lowercase()
        .trim_start_matches('_')
        .to_string()
}

/// Derive a human-readable name from an exported function name:
/// spaces between a lower/digit and a following capital, and between a
/// letter and a following digit. `SceneTitle2` becomes `Scene Title 2`.
pub fn function_name_to_display(function_name: &str) -> String {
    let spaced = WORD_BOUNDARY.replace_all(function_name, "$1 $2");
    let spaced = DIGIT_BOUNDARY.replace_all(&spaced, "$1 $2");
    spaced.trim().to_string()
}

/// Make `base_id` unique against `used`, suffixing `_2`, `_3`, ... as needed.
/// The chosen id is recorded in `used`.
pub fn ensure_unique_id(base_id: &str, used: &mut HashSet<String>) -> String {
    let mut id = base_id.to_string();
    let mut n = 2;
    while used.contains(&id) {
        id = format!("{base_id}_{n}");
        n += 1;
    }
    used.insert(id.clone());
    id
}
