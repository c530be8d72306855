// ABOUTME: Regex-driven metadata extraction from scene source comments
// ABOUTME: One pattern per concern - id, display name, target, and duration comments

use once_cell::sync::Lazy;
use regex::Regex;

static FUNCTION_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"export\s+default\s+(?:async\s+)?function\s+(\w+)\s*\(").expect("valid regex")
});

static SCENE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"@scene\s+(.+)").expect("valid regex"));

static DURATION_FRAMES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@duration\s+(\d+)").expect("valid regex"));

static SCENE_ID_ZH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"场景\s*ID\s*[:：]\s*([a-zA-Z0-9_-]+)").expect("valid regex"));

static SCENE_ID_EN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Scene\s*ID\s*[:：]\s*([a-zA-Z0-9_-]+)").expect("valid regex"));

static SCENE_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"场景目标\s*[:：]\s*(.+)").expect("valid regex"));

// e.g. "持续时间：40.0 秒 (1200 帧)"
static DURATION_SECONDS_WITH_FRAMES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"持续时间\s*[:：]\s*[\d.]+\s*秒\s*\(\s*(\d+)\s*帧\s*\)").expect("valid regex")
});

static DURATION_SECONDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"持续时间\s*[:：]\s*([\d.]+)\s*秒").expect("valid regex"));

fn capture<'a>(re: &Regex, code: &'a str) -> Option<&'a str> {
    re.captures(code).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Name of the default-exported function, if one is declared.
pub fn extract_function_name(code: &str) -> Option<&str> {
    capture(&FUNCTION_NAME, code)
}

/// Display name from an `@scene <name>` comment.
pub fn extract_scene_name(code: &str) -> Option<String> {
    capture(&SCENE_NAME, code).map(|s| s.trim().to_string())
}

/// Frame count from an `@duration <frames>` comment.
pub fn extract_duration_comment(code: &str) -> Option<u32> {
    capture(&DURATION_FRAMES, code).and_then(|s| s.parse().ok())
}

/// Scene id declared in a generator comment, in either the Chinese
/// (`场景ID:`) or English (`Scene ID:`) form.
pub fn extract_scene_id(code: &str) -> Option<&str> {
    capture(&SCENE_ID_ZH, code).or_else(|| capture(&SCENE_ID_EN, code))
}

/// Scene goal/target declared in a generator comment (`场景目标:`).
pub fn extract_scene_target(code: &str) -> Option<String> {
    capture(&SCENE_TARGET, code).map(|s| s.trim().to_string())
}

/// Duration from a generator timing comment, converted to frames.
///
/// Prefers the explicit frame count of the "X秒 (Y帧)" form; otherwise
/// converts the seconds value at `fps`, rounded to the nearest frame with a
/// minimum of 1.
pub fn extract_duration_frames(code: &str, fps: u32) -> Option<u32> {
    if let Some(frames) = capture(&DURATION_SECONDS_WITH_FRAMES, code) {
        if let Ok(frames) = frames.parse::<u32>() {
            if frames > 0 {
                return Some(frames);
            }
        }
    }

    if let Some(sec) = capture(&DURATION_SECONDS, code) {
        if let Ok(sec) = sec.parse::<f64>() {
            if sec.is_finite() && sec > 0.0 {
                return Some(((sec * fps as f64).round() as u32).max(1));
            }
        }
    }

    None
}
