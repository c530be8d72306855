// ABOUTME: Scene source normalization applied before any metadata extraction
// ABOUTME: Unwraps markdown fences, strips BOMs, and enforces a single trailing newline

use once_cell::sync::Lazy;
use regex::Regex;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[^\n]*\n(.*?)```").expect("valid regex"));

static OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```[^\n]*\n(.*?)\n?```\s*$").expect("valid regex"));

/// Unwrap the first fenced code block found anywhere in the input.
/// Generators sometimes wrap a scene in markdown even mid-document.
pub fn strip_markdown_code_fence(input: &str) -> &str {
    match CODE_FENCE.captures(input).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => input,
    }
}

/// Unwrap a fence only when it spans the whole input. Used for embedded JSON
/// documents, where an interior fence must stay untouched.
pub fn strip_outer_markdown_fence(input: &str) -> &str {
    match OUTER_FENCE.captures(input).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => input,
    }
}

/// Normalize a raw scene source string: unwrap a fence, strip a leading BOM,
/// trim surrounding whitespace, and append exactly one trailing newline.
/// Returns an empty string for inputs with no residual content.
pub fn normalize_scene_code(code: &str) -> String {
    let raw = strip_markdown_code_fence(code);
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

/// Undo double-escaping on sources that arrive with literal `\n`/`\t`
/// sequences instead of real newlines. Content that already contains real
/// newlines, or no backslashes at all, is returned unchanged.
pub fn maybe_unescape_code(input: &str) -> String {
    if input.contains('\n') || input.contains('\r') {
        return input.to_string();
    }
    if !input.contains('\\') {
        return input.to_string();
    }

    input
        .replace("\\r\\n", "\n")
        .replace("\\n", "\n")
        .replace("\\r", "\n")
        .replace("\\t", "\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fence_with_language_tag() {
        let input = "```tsx\nexport default function A() {}\n```";
        assert_eq!(
            strip_markdown_code_fence(input),
            "export default function A() {}\n"
        );
    }

    #[test]
    fn test_strip_fence_passthrough() {
        let input = "export default function A() {}";
        assert_eq!(strip_markdown_code_fence(input), input);
    }

    #[test]
    fn test_outer_fence_requires_full_span() {
        let wrapped = "  ```json\n{\"a\": 1}\n```  ";
        assert_eq!(strip_outer_markdown_fence(wrapped), "{\"a\": 1}");

        let interior = "prefix\n```json\n{}\n```";
        assert_eq!(strip_outer_markdown_fence(interior), interior);
    }

    #[test]
    fn test_normalize_adds_single_trailing_newline() {
        assert_eq!(normalize_scene_code("  code  "), "code\n");
        assert_eq!(normalize_scene_code("code\n\n\n"), "code\n");
    }

    #[test]
    fn test_normalize_strips_bom() {
        assert_eq!(normalize_scene_code("\u{feff}code"), "code\n");
    }

    #[test]
    fn test_normalize_empty_stays_empty() {
        assert_eq!(normalize_scene_code("   \n  "), "");
        assert_eq!(normalize_scene_code(""), "");
    }

    #[test]
    fn test_unescape_double_escaped() {
        assert_eq!(maybe_unescape_code("a\\nb\\tc"), "a\nb\tc");
        assert_eq!(maybe_unescape_code("a\\r\\nb"), "a\nb");
    }

    #[test]
    fn test_unescape_keeps_real_newlines() {
        assert_eq!(maybe_unescape_code("a\nb\\n"), "a\nb\\n");
        assert_eq!(maybe_unescape_code("plain"), "plain");
    }
}
