// ABOUTME: Relative path sanitization for files written into a sandbox or host project
// ABOUTME: Rejects traversal, absolute paths, and Windows drive prefixes

use crate::types::{PreviewError, PreviewResult};

/// Normalize a caller-supplied file path to a safe relative POSIX path.
///
/// Backslashes become slashes, leading slashes are stripped, and anything
/// containing `..` or a drive prefix is rejected.
pub fn sanitize_relative_path(input: &str) -> PreviewResult<String> {
    let p = input.replace('\\', "/");
    let p = p.trim_start_matches('/');

    if p.is_empty() {
        return Err(PreviewError::InvalidPath {
            path: input.to_string(),
        });
    }

    let mut chars = p.chars();
    let drive_prefix = matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some(':'), Some('/')) if c.is_ascii_alphabetic()
    );
    if drive_prefix {
        return Err(PreviewError::InvalidPath {
            path: input.to_string(),
        });
    }

    if p.contains("..") {
        return Err(PreviewError::InvalidPath {
            path: input.to_string(),
        });
    }

    Ok(p.to_string())
}
