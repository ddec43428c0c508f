//! Requirements manifest filtering.
//!
//! The Klipper venv reuses the distribution's scientific packages, so their
//! lines are dropped from `requirements.txt` before handing it to pip.

/// Leading distribution name of a requirement line, or `None` for blank
/// lines, comments and pip options (`-r`, `--index-url`, ...).
pub fn requirement_name(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('-') {
        return None;
    }

    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        .unwrap_or(trimmed.len());
    let name = &trimmed[..end];

    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Returns `manifest` without the lines naming one of `excluded` (ASCII
/// case-insensitive, any version qualifier). All other lines are kept
/// byte-for-byte and in their original order.
pub fn filter_requirements(manifest: &str, excluded: &[String]) -> String {
    manifest
        .split_inclusive('\n')
        .filter(|line| match requirement_name(line) {
            Some(name) => !excluded.iter().any(|e| e.eq_ignore_ascii_case(name)),
            None => true,
        })
        .collect()
}
