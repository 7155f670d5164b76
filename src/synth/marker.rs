// src/synth/marker.rs

/// Substring that identifies a machine-written file.
pub const MARKER_TAG: &str = "~~ Generated by synthkit";

/// Full marker line stamped into generated files by default.
pub const DEFAULT_MARKER: &str =
    "~~ Generated by synthkit. To modify, edit Synthkit.toml and run \"synthkit synth\".";

/// Whether `contents` carries the generated-file marker.
pub fn contains_marker(contents: &[u8]) -> bool {
    let tag = MARKER_TAG.as_bytes();
    contents.windows(tag.len()).any(|w| w == tag)
}

/// Marker rendered as a single comment line, e.g. `# ~~ Generated by ...`.
pub fn comment_line(prefix: &str, marker: &str) -> String {
    format!("{prefix} {marker}")
}
