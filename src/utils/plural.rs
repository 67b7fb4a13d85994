//! Count formatting for log lines.

/// `plural_count(1, "file")` -> `"1 file"`, `plural_count(0, "file")` -> `"0 files"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
