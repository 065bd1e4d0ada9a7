use regex::Regex;
use std::sync::LazyLock;

static PROFILE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[/.\s])(?:twitter|x)\.com/@?([^/?#\s]+)").expect("valid profile regex")
});

/// Reduce a bare name, `@name` or profile/status URL to the bare handle.
///
/// The result never contains `/`, `?`, `#` or a leading `@`, so normalizing twice is a
/// no-op. An input with no usable handle normalizes to the empty string; callers decide
/// whether that is an error.
///
/// ```
/// use bytesize_social::normalize_handle;
///
/// assert_eq!(normalize_handle("@jack"), "jack");
/// assert_eq!(normalize_handle("https://x.com/jack/status/20"), "jack");
/// assert_eq!(normalize_handle(&normalize_handle("@jack")), "jack");
/// ```
pub fn normalize_handle(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('@');
    let candidate = match PROFILE_URL.captures(trimmed).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => trimmed.split(['/', '?', '#']).next().unwrap_or_default(),
    };
    candidate
        .trim_start_matches(|c: char| c == '@' || c.is_whitespace())
        .trim_end()
        .to_string()
}

/// Twitter handles are ASCII letters, digits and underscores.
pub fn is_valid_handle(handle: &str) -> bool {
    !handle.is_empty() && handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
