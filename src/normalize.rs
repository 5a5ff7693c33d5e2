//! String helpers for building matching keys out of file and folder names.

/// Reduce a name to its lowercase ASCII alphanumeric characters.
///
/// The result is only ever used as a lookup key, never displayed.
pub fn normalize(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Return the part of `name` before the first `_`.
///
/// A leading `_` does not count as a separator, in which case the whole name is returned.
pub fn extract_prefix(name: &str) -> &str {
    match name.find('_') {
        Some(index) if index > 0 => &name[..index],
        _ => name,
    }
}

/// Last `/`-delimited segment of a path-like name.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Case-insensitive version of `str::strip_prefix`.
///
/// Characters are compared one at a time by their lowercase forms, so the
/// returned remainder always starts on a char boundary of `s`.
pub fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let mut rest = s.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = rest.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    Some(rest.as_str())
}
