/// Lookup-key normalization for model identifiers.
///
/// Model names arrive as free-form strings ("GPT-4o", "org/model:latest") and
/// have to be mapped onto prompt file names. Two schemes are used: a
/// filename-safe key that keeps dots, underscores and dashes, and a stricter
/// underscore-only key for stores that cannot host punctuation in names.

fn collapse_disallowed(value: &str, allowed: fn(char) -> bool) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_sep = false;
    for c in value.to_lowercase().trim().chars() {
        if allowed(c) {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    // trailing runs never flush pending_sep; literal underscores kept by the
    // allowed set can still sit at the edges, so trim those off as well
    out.trim_matches('_').to_string()
}

/// Normalize to a filename-safe key: lowercase, trimmed, runs of characters
/// outside `[a-z0-9._-]` collapsed to a single `_`, no leading/trailing `_`.
pub fn to_safe_filename_key(value: &str) -> String {
    collapse_disallowed(value, |c| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')
    })
}

/// Normalize to an underscore-only key: like [`to_safe_filename_key`] but the
/// allowed set is `[a-z0-9]`, so `.`/`-`/`_` also collapse to `_`.
pub fn to_underscore_key(value: &str) -> String {
    collapse_disallowed(value, |c| c.is_ascii_lowercase() || c.is_ascii_digit())
}
