/// Longest path segment we will emit. Keeps deep mirrored trees clear of
/// platform path-length limits.
const MAX_SEGMENT_LEN: usize = 150;

/// Device names Windows refuses as file or directory names, in any case.
const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

fn is_reserved_char(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

/// Turn an arbitrary remote display name into a safe single path segment.
///
/// Surrounding whitespace is trimmed, each run of reserved characters
/// collapses to one `_`, internal whitespace runs collapse to one space, the
/// result is capped at [`MAX_SEGMENT_LEN`] characters, trailing spaces and
/// dots are dropped, and reserved device names get a trailing `_`. A
/// non-empty input never sanitizes to an empty segment, and the function is
/// idempotent, so already-sanitized names pass through unchanged.
pub fn sanitize(name: &str) -> String {
    let trimmed = name.trim();

    let mut out = String::with_capacity(trimmed.len());
    let mut last_was_replacement = false;
    let mut last_was_space = false;
    for c in trimmed.chars() {
        if is_reserved_char(c) {
            if !last_was_replacement {
                out.push('_');
            }
            last_was_replacement = true;
            last_was_space = false;
        } else if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
            last_was_replacement = false;
        } else {
            out.push(c);
            last_was_replacement = false;
            last_was_space = false;
        }
    }

    if out.chars().count() > MAX_SEGMENT_LEN {
        out = out.chars().take(MAX_SEGMENT_LEN).collect();
    }

    // Windows also rejects segments ending in a space or dot; this doubles
    // as the guard that turns `.` and `..` into non-traversing names.
    let mut out = out.trim_end_matches([' ', '.']).to_string();

    if RESERVED_NAMES.iter().any(|r| out.eq_ignore_ascii_case(r)) {
        out.push('_');
    }

    if out.is_empty() && !name.is_empty() {
        return "_".to_string();
    }

    out
}
