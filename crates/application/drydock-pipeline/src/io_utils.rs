use camino::Utf8Path;

/// Idempotent directory creation, missing parents included. Failures are the
/// caller's problem: there is no mirrored destination to fall back to.
pub fn ensure_dir(path: &Utf8Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path.as_std_path())
}

/// Skip-rule predicate: the target already exists and has content. A
/// zero-byte leftover does not count as exported.
pub fn has_nonzero_size(path: &Utf8Path) -> bool {
    std::fs::metadata(path.as_std_path())
        .map(|m| m.len() > 0)
        .unwrap_or(false)
}
