use camino::{Utf8Path, Utf8PathBuf};

use crate::sanitize::sanitize;

/// Mirrored subdirectory for a child container:
/// `mirrored(child) == mirrored(parent)/sanitize(child.name)`.
pub fn mirrored_child(parent: &Utf8Path, name: &str) -> Utf8PathBuf {
    parent.join(sanitize(name))
}

/// Per-project base directory: `root/<hub>/<project>`, both segments
/// sanitized independently.
pub fn project_dir(root: &Utf8Path, hub_name: &str, project_name: &str) -> Utf8PathBuf {
    root.join(sanitize(hub_name)).join(sanitize(project_name))
}

/// Target file for an exported design: `dir/<name>.<format>`.
pub fn export_file_path(dir: &Utf8Path, name: &str, format: &str) -> Utf8PathBuf {
    let ext = format.trim_start_matches('.').to_ascii_lowercase();
    dir.join(format!("{}.{ext}", sanitize(name)))
}
