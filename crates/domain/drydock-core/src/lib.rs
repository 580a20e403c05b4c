use serde::{Deserialize, Serialize};

pub mod mirror;
pub mod sanitize;

pub use sanitize::sanitize;

/// Top-level tenant/organization grouping in the remote data service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hub {
    pub id: String,
    pub name: String,
}

/// A named workspace within a hub. Its contents hang off a root folder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
}

/// A container node holding design files and child folders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Folder {
    pub id: String,
    pub name: String,
}

/// A remote design file reference. The `extension` tag decides whether the
/// file is exportable; the file itself is owned entirely by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignFile {
    pub id: String,
    pub name: String,
    pub extension: String,
}

/// Session handle for an opened document.
///
/// Not `Clone` on purpose: exactly one open/export/close cycle owns it, and
/// `close` takes it by value, so a handle cannot be retained or reused after
/// the cycle that created it.
#[derive(Debug)]
pub struct DocumentHandle {
    document_id: String,
}

impl DocumentHandle {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }
}

/// Serializable materialization of the remote tree, produced by a read-only
/// walk. Used for planning and the `tree` listing; never fed back into the
/// service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HubSnapshot {
    pub name: String,
    pub projects: Vec<ProjectSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSnapshot {
    pub name: String,
    pub root: FolderSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FolderSnapshot {
    pub name: String,
    pub files: Vec<FileSnapshot>,
    pub folders: Vec<FolderSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileSnapshot {
    pub name: String,
    pub extension: String,
}
