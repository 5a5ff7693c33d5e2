use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the child folder that collects non-canonical copies found during dedup
pub const DUPLICATES_FOLDER_NAME: &str = "0000_duplicates";

/// A folder in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Opaque identifier assigned by the store
    pub id: String,
    /// Display name; may be a `/`-joined path when synthesized during recursive listing
    pub name: String,
}

impl Folder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A non-folder entry in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: String,
    pub name: String,
    /// Ids of the folders containing this file
    #[serde(default)]
    pub parents: Vec<String>,
    pub mime_type: Option<String>,
    pub size: Option<String>,
    /// Content checksum as reported by the store
    #[serde(rename = "md5Checksum")]
    pub content_fingerprint: Option<String>,
    pub file_extension: Option<String>,
}

impl File {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the single parent folder of this file
    pub fn in_folder(mut self, parent_id: impl Into<String>) -> Self {
        self.parents = vec![parent_id.into()];
        self
    }

    /// Set the fields the fingerprint key is derived from
    pub fn with_fingerprint(
        mut self,
        mime_type: impl Into<String>,
        size: impl Into<String>,
        checksum: impl Into<String>,
    ) -> Self {
        self.mime_type = Some(mime_type.into());
        self.size = Some(size.into());
        self.content_fingerprint = Some(checksum.into());
        self
    }

    pub fn fingerprint_key(&self) -> FingerprintKey {
        FingerprintKey::of(self)
    }
}

/// The `(mime type, size, checksum)` triple deciding content-duplicate membership
///
/// Missing fields become empty strings, so files lacking all three share one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FingerprintKey {
    pub mime_type: String,
    pub size: String,
    pub content_fingerprint: String,
}

impl FingerprintKey {
    pub fn of(file: &File) -> Self {
        Self {
            mime_type: file.mime_type.clone().unwrap_or_default(),
            size: file.size.clone().unwrap_or_default(),
            content_fingerprint: file.content_fingerprint.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Display for FingerprintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.mime_type, self.size, self.content_fingerprint
        )
    }
}

/// A normalized file prefix that matched no destination folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixStat {
    pub normalized_prefix: String,
    pub unmatched_count: usize,
}

/// A change the organizer decided to make to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Move { file: File, destination: Folder },
    Rename { file: File, new_name: String },
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Move { file, destination } => write!(
                f,
                "move {} to {} ({})",
                file.name, destination.name, destination.id
            ),
            Intent::Rename { file, new_name } => {
                write!(f, "rename {} to {}", file.name, new_name)
            }
        }
    }
}

/// Outcome of a single pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Intents the store confirmed
    pub applied: Vec<Intent>,
    /// Intents the store completed without reflecting the change
    pub failed: Vec<Intent>,
    /// Recurring unmatched prefixes, most frequent first (auto-sort only)
    pub unmatched_prefixes: Vec<PrefixStat>,
}

impl PipelineReport {
    pub fn merge(&mut self, other: PipelineReport) {
        self.applied.extend(other.applied);
        self.failed.extend(other.failed);
        self.unmatched_prefixes.extend(other.unmatched_prefixes);
    }
}
