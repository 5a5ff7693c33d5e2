pub mod config;
pub mod drive;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod memory;
pub mod normalize;
pub mod organizer;
pub mod prefixer;
pub mod store;
pub mod types;

pub use crate::config::AppConfig;
pub use drive::DriveStore;
pub use duplicates::{duplicate_groups, group_by_fingerprint, rank, DuplicateGroup, SuffixKind};
pub use error::{OrganizerError, Result};
pub use matcher::{FolderIndex, PrefixMatcher};
pub use memory::MemoryStore;
pub use normalize::{basename, extract_prefix, normalize};
pub use organizer::Organizer;
pub use prefixer::compute_canonical_name;
pub use store::{DryRunStore, FileStore};
pub use types::{File, FingerprintKey, Folder, Intent, PipelineReport, PrefixStat, DUPLICATES_FOLDER_NAME};
