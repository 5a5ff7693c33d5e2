use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    duplicates::{duplicate_groups, rank},
    error::Result,
    matcher::PrefixMatcher,
    prefixer::compute_canonical_name,
    store::FileStore,
    types::{Folder, Intent, PipelineReport},
};

/// Drives the reorganization pipelines against a file store
///
/// Every store call is awaited before the next decision is made. Intents are
/// applied as soon as they are decided, so a failed run leaves the changes
/// made so far in place.
pub struct Organizer {
    store: Arc<dyn FileStore>,
    source_root: Folder,
    destination_parent: Folder,
}

impl Organizer {
    /// Create an organizer
    ///
    /// `source_root` holds the loose files to sort; the direct children of
    /// `destination_parent` are the destination folders.
    pub fn new(store: Arc<dyn FileStore>, source_root: Folder, destination_parent: Folder) -> Self {
        Self {
            store,
            source_root,
            destination_parent,
        }
    }

    /// Move every file below the source root into the destination folder its name points at
    ///
    /// A file whose parents already include the matched folder is left where
    /// it is; no move is issued for it.
    pub async fn auto_sort_by_prefix(&self) -> Result<PipelineReport> {
        info!(
            "Sorting files under {} into folders of {} ({})",
            self.source_root.name,
            self.destination_parent.name,
            self.store.identifier()
        );
        let folders = self.store.list_folders(&self.destination_parent).await?;
        let files = self.store.list_files_recursive(&self.source_root).await?;

        let mut matcher = PrefixMatcher::new(&folders);
        let mut report = PipelineReport::default();

        for file in files {
            let Some(folder) = matcher.resolve(&file) else {
                continue;
            };
            if file.parents.iter().any(|id| *id == folder.id) {
                debug!("{} is already in {}", file.name, folder.name);
                continue;
            }
            info!("{} matches {} ({})", file.name, folder.name, folder.id);
            let intent = Intent::Move {
                file,
                destination: folder.clone(),
            };
            self.apply(intent, &mut report).await?;
        }

        report.unmatched_prefixes = matcher.report();
        if !report.unmatched_prefixes.is_empty() {
            warn!("Missing prefixes:");
            for stat in &report.unmatched_prefixes {
                warn!("{}: {}", stat.normalized_prefix, stat.unmatched_count);
            }
        }

        Ok(report)
    }

    /// Consolidate content duplicates in every destination folder
    pub async fn find_duplicates(&self) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();
        for folder in self.store.list_folders(&self.destination_parent).await? {
            report.merge(self.find_duplicates_in_folder(&folder).await?);
        }
        Ok(report)
    }

    /// Keep one canonically named copy of each duplicate group in `parent`
    /// and move the others into its duplicates holding folder.
    ///
    /// Only direct children are examined. The holding folder is looked up or
    /// created the first time a copy needs moving.
    pub async fn find_duplicates_in_folder(&self, parent: &Folder) -> Result<PipelineReport> {
        info!("Checking {} for duplicates...", parent.name);
        let files = self.store.list_files(parent).await?;
        let mut report = PipelineReport::default();
        let mut holding: Option<Folder> = None;

        for group in duplicate_groups(&files) {
            debug!("  Group [{}]: {} files", group.key, group.files.len());
            let mut ranked = rank(group.files, &parent.name).into_iter();
            let Some(keep) = ranked.next() else {
                continue;
            };

            let canonical = compute_canonical_name(&keep, &parent.name);
            if canonical != keep.name {
                info!("  Keeping {} (renaming to {})", keep.name, canonical);
                let intent = Intent::Rename {
                    file: keep,
                    new_name: canonical,
                };
                self.apply(intent, &mut report).await?;
            } else {
                info!("  Keeping {}", keep.name);
            }

            for duplicate in ranked {
                let destination = match &holding {
                    Some(folder) => folder.clone(),
                    None => {
                        let folder = self.store.get_or_create_duplicates_folder(parent).await?;
                        holding = Some(folder.clone());
                        folder
                    }
                };
                debug!("    Moving {}", duplicate.name);
                let intent = Intent::Move {
                    file: duplicate,
                    destination,
                };
                self.apply(intent, &mut report).await?;
            }
        }

        Ok(report)
    }

    /// Prefix the files of every destination folder with the folder's name
    pub async fn prefix_filenames(&self) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();
        for folder in self.store.list_folders(&self.destination_parent).await? {
            report.merge(self.prefix_filenames_in_folder(&folder).await?);
        }
        Ok(report)
    }

    /// Rename the direct files of `parent` to their canonical names
    pub async fn prefix_filenames_in_folder(&self, parent: &Folder) -> Result<PipelineReport> {
        info!("Prefixing {} files:", parent.name);
        let mut report = PipelineReport::default();

        for file in self.store.list_files(parent).await? {
            let canonical = compute_canonical_name(&file, &parent.name);
            if canonical == file.name {
                debug!("  Leaving {} as-is", file.name);
                continue;
            }
            info!("  Renaming {} to {}", file.name, canonical);
            let intent = Intent::Rename {
                file,
                new_name: canonical,
            };
            self.apply(intent, &mut report).await?;
        }

        Ok(report)
    }

    /// Apply one intent through the store and record the outcome
    async fn apply(&self, intent: Intent, report: &mut PipelineReport) -> Result<()> {
        let confirmed = match &intent {
            Intent::Move { file, destination } => {
                self.store.move_file(file, &destination.id).await?
            }
            Intent::Rename { file, new_name } => self.store.rename_file(file, new_name).await?,
        };

        if confirmed {
            report.applied.push(intent);
        } else {
            warn!("Store did not confirm: {}", intent);
            report.failed.push(intent);
        }
        Ok(())
    }
}
