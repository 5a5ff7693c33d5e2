use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    error::Result,
    types::{File, Folder, DUPLICATES_FOLDER_NAME},
};

/// Core abstraction for hierarchical file stores
///
/// Implementors list folders and files and apply moves, renames and folder
/// creation against a backend (a remote drive, an in-memory tree, etc.).
/// Any error aborts the pipeline that issued the call.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// List the direct child folders of `parent`
    async fn list_folders(&self, parent: &Folder) -> Result<Vec<Folder>>;

    /// List the direct child files of `parent`, across all pages
    async fn list_files(&self, parent: &Folder) -> Result<Vec<File>>;

    /// Move `file` into the folder `new_parent_id`, detaching it from its current parents
    ///
    /// Returns `false` when the store accepted the call but the file did not end up there
    async fn move_file(&self, file: &File, new_parent_id: &str) -> Result<bool>;

    /// Rename `file` to `new_name`
    ///
    /// Returns `false` when the store accepted the call but the name did not change
    async fn rename_file(&self, file: &File, new_name: &str) -> Result<bool>;

    /// Create a folder named `name` directly under `parent`
    async fn create_folder(&self, parent: &Folder, name: &str) -> Result<Folder>;

    /// Get a human-readable identifier for this store (for logging/debugging)
    fn identifier(&self) -> String;

    /// List every file below `parent`, depth-first
    ///
    /// Nested folders are reported with `/`-joined names. Uses an explicit
    /// worklist, so tree depth does not grow the call stack. The tree is
    /// assumed acyclic.
    async fn list_files_recursive(&self, parent: &Folder) -> Result<Vec<File>> {
        let mut files = Vec::new();
        let mut pending = vec![parent.clone()];

        while let Some(folder) = pending.pop() {
            let found = self.list_files(&folder).await?;
            debug!("{}: {} files", folder.name, found.len());
            files.extend(found);

            let children = self.list_folders(&folder).await?;
            pending.extend(children.into_iter().rev().map(|child| Folder {
                id: child.id,
                name: format!("{}/{}", folder.name, child.name),
            }));
        }

        Ok(files)
    }

    /// Return the duplicates holding folder under `parent`, creating it if missing
    async fn get_or_create_duplicates_folder(&self, parent: &Folder) -> Result<Folder> {
        let existing = self
            .list_folders(parent)
            .await?
            .into_iter()
            .find(|folder| folder.name == DUPLICATES_FOLDER_NAME);

        match existing {
            Some(folder) => Ok(folder),
            None => {
                info!("Creating {} under {}", DUPLICATES_FOLDER_NAME, parent.name);
                self.create_folder(parent, DUPLICATES_FOLDER_NAME).await
            }
        }
    }
}

#[async_trait]
impl<T: FileStore + ?Sized> FileStore for Arc<T> {
    async fn list_folders(&self, parent: &Folder) -> Result<Vec<Folder>> {
        (**self).list_folders(parent).await
    }

    async fn list_files(&self, parent: &Folder) -> Result<Vec<File>> {
        (**self).list_files(parent).await
    }

    async fn move_file(&self, file: &File, new_parent_id: &str) -> Result<bool> {
        (**self).move_file(file, new_parent_id).await
    }

    async fn rename_file(&self, file: &File, new_name: &str) -> Result<bool> {
        (**self).rename_file(file, new_name).await
    }

    async fn create_folder(&self, parent: &Folder, name: &str) -> Result<Folder> {
        (**self).create_folder(parent, name).await
    }

    fn identifier(&self) -> String {
        (**self).identifier()
    }

    async fn list_files_recursive(&self, parent: &Folder) -> Result<Vec<File>> {
        (**self).list_files_recursive(parent).await
    }

    async fn get_or_create_duplicates_folder(&self, parent: &Folder) -> Result<Folder> {
        (**self).get_or_create_duplicates_folder(parent).await
    }
}

/// Read-through wrapper that logs changes instead of applying them
pub struct DryRunStore<S> {
    inner: S,
}

impl<S: FileStore> DryRunStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: FileStore> FileStore for DryRunStore<S> {
    async fn list_folders(&self, parent: &Folder) -> Result<Vec<Folder>> {
        self.inner.list_folders(parent).await
    }

    async fn list_files(&self, parent: &Folder) -> Result<Vec<File>> {
        self.inner.list_files(parent).await
    }

    async fn move_file(&self, file: &File, new_parent_id: &str) -> Result<bool> {
        info!("[dry run] would move {} to {}", file.name, new_parent_id);
        Ok(true)
    }

    async fn rename_file(&self, file: &File, new_name: &str) -> Result<bool> {
        info!("[dry run] would rename {} to {}", file.name, new_name);
        Ok(true)
    }

    async fn create_folder(&self, parent: &Folder, name: &str) -> Result<Folder> {
        info!("[dry run] would create {} under {}", name, parent.name);
        Ok(Folder::new(format!("dry-run:{}", parent.id), name))
    }

    fn identifier(&self) -> String {
        format!("dry-run+{}", self.inner.identifier())
    }

    async fn list_files_recursive(&self, parent: &Folder) -> Result<Vec<File>> {
        self.inner.list_files_recursive(parent).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn tree() -> MemoryStore {
        MemoryStore::new()
            .with_folder(None, Folder::new("root", "Root"))
            .with_folder(Some("root"), Folder::new("a", "A"))
            .with_folder(Some("a"), Folder::new("a1", "A1"))
            .with_folder(Some("root"), Folder::new("b", "B"))
            .with_file(File::new("f-root", "root.txt").in_folder("root"))
            .with_file(File::new("f-a", "a.txt").in_folder("a"))
            .with_file(File::new("f-a1", "a1.txt").in_folder("a1"))
            .with_file(File::new("f-b", "b.txt").in_folder("b"))
    }

    #[tokio::test]
    async fn test_list_files_recursive_depth_first() {
        let store = tree();
        let files = store
            .list_files_recursive(&Folder::new("root", "Root"))
            .await
            .unwrap();
        let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["f-root", "f-a", "f-a1", "f-b"]);
    }

    #[tokio::test]
    async fn test_duplicates_folder_is_reused() {
        let store = tree();
        let parent = Folder::new("a", "A");

        let first = store.get_or_create_duplicates_folder(&parent).await.unwrap();
        let second = store.get_or_create_duplicates_folder(&parent).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name, DUPLICATES_FOLDER_NAME);

        let children = store.list_folders(&parent).await.unwrap();
        assert_eq!(
            children.iter().filter(|f| f.name == DUPLICATES_FOLDER_NAME).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_dry_run_does_not_change_store() {
        let store = DryRunStore::new(tree());
        let file = File::new("f-a", "a.txt").in_folder("a");

        assert!(store.move_file(&file, "b").await.unwrap());
        assert!(store.rename_file(&file, "renamed.txt").await.unwrap());
        let dupes = store
            .get_or_create_duplicates_folder(&Folder::new("a", "A"))
            .await
            .unwrap();
        assert_eq!(dupes.id, "dry-run:a");

        let inner = store.into_inner();
        let files = inner.list_files(&Folder::new("a", "A")).await.unwrap();
        assert_eq!(files, vec![file]);
        let folders = inner.list_folders(&Folder::new("a", "A")).await.unwrap();
        assert_eq!(folders.len(), 1);
    }
}
