use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::{OrganizerError, Result},
    store::FileStore,
    types::{File, Folder},
};

#[derive(Debug, Default)]
struct Tree {
    /// Folders with the id of their parent, in creation order
    folders: Vec<(Folder, Option<String>)>,
    files: Vec<File>,
    created: usize,
}

impl Tree {
    fn has_folder(&self, id: &str) -> bool {
        self.folders.iter().any(|(folder, _)| folder.id == id)
    }

    fn require_folder(&self, id: &str) -> Result<()> {
        if self.has_folder(id) {
            Ok(())
        } else {
            Err(OrganizerError::NotFound { id: id.to_string() })
        }
    }

    fn file_mut(&mut self, id: &str) -> Result<&mut File> {
        self.files
            .iter_mut()
            .find(|file| file.id == id)
            .ok_or_else(|| OrganizerError::NotFound { id: id.to_string() })
    }
}

/// In-memory file store
///
/// Listing returns entries in insertion order. Useful for tests and for
/// rehearsing a run against a snapshot without touching a remote store.
#[derive(Default)]
pub struct MemoryStore {
    tree: RwLock<Tree>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a folder under `parent_id`, or as a root when `None`
    pub fn with_folder(mut self, parent_id: Option<&str>, folder: Folder) -> Self {
        self.tree
            .get_mut()
            .folders
            .push((folder, parent_id.map(String::from)));
        self
    }

    /// Add a file; its `parents` decide where it is listed
    pub fn with_file(mut self, file: File) -> Self {
        self.tree.get_mut().files.push(file);
        self
    }

    /// Current state of a file by id
    pub async fn file(&self, id: &str) -> Option<File> {
        let tree = self.tree.read().await;
        tree.files.iter().find(|file| file.id == id).cloned()
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn list_folders(&self, parent: &Folder) -> Result<Vec<Folder>> {
        let tree = self.tree.read().await;
        tree.require_folder(&parent.id)?;
        Ok(tree
            .folders
            .iter()
            .filter(|(_, parent_id)| parent_id.as_deref() == Some(parent.id.as_str()))
            .map(|(folder, _)| folder.clone())
            .collect())
    }

    async fn list_files(&self, parent: &Folder) -> Result<Vec<File>> {
        let tree = self.tree.read().await;
        tree.require_folder(&parent.id)?;
        Ok(tree
            .files
            .iter()
            .filter(|file| file.parents.iter().any(|id| *id == parent.id))
            .cloned()
            .collect())
    }

    async fn move_file(&self, file: &File, new_parent_id: &str) -> Result<bool> {
        let mut tree = self.tree.write().await;
        tree.require_folder(new_parent_id)?;
        let stored = tree.file_mut(&file.id)?;
        stored.parents = vec![new_parent_id.to_string()];
        Ok(stored.parents.iter().any(|id| id == new_parent_id))
    }

    async fn rename_file(&self, file: &File, new_name: &str) -> Result<bool> {
        let mut tree = self.tree.write().await;
        let stored = tree.file_mut(&file.id)?;
        stored.name = new_name.to_string();
        Ok(stored.name == new_name)
    }

    async fn create_folder(&self, parent: &Folder, name: &str) -> Result<Folder> {
        let mut tree = self.tree.write().await;
        tree.require_folder(&parent.id)?;
        tree.created += 1;
        let folder = Folder::new(format!("mem-{}", tree.created), name);
        tree.folders.push((folder.clone(), Some(parent.id.clone())));
        Ok(folder)
    }

    fn identifier(&self) -> String {
        "memory".to_string()
    }
}
