//! Read-only views of the file store: files with paths, folders with counts

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::FileStore;
use crate::types::{DriveFile, DriveFolder, MimeClass, SourceDocument};

/// Browses the file store for the client's file and folder pickers
pub struct DriveBrowser {
    store: Arc<dyn FileStore>,
}

impl DriveBrowser {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self { store }
    }

    /// Every non-folder file in the store, with its resolved path
    pub async fn list_files(&self) -> Result<Vec<DriveFile>> {
        let items = self.store.list(None).await?;
        let mut files = Vec::with_capacity(items.len());
        for doc in items.iter().filter(|d| !is_folder(d)) {
            let path = self.path_of(doc).await;
            files.push(DriveFile::from_document(doc, path));
        }
        tracing::debug!("Listed {} files from {}", files.len(), self.store.name());
        Ok(files)
    }

    /// Every folder in the store, in listing order, with its direct file count
    pub async fn list_folders(&self) -> Result<Vec<DriveFolder>> {
        let items = self.store.list(None).await?;

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for doc in items.iter().filter(|d| !is_folder(d)) {
            for parent in &doc.parents {
                *counts.entry(parent.as_str()).or_default() += 1;
            }
        }

        let mut folders = Vec::new();
        for doc in items.iter().filter(|d| is_folder(d)) {
            folders.push(DriveFolder {
                id: doc.id.clone(),
                name: doc.name.clone(),
                path: self.path_of(doc).await,
                file_count: counts.get(doc.id.as_str()).copied().unwrap_or(0),
            });
        }
        tracing::debug!("Listed {} folders from {}", folders.len(), self.store.name());
        Ok(folders)
    }

    /// One folder with its direct file count; `Error::Validation` when `id`
    /// names something other than a folder
    pub async fn get_folder(&self, id: &str) -> Result<DriveFolder> {
        if id.trim().is_empty() {
            return Err(Error::validation("folder id must not be empty"));
        }

        let doc = self.store.metadata(id).await?;
        if !is_folder(&doc) {
            return Err(Error::validation("File is not a folder"));
        }

        let children = self.store.list(Some(id)).await?;
        let file_count = children.iter().filter(|d| !is_folder(d)).count();

        Ok(DriveFolder {
            path: self.path_of(&doc).await,
            id: doc.id,
            name: doc.name,
            file_count,
        })
    }

    async fn path_of(&self, doc: &SourceDocument) -> String {
        match self.store.resolve_path(&doc.id).await {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!("Path lookup for {} failed, using its name: {}", doc.id, e);
                format!("/{}", doc.name)
            }
        }
    }
}

fn is_folder(doc: &SourceDocument) -> bool {
    doc.mime_class() == MimeClass::Folder
}
