//! Local directory file store
//!
//! Serves a directory tree as a file store. Ids are root-relative paths with
//! `/` separators; a file's folder id is its relative parent directory (`.`
//! for the root itself). Directories are listed as Drive folders.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::providers::file_store::FileStore;
use crate::types::document::mime;
use crate::types::SourceDocument;

/// Folder id of the root directory
pub const ROOT_FOLDER: &str = ".";

/// Local file store backed by a directory
pub struct LocalFileStore {
    /// Directory holding the documents
    root: PathBuf,
}

impl LocalFileStore {
    /// Create a store over an existing directory
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::Config(format!(
                "file_store.local_root {} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// Map an id back to a path under the root, refusing ids that escape it
    fn resolve(&self, id: &str) -> Result<PathBuf> {
        let relative = Path::new(id);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if id.trim().is_empty() || escapes {
            return Err(Error::FileStore(format!("invalid file id '{}'", id)));
        }
        Ok(self.root.join(relative))
    }

    fn relative_id(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }

    fn describe(&self, path: &Path) -> Option<SourceDocument> {
        let id = self.relative_id(path)?;
        let name = path.file_name()?.to_string_lossy().into_owned();
        let metadata = std::fs::metadata(path).ok()?;
        let folder = match id.rsplit_once('/') {
            Some((parent, _)) => parent.to_string(),
            None => ROOT_FOLDER.to_string(),
        };
        let (mime_type, size) = if metadata.is_dir() {
            (mime::GOOGLE_FOLDER, None)
        } else {
            let guessed = mime_guess::from_path(path)
                .first_raw()
                .unwrap_or("application/octet-stream");
            (guessed, Some(metadata.len()))
        };

        Some(SourceDocument {
            id,
            name,
            mime_type: mime_type.to_string(),
            size,
            modified_time: metadata.modified().ok().map(DateTime::<Utc>::from),
            parents: vec![folder],
            web_view_link: Some(format!("file://{}", path.display())),
        })
    }

    fn is_hidden(entry: &walkdir::DirEntry) -> bool {
        entry.depth() > 0
            && entry
                .file_name()
                .to_str()
                .map(|s| s.starts_with('.'))
                .unwrap_or(false)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn list(&self, folder_id: Option<&str>) -> Result<Vec<SourceDocument>> {
        let (base, max_depth) = match folder_id {
            None => (self.root.clone(), usize::MAX),
            Some(ROOT_FOLDER) => (self.root.clone(), 1),
            Some(folder) => (self.resolve(folder)?, 1),
        };
        if !base.is_dir() {
            return Err(Error::FileStore(format!(
                "folder {} does not exist",
                base.display()
            )));
        }

        let root = self.root.clone();
        let store = Self { root };
        tokio::task::spawn_blocking(move || {
            let documents: Vec<SourceDocument> = WalkDir::new(&base)
                .max_depth(max_depth)
                .into_iter()
                .filter_entry(|e| !Self::is_hidden(e))
                .filter_map(|e| e.ok())
                .filter(|e| e.depth() > 0 && (e.file_type().is_file() || e.file_type().is_dir()))
                .filter_map(|e| store.describe(e.path()))
                .collect();
            Ok::<_, Error>(documents)
        })
        .await?
    }

    async fn fetch_bytes(&self, file_id: &str) -> Result<Bytes> {
        let path = self.resolve(file_id)?;
        tokio::fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|e| Error::FileStore(format!("Failed to read {}: {}", path.display(), e)))
    }

    async fn export(&self, file_id: &str, target_mime: &str) -> Result<Bytes> {
        // Local files are stored in their final form; only text targets make sense
        if target_mime == mime::PLAIN_TEXT || target_mime == mime::CSV {
            self.fetch_bytes(file_id).await
        } else {
            Err(Error::FileStore(format!(
                "cannot export local file {} to {}",
                file_id, target_mime
            )))
        }
    }

    async fn metadata(&self, file_id: &str) -> Result<SourceDocument> {
        if file_id == ROOT_FOLDER {
            let name = self
                .root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "/".to_string());
            return Ok(SourceDocument::new(ROOT_FOLDER, name, mime::GOOGLE_FOLDER));
        }

        let path = self.resolve(file_id)?;
        self.describe(&path)
            .ok_or_else(|| Error::FileStore(format!("{} not found", file_id)))
    }

    async fn resolve_path(&self, file_id: &str) -> Result<String> {
        if file_id == ROOT_FOLDER {
            return Ok("/".to_string());
        }
        let path = self.resolve(file_id)?;
        if !path.exists() {
            return Err(Error::FileStore(format!("{} not found", file_id)));
        }
        Ok(format!("/{}", file_id.trim_start_matches("./")))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.root.is_dir())
    }

    fn name(&self) -> &str {
        "local-filesystem"
    }
}
