//! Google Drive v3 file store
//!
//! Lists, downloads and exports files over the Drive REST API with a bearer
//! token obtained outside this crate.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;

use crate::config::FileStoreConfig;
use crate::error::{Error, Result};
use crate::providers::file_store::FileStore;
use crate::types::SourceDocument;

const LIST_FIELDS: &str =
    "nextPageToken, files(id, name, mimeType, modifiedTime, size, webViewLink, parents)";
const META_FIELDS: &str = "id, name, mimeType, modifiedTime, size, webViewLink, parents";
const PARENT_FIELDS: &str = "id, name, parents";

/// Google Drive file store
pub struct GoogleDriveStore {
    client: Client,
    api_base: String,
    access_token: String,
    page_size: u32,
}

impl GoogleDriveStore {
    /// Create a new Drive store
    pub fn new(config: &FileStoreConfig) -> Result<Self> {
        let access_token = config
            .access_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("file_store.access_token (DRIVE_ACCESS_TOKEN) is required for the drive backend".to_string())
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token,
            page_size: config.page_size,
        })
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.api_base)
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.api_base, file_id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.access_token)
    }

    /// Query string for `files.list`
    fn list_query(folder_id: Option<&str>) -> String {
        match folder_id {
            Some(folder) => format!("trashed=false and '{}' in parents", folder.replace('\'', "\\'")),
            None => "trashed=false".to_string(),
        }
    }

    async fn get_meta(&self, file_id: &str, fields: &str) -> Result<FileResource> {
        let response = self
            .authorized(self.client.get(self.file_url(file_id)))
            .query(&[("fields", fields)])
            .send()
            .await
            .map_err(|e| Error::FileStore(format!("Drive request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::FileStore(format!(
                "Drive metadata lookup for {} failed ({}): {}",
                file_id, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::FileStore(format!("Failed to parse Drive response: {}", e)))
    }

    async fn download(&self, request: RequestBuilder, file_id: &str) -> Result<Bytes> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| Error::FileStore(format!("Drive request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::FileStore(format!(
                "Drive download of {} failed ({}): {}",
                file_id, status, body
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| Error::FileStore(format!("Failed to read Drive body for {}: {}", file_id, e)))
    }
}

/// File resource as returned by Drive (`size` is a decimal string)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    modified_time: Option<DateTime<Utc>>,
    size: Option<String>,
    web_view_link: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
}

impl From<FileResource> for SourceDocument {
    fn from(file: FileResource) -> Self {
        SourceDocument {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            size: file.size.and_then(|s| s.parse().ok()),
            modified_time: file.modified_time,
            parents: file.parents,
            web_view_link: file.web_view_link,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<FileResource>,
    next_page_token: Option<String>,
}

#[async_trait]
impl FileStore for GoogleDriveStore {
    async fn list(&self, folder_id: Option<&str>) -> Result<Vec<SourceDocument>> {
        let query = Self::list_query(folder_id);
        let page_size = self.page_size.to_string();
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .authorized(self.client.get(self.files_url()))
                .query(&[
                    ("q", query.as_str()),
                    ("pageSize", page_size.as_str()),
                    ("fields", LIST_FIELDS),
                ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::FileStore(format!("Drive list request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::FileStore(format!(
                    "Drive list failed ({}): {}",
                    status, body
                )));
            }

            let page: FileList = response
                .json()
                .await
                .map_err(|e| Error::FileStore(format!("Failed to parse Drive file list: {}", e)))?;

            documents.extend(page.files.into_iter().map(SourceDocument::from));
            tracing::debug!("Fetched {} files from Drive so far", documents.len());

            match page.next_page_token {
                None => break,
                Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                    tracing::warn!("Drive returned a repeated page token, stopping pagination");
                    break;
                }
                Some(next) => page_token = Some(next),
            }
        }

        Ok(documents)
    }

    async fn fetch_bytes(&self, file_id: &str) -> Result<Bytes> {
        let request = self
            .client
            .get(self.file_url(file_id))
            .query(&[("alt", "media")]);
        self.download(request, file_id).await
    }

    async fn export(&self, file_id: &str, target_mime: &str) -> Result<Bytes> {
        let request = self
            .client
            .get(format!("{}/export", self.file_url(file_id)))
            .query(&[("mimeType", target_mime)]);
        self.download(request, file_id).await
    }

    async fn metadata(&self, file_id: &str) -> Result<SourceDocument> {
        self.get_meta(file_id, META_FIELDS).await.map(SourceDocument::from)
    }

    async fn resolve_path(&self, file_id: &str) -> Result<String> {
        let file = self.get_meta(file_id, PARENT_FIELDS).await?;
        let mut parts = vec![file.name];
        let mut current = file.parents.into_iter().next();

        // Walk upward until the root or the first folder we cannot read
        while let Some(parent_id) = current {
            match self.get_meta(&parent_id, PARENT_FIELDS).await {
                Ok(parent) => {
                    parts.push(parent.name);
                    current = parent.parents.into_iter().next();
                }
                Err(e) => {
                    tracing::debug!("Stopping path walk at {}: {}", parent_id, e);
                    break;
                }
            }
        }

        parts.reverse();
        Ok(format!("/{}", parts.join("/")))
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .authorized(self.client.get(format!("{}/about", self.api_base)))
            .query(&[("fields", "user")])
            .send()
            .await;

        match response {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "google-drive"
    }
}
