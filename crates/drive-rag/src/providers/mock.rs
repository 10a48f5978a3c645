//! Test-only providers.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::error::{Error, Result};
use crate::types::SourceDocument;

use super::embedding::EmbeddingProvider;
use super::file_store::FileStore;
use super::llm::{ChatMessage, LlmProvider};

/// In-memory file store
#[derive(Default)]
pub struct MockFileStore {
    files: Vec<SourceDocument>,
    contents: HashMap<String, Bytes>,
    paths: HashMap<String, String>,
    broken: HashSet<String>,
    fail_list: bool,
    /// When set, `list` waits for a notification before returning
    gate: Option<Arc<Notify>>,
    pub list_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl MockFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file whose download and export both return `content`
    pub fn with_file(mut self, doc: SourceDocument, content: impl Into<String>) -> Self {
        self.contents
            .insert(doc.id.clone(), Bytes::from(content.into()));
        self.files.push(doc);
        self
    }

    /// Add a file whose download fails
    pub fn with_broken_file(mut self, doc: SourceDocument) -> Self {
        self.broken.insert(doc.id.clone());
        self.files.push(doc);
        self
    }

    /// Add a folder; it is listed but has no content
    pub fn with_folder(mut self, folder: SourceDocument) -> Self {
        self.files.push(folder);
        self
    }

    pub fn with_path(mut self, id: &str, path: &str) -> Self {
        self.paths.insert(id.to_string(), path.to_string());
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn content(&self, file_id: &str) -> Result<Bytes> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.broken.contains(file_id) {
            return Err(Error::FileStore(format!("mock download of {} failed", file_id)));
        }
        self.contents
            .get(file_id)
            .cloned()
            .ok_or_else(|| Error::FileStore(format!("{} not found", file_id)))
    }
}

#[async_trait]
impl FileStore for MockFileStore {
    async fn list(&self, folder_id: Option<&str>) -> Result<Vec<SourceDocument>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_list {
            return Err(Error::FileStore("mock listing failed".to_string()));
        }
        Ok(self
            .files
            .iter()
            .filter(|f| folder_id.map_or(true, |folder| f.parents.iter().any(|p| p == folder)))
            .cloned()
            .collect())
    }

    async fn fetch_bytes(&self, file_id: &str) -> Result<Bytes> {
        self.content(file_id)
    }

    async fn export(&self, file_id: &str, _target_mime: &str) -> Result<Bytes> {
        self.content(file_id)
    }

    async fn metadata(&self, file_id: &str) -> Result<SourceDocument> {
        self.files
            .iter()
            .find(|f| f.id == file_id)
            .cloned()
            .ok_or_else(|| Error::FileStore(format!("{} not found", file_id)))
    }

    async fn resolve_path(&self, file_id: &str) -> Result<String> {
        self.paths
            .get(file_id)
            .cloned()
            .ok_or_else(|| Error::FileStore(format!("no path for {}", file_id)))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Embeds text as term counts over a fixed vocabulary, one dimension per word.
/// Text without any vocabulary word embeds to the zero vector.
pub struct KeywordEmbedder {
    vocabulary: Vec<String>,
    pub batches: Mutex<Vec<usize>>,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&str]) -> Self {
        Self {
            vocabulary: vocabulary.iter().map(|w| w.to_lowercase()).collect(),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        self.vocabulary
            .iter()
            .map(|word| lower.matches(word.as_str()).count() as f32)
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batches.lock().push(texts.len());
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.vocabulary.len()
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Embedder whose every call fails
pub struct FailingEmbedder {
    pub dimensions: usize,
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::embedding("mock embedding outage"))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Scripted LLM that records the messages it was sent
pub struct MockLlm {
    pub response: String,
    pub fail: bool,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl Default for MockLlm {
    fn default() -> Self {
        Self {
            response: "mock answer".to_string(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockLlm {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn last_call(&self) -> Option<Vec<ChatMessage>> {
        self.calls.lock().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String> {
        self.calls.lock().push(messages.to_vec());
        if self.fail {
            return Err(Error::llm("mock model unavailable"));
        }
        Ok(self.response.clone())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail)
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
