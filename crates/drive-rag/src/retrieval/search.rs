//! Semantic search over the vector index

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::ingestion::{is_zero_vector, BatchEmbedder};
use crate::providers::{EmbeddingProvider, MetadataFilter, VectorIndex};
use crate::types::{SearchRequest, SearchResult};

/// Embeds queries, queries the index and ranks the hits
pub struct RetrievalEngine {
    embedder: BatchEmbedder,
    index: Arc<dyn VectorIndex>,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder: BatchEmbedder::new(embeddings, 1),
            index,
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Search for chunks relevant to the request, best first
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let (limit, filter) = self.validate(request)?;

        let vector = self.embedder.embed_one(&request.query).await;
        if is_zero_vector(&vector) {
            tracing::debug!("Query embedded to a zero vector, nothing can match");
            return Ok(Vec::new());
        }

        let pool = self.config.candidate_pool.max(limit);
        let hits = self.index.query(&vector, pool, filter.as_ref()).await?;
        tracing::debug!("Index returned {} candidates for '{}'", hits.len(), request.query);

        let tokens = query_tokens(&request.query);
        let mut seen = HashSet::new();
        let mut results: Vec<SearchResult> = Vec::with_capacity(hits.len());

        for hit in hits {
            let score = score_from_distance(hit.distance);
            if score <= self.config.min_score {
                continue;
            }
            if !seen.insert(hit.key.clone()) {
                continue;
            }

            let highlights = extract_highlights(
                &hit.text,
                &tokens,
                self.config.max_highlights,
                self.config.min_segment_chars,
            );
            let snippet = build_snippet(&hit.text, &tokens, self.config.snippet_chars);

            results.push(SearchResult::new(
                hit.key,
                hit.text,
                hit.metadata,
                score,
                snippet,
                highlights,
            ));
        }

        // Stable, so equal scores keep index order
        results.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        results.truncate(limit);

        Ok(results)
    }

    fn validate(&self, request: &SearchRequest) -> Result<(usize, Option<MetadataFilter>)> {
        if request.query.trim().is_empty() {
            return Err(Error::validation("query must not be empty"));
        }

        let limit = request.limit.unwrap_or(self.config.default_limit);
        if limit == 0 || limit > self.config.max_limit {
            return Err(Error::validation(format!(
                "limit must be within 1..={}, got {}",
                self.config.max_limit, limit
            )));
        }

        let filter =
            MetadataFilter::from_scope(request.folder_id.as_deref(), request.file_id.as_deref())?;
        Ok((limit, filter))
    }
}

/// Cosine distance to a [0, 1] relevance score
pub fn score_from_distance(distance: f32) -> f32 {
    (1.0 - distance).clamp(0.0, 1.0)
}

/// Lower-cased query words with surrounding punctuation removed
pub fn query_tokens(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// Sentence-like segments of `text` that mention a query token
pub fn extract_highlights(
    text: &str,
    tokens: &[String],
    max_highlights: usize,
    min_segment_chars: usize,
) -> Vec<String> {
    if tokens.is_empty() {
        return Vec::new();
    }

    text.replace('\n', " ")
        .split(". ")
        .map(str::trim)
        .filter(|segment| segment.chars().count() > min_segment_chars)
        .filter(|segment| {
            let lower = segment.to_lowercase();
            tokens.iter().any(|t| lower.contains(t.as_str()))
        })
        .take(max_highlights)
        .map(str::to_string)
        .collect()
}

/// Excerpt of at most `max_chars` characters centred on the first token hit,
/// cut at word boundaries with `...` marking removed text
pub fn build_snippet(text: &str, tokens: &[String], max_chars: usize) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<char> = normalized.chars().collect();
    if chars.len() <= max_chars {
        return normalized;
    }

    let (hit, hit_len) = first_hit(&normalized, tokens).unwrap_or((0, 0));
    let budget = max_chars.saturating_sub(6).max(1);

    let mut start = hit.saturating_sub(budget.saturating_sub(hit_len) / 2);
    if start + budget > chars.len() {
        start = chars.len() - budget;
    }
    let mut end = start + budget;

    // Drop a partial word at either edge
    if start > 0 && !chars[start - 1].is_whitespace() {
        if let Some(space) = chars[start..hit.max(start)].iter().position(|c| c.is_whitespace()) {
            start += space + 1;
        }
    }
    if end < chars.len() && !chars[end].is_whitespace() {
        let floor = (hit + hit_len).clamp(start, end);
        if let Some(space) = chars[floor..end].iter().rposition(|c| c.is_whitespace()) {
            end = floor + space;
        }
    }

    let mut snippet: String = chars[start..end].iter().collect();
    snippet = snippet.trim().to_string();
    if start > 0 {
        snippet.insert_str(0, "...");
    }
    if end < chars.len() {
        snippet.push_str("...");
    }
    snippet
}

/// Char index and char length of the earliest token occurrence
fn first_hit(normalized: &str, tokens: &[String]) -> Option<(usize, usize)> {
    // Char positions in the lowered text only match the original when every
    // char lowers to exactly one char
    if !normalized.chars().all(lowers_to_single_char) {
        return None;
    }
    let lower = normalized.to_lowercase();

    tokens
        .iter()
        .filter_map(|t| lower.find(t.as_str()).map(|pos| (pos, t)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(pos, t)| (lower[..pos].chars().count(), t.chars().count()))
}

fn lowers_to_single_char(c: char) -> bool {
    let mut lowered = c.to_lowercase();
    matches!((lowered.next(), lowered.next()), (Some(_), None))
}
