//! Keyword-overlap knowledge retrieval.
//!
//! Scores a small fixed corpus of text chunks against a query by token
//! overlap and tag match, selects the top-K, and assembles a grounding
//! context string under a character budget.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use gvbot_core::config::RetrievalConfig;
use gvbot_core::types::KnowledgeChunk;

use crate::error::ChatError;

/// Score for a query token found as a substring of chunk text.
const TOKEN_TEXT_WEIGHT: i64 = 2;
/// Score for a query token found among chunk tags.
const TOKEN_TAG_WEIGHT: i64 = 3;
/// Score for the full joined query appearing verbatim in chunk text.
const PHRASE_WEIGHT: i64 = 10;
/// Bonus for a chunk whose source name matches a configured marker.
const SOURCE_MARKER_BONUS: i64 = 4;
/// Tokens shorter than this never score.
const MIN_TOKEN_LEN: usize = 3;
/// Joined queries at or below this length skip the verbatim-phrase check.
const MIN_PHRASE_LEN: usize = 10;

/// Shape of the knowledge index document.
#[derive(Debug, Deserialize)]
struct IndexFile {
    #[serde(default)]
    chunks: Vec<KnowledgeChunk>,
}

/// Immutable chunk corpus, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeIndex {
    chunks: Vec<KnowledgeChunk>,
}

impl KnowledgeIndex {
    pub fn from_chunks(chunks: Vec<KnowledgeChunk>) -> Self {
        Self { chunks }
    }

    /// Load the index from a JSON document shaped `{"chunks": [...]}`.
    pub fn load(path: &Path) -> Result<Self, ChatError> {
        let raw =
            std::fs::read_to_string(path).map_err(|e| ChatError::Knowledge(e.to_string()))?;
        let file: IndexFile =
            serde_json::from_str(&raw).map_err(|e| ChatError::Knowledge(e.to_string()))?;
        info!(path = %path.display(), chunks = file.chunks.len(), "Knowledge index loaded");
        Ok(Self {
            chunks: file.chunks,
        })
    }

    pub fn chunks(&self) -> &[KnowledgeChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Retrieval result: the assembled context plus the chunks behind it, kept
/// for later citation.
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    pub context: String,
    pub picks: Vec<KnowledgeChunk>,
}

impl Retrieval {
    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }
}

/// Token-overlap scorer over a [`KnowledgeIndex`].
#[derive(Debug, Clone)]
pub struct Retriever {
    top_k: usize,
    context_budget: usize,
    max_query_tokens: usize,
    source_markers: Vec<String>,
}

impl Retriever {
    pub fn new(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            context_budget: config.context_budget,
            max_query_tokens: config.max_query_tokens,
            source_markers: config
                .source_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
        }
    }

    /// Lowercase, strip characters outside `[a-z0-9]` and whitespace, split
    /// on whitespace, cap the token count.
    pub fn tokenize(&self, query: &str) -> Vec<String> {
        let cleaned: String = query
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect();
        cleaned
            .split_whitespace()
            .take(self.max_query_tokens)
            .map(str::to_string)
            .collect()
    }

    /// Score every chunk, keep positives, take the top-K (stable on ties),
    /// and assemble the context string under the character budget. A chunk
    /// is never split: assembly stops before the first block that would
    /// exceed the budget.
    pub fn retrieve(&self, index: &KnowledgeIndex, query: &str) -> Retrieval {
        let tokens = self.tokenize(query);
        let phrase = tokens.join(" ");

        let mut scored: Vec<(i64, &KnowledgeChunk)> = index
            .chunks()
            .iter()
            .filter_map(|chunk| {
                let score = self.score_chunk(chunk, &tokens, &phrase);
                (score > 0).then_some((score, chunk))
            })
            .collect();

        // sort_by is stable: equal scores keep corpus order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(self.top_k);

        let mut context = String::new();
        let mut picks = Vec::new();
        for (_, chunk) in &scored {
            let block = format_block(chunk);
            if context.len() + block.len() > self.context_budget {
                break;
            }
            context.push_str(&block);
            picks.push((*chunk).clone());
        }

        Retrieval { context, picks }
    }

    fn score_chunk(&self, chunk: &KnowledgeChunk, tokens: &[String], phrase: &str) -> i64 {
        let text = chunk.text.to_lowercase();
        let tags: Vec<String> = chunk.tags.iter().map(|t| t.to_lowercase()).collect();
        let source = chunk.source.to_lowercase();

        let mut score = 0;
        for token in tokens {
            if token.len() < MIN_TOKEN_LEN {
                continue;
            }
            if text.contains(token.as_str()) {
                score += TOKEN_TEXT_WEIGHT;
            }
            if tags.iter().any(|tag| tag.contains(token.as_str())) {
                score += TOKEN_TAG_WEIGHT;
            }
        }

        if phrase.len() > MIN_PHRASE_LEN && text.contains(phrase) {
            score += PHRASE_WEIGHT;
        }

        if self
            .source_markers
            .iter()
            .any(|marker| source.contains(marker.as_str()))
            && score > 0
        {
            score += SOURCE_MARKER_BONUS;
        }

        score
    }
}

/// Header + body block for one selected chunk.
fn format_block(chunk: &KnowledgeChunk) -> String {
    match &chunk.url {
        Some(url) => format!("[{}] ({})\n{}\n\n", chunk.source, url, chunk.text),
        None => format!("[{}]\n{}\n\n", chunk.source, chunk.text),
    }
}
