use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One ingested unit of knowledge. Created by the extraction + chunking
/// pipeline, read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    /// Origin URL, a `file://<name>` marker, or "manual".
    pub source: String,
    pub content_type: String,
    pub content: String,
    /// Ordered, non-empty passages; never mutated after ingestion.
    pub chunks: Vec<String>,
    /// Significant lower-cased terms, descending by corpus frequency, capped.
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub source: String,
    pub content_type: String,
    pub chunks_count: usize,
    pub keywords_count: usize,
}

/// Success payload of an ingestion call.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    pub document_id: String,
    pub title: String,
    pub chunks_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkMatch {
    pub chunk_index: usize,
    pub content: String,
    pub relevance: u32,
    pub word_matches: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub document_id: String,
    pub title: String,
    pub source: String,
    pub relevance_score: u32,
    /// Best-scoring chunks of this document, descending, at most three.
    pub matching_chunks: Vec<ChunkMatch>,
}

/// Seven-category knowledge map built by pattern extraction over all stored
/// documents. Derived per query; a pure function of the store contents.
/// BTreeMap keeps iteration (and therefore synthesis output) deterministic.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    pub definitions: BTreeMap<String, String>,
    pub processes: BTreeMap<String, Vec<String>>,
    pub concepts: BTreeMap<String, String>,
    pub relationships: BTreeMap<String, Vec<String>>,
    pub facts: BTreeMap<String, Vec<String>>,
    pub equations: BTreeMap<String, String>,
    pub applications: BTreeMap<String, Vec<String>>,
}

impl KnowledgeBase {
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
            && self.processes.is_empty()
            && self.concepts.is_empty()
            && self.relationships.is_empty()
            && self.facts.is_empty()
            && self.equations.is_empty()
            && self.applications.is_empty()
    }
}

/// Classified purpose of a question; drives template selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Definition,
    ProcessExplanation,
    ProcessDescription,
    Reasoning,
    Listing,
    Equation,
    Importance,
    Comparison,
    General,
}

#[derive(Debug, Clone)]
pub struct QuestionIntent {
    pub kind: IntentKind,
    /// Significant question words, stop-words removed, first-seen order.
    pub key_terms: Vec<String>,
    /// First surviving key term, if any.
    pub main_concept: Option<String>,
}
