//! Heuristic document tutoring core: ingestion, lexical retrieval,
//! pattern-based knowledge extraction, and template-driven answers.
//!
//! Documents flow through extraction and chunking into a flat-file store.
//! Questions are classified by intent, matched against a knowledge base
//! rebuilt from the stored documents, and answered from fixed Markdown
//! templates. [`TutorEngine`] ties the pipeline together.

pub mod answer;
pub mod chunking;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod intent;
pub mod knowledge;
pub mod models;
pub mod search;
pub mod store;
pub mod vocab;

pub use answer::{find_relevant_knowledge, synthesize_answer};
pub use chunking::{chunk_content, extract_keywords, ChunkingConfig};
pub use engine::TutorEngine;
pub use error::{EngineError, IngestError, StoreError};
pub use extractor::{
    discover_supported_files, extract_content, strip_html, title_from_url, SourceKind,
    ALLOWED_EXTENSIONS,
};
pub use intent::IntentClassifier;
pub use knowledge::KnowledgeExtractor;
pub use models::{
    ChunkMatch, Document, DocumentSummary, IngestReceipt, IntentKind, KnowledgeBase,
    QuestionIntent, SearchResult,
};
pub use search::{get_context, search_documents, SearchWeights};
pub use store::{generate_doc_id, DocumentStore};
pub use vocab::Vocabulary;
