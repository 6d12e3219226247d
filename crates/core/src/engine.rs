//! The ingestion and question-answering facade.
//!
//! One engine instance owns the document store (behind a single-writer lock),
//! the compiled knowledge patterns, and the HTTP client for URL ingestion.
//! Every operation is synchronous and runs to completion; query paths never
//! fail, they answer with an explanatory string instead.

use crate::answer::synthesize_answer;
use crate::chunking::{chunk_content, extract_keywords, ChunkingConfig};
use crate::error::{EngineError, IngestError};
use crate::extractor::{
    extract_content, strip_html, title_from_url, SourceKind, ALLOWED_EXTENSIONS,
};
use crate::intent::IntentClassifier;
use crate::knowledge::KnowledgeExtractor;
use crate::models::{Document, DocumentSummary, IngestReceipt, SearchResult};
use crate::search::{get_context, search_documents, SearchWeights};
use crate::store::{generate_doc_id, DocumentStore};
use crate::vocab::Vocabulary;
use chrono::Utc;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const EMPTY_STORE_RESPONSE: &str = "I don't have any uploaded documents to reference. \
    Please upload some documents first, and I'll be happy to help answer questions about them!";

pub struct TutorEngine {
    store: RwLock<DocumentStore>,
    knowledge: KnowledgeExtractor,
    classifier: IntentClassifier,
    vocab: Vocabulary,
    chunking: ChunkingConfig,
    weights: SearchWeights,
    http: reqwest::blocking::Client,
}

impl TutorEngine {
    /// Engine backed by a store file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Self::with_store(DocumentStore::open(path.as_ref()))
    }

    /// Engine with no persistence, for embedding and tests.
    pub fn in_memory() -> Result<Self, EngineError> {
        Self::with_store(DocumentStore::in_memory())
    }

    fn with_store(store: DocumentStore) -> Result<Self, EngineError> {
        Ok(Self {
            store: RwLock::new(store),
            knowledge: KnowledgeExtractor::new()?,
            classifier: IntentClassifier::default(),
            vocab: Vocabulary::default(),
            chunking: ChunkingConfig::default(),
            weights: SearchWeights::default(),
            http: reqwest::blocking::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()?,
        })
    }

    /// Ingests raw text under the "manual" source marker.
    pub fn ingest_text(&self, content: &str, title: &str) -> Result<IngestReceipt, IngestError> {
        self.ingest(
            content.to_string(),
            title.to_string(),
            "manual".to_string(),
            "text/plain".to_string(),
            None,
        )
    }

    /// Ingests a file payload. The extension decides the extraction path and
    /// anything off the allow-list is rejected before any parsing.
    pub fn ingest_file(
        &self,
        bytes: &[u8],
        filename: &str,
        title: Option<&str>,
    ) -> Result<IngestReceipt, IngestError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        let Some(kind) = SourceKind::from_extension(extension) else {
            return Err(IngestError::UnsupportedExtension {
                extension: extension.to_string(),
                allowed: ALLOWED_EXTENSIONS.join(", "),
            });
        };

        let content = extract_content(bytes, kind);
        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| stem_of(filename));

        self.ingest(
            content,
            title,
            format!("file://{filename}"),
            kind.content_type().to_string(),
            Some(bytes.len() as u64),
        )
    }

    /// Downloads a page or document and ingests its text. The URL is
    /// validated (http/https scheme, non-empty host) before any network call.
    pub fn ingest_url(&self, url: &str, title: Option<&str>) -> Result<IngestReceipt, IngestError> {
        let parsed =
            Url::parse(url).map_err(|error| IngestError::InvalidUrl(error.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(IngestError::InvalidUrl(format!(
                "expected an http(s) url with a host, got {url}"
            )));
        }

        let response = self.http.get(parsed.clone()).send()?.error_for_status()?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("text/plain")
            .to_string();

        let (content, declared_type) = if content_type.contains("html") {
            (strip_html(&response.text()?), "text/html".to_string())
        } else if content_type.contains("pdf") {
            let bytes = response.bytes()?;
            (
                extract_content(&bytes, SourceKind::Pdf),
                "application/pdf".to_string(),
            )
        } else {
            (
                response.text()?.trim().to_string(),
                "text/plain".to_string(),
            )
        };

        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| title_from_url(&parsed));

        self.ingest(content, title, parsed.to_string(), declared_type, None)
    }

    pub fn list_documents(&self) -> Vec<DocumentSummary> {
        self.read_store().list()
    }

    pub fn remove_document(&self, id: &str) -> bool {
        let removed = self.write_store().remove(id);
        if removed {
            info!(document_id = %id, "removed document");
        }
        removed
    }

    pub fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        search_documents(&self.read_store(), query, max_results, &self.weights)
    }

    pub fn get_context(&self, query: &str) -> String {
        get_context(&self.read_store(), query, &self.weights)
    }

    /// The full pipeline: classify the question, rebuild the knowledge base
    /// from every stored document, synthesize the answer. Never fails; an
    /// empty store gets a fixed response.
    pub fn answer(&self, question: &str) -> String {
        let store = self.read_store();
        if store.is_empty() {
            return EMPTY_STORE_RESPONSE.to_string();
        }

        let intent = self.classifier.classify(question);
        info!(question = %question, kind = ?intent.kind, "answering question");

        let knowledge = self.knowledge.build(store.iter());
        synthesize_answer(&intent, &knowledge)
    }

    fn ingest(
        &self,
        content: String,
        title: String,
        source: String,
        content_type: String,
        file_size: Option<u64>,
    ) -> Result<IngestReceipt, IngestError> {
        let content = content.trim().to_string();
        if content.is_empty() {
            warn!(%title, "rejecting ingestion with no text content");
            return Err(IngestError::EmptyContent(title));
        }

        let chunks = chunk_content(&content, self.chunking);
        let keywords = extract_keywords(&content, &self.vocab, self.chunking);
        let ingested_at = Utc::now();
        let id = generate_doc_id(&source, &title, ingested_at);

        let receipt = IngestReceipt {
            document_id: id.clone(),
            title: title.clone(),
            chunks_count: chunks.len(),
            file_size,
        };

        info!(document_id = %id, %title, chunks = chunks.len(), "ingested document");

        self.write_store().add(Document {
            id,
            title,
            source,
            content_type,
            content,
            chunks,
            keywords,
            file_size,
            ingested_at,
        });

        Ok(receipt)
    }

    // Lock poisoning only means another thread panicked mid-operation; the
    // store itself stays consistent, so keep serving.
    fn read_store(&self) -> RwLockReadGuard<'_, DocumentStore> {
        self.store.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, DocumentStore> {
        self.store.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn stem_of(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHOTOSYNTHESIS: &str = "Photosynthesis is the process by which plants convert \
        light energy into chemical energy. 6CO2 + 6H2O + light energy → C6H12O6 + 6O2.";

    fn engine_with_photosynthesis() -> TutorEngine {
        let engine = TutorEngine::in_memory().unwrap();
        engine
            .ingest_text(PHOTOSYNTHESIS, "Photosynthesis")
            .unwrap();
        engine
    }

    #[test]
    fn definition_question_answers_with_definition_and_equation() {
        let engine = engine_with_photosynthesis();
        let answer = engine.answer("What is photosynthesis?");

        assert!(answer.contains("process by which plants convert light energy"));
        assert!(answer.contains("6CO2 + 6H2O"));
    }

    #[test]
    fn empty_store_gets_the_fixed_response() {
        let engine = TutorEngine::in_memory().unwrap();
        let answer = engine.answer("What is photosynthesis?");
        assert_eq!(answer, EMPTY_STORE_RESPONSE);
    }

    #[test]
    fn unsupported_extension_is_rejected_without_storing() {
        let engine = TutorEngine::in_memory().unwrap();
        let result = engine.ingest_file(b"MZ...", "malware.exe", None);

        match result {
            Err(IngestError::UnsupportedExtension { extension, allowed }) => {
                assert_eq!(extension, "exe");
                assert_eq!(allowed, "txt, pdf, docx, pptx");
            }
            other => panic!("expected unsupported extension error, got {other:?}"),
        }
        assert!(engine.list_documents().is_empty());
    }

    #[test]
    fn empty_text_is_rejected() {
        let engine = TutorEngine::in_memory().unwrap();
        let result = engine.ingest_text("   \n\n  ", "Blank");
        assert!(matches!(result, Err(IngestError::EmptyContent(_))));
    }

    #[test]
    fn invalid_urls_fail_before_any_network_call() {
        let engine = TutorEngine::in_memory().unwrap();
        assert!(matches!(
            engine.ingest_url("ftp://example.org/notes.txt", None),
            Err(IngestError::InvalidUrl(_))
        ));
        assert!(matches!(
            engine.ingest_url("not a url", None),
            Err(IngestError::InvalidUrl(_))
        ));
    }

    #[test]
    fn removed_documents_disappear_from_listing_and_search() {
        let engine = engine_with_photosynthesis();
        let id = engine.list_documents()[0].id.clone();

        assert!(engine.remove_document(&id));
        assert!(!engine.remove_document(&id));
        assert!(engine.list_documents().is_empty());
        assert!(engine.search("photosynthesis", 3).is_empty());
    }

    #[test]
    fn file_ingestion_records_size_and_source() {
        let engine = TutorEngine::in_memory().unwrap();
        let receipt = engine
            .ingest_file(b"Cells divide during mitosis.", "notes.txt", None)
            .unwrap();

        assert_eq!(receipt.title, "notes");
        assert_eq!(receipt.file_size, Some(28));

        let summaries = engine.list_documents();
        assert_eq!(summaries[0].source, "file://notes.txt");
        assert_eq!(summaries[0].content_type, "text/plain");
    }

    #[test]
    fn search_finds_ingested_text_by_title() {
        let engine = engine_with_photosynthesis();
        let results = engine.search("Photosynthesis", 3);
        assert!(!results.is_empty());
        assert!(results[0].relevance_score >= 10);
    }
}
