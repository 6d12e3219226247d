//! Flat-file document store.
//!
//! An insertion-ordered in-memory map persisted as a single JSON file. Every
//! mutation flushes the whole store; a flush failure is logged and the
//! in-memory state stays authoritative for the rest of the process lifetime.

use crate::error::StoreError;
use crate::models::{Document, DocumentSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const STORE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct PersistedStore {
    version: u32,
    documents: Vec<Document>,
}

pub struct DocumentStore {
    path: Option<PathBuf>,
    order: Vec<String>,
    documents: HashMap<String, Document>,
}

impl DocumentStore {
    /// Store with no backing file; mutations are not persisted.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            order: Vec::new(),
            documents: HashMap::new(),
        }
    }

    /// Opens the store at `path`, loading the persisted file if present. An
    /// unreadable or corrupt file is logged and treated as an empty store;
    /// the in-memory state is authoritative from then on.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self {
            path: Some(path.clone()),
            order: Vec::new(),
            documents: HashMap::new(),
        };

        if path.exists() {
            match load_documents(&path) {
                Ok(documents) => {
                    info!(count = documents.len(), path = %path.display(), "loaded document store");
                    for document in documents {
                        store.order.push(document.id.clone());
                        store.documents.insert(document.id.clone(), document);
                    }
                }
                Err(err) => {
                    error!(path = %path.display(), %err, "failed to load document store, starting empty");
                }
            }
        }

        store
    }

    /// Inserts a document and flushes. Returns the document id.
    pub fn add(&mut self, document: Document) -> String {
        let id = document.id.clone();
        if self.documents.insert(id.clone(), document).is_none() {
            self.order.push(id.clone());
        } else {
            warn!(document_id = %id, "document id collision, replacing existing entry");
        }
        self.flush();
        id
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    /// Removes a document and flushes. False if the id was absent.
    pub fn remove(&mut self, id: &str) -> bool {
        if self.documents.remove(id).is_none() {
            return false;
        }
        self.order.retain(|existing| existing != id);
        self.flush();
        true
    }

    /// Summaries in insertion order.
    pub fn list(&self) -> Vec<DocumentSummary> {
        self.iter()
            .map(|doc| DocumentSummary {
                id: doc.id.clone(),
                title: doc.title.clone(),
                source: doc.source.clone(),
                content_type: doc.content_type.clone(),
                chunks_count: doc.chunks.len(),
                keywords_count: doc.keywords.len(),
            })
            .collect()
    }

    /// Documents in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.order.iter().filter_map(|id| self.documents.get(id))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Serializes the whole store to the backing file. Failure is logged,
    /// never surfaced: the caller's mutation already took effect in memory.
    fn flush(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(err) = self.write_to(path) {
            error!(path = %path.display(), %err, "failed to persist document store");
        }
    }

    fn write_to(&self, path: &Path) -> Result<(), StoreError> {
        let persisted = PersistedStore {
            version: STORE_VERSION,
            documents: self.iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&persisted)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn load_documents(path: &Path) -> Result<Vec<Document>, StoreError> {
    let json = fs::read_to_string(path)?;
    let persisted: PersistedStore = serde_json::from_str(&json)?;
    Ok(persisted.documents)
}

/// Id for a new document: hash of source, title, and ingestion time,
/// truncated to 12 hex chars. Collisions are treated as acceptably rare.
pub fn generate_doc_id(source: &str, title: &str, at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b"_");
    hasher.update(title.as_bytes());
    hasher.update(b"_");
    hasher.update(at.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}
