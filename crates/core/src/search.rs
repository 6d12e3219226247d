//! Weighted lexical relevance search over the document store.
//!
//! Scores are additive integers with no normalization. The point weights are
//! inherited defaults with no tuning rationale; they are configurable rather
//! than corrected. Result order is deterministic: score descending, ties in
//! store insertion order.

use crate::models::{ChunkMatch, SearchResult};
use crate::store::DocumentStore;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct SearchWeights {
    /// Full query found in the document title.
    pub title_phrase: u32,
    /// Each query word found in the title.
    pub title_word: u32,
    /// Each document keyword that is a substring of the query.
    pub keyword_in_query: u32,
    /// Each (keyword, query word) pair where the keyword contains the word.
    pub keyword_contains_word: u32,
    /// Full query found in a chunk.
    pub chunk_phrase: u32,
    /// Each query word (length > 2) found in a chunk.
    pub chunk_word: u32,
}

impl Default for SearchWeights {
    fn default() -> Self {
        Self {
            title_phrase: 10,
            title_word: 3,
            keyword_in_query: 5,
            keyword_contains_word: 2,
            chunk_phrase: 5,
            chunk_word: 2,
        }
    }
}

/// Number of matching chunks retained per document.
const MAX_CHUNKS_PER_DOCUMENT: usize = 3;

/// Ranks every stored document against the query. Only documents with a
/// positive total score are returned; an empty query matches nothing.
pub fn search_documents(
    store: &DocumentStore,
    query: &str,
    max_results: usize,
    weights: &SearchWeights,
) -> Vec<SearchResult> {
    let query_lower = query.trim().to_lowercase();
    if query_lower.is_empty() {
        return Vec::new();
    }
    let query_words: Vec<&str> = query_lower.split_whitespace().collect();

    let mut results = Vec::new();

    for document in store.iter() {
        let title_lower = document.title.to_lowercase();
        let mut score = 0u32;

        if title_lower.contains(&query_lower) {
            score += weights.title_phrase;
        }
        for word in &query_words {
            if title_lower.contains(word) {
                score += weights.title_word;
            }
        }

        for keyword in &document.keywords {
            if query_lower.contains(keyword.as_str()) {
                score += weights.keyword_in_query;
            }
            for word in &query_words {
                if word.len() > 2 && keyword.contains(word) {
                    score += weights.keyword_contains_word;
                }
            }
        }

        let mut matching_chunks = Vec::new();
        for (index, chunk) in document.chunks.iter().enumerate() {
            let chunk_lower = chunk.to_lowercase();
            let mut chunk_score = 0u32;

            if chunk_lower.contains(&query_lower) {
                chunk_score += weights.chunk_phrase;
            }

            let word_matches = query_words
                .iter()
                .filter(|word| word.len() > 2 && chunk_lower.contains(**word))
                .count();
            chunk_score += word_matches as u32 * weights.chunk_word;

            if chunk_score > 0 {
                score += chunk_score;
                matching_chunks.push(ChunkMatch {
                    chunk_index: index,
                    content: chunk.clone(),
                    relevance: chunk_score,
                    word_matches,
                });
            }
        }

        if score > 0 {
            matching_chunks.sort_by(|a, b| b.relevance.cmp(&a.relevance));
            matching_chunks.truncate(MAX_CHUNKS_PER_DOCUMENT);

            debug!(document_id = %document.id, score, "document matched query");
            results.push(SearchResult {
                document_id: document.id.clone(),
                title: document.title.clone(),
                source: document.source.clone(),
                relevance_score: score,
                matching_chunks,
            });
        }
    }

    // Stable: ties keep insertion order.
    results.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    results.truncate(max_results);

    info!(query = %query, matched = results.len(), "search completed");
    results
}

/// Renders search results as a context block of document headers and chunk
/// bodies. When nothing scores above zero but the store is non-empty, this
/// degrades to the first chunk of the first stored document; callers must
/// treat that as uncertain context, not absence of context.
pub fn get_context(store: &DocumentStore, query: &str, weights: &SearchWeights) -> String {
    let results = search_documents(store, query, 3, weights);

    if results.is_empty() {
        if let Some(doc) = store.iter().next() {
            debug!(document_id = %doc.id, "no query match, returning fallback context");
            let body = doc
                .chunks
                .first()
                .map(String::as_str)
                .unwrap_or("No content available");
            return format!("**From: {}**\n{}", doc.title, body);
        }
        return String::new();
    }

    let mut parts = Vec::new();
    for result in &results {
        parts.push(format!(
            "**Document: {} (Relevance: {})**",
            result.title, result.relevance_score
        ));

        if result.matching_chunks.is_empty() {
            if let Some(first) = store
                .get(&result.document_id)
                .and_then(|doc| doc.chunks.first())
            {
                parts.push(format!("Content: {first}"));
            }
        } else {
            for chunk in &result.matching_chunks {
                parts.push(format!("Content: {}", chunk.content));
            }
        }

        parts.push(String::new());
    }

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::{chunk_content, extract_keywords, ChunkingConfig};
    use crate::models::Document;
    use crate::vocab::Vocabulary;
    use chrono::Utc;

    fn document(id: &str, title: &str, content: &str) -> Document {
        let config = ChunkingConfig::default();
        Document {
            id: id.to_string(),
            title: title.to_string(),
            source: "manual".to_string(),
            content_type: "text/plain".to_string(),
            content: content.to_string(),
            chunks: chunk_content(content, config),
            keywords: extract_keywords(content, &Vocabulary::default(), config),
            file_size: None,
            ingested_at: Utc::now(),
        }
    }

    fn store_with(docs: Vec<Document>) -> DocumentStore {
        let mut store = DocumentStore::in_memory();
        for doc in docs {
            store.add(doc);
        }
        store
    }

    #[test]
    fn empty_query_returns_nothing() {
        let store = store_with(vec![document("d1", "Plants", "Plants grow in soil.")]);
        assert!(search_documents(&store, "", 3, &SearchWeights::default()).is_empty());
        assert!(search_documents(&store, "   ", 3, &SearchWeights::default()).is_empty());
    }

    #[test]
    fn no_lexical_overlap_returns_nothing() {
        let store = store_with(vec![document("d1", "Plants", "Plants grow in soil.")]);
        let results = search_documents(&store, "quantum chromodynamics", 3, &SearchWeights::default());
        assert!(results.is_empty());
    }

    #[test]
    fn exact_title_query_scores_at_least_ten_and_ranks_first() {
        let store = store_with(vec![
            document("d1", "Cell Biology", "Cells divide. Cell walls protect."),
            document("d2", "Photosynthesis", "Photosynthesis converts light energy."),
        ]);

        let results = search_documents(&store, "Photosynthesis", 3, &SearchWeights::default());
        assert!(!results.is_empty());
        assert_eq!(results[0].document_id, "d2");
        assert!(results[0].relevance_score >= 10);
    }

    #[test]
    fn matching_chunks_are_ranked_and_capped_at_three() {
        let content = "Osmosis moves water.\n\nOsmosis needs a membrane.\n\n\
                       Osmosis balances concentration.\n\nOsmosis happens in cells.\n\n\
                       Unrelated filler sentence here.";
        // Force one chunk per paragraph.
        let mut doc = document("d1", "Osmosis", content);
        doc.chunks = content.split("\n\n").map(str::to_string).collect();
        let store = store_with(vec![doc]);

        let results = search_documents(&store, "osmosis", 3, &SearchWeights::default());
        assert_eq!(results.len(), 1);
        let chunks = &results[0].matching_chunks;
        assert_eq!(chunks.len(), 3);
        assert!(chunks.windows(2).all(|w| w[0].relevance >= w[1].relevance));
    }

    #[test]
    fn ties_keep_insertion_order() {
        let store = store_with(vec![
            document("first", "Water Cycle", "Evaporation starts the water cycle."),
            document("second", "Water Cycle", "Evaporation starts the water cycle."),
        ]);

        let results = search_documents(&store, "water cycle", 5, &SearchWeights::default());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].relevance_score, results[1].relevance_score);
        assert_eq!(results[0].document_id, "first");
    }

    #[test]
    fn context_renders_headers_and_chunk_bodies() {
        let store = store_with(vec![document(
            "d1",
            "Photosynthesis",
            "Photosynthesis converts light energy into chemical energy.",
        )]);

        let context = get_context(&store, "photosynthesis", &SearchWeights::default());
        assert!(context.contains("**Document: Photosynthesis (Relevance:"));
        assert!(context.contains("Content: Photosynthesis converts light energy"));
    }

    #[test]
    fn context_falls_back_to_first_chunk_for_title_only_matches() {
        // Scores on the title alone, so the result carries no matching chunks.
        let store = store_with(vec![document("d1", "Photosynthesis", "Plants use light.")]);

        let results = search_documents(&store, "photosynthesis", 3, &SearchWeights::default());
        assert_eq!(results.len(), 1);
        assert!(results[0].matching_chunks.is_empty());

        let context = get_context(&store, "photosynthesis", &SearchWeights::default());
        assert!(context.contains("**Document: Photosynthesis (Relevance:"));
        assert!(context.contains("Content: Plants use light."));
    }

    #[test]
    fn context_degrades_to_first_chunk_when_nothing_matches() {
        let store = store_with(vec![document("d1", "Plants", "Plants grow in soil.")]);
        let context = get_context(&store, "quantum chromodynamics", &SearchWeights::default());
        assert!(context.starts_with("**From: Plants**"));
        assert!(context.contains("Plants grow in soil"));
    }

    #[test]
    fn context_is_empty_for_an_empty_store() {
        let store = DocumentStore::in_memory();
        assert_eq!(
            get_context(&store, "anything", &SearchWeights::default()),
            ""
        );
    }
}
