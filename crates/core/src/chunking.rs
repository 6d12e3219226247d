use crate::vocab::Vocabulary;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Word budget per chunk and keyword cap. The 300-word budget and the cap of
/// 20 keywords are inherited defaults, kept configurable rather than tuned.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_words: usize,
    pub max_keywords: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_words: 300,
            max_keywords: 20,
        }
    }
}

fn keyword_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[a-zA-Z]{4,}\b").unwrap())
}

/// Split content into passages: paragraph boundaries first, then sentence
/// boundaries, greedily packed up to the word budget. Content without any
/// sentence punctuation falls back to fixed word windows, so non-empty input
/// always yields at least one non-empty chunk.
pub fn chunk_content(content: &str, config: ChunkingConfig) -> Vec<String> {
    if !content.contains(['.', '!', '?']) {
        return word_window_chunks(content, config.max_words);
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_words = 0usize;

    for paragraph in content.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        for sentence in paragraph.split(|c| matches!(c, '.' | '!' | '?')) {
            let sentence = sentence.trim();
            if sentence.is_empty() {
                continue;
            }

            let sentence_words = sentence.split_whitespace().count();

            if current_words + sentence_words > config.max_words && !current.is_empty() {
                chunks.push(current.trim().to_string());
                current = format!("{sentence}. ");
                current_words = sentence_words;
            } else {
                current.push_str(sentence);
                current.push_str(". ");
                current_words += sentence_words;
            }
        }
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    // Punctuation-only content: nothing survived sentence trimming.
    if chunks.is_empty() {
        return word_window_chunks(content, config.max_words);
    }

    chunks
}

fn word_window_chunks(content: &str, max_words: usize) -> Vec<String> {
    let words: Vec<&str> = content.split_whitespace().collect();
    words
        .chunks(max_words)
        .map(|window| window.join(" "))
        .filter(|chunk| !chunk.is_empty())
        .collect()
}

/// Frequency-ranked keywords: alphabetic runs of length >= 4, lower-cased,
/// stop-words removed, top `max_keywords` by descending count with ties
/// broken by first appearance. Deterministic for identical input.
pub fn extract_keywords(content: &str, vocab: &Vocabulary, config: ChunkingConfig) -> Vec<String> {
    let lowered = content.to_lowercase();

    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut first_seen = 0usize;
    for token in keyword_token_re().find_iter(&lowered) {
        let word = token.as_str();
        if vocab.is_keyword_stop_word(word) {
            continue;
        }
        let entry = counts.entry(word).or_insert_with(|| {
            let slot = (first_seen, 0);
            first_seen += 1;
            slot
        });
        entry.1 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(word, (order, count))| (word, order, count))
        .collect();
    ranked.sort_by(|a, b| b.2.cmp(&a.2).then(a.1.cmp(&b.1)));
    ranked.truncate(config.max_keywords);

    ranked.into_iter().map(|(word, _, _)| word.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChunkingConfig {
        ChunkingConfig::default()
    }

    #[test]
    fn non_empty_content_yields_non_empty_chunks() {
        let chunks = chunk_content("Plants grow. Water helps.", config());
        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].is_empty());
    }

    #[test]
    fn every_sentence_survives_chunking() {
        let text = "Alpha starts the cycle. Beta continues it! Gamma ends it?";
        let joined = chunk_content(text, config()).join(" ");
        assert!(joined.contains("Alpha starts the cycle"));
        assert!(joined.contains("Beta continues it"));
        assert!(joined.contains("Gamma ends it"));
    }

    #[test]
    fn chunks_respect_the_word_budget() {
        let sentence = "one two three four five six seven eight nine ten. ";
        let text = sentence.repeat(100);
        let cfg = ChunkingConfig {
            max_words: 50,
            ..config()
        };
        let chunks = chunk_content(&text, cfg);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            // budget plus at most one trailing sentence
            assert!(chunk.split_whitespace().count() <= 60, "chunk too long");
        }
    }

    #[test]
    fn punctuation_free_content_falls_back_to_word_windows() {
        let text = "alpha beta gamma delta epsilon zeta";
        let cfg = ChunkingConfig {
            max_words: 2,
            ..config()
        };
        let chunks = chunk_content(text, cfg);
        assert_eq!(chunks, vec!["alpha beta", "gamma delta", "epsilon zeta"]);
    }

    #[test]
    fn punctuation_free_content_keeps_its_text_verbatim() {
        // Word-window chunks are joined as-is, no punctuation is invented.
        let chunks = chunk_content("alpha beta gamma", config());
        assert_eq!(chunks, vec!["alpha beta gamma"]);
    }

    #[test]
    fn keywords_are_deterministic_and_capped() {
        let text = "Photosynthesis converts light energy. Photosynthesis needs chlorophyll. \
                    Energy flows through chlorophyll molecules.";
        let vocab = Vocabulary::default();
        let first = extract_keywords(text, &vocab, config());
        let second = extract_keywords(text, &vocab, config());
        assert_eq!(first, second);
        assert!(first.len() <= 20);
        assert_eq!(first[0], "photosynthesis");
        assert!(first.iter().all(|w| w.len() >= 4));
    }

    #[test]
    fn keywords_drop_stop_words_and_short_tokens() {
        let vocab = Vocabulary::default();
        let words = extract_keywords("this that with a an ab abc mitochondria", &vocab, config());
        assert_eq!(words, vec!["mitochondria"]);
    }

    #[test]
    fn keyword_ties_break_by_first_seen_order() {
        let vocab = Vocabulary::default();
        let words = extract_keywords("zebra apple zebra apple banana", &vocab, config());
        assert_eq!(words, vec!["zebra", "apple", "banana"]);
    }
}
