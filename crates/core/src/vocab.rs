use std::collections::HashSet;

/// Words too common to carry signal during keyword indexing.
const KEYWORD_STOP_WORDS: &[&str] = &[
    "this", "that", "with", "have", "will", "from", "they", "been", "said", "each", "which",
    "their", "time", "about", "would", "there", "could", "other", "more", "very", "what", "know",
    "just", "first", "into", "over", "think", "also", "your", "work", "life", "only", "can",
    "still", "should", "after", "being", "now", "made", "before", "here", "through", "when",
    "where", "much", "some", "these", "many", "then", "them", "well", "were",
];

/// Broader list used when reading questions: interrogatives and verbs like
/// "explain" or "describe" are framing, not subject matter.
const QUESTION_STOP_WORDS: &[&str] = &[
    "what", "is", "are", "how", "does", "do", "why", "the", "a", "an", "and", "or", "but", "in",
    "on", "at", "to", "for", "of", "with", "by", "can", "could", "would", "should", "will",
    "have", "has", "had", "be", "been", "being", "this", "that", "these", "those", "explain",
    "describe", "tell", "me", "about",
];

/// Stop-word configuration injected into the keyword indexer and the intent
/// classifier. Tests can substitute alternate vocabularies.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    keyword_stop_words: HashSet<String>,
    question_stop_words: HashSet<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(
            KEYWORD_STOP_WORDS.iter().map(|w| (*w).to_string()),
            QUESTION_STOP_WORDS.iter().map(|w| (*w).to_string()),
        )
    }
}

impl Vocabulary {
    pub fn new(
        keyword_stop_words: impl IntoIterator<Item = String>,
        question_stop_words: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            keyword_stop_words: keyword_stop_words.into_iter().collect(),
            question_stop_words: question_stop_words.into_iter().collect(),
        }
    }

    pub fn is_keyword_stop_word(&self, word: &str) -> bool {
        self.keyword_stop_words.contains(word)
    }

    pub fn is_question_stop_word(&self, word: &str) -> bool {
        self.question_stop_words.contains(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lists_cover_both_roles() {
        let vocab = Vocabulary::default();
        assert!(vocab.is_keyword_stop_word("which"));
        assert!(vocab.is_question_stop_word("explain"));
        assert!(!vocab.is_keyword_stop_word("photosynthesis"));
    }

    #[test]
    fn question_list_is_broader_than_keyword_list() {
        let vocab = Vocabulary::default();
        assert!(vocab.is_question_stop_word("what"));
        assert!(vocab.is_question_stop_word("describe"));
        assert!(!vocab.is_keyword_stop_word("describe"));
    }

    #[test]
    fn alternate_vocabulary_is_honored() {
        let vocab = Vocabulary::new(vec!["zork".to_string()], vec!["grue".to_string()]);
        assert!(vocab.is_keyword_stop_word("zork"));
        assert!(!vocab.is_keyword_stop_word("which"));
        assert!(vocab.is_question_stop_word("grue"));
    }
}
