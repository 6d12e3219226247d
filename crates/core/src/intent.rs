//! Question intent classification.
//!
//! An ordered phrase-group table maps the question to exactly one
//! [`IntentKind`]; the first group with a hit wins and the default is
//! `General`. Key terms are the question's significant words with the
//! question stop-list removed, in first-seen order.

use crate::models::{IntentKind, QuestionIntent};
use crate::vocab::Vocabulary;
use regex::Regex;
use std::sync::OnceLock;

/// Checked in order; earlier groups shadow later ones ("what are the" never
/// fires because "what are" classifies as Definition first).
const INTENT_PHRASES: &[(IntentKind, &[&str])] = &[
    (IntentKind::Definition, &["what is", "what are", "define"]),
    (
        IntentKind::ProcessExplanation,
        &["how does", "how do", "explain how", "describe how"],
    ),
    (IntentKind::Reasoning, &["why is", "why does", "why do"]),
    (
        IntentKind::ProcessDescription,
        &["what happens", "what occurs"],
    ),
    (IntentKind::Listing, &["what are the", "list", "types of"]),
    (IntentKind::Equation, &["equation", "formula"]),
    (
        IntentKind::Importance,
        &["importance", "important", "significance"],
    ),
    (IntentKind::Comparison, &["difference", "compare"]),
];

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[a-zA-Z]{2,}\b").unwrap())
}

#[derive(Debug, Clone, Default)]
pub struct IntentClassifier {
    vocab: Vocabulary,
}

impl IntentClassifier {
    pub fn new(vocab: Vocabulary) -> Self {
        Self { vocab }
    }

    pub fn classify(&self, question: &str) -> QuestionIntent {
        let question_lower = question.to_lowercase();

        let kind = INTENT_PHRASES
            .iter()
            .find(|(_, phrases)| phrases.iter().any(|p| question_lower.contains(p)))
            .map(|(kind, _)| *kind)
            .unwrap_or(IntentKind::General);

        let key_terms: Vec<String> = word_re()
            .find_iter(&question_lower)
            .map(|m| m.as_str().to_string())
            .filter(|word| word.len() > 2 && !self.vocab.is_question_stop_word(word))
            .collect();

        let main_concept = key_terms.first().cloned();

        QuestionIntent {
            kind,
            key_terms,
            main_concept,
        }
    }
}
