//! Pattern-based knowledge extraction.
//!
//! Seven recognizer families fold document text into the [`KnowledgeBase`]
//! categories. The pair-capture families (definitions, concepts,
//! relationships) run as a uniform rule table; processes, facts, equations,
//! and applications need their own passes. All patterns are compiled once at
//! construction.

use crate::models::{Document, KnowledgeBase};
use regex::Regex;
use std::collections::BTreeMap;

/// Symbols that qualify a text fragment as equation-like.
const EQUATION_SYMBOLS: [char; 7] = ['+', '-', '=', '→', '←', '×', '*'];

/// Phrases that mark a sentence as an assertive fact.
const FACT_INDICATORS: [&str; 6] = [
    "is essential",
    "is important",
    "produces",
    "contains",
    "occurs in",
    "found in",
];

/// Names too generic to label an equation with.
const GENERIC_EQUATION_NAMES: [&str; 5] = ["the", "this", "that", "overall", "general"];

#[derive(Debug, Clone, Copy)]
enum PairCategory {
    Definition,
    Concept,
    Relationship,
}

/// One capture-pair recognizer: a pattern with two groups (key phrase,
/// clause), the category its matches fold into, and an acceptance predicate
/// over the trimmed pair.
struct PairRule {
    category: PairCategory,
    pattern: Regex,
    accept: fn(&str, &str) -> bool,
}

fn accept_definition(term: &str, clause: &str) -> bool {
    term.len() > 2 && clause.len() > 10
}

fn accept_concept(term: &str, clause: &str) -> bool {
    term.len() > 2 && clause.len() > 15
}

fn accept_relationship(_term: &str, _clause: &str) -> bool {
    true
}

pub struct KnowledgeExtractor {
    pair_rules: Vec<PairRule>,
    process_indicator: Regex,
    step_patterns: Vec<Regex>,
    equation_context_patterns: Vec<Regex>,
    equation_standalone_patterns: Vec<Regex>,
    application_patterns: Vec<Regex>,
}

impl KnowledgeExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        let pair = |category, pattern: &str, accept| -> Result<PairRule, regex::Error> {
            Ok(PairRule {
                category,
                pattern: Regex::new(pattern)?,
                accept,
            })
        };

        let pair_rules = vec![
            pair(
                PairCategory::Definition,
                r"([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\s+is\s+(?:a|an|the)\s+([^.!?]+[.!?])",
                accept_definition,
            )?,
            pair(
                PairCategory::Definition,
                r"([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\s+are\s+([^.!?]+[.!?])",
                accept_definition,
            )?,
            pair(
                PairCategory::Definition,
                r"([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\s+means\s+([^.!?]+[.!?])",
                accept_definition,
            )?,
            pair(
                PairCategory::Definition,
                r"([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\s+refers\s+to\s+([^.!?]+[.!?])",
                accept_definition,
            )?,
            pair(
                PairCategory::Concept,
                r"([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\s*[:\-]\s*([^.!?]+[.!?])",
                accept_concept,
            )?,
            pair(
                PairCategory::Concept,
                r"The\s+([a-z]+(?:\s+[a-z]+)*)\s+([^.!?]+[.!?])",
                accept_concept,
            )?,
            pair(
                PairCategory::Relationship,
                r"(?i)([A-Z][a-z]+(?:\s+[a-z]+)*)\s+(?:causes?|leads?\s+to|results?\s+in)\s+([^.!?]+[.!?])",
                accept_relationship,
            )?,
            pair(
                PairCategory::Relationship,
                r"(?i)([A-Z][a-z]+(?:\s+[a-z]+)*)\s+(?:requires?|needs?|depends?\s+on)\s+([^.!?]+[.!?])",
                accept_relationship,
            )?,
            pair(
                PairCategory::Relationship,
                r"(?i)([A-Z][a-z]+(?:\s+[a-z]+)*)\s+(?:produces?|creates?|generates?)\s+([^.!?]+[.!?])",
                accept_relationship,
            )?,
        ];

        Ok(Self {
            pair_rules,
            process_indicator: Regex::new(
                r"(?i)([A-Z][a-z]+(?:\s+[a-z]+)*)\s+(?:process|occurs|happens|involves)",
            )?,
            step_patterns: vec![
                Regex::new(r"(?i)(\d+)\.\s+([^.!?]+[.!?])")?,
                Regex::new(
                    r"(?i)(First|Second|Third|Fourth|Fifth|Next|Then|Finally)[,:]?\s+([^.!?]+[.!?])",
                )?,
                Regex::new(r"(?i)(Stage\s+\d+|Step\s+\d+)[:\s]+([^.!?]+[.!?])")?,
            ],
            equation_context_patterns: vec![
                Regex::new(r"(?i)(?:equation|formula|expression)[:\s]*([^.!?\n]+)")?,
                Regex::new(r"(?i)(?:overall|general|main)\s+(?:equation|formula)[:\s]*([^.!?\n]+)")?,
                Regex::new(r"(?i)(?:the|this)\s+(?:equation|formula)\s+(?:is|for)[:\s]*([^.!?\n]+)")?,
            ],
            equation_standalone_patterns: vec![
                Regex::new(r"([^.!?\n]*(?:\+|-|=|→|←|×|÷|\*|/)[^.!?\n]*)")?,
                Regex::new(
                    r"([A-Z][a-z]?\d*(?:\s*\+\s*[A-Z][a-z]?\d*)*\s*→\s*[A-Z][a-z]?\d*(?:\s*\+\s*[A-Z][a-z]?\d*)*)",
                )?,
                Regex::new(r"([A-Za-z]+\s*=\s*[^.!?\n]+)")?,
            ],
            application_patterns: vec![
                Regex::new(r"(?i)(?:used\s+(?:in|for)|applications?|examples?)\s*[:\-]?\s*([^.!?]+[.!?])")?,
                Regex::new(r"(?i)([A-Z][a-z]+(?:\s+[a-z]+)*)\s+is\s+used\s+(?:in|for)\s+([^.!?]+[.!?])")?,
            ],
        })
    }

    /// Folds every document into one knowledge base. Pure function of the
    /// documents passed in; rebuilt per query.
    pub fn build<'a>(&self, documents: impl Iterator<Item = &'a Document>) -> KnowledgeBase {
        let mut kb = KnowledgeBase::default();
        for document in documents {
            self.extract_pairs(&document.content, &mut kb);
            self.extract_processes(&document.content, &mut kb.processes);
            self.extract_facts(&document.content, &mut kb.facts);
            self.extract_equations(&document.content, &mut kb.equations);
            self.extract_applications(&document.content, &mut kb.applications);
        }
        kb
    }

    fn extract_pairs(&self, content: &str, kb: &mut KnowledgeBase) {
        for rule in &self.pair_rules {
            for caps in rule.pattern.captures_iter(content) {
                let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                let key = key.as_str().trim();
                let value = value.as_str().trim();
                if !(rule.accept)(key, value) {
                    continue;
                }
                match rule.category {
                    PairCategory::Definition => {
                        kb.definitions.insert(key.to_lowercase(), value.to_string());
                    }
                    PairCategory::Concept => {
                        kb.concepts.insert(key.to_lowercase(), value.to_string());
                    }
                    PairCategory::Relationship => {
                        kb.relationships
                            .entry(key.to_lowercase())
                            .or_default()
                            .push(value.to_string());
                    }
                }
            }
        }
    }

    /// Process names are discovered from "<phrase> process/occurs/happens/
    /// involves" cues; steps attach to the first known process whose name
    /// appears in the same document.
    fn extract_processes(&self, content: &str, processes: &mut BTreeMap<String, Vec<String>>) {
        let content_lower = content.to_lowercase();

        for caps in self.process_indicator.captures_iter(content) {
            if let Some(name) = caps.get(1) {
                let name = name.as_str().trim().to_lowercase();
                processes.entry(name).or_default();
            }
        }

        for pattern in &self.step_patterns {
            for caps in pattern.captures_iter(content) {
                let (Some(marker), Some(description)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                let step = format!("{}: {}", marker.as_str(), description.as_str().trim());

                let target = processes
                    .keys()
                    .find(|name| content_lower.contains(name.as_str()))
                    .cloned();
                if let Some(name) = target {
                    if let Some(steps) = processes.get_mut(&name) {
                        steps.push(step);
                    }
                }
            }
        }
    }

    /// Sentences bearing an assertive phrase, keyed by their first three
    /// words.
    fn extract_facts(&self, content: &str, facts: &mut BTreeMap<String, Vec<String>>) {
        for sentence in content.split(|c| matches!(c, '.' | '!' | '?')) {
            let sentence = sentence.trim();
            if sentence.len() <= 20 {
                continue;
            }
            let lowered = sentence.to_lowercase();
            if !FACT_INDICATORS
                .iter()
                .any(|indicator| lowered.contains(indicator))
            {
                continue;
            }

            let words: Vec<&str> = sentence.split_whitespace().collect();
            if words.len() > 3 {
                let subject = words[..3].join(" ").to_lowercase();
                facts.entry(subject).or_default().push(sentence.to_string());
            }
        }
    }

    /// Two passes: fragments anchored on explicit equation/formula context
    /// words are preferred; any remaining symbol-bearing fragment is swept up
    /// as a fallback.
    fn extract_equations(&self, content: &str, equations: &mut BTreeMap<String, String>) {
        for pattern in &self.equation_context_patterns {
            for caps in pattern.captures_iter(content) {
                let Some(fragment) = caps.get(1) else { continue };
                let equation = fragment.as_str().trim();
                if equation.len() > 3 && has_equation_symbol(equation) {
                    let name =
                        find_equation_name(equation, content).unwrap_or_else(|| "equation".into());
                    equations.insert(name, equation.to_string());
                }
            }
        }

        for pattern in &self.equation_standalone_patterns {
            for caps in pattern.captures_iter(content) {
                let Some(fragment) = caps.get(1) else { continue };
                let equation = fragment.as_str().trim();
                if equation.len() > 5 && has_equation_symbol(equation) {
                    let equation = collapse_whitespace(equation);
                    let name =
                        find_equation_name(&equation, content).unwrap_or_else(|| "formula".into());
                    equations.insert(name, equation);
                }
            }
        }
    }

    /// Clauses after "used in/for", "applications", or "examples" cues,
    /// comma-split into individual application phrases.
    fn extract_applications(&self, content: &str, applications: &mut BTreeMap<String, Vec<String>>) {
        for pattern in &self.application_patterns {
            for caps in pattern.captures_iter(content) {
                let clause = caps
                    .get(2)
                    .or_else(|| caps.get(1))
                    .map(|m| m.as_str())
                    .unwrap_or_default();

                for app in clause.split(',') {
                    let app = app.trim();
                    if app.len() > 5 {
                        applications
                            .entry("general".to_string())
                            .or_default()
                            .push(app.to_string());
                    }
                }
            }
        }
    }
}

fn has_equation_symbol(text: &str) -> bool {
    text.chars().any(|c| EQUATION_SYMBOLS.contains(&c))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Searches for a descriptive name near the equation: anchored
/// "<name> equation/formula/reaction" phrasings first, then the subject of
/// the preceding sentence. None when nothing better than a generic word is
/// found.
fn find_equation_name(equation: &str, content: &str) -> Option<String> {
    let escaped = regex::escape(equation);

    let anchored = [
        format!(r"(?i)([a-zA-Z\s]+)\s+(?:equation|formula|reaction)[:\s]*{escaped}"),
        format!(r"(?i)(?:equation|formula|reaction)\s+(?:for|of)\s+([a-zA-Z\s]+)[:\s]*{escaped}"),
        format!(r"(?i)([a-zA-Z\s]+)[:\s]*{escaped}"),
    ];

    for pattern in &anchored {
        let Ok(re) = Regex::new(pattern) else { continue };
        if let Some(caps) = re.captures(content) {
            if let Some(name) = caps.get(1) {
                let name = name.as_str().trim().to_lowercase();
                if name.len() > 2 && !GENERIC_EQUATION_NAMES.contains(&name.as_str()) {
                    return Some(name);
                }
            }
        }
    }

    // Preceding descriptive phrase: the subject word of the sentence leading
    // up to the equation.
    let position = content.find(equation)?;
    let preceding = &content[..position];
    let last_sentence = preceding
        .rsplit(|c| matches!(c, '.' | '!' | '?'))
        .map(str::trim)
        .find(|fragment| !fragment.is_empty())?;

    let subject = last_sentence
        .split_whitespace()
        .find(|word| word.len() >= 4 && word.chars().all(|c| c.is_ascii_alphabetic()))?
        .to_lowercase();

    if subject.len() > 2 && !GENERIC_EQUATION_NAMES.contains(&subject.as_str()) {
        Some(subject)
    } else {
        None
    }
}
