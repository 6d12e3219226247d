//! Template-driven answer synthesis.
//!
//! Each intent kind maps to one renderer over the relevant-knowledge subset:
//! the knowledge base filtered to entries whose key or value mentions any of
//! the question's key terms. Sections are emitted only when non-empty, and
//! when the filter leaves nothing at all, synthesis short-circuits with an
//! explicit "nothing found" response instead of an empty skeleton.

use crate::models::{IntentKind, KnowledgeBase, QuestionIntent};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Words that mark a fact sentence as a reason.
const REASON_INDICATORS: [&str; 5] = ["essential", "important", "because", "since", "due to"];

/// Relationship targets with these verbs read as importance statements.
const IMPORTANCE_VERBS: [&str; 4] = ["produces", "creates", "enables", "allows"];

/// Cue words for process descriptions hiding in prose categories.
const PROCESS_CUES: [&str; 5] = ["occurs", "happens", "process", "involves", "stages"];

/// Mentions of these suggest the documents reference a visual element.
const VISUAL_KEYWORDS: [&str; 9] = [
    "diagram",
    "figure",
    "chart",
    "graph",
    "illustration",
    "image",
    "picture",
    "visual",
    "schematic",
];

fn marker_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^.*?:\s*").unwrap())
}

fn ordinal_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(First|Second|Third|Fourth|Fifth|Next|Then|Finally)[,:]?\s*").unwrap()
    })
}

fn number_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+[.:]?\s*").unwrap())
}

fn component_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Z][a-z]?\d*|[a-zA-Z]+").unwrap())
}

fn fallback_equation_res() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        vec![
            Regex::new(r"([^.!?\n]*(?:\+|-|=|→|←)[^.!?\n]*)").unwrap(),
            Regex::new(
                r"([A-Z][a-z]?\d*(?:\s*\+\s*[A-Z][a-z]?\d*)*\s*→\s*[A-Z][a-z]?\d*(?:\s*\+\s*[A-Z][a-z]?\d*)*)",
            )
            .unwrap(),
        ]
    })
}

/// Filters every category to entries whose key, string value, or any list
/// item contains one of the search terms (all lower-cased).
pub fn find_relevant_knowledge(search_terms: &[String], knowledge: &KnowledgeBase) -> KnowledgeBase {
    let matches_any = |text: &str| {
        let lowered = text.to_lowercase();
        search_terms.iter().any(|term| lowered.contains(term.as_str()))
    };
    let list_matches = |key: &str, items: &[String]| {
        matches_any(key) || items.iter().any(|item| matches_any(item))
    };

    let mut relevant = KnowledgeBase::default();

    for (key, value) in &knowledge.definitions {
        if matches_any(key) || matches_any(value) {
            relevant.definitions.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in &knowledge.concepts {
        if matches_any(key) || matches_any(value) {
            relevant.concepts.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in &knowledge.equations {
        if matches_any(key) || matches_any(value) {
            relevant.equations.insert(key.clone(), value.clone());
        }
    }
    for (key, items) in &knowledge.processes {
        if list_matches(key, items) {
            relevant.processes.insert(key.clone(), items.clone());
        }
    }
    for (key, items) in &knowledge.relationships {
        if list_matches(key, items) {
            relevant.relationships.insert(key.clone(), items.clone());
        }
    }
    for (key, items) in &knowledge.facts {
        if list_matches(key, items) {
            relevant.facts.insert(key.clone(), items.clone());
        }
    }
    for (key, items) in &knowledge.applications {
        if list_matches(key, items) {
            relevant.applications.insert(key.clone(), items.clone());
        }
    }

    relevant
}

/// Renders the answer for a classified question against the full knowledge
/// base. Never fails; the worst case is the "nothing found" response.
pub fn synthesize_answer(intent: &QuestionIntent, knowledge: &KnowledgeBase) -> String {
    let concept = intent.main_concept.clone().unwrap_or_default();

    let mut search_terms = Vec::with_capacity(intent.key_terms.len() + 1);
    if !concept.is_empty() {
        search_terms.push(concept.clone());
    }
    search_terms.extend(intent.key_terms.iter().cloned());

    let relevant = find_relevant_knowledge(&search_terms, knowledge);
    if relevant.is_empty() {
        return format!(
            "I couldn't find specific information about '{concept}' in your uploaded \
             documents. Could you try asking about other topics covered in the documents?"
        );
    }

    match intent.kind {
        IntentKind::Definition => definition_answer(&concept, &relevant),
        IntentKind::ProcessExplanation | IntentKind::ProcessDescription => {
            process_answer(&concept, &relevant)
        }
        IntentKind::Reasoning | IntentKind::Importance => reasoning_answer(&concept, &relevant),
        IntentKind::Listing => listing_answer(&concept, &relevant),
        IntentKind::Equation => equation_answer(&concept, &relevant),
        IntentKind::Comparison => comparison_answer(&intent.key_terms, knowledge),
        IntentKind::General => comprehensive_answer(&concept, &relevant),
    }
}

fn definition_answer(concept: &str, relevant: &KnowledgeBase) -> String {
    let title = title_case(concept);
    let mut response = format!("**What is {title}?**\n\n");

    let mut found_definition = false;
    for (term, definition) in &relevant.definitions {
        if term.contains(concept) || concept.contains(term.as_str()) {
            let body = definition.trim_end_matches('.');
            response.push_str(&format!("**Definition:** {title} is {body}\n\n"));
            found_definition = true;
            break;
        }
    }

    if !found_definition {
        for (term, description) in &relevant.concepts {
            if term.contains(concept) || concept.contains(term.as_str()) {
                let body = description.trim_end_matches('.');
                response.push_str(&format!("**Overview:** {title} {body}\n\n"));
                found_definition = true;
                break;
            }
        }
    }

    if !found_definition {
        // Any substantial related sentence will do.
        let fallback = relevant
            .definitions
            .values()
            .chain(relevant.concepts.values())
            .map(String::as_str)
            .chain(
                relevant
                    .facts
                    .values()
                    .flat_map(|items| items.iter().map(String::as_str)),
            )
            .find(|text| text.len() > 20);
        if let Some(text) = fallback {
            let mut description = text.trim().to_string();
            if !description.ends_with('.') {
                description.push('.');
            }
            response.push_str(&format!("**Definition:** {title} is {description}\n\n"));
        }
    }

    if relevant.processes.values().any(|steps| !steps.is_empty()) {
        response.push_str("**Key Processes:**\n");
        for (name, steps) in &relevant.processes {
            if steps.is_empty() {
                continue;
            }
            response.push_str(&format!("\n*{}:*\n", title_case(name)));
            let mut index = 0;
            for step in steps {
                let cleaned = strip_marker(step);
                if cleaned.len() > 10 {
                    index += 1;
                    response.push_str(&format!("{index}. {cleaned}\n"));
                }
            }
            response.push('\n');
        }
    }

    if !relevant.equations.is_empty() {
        response.push_str("**Key Equations:**\n");
        for (name, equation) in &relevant.equations {
            response.push_str(&format!("\n*{}:*\n", title_case(name)));
            response.push_str(&format!("```\n{equation}\n```\n"));
        }
    }

    if !relevant.relationships.is_empty() {
        response.push_str("**Key Relationships:**\n");
        for (source, targets) in &relevant.relationships {
            for target in targets.iter().take(3) {
                let target = target.trim().trim_end_matches('.');
                response.push_str(&format!("• {} → {target}\n", title_case(source)));
            }
        }
        response.push('\n');
    }

    if !relevant.applications.is_empty() {
        response.push_str("**Applications & Importance:**\n");
        for app in relevant.applications.values().flatten().take(5) {
            let app = app.trim().trim_end_matches('.');
            response.push_str(&format!("• {app}\n"));
        }
        response.push('\n');
    }

    if !relevant.facts.is_empty() {
        response.push_str("**Key Facts:**\n");
        for fact in relevant
            .facts
            .values()
            .flatten()
            .filter(|fact| fact.len() > 20)
            .take(3)
        {
            let fact = fact.trim().trim_end_matches('.');
            response.push_str(&format!("• {fact}\n"));
        }
    }

    response.trim().to_string()
}

fn process_answer(concept: &str, relevant: &KnowledgeBase) -> String {
    let title = title_case(concept);
    let mut response = format!("**How {title} Works:**\n\n");

    let staged = relevant.processes.iter().find(|(_, steps)| !steps.is_empty());
    if let Some((_, steps)) = staged {
        response.push_str("The process involves these key stages:\n\n");
        let mut index = 0;
        for step in steps {
            let cleaned = strip_step_prefixes(step);
            if !cleaned.is_empty() {
                index += 1;
                response.push_str(&format!("**Stage {index}:** {cleaned}\n\n"));
            }
        }
    } else {
        // Prose categories sometimes describe the process without step cues.
        let description = relevant
            .concepts
            .values()
            .chain(relevant.definitions.values())
            .find(|value| {
                let lowered = value.to_lowercase();
                PROCESS_CUES.iter().any(|cue| lowered.contains(cue))
            });
        if let Some(description) = description {
            response.push_str(&format!("{}\n\n", description.trim()));
        }
    }

    if !relevant.relationships.is_empty() {
        response.push_str("**Key Relationships:**\n");
        for (source, targets) in &relevant.relationships {
            for target in targets.iter().take(2) {
                let target = target.trim().trim_end_matches('.');
                response.push_str(&format!("• {} leads to {target}\n", title_case(source)));
            }
        }
    }

    response.trim().to_string()
}

fn reasoning_answer(concept: &str, relevant: &KnowledgeBase) -> String {
    let title = title_case(concept);
    let mut response = format!("**Why {title} is Important:**\n\n");

    let mut reasons = Vec::new();
    for fact in relevant.facts.values().flatten() {
        let lowered = fact.to_lowercase();
        if REASON_INDICATORS.iter().any(|word| lowered.contains(word)) {
            reasons.push(fact.clone());
        }
    }
    for (source, targets) in &relevant.relationships {
        for target in targets {
            let lowered = target.to_lowercase();
            if IMPORTANCE_VERBS.iter().any(|verb| lowered.contains(verb)) {
                reasons.push(format!(
                    "{} is important because it {target}",
                    title_case(source)
                ));
            }
        }
    }

    if reasons.is_empty() {
        let fallback = relevant
            .definitions
            .values()
            .chain(relevant.concepts.values())
            .next();
        if let Some(text) = fallback {
            response.push_str(&format!("Based on the document: {text}\n\n"));
        }
    } else {
        for (index, reason) in reasons.iter().take(3).enumerate() {
            response.push_str(&format!("{}. {reason}\n\n", index + 1));
        }
    }

    if !relevant.applications.is_empty() {
        response.push_str("**Applications that show its importance:**\n");
        for apps in relevant.applications.values() {
            for app in apps.iter().take(3) {
                response.push_str(&format!("• {app}\n"));
            }
        }
    }

    response.trim().to_string()
}

fn listing_answer(concept: &str, relevant: &KnowledgeBase) -> String {
    let title = title_case(concept);
    let mut response = format!("**Types/Components of {title}:**\n\n");

    for (name, steps) in &relevant.processes {
        if steps.len() > 1 {
            response.push_str(&format!("**{} includes:**\n", title_case(name)));
            for (index, step) in steps.iter().enumerate() {
                response.push_str(&format!("{}. {}\n", index + 1, strip_marker(step)));
            }
            response.push('\n');
        }
    }

    if !relevant.applications.is_empty() {
        response.push_str("**Applications:**\n");
        let mut count = 0;
        for app in relevant.applications.values().flatten() {
            count += 1;
            response.push_str(&format!("{count}. {app}\n"));
        }
        response.push('\n');
    }

    if !relevant.concepts.is_empty() {
        response.push_str("**Related Concepts:**\n");
        for (index, (name, description)) in relevant.concepts.iter().enumerate() {
            response.push_str(&format!(
                "{}. **{}**: {description}\n",
                index + 1,
                title_case(name)
            ));
        }
    }

    response.trim().to_string()
}

fn equation_answer(concept: &str, relevant: &KnowledgeBase) -> String {
    let title = title_case(concept);
    let mut response = format!("**Mathematical Representation of {title}:**\n\n");

    if relevant.equations.is_empty() {
        // Equations sometimes only appear embedded in prose entries.
        let mut found: Vec<String> = Vec::new();
        for text in relevant.definitions.values().chain(relevant.concepts.values()) {
            for pattern in fallback_equation_res() {
                for caps in pattern.captures_iter(text) {
                    let Some(fragment) = caps.get(1) else { continue };
                    let equation = fragment.as_str().trim();
                    if equation.len() > 5
                        && equation.chars().any(|c| "+-=→←".contains(c))
                        && !found.iter().any(|existing| existing.as_str() == equation)
                    {
                        found.push(equation.to_string());
                    }
                }
            }
        }
        if !found.is_empty() {
            response.push_str("**Mathematical Equations:**\n\n");
            for (index, equation) in found.iter().take(3).enumerate() {
                response.push_str(&format!("**Equation {}:**\n", index + 1));
                response.push_str(&format!("```\n{equation}\n```\n\n"));
            }
        }
    } else {
        response.push_str("**Key Equations:**\n\n");
        for (name, equation) in &relevant.equations {
            response.push_str(&format!("**{}:**\n", title_case(name)));
            response.push_str(&format!("```\n{equation}\n```\n\n"));
            let components = explain_equation_components(equation, relevant);
            if !components.is_empty() {
                response.push_str("*Components:*\n");
                for line in components {
                    response.push_str(&line);
                    response.push('\n');
                }
            }
            response.push('\n');
        }
    }

    let explanation = relevant
        .definitions
        .values()
        .chain(relevant.concepts.values())
        .find(|value| {
            let lowered = value.to_lowercase();
            ["equation", "formula", "mathematical", "calculation"]
                .iter()
                .any(|word| lowered.contains(word))
        });
    if let Some(explanation) = explanation {
        response.push_str("**Mathematical Explanation:**\n");
        response.push_str(&format!("{explanation}\n\n"));
    }

    if let Some((name, steps)) = relevant.processes.iter().find(|(_, steps)| !steps.is_empty()) {
        response.push_str("**Process Context:**\n");
        response.push_str(&format!(
            "The equation represents the {name} which involves:\n"
        ));
        let mut index = 0;
        for step in steps.iter().take(3) {
            let cleaned = strip_marker(step);
            if !cleaned.is_empty() {
                index += 1;
                response.push_str(&format!("{index}. {cleaned}\n"));
            }
        }
        response.push('\n');
    }

    if !relevant.applications.is_empty() {
        response.push_str("**Applications:**\n");
        response.push_str("This mathematical relationship is used in:\n");
        for app in relevant.applications.values().flatten().take(4) {
            response.push_str(&format!("• {}\n", app.trim()));
        }
    }

    response.trim().to_string()
}

/// One line per equation component that some prose entry explains: the
/// component followed by the first sentence mentioning it.
fn explain_equation_components(equation: &str, relevant: &KnowledgeBase) -> Vec<String> {
    let mut lines = Vec::new();

    for component in component_re().find_iter(equation).take(5) {
        let component = component.as_str();
        let component_lower = component.to_lowercase();

        let explained = relevant
            .definitions
            .values()
            .chain(relevant.concepts.values())
            .find(|value| value.to_lowercase().contains(&component_lower));

        if let Some(value) = explained {
            let sentence = value
                .split(|c| matches!(c, '.' | '!' | '?'))
                .map(str::trim)
                .find(|sentence| sentence.to_lowercase().contains(&component_lower));
            if let Some(sentence) = sentence {
                lines.push(format!("• {component}: {sentence}"));
            }
        }
    }

    lines
}

fn comparison_answer(key_terms: &[String], knowledge: &KnowledgeBase) -> String {
    let mut response = String::from("**Comparison:**\n\n");

    for term in key_terms.iter().take(2) {
        let term_info = find_relevant_knowledge(std::slice::from_ref(term), knowledge);
        response.push_str(&format!("**{}:**\n", title_case(term)));

        let definition = term_info
            .definitions
            .iter()
            .find(|(key, _)| key.contains(term.as_str()) || term.contains(key.as_str()))
            .map(|(_, value)| value);
        let snippet = definition.or_else(|| {
            term_info
                .concepts
                .iter()
                .find(|(key, _)| key.contains(term.as_str()) || term.contains(key.as_str()))
                .map(|(_, value)| value)
        });

        if let Some(snippet) = snippet {
            response.push_str(&format!("• {snippet}\n"));
        }
        response.push('\n');
    }

    response.trim().to_string()
}

fn comprehensive_answer(concept: &str, relevant: &KnowledgeBase) -> String {
    let title = title_case(concept);
    let mut response = format!("**Complete Guide to {title}:**\n\n");

    let definition = relevant
        .definitions
        .iter()
        .find(|(term, _)| term.contains(concept) || concept.contains(term.as_str()));
    if let Some((_, definition)) = definition {
        response.push_str(&format!("**Definition:**\n{definition}\n\n"));
    } else if let Some((_, description)) = relevant
        .concepts
        .iter()
        .find(|(term, _)| term.contains(concept) || concept.contains(term.as_str()))
    {
        response.push_str(&format!("**Overview:**\n{description}\n\n"));
    }

    if relevant.processes.values().any(|steps| !steps.is_empty()) {
        response.push_str("**How It Works:**\n");
        for (name, steps) in &relevant.processes {
            if steps.is_empty() {
                continue;
            }
            response.push_str(&format!("\n*{} Process:*\n", title_case(name)));
            let mut index = 0;
            for step in steps {
                let cleaned = strip_marker(step);
                if cleaned.len() > 5 {
                    index += 1;
                    response.push_str(&format!("**Step {index}:** {cleaned}\n"));
                }
            }
            response.push('\n');
        }
    }

    if !relevant.equations.is_empty() {
        response.push_str("**Key Equations:**\n");
        for (name, equation) in &relevant.equations {
            response.push_str(&format!("\n*{}:*\n", title_case(name)));
            response.push_str(&format!("```\n{equation}\n```\n"));

            let equation_lower = equation.to_lowercase();
            let explanation = relevant
                .definitions
                .values()
                .chain(relevant.concepts.values())
                .find(|value| value.to_lowercase().contains(&equation_lower));
            if let Some(explanation) = explanation {
                response.push_str(&format!("*Explanation:* {}\n\n", explanation.trim()));
            }
        }
    }

    if !relevant.relationships.is_empty() {
        response.push_str("**Key Relationships:**\n");
        for (source, targets) in &relevant.relationships {
            response.push_str(&format!("\n*{} leads to:*\n", title_case(source)));
            for target in targets {
                let target = target.trim().trim_end_matches('.');
                response.push_str(&format!("• {target}\n"));
            }
        }
        response.push('\n');
    }

    if !relevant.applications.is_empty() {
        response.push_str("**Applications & Importance:**\n");
        for (category, apps) in &relevant.applications {
            if apps.is_empty() {
                continue;
            }
            response.push_str(&format!("\n*{} Applications:*\n", title_case(category)));
            for app in apps {
                let app = app.trim().trim_end_matches('.');
                response.push_str(&format!("• {app}\n"));
            }
        }
        response.push('\n');
    }

    if !relevant.facts.is_empty() {
        response.push_str("**Key Facts:**\n");
        for fact in relevant.facts.values().flatten().filter(|fact| fact.len() > 15) {
            let fact = fact.trim().trim_end_matches('.');
            response.push_str(&format!("• {fact}\n"));
        }
        response.push('\n');
    }

    let visuals = extract_visual_references(relevant);
    if !visuals.is_empty() {
        response.push_str("**Visual Elements:**\n");
        for visual in visuals {
            response.push_str(&format!("• {visual}\n"));
        }
        response.push('\n');
    }

    response.push_str("**Summary:**\n");
    response.push_str(&format!(
        "{title} is a fundamental concept that involves multiple interconnected \
         processes and has significant real-world applications. "
    ));
    if !relevant.equations.is_empty() {
        response.push_str("The mathematical relationships help quantify and predict outcomes. ");
    }
    if !relevant.applications.is_empty() {
        response.push_str(
            "Its applications span across various fields, making it essential for \
             understanding related phenomena.",
        );
    }

    response.trim().to_string()
}

/// Sentences anywhere in the relevant knowledge that mention a diagram,
/// figure, or similar visual element. First-seen order, duplicates dropped.
fn extract_visual_references(relevant: &KnowledgeBase) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut references = Vec::new();

    let mut scan = |text: &str| {
        for sentence in text.split(|c| matches!(c, '.' | '!' | '?')) {
            let sentence = sentence.trim();
            let lowered = sentence.to_lowercase();
            if VISUAL_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
                && seen.insert(sentence.to_string())
            {
                references.push(sentence.to_string());
            }
        }
    };

    for value in relevant
        .definitions
        .values()
        .chain(relevant.concepts.values())
        .chain(relevant.equations.values())
    {
        scan(value);
    }
    for item in relevant
        .processes
        .values()
        .chain(relevant.relationships.values())
        .chain(relevant.facts.values())
        .chain(relevant.applications.values())
        .flatten()
    {
        scan(item);
    }

    references
}

/// "Marker: description" step text with the marker removed.
fn strip_marker(step: &str) -> String {
    marker_prefix_re().replace(step, "").trim().to_string()
}

/// Strips ordinal words, numeric prefixes, and any remaining marker.
fn strip_step_prefixes(step: &str) -> String {
    let step = ordinal_prefix_re().replace(step, "");
    let step = number_prefix_re().replace(&step, "");
    marker_prefix_re().replace(&step, "").trim().to_string()
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(kind: IntentKind, terms: &[&str]) -> QuestionIntent {
        QuestionIntent {
            kind,
            key_terms: terms.iter().map(|t| t.to_string()).collect(),
            main_concept: terms.first().map(|t| t.to_string()),
        }
    }

    fn photosynthesis_kb() -> KnowledgeBase {
        let mut kb = KnowledgeBase::default();
        kb.definitions.insert(
            "photosynthesis".to_string(),
            "process by which plants convert light energy into chemical energy.".to_string(),
        );
        kb.equations.insert(
            "photosynthesis".to_string(),
            "6CO2 + 6H2O + light energy → C6H12O6 + 6O2".to_string(),
        );
        kb
    }

    #[test]
    fn definition_answer_includes_definition_and_equation() {
        let kb = photosynthesis_kb();
        let answer = synthesize_answer(&intent(IntentKind::Definition, &["photosynthesis"]), &kb);

        assert!(answer.starts_with("**What is Photosynthesis?**"));
        assert!(answer.contains("process by which plants convert light energy"));
        assert!(answer.contains("**Key Equations:**"));
        assert!(answer.contains("6CO2 + 6H2O"));
    }

    #[test]
    fn unknown_concept_short_circuits() {
        let kb = photosynthesis_kb();
        let answer = synthesize_answer(&intent(IntentKind::Definition, &["mitochondria"]), &kb);
        assert!(answer.contains("I couldn't find specific information about 'mitochondria'"));
    }

    #[test]
    fn process_answer_renders_cleaned_stages() {
        let mut kb = KnowledgeBase::default();
        kb.processes.insert(
            "osmosis".to_string(),
            vec![
                "1: Water enters the membrane".to_string(),
                "First, molecules diffuse outward".to_string(),
            ],
        );

        let answer = synthesize_answer(&intent(IntentKind::ProcessExplanation, &["osmosis"]), &kb);
        assert!(answer.starts_with("**How Osmosis Works:**"));
        assert!(answer.contains("**Stage 1:** Water enters the membrane"));
        assert!(answer.contains("**Stage 2:** molecules diffuse outward"));
    }

    #[test]
    fn reasoning_answer_turns_relationships_into_reasons() {
        let mut kb = KnowledgeBase::default();
        kb.relationships.insert(
            "photosynthesis".to_string(),
            vec!["produces oxygen for the atmosphere.".to_string()],
        );

        let answer = synthesize_answer(&intent(IntentKind::Reasoning, &["photosynthesis"]), &kb);
        assert!(answer.starts_with("**Why Photosynthesis is Important:**"));
        assert!(answer.contains("1. Photosynthesis is important because it produces oxygen"));
    }

    #[test]
    fn listing_answer_enumerates_applications() {
        let mut kb = KnowledgeBase::default();
        kb.applications.insert(
            "general".to_string(),
            vec!["fermentation in baking".to_string(), "fermentation in brewing".to_string()],
        );

        let answer = synthesize_answer(&intent(IntentKind::Listing, &["fermentation"]), &kb);
        assert!(answer.contains("**Applications:**"));
        assert!(answer.contains("1. fermentation in baking"));
        assert!(answer.contains("2. fermentation in brewing"));
    }

    #[test]
    fn equation_answer_explains_components_from_prose() {
        let mut kb = photosynthesis_kb();
        kb.definitions.insert(
            "co2".to_string(),
            "CO2 is the carbon dioxide consumed by photosynthesis.".to_string(),
        );

        let answer = synthesize_answer(&intent(IntentKind::Equation, &["photosynthesis"]), &kb);
        assert!(answer.contains("**Key Equations:**"));
        assert!(answer.contains("```\n6CO2 + 6H2O + light energy → C6H12O6 + 6O2\n```"));
        assert!(answer.contains("*Components:*"));
        assert!(answer.contains("carbon dioxide"));
    }

    #[test]
    fn equation_answer_recovers_equations_embedded_in_prose() {
        let mut kb = KnowledgeBase::default();
        kb.definitions.insert(
            "respiration".to_string(),
            "Respiration follows C6H12O6 + 6O2 → 6CO2 + 6H2O and releases energy".to_string(),
        );

        let answer = synthesize_answer(&intent(IntentKind::Equation, &["respiration"]), &kb);
        assert!(answer.contains("**Mathematical Equations:**"));
        assert!(answer.contains("**Equation 1:**"));
        assert!(answer.contains("C6H12O6 + 6O2"));
        // The same fragment matched by several patterns is emitted once.
        assert_eq!(answer.matches("**Equation").count(), 1);
    }

    #[test]
    fn comparison_answer_covers_first_two_terms() {
        let mut kb = KnowledgeBase::default();
        kb.definitions.insert(
            "osmosis".to_string(),
            "movement of water across a membrane.".to_string(),
        );
        kb.definitions.insert(
            "diffusion".to_string(),
            "spread of particles through a medium.".to_string(),
        );

        let answer = synthesize_answer(
            &intent(IntentKind::Comparison, &["osmosis", "diffusion"]),
            &kb,
        );
        assert!(answer.contains("**Osmosis:**"));
        assert!(answer.contains("movement of water"));
        assert!(answer.contains("**Diffusion:**"));
        assert!(answer.contains("spread of particles"));
    }

    #[test]
    fn comprehensive_answer_closes_with_a_summary() {
        let kb = photosynthesis_kb();
        let answer = synthesize_answer(&intent(IntentKind::General, &["photosynthesis"]), &kb);
        assert!(answer.starts_with("**Complete Guide to Photosynthesis:**"));
        assert!(answer.contains("**Summary:**"));
        assert!(answer.contains("mathematical relationships help quantify"));
    }

    #[test]
    fn visual_references_are_deduplicated_in_order() {
        let mut kb = KnowledgeBase::default();
        kb.facts.insert(
            "the cell diagram".to_string(),
            vec![
                "The diagram shows the cell membrane in detail".to_string(),
                "The diagram shows the cell membrane in detail".to_string(),
                "A figure illustrates the nucleus".to_string(),
            ],
        );

        let visuals = extract_visual_references(&kb);
        assert_eq!(visuals.len(), 2);
        assert!(visuals[0].contains("diagram shows"));
        assert!(visuals[1].contains("figure illustrates"));
    }

    #[test]
    fn title_case_capitalizes_each_word() {
        assert_eq!(title_case("water cycle"), "Water Cycle");
        assert_eq!(title_case("PHOTOSYNTHESIS"), "Photosynthesis");
    }
}
