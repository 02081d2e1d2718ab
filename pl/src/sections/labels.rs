//! Section label <-> key normalization
//!
//! Labels are what people (and Chad) write: "Number of Outputs", "End Goal".
//! Keys are the camelCase identifiers the document stores: `numberOfOutputs`.

use tracing::debug;

/// Lowercased label -> canonical key for every section any technique defines
const LABEL_SYNONYMS: &[(&str, &str)] = &[
    ("task", "task"),
    ("actor", "actor"),
    ("context", "context"),
    ("output", "output"),
    ("examples", "examples"),
    ("role", "role"),
    ("instructions", "instructions"),
    ("steps", "steps"),
    ("end goal", "endGoal"),
    ("narrowing", "narrowing"),
    ("reasoning steps", "steps"),
    ("trigger phrase", "triggerPhrase"),
    ("number of outputs", "numberOfOutputs"),
    ("selection criteria", "selectionCriteria"),
    ("exploration paths", "explorationPaths"),
    ("evaluation", "evaluation"),
    ("system role", "systemRole"),
    ("user instructions", "userInstructions"),
    ("constraints", "constraints"),
    ("freeform", "freeform"),
];

/// Canonical key -> display label
const KEY_LABELS: &[(&str, &str)] = &[
    ("task", "Task"),
    ("actor", "Actor"),
    ("context", "Context"),
    ("output", "Output"),
    ("examples", "Examples"),
    ("role", "Role"),
    ("instructions", "Instructions"),
    ("steps", "Steps"),
    ("endGoal", "End Goal"),
    ("narrowing", "Narrowing"),
    ("triggerPhrase", "Trigger Phrase"),
    ("numberOfOutputs", "Number of Outputs"),
    ("selectionCriteria", "Selection Criteria"),
    ("explorationPaths", "Exploration Paths"),
    ("evaluation", "Evaluation"),
    ("systemRole", "System Role"),
    ("userInstructions", "User Instructions"),
    ("constraints", "Constraints"),
    ("freeform", "Freeform"),
];

/// Convert a human-readable label to a section key
///
/// Known labels map through the synonym table; anything else becomes camelCase
/// ("Target Audience" -> `targetAudience`). Blank input yields an empty key,
/// which callers must treat as "no section".
pub fn label_to_key(label: &str) -> String {
    let normalized = label.trim().to_lowercase();
    debug!(%normalized, "label_to_key: called");

    if let Some((_, key)) = LABEL_SYNONYMS.iter().find(|(l, _)| *l == normalized) {
        debug!(%key, "label_to_key: synonym hit");
        return (*key).to_string();
    }

    to_camel_case(&normalized)
}

/// Convert a section key to its display label
pub fn key_to_label(key: &str) -> String {
    debug!(%key, "key_to_label: called");
    if let Some((_, label)) = KEY_LABELS.iter().find(|(k, _)| *k == key) {
        return (*label).to_string();
    }

    let mut spaced = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_uppercase() {
            spaced.push(' ');
        }
        spaced.push(c);
    }
    capitalize(spaced.trim())
}

/// Whether the key belongs to the fixed display vocabulary
pub fn is_known_key(key: &str) -> bool {
    KEY_LABELS.iter().any(|(k, _)| *k == key)
}

fn to_camel_case(s: &str) -> String {
    s.split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            if i == 0 {
                word.to_lowercase()
            } else {
                capitalize(&word.to_lowercase())
            }
        })
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
