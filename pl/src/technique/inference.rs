//! Infers which technique a set of populated sections represents

use tracing::debug;

use super::registry::{Technique, all_techniques, fallback_technique, resolve_technique};

/// Outcome of inference, before it is flattened to a display label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inference {
    /// No sections and no technique: nothing to label
    Empty,
    /// A catalog technique, possibly with extra keys beyond its canonical set
    Known { technique: &'static Technique, is_custom: bool },
    /// A supplied reference that matches nothing in the catalog
    Unknown(String),
}

impl Inference {
    /// Display label: "", "Custom Prompt", "TACO", "Custom TACO" or the raw reference
    pub fn label(&self) -> String {
        match self {
            Inference::Empty => String::new(),
            Inference::Known { technique, .. } if technique.is_fallback() => technique.name.to_string(),
            Inference::Known { technique, is_custom } => {
                if *is_custom && !technique.name.starts_with("Custom") {
                    format!("Custom {}", technique.name)
                } else {
                    technique.name.to_string()
                }
            }
            Inference::Unknown(reference) => reference.clone(),
        }
    }

    pub fn technique(&self) -> Option<&'static Technique> {
        match self {
            Inference::Known { technique, .. } => Some(technique),
            _ => None,
        }
    }
}

/// Highest-overlap non-fallback technique; ties keep the earlier declaration
fn best_match<'a, I>(keys: I) -> Option<&'static Technique>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    let mut best: Option<(&'static Technique, usize)> = None;
    for technique in all_techniques().iter().filter(|t| !t.is_fallback()) {
        let score = keys.clone().into_iter().filter(|k| technique.has_key(k)).count();
        debug!(id = technique.id, score, "best_match: scored");
        if score >= 1 && best.is_none_or(|(_, top)| score > top) {
            best = Some((technique, score));
        }
    }
    best.map(|(t, _)| t)
}

/// Infer the technique for the given section keys
///
/// A supplied `current` reference (id, name or "Custom <Name>" label) wins over
/// scoring. Without one, the best-overlapping technique is chosen, falling back
/// to the custom technique when sections exist but none match.
pub fn infer<'a, I>(keys: I, current: Option<&str>) -> Inference
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    let current = current.map(str::trim).filter(|c| !c.is_empty());
    debug!(?current, "infer: called");

    let technique = match current {
        Some(reference) => match resolve_technique(reference) {
            Some(t) => t,
            None => {
                debug!(%reference, "infer: unknown technique reference");
                return Inference::Unknown(reference.to_string());
            }
        },
        None => match best_match(keys.clone()) {
            Some(t) => t,
            None if keys.clone().into_iter().next().is_some() => fallback_technique(),
            None => return Inference::Empty,
        },
    };

    let is_custom = !technique.is_fallback() && keys.into_iter().any(|k| !technique.has_key(k));
    debug!(id = technique.id, is_custom, "infer: resolved");
    Inference::Known { technique, is_custom }
}

/// Display label of the inferred technique
pub fn infer_technique<'a, I>(keys: I, current: Option<&str>) -> String
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    infer(keys, current).label()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(keys: &[&str], current: Option<&str>) -> String {
        infer_technique(keys.iter().copied(), current)
    }

    #[test]
    fn test_exact_taco() {
        assert_eq!(label(&["task", "actor", "context", "output"], None), "TACO");
    }

    #[test]
    fn test_taco_with_extra_key_is_custom() {
        assert_eq!(label(&["task", "actor", "context", "output", "extra"], None), "Custom TACO");
    }

    #[test]
    fn test_empty_is_blank() {
        assert_eq!(label(&[], None), "");
        assert_eq!(infer(std::iter::empty::<&str>(), None), Inference::Empty);
    }

    #[test]
    fn test_no_overlap_falls_back_to_custom_prompt() {
        assert_eq!(label(&["tone", "audience"], None), "Custom Prompt");
        assert_eq!(label(&["freeform"], None), "Custom Prompt");
    }

    #[test]
    fn test_tie_goes_to_earlier_declaration() {
        // task alone scores 1 for taco, chainOfThought, multipleOutputs and treeOfThought
        assert_eq!(label(&["task"], None), "TACO");
        // task + steps: chainOfThought scores 2, risen 1, taco 1
        assert_eq!(label(&["task", "steps"], None), "Chain of Thought");
        // role + steps ties risen with chainOfThought at 2; risen is declared first
        assert_eq!(label(&["task", "steps", "role"], None), "Custom RISEN");
    }

    #[test]
    fn test_highest_score_wins() {
        assert_eq!(label(&["role", "instructions", "steps"], None), "RISEN");
        assert_eq!(label(&["task", "explorationPaths", "evaluation"], None), "Tree of Thought");
        assert_eq!(label(&["systemRole", "constraints"], None), "System Prompting");
        assert_eq!(
            label(&["task", "numberOfOutputs"], None),
            "Multiple Outputs & Self-Consistency"
        );
    }

    #[test]
    fn test_current_technique_overrides_scoring() {
        assert_eq!(label(&["task", "actor", "context", "output"], Some("risen")), "Custom RISEN");
        assert_eq!(label(&["role"], Some("risen")), "RISEN");
        assert_eq!(label(&[], Some("taco")), "TACO");
        assert_eq!(label(&["task"], Some("custom")), "Custom Prompt");
    }

    #[test]
    fn test_current_technique_by_label() {
        assert_eq!(label(&["role", "tone"], Some("Custom RISEN")), "Custom RISEN");
        assert_eq!(label(&["role"], Some("Custom RISEN")), "RISEN");
        assert_eq!(label(&["task"], Some("TACO")), "TACO");
    }

    #[test]
    fn test_unknown_current_technique_is_passed_through() {
        assert_eq!(label(&["task"], Some("mystery")), "mystery");
        let inference = infer(["task"].iter().copied(), Some("mystery"));
        assert!(inference.technique().is_none());
    }

    #[test]
    fn test_blank_current_technique_is_ignored() {
        assert_eq!(label(&["task", "output"], Some("  ")), "TACO");
    }
}
