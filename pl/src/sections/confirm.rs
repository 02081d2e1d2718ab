//! Classifies user replies as acceptance of a staged proposal

use tracing::debug;

const AFFIRMATIONS: &[&str] = &[
    "yes",
    "yep",
    "yeah",
    "sure",
    "ok",
    "okay",
    "use this",
    "use it",
    "looks good",
    "perfect",
    "great",
    "sounds good",
    "that works",
    "correct",
    "right",
    "good",
];

/// Affirmation-led phrases that are not agreement
const IDIOMS: &[&str] = &["good riddance", "good grief", "good luck", "good bye", "good night"];

const BOUNDARY_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Whether the reply accepts the pending proposal
///
/// The reply must be an affirmation on its own or start with one followed by
/// whitespace or punctuation, so "goodbye" and "okayish" never match.
pub fn is_confirming(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    debug!(%normalized, "is_confirming: called");

    if IDIOMS.iter().any(|idiom| starts_with_word(&normalized, idiom)) {
        debug!("is_confirming: idiom, not a confirmation");
        return false;
    }

    let confirmed = AFFIRMATIONS.iter().any(|kw| starts_with_word(&normalized, kw));
    debug!(%confirmed, "is_confirming: classified");
    confirmed
}

fn starts_with_word(text: &str, word: &str) -> bool {
    match text.strip_prefix(word) {
        Some("") => true,
        Some(rest) => rest
            .chars()
            .next()
            .is_some_and(|c| c.is_whitespace() || BOUNDARY_PUNCTUATION.contains(&c)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_affirmations() {
        for kw in AFFIRMATIONS {
            assert!(is_confirming(kw), "{kw} should confirm");
        }
    }

    #[test]
    fn test_normalization() {
        assert!(is_confirming("  YES  "));
        assert!(is_confirming("Okay."));
        assert!(is_confirming("\tSure\n"));
    }

    #[test]
    fn test_prefix_with_trailing_text() {
        assert!(is_confirming("Looks good, thanks!"));
        assert!(is_confirming("yes please"));
        assert!(is_confirming("perfect!"));
        assert!(is_confirming("use this one"));
        assert!(is_confirming("That works. Next section?"));
    }

    #[test]
    fn test_rejects_word_prefixes() {
        assert!(!is_confirming("goodbye"));
        assert!(!is_confirming("okayish I guess"));
        assert!(!is_confirming("rightly so"));
        assert!(!is_confirming("yesterday was fun"));
    }

    #[test]
    fn test_rejects_idioms() {
        assert!(!is_confirming("good riddance"));
        assert!(!is_confirming("Good luck with that"));
        assert!(!is_confirming("good night!"));
    }

    #[test]
    fn test_rejects_unrelated_sentences() {
        assert!(!is_confirming("can you make it shorter?"));
        assert!(!is_confirming("I don't think that's good"));
        assert!(!is_confirming("no"));
        assert!(!is_confirming(""));
        assert!(!is_confirming("   "));
    }
}
