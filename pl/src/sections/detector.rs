//! Heuristic section detection over assistant messages
//!
//! Chad announces prompt sections in a handful of recognizable shapes. The
//! [`PatternDetector`] tries them in priority order:
//!
//! 1. `## Section 2: Role` headers (content optional)
//! 2. `**Role**` bold labels (content optional)
//! 3. "refine/update/improve/rewrite the Role section" (needs a code block)
//! 4. "adding a Tone section" / "here is a new Tone section" (needs a code block)
//!
//! Proposed content always comes from the first fenced code block.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::labels::label_to_key;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)##\s*Section\s*\d+:\s*([A-Za-z\s]+?)(?:\n|$)").expect("invalid section header regex")
});

static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([A-Za-z\s]+)\*\*").expect("invalid bold label regex"));

static REFINEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:refin|updat|improv|rewrit)[a-z]*\s+(?:the\s+)?([A-Za-z\s]+?)\s*(?:section|:)")
        .expect("invalid refinement regex")
});

static CUSTOM_SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:(?:add|adding|create|creating)\s+(?:a|an|the)?\s*|(?:here'?s|here\s+is)\s+(?:a|an|the)?\s*new\s+)([A-Za-z\s]+?)\s+section[:\s]",
    )
    .expect("invalid custom section regex")
});

// Language tag only counts when the fence line ends right after it
static CODE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:[\w+-]*[ \t]*\r?\n)?(.*?)```").expect("invalid code block regex"));

/// Which message shape produced a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionPattern {
    Header,
    Bold,
    Refinement,
    CustomSection,
}

/// A section the assistant is talking about, with its proposed text if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SectionDetection {
    pub key: String,
    pub label: String,
    pub proposed_content: Option<String>,
    pub pattern: DetectionPattern,
}

impl SectionDetection {
    /// Whether the detection carries text that may be written into a document
    pub fn has_content(&self) -> bool {
        self.proposed_content.is_some()
    }
}

/// Strategy for turning a free-text assistant message into a section detection
///
/// Implementations must be total: a miss is `None`, never a panic or error.
pub trait SectionDetector: Send + Sync {
    fn detect(&self, message: &str) -> Option<SectionDetection>;
}

/// Regex-based detector matching Chad's conventions
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternDetector;

impl PatternDetector {
    pub fn new() -> Self {
        Self
    }

    fn try_pattern(
        &self,
        re: &Regex,
        pattern: DetectionPattern,
        message: &str,
        content: &Option<String>,
        requires_content: bool,
    ) -> Option<SectionDetection> {
        let caps = re.captures(message)?;
        let label = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let key = label_to_key(label);
        if key.is_empty() {
            debug!(?pattern, "try_pattern: blank label, skipping");
            return None;
        }
        if requires_content && content.is_none() {
            debug!(?pattern, %key, "try_pattern: no code block, skipping");
            return None;
        }

        debug!(?pattern, %key, has_content = content.is_some(), "try_pattern: matched");
        Some(SectionDetection {
            key,
            label: label.to_string(),
            proposed_content: content.clone(),
            pattern,
        })
    }
}

impl SectionDetector for PatternDetector {
    fn detect(&self, message: &str) -> Option<SectionDetection> {
        debug!(len = message.len(), "PatternDetector::detect: called");
        let content = extract_code_block_content(message).filter(|c| !c.is_empty());

        self.try_pattern(&HEADER_RE, DetectionPattern::Header, message, &content, false)
            .or_else(|| self.try_pattern(&BOLD_RE, DetectionPattern::Bold, message, &content, false))
            .or_else(|| self.try_pattern(&REFINEMENT_RE, DetectionPattern::Refinement, message, &content, true))
            .or_else(|| {
                self.try_pattern(
                    &CUSTOM_SECTION_RE,
                    DetectionPattern::CustomSection,
                    message,
                    &content,
                    true,
                )
            })
    }
}

/// Detect with the default pattern set
pub fn detect_section(message: &str) -> Option<SectionDetection> {
    PatternDetector.detect(message)
}

/// Trimmed inner text of the first fenced code block, if the message has one
pub fn extract_code_block_content(message: &str) -> Option<String> {
    CODE_BLOCK_RE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}
