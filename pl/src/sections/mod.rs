//! Section parsing for assistant and user chat messages
//!
//! Pure functions only: nothing in here owns state or fails.

mod confirm;
mod detector;
mod labels;

pub use confirm::is_confirming;
pub use detector::{
    DetectionPattern, PatternDetector, SectionDetection, SectionDetector, detect_section, extract_code_block_content,
};
pub use labels::{is_known_key, key_to_label, label_to_key};
