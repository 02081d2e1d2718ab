//! Plain-text export of prompts

use promptstore::SavedPrompt;

use crate::domain::DocumentView;
use crate::sections::key_to_label;

/// `[Label]\ncontent` blocks separated by a blank line
pub fn format_sections<'a, I>(sections: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    sections
        .into_iter()
        .map(|(key, content)| format!("[{}]\n{}", key_to_label(key), content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Copy text for a library entry
pub fn format_entry(entry: &SavedPrompt) -> String {
    format_sections(entry.sections.iter().map(|s| (s.key.as_str(), s.content.as_str())))
}

/// Copy text for the workspace document
pub fn format_view(view: &DocumentView) -> String {
    format_sections(view.sections.iter().map(|s| (s.key.as_str(), s.content.as_str())))
}
