//! Library search, sorting and timestamps for listings

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use promptstore::SavedPrompt;
use tracing::debug;

use crate::technique::infer_technique;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Listing order for library entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOption {
    NameAsc,
    NameDesc,
    CreatedAsc,
    CreatedDesc,
    UpdatedAsc,
    #[default]
    UpdatedDesc,
}

impl SortOption {
    pub const ALL: [SortOption; 6] = [
        SortOption::NameAsc,
        SortOption::NameDesc,
        SortOption::CreatedAsc,
        SortOption::CreatedDesc,
        SortOption::UpdatedAsc,
        SortOption::UpdatedDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::NameAsc => "name-asc",
            SortOption::NameDesc => "name-desc",
            SortOption::CreatedAsc => "created-asc",
            SortOption::CreatedDesc => "created-desc",
            SortOption::UpdatedAsc => "updated-asc",
            SortOption::UpdatedDesc => "updated-desc",
        }
    }

    fn compare(&self, a: &SavedPrompt, b: &SavedPrompt) -> Ordering {
        match self {
            SortOption::NameAsc => compare_names(&a.name, &b.name),
            SortOption::NameDesc => compare_names(&b.name, &a.name),
            SortOption::CreatedAsc => a.created_at.cmp(&b.created_at),
            SortOption::CreatedDesc => b.created_at.cmp(&a.created_at),
            SortOption::UpdatedAsc => a.updated_at.cmp(&b.updated_at),
            SortOption::UpdatedDesc => b.updated_at.cmp(&a.updated_at),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOption::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = SortOption::ALL.iter().map(SortOption::as_str).collect();
                format!("Unknown sort option: {}. Use one of: {}", s, valid.join(", "))
            })
    }
}

/// Case-insensitive first, so "apple" sorts next to "Apple"
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Stored technique label, or one inferred from the section keys
pub fn entry_technique(entry: &SavedPrompt) -> String {
    match entry.technique.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => {
            let keys: Vec<&str> = entry.section_keys().collect();
            infer_technique(keys.iter().copied(), None)
        }
    }
}

/// Case-insensitive match on name, any section content, or technique
pub fn matches(entry: &SavedPrompt, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    entry.name.to_lowercase().contains(&query)
        || entry.sections.iter().any(|s| s.content.to_lowercase().contains(&query))
        || entry_technique(entry).to_lowercase().contains(&query)
}

/// Filter then sort; a blank query keeps every entry
pub fn search<'a>(entries: &'a [SavedPrompt], query: &str, sort: SortOption) -> Vec<&'a SavedPrompt> {
    debug!(%query, %sort, total = entries.len(), "search: called");
    let mut found: Vec<&SavedPrompt> = entries.iter().filter(|e| matches(e, query)).collect();
    // stable, so equal keys keep store order
    found.sort_by(|a, b| sort.compare(a, b));
    found
}

/// Human-readable age of a unix-ms timestamp relative to `now_ms`
pub fn relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms - timestamp_ms;
    let minutes = diff / MINUTE_MS;
    let hours = diff / HOUR_MS;
    let days = diff / DAY_MS;

    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{} minute{} ago", minutes, if minutes > 1 { "s" } else { "" });
    }
    if hours < 24 {
        return format!("{} hour{} ago", hours, if hours > 1 { "s" } else { "" });
    }
    if days == 1 {
        return "Yesterday".to_string();
    }
    if days < 7 {
        return format!("{} days ago", days);
    }
    format_date(timestamp_ms)
}

/// Short calendar date, e.g. "Mar 5, 2026"
pub fn format_date(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptstore::StoredSection;

    fn entry(name: &str, technique: Option<&str>, sections: &[(&str, &str)], created: i64, updated: i64) -> SavedPrompt {
        SavedPrompt {
            id: name.to_lowercase(),
            name: name.to_string(),
            technique: technique.map(str::to_string),
            description: None,
            sections: sections.iter().map(|(k, v)| StoredSection::new(*k, *v)).collect(),
            created_at: created,
            updated_at: updated,
        }
    }

    fn library() -> Vec<SavedPrompt> {
        vec![
            entry("banana", Some("TACO"), &[("task", "Peel it")], 3, 10),
            entry("Apple", None, &[("task", "Bake"), ("steps", "First preheat")], 1, 30),
            entry("cherry", Some("Custom RISEN"), &[("role", "Chef")], 2, 20),
        ]
    }

    fn names(found: &[&SavedPrompt]) -> Vec<String> {
        found.iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn test_search_by_name_content_and_technique() {
        let lib = library();
        assert_eq!(names(&search(&lib, "APPLE", SortOption::NameAsc)), vec!["Apple"]);
        assert_eq!(names(&search(&lib, "peel", SortOption::NameAsc)), vec!["banana"]);
        assert_eq!(names(&search(&lib, "risen", SortOption::NameAsc)), vec!["cherry"]);
        // inferred from keys when nothing stored
        assert_eq!(names(&search(&lib, "chain of", SortOption::NameAsc)), vec!["Apple"]);
        assert_eq!(search(&lib, "   ", SortOption::NameAsc).len(), 3);
        assert!(search(&lib, "durian", SortOption::NameAsc).is_empty());
    }

    #[test]
    fn test_sort_options() {
        let lib = library();
        assert_eq!(names(&search(&lib, "", SortOption::NameAsc)), vec!["Apple", "banana", "cherry"]);
        assert_eq!(names(&search(&lib, "", SortOption::NameDesc)), vec!["cherry", "banana", "Apple"]);
        assert_eq!(names(&search(&lib, "", SortOption::CreatedAsc)), vec!["Apple", "cherry", "banana"]);
        assert_eq!(names(&search(&lib, "", SortOption::CreatedDesc)), vec!["banana", "cherry", "Apple"]);
        assert_eq!(names(&search(&lib, "", SortOption::UpdatedAsc)), vec!["banana", "cherry", "Apple"]);
        assert_eq!(names(&search(&lib, "", SortOption::default())), vec!["Apple", "cherry", "banana"]);
    }

    #[test]
    fn test_sort_option_parsing() {
        for option in SortOption::ALL {
            assert_eq!(option.as_str().parse::<SortOption>(), Ok(option));
        }
        assert!("newest".parse::<SortOption>().unwrap_err().contains("updated-desc"));
    }

    #[test]
    fn test_relative_time() {
        let now = 1_000 * DAY_MS;
        assert_eq!(relative_time(now - 30_000, now), "Just now");
        assert_eq!(relative_time(now - MINUTE_MS, now), "1 minute ago");
        assert_eq!(relative_time(now - 5 * MINUTE_MS, now), "5 minutes ago");
        assert_eq!(relative_time(now - HOUR_MS, now), "1 hour ago");
        assert_eq!(relative_time(now - 23 * HOUR_MS, now), "23 hours ago");
        assert_eq!(relative_time(now - 30 * HOUR_MS, now), "Yesterday");
        assert_eq!(relative_time(now - 3 * DAY_MS, now), "3 days ago");
    }

    #[test]
    fn test_relative_time_falls_back_to_date() {
        // 2024-03-05T12:00:00Z
        let ts = 1_709_640_000_000;
        assert_eq!(relative_time(ts, ts + 10 * DAY_MS), "Mar 5, 2024");
    }
}
