//! Query resolution and record filtering.
//!
//! A free-text query either pins a single pet ("exact" mode) or matches pets
//! by name substring ("broad" mode). Exact mode wins when the query carries a
//! bracketed `(ID: ...)` suffix or equals a pet's name ignoring case.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::models::{find_pet, Pet, PetRecord};

fn bracketed_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\(\s*ID:\s*(.*?)\s*\)$").expect("valid id regex"))
}

fn picker_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\(ID: (.*)\)$").expect("valid picker regex"))
}

/// Pull the id out of a trailing `(ID: <id>)` suffix, case-insensitively.
/// An empty id counts as no suffix.
///
/// ```
/// use petclinic_core::extract_bracketed_id;
/// assert_eq!(extract_bracketed_id("Rex (id: 42 )"), Some("42".to_string()));
/// assert_eq!(extract_bracketed_id("Rex"), None);
/// assert_eq!(extract_bracketed_id("Rex (ID: )"), None);
/// ```
pub fn extract_bracketed_id(query: &str) -> Option<String> {
    bracketed_id_pattern()
        .captures(query)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Resolve a picker input (`"Rex (ID: 42)"` or a bare id) to an id.
/// Returns `None` for blank input.
pub fn selection_id(input: &str) -> Option<String> {
    let id = match picker_id_pattern().captures(input).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().trim().to_string(),
        None => input.trim().to_string(),
    };
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// How a query selects records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
pub enum QueryMode {
    /// Records of exactly this pet id.
    Exact(String),
    /// Records whose pet name contains this lower-cased needle.
    Broad(String),
    /// Empty query: every record.
    All,
}

impl QueryMode {
    /// Whether a record of pet `pet_id` is selected.
    pub fn matches(&self, pet_id: &str, pets: &[Pet]) -> bool {
        match self {
            QueryMode::Exact(target) => pet_id == target,
            QueryMode::All => true,
            QueryMode::Broad(needle) => find_pet(pets, pet_id)
                .map(|p| p.name.to_lowercase())
                .unwrap_or_default()
                .contains(needle.as_str()),
        }
    }
}

/// Resolve a raw query against the known pets.
pub fn resolve_query(query: &str, pets: &[Pet]) -> QueryMode {
    if let Some(id) = extract_bracketed_id(query) {
        return QueryMode::Exact(id);
    }

    let trimmed = query.trim().to_lowercase();
    if let Some(pet) = pets.iter().find(|p| p.name.to_lowercase() == trimmed) {
        return QueryMode::Exact(pet.id.clone());
    }

    if trimmed.is_empty() {
        QueryMode::All
    } else {
        QueryMode::Broad(query.to_lowercase())
    }
}

/// Records selected by `mode`, in cache order.
pub fn filter_records<'a, R: PetRecord>(
    records: &'a [R],
    pets: &[Pet],
    mode: &QueryMode,
) -> Vec<&'a R> {
    records
        .iter()
        .filter(|r| mode.matches(r.pet_id(), pets))
        .collect()
}

/// Newest first. Ties keep their relative order.
pub fn sort_newest_first<R: PetRecord>(rows: &mut [&R]) {
    rows.sort_by(|a, b| b.date().cmp(a.date()));
}

/// Pet ids whose series a chart should show for a query, or `None` for
/// every pet in the cache.
pub fn chart_targets<R: PetRecord>(mode: &QueryMode, matched: &[&R]) -> Option<Vec<String>> {
    match mode {
        QueryMode::Exact(id) => Some(vec![id.clone()]),
        QueryMode::All => None,
        QueryMode::Broad(_) => {
            let mut ids: Vec<String> = Vec::new();
            for record in matched {
                if !ids.iter().any(|id| id == record.pet_id()) {
                    ids.push(record.pet_id().to_string());
                }
            }
            Some(ids)
        }
    }
}

/// Result of filtering one category by a query.
#[derive(Debug, Clone)]
pub struct FilteredView<'a, R> {
    pub mode: QueryMode,
    pub records: Vec<&'a R>,
}

impl<'a, R: PetRecord> FilteredView<'a, R> {
    /// Resolve `query` and select the matching records.
    pub fn build(records: &'a [R], pets: &[Pet], query: &str) -> Self {
        let mode = resolve_query(query, pets);
        let records = filter_records(records, pets, &mode);
        Self { mode, records }
    }

    pub fn chart_targets(&self) -> Option<Vec<String>> {
        chart_targets(&self.mode, &self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeightEntry;

    fn pet(id: &str, name: &str) -> Pet {
        Pet {
            id: id.into(),
            name: name.into(),
            species: "Dog".into(),
            age: Some(1.0),
            owner_id: None,
            photo: None,
        }
    }

    fn weight(id: &str, pet_id: &str, date: &str) -> WeightEntry {
        WeightEntry {
            id: id.into(),
            pet_id: pet_id.into(),
            date: date.into(),
            weight: Some(1.0),
        }
    }

    #[test]
    fn test_bracketed_id_variants() {
        assert_eq!(extract_bracketed_id("Rex (ID: 7)"), Some("7".into()));
        assert_eq!(extract_bracketed_id("Rex (id:7)"), Some("7".into()));
        assert_eq!(extract_bracketed_id("(ID:   abc-1  )"), Some("abc-1".into()));
        assert_eq!(extract_bracketed_id("Rex (ID: 7) extra"), None);
        assert_eq!(extract_bracketed_id("Rex ID: 7"), None);
        assert_eq!(extract_bracketed_id("Rex (ID:   )"), None);
    }

    #[test]
    fn test_empty_bracketed_id_falls_through() {
        let pets = vec![pet("a", "Rex")];
        assert_eq!(
            resolve_query("Rex (ID: )", &pets),
            QueryMode::Broad("rex (id: )".into())
        );
    }

    #[test]
    fn test_selection_id() {
        assert_eq!(selection_id("Rex (ID: 42)"), Some("42".into()));
        assert_eq!(selection_id(" 42 "), Some("42".into()));
        assert_eq!(selection_id("   "), None);
    }

    #[test]
    fn test_exact_name_match_wins_over_substring() {
        let pets = vec![pet("a", "Max"), pet("b", "Maxine")];
        assert_eq!(resolve_query("  MAX ", &pets), QueryMode::Exact("a".into()));
        assert_eq!(resolve_query("ma", &pets), QueryMode::Broad("ma".into()));
        assert_eq!(resolve_query("   ", &pets), QueryMode::All);
    }

    #[test]
    fn test_duplicate_names_pick_first_pet() {
        let pets = vec![pet("a", "Rex"), pet("b", "rex")];
        assert_eq!(resolve_query("rex", &pets), QueryMode::Exact("a".into()));
    }

    #[test]
    fn test_broad_match_skips_unknown_pets() {
        let pets = vec![pet("a", "Rex")];
        let records = vec![weight("w1", "a", "2024-01-01"), weight("w2", "zz", "2024-01-02")];
        let view = FilteredView::build(&records, &pets, "re");
        assert_eq!(view.records.len(), 1);
        assert_eq!(view.records[0].id, "w1");
    }

    #[test]
    fn test_unknown_bracketed_id_is_empty_not_error() {
        let pets = vec![pet("a", "Rex")];
        let records = vec![weight("w1", "a", "2024-01-01")];
        let view = FilteredView::build(&records, &pets, "Ghost (ID: 999)");
        assert!(view.records.is_empty());
        assert_eq!(view.chart_targets(), Some(vec!["999".to_string()]));
    }

    #[test]
    fn test_sort_newest_first_is_stable() {
        let records = vec![
            weight("w1", "a", "2024-01-01"),
            weight("w2", "a", "2024-03-01"),
            weight("w3", "b", "2024-01-01"),
        ];
        let mut rows: Vec<&WeightEntry> = records.iter().collect();
        sort_newest_first(&mut rows);
        let ids: Vec<&str> = rows.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["w2", "w1", "w3"]);
    }

    #[test]
    fn test_chart_targets_per_mode() {
        let pets = vec![pet("a", "Rex"), pet("b", "Rexy"), pet("c", "Tom")];
        let records = vec![
            weight("w1", "b", "2024-01-01"),
            weight("w2", "a", "2024-01-01"),
            weight("w3", "b", "2024-01-02"),
        ];
        let broad = FilteredView::build(&records, &pets, "re");
        assert_eq!(broad.chart_targets(), Some(vec!["b".to_string(), "a".to_string()]));

        let all = FilteredView::build(&records, &pets, "");
        assert_eq!(all.chart_targets(), None);
        assert_eq!(all.records.len(), 3);
    }
}
