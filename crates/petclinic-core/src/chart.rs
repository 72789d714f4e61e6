//! Weight chart projection.
//!
//! Weight entries are grouped per pet and aligned onto one shared, sorted
//! date axis. A pet without a measurement on some axis date gets an explicit
//! gap there, never a zero or an interpolated value.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::models::{pet_label, Pet, WeightEntry};

/// One pet's line on the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub pet_id: String,
    pub label: String,
    /// `#RRGGBB`
    pub color: String,
    /// One value per axis date; `None` is a gap.
    pub values: Vec<Option<f64>>,
}

/// Chart-ready projection of weight history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeightChart {
    pub axis: Vec<String>,
    pub series: Vec<Series>,
}

impl WeightChart {
    /// Project `entries` onto a chart. When `targets` is given, only those
    /// pets are drawn.
    pub fn project(entries: &[WeightEntry], pets: &[Pet], targets: Option<&[String]>) -> Self {
        let kept: Vec<&WeightEntry> = entries
            .iter()
            .filter(|e| targets.map_or(true, |t| t.iter().any(|id| *id == e.pet_id)))
            .collect();

        // Groups in first-appearance order.
        let mut groups: Vec<(&str, Vec<&WeightEntry>)> = Vec::new();
        for entry in kept.iter().copied() {
            match groups.iter_mut().find(|(id, _)| *id == entry.pet_id) {
                Some((_, group)) => group.push(entry),
                None => groups.push((entry.pet_id.as_str(), vec![entry])),
            }
        }

        let mut axis: Vec<String> = kept.iter().map(|e| e.date.clone()).collect();
        axis.sort();
        axis.dedup();

        let series = groups
            .into_iter()
            .map(|(pet_id, mut group)| {
                group.sort_by(|a, b| a.date.cmp(&b.date));
                let values = axis
                    .iter()
                    .map(|date| group.iter().find(|e| e.date == *date).and_then(|e| e.weight))
                    .collect();
                Series {
                    pet_id: pet_id.to_string(),
                    label: pet_label(pets, pet_id).to_string(),
                    color: series_color(pet_id),
                    values,
                }
            })
            .collect();

        Self { axis, series }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn series_for(&self, pet_id: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.pet_id == pet_id)
    }
}

/// Display colour derived from a pet id. Stable across runs.
pub fn series_color(pet_id: &str) -> String {
    let digest = Sha256::digest(pet_id.as_bytes());
    format!("#{}", hex::encode(&digest[..3]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pet_id: &str, date: &str, weight: f64) -> WeightEntry {
        WeightEntry {
            id: format!("{pet_id}-{date}"),
            pet_id: pet_id.into(),
            date: date.into(),
            weight: Some(weight),
        }
    }

    fn pet(id: &str, name: &str) -> Pet {
        Pet {
            id: id.into(),
            name: name.into(),
            species: "Dog".into(),
            age: Some(2.0),
            owner_id: None,
            photo: None,
        }
    }

    #[test]
    fn test_gaps_are_explicit() {
        let entries = vec![
            entry("A", "2024-01-01", 10.0),
            entry("A", "2024-03-01", 12.0),
            entry("B", "2024-02-01", 5.0),
        ];
        let pets = vec![pet("A", "Rex"), pet("B", "Tom")];
        let chart = WeightChart::project(&entries, &pets, None);

        assert_eq!(chart.axis, vec!["2024-01-01", "2024-02-01", "2024-03-01"]);
        assert_eq!(chart.series[0].label, "Rex");
        assert_eq!(chart.series[0].values, vec![Some(10.0), None, Some(12.0)]);
        assert_eq!(chart.series[1].values, vec![None, Some(5.0), None]);
    }

    #[test]
    fn test_targets_restrict_series_and_axis() {
        let entries = vec![entry("A", "2024-01-01", 10.0), entry("B", "2024-02-01", 5.0)];
        let targets = vec!["B".to_string()];
        let chart = WeightChart::project(&entries, &[], Some(&targets));
        assert_eq!(chart.axis, vec!["2024-02-01"]);
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].label, "Unknown");
    }

    #[test]
    fn test_empty_input() {
        let chart = WeightChart::project(&[], &[], None);
        assert!(chart.axis.is_empty());
        assert!(chart.is_empty());
    }

    #[test]
    fn test_color_format_and_stability() {
        let c = series_color("pet-1");
        assert_eq!(c.len(), 7);
        assert!(c.starts_with('#'));
        assert!(c[1..].chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_eq!(c, series_color("pet-1"));
    }
}
