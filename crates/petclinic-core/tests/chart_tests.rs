//! Weight chart projection scenarios and properties.

use petclinic_core::models::{Pet, WeightEntry};
use petclinic_core::{extract_bracketed_id, FilteredView, QueryMode, WeightChart};
use proptest::prelude::*;

fn entry(id: usize, pet_id: &str, date: &str, weight: f64) -> WeightEntry {
    WeightEntry {
        id: id.to_string(),
        pet_id: pet_id.to_string(),
        date: date.to_string(),
        weight: Some(weight),
    }
}

#[test]
fn test_target_subset_scenario() {
    let cache: Vec<WeightEntry> = serde_json::from_value(serde_json::json!([
        {"id": 1, "petId": "A", "date": "2024-01-01", "weight": 5},
        {"id": 2, "petId": "A", "date": "2024-02-01", "weight": 6},
        {"id": 3, "petId": "B", "date": "2024-01-15", "weight": 10},
    ]))
    .unwrap();

    let targets = vec!["A".to_string()];
    let chart = WeightChart::project(&cache, &[], Some(&targets));

    assert_eq!(chart.axis, vec!["2024-01-01", "2024-02-01"]);
    assert_eq!(chart.series.len(), 1);
    assert_eq!(chart.series[0].pet_id, "A");
    assert_eq!(chart.series[0].values, vec![Some(5.0), Some(6.0)]);
}

#[test]
fn test_unsorted_input_is_sorted_per_series() {
    let pets: Vec<Pet> = serde_json::from_value(serde_json::json!([
        {"id": "A", "name": "Rex", "type": "Dog", "age": 3}
    ]))
    .unwrap();
    let cache = vec![
        entry(1, "A", "2024-03-01", 7.0),
        entry(2, "B", "2024-02-01", 3.0),
        entry(3, "A", "2024-01-01", 5.0),
    ];
    let chart = WeightChart::project(&cache, &pets, None);

    assert_eq!(chart.axis, vec!["2024-01-01", "2024-02-01", "2024-03-01"]);
    let a = chart.series_for("A").unwrap();
    assert_eq!(a.label, "Rex");
    assert_eq!(a.values, vec![Some(5.0), None, Some(7.0)]);
    let b = chart.series_for("B").unwrap();
    assert_eq!(b.label, "Unknown");
    assert_eq!(b.values, vec![None, Some(3.0), None]);
    // first-appearance order
    assert_eq!(chart.series[0].pet_id, "A");
}

#[test]
fn test_series_colour_is_stable_per_pet() {
    let cache = vec![entry(1, "A", "2024-01-01", 5.0)];
    let first = WeightChart::project(&cache, &[], None);
    let second = WeightChart::project(&cache, &[], None);
    assert_eq!(first.series[0].color, second.series[0].color);
}

fn arb_entries() -> impl Strategy<Value = Vec<WeightEntry>> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["A", "B", "C", "D"]),
            1u32..=28,
            1u32..=6,
            0.5f64..80.0,
        ),
        0..40,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (pet, day, month, w))| {
                entry(i, pet, &format!("2024-{month:02}-{day:02}"), w)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_axis_is_sorted_distinct_union(entries in arb_entries()) {
        let chart = WeightChart::project(&entries, &[], None);

        let mut expected: Vec<String> = entries.iter().map(|e| e.date.clone()).collect();
        expected.sort();
        expected.dedup();
        prop_assert_eq!(&chart.axis, &expected);

        for series in &chart.series {
            prop_assert_eq!(series.values.len(), chart.axis.len());
        }
    }

    #[test]
    fn prop_gaps_are_explicit_and_values_real(entries in arb_entries()) {
        let chart = WeightChart::project(&entries, &[], None);
        for series in &chart.series {
            for (date, value) in chart.axis.iter().zip(&series.values) {
                let has_entry = entries
                    .iter()
                    .any(|e| e.pet_id == series.pet_id && &e.date == date);
                prop_assert_eq!(value.is_some(), has_entry);
                if let Some(v) = value {
                    prop_assert!(*v > 0.0);
                }
            }
        }
    }

    #[test]
    fn prop_targets_restrict_series(
        entries in arb_entries(),
        targets in prop::collection::vec(prop::sample::select(vec!["A", "B", "Z"]), 0..3),
    ) {
        let targets: Vec<String> = targets.into_iter().map(String::from).collect();
        let chart = WeightChart::project(&entries, &[], Some(&targets));
        for series in &chart.series {
            prop_assert!(targets.contains(&series.pet_id));
        }
    }

    #[test]
    fn prop_bracketed_id_resolves_for_any_label(label in "[^()]{0,20}", id in "[A-Za-z0-9-]{1,12}") {
        let query = format!("{label} (ID: {id})");
        prop_assert_eq!(extract_bracketed_id(&query), Some(id.clone()));

        let empty = Vec::<WeightEntry>::new();
        let view = FilteredView::build(&empty, &[], &query);
        prop_assert_eq!(view.mode, QueryMode::Exact(id));
    }

    #[test]
    fn prop_blank_query_returns_everything(entries in arb_entries(), pad in " {0,4}") {
        let view = FilteredView::build(&entries, &[], &pad);
        prop_assert_eq!(view.mode, QueryMode::All);
        prop_assert_eq!(view.records.len(), entries.len());
    }
}
