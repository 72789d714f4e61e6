//! Clinic summary shown on the landing page.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::fanout::fan_out;
use crate::models::{AppointmentRecord, Pet, VaccineRecord};
use crate::store::ClinicStore;
use crate::ClinicResult;

/// Vaccines due within this many days count as "due soon".
pub const VACCINE_DUE_WINDOW_DAYS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub pet_count: usize,
    /// Pet count per species, in first-appearance order
    pub species: Vec<(String, usize)>,
    pub upcoming_appointments: usize,
    pub vaccines_due_soon: usize,
}

impl DashboardSummary {
    /// Summarize already-fetched data as of `today`. Unparseable dates are
    /// not counted.
    pub fn compute(
        pets: &[Pet],
        appointments: &[AppointmentRecord],
        vaccines: &[VaccineRecord],
        today: NaiveDate,
    ) -> Self {
        let mut species: Vec<(String, usize)> = Vec::new();
        for pet in pets {
            match species.iter_mut().find(|(s, _)| *s == pet.species) {
                Some((_, n)) => *n += 1,
                None => species.push((pet.species.clone(), 1)),
            }
        }

        let horizon = today
            .checked_add_days(Days::new(VACCINE_DUE_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MAX);

        let upcoming_appointments = appointments
            .iter()
            .filter_map(|a| parse_date(&a.date))
            .filter(|d| *d >= today)
            .count();

        let vaccines_due_soon = vaccines
            .iter()
            .filter_map(|v| parse_date(&v.next_due))
            .filter(|d| *d >= today && *d <= horizon)
            .count();

        Self {
            pet_count: pets.len(),
            species,
            upcoming_appointments,
            vaccines_due_soon,
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Fetch fresh pets plus every pet's appointments and vaccines, and
/// summarize them.
pub async fn load_dashboard(
    store: &ClinicStore,
    today: NaiveDate,
    cancel: &CancellationToken,
) -> ClinicResult<DashboardSummary> {
    let pets = store.reload_pets().await?;
    let pet_ids: Vec<String> = pets.iter().map(|p| p.id.clone()).collect();

    let api = store.api().clone();
    let per_pet = fan_out(pet_ids, store.policy(), cancel, move |pet_id: String| {
        let api = api.clone();
        async move {
            tokio::try_join!(
                api.records_for_pet::<AppointmentRecord>(&pet_id),
                api.records_for_pet::<VaccineRecord>(&pet_id),
            )
        }
    })
    .await?;

    let (appointments, vaccines): (Vec<_>, Vec<_>) = per_pet.into_iter().unzip();
    let appointments: Vec<AppointmentRecord> = appointments.into_iter().flatten().collect();
    let vaccines: Vec<VaccineRecord> = vaccines.into_iter().flatten().collect();
    debug!(
        pets = pets.len(),
        appointments = appointments.len(),
        vaccines = vaccines.len(),
        "dashboard data fetched"
    );

    Ok(DashboardSummary::compute(&pets, &appointments, &vaccines, today))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn pet(id: &str, species: &str) -> Pet {
        Pet {
            id: id.into(),
            name: id.into(),
            species: species.into(),
            age: Some(1.0),
            owner_id: None,
            photo: None,
        }
    }

    fn appointment(d: &str) -> AppointmentRecord {
        AppointmentRecord {
            id: d.into(),
            pet_id: "a".into(),
            date: d.into(),
            time: "10:00".into(),
            reason: "Checkup".into(),
            vet_id: None,
        }
    }

    fn vaccine(due: &str) -> VaccineRecord {
        VaccineRecord {
            id: due.into(),
            pet_id: "a".into(),
            vaccine_name: "Rabies".into(),
            date_given: "2023-01-01".into(),
            next_due: due.into(),
        }
    }

    #[test]
    fn test_species_in_first_appearance_order() {
        let pets = vec![pet("a", "Dog"), pet("b", "Cat"), pet("c", "Dog")];
        let s = DashboardSummary::compute(&pets, &[], &[], date("2024-06-01"));
        assert_eq!(s.pet_count, 3);
        assert_eq!(s.species, vec![("Dog".to_string(), 2), ("Cat".to_string(), 1)]);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let today = date("2024-06-01");
        let appointments = vec![appointment("2024-05-31"), appointment("2024-06-01"), appointment("garbage")];
        let vaccines = vec![
            vaccine("2024-05-31"),
            vaccine("2024-06-01"),
            vaccine("2024-07-01"),
            vaccine("2024-07-02"),
        ];
        let s = DashboardSummary::compute(&[], &appointments, &vaccines, today);
        assert_eq!(s.upcoming_appointments, 1);
        assert_eq!(s.vaccines_due_soon, 2);
    }
}
