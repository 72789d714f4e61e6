//! Structured rows for the record lists, pet cards and pickers.

use serde::Serialize;

use crate::models::{
    owner_label, pet_label, AppointmentRecord, MedicalRecord, Person, Pet, VaccineRecord,
    WeightEntry,
};

/// One rendered list entry. `id` is what edit and delete actions act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRow {
    pub id: String,
    pub title: String,
    pub lines: Vec<String>,
}

/// Records that render as a row in their category list.
pub trait ToRow {
    fn to_row(&self, pets: &[Pet]) -> RecordRow;
}

impl ToRow for MedicalRecord {
    fn to_row(&self, pets: &[Pet]) -> RecordRow {
        RecordRow {
            id: self.id.clone(),
            title: format!("{} ({})", pet_label(pets, &self.pet_id), self.date),
            lines: vec![
                format!("Diag: {}", self.diagnosis),
                format!("Treat: {}", self.treatment),
            ],
        }
    }
}

impl ToRow for VaccineRecord {
    fn to_row(&self, pets: &[Pet]) -> RecordRow {
        RecordRow {
            id: self.id.clone(),
            title: format!("{} - {}", pet_label(pets, &self.pet_id), self.vaccine_name),
            lines: vec![format!("Given: {} | Due: {}", self.date_given, self.next_due)],
        }
    }
}

impl ToRow for WeightEntry {
    fn to_row(&self, pets: &[Pet]) -> RecordRow {
        RecordRow {
            id: self.id.clone(),
            title: pet_label(pets, &self.pet_id).to_string(),
            lines: vec![format!("{} on {}", self.weight_label(), self.date)],
        }
    }
}

impl ToRow for AppointmentRecord {
    fn to_row(&self, pets: &[Pet]) -> RecordRow {
        RecordRow {
            id: self.id.clone(),
            title: pet_label(pets, &self.pet_id).to_string(),
            lines: vec![format!("{} at {}", self.date, self.time), self.reason.clone()],
        }
    }
}

pub fn rows<R: ToRow>(records: &[&R], pets: &[Pet]) -> Vec<RecordRow> {
    records.iter().map(|r| r.to_row(pets)).collect()
}

/// Card shown in the pet list.
pub fn pet_card(pet: &Pet, users: &[Person]) -> RecordRow {
    RecordRow {
        id: pet.id.clone(),
        title: pet.name.clone(),
        lines: vec![
            format!("{} - Age: {}", pet.species, pet.age_label()),
            format!("Owner: {}", owner_label(users, pet.owner_id.as_deref())),
            format!("Photo: {}", pet.photo_or_default()),
        ],
    }
}

/// Card shown in the owner list.
pub fn owner_card(owner: &Person) -> RecordRow {
    let or_na = |v: &Option<String>| {
        v.as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("N/A")
            .to_string()
    };
    RecordRow {
        id: owner.id.clone(),
        title: owner.name.clone(),
        lines: vec![
            format!("ID: {}", owner.id),
            format!("Phone: {}", or_na(&owner.phone)),
            format!("Address: {}", or_na(&owner.address)),
        ],
    }
}

/// An entry in a picker list: the value to type plus a hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickerOption {
    pub value: String,
    pub hint: String,
}

/// Pet picker entries, `"<name> (ID: <id>)"` with a species/owner hint.
pub fn pet_options(pets: &[Pet], users: &[Person]) -> Vec<PickerOption> {
    pets.iter()
        .map(|p| PickerOption {
            value: p.picker_value(),
            hint: format!(
                "{} - Owner: {}",
                p.species,
                owner_label(users, p.owner_id.as_deref())
            ),
        })
        .collect()
}

/// Owner picker entries with the phone number as hint.
pub fn owner_options(users: &[Person]) -> Vec<PickerOption> {
    crate::models::owners(users)
        .into_iter()
        .map(|o| PickerOption {
            value: o.picker_value(),
            hint: o.phone.clone().unwrap_or_default(),
        })
        .collect()
}
