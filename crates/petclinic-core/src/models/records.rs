//! Clinical record models. Every record points at exactly one pet.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{id_string, lenient_number};

/// Record categories that are cached per pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Medical,
    Vaccine,
    Weight,
    Appointment,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Medical,
        Category::Vaccine,
        Category::Weight,
        Category::Appointment,
    ];

    /// Path segment used by the record service (`/medical/<petId>`, `/medical/add`, ...).
    pub fn path(&self) -> &'static str {
        match self {
            Category::Medical => "medical",
            Category::Vaccine => "vaccine",
            Category::Weight => "weight",
            Category::Appointment => "appointment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A record that belongs to a pet and lives in a per-category cache.
pub trait PetRecord:
    fmt::Debug + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Category this record type is stored under.
    const CATEGORY: Category;

    /// Body of `POST /<category>/add`.
    type New: Serialize + Send + Sync;

    /// Partial body of `POST /<category>/edit` (the `id` is added by the client).
    type Patch: Serialize + Send + Sync;

    fn id(&self) -> &str;

    fn pet_id(&self) -> &str;

    /// Calendar date used for ordering (`YYYY-MM-DD`).
    fn date(&self) -> &str;
}

/// A medical history entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub pet_id: String,
    pub date: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub attachment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewMedicalRecord {
    pub pet_id: String,
    pub date: String,
    pub diagnosis: String,
    pub treatment: String,
    pub notes: String,
    pub attachment: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl PetRecord for MedicalRecord {
    const CATEGORY: Category = Category::Medical;
    type New = NewMedicalRecord;
    type Patch = MedicalPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn pet_id(&self) -> &str {
        &self.pet_id
    }

    fn date(&self) -> &str {
        &self.date
    }
}

/// A vaccination with its next due date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VaccineRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub pet_id: String,
    pub vaccine_name: String,
    #[serde(default)]
    pub date_given: String,
    #[serde(default)]
    pub next_due: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewVaccineRecord {
    pub pet_id: String,
    pub vaccine_name: String,
    pub date_given: String,
    pub next_due: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VaccinePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vaccine_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_given: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due: Option<String>,
}

impl PetRecord for VaccineRecord {
    const CATEGORY: Category = Category::Vaccine;
    type New = NewVaccineRecord;
    type Patch = VaccinePatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn pet_id(&self) -> &str {
        &self.pet_id
    }

    fn date(&self) -> &str {
        &self.date_given
    }
}

/// A single weight measurement in kilograms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightEntry {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub pet_id: String,
    pub date: String,
    /// Kilograms, `None` when the stored value is not a number
    #[serde(default, deserialize_with = "lenient_number")]
    pub weight: Option<f64>,
}

impl WeightEntry {
    /// Weight for display, `N/A` when unknown.
    pub fn weight_label(&self) -> String {
        self.weight
            .map_or_else(|| "N/A".to_string(), |w| format!("{w}kg"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewWeightEntry {
    pub pet_id: String,
    pub weight: f64,
    pub date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl PetRecord for WeightEntry {
    const CATEGORY: Category = Category::Weight;
    type New = NewWeightEntry;
    type Patch = WeightPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn pet_id(&self) -> &str {
        &self.pet_id
    }

    fn date(&self) -> &str {
        &self.date
    }
}

/// A booked appointment with a vet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub pet_id: String,
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default, deserialize_with = "super::opt_id_string")]
    pub vet_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub pet_id: String,
    pub date: String,
    pub time: String,
    pub reason: String,
    pub vet_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PetRecord for AppointmentRecord {
    const CATEGORY: Category = Category::Appointment;
    type New = NewAppointment;
    type Patch = AppointmentPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn pet_id(&self) -> &str {
        &self.pet_id
    }

    fn date(&self) -> &str {
        &self.date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_wire_shape() {
        let json = r#"{"id":"w1","petId":3,"weight":5.5,"date":"2024-01-01"}"#;
        let entry: WeightEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.pet_id, "3");
        assert_eq!(entry.weight, Some(5.5));
        assert_eq!(entry.weight_label(), "5.5kg");
        assert_eq!(entry.date(), "2024-01-01");
        assert_eq!(WeightEntry::CATEGORY.path(), "weight");
    }

    #[test]
    fn test_vaccine_date_is_date_given() {
        let json = r#"{"id":"v1","petId":"p1","vaccineName":"Rabies","dateGiven":"2024-03-01","nextDue":"2025-03-01"}"#;
        let v: VaccineRecord = serde_json::from_str(json).unwrap();
        assert_eq!(v.date(), "2024-03-01");
    }

    #[test]
    fn test_medical_optional_fields_default() {
        let json = r#"{"id":"m1","petId":"p1","date":"2024-01-01","diagnosis":"Otitis"}"#;
        let m: MedicalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(m.treatment, "");
        assert_eq!(m.attachment, "");
    }

    #[test]
    fn test_new_records_use_camel_case() {
        let new = NewAppointment {
            pet_id: "p1".into(),
            date: "2024-05-01".into(),
            time: "10:30".into(),
            reason: "Checkup".into(),
            vet_id: "v1".into(),
        };
        let json = serde_json::to_value(&new).unwrap();
        assert_eq!(json["petId"], "p1");
        assert_eq!(json["vetId"], "v1");
    }

    #[test]
    fn test_category_paths() {
        let paths: Vec<_> = Category::ALL.iter().map(|c| c.path()).collect();
        assert_eq!(paths, vec!["medical", "vaccine", "weight", "appointment"]);
    }
}
