//! Pet models. A pet is the subject every clinical record points at.

use serde::{Deserialize, Serialize};

use super::{id_string, lenient_number, opt_id_string};

/// Photo used when a pet is created without one.
pub const DEFAULT_PHOTO_URL: &str = "https://via.placeholder.com/150";

/// Label shown for a record whose pet is not in the cache.
pub const UNKNOWN_PET_LABEL: &str = "Unknown";

/// A pet as returned by `GET /pets`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    /// Server-assigned identifier
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    /// Display name (not unique)
    pub name: String,
    /// Species, e.g. "dog", "cat"
    #[serde(rename = "type", default)]
    pub species: String,
    /// Age in years, `None` when the stored value is not a number
    #[serde(default, deserialize_with = "lenient_number")]
    pub age: Option<f64>,
    /// Owning person's ID
    #[serde(default, deserialize_with = "opt_id_string")]
    pub owner_id: Option<String>,
    /// Photo URL
    #[serde(default)]
    pub photo: Option<String>,
}

impl Pet {
    /// Value used in pet pickers: `"<name> (ID: <id>)"`.
    pub fn picker_value(&self) -> String {
        format!("{} (ID: {})", self.name, self.id)
    }

    /// Age for display, `N/A` when unknown.
    pub fn age_label(&self) -> String {
        self.age.map_or_else(|| "N/A".to_string(), |age| age.to_string())
    }

    /// Photo URL, falling back to the placeholder image.
    pub fn photo_or_default(&self) -> &str {
        self.photo
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PHOTO_URL)
    }
}

/// Fields for `POST /add_pet`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPet {
    pub name: String,
    pub age: u32,
    #[serde(rename = "type")]
    pub species: String,
    pub owner_id: String,
    pub photo: String,
}

impl NewPet {
    /// Create a pet submission, substituting the placeholder photo when none is given.
    pub fn new(name: String, age: u32, species: String, owner_id: String, photo: Option<String>) -> Self {
        Self {
            name,
            age,
            species,
            owner_id,
            photo: photo
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PHOTO_URL.to_string()),
        }
    }
}

/// Partial update for `POST /edit_pet`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

/// Look up a pet by ID in a cached list.
pub fn find_pet<'a>(pets: &'a [Pet], id: &str) -> Option<&'a Pet> {
    pets.iter().find(|p| p.id == id)
}

/// Display name for a pet ID, or the placeholder if the pet is not known.
pub fn pet_label<'a>(pets: &'a [Pet], id: &str) -> &'a str {
    find_pet(pets, id)
        .map(|p| p.name.as_str())
        .unwrap_or(UNKNOWN_PET_LABEL)
}
