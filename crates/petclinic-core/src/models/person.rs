//! People known to the clinic: owners and vets.

use serde::{Deserialize, Serialize};

use super::id_string;

/// Label shown when a pet's owner is not in the user list.
pub const UNKNOWN_OWNER_LABEL: &str = "Unknown Owner";

/// Role of a user record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Vet,
    /// Anything the server sends that we do not model
    #[serde(other)]
    Other,
}

/// A user record from `GET /users`, also the stored login profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Person {
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }

    pub fn is_vet(&self) -> bool {
        self.role == Role::Vet
    }

    /// Value used in owner pickers: `"<name> (ID: <id>)"`.
    pub fn picker_value(&self) -> String {
        format!("{} (ID: {})", self.name, self.id)
    }
}

/// Owners in the given user list, in list order.
pub fn owners(users: &[Person]) -> Vec<&Person> {
    users.iter().filter(|u| u.is_owner()).collect()
}

/// Vets in the given user list, in list order.
pub fn vets(users: &[Person]) -> Vec<&Person> {
    users.iter().filter(|u| u.is_vet()).collect()
}

/// Owner display name for an ID.
pub fn owner_label<'a>(users: &'a [Person], id: Option<&str>) -> &'a str {
    id.and_then(|id| users.iter().find(|u| u.id == id))
        .map(|u| u.name.as_str())
        .unwrap_or(UNKNOWN_OWNER_LABEL)
}

/// Fields for `POST /owner/add`. The ID is supplied by staff (national ID number).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewOwner {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: String,
}

/// Partial update for `POST /owner/edit`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OwnerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Body of `POST /register`. Public registration always creates vets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl RegisterRequest {
    pub fn vet(name: String, email: String, password: String) -> Self {
        Self {
            name,
            email,
            password,
            role: Role::Vet,
        }
    }
}

/// Body of `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response of `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub status: String,
    #[serde(default)]
    pub user: Option<Person>,
    #[serde(default)]
    pub message: Option<String>,
}
