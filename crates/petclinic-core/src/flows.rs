//! Add / edit / delete flows.
//!
//! Every successful mutation reloads the affected cache and returns the
//! refreshed listing, so callers always render post-mutation state. Deletes
//! ask for confirmation first; a declined delete sends nothing and leaves
//! every cache untouched.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::chart::WeightChart;
use crate::filter::{selection_id, sort_newest_first, FilteredView, QueryMode};
use crate::models::{
    find_pet, owners, AppointmentRecord, MedicalRecord, NewOwner, NewPet, OwnerPatch, Pet,
    PetPatch, VaccineRecord, WeightEntry,
};
use crate::store::{CachedRecord, ClinicStore};
use crate::view::{owner_card, pet_card, rows, RecordRow, ToRow};
use crate::{ClinicError, ClinicResult};

pub const SELECT_PET: &str = "Select a pet";
pub const SELECT_OWNER: &str = "Please select an owner";
pub const OWNER_ID_AND_NAME_REQUIRED: &str = "Owner ID and name are required";

/// Yes/no prompt shown before destructive actions.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome<T> {
    Done(T),
    /// The user declined the confirmation prompt.
    Declined,
}

impl<T> FlowOutcome<T> {
    pub fn done(self) -> Option<T> {
        match self {
            FlowOutcome::Done(v) => Some(v),
            FlowOutcome::Declined => None,
        }
    }
}

/// Resolve a picker input to an id, or fail with `message`.
pub fn require_selection(input: &str, message: &str) -> ClinicResult<String> {
    selection_id(input).ok_or_else(|| ClinicError::MissingInput(message.to_string()))
}

/// A per-pet record category that can be listed and searched.
pub trait ListedRecord: CachedRecord + ToRow {
    /// List rows newest first instead of cache order.
    const NEWEST_FIRST: bool = false;

    /// Pet a new record would be attached to.
    fn new_pet_id(fields: &Self::New) -> &str;

    /// Chart accompanying the listing, if the category has one.
    fn chart(_all: &[Self], _pets: &[Pet], _targets: Option<&[String]>) -> Option<WeightChart> {
        None
    }
}

impl ListedRecord for MedicalRecord {
    fn new_pet_id(fields: &Self::New) -> &str {
        &fields.pet_id
    }
}

impl ListedRecord for VaccineRecord {
    fn new_pet_id(fields: &Self::New) -> &str {
        &fields.pet_id
    }
}

impl ListedRecord for AppointmentRecord {
    fn new_pet_id(fields: &Self::New) -> &str {
        &fields.pet_id
    }
}

impl ListedRecord for WeightEntry {
    const NEWEST_FIRST: bool = true;

    fn new_pet_id(fields: &Self::New) -> &str {
        &fields.pet_id
    }

    fn chart(all: &[Self], pets: &[Pet], targets: Option<&[String]>) -> Option<WeightChart> {
        Some(WeightChart::project(all, pets, targets))
    }
}

/// A category list as shown for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryListing {
    pub mode: QueryMode,
    pub rows: Vec<RecordRow>,
    pub chart: Option<WeightChart>,
}

/// Search one category. Fills the pet and category caches on a miss.
pub async fn list_records<R: ListedRecord>(
    store: &ClinicStore,
    query: &str,
    cancel: &CancellationToken,
) -> ClinicResult<CategoryListing> {
    let pets = store.pets().await?;
    let records = store.records::<R>(cancel).await?;
    Ok(build_listing(&records, &pets, query))
}

fn build_listing<R: ListedRecord>(records: &[R], pets: &[Pet], query: &str) -> CategoryListing {
    let view = FilteredView::build(records, pets, query);
    let targets = view.chart_targets();
    let mut matched = view.records;
    if R::NEWEST_FIRST {
        sort_newest_first(&mut matched);
    }
    CategoryListing {
        rows: rows(&matched, pets),
        chart: R::chart(records, pets, targets.as_deref()),
        mode: view.mode,
    }
}

async fn relist<R: ListedRecord>(
    store: &ClinicStore,
    cancel: &CancellationToken,
) -> ClinicResult<CategoryListing> {
    let records = store.reload_records::<R>(cancel).await?;
    let pets = store.pets().await?;
    Ok(build_listing(&records, &pets, ""))
}

pub async fn add_record<R: ListedRecord>(
    store: &ClinicStore,
    fields: &R::New,
    cancel: &CancellationToken,
) -> ClinicResult<CategoryListing> {
    if R::new_pet_id(fields).trim().is_empty() {
        return Err(ClinicError::MissingInput(SELECT_PET.to_string()));
    }
    store.api().add_record::<R>(fields).await?;
    info!(category = %R::CATEGORY, "record added");
    relist::<R>(store, cancel).await
}

pub async fn edit_record<R: ListedRecord>(
    store: &ClinicStore,
    id: &str,
    patch: &R::Patch,
    cancel: &CancellationToken,
) -> ClinicResult<CategoryListing> {
    let id = require_id(id)?;
    store.api().edit_record::<R>(id, patch).await?;
    info!(category = %R::CATEGORY, id, "record edited");
    relist::<R>(store, cancel).await
}

pub async fn delete_record<R: ListedRecord>(
    store: &ClinicStore,
    id: &str,
    confirm: &dyn Confirm,
    cancel: &CancellationToken,
) -> ClinicResult<FlowOutcome<CategoryListing>> {
    let id = require_id(id)?;
    if !confirm.confirm("Are you sure?") {
        info!(category = %R::CATEGORY, id, "delete declined");
        return Ok(FlowOutcome::Declined);
    }
    store.api().delete_record::<R>(id).await?;
    info!(category = %R::CATEGORY, id, "record deleted");
    Ok(FlowOutcome::Done(relist::<R>(store, cancel).await?))
}

fn require_id(id: &str) -> ClinicResult<&str> {
    let id = id.trim();
    if id.is_empty() {
        Err(ClinicError::MissingInput("Record ID is required".to_string()))
    } else {
        Ok(id)
    }
}

// ---- pets ----

/// Pet cards for every cached pet.
pub async fn list_pets(store: &ClinicStore) -> ClinicResult<Vec<RecordRow>> {
    let pets = store.pets().await?;
    let users = store.users().await?;
    Ok(pets.iter().map(|p| pet_card(p, &users)).collect())
}

async fn relist_pets(store: &ClinicStore) -> ClinicResult<Vec<RecordRow>> {
    let pets = store.reload_pets().await?;
    let users = store.users().await?;
    Ok(pets.iter().map(|p| pet_card(p, &users)).collect())
}

pub async fn add_pet(store: &ClinicStore, pet: &NewPet) -> ClinicResult<Vec<RecordRow>> {
    if pet.owner_id.trim().is_empty() {
        return Err(ClinicError::MissingInput(SELECT_OWNER.to_string()));
    }
    store.api().add_pet(pet).await?;
    info!(name = %pet.name, "pet added");
    relist_pets(store).await
}

/// Edit a known pet. The owner is carried over when the patch leaves it out.
pub async fn edit_pet(
    store: &ClinicStore,
    id: &str,
    patch: &PetPatch,
) -> ClinicResult<Vec<RecordRow>> {
    let pets = store.pets().await?;
    let Some(current) = find_pet(&pets, id) else {
        return Err(ClinicError::NotFound(format!("pet {id}")));
    };

    let mut patch = patch.clone();
    if patch.owner_id.is_none() {
        patch.owner_id = current.owner_id.clone();
    }
    store.api().edit_pet(id, &patch).await?;
    info!(id, "pet edited");
    relist_pets(store).await
}

pub async fn delete_pet(
    store: &ClinicStore,
    id: &str,
    confirm: &dyn Confirm,
) -> ClinicResult<FlowOutcome<Vec<RecordRow>>> {
    let id = require_id(id)?;
    if !confirm.confirm("Are you sure you want to delete this pet?") {
        info!(id, "pet delete declined");
        return Ok(FlowOutcome::Declined);
    }
    store.api().delete_pet(id).await?;
    info!(id, "pet deleted");
    Ok(FlowOutcome::Done(relist_pets(store).await?))
}

// ---- owners ----

/// Owner cards, in user-list order.
pub async fn list_owners(store: &ClinicStore) -> ClinicResult<Vec<RecordRow>> {
    let users = store.users().await?;
    Ok(owners(&users).into_iter().map(owner_card).collect())
}

async fn relist_owners(store: &ClinicStore) -> ClinicResult<Vec<RecordRow>> {
    let users = store.reload_users().await?;
    Ok(owners(&users).into_iter().map(owner_card).collect())
}

pub async fn add_owner(store: &ClinicStore, owner: &NewOwner) -> ClinicResult<Vec<RecordRow>> {
    if owner.id.trim().is_empty() || owner.name.trim().is_empty() {
        return Err(ClinicError::MissingInput(
            OWNER_ID_AND_NAME_REQUIRED.to_string(),
        ));
    }
    store.api().add_owner(owner).await?;
    info!(id = %owner.id, "owner added");
    relist_owners(store).await
}

pub async fn edit_owner(
    store: &ClinicStore,
    id: &str,
    patch: &OwnerPatch,
) -> ClinicResult<Vec<RecordRow>> {
    let id = require_id(id)?;
    store.api().edit_owner(id, patch).await?;
    info!(id, "owner edited");
    relist_owners(store).await
}

pub async fn delete_owner(
    store: &ClinicStore,
    id: &str,
    confirm: &dyn Confirm,
) -> ClinicResult<FlowOutcome<Vec<RecordRow>>> {
    let id = require_id(id)?;
    if !confirm.confirm("Are you sure?") {
        info!(id, "owner delete declined");
        return Ok(FlowOutcome::Declined);
    }
    store.api().delete_owner(id).await?;
    info!(id, "owner deleted");
    Ok(FlowOutcome::Done(relist_owners(store).await?))
}
