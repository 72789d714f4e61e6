//! Client-side record store: one cache per entity, filled from the record
//! service on demand.
//!
//! Pets and users are fetched with a single request each. Per-pet categories
//! are assembled by fanning out one request per known pet and concatenating
//! the results in pet order.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::ClinicApi;
use crate::cache::RecordCache;
use crate::fanout::{fan_out, FetchPolicy};
use crate::models::{
    AppointmentRecord, MedicalRecord, Person, Pet, PetRecord, VaccineRecord, WeightEntry,
};
use crate::remote::RemoteResult;

/// A record type with a dedicated cache in [`ClinicStore`].
pub trait CachedRecord: PetRecord {
    fn cache(store: &ClinicStore) -> &RecordCache<Self>;
}

impl CachedRecord for MedicalRecord {
    fn cache(store: &ClinicStore) -> &RecordCache<Self> {
        &store.medical
    }
}

impl CachedRecord for VaccineRecord {
    fn cache(store: &ClinicStore) -> &RecordCache<Self> {
        &store.vaccines
    }
}

impl CachedRecord for WeightEntry {
    fn cache(store: &ClinicStore) -> &RecordCache<Self> {
        &store.weights
    }
}

impl CachedRecord for AppointmentRecord {
    fn cache(store: &ClinicStore) -> &RecordCache<Self> {
        &store.appointments
    }
}

/// Entity caches plus the client used to fill them.
pub struct ClinicStore {
    api: ClinicApi,
    policy: FetchPolicy,
    pets: RecordCache<Pet>,
    users: RecordCache<Person>,
    medical: RecordCache<MedicalRecord>,
    vaccines: RecordCache<VaccineRecord>,
    weights: RecordCache<WeightEntry>,
    appointments: RecordCache<AppointmentRecord>,
}

impl ClinicStore {
    pub fn new(api: ClinicApi, policy: FetchPolicy) -> Self {
        Self {
            api,
            policy,
            pets: RecordCache::new("pets"),
            users: RecordCache::new("users"),
            medical: RecordCache::new("medical"),
            vaccines: RecordCache::new("vaccine"),
            weights: RecordCache::new("weight"),
            appointments: RecordCache::new("appointment"),
        }
    }

    pub fn api(&self) -> &ClinicApi {
        &self.api
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    // ---- pets & users ----

    /// All pets, fetched on first use.
    pub async fn pets(&self) -> RemoteResult<Arc<Vec<Pet>>> {
        self.pets.get_or_load(|| self.api.pets()).await
    }

    pub async fn reload_pets(&self) -> RemoteResult<Arc<Vec<Pet>>> {
        self.pets.reload(|| self.api.pets()).await
    }

    /// Pets currently cached, without fetching.
    pub fn cached_pets(&self) -> Arc<Vec<Pet>> {
        self.pets.snapshot()
    }

    /// All users (owners and vets), fetched on first use.
    pub async fn users(&self) -> RemoteResult<Arc<Vec<Person>>> {
        self.users.get_or_load(|| self.api.users()).await
    }

    pub async fn reload_users(&self) -> RemoteResult<Arc<Vec<Person>>> {
        self.users.reload(|| self.api.users()).await
    }

    // ---- per-pet categories ----

    /// Records of one category across all pets, fetched on first use.
    pub async fn records<R: CachedRecord>(
        &self,
        cancel: &CancellationToken,
    ) -> RemoteResult<Arc<Vec<R>>> {
        R::cache(self)
            .get_or_load(|| self.fetch_all::<R>(cancel))
            .await
    }

    /// Re-fetch one category for every pet and replace its cache.
    pub async fn reload_records<R: CachedRecord>(
        &self,
        cancel: &CancellationToken,
    ) -> RemoteResult<Arc<Vec<R>>> {
        R::cache(self)
            .reload(|| self.fetch_all::<R>(cancel))
            .await
    }

    /// Records of one category currently cached, without fetching.
    pub fn cached_records<R: CachedRecord>(&self) -> Arc<Vec<R>> {
        R::cache(self).snapshot()
    }

    async fn fetch_all<R: PetRecord>(&self, cancel: &CancellationToken) -> RemoteResult<Vec<R>> {
        let pets = self.pets().await?;
        let pet_ids: Vec<String> = pets.iter().map(|p| p.id.clone()).collect();
        debug!(category = %R::CATEGORY, pets = pet_ids.len(), "fetching records for every pet");

        let api = self.api.clone();
        let per_pet = fan_out(pet_ids, &self.policy, cancel, move |pet_id: String| {
            let api = api.clone();
            async move { api.records_for_pet::<R>(&pet_id).await }
        })
        .await?;

        Ok(per_pet.into_iter().flatten().collect())
    }
}
