//! Application state: the stored session, the active page and the caches.
//!
//! Opening a page cancels the previous page's token, which abandons any
//! fan-out still running on its behalf.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::ClinicApi;
use crate::config::ClientConfig;
use crate::dashboard::{load_dashboard, DashboardSummary};
use crate::db::{Database, SessionStore};
use crate::flows::{list_records, CategoryListing, ListedRecord};
use crate::models::{
    vets, AppointmentRecord, Category, MedicalRecord, Person, Pet, Prediction, RegisterRequest,
    VaccineRecord, WeightEntry,
};
use crate::store::ClinicStore;
use crate::view::{owner_options, pet_options, PickerOption};
use crate::{ClinicError, ClinicResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Dashboard,
    Pets,
    Owners,
    Medical,
    Vaccines,
    Weight,
    Appointments,
    PetDetail,
    Predictions,
}

impl Page {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Medical => Page::Medical,
            Category::Vaccine => Page::Vaccines,
            Category::Weight => Page::Weight,
            Category::Appointment => Page::Appointments,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Page::Login => "login",
            Page::Dashboard => "dashboard",
            Page::Pets => "pets",
            Page::Owners => "owners",
            Page::Medical => "medical",
            Page::Vaccines => "vaccines",
            Page::Weight => "weight",
            Page::Appointments => "appointments",
            Page::PetDetail => "pet-detail",
            Page::Predictions => "predictions",
        };
        f.write_str(name)
    }
}

/// One pet with all of its records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PetDetail {
    pub pet: Pet,
    pub medical: Vec<MedicalRecord>,
    pub vaccines: Vec<VaccineRecord>,
    pub weights: Vec<WeightEntry>,
    pub appointments: Vec<AppointmentRecord>,
}

impl PetDetail {
    /// Section titles with one line per record.
    pub fn sections(&self) -> Vec<(&'static str, Vec<String>)> {
        vec![
            (
                "Medical History",
                self.medical
                    .iter()
                    .map(|m| format!("{}: {}", m.date, m.diagnosis))
                    .collect(),
            ),
            (
                "Vaccinations",
                self.vaccines
                    .iter()
                    .map(|v| format!("{} ({})", v.vaccine_name, v.date_given))
                    .collect(),
            ),
            (
                "Weight Tracking",
                self.weights
                    .iter()
                    .map(|w| format!("{}: {}", w.date, w.weight_label()))
                    .collect(),
            ),
            (
                "Appointments",
                self.appointments
                    .iter()
                    .map(|a| format!("{}: {}", a.date, a.reason))
                    .collect(),
            ),
        ]
    }
}

struct Navigation {
    page: Page,
    token: CancellationToken,
}

pub struct ClinicApp {
    store: ClinicStore,
    session: Mutex<SessionStore>,
    nav: Mutex<Navigation>,
}

impl ClinicApp {
    pub fn new(store: ClinicStore, session: SessionStore) -> Self {
        Self {
            store,
            session: Mutex::new(session),
            nav: Mutex::new(Navigation {
                page: Page::Login,
                token: CancellationToken::new(),
            }),
        }
    }

    /// HTTP-backed app with the session kept in `db`.
    pub fn from_config(config: &ClientConfig, db: Database) -> ClinicResult<Self> {
        let api = ClinicApi::http(&config.base_url)?;
        let store = ClinicStore::new(api, config.fetch_policy());
        Ok(Self::new(store, SessionStore::new(db)))
    }

    pub fn store(&self) -> &ClinicStore {
        &self.store
    }

    fn session(&self) -> MutexGuard<'_, SessionStore> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn nav(&self) -> MutexGuard<'_, Navigation> {
        self.nav.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ---- navigation ----

    /// Switch pages, cancelling whatever the previous page still had in
    /// flight. Returns the new page's token.
    pub fn open_page(&self, page: Page) -> CancellationToken {
        let mut nav = self.nav();
        nav.token.cancel();
        nav.token = CancellationToken::new();
        nav.page = page;
        info!(%page, "page opened");
        nav.token.clone()
    }

    pub fn current_page(&self) -> Page {
        self.nav().page
    }

    /// Pick the landing page from the stored session.
    pub fn start(&self) -> ClinicResult<Page> {
        let page = match self.current_user()? {
            Some(_) => Page::Dashboard,
            None => Page::Login,
        };
        self.open_page(page);
        Ok(page)
    }

    // ---- session ----

    pub fn current_user(&self) -> ClinicResult<Option<Person>> {
        Ok(self.session().current_user()?)
    }

    pub fn require_user(&self) -> ClinicResult<Person> {
        self.current_user()?.ok_or(ClinicError::NotLoggedIn)
    }

    pub async fn login(&self, email: &str, password: &str) -> ClinicResult<Person> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClinicError::MissingInput(
                "Please enter email and password".to_string(),
            ));
        }
        let user = self.store.api().login(email.trim(), password).await?;
        self.session().save_user(&user)?;
        info!(user_id = %user.id, "logged in");
        self.open_page(Page::Dashboard);
        Ok(user)
    }

    /// Register a vet account. The caller logs in separately.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> ClinicResult<Person> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(ClinicError::MissingInput("Please fill all fields".to_string()));
        }
        let request = RegisterRequest::vet(
            name.trim().to_string(),
            email.trim().to_string(),
            password.to_string(),
        );
        let user = self.store.api().register(&request).await?;
        info!(user_id = %user.id, "registered");
        Ok(user)
    }

    pub fn logout(&self) -> ClinicResult<()> {
        self.session().clear_user()?;
        self.open_page(Page::Login);
        Ok(())
    }

    // ---- pages ----

    pub async fn dashboard(&self, today: NaiveDate) -> ClinicResult<DashboardSummary> {
        let token = self.open_page(Page::Dashboard);
        load_dashboard(&self.store, today, &token).await
    }

    /// Search a record category on its own page.
    pub async fn search<R: ListedRecord>(&self, query: &str) -> ClinicResult<CategoryListing> {
        let token = self.open_page(Page::for_category(R::CATEGORY));
        list_records::<R>(&self.store, query, &token).await
    }

    /// One pet and all of its records, or `None` when no pet has that id.
    pub async fn pet_detail(&self, id: &str) -> ClinicResult<Option<PetDetail>> {
        let token = self.open_page(Page::PetDetail);
        let pets = self.store.reload_pets().await?;
        let Some(pet) = pets.iter().find(|p| p.id.trim() == id.trim()).cloned() else {
            info!(id, "pet not found");
            return Ok(None);
        };

        let api = self.store.api();
        let sections = async {
            tokio::try_join!(
                api.records_for_pet::<MedicalRecord>(&pet.id),
                api.records_for_pet::<VaccineRecord>(&pet.id),
                api.records_for_pet::<WeightEntry>(&pet.id),
                api.records_for_pet::<AppointmentRecord>(&pet.id),
            )
        };
        let (medical, vaccines, weights, appointments) = tokio::select! {
            _ = token.cancelled() => return Err(crate::remote::RemoteError::Cancelled.into()),
            result = sections => result?,
        };

        Ok(Some(PetDetail {
            pet,
            medical,
            vaccines,
            weights,
            appointments,
        }))
    }

    pub async fn owner_pets(&self, owner_id: &str) -> ClinicResult<Vec<Pet>> {
        let owner_id = owner_id.trim();
        if owner_id.is_empty() {
            return Err(ClinicError::MissingInput("Owner ID is required".to_string()));
        }
        Ok(self.store.api().owner_pets(owner_id).await?)
    }

    // ---- pickers ----

    pub async fn pet_options(&self) -> ClinicResult<Vec<PickerOption>> {
        let pets = self.store.pets().await?;
        let users = self.store.users().await?;
        Ok(pet_options(&pets, &users))
    }

    pub async fn owner_options(&self) -> ClinicResult<Vec<PickerOption>> {
        let users = self.store.users().await?;
        Ok(owner_options(&users))
    }

    pub async fn vets(&self) -> ClinicResult<Vec<Person>> {
        let users = self.store.users().await?;
        Ok(vets(&users).into_iter().cloned().collect())
    }

    // ---- uploads and predictions ----

    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> ClinicResult<String> {
        let url = self.store.api().upload(file_name, bytes).await?;
        info!(%url, "file uploaded");
        Ok(url)
    }

    pub async fn predict_lifespan(&self, age: f64) -> ClinicResult<Prediction> {
        self.open_page(Page::Predictions);
        Ok(self.store.api().predict_lifespan(age).await?)
    }

    pub async fn predict_health_score(&self, age: f64, weight: f64) -> ClinicResult<Prediction> {
        self.open_page(Page::Predictions);
        Ok(self.store.api().predict_health_score(age, weight).await?)
    }

    pub async fn predict_breed_risk(&self, age: f64) -> ClinicResult<Prediction> {
        self.open_page(Page::Predictions);
        Ok(self.store.api().predict_breed_risk(age).await?)
    }
}
