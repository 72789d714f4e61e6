//! Petclinic Core Library
//!
//! Client for a veterinary clinic's record service: owners, pets, medical
//! history, vaccinations, weight tracking and appointments.
//!
//! # Architecture
//!
//! ```text
//!   action (list / search / add / edit / delete)
//!           │
//!           ▼
//!   ┌───────────────────┐   miss    ┌──────────────────────────────┐
//!   │  RecordCache<T>   │──────────▶│  fan-out: one GET per pet     │
//!   │  (per category)   │◀──────────│  bounded, cancellable, ordered│
//!   └─────────┬─────────┘  replace  └──────────────┬───────────────┘
//!             │                                    │
//!             ▼                                    ▼
//!   ┌───────────────────┐                  Transport (HTTP / memory)
//!   │  FilteredView     │  exact pet (ID / name) or broad substring
//!   └─────────┬─────────┘
//!             │
//!     ┌───────┴────────┐
//!     ▼                ▼
//!  RecordRow      WeightChart (shared date axis, explicit gaps)
//! ```
//!
//! # Core Principle
//!
//! **Caches are snapshots.** They are filled on first use, replaced wholesale
//! on reload and reloaded after every mutation of their category. Records
//! that point at an unknown pet render with a placeholder label.
//!
//! # Modules
//!
//! - [`models`]: Wire types (Pet, Person, per-pet records, predictions)
//! - [`remote`]: Transport trait with HTTP and in-memory backends
//! - [`api`]: Typed endpoint client
//! - [`cache`]: Per-category snapshot cache with coalesced reloads
//! - [`fanout`]: Bounded concurrent per-pet fetches
//! - [`store`]: Entity caches bundled with their loaders
//! - [`filter`]: Query resolution and record filtering
//! - [`chart`]: Weight chart projection
//! - [`view`]: Structured rows for lists and pickers
//! - [`flows`]: Add / edit / delete with reload and confirmation
//! - [`dashboard`]: Clinic summary counts
//! - [`db`]: SQLite client state (stored session)
//! - [`config`]: Environment configuration
//! - [`app`]: Session lifecycle and page navigation

pub mod api;
pub mod app;
pub mod cache;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod fanout;
pub mod filter;
pub mod flows;
pub mod models;
pub mod remote;
pub mod store;
pub mod view;

// Re-export commonly used types
pub use api::ClinicApi;
pub use app::{ClinicApp, Page, PetDetail};
pub use cache::RecordCache;
pub use chart::{series_color, Series, WeightChart};
pub use config::ClientConfig;
pub use dashboard::DashboardSummary;
pub use db::{Database, DbError, DbResult, SessionStore};
pub use fanout::{fan_out, FetchPolicy};
pub use filter::*;
pub use flows::{CategoryListing, Confirm, FlowOutcome, ListedRecord};
pub use models::{
    AppointmentRecord, Category, MedicalRecord, Person, Pet, PetRecord, Role, VaccineRecord,
    WeightEntry,
};
pub use remote::{HttpTransport, InMemoryTransport, RemoteError, RemoteResult, Transport};
pub use store::{CachedRecord, ClinicStore};
pub use view::{PickerOption, RecordRow, ToRow};

use thiserror::Error;

// =========================================================================
// Error Type
// =========================================================================

#[derive(Debug, Error)]
pub enum ClinicError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    /// Required local input is missing; raised before any request is sent.
    #[error("{0}")]
    MissingInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not logged in")]
    NotLoggedIn,
}

impl ClinicError {
    /// Message for an alert, with `fallback` for remote failures that carry
    /// no message of their own.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClinicError::Remote(e) => e.user_message(fallback),
            other => other.to_string(),
        }
    }
}

pub type ClinicResult<T> = Result<T, ClinicError>;
