//! Session persistence on disk.

use petclinic_core::models::{Person, Role};
use petclinic_core::{ClinicApi, ClinicApp, ClinicStore, Database, FetchPolicy, InMemoryTransport, Page, SessionStore};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn vet() -> Person {
    Person {
        id: "v1".into(),
        name: "Dr. Smith".into(),
        role: Role::Vet,
        email: Some("smith@vet".into()),
        phone: None,
        address: None,
    }
}

#[test]
fn test_session_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state").join("petclinic-state.db");

    {
        let store = SessionStore::new(Database::open(&path).unwrap());
        store.save_user(&vet()).unwrap();
    }

    let store = SessionStore::new(Database::open(&path).unwrap());
    assert_eq!(store.current_user().unwrap(), Some(vet()));

    store.clear_user().unwrap();
    let store = SessionStore::new(Database::open(&path).unwrap());
    assert_eq!(store.current_user().unwrap(), None);
}

#[tokio::test]
async fn test_startup_page_follows_stored_session() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.db");

    let transport = Arc::new(InMemoryTransport::new());
    transport.seed(
        "users",
        json!({"id": "v1", "name": "Dr. Smith", "role": "vet", "email": "smith@vet", "password": "pw"}),
    );
    let make_app = || {
        let store = ClinicStore::new(ClinicApi::new(transport.clone()), FetchPolicy::default());
        ClinicApp::new(store, SessionStore::new(Database::open(&path).unwrap()))
    };

    let first = make_app();
    assert_eq!(first.start().unwrap(), Page::Login);
    first.login("smith@vet", "pw").await.unwrap();
    drop(first);

    let second = make_app();
    assert_eq!(second.start().unwrap(), Page::Dashboard);
    assert_eq!(second.current_user().unwrap().map(|u| u.id), Some("v1".to_string()));

    second.logout().unwrap();
    drop(second);

    let third = make_app();
    assert_eq!(third.start().unwrap(), Page::Login);
}
