//! Typed client for the clinic record service.
//!
//! Wraps a [`Transport`] with the service's endpoint paths and wire types.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::models::{
    BreedRiskInput, HealthScoreInput, LifespanInput, LoginRequest, LoginResponse, NewOwner, NewPet,
    OwnerPatch, Person, Pet, PetPatch, PetRecord, Prediction, PredictionResponse, RegisterRequest,
};
use crate::remote::{Ack, HttpTransport, RemoteError, RemoteResult, Transport};

/// Typed endpoint wrapper. Cheap to clone.
#[derive(Clone)]
pub struct ClinicApi {
    transport: Arc<dyn Transport>,
}

impl ClinicApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Client for an HTTP backend at `base_url`.
    pub fn http(base_url: &str) -> RemoteResult<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(base_url)?)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &[&str]) -> RemoteResult<T> {
        let value = self.transport.get_json(path).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &[&str], body: &B) -> RemoteResult<Value> {
        let body = serde_json::to_value(body)?;
        self.transport.post_json(path, body).await
    }

    async fn post_ack<B: Serialize + ?Sized>(&self, path: &[&str], body: &B) -> RemoteResult<Ack> {
        let ack = Ack::from_value(self.post(path, body).await?);
        if !ack.looks_ok() {
            warn!(
                backend = self.transport.backend_tag(),
                path = ?path,
                status = ?ack.status,
                error = ?ack.error,
                "mutation acknowledged with a non-ok body"
            );
        }
        Ok(ack)
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Register a new account. Server-side failures carry the server's message
    /// or "Registration failed".
    pub async fn register(&self, request: &RegisterRequest) -> RemoteResult<Person> {
        match self.post(&["register"], request).await {
            Ok(value) => Ok(serde_json::from_value(value)?),
            Err(e @ (RemoteError::Status { .. } | RemoteError::Decode(_))) => {
                Err(RemoteError::Rejected(e.user_message("Registration failed")))
            }
            Err(e) => Err(e),
        }
    }

    /// Log in and return the user profile.
    pub async fn login(&self, email: &str, password: &str) -> RemoteResult<Person> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = serde_json::from_value(self.post(&["login"], &request).await?)?;
        match (response.status.as_str(), response.user) {
            ("ok", Some(user)) => Ok(user),
            _ => Err(RemoteError::Rejected(
                response.message.unwrap_or_else(|| "Login failed".to_string()),
            )),
        }
    }

    // =========================================================================
    // Pets
    // =========================================================================

    pub async fn pets(&self) -> RemoteResult<Vec<Pet>> {
        self.get(&["pets"]).await
    }

    /// Pets belonging to one owner.
    pub async fn owner_pets(&self, owner_id: &str) -> RemoteResult<Vec<Pet>> {
        self.get(&["owner", owner_id]).await
    }

    pub async fn add_pet(&self, pet: &NewPet) -> RemoteResult<Ack> {
        self.post_ack(&["add_pet"], pet).await
    }

    pub async fn edit_pet(&self, id: &str, patch: &PetPatch) -> RemoteResult<Ack> {
        self.post_ack(&["edit_pet"], &with_id(id, patch)?).await
    }

    pub async fn delete_pet(&self, id: &str) -> RemoteResult<Ack> {
        self.post_ack(&["delete_pet"], &json!({ "id": id })).await
    }

    // =========================================================================
    // Users / owners
    // =========================================================================

    pub async fn users(&self) -> RemoteResult<Vec<Person>> {
        self.get(&["users"]).await
    }

    pub async fn add_owner(&self, owner: &NewOwner) -> RemoteResult<Ack> {
        self.post_ack(&["owner", "add"], owner).await
    }

    pub async fn edit_owner(&self, id: &str, patch: &OwnerPatch) -> RemoteResult<Ack> {
        self.post_ack(&["owner", "edit"], &with_id(id, patch)?).await
    }

    pub async fn delete_owner(&self, id: &str) -> RemoteResult<Ack> {
        self.post_ack(&["owner", "delete"], &json!({ "id": id })).await
    }

    // =========================================================================
    // Per-pet records
    // =========================================================================

    /// Records of one category for one pet.
    pub async fn records_for_pet<R: PetRecord>(&self, pet_id: &str) -> RemoteResult<Vec<R>> {
        let records: Vec<R> = self.get(&[R::CATEGORY.path(), pet_id]).await?;
        debug!(category = %R::CATEGORY, pet_id, count = records.len(), "fetched records");
        Ok(records)
    }

    pub async fn add_record<R: PetRecord>(&self, fields: &R::New) -> RemoteResult<Ack> {
        self.post_ack(&[R::CATEGORY.path(), "add"], fields).await
    }

    pub async fn edit_record<R: PetRecord>(&self, id: &str, patch: &R::Patch) -> RemoteResult<Ack> {
        self.post_ack(&[R::CATEGORY.path(), "edit"], &with_id(id, patch)?)
            .await
    }

    pub async fn delete_record<R: PetRecord>(&self, id: &str) -> RemoteResult<Ack> {
        self.post_ack(&[R::CATEGORY.path(), "delete"], &json!({ "id": id }))
            .await
    }

    // =========================================================================
    // Uploads and predictions
    // =========================================================================

    /// Upload a file and return the URL the server stored it under.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> RemoteResult<String> {
        let response = self.transport.upload_file(file_name, bytes).await?;
        response
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .ok_or_else(|| RemoteError::Rejected("Upload failed".to_string()))
    }

    pub async fn predict_lifespan(&self, age: f64) -> RemoteResult<Prediction> {
        self.predict("lifespan", &LifespanInput { age }).await
    }

    pub async fn predict_health_score(&self, age: f64, weight: f64) -> RemoteResult<Prediction> {
        self.predict("health_score", &HealthScoreInput { age, weight })
            .await
    }

    pub async fn predict_breed_risk(&self, age: f64) -> RemoteResult<Prediction> {
        self.predict("breed_risk", &BreedRiskInput { age }).await
    }

    async fn predict<B: Serialize>(&self, endpoint: &str, input: &B) -> RemoteResult<Prediction> {
        let response: PredictionResponse = serde_json::from_value(self.post(&["ai", endpoint], input).await?)?;
        match (response.prediction, response.error) {
            (Some(value), _) => Ok(Prediction::from_value(value)),
            (None, Some(error)) => Err(RemoteError::Rejected(error)),
            (None, None) => Err(RemoteError::Rejected("Prediction failed".to_string())),
        }
    }
}

/// Serialize a patch and add the record ID to it.
fn with_id<P: Serialize + ?Sized>(id: &str, patch: &P) -> RemoteResult<Value> {
    let mut value = serde_json::to_value(patch)?;
    match &mut value {
        Value::Object(map) => {
            map.insert("id".to_string(), Value::String(id.to_string()));
            Ok(value)
        }
        _ => Ok(json!({ "id": id })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewWeightEntry, WeightEntry, WeightPatch};
    use crate::remote::InMemoryTransport;

    fn api() -> (Arc<InMemoryTransport>, ClinicApi) {
        let transport = Arc::new(InMemoryTransport::new());
        (transport.clone(), ClinicApi::new(transport))
    }

    #[tokio::test]
    async fn test_login_rejected_uses_server_message() {
        let (_, api) = api();
        let err = api.login("x@y", "pw").await.unwrap_err();
        match err {
            RemoteError::Rejected(msg) => assert_eq!(msg, "Invalid email or password"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (_, api) = api();
        let req = RegisterRequest::vet("Dr. Demir".into(), "d@vet".into(), "pw".into());
        let created = api.register(&req).await.unwrap();
        assert!(created.is_vet());

        let user = api.login("d@vet", "pw").await.unwrap();
        assert_eq!(user.name, "Dr. Demir");

        let dup = api.register(&req).await.unwrap_err();
        assert!(matches!(dup, RemoteError::Rejected(ref m) if m == "Email already registered"));
    }

    #[tokio::test]
    async fn test_weight_round_trip_through_endpoints() {
        let (transport, api) = api();
        let new = NewWeightEntry {
            pet_id: "p1".into(),
            weight: 4.2,
            date: "2024-01-01".into(),
        };
        api.add_record::<WeightEntry>(&new).await.unwrap();

        let entries: Vec<WeightEntry> = api.records_for_pet("p1").await.unwrap();
        assert_eq!(entries.len(), 1);

        let patch = WeightPatch {
            weight: Some(4.5),
            date: None,
        };
        api.edit_record::<WeightEntry>(&entries[0].id, &patch).await.unwrap();
        let entries: Vec<WeightEntry> = api.records_for_pet("p1").await.unwrap();
        assert_eq!(entries[0].weight, Some(4.5));
        assert_eq!(entries[0].date, "2024-01-01");

        assert_eq!(
            transport.requests(),
            vec![
                "POST /weight/add",
                "GET /weight/p1",
                "POST /weight/edit",
                "GET /weight/p1",
            ]
        );
    }

    #[tokio::test]
    async fn test_prediction_without_model() {
        let (transport, api) = api();
        let err = api.predict_lifespan(3.0).await.unwrap_err();
        assert!(matches!(err, RemoteError::Rejected(ref m) if m == "model not loaded"));

        transport.set_prediction("breed_risk", json!("low"));
        let p = api.predict_breed_risk(3.0).await.unwrap();
        assert_eq!(p, Prediction::Label("low".into()));
    }

    #[tokio::test]
    async fn test_upload_returns_url() {
        let (_, api) = api();
        let url = api.upload("rex.jpg", vec![1, 2, 3]).await.unwrap();
        assert_eq!(url, "memory://uploads/rex.jpg");
    }

    #[test]
    fn test_with_id_merges_patch() {
        let patch = WeightPatch {
            weight: Some(3.0),
            date: None,
        };
        let body = with_id("w1", &patch).unwrap();
        assert_eq!(body, json!({"id": "w1", "weight": 3.0}));
    }
}
