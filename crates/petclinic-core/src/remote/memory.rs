//! In-memory stand-in for the clinic backend.
//!
//! Routes requests the same way the real service does and keeps its tables
//! as JSON rows, so the typed client exercises the same wire shapes. Every
//! request is logged, which lets tests assert that a flow issued no request
//! at all.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{display_path, RemoteError, RemoteResult, Transport};

const RECORD_TABLES: [&str; 4] = ["medical", "vaccine", "weight", "appointment"];

#[derive(Default)]
struct Tables {
    users: Vec<Value>,
    pets: Vec<Value>,
    records: HashMap<&'static str, Vec<Value>>,
    predictions: HashMap<&'static str, Value>,
}

/// In-memory record service.
pub struct InMemoryTransport {
    tables: Mutex<Tables>,
    requests: Mutex<Vec<String>>,
    request_count: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    offline: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            requests: Mutex::new(Vec::new()),
            request_count: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
            latency: Mutex::new(None),
        }
    }

    /// Insert a row directly, bypassing the request log. Rows without an
    /// `id` get a fresh UUID. Returns the row's ID.
    pub fn seed(&self, table: &str, row: Value) -> String {
        let mut tables = lock(&self.tables);
        let row = with_id(row);
        let id = id_of(&row).unwrap_or_default();
        match table {
            "users" => tables.users.push(row),
            "pets" => tables.pets.push(row),
            other => {
                if let Some(key) = record_table(other) {
                    tables.records.entry(key).or_default().push(row);
                }
            }
        }
        id
    }

    /// Make prediction endpoints answer with fixed values instead of
    /// reporting that no model is loaded.
    pub fn set_prediction(&self, endpoint: &str, value: Value) {
        let key = match endpoint {
            "lifespan" => "lifespan",
            "health_score" => "health_score",
            "breed_risk" => "breed_risk",
            _ => return,
        };
        lock(&self.tables).predictions.insert(key, value);
    }

    /// Simulate a connectivity failure for every following request.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every response by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    /// Requests served so far, as `"GET /pets"` style lines.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of requests that were in flight at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Snapshot of a table, for assertions.
    pub fn table(&self, table: &str) -> Vec<Value> {
        let tables = lock(&self.tables);
        match table {
            "users" => tables.users.clone(),
            "pets" => tables.pets.clone(),
            other => record_table(other)
                .and_then(|key| tables.records.get(key).cloned())
                .unwrap_or_default(),
        }
    }

    async fn enter(&self, method: &str, path: &[&str]) -> RemoteResult<()> {
        lock(&self.requests).push(format!("{} {}", method, display_path(path)));
        self.request_count.fetch_add(1, Ordering::SeqCst);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Network("connection refused".into()));
        }
        Ok(())
    }

    fn route_get(&self, path: &[&str]) -> RemoteResult<Value> {
        let tables = lock(&self.tables);
        match path {
            ["pets"] => Ok(Value::Array(tables.pets.clone())),
            ["users"] => Ok(Value::Array(tables.users.clone())),
            ["owner", owner_id] => Ok(Value::Array(
                tables
                    .pets
                    .iter()
                    .filter(|p| field_eq(p, "ownerId", owner_id))
                    .cloned()
                    .collect(),
            )),
            [table, pet_id] if record_table(table).is_some() => {
                let key = record_table(table).unwrap_or_default();
                Ok(Value::Array(
                    tables
                        .records
                        .get(key)
                        .map(|rows| {
                            rows.iter()
                                .filter(|r| field_eq(r, "petId", pet_id))
                                .cloned()
                                .collect()
                        })
                        .unwrap_or_default(),
                ))
            }
            _ => Err(not_found(path)),
        }
    }

    fn route_post(&self, path: &[&str], body: Value) -> RemoteResult<Value> {
        let mut tables = lock(&self.tables);
        match path {
            ["register"] => {
                let email = body.get("email").cloned().unwrap_or(Value::Null);
                if tables.users.iter().any(|u| u.get("email") == Some(&email)) {
                    return Err(RemoteError::Status {
                        status: 400,
                        message: Some("Email already registered".into()),
                    });
                }
                let user = with_id(body);
                tables.users.push(user.clone());
                Ok(user)
            }
            ["login"] => {
                let found = tables.users.iter().find(|u| {
                    u.get("email") == body.get("email") && u.get("password") == body.get("password")
                });
                Ok(match found {
                    Some(user) => json!({"status": "ok", "user": user}),
                    None => json!({"status": "error", "message": "Invalid email or password"}),
                })
            }
            ["add_pet"] => Ok(insert(&mut tables.pets, body)),
            ["edit_pet"] => Ok(update(&mut tables.pets, body)),
            ["delete_pet"] => Ok(remove(&mut tables.pets, &body)),
            ["owner", "add"] => {
                let mut owner = body;
                if let Value::Object(map) = &mut owner {
                    map.insert("role".into(), json!("owner"));
                }
                Ok(insert(&mut tables.users, owner))
            }
            ["owner", "edit"] => Ok(update(&mut tables.users, body)),
            ["owner", "delete"] => Ok(remove(&mut tables.users, &body)),
            ["ai", endpoint] => {
                let prediction = match *endpoint {
                    "lifespan" | "health_score" | "breed_risk" => tables.predictions.get(*endpoint).cloned(),
                    _ => return Err(not_found(path)),
                };
                Ok(match prediction {
                    Some(value) => json!({ "prediction": value }),
                    None => json!({"error": "model not loaded"}),
                })
            }
            [table, action] if record_table(table).is_some() => {
                let key = record_table(table).unwrap_or_default();
                let rows = tables.records.entry(key).or_default();
                match *action {
                    "add" => Ok(insert(rows, body)),
                    "edit" => Ok(update(rows, body)),
                    "delete" => Ok(remove(rows, &body)),
                    _ => Err(not_found(path)),
                }
            }
            _ => Err(not_found(path)),
        }
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn get_json(&self, path: &[&str]) -> RemoteResult<Value> {
        self.enter("GET", path).await?;
        self.route_get(path)
    }

    async fn post_json(&self, path: &[&str], body: Value) -> RemoteResult<Value> {
        self.enter("POST", path).await?;
        self.route_post(path, body)
    }

    async fn upload_file(&self, file_name: &str, _bytes: Vec<u8>) -> RemoteResult<Value> {
        self.enter("POST", &["upload"]).await?;
        Ok(json!({ "url": format!("memory://uploads/{}", file_name) }))
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn record_table(name: &str) -> Option<&'static str> {
    RECORD_TABLES.iter().copied().find(|t| *t == name)
}

fn not_found(path: &[&str]) -> RemoteError {
    RemoteError::Status {
        status: 404,
        message: Some(format!("no route for {}", display_path(path))),
    }
}

fn id_of(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field_eq(row: &Value, field: &str, expected: &str) -> bool {
    match row.get(field) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        _ => false,
    }
}

fn with_id(row: Value) -> Value {
    let mut map = match row {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let has_id = matches!(map.get("id"), Some(Value::String(s)) if !s.is_empty())
        || matches!(map.get("id"), Some(Value::Number(_)));
    if !has_id {
        map.insert("id".into(), json!(uuid::Uuid::new_v4().to_string()));
    }
    Value::Object(map)
}

fn insert(rows: &mut Vec<Value>, body: Value) -> Value {
    let row = with_id(body);
    rows.push(row.clone());
    row
}

fn update(rows: &mut [Value], body: Value) -> Value {
    let Some(id) = id_of(&body) else {
        return json!({"error": "missing id"});
    };
    let Value::Object(patch) = body else {
        return json!({"error": "invalid body"});
    };
    match rows.iter_mut().find(|r| id_of(r).as_deref() == Some(id.as_str())) {
        Some(Value::Object(row)) => {
            for (k, v) in patch {
                row.insert(k, v);
            }
            Value::Object(row.clone())
        }
        _ => json!({"error": "not found"}),
    }
}

fn remove(rows: &mut Vec<Value>, body: &Value) -> Value {
    let id = id_of(body);
    let before = rows.len();
    rows.retain(|r| id.is_none() || id_of(r) != id);
    if rows.len() < before {
        json!({"status": "ok"})
    } else {
        json!({"status": "not_found"})
    }
}
