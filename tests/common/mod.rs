#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::{
    async_trait,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

use worksite_api::auth::generate_token;
use worksite_api::config::{AppConfig, PasswordParams, StorageConfig, StorageMode};
use worksite_api::entities::{Role, User};
use worksite_api::services::{MailError, Mailer, VerifyOutcome};
use worksite_api::{router, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_API_KEY: &str = "test-key";
pub const TEST_BASE_ID: &str = "appTest";

/// Configuration for in-process servers: fast password hashing, no demo rows.
pub fn test_config(mode: StorageMode, api_url: Option<&str>) -> AppConfig {
    let mut config = AppConfig::development();
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config.auth.password = PasswordParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    };
    config.storage = StorageConfig {
        mode,
        seed_demo_data: false,
    };
    config.remote.api_key = TEST_API_KEY.to_string();
    config.remote.base_id = TEST_BASE_ID.to_string();
    config.remote.api_url = api_url.unwrap_or("http://127.0.0.1:9/v0").to_string();
    config.email.base_url = "http://worksite.test".to_string();
    config
}

// ---------------------------------------------------------------------------
// Mail capture
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    /// Token from the most recent link mailed to `email`.
    pub fn token_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .and_then(|(_, link)| link.split("token=").nth(1).map(str::to_string))
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification(&self, to: &str, link: &str) -> Result<(), MailError> {
        self.sent.lock().unwrap().push((to.to_string(), link.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// The API under test, served on an ephemeral port
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub base_url: String,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn(config: AppConfig) -> Result<Self> {
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::from_config(config)?.with_mailer(mailer.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            state,
            mailer,
            client: reqwest::Client::new(),
        })
    }

    pub async fn memory() -> Result<Self> {
        Self::spawn(test_config(StorageMode::Memory, None)).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Creates an account with `role`, verifies it through the mailed token
    /// and returns a bearer token for it.
    pub async fn token_for_new_user(&self, email: &str, role: Role) -> Result<(User, String)> {
        let accounts = &self.state.accounts;
        accounts
            .create_user(email, "password1", Some(role.as_str()))
            .await
            .context("failed to create test user")?;
        let verification = self
            .mailer
            .token_for(email)
            .context("no verification mail for test user")?;
        let user = match accounts.verify_email(&verification).await? {
            VerifyOutcome::Verified(user) | VerifyOutcome::AlreadyVerified(user) => user,
        };
        let token = generate_token(&user, TEST_SECRET, chrono::Duration::hours(1))?;
        Ok((user, token))
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.get(self.url(path)).bearer_auth(token).send().await?;
        Self::read(res).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Self::read(res).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Self::read(res).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.delete(self.url(path)).bearer_auth(token).send().await?;
        Self::read(res).await
    }

    pub async fn read(res: reqwest::Response) -> Result<(StatusCode, Value)> {
        let status = StatusCode::from_u16(res.status().as_u16())?;
        let body = res.json::<Value>().await.context("response body is not JSON")?;
        Ok((status, body))
    }
}

// ---------------------------------------------------------------------------
// Fake remote table service
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl StoredRecord {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "createdTime": "2024-01-01T00:00:00.000Z",
            "fields": self.fields,
        })
    }
}

pub struct FakeTables {
    pub tables: HashMap<String, Vec<StoredRecord>>,
    pub page_size: usize,
    /// Reject every create/update/delete with a 500.
    pub fail_writes: bool,
    /// `"METHOD table"` per request, in arrival order.
    pub requests: Vec<String>,
    next_id: u64,
}

impl Default for FakeTables {
    fn default() -> Self {
        Self {
            tables: HashMap::new(),
            page_size: 100,
            fail_writes: false,
            requests: Vec::new(),
            next_id: 1,
        }
    }
}

type Shared = Arc<Mutex<FakeTables>>;

pub struct FakeRemote {
    /// Value for `AIRTABLE_API_URL`.
    pub api_url: String,
    pub state: Shared,
}

impl FakeRemote {
    pub async fn start() -> Result<Self> {
        let state: Shared = Arc::new(Mutex::new(FakeTables::default()));
        let app = Router::new()
            .route(
                "/v0/:base/:table",
                get(list_records).post(create_record).delete(bulk_delete),
            )
            .route(
                "/v0/:base/:table/:id",
                get(get_record)
                    .patch(patch_record)
                    .put(put_record)
                    .delete(delete_record),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            api_url: format!("http://{addr}/v0"),
            state,
        })
    }

    pub fn insert_raw(&self, table: &str, fields: Value) -> String {
        let mut state = self.state.lock().unwrap();
        let id = format!("rec{:03}", state.next_id);
        state.next_id += 1;
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(StoredRecord { id: id.clone(), fields });
        id
    }

    pub fn records(&self, table: &str) -> Vec<StoredRecord> {
        self.state.lock().unwrap().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn set_page_size(&self, size: usize) {
        self.state.lock().unwrap().page_size = size;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}

fn error(status: StatusCode, kind: &str, message: &str) -> Response {
    (status, Json(json!({ "error": { "type": kind, "message": message } }))).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "NOT_FOUND" }))).into_response()
}

fn check(headers: &HeaderMap, base: &str) -> Result<(), Response> {
    let expected = format!("Bearer {TEST_API_KEY}");
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);
    if !authorized {
        return Err(error(
            StatusCode::UNAUTHORIZED,
            "AUTHENTICATION_REQUIRED",
            "Authentication required",
        ));
    }
    if base != TEST_BASE_ID {
        return Err(not_found());
    }
    Ok(())
}

/// Understands only `{Field} = 'value'`, the one shape the client emits.
fn parse_formula(formula: &str) -> Option<(String, String)> {
    let rest = formula.strip_prefix('{')?;
    let (field, rest) = rest.split_once("} = '")?;
    let value = rest.strip_suffix('\'')?;
    Some((field.to_string(), value.replace("''", "'")))
}

fn body_fields(body: &Value) -> Map<String, Value> {
    body.get("fields")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

async fn list_records(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((base, table)): Path<(String, String)>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    if let Err(rejection) = check(&headers, &base) {
        return rejection;
    }
    let mut state = state.lock().unwrap();
    state.requests.push(format!("GET {table}"));

    let lookup = |key: &str| query.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());
    let filter = match lookup("filterByFormula") {
        Some(formula) => match parse_formula(&formula) {
            Some(filter) => Some(filter),
            None => return error(StatusCode::UNPROCESSABLE_ENTITY, "INVALID_FILTER_BY_FORMULA", &formula),
        },
        None => None,
    };
    let start: usize = lookup("offset").and_then(|o| o.parse().ok()).unwrap_or(0);

    let matching: Vec<&StoredRecord> = state
        .tables
        .get(&table)
        .map(|rows| {
            rows.iter()
                .filter(|row| match &filter {
                    Some((field, value)) => row.fields.get(field).and_then(Value::as_str) == Some(value.as_str()),
                    None => true,
                })
                .collect()
        })
        .unwrap_or_default();

    let end = (start + state.page_size).min(matching.len());
    let page: Vec<Value> = matching[start.min(end)..end].iter().map(|r| r.to_json()).collect();
    let mut body = json!({ "records": page });
    if end < matching.len() {
        body["offset"] = json!(end.to_string());
    }
    Json(body).into_response()
}

async fn get_record(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((base, table, id)): Path<(String, String, String)>,
) -> Response {
    if let Err(rejection) = check(&headers, &base) {
        return rejection;
    }
    let mut state = state.lock().unwrap();
    state.requests.push(format!("GET {table}/{id}"));
    match state
        .tables
        .get(&table)
        .and_then(|rows| rows.iter().find(|r| r.id == id))
    {
        Some(record) => Json(record.to_json()).into_response(),
        None => not_found(),
    }
}

async fn create_record(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((base, table)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(rejection) = check(&headers, &base) {
        return rejection;
    }
    let mut state = state.lock().unwrap();
    state.requests.push(format!("POST {table}"));
    if state.fail_writes {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR", "write rejected");
    }

    let id = format!("rec{:03}", state.next_id);
    state.next_id += 1;
    let record = StoredRecord {
        id,
        fields: body_fields(&body),
    };
    let response = record.to_json();
    state.tables.entry(table).or_default().push(record);
    Json(response).into_response()
}

async fn update_record(state: Shared, headers: HeaderMap, base: String, table: String, id: String, body: Value, merge: bool) -> Response {
    if let Err(rejection) = check(&headers, &base) {
        return rejection;
    }
    let mut state = state.lock().unwrap();
    state
        .requests
        .push(format!("{} {table}/{id}", if merge { "PATCH" } else { "PUT" }));
    if state.fail_writes {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR", "write rejected");
    }

    let Some(record) = state
        .tables
        .get_mut(&table)
        .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
    else {
        return not_found();
    };

    let fields = body_fields(&body);
    if merge {
        record.fields.extend(fields);
    } else {
        record.fields = fields;
    }
    Json(record.to_json()).into_response()
}

async fn patch_record(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((base, table, id)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Response {
    update_record(state, headers, base, table, id, body, true).await
}

async fn put_record(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((base, table, id)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Response {
    update_record(state, headers, base, table, id, body, false).await
}

async fn delete_record(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((base, table, id)): Path<(String, String, String)>,
) -> Response {
    if let Err(rejection) = check(&headers, &base) {
        return rejection;
    }
    let mut state = state.lock().unwrap();
    state.requests.push(format!("DELETE {table}/{id}"));
    if state.fail_writes {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR", "write rejected");
    }

    let Some(rows) = state.tables.get_mut(&table) else {
        return not_found();
    };
    let before = rows.len();
    rows.retain(|r| r.id != id);
    if rows.len() == before {
        return not_found();
    }
    Json(json!({ "id": id, "deleted": true })).into_response()
}

async fn bulk_delete(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((base, table)): Path<(String, String)>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    if let Err(rejection) = check(&headers, &base) {
        return rejection;
    }
    let ids: Vec<String> = query
        .into_iter()
        .filter(|(k, _)| k == "records[]")
        .map(|(_, v)| v)
        .collect();

    let mut state = state.lock().unwrap();
    state.requests.push(format!("DELETE {table}?{}", ids.len()));
    if state.fail_writes {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR", "write rejected");
    }
    if ids.len() > 10 {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_REQUEST_UNKNOWN",
            "at most 10 records per request",
        );
    }

    let rows = state.tables.entry(table).or_default();
    rows.retain(|r| !ids.contains(&r.id));
    let deleted: Vec<Value> = ids.iter().map(|id| json!({ "id": id, "deleted": true })).collect();
    Json(json!({ "records": deleted })).into_response()
}
