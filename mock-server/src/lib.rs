use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const AUTH_HEADER: &str = "x-anydo-auth";
pub const PUID_HEADER: &str = "anydo-puid";

/// One registered account and everything it owns.
#[derive(Clone, Debug, Default)]
pub struct Account {
    pub password: String,
    pub profile: Map<String, Value>,
    pub tasks: Vec<Value>,
    pub categories: Vec<Value>,
    pub pending: Option<Vec<Value>>,
}

impl Account {
    fn id(&self) -> Option<&str> {
        self.profile.get("id").and_then(Value::as_str)
    }
}

/// In-memory state of the emulated service, keyed by email.
#[derive(Debug, Default)]
pub struct Service {
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, String>,
}

impl Service {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, email: &str, password: &str, name: &str) -> Self {
        self.insert_account(email, password, name, vec![email.to_string()], Vec::new());
        self
    }

    pub fn with_task(mut self, email: &str, task: Value) -> Self {
        if let Some(account) = self.accounts.get_mut(email) {
            account.tasks.push(task);
        }
        self
    }

    pub fn with_category(mut self, email: &str, category: Value) -> Self {
        if let Some(account) = self.accounts.get_mut(email) {
            account.categories.push(category);
        }
        self
    }

    pub fn with_pending(mut self, email: &str, pending: Option<Vec<Value>>) -> Self {
        if let Some(account) = self.accounts.get_mut(email) {
            account.pending = pending;
        }
        self
    }

    pub fn account(&self, email: &str) -> Option<&Account> {
        self.accounts.get(email)
    }

    pub fn into_db(self) -> Db {
        Arc::new(RwLock::new(self))
    }

    fn insert_account(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
        emails: Vec<String>,
        phone_numbers: Vec<String>,
    ) -> Map<String, Value> {
        let mut profile = Map::new();
        profile.insert("id".into(), json!(Uuid::new_v4().simple().to_string()));
        profile.insert("name".into(), json!(name.trim()));
        profile.insert("email".into(), json!(email));
        profile.insert("emails".into(), json!(emails));
        profile.insert("phoneNumbers".into(), json!(phone_numbers));
        profile.insert("timezone".into(), json!("UTC"));
        self.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                profile: profile.clone(),
                ..Account::default()
            },
        );
        profile
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<String, Rejection> {
        let token = headers
            .get(AUTH_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "missing auth token"))?;
        self.sessions
            .get(token)
            .cloned()
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "unknown auth token"))
    }

    fn account_mut(&mut self, headers: &HeaderMap) -> Result<&mut Account, Rejection> {
        let email = self.authorize(headers)?;
        self.accounts
            .get_mut(&email)
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "account removed"))
    }
}

pub type Db = Arc<RwLock<Service>>;

type Rejection = (StatusCode, Json<Value>);
type Reply = Result<Json<Value>, Rejection>;

fn reject(status: StatusCode, message: &str) -> Rejection {
    (status, Json(json!({ "error": message })))
}

pub fn app() -> Router {
    app_with(Service::new().into_db())
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/user", post(register).delete(remove_user))
        .route("/me", get(get_me).put(put_me))
        .route("/me/tasks", get(list_tasks))
        .route("/me/tasks/{id}", put(put_task).delete(delete_task))
        .route("/me/categories", get(list_categories))
        .route("/me/categories/{id}", put(put_category).delete(delete_category))
        .route("/me/pending", get(list_pending))
        .route("/me/pending/{id}/accept", post(accept_pending))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, Service::new().into_db()).await
}

pub async fn serve(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(db)).await
}

// --- auth & account ---

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn login(State(db): State<Db>, Json(input): Json<LoginRequest>) -> Reply {
    let mut service = db.write().await;
    let valid = service
        .accounts
        .get(&input.username)
        .is_some_and(|account| account.password == input.password);
    if !valid {
        tracing::info!(username = %input.username, "login rejected");
        return Err(reject(StatusCode::UNAUTHORIZED, "invalid credentials"));
    }
    let token = Uuid::new_v4().to_string();
    service.sessions.insert(token.clone(), input.username);
    Ok(Json(json!({ "authToken": token })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    emails: Vec<String>,
    #[serde(default)]
    phone_numbers: Vec<String>,
}

async fn register(State(db): State<Db>, Json(input): Json<RegisterRequest>) -> Reply {
    if input.name.trim().is_empty() || input.username.is_empty() || input.password.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "name, username and password are required"));
    }
    let mut service = db.write().await;
    if service.accounts.contains_key(&input.username) {
        return Err(reject(StatusCode::CONFLICT, "account already exists"));
    }
    let emails = if input.emails.is_empty() {
        vec![input.username.clone()]
    } else {
        input.emails
    };
    service.insert_account(
        &input.username,
        &input.password,
        &input.name,
        emails,
        input.phone_numbers,
    );
    Ok(Json(json!({ "registered": input.username })))
}

#[derive(Deserialize)]
struct RemoveRequest {
    email: String,
    password: String,
}

async fn remove_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<RemoveRequest>,
) -> Reply {
    let mut service = db.write().await;
    let account = service
        .accounts
        .get(&input.email)
        .filter(|account| account.password == input.password)
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "invalid credentials"))?;
    let puid = headers.get(PUID_HEADER).and_then(|value| value.to_str().ok());
    if puid != account.id() {
        return Err(reject(StatusCode::CONFLICT, "puid does not match account"));
    }
    service.accounts.remove(&input.email);
    service.sessions.retain(|_, email| *email != input.email);
    Ok(Json(json!({})))
}

async fn get_me(State(db): State<Db>, headers: HeaderMap) -> Reply {
    let mut service = db.write().await;
    let account = service.account_mut(&headers)?;
    Ok(Json(Value::Object(account.profile.clone())))
}

async fn put_me(State(db): State<Db>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut service = db.write().await;
    let account = service.account_mut(&headers)?;
    let Value::Object(profile) = body else {
        return Err(reject(StatusCode::BAD_REQUEST, "expected an object"));
    };
    if profile.get("id").and_then(Value::as_str) != account.id() {
        return Err(reject(StatusCode::CONFLICT, "id does not match account"));
    }
    account.profile = profile;
    Ok(Json(Value::Object(account.profile.clone())))
}

// --- tasks & categories ---

#[derive(Clone, Copy)]
enum Kind {
    Task,
    Category,
}

impl Kind {
    fn items(self, account: &mut Account) -> &mut Vec<Value> {
        match self {
            Kind::Task => &mut account.tasks,
            Kind::Category => &mut account.categories,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    include_deleted: Option<String>,
    include_done: Option<String>,
}

fn param_is_true(value: &Option<String>) -> bool {
    value.as_deref() == Some("true")
}

fn is_deleted(item: &Value) -> bool {
    item["isDeleted"] == true || item["status"] == "DELETED"
}

async fn list_tasks(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Reply {
    let mut service = db.write().await;
    let account = service.account_mut(&headers)?;
    let include_deleted = param_is_true(&params.include_deleted);
    let include_done = param_is_true(&params.include_done);
    let tasks: Vec<Value> = account
        .tasks
        .iter()
        .filter(|task| include_deleted || !is_deleted(task))
        .filter(|task| include_done || task["status"] != "DONE")
        .cloned()
        .collect();
    Ok(Json(Value::Array(tasks)))
}

async fn list_categories(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Reply {
    let mut service = db.write().await;
    let account = service.account_mut(&headers)?;
    let include_deleted = param_is_true(&params.include_deleted);
    let categories: Vec<Value> = account
        .categories
        .iter()
        .filter(|category| include_deleted || !is_deleted(category))
        .cloned()
        .collect();
    Ok(Json(Value::Array(categories)))
}

async fn upsert(db: Db, headers: HeaderMap, kind: Kind, id: String, body: Value) -> Reply {
    let mut service = db.write().await;
    let account = service.account_mut(&headers)?;
    if !body.is_object() {
        return Err(reject(StatusCode::BAD_REQUEST, "expected an object"));
    }
    if body["id"] != id.as_str() {
        return Err(reject(StatusCode::BAD_REQUEST, "id does not match path"));
    }
    let items = kind.items(account);
    match items.iter_mut().find(|item| item["id"] == id.as_str()) {
        Some(existing) => *existing = body.clone(),
        None => items.push(body.clone()),
    }
    Ok(Json(body))
}

async fn remove(db: Db, headers: HeaderMap, kind: Kind, id: String) -> Reply {
    let mut service = db.write().await;
    let account = service.account_mut(&headers)?;
    let item = kind
        .items(account)
        .iter_mut()
        .find(|item| item["id"] == id.as_str())
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "no such item"))?;
    if is_deleted(item) {
        return Err(reject(StatusCode::CONFLICT, "already deleted"));
    }
    if item["isDefault"] == true {
        return Err(reject(StatusCode::BAD_REQUEST, "cannot delete the default category"));
    }
    item["isDeleted"] = json!(true);
    if let Kind::Task = kind {
        item["status"] = json!("DELETED");
    }
    Ok(Json(json!({})))
}

async fn put_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    upsert(db, headers, Kind::Task, id, body).await
}

async fn delete_task(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    remove(db, headers, Kind::Task, id).await
}

async fn put_category(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    upsert(db, headers, Kind::Category, id, body).await
}

async fn delete_category(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    remove(db, headers, Kind::Category, id).await
}

// --- pending shares ---

async fn list_pending(State(db): State<Db>, headers: HeaderMap) -> Reply {
    let mut service = db.write().await;
    let account = service.account_mut(&headers)?;
    Ok(Json(json!({ "pendingTasks": account.pending })))
}

async fn accept_pending(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut service = db.write().await;
    let account = service.account_mut(&headers)?;
    let pending = account
        .pending
        .as_mut()
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "no pending tasks"))?;
    let position = pending
        .iter()
        .position(|share| share["id"] == id.as_str())
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "no such pending task"))?;
    let mut task = pending.remove(position);
    if pending.is_empty() {
        account.pending = None;
    }
    task["status"] = json!("UNCHECKED");
    task["isDeleted"] = json!(false);
    account.tasks.push(task);
    Ok(Json(json!({ "id": id, "accepted": true })))
}
