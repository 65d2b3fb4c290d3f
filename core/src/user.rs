//! User resource: the root of a session's resource graph.
//!
//! # Design
//! A `User` owns its task, category and pending-share caches. Children get
//! a clone of the user's `Rc<Session>` and the user's id, which is all they
//! need to reach the service; they never point back at the `User` value
//! itself, so the graph has no cycles.

use std::rc::Rc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::category::Category;
use crate::collection::{build_list_request, parse_records, Collection};
use crate::config::ClientConfig;
use crate::error::{check_status, ApiError, Result};
use crate::filter::{CategoryQuery, RecordFilter, TaskQuery};
use crate::http::{HttpRequest, Transport};
use crate::pending::{self, PendingShare};
use crate::record::Record;
use crate::resource::Resource;
use crate::session::Session;
use crate::task::Task;

/// Header naming the account a removal request targets.
pub const PUID_HEADER: &str = "AnyDO-Puid";

/// Registration input for `User::create`.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to `[email]`.
    pub emails: Option<Vec<String>>,
    pub phone_numbers: Vec<String>,
}

impl NewUser {
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            emails: None,
            phone_numbers: Vec::new(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ApiError::MissingArgument("name"));
        }
        if self.email.trim().is_empty() {
            return Err(ApiError::MissingArgument("email"));
        }
        if self.password.is_empty() {
            return Err(ApiError::MissingArgument("password"));
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    name: &'a str,
    username: &'a str,
    password: &'a str,
    emails: Vec<String>,
    phone_numbers: &'a [String],
}

#[derive(Serialize)]
struct RemoveBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug)]
pub struct User {
    record: Record,
    session: Rc<Session>,
    tasks: Collection<Task>,
    categories: Collection<Category>,
    pending: Collection<PendingShare>,
}

impl User {
    pub fn from_record(session: Rc<Session>, record: Record) -> Self {
        Self {
            record,
            session,
            tasks: Collection::new(),
            categories: Collection::new(),
            pending: Collection::new(),
        }
    }

    /// Fetch the authenticated user.
    pub fn fetch(session: Rc<Session>) -> Result<Self> {
        let response = session.send(HttpRequest::get(session.endpoints().me()))?;
        check_status(&response)?;
        let record = Record::from_value(response.json()?)?;
        Ok(Self::from_record(session, record))
    }

    /// Register a new account, then log in as it and return the user as the
    /// server reports it. The registration response is not used as the
    /// record: the server may normalize what it stored.
    pub fn create(
        transport: Rc<dyn Transport>,
        config: &ClientConfig,
        new_user: NewUser,
    ) -> Result<Self> {
        new_user.validate()?;

        let NewUser {
            name,
            email,
            password,
            emails,
            phone_numbers,
        } = new_user;
        let body = RegisterBody {
            name: &name,
            username: &email,
            password: &password,
            emails: emails.unwrap_or_else(|| vec![email.clone()]),
            phone_numbers: &phone_numbers,
        };

        let anonymous = Session::anonymous(Rc::clone(&transport), config);
        let request = HttpRequest::post(anonymous.endpoints().user()).json_body(&body)?;
        let response = anonymous.send(request)?;
        check_status(&response)?;
        info!(email = %email, "account registered");

        let session = Session::login(transport, config, &email, &password)?;
        Self::fetch(Rc::new(session))
    }

    /// Id handed to children as their owner. Listing does not need it, so
    /// a record without one yields an empty owner instead of an error.
    fn owner_id(&self) -> String {
        self.record.id().unwrap_or_default()
    }

    pub fn email(&self) -> Option<&str> {
        self.record.str_field("email")
    }

    pub fn name(&self) -> Option<&str> {
        self.record.str_field("name")
    }

    /// Tasks matching `query`. The first call (or one with `refresh`) fetches
    /// from the server; later calls filter the cached sequence.
    pub fn tasks(&mut self, query: &TaskQuery) -> Result<Vec<&mut Task>> {
        let owner_id = self.owner_id();
        let session = &self.session;
        let tasks = self.tasks.load_with(query.refresh, || {
            let request = build_list_request(session.endpoints().tasks(), query);
            let response = session.send(request)?;
            let records = parse_records(&response)?;
            Ok(records
                .into_iter()
                .map(|record| Task::from_record(Rc::clone(session), owner_id.as_str(), record))
                .collect())
        })?;
        Ok(tasks
            .iter_mut()
            .filter(|task| query.matches(task.record()))
            .collect())
    }

    /// Categories matching `query`; cached like `tasks`.
    pub fn categories(&mut self, query: &CategoryQuery) -> Result<Vec<&mut Category>> {
        let owner_id = self.owner_id();
        let session = &self.session;
        let categories = self.categories.load_with(query.refresh, || {
            let request = build_list_request(session.endpoints().categories(), query);
            let response = session.send(request)?;
            let records = parse_records(&response)?;
            Ok(records
                .into_iter()
                .map(|record| Category::from_record(Rc::clone(session), owner_id.as_str(), record))
                .collect())
        })?;
        Ok(categories
            .iter_mut()
            .filter(|category| query.matches(category.record()))
            .collect())
    }

    /// Cache a task created locally. No request is made.
    pub fn add_task(&mut self, task: Task) {
        self.tasks.add(task);
    }

    /// Cache a category created locally. No request is made.
    pub fn add_category(&mut self, category: Category) {
        self.categories.add(category);
    }

    /// A new local task owned by this user, not yet cached or saved.
    pub fn new_task(&self, fields: Map<String, Value>) -> Result<Task> {
        Ok(Task::new(Rc::clone(&self.session), self.record.id()?, fields))
    }

    /// A new local category owned by this user, not yet cached or saved.
    pub fn new_category(&self, fields: Map<String, Value>) -> Result<Category> {
        Ok(Category::new(
            Rc::clone(&self.session),
            self.record.id()?,
            fields,
        ))
    }

    /// The first live category flagged as default, if any.
    pub fn default_category(&mut self) -> Result<Option<&mut Category>> {
        Ok(self
            .categories(&CategoryQuery::default())?
            .into_iter()
            .find(|category| category.is_default()))
    }

    /// Share invitations waiting for this user. Cached like `tasks`.
    pub fn pending_tasks(&mut self, refresh: bool) -> Result<&[PendingShare]> {
        let session = &self.session;
        let shares = self.pending.load_with(refresh, || {
            let response = session.send(pending::build_list_pending(session))?;
            pending::parse_list_pending(&response)
        })?;
        Ok(shares.as_slice())
    }

    pub fn pending_task_ids(&mut self, refresh: bool) -> Result<Vec<String>> {
        Ok(self
            .pending_tasks(refresh)?
            .iter()
            .map(|share| share.id().to_string())
            .collect())
    }

    /// Accept a share invitation and return the server's acknowledgement.
    /// The pending cache is left as is; refresh `pending_tasks` to see the
    /// invitation disappear.
    pub fn approve_pending_task(&self, pending_task_id: &str) -> Result<Value> {
        let request = pending::build_approve(&self.session, pending_task_id)?;
        let response = self.session.send(request)?;
        let ack = pending::parse_approve(&response)?;
        debug!(pending_task_id, "pending task approved");
        Ok(ack)
    }
}

impl Resource for User {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    fn session(&self) -> &Session {
        &self.session
    }

    fn save_request(&self) -> Result<HttpRequest> {
        HttpRequest::put(self.session.endpoints().me()).json_body(&self.record)
    }

    /// Account removal must present the account's credentials again. They
    /// come from the session when it was established by login, otherwise
    /// from the record's own `email`/`password` fields.
    fn destroy_request(&self) -> Result<HttpRequest> {
        let (email, password) = match self.session.credentials() {
            Some(credentials) => (credentials.email.clone(), credentials.password.clone()),
            None => (
                self.record
                    .str_field("email")
                    .ok_or(ApiError::MissingArgument("email"))?
                    .to_string(),
                self.record
                    .str_field("password")
                    .ok_or(ApiError::MissingArgument("password"))?
                    .to_string(),
            ),
        };
        HttpRequest::delete(self.session.endpoints().user())
            .header(PUID_HEADER, self.record.id()?)
            .json_body(&RemoveBody {
                email: &email,
                password: &password,
            })
    }
}
