//! Task resource.

use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::filter::{self, STATUS_CHECKED, STATUS_DONE, STATUS_FIELD};
use crate::http::HttpRequest;
use crate::record::Record;
use crate::resource::Resource;
use crate::session::Session;

/// One task of a user. Holds the owning user's id as a lookup relation and
/// reaches the service through the user's shared session.
#[derive(Debug, Clone)]
pub struct Task {
    record: Record,
    session: Rc<Session>,
    owner_id: String,
}

impl Task {
    /// Build a task locally, before the server has seen it. An `id` is
    /// generated when `fields` lacks one. The task starts dirty so its first
    /// `save()` creates it remotely.
    pub fn new(
        session: Rc<Session>,
        owner_id: impl Into<String>,
        fields: Map<String, Value>,
    ) -> Self {
        Self::from_record(session, owner_id, Record::new_local(fields))
    }

    pub fn from_record(session: Rc<Session>, owner_id: impl Into<String>, record: Record) -> Self {
        Self {
            record,
            session,
            owner_id: owner_id.into(),
        }
    }

    pub fn from_value(session: Rc<Session>, owner_id: &str, value: Value) -> Result<Self> {
        Ok(Self::from_record(session, owner_id, Record::from_value(value)?))
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn title(&self) -> Option<&str> {
        self.record.str_field("title")
    }

    pub fn status(&self) -> Option<&str> {
        self.record.str_field(STATUS_FIELD)
    }

    pub fn is_deleted(&self) -> bool {
        filter::is_deleted(&self.record)
    }

    pub fn is_done(&self) -> bool {
        self.status() == Some(STATUS_DONE)
    }

    pub fn is_checked(&self) -> bool {
        self.status() == Some(STATUS_CHECKED)
    }
}

impl Resource for Task {
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
        let url = self.session.endpoints().task(&self.record.id()?);
        HttpRequest::put(url).json_body(&self.record)
    }

    fn destroy_request(&self) -> Result<HttpRequest> {
        let url = self.session.endpoints().task(&self.record.id()?);
        Ok(HttpRequest::delete(url))
    }
}
