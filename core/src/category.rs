//! Category resource.

use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::filter::{DEFAULT_FLAG, DELETED_FLAG};
use crate::http::HttpRequest;
use crate::record::Record;
use crate::resource::Resource;
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct Category {
    record: Record,
    session: Rc<Session>,
    owner_id: String,
}

impl Category {
    /// Build a category locally; see `Task::new`.
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

    pub fn name(&self) -> Option<&str> {
        self.record.str_field("name")
    }

    pub fn is_default(&self) -> bool {
        self.record.flag(DEFAULT_FLAG)
    }

    pub fn is_deleted(&self) -> bool {
        self.record.flag(DELETED_FLAG)
    }
}

impl Resource for Category {
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
        let url = self.session.endpoints().category(&self.record.id()?);
        HttpRequest::put(url).json_body(&self.record)
    }

    fn destroy_request(&self) -> Result<HttpRequest> {
        let url = self.session.endpoints().category(&self.record.id()?);
        Ok(HttpRequest::delete(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::http::HttpMethod;
    use crate::test_support::{session, ScriptedTransport};
    use serde_json::json;

    fn category(transport: &Rc<ScriptedTransport>) -> Category {
        Category::from_value(
            session(transport),
            "u1",
            json!({"id": "c1", "name": "Personal", "isDefault": true, "isDeleted": false}),
        )
        .unwrap()
    }

    #[test]
    fn save_puts_to_category_url() {
        let transport = ScriptedTransport::new();
        transport.respond(200, json!({}));
        let mut cat = category(&transport);

        cat.set("name", "Work").unwrap();
        cat.save().unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(request.url, "http://test/me/categories/c1");
        assert!(!cat.is_dirty());
        assert_eq!(cat.name(), Some("Work"));
    }

    #[test]
    fn renaming_to_same_name_skips_the_network() {
        let transport = ScriptedTransport::new();
        let mut cat = category(&transport);
        cat.set("name", "Personal").unwrap();
        cat.save().unwrap();
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn destroy_bad_request_carries_body() {
        let transport = ScriptedTransport::new();
        transport.respond(400, json!({"error": "default category"}));
        let cat = category(&transport);
        let err = cat.destroy().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(err.body().unwrap().contains("default category"));
    }

    #[test]
    fn flags() {
        let transport = ScriptedTransport::new();
        let cat = category(&transport);
        assert!(cat.is_default());
        assert!(!cat.is_deleted());
        assert_eq!(cat.owner_id(), "u1");
    }
}
