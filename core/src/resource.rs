//! Lifecycle operations shared by every server-backed resource.
//!
//! # Design
//! Concrete resources (`User`, `Task`, `Category`) only describe how to
//! reach them: which record they wrap, which session they talk through and
//! what their save and destroy requests look like. Field access, dirty
//! tracking and the save/destroy round-trips live here once.

use serde_json::Value;
use tracing::debug;

use crate::error::{check_status, Result};
use crate::http::HttpRequest;
use crate::record::Record;
use crate::session::Session;

pub trait Resource: Sized {
    fn record(&self) -> &Record;

    fn record_mut(&mut self) -> &mut Record;

    fn session(&self) -> &Session;

    /// The PUT that pushes the full field mapping to the canonical endpoint.
    fn save_request(&self) -> Result<HttpRequest>;

    /// The DELETE that removes the resource remotely.
    fn destroy_request(&self) -> Result<HttpRequest>;

    fn get(&self, field: &str) -> Result<&Value> {
        self.record().get(field)
    }

    fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.record_mut().set(field, value)
    }

    fn is_dirty(&self) -> bool {
        self.record().is_dirty()
    }

    fn id(&self) -> Result<String> {
        self.record().id()
    }

    /// Push local changes. A clean record costs no request; a dirty one
    /// costs exactly one PUT. On failure the record stays dirty so the call
    /// can be repeated.
    fn save(&mut self) -> Result<&mut Self> {
        if !self.is_dirty() {
            debug!("record is clean, skipping save");
            return Ok(self);
        }
        let request = self.save_request()?;
        let response = self.session().send(request)?;
        check_status(&response)?;
        self.record_mut().mark_clean();
        Ok(self)
    }

    /// Remove the resource remotely. Local state, including any collection
    /// that still holds this resource, is left for the caller to update.
    fn destroy(&self) -> Result<&Self> {
        let request = self.destroy_request()?;
        let response = self.session().send(request)?;
        check_status(&response)?;
        Ok(self)
    }
}
