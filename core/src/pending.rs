//! Inbound task shares awaiting approval.
//!
//! The pending endpoint wraps its list in a `pendingTasks` field. A null or
//! missing field means there is nothing to approve and yields an empty list;
//! a failed request is an error. The two are never conflated.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{check_status, ApiError, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::session::Session;

/// A read-only share invitation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PendingShare {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl PendingShare {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingEnvelope {
    #[serde(default)]
    pending_tasks: Option<Vec<PendingShare>>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "pending share id must be a string or number, got {other}"
        ))),
    }
}

pub fn build_list_pending(session: &Session) -> HttpRequest {
    HttpRequest::get(session.endpoints().pending())
        .header("Accept", "application/json")
        .compressed()
}

pub fn parse_list_pending(response: &HttpResponse) -> Result<Vec<PendingShare>> {
    check_status(response)?;
    let envelope: Option<PendingEnvelope> = response.json()?;
    Ok(envelope
        .and_then(|envelope| envelope.pending_tasks)
        .unwrap_or_default())
}

pub fn build_approve(session: &Session, id: &str) -> Result<HttpRequest> {
    if id.is_empty() {
        return Err(ApiError::MissingArgument("pending_task_id"));
    }
    Ok(HttpRequest::post(session.endpoints().accept_pending(id))
        .header("Accept", "application/json")
        .compressed())
}

/// The acknowledgement body, verbatim.
pub fn parse_approve(response: &HttpResponse) -> Result<Value> {
    check_status(response)?;
    response.json()
}
