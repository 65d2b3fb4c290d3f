//! Lazily loaded, refreshable per-owner cache.
//!
//! A `Collection` is either unloaded or holds the sequence from the last
//! fetch plus anything added locally since. Fetching happens only on first
//! access or when the caller asks for a refresh, and a refresh replaces the
//! whole sequence. A failed fetch leaves the previous contents in place.

use serde_json::Value;
use tracing::debug;

use crate::error::{check_status, Result};
use crate::filter::RecordFilter;
use crate::http::{HttpRequest, HttpResponse};
use crate::record::Record;

/// Either nothing fetched yet, or the last fetched sequence plus local
/// additions.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CacheState<T> {
    #[default]
    Unloaded,
    Loaded(Vec<T>),
}

#[derive(Debug, Clone)]
pub struct Collection<T> {
    state: CacheState<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            state: CacheState::Unloaded,
        }
    }
}

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CacheState<T> {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, CacheState::Loaded(_))
    }

    /// Return the cached sequence, calling `fetch` first when the cache is
    /// unloaded or `refresh` is set.
    pub fn load_with<F>(&mut self, refresh: bool, fetch: F) -> Result<&mut Vec<T>>
    where
        F: FnOnce() -> Result<Vec<T>>,
    {
        if refresh || !self.is_loaded() {
            let items = fetch()?;
            debug!(count = items.len(), refresh, "collection loaded");
            self.state = CacheState::Loaded(items);
        }
        Ok(self.loaded_mut())
    }

    /// Append without touching the network. An unloaded cache becomes a
    /// one-element cache.
    pub fn add(&mut self, item: T) {
        self.loaded_mut().push(item);
    }

    pub fn items(&self) -> Option<&[T]> {
        match &self.state {
            CacheState::Loaded(items) => Some(items),
            CacheState::Unloaded => None,
        }
    }

    fn loaded_mut(&mut self) -> &mut Vec<T> {
        match self.state {
            CacheState::Loaded(ref mut items) => items,
            CacheState::Unloaded => {
                self.state = CacheState::Loaded(Vec::new());
                self.loaded_mut()
            }
        }
    }
}

/// GET for a collection endpoint, carrying the filter's native flags and
/// asking for a compressed transfer.
pub fn build_list_request(url: String, filter: &impl RecordFilter) -> HttpRequest {
    let mut request = HttpRequest::get(url).compressed();
    request.query = filter.params();
    request
}

/// Parse a collection response: a bare JSON array of objects.
pub fn parse_records(response: &HttpResponse) -> Result<Vec<Record>> {
    check_status(response)?;
    let values: Vec<Value> = response.json()?;
    values.into_iter().map(Record::from_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ErrorKind, TransportError};
    use crate::filter::{CategoryQuery, TaskQuery};
    use std::cell::Cell;

    #[test]
    fn first_access_fetches_once() {
        let calls = Cell::new(0);
        let mut c: Collection<u32> = Collection::new();
        assert_eq!(c.state(), &CacheState::Unloaded);

        let fetch = || {
            calls.set(calls.get() + 1);
            Ok(vec![1, 2])
        };
        assert_eq!(c.load_with(false, fetch).unwrap(), &vec![1, 2]);
        assert_eq!(c.load_with(false, fetch).unwrap(), &vec![1, 2]);
        assert_eq!(calls.get(), 1);
        assert!(c.is_loaded());
        assert_eq!(c.state(), &CacheState::Loaded(vec![1, 2]));
    }

    #[test]
    fn refresh_replaces_contents() {
        let mut c = Collection::new();
        c.load_with(false, || Ok(vec![1])).unwrap();
        c.add(5);
        let items = c.load_with(true, || Ok(vec![7, 8])).unwrap();
        assert_eq!(items, &vec![7, 8]);
    }

    #[test]
    fn add_initializes_unloaded_cache() {
        let mut c = Collection::new();
        c.add("a");
        assert!(c.is_loaded());
        assert_eq!(c.items(), Some(&["a"][..]));
        // A locally initialized cache counts as loaded: no fetch.
        let items = c
            .load_with(false, || panic!("must not fetch"))
            .unwrap();
        assert_eq!(items, &vec!["a"]);
    }

    #[test]
    fn failed_refresh_keeps_previous_contents() {
        let mut c = Collection::new();
        c.load_with(false, || Ok(vec![1, 2])).unwrap();
        let err = c
            .load_with(true, || Err(TransportError::Io("down".into()).into()))
            .unwrap_err();
        assert!(matches!(err, ApiError::InternalServiceError(_)));
        assert_eq!(c.items(), Some(&[1, 2][..]));
    }

    #[test]
    fn failed_first_load_stays_unloaded() {
        let mut c: Collection<u8> = Collection::new();
        assert!(c
            .load_with(false, || Err(TransportError::Io("down".into()).into()))
            .is_err());
        assert_eq!(c.state(), &CacheState::Unloaded);
    }

    #[test]
    fn list_request_carries_native_flags() {
        let query = TaskQuery {
            include_done: true,
            ..TaskQuery::default()
        };
        let request = build_list_request("http://test/me/tasks".into(), &query);
        assert_eq!(request.url, "http://test/me/tasks");
        assert_eq!(request.header_value("Accept-Encoding"), Some("gzip"));
        assert_eq!(request.header_value("Content-Type"), Some("application/json"));
        assert_eq!(request.query_value("includeDeleted"), Some("false"));
        assert_eq!(request.query_value("includeDone"), Some("true"));

        let request = build_list_request("http://test/me/categories".into(), &CategoryQuery::default());
        assert_eq!(request.query.len(), 1);
    }

    #[test]
    fn parse_records_reads_bare_array() {
        let response = HttpResponse::new(200, r#"[{"id":"1"},{"id":"2"}]"#);
        let records = parse_records(&response).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id().unwrap(), "2");
    }

    #[test]
    fn parse_records_rejects_non_objects() {
        let response = HttpResponse::new(200, r#"[{"id":"1"}, 3]"#);
        assert_eq!(parse_records(&response).unwrap_err().kind(), ErrorKind::Deserialization);
    }

    #[test]
    fn parse_records_classifies_failures() {
        let response = HttpResponse::new(500, "oops");
        assert_eq!(
            parse_records(&response).unwrap_err().kind(),
            ErrorKind::InternalServiceError
        );
    }
}
