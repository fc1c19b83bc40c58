//! In-session history of executed test requests

use chrono::{DateTime, Utc};
use openapi_parser::HttpMethod;
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

/// Number of requests kept
pub const HISTORY_LIMIT: usize = 10;

/// One executed request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub method: HttpMethod,
    pub url: String,
    /// Absent when the request never got a response
    pub status: Option<u16>,
    pub response_time_ms: Option<u64>,
}

impl HistoryEntry {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            method,
            url: url.into(),
            status: None,
            response_time_ms: None,
        }
    }

    pub fn with_response(mut self, status: u16, response_time_ms: u64) -> Self {
        self.status = Some(status);
        self.response_time_ms = Some(response_time_ms);
        self
    }
}

/// The most recent requests, newest first. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct RequestHistory {
    entries: VecDeque<HistoryEntry>,
}

impl RequestHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(HISTORY_LIMIT);
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
