//! The remote calendar collaborator boundary.
//!
//! The core never speaks HTTP itself; everything crossing this seam is one
//! of the serde types here, and the transport lives behind
//! `RemoteEventSource`. Field names follow the remote service's JSON.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::event::Instant;

/// Start/end descriptor on the wire: a bare `YYYY-MM-DD` date or a full
/// `YYYY-MM-DDTHH:MM:SSZ` timestamp, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(
        default,
        rename = "dateTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_time: Option<String>,
}

/// One event row as the remote service reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub start: RawTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Fields for an event that does not exist remotely yet.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub title: String,
    pub start: Instant,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Partial update: `None` fields are left untouched both remotely and in
/// the cache, never cleared.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start: Option<Instant>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.start.is_none()
            && self.location.is_none()
            && self.description.is_none()
    }
}

/// The remote calendar service, as far as the core is concerned.
///
/// `list` returns rows starting at or after `not_before`, ordered by start
/// time. `create` returns the identifier the remote side assigned. Every
/// failure surfaces as a `SourceError`; implementations must not partially
/// apply a call.
#[async_trait]
pub trait RemoteEventSource: Send + Sync {
    async fn list(
        &self,
        calendar_id: &str,
        not_before: NaiveDateTime,
    ) -> Result<Vec<RawEvent>, SourceError>;

    async fn create(&self, calendar_id: &str, draft: &EventDraft) -> Result<String, SourceError>;

    async fn patch(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<(), SourceError>;

    async fn delete(&self, calendar_id: &str, event_id: &str) -> Result<(), SourceError>;
}
