//! The per-calendar event cache.
//!
//! One `Calendar` holds one time-ordered snapshot of upcoming events and
//! resolves the 1-based positions users see in `list` output. The snapshot
//! loads lazily and is never refreshed behind the caller's back: numbers
//! handed out stay valid until a mutation or an explicit sync, at the
//! price of drifting from the remote truth in between. That staleness is
//! the contract, not an accident.

use std::sync::Arc;

use chrono::Local;
use tracing::warn;

use crate::error::{PositionError, SourceError};
use crate::event::Event;
use crate::source::{EventDraft, EventPatch, RemoteEventSource};

pub struct Calendar {
    id: String,
    source: Arc<dyn RemoteEventSource>,
    events: Option<Vec<Event>>,
}

impl Calendar {
    pub fn new(source: Arc<dyn RemoteEventSource>, id: impl Into<String>) -> Calendar {
        Calendar {
            id: id.into(),
            source,
            events: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Events in the current snapshot; empty when never loaded.
    pub fn events(&self) -> &[Event] {
        self.events.as_deref().unwrap_or(&[])
    }

    pub fn is_loaded(&self) -> bool {
        self.events.is_some()
    }

    /// Replace the whole snapshot with the remote state from this moment
    /// on. On failure the previous snapshot stays as it was.
    pub async fn sync(&mut self) -> Result<(), SourceError> {
        let now = Local::now().naive_local();
        let rows = self.source.list(&self.id, now).await?;
        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match Event::from_raw(row) {
                Some(event) => events.push(event),
                None => warn!(calendar = %self.id, event = %id, "skipping row without a readable start"),
            }
        }
        events.sort_by_key(|e| e.start.sort_key());
        self.events = Some(events);
        Ok(())
    }

    /// Load the snapshot the first time it is needed, then keep it.
    pub async fn ensure_loaded(&mut self) -> Result<(), SourceError> {
        if self.events.is_none() {
            self.sync().await?;
        }
        Ok(())
    }

    /// Resolve a user-facing 1-based position against the snapshot.
    pub fn resolve(&self, pos: &str) -> Result<usize, PositionError> {
        let n: i64 = pos
            .trim()
            .parse()
            .map_err(|_| PositionError::NotANumber(pos.to_string()))?;
        if n < 1 || n > self.events().len() as i64 {
            return Err(PositionError::OutOfRange(n));
        }
        Ok((n - 1) as usize)
    }

    /// Create the event remotely, then slot it into the snapshot without a
    /// re-sync. A snapshot that was never loaded stays unloaded; the next
    /// read syncs and picks the event up from the remote side anyway.
    pub async fn create(&mut self, draft: &EventDraft) -> Result<Event, SourceError> {
        let id = self.source.create(&self.id, draft).await?;
        let event = Event {
            id,
            title: draft.title.clone(),
            start: draft.start,
            location: draft.location.clone(),
            description: draft.description.clone(),
        };
        self.insert(event.clone());
        Ok(event)
    }

    /// Patch the event remotely, then update the cached entry in place.
    pub async fn patch(&mut self, index: usize, patch: &EventPatch) -> Result<(), SourceError> {
        let id = self.events()[index].id.clone();
        self.source.patch(&self.id, &id, patch).await?;
        self.apply_patch(index, patch);
        Ok(())
    }

    /// Delete the event remotely, then drop it from the snapshot.
    pub async fn delete(&mut self, index: usize) -> Result<Event, SourceError> {
        let event = self.events()[index].clone();
        self.source.delete(&self.id, &event.id).await?;
        if let Some(events) = &mut self.events {
            events.remove(index);
        }
        Ok(event)
    }

    fn insert(&mut self, event: Event) {
        if let Some(events) = &mut self.events {
            let at = events.partition_point(|e| e.start.sort_key() <= event.start.sort_key());
            events.insert(at, event);
        }
    }

    /// Only the fields present in the patch change; a moved start re-sorts
    /// the snapshot so positions keep matching the ordering.
    fn apply_patch(&mut self, index: usize, patch: &EventPatch) {
        let Some(events) = &mut self.events else {
            return;
        };
        let Some(event) = events.get_mut(index) else {
            return;
        };
        if let Some(title) = &patch.title {
            event.title = title.clone();
        }
        if let Some(location) = &patch.location {
            event.location = Some(location.clone());
        }
        if let Some(description) = &patch.description {
            event.description = Some(description.clone());
        }
        if let Some(start) = patch.start {
            event.start = start;
            events.sort_by_key(|e| e.start.sort_key());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Instant;
    use crate::source::{RawEvent, RawTime};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDateTime};
    use std::sync::Mutex;

    struct StubSource {
        rows: Mutex<Vec<RawEvent>>,
    }

    impl StubSource {
        fn new(rows: Vec<RawEvent>) -> Arc<StubSource> {
            Arc::new(StubSource {
                rows: Mutex::new(rows),
            })
        }

        fn set_rows(&self, rows: Vec<RawEvent>) {
            *self.rows.lock().unwrap() = rows;
        }
    }

    #[async_trait]
    impl RemoteEventSource for StubSource {
        async fn list(
            &self,
            _calendar_id: &str,
            _not_before: NaiveDateTime,
        ) -> Result<Vec<RawEvent>, SourceError> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn create(
            &self,
            _calendar_id: &str,
            draft: &EventDraft,
        ) -> Result<String, SourceError> {
            Ok(format!("id-{}", draft.title))
        }

        async fn patch(
            &self,
            _calendar_id: &str,
            _event_id: &str,
            _patch: &EventPatch,
        ) -> Result<(), SourceError> {
            Ok(())
        }

        async fn delete(&self, _calendar_id: &str, _event_id: &str) -> Result<(), SourceError> {
            Ok(())
        }
    }

    fn row(id: &str, title: &str, days_out: i64) -> RawEvent {
        let start = chrono::Local::now().naive_local() + Duration::days(days_out);
        RawEvent {
            id: id.to_string(),
            summary: title.to_string(),
            start: Instant::DateTime(start).to_raw(),
            location: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn sync_sorts_and_skips_unreadable_rows() {
        let broken = RawEvent {
            id: "broken".to_string(),
            summary: "No start".to_string(),
            start: RawTime::default(),
            location: None,
            description: None,
        };
        let source = StubSource::new(vec![row("c", "C", 30), broken, row("a", "A", 10)]);
        let mut cal = Calendar::new(source, "primary");

        cal.sync().await.unwrap();

        let ids: Vec<&str> = cal.events().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[tokio::test]
    async fn sync_replaces_the_snapshot_entirely() {
        let source = StubSource::new(vec![row("a", "A", 10)]);
        let mut cal = Calendar::new(source.clone(), "primary");
        cal.sync().await.unwrap();

        source.set_rows(vec![row("b", "B", 5)]);
        cal.sync().await.unwrap();

        let ids: Vec<&str> = cal.events().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["b"]);
    }

    #[tokio::test]
    async fn resolve_rejects_bad_positions() {
        let source = StubSource::new(vec![row("a", "A", 10)]);
        let mut cal = Calendar::new(source, "primary");
        cal.sync().await.unwrap();

        assert!(matches!(
            cal.resolve("first"),
            Err(PositionError::NotANumber(_))
        ));
        assert!(matches!(cal.resolve("0"), Err(PositionError::OutOfRange(0))));
        assert!(matches!(cal.resolve("2"), Err(PositionError::OutOfRange(2))));
        assert_eq!(cal.resolve("1").unwrap(), 0);
        assert_eq!(cal.resolve(" 1 ").unwrap(), 0);
    }

    #[tokio::test]
    async fn create_keeps_the_snapshot_ordered() {
        let source = StubSource::new(vec![row("a", "A", 10), row("c", "C", 30)]);
        let mut cal = Calendar::new(source, "primary");
        cal.sync().await.unwrap();

        let start = chrono::Local::now().naive_local() + Duration::days(20);
        cal.create(&EventDraft {
            title: "B".to_string(),
            start: Instant::DateTime(start),
            location: None,
            description: None,
        })
        .await
        .unwrap();

        let titles: Vec<&str> = cal.events().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn create_before_first_load_leaves_the_snapshot_unloaded() {
        let source = StubSource::new(vec![]);
        let mut cal = Calendar::new(source, "primary");

        let start = chrono::Local::now().naive_local() + Duration::days(1);
        cal.create(&EventDraft {
            title: "B".to_string(),
            start: Instant::DateTime(start),
            location: None,
            description: None,
        })
        .await
        .unwrap();

        assert!(!cal.is_loaded());
    }

    #[tokio::test]
    async fn patch_that_moves_the_start_re_sorts() {
        let source = StubSource::new(vec![row("a", "A", 2), row("b", "B", 5)]);
        let mut cal = Calendar::new(source, "primary");
        cal.sync().await.unwrap();

        let moved = chrono::Local::now().naive_local() + Duration::days(10);
        cal.patch(
            0,
            &EventPatch {
                start: Some(Instant::DateTime(moved)),
                ..EventPatch::default()
            },
        )
        .await
        .unwrap();

        let ids: Vec<&str> = cal.events().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }
}
