//! Core of the calbot conversational calendar layer.
//!
//! This crate provides the stateful middle of the system:
//! - `event`: the `Instant` and `Event` entities and their wire mapping
//! - `source`: the `RemoteEventSource` collaborator boundary
//! - `dates`: loose date parsing and relative date rendering
//! - `calendar`: the per-calendar snapshot with 1-based positions
//! - `responder`: the command-facing resolver producing reply text

pub mod calendar;
pub mod dates;
pub mod error;
pub mod event;
pub mod responder;
pub mod source;

// Re-export the types the host layer works with at crate root.
pub use calendar::Calendar;
pub use error::{InvalidDate, PositionError, SourceError};
pub use event::{Event, Instant};
pub use responder::Responder;
pub use source::{EventDraft, EventPatch, RawEvent, RawTime, RemoteEventSource};
