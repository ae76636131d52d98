//! Error types for the calbot core.

use thiserror::Error;

/// No date or time could be extracted from user text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no date or time could be read from {0:?}")]
pub struct InvalidDate(pub String);

/// A user-supplied event position did not resolve against the snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("position {0:?} is not a number")]
    NotANumber(String),

    #[error("position {0} is outside the event list")]
    OutOfRange(i64),
}

/// Failure reported by the remote calendar service.
///
/// These are the only errors the resolver lets escape to its caller;
/// everything else is rendered as corrective reply text.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    #[error("calendar service returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("could not reach the calendar service: {0}")]
    Network(String),

    #[error("unexpected reply from the calendar service: {0}")]
    Decode(String),
}
