//! Per-calendar resolver instances.
//!
//! One resolver (and so one cached snapshot) exists per calendar ID,
//! created on first reference and kept for the life of the process. The
//! registry is an owned value passed into command handling; nothing here
//! is process-global.

use std::collections::HashMap;
use std::sync::Arc;

use calbot_core::{Calendar, RemoteEventSource, Responder};

pub struct Registry {
    source: Arc<dyn RemoteEventSource>,
    resolvers: HashMap<String, Responder>,
}

impl Registry {
    pub fn new(source: Arc<dyn RemoteEventSource>) -> Registry {
        Registry {
            source,
            resolvers: HashMap::new(),
        }
    }

    /// The resolver for a calendar, created on first reference.
    pub fn resolver(&mut self, calendar_id: &str) -> &mut Responder {
        self.resolvers
            .entry(calendar_id.to_string())
            .or_insert_with(|| Responder::new(Calendar::new(self.source.clone(), calendar_id)))
    }
}
