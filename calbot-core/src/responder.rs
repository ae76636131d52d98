//! The command-facing resolver: one per calendar.
//!
//! Every operation answers with reply text. Expected problems (a bad
//! position, unreadable date text, an unknown edit field) come back as
//! corrective messages in `Ok`; only remote-service failures escape as
//! `Err` for the host to present generically.

use crate::calendar::Calendar;
use crate::dates::{parse_when, pretty_when};
use crate::error::{PositionError, SourceError};
use crate::event::Event;
use crate::source::{EventDraft, EventPatch};

const DATE_HELP: &str = "Couldn't parse the date. Try writing it in dd/mm/yyyy hh:mm format.";
const FIELD_HELP: &str = "You can edit the title, time, place or desc of an event.";
const NOT_A_NUMBER: &str = "Use the number given in the event list to pick an event.";
const UNKNOWN_EVENT: &str = "Don't know about that event.";

pub struct Responder {
    cal: Calendar,
}

impl Responder {
    pub fn new(cal: Calendar) -> Responder {
        Responder { cal }
    }

    pub fn calendar(&self) -> &Calendar {
        &self.cal
    }

    /// Force a fresh snapshot.
    pub async fn sync(&mut self) -> Result<(), SourceError> {
        self.cal.sync().await
    }

    pub async fn list(&mut self) -> Result<String, SourceError> {
        self.cal.ensure_loaded().await?;
        if self.cal.events().is_empty() {
            return Ok("Nothing planned yet.".to_string());
        }
        let mut msg = String::from("Upcoming events:");
        for (pos, event) in self.cal.events().iter().enumerate() {
            msg.push_str(&format!("\n{}. {}", pos + 1, render_detail(event)));
        }
        Ok(msg)
    }

    pub async fn show(&mut self, pos: &str) -> Result<String, SourceError> {
        self.cal.ensure_loaded().await?;
        let index = match self.cal.resolve(pos) {
            Ok(index) => index,
            Err(err) => return Ok(position_message(err)),
        };
        Ok(render_detail(&self.cal.events()[index]))
    }

    /// `rest` may start with an `at <place>` pair and end with one free
    /// description; anything beyond that is ignored.
    pub async fn add(
        &mut self,
        title: &str,
        when: &str,
        rest: &[String],
    ) -> Result<String, SourceError> {
        let Ok(start) = parse_when(when) else {
            return Ok(DATE_HELP.to_string());
        };
        let mut rest = rest;
        let mut location = None;
        if rest.len() >= 2 && rest[0] == "at" {
            location = Some(rest[1].clone());
            rest = &rest[2..];
        }
        let draft = EventDraft {
            title: title.to_string(),
            start,
            location,
            description: rest.first().cloned(),
        };
        let event = self.cal.create(&draft).await?;
        Ok(format!("Added **{}** to the calendar.", event.title))
    }

    /// Field/value pairs are all validated before anything is sent
    /// remotely; one patch call then carries the merged fields. A trailing
    /// unpaired word is ignored.
    pub async fn edit(&mut self, pos: &str, args: &[String]) -> Result<String, SourceError> {
        self.cal.ensure_loaded().await?;
        let index = match self.cal.resolve(pos) {
            Ok(index) => index,
            Err(err) => return Ok(position_message(err)),
        };
        let mut patch = EventPatch::default();
        for pair in args.chunks_exact(2) {
            let value = pair[1].clone();
            match pair[0].as_str() {
                "title" => patch.title = Some(value),
                "time" => match parse_when(&value) {
                    Ok(start) => patch.start = Some(start),
                    Err(_) => return Ok(DATE_HELP.to_string()),
                },
                "place" => patch.location = Some(value),
                "desc" => patch.description = Some(value),
                _ => return Ok(FIELD_HELP.to_string()),
            }
        }
        if patch.is_empty() {
            return Ok(FIELD_HELP.to_string());
        }
        let title = match &patch.title {
            Some(title) => title.clone(),
            None => self.cal.events()[index].title.clone(),
        };
        self.cal.patch(index, &patch).await?;
        Ok(format!("Updated **{}** on the calendar.", title))
    }

    pub async fn remove(&mut self, pos: &str) -> Result<String, SourceError> {
        self.cal.ensure_loaded().await?;
        let index = match self.cal.resolve(pos) {
            Ok(index) => index,
            Err(err) => return Ok(position_message(err)),
        };
        let event = self.cal.delete(index).await?;
        Ok(format!("Removed **{}** from the calendar.", event.title))
    }
}

fn render_detail(event: &Event) -> String {
    let mut msg = format!("**{}** -- {}", event.title, pretty_when(&event.start));
    if let Some(description) = &event.description {
        msg.push_str(&format!("\n_{}_", description));
    }
    if let Some(location) = &event.location {
        msg.push_str(&format!("\n{}", location));
    }
    msg
}

fn position_message(err: PositionError) -> String {
    match err {
        PositionError::NotANumber(_) => NOT_A_NUMBER.to_string(),
        PositionError::OutOfRange(_) => UNKNOWN_EVENT.to_string(),
    }
}
