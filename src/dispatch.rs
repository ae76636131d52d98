//! One conversational line in, one reply out.
//!
//! The host hands over raw text; the dispatcher splits it the way a shell
//! would, routes the subcommand to the calendar's resolver, and turns
//! whatever happened into reply text. Collaborator failures surface here
//! as a generic service-error message; everything else the resolver has
//! already rendered.

use calbot_core::{Responder, SourceError};

use crate::registry::Registry;

const USAGE_SHOW: &str = "Usage: calendar show <pos>";
const USAGE_ADD: &str =
    "Usage: calendar add \"what\" \"when\" [at \"where\"] [\"description\"]";
const USAGE_EDIT: &str = "Usage: calendar edit <pos> <field> \"update\" [...]";
const USAGE_REMOVE: &str = "Usage: calendar remove <pos>";
const UNKNOWN_COMMAND: &str = "Unknown subcommand. Try list, show, add, edit or remove.";

/// Split a command line into words, honoring single and double quotes.
/// An unterminated quote runs to the end of the line.
pub fn split_command(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut has_word = false;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    has_word = true;
                }
                c if c.is_whitespace() => {
                    if has_word {
                        words.push(std::mem::take(&mut current));
                        has_word = false;
                    }
                }
                _ => {
                    current.push(c);
                    has_word = true;
                }
            },
        }
    }
    if has_word {
        words.push(current);
    }
    words
}

/// Handle one raw command line for a conversation's calendar.
pub async fn dispatch(registry: &mut Registry, calendar_id: &str, line: &str) -> String {
    dispatch_words(registry, calendar_id, &split_command(line)).await
}

/// Handle an already-split command for a conversation's calendar.
pub async fn dispatch_words(
    registry: &mut Registry,
    calendar_id: &str,
    words: &[String],
) -> String {
    let responder = registry.resolver(calendar_id);
    match run(responder, words).await {
        Ok(reply) => reply,
        Err(err) => format!("Got an error from the calendar service: {}", err),
    }
}

async fn run(responder: &mut Responder, words: &[String]) -> Result<String, SourceError> {
    // An empty command means "list".
    let (command, args) = match words.split_first() {
        Some((command, args)) => (command.as_str(), args),
        None => ("list", &[][..]),
    };

    match command {
        "list" => responder.list().await,
        "show" => match args {
            [pos] => responder.show(pos).await,
            _ => Ok(USAGE_SHOW.to_string()),
        },
        "add" => match args {
            [title, when, rest @ ..] => responder.add(title, when, rest).await,
            _ => Ok(USAGE_ADD.to_string()),
        },
        "edit" => match args {
            [pos, rest @ ..] if !rest.is_empty() => responder.edit(pos, rest).await,
            _ => Ok(USAGE_EDIT.to_string()),
        },
        "remove" => match args {
            [pos] => responder.remove(pos).await,
            _ => Ok(USAGE_REMOVE.to_string()),
        },
        _ => Ok(UNKNOWN_COMMAND.to_string()),
    }
}
