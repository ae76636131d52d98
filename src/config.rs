//! calbot configuration.
//!
//! `~/.config/calbot/config.toml`:
//!
//! ```toml
//! # Default calendar for every conversation (optional)
//! calendar_id = "primary"
//!
//! # Per-conversation overrides (optional)
//! [conversations."family-chat"]
//! calendar_id = "family@group.calendar.google.com"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Sentinel the remote service reads as "the caller's own calendar".
pub const PRIMARY_CALENDAR: &str = "primary";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Default calendar for conversations without an override.
    pub calendar_id: Option<String>,

    #[serde(default)]
    pub conversations: HashMap<String, ConversationConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConversationConfig {
    pub calendar_id: Option<String>,
}

impl Config {
    /// Calendar a conversation's commands act on: the conversation
    /// override, else the global default, else the primary calendar.
    pub fn calendar_for(&self, conversation: &str) -> &str {
        self.conversations
            .get(conversation)
            .and_then(|c| c.calendar_id.as_deref())
            .or(self.calendar_id.as_deref())
            .unwrap_or(PRIMARY_CALENDAR)
    }
}

/// Get the config file path (~/.config/calbot/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("calbot")
        .join("config.toml"))
}

/// Load the config file; a missing file means defaults.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_resolution_prefers_the_override() {
        let config: Config = toml::from_str(
            r#"
            calendar_id = "work@example.com"

            [conversations."family-chat"]
            calendar_id = "family@group.calendar.google.com"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.calendar_for("family-chat"),
            "family@group.calendar.google.com"
        );
        assert_eq!(config.calendar_for("other-chat"), "work@example.com");
    }

    #[test]
    fn missing_settings_fall_back_to_primary() {
        let config = Config::default();
        assert_eq!(config.calendar_for("anything"), PRIMARY_CALENDAR);
    }
}
