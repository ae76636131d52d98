//! Google Calendar v3 REST client.
//!
//! Speaks the events API directly with reqwest; the JSON bodies are the
//! core's wire types, so nothing is translated twice.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use reqwest::{Client, Method, Response};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use calbot_core::event::DATETIME_FORMAT;
use calbot_core::{EventDraft, EventPatch, RawEvent, RemoteEventSource, SourceError};

use crate::config::{self, AccountTokens, GoogleCredentials};

const API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

pub struct GoogleCalendarSource {
    http: Client,
    creds: GoogleCredentials,
    tokens: Mutex<AccountTokens>,
}

#[derive(Debug, Deserialize)]
struct EventListing {
    #[serde(default)]
    items: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RefreshedToken {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
}

impl GoogleCalendarSource {
    /// Build from the credentials and tokens provisioned on disk.
    pub fn from_disk() -> anyhow::Result<GoogleCalendarSource> {
        let creds = config::load_credentials()?;
        let tokens = config::load_tokens()?;
        Ok(GoogleCalendarSource::new(creds, tokens))
    }

    pub fn new(creds: GoogleCredentials, tokens: AccountTokens) -> GoogleCalendarSource {
        GoogleCalendarSource {
            http: Client::new(),
            creds,
            tokens: Mutex::new(tokens),
        }
    }

    fn events_url(&self, calendar_id: &str) -> Result<Url, SourceError> {
        let mut url =
            Url::parse(API_BASE).map_err(|e| SourceError::Decode(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Decode("API base URL cannot hold a path".to_string()))?
            .push("calendars")
            .push(calendar_id)
            .push("events");
        Ok(url)
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> Result<Url, SourceError> {
        let mut url = self.events_url(calendar_id)?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Decode("API base URL cannot hold a path".to_string()))?
            .push(event_id);
        Ok(url)
    }

    /// Current access token, refreshed and re-persisted when expired.
    async fn access_token(&self) -> Result<String, SourceError> {
        let mut tokens = self.tokens.lock().await;
        if tokens.needs_refresh() {
            info!("access token expired, refreshing");
            let response = self
                .http
                .post(TOKEN_URL)
                .form(&[
                    ("client_id", self.creds.client_id.as_str()),
                    ("client_secret", self.creds.client_secret.as_str()),
                    ("refresh_token", tokens.refresh_token.as_str()),
                    ("grant_type", "refresh_token"),
                ])
                .send()
                .await
                .map_err(|e| SourceError::Network(e.to_string()))?;
            let response = check_status(response).await?;
            let refreshed: RefreshedToken = response
                .json()
                .await
                .map_err(|e| SourceError::Decode(e.to_string()))?;

            tokens.access_token = refreshed.access_token;
            tokens.expires_at = (refreshed.expires_in > 0)
                .then(|| Utc::now() + chrono::Duration::seconds(refreshed.expires_in));

            if let Err(err) = config::save_tokens(&tokens) {
                warn!("could not persist refreshed tokens: {err:#}");
            }
        }
        Ok(tokens.access_token.clone())
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<Response, SourceError> {
        let token = self.access_token().await?;
        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response.text().await.unwrap_or_default();
    Err(SourceError::Status {
        status: status.as_u16(),
        detail,
    })
}

#[async_trait]
impl RemoteEventSource for GoogleCalendarSource {
    async fn list(
        &self,
        calendar_id: &str,
        not_before: NaiveDateTime,
    ) -> Result<Vec<RawEvent>, SourceError> {
        let mut url = self.events_url(calendar_id)?;
        url.query_pairs_mut()
            .append_pair("timeMin", &not_before.format(DATETIME_FORMAT).to_string())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime");

        debug!(calendar = calendar_id, "listing events");
        let response = self.send(Method::GET, url, None).await?;
        let listing: EventListing = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;
        Ok(listing.items)
    }

    async fn create(&self, calendar_id: &str, draft: &EventDraft) -> Result<String, SourceError> {
        let url = self.events_url(calendar_id)?;
        let body = json!({
            "summary": draft.title,
            "start": draft.start.to_raw(),
            "end": draft.start.default_end().to_raw(),
            "location": draft.location,
            "description": draft.description,
        });

        info!(calendar = calendar_id, title = %draft.title, "creating event");
        let response = self.send(Method::POST, url, Some(body)).await?;
        let created: CreatedEvent = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;
        Ok(created.id)
    }

    async fn patch(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<(), SourceError> {
        let url = self.event_url(calendar_id, event_id)?;

        let mut body = serde_json::Map::new();
        if let Some(title) = &patch.title {
            body.insert("summary".to_string(), json!(title));
        }
        if let Some(start) = &patch.start {
            body.insert("start".to_string(), json!(start.to_raw()));
            body.insert("end".to_string(), json!(start.default_end().to_raw()));
        }
        if let Some(location) = &patch.location {
            body.insert("location".to_string(), json!(location));
        }
        if let Some(description) = &patch.description {
            body.insert("description".to_string(), json!(description));
        }

        info!(calendar = calendar_id, event = event_id, "patching event");
        self.send(Method::PATCH, url, Some(serde_json::Value::Object(body)))
            .await?;
        Ok(())
    }

    async fn delete(&self, calendar_id: &str, event_id: &str) -> Result<(), SourceError> {
        let url = self.event_url(calendar_id, event_id)?;
        info!(calendar = calendar_id, event = event_id, "deleting event");
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }
}
