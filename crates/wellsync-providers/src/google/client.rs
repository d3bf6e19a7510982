//! Google Calendar v3 REST client.
//!
//! Only the `events.list` endpoint is used. Requests are authenticated with
//! the bearer token of the session passed in by the caller; the client keeps
//! no credentials of its own.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::{RawEvent, RawEventTime};

use super::config::GoogleConfig;

/// Upper bound on pages fetched for one listing.
pub const MAX_PAGES: usize = 500;

/// HTTP client for the Calendar API.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    api_base: String,
    page_size: u32,
}

impl GoogleCalendarClient {
    pub fn new(config: &GoogleConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        })
    }

    /// Lists events of `calendar_id` between `time_min` and `time_max`,
    /// following `nextPageToken` until the last page.
    ///
    /// Recurring events are expanded server-side (`singleEvents=true`) and
    /// cancelled instances are skipped.
    pub async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> ProviderResult<Vec<RawEvent>> {
        let mut all_events = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut pages = 0usize;

        loop {
            let page = self
                .list_events_page(
                    access_token,
                    calendar_id,
                    time_min,
                    time_max,
                    page_token.as_deref(),
                )
                .await?;
            pages += 1;

            all_events.extend(
                page.items
                    .into_iter()
                    .filter_map(|event| convert_event(event, calendar_id)),
            );

            match page.next_page_token {
                Some(token) if !seen_tokens.insert(token.clone()) => {
                    warn!(calendar_id, pages, "server repeated a page token, stopping");
                    break;
                }
                Some(_) if pages >= MAX_PAGES => {
                    warn!(calendar_id, pages, "page limit reached, stopping");
                    break;
                }
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            calendar_id,
            pages,
            events = all_events.len(),
            "fetched remote events"
        );
        Ok(all_events)
    }

    async fn list_events_page(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> ProviderResult<EventListResponse> {
        let url = format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(calendar_id)
        );

        let mut request = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", time_min.to_rfc3339()),
                ("timeMax", time_max.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", self.page_size.to_string()),
            ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await.map_err(map_send_error)?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(ProviderError::rate_limited(format!(
                "rate limit exceeded{}",
                retry_after
                    .map(|s| format!(", retry after {} seconds", s))
                    .unwrap_or_default()
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
        })
    }
}

fn map_send_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::timeout("request timed out")
    } else if e.is_connect() {
        ProviderError::network(format!("connection failed: {}", e))
    } else {
        ProviderError::network(format!("request failed: {}", e))
    }
}

fn map_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    match status.as_u16() {
        401 => ProviderError::authentication("access token expired or invalid"),
        403 => ProviderError::authorization("access denied to calendar"),
        404 => ProviderError::not_found("calendar not found"),
        500..=599 => ProviderError::server(format!("API error ({}): {}", status, body)),
        _ => ProviderError::bad_request(format!("API error ({}): {}", status, body)),
    }
}

/// Converts an API event, or returns `None` for cancelled or malformed ones.
fn convert_event(event: ApiEvent, calendar_id: &str) -> Option<RawEvent> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }

    let id = event.id?;
    let start = match convert_time(&event.start) {
        Some(t) => t,
        None => {
            warn!(event_id = %id, "skipping event with unparseable start");
            return None;
        }
    };
    let end = match convert_time(&event.end) {
        Some(t) => t,
        None => {
            warn!(event_id = %id, "skipping event with unparseable end");
            return None;
        }
    };

    let mut raw = RawEvent::new(start, end, calendar_id).with_id(id);
    raw.summary = event.summary;
    raw.description = event.description;
    raw.location = event.location;
    raw.timezone = event.start.time_zone;
    raw.status = event.status;
    raw.updated = event
        .updated
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Some(raw)
}

fn convert_time(time: &ApiEventTime) -> Option<RawEventTime> {
    match (&time.date_time, &time.date) {
        (Some(dt), _) => DateTime::parse_from_rfc3339(dt)
            .ok()
            .map(|dt| RawEventTime::DateTime(dt.with_timezone(&Utc))),
        (None, Some(date)) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .map(RawEventTime::Date),
        (None, None) => None,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    #[serde(default)]
    start: ApiEventTime,
    #[serde(default)]
    end: ApiEventTime,
    status: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
    time_zone: Option<String>,
}
