//! HTTP event lookup against the platform API gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};

use super::{decode_event, EventLookupError, EventSource};
use crate::types::EventRecord;

#[derive(Clone)]
pub struct GatewayEventSource {
    http: reqwest::Client,
    base_url: Url,
}

impl GatewayEventSource {
    pub fn new(gateway_url: &str, timeout: Duration) -> Result<Self, EventLookupError> {
        let base_url = Url::parse(gateway_url.trim_end_matches('/'))
            .map_err(|e| EventLookupError::Http(format!("invalid gateway URL {gateway_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(EventLookupError::Http(format!("invalid gateway URL {gateway_url}")));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EventLookupError::Http(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    /// `{gateway}/api/events/{id}` with the id percent-encoded as one segment.
    fn event_url(&self, event_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "events", event_id]);
        }
        url
    }
}

#[async_trait]
impl EventSource for GatewayEventSource {
    async fn get_event(&self, event_id: &str) -> Result<Option<EventRecord>, EventLookupError> {
        let resp = self
            .http
            .get(self.event_url(event_id))
            .send()
            .await
            .map_err(|e| EventLookupError::Http(e.to_string()))?;

        match resp.status() {
            StatusCode::OK => {
                let body: serde_json::Value = resp
                    .json()
                    .await
                    .map_err(|e| EventLookupError::Decode(e.to_string()))?;
                decode_event(body).map(Some)
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(EventLookupError::Status(status.as_u16())),
        }
    }

    fn source_name(&self) -> &'static str {
        "Gateway"
    }
}
