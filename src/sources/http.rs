//! Collaborator backed by the dashboard's REST backend

use crate::error::Result;
use crate::search::{
    Device, DeviceDirectory, Event, EventLog, EventQuery, EventsResponse, Identity,
    IdentityDirectory, SourceError,
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Calls `GET {base}/devices`, `GET {base}/identities` and `GET {base}/events`.
///
/// The bearer token, if any, belongs to an already-authorized session and is
/// forwarded as-is.
#[derive(Clone)]
pub struct HttpSource {
    http_client: HttpClient,
    base_url: Url,
    token: Option<String>,
}

impl std::fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSource")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.is_some())
            .finish()
    }
}

impl HttpSource {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("Invalid base URL '{}'", base_url))?;

        // Url::join replaces the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url,
            token,
        })
    }

    pub fn endpoint(&self, path: &str) -> std::result::Result<Url, SourceError> {
        self.base_url
            .join(path)
            .map_err(|e| SourceError::Unavailable(format!("Bad endpoint '{}': {}", path, e)))
    }

    pub fn events_url(&self, query: &EventQuery) -> std::result::Result<Url, SourceError> {
        let mut url = self.endpoint("events")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &query.limit.to_string());
            if let Some(device_id) = &query.device_id {
                pairs.append_pair("device_id", device_id.as_str());
            }
            if let Some(event_type) = &query.event_type {
                pairs.append_pair("event_type", event_type);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> std::result::Result<T, SourceError> {
        tracing::debug!("GET {}", url);

        let mut request = self.http_client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }
}

fn map_request_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else if e.is_decode() {
        SourceError::Decode(e.to_string())
    } else {
        SourceError::Unavailable(e.to_string())
    }
}

#[async_trait]
impl DeviceDirectory for HttpSource {
    async fn list_devices(&self) -> std::result::Result<Vec<Device>, SourceError> {
        let url = self.endpoint("devices")?;
        self.get_json(url).await
    }
}

#[async_trait]
impl IdentityDirectory for HttpSource {
    async fn list_identities(&self) -> std::result::Result<Vec<Identity>, SourceError> {
        let url = self.endpoint("identities")?;
        self.get_json(url).await
    }
}

#[async_trait]
impl EventLog for HttpSource {
    async fn list_events(&self, query: &EventQuery) -> std::result::Result<Vec<Event>, SourceError> {
        let url = self.events_url(query)?;
        let response: EventsResponse = self.get_json(url).await?;
        Ok(response.into_events())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VigilError;
    use crate::search::RecordId;

    fn source(base: &str) -> HttpSource {
        HttpSource::new(base, None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let source = source("https://api.example.com/v1");
        assert_eq!(
            source.endpoint("devices").unwrap().as_str(),
            "https://api.example.com/v1/devices"
        );
    }

    #[test]
    fn test_events_url_forwards_filters() {
        let source = source("https://api.example.com/v1/");
        let url = source
            .events_url(&EventQuery {
                limit: 200,
                device_id: Some(RecordId::from("cam 3")),
                event_type: Some("unknown_face".to_string()),
            })
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/events?limit=200&device_id=cam+3&event_type=unknown_face"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        match HttpSource::new("not a url", None, Duration::from_secs(5)) {
            Err(VigilError::Other(e)) => {
                assert!(e.to_string().contains("Invalid base URL 'not a url'"));
                assert!(e.chain().count() > 1);
            }
            other => panic!("expected invalid URL error, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_hides_token() {
        let source =
            HttpSource::new("https://api.example.com", Some("secret".into()), Duration::from_secs(5))
                .unwrap();
        assert!(!format!("{:?}", source).contains("secret"));
    }
}
