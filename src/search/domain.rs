//! Domain records and the collaborator traits that own them

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One of the three independently owned record categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Device,
    Identity,
    Event,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Device, Domain::Identity, Domain::Event];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Identity => "identity",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque record identifier. Backends send either numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct RecordId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for RecordId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        }
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A camera registered with the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: RecordId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_label: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// An enrolled person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: RecordId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A detection recorded by a camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_display_name: Option<String>,
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_display_name: Option<String>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    pub occurred_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_sent: Option<bool>,
}

/// Event listing payload: either a bare array or wrapped in `{ "events": [...] }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EventsResponse {
    List(Vec<Event>),
    Wrapped { events: Vec<Event> },
}

impl EventsResponse {
    pub fn into_events(self) -> Vec<Event> {
        match self {
            Self::List(events) | Self::Wrapped { events } => events,
        }
    }
}

/// Parameters forwarded to the event log so the backend can pre-narrow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    pub limit: usize,
    pub device_id: Option<RecordId>,
    pub event_type: Option<String>,
}

/// Failure of a single collaborator call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Request timed out")]
    Timeout,
}

#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<Device>, SourceError>;
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn list_identities(&self) -> Result<Vec<Identity>, SourceError>;
}

#[async_trait]
pub trait EventLog: Send + Sync {
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>, SourceError>;
}
