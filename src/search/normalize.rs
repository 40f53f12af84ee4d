//! Common tagged result shape shared by every domain

use crate::search::domain::{Device, Domain, Event, Identity, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The source record, carried untouched alongside the common fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultPayload {
    Device(Device),
    Identity(Identity),
    Event(Event),
}

/// A search hit from any domain.
///
/// Ids are only unique within a domain; global identity is `(domain, id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub id: RecordId,
    pub domain: Domain,
    /// Creation time for devices and identities, occurrence time for events
    pub sort_timestamp: DateTime<Utc>,
    pub is_exact_match: bool,
    /// Primary display line
    pub title: String,
    /// Secondary display line (location, description, camera)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub payload: ResultPayload,
}

/// The only inputs the ranking comparator ever looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingKey {
    pub is_exact_match: bool,
    pub sort_timestamp: DateTime<Utc>,
}

impl NormalizedResult {
    pub fn ranking_key(&self) -> RankingKey {
        RankingKey {
            is_exact_match: self.is_exact_match,
            sort_timestamp: self.sort_timestamp,
        }
    }

    /// Global identity across domains
    pub fn key(&self) -> (Domain, &RecordId) {
        (self.domain, &self.id)
    }
}

/// Maps a domain's native record into a `NormalizedResult`
pub trait Normalize {
    fn normalize(self, is_exact_match: bool) -> NormalizedResult;
}

impl Normalize for Device {
    fn normalize(self, is_exact_match: bool) -> NormalizedResult {
        NormalizedResult {
            id: self.id.clone(),
            domain: Domain::Device,
            sort_timestamp: self.created_at,
            is_exact_match,
            title: self.display_name.clone(),
            subtitle: self.location_label.clone(),
            payload: ResultPayload::Device(self),
        }
    }
}

impl Normalize for Identity {
    fn normalize(self, is_exact_match: bool) -> NormalizedResult {
        NormalizedResult {
            id: self.id.clone(),
            domain: Domain::Identity,
            sort_timestamp: self.created_at,
            is_exact_match,
            title: self.display_name.clone(),
            subtitle: self.description.clone(),
            payload: ResultPayload::Identity(self),
        }
    }
}

impl Normalize for Event {
    fn normalize(self, is_exact_match: bool) -> NormalizedResult {
        let title = self
            .identity_display_name
            .clone()
            .unwrap_or_else(|| self.event_type.clone());
        let subtitle = match &self.device_display_name {
            Some(device) => Some(format!("{} @ {}", self.event_type, device)),
            None => Some(self.event_type.clone()),
        };

        NormalizedResult {
            id: self.id.clone(),
            domain: Domain::Event,
            sort_timestamp: self.occurred_at,
            is_exact_match,
            title,
            subtitle,
            payload: ResultPayload::Event(self),
        }
    }
}
