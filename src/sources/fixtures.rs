//! Collaborator backed by JSON files on disk

use crate::search::{
    Device, DeviceDirectory, Event, EventLog, EventQuery, EventsResponse, Identity,
    IdentityDirectory, SourceError,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

pub const DEVICES_FILE: &str = "devices.json";
pub const IDENTITIES_FILE: &str = "identities.json";
pub const EVENTS_FILE: &str = "events.json";

/// Reads `devices.json`, `identities.json` and `events.json` from one directory.
///
/// Files are re-read on every call; a missing or malformed file only fails its own domain.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    dir: PathBuf,
}

impl FixtureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<T, SourceError> {
        let path = self.dir.join(file);

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SourceError::Io(format!("{}: {}", path.display(), e)))?;

        serde_json::from_str(&content)
            .map_err(|e| SourceError::Decode(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl DeviceDirectory for FixtureSource {
    async fn list_devices(&self) -> Result<Vec<Device>, SourceError> {
        self.read_json(DEVICES_FILE).await
    }
}

#[async_trait]
impl IdentityDirectory for FixtureSource {
    async fn list_identities(&self) -> Result<Vec<Identity>, SourceError> {
        self.read_json(IDENTITIES_FILE).await
    }
}

#[async_trait]
impl EventLog for FixtureSource {
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>, SourceError> {
        let response: EventsResponse = self.read_json(EVENTS_FILE).await?;
        let mut events = response.into_events();
        events.truncate(query.limit);
        Ok(events)
    }
}
