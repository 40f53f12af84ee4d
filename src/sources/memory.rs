//! In-process collaborator with failure and latency injection

use crate::search::{
    Device, DeviceDirectory, Domain, Event, EventLog, EventQuery, Identity, IdentityDirectory,
    SourceError,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Default)]
struct State {
    devices: Vec<Device>,
    identities: Vec<Identity>,
    events: Vec<Event>,
    failures: HashMap<Domain, SourceError>,
    delays: HashMap<Domain, Duration>,
    last_event_query: Option<EventQuery>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    device_calls: AtomicUsize,
    identity_calls: AtomicUsize,
    event_calls: AtomicUsize,
}

/// Serves all three domains from memory. Clones share state.
///
/// `list_events` honours `limit` but does not pre-narrow by device or type,
/// so the local filter pipeline does all the narrowing.
#[derive(Clone, Default)]
pub struct InMemorySource {
    inner: Arc<Inner>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(self, devices: Vec<Device>) -> Self {
        self.state().devices = devices;
        self
    }

    pub fn with_identities(self, identities: Vec<Identity>) -> Self {
        self.state().identities = identities;
        self
    }

    pub fn with_events(self, events: Vec<Event>) -> Self {
        self.state().events = events;
        self
    }

    /// Make every call for `domain` fail with `error` until `recover` is called
    pub fn fail(&self, domain: Domain, error: SourceError) {
        self.state().failures.insert(domain, error);
    }

    pub fn recover(&self, domain: Domain) {
        self.state().failures.remove(&domain);
    }

    /// Delay applied to calls for `domain` started after this point
    pub fn set_delay(&self, domain: Domain, delay: Duration) {
        self.state().delays.insert(domain, delay);
    }

    pub fn calls(&self, domain: Domain) -> usize {
        self.counter(domain).load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        Domain::ALL.iter().map(|d| self.calls(*d)).sum()
    }

    pub fn last_event_query(&self) -> Option<EventQuery> {
        self.state().last_event_query.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn counter(&self, domain: Domain) -> &AtomicUsize {
        match domain {
            Domain::Device => &self.inner.device_calls,
            Domain::Identity => &self.inner.identity_calls,
            Domain::Event => &self.inner.event_calls,
        }
    }

    /// Count the call, then wait out any injected delay and report any injected failure
    async fn begin(&self, domain: Domain) -> Result<(), SourceError> {
        self.counter(domain).fetch_add(1, Ordering::SeqCst);

        let (delay, failure) = {
            let state = self.state();
            (
                state.delays.get(&domain).copied(),
                state.failures.get(&domain).cloned(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DeviceDirectory for InMemorySource {
    async fn list_devices(&self) -> Result<Vec<Device>, SourceError> {
        self.begin(Domain::Device).await?;
        Ok(self.state().devices.clone())
    }
}

#[async_trait]
impl IdentityDirectory for InMemorySource {
    async fn list_identities(&self) -> Result<Vec<Identity>, SourceError> {
        self.begin(Domain::Identity).await?;
        Ok(self.state().identities.clone())
    }
}

#[async_trait]
impl EventLog for InMemorySource {
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>, SourceError> {
        self.state().last_event_query = Some(query.clone());
        self.begin(Domain::Event).await?;

        let mut events = self.state().events.clone();
        events.truncate(query.limit);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::RecordId;
    use chrono::Utc;

    #[tokio::test]
    async fn test_failure_injection_and_counters() {
        let source = InMemorySource::new().with_devices(vec![Device {
            id: RecordId::from("1"),
            display_name: "Lobby".to_string(),
            location_label: None,
            is_active: true,
            created_at: Utc::now(),
        }]);

        assert_eq!(source.list_devices().await.unwrap().len(), 1);

        source.fail(Domain::Device, SourceError::Timeout);
        assert_eq!(source.list_devices().await, Err(SourceError::Timeout));

        source.recover(Domain::Device);
        assert!(source.list_devices().await.is_ok());

        assert_eq!(source.calls(Domain::Device), 3);
        assert_eq!(source.total_calls(), 3);
    }

    #[tokio::test]
    async fn test_event_limit_is_honoured() {
        let event = |id: &str| Event {
            id: RecordId::from(id),
            device_id: None,
            device_display_name: None,
            event_type: "face_detected".to_string(),
            identity_id: None,
            identity_display_name: None,
            confidence: 0.9,
            similarity_score: None,
            occurred_at: Utc::now(),
            image_url: None,
            alert_sent: None,
        };
        let source = InMemorySource::new().with_events(vec![event("a"), event("b"), event("c")]);

        let query = EventQuery {
            limit: 2,
            ..EventQuery::default()
        };
        let events = source.list_events(&query).await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(source.last_event_query(), Some(query));
    }
}
