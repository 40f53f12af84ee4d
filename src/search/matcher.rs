//! Domain matchers: one per collaborator, each filter-then-match

use crate::search::domain::{
    Device, DeviceDirectory, Domain, Event, EventLog, EventQuery, Identity, IdentityDirectory,
    SourceError,
};
use crate::search::filters::{apply_filters, Filterable};
use crate::search::normalize::{Normalize, NormalizedResult};
use crate::search::SearchContext;
use std::sync::Arc;

/// What one domain contributed to a dispatch cycle
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Matched {
        domain: Domain,
        results: Vec<NormalizedResult>,
    },
    /// The collaborator failed; the domain contributes nothing this cycle
    Degraded { domain: Domain, error: SourceError },
}

impl MatchOutcome {
    pub fn domain(&self) -> Domain {
        match self {
            Self::Matched { domain, .. } | Self::Degraded { domain, .. } => *domain,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Text fields a record is matched against
pub trait Searchable {
    /// The field compared for exact matches
    fn primary_text(&self) -> &str;

    /// Every field compared for substring matches, primary included
    fn search_texts(&self) -> Vec<&str>;

    fn matches(&self, needle: &str) -> bool {
        self.search_texts()
            .iter()
            .any(|text| text.to_lowercase().contains(needle))
    }

    fn is_exact(&self, needle: &str) -> bool {
        self.primary_text().trim().to_lowercase() == needle
    }
}

impl Searchable for Device {
    fn primary_text(&self) -> &str {
        &self.display_name
    }

    fn search_texts(&self) -> Vec<&str> {
        let mut texts = vec![self.display_name.as_str()];
        texts.extend(self.location_label.as_deref());
        texts
    }
}

impl Searchable for Identity {
    fn primary_text(&self) -> &str {
        &self.display_name
    }

    fn search_texts(&self) -> Vec<&str> {
        let mut texts = vec![self.display_name.as_str()];
        texts.extend(self.description.as_deref());
        texts
    }
}

impl Searchable for Event {
    fn primary_text(&self) -> &str {
        self.identity_display_name
            .as_deref()
            .unwrap_or(&self.event_type)
    }

    // Event text is sparse, so the attached identity and camera names count too
    fn search_texts(&self) -> Vec<&str> {
        let mut texts = vec![self.event_type.as_str()];
        texts.extend(self.identity_display_name.as_deref());
        texts.extend(self.device_display_name.as_deref());
        texts
    }
}

/// Filter, then match, then normalize. Order within the input is preserved.
fn match_records<T>(records: Vec<T>, ctx: &SearchContext) -> Vec<NormalizedResult>
where
    T: Filterable + Searchable + Normalize,
{
    let needle = ctx.query.needle();

    apply_filters(records, ctx.query.filters(), ctx.issued_at)
        .into_iter()
        .filter(|record| record.matches(&needle))
        .map(|record| {
            let exact = record.is_exact(&needle);
            record.normalize(exact)
        })
        .collect()
}

fn settle<T>(
    domain: Domain,
    listed: Result<Vec<T>, SourceError>,
    ctx: &SearchContext,
) -> MatchOutcome
where
    T: Filterable + Searchable + Normalize,
{
    match listed {
        Ok(records) => {
            let candidates = records.len();
            let results = match_records(records, ctx);
            tracing::debug!(
                "{} matcher: {} of {} candidates matched",
                domain,
                results.len(),
                candidates
            );
            MatchOutcome::Matched { domain, results }
        }
        Err(error) => {
            tracing::warn!("{} search degraded: {}", domain, error);
            MatchOutcome::Degraded { domain, error }
        }
    }
}

/// Matches cameras by name and location
#[derive(Clone)]
pub struct DeviceMatcher {
    directory: Arc<dyn DeviceDirectory>,
}

impl DeviceMatcher {
    pub fn new(directory: Arc<dyn DeviceDirectory>) -> Self {
        Self { directory }
    }

    pub async fn run(&self, ctx: &SearchContext) -> MatchOutcome {
        let listed = self.directory.list_devices().await;
        settle(Domain::Device, listed, ctx)
    }
}

/// Matches enrolled people by name and description
#[derive(Clone)]
pub struct IdentityMatcher {
    directory: Arc<dyn IdentityDirectory>,
}

impl IdentityMatcher {
    pub fn new(directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { directory }
    }

    pub async fn run(&self, ctx: &SearchContext) -> MatchOutcome {
        let listed = self.directory.list_identities().await;
        settle(Domain::Identity, listed, ctx)
    }
}

/// Matches detection events by type, person and camera
#[derive(Clone)]
pub struct EventMatcher {
    log: Arc<dyn EventLog>,
    fetch_limit: usize,
}

impl EventMatcher {
    pub fn new(log: Arc<dyn EventLog>, fetch_limit: usize) -> Self {
        Self { log, fetch_limit }
    }

    pub async fn run(&self, ctx: &SearchContext) -> MatchOutcome {
        let filters = ctx.query.filters();
        let request = EventQuery {
            limit: self.fetch_limit,
            device_id: filters.device_id.clone(),
            event_type: filters.event_type.clone(),
        };

        let listed = self.log.list_events(&request).await;
        settle(Domain::Event, listed, ctx)
    }
}
