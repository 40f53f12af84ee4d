//! Concurrent fan-out of one query to the applicable domain matchers

use crate::search::domain::{DeviceDirectory, Domain, EventLog, IdentityDirectory, SourceError};
use crate::search::matcher::{DeviceMatcher, EventMatcher, IdentityMatcher, MatchOutcome};
use crate::search::rank::{aggregate, RankedResultSet, SearchStats, SearchStatus};
use crate::search::{SearchContext, SearchFilters, SearchQuery, SearchScope};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Default number of events requested from the event log per cycle
pub const DEFAULT_EVENT_FETCH_LIMIT: usize = 200;

/// Result of one completed dispatch cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: RankedResultSet,
    pub stats: SearchStats,
}

impl SearchResponse {
    pub fn empty() -> Self {
        Self {
            results: RankedResultSet::empty(),
            stats: SearchStats::skipped(),
        }
    }
}

/// Issues the domain matchers for a query and aggregates what they return
#[derive(Clone)]
pub struct QueryDispatcher {
    devices: DeviceMatcher,
    identities: IdentityMatcher,
    events: EventMatcher,
}

impl QueryDispatcher {
    pub fn new(
        devices: Arc<dyn DeviceDirectory>,
        identities: Arc<dyn IdentityDirectory>,
        events: Arc<dyn EventLog>,
        event_fetch_limit: usize,
    ) -> Self {
        Self {
            devices: DeviceMatcher::new(devices),
            identities: IdentityMatcher::new(identities),
            events: EventMatcher::new(events, event_fetch_limit),
        }
    }

    /// Build a dispatcher over one source that serves all three domains
    pub fn from_source<S>(source: Arc<S>, event_fetch_limit: usize) -> Self
    where
        S: DeviceDirectory + IdentityDirectory + EventLog + 'static,
    {
        Self::new(source.clone(), source.clone(), source, event_fetch_limit)
    }

    /// Entry point used by the presentation layer
    pub async fn search(
        &self,
        text: &str,
        scope: SearchScope,
        filters: SearchFilters,
    ) -> SearchResponse {
        let query = SearchQuery::new(text)
            .with_scope(scope)
            .with_filters(filters);
        self.dispatch(&query).await
    }

    pub async fn dispatch(&self, query: &SearchQuery) -> SearchResponse {
        self.dispatch_context(&SearchContext::new(query.clone()))
            .await
    }

    /// Run one full cycle. Completes only after every dispatched matcher settles.
    pub async fn dispatch_context(&self, ctx: &SearchContext) -> SearchResponse {
        if ctx.query.is_empty() {
            tracing::debug!("Empty query, skipping dispatch");
            return SearchResponse::empty();
        }

        let started = Instant::now();
        let scope = ctx.query.scope();

        let devices = self.devices.clone();
        let identities = self.identities.clone();
        let events = self.events.clone();
        let (device_ctx, identity_ctx, event_ctx) = (ctx.clone(), ctx.clone(), ctx.clone());

        let (devices, identities, events) = tokio::join!(
            run_if(scope.includes(Domain::Device), Domain::Device, async move {
                devices.run(&device_ctx).await
            }),
            run_if(scope.includes(Domain::Identity), Domain::Identity, async move {
                identities.run(&identity_ctx).await
            }),
            run_if(scope.includes(Domain::Event), Domain::Event, async move {
                events.run(&event_ctx).await
            }),
        );

        let outcomes: Vec<MatchOutcome> = [devices, identities, events]
            .into_iter()
            .flatten()
            .collect();

        let (results, stats) = aggregate(outcomes, started);

        match stats.status {
            SearchStatus::Failed => tracing::warn!(
                "Search for '{}' failed: all {} domains degraded",
                ctx.query.text(),
                stats.degraded_domains.len()
            ),
            _ => tracing::info!(
                "Search for '{}' ({}): {} results ({} devices, {} identities, {} events, {} degraded) in {}ms",
                ctx.query.text(),
                scope,
                stats.total_results,
                stats.devices_count,
                stats.identities_count,
                stats.events_count,
                stats.degraded_domains.len(),
                stats.elapsed_ms
            ),
        }

        SearchResponse { results, stats }
    }
}

/// Run `matcher` on its own task when its domain is in scope.
///
/// A panicking collaborator degrades only its own domain.
async fn run_if<F>(enabled: bool, domain: Domain, matcher: F) -> Option<MatchOutcome>
where
    F: Future<Output = MatchOutcome> + Send + 'static,
{
    if !enabled {
        return None;
    }

    match tokio::spawn(matcher).await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            tracing::error!("{} matcher task failed: {}", domain, e);
            Some(MatchOutcome::Degraded {
                domain,
                error: SourceError::Unavailable(format!("matcher task failed: {}", e)),
            })
        }
    }
}
