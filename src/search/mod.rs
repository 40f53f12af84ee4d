//! Federated search across the device, identity and event domains
//!
//! A query flows through the pipeline in this order:
//!
//! 1. `QueryDispatcher` fans out to the applicable domain matchers concurrently
//! 2. Each matcher filters its collaborator's records, then text-matches them
//! 3. Hits are normalized into a single tagged result shape
//! 4. `aggregate` merges, deduplicates, ranks and counts
//! 5. `ViewProjector` slices the ranked set for the selected tab

mod deep_link;
mod dispatcher;
mod domain;
mod filters;
mod live;
mod matcher;
mod normalize;
mod rank;
mod view;

pub use deep_link::DeepLink;
pub use dispatcher::{QueryDispatcher, SearchResponse, DEFAULT_EVENT_FETCH_LIMIT};
pub use domain::{
    Device, DeviceDirectory, Domain, Event, EventLog, EventQuery, EventsResponse, Identity,
    IdentityDirectory, RecordId, SourceError,
};
pub use filters::{apply_filters, DateRange, Filterable};
pub use live::{CycleTracker, Debouncer, LiveSearch, PublishedSearch, DEFAULT_DEBOUNCE};
pub use matcher::{DeviceMatcher, EventMatcher, IdentityMatcher, MatchOutcome, Searchable};
pub use normalize::{Normalize, NormalizedResult, RankingKey, ResultPayload};
pub use rank::{
    aggregate, compare_ranked, RankedResultSet, SearchStats, SearchStatus, SEARCH_FAILED_NOTICE,
};
pub use view::{project, Tab, TabCounts, ViewProjector};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which domains a query is dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    #[default]
    All,
    Devices,
    Identities,
    Events,
}

impl SearchScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Devices => "devices",
            Self::Identities => "identities",
            Self::Events => "events",
        }
    }

    /// Parse the `type` value used in search links and on the command line
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(Self::All),
            "devices" | "device" | "cameras" => Some(Self::Devices),
            "identities" | "identity" | "persons" | "people" => Some(Self::Identities),
            "events" | "event" | "detections" => Some(Self::Events),
            _ => None,
        }
    }

    /// The single domain this scope selects, or `None` for `All`
    pub fn domain(&self) -> Option<Domain> {
        match self {
            Self::All => None,
            Self::Devices => Some(Domain::Device),
            Self::Identities => Some(Domain::Identity),
            Self::Events => Some(Domain::Event),
        }
    }

    pub fn includes(&self, domain: Domain) -> bool {
        self.domain().map_or(true, |d| d == domain)
    }
}

impl From<Domain> for SearchScope {
    fn from(domain: Domain) -> Self {
        match domain {
            Domain::Device => Self::Devices,
            Domain::Identity => Self::Identities,
            Domain::Event => Self::Events,
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional narrowing filters. Each one only ever removes candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<RecordId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    /// Confidence floor in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,

    #[serde(default)]
    pub active_only: bool,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_device_id(mut self, id: impl Into<RecordId>) -> Self {
        self.device_id = Some(id.into());
        self
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn with_min_confidence(mut self, floor: f64) -> Self {
        self.min_confidence = Some(floor);
        self
    }

    pub fn active_only(mut self, active_only: bool) -> Self {
        self.active_only = active_only;
        self
    }
}

/// One immutable search request: trimmed text, scope and filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSearchQuery")]
pub struct SearchQuery {
    text: String,
    scope: SearchScope,
    filters: SearchFilters,
}

/// Wire shape; always rebuilt through the builders so text is trimmed and filters clamped
#[derive(Deserialize)]
struct RawSearchQuery {
    #[serde(default)]
    text: String,
    #[serde(default)]
    scope: SearchScope,
    #[serde(default)]
    filters: SearchFilters,
}

impl From<RawSearchQuery> for SearchQuery {
    fn from(raw: RawSearchQuery) -> Self {
        SearchQuery::new(raw.text)
            .with_scope(raw.scope)
            .with_filters(raw.filters)
    }
}

impl SearchQuery {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self {
            text: text.as_ref().trim().to_string(),
            scope: SearchScope::All,
            filters: SearchFilters::default(),
        }
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Filters are sanitized on the way in; malformed values are clamped, never rejected
    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters.sanitized();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Lowercased text used for case-insensitive comparison
    pub fn needle(&self) -> String {
        self.text.to_lowercase()
    }
}

/// Everything one dispatch cycle needs, passed explicitly through every stage
#[derive(Debug, Clone)]
pub struct SearchContext {
    pub query: SearchQuery,
    pub tab: Tab,
    /// Reference instant for relative date-range buckets
    pub issued_at: DateTime<Utc>,
}

impl SearchContext {
    pub fn new(query: SearchQuery) -> Self {
        let tab = query.scope();
        Self {
            query,
            tab,
            issued_at: Utc::now(),
        }
    }

    pub fn at(query: SearchQuery, issued_at: DateTime<Utc>) -> Self {
        let tab = query.scope();
        Self {
            query,
            tab,
            issued_at,
        }
    }

    pub fn with_tab(mut self, tab: Tab) -> Self {
        self.tab = tab;
        self
    }
}
