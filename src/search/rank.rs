//! Merge, deduplicate, rank and count per-domain results

use crate::search::domain::{Domain, RecordId};
use crate::search::matcher::MatchOutcome;
use crate::search::normalize::NormalizedResult;
use ahash::{HashSet, HashSetExt};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;

/// Notice shown when no domain could be searched
pub const SEARCH_FAILED_NOTICE: &str = "Search could not be completed";

/// Aggregate outcome of one dispatch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    /// Every dispatched domain answered
    Complete,
    /// At least one domain failed, at least one answered
    Partial,
    /// Every dispatched domain failed
    Failed,
    /// Empty query; nothing was dispatched
    Skipped,
}

/// Derived statistics, recomputed on every aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub total_results: usize,
    pub devices_count: usize,
    pub identities_count: usize,
    pub events_count: usize,
    /// Domains whose collaborator failed this cycle
    pub degraded_domains: Vec<Domain>,
    pub elapsed_ms: u64,
    pub status: SearchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl SearchStats {
    /// Zero stats for a short-circuited empty query
    pub fn skipped() -> Self {
        Self {
            total_results: 0,
            devices_count: 0,
            identities_count: 0,
            events_count: 0,
            degraded_domains: Vec::new(),
            elapsed_ms: 0,
            status: SearchStatus::Skipped,
            notice: None,
        }
    }

    pub fn count_for(&self, domain: Domain) -> usize {
        match domain {
            Domain::Device => self.devices_count,
            Domain::Identity => self.identities_count,
            Domain::Event => self.events_count,
        }
    }

    pub fn is_degraded(&self, domain: Domain) -> bool {
        self.degraded_domains.contains(&domain)
    }

    /// True when the empty list means "search failed" rather than "no matches"
    pub fn failed(&self) -> bool {
        self.status == SearchStatus::Failed
    }
}

/// Ranked results of one cycle. Position is rank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedResultSet {
    results: Vec<NormalizedResult>,
}

impl RankedResultSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedResult> {
        self.results.iter()
    }

    pub fn as_slice(&self) -> &[NormalizedResult] {
        &self.results
    }

    /// The first `n` results; rank is unaffected
    pub fn top(&self, n: usize) -> &[NormalizedResult] {
        &self.results[..n.min(self.results.len())]
    }

    pub fn count_for(&self, domain: Domain) -> usize {
        self.results.iter().filter(|r| r.domain == domain).count()
    }

    pub fn into_vec(self) -> Vec<NormalizedResult> {
        self.results
    }
}

impl<'a> IntoIterator for &'a RankedResultSet {
    type Item = &'a NormalizedResult;
    type IntoIter = std::slice::Iter<'a, NormalizedResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Exact matches first, then most recent first
pub fn compare_ranked(a: &NormalizedResult, b: &NormalizedResult) -> Ordering {
    let (a, b) = (a.ranking_key(), b.ranking_key());
    b.is_exact_match
        .cmp(&a.is_exact_match)
        .then_with(|| b.sort_timestamp.cmp(&a.sort_timestamp))
}

/// Drop repeated `(domain, id)` pairs, keeping the first occurrence
fn deduplicate(results: Vec<NormalizedResult>) -> Vec<NormalizedResult> {
    let mut seen: HashSet<(Domain, RecordId)> = HashSet::new();

    results
        .into_iter()
        .filter(|result| seen.insert((result.domain, result.id.clone())))
        .collect()
}

/// Merge per-domain outcomes into one ranked set plus stats.
///
/// `started` is the instant the dispatch cycle began.
pub fn aggregate(outcomes: Vec<MatchOutcome>, started: Instant) -> (RankedResultSet, SearchStats) {
    let dispatched = outcomes.len();
    let mut degraded_domains = Vec::new();
    let mut merged = Vec::new();

    for outcome in outcomes {
        match outcome {
            MatchOutcome::Matched { results, .. } => merged.extend(results),
            MatchOutcome::Degraded { domain, .. } => degraded_domains.push(domain),
        }
    }

    let mut results = deduplicate(merged);
    // sort_by is stable: equal keys keep their merge order
    results.sort_by(compare_ranked);

    let set = RankedResultSet { results };

    let status = match degraded_domains.len() {
        _ if dispatched == 0 => SearchStatus::Skipped,
        0 => SearchStatus::Complete,
        n if n == dispatched => SearchStatus::Failed,
        _ => SearchStatus::Partial,
    };

    let stats = SearchStats {
        total_results: set.len(),
        devices_count: set.count_for(Domain::Device),
        identities_count: set.count_for(Domain::Identity),
        events_count: set.count_for(Domain::Event),
        degraded_domains,
        elapsed_ms: started.elapsed().as_millis() as u64,
        status,
        notice: (status == SearchStatus::Failed).then(|| SEARCH_FAILED_NOTICE.to_string()),
    };

    (set, stats)
}
