//! Tab slicing over an already-ranked result set

use crate::search::domain::Domain;
use crate::search::normalize::NormalizedResult;
use crate::search::rank::RankedResultSet;
use crate::search::SearchScope;
use serde::{Deserialize, Serialize};

/// Tabs share their values with the query scope (`all|devices|identities|events`)
pub type Tab = SearchScope;

/// Per-tab badge counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabCounts {
    pub all: usize,
    pub devices: usize,
    pub identities: usize,
    pub events: usize,
}

/// Results for `tab`, in upstream order. Never re-ranks.
pub fn project(set: &RankedResultSet, tab: Tab) -> Vec<&NormalizedResult> {
    match tab.domain() {
        None => set.iter().collect(),
        Some(domain) => set.iter().filter(|r| r.domain == domain).collect(),
    }
}

/// Holds the selected tab; switching tabs only re-slices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewProjector {
    tab: Tab,
}

impl ViewProjector {
    pub fn new(tab: Tab) -> Self {
        Self { tab }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// Returns true if the selection changed
    pub fn select_tab(&mut self, tab: Tab) -> bool {
        let changed = self.tab != tab;
        self.tab = tab;
        changed
    }

    pub fn project<'a>(&self, set: &'a RankedResultSet) -> Vec<&'a NormalizedResult> {
        project(set, self.tab)
    }

    pub fn tab_counts(&self, set: &RankedResultSet) -> TabCounts {
        TabCounts {
            all: set.len(),
            devices: set.count_for(Domain::Device),
            identities: set.count_for(Domain::Identity),
            events: set.count_for(Domain::Event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::domain::{Device, Identity, RecordId};
    use crate::search::matcher::MatchOutcome;
    use crate::search::normalize::Normalize;
    use crate::search::rank::aggregate;
    use chrono::{Duration, Utc};
    use std::time::Instant;

    fn ranked() -> RankedResultSet {
        let now = Utc::now();
        let device = |id: &str, hours: i64| {
            Device {
                id: RecordId::from(id),
                display_name: id.to_string(),
                location_label: None,
                is_active: true,
                created_at: now - Duration::hours(hours),
            }
            .normalize(false)
        };
        let identity = |id: &str, hours: i64| {
            Identity {
                id: RecordId::from(id),
                display_name: id.to_string(),
                description: None,
                is_active: true,
                created_at: now - Duration::hours(hours),
            }
            .normalize(false)
        };

        let outcomes = vec![
            MatchOutcome::Matched {
                domain: Domain::Device,
                results: vec![device("d1", 1), device("d2", 3)],
            },
            MatchOutcome::Matched {
                domain: Domain::Identity,
                results: vec![identity("i1", 2), identity("i2", 4)],
            },
        ];
        aggregate(outcomes, Instant::now()).0
    }

    #[test]
    fn test_all_tab_is_identity() {
        let set = ranked();
        let all = project(&set, Tab::All);

        assert_eq!(all.len(), set.len());
        assert!(all.iter().zip(set.iter()).all(|(a, b)| *a == b));
    }

    #[test]
    fn test_domain_tab_keeps_relative_order() {
        let set = ranked();
        let ids: Vec<_> = project(&set, Tab::Identities)
            .iter()
            .map(|r| r.id.as_str())
            .collect();

        assert_eq!(ids, vec!["i1", "i2"]);
        assert!(project(&set, Tab::Events).is_empty());
    }

    #[test]
    fn test_select_tab() {
        let set = ranked();
        let mut projector = ViewProjector::default();
        assert_eq!(projector.tab(), Tab::All);

        assert!(projector.select_tab(Tab::Devices));
        assert!(!projector.select_tab(Tab::Devices));
        assert_eq!(projector.project(&set).len(), 2);

        let counts = projector.tab_counts(&set);
        assert_eq!(
            counts,
            TabCounts {
                all: 4,
                devices: 2,
                identities: 2,
                events: 0
            }
        );
    }
}
