//! Debounced, sequenced live search over paused tokio time

mod common;

use common::{device, hours_ago, identity};
use std::sync::Arc;
use std::time::Duration;
use vigil::search::{
    Domain, LiveSearch, QueryDispatcher, SearchFilters, SearchScope, SearchStatus, Tab,
    ViewProjector,
};
use vigil::sources::InMemorySource;

const QUIET: Duration = Duration::from_millis(300);

fn source() -> InMemorySource {
    InMemorySource::new()
        .with_devices(vec![
            device("d1", "Lobby", true, hours_ago(3)),
            device("d2", "Lobby Annex", false, hours_ago(1)),
        ])
        .with_identities(vec![identity("i1", "Lobby Staff", true, hours_ago(2))])
}

fn session(source: &InMemorySource) -> LiveSearch {
    let dispatcher = QueryDispatcher::from_source(Arc::new(source.clone()), 200);
    LiveSearch::spawn(Arc::new(dispatcher), SearchScope::All, QUIET)
}

#[tokio::test(start_paused = true)]
async fn test_keystrokes_collapse_into_one_cycle() {
    let source = source();
    let mut live = session(&source);

    for text in ["l", "lo", "lob", "lobb", "lobby"] {
        live.input(text).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(source.total_calls(), 0);

    let published = live.changed().await.unwrap();
    assert_eq!(published.query.text(), "lobby");
    assert_eq!(published.response.stats.total_results, 3);
    assert_eq!(live.cycles_issued(), 1);
    assert_eq!(source.calls(Domain::Device), 1);

    live.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_submit_skips_the_quiet_period() {
    let source = source();
    let mut live = session(&source);

    let start = tokio::time::Instant::now();
    live.submit("staff").await.unwrap();
    let published = live.changed().await.unwrap();

    assert!(start.elapsed() < QUIET);
    assert_eq!(published.response.stats.identities_count, 1);

    live.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stale_cycle_never_overwrites_newer_one() {
    let source = source();
    let mut live = session(&source);

    // First cycle is slow on every domain
    for domain in Domain::ALL {
        source.set_delay(domain, Duration::from_secs(2));
    }
    live.submit("lob").await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    for domain in Domain::ALL {
        source.set_delay(domain, Duration::ZERO);
    }
    live.submit("lobby staff").await.unwrap();

    let published = live.changed().await.unwrap();
    assert_eq!(published.cycle, 2);
    assert_eq!(published.query.text(), "lobby staff");

    // Let the first cycle settle; it must be dropped
    tokio::time::sleep(Duration::from_secs(5)).await;
    let latest = live.latest().unwrap();
    assert_eq!(latest.cycle, 2);
    assert_eq!(latest.query.text(), "lobby staff");
    assert_eq!(source.calls(Domain::Device), 2);

    live.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_filter_change_reruns_current_text() {
    let source = source();
    let mut live = session(&source);

    live.submit("lobby").await.unwrap();
    let first = live.changed().await.unwrap();
    assert_eq!(first.response.stats.devices_count, 2);

    live.set_filters(SearchFilters::new().active_only(true))
        .await
        .unwrap();
    let second = live.changed().await.unwrap();

    assert!(second.cycle > first.cycle);
    assert_eq!(second.query.text(), "lobby");
    assert!(second.query.filters().active_only);
    assert_eq!(second.response.stats.devices_count, 1);

    live.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_tab_switch_does_not_dispatch() {
    let source = source();
    let mut live = session(&source);

    live.submit("lobby").await.unwrap();
    let published = live.changed().await.unwrap();
    let calls = source.total_calls();

    let mut view = ViewProjector::default();
    assert!(view.select_tab(Tab::Identities));
    let identities = view.project(&published.response.results);
    assert_eq!(identities.len(), 1);
    assert_eq!(view.tab_counts(&published.response.results).all, 3);

    assert!(!view.select_tab(Tab::Identities));
    tokio::time::sleep(QUIET * 2).await;
    assert_eq!(source.total_calls(), calls);
    assert_eq!(live.cycles_issued(), 1);

    live.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_clearing_the_box_publishes_skipped_cycle() {
    let source = source();
    let mut live = session(&source);

    live.input("   ").await.unwrap();
    let published = live.changed().await.unwrap();

    assert_eq!(published.response.stats.status, SearchStatus::Skipped);
    assert!(published.response.results.is_empty());
    assert_eq!(source.total_calls(), 0);

    live.shutdown().await;
}
