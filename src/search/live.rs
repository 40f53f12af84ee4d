// Live search: debounced keystrokes, sequenced dispatch cycles, latest-wins publishing

use crate::error::{Result, VigilError};
use crate::search::dispatcher::{QueryDispatcher, SearchResponse};
use crate::search::{SearchFilters, SearchQuery, SearchScope};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant};

/// Default quiet period before a keystroke is dispatched
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

const INPUT_BUFFER: usize = 64;

/// Issues monotonically increasing cycle numbers
#[derive(Debug, Default)]
pub struct CycleTracker {
    latest: AtomicU64,
}

impl CycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new cycle; every earlier cycle becomes stale
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, cycle: u64) -> bool {
        self.latest() == cycle
    }
}

/// Single-shot timer that restarts on every reset
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Arm (or re-arm) the timer, discarding any earlier deadline
    pub fn reset(&mut self) {
        self.deadline = Some(Instant::now() + self.quiet);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves once the quiet period elapses; pending forever while disarmed
    pub async fn fired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                time::sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

/// A completed cycle that was still the latest when it finished
#[derive(Debug, Clone)]
pub struct PublishedSearch {
    pub cycle: u64,
    pub query: SearchQuery,
    pub response: Arc<SearchResponse>,
}

#[derive(Debug)]
enum LiveInput {
    Text(String),
    Submit(String),
    Filters(SearchFilters),
}

/// Interactive search session fed by keystrokes
pub struct LiveSearch {
    input_tx: mpsc::Sender<LiveInput>,
    published: watch::Receiver<Option<PublishedSearch>>,
    tracker: Arc<CycleTracker>,
    worker: JoinHandle<()>,
}

impl LiveSearch {
    /// Spawn the session worker on the current runtime
    pub fn spawn(dispatcher: Arc<QueryDispatcher>, scope: SearchScope, quiet: Duration) -> Self {
        let (input_tx, input_rx) = mpsc::channel(INPUT_BUFFER);
        let (published_tx, published) = watch::channel(None);
        let tracker = Arc::new(CycleTracker::new());

        let worker = tokio::spawn(live_worker(
            input_rx,
            dispatcher,
            tracker.clone(),
            Arc::new(published_tx),
            scope,
            quiet,
        ));

        Self {
            input_tx,
            published,
            tracker,
            worker,
        }
    }

    /// Text changed; dispatched after the quiet period
    pub async fn input(&self, text: impl Into<String>) -> Result<()> {
        self.send(LiveInput::Text(text.into())).await
    }

    /// Explicit submit; dispatched immediately
    pub async fn submit(&self, text: impl Into<String>) -> Result<()> {
        self.send(LiveInput::Submit(text.into())).await
    }

    /// Filters changed; re-runs the current text after the quiet period
    pub async fn set_filters(&self, filters: SearchFilters) -> Result<()> {
        self.send(LiveInput::Filters(filters)).await
    }

    async fn send(&self, input: LiveInput) -> Result<()> {
        self.input_tx
            .send(input)
            .await
            .map_err(|_| VigilError::Search("Live search worker stopped".to_string()))
    }

    /// The most recently published cycle, if any
    pub fn latest(&self) -> Option<PublishedSearch> {
        self.published.borrow().clone()
    }

    /// Wait for the next publication. `None` once the session has shut down.
    pub async fn changed(&mut self) -> Option<PublishedSearch> {
        self.published.changed().await.ok()?;
        self.published.borrow_and_update().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PublishedSearch>> {
        self.published.clone()
    }

    pub fn cycles_issued(&self) -> u64 {
        self.tracker.latest()
    }

    /// Stop accepting input and wait for in-flight cycles to settle
    pub async fn shutdown(self) {
        let LiveSearch {
            input_tx, worker, ..
        } = self;
        drop(input_tx);

        if let Err(e) = worker.await {
            tracing::error!("Live search worker failed: {}", e);
        }
    }
}

async fn live_worker(
    mut input_rx: mpsc::Receiver<LiveInput>,
    dispatcher: Arc<QueryDispatcher>,
    tracker: Arc<CycleTracker>,
    published: Arc<watch::Sender<Option<PublishedSearch>>>,
    scope: SearchScope,
    quiet: Duration,
) {
    let mut debouncer = Debouncer::new(quiet);
    let mut in_flight = JoinSet::new();
    let mut text = String::new();
    let mut filters = SearchFilters::default();

    loop {
        tokio::select! {
            input = input_rx.recv() => match input {
                Some(LiveInput::Text(next)) => {
                    text = next;
                    debouncer.reset();
                }
                Some(LiveInput::Filters(next)) => {
                    filters = next;
                    debouncer.reset();
                }
                Some(LiveInput::Submit(next)) => {
                    text = next;
                    debouncer.cancel();
                    let query = SearchQuery::new(&text).with_scope(scope).with_filters(filters.clone());
                    start_cycle(&mut in_flight, &dispatcher, &tracker, &published, query);
                }
                None => break,
            },

            _ = debouncer.fired() => {
                let query = SearchQuery::new(&text).with_scope(scope).with_filters(filters.clone());
                start_cycle(&mut in_flight, &dispatcher, &tracker, &published, query);
            }

            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!("Search cycle task failed: {}", e);
                }
            }
        }
    }

    if !in_flight.is_empty() {
        tracing::debug!("Draining {} in-flight search cycles", in_flight.len());
    }
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Search cycle task failed: {}", e);
        }
    }
}

fn start_cycle(
    in_flight: &mut JoinSet<()>,
    dispatcher: &Arc<QueryDispatcher>,
    tracker: &Arc<CycleTracker>,
    published: &Arc<watch::Sender<Option<PublishedSearch>>>,
    query: SearchQuery,
) {
    let cycle = tracker.issue();
    let dispatcher = dispatcher.clone();
    let tracker = tracker.clone();
    let published = published.clone();

    tracing::debug!("Starting search cycle {} for '{}'", cycle, query.text());

    in_flight.spawn(async move {
        let response = dispatcher.dispatch(&query).await;
        let publication = PublishedSearch {
            cycle,
            query,
            response: Arc::new(response),
        };

        // Check and swap under the channel lock so an older cycle can never
        // land after a newer one
        let accepted = published.send_if_modified(|current| {
            let newer = current.as_ref().map_or(true, |p| p.cycle < cycle);
            if newer && tracker.is_current(cycle) {
                *current = Some(publication);
                true
            } else {
                false
            }
        });

        if !accepted {
            tracing::debug!(
                "Dropping stale search cycle {} (latest is {})",
                cycle,
                tracker.latest()
            );
        }
    });
}
