use std::future::Future;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::segment::Segment;
use crate::error::AppError;
use crate::notify::Notifier;
use crate::observability::metrics::Metrics;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum ViewState {
    Loading,
    Loaded,
    Error(String),
}

/// Sequence number of a fetch. Only the most recently issued ticket may
/// replace the list contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

#[derive(Debug)]
pub enum LoadOutcome {
    Applied,
    Stale,
    Failed(AppError),
}

/// What a screen renders.
#[derive(Debug, Clone, Serialize)]
pub struct ListSnapshot<T, S> {
    pub state: ViewState,
    pub loading: bool,
    pub error: Option<String>,
    pub segment: S,
    /// Size of the unfiltered result set.
    pub total: usize,
    /// Size of the displayed subset.
    pub count: usize,
    pub items: Vec<T>,
}

/// Unfiltered result set plus the subset admitted by the active segment.
#[derive(Debug)]
pub struct FilteredList<T, S> {
    items: Vec<T>,
    displayed: Vec<T>,
    segment: S,
    state: ViewState,
    issued: u64,
    needs_load: bool,
}

impl<T, S> FilteredList<T, S>
where
    T: Clone,
    S: Segment<T>,
{
    pub fn new(segment: S) -> Self {
        Self {
            items: Vec::new(),
            displayed: Vec::new(),
            segment,
            state: ViewState::Loading,
            issued: 0,
            needs_load: true,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == ViewState::Loading
    }

    /// True until a fetch has been started, and again after `clear`.
    pub fn never_loaded(&self) -> bool {
        self.needs_load
    }

    pub fn segment(&self) -> S {
        self.segment
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn displayed(&self) -> &[T] {
        &self.displayed
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        self.needs_load = false;
        self.state = ViewState::Loading;
        LoadTicket(self.issued)
    }

    /// Forgets the fetched data, e.g. when the session changes. Fetches
    /// already in flight become stale.
    pub fn clear(&mut self) {
        self.issued += 1;
        self.needs_load = true;
        self.items.clear();
        self.displayed.clear();
        self.state = ViewState::Loading;
    }

    /// Applies a fetch result unless a newer fetch has been started since.
    /// A failure keeps the previous items.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<T>, AppError>,
        now: DateTime<Utc>,
    ) -> LoadOutcome {
        if ticket.0 != self.issued {
            return LoadOutcome::Stale;
        }

        match result {
            Ok(items) => {
                self.items = items;
                self.refilter(now);
                self.state = ViewState::Loaded;
                LoadOutcome::Applied
            }
            Err(err) => {
                let mut message = err.notice_text();
                if message.trim().is_empty() {
                    message = "unexpected error".to_string();
                }
                self.state = ViewState::Error(message);
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Switches the segment and re-derives the displayed subset locally.
    pub fn select(&mut self, segment: S, now: DateTime<Utc>) {
        self.segment = segment;
        self.refilter(now);
    }

    pub fn refilter(&mut self, now: DateTime<Utc>) {
        let segment = self.segment;
        self.displayed = self
            .items
            .iter()
            .filter(|item| segment.admits(item, now))
            .cloned()
            .collect();
    }

    pub fn snapshot(&self) -> ListSnapshot<T, S> {
        let error = match &self.state {
            ViewState::Error(message) => Some(message.clone()),
            _ => None,
        };
        ListSnapshot {
            state: self.state.clone(),
            loading: self.is_loading(),
            error,
            segment: self.segment,
            total: self.items.len(),
            count: self.displayed.len(),
            items: self.displayed.clone(),
        }
    }
}

/// Fetches into `list` under a fresh ticket. The lock is released while the
/// fetch runs. Failures become the list's error state and a danger notice.
pub async fn run_load<T, S, F, Fut>(
    list: &Mutex<FilteredList<T, S>>,
    view: &str,
    metrics: &Metrics,
    notifier: &Notifier,
    fetch: F,
) -> Result<(), AppError>
where
    T: Clone,
    S: Segment<T>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, AppError>>,
{
    let ticket = list.lock().await.begin_load();
    let started = Instant::now();

    let result = fetch().await;

    metrics
        .list_load_latency_seconds
        .with_label_values(&[view])
        .observe(started.elapsed().as_secs_f64());

    let outcome = list.lock().await.finish_load(ticket, result, Utc::now());
    match outcome {
        LoadOutcome::Applied => {
            metrics
                .list_loads_total
                .with_label_values(&[view, "success"])
                .inc();
            Ok(())
        }
        LoadOutcome::Stale => {
            metrics.stale_responses_total.with_label_values(&[view]).inc();
            debug!(view, ?ticket, "dropped superseded load");
            Ok(())
        }
        LoadOutcome::Failed(err) => {
            metrics
                .list_loads_total
                .with_label_values(&[view, "error"])
                .inc();
            warn!(view, error = %err, "list load failed");
            notifier.danger(err.notice_text());
            Err(err)
        }
    }
}
