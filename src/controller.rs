//! The feed controller: coordinates category, query, and page state against
//! the remote paginated headlines API.
//!
//! All fetch work runs in spawned tasks that report back over an mpsc
//! channel as [`FeedEvent`]s; the controller mutates state only in its
//! synchronous operation methods and in [`FeedController::handle_event`].
//! Overlapping requests are never cancelled — each dispatched request
//! carries a monotonically increasing generation number and settlements
//! from superseded requests are discarded, so a slow page-1 response can
//! never overwrite a fast page-2 response. The search debounce is guarded
//! the same way: windows are counted, and a firing from a superseded
//! window is ignored even if it was already queued when the supersession
//! happened.

use crate::client::{ApiClient, Article, FetchError, PageRequest, PAGE_SIZE};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Quiescence window for search input. A burst of `set_query` calls closer
/// together than this fires exactly one refresh.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Events from spawned background tasks, consumed by the owner of the
/// controller (the UI loop, or a test harness).
#[derive(Debug)]
pub enum FeedEvent {
    /// A page fetch settled.
    ///
    /// `generation` is the request counter at dispatch time; settlements
    /// whose generation is not the latest issued are discarded.
    PageLoaded {
        generation: u64,
        result: Result<Vec<Article>, FetchError>,
    },
    /// The search quiescence window elapsed without another keystroke.
    ///
    /// `generation` is the debounce counter at schedule time. A firing can
    /// already be queued in the channel when a newer `set_query` arrives;
    /// such a firing is stale and must not trigger a refresh.
    QueryDebounced { generation: u64 },
}

/// Owns the feed state and the one operation that advances it: dispatch a
/// page fetch, then apply its settlement.
///
/// Request lifecycle: `Idle → Loading → {Success, Failure} → Idle`.
/// No retries, no caching, no persistence.
pub struct FeedController {
    client: Arc<ApiClient>,
    events: mpsc::Sender<FeedEvent>,

    /// Current page of headlines. Replaced wholesale on success; left
    /// untouched on failure (the renderer shows the error branch instead).
    articles: Arc<Vec<Article>>,
    loading: bool,
    error: Option<String>,

    category: String,
    page: u32,
    query: String,

    /// Generation of the most recently dispatched request.
    generation: u64,
    /// Generation of the most recently scheduled debounce window. Bumped
    /// whenever a window is scheduled or cancelled, so a firing queued by
    /// an older window is recognizably stale.
    debounce_generation: u64,
    /// Pending debounce timer task. Aborted and respawned on every
    /// `set_query` so at most one trailing refresh fires per burst.
    debounce_handle: Option<JoinHandle<()>>,
}

impl FeedController {
    /// Create a controller and issue the initial fetch with default state
    /// (page 1, empty query, the given category).
    ///
    /// Must be called within a tokio runtime: the initial fetch is spawned
    /// immediately.
    pub fn new(
        client: Arc<ApiClient>,
        default_category: impl Into<String>,
        events: mpsc::Sender<FeedEvent>,
    ) -> Self {
        let mut controller = Self {
            client,
            events,
            articles: Arc::new(Vec::new()),
            loading: false,
            error: None,
            category: default_category.into(),
            page: 1,
            query: String::new(),
            generation: 0,
            debounce_generation: 0,
            debounce_handle: None,
        };
        controller.refresh();
        controller
    }

    // ------------------------------------------------------------------
    // Renderer-facing state
    // ------------------------------------------------------------------

    pub fn articles(&self) -> &Arc<Vec<Article>> {
        &self.articles
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Whether advancing to the next page is worthwhile.
    ///
    /// Heuristic: a page shorter than [`PAGE_SIZE`] was the last one. The
    /// API does not report a total count, so a full page is the only signal
    /// that more may follow.
    pub fn has_next_page(&self) -> bool {
        !self.loading && self.articles.len() == PAGE_SIZE
    }

    pub fn has_prev_page(&self) -> bool {
        !self.loading && self.page > 1
    }

    // ------------------------------------------------------------------
    // Operations (the renderer's callback hooks)
    // ------------------------------------------------------------------

    /// Dispatch a fetch for the current `{category, query, page}` state.
    ///
    /// Returns immediately; the settlement arrives later as
    /// [`FeedEvent::PageLoaded`]. Exactly one outbound request per call.
    pub fn refresh(&mut self) {
        self.loading = true;
        self.error = None;
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;

        let request = PageRequest {
            category: self.category.clone(),
            query: self.query.clone(),
            page: self.page,
        };

        tracing::debug!(
            generation,
            category = %request.category,
            query = %request.query,
            page = request.page,
            "Dispatching page fetch"
        );

        let client = Arc::clone(&self.client);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = client.top_headlines(&request).await;
            if let Err(e) = tx.send(FeedEvent::PageLoaded { generation, result }).await {
                tracing::warn!(error = %e, "Failed to send fetch result (receiver dropped)");
            }
        });
    }

    /// Switch category: back to page 1, fetch immediately (not debounced).
    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
        self.page = 1;
        self.cancel_debounce();
        self.refresh();
    }

    /// Update the search query: back to page 1, fetch after the quiescence
    /// window. Calling again before the window elapses restarts the timer
    /// (cancel-and-reschedule, never delay-then-fire), so exactly one
    /// refresh fires per burst of rapid calls.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
        self.cancel_debounce();
        let generation = self.debounce_generation;

        let tx = self.events.clone();
        // The deadline is fixed here, not when the spawned task first runs.
        let window = tokio::time::sleep(SEARCH_DEBOUNCE);
        self.debounce_handle = Some(tokio::spawn(async move {
            window.await;
            if let Err(e) = tx.send(FeedEvent::QueryDebounced { generation }).await {
                tracing::warn!(error = %e, "Failed to send debounce event (receiver dropped)");
            }
        }));
    }

    /// Advance one page and fetch immediately.
    pub fn next_page(&mut self) {
        self.page += 1;
        self.cancel_debounce();
        self.refresh();
    }

    /// Go back one page and fetch immediately. Clamped at page 1: the
    /// renderer disables the control there, but a direct call must not
    /// drive the page to 0.
    pub fn prev_page(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
        self.cancel_debounce();
        self.refresh();
    }

    // ------------------------------------------------------------------
    // Event handling
    // ------------------------------------------------------------------

    /// Apply a background event to controller state.
    pub fn handle_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::PageLoaded { generation, result } => {
                if generation != self.generation {
                    tracing::debug!(
                        generation,
                        latest = self.generation,
                        "Discarding settlement of superseded request"
                    );
                    return;
                }
                self.loading = false;
                match result {
                    Ok(articles) => {
                        tracing::debug!(count = articles.len(), page = self.page, "Page loaded");
                        self.articles = Arc::new(articles);
                        self.error = None;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Page fetch failed");
                        // Articles intentionally left as-is.
                        self.error = Some(e.to_string());
                    }
                }
            }
            FeedEvent::QueryDebounced { generation } => {
                if generation != self.debounce_generation {
                    tracing::debug!(
                        generation,
                        latest = self.debounce_generation,
                        "Discarding firing of superseded debounce window"
                    );
                    return;
                }
                self.debounce_handle = None;
                self.refresh();
            }
        }
    }

    fn cancel_debounce(&mut self) {
        // The bump also invalidates a firing that an elapsed window has
        // already pushed into the channel but nothing has consumed yet.
        self.debounce_generation = self.debounce_generation.wrapping_add(1);
        if let Some(handle) = self.debounce_handle.take() {
            handle.abort();
            tracing::debug!("Cancelled pending search debounce");
        }
    }
}

/// Abort the pending debounce task on drop so no orphaned timer keeps a
/// channel sender alive after the controller is gone.
impl Drop for FeedController {
    fn drop(&mut self) {
        if let Some(handle) = self.debounce_handle.take() {
            handle.abort();
        }
    }
}
