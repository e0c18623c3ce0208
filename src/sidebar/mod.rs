//! Slide-over topic sidebar: two independently cached views sharing one filter.
//!
//! The owner drives everything. Fetches run as spawned tasks and report back
//! over a channel; a completion is applied only while its generation is still
//! the view's in-flight one, so late results from cancelled or superseded
//! fetches are dropped.

pub mod state;

use crate::api::{PracticeApi, TopicList};
use crate::bus::{AppEvent, EventBus, Subscription, THEME_CHANGED};
use crate::fetch::FetchError;
use crate::practice::ProblemLoader;
use crate::prefs::AppTheme;
use crate::topics::{
    available_categories, available_difficulties, ProblemData, Topic, TopicFilter,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use state::{Display, TopicView};

#[derive(Debug)]
pub struct FetchCompletion {
    list: TopicList,
    generation: u64,
    result: Result<Vec<Topic>, FetchError>,
}

/// What changed after [`Sidebar::next_update`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarUpdate {
    Topics(TopicList),
    Theme(AppTheme),
}

pub struct Sidebar {
    api: Arc<PracticeApi>,
    cache_ttl: Option<Duration>,
    is_open: bool,
    active: TopicList,
    filter: TopicFilter,
    recent: TopicView,
    all: TopicView,
    theme: AppTheme,
    theme_events: Subscription,
    next_generation: u64,
    root: CancellationToken,
    tx: mpsc::UnboundedSender<FetchCompletion>,
    rx: mpsc::UnboundedReceiver<FetchCompletion>,
}

impl Sidebar {
    pub fn new(
        api: Arc<PracticeApi>,
        cache_ttl: Option<Duration>,
        theme: AppTheme,
        bus: &dyn EventBus,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            cache_ttl,
            is_open: false,
            active: TopicList::Recent,
            filter: TopicFilter::default(),
            recent: TopicView::new(TopicList::Recent),
            all: TopicView::new(TopicList::All),
            theme,
            theme_events: bus.subscribe(&[THEME_CHANGED]),
            next_generation: 0,
            root: CancellationToken::new(),
            tx,
            rx,
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn active(&self) -> TopicList {
        self.active
    }

    pub fn filter(&self) -> &TopicFilter {
        &self.filter
    }

    pub fn theme(&self) -> AppTheme {
        self.theme
    }

    pub fn view(&self, list: TopicList) -> &TopicView {
        match list {
            TopicList::Recent => &self.recent,
            TopicList::All => &self.all,
        }
    }

    fn view_mut(&mut self, list: TopicList) -> &mut TopicView {
        match list {
            TopicList::Recent => &mut self.recent,
            TopicList::All => &mut self.all,
        }
    }

    pub fn display(&self, list: TopicList) -> Display<'_> {
        self.view(list).display()
    }

    pub fn active_display(&self) -> Display<'_> {
        self.display(self.active)
    }

    /// Whether any fetch is still outstanding.
    pub fn has_pending(&self) -> bool {
        self.recent.has_fetch_in_flight() || self.all.has_fetch_in_flight()
    }

    pub fn open(&mut self) {
        self.is_open = true;
        self.ensure_fresh(self.active);
    }

    /// Cancel both views' fetches. Cached topics survive for the next open.
    pub fn close(&mut self) {
        self.is_open = false;
        self.recent.cancel();
        self.all.cancel();
    }

    /// Pick `topic`: the sidebar closes first, cancelling its fetches, then
    /// the problem loads through `loader`.
    pub async fn practice(
        &mut self,
        loader: &ProblemLoader,
        topic: &str,
        cancel: &CancellationToken,
    ) -> Result<ProblemData, FetchError> {
        self.close();
        loader.practice(topic, cancel).await
    }

    /// Switch tabs. The other view keeps its cache and any fetch in flight.
    pub fn set_view(&mut self, list: TopicList) {
        self.active = list;
        if self.is_open {
            self.ensure_fresh(list);
        }
    }

    /// Refetch `list` regardless of what is cached.
    pub fn refresh(&mut self, list: TopicList) {
        self.start_fetch(list);
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
        self.refilter();
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.filter.category = category.into();
        self.refilter();
    }

    pub fn set_difficulty(&mut self, difficulty: impl Into<String>) {
        self.filter.difficulty = difficulty.into();
        self.refilter();
    }

    pub fn reset_filters(&mut self) {
        self.filter.reset();
        self.refilter();
    }

    pub fn has_active_filters(&self) -> bool {
        self.filter.is_active()
    }

    pub fn available_categories(&self) -> Vec<String> {
        available_categories(self.all.raw_items())
    }

    pub fn available_difficulties(&self) -> Vec<String> {
        available_difficulties(self.all.raw_items())
    }

    fn refilter(&mut self) {
        self.recent.refilter(&self.filter);
        self.all.refilter(&self.filter);
    }

    fn ensure_fresh(&mut self, list: TopicList) {
        let view = self.view(list);
        if view.has_fetch_in_flight() || view.is_fresh(self.cache_ttl) {
            debug!(%list, "topics cached or already loading");
            return;
        }
        self.start_fetch(list);
    }

    fn start_fetch(&mut self, list: TopicList) {
        self.next_generation += 1;
        let generation = self.next_generation;
        let cancel = self.root.child_token();
        self.view_mut(list).begin(generation, cancel.clone());

        let api = self.api.clone();
        let tx = self.tx.clone();
        debug!(%list, generation, "fetching topics");
        tokio::spawn(async move {
            let result = api.topics(list, &cancel).await;
            if matches!(result, Err(FetchError::Cancelled)) {
                return;
            }
            // The sidebar may already be gone.
            let _ = tx.send(FetchCompletion {
                list,
                generation,
                result,
            });
        });
    }

    /// Apply a finished fetch. Returns false when it was stale and ignored.
    pub fn apply(&mut self, completion: FetchCompletion) -> bool {
        let FetchCompletion {
            list,
            generation,
            result,
        } = completion;
        if !self.view(list).is_current(generation) {
            debug!(%list, generation, "stale topic fetch ignored");
            return false;
        }
        let filter = self.filter.clone();
        let view = self.view_mut(list);
        match result {
            Ok(topics) => {
                info!(%list, count = topics.len(), "topics loaded");
                view.succeed(topics, &filter);
            }
            Err(e) => {
                warn!(%list, kind = ?e.kind(), "failed to load topics: {}", e);
                view.fail();
            }
        }
        true
    }

    fn apply_event(&mut self, event: AppEvent) -> Option<SidebarUpdate> {
        match event {
            AppEvent::ThemeChanged { theme } => {
                self.theme = theme;
                Some(SidebarUpdate::Theme(theme))
            }
            _ => None,
        }
    }

    /// Wait for the next fetch result or theme change and apply it.
    /// Stale completions are skipped. Waits indefinitely when nothing is in
    /// flight and no theme change arrives.
    pub async fn next_update(&mut self) -> Option<SidebarUpdate> {
        loop {
            tokio::select! {
                Some(done) = self.rx.recv() => {
                    let list = done.list;
                    if self.apply(done) {
                        return Some(SidebarUpdate::Topics(list));
                    }
                }
                Some(event) = self.theme_events.recv() => {
                    if let Some(update) = self.apply_event(event) {
                        return Some(update);
                    }
                }
                else => return None,
            }
        }
    }

    /// Apply whatever is already waiting without blocking.
    pub fn poll_updates(&mut self) -> Vec<SidebarUpdate> {
        let mut updates = Vec::new();
        while let Ok(done) = self.rx.try_recv() {
            let list = done.list;
            if self.apply(done) {
                updates.push(SidebarUpdate::Topics(list));
            }
        }
        while let Some(event) = self.theme_events.try_recv() {
            updates.extend(self.apply_event(event));
        }
        updates
    }

    /// Drive updates until no fetch is outstanding.
    pub async fn settle(&mut self) {
        while self.has_pending() {
            if self.next_update().await.is_none() {
                break;
            }
        }
    }
}

impl Drop for Sidebar {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
