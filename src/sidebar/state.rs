use crate::api::TopicList;
use crate::topics::{Topic, TopicFilter};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// What a view should render right now. Exactly one applies at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Display<'a> {
    Loading,
    Error(&'a str),
    /// The server returned nothing at all.
    NoData,
    /// There is data, but nothing passes the filter.
    NoMatches { filters_active: bool },
    Topics(&'a [Topic]),
}

#[derive(Debug)]
pub(super) struct InFlight {
    pub generation: u64,
    pub cancel: CancellationToken,
}

/// Fetch/cache/filter state of one sidebar tab.
#[derive(Debug)]
pub struct TopicView {
    list: TopicList,
    is_loading: bool,
    error: Option<String>,
    raw: Vec<Topic>,
    filtered: Vec<Topic>,
    filters_active: bool,
    fetched_at: Option<Instant>,
    pub(super) in_flight: Option<InFlight>,
}

impl TopicView {
    pub fn new(list: TopicList) -> Self {
        Self {
            list,
            is_loading: false,
            error: None,
            raw: Vec::new(),
            filtered: Vec::new(),
            filters_active: false,
            fetched_at: None,
            in_flight: None,
        }
    }

    pub fn list(&self) -> TopicList {
        self.list
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Topics exactly as the server sent them.
    pub fn raw_items(&self) -> &[Topic] {
        &self.raw
    }

    pub fn filtered_items(&self) -> &[Topic] {
        &self.filtered
    }

    pub fn fetched_at(&self) -> Option<Instant> {
        self.fetched_at
    }

    pub fn has_fetch_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Holds successfully fetched data that has not outlived `ttl`.
    /// `None` means cached data never expires.
    pub fn is_fresh(&self, ttl: Option<Duration>) -> bool {
        if self.error.is_some() {
            return false;
        }
        match (self.fetched_at, ttl) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(at), Some(ttl)) => at.elapsed() < ttl,
        }
    }

    pub fn display(&self) -> Display<'_> {
        if self.is_loading {
            Display::Loading
        } else if let Some(err) = &self.error {
            Display::Error(err)
        } else if self.raw.is_empty() {
            Display::NoData
        } else if self.filtered.is_empty() {
            Display::NoMatches {
                filters_active: self.filters_active,
            }
        } else {
            Display::Topics(&self.filtered)
        }
    }

    pub(super) fn begin(&mut self, generation: u64, cancel: CancellationToken) {
        if let Some(previous) = self.in_flight.take() {
            previous.cancel.cancel();
        }
        self.is_loading = true;
        self.in_flight = Some(InFlight { generation, cancel });
    }

    /// Drop any in-flight fetch. Loading is cleared; cached data stays.
    pub(super) fn cancel(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel.cancel();
        }
        self.is_loading = false;
    }

    /// Whether a completion tagged `generation` is still wanted.
    pub(super) fn is_current(&self, generation: u64) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|f| f.generation == generation && !f.cancel.is_cancelled())
    }

    /// Replace the source list wholesale and rebuild the filtered view.
    pub(super) fn succeed(&mut self, topics: Vec<Topic>, filter: &TopicFilter) {
        self.in_flight = None;
        self.is_loading = false;
        self.error = None;
        self.raw = topics;
        self.fetched_at = Some(Instant::now());
        self.refilter(filter);
    }

    pub(super) fn fail(&mut self) {
        self.in_flight = None;
        self.is_loading = false;
        self.error = Some(self.list.failure_message().to_string());
        self.raw = Vec::new();
        self.filtered = Vec::new();
        self.fetched_at = None;
    }

    pub(super) fn refilter(&mut self, filter: &TopicFilter) {
        self.filtered = filter.apply(&self.raw);
        self.filters_active = filter.is_active();
    }
}
