//! Same-process publish/subscribe for loosely coupled UI regions.
//!
//! Delivery is at-most-once per emission and only to subscribers that exist
//! when the event is published. Nothing is replayed; a subscriber that falls
//! too far behind skips what it missed.

use crate::prefs::AppTheme;
use crate::topics::ProblemData;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

pub const THEME_CHANGED: &str = "themeChanged";
pub const SHOW_LOADING: &str = "showLoading";
pub const UPDATE_PROBLEM_DATA: &str = "updateProblemData";
pub const SHOW_ERROR: &str = "showError";

const BUS_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    ThemeChanged { theme: AppTheme },
    ShowLoading(bool),
    UpdateProblemData(Box<ProblemData>),
    ShowError(String),
}

impl AppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::ThemeChanged { .. } => THEME_CHANGED,
            AppEvent::ShowLoading(_) => SHOW_LOADING,
            AppEvent::UpdateProblemData(_) => UPDATE_PROBLEM_DATA,
            AppEvent::ShowError(_) => SHOW_ERROR,
        }
    }
}

pub trait EventBus: Send + Sync {
    /// Broadcast `event`. Returns how many subscribers it reached.
    fn publish(&self, event: AppEvent) -> usize;

    /// Subscribe to the named events; an empty list means every event.
    fn subscribe(&self, names: &[&'static str]) -> Subscription;
}

pub struct Subscription {
    rx: broadcast::Receiver<AppEvent>,
    names: Vec<&'static str>,
}

impl Subscription {
    fn wants(&self, event: &AppEvent) -> bool {
        self.names.is_empty() || self.names.contains(&event.name())
    }

    /// Next matching event, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<AppEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event that is already waiting, without blocking.
    pub fn try_recv(&mut self) -> Option<AppEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event subscriber lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

pub struct BroadcastBus {
    tx: broadcast::Sender<AppEvent>,
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }
}

impl EventBus for BroadcastBus {
    fn publish(&self, event: AppEvent) -> usize {
        let name = event.name();
        // No subscribers is not an error; the event is simply dropped.
        let reached = self.tx.send(event).unwrap_or(0);
        tracing::trace!(event = name, reached, "published");
        reached
    }

    fn subscribe(&self, names: &[&'static str]) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            names: names.to_vec(),
        }
    }
}
