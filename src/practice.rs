//! Loads a practice problem and announces progress on the bus.

use crate::api::PracticeApi;
use crate::bus::{AppEvent, EventBus};
use crate::fetch::FetchError;
use crate::topics::ProblemData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub struct ProblemLoader {
    api: Arc<PracticeApi>,
    bus: Arc<dyn EventBus>,
}

impl ProblemLoader {
    pub fn new(api: Arc<PracticeApi>, bus: Arc<dyn EventBus>) -> Self {
        Self { api, bus }
    }

    /// Publishes `showLoading(true)`, then the problem or an error message,
    /// and always `showLoading(false)` last. Cancellation publishes no error.
    pub async fn practice(
        &self,
        topic: &str,
        cancel: &CancellationToken,
    ) -> Result<ProblemData, FetchError> {
        self.bus.publish(AppEvent::ShowLoading(true));
        let result = self.api.question(topic, cancel).await;
        match &result {
            Ok(problem) => {
                info!(topic, title = %problem.title, "question loaded");
                self.bus
                    .publish(AppEvent::UpdateProblemData(Box::new(problem.clone())));
            }
            Err(FetchError::Cancelled) => {}
            Err(e) => {
                error!(topic, "failed to load question: {}", e);
                self.bus.publish(AppEvent::ShowError(format!(
                    "Failed to load question: {}",
                    failure_reason(e)
                )));
            }
        }
        self.bus.publish(AppEvent::ShowLoading(false));
        result
    }
}

/// HTTP failures read like the status line; anything else keeps its own text.
fn failure_reason(err: &FetchError) -> String {
    match err.status() {
        Some(status) => {
            let reason = reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string());
            format!("Failed to fetch question: {}", reason)
        }
        None => err.to_string(),
    }
}
