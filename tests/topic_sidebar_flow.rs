// End-to-end topic sidebar behaviour against a canned backend

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use practice_core::api::{PracticeApi, TopicList};
    use practice_core::bus::BroadcastBus;
    use practice_core::fetch::{FetchRequest, RawResponse, RetryPolicy, Transport};
    use practice_core::prefs::AppTheme;
    use practice_core::sidebar::{Display, Sidebar};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    /// Answers each path from a queue; the last answer repeats.
    #[derive(Default)]
    struct CannedBackend {
        answers: Mutex<HashMap<String, Vec<(u16, String)>>>,
        calls: Mutex<Vec<String>>,
    }

    impl CannedBackend {
        fn answer(&self, path: &str, answers: &[(u16, &str)]) {
            self.answers.lock().unwrap().insert(
                path.to_string(),
                answers.iter().map(|(s, b)| (*s, b.to_string())).collect(),
            );
        }

        fn calls_to(&self, path: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|url| url.ends_with(path))
                .count()
        }
    }

    #[async_trait]
    impl Transport for CannedBackend {
        async fn send(&self, request: &FetchRequest) -> anyhow::Result<RawResponse> {
            self.calls.lock().unwrap().push(request.url.clone());
            let path = request
                .url
                .strip_prefix("http://backend.test")
                .unwrap_or(&request.url)
                .to_string();
            let mut answers = self.answers.lock().unwrap();
            let (status, body) = match answers.get_mut(&path) {
                Some(queue) if queue.len() > 1 => queue.remove(0),
                Some(queue) => queue[0].clone(),
                None => (404, String::new()),
            };
            Ok(RawResponse::new(status, body))
        }
    }

    const TOPICS: &str = r#"{"success":true,"data":[
        {"name":"two_sum","category":"hashmap","difficulty":"Easy",
         "last_used":"2025-01-01T10:00:00Z"},
        {"name":"merge_intervals","category":"interval","difficulty":"Medium",
         "last_used":1735725600000}
    ]}"#;

    fn setup(backend: &Arc<CannedBackend>) -> (Sidebar, Arc<BroadcastBus>) {
        let policy = RetryPolicy {
            jitter_max_ms: 0,
            ..RetryPolicy::default()
        };
        let api = PracticeApi::new(backend.clone(), "http://backend.test", policy).unwrap();
        let bus = Arc::new(BroadcastBus::new());
        let sidebar = Sidebar::new(Arc::new(api), None, AppTheme::Light, bus.as_ref());
        (sidebar, bus)
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_server_errors_recovered() {
        let backend = Arc::new(CannedBackend::default());
        backend.answer(
            "/api/recent-topics",
            &[(503, ""), (502, "<html>bad gateway</html>"), (200, TOPICS)],
        );
        let (mut sidebar, _bus) = setup(&backend);

        let started = Instant::now();
        sidebar.open();
        sidebar.settle().await;

        // 300ms then 600ms of backoff before the third attempt succeeds
        assert_eq!(started.elapsed(), Duration::from_millis(900));
        assert_eq!(backend.calls_to("/api/recent-topics"), 3);
        assert!(matches!(sidebar.active_display(), Display::Topics(t) if t.len() == 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_failure_gives_up_after_max_retries() {
        let backend = Arc::new(CannedBackend::default());
        backend.answer("/api/all-topics", &[(500, "")]);
        let (mut sidebar, _bus) = setup(&backend);

        sidebar.set_view(TopicList::All);
        sidebar.open();
        sidebar.settle().await;

        assert_eq!(backend.calls_to("/api/all-topics"), 4);
        assert_eq!(
            sidebar.active_display(),
            Display::Error("Failed to load topics. Please try again later.")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsuccessful_envelope_not_retried() {
        let backend = Arc::new(CannedBackend::default());
        backend.answer("/api/all-topics", &[(200, r#"{"success":false}"#)]);
        let (mut sidebar, _bus) = setup(&backend);

        sidebar.set_view(TopicList::All);
        sidebar.open();
        sidebar.settle().await;

        let view = sidebar.view(TopicList::All);
        assert_eq!(backend.calls_to("/api/all-topics"), 1);
        assert!(view.error().is_some());
        assert!(view.raw_items().is_empty());
        assert!(view.filtered_items().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_is_terminal() {
        let backend = Arc::new(CannedBackend::default());
        backend.answer("/api/recent-topics", &[(429, r#"{"message":"slow down"}"#)]);
        let (mut sidebar, _bus) = setup(&backend);

        sidebar.open();
        sidebar.settle().await;
        assert_eq!(backend.calls_to("/api/recent-topics"), 1);
        assert!(sidebar.view(TopicList::Recent).error().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tab_round_trip_and_filtering() {
        let backend = Arc::new(CannedBackend::default());
        backend.answer("/api/recent-topics", &[(200, TOPICS)]);
        backend.answer("/api/all-topics", &[(200, TOPICS)]);
        let (mut sidebar, _bus) = setup(&backend);

        sidebar.open();
        sidebar.settle().await;
        sidebar.set_view(TopicList::All);
        sidebar.settle().await;
        sidebar.set_view(TopicList::Recent);
        sidebar.settle().await;
        assert_eq!(backend.calls_to("/api/recent-topics"), 1);

        sidebar.set_search("SUM");
        for list in [TopicList::Recent, TopicList::All] {
            let names: Vec<&str> = sidebar
                .view(list)
                .filtered_items()
                .iter()
                .map(|t| t.name.as_str())
                .collect();
            assert_eq!(names, vec!["two_sum"]);
        }

        sidebar.reset_filters();
        sidebar.set_difficulty("medium");
        assert!(matches!(
            sidebar.active_display(),
            Display::Topics(t) if t[0].name == "merge_intervals"
        ));
        assert_eq!(backend.calls_to("/api/all-topics"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_after_close_uses_cache() {
        let backend = Arc::new(CannedBackend::default());
        backend.answer("/api/recent-topics", &[(200, TOPICS)]);
        let (mut sidebar, _bus) = setup(&backend);

        sidebar.open();
        sidebar.settle().await;
        sidebar.close();
        sidebar.open();
        assert!(!sidebar.has_pending());
        assert_eq!(sidebar.view(TopicList::Recent).raw_items().len(), 2);
        assert_eq!(backend.calls_to("/api/recent-topics"), 1);
    }
}
