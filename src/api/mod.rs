//! Typed client for the practice backend.

use crate::fetch::{FetchError, FetchRequest, ResilientFetcher, RetryPolicy, Transport};
use crate::topics::{parse_topic_envelope, ProblemData, QuestionPayload, Topic};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The two topic listings the sidebar can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicList {
    Recent,
    All,
}

impl TopicList {
    pub fn path(self) -> &'static str {
        match self {
            TopicList::Recent => "/api/recent-topics",
            TopicList::All => "/api/all-topics",
        }
    }

    /// Message shown when the listing cannot be loaded.
    pub fn failure_message(self) -> &'static str {
        match self {
            TopicList::Recent => "Failed to load recent topics. Please try again later.",
            TopicList::All => "Failed to load topics. Please try again later.",
        }
    }
}

impl fmt::Display for TopicList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicList::Recent => f.write_str("recent"),
            TopicList::All => f.write_str("all"),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeLanguageRequest<'a> {
    code: &'a str,
    from_lang: &'a str,
    to_lang: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChangeLanguageResponse {
    code: String,
}

pub struct PracticeApi {
    fetcher: ResilientFetcher,
    base_url: String,
    policy: RetryPolicy,
}

impl PracticeApi {
    pub fn new(transport: Arc<dyn Transport>, base_url: &str, policy: RetryPolicy) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .with_context(|| format!("invalid API base URL: {}", base_url))?;
        Ok(Self {
            fetcher: ResilientFetcher::new(transport),
            base_url,
            policy,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch one topic listing and validate its envelope.
    pub async fn topics(
        &self,
        list: TopicList,
        cancel: &CancellationToken,
    ) -> Result<Vec<Topic>, FetchError> {
        let request = FetchRequest::get(self.endpoint(list.path()));
        let body: serde_json::Value = self
            .fetcher
            .fetch_json(&request, &self.policy, cancel)
            .await?;
        parse_topic_envelope(body)
    }

    pub async fn recent_topics(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Topic>, FetchError> {
        self.topics(TopicList::Recent, cancel).await
    }

    pub async fn all_topics(&self, cancel: &CancellationToken) -> Result<Vec<Topic>, FetchError> {
        self.topics(TopicList::All, cancel).await
    }

    /// Fetch the practice problem for `topic`, filling in display defaults.
    pub async fn question(
        &self,
        topic: &str,
        cancel: &CancellationToken,
    ) -> Result<ProblemData, FetchError> {
        let url = reqwest::Url::parse_with_params(
            &self.endpoint("/get_dsa_question"),
            &[("topic", topic)],
        )
        .map_err(invalid_url)?;
        let request = FetchRequest::get(url.as_str());
        let payload: QuestionPayload = self
            .fetcher
            .fetch_json(&request, &self.policy, cancel)
            .await?;
        Ok(ProblemData::from_payload(payload, topic))
    }

    /// Ask the backend to translate `code` between languages. Not retried.
    pub async fn change_language(
        &self,
        code: &str,
        from_lang: &str,
        to_lang: &str,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        let body = serde_json::to_value(ChangeLanguageRequest {
            code,
            from_lang,
            to_lang,
        })
        .map_err(|e| FetchError::Parse(e.to_string()))?;
        let request = FetchRequest::post_json(self.endpoint("/changeLanguage"), body);
        let resp: ChangeLanguageResponse = self
            .fetcher
            .fetch_json(&request, &self.policy.single_attempt(), cancel)
            .await?;
        Ok(resp.code)
    }
}

/// A URL we could not build locally; nothing was sent.
fn invalid_url(err: impl fmt::Display) -> FetchError {
    FetchError::Parse(format!("invalid request URL: {}", err))
}
