use super::{FetchRequest, Method, RawResponse, Transport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Production transport backed by a pooled reqwest client.
///
/// Timeouts are not configured here; the fetcher bounds every attempt itself
/// so scripted transports see the same timeout behaviour.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .user_agent(concat!("practice-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &FetchRequest) -> Result<RawResponse> {
        let mut req = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("{} {} failed", request.method, request.url))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .with_context(|| format!("failed to read body of {}", request.url))?;

        Ok(RawResponse { status, body })
    }
}
