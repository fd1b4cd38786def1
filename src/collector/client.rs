use std::time::Duration;

use anyhow::Context;

use crate::models::ActionRequest;

#[derive(Debug, Clone)]
pub struct DispatchReply {
    pub status: u16,
    pub body: serde_json::Value,
}

impl DispatchReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Posts action envelopes to the dispatcher endpoint.
#[derive(Clone)]
pub struct DispatchClient {
    http: reqwest::Client,
    endpoint: String,
}

impl DispatchClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Non-2xx replies are returned, not turned into errors; the dispatcher
    /// always answers with a JSON body.
    pub async fn submit(&self, request: &ActionRequest) -> anyhow::Result<DispatchReply> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .context("failed to reach dispatcher")?;

        let status = resp.status().as_u16();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse dispatcher response")?;

        tracing::debug!(action = request.kind().as_str(), status, "dispatcher replied");
        Ok(DispatchReply { status, body })
    }
}
