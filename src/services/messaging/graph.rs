use std::time::Duration;

use async_trait::async_trait;

use super::{MessagingProvider, ProviderError};
use crate::config::AppConfig;
use crate::models::TemplatePayload;

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// WhatsApp Cloud API client (`POST {base}{version}/{phone_number_id}/messages`).
pub struct GraphApiProvider {
    url: String,
    access_token: String,
    max_retries: u32,
    backoff: Duration,
    client: reqwest::Client,
}

impl GraphApiProvider {
    pub fn new(
        url: String,
        access_token: String,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url,
            access_token,
            max_retries,
            backoff: RETRY_BACKOFF,
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.messages_url(),
            config.access_token.clone(),
            config.provider_timeout,
            config.max_retries,
        )
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    async fn try_send(&self, payload: &TemplatePayload) -> Result<serde_json::Value, ProviderError> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.access_token)
            .json(payload)
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;

        let status = resp.status();
        // The status decides the outcome. An accepted message whose reply
        // body is lost must not be posted again.
        let body = match resp.text().await {
            Ok(text) => serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)),
            Err(e) => {
                tracing::warn!(status = status.as_u16(), error = %e, "failed to read provider reply");
                serde_json::Value::Null
            }
        };

        if !status.is_success() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl MessagingProvider for GraphApiProvider {
    async fn send_template(
        &self,
        payload: &TemplatePayload,
    ) -> Result<serde_json::Value, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.try_send(payload).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        to = %payload.to,
                        template = %payload.template.name,
                        attempt,
                        error = %e,
                        "provider call failed, retrying"
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
