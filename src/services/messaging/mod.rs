pub mod graph;

use async_trait::async_trait;

use crate::models::TemplatePayload;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered with a non-2xx status.
    #[error("provider rejected request ({status})")]
    Rejected {
        status: u16,
        body: serde_json::Value,
    },

    /// Connection failure, timeout, or unreadable response.
    #[error("provider unreachable: {0}")]
    Unreachable(String),
}

impl ProviderError {
    /// Only 5xx answers and transport failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Rejected { status, .. } => *status >= 500,
            ProviderError::Unreachable(_) => true,
        }
    }
}

#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// Delivers one template message and returns the provider's JSON reply.
    async fn send_template(
        &self,
        payload: &TemplatePayload,
    ) -> Result<serde_json::Value, ProviderError>;
}
