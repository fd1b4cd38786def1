use crate::config::{AppConfig, DeliveryMode};
use crate::services::messaging::MessagingProvider;

pub struct AppState {
    pub config: AppConfig,
    /// `None` turns every send into a simulation that echoes the payload.
    pub messaging: Option<Box<dyn MessagingProvider>>,
}

impl AppState {
    pub fn mode(&self) -> DeliveryMode {
        if self.messaging.is_some() {
            DeliveryMode::Live
        } else {
            DeliveryMode::Simulate
        }
    }
}
