use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsEvent {
    pub action: &'static str,
    pub category: &'static str,
    pub label: &'static str,
    pub value: u32,
}

impl AnalyticsEvent {
    pub fn whatsapp_click() -> Self {
        Self {
            action: "click",
            category: "WhatsApp",
            label: "Direct Chat",
            value: 1,
        }
    }
}

pub trait AnalyticsSink: Send + Sync {
    fn track(&self, event: &AnalyticsEvent);
}

/// Default sink: the event only shows up in the log.
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn track(&self, event: &AnalyticsEvent) {
        tracing::info!(
            action = event.action,
            category = event.category,
            label = event.label,
            value = event.value,
            "analytics event"
        );
    }
}
