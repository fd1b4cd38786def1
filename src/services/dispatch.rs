use chrono::Utc;
use serde::Serialize;

use crate::models::{
    AbandonedCartRequest, BroadcastRequest, OptInRecord, OptInRequest, PhoneNumber,
    TemplatePayload, TemplateRequest,
};
use crate::services::messaging::ProviderError;
use crate::state::AppState;

pub const ABANDONED_CART_TEMPLATE: &str = "abandoned_cart";
pub const ABANDONED_CART_LANGUAGE: &str = "en";

/// Opt-ins are echoed back, not stored; repeats are accepted as new records.
pub fn record_opt_in(request: OptInRequest) -> OptInRecord {
    let record = OptInRecord::from_request(request, Utc::now().naive_utc());
    tracing::info!(phone = %record.phone, source = %record.source, "opt-in recorded");
    record
}

pub fn abandoned_cart_template(request: AbandonedCartRequest, booking_url: &str) -> TemplateRequest {
    let details = request.booking_details;
    TemplateRequest {
        phone: request.phone,
        template: ABANDONED_CART_TEMPLATE.to_string(),
        language: ABANDONED_CART_LANGUAGE.to_string(),
        parameters: vec![details.dates, details.guests, booking_url.to_string()],
    }
}

pub fn build_payload(request: &TemplateRequest) -> TemplatePayload {
    TemplatePayload::new(
        request.phone.clone(),
        &request.template,
        &request.language,
        &request.parameters,
    )
}

#[derive(Debug)]
pub enum Delivery {
    Simulated(TemplatePayload),
    Sent(serde_json::Value),
}

pub async fn send_template(
    state: &AppState,
    request: &TemplateRequest,
) -> Result<Delivery, ProviderError> {
    let payload = build_payload(request);

    let Some(provider) = state.messaging.as_ref() else {
        tracing::info!(
            to = %payload.to,
            template = %payload.template.name,
            "template message simulated"
        );
        return Ok(Delivery::Simulated(payload));
    };

    match provider.send_template(&payload).await {
        Ok(body) => {
            tracing::info!(to = %payload.to, template = %payload.template.name, "template message sent");
            Ok(Delivery::Sent(body))
        }
        Err(e) => {
            tracing::error!(
                to = %payload.to,
                template = %payload.template.name,
                error = %e,
                "template message failed"
            );
            Err(e)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientStatus {
    Queued,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipientOutcome {
    pub phone: String,
    pub status: RecipientStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecipientOutcome {
    fn new(phone: &str, status: RecipientStatus) -> Self {
        Self {
            phone: phone.to_string(),
            status,
            response: None,
            error: None,
        }
    }
}

/// Sends to each recipient in order. A failed recipient is reported in its
/// own entry and the rest of the batch carries on.
pub async fn broadcast(state: &AppState, request: &BroadcastRequest) -> Vec<RecipientOutcome> {
    let mut outcomes = Vec::with_capacity(request.phones.len());

    for raw in &request.phones {
        let Some(phone) = PhoneNumber::normalize(raw) else {
            tracing::warn!(phone = %raw, "skipping recipient without a usable number");
            outcomes.push(RecipientOutcome {
                error: Some("invalid phone number".to_string()),
                ..RecipientOutcome::new(raw, RecipientStatus::Failed)
            });
            continue;
        };

        let single = TemplateRequest {
            phone,
            template: request.template.clone(),
            language: request.language.clone(),
            parameters: request.parameters.clone(),
        };

        let outcome = match send_template(state, &single).await {
            Ok(Delivery::Simulated(_)) => RecipientOutcome::new(raw, RecipientStatus::Queued),
            Ok(Delivery::Sent(body)) => RecipientOutcome {
                response: Some(body),
                ..RecipientOutcome::new(raw, RecipientStatus::Sent)
            },
            Err(e) => {
                let response = match &e {
                    ProviderError::Rejected { body, .. } => Some(body.clone()),
                    ProviderError::Unreachable(_) => None,
                };
                RecipientOutcome {
                    response,
                    error: Some(e.to_string()),
                    ..RecipientOutcome::new(raw, RecipientStatus::Failed)
                }
            }
        };
        outcomes.push(outcome);
    }

    tracing::info!(
        template = %request.template,
        recipients = outcomes.len(),
        failed = outcomes.iter().filter(|o| o.status == RecipientStatus::Failed).count(),
        "promotional broadcast processed"
    );

    outcomes
}
