use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::{ActionRequest, TemplateRequest};
use crate::services::dispatch::{self, Delivery};
use crate::state::AppState;

// POST /api/whatsapp
pub async fn dispatch_action(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, AppError> {
    let body = body.map_err(|rejection| {
        tracing::warn!(error = %rejection, "failed to read request body");
        AppError::BodyRejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    })?;

    let request = ActionRequest::from_slice(&body).inspect_err(|e| {
        tracing::warn!(error = %e, "rejected action envelope");
    })?;

    tracing::info!(action = request.kind().as_str(), mode = state.mode().as_str(), "handling action");

    match request {
        ActionRequest::OptIn(opt_in) => {
            let record = dispatch::record_opt_in(opt_in);
            Ok(Json(json!({
                "success": true,
                "message": "Opt-in successfully recorded",
                "data": record,
            })))
        }
        ActionRequest::SendTemplate(template) => template_response(&state, &template).await,
        ActionRequest::SendPromotional(broadcast) => {
            let responses = dispatch::broadcast(&state, &broadcast).await;
            let message = if state.messaging.is_some() {
                "Promotional broadcast processed"
            } else {
                "Promotional broadcast queued"
            };
            Ok(Json(json!({
                "success": true,
                "message": message,
                "responses": responses,
            })))
        }
        ActionRequest::SendAbandonedCart(cart) => {
            let template = dispatch::abandoned_cart_template(cart, &state.config.booking_url);
            template_response(&state, &template).await
        }
    }
}

async fn template_response(
    state: &AppState,
    template: &TemplateRequest,
) -> Result<Json<Value>, AppError> {
    match dispatch::send_template(state, template).await? {
        Delivery::Simulated(payload) => Ok(Json(json!({
            "success": true,
            "message": "Template message would be sent (simulation)",
            "payload": payload,
        }))),
        Delivery::Sent(response) => Ok(Json(json!({
            "success": true,
            "response": response,
        }))),
    }
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
