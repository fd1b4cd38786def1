use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub const WHATSAPP_PATH: &str = "/api/whatsapp";

pub fn app(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            WHATSAPP_PATH,
            post(handlers::whatsapp::dispatch_action)
                .fallback(handlers::whatsapp::method_not_allowed),
        )
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http());

    // CorsLayer answers every OPTIONS itself, so it is only mounted for a
    // configured cross-origin page.
    let router = match cors_layer(state.config.cors_allow_origin.as_deref()) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.with_state(state)
}

fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let value = match HeaderValue::from_str(origin?) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring invalid CORS_ALLOW_ORIGIN");
            return None;
        }
    };

    Some(
        CorsLayer::new()
            .allow_origin(value)
            .allow_methods([Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    )
}
