use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, with_security_headers};
use crate::handlers::{booking_settlement, fee_breakdown, health_check, verify_payment};
use crate::state::AppState;

/// Middleware settings applied around every route.
#[derive(Debug, Clone, Default)]
pub struct HttpPolicy {
    pub include_hsts: bool,
    pub cors_allowed_origins: Option<String>,
}

pub fn create_routes(state: AppState, policy: &HttpPolicy) -> Router {
    let api = Router::new()
        .route("/payments/verify", post(verify_payment))
        .route("/bookings/:booking_id/settlement", get(booking_settlement))
        .route("/fees/breakdown", get(fee_breakdown));

    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .with_state(state);

    with_security_headers(router, policy.include_hsts)
        .layer(create_cors_layer(policy.cors_allowed_origins.as_deref()))
        .layer(TraceLayer::new_for_http())
}
