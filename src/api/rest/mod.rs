pub mod orders;
pub mod partners;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::auth::ActingIdentity;
use crate::engine::relay::{self, ActiveDelivery};
use crate::error::DispatchError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(orders::router())
        .merge(partners::router())
        .route("/admin/active-deliveries", get(active_deliveries))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws/partner", get(ws::partner_ws))
        .route("/ws/track/:order_id", get(ws::track_ws))
        .route("/ws/admin", get(ws::admin_ws))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    orders: usize,
    assignments: usize,
    partners: usize,
    online: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        orders: state.orders.len(),
        assignments: state.assignments.len(),
        partners: state.partners.len(),
        online: state.registry.online_count(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}

async fn active_deliveries(
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
) -> Result<Json<Vec<ActiveDelivery>>, DispatchError> {
    if !identity.is_admin() {
        return Err(DispatchError::Unauthorized);
    }

    Ok(Json(relay::active_deliveries(&state)))
}
