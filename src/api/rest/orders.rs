use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{ActingIdentity, Role};
use crate::engine::{completion, lifecycle};
use crate::error::DispatchError;
use crate::models::order::{DeliveryAddress, LineItem, Order};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/confirm", post(confirm_order))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/refund", post(refund_order))
        .route("/orders/:id/verify-code", post(verify_code))
        .route("/orders/batch/:batch_id", get(get_by_batch_id))
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<LineItem>,
    pub address: DeliveryAddress,
    pub payment_method: String,
    pub total_amount: f64,
}

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    pub code: String,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, DispatchError> {
    if identity.role != Role::Customer && identity.role != Role::Admin {
        return Err(DispatchError::Unauthorized);
    }

    if payload.total_amount <= 0.0 {
        return Err(DispatchError::BadRequest(
            "total_amount must be positive".to_string(),
        ));
    }

    let order = lifecycle::create_order(
        &state,
        identity.id,
        payload.items,
        payload.address,
        payload.payment_method,
        payload.total_amount,
    );

    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, DispatchError> {
    let order = state
        .orders
        .get(&id)
        .ok_or_else(|| DispatchError::NotFound(format!("order {id} not found")))?
        .value()
        .clone();

    if !identity.can_view_order(order.customer_id) {
        return Err(DispatchError::Unauthorized);
    }

    Ok(Json(order))
}

async fn get_by_batch_id(
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
    Path(batch_id): Path<String>,
) -> Result<Json<Order>, DispatchError> {
    let order = lifecycle::find_by_batch_id(&state, &batch_id)
        .ok_or_else(|| DispatchError::NotFound(format!("batch {batch_id} not found")))?;

    if !identity.can_view_order(order.customer_id) {
        return Err(DispatchError::Unauthorized);
    }

    Ok(Json(order))
}

/// Called by the payment flow once the order is paid for. Confirmation
/// also hands the order to the broadcast worker.
async fn confirm_order(
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, DispatchError> {
    let customer_id = owner_of(&state, id)?;
    if !identity.can_view_order(customer_id) {
        return Err(DispatchError::Unauthorized);
    }

    let order = lifecycle::confirm(&state, id)?;

    state
        .confirmed_tx
        .send(order.id)
        .await
        .map_err(|err| DispatchError::Internal(format!("confirmed queue send failed: {err}")))?;

    Ok(Json(order))
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, DispatchError> {
    let customer_id = owner_of(&state, id)?;
    if !identity.can_view_order(customer_id) {
        return Err(DispatchError::Unauthorized);
    }

    Ok(Json(lifecycle::cancel(&state, id)?))
}

/// Payment reversal; admin only.
async fn refund_order(
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, DispatchError> {
    if !identity.is_admin() {
        return Err(DispatchError::Unauthorized);
    }

    Ok(Json(lifecycle::refund(&state, id)?))
}

async fn verify_code(
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
    Path(id): Path<Uuid>,
    Json(payload): Json<VerifyCodeRequest>,
) -> Result<Json<Order>, DispatchError> {
    let order = completion::verify_delivery_code(&state, id, &payload.code, identity)?;
    Ok(Json(order))
}

fn owner_of(state: &AppState, order_id: Uuid) -> Result<Uuid, DispatchError> {
    state
        .orders
        .get(&order_id)
        .map(|order| order.customer_id)
        .ok_or_else(|| DispatchError::NotFound(format!("order {order_id} not found")))
}
