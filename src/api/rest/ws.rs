use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use futures::SinkExt;
use futures::StreamExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::ActingIdentity;
use crate::error::DispatchError;
use crate::state::AppState;

/// A partner's live connection. While this socket is open the partner
/// counts as online for broadcast scoping and receives new-order pushes.
pub async fn partner_ws(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
) -> Response {
    if !identity.can_act_as_partner() {
        return DispatchError::Unauthorized.into_response();
    }

    ws.on_upgrade(move |socket| handle_push_socket(socket, state, identity.id, "partner"))
        .into_response()
}

/// A customer tracking one of their orders: receives order-assigned and
/// update-partner-location events.
pub async fn track_ws(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
    Path(order_id): Path<Uuid>,
) -> Response {
    let customer_id = match state.orders.get(&order_id) {
        Some(order) => order.customer_id,
        None => {
            return DispatchError::NotFound(format!("order {order_id} not found")).into_response()
        }
    };

    if !identity.can_view_order(customer_id) {
        return DispatchError::Unauthorized.into_response();
    }

    ws.on_upgrade(move |socket| handle_push_socket(socket, state, customer_id, "tracker"))
        .into_response()
}

/// Events addressed to a single entity flow through its registry
/// connection. A reconnect displaces this socket; events sent while nobody
/// is connected are dropped, not replayed.
async fn handle_push_socket(socket: WebSocket, state: Arc<AppState>, entity_id: Uuid, kind: &str) {
    let (session, mut rx) = state.registry.connect(entity_id);
    let (mut sender, mut receiver) = socket.split();

    info!(entity_id = %entity_id, kind, "live connection opened");

    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize push event");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.registry.disconnect(entity_id, session);
    info!(entity_id = %entity_id, kind, "live connection closed");
}

/// Admin aggregation feed: every location frame of every partner with an
/// active delivery.
pub async fn admin_ws(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
) -> Response {
    if !identity.is_admin() {
        return DispatchError::Unauthorized.into_response();
    }

    ws.on_upgrade(move |socket| handle_admin_socket(socket, state))
        .into_response()
}

async fn handle_admin_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut feed_rx = state.admin_feed_tx.subscribe();

    info!("admin feed connected");

    let send_task = tokio::spawn(async move {
        while let Ok(update) = feed_rx.recv().await {
            let json = match serde_json::to_string(&update) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize feed frame");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!("admin feed disconnected");
}
