use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::models::assignment::Assignment;
use crate::models::order::{DeliveryAddress, OrderStatus};
use crate::models::partner::DeliveryPartner;
use crate::push::event::PushEvent;
use crate::state::AppState;

/// What a partner sees in their offer queue.
#[derive(Debug, Clone, Serialize)]
pub struct OfferView {
    pub assignment_id: Uuid,
    pub order_id: Uuid,
    pub batch_id: String,
    pub address: DeliveryAddress,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}

/// Consumes confirmed orders from the queue and turns each into a
/// broadcasted offer. Confirmation returns to the caller immediately;
/// fan-out happens here.
pub async fn run_broadcast_worker(state: Arc<AppState>, mut confirmed_rx: mpsc::Receiver<Uuid>) {
    info!("broadcast worker started");

    while let Some(order_id) = confirmed_rx.recv().await {
        if let Err(err) = broadcast_order(&state, order_id) {
            warn!(order_id = %order_id, error = %err, "failed to broadcast order");
        }
    }

    warn!("broadcast worker stopped: confirmed queue closed");
}

/// Creates one Broadcasted assignment for a confirmed order and pushes a
/// new-order event to every partner in scope.
pub fn broadcast_order(state: &AppState, order_id: Uuid) -> Result<Assignment, DispatchError> {
    let order = state
        .orders
        .get(&order_id)
        .ok_or_else(|| DispatchError::NotFound(format!("order {order_id} not found")))?
        .value()
        .clone();

    // The order may have been cancelled between confirmation and pickup
    // from the queue; a stale broadcast would offer work nobody can claim.
    if order.status != OrderStatus::Confirmed {
        return Err(DispatchError::StaleState {
            expected: "Confirmed".to_string(),
            found: format!("{:?}", order.status),
        });
    }

    let eligible: Vec<DeliveryPartner> = state
        .partners
        .iter()
        .filter(|entry| entry.available && state.registry.is_online(entry.id))
        .map(|entry| entry.value().clone())
        .collect();

    let scope = state.broadcast_policy.scope(&order, &eligible);
    let assignment = Assignment::new(order.id, scope.clone());

    state.assignments.insert(assignment.id, assignment.clone());
    if let Some(mut stored) = state.orders.get_mut(&order.id) {
        stored.assignment_id = Some(assignment.id);
    }
    state.metrics.offers_open.inc();

    for partner_id in &scope {
        let delivered = state.registry.send(
            *partner_id,
            PushEvent::NewOrder {
                assignment_id: assignment.id,
                order_id: order.id,
                batch_id: order.batch_id.clone(),
                address: order.address.clone(),
                total_amount: order.total_amount,
            },
        );
        state.metrics.record_push("new-order", delivered);
    }

    info!(
        order_id = %order.id,
        assignment_id = %assignment.id,
        partners = scope.len(),
        "offer broadcasted"
    );

    Ok(assignment)
}

/// Offers currently open for a given partner: still broadcasted, and never
/// declined by that partner. A decline is permanent per (partner, offer),
/// so this holds across reconnects and re-broadcasts.
pub fn open_offers_for(state: &AppState, partner_id: Uuid) -> Vec<OfferView> {
    state
        .assignments
        .iter()
        .filter(|entry| entry.open_for(partner_id))
        .filter_map(|entry| {
            let order = state.orders.get(&entry.order_id)?;
            Some(OfferView {
                assignment_id: entry.id,
                order_id: order.id,
                batch_id: order.batch_id.clone(),
                address: order.address.clone(),
                total_amount: order.total_amount,
                created_at: entry.created_at,
            })
        })
        .collect()
}
