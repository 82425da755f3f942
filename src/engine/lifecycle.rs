use chrono::Utc;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::error::DispatchError;
use crate::models::order::{DeliveryAddress, LineItem, Order, OrderStatus};
use crate::state::AppState;

/// Creates and persists a new order in `Pending` with a freshly claimed
/// batch id.
pub fn create_order(
    state: &AppState,
    customer_id: Uuid,
    items: Vec<LineItem>,
    address: DeliveryAddress,
    payment_method: String,
    total_amount: f64,
) -> Order {
    let id = Uuid::new_v4();
    let batch_id = claim_batch_id(state, id);

    let order = Order {
        id,
        customer_id,
        items,
        address,
        payment_method,
        total_amount,
        status: OrderStatus::Pending,
        assignment_id: None,
        assigned_partner: None,
        delivery_otp: None,
        otp_verified: false,
        delivered_at: None,
        batch_id,
        created_at: Utc::now(),
    };

    state.orders.insert(order.id, order.clone());
    info!(order_id = %order.id, batch_id = %order.batch_id, "order created");
    order
}

/// Single atomic conditional transition, with extra mutation applied under
/// the same entry guard. Fails with `StaleState` when the order is not in
/// the expected status, leaving it untouched.
pub fn transition_with<F>(
    state: &AppState,
    order_id: Uuid,
    expected: OrderStatus,
    next: OrderStatus,
    mutate: F,
) -> Result<Order, DispatchError>
where
    F: FnOnce(&mut Order),
{
    let mut order = state
        .orders
        .get_mut(&order_id)
        .ok_or_else(|| DispatchError::NotFound(format!("order {order_id} not found")))?;

    if order.status != expected {
        return Err(DispatchError::StaleState {
            expected: format!("{expected:?}"),
            found: format!("{:?}", order.status),
        });
    }

    order.status = next;
    mutate(&mut order);

    info!(order_id = %order_id, from = ?expected, to = ?next, "order transition");
    Ok(order.clone())
}

pub fn transition(
    state: &AppState,
    order_id: Uuid,
    expected: OrderStatus,
    next: OrderStatus,
) -> Result<Order, DispatchError> {
    transition_with(state, order_id, expected, next, |_| {})
}

pub fn confirm(state: &AppState, order_id: Uuid) -> Result<Order, DispatchError> {
    transition(state, order_id, OrderStatus::Pending, OrderStatus::Confirmed)
}

/// Cancellation is reachable from `Pending` or `Confirmed` only; a
/// delivered or already-terminal order cannot be cancelled.
pub fn cancel(state: &AppState, order_id: Uuid) -> Result<Order, DispatchError> {
    let mut order = state
        .orders
        .get_mut(&order_id)
        .ok_or_else(|| DispatchError::NotFound(format!("order {order_id} not found")))?;

    if !matches!(order.status, OrderStatus::Pending | OrderStatus::Confirmed) {
        return Err(DispatchError::StaleState {
            expected: "Pending or Confirmed".to_string(),
            found: format!("{:?}", order.status),
        });
    }

    order.status = OrderStatus::Cancelled;
    info!(order_id = %order_id, "order cancelled");
    Ok(order.clone())
}

pub fn refund(state: &AppState, order_id: Uuid) -> Result<Order, DispatchError> {
    transition(
        state,
        order_id,
        OrderStatus::Confirmed,
        OrderStatus::Refunded,
    )
}

/// Case-insensitive exact lookup by batch id.
pub fn find_by_batch_id(state: &AppState, batch_id: &str) -> Option<Order> {
    let key = batch_id.to_uppercase();
    let order_id = *state.batch_index.get(&key)?;
    state.orders.get(&order_id).map(|entry| entry.value().clone())
}

/// Claims a globally unique batch id for `order_id`. The index entry acts
/// as the uniqueness constraint; on collision a new suffix is drawn.
fn claim_batch_id(state: &AppState, order_id: Uuid) -> String {
    loop {
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
        let candidate = format!("MB-{suffix:06}");

        match state.batch_index.entry(candidate.clone()) {
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(order_id);
                return candidate;
            }
            dashmap::mapref::entry::Entry::Occupied(_) => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::config::Config;
    use crate::models::partner::GeoPoint;

    fn test_config() -> Config {
        Config {
            http_port: 0,
            log_level: "info".to_string(),
            confirmed_queue_size: 16,
            event_buffer_size: 16,
            otp_length: 6,
            broadcast_radius_km: None,
        }
    }

    fn sample_address() -> DeliveryAddress {
        DeliveryAddress {
            label: "12 Ragi Mudde Lane".to_string(),
            point: GeoPoint {
                lat: 12.9716,
                lng: 77.5946,
            },
        }
    }

    fn new_order(state: &AppState) -> Order {
        create_order(
            state,
            Uuid::from_u128(1),
            vec![],
            sample_address(),
            "upi".to_string(),
            420.0,
        )
    }

    #[test]
    fn batch_id_has_expected_shape_and_is_indexed() {
        let (state, _rx) = AppState::new(&test_config());
        let order = new_order(&state);

        assert!(order.batch_id.starts_with("MB-"));
        assert_eq!(order.batch_id.len(), 9);
        assert_eq!(
            find_by_batch_id(&state, &order.batch_id.to_lowercase())
                .map(|found| found.id),
            Some(order.id)
        );
    }

    #[test]
    fn confirm_then_cancel_follows_graph() {
        let (state, _rx) = AppState::new(&test_config());
        let order = new_order(&state);

        let confirmed = confirm(&state, order.id).unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);

        let cancelled = cancel(&state, order.id).unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[test]
    fn double_confirm_is_stale() {
        let (state, _rx) = AppState::new(&test_config());
        let order = new_order(&state);

        confirm(&state, order.id).unwrap();
        let err = confirm(&state, order.id).unwrap_err();
        assert!(matches!(err, DispatchError::StaleState { .. }));
    }

    #[test]
    fn cannot_skip_edges_to_delivered() {
        let (state, _rx) = AppState::new(&test_config());
        let order = new_order(&state);

        let err = transition(
            &state,
            order.id,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        )
        .unwrap_err();
        assert!(matches!(err, DispatchError::StaleState { .. }));
    }

    #[test]
    fn cancel_after_delivery_is_rejected() {
        let (state, _rx) = AppState::new(&test_config());
        let order = new_order(&state);

        confirm(&state, order.id).unwrap();
        transition(
            &state,
            order.id,
            OrderStatus::Confirmed,
            OrderStatus::OutForDelivery,
        )
        .unwrap();
        transition(
            &state,
            order.id,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        )
        .unwrap();

        let err = cancel(&state, order.id).unwrap_err();
        assert!(matches!(err, DispatchError::StaleState { .. }));
    }

    #[test]
    fn refund_only_from_confirmed() {
        let (state, _rx) = AppState::new(&test_config());
        let order = new_order(&state);

        let err = refund(&state, order.id).unwrap_err();
        assert!(matches!(err, DispatchError::StaleState { .. }));

        confirm(&state, order.id).unwrap();
        let refunded = refund(&state, order.id).unwrap();
        assert_eq!(refunded.status, OrderStatus::Refunded);
    }
}
