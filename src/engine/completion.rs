use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::auth::{ActingIdentity, Role};
use crate::error::DispatchError;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

/// Validates the one-time delivery code and closes the order. The code
/// must match exactly and the order must still be out for delivery; a
/// delivered order rejects even its own (now stale) code.
pub fn verify_delivery_code(
    state: &AppState,
    order_id: Uuid,
    submitted_code: &str,
    identity: ActingIdentity,
) -> Result<Order, DispatchError> {
    if !identity.can_act_as_partner() {
        return Err(DispatchError::Unauthorized);
    }

    let mut order = state
        .orders
        .get_mut(&order_id)
        .ok_or_else(|| DispatchError::NotFound(format!("order {order_id} not found")))?;

    // Only the partner actually carrying the order may close it out.
    if identity.role == Role::Partner && order.assigned_partner != Some(identity.id) {
        return Err(DispatchError::Unauthorized);
    }

    if order.status != OrderStatus::OutForDelivery {
        return Err(DispatchError::StaleState {
            expected: "OutForDelivery".to_string(),
            found: format!("{:?}", order.status),
        });
    }

    match &order.delivery_otp {
        Some(stored) if stored == submitted_code => {}
        _ => return Err(DispatchError::InvalidCode),
    }

    order.otp_verified = true;
    order.status = OrderStatus::Delivered;
    order.delivered_at = Some(Utc::now());
    order.delivery_otp = None;

    info!(order_id = %order_id, partner_id = %identity.id, "delivery completed");
    Ok(order.clone())
}
