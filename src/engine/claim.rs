use chrono::Utc;
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::ActingIdentity;
use crate::engine::lifecycle;
use crate::error::DispatchError;
use crate::models::assignment::{Assignment, AssignmentStatus};
use crate::models::order::OrderStatus;
use crate::push::event::PushEvent;
use crate::state::AppState;

/// Accepts an offer on behalf of a partner. At most one caller ever wins:
/// the Broadcasted -> Assigned flip happens under the assignment's entry
/// guard, so concurrent claims serialize on it and losers see the status
/// already moved.
pub fn accept_offer(
    state: &AppState,
    assignment_id: Uuid,
    identity: ActingIdentity,
) -> Result<Assignment, DispatchError> {
    if !identity.can_act_as_partner() {
        return Err(DispatchError::Unauthorized);
    }
    let partner_id = identity.id;

    let claimed = {
        let mut assignment = state
            .assignments
            .get_mut(&assignment_id)
            .ok_or_else(|| DispatchError::NotFound(format!("offer {assignment_id} not found")))?;

        if assignment.status != AssignmentStatus::Broadcasted {
            state
                .metrics
                .claims_total
                .with_label_values(&["lost"])
                .inc();
            return Err(DispatchError::AlreadyClaimed);
        }

        assignment.status = AssignmentStatus::Assigned;
        assignment.assigned_partner = Some(partner_id);
        assignment.assigned_at = Some(Utc::now());
        assignment.clone()
    };

    state.metrics.claims_total.with_label_values(&["won"]).inc();
    state.metrics.offers_open.dec();

    let otp = generate_otp(state.otp_length);
    let order = lifecycle::transition_with(
        state,
        claimed.order_id,
        OrderStatus::Confirmed,
        OrderStatus::OutForDelivery,
        |order| {
            order.assigned_partner = Some(partner_id);
            order.delivery_otp = Some(otp);
        },
    )?;

    let profile = state
        .partners
        .get(&partner_id)
        .map(|partner| partner.profile());

    match profile {
        Some(profile) => {
            let delivered = state.registry.send(
                order.customer_id,
                PushEvent::OrderAssigned {
                    order_id: order.id,
                    partner: profile,
                },
            );
            state.metrics.record_push("order-assigned", delivered);
        }
        None => warn!(partner_id = %partner_id, "claimed by unregistered partner"),
    }

    info!(
        assignment_id = %assignment_id,
        order_id = %order.id,
        partner_id = %partner_id,
        "offer claimed"
    );

    Ok(claimed)
}

/// Records a partner's decline. Monotonic set insert: repeated or racing
/// rejects from the same partner collapse to one membership.
pub fn reject_offer(
    state: &AppState,
    assignment_id: Uuid,
    identity: ActingIdentity,
) -> Result<(), DispatchError> {
    if !identity.can_act_as_partner() {
        return Err(DispatchError::Unauthorized);
    }

    let mut assignment = state
        .assignments
        .get_mut(&assignment_id)
        .ok_or_else(|| DispatchError::NotFound(format!("offer {assignment_id} not found")))?;

    assignment.rejected_by.insert(identity.id);

    info!(assignment_id = %assignment_id, partner_id = %identity.id, "offer rejected");
    Ok(())
}

/// Fixed-length numeric one-time code for the delivery handoff.
pub fn generate_otp(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::generate_otp;

    #[test]
    fn otp_is_fixed_length_numeric() {
        for _ in 0..32 {
            let otp = generate_otp(6);
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
