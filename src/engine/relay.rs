use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::auth::ActingIdentity;
use crate::error::DispatchError;
use crate::models::order::OrderStatus;
use crate::models::partner::{GeoPoint, PartnerProfile};
use crate::push::event::PushEvent;
use crate::state::AppState;

/// One frame of the admin aggregation feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLocationUpdate {
    pub partner_id: Uuid,
    pub order_id: Uuid,
    pub location: GeoPoint,
    pub active_deliveries: usize,
    pub at: DateTime<Utc>,
}

/// An admin's snapshot row: one in-flight delivery with its partner's last
/// known position.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveDelivery {
    pub order_id: Uuid,
    pub batch_id: String,
    pub customer_id: Uuid,
    pub partner: PartnerProfile,
    pub location: GeoPoint,
}

/// Persists a partner's latest position (last write wins) and republishes
/// it to whoever is watching: the customer of the order this partner is
/// carrying, and the admin feed. Republishing never blocks or fails the
/// report.
pub fn report_location(
    state: &AppState,
    partner_id: Uuid,
    location: GeoPoint,
    identity: ActingIdentity,
) -> Result<(), DispatchError> {
    if !identity.can_act_as_partner() || (!identity.is_admin() && identity.id != partner_id) {
        return Err(DispatchError::Unauthorized);
    }

    {
        let mut partner = state
            .partners
            .get_mut(&partner_id)
            .ok_or_else(|| DispatchError::NotFound(format!("partner {partner_id} not found")))?;
        partner.location = location;
        partner.updated_at = Utc::now();
    }

    state
        .metrics
        .location_updates_total
        .with_label_values(&[&partner_id.to_string()])
        .inc();

    let active_deliveries = state
        .orders
        .iter()
        .filter(|entry| entry.status == OrderStatus::OutForDelivery)
        .count();

    let carrying = state
        .orders
        .iter()
        .find(|entry| {
            entry.status == OrderStatus::OutForDelivery
                && entry.assigned_partner == Some(partner_id)
        })
        .map(|entry| (entry.id, entry.customer_id));

    let Some((order_id, customer_id)) = carrying else {
        debug!(partner_id = %partner_id, "location stored; no active delivery to relay");
        return Ok(());
    };

    let delivered = state.registry.send(
        customer_id,
        PushEvent::UpdatePartnerLocation {
            partner_id,
            order_id,
            location,
        },
    );
    state.metrics.record_push("update-partner-location", delivered);

    let _ = state.admin_feed_tx.send(AdminLocationUpdate {
        partner_id,
        order_id,
        location,
        active_deliveries,
        at: Utc::now(),
    });

    Ok(())
}

/// All orders currently out for delivery, joined with their partner's
/// profile and last known position.
pub fn active_deliveries(state: &AppState) -> Vec<ActiveDelivery> {
    state
        .orders
        .iter()
        .filter(|entry| entry.status == OrderStatus::OutForDelivery)
        .filter_map(|entry| {
            let partner_id = entry.assigned_partner?;
            let partner = state.partners.get(&partner_id)?;
            Some(ActiveDelivery {
                order_id: entry.id,
                batch_id: entry.batch_id.clone(),
                customer_id: entry.customer_id,
                partner: partner.profile(),
                location: partner.location,
            })
        })
        .collect()
}
