use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::DeliveryAddress;
use crate::models::partner::{GeoPoint, PartnerProfile};

/// Events pushed over live connections. At-most-once: a disconnected
/// observer simply misses the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum PushEvent {
    NewOrder {
        assignment_id: Uuid,
        order_id: Uuid,
        batch_id: String,
        address: DeliveryAddress,
        total_amount: f64,
    },
    OrderAssigned {
        order_id: Uuid,
        partner: PartnerProfile,
    },
    UpdatePartnerLocation {
        partner_id: Uuid,
        order_id: Uuid,
        location: GeoPoint,
    },
}
