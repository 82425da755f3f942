use std::collections::HashSet;

use uuid::Uuid;

use crate::config::Config;
use crate::geo::haversine_km;
use crate::models::order::Order;
use crate::models::partner::DeliveryPartner;

/// Decides which of the currently eligible (online, available) partners a
/// freshly broadcasted offer is shown to.
pub trait BroadcastPolicy: Send + Sync {
    fn scope(&self, order: &Order, eligible: &[DeliveryPartner]) -> HashSet<Uuid>;
}

/// Baseline: every online partner sees every offer.
pub struct AllOnline;

impl BroadcastPolicy for AllOnline {
    fn scope(&self, _order: &Order, eligible: &[DeliveryPartner]) -> HashSet<Uuid> {
        eligible.iter().map(|partner| partner.id).collect()
    }
}

/// Only partners within `radius_km` of the delivery address.
pub struct WithinRadius {
    pub radius_km: f64,
}

impl BroadcastPolicy for WithinRadius {
    fn scope(&self, order: &Order, eligible: &[DeliveryPartner]) -> HashSet<Uuid> {
        eligible
            .iter()
            .filter(|partner| {
                haversine_km(&partner.location, &order.address.point) <= self.radius_km
            })
            .map(|partner| partner.id)
            .collect()
    }
}

pub fn from_config(config: &Config) -> Box<dyn BroadcastPolicy> {
    match config.broadcast_radius_km {
        Some(radius_km) => Box::new(WithinRadius { radius_km }),
        None => Box::new(AllOnline),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::order::{DeliveryAddress, OrderStatus};
    use crate::models::partner::GeoPoint;

    fn partner(id_seed: u128, lat: f64, lng: f64) -> DeliveryPartner {
        DeliveryPartner {
            id: Uuid::from_u128(id_seed),
            name: "test-partner".to_string(),
            vehicle: "scooter".to_string(),
            available: true,
            location: GeoPoint { lat, lng },
            updated_at: Utc::now(),
        }
    }

    fn order_at(lat: f64, lng: f64) -> Order {
        Order {
            id: Uuid::new_v4(),
            customer_id: Uuid::from_u128(99),
            items: vec![],
            address: DeliveryAddress {
                label: "drop".to_string(),
                point: GeoPoint { lat, lng },
            },
            payment_method: "upi".to_string(),
            total_amount: 100.0,
            status: OrderStatus::Confirmed,
            assignment_id: None,
            assigned_partner: None,
            delivery_otp: None,
            otp_verified: false,
            delivered_at: None,
            batch_id: "MB-000001".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn all_online_scopes_everyone() {
        let eligible = vec![partner(1, 12.97, 77.59), partner(2, 13.20, 77.80)];
        let scope = AllOnline.scope(&order_at(12.97, 77.59), &eligible);
        assert_eq!(scope.len(), 2);
    }

    #[test]
    fn within_radius_excludes_distant_partners() {
        let near = partner(1, 12.975, 77.60);
        let far = partner(2, 13.50, 78.20);
        let eligible = vec![near.clone(), far];

        let scope = WithinRadius { radius_km: 10.0 }.scope(&order_at(12.97, 77.59), &eligible);
        assert_eq!(scope.len(), 1);
        assert!(scope.contains(&near.id));
    }
}
