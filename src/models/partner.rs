use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryPartner {
    pub id: Uuid,
    pub name: String,
    pub vehicle: String,
    pub available: bool,
    pub location: GeoPoint,
    pub updated_at: DateTime<Utc>,
}

/// The projection of a partner that customers are allowed to see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerProfile {
    pub id: Uuid,
    pub name: String,
    pub vehicle: String,
}

impl DeliveryPartner {
    pub fn profile(&self) -> PartnerProfile {
        PartnerProfile {
            id: self.id,
            name: self.name.clone(),
            vehicle: self.vehicle.clone(),
        }
    }
}
