use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::partner::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    OutForDelivery,
    Delivered,
    Cancelled,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit: String,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub label: String,
    pub point: GeoPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub items: Vec<LineItem>,
    pub address: DeliveryAddress,
    pub payment_method: String,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub assignment_id: Option<Uuid>,
    pub assigned_partner: Option<Uuid>,
    /// One-time delivery code; present only while the order is out for
    /// delivery, cleared once verified.
    pub delivery_otp: Option<String>,
    pub otp_verified: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    /// Human-readable traceability code, generated once and never changed.
    pub batch_id: String,
    pub created_at: DateTime<Utc>,
}
