use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::policy::{self, BroadcastPolicy};
use crate::engine::relay::AdminLocationUpdate;
use crate::models::assignment::Assignment;
use crate::models::order::Order;
use crate::models::partner::DeliveryPartner;
use crate::observability::metrics::Metrics;
use crate::push::registry::ConnectionRegistry;

pub struct AppState {
    pub orders: DashMap<Uuid, Order>,
    /// Uppercased batch id -> order id. Enforces batch-id uniqueness and
    /// backs the case-insensitive traceability lookup.
    pub batch_index: DashMap<String, Uuid>,
    pub assignments: DashMap<Uuid, Assignment>,
    pub partners: DashMap<Uuid, DeliveryPartner>,
    pub confirmed_tx: mpsc::Sender<Uuid>,
    pub admin_feed_tx: broadcast::Sender<AdminLocationUpdate>,
    pub registry: ConnectionRegistry,
    pub broadcast_policy: Box<dyn BroadcastPolicy>,
    pub otp_length: usize,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config) -> (Self, mpsc::Receiver<Uuid>) {
        let (confirmed_tx, confirmed_rx) = mpsc::channel(config.confirmed_queue_size);
        let (admin_feed_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        (
            Self {
                orders: DashMap::new(),
                batch_index: DashMap::new(),
                assignments: DashMap::new(),
                partners: DashMap::new(),
                confirmed_tx,
                admin_feed_tx,
                registry: ConnectionRegistry::new(),
                broadcast_policy: policy::from_config(config),
                otp_length: config.otp_length,
                metrics: Metrics::new(),
            },
            confirmed_rx,
        )
    }
}
