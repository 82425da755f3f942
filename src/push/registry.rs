use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::push::event::PushEvent;

struct LiveConnection {
    session: u64,
    tx: mpsc::UnboundedSender<PushEvent>,
}

/// Process-wide registry of live push connections, keyed by entity id
/// (partner or customer). Purely ephemeral: nothing here survives a
/// restart, and nothing is queued for offline entities.
///
/// Last connect wins. Each connection gets a monotonically increasing
/// session token so a disconnect racing with a fresh connect cannot tear
/// down the newer handle.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<Uuid, LiveConnection>,
    next_session: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh connection for `entity_id`, displacing any
    /// previous one. Returns the session token and the receive half.
    pub fn connect(&self, entity_id: Uuid) -> (u64, mpsc::UnboundedReceiver<PushEvent>) {
        let session = self.next_session.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections
            .insert(entity_id, LiveConnection { session, tx });
        (session, rx)
    }

    /// Removes the connection only if `session` is still the current one.
    pub fn disconnect(&self, entity_id: Uuid, session: u64) {
        self.connections
            .remove_if(&entity_id, |_, conn| conn.session == session);
    }

    pub fn is_online(&self, entity_id: Uuid) -> bool {
        self.connections.contains_key(&entity_id)
    }

    pub fn online_count(&self) -> usize {
        self.connections.len()
    }

    /// Fire-and-forget delivery. Returns whether the event was handed to a
    /// live connection; a miss is normal (entity offline) and never an error.
    pub fn send(&self, entity_id: Uuid, event: PushEvent) -> bool {
        match self.connections.get(&entity_id) {
            Some(conn) => {
                let delivered = conn.tx.send(event).is_ok();
                if !delivered {
                    debug!(entity_id = %entity_id, "push dropped: receiver gone");
                }
                delivered
            }
            None => {
                debug!(entity_id = %entity_id, "push dropped: entity offline");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::ConnectionRegistry;
    use crate::models::partner::GeoPoint;
    use crate::push::event::PushEvent;

    fn location_event() -> PushEvent {
        PushEvent::UpdatePartnerLocation {
            partner_id: Uuid::from_u128(7),
            order_id: Uuid::from_u128(8),
            location: GeoPoint {
                lat: 12.97,
                lng: 77.59,
            },
        }
    }

    #[tokio::test]
    async fn send_to_offline_entity_is_dropped() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.send(Uuid::from_u128(1), location_event()));
    }

    #[tokio::test]
    async fn last_connect_wins() {
        let registry = ConnectionRegistry::new();
        let entity = Uuid::from_u128(1);

        let (_old_session, mut old_rx) = registry.connect(entity);
        let (_new_session, mut new_rx) = registry.connect(entity);

        assert!(registry.send(entity, location_event()));
        assert!(new_rx.try_recv().is_ok());
        assert!(old_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stale_disconnect_does_not_remove_newer_connection() {
        let registry = ConnectionRegistry::new();
        let entity = Uuid::from_u128(1);

        let (old_session, _old_rx) = registry.connect(entity);
        let (_new_session, mut new_rx) = registry.connect(entity);

        registry.disconnect(entity, old_session);

        assert!(registry.is_online(entity));
        assert!(registry.send(entity, location_event()));
        assert!(new_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn matching_disconnect_removes_connection() {
        let registry = ConnectionRegistry::new();
        let entity = Uuid::from_u128(1);

        let (session, _rx) = registry.connect(entity);
        registry.disconnect(entity, session);

        assert!(!registry.is_online(entity));
    }
}
