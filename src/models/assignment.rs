use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AssignmentStatus {
    Broadcasted,
    Assigned,
}

/// The broadcastable unit representing "this order needs a partner".
/// Distinct from the order itself: an order has at most one assignment,
/// but the assignment carries the offer bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: AssignmentStatus,
    /// Partners the offer was shown to at broadcast time.
    pub broadcast_to: HashSet<Uuid>,
    /// Partners who declined. Grows monotonically, never cleared, so a
    /// re-broadcast still honors past rejections.
    pub rejected_by: HashSet<Uuid>,
    pub assigned_partner: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn new(order_id: Uuid, broadcast_to: HashSet<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            status: AssignmentStatus::Broadcasted,
            broadcast_to,
            rejected_by: HashSet::new(),
            assigned_partner: None,
            created_at: Utc::now(),
            assigned_at: None,
        }
    }

    /// Whether this offer should appear in the given partner's queue.
    pub fn open_for(&self, partner_id: Uuid) -> bool {
        self.status == AssignmentStatus::Broadcasted && !self.rejected_by.contains(&partner_id)
    }
}
