//! Engine event stream
//!
//! Every state change the engine makes is reported as an event. The gateway
//! routes session-targeted events to the owning session's outbound stream and
//! public trade events to the TRADES channel, all through the failure chain.

use types::ids::{OrderId, SessionId};
use types::numeric::{Price, Quantity};
use types::order::Order;
use types::trade::Trade;

#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Order status change, delivered to the owning session
    OrderUpdate { order: Order },
    /// One side of a match, delivered to the session named here
    Fill {
        session_id: SessionId,
        order_id: OrderId,
        price: Price,
        quantity: Quantity,
        timestamp: i64,
    },
    /// Anonymous public trade for the symbol's TRADES channel
    Trade { trade: Trade },
}

impl EngineEvent {
    /// Session this event targets; None for public events
    pub fn target_session(&self) -> Option<&SessionId> {
        match self {
            EngineEvent::OrderUpdate { order } => Some(&order.session_id),
            EngineEvent::Fill { session_id, .. } => Some(session_id),
            EngineEvent::Trade { .. } => None,
        }
    }
}
