//! Session & connection manager
//!
//! Tracks live WebSocket sessions, their subscriptions, and a bounded
//! outbound queue per session. A full queue means the client is not keeping
//! up; the frame is dropped and counted as backpressure throttling.
//! Disconnect removes the socket and subscriptions but never touches the
//! account or resting orders.

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::RwLock;
use tokio::sync::mpsc;
use types::ids::{SessionId, Symbol};
use types::message::ChannelKind;

/// Outbound queue depth per session
pub const OUTBOUND_QUEUE_DEPTH: usize = 256;

pub struct SessionHandle {
    sender: mpsc::Sender<String>,
    subscriptions: RwLock<HashSet<(ChannelKind, Symbol)>>,
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh connection; returns the sender's paired receiver side
    /// already wired by the caller.
    pub fn register(&self, session_id: SessionId, sender: mpsc::Sender<String>) {
        self.sessions.insert(
            session_id,
            SessionHandle {
                sender,
                subscriptions: RwLock::new(HashSet::new()),
            },
        );
    }

    /// Remove the connection and all its subscriptions
    pub fn unregister(&self, session_id: &SessionId) {
        self.sessions.remove(session_id);
    }

    pub fn is_connected(&self, session_id: &SessionId) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn subscribe(&self, session_id: &SessionId, channel: ChannelKind, symbol: Symbol) -> bool {
        match self.sessions.get(session_id) {
            Some(handle) => {
                handle
                    .subscriptions
                    .write()
                    .expect("subscription lock")
                    .insert((channel, symbol));
                true
            }
            None => false,
        }
    }

    pub fn unsubscribe(&self, session_id: &SessionId, channel: ChannelKind, symbol: &Symbol) -> bool {
        match self.sessions.get(session_id) {
            Some(handle) => {
                handle
                    .subscriptions
                    .write()
                    .expect("subscription lock")
                    .remove(&(channel, symbol.clone()));
                true
            }
            None => false,
        }
    }

    /// Sessions subscribed to (channel, symbol)
    pub fn subscribers(&self, channel: ChannelKind, symbol: &Symbol) -> Vec<SessionId> {
        self.sessions
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .subscriptions
                    .read()
                    .expect("subscription lock")
                    .contains(&(channel, symbol.clone()))
            })
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn has_subscribers(&self, channel: ChannelKind, symbol: &Symbol) -> bool {
        !self.subscribers(channel, symbol).is_empty()
    }

    /// Queue a payload on the session's outbound channel. Returns false if
    /// the session is gone or its queue is full (backpressure drop).
    pub fn send_raw(&self, session_id: &SessionId, payload: String) -> bool {
        let Some(handle) = self.sessions.get(session_id) else {
            return false;
        };
        match handle.sender.try_send(payload) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(session = %session_id, "outbound queue full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}
