//! Delayed-delivery scheduler
//!
//! A single cooperative timer drains a priority queue keyed by absolute
//! release time. The gateway schedules outbound messages whose chain
//! accumulated a delay; when one comes due it is handed back on the delivery
//! channel for the session writer to send. Cancelling a session silently
//! discards its pending entries.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use types::ids::SessionId;

/// A message due for delivery to a session's outbound queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledDelivery {
    pub session_id: SessionId,
    pub payload: String,
}

#[derive(Debug)]
enum Command {
    Schedule {
        due: Instant,
        delivery: ScheduledDelivery,
    },
    CancelSession(SessionId),
}

#[derive(Debug)]
struct HeapEntry {
    due: Instant,
    /// Tie-break so same-instant entries keep insertion order
    sequence: u64,
    delivery: ScheduledDelivery,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.sequence == other.sequence
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due.cmp(&other.due).then(self.sequence.cmp(&other.sequence))
    }
}

/// Handle for scheduling and cancelling deliveries
#[derive(Clone)]
pub struct DeliveryScheduler {
    commands: mpsc::UnboundedSender<Command>,
}

impl DeliveryScheduler {
    /// Spawn the timer task. Due deliveries arrive on the returned receiver.
    pub fn spawn() -> (Self, mpsc::UnboundedReceiver<ScheduledDelivery>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (delivery_tx, delivery_rx) = mpsc::unbounded_channel();
        tokio::spawn(run(command_rx, delivery_tx));
        (
            Self {
                commands: command_tx,
            },
            delivery_rx,
        )
    }

    pub fn schedule(&self, session_id: SessionId, payload: String, delay: Duration) {
        let _ = self.commands.send(Command::Schedule {
            due: Instant::now() + delay,
            delivery: ScheduledDelivery {
                session_id,
                payload,
            },
        });
    }

    /// Discard every pending delivery for a session
    pub fn cancel_session(&self, session_id: SessionId) {
        let _ = self.commands.send(Command::CancelSession(session_id));
    }
}

async fn run(
    mut commands: mpsc::UnboundedReceiver<Command>,
    deliveries: mpsc::UnboundedSender<ScheduledDelivery>,
) {
    let mut queue: BinaryHeap<Reverse<HeapEntry>> = BinaryHeap::new();
    let mut sequence: u64 = 0;

    loop {
        // Release everything that is already due
        let now = Instant::now();
        while queue.peek().is_some_and(|Reverse(e)| e.due <= now) {
            let Reverse(entry) = queue.pop().expect("peeked entry");
            if deliveries.send(entry.delivery).is_err() {
                return;
            }
        }

        let next_due = queue.peek().map(|Reverse(e)| e.due);
        tokio::select! {
            command = commands.recv() => {
                match command {
                    Some(Command::Schedule { due, delivery }) => {
                        sequence += 1;
                        queue.push(Reverse(HeapEntry { due, sequence, delivery }));
                    }
                    Some(Command::CancelSession(session_id)) => {
                        queue = queue
                            .into_iter()
                            .filter(|Reverse(e)| e.delivery.session_id != session_id)
                            .collect();
                    }
                    None => return,
                }
            }
            _ = sleep_until_or_forever(next_due) => {}
        }
    }
}

async fn sleep_until_or_forever(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
