mod registry;
mod roster;
mod round;
mod vote;

pub(crate) use round::check_answers_complete;
pub(crate) use vote::check_votes_complete;

use crate::protocol::ServerMessage;
use crate::questions::QuestionBank;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Messages queued for delivery while a lock is held, flushed afterwards.
pub(crate) type Outbound = Vec<(ConnectionId, ServerMessage)>;

/// Shared application state.
///
/// Lock order: `rooms`, then `bindings`, then `connections`. Nothing awaits
/// while holding a lock except the lock acquisitions themselves.
///
/// Outbound frames are flushed after the locks are dropped. Events on one
/// room are serialized by the `rooms` write queue, and each event flushes
/// all its frames in a single synchronous burst, so cross-event frame order
/// per connection rests on the FIFO fairness of that queue rather than on a
/// lock held through the flush.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<RoomCode, Room>>>,
    /// Connection id -> which player in which room that socket speaks for.
    pub bindings: Arc<RwLock<HashMap<ConnectionId, SessionBinding>>>,
    /// Connection id -> outbox of the socket task.
    pub connections: Arc<RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>>>,
    pub questions: Arc<QuestionBank>,
}

impl AppState {
    pub fn new(questions: QuestionBank) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            bindings: Arc::new(RwLock::new(HashMap::new())),
            connections: Arc::new(RwLock::new(HashMap::new())),
            questions: Arc::new(questions),
        }
    }

    pub async fn register_connection(
        &self,
        conn_id: &str,
        tx: mpsc::UnboundedSender<ServerMessage>,
    ) {
        self.connections
            .write()
            .await
            .insert(conn_id.to_string(), tx);
    }

    pub async fn remove_connection(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Flush queued messages to their socket outboxes. A missing or closed
    /// connection just drops the message; the disconnect path cleans up.
    pub(crate) async fn deliver(&self, outbound: Outbound) {
        if outbound.is_empty() {
            return;
        }
        let connections = self.connections.read().await;
        for (conn_id, msg) in outbound {
            let Some(tx) = connections.get(&conn_id) else {
                continue;
            };
            if tx.send(msg).is_err() {
                tracing::debug!("Connection {} is gone, dropping message", conn_id);
            }
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(QuestionBank::builtin())
    }
}

/// Queue a message for every player in the room.
pub(crate) fn queue_room(room: &Room, msg: &ServerMessage, out: &mut Outbound) {
    for p in &room.players {
        out.push((p.connection_id.clone(), msg.clone()));
    }
}
