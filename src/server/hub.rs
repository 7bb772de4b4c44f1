//! Session hub.
//!
//! Owns the room registry plus the per-room subscriber channels, behind a
//! single exclusive lock. Every action (join, start, roll, disconnect)
//! locks, validates against room state, mutates, and fans the resulting
//! events out to every subscriber before releasing — so concurrent
//! actions against one room can never interleave partially, and per-room
//! event order on the wire matches the order things happened. Nothing
//! awaits inside the critical section; fan-out is non-blocking sends on
//! unbounded channels drained by each connection task.

use std::collections::HashMap;
use std::fmt;

use tokio::sync::{mpsc, Mutex};

use crate::config::RoomSection;
use crate::protocol::ServerMessage;
use crate::state::player::ConnectionId;
use crate::state::registry::RoomRegistry;
use crate::state::room::{RollOutcome, RoomError};

/// Per-connection sender for outbound protocol messages.
pub type OutboundTx = mpsc::UnboundedSender<ServerMessage>;

/// Why an action was rejected. Reported to the acting connection only;
/// rejected actions never mutate a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Referenced room code is not in the registry
    RoomNotFound,
    /// The room refused the action
    Room(RoomError),
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoomNotFound => write!(f, "Room not found."),
            Self::Room(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for ActionError {}

impl From<RoomError> for ActionError {
    fn from(e: RoomError) -> Self {
        Self::Room(e)
    }
}

struct HubInner {
    registry: RoomRegistry,
    /// Subscribed connections per room code
    subscribers: HashMap<String, HashMap<ConnectionId, OutboundTx>>,
}

/// Shared server state: the registry and all live subscriptions.
pub struct RoomHub {
    cfg: RoomSection,
    inner: Mutex<HubInner>,
}

impl RoomHub {
    pub fn new(cfg: RoomSection) -> Self {
        Self {
            cfg,
            inner: Mutex::new(HubInner {
                registry: RoomRegistry::new(),
                subscribers: HashMap::new(),
            }),
        }
    }

    /// Create an empty room and return its shareable code.
    pub async fn create_room(&self) -> String {
        let inner = &mut *self.inner.lock().await;
        let code = inner
            .registry
            .create_room(&mut rand::thread_rng(), self.cfg.max_players);
        tracing::info!(room = %code, "room created");
        code
    }

    /// Seat `conn` in a room and subscribe its outbound channel.
    /// Returns the canonical room code for later actions and cleanup.
    pub async fn join(
        &self,
        code: &str,
        conn: ConnectionId,
        name: &str,
        tx: OutboundTx,
    ) -> Result<String, ActionError> {
        let inner = &mut *self.inner.lock().await;
        let room = inner.registry.get_mut(code).ok_or(ActionError::RoomNotFound)?;

        let player = room.join(conn, name)?;
        let name = player.name.clone();
        let is_owner = room.owner == Some(conn);
        let canonical = room.id.clone();
        let snapshot = room.snapshot();

        let subs = inner.subscribers.entry(canonical.clone()).or_default();
        subs.insert(conn, tx);
        broadcast(subs, &ServerMessage::PlayerJoined { name, is_owner });
        broadcast(subs, &ServerMessage::State { snapshot });

        tracing::info!(room = %canonical, conn, "player joined");
        Ok(canonical)
    }

    /// Start the game in a room.
    pub async fn start(&self, code: &str, conn: ConnectionId) -> Result<(), ActionError> {
        let inner = &mut *self.inner.lock().await;
        let room = inner.registry.get_mut(code).ok_or(ActionError::RoomNotFound)?;

        room.start(conn)?;
        let canonical = room.id.clone();
        let snapshot = room.snapshot();

        if let Some(subs) = inner.subscribers.get(&canonical) {
            broadcast(subs, &ServerMessage::GameStarted);
            broadcast(subs, &ServerMessage::State { snapshot });
        }

        tracing::info!(room = %canonical, "game started");
        Ok(())
    }

    /// Roll the die for `conn`.
    pub async fn roll(&self, code: &str, conn: ConnectionId) -> Result<(), ActionError> {
        let inner = &mut *self.inner.lock().await;
        let room = inner.registry.get_mut(code).ok_or(ActionError::RoomNotFound)?;

        let outcome = room.roll(conn, &mut rand::thread_rng())?;
        let canonical = room.id.clone();
        let snapshot = room.snapshot();

        if let Some(subs) = inner.subscribers.get(&canonical) {
            for msg in roll_messages(&outcome) {
                broadcast(subs, &msg);
            }
            broadcast(subs, &ServerMessage::State { snapshot });
        }

        tracing::debug!(
            room = %canonical,
            conn,
            roll = outcome.roll,
            to = outcome.to,
            "dice rolled"
        );
        Ok(())
    }

    /// Drop a connection: unsubscribe it and remove its player. Remaining
    /// subscribers receive a fresh snapshot.
    pub async fn disconnect(&self, code: &str, conn: ConnectionId) {
        let inner = &mut *self.inner.lock().await;
        let canonical = code.to_uppercase();

        if let Some(subs) = inner.subscribers.get_mut(&canonical) {
            subs.remove(&conn);
            if subs.is_empty() {
                inner.subscribers.remove(&canonical);
            }
        }

        if let Some(room) = inner.registry.get_mut(&canonical) {
            if room.remove_player(conn).is_some() {
                let snapshot = room.snapshot();
                if let Some(subs) = inner.subscribers.get(&canonical) {
                    broadcast(subs, &ServerMessage::State { snapshot });
                }
                tracing::info!(room = %canonical, conn, "player left");
            }
        }
    }

    /// Evict rooms that have no subscribers and have been idle past the
    /// configured timeout. Returns the evicted codes.
    pub async fn sweep_idle(&self) -> Vec<String> {
        let max_idle = chrono::Duration::seconds(self.cfg.idle_timeout_secs as i64);
        let inner = &mut *self.inner.lock().await;

        let mut evicted = Vec::new();
        for code in inner.registry.idle_codes(max_idle) {
            let occupied = inner
                .subscribers
                .get(&code)
                .is_some_and(|subs| !subs.is_empty());
            if occupied {
                continue;
            }
            inner.registry.remove(&code);
            inner.subscribers.remove(&code);
            evicted.push(code);
        }

        if !evicted.is_empty() {
            tracing::info!(count = evicted.len(), "evicted idle rooms");
        }
        evicted
    }

    #[cfg(test)]
    pub(crate) async fn with_room_mut<F: FnOnce(&mut crate::state::room::Room)>(&self, code: &str, f: F) {
        let inner = &mut *self.inner.lock().await;
        if let Some(room) = inner.registry.get_mut(code) {
            f(room);
        }
    }
}

/// Send one message to every subscriber. A send failure means the
/// connection task is already gone; its entry is cleaned up on disconnect.
fn broadcast(subs: &HashMap<ConnectionId, OutboundTx>, msg: &ServerMessage) {
    for tx in subs.values() {
        let _ = tx.send(msg.clone());
    }
}

/// Event sequence for one accepted roll: the board-effect hop (if any)
/// precedes the roll result, and the win notification follows it.
fn roll_messages(outcome: &RollOutcome) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    if let Some(hop) = &outcome.effect {
        out.push(ServerMessage::BoardEffect {
            kind: hop.kind,
            from_cell: hop.from,
            to_cell: hop.to,
        });
    }
    out.push(ServerMessage::DiceRolled {
        name: outcome.player.clone(),
        roll_value: outcome.roll,
        from_cell: outcome.from,
        to_cell: outcome.to,
        bonus_turn: outcome.bonus_turn,
    });
    if outcome.won {
        out.push(ServerMessage::GameWon {
            name: outcome.player.clone(),
        });
    }
    out
}
