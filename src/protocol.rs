//! Wire protocol.
//!
//! JSON messages exchanged over the per-room WebSocket channel, tagged
//! with a `"type"` field. Clients send actions; the server answers with
//! event notifications plus a full [`RoomSnapshot`] after every accepted
//! transition, so reconnecting or lagging observers converge by resync
//! rather than by replaying deltas.

use serde::{Deserialize, Serialize};

use crate::state::board::EffectKind;
use crate::state::player::ConnectionId;
use crate::state::room::RoomPhase;

/// Client → server actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Join { room_id: String, name: String },
    #[serde(rename_all = "camelCase")]
    Start { room_id: String },
    #[serde(rename_all = "camelCase")]
    Roll { room_id: String },
}

/// Server → client events.
///
/// Per-room ordering guarantees: `boardEffect` precedes the `diceRolled`
/// it belongs to, `gameWon` follows it, and every accepted action ends
/// with a `state` broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Error {
        message: String,
    },
    State {
        snapshot: RoomSnapshot,
    },
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        name: String,
        is_owner: bool,
    },
    GameStarted,
    #[serde(rename_all = "camelCase")]
    DiceRolled {
        name: String,
        roll_value: u8,
        from_cell: u8,
        to_cell: u8,
        bonus_turn: bool,
    },
    #[serde(rename_all = "camelCase")]
    BoardEffect {
        kind: EffectKind,
        from_cell: u8,
        to_cell: u8,
    },
    GameWon {
        name: String,
    },
}

/// Full public room state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: String,
    pub state: RoomPhase,
    pub players: Vec<PlayerSnapshot>,
    pub turn: usize,
    /// Id of the player whose turn it is; absent in an empty room
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<ConnectionId>,
    /// Winner name; present only once the game is finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

/// Public view of one seat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: ConnectionId,
    pub name: String,
    pub color: String,
    pub position: u8,
}

/// Body of the room-creation response on the HTTP side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomCreated {
    pub id: String,
}
