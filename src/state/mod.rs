//! Game-state module.
//!
//! Pure state types and managers — no networking in here:
//!
//! - `board` - the fixed 100-cell track and its snake/ladder effects
//! - `player` - seat records, palette, name rules
//! - `room` - one game instance: lifecycle, turn order, roll resolution
//! - `registry` - code-keyed map of live rooms
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     RoomRegistry                         │
//! │                                                          │
//! │   code → Room { phase, owner, players: [Player], turn }  │
//! │                   │                                      │
//! │                   │ apply_roll                           │
//! │                   ▼                                      │
//! │          board::apply_move / resolve_effect              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The async shell in `crate::server` owns a registry behind one
//! exclusive lock and layers subscriptions and broadcast on top.

pub mod board;
pub mod player;
pub mod registry;
pub mod room;

// Re-export commonly used types
pub use board::{apply_move, resolve_effect, EffectKind, BOARD_EFFECTS, TRACK_END};
pub use player::{sanitize_name, ConnectionId, Player, PLAYER_COLORS};
pub use registry::{RoomRegistry, ROOM_CODE_ALPHABET, ROOM_CODE_LEN};
pub use room::{EffectHop, RollOutcome, Room, RoomError, RoomPhase, MAX_ROOM_PLAYERS};
