//! ChuteCast
//!
//! A room-based realtime Snakes & Ladders server. Players join an
//! ephemeral room over a WebSocket, the owner starts the game, and every
//! accepted action is rebroadcast to the whole room as events plus a full
//! state snapshot.
//!
//! # Overview
//!
//! - **Board model** - the fixed 100-cell track, the snake/ladder table,
//!   and the exact-landing overshoot rule.
//!
//! - **Rooms** - the Lobby → Playing → Finished lifecycle, turn ordering
//!   with the roll-a-6-go-again rule, win detection, and owner handoff
//!   when players leave.
//!
//! - **Registry** - live rooms keyed by short shareable codes, created
//!   collision-free and evicted once idle.
//!
//! - **Server** - the axum shell: a room-creation endpoint and one
//!   WebSocket task per connection, all room mutations serialized behind
//!   the hub's exclusive lock.
//!
//! # Design Principles
//!
//! 1. **Rejections are explicit and inert** - an illegal action gets an
//!    error reply and changes nothing.
//!
//! 2. **Snapshots, not deltas** - every change rebroadcasts full public
//!    state, so any observer converges even after missed events.
//!
//! 3. **State is pure** - `state` has no networking; the async shell
//!    drives it and fans results out.

pub mod config;
pub mod protocol;
pub mod server;
pub mod state;

pub use protocol::{ClientMessage, ServerMessage};
pub use server::hub::RoomHub;
