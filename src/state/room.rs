//! Room state machine.
//!
//! A room is one independent game instance: an ordered seat list, the
//! current turn, and a three-state lifecycle.
//!
//! # State Diagram
//!
//! ```text
//! ┌─────────┐   start (owner)   ┌─────────┐   reach cell 100   ┌──────────┐
//! │  Lobby  │──────────────────▶│ Playing │───────────────────▶│ Finished │
//! └─────────┘                   └─────────┘                    └──────────┘
//!      ▲                             │                              │
//!      └─────────────────────────────┴──────────────────────────────┘
//!                        last player leaves (reset)
//! ```
//!
//! Rejected actions never mutate the room; each returns a [`RoomError`]
//! that the session layer reports back to the acting connection.

use std::fmt;

use rand::Rng;

use crate::protocol::{PlayerSnapshot, RoomSnapshot};
use crate::state::board::{self, EffectKind, TRACK_END};
use crate::state::player::{color_for, ConnectionId, Player};

/// Maximum seats per room (one per palette color).
pub const MAX_ROOM_PLAYERS: usize = 6;

/// Room lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomPhase {
    /// Waiting for players; the owner may start
    #[default]
    Lobby,
    /// Game in progress
    Playing,
    /// Game over, winner recorded
    Finished,
}

impl RoomPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::Playing => "playing",
            Self::Finished => "finished",
        }
    }
}

/// A single teleport taken after landing on a mapped cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectHop {
    pub kind: EffectKind,
    /// Cell the token landed on before teleporting
    pub from: u8,
    pub to: u8,
}

/// Everything that happened during one accepted roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    /// Name of the player who rolled
    pub player: String,

    /// Raw die value, 1..=6
    pub roll: u8,

    /// Position before the move
    pub from: u8,

    /// Final position (after any effect); equals `from` on an overshoot
    pub to: u8,

    /// Teleport taken on the landed cell, if any
    pub effect: Option<EffectHop>,

    /// Same player rolls again (rolled a 6 without winning)
    pub bonus_turn: bool,

    /// The roll ended the game
    pub won: bool,
}

/// Room errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    GameFinished,
    RoomFull,
    AlreadyJoined,
    AlreadyStarted,
    NotOwner,
    NoPlayers,
    NotPlaying,
    NotYourTurn,
}

impl fmt::Display for RoomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameFinished => write!(f, "Game already finished."),
            Self::RoomFull => write!(f, "Room is full."),
            Self::AlreadyJoined => write!(f, "Already in this room."),
            Self::AlreadyStarted => write!(f, "Game already started."),
            Self::NotOwner => write!(f, "Only the room owner can start the game."),
            Self::NoPlayers => write!(f, "No players in the room."),
            Self::NotPlaying => write!(f, "Game is not in progress."),
            Self::NotYourTurn => write!(f, "It's not your turn."),
        }
    }
}

impl std::error::Error for RoomError {}

/// One game instance.
#[derive(Debug, Clone)]
pub struct Room {
    /// Shareable room code
    pub id: String,

    /// Connection allowed to start the game; first joiner, transfers on
    /// departure
    pub owner: Option<ConnectionId>,

    /// Lifecycle state
    pub phase: RoomPhase,

    /// Seats in join order
    players: Vec<Player>,

    /// Index into `players` of the connection whose action is valid;
    /// always in range while `players` is non-empty
    pub turn: usize,

    /// Winner name; `Some` exactly when `phase` is Finished
    pub winner: Option<String>,

    /// Maximum seats
    pub max_players: usize,

    /// When the room was created
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Last accepted action; drives idle eviction
    pub touched_at: chrono::DateTime<chrono::Utc>,
}

impl Room {
    /// Create an empty lobby.
    pub fn new(id: String) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            owner: None,
            phase: RoomPhase::Lobby,
            players: Vec::new(),
            turn: 0,
            winner: None,
            max_players: MAX_ROOM_PLAYERS,
            created_at: now,
            touched_at: now,
        }
    }

    /// Seat a new player. Joining is allowed at any time before the game
    /// finishes; a mid-game joiner starts at position 0 and waits for the
    /// turn to come around. The first joiner becomes owner.
    pub fn join(&mut self, id: ConnectionId, name: &str) -> Result<&Player, RoomError> {
        if self.phase == RoomPhase::Finished {
            return Err(RoomError::GameFinished);
        }
        if self.players.iter().any(|p| p.id == id) {
            return Err(RoomError::AlreadyJoined);
        }
        if self.players.len() >= self.max_players {
            return Err(RoomError::RoomFull);
        }

        if self.owner.is_none() {
            self.owner = Some(id);
        }

        let color = color_for(self.players.len());
        self.players.push(Player::new(id, name, color));
        self.touch();

        Ok(self.players.last().unwrap())
    }

    /// Start the game. Owner-only, lobby-only, and there must be at least
    /// one seated player.
    pub fn start(&mut self, actor: ConnectionId) -> Result<(), RoomError> {
        match self.phase {
            RoomPhase::Playing => return Err(RoomError::AlreadyStarted),
            RoomPhase::Finished => return Err(RoomError::GameFinished),
            RoomPhase::Lobby => {}
        }
        if self.owner != Some(actor) {
            return Err(RoomError::NotOwner);
        }
        if self.players.is_empty() {
            return Err(RoomError::NoPlayers);
        }

        self.phase = RoomPhase::Playing;
        self.turn = 0;
        self.touch();
        Ok(())
    }

    /// Roll the die for `actor`, drawing the value once from `rng`.
    pub fn roll(&mut self, actor: ConnectionId, rng: &mut impl Rng) -> Result<RollOutcome, RoomError> {
        let value: u8 = rng.gen_range(1..=6);
        self.apply_roll(actor, value)
    }

    /// Resolve one roll with a known die value.
    ///
    /// Preconditions, checked in order: game in progress, then `actor`
    /// holds the turn. The move is computed against the board model: an
    /// overshoot leaves the position unchanged (the roll still counts),
    /// otherwise a mapped landing cell teleports the token one hop.
    /// A raw 6 grants the same player another roll unless the roll won;
    /// reaching cell 100 finishes the game on the spot.
    pub fn apply_roll(&mut self, actor: ConnectionId, roll: u8) -> Result<RollOutcome, RoomError> {
        debug_assert!((1..=6).contains(&roll));

        if self.phase != RoomPhase::Playing {
            return Err(RoomError::NotPlaying);
        }
        if self.current_player_id() != Some(actor) {
            return Err(RoomError::NotYourTurn);
        }

        let from = self.players[self.turn].position;
        let (landed, overshoot) = board::apply_move(from, roll);

        let mut to = landed;
        let mut effect = None;
        if !overshoot {
            let (resolved, kind) = board::resolve_effect(landed);
            if let Some(kind) = kind {
                effect = Some(EffectHop {
                    kind,
                    from: landed,
                    to: resolved,
                });
                to = resolved;
            }
        }

        self.players[self.turn].position = to;
        let player = self.players[self.turn].name.clone();

        let won = to == TRACK_END;
        let bonus_turn = roll == 6 && !won;

        if won {
            self.phase = RoomPhase::Finished;
            self.winner = Some(player.clone());
        } else if !bonus_turn {
            self.turn = (self.turn + 1) % self.players.len();
        }

        self.touch();
        Ok(RollOutcome {
            player,
            roll,
            from,
            to,
            effect,
            bonus_turn,
            won,
        })
    }

    /// Remove a player (disconnect or explicit leave).
    ///
    /// The turn index stays on the same player when a later or earlier
    /// seat disappears, and wraps to the next player when the turn-holder
    /// leaves. An emptied room resets to a fresh lobby.
    pub fn remove_player(&mut self, id: ConnectionId) -> Option<Player> {
        let seat = self.players.iter().position(|p| p.id == id)?;
        let removed = self.players.remove(seat);

        if self.players.is_empty() {
            self.phase = RoomPhase::Lobby;
            self.turn = 0;
            self.winner = None;
            self.owner = None;
        } else {
            if seat < self.turn {
                self.turn -= 1;
            }
            self.turn %= self.players.len();

            if self.owner == Some(id) {
                self.owner = Some(self.players[0].id);
            }
        }

        self.touch();
        Some(removed)
    }

    /// Connection id of the player whose turn it is.
    pub fn current_player_id(&self) -> Option<ConnectionId> {
        self.players.get(self.turn).map(|p| p.id)
    }

    /// Check if a connection is seated in this room.
    pub fn has_player(&self, id: ConnectionId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    /// Seats in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Full public state for broadcast. Player ids are the opaque
    /// connection numbers; clients use them only to match the current
    /// player.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id.clone(),
            state: self.phase,
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    id: p.id,
                    name: p.name.clone(),
                    color: p.color.clone(),
                    position: p.position,
                })
                .collect(),
            turn: self.turn,
            current: self.current_player_id(),
            winner: self.winner.clone(),
        }
    }

    fn touch(&mut self) {
        self.touched_at = chrono::Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn make_room() -> Room {
        Room::new("TEST42".to_string())
    }

    fn playing_room(players: &[(ConnectionId, &str)]) -> Room {
        let mut room = make_room();
        for (id, name) in players {
            room.join(*id, name).unwrap();
        }
        room.start(players[0].0).unwrap();
        room
    }

    /// Walk the room to a known position for the current player.
    fn set_position(room: &mut Room, id: ConnectionId, position: u8) {
        for player in &mut room.players {
            if player.id == id {
                player.position = position;
                return;
            }
        }
        panic!("no such player");
    }

    #[test]
    fn test_new_room_is_empty_lobby() {
        let room = make_room();
        assert_eq!(room.phase, RoomPhase::Lobby);
        assert_eq!(room.player_count(), 0);
        assert_eq!(room.owner, None);
        assert_eq!(room.winner, None);
    }

    #[test]
    fn test_first_joiner_becomes_owner() {
        let mut room = make_room();
        room.join(1, "Alice").unwrap();
        room.join(2, "Bob").unwrap();

        assert_eq!(room.owner, Some(1));
        assert_eq!(room.player_count(), 2);
    }

    #[test]
    fn test_join_assigns_palette_in_order() {
        let mut room = make_room();
        room.join(1, "Alice").unwrap();
        room.join(2, "Bob").unwrap();

        let colors: Vec<&str> = room.players().map(|p| p.color.as_str()).collect();
        assert_eq!(
            colors,
            vec![
                crate::state::player::PLAYER_COLORS[0],
                crate::state::player::PLAYER_COLORS[1]
            ]
        );
    }

    #[test]
    fn test_join_rejected_when_full() {
        let mut room = make_room();
        for id in 1..=MAX_ROOM_PLAYERS as u64 {
            room.join(id, &format!("P{}", id)).unwrap();
        }
        assert_eq!(room.join(99, "Late"), Err(RoomError::RoomFull));
    }

    #[test]
    fn test_join_twice_rejected() {
        let mut room = make_room();
        room.join(1, "Alice").unwrap();
        assert_eq!(room.join(1, "Alice"), Err(RoomError::AlreadyJoined));
    }

    #[test]
    fn test_join_finished_room_rejected() {
        let mut room = playing_room(&[(1, "Alice")]);
        set_position(&mut room, 1, 99);
        room.apply_roll(1, 1).unwrap();

        assert_eq!(room.phase, RoomPhase::Finished);
        assert_eq!(room.join(2, "Bob"), Err(RoomError::GameFinished));
    }

    #[test]
    fn test_join_mid_game_allowed() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob")]);
        room.join(3, "Carol").unwrap();

        assert_eq!(room.player_count(), 3);
        assert_eq!(room.current_player_id(), Some(1));
        assert_eq!(room.players().last().unwrap().position, 0);
    }

    #[test]
    fn test_start_requires_owner() {
        let mut room = make_room();
        room.join(1, "Alice").unwrap();
        room.join(2, "Bob").unwrap();

        assert_eq!(room.start(2), Err(RoomError::NotOwner));
        room.start(1).unwrap();
        assert_eq!(room.phase, RoomPhase::Playing);
        assert_eq!(room.turn, 0);
    }

    #[test]
    fn test_start_empty_room_rejected() {
        let mut room = make_room();
        assert_eq!(room.start(1), Err(RoomError::NotOwner));
        assert_eq!(room.phase, RoomPhase::Lobby);
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut room = playing_room(&[(1, "Alice")]);
        assert_eq!(room.start(1), Err(RoomError::AlreadyStarted));
    }

    #[test]
    fn test_roll_rejected_in_lobby() {
        let mut room = make_room();
        room.join(1, "Alice").unwrap();
        assert_eq!(room.apply_roll(1, 3), Err(RoomError::NotPlaying));
    }

    #[test]
    fn test_roll_rejected_out_of_turn() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob")]);
        assert_eq!(room.apply_roll(2, 3), Err(RoomError::NotYourTurn));
        // Rejection did not mutate anything.
        assert_eq!(room.turn, 0);
        assert!(room.players().all(|p| p.position == 0));
    }

    #[test]
    fn test_plain_roll_advances_turn() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob")]);
        let outcome = room.apply_roll(1, 3).unwrap();

        assert_eq!(outcome.from, 0);
        assert_eq!(outcome.to, 3);
        assert!(!outcome.bonus_turn);
        assert!(outcome.effect.is_none());
        assert_eq!(room.turn, 1);
        assert_eq!(room.current_player_id(), Some(2));
    }

    #[test]
    fn test_six_grants_bonus_turn() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob")]);
        let outcome = room.apply_roll(1, 6).unwrap();

        assert!(outcome.bonus_turn);
        assert_eq!(room.turn, 0);
        assert_eq!(room.current_player_id(), Some(1));
    }

    #[test]
    fn test_overshoot_keeps_position_and_advances() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob")]);
        set_position(&mut room, 1, 95);

        let outcome = room.apply_roll(1, 4).unwrap();
        assert_eq!(outcome.from, 95);
        assert_eq!(outcome.to, 95);
        assert!(outcome.effect.is_none());
        assert_eq!(room.turn, 1);
    }

    #[test]
    fn test_overshoot_six_still_rolls_again() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob")]);
        set_position(&mut room, 1, 97);

        let outcome = room.apply_roll(1, 6).unwrap();
        assert_eq!(outcome.to, 97);
        assert!(outcome.bonus_turn);
        assert_eq!(room.turn, 0);
    }

    #[test]
    fn test_snake_hop_reported_with_source_cell() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob")]);
        set_position(&mut room, 1, 98);

        let outcome = room.apply_roll(1, 1).unwrap();
        let hop = outcome.effect.expect("cell 99 is a snake");
        assert_eq!(hop.kind, EffectKind::Snake);
        assert_eq!(hop.from, 99);
        assert_eq!(hop.to, 80);
        assert_eq!(outcome.from, 98);
        assert_eq!(outcome.to, 80);
        assert_eq!(room.turn, 1);
    }

    #[test]
    fn test_ladder_hop_from_start() {
        let mut room = playing_room(&[(1, "Alice")]);
        let outcome = room.apply_roll(1, 2).unwrap();

        let hop = outcome.effect.expect("cell 2 is a ladder");
        assert_eq!(hop.kind, EffectKind::Ladder);
        assert_eq!(hop.from, 2);
        assert_eq!(hop.to, 38);
        assert_eq!(outcome.to, 38);
    }

    #[test]
    fn test_exact_landing_wins() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob")]);
        set_position(&mut room, 1, 97);

        let outcome = room.apply_roll(1, 3).unwrap();
        assert!(outcome.won);
        assert!(!outcome.bonus_turn);
        assert_eq!(room.phase, RoomPhase::Finished);
        assert_eq!(room.winner.as_deref(), Some("Alice"));
        // Game over: the turn does not advance.
        assert_eq!(room.turn, 0);
    }

    #[test]
    fn test_winning_six_overrides_bonus() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob")]);
        set_position(&mut room, 1, 94);

        let outcome = room.apply_roll(1, 6).unwrap();
        assert!(outcome.won);
        assert!(!outcome.bonus_turn);
        assert_eq!(room.phase, RoomPhase::Finished);
    }

    #[test]
    fn test_roll_after_finish_rejected() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob")]);
        set_position(&mut room, 1, 99);
        room.apply_roll(1, 1).unwrap();

        assert_eq!(room.apply_roll(2, 3), Err(RoomError::NotPlaying));
    }

    #[test]
    fn test_remove_turn_holder_passes_turn() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob")]);
        assert_eq!(room.current_player_id(), Some(1));

        room.remove_player(1).unwrap();
        assert_eq!(room.player_count(), 1);
        assert_eq!(room.turn, 0);
        assert_eq!(room.current_player_id(), Some(2));
    }

    #[test]
    fn test_remove_last_seat_wraps_turn() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob")]);
        room.apply_roll(1, 3).unwrap();
        assert_eq!(room.current_player_id(), Some(2));

        room.remove_player(2).unwrap();
        assert_eq!(room.turn, 0);
        assert_eq!(room.current_player_id(), Some(1));
    }

    #[test]
    fn test_remove_earlier_seat_keeps_current_player() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob"), (3, "Carol")]);
        room.apply_roll(1, 3).unwrap();
        assert_eq!(room.current_player_id(), Some(2));

        room.remove_player(1).unwrap();
        assert_eq!(room.turn, 0);
        assert_eq!(room.current_player_id(), Some(2));
    }

    #[test]
    fn test_owner_transfer_on_departure() {
        let mut room = make_room();
        room.join(1, "Alice").unwrap();
        room.join(2, "Bob").unwrap();

        room.remove_player(1).unwrap();
        assert_eq!(room.owner, Some(2));
        // The new owner can start.
        room.start(2).unwrap();
        assert_eq!(room.phase, RoomPhase::Playing);
    }

    #[test]
    fn test_emptied_room_resets_to_lobby() {
        let mut room = playing_room(&[(1, "Alice")]);
        set_position(&mut room, 1, 99);
        room.apply_roll(1, 1).unwrap();
        assert_eq!(room.phase, RoomPhase::Finished);

        room.remove_player(1).unwrap();
        assert_eq!(room.phase, RoomPhase::Lobby);
        assert_eq!(room.turn, 0);
        assert_eq!(room.winner, None);
        assert_eq!(room.owner, None);
    }

    #[test]
    fn test_remove_unknown_player_is_noop() {
        let mut room = playing_room(&[(1, "Alice")]);
        assert!(room.remove_player(42).is_none());
        assert_eq!(room.player_count(), 1);
    }

    #[test]
    fn test_winner_set_iff_finished() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob")]);
        assert_eq!(room.winner, None);

        set_position(&mut room, 1, 97);
        room.apply_roll(1, 3).unwrap();
        assert_eq!(room.phase, RoomPhase::Finished);
        assert!(room.winner.is_some());
    }

    #[test]
    fn test_turn_index_valid_after_any_action() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob"), (3, "Carol")]);
        let mut rng = StdRng::seed_from_u64(11);

        for step in 0..200 {
            if room.phase != RoomPhase::Playing {
                break;
            }
            let actor = room.current_player_id().unwrap();
            room.roll(actor, &mut rng).unwrap();
            if step == 50 {
                let _ = room.remove_player(2);
            }
            assert!(room.player_count() == 0 || room.turn < room.player_count());
        }
    }

    #[test]
    fn test_solo_game_runs_to_completion() {
        let mut room = playing_room(&[(1, "Alice")]);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..10_000 {
            let outcome = room.roll(1, &mut rng).unwrap();

            // Position never decreases except across a snake.
            match outcome.effect {
                Some(hop) if hop.kind == EffectKind::Snake => assert!(outcome.to < hop.from),
                _ => assert!(outcome.to >= outcome.from),
            }

            if room.phase == RoomPhase::Finished {
                break;
            }
        }

        assert_eq!(room.phase, RoomPhase::Finished);
        assert_eq!(room.winner.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_snapshot_shape() {
        let mut room = playing_room(&[(1, "Alice"), (2, "Bob")]);
        room.apply_roll(1, 3).unwrap();

        let snapshot = room.snapshot();
        assert_eq!(snapshot.id, "TEST42");
        assert_eq!(snapshot.state, RoomPhase::Playing);
        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.players[0].position, 3);
        assert_eq!(snapshot.turn, 1);
        assert_eq!(snapshot.current, Some(2));
        assert_eq!(snapshot.winner, None);
    }
}
