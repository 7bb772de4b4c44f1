//! Room registry.
//!
//! Process-wide mapping from a short shareable code to its [`Room`].
//! Codes are generated here; creation verifies the candidate is unused
//! and regenerates on collision.

use std::collections::HashMap;

use rand::Rng;

use crate::state::room::Room;

/// Room-code length.
pub const ROOM_CODE_LEN: usize = 6;

/// Code alphabet. Ambiguous glyphs (I, O, 0, 1) are excluded so codes
/// survive being read aloud or scribbled down.
pub const ROOM_CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate one candidate room code.
pub fn generate_code(rng: &mut impl Rng) -> String {
    let alphabet = ROOM_CODE_ALPHABET.as_bytes();
    (0..ROOM_CODE_LEN)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

/// Registry of live rooms, keyed by code.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty room under a fresh code and return the code.
    pub fn create_room(&mut self, rng: &mut impl Rng, max_players: usize) -> String {
        let code = loop {
            let candidate = generate_code(rng);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let mut room = Room::new(code.clone());
        room.max_players = max_players;
        self.rooms.insert(code.clone(), room);
        code
    }

    /// Insert a pre-built room (mainly useful in tests).
    pub fn insert(&mut self, room: Room) {
        self.rooms.insert(room.id.clone(), room);
    }

    /// Look up a room. Codes are case-insensitive.
    pub fn get(&self, code: &str) -> Option<&Room> {
        self.rooms.get(&code.to_uppercase())
    }

    /// Mutable lookup. Codes are case-insensitive.
    pub fn get_mut(&mut self, code: &str) -> Option<&mut Room> {
        self.rooms.get_mut(&code.to_uppercase())
    }

    /// Remove a room entirely.
    pub fn remove(&mut self, code: &str) -> Option<Room> {
        self.rooms.remove(&code.to_uppercase())
    }

    /// All live room codes.
    pub fn codes(&self) -> impl Iterator<Item = &String> {
        self.rooms.keys()
    }

    /// Codes of rooms whose last accepted action is older than `max_idle`.
    pub fn idle_codes(&self, max_idle: chrono::Duration) -> Vec<String> {
        let now = chrono::Utc::now();
        self.rooms
            .values()
            .filter(|room| now - room.touched_at > max_idle)
            .map(|room| room.id.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.rooms.len()
    }
}
