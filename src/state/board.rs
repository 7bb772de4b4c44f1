//! Board model.
//!
//! A linear 100-cell track with a fixed table of teleport effects:
//! ladders move a token forward, snakes move it backward. The board is
//! immutable; everything here is a pure function over it.

use serde::{Deserialize, Serialize};

/// Number of cells on the track. A token wins by landing exactly here.
pub const TRACK_END: u8 = 100;

/// Fixed effect table: landing on the first cell teleports to the second.
///
/// Targets are never themselves sources, so effects never chain.
pub const BOARD_EFFECTS: [(u8, u8); 20] = [
    // Ladders
    (2, 38),
    (7, 14),
    (8, 31),
    (15, 26),
    (21, 42),
    (28, 84),
    (36, 44),
    (51, 67),
    (71, 91),
    (78, 98),
    // Snakes
    (16, 6),
    (46, 25),
    (49, 11),
    (62, 19),
    (64, 60),
    (74, 53),
    (89, 68),
    (92, 88),
    (95, 75),
    (99, 80),
];

/// Kind of board effect, derived from the teleport direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Snake,
    Ladder,
}

impl EffectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snake => "snake",
            Self::Ladder => "ladder",
        }
    }
}

/// Apply a dice roll to a position.
///
/// Returns `(landed_cell, overshoot)`. A move past the final cell is
/// rejected outright: the position is returned unchanged and `overshoot`
/// is true. There is no partial advance and no bounce-back.
pub fn apply_move(position: u8, roll: u8) -> (u8, bool) {
    let target = position as u16 + roll as u16;
    if target > TRACK_END as u16 {
        (position, true)
    } else {
        (target as u8, false)
    }
}

/// Resolve the effect for a landed cell.
///
/// Returns the final cell plus the effect kind if the cell is mapped.
/// Effects are a single hop by construction.
pub fn resolve_effect(cell: u8) -> (u8, Option<EffectKind>) {
    for (source, target) in BOARD_EFFECTS {
        if source == cell {
            let kind = if target > source {
                EffectKind::Ladder
            } else {
                EffectKind::Snake
            };
            return (target, Some(kind));
        }
    }
    (cell, None)
}
