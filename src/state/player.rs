//! Player records and join-time normalization.

/// Per-connection ephemeral identifier, allocated when a WebSocket opens.
pub type ConnectionId = u64;

/// Maximum display-name length; longer names are truncated.
pub const MAX_NAME_LEN: usize = 20;

/// Name assigned when a player joins with a blank name.
pub const DEFAULT_NAME: &str = "Player";

/// Fixed token palette, assigned round-robin by join order.
pub const PLAYER_COLORS: [&str; 6] = [
    "#e74c3c", "#3498db", "#2ecc71", "#9b59b6", "#f1c40f", "#e67e22",
];

/// A seated player. Owned exclusively by the room that contains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Connection id of the owning WebSocket
    pub id: ConnectionId,

    /// Display name, already sanitized
    pub name: String,

    /// Token color from the palette
    pub color: String,

    /// Track position in 0..=100; 0 means the token has not moved yet
    pub position: u8,
}

impl Player {
    pub fn new(id: ConnectionId, name: &str, color: &str) -> Self {
        Self {
            id,
            name: sanitize_name(name),
            color: color.to_string(),
            position: 0,
        }
    }
}

/// Normalize a requested display name: trim, default when blank,
/// truncate to [`MAX_NAME_LEN`] characters.
pub fn sanitize_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        trimmed.chars().take(MAX_NAME_LEN).collect()
    }
}

/// Palette color for the nth seat.
pub fn color_for(seat: usize) -> &'static str {
    PLAYER_COLORS[seat % PLAYER_COLORS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_starts_off_board() {
        let player = Player::new(1, "Alice", color_for(0));
        assert_eq!(player.position, 0);
        assert_eq!(player.name, "Alice");
        assert_eq!(player.color, PLAYER_COLORS[0]);
    }

    #[test]
    fn test_sanitize_blank_name() {
        assert_eq!(sanitize_name(""), DEFAULT_NAME);
        assert_eq!(sanitize_name("   "), DEFAULT_NAME);
    }

    #[test]
    fn test_sanitize_trims_and_truncates() {
        assert_eq!(sanitize_name("  Gurshan  "), "Gurshan");

        let long = "abcdefghijklmnopqrstuvwxyz";
        assert_eq!(sanitize_name(long).chars().count(), MAX_NAME_LEN);
        assert_eq!(sanitize_name(long), "abcdefghijklmnopqrst");
    }

    #[test]
    fn test_sanitize_counts_chars_not_bytes() {
        let name: String = "é".repeat(25);
        assert_eq!(sanitize_name(&name).chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn test_color_rotation_wraps() {
        assert_eq!(color_for(0), PLAYER_COLORS[0]);
        assert_eq!(color_for(5), PLAYER_COLORS[5]);
        assert_eq!(color_for(6), PLAYER_COLORS[0]);
        assert_eq!(color_for(13), PLAYER_COLORS[1]);
    }
}
