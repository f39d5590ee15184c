//! Constants for board geometry, stone encoding and SGF root properties.
//!
//! Board size is a runtime value carried by every [`Board`](crate::board::Board),
//! so only the limits live here. The board uses a 1D array representation with
//! padding for boundary detection; see [`stride`] and [`board_len`].

// =============================================================================
// Board Geometry
// =============================================================================

/// Smallest accepted board size.
pub const MIN_BOARD_SIZE: usize = 1;

/// Largest accepted board size (GTP column letters A-Z without I).
pub const MAX_BOARD_SIZE: usize = 25;

/// Row stride of the padded 1D layout (N playable points + one shared padding column).
#[inline]
pub const fn stride(size: usize) -> usize {
    size + 1
}

/// Total board array size including all padding, for an NxN board.
#[inline]
pub const fn board_len(size: usize) -> usize {
    (size + 1) * (size + 2) + 1
}

// =============================================================================
// Special Move Values
// =============================================================================

/// Pass move marker (index 0 is padding, so safe to use).
pub const PASS_MOVE: usize = 0;

// =============================================================================
// Stone Encoding (relative to the side to move)
// =============================================================================

/// Stone of the player to move.
pub const STONE_TO_MOVE: u8 = b'X';

/// Stone of the opponent.
pub const STONE_OPPONENT: u8 = b'x';

/// Empty point.
pub const EMPTY: u8 = b'.';

/// Out of bounds (padding).
pub const OUT: u8 = b' ';

// =============================================================================
// SGF
// =============================================================================

/// `GM` value for Go.
pub const GAME_GO: i64 = 1;

/// `RE` value of a game that has no result.
pub const RESULT_VOID: &str = "Void";

/// Largest board where `tt` still denotes a pass.
pub const SGF_TT_PASS_MAX_SIZE: usize = 19;
