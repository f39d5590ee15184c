//! Records produced by replaying a game: a position, the move that came next,
//! and the eventual result of the game.

use std::fmt;

use crate::board::{Color, Point};
use crate::constants::RESULT_VOID;
use crate::position::{Position, str_coord};

/// One step of a replayed main line.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRecord {
    position: Option<Position>,
    next_move: Option<Point>,
    result: Option<String>,
    board_size: usize,
}

impl PositionRecord {
    pub fn new(
        position: Option<Position>,
        next_move: Option<Point>,
        result: Option<String>,
        board_size: usize,
    ) -> Self {
        PositionRecord {
            position,
            next_move,
            result,
            board_size,
        }
    }

    /// Position after replaying the node; `None` if the node could not be replayed.
    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Point played in the next main-line node; `None` at the end of the line or for a pass.
    pub fn next_move(&self) -> Option<Point> {
        self.next_move
    }

    /// The game's `RE` property.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    /// Whether this record can be used as a training example.
    pub fn is_usable(&self) -> bool {
        self.position.is_some() && self.next_move.is_some() && self.result() != Some(RESULT_VOID)
    }

    /// Winner according to the result, if the game had one.
    pub fn winner(&self) -> Option<Color> {
        self.result().and_then(parse_winner)
    }
}

/// Winner of an SGF result string such as `B+R` or `W+2.5`.
///
/// Draws (`0`, `Draw`), `Void` and unknown results (`?`) have no winner.
pub fn parse_winner(result: &str) -> Option<Color> {
    match result.trim().as_bytes() {
        [b'B' | b'b', b'+', ..] => Some(Color::Black),
        [b'W' | b'w', b'+', ..] => Some(Color::White),
        _ => None,
    }
}

impl fmt::Display for PositionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(position) => writeln!(f, "{position}")?,
            None => writeln!(f, "(no position)")?,
        }
        let next_move = self
            .next_move
            .map(|pt| str_coord(pt, self.board_size))
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "Next move: {} Result: {}",
            next_move,
            self.result().unwrap_or("-")
        )
    }
}
