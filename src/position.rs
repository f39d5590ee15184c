//! Go position representation and move execution.
//!
//! This module provides the position collaborator used by replay:
//! - Board state using a padded 1D array, sized at runtime
//! - Stone placement and capture detection driven by group metadata
//! - Ko rule enforcement
//!
//! The board uses a color-swapping scheme where the current player's stones
//! are always `'X'` and the opponent's stones are `'x'`. `black_to_move` keeps
//! track of which absolute color `'X'` stands for, so game records that store
//! absolute colors can be translated with [`Position::stone_for`] and
//! [`Position::stone_at`].
//!
//! Positions are values: [`Position::play_move`] and the `with_*` builders
//! return a new position and never modify the receiver.

use std::fmt;

use thiserror::Error;

use crate::board::{Board, Color, Groups, Point, deduce_groups};
use crate::constants::*;

/// Result of attempting to play a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("Error Illegal move: point not EMPTY")]
    Occupied,
    #[error("Error Illegal move: retakes ko")]
    Ko,
    #[error("Error Illegal move: suicide")]
    Suicide,
    #[error("Error Illegal move: point is off the board")]
    OffBoard,
}

/// A Go position (board state).
///
/// Colors are swapped after each move so that the current player is always `'X'`.
/// `groups` is always derived from `board`; every constructor keeps them in step.
#[derive(Clone, Debug, PartialEq)]
pub struct Position {
    board: Board,
    groups: Groups,
    black_to_move: bool,
    /// Move number (0 = start of game)
    pub n: usize,
    /// Ko point (0 if no ko)
    pub ko: Point,
    /// Last move played
    pub last: Point,
    /// Second-to-last move
    pub last2: Point,
    /// Captures by current player ('X')
    pub cap: u32,
    /// Captures by opponent ('x')
    pub cap_x: u32,
    /// Komi (compensation points for White)
    pub komi: f32,
}

impl Position {
    /// Empty board with Black to move.
    pub fn initial(size: usize) -> Self {
        let board = Board::empty(size);
        let groups = deduce_groups(&board);
        Position {
            board,
            groups,
            black_to_move: true,
            n: 0,
            ko: 0,
            last: 0,
            last2: 0,
            cap: 0,
            cap_x: 0,
            komi: 7.5,
        }
    }

    pub fn with_komi(mut self, komi: f32) -> Self {
        self.komi = komi;
        self
    }

    /// Replace the board and its group metadata, keeping everything else.
    pub fn with_board(mut self, board: Board, groups: Groups) -> Self {
        debug_assert_eq!(board.size(), self.size());
        self.board = board;
        self.groups = groups;
        self
    }

    /// Force the side to move.
    ///
    /// When this changes the side, the board is re-framed for the new player
    /// and the ko point is cleared, as after a pass.
    pub fn with_turn(mut self, black_to_move: bool) -> Self {
        if self.black_to_move != black_to_move {
            self.swap_sides();
            self.ko = 0;
        }
        self
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.board.size()
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn groups(&self) -> &Groups {
        &self.groups
    }

    #[inline]
    pub fn black_to_move(&self) -> bool {
        self.black_to_move
    }

    pub fn to_move(&self) -> Color {
        if self.black_to_move {
            Color::Black
        } else {
            Color::White
        }
    }

    /// Board byte that represents `color` in this position's framing.
    pub fn stone_for(&self, color: Color) -> u8 {
        if color == self.to_move() {
            STONE_TO_MOVE
        } else {
            STONE_OPPONENT
        }
    }

    /// Absolute color of the stone at `pt`, if any.
    pub fn stone_at(&self, pt: Point) -> Option<Color> {
        match self.board.get(pt) {
            STONE_TO_MOVE => Some(self.to_move()),
            STONE_OPPONENT => Some(self.to_move().other()),
            _ => None,
        }
    }

    /// Play a move for the side to move, returning the resulting position.
    ///
    /// Handles pass moves, legality checking, captures, ko detection, and color swapping.
    pub fn play_move(&self, pt: Point) -> Result<Position, MoveError> {
        let mut next = self.clone();
        if pt == PASS_MOVE {
            next.pass_in_place();
        } else {
            next.play_in_place(pt)?;
        }
        Ok(next)
    }

    /// Check if a point is "eyeish" (surrounded by stones of one color).
    ///
    /// Returns the color byte of the surrounding stones, or 0 if not eyeish.
    /// Note: This may return true for false eyes.
    pub fn is_eyeish(&self, pt: Point) -> u8 {
        let mut eyecolor: u8 = 0;
        for n in self.board.neighbors(pt) {
            let c = self.board.get(n);
            if c == OUT {
                continue;
            }
            if c == EMPTY {
                return 0;
            }
            if eyecolor == 0 {
                eyecolor = c;
            } else if c != eyecolor {
                return 0;
            }
        }
        eyecolor
    }

    fn swap_sides(&mut self) {
        self.board.swap_colors();
        self.groups = deduce_groups(&self.board);
        self.black_to_move = !self.black_to_move;
        std::mem::swap(&mut self.cap, &mut self.cap_x);
    }

    fn pass_in_place(&mut self) {
        self.swap_sides();
        self.n += 1;
        self.last2 = self.last;
        self.last = PASS_MOVE;
        self.ko = 0; // Ko is cleared on pass
    }

    fn play_in_place(&mut self, pt: Point) -> Result<(), MoveError> {
        if !self.board.is_on_board(pt) {
            return Err(MoveError::OffBoard);
        }
        if self.board.get(pt) != EMPTY {
            return Err(MoveError::Occupied);
        }
        if pt == self.ko {
            return Err(MoveError::Ko);
        }

        // Playing into an enemy eye is the only way to start a ko
        let in_enemy_eye = self.is_eyeish(pt) == STONE_OPPONENT;

        let mut board = self.board.clone();
        board.set(pt, STONE_TO_MOVE);

        // An adjacent enemy group whose last liberty is `pt` dies
        let mut captured = 0u32;
        let mut capture_point: Point = 0;
        for n in self.board.neighbors(pt) {
            if board.get(n) != STONE_OPPONENT {
                continue;
            }
            let Some(group) = self.groups.group_at(n) else {
                continue;
            };
            if group.liberties == [pt] {
                for &s in &group.stones {
                    board.set(s, EMPTY);
                }
                captured += group.stones.len() as u32;
                capture_point = n;
            }
        }

        board.swap_colors();
        let groups = deduce_groups(&board);
        if groups.group_at(pt).is_some_and(|g| g.liberties.is_empty()) {
            return Err(MoveError::Suicide);
        }

        self.ko = if captured == 1 && in_enemy_eye {
            capture_point
        } else {
            0
        };

        // The mover becomes the opponent after the swap
        let mover_caps = self.cap + captured;
        self.cap = self.cap_x;
        self.cap_x = mover_caps;

        self.board = board;
        self.groups = groups;
        self.black_to_move = !self.black_to_move;
        self.n += 1;
        self.last2 = self.last;
        self.last = pt;
        Ok(())
    }
}

/// Parse a coordinate string (e.g., "D4", "pass") into a Point.
///
/// Go coordinates use letters A-Z (skipping I) for columns and numbers for rows.
/// Returns `PASS_MOVE` for "pass" or invalid input.
pub fn parse_coord(s: &str, size: usize) -> Point {
    if s.eq_ignore_ascii_case("pass") {
        return PASS_MOVE;
    }

    let bytes = s.as_bytes();
    if bytes.len() < 2 || !bytes[0].is_ascii_alphabetic() {
        return PASS_MOVE;
    }

    let col_char = bytes[0].to_ascii_uppercase();
    if col_char == b'I' {
        return PASS_MOVE;
    }
    let mut col = (col_char - b'A' + 1) as usize;

    // Skip 'I' column (Go convention to avoid confusion with 'J')
    if col_char > b'I' {
        col -= 1;
    }

    if !bytes[1..].iter().all(u8::is_ascii_digit) {
        return PASS_MOVE;
    }
    let Ok(row) = s[1..].parse::<usize>() else {
        return PASS_MOVE;
    };

    if col > size || row == 0 || row > size {
        return PASS_MOVE;
    }
    (size - row + 1) * stride(size) + col
}

/// Convert a Point to a coordinate string (e.g., "D4").
///
/// Returns "pass" for `PASS_MOVE`.
pub fn str_coord(pt: Point, size: usize) -> String {
    if pt == PASS_MOVE {
        return "pass".into();
    }

    let row = pt / stride(size);
    let col = pt % stride(size);

    format!("{}{}", column_letter(col), size + 1 - row)
}

fn column_letter(col: usize) -> char {
    // Convert column to letter, skipping 'I'
    let c = b'@' + col as u8;
    if c >= b'I' { (c + 1) as char } else { c as char }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.size();
        let header: String = (1..=size).map(|col| format!(" {}", column_letter(col))).collect();
        writeln!(f, "   {header}")?;
        for row in 1..=size {
            let label = size + 1 - row;
            write!(f, "{label:>2} ")?;
            for col in 1..=size {
                let pt = row * stride(size) + col;
                let ch = match self.stone_at(pt) {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                };
                write!(f, " {ch}")?;
            }
            writeln!(f, " {label:<2}")?;
        }
        writeln!(f, "   {header}")?;
        write!(
            f,
            "Move: {}  To play: {}  Komi: {}",
            self.n,
            self.to_move(),
            self.komi
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_position() {
        let pos = Position::initial(9);
        let center = parse_coord("E5", 9);
        assert_eq!(pos.board().get(center), EMPTY);
        assert_eq!(pos.n, 0);
        assert_eq!(pos.ko, 0);
        assert!(pos.black_to_move());
        assert!(pos.groups().is_empty());
    }

    #[test]
    fn test_parse_str_coord_roundtrip() {
        for size in [9, 13, 19] {
            let pos = Position::initial(size);
            for pt in pos.board().points() {
                let s = str_coord(pt, size);
                assert_eq!(pt, parse_coord(&s, size), "Failed roundtrip for {s}");
            }
        }
    }

    #[test]
    fn test_parse_coord_rejects_off_board() {
        assert_eq!(parse_coord("K10", 9), PASS_MOVE);
        assert_eq!(parse_coord("I3", 9), PASS_MOVE);
        assert_eq!(parse_coord("A0", 9), PASS_MOVE);
        assert_eq!(parse_coord("D4x", 9), PASS_MOVE);
        assert_eq!(parse_coord("A99999999999999999999999", 19), PASS_MOVE);
        assert_eq!(parse_coord("A00000000000000000000004", 19), parse_coord("A4", 19));
    }

    #[test]
    fn test_play_move_basic() {
        let pos = Position::initial(9);
        let pt = parse_coord("D4", 9);
        let next = pos.play_move(pt).expect("Move should be legal");
        assert_eq!(next.n, 1);
        assert_eq!(next.last, pt);
        assert!(!next.black_to_move());
        assert_eq!(next.stone_at(pt), Some(Color::Black));
        // After the swap the black stone belongs to the opponent
        assert_eq!(next.board().get(pt), STONE_OPPONENT);
        // The original value is untouched
        assert_eq!(pos.stone_at(pt), None);
    }

    #[test]
    fn test_play_move_occupied() {
        let pt = parse_coord("D4", 9);
        let pos = Position::initial(9).play_move(pt).unwrap();
        assert_eq!(pos.play_move(pt).unwrap_err(), MoveError::Occupied);
    }

    #[test]
    fn test_play_move_suicide() {
        let mut pos = Position::initial(9);
        for mv in ["A2", "H8", "B1"] {
            pos = pos.play_move(parse_coord(mv, 9)).unwrap();
        }
        // White to play; A1 is surrounded by Black
        let result = pos.play_move(parse_coord("A1", 9));
        assert_eq!(result.unwrap_err(), MoveError::Suicide);
    }

    #[test]
    fn test_capture_updates_counts() {
        let mut pos = Position::initial(9);
        for mv in ["C4", "D4", "E4", "H8", "D3", "H9"] {
            pos = pos.play_move(parse_coord(mv, 9)).unwrap();
        }
        pos = pos.play_move(parse_coord("D5", 9)).unwrap();

        assert_eq!(pos.stone_at(parse_coord("D4", 9)), None);
        // White to move, Black made the capture
        assert_eq!(pos.cap, 0);
        assert_eq!(pos.cap_x, 1);
    }

    #[test]
    fn test_ko_rule() {
        let mut pos = Position::initial(9);
        // Black: A2 B1 B3 C2 around B2; White: C1 C3 D2 around C2
        for mv in ["A2", "C1", "B1", "C3", "B3", "D2", "C2", "B2"] {
            pos = pos.play_move(parse_coord(mv, 9)).unwrap();
        }
        // White B2 captured Black C2 into a ko
        let c2 = parse_coord("C2", 9);
        assert_eq!(pos.ko, c2);
        assert_eq!(pos.play_move(c2).unwrap_err(), MoveError::Ko);

        // A ko threat elsewhere lifts the restriction
        pos = pos.play_move(parse_coord("H8", 9)).unwrap();
        pos = pos.play_move(parse_coord("H9", 9)).unwrap();
        assert!(pos.play_move(c2).is_ok());
    }

    #[test]
    fn test_pass_clears_ko_and_flips_turn() {
        let mut pos = Position::initial(9);
        pos.ko = parse_coord("E5", 9);
        let next = pos.play_move(PASS_MOVE).unwrap();
        assert_eq!(next.ko, 0);
        assert_eq!(next.last, PASS_MOVE);
        assert!(!next.black_to_move());
    }

    #[test]
    fn test_with_turn_reframes_board() {
        let pt = parse_coord("C3", 9);
        let pos = Position::initial(9).play_move(pt).unwrap();
        assert!(!pos.black_to_move());

        let forced = pos.clone().with_turn(true);
        assert!(forced.black_to_move());
        assert_eq!(forced.stone_at(pt), Some(Color::Black));
        assert_eq!(forced.board().get(pt), STONE_TO_MOVE);
        assert_eq!(forced.groups().group_at(pt).unwrap().stone, STONE_TO_MOVE);

        // Same side: nothing changes
        assert_eq!(pos.clone().with_turn(false), pos);
    }

    #[test]
    fn test_stone_for_tracks_turn() {
        let pos = Position::initial(9);
        assert_eq!(pos.stone_for(Color::Black), STONE_TO_MOVE);
        assert_eq!(pos.stone_for(Color::White), STONE_OPPONENT);
        let pos = pos.with_turn(false);
        assert_eq!(pos.stone_for(Color::White), STONE_TO_MOVE);
    }

    #[test]
    fn test_display_uses_absolute_colors() {
        let pos = Position::initial(3)
            .play_move(parse_coord("A1", 3))
            .unwrap()
            .play_move(parse_coord("C3", 3))
            .unwrap();
        let text = pos.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "    A B C");
        assert_eq!(lines[1], " 3  . . O 3 ");
        assert_eq!(lines[3], " 1  X . . 1 ");
        assert!(lines[5].contains("To play: B"));
    }
}
