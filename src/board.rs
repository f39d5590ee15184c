//! Board storage and group bookkeeping.
//!
//! A [`Board`] is the padded 1D array used by [`Position`](crate::position::Position),
//! sized at runtime. Stones are stored relative to the side to move
//! ([`STONE_TO_MOVE`] / [`STONE_OPPONENT`]); translating to absolute colors is the
//! position's job.
//!
//! [`place_stone`] writes a stone without any capture or legality logic, which is
//! what SGF setup properties require. Anything that writes to a board directly
//! must be followed by [`deduce_groups`] before the position is used for play.

use std::fmt;

use crate::constants::*;

/// A point on the board, represented as an index into the 1D board array.
pub type Point = usize;

/// Absolute stone color as recorded in a game record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn other(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "B"),
            Color::White => write!(f, "W"),
        }
    }
}

/// Padded board array for an NxN board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    /// 'X' = player to move, 'x' = opponent, '.' = empty, ' ' = out of bounds
    cells: Vec<u8>,
}

impl Board {
    /// Create an empty board.
    ///
    /// Layout for a board of size N:
    /// - Index 0 to N: top padding (out of bounds)
    /// - Each row: left padding + N playable points
    /// - Bottom padding
    pub fn empty(size: usize) -> Self {
        let mut cells = Vec::with_capacity(board_len(size));
        cells.extend(std::iter::repeat_n(OUT, size + 1));
        for _row in 1..=size {
            cells.push(OUT);
            cells.extend(std::iter::repeat_n(EMPTY, size));
        }
        cells.extend(std::iter::repeat_n(OUT, size + 2));
        debug_assert_eq!(cells.len(), board_len(size));
        Board { size, cells }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Contents of a point. Indices past the end read as padding.
    #[inline]
    pub fn get(&self, pt: Point) -> u8 {
        self.cells.get(pt).copied().unwrap_or(OUT)
    }

    #[inline]
    pub(crate) fn set(&mut self, pt: Point, stone: u8) {
        self.cells[pt] = stone;
    }

    /// Whether `pt` is a playable point of this board.
    #[inline]
    pub fn is_on_board(&self, pt: Point) -> bool {
        pt != PASS_MOVE && pt < self.cells.len() && self.cells[pt] != OUT
    }

    /// Point index for a 0-based column and row, counted from the top-left corner.
    #[inline]
    pub fn point(&self, col: usize, row: usize) -> Point {
        (row + 1) * stride(self.size) + col + 1
    }

    /// All playable points, row by row from the top.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        let w = stride(self.size);
        (1..=self.size).flat_map(move |row| (1..=self.size).map(move |col| row * w + col))
    }

    /// Number of stones of either color.
    pub fn stone_count(&self) -> usize {
        self.points().filter(|&pt| self.get(pt) != EMPTY).count()
    }

    /// The 4 orthogonal neighbors (N, E, S, W) of a point.
    #[inline]
    pub fn neighbors(&self, pt: Point) -> [Point; 4] {
        let w = stride(self.size);
        [pt - w, pt + 1, pt + w, pt - 1]
    }

    /// Swap stone colors (X <-> x) to change the side the board is framed for.
    pub fn swap_colors(&mut self) {
        for c in &mut self.cells {
            *c = match *c {
                STONE_TO_MOVE => STONE_OPPONENT,
                STONE_OPPONENT => STONE_TO_MOVE,
                other => other,
            };
        }
    }
}

/// Place a stone directly, without resolving captures or checking legality.
///
/// Returns a new board; the input is left untouched. The caller must
/// re-derive groups afterwards with [`deduce_groups`].
pub fn place_stone(board: &Board, stone: u8, pt: Point) -> Board {
    let mut board = board.clone();
    board.set(pt, stone);
    board
}

/// A maximal chain of connected stones of one color.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    /// Stone byte shared by every member
    pub stone: u8,
    /// Member points, ascending
    pub stones: Vec<Point>,
    /// Distinct empty neighbors, ascending
    pub liberties: Vec<Point>,
}

/// Group membership for every point of a board.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Groups {
    owner: Vec<Option<usize>>,
    groups: Vec<Group>,
}

impl Groups {
    /// The group containing the stone at `pt`, if any.
    pub fn group_at(&self, pt: Point) -> Option<&Group> {
        self.owner
            .get(pt)
            .copied()
            .flatten()
            .map(|id| &self.groups[id])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Compute groups and liberties from scratch.
///
/// Uses flood-fill from every stone not yet assigned to a group.
pub fn deduce_groups(board: &Board) -> Groups {
    let len = board_len(board.size());
    let mut owner: Vec<Option<usize>> = vec![None; len];
    let mut groups = Vec::new();
    let mut liberty_seen = vec![usize::MAX; len];

    for start in board.points() {
        let stone = board.get(start);
        if stone == EMPTY || owner[start].is_some() {
            continue;
        }
        let id = groups.len();
        let mut stones = Vec::new();
        let mut liberties = Vec::new();
        let mut stack = vec![start];
        owner[start] = Some(id);

        while let Some(pt) = stack.pop() {
            stones.push(pt);
            for n in board.neighbors(pt) {
                match board.get(n) {
                    EMPTY => {
                        if liberty_seen[n] != id {
                            liberty_seen[n] = id;
                            liberties.push(n);
                        }
                    }
                    c if c == stone && owner[n].is_none() => {
                        owner[n] = Some(id);
                        stack.push(n);
                    }
                    _ => {}
                }
            }
        }
        stones.sort_unstable();
        liberties.sort_unstable();
        groups.push(Group {
            stone,
            stones,
            liberties,
        });
    }

    Groups { owner, groups }
}
