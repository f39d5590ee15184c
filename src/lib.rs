//! Michi-SGF: replay Go game records into training positions.
//!
//! This crate reconstructs the positions of a recorded game (SGF) together with
//! the move that followed each of them and the final result, the triples a
//! supervised-learning pipeline trains on.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry limits and stone encoding
//! - [`board`] - Padded board storage, setup placement and group bookkeeping
//! - [`position`] - Go positions framed for the side to move (captures, ko)
//! - [`sgf`] - SGF parsing into a tree of nodes
//! - [`replay`] - Main-line replay: setup stones, moves and turn correction
//! - [`record`] - The emitted (position, next move, result) records
//!
//! ## Example
//!
//! ```
//! use michi_sgf::position::str_coord;
//! use michi_sgf::replay::SgfWrapper;
//!
//! let sgf = SgfWrapper::from_text("(;GM[1]SZ[9]KM[6.5]RE[B+R];B[ee])").unwrap();
//! let records: Vec<_> = sgf.main_branch().collect();
//! assert_eq!(records.len(), 2);
//! assert_eq!(str_coord(records[0].next_move().unwrap(), 9), "E5");
//! assert!(records[1].next_move().is_none());
//! ```

pub mod board;
pub mod constants;
pub mod position;
pub mod record;
pub mod replay;
pub mod sgf;
