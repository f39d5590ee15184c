//! Replay of a game record's main line into training records.
//!
//! Most of the work here deals with two features of SGF:
//! - Stones are added either by "play" properties (`B`, `W`) or by "add"
//!   properties (`AB`, `AW`). The latter set up puzzles and handicap stones and
//!   never resolve captures.
//! - Plays don't necessarily alternate colors. Free handicap placement records
//!   several consecutive `B` moves.
//!
//! [`Position`] frames the board for the side to move, so after every node the
//! turn is corrected against the color recorded in the next node.

use std::iter::FusedIterator;
use std::str::FromStr;

use log::{debug, trace, warn};
use thiserror::Error;

use crate::board::{Color, Point, deduce_groups, place_stone};
use crate::constants::{GAME_GO, MAX_BOARD_SIZE, MIN_BOARD_SIZE, PASS_MOVE};
use crate::position::{MoveError, Position};
use crate::record::PositionRecord;
use crate::sgf::{
    CoordError, Node, ParseError, parse_collection, parse_sgf_coord, parse_sgf_point_list,
};

/// Errors that prevent building a [`SgfWrapper`].
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("not a Go game record (GM[{0}])")]
    NotGo(i64),
    #[error("missing root property {0}")]
    Missing(&'static str),
    #[error("root property {0} has more than one value")]
    NotScalar(&'static str),
    #[error("root property {key} has invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("unsupported board size {0}")]
    UnsupportedBoardSize(usize),
}

/// Errors raised while replaying a single node. They end the walk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Move(#[from] MoveError),
    #[error(transparent)]
    Coord(#[from] CoordError),
}

/// A property value normalized by [`sgf_prop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropValue<'a> {
    Single(&'a str),
    List(&'a [String]),
}

impl<'a> PropValue<'a> {
    pub fn as_single(&self) -> Option<&'a str> {
        match *self {
            PropValue::Single(value) => Some(value),
            PropValue::List(_) => None,
        }
    }
}

/// Convert raw property values to a sensible value: nothing, one value, or the list.
pub fn sgf_prop(values: Option<&[String]>) -> Option<PropValue<'_>> {
    match values {
        None | Some([]) => None,
        Some([single]) => Some(PropValue::Single(single)),
        Some(list) => Some(PropValue::List(list)),
    }
}

fn root_scalar<T: FromStr>(root: &Node, key: &'static str) -> Result<Option<T>, ConstructionError> {
    match sgf_prop(root.get(key)) {
        None => Ok(None),
        Some(PropValue::List(_)) => Err(ConstructionError::NotScalar(key)),
        Some(PropValue::Single(raw)) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConstructionError::InvalidValue {
                key,
                value: raw.to_string(),
            }),
    }
}

/// A move recorded in a node, in absolute colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedMove {
    pub color: Color,
    /// `None` for a pass
    pub point: Option<Point>,
}

/// Apply the `AB` and `AW` setup properties of a node.
///
/// Stones are placed directly (black first, then white) without capture
/// resolution. When nothing is added the position is returned as is.
pub fn handle_add_stones(pos: Position, node: &Node) -> Result<Position, ReplayError> {
    let size = pos.size();
    let black_stones_added = setup_points(node, "AB", size)?;
    let white_stones_added = setup_points(node, "AW", size)?;
    if black_stones_added.is_empty() && white_stones_added.is_empty() {
        return Ok(pos);
    }

    let black = pos.stone_for(Color::Black);
    let white = pos.stone_for(Color::White);
    let mut working_board = pos.board().clone();
    for &pt in &black_stones_added {
        working_board = place_stone(&working_board, black, pt);
    }
    for &pt in &white_stones_added {
        working_board = place_stone(&working_board, white, pt);
    }
    let groups = deduce_groups(&working_board);
    Ok(pos.with_board(working_board, groups))
}

fn setup_points(node: &Node, key: &str, size: usize) -> Result<Vec<Point>, CoordError> {
    match node.get(key) {
        Some(values) => parse_sgf_point_list(values, size),
        None => Ok(Vec::new()),
    }
}

/// The move recorded in the main-line child of `node`, if there is a child.
///
/// A child without a `W` property is reported as a Black move, even when it
/// holds no `B` property either; its point is then `None`. Values that fail to
/// decode are also reported as `None`.
pub fn get_next_move(node: &Node, size: usize) -> Option<RecordedMove> {
    let next = node.next_child()?;
    let (color, values) = match next.get("W") {
        Some(values) => (Color::White, values),
        None => (Color::Black, next.get("B").unwrap_or_default()),
    };
    let point = values.first().and_then(|raw| match parse_sgf_coord(raw, size) {
        Ok(point) => point,
        Err(err) => {
            debug!("next move {color}[{raw}] does not decode: {err}");
            None
        }
    });
    Some(RecordedMove { color, point })
}

/// Play the `W` or `B` property of a node, then fix the side to move
/// according to the color recorded in the next node.
pub fn handle_play_stones(pos: Position, node: &Node) -> Result<Position, ReplayError> {
    let size = pos.size();
    let played = node.get("W").or_else(|| node.get("B"));
    let pos = match played.and_then(|values| values.first()) {
        Some(raw) => {
            let pt = parse_sgf_coord(raw, size)?.unwrap_or(PASS_MOVE);
            pos.play_move(pt)?
        }
        None => pos,
    };
    let next_player = get_next_move(node, size).map(|mv| mv.color);
    Ok(correct_turn(pos, next_player))
}

/// Make the side to move agree with the color recorded for the next move.
///
/// Playing a move always passes the turn, but the record may show the same
/// color again (free handicap placement). `None` leaves the position alone.
pub fn correct_turn(pos: Position, next_player: Option<Color>) -> Position {
    match next_player {
        Some(Color::White) if pos.black_to_move() => pos.with_turn(false),
        Some(Color::Black) if !pos.black_to_move() => pos.with_turn(true),
        _ => pos,
    }
}

/// A Go game record, exposing its main line as [`PositionRecord`]s.
///
/// ```
/// use michi_sgf::replay::SgfWrapper;
///
/// let sgf = SgfWrapper::from_text("(;GM[1]SZ[9]KM[6.5]RE[B+R];B[ee];W[cc])").unwrap();
/// for record in sgf.main_branch().filter(|r| r.is_usable()) {
///     println!("{record}");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SgfWrapper {
    root: Node,
    result: Option<String>,
    komi: f32,
    board_size: usize,
}

impl SgfWrapper {
    /// Parse SGF text and wrap its first game.
    pub fn from_text(text: &str) -> Result<Self, ConstructionError> {
        let games = parse_collection(text)?;
        if games.len() > 1 {
            warn!("collection holds {} games, using the first", games.len());
        }
        let root = games
            .into_iter()
            .next()
            .ok_or(ConstructionError::Parse(ParseError::EmptyCollection))?;
        Self::from_root(root)
    }

    /// Wrap an already parsed game tree.
    pub fn from_root(root: Node) -> Result<Self, ConstructionError> {
        let game = root_scalar::<i64>(&root, "GM")?.unwrap_or(GAME_GO);
        if game != GAME_GO {
            return Err(ConstructionError::NotGo(game));
        }

        let result = match sgf_prop(root.get("RE")) {
            Some(PropValue::Single(result)) => Some(result.to_string()),
            Some(PropValue::List(values)) => {
                warn!("ignoring result with {} values", values.len());
                None
            }
            None => None,
        };
        let komi = root_scalar::<f32>(&root, "KM")?.ok_or(ConstructionError::Missing("KM"))?;
        let board_size =
            root_scalar::<usize>(&root, "SZ")?.ok_or(ConstructionError::Missing("SZ"))?;
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&board_size) {
            return Err(ConstructionError::UnsupportedBoardSize(board_size));
        }

        debug!(
            "game record: {board_size}x{board_size}, komi {komi}, result {result:?}, {} main-line nodes",
            root.main_line_len()
        );
        Ok(SgfWrapper {
            root,
            result,
            komi,
            board_size,
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn komi(&self) -> f32 {
        self.komi
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    /// Walk the main line, yielding one record per node starting at the root.
    ///
    /// The walk ends after the last node, or right after the record of a node
    /// that could not be replayed (that record carries no position).
    pub fn main_branch(&self) -> MainBranch<'_> {
        let pos = Position::initial(self.board_size).with_komi(self.komi);
        MainBranch {
            state: Some((pos, &self.root)),
            result: self.result.as_deref(),
            depth: 0,
        }
    }
}

/// Iterator over the main line of a game. See [`SgfWrapper::main_branch`].
pub struct MainBranch<'a> {
    state: Option<(Position, &'a Node)>,
    result: Option<&'a str>,
    depth: usize,
}

impl Iterator for MainBranch<'_> {
    type Item = PositionRecord;

    fn next(&mut self) -> Option<PositionRecord> {
        let (pos, current_node) = self.state.take()?;
        let size = pos.size();

        let replayed = handle_add_stones(pos, current_node)
            .and_then(|pos| handle_play_stones(pos, current_node));
        let position = match replayed {
            Ok(pos) => Some(pos),
            Err(err) => {
                debug!("main line stops at node {}: {err}", self.depth);
                None
            }
        };
        let next_move = get_next_move(current_node, size).and_then(|mv| mv.point);
        trace!(
            "node {}: replayed={} next_move={next_move:?}",
            self.depth,
            position.is_some()
        );

        if let (Some(pos), Some(next_node)) = (&position, current_node.next_child()) {
            self.state = Some((pos.clone(), next_node));
        }
        self.depth += 1;

        Some(PositionRecord::new(
            position,
            next_move,
            self.result.map(str::to_string),
            size,
        ))
    }
}

impl FusedIterator for MainBranch<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{STONE_OPPONENT, STONE_TO_MOVE};
    use crate::sgf::parse_sgf_point;

    fn pt(raw: &str) -> Point {
        parse_sgf_point(raw, 9).unwrap()
    }

    fn values(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_sgf_prop() {
        assert_eq!(sgf_prop(None), None);
        assert_eq!(sgf_prop(Some(&[][..])), None);
        let one = values(&["6.5"]);
        assert_eq!(sgf_prop(Some(one.as_slice())), Some(PropValue::Single("6.5")));
        let many = values(&["aa", "bb"]);
        assert_eq!(sgf_prop(Some(many.as_slice())), Some(PropValue::List(&many[..])));
        assert_eq!(sgf_prop(Some(many.as_slice())).unwrap().as_single(), None);
    }

    #[test]
    fn test_add_stones_without_setup_is_identity() {
        let pos = Position::initial(9).play_move(pt("cc")).unwrap();
        let node = Node::new().with_property("B", &["dd"]).with_property("C", &["hi"]);
        let after = handle_add_stones(pos.clone(), &node).unwrap();
        assert_eq!(after, pos);
    }

    #[test]
    fn test_add_stones_uses_absolute_colors() {
        // White to move: black setup stones belong to the opponent
        let pos = Position::initial(9).with_turn(false);
        let node = Node::new()
            .with_property("AB", &["aa", "bb"])
            .with_property("AW", &["cc"]);
        let after = handle_add_stones(pos, &node).unwrap();

        assert_eq!(after.stone_at(pt("aa")), Some(Color::Black));
        assert_eq!(after.stone_at(pt("bb")), Some(Color::Black));
        assert_eq!(after.stone_at(pt("cc")), Some(Color::White));
        assert_eq!(after.board().get(pt("aa")), STONE_OPPONENT);
        assert_eq!(after.board().get(pt("cc")), STONE_TO_MOVE);
        assert_eq!(after.groups().len(), 3);
        assert!(!after.black_to_move());
        assert_eq!(after.n, 0, "setup is not a move");
    }

    #[test]
    fn test_add_stones_does_not_capture() {
        // A white stone with no liberties survives setup
        let node = Node::new()
            .with_property("AB", &["ba", "ab"])
            .with_property("AW", &["aa"]);
        let after = handle_add_stones(Position::initial(9), &node).unwrap();
        assert_eq!(after.stone_at(pt("aa")), Some(Color::White));
        let group = after.groups().group_at(pt("aa")).unwrap();
        assert!(group.liberties.is_empty());
    }

    #[test]
    fn test_add_stones_rejects_bad_points() {
        let node = Node::new().with_property("AB", &["zz"]);
        let err = handle_add_stones(Position::initial(9), &node).unwrap_err();
        assert!(matches!(err, ReplayError::Coord(CoordError::OutOfRange { .. })));
    }

    #[test]
    fn test_get_next_move_without_child() {
        assert_eq!(get_next_move(&Node::new(), 9), None);
    }

    #[test]
    fn test_get_next_move_reads_child() {
        let node = Node::new().with_child(Node::new().with_property("W", &["cc"]));
        assert_eq!(
            get_next_move(&node, 9),
            Some(RecordedMove {
                color: Color::White,
                point: Some(pt("cc")),
            })
        );

        let node = Node::new().with_child(Node::new().with_property("W", &[""]));
        assert_eq!(
            get_next_move(&node, 9),
            Some(RecordedMove {
                color: Color::White,
                point: None,
            })
        );
    }

    #[test]
    fn test_get_next_move_defaults_to_black() {
        // Neither B nor W: still reported as a Black move without a point
        let node = Node::new().with_child(Node::new().with_property("C", &["comment"]));
        assert_eq!(
            get_next_move(&node, 9),
            Some(RecordedMove {
                color: Color::Black,
                point: None,
            })
        );
    }

    #[test]
    fn test_get_next_move_prefers_first_child() {
        let node = Node::new()
            .with_child(Node::new().with_property("B", &["aa"]))
            .with_child(Node::new().with_property("W", &["bb"]));
        let mv = get_next_move(&node, 9).unwrap();
        assert_eq!(mv.color, Color::Black);
        assert_eq!(mv.point, Some(pt("aa")));
    }

    #[test]
    fn test_correct_turn() {
        let pos = Position::initial(9);
        assert!(!correct_turn(pos.clone(), Some(Color::White)).black_to_move());
        assert!(correct_turn(pos.clone(), Some(Color::Black)).black_to_move());
        assert_eq!(correct_turn(pos.clone(), None), pos);

        let white = pos.with_turn(false);
        assert!(correct_turn(white.clone(), Some(Color::Black)).black_to_move());
        assert_eq!(correct_turn(white.clone(), Some(Color::White)), white);
    }

    #[test]
    fn test_play_stones_repeated_black() {
        // B[aa] followed by another B node: Black stays to move
        let node = Node::new()
            .with_property("B", &["aa"])
            .with_child(Node::new().with_property("B", &["bb"]));
        let after = handle_play_stones(Position::initial(9), &node).unwrap();
        assert!(after.black_to_move());
        assert_eq!(after.stone_at(pt("aa")), Some(Color::Black));
        assert_eq!(after.n, 1);
    }

    #[test]
    fn test_play_stones_white_wins_over_black() {
        let node = Node::new()
            .with_property("W", &["aa"])
            .with_property("B", &["bb"]);
        let after = handle_play_stones(Position::initial(9), &node).unwrap();
        assert_eq!(after.last, pt("aa"));
        assert_eq!(after.stone_at(pt("bb")), None);
    }

    #[test]
    fn test_play_stones_without_move_keeps_position() {
        let pos = Position::initial(9);
        let node = Node::new().with_property("C", &["nothing"]);
        assert_eq!(handle_play_stones(pos.clone(), &node).unwrap(), pos);
    }

    #[test]
    fn test_play_stones_pass() {
        let node = Node::new().with_property("B", &["tt"]);
        let after = handle_play_stones(Position::initial(9), &node).unwrap();
        assert_eq!(after.last, PASS_MOVE);
        assert!(!after.black_to_move());
    }

    #[test]
    fn test_play_stones_illegal_move() {
        let pos = Position::initial(9).play_move(pt("cc")).unwrap();
        let node = Node::new().with_property("W", &["cc"]);
        assert_eq!(
            handle_play_stones(pos, &node).unwrap_err(),
            ReplayError::Move(MoveError::Occupied)
        );
    }

    #[test]
    fn test_construction_reads_root() {
        let sgf = SgfWrapper::from_text("(;GM[1]SZ[13]KM[0.5]RE[W+3.5])").unwrap();
        assert_eq!(sgf.board_size(), 13);
        assert_eq!(sgf.komi(), 0.5);
        assert_eq!(sgf.result(), Some("W+3.5"));
    }

    #[test]
    fn test_construction_defaults_game_type() {
        let sgf = SgfWrapper::from_text("(;SZ[9]KM[7])").unwrap();
        assert_eq!(sgf.result(), None);
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            SgfWrapper::from_text("(;GM[2]SZ[9]KM[0])"),
            Err(ConstructionError::NotGo(2))
        ));
        assert!(matches!(
            SgfWrapper::from_text("(;GM[1]SZ[9])"),
            Err(ConstructionError::Missing("KM"))
        ));
        assert!(matches!(
            SgfWrapper::from_text("(;GM[1]KM[6.5])"),
            Err(ConstructionError::Missing("SZ"))
        ));
        assert!(matches!(
            SgfWrapper::from_text("(;GM[1]SZ[9:13]KM[6.5])"),
            Err(ConstructionError::InvalidValue { key: "SZ", .. })
        ));
        assert!(matches!(
            SgfWrapper::from_text("(;GM[1]SZ[9][13]KM[6.5])"),
            Err(ConstructionError::NotScalar("SZ"))
        ));
        assert!(matches!(
            SgfWrapper::from_text("(;GM[1]SZ[52]KM[6.5])"),
            Err(ConstructionError::UnsupportedBoardSize(52))
        ));
        assert!(matches!(
            SgfWrapper::from_text("(;GM[1]SZ[9]KM[6.5]"),
            Err(ConstructionError::Parse(_))
        ));
    }
}
