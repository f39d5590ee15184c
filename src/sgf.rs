//! SGF (Smart Game Format) reader.
//!
//! Parses the text of a game record into a tree of [`Node`]s. Each node keeps
//! its raw properties (identifier -> list of values) and its children in
//! recorded order, so the main line is the chain of first children.
//!
//! Grammar (FF[4]):
//!
//! ```text
//! Collection = GameTree { GameTree }
//! GameTree   = "(" Sequence { GameTree } ")"
//! Sequence   = Node { Node }
//! Node       = ";" { Property }
//! Property   = PropIdent PropValue { PropValue }
//! ```
//!
//! Property values are kept as raw strings (escapes resolved); interpreting
//! them is left to the caller. [`parse_sgf_coord`] and [`parse_sgf_point_list`]
//! decode the point values used by move and setup properties.

use std::collections::HashMap;

use thiserror::Error;

use crate::board::Point;
use crate::constants::{SGF_TT_PASS_MAX_SIZE, stride};

/// Failure to read SGF text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },
    #[error("unexpected '{found}' at byte {offset}, expected {expected}")]
    UnexpectedChar {
        found: char,
        offset: usize,
        expected: &'static str,
    },
    #[error("no game tree found")]
    EmptyCollection,
}

/// Failure to decode an SGF point value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    #[error("invalid SGF point '{0}'")]
    Invalid(String),
    #[error("SGF point '{value}' is outside a {size}x{size} board")]
    OutOfRange { value: String, size: usize },
    #[error("pass is not allowed in a setup property")]
    PassInSetup,
}

/// A node of the game tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    properties: HashMap<String, Vec<String>>,
    children: Vec<Node>,
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append values to a property.
    pub fn with_property(mut self, key: &str, values: &[&str]) -> Self {
        self.properties
            .entry(key.to_string())
            .or_default()
            .extend(values.iter().map(|v| v.to_string()));
        self
    }

    /// Append a child (a new variation if the node already has children).
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn properties(&self) -> &HashMap<String, Vec<String>> {
        &self.properties
    }

    /// Raw values of a property, if present.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.properties.get(key).map(Vec::as_slice)
    }

    /// All children in recorded order. The first one continues the main line.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// The main-line continuation.
    pub fn next_child(&self) -> Option<&Node> {
        self.children.first()
    }

    /// Number of nodes on the main line starting at (and including) this node.
    pub fn main_line_len(&self) -> usize {
        std::iter::successors(Some(self), |node| node.next_child()).count()
    }
}

// Long games are chains of first children thousands of nodes deep. Unlink them
// iteratively so dropping a tree never recurses.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Parse every game tree of a collection. Returns one root node per game.
pub fn parse_collection(input: &str) -> Result<Vec<Node>, ParseError> {
    let mut parser = ParserData { input, offset: 0 };
    let mut games = vec![];
    loop {
        parser.skip_whitespaces();
        match parser.peek() {
            None => break,
            Some('(') => games.push(parse_game_tree(&mut parser)?),
            Some(found) => return Err(parser.unexpected(found, "'('")),
        }
    }
    if games.is_empty() {
        return Err(ParseError::EmptyCollection);
    }
    Ok(games)
}

/// A game tree whose closing parenthesis has not been read yet.
struct OpenTree {
    sequence: Vec<Node>,
    variations: Vec<Node>,
}

impl OpenTree {
    /// Chain the sequence through first children; variations hang off its last node.
    fn close(self) -> Result<Node, ParseError> {
        let mut nodes = self.sequence.into_iter().rev();
        let Some(mut tail) = nodes.next() else {
            return Err(ParseError::UnexpectedEof { expected: "';'" });
        };
        tail.children = self.variations;
        for mut node in nodes {
            node.children = vec![tail];
            tail = node;
        }
        Ok(tail)
    }
}

/// Parse a game tree. Nested variations are kept on an explicit stack, so
/// arbitrarily deep nesting only costs heap memory.
fn parse_game_tree(input: &mut ParserData) -> Result<Node, ParseError> {
    input.expect('(', "'('")?;
    let mut parents: Vec<OpenTree> = vec![];
    let mut current = OpenTree {
        sequence: parse_sequence(input)?,
        variations: vec![],
    };

    loop {
        input.skip_whitespaces();
        match input.peek() {
            Some('(') => {
                input.take();
                let variation = OpenTree {
                    sequence: parse_sequence(input)?,
                    variations: vec![],
                };
                parents.push(std::mem::replace(&mut current, variation));
            }
            Some(')') => {
                input.take();
                let tree = current.close()?;
                match parents.pop() {
                    Some(mut parent) => {
                        parent.variations.push(tree);
                        current = parent;
                    }
                    None => return Ok(tree),
                }
            }
            Some(found) => return Err(input.unexpected(found, "'(' or ')'")),
            None => return Err(ParseError::UnexpectedEof { expected: "')'" }),
        }
    }
}

/// One or more `;`-prefixed nodes.
fn parse_sequence(input: &mut ParserData) -> Result<Vec<Node>, ParseError> {
    let mut sequence = vec![];
    loop {
        input.skip_whitespaces();
        if input.peek() == Some(';') {
            input.take();
            sequence.push(parse_node(input)?);
        } else {
            break;
        }
    }
    if sequence.is_empty() {
        return Err(match input.peek() {
            Some(found) => input.unexpected(found, "';'"),
            None => ParseError::UnexpectedEof { expected: "';'" },
        });
    }
    Ok(sequence)
}

fn parse_node(input: &mut ParserData) -> Result<Node, ParseError> {
    let mut node = Node::default();
    loop {
        input.skip_whitespaces();
        match input.peek() {
            Some(ch) if ch.is_ascii_alphabetic() => {
                let ident = input.take_while(|ch| ch.is_ascii_alphabetic());
                // FF[3] allowed lower-case letters inside identifiers; they carry no meaning
                let key: String = ident.chars().filter(char::is_ascii_uppercase).collect();

                input.skip_whitespaces();
                if input.peek() != Some('[') {
                    return Err(match input.peek() {
                        Some(found) => input.unexpected(found, "'['"),
                        None => ParseError::UnexpectedEof { expected: "'['" },
                    });
                }
                let mut values = vec![];
                while input.peek() == Some('[') {
                    input.take();
                    values.push(parse_value(input)?);
                    input.skip_whitespaces();
                }
                if !key.is_empty() {
                    node.properties.entry(key).or_default().extend(values);
                }
            }
            _ => return Ok(node),
        }
    }
}

fn parse_value(input: &mut ParserData) -> Result<String, ParseError> {
    let mut value = String::new();
    loop {
        match input.take() {
            Some(']') => return Ok(value),
            Some('\\') => match input.take() {
                // Soft line break
                Some('\n') => {
                    if input.peek() == Some('\r') {
                        input.take();
                    }
                }
                Some('\r') => {
                    if input.peek() == Some('\n') {
                        input.take();
                    }
                }
                Some(ch) => value.push(ch),
                None => return Err(ParseError::UnexpectedEof { expected: "']'" }),
            },
            Some(ch) => value.push(ch),
            None => return Err(ParseError::UnexpectedEof { expected: "']'" }),
        }
    }
}

struct ParserData<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> ParserData<'a> {
    fn skip_whitespaces(&mut self) {
        let rest = self.input.trim_start_matches(char::is_whitespace);
        self.offset += self.input.len() - rest.len();
        self.input = rest;
    }

    fn peek(&self) -> Option<char> {
        self.input.chars().next()
    }

    fn take(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.input = &self.input[ch.len_utf8()..];
        self.offset += ch.len_utf8();
        Some(ch)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let end = self
            .input
            .char_indices()
            .find(|&(_, ch)| !pred(ch))
            .map(|(i, _)| i)
            .unwrap_or(self.input.len());
        let (taken, rest) = self.input.split_at(end);
        self.input = rest;
        self.offset += end;
        taken
    }

    fn expect(&mut self, expected_char: char, expected: &'static str) -> Result<(), ParseError> {
        match self.peek() {
            Some(ch) if ch == expected_char => {
                self.take();
                Ok(())
            }
            Some(found) => Err(self.unexpected(found, expected)),
            None => Err(ParseError::UnexpectedEof { expected }),
        }
    }

    fn unexpected(&self, found: char, expected: &'static str) -> ParseError {
        ParseError::UnexpectedChar {
            found,
            offset: self.offset,
            expected,
        }
    }
}

/// Decode an SGF point (`"dd"`) for an NxN board.
///
/// Columns come first, both counted from the top-left corner. An empty value,
/// or `tt` on boards up to 19x19, is a pass and decodes to `None`.
pub fn parse_sgf_coord(raw: &str, size: usize) -> Result<Option<Point>, CoordError> {
    let raw = raw.trim();
    if raw.is_empty() || (raw == "tt" && size <= SGF_TT_PASS_MAX_SIZE) {
        return Ok(None);
    }
    let bytes = raw.as_bytes();
    if bytes.len() != 2 {
        return Err(CoordError::Invalid(raw.to_string()));
    }
    let (Some(col), Some(row)) = (letter_index(bytes[0]), letter_index(bytes[1])) else {
        return Err(CoordError::Invalid(raw.to_string()));
    };
    if col >= size || row >= size {
        return Err(CoordError::OutOfRange {
            value: raw.to_string(),
            size,
        });
    }
    Ok(Some((row + 1) * stride(size) + col + 1))
}

/// Decode a setup point; passes are rejected.
pub fn parse_sgf_point(raw: &str, size: usize) -> Result<Point, CoordError> {
    parse_sgf_coord(raw, size)?.ok_or(CoordError::PassInSetup)
}

/// Decode a list of setup points, expanding compressed rectangles (`"aa:cb"`).
///
/// Rectangles expand row by row from their top-left corner.
pub fn parse_sgf_point_list(values: &[String], size: usize) -> Result<Vec<Point>, CoordError> {
    let mut points = Vec::with_capacity(values.len());
    for value in values {
        match value.split_once(':') {
            None => points.push(parse_sgf_point(value, size)?),
            Some((from, to)) => {
                let (a, b) = (parse_sgf_point(from, size)?, parse_sgf_point(to, size)?);
                let w = stride(size);
                let (row_a, col_a, row_b, col_b) = (a / w, a % w, b / w, b % w);
                for row in row_a.min(row_b)..=row_a.max(row_b) {
                    for col in col_a.min(col_b)..=col_a.max(col_b) {
                        points.push(row * w + col);
                    }
                }
            }
        }
    }
    Ok(points)
}

fn letter_index(b: u8) -> Option<usize> {
    match b {
        b'a'..=b'z' => Some((b - b'a') as usize),
        b'A'..=b'Z' => Some((b - b'A') as usize + 26),
        _ => None,
    }
}
