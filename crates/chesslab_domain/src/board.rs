use crate::{EvalEntry, StudyState};
use std::fmt;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub const A1: Square = Square { file: 0, rank: 0 };

    pub fn parse(raw: &str) -> Option<Self> {
        let bytes = raw.as_bytes();
        let [file, rank] = bytes else {
            return None;
        };
        if !(b'a'..=b'h').contains(file) || !(b'1'..=b'8').contains(rank) {
            return None;
        }
        Some(Self {
            file: file - b'a',
            rank: rank - b'1',
        })
    }

    pub fn file(self) -> u8 {
        self.file
    }

    pub fn rank(self) -> u8 {
        self.rank
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank + 1)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MoveArrow {
    pub from: Square,
    pub to: Square,
}

impl MoveArrow {
    /// Same-square arrow drawn for an entry without a usable move.
    pub const NONE: MoveArrow = MoveArrow {
        from: Square::A1,
        to: Square::A1,
    };

    pub fn is_degenerate(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoardModel {
    pub fen: String,
    pub is_start_position: bool,
    pub arrows: Vec<MoveArrow>,
}

/// Source and target squares of a UCI move such as `e2e4` or `e7e8q`.
pub fn parse_uci_squares(mv: &str) -> Option<(Square, Square)> {
    let from = Square::parse(mv.get(0..2)?)?;
    let to = Square::parse(mv.get(2..4)?)?;
    Some((from, to))
}

pub fn arrow_for_entry(entry: &EvalEntry) -> MoveArrow {
    entry
        .pv_uci
        .as_deref()
        .and_then(|pv| pv.split_whitespace().next())
        .and_then(parse_uci_squares)
        .map(|(from, to)| MoveArrow { from, to })
        .unwrap_or(MoveArrow::NONE)
}

pub fn board_model(state: &StudyState) -> BoardModel {
    let node = state.selected_node();
    let arrows = match node {
        Some(node) => state
            .evaluations
            .get(node.id)
            .iter()
            .take(state.settings.multipv as usize)
            .map(arrow_for_entry)
            .collect(),
        None => Vec::new(),
    };

    match node {
        Some(node) if !node.fen.trim().is_empty() => BoardModel {
            fen: node.fen.clone(),
            is_start_position: false,
            arrows,
        },
        _ => BoardModel {
            fen: START_FEN.to_owned(),
            is_start_position: true,
            arrows,
        },
    }
}
