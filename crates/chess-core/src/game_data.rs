use serde::{Deserialize, Serialize};
use shakmaty::{
    fen::Fen, san::San, uci::UciMove, CastlingMode, Chess, Color, EnPassantMode, Move, Position,
};

/// A single played half-move of the mainline.
#[derive(Debug, Clone)]
pub struct HalfMove {
    /// 1-based index of the half-move within the game
    pub ply: usize,
    /// Standard algebraic notation, with check/mate suffix
    pub san: String,
    /// Coordinate notation (e.g. "g8f6")
    pub uci: String,
    /// Comment attached to the move in the source PGN, if any
    pub comment: Option<String>,
    pub(crate) mv: Move,
}

impl HalfMove {
    pub fn chess_move(&self) -> &Move {
        &self.mv
    }
}

/// A comment to attach to the move with the given ply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub ply: usize,
    pub comment: String,
}

/// A parsed game: tag pairs, starting position and the mainline moves.
///
/// The move list is immutable once read. Annotations are applied only when the
/// game is written back out (see [`GameRecord::to_pgn`]).
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub(crate) tags: Vec<(String, String)>,
    pub(crate) initial: Chess,
    pub(crate) moves: Vec<HalfMove>,
}

impl GameRecord {
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn white(&self) -> &str {
        self.tag("White").unwrap_or("?")
    }

    pub fn black(&self) -> &str {
        self.tag("Black").unwrap_or("?")
    }

    pub fn result(&self) -> &str {
        self.tag("Result").unwrap_or("*")
    }

    pub fn initial_position(&self) -> &Chess {
        &self.initial
    }

    pub fn moves(&self) -> &[HalfMove] {
        &self.moves
    }

    /// Replay the mainline, yielding the position *before* each half-move.
    pub fn positions(&self) -> Vec<Chess> {
        let mut pos = self.initial.clone();
        let mut out = Vec::with_capacity(self.moves.len());
        for half in &self.moves {
            out.push(pos.clone());
            pos.play_unchecked(half.mv.clone());
        }
        out
    }

    /// Position after the last mainline move.
    pub fn final_position(&self) -> Chess {
        let mut pos = self.initial.clone();
        for half in &self.moves {
            pos.play_unchecked(half.mv.clone());
        }
        pos
    }
}

/// Serialize a position as a full FEN string.
pub fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Parse a FEN string into a standard chess position.
pub fn position_from_fen(fen: &str) -> Option<Chess> {
    let parsed: Fen = fen.trim().parse().ok()?;
    parsed.into_position::<Chess>(CastlingMode::Standard).ok()
}

/// SAN for `mv` played from `pos`, with `+`/`#` appended.
pub fn san_of(pos: &Chess, mv: Move) -> String {
    let mut san = San::from_move(pos, mv.clone()).to_string();
    let mut after = pos.clone();
    after.play_unchecked(mv);
    if after.is_checkmate() {
        san.push('#');
    } else if after.is_check() {
        san.push('+');
    }
    san
}

/// Convert a coordinate-notation move into SAN, if it is legal in `pos`.
pub fn uci_to_san(pos: &Chess, uci: &str) -> Option<String> {
    let uci_move: UciMove = uci.parse().ok()?;
    let mv = uci_move.to_move(pos).ok()?;
    Some(san_of(pos, mv))
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}
