//! PGN reading and writing for a single game's mainline.

use std::collections::HashMap;
use std::io;
use std::ops::ControlFlow;

use pgn_reader::{RawComment, RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::{CastlingMode, Chess, Color, Position};
use thiserror::Error;

use crate::game_data::{position_from_fen, san_of, Annotation, GameRecord, HalfMove};

const LINE_WIDTH: usize = 80;

#[derive(Error, Debug)]
pub enum GameRecordError {
    #[error("no game found in PGN input")]
    Empty,

    #[error("invalid FEN tag: {0}")]
    InvalidFen(String),

    #[error("illegal move {san} at ply {ply}")]
    IllegalMove { ply: usize, san: String },

    #[error("failed to read PGN: {0}")]
    Io(#[from] io::Error),
}

/// Movetext state while replaying the mainline.
struct Replay {
    tags: Vec<(String, String)>,
    initial: Chess,
    pos: Chess,
    moves: Vec<HalfMove>,
}

/// Visitor that turns the first game of a PGN document into a [`GameRecord`].
struct RecordBuilder;

impl Visitor for RecordBuilder {
    type Tags = Vec<(String, String)>;
    type Movetext = Replay;
    type Output = Result<GameRecord, GameRecordError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(Vec::new())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        tags.push((
            String::from_utf8_lossy(name).into_owned(),
            value.decode_utf8_lossy().into_owned(),
        ));
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        let initial = match tags.iter().find(|(k, _)| k == "FEN") {
            Some((_, fen)) => match position_from_fen(fen) {
                Some(pos) => pos,
                None => return ControlFlow::Break(Err(GameRecordError::InvalidFen(fen.clone()))),
            },
            None => Chess::default(),
        };

        ControlFlow::Continue(Replay {
            tags,
            pos: initial.clone(),
            initial,
            moves: Vec::new(),
        })
    }

    fn san(&mut self, replay: &mut Self::Movetext, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        let ply = replay.moves.len() + 1;
        let mv = match san_plus.san.to_move(&replay.pos) {
            Ok(mv) => mv,
            Err(_) => {
                return ControlFlow::Break(Err(GameRecordError::IllegalMove {
                    ply,
                    san: san_plus.to_string(),
                }))
            }
        };

        let uci = mv.to_uci(CastlingMode::Standard).to_string();
        let san = san_of(&replay.pos, mv.clone());
        replay.pos.play_unchecked(mv.clone());

        replay.moves.push(HalfMove {
            ply,
            san,
            uci,
            comment: None,
            mv,
        });
        ControlFlow::Continue(())
    }

    fn comment(&mut self, replay: &mut Self::Movetext, comment: RawComment<'_>) -> ControlFlow<Self::Output> {
        // Comments before the first move have no node to hang on.
        let Some(last) = replay.moves.last_mut() else {
            return ControlFlow::Continue(());
        };
        let text = String::from_utf8_lossy(comment.as_bytes()).trim().to_string();
        if text.is_empty() {
            return ControlFlow::Continue(());
        }
        match &mut last.comment {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(&text);
            }
            None => last.comment = Some(text),
        }
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, _replay: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        // Mainline only
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, replay: Self::Movetext) -> Self::Output {
        if replay.tags.is_empty() && replay.moves.is_empty() {
            return Err(GameRecordError::Empty);
        }
        Ok(GameRecord {
            tags: replay.tags,
            initial: replay.initial,
            moves: replay.moves,
        })
    }
}

impl GameRecord {
    /// Parse the first game of a PGN document.
    pub fn from_pgn(pgn: &str) -> Result<GameRecord, GameRecordError> {
        let mut reader = Reader::new(io::Cursor::new(pgn.as_bytes()));
        match reader.read_game(&mut RecordBuilder)? {
            Some(result) => result,
            None => Err(GameRecordError::Empty),
        }
    }

    /// Write the game back as PGN.
    ///
    /// An annotation replaces whatever comment the move carried in the source.
    pub fn to_pgn(&self, annotations: &[Annotation]) -> String {
        let by_ply: HashMap<usize, &str> = annotations
            .iter()
            .map(|a| (a.ply, a.comment.as_str()))
            .collect();

        let mut out = String::new();
        for (name, value) in &self.tags {
            out.push_str(&format!("[{} \"{}\"]\n", name, escape_tag(value)));
        }
        if !self.tags.is_empty() {
            out.push('\n');
        }

        let mut tokens: Vec<String> = Vec::with_capacity(self.moves.len() * 2 + 1);
        let mut turn = self.initial.turn();
        let mut fullmove = self.initial.fullmoves().get();
        let mut needs_number = true;

        for half in &self.moves {
            match turn {
                Color::White => tokens.push(format!("{fullmove}.")),
                Color::Black if needs_number => tokens.push(format!("{fullmove}...")),
                Color::Black => {}
            }
            tokens.push(half.san.clone());
            needs_number = false;

            let comment = by_ply
                .get(&half.ply)
                .copied()
                .or(half.comment.as_deref())
                .map(sanitize_comment)
                .filter(|c| !c.is_empty());
            if let Some(comment) = comment {
                tokens.push(format!("{{ {comment} }}"));
                needs_number = true;
            }

            if turn == Color::Black {
                fullmove += 1;
            }
            turn = !turn;
        }
        tokens.push(self.result().to_string());

        out.push_str(&wrap_tokens(&tokens));
        out.push('\n');
        out
    }
}

/// PGN comments end at the first `}`; anything after it would leak into movetext.
fn sanitize_comment(comment: &str) -> String {
    comment.replace('}', "").trim().to_string()
}

fn escape_tag(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn wrap_tokens(tokens: &[String]) -> String {
    let mut out = String::new();
    let mut line_len = 0;
    for token in tokens {
        if line_len > 0 && line_len + 1 + token.len() > LINE_WIDTH {
            out.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        out.push_str(token);
        line_len += token.len();
    }
    out
}
