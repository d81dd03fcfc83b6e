pub mod game_data;
pub mod pgn;

pub use game_data::{
    color_name, fen_of, position_from_fen, san_of, uci_to_san, Annotation, GameRecord, HalfMove,
};
pub use pgn::GameRecordError;
