//! Score normalization and blunder gating. Pure functions only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shakmaty::Color;

/// Magnitude a forced mate maps to on the centipawn scale.
/// Must stay far above any realistic blunder threshold.
pub const MATE_SENTINEL: i32 = 30_000;

/// Default blunder threshold (centipawns)
pub const DEFAULT_THRESHOLD: u32 = 150;

/// Raw engine evaluation, already on White's perspective
/// (positive favours White regardless of who is to move).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineScore {
    /// Centipawn score
    Centipawns(i32),
    /// Mate in N (positive = White mates, negative = Black mates)
    Mate(i32),
    /// The engine reported no usable score
    Unknown,
}

impl EngineScore {
    pub fn is_mate(&self) -> bool {
        matches!(self, EngineScore::Mate(_))
    }

    /// Flip a score reported relative to the side to move onto White's perspective.
    ///
    /// `Mate(0)` means the side to move is already mated. It carries no sign, so it
    /// becomes a lost score for that side before the flip.
    pub fn from_side_to_move(self, white_to_move: bool) -> Self {
        let relative = match self {
            EngineScore::Mate(0) => EngineScore::Centipawns(-MATE_SENTINEL),
            other => other,
        };
        if white_to_move {
            return relative;
        }
        match relative {
            EngineScore::Centipawns(cp) => EngineScore::Centipawns(-cp),
            EngineScore::Mate(m) => EngineScore::Mate(-m),
            EngineScore::Unknown => EngineScore::Unknown,
        }
    }
}

/// Collapse an engine score into a single signed integer (White's perspective).
pub fn normalize(score: EngineScore) -> i32 {
    match score {
        EngineScore::Centipawns(cp) => cp,
        EngineScore::Mate(m) if m < 0 => -MATE_SENTINEL,
        EngineScore::Mate(_) => MATE_SENTINEL,
        EngineScore::Unknown => 0,
    }
}

/// How much the mover's position got worse. Positive means the move hurt the mover.
pub fn evaluation_drop(before: i32, after: i32, mover: Color) -> i32 {
    match mover {
        Color::White => before - after,
        Color::Black => after - before,
    }
}

/// Which side's moves are inspected for blunders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideFilter {
    White,
    Black,
    #[default]
    Both,
}

impl SideFilter {
    pub fn matches(self, mover: Color) -> bool {
        match self {
            SideFilter::Both => true,
            SideFilter::White => mover == Color::White,
            SideFilter::Black => mover == Color::Black,
        }
    }
}

impl FromStr for SideFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Ok(SideFilter::White),
            "black" => Ok(SideFilter::Black),
            "both" => Ok(SideFilter::Both),
            other => Err(format!("unknown side '{other}' (expected white, black or both)")),
        }
    }
}

impl fmt::Display for SideFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SideFilter::White => "white",
            SideFilter::Black => "black",
            SideFilter::Both => "both",
        };
        f.write_str(s)
    }
}

/// Whether a move with the given drop should be investigated.
pub fn is_blunder(drop: i32, threshold: u32, mover: Color, side: SideFilter) -> bool {
    i64::from(drop) > i64::from(threshold) && side.matches(mover)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(EngineScore::Centipawns(35)), 35);
        assert_eq!(normalize(EngineScore::Centipawns(-120)), -120);
        assert_eq!(normalize(EngineScore::Mate(3)), MATE_SENTINEL);
        assert_eq!(normalize(EngineScore::Mate(-1)), -MATE_SENTINEL);
        assert_eq!(normalize(EngineScore::Unknown), 0);
    }

    #[test]
    fn test_side_to_move_flip() {
        assert_eq!(
            EngineScore::Centipawns(40).from_side_to_move(false),
            EngineScore::Centipawns(-40)
        );
        assert_eq!(EngineScore::Mate(2).from_side_to_move(false), EngineScore::Mate(-2));
        assert_eq!(EngineScore::Mate(2).from_side_to_move(true), EngineScore::Mate(2));
    }

    #[test]
    fn test_already_mated_side_is_lost() {
        assert_eq!(normalize(EngineScore::Mate(0).from_side_to_move(true)), -MATE_SENTINEL);
        assert_eq!(normalize(EngineScore::Mate(0).from_side_to_move(false)), MATE_SENTINEL);
    }

    #[test]
    fn test_drop_sign_convention() {
        // White lets a +100 position fall to -80
        assert_eq!(evaluation_drop(100, -80, Color::White), 180);
        // Black lets a +50 position rise to +1000
        assert_eq!(evaluation_drop(50, 1000, Color::Black), 950);
        // Improving moves give a negative drop for either color
        assert!(evaluation_drop(0, 200, Color::White) < 0);
        assert!(evaluation_drop(0, -200, Color::Black) < 0);
    }

    #[test]
    fn test_missed_mate_dominates_threshold() {
        let before = normalize(EngineScore::Mate(3));
        let after = normalize(EngineScore::Centipawns(250));
        let drop = evaluation_drop(before, after, Color::White);
        assert!(drop >= MATE_SENTINEL - 250);
        assert!(is_blunder(drop, DEFAULT_THRESHOLD, Color::White, SideFilter::Both));

        let before = normalize(EngineScore::Mate(-2));
        let after = normalize(EngineScore::Centipawns(-400));
        let drop = evaluation_drop(before, after, Color::Black);
        assert!(drop >= MATE_SENTINEL - 400);
    }

    #[test]
    fn test_gate() {
        assert!(is_blunder(151, 150, Color::Black, SideFilter::Both));
        assert!(!is_blunder(150, 150, Color::Black, SideFilter::Both));
        assert!(!is_blunder(500, 150, Color::Black, SideFilter::White));
        assert!(is_blunder(500, 150, Color::Black, SideFilter::Black));
        assert!(!is_blunder(-500, 0, Color::White, SideFilter::Both));
    }

    #[test]
    fn test_side_filter_parse() {
        assert_eq!("White".parse::<SideFilter>().unwrap(), SideFilter::White);
        assert_eq!(" black ".parse::<SideFilter>().unwrap(), SideFilter::Black);
        assert_eq!("BOTH".parse::<SideFilter>().unwrap(), SideFilter::Both);
        assert!("red".parse::<SideFilter>().is_err());
    }
}
