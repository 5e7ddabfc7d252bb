//! Chess primitives shared across the client.
//!
//! The client treats the position encoding (FEN) as opaque except for the
//! two questions it needs answered locally: whose turn the encoding says
//! it is, and what piece sits on a square about to be dragged.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// A seat color.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Color {
    /// The white seat, which moves first.
    White,
    /// The black seat.
    Black,
}

impl Color {
    /// Returns the other color.
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// The single-letter side-to-move marker used by FEN (`w`/`b`).
    pub fn fen_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    fn from_fen_char(c: char) -> Option<Self> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }
}

/// Kind of piece occupying a square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    /// Pawn.
    Pawn,
    /// Knight.
    Knight,
    /// Bishop.
    Bishop,
    /// Rook.
    Rook,
    /// Queen.
    Queen,
    /// King.
    King,
}

impl PieceKind {
    fn from_fen_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

/// A colored piece as read out of a position encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    /// Which side owns the piece.
    pub color: Color,
    /// What kind of piece it is.
    pub kind: PieceKind,
}

/// The piece a pawn may promote to, in the wire's single-letter form.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PromotionPiece {
    /// Promote to a queen (`q`).
    #[serde(rename = "q")]
    #[strum(serialize = "q", serialize = "queen")]
    Queen,
    /// Promote to a rook (`r`).
    #[serde(rename = "r")]
    #[strum(serialize = "r", serialize = "rook")]
    Rook,
    /// Promote to a bishop (`b`).
    #[serde(rename = "b")]
    #[strum(serialize = "b", serialize = "bishop")]
    Bishop,
    /// Promote to a knight (`n`).
    #[serde(rename = "n")]
    #[strum(serialize = "n", serialize = "knight")]
    Knight,
}

/// Error produced when parsing a square from algebraic notation.
#[derive(Debug, Clone, Display, Error)]
#[display("invalid square '{text}' (expected a1..h8)")]
pub struct ParseSquareError {
    /// The rejected input.
    pub text: String,
}

/// A board coordinate in algebraic notation (`a1`..`h8`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Creates a square from zero-based file (`a` = 0) and rank (`1` = 0).
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Self { file, rank })
    }

    /// Zero-based file index, `a` = 0.
    pub fn file(&self) -> u8 {
        self.file
    }

    /// Zero-based rank index, rank 1 = 0.
    pub fn rank(&self) -> u8 {
        self.rank
    }

    /// One-based rank number as printed in algebraic notation.
    pub fn rank_number(&self) -> u8 {
        self.rank + 1
    }
}

impl std::str::FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reject = || ParseSquareError {
            text: s.to_string(),
        };
        let mut chars = s.chars();
        let file = chars.next().ok_or_else(reject)?;
        let rank = chars.next().ok_or_else(reject)?;
        if chars.next().is_some() {
            return Err(reject());
        }
        let file = (file.to_ascii_lowercase() as i32) - ('a' as i32);
        let rank = (rank as i32) - ('1' as i32);
        if !(0..8).contains(&file) || !(0..8).contains(&rank) {
            return Err(reject());
        }
        Ok(Self {
            file: file as u8,
            rank: rank as u8,
        })
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            (b'a' + self.file) as char,
            self.rank_number()
        )
    }
}

impl TryFrom<String> for Square {
    type Error = ParseSquareError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

/// Extracts the side to move from a FEN string (its second field).
pub fn side_to_move(fen: &str) -> Option<Color> {
    let field = fen.split_whitespace().nth(1)?;
    let mut chars = field.chars();
    let color = Color::from_fen_char(chars.next()?)?;
    chars.next().is_none().then_some(color)
}

/// Looks up the piece on `square` in a FEN string's board field.
///
/// Returns `None` for an empty square or an encoding this reader cannot
/// make sense of.
pub fn piece_at(fen: &str, square: Square) -> Option<Piece> {
    let board = fen.split_whitespace().next()?;
    // FEN lists ranks from 8 down to 1.
    let row = board.split('/').nth(7 - square.rank() as usize)?;
    let mut file = 0u8;
    for c in row.chars() {
        if let Some(skip) = c.to_digit(10) {
            file += skip as u8;
            if file > square.file() {
                return None;
            }
        } else {
            if file == square.file() {
                let kind = PieceKind::from_fen_char(c)?;
                let color = if c.is_ascii_uppercase() {
                    Color::White
                } else {
                    Color::Black
                };
                return Some(Piece { color, kind });
            }
            file += 1;
        }
    }
    None
}
