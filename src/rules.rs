//! Seam to the external rules engine.
//!
//! The server owns legality; the client only asks the two questions that
//! drive the move protocol. Anything smarter (a full rules crate, a WASM
//! engine) can slot in behind [`RulesOracle`].

use crate::chess::{self, Color, Piece, PieceKind, Square};

/// Answers the position questions the move protocol needs.
pub trait RulesOracle {
    /// Returns the piece on `square` in the given position encoding.
    fn piece_at(&self, fen: &str, square: Square) -> Option<Piece>;

    /// Whether moving `piece` onto `target` completes a pawn's advance to
    /// the farthest rank for its color.
    fn is_promotion_advance(&self, piece: Piece, target: Square) -> bool;
}

/// Default oracle that reads the FEN board field directly.
///
/// Performs no legality checking whatsoever; an illegal drag still goes
/// to the server, which rejects it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FenOracle;

impl RulesOracle for FenOracle {
    fn piece_at(&self, fen: &str, square: Square) -> Option<Piece> {
        chess::piece_at(fen, square)
    }

    fn is_promotion_advance(&self, piece: Piece, target: Square) -> bool {
        let farthest = match piece.color {
            Color::White => 7,
            Color::Black => 0,
        };
        piece.kind == PieceKind::Pawn && target.rank() == farthest
    }
}
