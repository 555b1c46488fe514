/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{anyhow, bail, Result};

use super::{generate_pseudo_legal_moves, PieceKind, Position, Square};

/// Maximum possible number of moves in a legal chess position.
///
/// Found [here](<https://www.chessprogramming.org/Chess_Position#cite_note-4>)
pub const MAX_NUM_MOVES: usize = 218;

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// The different kinds of moves that can be made during a chess game.
///
/// Discriminants follow the from-to-based flag scheme on the
/// [chess programming wiki](https://www.chessprogramming.org/Encoding_Moves#From-To_Based),
/// pre-shifted into the flag bits of a [`Move`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u16)]
pub enum MoveKind {
    /// A single piece moving without capturing anything.
    Quiet = 0 << Move::FLAG_BITS,

    /// A pawn advancing two squares from its starting rank.
    DoublePawnPush = 1 << Move::FLAG_BITS,

    /// The king and the king-side rook sliding past each other.
    ShortCastle = 2 << Move::FLAG_BITS,

    /// The king and the queen-side rook sliding past each other.
    LongCastle = 3 << Move::FLAG_BITS,

    /// A piece moving onto a square occupied by an opponent's piece.
    Capture = 4 << Move::FLAG_BITS,

    /// The en passant special case of a pawn capture.
    EnPassant = 5 << Move::FLAG_BITS,

    /// A pawn reaching the back rank and becoming a knight.
    PromoteKnight = 8 << Move::FLAG_BITS,

    /// A pawn reaching the back rank and becoming a bishop.
    PromoteBishop = 9 << Move::FLAG_BITS,

    /// A pawn reaching the back rank and becoming a rook.
    PromoteRook = 10 << Move::FLAG_BITS,

    /// A pawn reaching the back rank and becoming a queen.
    PromoteQueen = 11 << Move::FLAG_BITS,

    /// A capture that also promotes to a knight.
    CapturePromoteKnight = 12 << Move::FLAG_BITS,

    /// A capture that also promotes to a bishop.
    CapturePromoteBishop = 13 << Move::FLAG_BITS,

    /// A capture that also promotes to a rook.
    CapturePromoteRook = 14 << Move::FLAG_BITS,

    /// A capture that also promotes to a queen.
    CapturePromoteQueen = 15 << Move::FLAG_BITS,
}

impl MoveKind {
    /// The promotion kind for the given piece.
    ///
    /// # Panics
    /// Panics if `kind` is not a Knight, Bishop, Rook, or Queen.
    #[inline(always)]
    pub fn promotion(kind: PieceKind) -> Self {
        match kind {
            PieceKind::Knight => Self::PromoteKnight,
            PieceKind::Bishop => Self::PromoteBishop,
            PieceKind::Rook => Self::PromoteRook,
            PieceKind::Queen => Self::PromoteQueen,
            _ => unreachable!(),
        }
    }

    /// The capture-promotion kind for the given piece.
    ///
    /// # Panics
    /// Panics if `kind` is not a Knight, Bishop, Rook, or Queen.
    #[inline(always)]
    pub fn promotion_capture(kind: PieceKind) -> Self {
        match kind {
            PieceKind::Knight => Self::CapturePromoteKnight,
            PieceKind::Bishop => Self::CapturePromoteBishop,
            PieceKind::Rook => Self::CapturePromoteRook,
            PieceKind::Queen => Self::CapturePromoteQueen,
            _ => unreachable!(),
        }
    }
}

/// A move made on a chess board.
///
/// Internally encoded using the following bit pattern:
/// ```text
///     0000 000000 000000
///      |     |      |
///      |     |      +- Source square of the move.
///      |     +- Target square of the move.
///      +- Flags for captures, promotions, castling, etc.
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Move(u16);

impl Move {
    const SRC_MASK: u16 = 0b0000_0000_0011_1111;
    const DST_MASK: u16 = 0b0000_1111_1100_0000;
    const FLAG_MASK: u16 = 0b1111_0000_0000_0000;
    const DST_BITS: u16 = 6;
    const FLAG_BITS: u16 = 12;

    const FLAG_CAPTURE: u16 = 4 << Self::FLAG_BITS;
    const FLAG_PROMOTION: u16 = 8 << Self::FLAG_BITS;

    /// The null move, used as a sentinel in killer and counter-move tables.
    ///
    /// Reads as "a1a1", which can never be produced by move generation.
    pub const NULL: Self = Self(0);

    #[inline(always)]
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Self(kind as u16 | (to.index() as u16) << Self::DST_BITS | from.index() as u16)
    }

    /// The source square of this move.
    #[inline(always)]
    pub const fn from(self) -> Square {
        Square::from_index((self.0 & Self::SRC_MASK) as u8)
    }

    /// The destination square of this move.
    #[inline(always)]
    pub const fn to(self) -> Square {
        Square::from_index(((self.0 & Self::DST_MASK) >> Self::DST_BITS) as u8)
    }

    /// The [`MoveKind`] of this move.
    #[inline(always)]
    pub fn kind(self) -> MoveKind {
        match (self.0 & Self::FLAG_MASK) >> Self::FLAG_BITS {
            0 => MoveKind::Quiet,
            1 => MoveKind::DoublePawnPush,
            2 => MoveKind::ShortCastle,
            3 => MoveKind::LongCastle,
            4 => MoveKind::Capture,
            5 => MoveKind::EnPassant,
            8 => MoveKind::PromoteKnight,
            9 => MoveKind::PromoteBishop,
            10 => MoveKind::PromoteRook,
            11 => MoveKind::PromoteQueen,
            12 => MoveKind::CapturePromoteKnight,
            13 => MoveKind::CapturePromoteBishop,
            14 => MoveKind::CapturePromoteRook,
            15 => MoveKind::CapturePromoteQueen,
            _ => unreachable!("invalid move flag bits"),
        }
    }

    /// Whether this is the [`Move::NULL`] sentinel.
    #[inline(always)]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Whether this move captures a piece, including capture-promotions and en passant.
    #[inline(always)]
    pub const fn is_capture(self) -> bool {
        self.0 & Self::FLAG_CAPTURE != 0
    }

    /// Whether this move promotes a pawn, with or without a capture.
    #[inline(always)]
    pub const fn is_promotion(self) -> bool {
        self.0 & Self::FLAG_PROMOTION != 0
    }

    /// The piece this move promotes to, if it is a promotion.
    #[inline(always)]
    pub const fn promotion_kind(self) -> Option<PieceKind> {
        if !self.is_promotion() {
            return None;
        }

        Some(match (self.0 >> Self::FLAG_BITS) & 0b11 {
            0 => PieceKind::Knight,
            1 => PieceKind::Bishop,
            2 => PieceKind::Rook,
            _ => PieceKind::Queen,
        })
    }

    /// Parses a move from UCI notation like `e2e4` or `e7e8q`, resolving it
    /// against the moves available in `position`.
    pub fn from_uci(position: &Position, s: &str) -> Result<Self> {
        if !s.is_ascii() || s.len() < 4 || s.len() > 5 {
            bail!("invalid move {s:?}");
        }

        let from = Square::from_uci(&s[0..2])?;
        let to = Square::from_uci(&s[2..4])?;
        let promotion = s
            .chars()
            .nth(4)
            .map(PieceKind::from_promotion_char)
            .transpose()?;

        generate_pseudo_legal_moves(position)
            .into_iter()
            .find(|mv| mv.from() == from && mv.to() == to && mv.promotion_kind() == promotion)
            .ok_or_else(|| anyhow!("move {s:?} is not available in this position"))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(kind) = self.promotion_kind() {
            write!(f, "{}", kind.char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({:?})", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_encoding() {
        let e2 = Square::new(4, 1);
        let e4 = Square::new(4, 3);
        let mv = Move::new(e2, e4, MoveKind::DoublePawnPush);

        assert_eq!(mv.from(), e2);
        assert_eq!(mv.to(), e4);
        assert_eq!(mv.kind(), MoveKind::DoublePawnPush);
        assert!(!mv.is_capture());
        assert!(!mv.is_promotion());
        assert_eq!(mv.to_string(), "e2e4");
    }

    #[test]
    fn test_promotion_encoding() {
        let e7 = Square::new(4, 6);
        let d8 = Square::D8;
        let mv = Move::new(e7, d8, MoveKind::promotion_capture(PieceKind::Queen));

        assert!(mv.is_capture());
        assert!(mv.is_promotion());
        assert_eq!(mv.promotion_kind(), Some(PieceKind::Queen));
        assert_eq!(mv.to_string(), "e7d8q");
    }

    #[test]
    fn test_null_move() {
        assert!(Move::NULL.is_null());
        assert_eq!(Move::NULL.to_string(), "a1a1");
        assert_ne!(Move::NULL, Move::new(Square::E1, Square::G1, MoveKind::ShortCastle));
    }

    #[test]
    fn test_move_from_uci() {
        let position = Position::default();
        let mv = Move::from_uci(&position, "e2e4").unwrap();
        assert_eq!(mv.kind(), MoveKind::DoublePawnPush);

        assert!(Move::from_uci(&position, "e2e5").is_err());
        assert!(Move::from_uci(&position, "e7e8q").is_err());
    }
}
