/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{psqt, Color, PieceKind, Position, Score, Square};

/// Scores a chess position.
///
/// The searcher treats the evaluator as a stateless collaborator, so search
/// tests can substitute engineered implementations.
pub trait Evaluator {
    /// Evaluate `position` in centipawns from the side-to-move's perspective.
    ///
    /// A positive score is good for the side to move, a negative score is
    /// good for the opponent, and 0 is equal.
    fn evaluate(&self, position: &Position) -> Score;
}

/// The engine's own evaluation: material plus piece-square tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct Material;

/// Material value of each piece kind.
///
/// Values are from the
/// [Simplified Evaluation Function](https://www.chessprogramming.org/Simplified_Evaluation_Function).
/// The king is 0 since it can never be captured.
#[inline(always)]
pub const fn value_of(kind: PieceKind) -> i16 {
    match kind {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 320,
        PieceKind::Bishop => 330,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        PieceKind::King => 0,
    }
}

/// Total non-king material in a standard starting position.
const INITIAL_MATERIAL: i32 = value_of(PieceKind::Pawn) as i32 * 16
    + value_of(PieceKind::Knight) as i32 * 4
    + value_of(PieceKind::Bishop) as i32 * 4
    + value_of(PieceKind::Rook) as i32 * 4
    + value_of(PieceKind::Queen) as i32 * 2;

/// How far the game has progressed towards an endgame, as a percentage.
///
/// 0 means all material is still on the board, 100 means bare kings.
fn endgame_weight(position: &Position) -> i32 {
    let mut remaining = 0;
    for color in [Color::White, Color::Black] {
        for kind in PieceKind::ALL {
            remaining +=
                position.pieces(color, kind).population() as i32 * value_of(kind) as i32;
        }
    }

    (INITIAL_MATERIAL - remaining).max(0) * 100 / INITIAL_MATERIAL
}

impl Evaluator for Material {
    fn evaluate(&self, position: &Position) -> Score {
        let weight = endgame_weight(position);
        let mut total = 0i32;

        for square in Square::iter() {
            if let Some(piece) = position.piece_at(square) {
                let value = value_of(piece.kind()) as i32 + psqt::bonus(piece, square, weight) as i32;
                if piece.color().is_white() {
                    total += value;
                } else {
                    total -= value;
                }
            }
        }

        if !position.side_to_move().is_white() {
            total = -total;
        }

        Score::new(total as i16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startpos_is_equal() {
        assert_eq!(Material.evaluate(&Position::default()), Score::DRAW);
    }

    #[test]
    fn test_evaluation_is_side_relative() {
        // White is up a queen; the score must flip sign with the side to move.
        let white_to_move = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        let black_to_move = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 b - - 0 1").unwrap();

        let score = Material.evaluate(&white_to_move);
        assert!(score > Score::DRAW);
        assert_eq!(Material.evaluate(&black_to_move), -score);
    }

    #[test]
    fn test_material_counts() {
        // A rook outweighs a bishop.
        let position = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let rook = Material.evaluate(&position);

        let position = Position::from_fen("4k3/8/8/8/8/8/8/B3K3 w - - 0 1").unwrap();
        let bishop = Material.evaluate(&position);

        assert!(rook > bishop);
    }
}
