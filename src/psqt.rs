/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Piece-square tables.
//!
//! Values are from the
//! [Simplified Evaluation Function](https://www.chessprogramming.org/Simplified_Evaluation_Function).
//! Tables are written from White's point of view with rank 8 on the first
//! row, so White lookups flip the square vertically.

use crate::{Piece, PieceKind, Square};

#[rustfmt::skip]
const PAWN: [i16; Square::COUNT] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT: [i16; Square::COUNT] = [
   -50,-40,-30,-30,-30,-30,-40,-50,
   -40,-20,  0,  0,  0,  0,-20,-40,
   -30,  0, 10, 15, 15, 10,  0,-30,
   -30,  5, 15, 20, 20, 15,  5,-30,
   -30,  0, 15, 20, 20, 15,  0,-30,
   -30,  5, 10, 15, 15, 10,  5,-30,
   -40,-20,  0,  5,  5,  0,-20,-40,
   -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP: [i16; Square::COUNT] = [
   -20,-10,-10,-10,-10,-10,-10,-20,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -10,  0,  5, 10, 10,  5,  0,-10,
   -10,  5,  5, 10, 10,  5,  5,-10,
   -10,  0, 10, 10, 10, 10,  0,-10,
   -10, 10, 10, 10, 10, 10, 10,-10,
   -10,  5,  0,  0,  0,  0,  5,-10,
   -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK: [i16; Square::COUNT] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN: [i16; Square::COUNT] = [
   -20,-10,-10, -5, -5,-10,-10,-20,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -10,  0,  5,  5,  5,  5,  0,-10,
    -5,  0,  5,  5,  5,  5,  0, -5,
     0,  0,  5,  5,  5,  5,  0, -5,
   -10,  5,  5,  5,  5,  5,  0,-10,
   -10,  0,  5,  0,  0,  0,  0,-10,
   -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_MIDGAME: [i16; Square::COUNT] = [
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -20,-30,-30,-40,-40,-30,-30,-20,
   -10,-20,-20,-20,-20,-20,-20,-10,
    20, 20,  0,  0,  0,  0, 20, 20,
    20, 30, 10,  0,  0, 10, 30, 20,
];

#[rustfmt::skip]
const KING_ENDGAME: [i16; Square::COUNT] = [
   -50,-40,-30,-20,-20,-30,-40,-50,
   -30,-20,-10,  0,  0,-10,-20,-30,
   -30,-10, 20, 30, 30, 20,-10,-30,
   -30,-10, 30, 40, 40, 30,-10,-30,
   -30,-10, 30, 40, 40, 30,-10,-30,
   -30,-10, 20, 30, 30, 20,-10,-30,
   -30,-30,  0,  0,  0,  0,-30,-30,
   -50,-30,-30,-30,-30,-30,-50,-50,
];

/// Positional bonus for `piece` standing on `square`.
///
/// The king's table is interpolated between its middle-game and end-game
/// variants by `endgame_weight`, a percentage in `[0, 100]`.
pub fn bonus(piece: Piece, square: Square, endgame_weight: i32) -> i16 {
    let index = if piece.color().is_white() {
        square.index() ^ 56
    } else {
        square.index()
    };

    match piece.kind() {
        PieceKind::Pawn => PAWN[index],
        PieceKind::Knight => KNIGHT[index],
        PieceKind::Bishop => BISHOP[index],
        PieceKind::Rook => ROOK[index],
        PieceKind::Queen => QUEEN[index],
        PieceKind::King => {
            let midgame = KING_MIDGAME[index] as i32;
            let endgame = KING_ENDGAME[index] as i32;
            (midgame + (endgame - midgame) * endgame_weight / 100) as i16
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    #[test]
    fn test_tables_are_color_symmetric() {
        // A white pawn on e4 is worth the same as a black pawn on e5.
        let white = Piece::new(Color::White, PieceKind::Pawn);
        let black = Piece::new(Color::Black, PieceKind::Pawn);
        assert_eq!(
            bonus(white, Square::new(4, 3), 0),
            bonus(black, Square::new(4, 4), 0)
        );
    }

    #[test]
    fn test_king_interpolation() {
        // In the endgame the king should head for the center.
        let king = Piece::new(Color::White, PieceKind::King);
        let center = Square::new(3, 4);
        assert!(bonus(king, center, 100) > bonus(king, center, 0));
    }
}
