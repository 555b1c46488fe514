/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Bitboards and attack generation.
mod bitboard;

/// Move generation.
mod movegen;

/// Move encoding and move lists.
mod moves;

/// Colors, piece kinds, and colored pieces.
mod piece;

/// The board state itself, FEN handling, and making/unmaking moves.
mod position;

/// Squares and coordinates.
mod square;

/// Zobrist hashing.
mod zobrist;

pub use bitboard::*;
pub use movegen::*;
pub use moves::*;
pub use piece::*;
pub use position::*;
pub use square::*;
