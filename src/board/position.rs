/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{anyhow, bail, Context, Result};

use super::{
    bishop_attacks, rook_attacks, zobrist, Bitboard, Color, Move, MoveKind, Piece, PieceKind,
    Square, KING_ATTACKS, KNIGHT_ATTACKS, PAWN_ATTACKS,
};

/// FEN string for the standard starting position.
pub const FEN_STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Which castling moves are still available to each side.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
#[repr(transparent)]
pub struct CastlingRights(u8);

impl CastlingRights {
    const WHITE_KINGSIDE: u8 = 0b0001;
    const WHITE_QUEENSIDE: u8 = 0b0010;
    const BLACK_KINGSIDE: u8 = 0b0100;
    const BLACK_QUEENSIDE: u8 = 0b1000;

    pub const NONE: Self = Self(0);

    /// This set of rights as an index in `0..16`.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn kingside(self, color: Color) -> bool {
        match color {
            Color::White => self.0 & Self::WHITE_KINGSIDE != 0,
            Color::Black => self.0 & Self::BLACK_KINGSIDE != 0,
        }
    }

    #[inline(always)]
    pub const fn queenside(self, color: Color) -> bool {
        match color {
            Color::White => self.0 & Self::WHITE_QUEENSIDE != 0,
            Color::Black => self.0 & Self::BLACK_QUEENSIDE != 0,
        }
    }

    /// Parses the castling field of a FEN string, like `KQkq` or `-`.
    pub fn from_fen(s: &str) -> Result<Self> {
        if s == "-" {
            return Ok(Self::NONE);
        }

        let mut rights = 0;
        for c in s.chars() {
            rights |= match c {
                'K' => Self::WHITE_KINGSIDE,
                'Q' => Self::WHITE_QUEENSIDE,
                'k' => Self::BLACK_KINGSIDE,
                'q' => Self::BLACK_QUEENSIDE,
                _ => bail!("invalid castling rights {s:?}"),
            };
        }

        Ok(Self(rights))
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "-");
        }

        for (bit, c) in [
            (Self::WHITE_KINGSIDE, 'K'),
            (Self::WHITE_QUEENSIDE, 'Q'),
            (Self::BLACK_KINGSIDE, 'k'),
            (Self::BLACK_QUEENSIDE, 'q'),
        ] {
            if self.0 & bit != 0 {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

/// Rights that survive a move touching each square.
///
/// A move from or to a king or rook home square permanently removes the
/// corresponding rights.
const CASTLING_MASKS: [u8; Square::COUNT] = {
    let mut masks = [0b1111; Square::COUNT];
    masks[Square::E1.index()] = !(CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE);
    masks[Square::H1.index()] = !CastlingRights::WHITE_KINGSIDE;
    masks[Square::A1.index()] = !CastlingRights::WHITE_QUEENSIDE;
    masks[Square::E8.index()] = !(CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE);
    masks[Square::H8.index()] = !CastlingRights::BLACK_KINGSIDE;
    masks[Square::A8.index()] = !CastlingRights::BLACK_QUEENSIDE;
    masks
};

/// State that cannot be recomputed when a move is taken back.
#[derive(Clone, Copy, Debug)]
struct Unmake {
    captured: Option<(Square, Piece)>,
    castling: CastlingRights,
    ep_square: Option<Square>,
    rule50: u8,
    hash: u64,
}

/// A chess position, mutated in place by [`Position::do_move`] and restored
/// by [`Position::undo_move`].
///
/// Piece placement is stored redundantly as per-kind and per-color bitboards
/// plus a mailbox array for square lookups; the two are kept in sync by the
/// `place`/`remove` helpers.
#[derive(Clone, Debug)]
pub struct Position {
    kinds: [Bitboard; PieceKind::COUNT],
    colors: [Bitboard; Color::COUNT],
    mailbox: [Option<Piece>; Square::COUNT],
    side: Color,
    castling: CastlingRights,
    ep_square: Option<Square>,
    rule50: u8,
    ply: u16,
    hash: u64,
    unmake_stack: Vec<Unmake>,
}

impl Position {
    /// Parses a position from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut fields = fen.split_whitespace();

        let placement = fields.next().ok_or_else(|| anyhow!("empty FEN string"))?;
        let side = fields
            .next()
            .ok_or_else(|| anyhow!("FEN {fen:?} is missing a side to move"))?;
        let castling = fields
            .next()
            .ok_or_else(|| anyhow!("FEN {fen:?} is missing castling rights"))?;
        let ep = fields
            .next()
            .ok_or_else(|| anyhow!("FEN {fen:?} is missing an en passant square"))?;
        let rule50 = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let mut position = Self {
            kinds: [Bitboard::EMPTY; PieceKind::COUNT],
            colors: [Bitboard::EMPTY; Color::COUNT],
            mailbox: [None; Square::COUNT],
            side: Color::White,
            castling: CastlingRights::NONE,
            ep_square: None,
            rule50: 0,
            ply: 0,
            hash: 0,
            unmake_stack: Vec::with_capacity(256),
        };

        let mut rank = 7u8;
        let mut file = 0u8;
        for c in placement.chars() {
            match c {
                '/' => {
                    if file != 8 || rank == 0 {
                        bail!("malformed piece placement in FEN {fen:?}");
                    }
                    rank -= 1;
                    file = 0;
                }
                '1'..='8' => file += c as u8 - b'0',
                _ => {
                    if file >= 8 {
                        bail!("malformed piece placement in FEN {fen:?}");
                    }
                    position.place(Piece::from_fen_char(c)?, Square::new(file, rank));
                    file += 1;
                }
            }
        }

        position.side = match side {
            "w" => Color::White,
            "b" => Color::Black,
            _ => bail!("invalid side to move {side:?}"),
        };

        position.castling = CastlingRights::from_fen(castling)?;

        position.ep_square = match ep {
            "-" => None,
            _ => Some(Square::from_uci(ep)?),
        };

        position.rule50 = rule50
            .parse()
            .with_context(|| format!("invalid halfmove clock {rule50:?}"))?;

        let fullmove: u16 = fullmove
            .parse()
            .with_context(|| format!("invalid fullmove number {fullmove:?}"))?;
        position.ply = fullmove.saturating_sub(1) * 2 + !position.side.is_white() as u16;

        if position.pieces(Color::White, PieceKind::King).population() != 1
            || position.pieces(Color::Black, PieceKind::King).population() != 1
        {
            bail!("FEN {fen:?} must have exactly one king per side");
        }

        position.hash = position.compute_hash();

        Ok(position)
    }

    /// Produces the FEN string for this position.
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();

        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.piece_at(Square::new(file, rank)) {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        fen.push(piece.char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push((b'0' + empty) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        let ep = self
            .ep_square
            .map_or(String::from("-"), |sq| sq.to_string());

        format!(
            "{fen} {} {} {ep} {} {}",
            self.side,
            self.castling,
            self.rule50,
            self.ply / 2 + 1,
        )
    }

    /// The side whose turn it is to move.
    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side
    }

    #[inline(always)]
    pub const fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    #[inline(always)]
    pub const fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    /// Halfmove clock for the 50-move rule, in plies.
    #[inline(always)]
    pub const fn rule50(&self) -> u8 {
        self.rule50
    }

    /// Number of plies played since the start of the game.
    #[inline(always)]
    pub const fn ply(&self) -> u16 {
        self.ply
    }

    /// The incrementally-maintained Zobrist hash of this position.
    #[inline(always)]
    pub const fn hash(&self) -> u64 {
        self.hash
    }

    /// The piece on `square`, if any.
    #[inline(always)]
    pub const fn piece_at(&self, square: Square) -> Option<Piece> {
        self.mailbox[square.index()]
    }

    /// All occupied squares.
    #[inline(always)]
    pub fn occupied(&self) -> Bitboard {
        self.colors[Color::White.index()] | self.colors[Color::Black.index()]
    }

    /// All squares occupied by `color`.
    #[inline(always)]
    pub fn color_occupancy(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    /// All squares holding a `color`-colored piece of the given kind.
    #[inline(always)]
    pub fn pieces(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.kinds[kind.index()] & self.colors[color.index()]
    }

    /// The square of `color`'s king.
    #[inline(always)]
    pub fn king_square(&self, color: Color) -> Square {
        // Every position holds exactly one king per side; enforced at FEN parse.
        self.pieces(color, PieceKind::King).first().unwrap()
    }

    /// Whether `square` is attacked by any piece of color `by`.
    pub fn is_square_attacked(&self, square: Square, by: Color) -> bool {
        let occupied = self.occupied();

        (PAWN_ATTACKS[by.opponent().index()][square.index()] & self.pieces(by, PieceKind::Pawn))
            .is_nonempty()
            || (KNIGHT_ATTACKS[square.index()] & self.pieces(by, PieceKind::Knight)).is_nonempty()
            || (KING_ATTACKS[square.index()] & self.pieces(by, PieceKind::King)).is_nonempty()
            || (bishop_attacks(square, occupied)
                & (self.pieces(by, PieceKind::Bishop) | self.pieces(by, PieceKind::Queen)))
            .is_nonempty()
            || (rook_attacks(square, occupied)
                & (self.pieces(by, PieceKind::Rook) | self.pieces(by, PieceKind::Queen)))
            .is_nonempty()
    }

    /// Whether the side to move is in check.
    #[inline(always)]
    pub fn is_current_side_in_check(&self) -> bool {
        self.is_square_attacked(self.king_square(self.side), self.side.opponent())
    }

    /// Applies a pseudo-legal move to this position.
    ///
    /// Returns `false` if the move leaves the mover's own king attacked. The
    /// caller must call [`Position::undo_move`] afterwards in either case to
    /// restore the position.
    pub fn do_move(&mut self, mv: Move) -> bool {
        let from = mv.from();
        let to = mv.to();
        let kind = mv.kind();
        let us = self.side;

        // Safe unwrap: pseudo-legal moves always start on an occupied square.
        let piece = self.piece_at(from).unwrap();

        let captured = match kind {
            MoveKind::EnPassant => {
                let victim_square = match us {
                    Color::White => Square::from_index(to.index() as u8 - 8),
                    Color::Black => Square::from_index(to.index() as u8 + 8),
                };
                Some((victim_square, Piece::new(us.opponent(), PieceKind::Pawn)))
            }
            _ if mv.is_capture() => Some((to, self.piece_at(to).unwrap())),
            _ => None,
        };

        self.unmake_stack.push(Unmake {
            captured,
            castling: self.castling,
            ep_square: self.ep_square,
            rule50: self.rule50,
            hash: self.hash,
        });

        if piece.kind() == PieceKind::Pawn || captured.is_some() {
            self.rule50 = 0;
        } else {
            self.rule50 += 1;
        }

        if let Some(ep) = self.ep_square.take() {
            self.hash ^= zobrist::ep_key(ep.file());
        }

        if let Some((square, victim)) = captured {
            self.remove(victim, square);
            self.hash ^= zobrist::piece_key(victim, square);
        }

        self.remove(piece, from);
        self.hash ^= zobrist::piece_key(piece, from);

        let placed = match mv.promotion_kind() {
            Some(kind) => Piece::new(us, kind),
            None => piece,
        };
        self.place(placed, to);
        self.hash ^= zobrist::piece_key(placed, to);

        match kind {
            MoveKind::ShortCastle => self.move_castling_rook(us, Square::H1, Square::F1),
            MoveKind::LongCastle => self.move_castling_rook(us, Square::A1, Square::D1),
            MoveKind::DoublePawnPush => {
                let ep = Square::from_index((from.index() + to.index()) as u8 / 2);
                self.ep_square = Some(ep);
                self.hash ^= zobrist::ep_key(ep.file());
            }
            _ => {}
        }

        self.hash ^= zobrist::castling_key(self.castling);
        self.castling =
            CastlingRights(self.castling.0 & CASTLING_MASKS[from.index()] & CASTLING_MASKS[to.index()]);
        self.hash ^= zobrist::castling_key(self.castling);

        self.hash ^= zobrist::side_key();
        self.side = us.opponent();
        self.ply += 1;

        !self.is_square_attacked(self.king_square(us), self.side)
    }

    /// Takes back the most recent move made with [`Position::do_move`].
    pub fn undo_move(&mut self, mv: Move) {
        // Safe unwrap: undo_move is only ever paired with a preceding do_move.
        let unmake = self.unmake_stack.pop().unwrap();

        self.side = self.side.opponent();
        self.ply -= 1;

        let us = self.side;
        let from = mv.from();
        let to = mv.to();

        let placed = self.piece_at(to).unwrap();
        self.remove(placed, to);

        let original = match mv.promotion_kind() {
            Some(_) => Piece::new(us, PieceKind::Pawn),
            None => placed,
        };
        self.place(original, from);

        match mv.kind() {
            MoveKind::ShortCastle => self.move_castling_rook(us, Square::F1, Square::H1),
            MoveKind::LongCastle => self.move_castling_rook(us, Square::D1, Square::A1),
            _ => {}
        }

        if let Some((square, victim)) = unmake.captured {
            self.place(victim, square);
        }

        self.castling = unmake.castling;
        self.ep_square = unmake.ep_square;
        self.rule50 = unmake.rule50;
        self.hash = unmake.hash;
    }

    /// Moves `color`'s rook between the given white-relative squares,
    /// updating the hash. Used for both making and unmaking castling moves.
    fn move_castling_rook(&mut self, color: Color, from: Square, to: Square) {
        let (from, to) = match color {
            Color::White => (from, to),
            Color::Black => (
                Square::from_index(from.index() as u8 + 56),
                Square::from_index(to.index() as u8 + 56),
            ),
        };

        let rook = Piece::new(color, PieceKind::Rook);
        self.remove(rook, from);
        self.place(rook, to);
        self.hash ^= zobrist::piece_key(rook, from) ^ zobrist::piece_key(rook, to);
    }

    fn place(&mut self, piece: Piece, square: Square) {
        self.kinds[piece.kind().index()].set(square);
        self.colors[piece.color().index()].set(square);
        self.mailbox[square.index()] = Some(piece);
    }

    fn remove(&mut self, piece: Piece, square: Square) {
        self.kinds[piece.kind().index()].clear(square);
        self.colors[piece.color().index()].clear(square);
        self.mailbox[square.index()] = None;
    }

    /// Computes this position's Zobrist hash from scratch.
    ///
    /// Used when loading a FEN; everywhere else the hash is maintained
    /// incrementally and must stay equal to this value.
    fn compute_hash(&self) -> u64 {
        let mut hash = 0;

        for square in Square::iter() {
            if let Some(piece) = self.piece_at(square) {
                hash ^= zobrist::piece_key(piece, square);
            }
        }

        if let Some(ep) = self.ep_square {
            hash ^= zobrist::ep_key(ep.file());
        }

        hash ^= zobrist::castling_key(self.castling);

        if !self.side.is_white() {
            hash ^= zobrist::side_key();
        }

        hash
    }
}

impl Default for Position {
    fn default() -> Self {
        // Safe unwrap: the starting position FEN is a known-good constant.
        Self::from_fen(FEN_STARTPOS).unwrap()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} |", rank + 1)?;
            for file in 0..8 {
                let c = self.piece_at(Square::new(file, rank)).map_or('.', Piece::char);
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "   ----------------")?;
        writeln!(f, "    a b c d e f g h")?;
        write!(f, "\n{}", self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(position: &mut Position, moves: &[&str]) {
        for s in moves {
            let mv = Move::from_uci(position, s).unwrap();
            assert!(position.do_move(mv), "move {s} should be legal");
        }
    }

    #[test]
    fn test_startpos_round_trip() {
        let position = Position::default();
        assert_eq!(position.to_fen(), FEN_STARTPOS);
        assert_eq!(position.side_to_move(), Color::White);
        assert_eq!(position.rule50(), 0);
        assert_eq!(position.ply(), 0);
    }

    #[test]
    fn test_do_undo_restores_position() {
        let mut position = Position::default();
        let original_fen = position.to_fen();
        let original_hash = position.hash();

        let mv = Move::from_uci(&position, "e2e4").unwrap();
        assert!(position.do_move(mv));
        assert_ne!(position.hash(), original_hash);

        position.undo_move(mv);
        assert_eq!(position.to_fen(), original_fen);
        assert_eq!(position.hash(), original_hash);
    }

    #[test]
    fn test_incremental_hash_matches_recomputed() {
        let mut position = Position::default();

        // Touches double pushes, captures, en passant, castling, and a check.
        play(
            &mut position,
            &["e2e4", "a7a6", "e4e5", "d7d5", "e5d6", "g8f6", "g1f3", "e7e6", "f1b5", "c8d7", "e1g1"],
        );

        assert_eq!(position.hash(), position.compute_hash());
    }

    #[test]
    fn test_promotion_do_undo() {
        let mut position = Position::from_fen("3q1n2/4P3/8/8/8/8/k7/7K w - - 0 1").unwrap();
        let original_fen = position.to_fen();

        let mv = Move::from_uci(&position, "e7d8q").unwrap();
        assert!(position.do_move(mv));
        assert_eq!(
            position.piece_at(Square::D8),
            Some(Piece::new(Color::White, PieceKind::Queen))
        );

        position.undo_move(mv);
        assert_eq!(position.to_fen(), original_fen);
    }

    #[test]
    fn test_illegal_move_is_reported() {
        // The knight on e7 is pinned against the king by the rook on e1.
        let mut position = Position::from_fen("4k3/4n3/8/8/8/8/8/4RK2 b - - 0 1").unwrap();

        let mv = Move::from_uci(&position, "e7d5").unwrap();
        assert!(!position.do_move(mv));
        position.undo_move(mv);

        assert_eq!(position.to_fen(), "4k3/4n3/8/8/8/8/8/4RK2 b - - 0 1");
    }

    #[test]
    fn test_check_detection() {
        let position = Position::from_fen("4k3/4R3/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert!(position.is_current_side_in_check());

        let position = Position::from_fen("4k3/3R4/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert!(!position.is_current_side_in_check());
    }

    #[test]
    fn test_castling_rights_update() {
        let mut position = Position::default();
        play(&mut position, &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6", "e1g1"]);

        assert!(!position.castling_rights().kingside(Color::White));
        assert!(!position.castling_rights().queenside(Color::White));
        assert!(position.castling_rights().kingside(Color::Black));
        assert_eq!(
            position.piece_at(Square::F1),
            Some(Piece::new(Color::White, PieceKind::Rook))
        );
        assert_eq!(
            position.piece_at(Square::G1),
            Some(Piece::new(Color::White, PieceKind::King))
        );
    }
}
