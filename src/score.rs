/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use uci_parser::UciScore;

/// A numerical evaluation of a position, in units of
/// ["centipawns"](https://www.chessprogramming.org/Score), relative to the
/// side to move.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Score(i16);

impl Score {
    /// Score of a drawn position.
    pub const DRAW: Self = Self(0);

    /// Score of delivering checkmate at the root of the search.
    ///
    /// A mate found `n` plies into the search scores `MATE - n`, so nearer
    /// mates are preferred.
    pub const MATE: Self = Self(32_000);

    /// Scores whose magnitude exceeds this bound are mate-in-N scores rather
    /// than centipawn evaluations.
    pub const MATE_THRESHOLD: Self = Self(31_000);

    #[inline(always)]
    pub const fn new(centipawns: i16) -> Self {
        Self(centipawns)
    }

    /// The score of *being* checkmated `ply` plies into the search.
    #[inline(always)]
    pub const fn mated_in(ply: u8) -> Self {
        Self(-(Self::MATE.0 - ply as i16))
    }

    #[inline(always)]
    pub const fn inner(self) -> i16 {
        self.0
    }

    #[inline(always)]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Whether this score represents a forced mate for either side.
    #[inline(always)]
    pub const fn is_mate(self) -> bool {
        self.0.abs() > Self::MATE_THRESHOLD.0
    }

    /// Converts this [`Score`] into a [`UciScore`] for the `info score`
    /// message, rendering mates as full moves with the mating side's sign.
    pub fn into_uci(self) -> UciScore {
        if self.is_mate() {
            let half_moves = (Self::MATE.0 - self.0.abs()) as i32;
            let full_moves = half_moves / 2 + half_moves % 2;
            UciScore::mate(full_moves * self.0.signum() as i32)
        } else {
            UciScore::cp(self.0 as i32)
        }
    }
}

macro_rules! impl_binary_op {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$fn(rhs.0))
            }
        }

        impl std::ops::$trait<i16> for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: i16) -> Self::Output {
                Self(self.0.$fn(rhs))
            }
        }
    };
}

macro_rules! impl_binary_op_assign {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: Self) {
                self.0.$fn(rhs.0);
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);

impl_binary_op_assign!(AddAssign, add_assign);
impl_binary_op_assign!(SubAssign, sub_assign);

impl std::ops::Neg for Score {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_mate() {
            write!(f, "{} (mate in {} plies)", self.0, Self::MATE.0 - self.0.abs())
        } else {
            write!(f, "{} cp", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mate_scores() {
        assert!(Score::MATE.is_mate());
        assert!(Score::mated_in(4).is_mate());
        assert!(!Score::DRAW.is_mate());
        assert!(!Score::new(500).is_mate());

        // A mate two plies away is worth less than one a single ply away.
        assert!(-Score::mated_in(1) > -Score::mated_in(2));
    }

    #[test]
    fn test_negation_symmetry() {
        assert_eq!(-Score::mated_in(3), Score::MATE - 3);
        assert_eq!(-(-Score::new(123)), Score::new(123));
    }
}
