/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Quiet-move ordering heuristics: killers, counter moves, and history.
//!
//! The tables store only quiet moves; the searcher checks that the
//! destination square is empty before recording anything here.

use crate::{Color, Move, Square, ESSENTIAL_MOVE_OFFSET, MAX_DEPTH};

/// History counters saturate here; hitting the bound halves the whole table.
///
/// Kept below [`ESSENTIAL_MOVE_OFFSET`] so history scores can never outrank
/// captures or killers during move ordering.
const HISTORY_SCORE_CEILING: i32 = ESSENTIAL_MOVE_OFFSET as i32 - 30;

/// Two quiet moves per ply that most recently caused a beta cutoff there.
#[derive(Debug)]
pub struct KillerTable([[Move; 2]; MAX_DEPTH as usize + 1]);

impl KillerTable {
    /// Both killer slots for the given ply.
    #[inline(always)]
    pub fn slots(&self, ply: u8) -> [Move; 2] {
        self.0[ply as usize]
    }

    /// Promotes `mv` into the first slot, demoting the previous occupant.
    ///
    /// A move already in the first slot is left alone, so the two slots
    /// always hold distinct moves.
    #[inline(always)]
    pub fn insert(&mut self, ply: u8, mv: Move) {
        let slots = &mut self.0[ply as usize];
        if mv != slots[0] {
            slots[1] = slots[0];
            slots[0] = mv;
        }
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self([[Move::NULL; 2]; MAX_DEPTH as usize + 1])
    }
}

/// The quiet move that most recently refuted each (side, previous move) pair.
#[derive(Debug)]
pub struct CounterMoveTable(Box<[[[Move; Square::COUNT]; Square::COUNT]; Color::COUNT]>);

impl CounterMoveTable {
    /// The stored counter to `previous`, or [`Move::NULL`].
    #[inline(always)]
    pub fn get(&self, side: Color, previous: Move) -> Move {
        self.0[side.index()][previous.from().index()][previous.to().index()]
    }

    #[inline(always)]
    pub fn set(&mut self, side: Color, previous: Move, counter: Move) {
        self.0[side.index()][previous.from().index()][previous.to().index()] = counter;
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl Default for CounterMoveTable {
    fn default() -> Self {
        Self(Box::new(
            [[[Move::NULL; Square::COUNT]; Square::COUNT]; Color::COUNT],
        ))
    }
}

/// Running per-(side, from, to) counters favoring quiet moves that keep
/// raising alpha or cutting off.
#[derive(Debug)]
pub struct HistoryTable(Box<[[[i32; Square::COUNT]; Square::COUNT]; Color::COUNT]>);

impl HistoryTable {
    #[inline(always)]
    pub fn get(&self, side: Color, from: Square, to: Square) -> i32 {
        self.0[side.index()][from.index()][to.index()]
    }

    /// Rewards a successful quiet move with a `depth * depth` bonus.
    ///
    /// If the counter reaches the saturation bound, every entry is halved so
    /// that the relative ordering of quiet moves ages rather than overflows.
    pub fn increase(&mut self, side: Color, from: Square, to: Square, depth: i8) {
        let cell = &mut self.0[side.index()][from.index()][to.index()];
        *cell += depth as i32 * depth as i32;

        if *cell >= HISTORY_SCORE_CEILING {
            self.halve_all();
        }
    }

    /// Decays a quiet move that failed to improve the search, stopping at 0.
    #[inline(always)]
    pub fn decrease(&mut self, side: Color, from: Square, to: Square) {
        let cell = &mut self.0[side.index()][from.index()][to.index()];
        if *cell > 0 {
            *cell -= 1;
        }
    }

    /// Halves every counter in the table, for both sides.
    pub fn halve_all(&mut self) {
        for side in self.0.iter_mut() {
            for from in side.iter_mut() {
                for cell in from.iter_mut() {
                    *cell /= 2;
                }
            }
        }
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self(Box::new(
            [[[0; Square::COUNT]; Square::COUNT]; Color::COUNT],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MoveKind;

    fn quiet(from: Square, to: Square) -> Move {
        Move::new(from, to, MoveKind::Quiet)
    }

    #[test]
    fn test_killer_slots_stay_distinct() {
        let mut killers = KillerTable::default();
        let first = quiet(Square::E1, Square::E8);
        let second = quiet(Square::A1, Square::A8);

        killers.insert(3, first);
        assert_eq!(killers.slots(3), [first, Move::NULL]);

        // Re-inserting the same move must not duplicate it into both slots.
        killers.insert(3, first);
        assert_eq!(killers.slots(3), [first, Move::NULL]);

        killers.insert(3, second);
        assert_eq!(killers.slots(3), [second, first]);

        killers.insert(3, first);
        assert_eq!(killers.slots(3), [first, second]);

        // Other plies are unaffected.
        assert_eq!(killers.slots(4), [Move::NULL, Move::NULL]);
    }

    #[test]
    fn test_counter_moves() {
        let mut counters = CounterMoveTable::default();
        let previous = quiet(Square::E1, Square::E8);
        let counter = quiet(Square::A1, Square::A8);

        assert!(counters.get(Color::White, previous).is_null());

        counters.set(Color::White, previous, counter);
        assert_eq!(counters.get(Color::White, previous), counter);
        assert!(counters.get(Color::Black, previous).is_null());
    }

    #[test]
    fn test_history_saturation_halves_table() {
        let mut history = HistoryTable::default();
        let (from, to) = (Square::E1, Square::E8);
        let (other_from, other_to) = (Square::A1, Square::A8);

        history.increase(Color::White, other_from, other_to, 10);
        let other_before = history.get(Color::White, other_from, other_to);

        // Keep pumping the same cell until a halving triggers.
        let mut previous = 0;
        loop {
            history.increase(Color::White, from, to, 10);
            let current = history.get(Color::White, from, to);
            if current < previous {
                break;
            }
            previous = current;
        }

        assert!(history.get(Color::White, from, to) < HISTORY_SCORE_CEILING);
        assert_eq!(
            history.get(Color::White, other_from, other_to),
            other_before / 2
        );
    }

    #[test]
    fn test_history_decrease_clamps_at_zero() {
        let mut history = HistoryTable::default();
        history.decrease(Color::White, Square::E1, Square::E8);
        assert_eq!(history.get(Color::White, Square::E1, Square::E8), 0);
    }
}
