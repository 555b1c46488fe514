/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use crate::MAX_DEPTH;

/// Wall-clock margin held back from the clock to cover I/O overhead.
const MOVE_OVERHEAD: Duration = Duration::from_millis(50);

/// Assumed number of moves left in the game when the GUI does not say.
const DEFAULT_MOVES_TO_GO: u32 = 30;

/// Computes and polices the time budget for a single search.
///
/// The budget is computed once per search from the UCI `go` parameters;
/// the searcher then polls [`TimeManager::set_move_time_is_up`] periodically,
/// which trips the shared `end_search` flag once the allocation is spent.
/// The same flag is raised by the UCI `stop` command from the engine thread,
/// so it is a relaxed atomic rather than a plain bool.
#[derive(Debug)]
pub struct TimeManager {
    remaining: Option<Duration>,
    increment: Duration,
    move_time: Option<Duration>,
    moves_to_go: u32,
    depth_limit: u8,
    node_budget: u64,
    move_allocated_time: Duration,
    search_start: Instant,
    end_search: Arc<AtomicBool>,
}

impl TimeManager {
    pub fn new() -> Self {
        Self {
            remaining: None,
            increment: Duration::ZERO,
            move_time: None,
            moves_to_go: 0,
            depth_limit: MAX_DEPTH,
            node_budget: u64::MAX,
            move_allocated_time: Duration::MAX,
            search_start: Instant::now(),
            end_search: Arc::default(),
        }
    }

    /// Records the limits for the next search.
    ///
    /// `remaining` of `None` means no clock is running (an infinite search).
    pub fn initialize(
        &mut self,
        remaining: Option<Duration>,
        increment: Duration,
        move_time: Option<Duration>,
        moves_to_go: u32,
        depth_limit: u8,
        node_budget: u64,
    ) {
        self.remaining = remaining;
        self.increment = increment;
        self.move_time = move_time;
        self.moves_to_go = moves_to_go;
        self.depth_limit = depth_limit;
        self.node_budget = node_budget;
    }

    /// Starts the clock for one move and computes its time slice.
    ///
    /// Called once at the top of every search. An explicit `movetime` is
    /// used as-is; otherwise the slice is an even share of the remaining
    /// time plus the increment, capped below the remaining time itself.
    pub fn start_move_time_allocation(&mut self, _current_ply: u16) {
        self.search_start = Instant::now();
        self.end_search.store(false, Ordering::Relaxed);

        self.move_allocated_time = if let Some(move_time) = self.move_time {
            move_time
        } else if let Some(remaining) = self.remaining {
            let slice = remaining / self.moves_to_go.max(DEFAULT_MOVES_TO_GO) + self.increment;
            slice
                .min(remaining.saturating_sub(MOVE_OVERHEAD))
                .max(Duration::from_millis(1))
        } else {
            Duration::MAX
        };
    }

    /// Replaces the current move's time slice mid-search.
    #[inline(always)]
    pub fn change_move_allocated_time(&mut self, allocation: Duration) {
        self.move_allocated_time = allocation;
    }

    #[inline(always)]
    pub fn move_allocated_time(&self) -> Duration {
        self.move_allocated_time
    }

    /// Polls the wall clock, ending the search if the slice is spent.
    #[inline(always)]
    pub fn set_move_time_is_up(&self) {
        if self.search_start.elapsed() >= self.move_allocated_time {
            self.end_search.store(true, Ordering::Relaxed);
        }
    }

    /// Whether the search has been asked to end, by time, nodes, or `stop`.
    #[inline(always)]
    pub fn end_search(&self) -> bool {
        self.end_search.load(Ordering::Relaxed)
    }

    /// Asks the search to end as soon as possible.
    #[inline(always)]
    pub fn request_stop(&self) {
        self.end_search.store(true, Ordering::Relaxed);
    }

    /// A handle to the stop flag, shared with the engine's command loop.
    #[inline(always)]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.end_search)
    }

    #[inline(always)]
    pub fn node_budget(&self) -> u64 {
        self.node_budget
    }

    #[inline(always)]
    pub fn depth_limit(&self) -> u8 {
        self.depth_limit
    }
}

impl Default for TimeManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_move_time_wins() {
        let mut manager = TimeManager::new();
        manager.initialize(
            Some(Duration::from_secs(60)),
            Duration::from_secs(1),
            Some(Duration::from_millis(750)),
            0,
            MAX_DEPTH,
            u64::MAX,
        );
        manager.start_move_time_allocation(0);

        assert_eq!(manager.move_allocated_time(), Duration::from_millis(750));
    }

    #[test]
    fn test_allocation_is_a_share_of_remaining_time() {
        let mut manager = TimeManager::new();
        manager.initialize(
            Some(Duration::from_secs(60)),
            Duration::from_secs(1),
            None,
            0,
            MAX_DEPTH,
            u64::MAX,
        );
        manager.start_move_time_allocation(0);

        // 60s / 30 + 1s increment.
        assert_eq!(manager.move_allocated_time(), Duration::from_secs(3));
    }

    #[test]
    fn test_allocation_never_exceeds_remaining_time() {
        let mut manager = TimeManager::new();
        manager.initialize(
            Some(Duration::from_millis(40)),
            Duration::from_secs(10),
            None,
            0,
            MAX_DEPTH,
            u64::MAX,
        );
        manager.start_move_time_allocation(0);

        assert!(manager.move_allocated_time() <= Duration::from_millis(40));
    }

    #[test]
    fn test_stop_flag_round_trip() {
        let manager = TimeManager::new();
        assert!(!manager.end_search());

        manager.stop_handle().store(true, Ordering::Relaxed);
        assert!(manager.end_search());

        let mut manager = manager;
        manager.start_move_time_allocation(0);
        assert!(!manager.end_search(), "starting a search clears the flag");
    }
}
