/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Instant;

use anyhow::{bail, Result};
use arrayvec::ArrayVec;
use uci_parser::{UciInfo, UciResponse};

use crate::{
    generate_pseudo_legal_moves, Color, CounterMoveTable, Evaluator, HistoryTable, KillerTable,
    Move, MovePicker, Position, Score, TimeManager,
};

/// Maximum depth that can be searched, in plies.
pub const MAX_DEPTH: u8 = 100;

/// Capacity of the repetition stack: game history plus the search path.
const MAX_PLIES: usize = 1024;

/// Half-width of the aspiration window around the previous iteration's score.
const ASPIRATION_WINDOW: Score = Score::new(35);

/// An aspiration miss above this depth grants the one-off time extension.
const ASPIRATION_EXTENSION_MIN_DEPTH: u8 = 6;

/// Per-depth margin for reverse futility pruning.
const STATIC_NULL_MOVE_MARGIN: i16 = 85;

const RAZORING_MAX_DEPTH: i8 = 2;

const FUTILITY_MAX_DEPTH: i8 = 8;

/// Futility margins by depth; razoring uses three times this value.
const FUTILITY_MARGIN: [i16; 9] = [0, 100, 160, 220, 280, 340, 400, 460, 520];

const LATE_MOVE_PRUNING_MAX_DEPTH: i8 = 5;

/// Quiet moves past these per-depth counts are skipped at shallow depth.
const LATE_MOVE_PRUNING_BOUND: [usize; 6] = [0, 8, 12, 16, 20, 24];

const LMR_MIN_DEPTH: i8 = 3;
const LMR_MIN_LEGAL_MOVES: usize = 4;

/// Reductions for late quiet moves, by (depth, moves already searched).
const LMR_TABLE: [[i8; 100]; 100] = {
    let mut table = [[0i8; 100]; 100];
    let mut depth: i8 = 3;
    while depth < 100 {
        let base = if depth / 4 > 2 { depth / 4 } else { 2 };
        let mut moves: i8 = 3;
        while moves < 100 {
            table[depth as usize][moves as usize] = base + moves / 12;
            moves += 1;
        }
        depth += 1;
    }
    table
};

#[inline(always)]
fn late_move_reduction(depth: i8, legal_moves: usize) -> i8 {
    if (3..100).contains(&depth) && (3..100).contains(&legal_moves) {
        LMR_TABLE[depth as usize][legal_moves]
    } else {
        0
    }
}

/// The best sequence of moves found by a search.
#[derive(Debug, Clone, Default)]
pub struct PrincipalVariation(ArrayVec<Move, { MAX_DEPTH as usize }>);

impl PrincipalVariation {
    #[inline(always)]
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// The first move of the variation, or [`Move::NULL`] if it is empty.
    #[inline(always)]
    pub fn first_move(&self) -> Move {
        self.0.first().copied().unwrap_or(Move::NULL)
    }

    /// Replaces this variation with `head` followed by the moves of `tail`.
    #[inline(always)]
    fn set(&mut self, head: Move, tail: &Self) {
        self.clear();
        self.0.push(head);
        self.0.try_extend_from_slice(&tail.0).unwrap_or_else(|err| {
            panic!("{err}: exceeded PV capacity of {MAX_DEPTH} pushing {head}");
        });
    }

    #[inline(always)]
    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.0.iter()
    }
}

/// Owns all per-search state and drives iterative deepening.
///
/// Killer, counter-move, and history tables persist between searches of the
/// same game and are wiped by [`Searcher::reset_to_new_game`].
#[derive(Debug)]
pub struct Searcher {
    position: Position,
    time_manager: TimeManager,
    searched_nodes: u64,
    /// Zobrist hashes of the game so far plus the current search path.
    /// Grows on recursion descent, shrinks on ascent.
    hash_history: Vec<u64>,
    side_to_play: Color,
    /// Flipped at the start of every search. Reserved for generation tagging
    /// if a transposition table is added; nothing reads it yet.
    age_state: u8,
    killers: KillerTable,
    counter_moves: CounterMoveTable,
    history: HistoryTable,
}

impl Searcher {
    pub fn new() -> Self {
        let position = Position::default();
        let mut hash_history = Vec::with_capacity(MAX_PLIES);
        hash_history.push(position.hash());

        Self {
            position,
            time_manager: TimeManager::new(),
            searched_nodes: 0,
            hash_history,
            side_to_play: Color::White,
            age_state: 0,
            killers: KillerTable::default(),
            counter_moves: CounterMoveTable::default(),
            history: HistoryTable::default(),
        }
    }

    /// The position the searcher is currently playing from.
    #[inline(always)]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The side to move at the root of the current (or last) search.
    #[inline(always)]
    pub fn side_to_play(&self) -> Color {
        self.side_to_play
    }

    /// The generation bit, flipped once per search.
    #[inline(always)]
    pub fn age_state(&self) -> u8 {
        self.age_state
    }

    /// Number of nodes visited by the current (or last) search.
    #[inline(always)]
    pub fn searched_nodes(&self) -> u64 {
        self.searched_nodes
    }

    /// A handle to the flag that cancels a running search.
    #[inline(always)]
    pub fn stop_handle(&self) -> std::sync::Arc<std::sync::atomic::AtomicBool> {
        self.time_manager.stop_handle()
    }

    /// Asks a running search to stop as soon as possible.
    #[inline(always)]
    pub fn stop_search(&self) {
        self.time_manager.request_stop();
    }

    /// Forwards the UCI `go` limits to the time manager.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize_time_manager(
        &mut self,
        remaining: Option<std::time::Duration>,
        increment: std::time::Duration,
        move_time: Option<std::time::Duration>,
        moves_to_go: u32,
        depth_limit: u8,
        node_budget: u64,
    ) {
        self.time_manager
            .initialize(remaining, increment, move_time, moves_to_go, depth_limit, node_budget);
    }

    /// Sets the position to search from and rebuilds the repetition history
    /// from the moves already played.
    pub fn set_position(&mut self, fen: Option<&str>, moves: &[String]) -> Result<()> {
        self.position = match fen {
            Some(fen) => Position::from_fen(fen)?,
            None => Position::default(),
        };

        self.hash_history.clear();
        self.hash_history.push(self.position.hash());

        for s in moves {
            let mv = Move::from_uci(&self.position, s)?;
            if !self.position.do_move(mv) {
                self.position.undo_move(mv);
                bail!("move {s} leaves the king in check");
            }
            self.hash_history.push(self.position.hash());
        }

        Ok(())
    }

    /// Wipes all accumulated state and returns to the starting position.
    pub fn reset_to_new_game(&mut self) {
        self.position = Position::default();
        self.hash_history.clear();
        self.hash_history.push(self.position.hash());
        self.killers.clear();
        self.counter_moves.clear();
        self.history.clear();
        self.age_state = 0;
    }

    /// Searches the current position and returns the best move found.
    ///
    /// Runs iterative deepening with an aspiration window of
    /// [`ASPIRATION_WINDOW`] centipawns around the previous iteration's
    /// score, printing one `info` line per completed depth.
    pub fn start_search<E: Evaluator>(&mut self, evaluator: &E) -> Move {
        let mut best_move = Move::NULL;
        let mut pv = PrincipalVariation::default();
        self.age_state ^= 1;
        self.side_to_play = self.position.side_to_move();
        self.searched_nodes = 0;

        let mut search_time_ms: u128 = 0;
        let mut time_extended = false;
        let mut alpha = -Score::MATE;
        let mut beta = Score::MATE;

        // Age out stale history before the new search sharpens it again.
        self.history.halve_all();
        self.time_manager.start_move_time_allocation(self.position.ply());

        let mut depth = 1u8;
        while self.time_manager.node_budget() > 0
            && depth <= MAX_DEPTH
            && depth <= self.time_manager.depth_limit()
        {
            pv.clear();

            let start = Instant::now();
            let score = self.negamax(
                evaluator,
                depth as i8,
                0,
                alpha,
                beta,
                &mut pv,
                true,
                Move::NULL,
                Move::NULL,
                false,
            );
            let elapsed = start.elapsed();

            if self.time_manager.end_search() {
                // A cancelled iteration cannot be trusted, except as a last
                // resort when not even depth 1 completed.
                if best_move.is_null() && depth == 1 {
                    best_move = pv.first_move();
                }
                break;
            }

            if score >= beta || score <= alpha {
                // The aspiration window missed. Retry the same depth with a
                // full window, and once per search grant extra time if the
                // miss happened deep enough for the retry to be expensive.
                alpha = -Score::MATE;
                beta = Score::MATE;

                if depth > ASPIRATION_EXTENSION_MIN_DEPTH && !time_extended {
                    let extended = self.time_manager.move_allocated_time().saturating_mul(13) / 10;
                    self.time_manager.change_move_allocated_time(extended);
                    time_extended = true;
                }
                continue;
            }

            alpha = score - ASPIRATION_WINDOW;
            beta = score + ASPIRATION_WINDOW;

            search_time_ms += elapsed.as_millis();
            best_move = pv.first_move();

            let ms = search_time_ms.max(1);
            self.send_info(
                UciInfo::new()
                    .depth(depth)
                    .score(score.into_uci())
                    .nodes(self.searched_nodes)
                    .nps((1000.0 * self.searched_nodes as f32 / ms as f32).trunc())
                    .time(ms)
                    .pv(pv.iter().map(|mv| mv.to_string())),
            );

            depth += 1;
        }

        best_move
    }

    /// Fail-soft alpha-beta negamax.
    ///
    /// Returns a score relative to the side to move; mates score
    /// `±(MATE - ply)` so nearer mates dominate. `excluded_move` is skipped
    /// entirely when encountered, and `in_singular_search` is threaded down
    /// unchanged; both exist for a singular-extension probe that has no
    /// trigger yet. Null-move pruning likewise reserves its parameter
    /// without an implementation.
    #[allow(clippy::too_many_arguments)]
    fn negamax<E: Evaluator>(
        &mut self,
        evaluator: &E,
        mut depth: i8,
        ply: u8,
        mut alpha: Score,
        beta: Score,
        pv: &mut PrincipalVariation,
        _null_move_pruning_allowed: bool,
        previous_move: Move,
        excluded_move: Move,
        in_singular_search: bool,
    ) -> Score {
        self.searched_nodes += 1;

        if ply >= MAX_DEPTH {
            return evaluator.evaluate(&self.position);
        }

        if self.searched_nodes >= self.time_manager.node_budget() {
            self.time_manager.request_stop();
        }

        if self.searched_nodes & 2047 == 0 {
            self.time_manager.set_move_time_is_up();
        }

        if self.time_manager.end_search() {
            return Score::DRAW;
        }

        let on_root = ply == 0;
        let in_check = self.position.is_current_side_in_check();
        let is_pv_node = beta != alpha + 1;
        let mut continuation_pv = PrincipalVariation::default();
        let mut futility_possible = false;

        // Check extension: never stand pat while the king is attacked.
        if in_check {
            depth += 1;
        }

        if depth <= 0 {
            // This entry was already counted; the horizon exit is the same
            // node, not a new one.
            self.searched_nodes -= 1;
            return evaluator.evaluate(&self.position);
        }

        if !on_root
            && ((self.position.rule50() >= 100 && !(in_check && ply == 1)) || self.is_repetition())
        {
            return Score::DRAW;
        }

        if !in_check && !is_pv_node {
            let static_eval = evaluator.evaluate(&self.position);

            // Static null move pruning: if the position clears beta even
            // after a hefty per-depth penalty, searching it is a waste.
            if beta.abs() < Score::MATE_THRESHOLD {
                let penalized = static_eval - STATIC_NULL_MOVE_MARGIN * depth as i16;
                if penalized >= beta {
                    return penalized;
                }
            }

            // Razoring: a hopeless-looking shallow node gets one stand-pat
            // confirmation and is then abandoned at alpha.
            if depth <= RAZORING_MAX_DEPTH {
                let boosted = static_eval + FUTILITY_MARGIN[depth as usize] * 3;
                if boosted < alpha {
                    let stand_pat = evaluator.evaluate(&self.position);
                    if stand_pat < alpha {
                        return alpha;
                    }
                }
            }

            if depth <= FUTILITY_MAX_DEPTH
                && alpha < Score::MATE_THRESHOLD
                && beta < Score::MATE_THRESHOLD
            {
                futility_possible = static_eval + FUTILITY_MARGIN[depth as usize] <= alpha;
            }
        }

        let moves = generate_pseudo_legal_moves(&self.position);
        let picker = MovePicker::new(
            &self.position,
            moves,
            self.killers.slots(ply),
            self.counter_moves
                .get(self.position.side_to_move(), previous_move),
            &self.history,
        );

        let mut legal_moves = 0usize;
        let mut best_score = -Score::MATE;

        for mv in picker {
            if mv == excluded_move {
                continue;
            }

            if !self.position.do_move(mv) {
                self.position.undo_move(mv);
                continue;
            }

            legal_moves += 1;

            // Late move pruning: at shallow depth, a quiet move this far down
            // the ordering is almost never best.
            if depth <= LATE_MOVE_PRUNING_MAX_DEPTH
                && legal_moves > LATE_MOVE_PRUNING_BOUND[depth as usize]
                && !in_check
                && !is_pv_node
                && !(self.position.is_current_side_in_check() || mv.is_promotion())
            {
                self.position.undo_move(mv);
                continue;
            }

            if futility_possible
                && legal_moves > 1
                && !mv.is_capture()
                && !mv.is_promotion()
                && !self.position.is_current_side_in_check()
            {
                self.position.undo_move(mv);
                continue;
            }

            self.hash_history.push(self.position.hash());

            let score = if legal_moves == 1 {
                -self.negamax(
                    evaluator,
                    depth - 1,
                    ply + 1,
                    -beta,
                    -alpha,
                    &mut continuation_pv,
                    true,
                    mv,
                    Move::NULL,
                    in_singular_search,
                )
            } else {
                // Principal variation search: later moves get a null window,
                // and late quiet ones a reduced depth on top. Anything that
                // beats alpha is re-searched properly.
                let mut reduction = 0;
                if legal_moves >= LMR_MIN_LEGAL_MOVES
                    && depth >= LMR_MIN_DEPTH
                    && !(in_check || mv.is_capture())
                    && !is_pv_node
                {
                    reduction = late_move_reduction(depth, legal_moves);
                }

                let mut score = -self.negamax(
                    evaluator,
                    depth - 1 - reduction,
                    ply + 1,
                    -(alpha + 1),
                    -alpha,
                    &mut continuation_pv,
                    true,
                    mv,
                    Move::NULL,
                    in_singular_search,
                );

                if score > alpha && reduction > 0 {
                    score = -self.negamax(
                        evaluator,
                        depth - 1,
                        ply + 1,
                        -(alpha + 1),
                        -alpha,
                        &mut continuation_pv,
                        true,
                        mv,
                        Move::NULL,
                        in_singular_search,
                    );
                    if score > alpha {
                        score = -self.negamax(
                            evaluator,
                            depth - 1,
                            ply + 1,
                            -beta,
                            -alpha,
                            &mut continuation_pv,
                            true,
                            mv,
                            Move::NULL,
                            in_singular_search,
                        );
                    }
                } else if score > alpha && score < beta {
                    score = -self.negamax(
                        evaluator,
                        depth - 1,
                        ply + 1,
                        -beta,
                        -alpha,
                        &mut continuation_pv,
                        true,
                        mv,
                        Move::NULL,
                        in_singular_search,
                    );
                }

                score
            };

            self.position.undo_move(mv);
            self.hash_history.pop();

            if score > best_score {
                best_score = score;
            }

            if score >= beta {
                self.change_killer_slot(ply, mv);
                self.change_counter_slot(previous_move, mv);
                self.increase_history_strength(mv, depth);
                break;
            } else {
                self.decrease_history_strength(mv);
            }

            if score > alpha {
                alpha = score;
                pv.set(mv, &continuation_pv);
                self.increase_history_strength(mv, depth);
            } else {
                self.decrease_history_strength(mv);
            }

            continuation_pv.clear();
        }

        if legal_moves == 0 {
            if in_check {
                return Score::mated_in(ply);
            }
            return Score::DRAW;
        }

        best_score
    }

    /// Whether the current position already occurred on the search path or
    /// in the game history.
    ///
    /// The top of the stack is the current position itself and is skipped.
    fn is_repetition(&self) -> bool {
        let hash = self.position.hash();
        let (previous, _) = self.hash_history.split_at(self.hash_history.len() - 1);
        previous.iter().any(|&h| h == hash)
    }

    /// Records a quiet move that caused a beta cutoff as a killer.
    fn change_killer_slot(&mut self, ply: u8, mv: Move) {
        if self.position.piece_at(mv.to()).is_none() {
            self.killers.insert(ply, mv);
        }
    }

    /// Records a quiet cutoff move as the counter to the opponent's previous move.
    fn change_counter_slot(&mut self, previous_move: Move, mv: Move) {
        if self.position.piece_at(mv.to()).is_none() {
            self.counter_moves
                .set(self.position.side_to_move(), previous_move, mv);
        }
    }

    fn increase_history_strength(&mut self, mv: Move, depth: i8) {
        if self.position.piece_at(mv.to()).is_none() {
            self.history
                .increase(self.position.side_to_move(), mv.from(), mv.to(), depth);
        }
    }

    fn decrease_history_strength(&mut self, mv: Move) {
        if self.position.piece_at(mv.to()).is_none() {
            self.history
                .decrease(self.position.side_to_move(), mv.from(), mv.to());
        }
    }

    #[inline(always)]
    fn send_info(&self, info: UciInfo) {
        println!("{}", UciResponse::<String>::Info(Box::new(info)));
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, PieceKind, Square};
    use std::time::Duration;

    fn searcher_for(fen: &str) -> Searcher {
        let mut searcher = Searcher::new();
        searcher.set_position(Some(fen), &[]).unwrap();
        searcher
    }

    fn search_to_depth(searcher: &mut Searcher, depth: u8) -> Move {
        searcher.initialize_time_manager(None, Duration::ZERO, None, 0, depth, u64::MAX);
        searcher.start_search(&Material)
    }

    #[test]
    fn test_finds_mate_in_one() {
        let mut searcher = searcher_for("4k3/8/4K3/8/8/8/8/6R1 w - - 0 1");
        let best = search_to_depth(&mut searcher, 2);
        assert_eq!(best.to_string(), "g1g8");

        // The mate score is one ply from MATE and renders as "mate 1".
        let mut pv = PrincipalVariation::default();
        let score = searcher.negamax(
            &Material,
            2,
            0,
            -Score::MATE,
            Score::MATE,
            &mut pv,
            true,
            Move::NULL,
            Move::NULL,
            false,
        );
        assert_eq!(score, -Score::mated_in(1));
    }

    #[test]
    fn test_stalemate_scores_zero() {
        // Black has no legal moves and is not in check.
        let mut searcher = searcher_for("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");

        let mut pv = PrincipalVariation::default();
        let score = searcher.negamax(
            &Material,
            1,
            0,
            -Score::MATE,
            Score::MATE,
            &mut pv,
            true,
            Move::NULL,
            Move::NULL,
            false,
        );

        assert_eq!(score, Score::DRAW);
        assert!(pv.first_move().is_null());
    }

    #[test]
    fn test_repeated_position_scores_zero_off_root() {
        let mut searcher = searcher_for(crate::FEN_STARTPOS);

        // Simulate the current position having occurred before.
        searcher.hash_history.push(searcher.position.hash());

        let mut pv = PrincipalVariation::default();
        let score = searcher.negamax(
            &Material,
            3,
            1,
            -Score::MATE,
            Score::MATE,
            &mut pv,
            true,
            Move::NULL,
            Move::NULL,
            false,
        );

        assert_eq!(score, Score::DRAW);
    }

    #[test]
    fn test_obvious_capture_promotion() {
        // The pawn should take the queen and promote to a queen of its own.
        let mut searcher = searcher_for("3q1n2/4P3/8/8/8/8/k7/7K w - - 0 1");
        let best = search_to_depth(&mut searcher, 1);
        assert_eq!(best.to_string(), "e7d8q");
    }

    /// An evaluator that makes the root score flip sign at every new depth,
    /// guaranteeing an aspiration miss on each iteration after the first.
    struct Seesaw;

    impl Evaluator for Seesaw {
        fn evaluate(&self, _: &Position) -> Score {
            Score::new(200)
        }
    }

    #[test]
    fn test_aspiration_miss_extends_time_once() {
        let mut searcher = searcher_for(crate::FEN_STARTPOS);
        searcher.initialize_time_manager(
            None,
            Duration::ZERO,
            Some(Duration::from_secs(10)),
            0,
            7,
            u64::MAX,
        );

        searcher.start_search(&Seesaw);

        // Exactly one 13/10 extension of the 10s allocation.
        assert_eq!(
            searcher.time_manager.move_allocated_time(),
            Duration::from_secs(13)
        );
    }

    /// Rewards White for a knight on a3, burying the only good move deep in
    /// the ordering so it can only be found through a null-window re-search.
    struct CornerKnight;

    impl Evaluator for CornerKnight {
        fn evaluate(&self, position: &Position) -> Score {
            let mut score = 0;
            if let Some(piece) = position.piece_at(Square::new(0, 2)) {
                if piece.kind() == PieceKind::Knight && piece.color().is_white() {
                    score = 500;
                }
            }

            if position.side_to_move().is_white() {
                Score::new(score)
            } else {
                Score::new(-score)
            }
        }
    }

    #[test]
    fn test_late_ordered_best_move_is_found() {
        // From the start position b1a3 sits behind all sixteen pawn moves in
        // generation order, so it is reached late and fails high on the null
        // window before the full-window confirmation.
        let mut searcher = searcher_for(crate::FEN_STARTPOS);
        searcher.initialize_time_manager(None, Duration::ZERO, None, 0, 2, u64::MAX);
        let best = searcher.start_search(&CornerKnight);
        assert_eq!(best.to_string(), "b1a3");
    }

    #[test]
    fn test_killers_persist_between_searches() {
        let mut searcher =
            searcher_for("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        search_to_depth(&mut searcher, 4);

        let recorded: Vec<_> = (0..MAX_DEPTH)
            .flat_map(|ply| searcher.killers.slots(ply))
            .filter(|mv| !mv.is_null())
            .collect();
        assert!(!recorded.is_empty(), "a 4-ply search must produce killers");

        // Both slots of a ply never hold the same move.
        for ply in 0..MAX_DEPTH {
            let [first, second] = searcher.killers.slots(ply);
            if !first.is_null() {
                assert_ne!(first, second);
            }
        }

        // Killers survive into the next search of the same game, and are
        // wiped by a game reset.
        search_to_depth(&mut searcher, 2);
        let surviving = (0..MAX_DEPTH)
            .flat_map(|ply| searcher.killers.slots(ply))
            .any(|mv| !mv.is_null());
        assert!(surviving);

        searcher.reset_to_new_game();
        let wiped = (0..MAX_DEPTH)
            .flat_map(|ply| searcher.killers.slots(ply))
            .all(|mv| mv.is_null());
        assert!(wiped);
    }

    #[test]
    fn test_best_move_is_legal_everywhere() {
        let fens = [
            crate::FEN_STARTPOS,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "4k3/4r3/8/8/8/8/3PPP2/4K3 b - - 0 1",
        ];

        for fen in fens {
            let mut searcher = searcher_for(fen);
            let stack_depth = searcher.hash_history.len();

            let best = search_to_depth(&mut searcher, 3);
            assert!(!best.is_null(), "no move found for {fen}");

            // The repetition stack must balance across a whole search.
            assert_eq!(searcher.hash_history.len(), stack_depth, "unbalanced stack for {fen}");

            let mut position = searcher.position().clone();
            let legal = generate_pseudo_legal_moves(&position)
                .into_iter()
                .any(|mv| {
                    let ok = mv == best && position.do_move(mv);
                    if mv == best {
                        position.undo_move(mv);
                    }
                    ok
                });
            assert!(legal, "best move {best} is illegal in {fen}");

            assert!(searcher.searched_nodes() > 0);
        }
    }
}
