/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::io;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{channel, Receiver, Sender},
    Arc, Mutex,
};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use threadpool::ThreadPool;
use uci_parser::{UciCommand, UciParseError, UciResponse, UciSearchOptions};

use crate::{
    generate_pseudo_legal_moves, perft, Color, Evaluator, Material, Searcher, MAX_DEPTH,
};

/// The engine itself: a UCI state machine wrapped around a [`Searcher`].
///
/// Two worker threads run beside the command loop: one reads `stdin`, and
/// one is spawned per `go` to run the search, so `stop` and `isready` stay
/// responsive while thinking.
pub struct Engine {
    /// The searcher, shared with whichever worker is currently searching.
    searcher: Arc<Mutex<Searcher>>,

    /// Raising this flag asks a running search to wind down.
    end_search: Arc<AtomicBool>,

    /// Whether a search is currently queued or running.
    ///
    /// Set synchronously by the command loop before a search job is spawned
    /// and cleared by the worker once `bestmove` has been sent, so a second
    /// `go` can never sneak past while the first job is still queued.
    is_searching: Arc<AtomicBool>,

    sender: Sender<EngineCommand>,
    receiver: Receiver<EngineCommand>,
    pool: ThreadPool,

    /// Whether to print extra diagnostics, toggled by the UCI `debug` command.
    debug: bool,
}

/// A command for the engine's event loop.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// A command defined by the UCI protocol.
    Uci(UciCommand),

    /// A console convenience command for driving the engine by hand.
    Console(ConsoleCommand),
}

/// Commands accepted on the console besides the UCI protocol.
#[derive(Debug, Clone, Parser)]
#[command(multicall = true, rename_all = "lower")]
pub enum ConsoleCommand {
    /// Print a visual representation of the current position.
    #[command(alias = "d")]
    Display,

    /// Print the static evaluation of the current position.
    Eval,

    /// Print the FEN string of the current position.
    Fen,

    /// Count the positions reachable from the current position.
    Perft {
        #[arg(default_value = "1")]
        depth: usize,
    },

    /// Quit the engine.
    Exit,
}

impl Engine {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        let searcher = Searcher::new();
        let end_search = searcher.stop_handle();

        Self {
            searcher: Arc::new(Mutex::new(searcher)),
            end_search,
            is_searching: Arc::default(),
            sender,
            receiver,
            pool: ThreadPool::with_name(
                format!("{} worker threads", env!("CARGO_PKG_NAME")),
                2,
            ),
            debug: false,
        }
    }

    /// The engine's name and version, as reported to the GUI.
    #[inline(always)]
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// Queues a command for the engine's event loop.
    #[inline(always)]
    pub fn send_command(&self, command: EngineCommand) {
        // Safe expect: the receiver lives as long as the engine itself.
        self.sender
            .send(command)
            .expect("Failed to send a command to the engine");
    }

    /// Runs the event loop until `quit`/`exit` or the end of input.
    pub fn run(&mut self) -> Result<()> {
        let sender = self.sender.clone();
        self.pool.execute(move || {
            if let Err(err) = input_handler(sender) {
                eprintln!("Input handler stopping after fatal error: {err:#}");
            }
        });

        while let Ok(cmd) = self.receiver.recv() {
            match cmd {
                EngineCommand::Uci(UciCommand::Quit)
                | EngineCommand::Console(ConsoleCommand::Exit) => break,

                EngineCommand::Uci(cmd) => {
                    // The UCI spec asks engines to carry on after bad input.
                    if let Err(e) = self.handle_uci_command(cmd) {
                        eprintln!("Error: {e:#}");
                    }
                }

                EngineCommand::Console(cmd) => self.handle_console_command(cmd),
            }
        }

        Ok(())
    }

    fn handle_uci_command(&mut self, uci: UciCommand) -> Result<()> {
        use UciCommand::*;
        match uci {
            Uci => {
                println!("id name {}", self.name());
                println!("{}", UciResponse::<&str>::UciOk);
            }

            Debug(status) => self.debug = status,

            IsReady => println!("{}", UciResponse::<&str>::ReadyOk),

            UciNewGame => self.searcher().reset_to_new_game(),

            Position { fen, moves } => {
                self.searcher().set_position(fen.as_deref(), &moves)?;
            }

            Go(options) => self.go(options),

            Stop => self.end_search.store(true, Ordering::Relaxed),

            _ => bail!("{} does not support UCI command {uci:?}", self.name()),
        }

        Ok(())
    }

    fn handle_console_command(&mut self, cmd: ConsoleCommand) {
        match cmd {
            ConsoleCommand::Display => println!("{}", self.searcher().position()),

            ConsoleCommand::Eval => {
                println!("{}", Material.evaluate(self.searcher().position()))
            }

            ConsoleCommand::Fen => println!("{}", self.searcher().position().to_fen()),

            ConsoleCommand::Perft { depth } => self.perft(depth),

            // Handled by the event loop before dispatching here.
            ConsoleCommand::Exit => {}
        }
    }

    /// Runs a split perft on the current position, printing per-move counts.
    fn perft(&self, depth: usize) {
        let mut position = self.searcher().position().clone();
        let start = Instant::now();
        let mut total = 0;

        if depth == 0 {
            println!("\n1 node in {:.1?}", start.elapsed());
            return;
        }

        for mv in generate_pseudo_legal_moves(&position) {
            if position.do_move(mv) {
                let nodes = perft(&mut position, depth - 1);
                total += nodes;
                println!("{mv}: {nodes}");
            }
            position.undo_move(mv);
        }

        let elapsed = start.elapsed();
        let nps = total as f64 / elapsed.as_secs_f64();
        println!("\n{total} nodes in {elapsed:.1?} ({nps:.0} nps)");
    }

    /// Starts a search with the limits given by the `go` command.
    ///
    /// The search runs on the worker pool; `bestmove` is printed from there
    /// once it returns. The command loop keeps running in the meantime.
    fn go(&mut self, options: UciSearchOptions) {
        // Claim the search slot before spawning, so no second `go` can be
        // accepted while this one is still waiting for a worker.
        if self.is_searching.swap(true, Ordering::Relaxed) {
            eprintln!("A search is already running");
            return;
        }

        if self.debug {
            println!(
                "{}",
                UciResponse::<String>::Info(Box::new(
                    uci_parser::UciInfo::new()
                        .string(format!("searching {}", self.searcher().position().to_fen()))
                ))
            );
        }

        let searcher = Arc::clone(&self.searcher);
        let is_searching = Arc::clone(&self.is_searching);

        self.pool.execute(move || {
            // Safe expect: a panicking search thread has already lost the game.
            let mut searcher = searcher.lock().expect("search thread panicked");

            let (time, inc) = match searcher.position().side_to_move() {
                Color::White => (options.wtime, options.winc),
                Color::Black => (options.btime, options.binc),
            };

            let remaining = if options.infinite { None } else { time };
            let move_time = if options.infinite { None } else { options.movetime };
            let increment = inc.unwrap_or(Duration::ZERO);
            let moves_to_go = options.movestogo.map_or(0, |mtg| mtg as u32);
            let depth = options
                .depth
                .map_or(MAX_DEPTH, |d| (d as u64).min(MAX_DEPTH as u64) as u8);
            let nodes = options.nodes.map_or(u64::MAX, |n| n as u64);

            searcher.initialize_time_manager(
                remaining, increment, move_time, moves_to_go, depth, nodes,
            );
            let bestmove = searcher.start_search(&Material);

            let response = UciResponse::BestMove {
                bestmove: (!bestmove.is_null()).then(|| bestmove.to_string()),
                ponder: None,
            };
            println!("{response}");

            // The search has concluded; free the slot for the next `go`.
            is_searching.store(false, Ordering::Relaxed);
        });
    }

    /// Locks the searcher, blocking while a search is running.
    fn searcher(&self) -> std::sync::MutexGuard<'_, Searcher> {
        // Safe expect: a thread holding the searcher never panics with it.
        self.searcher.lock().expect("searcher mutex poisoned")
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Loops on `stdin`, forwarding parsed commands to the event loop.
///
/// Input is tried as a UCI command first, then as a console command.
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(2048);

    loop {
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read line when parsing UCI commands")?;

        // Ctrl+D or closed stdin.
        if 0 == bytes {
            sender
                .send(EngineCommand::Console(ConsoleCommand::Exit))
                .context("Failed to send 'exit' after receiving empty input")?;
            bail!("Engine received input of 0 bytes and is quitting");
        }

        let buf = buffer.trim();
        if buf.is_empty() {
            continue;
        }

        match UciCommand::new(buf) {
            Ok(cmd) => sender
                .send(EngineCommand::Uci(cmd))
                .context("Failed to send UCI command to engine")?,

            // Not a UCI command; try the console commands.
            Err(UciParseError::UnrecognizedCommand { cmd: _ }) => {
                match ConsoleCommand::try_parse_from(buf.split_ascii_whitespace()) {
                    Ok(cmd) => sender
                        .send(EngineCommand::Console(cmd))
                        .context("Failed to send console command to engine")?,

                    Err(err) => eprintln!("{err}"),
                }
            }

            // It was a UCI command with bad arguments; print usage and carry on.
            Err(uci_err) => eprintln!("{uci_err:#}"),
        }
    }
}
