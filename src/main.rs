/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use clap::Parser;
use perch::{ConsoleCommand, Engine, EngineCommand};

fn main() {
    let mut engine = Engine::new();
    println!("{}", engine.name());

    // If a command was provided on the command line, run it and exit.
    if let Ok(cmd) = ConsoleCommand::try_parse_from(std::env::args_os().skip(1)) {
        engine.send_command(EngineCommand::Console(cmd));
        engine.send_command(EngineCommand::Console(ConsoleCommand::Exit));
    }

    if let Err(e) = engine.run() {
        eprintln!("{} encountered a fatal error: {e:#}", engine.name());
    }
}
