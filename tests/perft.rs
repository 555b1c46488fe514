/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Move generation correctness, verified against the standard
//! [perft results](https://www.chessprogramming.org/Perft_Results).

use perch::{perft, Position, FEN_STARTPOS};

fn run_perft(fen: &str, expected: &[u64]) {
    let mut position = Position::from_fen(fen).unwrap();

    for (i, &nodes) in expected.iter().enumerate() {
        let depth = i + 1;
        assert_eq!(
            perft(&mut position, depth),
            nodes,
            "perft({depth}) mismatch on {fen:?}"
        );
    }
}

#[test]
fn test_perft_startpos() {
    run_perft(FEN_STARTPOS, &[20, 400, 8_902, 197_281]);
}

#[test]
fn test_perft_kiwipete() {
    run_perft(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        &[48, 2_039, 97_862],
    );
}

#[test]
fn test_perft_position_3() {
    run_perft("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", &[14, 191, 2_812, 43_238]);
}

#[test]
fn test_perft_position_4() {
    run_perft(
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        &[6, 264, 9_467],
    );
}

#[test]
fn test_perft_position_4_mirrored() {
    run_perft(
        "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
        &[6, 264, 9_467],
    );
}

#[test]
fn test_perft_position_5() {
    run_perft(
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 0 1",
        &[44, 1_486, 62_379],
    );
}
