use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chess_arena::game_state::chess_rules::STARTING_POSITION_FEN;
use chess_arena::game_state::position::Position;
use chess_arena::move_generation::legal_move_generator::legal_moves;
use chess_arena::move_generation::legal_move_validate::validate_move;
use chess_arena::move_generation::perft::perft;
use chess_arena::move_generation::termination::evaluate_termination;

#[derive(Clone, Copy)]
struct BenchCase {
    name: &'static str,
    fen: &'static str,
    expected_nodes: &'static [u64],
}

const CASES: &[BenchCase] = &[
    BenchCase {
        name: "startpos",
        fen: STARTING_POSITION_FEN,
        expected_nodes: &[20, 400, 8902],
    },
    BenchCase {
        name: "kiwipete",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        expected_nodes: &[48, 2039],
    },
    BenchCase {
        name: "rook_endgame",
        fen: "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        expected_nodes: &[14, 191, 2812],
    },
];

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(4));
    group.sample_size(20);

    for case in CASES {
        let position = Position::from_fen(case.fen).expect("benchmark record should parse");

        for (depth_idx, expected_nodes) in case.expected_nodes.iter().enumerate() {
            let depth = (depth_idx + 1) as u8;

            // Correctness guard before benchmarking.
            let warmup = perft(&position, depth);
            assert_eq!(
                warmup.nodes as u64, *expected_nodes,
                "node mismatch in warmup for {} depth {}",
                case.name, depth
            );

            group.throughput(Throughput::Elements(*expected_nodes));
            group.bench_with_input(
                BenchmarkId::from_parameter(format!("{}_d{}", case.name, depth)),
                expected_nodes,
                |b, expected| {
                    b.iter(|| {
                        let count = perft(black_box(&position), black_box(depth));
                        assert_eq!(count.nodes as u64, *expected);
                        black_box(count.nodes)
                    });
                },
            );
        }
    }

    group.finish();
}

/// Cost of judging one submitted move plus the end-of-game check that follows
/// it in the match flow.
fn bench_single_move_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_path");

    for case in CASES {
        let position = Position::from_fen(case.fen).expect("benchmark record should parse");
        let moves = legal_moves(&position);

        group.throughput(Throughput::Elements(moves.len() as u64));
        group.bench_function(BenchmarkId::new("validate_all", case.name), |b| {
            b.iter(|| {
                for mv in &moves {
                    black_box(validate_move(black_box(&position), *mv).is_ok());
                }
            });
        });
        group.bench_function(BenchmarkId::new("termination", case.name), |b| {
            b.iter(|| black_box(evaluate_termination(black_box(&position))));
        });
    }

    group.finish();
}

criterion_group!(legality_benches, bench_perft, bench_single_move_path);
criterion_main!(legality_benches);
