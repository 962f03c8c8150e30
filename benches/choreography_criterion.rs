use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use board_robot::board_state::chess_rules::STARTING_POSITION_FEN;
use board_robot::choreography::move_choreographer::MoveChoreographer;
use board_robot::choreography::move_record::{MoveRecord, MoveRequest};
use board_robot::choreography::reset_choreographer::ResetChoreographer;
use board_robot::execution::executor::{Executor, ExecutorConfig};
use board_robot::execution::transport::SimulatedTransport;
use board_robot::geometry::gantry_config::GantryConfig;

#[derive(Clone, Copy)]
struct BenchCase {
    name: &'static str,
    record: &'static str,
    expected_steps: usize,
}

const CASES: &[BenchCase] = &[
    BenchCase {
        name: "standard_open",
        record: r#"{"from":"e2","to":"e4","fen":"rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"}"#,
        expected_steps: 1,
    },
    BenchCase {
        name: "standard_routed",
        record: r#"{"from":"d1","to":"h5","fen":"rnbqkbnr/pppp1ppp/8/4p2Q/4P3/8/PPPP1PPP/RNB1KBNR b KQkq - 1 2"}"#,
        expected_steps: 6,
    },
    BenchCase {
        name: "capture",
        record: r#"{"from":"h5","to":"f7","fen":"r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4",
                    "type":"capture","piece_captured":"pawn","color_captured":"black"}"#,
        expected_steps: 9,
    },
    BenchCase {
        name: "castling",
        record: r#"{"from":"e1","to":"g1","fen":"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQ1RK1 b kq - 1 1","type":"castling"}"#,
        expected_steps: 6,
    },
    BenchCase {
        name: "promotion",
        record: r#"{"from":"e7","to":"e8","fen":"rnbqQbnr/pppp1ppp/8/8/8/8/PPPP1PPP/RNBQKBNR b KQ - 0 9",
                    "type":"promotion","piece_placed":"queen","color":"white"}"#,
        expected_steps: 2,
    },
];

fn bench_planning(c: &mut Criterion) {
    let mut group = c.benchmark_group("choreography_plan");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));
    group.sample_size(50);

    let choreographer = MoveChoreographer::default();
    for case in CASES {
        let record = MoveRecord::from_json(case.record).expect("benchmark record should decode");
        let request = MoveRequest::from_record(&record).expect("benchmark record should validate");

        // Correctness guard before benchmarking.
        let warmup = choreographer.plan(&request).expect("benchmark move should plan");
        assert_eq!(warmup.len(), case.expected_steps, "step count mismatch for {}", case.name);

        group.throughput(Throughput::Elements(case.expected_steps as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name), &request, |b, request| {
            b.iter(|| {
                let plan = choreographer
                    .plan(black_box(request))
                    .expect("benchmark move should plan");
                black_box(plan.len())
            });
        });
    }

    group.finish();
}

fn bench_reset(c: &mut Criterion) {
    let scholars_mate = "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4";
    let resetter = ResetChoreographer::default();
    let plan = resetter
        .plan(scholars_mate, STARTING_POSITION_FEN)
        .expect("reset should plan");

    let mut group = c.benchmark_group("reset");
    group.sample_size(20);
    group.throughput(Throughput::Elements(plan.step_count() as u64));

    group.bench_function("plan_scholars_mate", |b| {
        b.iter(|| {
            let plan = resetter
                .plan(black_box(scholars_mate), black_box(STARTING_POSITION_FEN))
                .expect("reset should plan");
            black_box(plan.step_count())
        });
    });

    group.bench_function("execute_simulated", |b| {
        b.iter(|| {
            let mut executor = Executor::new(
                SimulatedTransport::new(),
                &GantryConfig::default(),
                ExecutorConfig::default(),
            );
            let reports = executor
                .execute_all(plan.choreographies())
                .expect("simulated reset should execute");
            black_box(reports.len())
        });
    });

    group.finish();
}

criterion_group!(choreography_benches, bench_planning, bench_reset);
criterion_main!(choreography_benches);
