//! Leaderboard insertion throughput.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use score_ledger::core::{Address, SessionId};
use score_ledger::ledger::{Leaderboard, LeaderboardEntry};

fn entries(count: usize, seed: u64) -> Vec<LeaderboardEntry> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let mut session = [0u8; 32];
            session[..8].copy_from_slice(&(i as u64).to_le_bytes());
            LeaderboardEntry {
                player: Address::new(rng.gen()),
                score: rng.gen_range(0..100_000),
                round: rng.gen_range(1..40),
                kills: rng.gen_range(0..20),
                is_agent: false,
                timestamp: i as u64,
                session_id: SessionId::new(session),
            }
        })
        .collect()
}

fn bench_insert(c: &mut Criterion) {
    let stream = entries(1_000, 42);

    c.bench_function("leaderboard_insert_1000_random", |b| {
        b.iter_batched(
            Leaderboard::new,
            |mut board| {
                for entry in &stream {
                    black_box(board.insert(entry.clone()));
                }
                board
            },
            BatchSize::SmallInput,
        )
    });

    let mut ascending = stream.clone();
    ascending.sort_by_key(|e| e.score);
    c.bench_function("leaderboard_insert_1000_ascending", |b| {
        b.iter_batched(
            Leaderboard::new,
            |mut board| {
                for entry in &ascending {
                    black_box(board.insert(entry.clone()));
                }
                board
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let mut board = Leaderboard::new();
    for entry in entries(100, 7) {
        board.insert(entry);
    }
    c.bench_function("leaderboard_snapshot", |b| b.iter(|| black_box(board.snapshot())));
}

criterion_group!(benches, bench_insert, bench_snapshot);
criterion_main!(benches);
