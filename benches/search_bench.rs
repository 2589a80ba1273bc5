use criterion::{black_box, criterion_group, criterion_main, Criterion};

use connect4_minimax::{choose_move, evaluator, BoardState, Player, TranspositionCache};

fn search_benchmark(c: &mut Criterion) {
    let board = BoardState::from_moves("4453").expect("valid position");
    let depth = 6;

    c.bench_function(&format!("search_depth_{}_cold_cache", depth), |b| {
        b.iter(|| {
            let mut cache = TranspositionCache::new();
            choose_move(black_box(&board), black_box(depth), true, &mut cache)
        })
    });

    c.bench_function("evaluate_position", |b| {
        b.iter(|| evaluator::score(black_box(&board), Player::One))
    });
}

criterion_group!(benches, search_benchmark);
criterion_main!(benches);
