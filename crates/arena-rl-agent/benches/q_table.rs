//! Benchmarks for the hot paths of a decision tick and an episode end

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use arena_rl_agent::persistence::serialize;
use arena_rl_agent::{EpsilonGreedy, QLearning, QTable};
use arena_rl_core::{Reward, TableShape};

fn random_table(rng: &mut StdRng) -> QTable {
    let shape = TableShape::default();
    let cells = (0..shape.cell_count()).map(|_| rng.gen_range(-50.0..50.0)).collect();
    QTable::from_cells(shape, cells).unwrap()
}

fn bench_select_action(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let table = random_table(&mut rng);
    let state = table.shape().state(4, 7, 3, 2).unwrap();
    let policy = EpsilonGreedy::new(0.1);

    c.bench_function("q_table_select_action", |b| {
        b.iter(|| black_box(policy.select_action(&table, black_box(&state), &mut rng)))
    });
}

fn bench_update(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let mut table = random_table(&mut rng);
    let shape = table.shape();
    let prior = shape.state(4, 7, 3, 2).unwrap();
    let outcome = shape.state(5, 7, 3, 1).unwrap();
    let rule = QLearning::default();

    c.bench_function("q_table_update", |b| {
        b.iter(|| {
            black_box(rule.update(&mut table, &prior, 6, Reward(-7.0), black_box(&outcome)))
        })
    });
}

fn bench_episode_end(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let table = random_table(&mut rng);

    c.bench_function("q_table_normalize", |b| {
        b.iter(|| {
            let mut table = table.clone();
            black_box(table.normalize(99.99))
        })
    });

    c.bench_function("q_table_serialize", |b| {
        b.iter(|| black_box(serialize(black_box(&table), 0.42, 2)))
    });
}

criterion_group!(benches, bench_select_action, bench_update, bench_episode_end);
criterion_main!(benches);
