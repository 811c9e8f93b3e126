//! Evaluation and spin benchmarks

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rf_slot_core::*;

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let table = PayTable::standard();
    let grid = Grid::from_rows([
        [Symbol::Bomb, Symbol::Bomb, Symbol::Bomb],
        [Symbol::Bell, Symbol::Bell, Symbol::Axe],
        [Symbol::Fire, Symbol::RaceCar, Symbol::Fire],
    ]);

    for lines in [1usize, 3, 8] {
        let active = &ALL_LINES[..lines];
        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &lines, |b, _| {
            b.iter(|| table.evaluate(black_box(&grid), black_box(active), black_box(1.0)))
        });
    }

    group.finish();
}

fn bench_generate_grid(c: &mut Criterion) {
    let weights = SymbolCatalog::standard().base_weights().unwrap();
    let mut generator = OutcomeGenerator::seeded(1, Symbol::Fire);

    c.bench_function("generate_grid", |b| {
        b.iter(|| generator.generate_grid(black_box(&weights)))
    });
    c.bench_function("generate_adaptive_grid", |b| {
        b.iter(|| generator.generate_adaptive_grid(black_box(&weights), black_box(0.5)))
    });
}

fn bench_spin(c: &mut Criterion) {
    let mut config = SlotConfig::default();
    config.machine.starting_balance = 1.0e12;
    let mut machine = SlotMachine::with_config(config).unwrap().with_seed(7);

    c.bench_function("spin_8_lines", |b| {
        b.iter(|| machine.spin(black_box(1.0), black_box(&ALL_LINES)))
    });
}

criterion_group!(benches, bench_evaluate, bench_generate_grid, bench_spin);
criterion_main!(benches);
