//! Performance benchmarks for virtual order execution
//!
//! Execution cost grows with the number of distinct expiries crossed, not with
//! the number of steps elapsed or orders open.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use twamm_amm::{FeeConfiguration, PoolKind, PoolParams, SwapKind, TwammPool, VirtualOrderEngine};
use twamm_types::{Address, Direction};

fn pool_with_orders(expiries: u64) -> TwammPool {
    let params = PoolParams::preset(PoolKind::Liquid).with_order_interval(100);
    let mut pool = TwammPool::new(params, FeeConfiguration::default(), 0).unwrap();
    pool.provide_liquidity(Address::from_low_byte(1), 1_000_000_000, 1_000_000_000, 0)
        .unwrap();

    for i in 0..expiries {
        let direction = if i % 2 == 0 {
            Direction::ZeroToOne
        } else {
            Direction::OneToZero
        };
        pool.submit_order(Address::from_low_byte(2), None, direction, 1_000_000, i, 0)
            .unwrap();
    }
    pool
}

fn bench_closed_form_updates(c: &mut Criterion) {
    c.bench_function("single_sided_output", |b| {
        b.iter(|| {
            VirtualOrderEngine::single_sided_output(
                criterion::black_box(1_000_000_000),
                criterion::black_box(2_000_000_000),
                criterion::black_box(12_345),
            )
        })
    });

    c.bench_function("two_sided_update", |b| {
        b.iter(|| {
            VirtualOrderEngine::two_sided_update(
                criterion::black_box([1_000_000_000, 2_000_000_000]),
                criterion::black_box([12_345, 54_321]),
            )
        })
    });
}

fn bench_execute_across_expiries(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute_virtual_orders");
    for expiries in [1u64, 8, 64, 256] {
        let pool = pool_with_orders(expiries);
        let target = (expiries + 1) * 100;
        group.bench_with_input(BenchmarkId::from_parameter(expiries), &pool, |b, pool| {
            b.iter(|| {
                let mut pool = pool.clone();
                pool.execute_virtual_orders(criterion::black_box(target))
            })
        });
    }
    group.finish();
}

fn bench_projection(c: &mut Criterion) {
    let pool = pool_with_orders(64);
    c.bench_function("project_half_way", |b| {
        b.iter(|| pool.project(criterion::black_box(3_200)))
    });
}

fn bench_swap_after_idle_period(c: &mut Criterion) {
    let pool = pool_with_orders(16);
    c.bench_function("swap_with_pending_execution", |b| {
        b.iter(|| {
            let mut pool = pool.clone();
            pool.swap(
                Direction::ZeroToOne,
                criterion::black_box(10_000),
                SwapKind::Regular,
                1_000,
            )
        })
    });
}

criterion_group!(
    benches,
    bench_closed_form_updates,
    bench_execute_across_expiries,
    bench_projection,
    bench_swap_after_idle_period
);
criterion_main!(benches);
