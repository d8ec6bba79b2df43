use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use symsort::{pmergesort, symmergesort};

fn random_vec(n: usize, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0..i64::MAX)).collect()
}

fn bench_sorts(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_i64");

    for &n in &[1_000usize, 50_000, 1_000_000] {
        let base = random_vec(n, 42);

        group.bench_with_input(BenchmarkId::new("pmergesort", n), &n, |b, _| {
            b.iter_batched(
                || base.clone(),
                |mut v| {
                    pmergesort(&mut v, |a, b| a.cmp(b)).unwrap();
                    black_box(v);
                },
                criterion::BatchSize::LargeInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("symmergesort", n), &n, |b, _| {
            b.iter_batched(
                || base.clone(),
                |mut v| {
                    symmergesort(&mut v, |a, b| a.cmp(b));
                    black_box(v);
                },
                criterion::BatchSize::LargeInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("slice::sort", n), &n, |b, _| {
            b.iter_batched(
                || base.clone(),
                |mut v| {
                    v.sort();
                    black_box(v);
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_already_sorted(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_i64_presorted");
    let n = 200_000usize;
    let base: Vec<i64> = (0..n as i64).collect();

    group.bench_function("pmergesort/presorted", |b| {
        b.iter_batched(
            || base.clone(),
            |mut v| {
                pmergesort(&mut v, |a, b| a.cmp(b)).unwrap();
                black_box(v);
            },
            criterion::BatchSize::LargeInput,
        )
    });

    group.bench_function("symmergesort/presorted", |b| {
        b.iter_batched(
            || base.clone(),
            |mut v| {
                symmergesort(&mut v, |a, b| a.cmp(b));
                black_box(v);
            },
            criterion::BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_sorts, bench_already_sorted);
criterion_main!(benches);
