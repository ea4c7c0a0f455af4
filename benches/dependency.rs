use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use ferrous_kit::{AppError, Dependency, ErrorHandler};
use std::sync::Arc;

fn bench_cached_hit(c: &mut Criterion) {
    let dep = Dependency::new(|n: u64| n, 42);
    // Prime the cache
    let _ = dep.resolve().unwrap();

    c.bench_function("cached_hit_u64", |b| {
        b.iter(|| {
            let v = dep.resolve().unwrap();
            black_box(v);
        })
    });
}

fn bench_transient_build(c: &mut Criterion) {
    struct Service {
        data: [u8; 64],
    }

    let dep = Dependency::transient(|fill: u8| Service { data: [fill; 64] }, 7);

    c.bench_function("transient_build_64b", |b| {
        b.iter(|| {
            let v = dep.resolve().unwrap();
            black_box(v.data[0]);
        })
    });
}

fn bench_injected_hit(c: &mut Criterion) {
    let mut dep = Dependency::new(|n: u64| n, 1);
    dep.inject(Arc::new(2)).unwrap();

    c.bench_function("injected_hit_u64", |b| {
        b.iter(|| {
            let v = dep.resolve().unwrap();
            black_box(v);
        })
    });
}

fn bench_scope_cycle(c: &mut Criterion) {
    c.bench_function("inject_then_scope_exit", |b| {
        b.iter_batched(
            || Dependency::new(|s: &'static str| s.to_string(), "prod"),
            |mut dep| {
                dep.scoped(|dep| {
                    dep.inject(Arc::new("test".to_string())).unwrap();
                    black_box(dep.resolve().unwrap());
                })
                .unwrap();
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_error_handle(c: &mut Criterion) {
    let handler = ErrorHandler::new();
    handler.subscribe_fn(|err: &AppError| {
        black_box(err.status());
    });

    c.bench_function("handle_app_error", |b| {
        b.iter(|| black_box(handler.handle(AppError::not_found("missing"))))
    });
}

criterion_group!(
    benches,
    bench_cached_hit,
    bench_transient_build,
    bench_injected_hit,
    bench_scope_cycle,
    bench_error_handle
);
criterion_main!(benches);
