#![allow(unused)]
extern crate ehscope;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ehscope::prelude::*;
use std::hint::black_box;

/// Builds a method with `count` sibling statements of the shape
///
/// ```text
/// for (;;) {
///     using (r) {
///         try { if (c) break; f(); } catch (E) { throw; } finally { lock (o) { g(); } }
///     }
/// }
/// ```
fn synthetic_method(count: usize) -> MethodBody {
    let mut b = MethodBodyBuilder::new();
    let mut statements = Vec::with_capacity(count);
    for _ in 0..count {
        let brk = b.break_stmt();
        let guard = b.if_stmt(Condition::Unknown, brk, None);
        let f = b.expression(&[]);
        let try_body = b.block(vec![guard, f]);
        let rethrow = b.rethrow_stmt();
        let catch_body = b.block(vec![rethrow]);
        let g = b.expression(&[]);
        let lock_body = b.block(vec![g]);
        let lock = b.lock(lock_body);
        let handler = b.block(vec![lock]);
        let try_stmt = b.try_catch_finally(
            try_body,
            vec![CatchClause::new(catch_body).with_type(ExceptionType::new("E"))],
            handler,
        );
        let using_body = b.block(vec![try_stmt]);
        let using = b.using(using_body);
        let loop_body = b.block(vec![using]);
        statements.push(b.loop_stmt(Condition::Always, loop_body));
    }
    let root = b.block(statements);
    b.finish(root).expect("valid method body")
}

/// Benchmark region construction for a single growing method body.
fn bench_build(c: &mut Criterion) {
    let builder = RegionBuilder::with_config(BuilderConfig::new().with_validation(false));

    let mut group = c.benchmark_group("build");
    for count in [16, 128, 1024] {
        let body = synthetic_method(count);
        group.throughput(Throughput::Elements(body.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &body, |b, body| {
            b.iter(|| black_box(builder.build(black_box(body)).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark parallel batch construction against a sequential loop.
fn bench_batch(c: &mut Criterion) {
    let builder = RegionBuilder::with_config(BuilderConfig::new().with_validation(false));
    let bodies: Vec<MethodBody> = (0..256).map(|_| synthetic_method(32)).collect();

    let mut group = c.benchmark_group("batch");
    group.throughput(Throughput::Elements(bodies.len() as u64));
    group.bench_function("sequential", |b| {
        b.iter(|| {
            let trees: Vec<_> = bodies.iter().map(|body| builder.build(body)).collect();
            black_box(trees)
        });
    });
    group.bench_function("build_batch", |b| {
        b.iter(|| black_box(builder.build_batch(black_box(&bodies))));
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_batch);
criterion_main!(benches);
