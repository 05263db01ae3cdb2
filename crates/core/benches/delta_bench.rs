//! 델타 계산 벤치마크
//!
//! 필드 맵 비교, 검증 성능을 측정합니다.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use crudcheck_core::delta::UpdateDelta;
use crudcheck_core::entity::FieldSet;
use serde_json::json;

fn field_set(size: usize, changed_every: usize) -> (FieldSet, FieldSet) {
    let mut before = FieldSet::new();
    let mut after = FieldSet::new();
    for i in 0..size {
        let key = format!("field_{i:03}");
        before.insert(key.clone(), json!({"value": i, "tags": ["a", "b"]}));
        let value = if changed_every > 0 && i % changed_every == 0 {
            json!({"value": i + 1, "tags": ["a", "b"]})
        } else {
            json!({"value": i, "tags": ["a", "b"]})
        };
        after.insert(key, value);
    }
    (before, after)
}

fn bench_between(c: &mut Criterion) {
    let mut group = c.benchmark_group("delta_between");
    for size in [8usize, 64, 512] {
        let (before, after) = field_set(size, 4);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("{size}_fields"), |b| {
            b.iter(|| UpdateDelta::between(black_box(&before), black_box(&after)))
        });
    }
    group.finish();
}

fn bench_unchanged(c: &mut Criterion) {
    let (before, after) = field_set(64, 0);
    c.bench_function("delta_between_unchanged_64", |b| {
        b.iter(|| UpdateDelta::between(black_box(&before), black_box(&after)).is_empty())
    });
}

fn bench_verify(c: &mut Criterion) {
    let (before, after) = field_set(64, 2);
    let delta = UpdateDelta::between(&before, &after);
    c.bench_function("delta_verify_64", |b| {
        b.iter(|| delta.verify(black_box(&after)))
    });
}

criterion_group!(benches, bench_between, bench_unchanged, bench_verify);
criterion_main!(benches);
