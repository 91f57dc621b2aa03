//! Performance benchmarks for context assembly.
//!
//! Run with: `cargo bench --bench assembly`
//!
//! The growth loop re-renders the accumulated sets once per folded edge, so
//! assembly cost is quadratic in accepted edges; these benches track that
//! curve at community sizes seen in practice.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use community_context::{
    BatchAssembler, CharTokenCounter, CommunityAssembler, CommunityRow, ContextColumns,
    DetailRecord, LocalContext,
};
use serde_json::json;

fn record(value: serde_json::Value) -> DetailRecord {
    match value {
        serde_json::Value::Object(map) => DetailRecord::from(map),
        _ => panic!("record fixture must be an object"),
    }
}

/// Build a ring community of `n` nodes with varied edge degrees.
fn make_contexts(n: usize) -> Vec<LocalContext> {
    let names: Vec<String> = (0..n).map(|i| format!("Entity{i}")).collect();
    let edges: Vec<DetailRecord> = (0..n)
        .map(|i| {
            let source = &names[i];
            let target = &names[(i + 1) % n];
            record(json!({
                "human_readable_id": i,
                "source": source,
                "target": target,
                "description": format!("{source} supplies {target} with parts"),
                "rank": (i * 7 % 13) as i64,
            }))
        })
        .collect();

    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let incident: Vec<DetailRecord> = edges
                .iter()
                .filter(|e| {
                    e.cell_display("source").as_deref() == Some(name.as_str())
                        || e.cell_display("target").as_deref() == Some(name.as_str())
                })
                .cloned()
                .collect();
            let details = record(json!({
                "human_readable_id": i,
                "title": name,
                "description": format!("{name} is a supplier in the ring"),
            }));
            LocalContext::new(name.clone(), details).with_edges(incident)
        })
        .collect()
}

fn bench_single_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_assembly");

    for size in [8, 32, 128] {
        let contexts = make_contexts(size);
        let assembler = CommunityAssembler::new(CharTokenCounter::new(), ContextColumns::default());

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &contexts, |b, contexts| {
            b.iter(|| {
                let out = assembler
                    .assemble(black_box(contexts), None, Some(4_000))
                    .unwrap();
                black_box(out)
            });
        });
    }

    group.finish();
}

fn bench_batch_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_assembly");

    for communities in [4, 16] {
        let rows: Vec<CommunityRow> = (0..communities)
            .flat_map(|community| {
                make_contexts(16).into_iter().map(move |local| {
                    CommunityRow::new(community.to_string(), local, serde_json::Value::Null)
                })
            })
            .collect();
        let assembler = BatchAssembler::new(CharTokenCounter::new(), ContextColumns::default());

        group.throughput(Throughput::Elements(communities as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(communities),
            &rows,
            |b, rows| {
                b.iter(|| {
                    let results = assembler
                        .assemble_all(black_box(rows), None, Some(4_000))
                        .unwrap();
                    black_box(results)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_single_assembly, bench_batch_assembly);
criterion_main!(benches);
