//! Golden tests for context assembly.
//!
//! These tests verify determinism, ordering and budget behavior of both
//! assembler entry points over realistic community fixtures.

use community_context::{
    BatchAssembler, CharExactCounter, CommunityAssembler, CommunityRow, ContextColumns,
    DetailRecord, LocalContext, RELATIONSHIPS_HEADER,
};
use proptest::prelude::*;
use serde_json::json;

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn record(value: serde_json::Value) -> DetailRecord {
    match value {
        serde_json::Value::Object(map) => DetailRecord::from(map),
        _ => panic!("record fixture must be an object"),
    }
}

fn node(id: u64, name: &str) -> DetailRecord {
    record(json!({
        "human_readable_id": id,
        "title": name,
        "description": format!("entity {name}"),
    }))
}

fn edge(id: u64, source: &str, target: &str, rank: i64) -> DetailRecord {
    record(json!({
        "human_readable_id": id,
        "source": source,
        "target": target,
        "description": format!("{source} relates to {target}"),
        "rank": rank,
    }))
}

/// Build one `LocalContext` per distinct node name, attaching each edge to
/// both of its endpoints the way the upstream join does.
fn build_contexts(names: &[&str], edges: &[DetailRecord]) -> Vec<LocalContext> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let incident: Vec<DetailRecord> = edges
                .iter()
                .filter(|e| {
                    e.cell_display("source").as_deref() == Some(*name)
                        || e.cell_display("target").as_deref() == Some(*name)
                })
                .cloned()
                .collect();
            LocalContext::new(*name, node(i as u64 + 1, name)).with_edges(incident)
        })
        .collect()
}

fn batch_rows(community: &str, contexts: Vec<LocalContext>) -> Vec<CommunityRow> {
    contexts
        .into_iter()
        .map(|local| {
            let all = json!({"title": local.node_name});
            CommunityRow::new(community, local, all)
        })
        .collect()
}

fn single() -> CommunityAssembler<CharExactCounter> {
    CommunityAssembler::new(CharExactCounter, ContextColumns::default())
}

fn batch() -> BatchAssembler<CharExactCounter> {
    BatchAssembler::new(CharExactCounter, ContextColumns::default())
}

/// Extract (degree, edge id) pairs from the rendered Relationships block.
fn relationship_order(context: &str) -> Vec<(i64, i64)> {
    let block = context
        .split("\n\n")
        .find(|b| b.starts_with(RELATIONSHIPS_HEADER))
        .unwrap_or("");
    let mut lines = block.lines().skip(1);
    let header: Vec<&str> = lines.next().unwrap_or("").split(',').collect();
    let id_at = header.iter().position(|c| *c == "human_readable_id").unwrap();
    let rank_at = header.iter().position(|c| *c == "rank").unwrap();
    lines
        .map(|line| {
            let cells: Vec<&str> = line.split(',').collect();
            (cells[rank_at].parse().unwrap(), cells[id_at].parse().unwrap())
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Worked scenarios
// ─────────────────────────────────────────────────────────────────────────────

/// Three nodes A, B, C; edges A-B (degree 5) and B-C (degree 2); generous
/// budget. A-B renders first, B appears once, nothing overruns.
#[test]
fn test_two_edge_scenario() {
    let edges = vec![edge(10, "A", "B", 5), edge(11, "B", "C", 2)];
    let contexts = build_contexts(&["A", "B", "C"], &edges);

    let out = single().assemble(&contexts, None, Some(10_000)).unwrap();
    assert_eq!(relationship_order(&out), vec![(5, 10), (2, 11)]);
    let entity_block = out
        .split("\n\n")
        .find(|b| b.starts_with("-----Entities-----"))
        .unwrap();
    assert_eq!(entity_block.matches(",B,").count(), 1);

    let results = batch()
        .assemble_all(&batch_rows("1", contexts), None, Some(10_000))
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(!results[0].context_string.is_empty());
    assert!(!results[0].context_exceed_flag);
    assert_eq!(relationship_order(&results[0].context_string), vec![(5, 10), (2, 11)]);
}

/// Single edge whose minimal render exceeds a budget of 1 token: the single
/// path returns it anyway, the batch path returns the empty string.
#[test]
fn test_impossible_budget_policies_diverge() {
    let edges = vec![edge(10, "A", "B", 1)];
    let contexts = build_contexts(&["A", "B"], &edges);

    let out = single().assemble(&contexts, None, Some(1)).unwrap();
    assert!(out.contains(RELATIONSHIPS_HEADER));

    let results = batch()
        .assemble_all(&batch_rows("1", contexts), None, Some(1))
        .unwrap();
    assert_eq!(results[0].context_string, "");
    assert_eq!(results[0].context_size, 0);
    assert!(!results[0].context_exceed_flag);
}

#[test]
fn test_sub_community_reports_reused_as_compressed_summary() {
    let edges = vec![edge(10, "A", "B", 5)];
    let contexts = build_contexts(&["A", "B"], &edges);
    let reports = vec![
        record(json!({"community": 4, "summary": "nested community four"})),
        record(json!({"community": 9, "summary": "unrelated"})),
    ];

    let results = batch()
        .assemble_all(&batch_rows("4", contexts), Some(&reports), None)
        .unwrap();
    let out = &results[0].context_string;
    assert!(out.starts_with("----Reports-----\n"));
    assert!(out.contains("nested community four"));
    assert!(!out.contains("unrelated"));
}

#[test]
fn test_reported_size_matches_counter() {
    let edges = vec![edge(10, "A", "B", 5), edge(11, "B", "C", 2)];
    let results = batch()
        .assemble_all(
            &batch_rows("1", build_contexts(&["A", "B", "C"], &edges)),
            None,
            Some(10_000),
        )
        .unwrap();
    let result = &results[0];
    assert_eq!(result.context_size, result.context_string.chars().count());
}

// ─────────────────────────────────────────────────────────────────────────────
// Property tests
// ─────────────────────────────────────────────────────────────────────────────

const NAMES: [&str; 4] = ["Alpha", "Beta", "Gamma", "Delta"];

/// Random edge lists over a fixed node pool. Ids are distinct by
/// construction; degrees collide often to exercise tie-breaking.
fn arb_edges() -> impl Strategy<Value = Vec<DetailRecord>> {
    prop::collection::vec((0usize..4, 0usize..4, 0i64..5), 1..12).prop_map(|triples| {
        triples
            .into_iter()
            .enumerate()
            .map(|(i, (s, t, rank))| edge(i as u64 + 100, NAMES[s], NAMES[t], rank))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_single_assembly_is_deterministic(edges in arb_edges(), budget in 50usize..2000) {
        let contexts = build_contexts(&NAMES, &edges);
        let a = single().assemble(&contexts, None, Some(budget)).unwrap();
        let b = single().assemble(&contexts, None, Some(budget)).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_batch_assembly_is_deterministic(edges in arb_edges(), budget in 50usize..2000) {
        let rows = batch_rows("1", build_contexts(&NAMES, &edges));
        let a = batch().assemble_all(&rows, None, Some(budget)).unwrap();
        let b = batch().assemble_all(&rows, None, Some(budget)).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_batch_degree_order_is_total(edges in arb_edges()) {
        let rows = batch_rows("1", build_contexts(&NAMES, &edges));
        let results = batch().assemble_all(&rows, None, None).unwrap();
        let order = relationship_order(&results[0].context_string);
        for pair in order.windows(2) {
            let (d0, id0) = pair[0];
            let (d1, id1) = pair[1];
            prop_assert!(d0 > d1 || (d0 == d1 && id0 < id1));
        }
    }

    #[test]
    fn prop_single_never_empty_with_edges(edges in arb_edges(), budget in 1usize..50) {
        let contexts = build_contexts(&NAMES, &edges);
        let out = single().assemble(&contexts, None, Some(budget)).unwrap();
        prop_assert!(!out.is_empty());
    }

    #[test]
    fn prop_batch_size_within_budget_or_empty(edges in arb_edges(), budget in 1usize..2000) {
        let rows = batch_rows("1", build_contexts(&NAMES, &edges));
        let results = batch().assemble_all(&rows, None, Some(budget)).unwrap();
        let result = &results[0];
        prop_assert!(result.context_size <= budget || result.context_string.is_empty());
        if result.context_string.is_empty() {
            prop_assert!(!result.context_exceed_flag);
        }
    }
}
