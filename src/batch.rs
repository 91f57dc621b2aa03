//! Batch context assembly across communities.
//!
//! Groups per-node rows by community and runs the greedy growth loop
//! independently per group. Groups share no mutable state, so callers may
//! fan them out across workers; this implementation folds them sequentially
//! in community order.
//!
//! The batch path intentionally diverges from the single-community path in
//! two documented ways: edge ordering is total (degree descending, edge id
//! ascending) rather than merely stable, and an immediate budget overrun
//! returns the empty string instead of falling back to over-budget content.

use std::collections::{BTreeMap, HashSet};

use crate::assembler::{edge_degree, AssemblyError};
use crate::render::ContextRenderer;
use crate::schema::ContextColumns;
use crate::tokens::TokenCounter;
use crate::types::record::{compare_cells, DetailRecord};
use crate::types::{CommunityRow, ContextResult};

/// Assembles context strings for many communities in one pass.
pub struct BatchAssembler<T: TokenCounter> {
    counter: T,
    columns: ContextColumns,
    renderer: ContextRenderer,
}

impl<T: TokenCounter> BatchAssembler<T> {
    /// Create a batch assembler over `counter` with the given column schema.
    pub fn new(counter: T, columns: ContextColumns) -> Self {
        let renderer = ContextRenderer::new(columns.clone());
        Self {
            counter,
            columns,
            renderer,
        }
    }

    /// Create a batch assembler rendering with a custom delimiter.
    pub fn with_delimiter(counter: T, columns: ContextColumns, delimiter: char) -> Self {
        let renderer = ContextRenderer::with_delimiter(columns.clone(), delimiter);
        Self {
            counter,
            columns,
            renderer,
        }
    }

    /// The column schema in use.
    pub fn columns(&self) -> &ContextColumns {
        &self.columns
    }

    /// Assemble one [`ContextResult`] per community.
    ///
    /// Rows are grouped by `community_id`; results come back in ascending
    /// community order. `sub_community_reports` rows are matched to groups by
    /// community-id cell equality (float-stored ids normalize first) and seed
    /// the Reports block. A configuration error in any group fails the whole
    /// invocation.
    pub fn assemble_all(
        &self,
        rows: &[CommunityRow],
        sub_community_reports: Option<&[DetailRecord]>,
        max_tokens: Option<usize>,
    ) -> Result<Vec<ContextResult>, AssemblyError> {
        let mut groups: BTreeMap<&str, Vec<&CommunityRow>> = BTreeMap::new();
        for row in rows {
            groups.entry(row.community_id.as_str()).or_default().push(row);
        }

        tracing::debug!(
            rows = rows.len(),
            communities = groups.len(),
            budget = ?max_tokens,
            "assembling batch contexts"
        );

        let reports = sub_community_reports.unwrap_or(&[]);
        let mut results = Vec::with_capacity(groups.len());
        for (community_id, group) in groups {
            results.push(self.assemble_group(community_id, &group, reports, max_tokens)?);
        }
        Ok(results)
    }

    fn assemble_group(
        &self,
        community_id: &str,
        group: &[&CommunityRow],
        reports: &[DetailRecord],
        max_tokens: Option<usize>,
    ) -> Result<ContextResult, AssemblyError> {
        // Explode and deduplicate the group's edges, nodes and claims.
        let mut edges = dedup_rows(group.iter().flat_map(|r| r.local.edge_details.iter()));
        let nodes = dedup_rows(group.iter().map(|r| &r.local.node_details));
        let claims = dedup_rows(group.iter().flat_map(|r| r.local.claim_details.iter()));

        self.sort_edges_total(&mut edges)?;

        // Seed the Reports block with this community's matching rows.
        let matching: Vec<DetailRecord> = reports
            .iter()
            .filter(|report| {
                let mut report = DetailRecord::clone(*report);
                report.normalize_identity(&self.columns.community_id);
                report.cell_display(&self.columns.community_id).as_deref() == Some(community_id)
            })
            .cloned()
            .collect();
        let preamble: Vec<String> = self.renderer.report_block(&matching).into_iter().collect();

        let mut sorted_edges: Vec<DetailRecord> = Vec::new();
        let mut sorted_nodes: Vec<DetailRecord> = Vec::new();
        let mut sorted_claims: Vec<DetailRecord> = Vec::new();
        let mut context_string = String::new();

        for edge in &edges {
            let source = self.endpoint(edge, &self.columns.edge_source)?;
            let target = self.endpoint(edge, &self.columns.edge_target)?;

            // First matching node row per endpoint; dangling references add
            // nothing.
            if let Some(node) = self.find_node(&nodes, &source) {
                sorted_nodes.push(node.clone());
            }
            if let Some(node) = self.find_node(&nodes, &target) {
                sorted_nodes.push(node.clone());
            }

            // Claims about either endpoint.
            for claim in &claims {
                let subject = claim.cell_display(&self.columns.claim_subject);
                if subject.as_deref() == Some(source.as_str())
                    || subject.as_deref() == Some(target.as_str())
                {
                    sorted_claims.push(claim.clone());
                }
            }

            sorted_edges.push(edge.clone());

            let draft = self.renderer.render_seeded(
                &preamble,
                &sorted_nodes,
                &sorted_claims,
                &sorted_edges,
            );
            if let Some(budget) = max_tokens {
                let size = self.counter.count(&draft)?;
                if size > budget {
                    tracing::trace!(
                        community = community_id,
                        size,
                        budget,
                        edges = sorted_edges.len(),
                        "budget reached"
                    );
                    break;
                }
            }
            // No fallback here: an overrun on the very first step leaves the
            // empty string accepted.
            context_string = draft;
        }

        let context_size = self.counter.count(&context_string)?;
        Ok(ContextResult {
            community_id: community_id.to_string(),
            context_string,
            context_size,
            context_exceed_flag: max_tokens.is_some_and(|budget| context_size > budget),
            all_context: group.iter().map(|r| r.all_context.clone()).collect(),
        })
    }

    /// Total edge order: degree descending, then edge id ascending.
    fn sort_edges_total(&self, edges: &mut Vec<DetailRecord>) -> Result<(), AssemblyError> {
        let mut keyed: Vec<(f64, DetailRecord)> = Vec::with_capacity(edges.len());
        for edge in edges.drain(..) {
            let degree = edge_degree(&edge, &self.columns.edge_degree)?;
            keyed.push((degree, edge));
        }
        let id_column = &self.columns.edge_id;
        keyed.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| compare_cells(a.1.get(id_column), b.1.get(id_column)))
        });
        edges.extend(keyed.into_iter().map(|(_, edge)| edge));
        Ok(())
    }

    fn endpoint(&self, edge: &DetailRecord, column: &str) -> Result<String, AssemblyError> {
        edge.cell_display(column)
            .ok_or_else(|| AssemblyError::MissingColumn {
                column: column.to_string(),
                section: "relationship",
            })
    }

    fn find_node<'a>(&self, nodes: &'a [DetailRecord], name: &str) -> Option<&'a DetailRecord> {
        nodes
            .iter()
            .find(|n| n.cell_display(&self.columns.node_name).as_deref() == Some(name))
    }
}

/// Whole-row dedup preserving first-occurrence order.
fn dedup_rows<'a>(rows: impl Iterator<Item = &'a DetailRecord>) -> Vec<DetailRecord> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in rows {
        if seen.insert(row.dedup_key()) {
            out.push(row.clone());
        }
    }
    out
}
