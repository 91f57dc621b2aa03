//! Single-community context assembly.
//!
//! Greedy, degree-ordered growth of a context string under an optional token
//! budget. Edges are ranked by degree descending and folded in one at a time;
//! each step's render is token-counted and the last under-budget render wins.

use std::collections::HashMap;

use crate::render::ContextRenderer;
use crate::schema::ContextColumns;
use crate::tokens::{TokenCountError, TokenCounter};
use crate::types::record::{display_value, DetailRecord};
use crate::types::LocalContext;

/// Error type for context assembly.
///
/// Silent filtering and degenerate inputs never error; only configuration
/// mismatches and collaborator failures do.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    /// A configured column is absent from a row that must carry it.
    #[error("required column `{column}` missing from {section} row")]
    MissingColumn {
        /// The configured column name.
        column: String,
        /// Which section's row lacked it.
        section: &'static str,
    },
    /// The degree cell exists but is not a number.
    #[error("degree column `{column}` is not numeric (got `{value}`)")]
    NonNumericDegree {
        /// The configured degree column name.
        column: String,
        /// Display form of the offending cell.
        value: String,
    },
    /// The token counting collaborator failed. Propagated without retry.
    #[error(transparent)]
    TokenCount(#[from] TokenCountError),
}

/// Assembles one community's context string.
///
/// ## Algorithm
///
/// 1. Pool incident edges; index node details and claim lists by node name
///    (last write wins on repeated names)
/// 2. Sort edges by degree descending with a stable sort, so equal-degree
///    edges keep their input order
/// 3. Fold edges in greedily: both endpoint details (a missing lookup
///    degrades to an empty detail), the edge, and the source's claims
/// 4. With a budget: render and count each step; the first overrun stops
///    growth without accepting that step
/// 5. If nothing was ever accepted, return a fresh render of whatever was
///    accumulated (the "always return something" policy)
pub struct CommunityAssembler<T: TokenCounter> {
    counter: T,
    columns: ContextColumns,
    renderer: ContextRenderer,
}

impl<T: TokenCounter> CommunityAssembler<T> {
    /// Create an assembler over `counter` with the given column schema.
    pub fn new(counter: T, columns: ContextColumns) -> Self {
        let renderer = ContextRenderer::new(columns.clone());
        Self {
            counter,
            columns,
            renderer,
        }
    }

    /// Create an assembler rendering with a custom delimiter.
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

    /// Assemble the context string for one community.
    ///
    /// `sub_community_reports` rows, when given, render as the leading
    /// Reports block. Without `max_tokens` the full render is returned.
    /// Empty input yields the empty string, never an error.
    ///
    /// Claim handling preserves a long-standing upstream quirk: the source
    /// node's claim list is appended twice per edge (once standing in for
    /// each endpoint) and target claims are never consulted. The batch path
    /// does not share this behavior.
    pub fn assemble(
        &self,
        local_context: &[LocalContext],
        sub_community_reports: Option<&[DetailRecord]>,
        max_tokens: Option<usize>,
    ) -> Result<String, AssemblyError> {
        let mut edges: Vec<DetailRecord> = Vec::new();
        let mut node_details: HashMap<String, DetailRecord> = HashMap::new();
        let mut claim_details: HashMap<String, Vec<DetailRecord>> = HashMap::new();

        for record in local_context {
            edges.extend(record.edge_details.iter().cloned());
            node_details.insert(record.node_name.clone(), record.node_details.clone());
            claim_details.insert(record.node_name.clone(), record.claim_details.clone());
        }

        sort_by_degree_desc(&mut edges, &self.columns.edge_degree)?;

        tracing::debug!(
            nodes = node_details.len(),
            edges = edges.len(),
            budget = ?max_tokens,
            "assembling community context"
        );

        let reports = sub_community_reports.unwrap_or(&[]);
        let mut sorted_edges: Vec<DetailRecord> = Vec::new();
        let mut sorted_nodes: Vec<DetailRecord> = Vec::new();
        let mut sorted_claims: Vec<DetailRecord> = Vec::new();
        let mut context_string = String::new();

        for edge in &edges {
            let source = endpoint(edge, &self.columns.edge_source)?;
            let target = endpoint(edge, &self.columns.edge_target)?;

            // Weak references: missing nodes degrade to empty details, which
            // identity filtering drops at render time.
            sorted_nodes.push(node_details.get(&source).cloned().unwrap_or_default());
            sorted_nodes.push(node_details.get(&target).cloned().unwrap_or_default());
            sorted_edges.push(edge.clone());

            let source_claims = claim_details
                .get(&source)
                .map(Vec::as_slice)
                .unwrap_or_default();
            if !source_claims.is_empty() {
                sorted_claims.extend_from_slice(source_claims);
                sorted_claims.extend_from_slice(source_claims);
            }

            if let Some(budget) = max_tokens {
                let draft =
                    self.renderer
                        .render(reports, &sorted_nodes, &sorted_claims, &sorted_edges);
                let size = self.counter.count(&draft)?;
                if size > budget {
                    tracing::trace!(size, budget, edges = sorted_edges.len(), "budget reached");
                    break;
                }
                context_string = draft;
            }
        }

        // Fallback: no step was accepted (no budget given, zero edges, or the
        // very first render already overran). Prefer over-budget content to
        // returning nothing.
        if context_string.is_empty() {
            context_string =
                self.renderer
                    .render(reports, &sorted_nodes, &sorted_claims, &sorted_edges);
        }

        Ok(context_string)
    }
}

/// Read an edge endpoint cell, failing on an absent column.
fn endpoint(edge: &DetailRecord, column: &str) -> Result<String, AssemblyError> {
    edge.cell_display(column)
        .ok_or_else(|| AssemblyError::MissingColumn {
            column: column.to_string(),
            section: "relationship",
        })
}

/// Stable descending sort by the numeric degree column.
///
/// Shared with the batch path, which layers an edge-id tie-break on top.
pub(crate) fn sort_by_degree_desc(
    edges: &mut Vec<DetailRecord>,
    degree_column: &str,
) -> Result<(), AssemblyError> {
    let mut keyed: Vec<(f64, DetailRecord)> = Vec::with_capacity(edges.len());
    for edge in edges.drain(..) {
        let degree = edge_degree(&edge, degree_column)?;
        keyed.push((degree, edge));
    }
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    edges.extend(keyed.into_iter().map(|(_, edge)| edge));
    Ok(())
}

/// Read the numeric degree cell of an edge.
pub(crate) fn edge_degree(edge: &DetailRecord, column: &str) -> Result<f64, AssemblyError> {
    let value = edge.get(column).ok_or_else(|| AssemblyError::MissingColumn {
        column: column.to_string(),
        section: "relationship",
    })?;
    value.as_f64().ok_or_else(|| AssemblyError::NonNumericDegree {
        column: column.to_string(),
        value: display_value(value),
    })
}
