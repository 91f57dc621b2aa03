//! Input and output records for context assembly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::DetailRecord;

/// Local context for one node of a community.
///
/// Edges and claims reference nodes by name without owning them: a dangling
/// endpoint degrades to an empty detail at assembly time, it is never an
/// error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalContext {
    /// Node name, the join key for edge endpoints and claim subjects.
    pub node_name: String,
    /// Detail row for the node itself.
    pub node_details: DetailRecord,
    /// Detail rows for edges incident to the node.
    #[serde(default)]
    pub edge_details: Vec<DetailRecord>,
    /// Detail rows for claims about the node.
    #[serde(default)]
    pub claim_details: Vec<DetailRecord>,
}

impl LocalContext {
    /// Create a local context with node details only.
    pub fn new(node_name: impl Into<String>, node_details: DetailRecord) -> Self {
        Self {
            node_name: node_name.into(),
            node_details,
            edge_details: Vec::new(),
            claim_details: Vec::new(),
        }
    }

    /// Attach incident edge rows.
    pub fn with_edges(mut self, edge_details: Vec<DetailRecord>) -> Self {
        self.edge_details = edge_details;
        self
    }

    /// Attach claim rows.
    pub fn with_claims(mut self, claim_details: Vec<DetailRecord>) -> Self {
        self.claim_details = claim_details;
        self
    }
}

/// One batch input row: a node's local context tagged with its community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityRow {
    /// Community this node belongs to (the grouping key).
    pub community_id: String,
    /// The node's local context.
    pub local: LocalContext,
    /// The original upstream record, carried through verbatim for
    /// traceability. Not interpreted by the assembler.
    #[serde(default)]
    pub all_context: Value,
}

impl CommunityRow {
    /// Create a batch row.
    pub fn new(community_id: impl Into<String>, local: LocalContext, all_context: Value) -> Self {
        Self {
            community_id: community_id.into(),
            local,
            all_context,
        }
    }
}

/// One batch output row per community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextResult {
    /// Community this context was assembled for.
    pub community_id: String,
    /// The rendered, budget-constrained context.
    pub context_string: String,
    /// Token count of `context_string`, per the configured counter.
    pub context_size: usize,
    /// True when a budget was supplied and the accepted string exceeds it.
    /// Never true together with an empty `context_string`.
    pub context_exceed_flag: bool,
    /// The original per-node records folded into this community.
    pub all_context: Vec<Value>,
}
