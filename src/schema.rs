//! Column-name configuration for context assembly.
//!
//! Detail rows are dynamic maps; which cells carry identity, endpoints and
//! rank is injected rather than hard-coded, so the same algorithm runs over
//! any upstream schema. The defaults match the extraction pipeline this crate
//! was built against.
//!
//! The configuration is read-only after construction. Build one value at
//! process start and share it by reference or cheap clone; there is no
//! mutable global.

use serde::{Deserialize, Serialize};

/// Default column holding a node's identity.
pub const DEFAULT_NODE_ID: &str = "human_readable_id";
/// Default column holding a node's name (the join key for edges and claims).
pub const DEFAULT_NODE_NAME: &str = "title";
/// Default column holding an edge's identity.
pub const DEFAULT_EDGE_ID: &str = "human_readable_id";
/// Default column holding an edge's rank, used for degree ordering.
pub const DEFAULT_EDGE_DEGREE: &str = "rank";
/// Default column holding an edge's source node name.
pub const DEFAULT_EDGE_SOURCE: &str = "source";
/// Default column holding an edge's target node name.
pub const DEFAULT_EDGE_TARGET: &str = "target";
/// Default column holding a claim's identity.
pub const DEFAULT_CLAIM_ID: &str = "human_readable_id";
/// Default column holding a claim's subject node name.
pub const DEFAULT_CLAIM_SUBJECT: &str = "subject_id";
/// Default column holding a report's community identity.
pub const DEFAULT_COMMUNITY_ID: &str = "community";

/// Injected column names for the detail rows consumed by the assemblers.
///
/// Every field is renamable; `Default` carries the upstream pipeline's
/// column names. Renaming is structural indirection only; it never changes
/// the algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextColumns {
    /// Identity column on node detail rows.
    pub node_id: String,
    /// Name column on node detail rows (edge endpoints reference this).
    pub node_name: String,
    /// Identity column on edge detail rows.
    pub edge_id: String,
    /// Rank column on edge detail rows, the primary sort key.
    pub edge_degree: String,
    /// Source endpoint column on edge detail rows (weak node-name reference).
    pub edge_source: String,
    /// Target endpoint column on edge detail rows (weak node-name reference).
    pub edge_target: String,
    /// Identity column on claim detail rows.
    pub claim_id: String,
    /// Subject column on claim detail rows (weak node-name reference).
    pub claim_subject: String,
    /// Community identity column on report rows.
    pub community_id: String,
}

impl Default for ContextColumns {
    fn default() -> Self {
        Self {
            node_id: DEFAULT_NODE_ID.to_string(),
            node_name: DEFAULT_NODE_NAME.to_string(),
            edge_id: DEFAULT_EDGE_ID.to_string(),
            edge_degree: DEFAULT_EDGE_DEGREE.to_string(),
            edge_source: DEFAULT_EDGE_SOURCE.to_string(),
            edge_target: DEFAULT_EDGE_TARGET.to_string(),
            claim_id: DEFAULT_CLAIM_ID.to_string(),
            claim_subject: DEFAULT_CLAIM_SUBJECT.to_string(),
            community_id: DEFAULT_COMMUNITY_ID.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let columns = ContextColumns::default();
        assert_eq!(columns.node_id, DEFAULT_NODE_ID);
        assert_eq!(columns.edge_degree, DEFAULT_EDGE_DEGREE);
        assert_eq!(columns.community_id, DEFAULT_COMMUNITY_ID);
    }

    #[test]
    fn test_rename_is_plain_data() {
        let mut columns = ContextColumns::default();
        columns.edge_degree = "combined_degree".to_string();
        let json = serde_json::to_string(&columns).unwrap();
        let back: ContextColumns = serde_json::from_str(&json).unwrap();
        assert_eq!(back, columns);
    }
}
