//! Context rendering.
//!
//! Turns deduplicated detail rows into labeled, delimiter-separated text
//! sections and joins them into one context string. Pure functions of their
//! inputs; all the prioritization lives in the assemblers.
//!
//! ## Layout contract
//!
//! Downstream prompt templates match on this layout, so it is bit-exact:
//! each non-empty collection becomes a literal header line followed by a
//! delimited table (header row of column names, one row per record, no row
//! index), blocks join with exactly one blank line, and the block order is
//! fixed as Reports, Entities, Claims, Relationships.

use crate::schema::ContextColumns;
use crate::types::record::DetailRecord;

/// Header line of the sub-community reports block.
pub const REPORTS_HEADER: &str = "----Reports-----";
/// Header line of the entities block.
pub const ENTITIES_HEADER: &str = "-----Entities-----";
/// Header line of the claims block.
pub const CLAIMS_HEADER: &str = "-----Claims-----";
/// Header line of the relationships block.
pub const RELATIONSHIPS_HEADER: &str = "-----Relationships-----";

/// Default field delimiter for tabular sections.
pub const DEFAULT_DELIMITER: char = ',';

/// Renders detail rows into labeled context sections.
#[derive(Debug, Clone)]
pub struct ContextRenderer {
    columns: ContextColumns,
    delimiter: char,
}

impl ContextRenderer {
    /// Create a renderer with the default `,` delimiter.
    pub fn new(columns: ContextColumns) -> Self {
        Self::with_delimiter(columns, DEFAULT_DELIMITER)
    }

    /// Create a renderer with a custom single-character delimiter.
    pub fn with_delimiter(columns: ContextColumns, delimiter: char) -> Self {
        Self { columns, delimiter }
    }

    /// Render the four collections in fixed block order.
    ///
    /// Empty collections (and collections emptied by identity filtering)
    /// contribute no block. All empty yields the empty string.
    pub fn render(
        &self,
        reports: &[DetailRecord],
        entities: &[DetailRecord],
        claims: &[DetailRecord],
        edges: &[DetailRecord],
    ) -> String {
        let mut blocks: Vec<String> = Vec::with_capacity(4);
        if let Some(block) = self.report_block(reports) {
            blocks.push(block);
        }
        self.push_tail_blocks(&mut blocks, entities, claims, edges);
        blocks.join("\n\n")
    }

    /// Render with pre-built blocks seeded ahead of the tabular sections.
    ///
    /// The batch assembler builds its Reports block once per community and
    /// re-renders only the growing sections behind it.
    pub fn render_seeded(
        &self,
        preamble: &[String],
        entities: &[DetailRecord],
        claims: &[DetailRecord],
        edges: &[DetailRecord],
    ) -> String {
        let mut blocks: Vec<String> = preamble.to_vec();
        self.push_tail_blocks(&mut blocks, entities, claims, edges);
        blocks.join("\n\n")
    }

    /// Render the reports block alone, if any report row survives filtering.
    pub fn report_block(&self, reports: &[DetailRecord]) -> Option<String> {
        self.block(REPORTS_HEADER, reports, &self.columns.community_id)
    }

    fn push_tail_blocks(
        &self,
        blocks: &mut Vec<String>,
        entities: &[DetailRecord],
        claims: &[DetailRecord],
        edges: &[DetailRecord],
    ) {
        if let Some(block) = self.block(ENTITIES_HEADER, entities, &self.columns.node_id) {
            blocks.push(block);
        }
        if let Some(block) = self.block(CLAIMS_HEADER, claims, &self.columns.claim_id) {
            blocks.push(block);
        }
        if let Some(block) = self.block(RELATIONSHIPS_HEADER, edges, &self.columns.edge_id) {
            blocks.push(block);
        }
    }

    /// One labeled block: header line plus the delimited table.
    fn block(&self, header: &str, rows: &[DetailRecord], id_column: &str) -> Option<String> {
        let rows = prepare_rows(rows, id_column);
        if rows.is_empty() {
            return None;
        }
        Some(format!("{header}\n{}", self.table(&rows)))
    }

    /// Delimited table: header row of column names, then one line per row.
    ///
    /// Columns are the union of row keys in first-seen order, matching how
    /// the upstream columnar store lays out heterogeneous rows. No trailing
    /// newline; the block join supplies separation.
    fn table(&self, rows: &[DetailRecord]) -> String {
        let mut columns: Vec<&String> = Vec::new();
        for row in rows {
            for (column, _) in row.iter() {
                if !columns.contains(&column) {
                    columns.push(column);
                }
            }
        }

        let delimiter = self.delimiter.to_string();
        let mut lines = Vec::with_capacity(rows.len() + 1);
        let header: Vec<String> = columns.iter().map(|c| self.escape(c.as_str())).collect();
        lines.push(header.join(&delimiter));

        for row in rows {
            let cells: Vec<String> = columns
                .iter()
                .map(|column| {
                    let cell = row.cell_display(column.as_str()).unwrap_or_default();
                    self.escape(&cell)
                })
                .collect();
            lines.push(cells.join(&delimiter));
        }

        lines.join("\n")
    }

    /// Quote a cell when it contains the delimiter, a quote, or a newline.
    fn escape(&self, cell: &str) -> String {
        if cell.contains(self.delimiter) || cell.contains('"') || cell.contains(&['\n', '\r'][..]) {
            format!("\"{}\"", cell.replace('"', "\"\""))
        } else {
            cell.to_string()
        }
    }
}

/// Filter rows by identity, normalize float-stored ids, dedup whole rows.
///
/// First occurrence wins; surviving rows keep their input order.
fn prepare_rows(rows: &[DetailRecord], id_column: &str) -> Vec<DetailRecord> {
    let mut seen = std::collections::HashSet::new();
    let mut prepared = Vec::new();
    for row in rows {
        if !row.has_identity(id_column) {
            continue;
        }
        let mut row = row.clone();
        row.normalize_identity(id_column);
        if seen.insert(row.dedup_key()) {
            prepared.push(row);
        }
    }
    prepared
}
