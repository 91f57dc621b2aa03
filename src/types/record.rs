//! Dynamic detail rows.
//!
//! Upstream extraction produces node/edge/claim/report rows with a pluggable
//! schema, so a row here is an ordered map of column name to JSON value
//! rather than a fixed struct. Column order is insertion order, which keeps
//! rendered table headers stable for identical inputs.
//!
//! ## Missing cells
//!
//! Columnar upstreams pad partially-populated rows with a not-a-number
//! placeholder. JSON cannot carry NaN, so `null` is its stand-in here: a cell
//! is *missing* when the key is absent, the value is `null`, or the value's
//! display form trims to the empty string. Rows with a missing identity cell
//! are silently dropped before rendering; that is filtering, not an error.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One detail row: an ordered map of column name to value.
///
/// Equality is structural; use [`DetailRecord::dedup_key`] when whole-row
/// deduplication must ignore key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetailRecord(Map<String, Value>);

impl DetailRecord {
    /// Create an empty row.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Number of cells in the row.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get a cell by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Set a cell, returning the previous value if any.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(column.into(), value)
    }

    /// Iterate cells in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Check whether the identity cell in `column` is present and non-blank.
    pub fn has_identity(&self, column: &str) -> bool {
        match self.0.get(column) {
            Some(value) => !is_missing(value),
            None => false,
        }
    }

    /// Display form of a cell, or `None` when the column is absent.
    ///
    /// This is the string used both for table cells and for node-name
    /// lookups. `null` renders as the empty string.
    pub fn cell_display(&self, column: &str) -> Option<String> {
        self.0.get(column).map(display_value)
    }

    /// Rewrite a float-stored integral identity cell to integer form.
    ///
    /// Cosmetic invariant: identity columns that round-tripped through a
    /// float dtype must not render with a trailing `.0`.
    pub fn normalize_identity(&mut self, column: &str) {
        let integral = match self.0.get(column) {
            Some(Value::Number(n)) if n.as_i64().is_none() && n.as_u64().is_none() => n
                .as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64),
            _ => None,
        };
        if let Some(i) = integral {
            self.0.insert(column.to_string(), Value::from(i));
        }
    }

    /// Order-insensitive key for whole-row deduplication.
    pub fn dedup_key(&self) -> String {
        let mut entries: Vec<(&String, &Value)> = self.0.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        let mut key = String::new();
        for (column, value) in entries {
            key.push_str(column);
            key.push('\u{1f}');
            key.push_str(&value.to_string());
            key.push('\u{1e}');
        }
        key
    }
}

impl From<Map<String, Value>> for DetailRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for DetailRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Check whether a cell value stands for a missing/placeholder entry.
pub fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Display form of a cell value.
///
/// Strings render verbatim, numbers in their JSON form, `null` as empty;
/// nested arrays/objects fall back to compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Total order over optional cells for deterministic tie-breaking.
///
/// Absent orders before present; numbers order before strings and compare
/// numerically via `total_cmp`; everything else compares by display form.
pub fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(fx), Some(fy)) => fx.total_cmp(&fy),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => display_value(x).cmp(&display_value(y)),
        },
    }
}
