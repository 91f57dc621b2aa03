//! Core types for context assembly.

pub mod context;
pub mod record;

pub use context::{CommunityRow, ContextResult, LocalContext};
pub use record::{compare_cells, display_value, is_missing, DetailRecord};
