//! # community-context
//!
//! Deterministic, token-budgeted context assembly for graph community
//! summarization.
//!
//! A community is a cluster of graph nodes treated as one unit. This crate
//! folds a community's entities, relationships and supporting claims,
//! optionally augmented with pre-computed sub-community reports, into one
//! bounded text block suitable for grounding a language-model prompt.
//!
//! ## Core Contract
//!
//! 1. Rank relationships deterministically (degree descending)
//! 2. Grow the included set edge by edge, token-counting each render
//! 3. Stop at the budget; the last under-budget render wins
//! 4. Batch variant: the same growth loop per community group
//!
//! ## Architecture
//!
//! ```text
//! LocalContext rows → CommunityAssembler ─┐
//!                                         ├→ ContextRenderer → TokenCounter
//! CommunityRow table → BatchAssembler ────┘
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same rows + same columns + same counter → byte-identical output
//! - Single path: stable degree sort (equal degrees keep input order)
//! - Batch path: total order (degree descending, edge id ascending) and
//!   ascending community order in the result set
//!
//! ## Two stopping policies
//!
//! [`CommunityAssembler::assemble`] always returns *some* render, even when
//! the smallest step overruns the budget. [`BatchAssembler`] returns the
//! empty string for a community whose first step overruns. Both policies are
//! deliberate and documented on the methods.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assembler;
pub mod batch;
pub mod render;
pub mod schema;
pub mod tokens;
pub mod types;

// Re-exports
pub use assembler::{AssemblyError, CommunityAssembler};
pub use batch::BatchAssembler;
pub use render::{
    ContextRenderer, CLAIMS_HEADER, DEFAULT_DELIMITER, ENTITIES_HEADER, RELATIONSHIPS_HEADER,
    REPORTS_HEADER,
};
pub use schema::ContextColumns;
pub use tokens::{
    CachedTokenCounter, CharExactCounter, CharTokenCounter, TokenCountError, TokenCounter,
};
pub use types::{CommunityRow, ContextResult, DetailRecord, LocalContext};
