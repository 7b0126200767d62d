//! Birth-death tree simulation with lineage-specific rate shifts
//!
//! A tree grows lineage by lineage under a time-varying speciation rate,
//! a constant extinction rate, and a Poisson hazard of regime shifts.
//! Replicates are filtered through acceptance windows on tip and shift
//! counts before being serialized as Newick strings plus an event table.

pub mod engine;
pub mod event;
pub mod lineage;
pub mod node;
pub mod tree;

// Re-exports for convenient access
pub use engine::{ReplicateStats, RunSummary, SimEngine, EVENT_FILE_HEADER};
pub use event::BranchEvent;
pub use node::{Node, NodeArena};
pub use tree::{GrowthParams, SimTree};
