//! Core type definitions used throughout the codebase

/// Index of a node in a tree's registry.
///
/// Registry order is creation order, and the display names assigned after a
/// tree completes embed this index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Index of a rate regime in a tree's event registry. Slot 0 is always the
/// root regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(pub usize);

/// Which child slot a growing lineage descends from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Right,
    Left,
}
