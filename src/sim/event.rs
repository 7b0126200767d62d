//! Rate-regime records

use crate::core::types::NodeId;

/// One speciation/extinction regime, active from `time` onward on the
/// lineage through its anchor node.
///
/// The speciation rate at elapsed time `t` since `time` is
/// `lambda_init * exp(lambda_shift * t)`; the extinction rate is the
/// constant `mu_init`. Regimes are immutable once stored: a tree's event
/// registry holds the root regime in slot 0 and one record per materialized
/// shift after that, and any number of nodes may reference the same record.
#[derive(Debug, Clone)]
pub struct BranchEvent {
    node: NodeId,
    time: f64,
    lambda_init: f64,
    lambda_shift: f64,
    mu_init: f64,
}

impl BranchEvent {
    pub fn new(node: NodeId, time: f64, lambda_init: f64, lambda_shift: f64, mu_init: f64) -> Self {
        Self {
            node,
            time,
            lambda_init,
            lambda_shift,
            mu_init,
        }
    }

    /// The node this regime is anchored at.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Absolute time the regime took effect.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn lambda_init(&self) -> f64 {
        self.lambda_init
    }

    pub fn lambda_shift(&self) -> f64 {
        self.lambda_shift
    }

    pub fn mu_init(&self) -> f64 {
        self.mu_init
    }
}
