//! Single-tree simulation: recursive lineage growth and serialization

use crate::config::Settings;
use crate::core::error::Result;
use crate::core::types::{Direction, EventId, NodeId};
use crate::random::SimRng;

use super::event::BranchEvent;
use super::lineage::{LineageState, StepOutcome};
use super::node::NodeArena;

/// Parameters governing the growth of a single tree realization.
#[derive(Debug, Clone, Copy)]
pub struct GrowthParams {
    pub event_rate: f64,
    pub lambda_init0: f64,
    pub lambda_shift0: f64,
    pub mu_init0: f64,
    pub max_time: f64,
    pub max_nodes: usize,
    pub max_time_for_event: f64,
    pub inc: f64,
    pub rmin: f64,
    pub rmax: f64,
    pub r_init_logscale: bool,
    pub epsmin: f64,
    pub epsmax: f64,
}

impl GrowthParams {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            event_rate: settings.event_rate,
            lambda_init0: settings.lambda_init0,
            lambda_shift0: settings.lambda_shift0,
            mu_init0: settings.mu_init0,
            max_time: settings.max_time,
            max_nodes: settings.max_number_of_nodes,
            max_time_for_event: settings.max_time_for_event,
            inc: settings.inc,
            rmin: settings.rmin,
            rmax: settings.rmax,
            r_init_logscale: settings.r_init_logscale,
            epsmin: settings.epsmin,
            epsmax: settings.epsmax,
        }
    }
}

/// One simulated tree: node registry, regime registry, and validity flag.
///
/// Building a tree draws the root regime, grows the root's right lineage
/// and then its left, and finally names every node. A tree that ran past
/// the node cap carries no names and is meant to be discarded by the
/// caller.
#[derive(Debug)]
pub struct SimTree {
    params: GrowthParams,
    nodes: NodeArena,
    events: Vec<BranchEvent>,
    root: NodeId,
    node_cap_exceeded: bool,
}

impl SimTree {
    /// Grows a complete tree realization.
    pub fn simulate(params: &GrowthParams, rng: &mut SimRng) -> Self {
        let (lambda_init, lambda_shift, mu_init) = root_regime(params, rng);

        let mut nodes = NodeArena::new();
        let root = nodes.push_root(EventId(0));
        let events = vec![BranchEvent::new(root, 0.0, lambda_init, lambda_shift, mu_init)];

        let mut tree = Self {
            params: *params,
            nodes,
            events,
            root,
            node_cap_exceeded: false,
        };
        tree.grow_lineage(root, Direction::Right, rng);
        if !tree.node_cap_exceeded {
            tree.grow_lineage(root, Direction::Left, rng);
        }
        if !tree.node_cap_exceeded {
            tree.nodes.assign_display_names();
        }
        tree
    }

    /// Grows one lineage away from `parent` in `direction`, recursing into
    /// both children at each speciation. The node cap is checked at entry
    /// to every recursive step so an oversized tree unwinds without
    /// creating further nodes.
    fn grow_lineage(&mut self, parent: NodeId, direction: Direction, rng: &mut SimRng) {
        if self.nodes.len() > self.params.max_nodes {
            self.node_cap_exceeded = true;
            return;
        }
        let params = self.params;
        let regime = self.nodes[parent].event();
        let mut state = LineageState::from_regime(self.nodes[parent].time(), &self.events[regime.0]);
        loop {
            match state.advance(&params, rng) {
                StepOutcome::Continue => {}
                StepOutcome::Speciation => {
                    let child = self.spawn_child(parent, direction, &mut state);
                    self.grow_lineage(child, Direction::Right, rng);
                    self.grow_lineage(child, Direction::Left, rng);
                    break;
                }
                StepOutcome::Extinction => {
                    let child = self.spawn_child(parent, direction, &mut state);
                    let node = &mut self.nodes[child];
                    node.set_tip(true);
                    node.set_extant(false);
                    break;
                }
                StepOutcome::HorizonReached => {
                    // A shift still pending here is never materialized: it
                    // altered the hazard while the lineage grew but leaves
                    // no stored event.
                    let inherited = self.nodes[parent].event();
                    let child =
                        self.nodes
                            .push_child(parent, direction, state.cur_time, inherited);
                    let node = &mut self.nodes[child];
                    node.set_tip(true);
                    node.set_extant(true);
                    break;
                }
            }
        }
    }

    /// Creates `parent`'s child in `direction` at the lineage clock,
    /// materializing a pending regime shift as a stored event anchored at
    /// the new node. Shared by the speciation and extinction outcomes.
    fn spawn_child(
        &mut self,
        parent: NodeId,
        direction: Direction,
        state: &mut LineageState,
    ) -> NodeId {
        let inherited = self.nodes[parent].event();
        let child = self
            .nodes
            .push_child(parent, direction, state.cur_time, inherited);
        if state.pending_shift {
            let id = EventId(self.events.len());
            self.events.push(BranchEvent::new(
                child,
                state.event_time,
                state.lambda_init,
                state.lambda_shift,
                state.mu,
            ));
            self.nodes[child].set_event(id);
            state.pending_shift = false;
        }
        child
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn nodes(&self) -> &NodeArena {
        &self.nodes
    }

    pub fn events(&self) -> &[BranchEvent] {
        &self.events
    }

    /// Number of childless nodes.
    pub fn tip_count(&self) -> usize {
        self.nodes.tip_count()
    }

    /// Number of materialized regime shifts (the root regime is excluded).
    pub fn shift_count(&self) -> usize {
        self.events.len() - 1
    }

    /// Latest node time in the tree.
    pub fn tree_age(&self) -> f64 {
        self.nodes.max_node_time()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True when growth was aborted by the node cap.
    pub fn node_cap_exceeded(&self) -> bool {
        self.node_cap_exceeded
    }

    /// Renders the tree in Newick notation, without the trailing `;`.
    pub fn newick(&self) -> String {
        let mut out = String::new();
        self.write_newick(self.root, &mut out);
        out
    }

    fn write_newick(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id];
        match (node.left(), node.right()) {
            (Some(left), Some(right)) => {
                out.push('(');
                self.write_newick(left, out);
                out.push(',');
                self.write_newick(right, out);
                out.push(')');
            }
            _ => out.push_str(node.name()),
        }
        out.push(':');
        out.push_str(&node.branch_length().to_string());
    }

    /// Appends this tree's event-table rows, root regime first and shifts
    /// in creation order, using the given 1-based replicate index.
    ///
    /// Each row names the tips reached from the event's anchor by pure
    /// right and pure left descent, in that order.
    pub fn append_event_rows(&self, replicate: usize, out: &mut String) -> Result<()> {
        for event in &self.events {
            let right = self.nodes.tip_name_following_right(event.node())?;
            let left = self.nodes.tip_name_following_left(event.node())?;
            out.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                replicate,
                right,
                left,
                event.time(),
                event.lambda_init(),
                event.lambda_shift(),
                event.mu_init()
            ));
        }
        Ok(())
    }
}

/// Resolves the root regime, drawing any parameter not fixed by
/// configuration.
fn root_regime(params: &GrowthParams, rng: &mut SimRng) -> (f64, f64, f64) {
    let mut lambda_init = params.lambda_init0;
    let mut mu_init = params.mu_init0;

    if lambda_init <= 0.0 {
        let eps = rng.uniform_range(params.epsmin, params.epsmax);
        let r = if params.r_init_logscale {
            rng.uniform_range(params.rmin.ln(), params.rmax.ln()).exp()
        } else {
            rng.uniform_range(params.rmin, params.rmax)
        };
        lambda_init = r / (1.0 - eps);
        mu_init = lambda_init * eps;
    }
    if mu_init <= 0.0 {
        // plain unit uniform here, not Uniform(epsmin, epsmax)
        mu_init = rng.uniform() * lambda_init;
    }
    let lambda_shift = params.lambda_shift0.max(0.0);
    (lambda_init, lambda_shift, mu_init)
}
