//! Tree nodes and the per-tree node registry

use std::ops::{Index, IndexMut};

use crate::core::error::{Result, SimError};
use crate::core::types::{Direction, EventId, NodeId};

/// A vertex of a simulated tree.
///
/// Nodes live in a [`NodeArena`] and refer to relatives by id; they never
/// own each other. The extant/tip flags describe how a lineage ended: an
/// extinct endpoint is a tip but not extant, an endpoint that survived to
/// the horizon is both. Display names stay empty until the whole tree has
/// finished growing.
#[derive(Debug, Clone)]
pub struct Node {
    ancestor: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    time: f64,
    branch_length: f64,
    extant: bool,
    tip: bool,
    event: EventId,
    name: String,
}

impl Node {
    fn root(event: EventId) -> Self {
        Self {
            ancestor: None,
            left: None,
            right: None,
            time: 0.0,
            branch_length: 0.0,
            extant: false,
            tip: false,
            event,
            name: String::new(),
        }
    }

    fn child_of(ancestor: NodeId, time: f64, branch_length: f64, event: EventId) -> Self {
        Self {
            ancestor: Some(ancestor),
            left: None,
            right: None,
            time,
            branch_length,
            extant: false,
            tip: false,
            event,
            name: String::new(),
        }
    }

    pub fn ancestor(&self) -> Option<NodeId> {
        self.ancestor
    }

    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    pub fn set_left(&mut self, child: Option<NodeId>) {
        self.left = child;
    }

    pub fn set_right(&mut self, child: Option<NodeId>) {
        self.right = child;
    }

    /// Absolute time this node was created at.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Time separating this node from its ancestor; zero for the root.
    pub fn branch_length(&self) -> f64 {
        self.branch_length
    }

    pub fn is_extant(&self) -> bool {
        self.extant
    }

    pub fn set_extant(&mut self, extant: bool) {
        self.extant = extant;
    }

    pub fn is_tip(&self) -> bool {
        self.tip
    }

    pub fn set_tip(&mut self, tip: bool) {
        self.tip = tip;
    }

    /// The rate regime governing the branch above this node.
    pub fn event(&self) -> EventId {
        self.event
    }

    pub fn set_event(&mut self, event: EventId) {
        self.event = event;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Flat ownership registry for one tree's nodes.
///
/// The arena owns every node it creates and frees them together; links
/// between nodes are plain indices used only for navigation.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Registers the root node, which carries time zero and no ancestor.
    pub fn push_root(&mut self, event: EventId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::root(event));
        id
    }

    /// Registers a child of `ancestor` at the given absolute time and links
    /// it into the requested child slot. Branch length is the time
    /// difference to the ancestor.
    pub fn push_child(
        &mut self,
        ancestor: NodeId,
        direction: Direction,
        time: f64,
        event: EventId,
    ) -> NodeId {
        let branch_length = time - self[ancestor].time();
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::child_of(ancestor, time, branch_length, event));
        match direction {
            Direction::Right => self[ancestor].set_right(Some(id)),
            Direction::Left => self[ancestor].set_left(Some(id)),
        }
        id
    }

    /// Name of the tip reached from `from` by always following right
    /// children. The descent is deterministic; a node with exactly one
    /// child on the wrong side is malformed input.
    pub fn tip_name_following_right(&self, from: NodeId) -> Result<&str> {
        self.tip_name_following(from, Direction::Right)
    }

    /// Name of the tip reached from `from` by always following left
    /// children.
    pub fn tip_name_following_left(&self, from: NodeId) -> Result<&str> {
        self.tip_name_following(from, Direction::Left)
    }

    fn tip_name_following(&self, from: NodeId, direction: Direction) -> Result<&str> {
        let mut current = from;
        loop {
            let node = &self[current];
            if node.is_leaf() {
                return Ok(node.name());
            }
            let next = match direction {
                Direction::Right => node.right(),
                Direction::Left => node.left(),
            };
            match next {
                Some(child) => current = child,
                None => {
                    return Err(SimError::InvalidTraversal {
                        node: current.0,
                        direction,
                    })
                }
            }
        }
    }

    /// Assigns display names to every node: extant tips `A<i>`, extinct
    /// tips `D<i>`, internal nodes `I<i>`, with `i` the registry index.
    pub fn assign_display_names(&mut self) {
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let prefix = if node.is_tip() {
                if node.is_extant() {
                    'A'
                } else {
                    'D'
                }
            } else {
                'I'
            };
            node.set_name(format!("{}{}", prefix, i));
        }
    }

    /// Number of childless nodes.
    pub fn tip_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Latest node time in the registry, i.e. the age of the tree.
    pub fn max_node_time(&self) -> f64 {
        self.nodes.iter().map(Node::time).fold(0.0, f64::max)
    }
}

impl Index<NodeId> for NodeArena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}
