//! Node Suspension
//!
//! The balanced-bloom growth of a cluster is driven by a tree of nodes, each owning a part of the cluster's boundary.
//! Before a cluster grows, the parities and delays of the changed subtrees are recomputed; during growth only the nodes
//! that are furthest behind grow their local boundary while the others wait.
//!
//! The node tree is a different structure from the decoding graph: its edges are formed when clusters merge, weighted
//! by half the summed radii of the two nodes.
//!

use super::cluster::BoundaryEntry;
use super::util::*;
use crate::derivative::Derivative;
use crate::serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    /// grown from a defect vertex
    Syndrome,
    /// synthesized when two trees meet away from both nodes
    Junction,
    /// a virtual vertex absorbed by the cluster
    Boundary,
    /// a region of erased edges absorbed during growth
    Filler,
}

impl NodeKind {
    /// parity of a node given the number of its children reporting even parity
    #[inline]
    pub fn parity(&self, even_children: usize) -> usize {
        match self {
            Self::Syndrome => even_children % 2,
            Self::Junction => 1 - even_children % 2,
            Self::Boundary | Self::Filler => 1,
        }
    }

    pub fn abbrev(&self) -> &'static str {
        match self {
            Self::Syndrome => "S",
            Self::Junction => "J",
            Self::Boundary => "B",
            Self::Filler => "F",
        }
    }
}

/// delay of `node` (attached to `parent` by an edge of weight `edge`) must be recomputed before the next growth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRequest {
    pub node: NodeIndex,
    pub edge: isize,
    pub parent: NodeIndex,
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct SuspensionNode {
    pub index: NodeIndex,
    pub kind: NodeKind,
    /// the vertex this node is grown from
    pub primer: VertexIndex,
    /// the local growth front being processed
    #[derivative(Debug = "ignore")]
    pub old_bound: Vec<BoundaryEntry>,
    /// the local growth front discovered by the last growth
    #[derivative(Debug = "ignore")]
    pub new_bound: Vec<BoundaryEntry>,
    /// tree neighbors with edge weights
    pub neighbors: Vec<(NodeIndex, isize)>,
    /// pending delay recomputations, only meaningful on the root node of a cluster
    #[derivative(Debug = "ignore")]
    pub root_list: Vec<DelayRequest>,
    /// number of growth steps applied at this node
    pub radius: isize,
    pub parity: usize,
    pub delay: isize,
    pub waited: isize,
}

#[derive(Debug, Clone, Default)]
pub struct NodeForest {
    pub nodes: Vec<SuspensionNode>,
    /// temporary variable to reduce reallocation
    traverse_stack: Vec<(NodeIndex, Option<NodeIndex>, bool)>,
}

impl NodeForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_node(&mut self, kind: NodeKind, primer: VertexIndex) -> NodeIndex {
        let index = self.nodes.len();
        self.nodes.push(SuspensionNode {
            index,
            kind,
            primer,
            old_bound: Vec::new(),
            new_bound: Vec::new(),
            neighbors: Vec::new(),
            root_list: Vec::new(),
            radius: 0,
            parity: kind.parity(0),
            delay: 0,
            waited: 0,
        });
        index
    }

    pub fn link(&mut self, a: NodeIndex, b: NodeIndex, weight: isize) {
        debug_assert_ne!(a, b, "cannot link a node to itself");
        self.nodes[a].neighbors.push((b, weight));
        self.nodes[b].neighbors.push((a, weight));
    }

    /// attach a fresh node (boundary or filler) below `parent`, returning the request to compute its delay
    pub fn attach(&mut self, parent: NodeIndex, kind: NodeKind, primer: VertexIndex) -> (NodeIndex, DelayRequest) {
        let node = self.add_node(kind, primer);
        let weight = self.nodes[parent].radius / 2;
        self.link(parent, node, weight);
        (
            node,
            DelayRequest {
                node,
                edge: weight,
                parent,
            },
        )
    }

    /// connect the trees of `node_a` (the growing side) and `node_b` (the reached side); the child tree hangs below
    /// the parent tree, through a junction primed at `junction_primer` when the radii demand it
    pub fn join(
        &mut self,
        node_a: NodeIndex,
        node_b: NodeIndex,
        a_is_parent: bool,
        junction_primer: VertexIndex,
    ) -> (DelayRequest, Option<NodeIndex>) {
        let (parent, child) = if a_is_parent { (node_a, node_b) } else { (node_b, node_a) };
        let parent_radius = self.nodes[parent].radius;
        let child_radius = self.nodes[child].radius;
        if self.nodes[node_a].radius % 2 == 0 && self.nodes[node_b].radius > 1 {
            let junction = self.add_node(NodeKind::Junction, junction_primer);
            let parent_edge = parent_radius / 2;
            let child_edge = child_radius / 2;
            self.link(parent, junction, parent_edge);
            self.link(junction, child, child_edge);
            let request = DelayRequest {
                node: junction,
                edge: parent_edge,
                parent,
            };
            (request, Some(junction))
        } else {
            let weight = (parent_radius + child_radius) / 2;
            self.link(parent, child, weight);
            let request = DelayRequest {
                node: child,
                edge: weight,
                parent,
            };
            (request, None)
        }
    }

    /// bottom-up parity of the subtree at `node`, seen from `parent`
    pub fn ns_parity(&mut self, node: NodeIndex, parent: Option<NodeIndex>) -> usize {
        let mut stack = std::mem::take(&mut self.traverse_stack);
        stack.push((node, parent, false));
        while let Some((current, parent, expanded)) = stack.pop() {
            if !expanded {
                stack.push((current, parent, true));
                for &(child, _) in self.nodes[current].neighbors.iter() {
                    if Some(child) != parent {
                        stack.push((child, Some(current), false));
                    }
                }
            } else {
                let even_children = self.nodes[current]
                    .neighbors
                    .iter()
                    .filter(|&&(child, _)| Some(child) != parent && self.nodes[child].parity == 0)
                    .count();
                let node = &mut self.nodes[current];
                node.parity = node.kind.parity(even_children);
            }
        }
        self.traverse_stack = stack;
        self.nodes[node].parity
    }

    /// top-down delays of the subtree at `node`, returning the minimum delay in it
    pub fn ns_delay(&mut self, node: NodeIndex, parent: NodeIndex, edge: isize) -> isize {
        let mut min_delay = isize::MAX;
        let mut stack = std::mem::take(&mut self.traverse_stack);
        stack.push((node, Some(parent), false));
        let mut edge_to_parent = edge;
        while let Some((current, parent, _)) = stack.pop() {
            if let Some(parent) = parent {
                if current != node {
                    edge_to_parent = self.nodes[current]
                        .neighbors
                        .iter()
                        .find(|&&(peer, _)| peer == parent)
                        .map(|&(_, weight)| weight)
                        .unwrap_or(0);
                }
                let parent_node = &self.nodes[parent];
                let (parent_delay, parent_radius) = (parent_node.delay, parent_node.radius);
                let current_node = &mut self.nodes[current];
                // even nodes are scheduled earlier by the edge weight, odd nodes later
                let sign = if current_node.parity == 0 { 1 } else { -1 };
                current_node.delay =
                    parent_delay + (current_node.radius - parent_radius).div_euclid(2) - sign * edge_to_parent;
            }
            let current_node = &mut self.nodes[current];
            current_node.waited = 0;
            current_node.root_list.clear();
            min_delay = min_delay.min(current_node.delay);
            for &(child, _) in self.nodes[current].neighbors.iter() {
                if Some(child) != parent {
                    stack.push((child, Some(current), false));
                }
            }
        }
        self.traverse_stack = stack;
        min_delay
    }

    /// all nodes of the tree rooted at `root` in pre-order, together with their parents
    pub fn tree_nodes(&self, root: NodeIndex) -> Vec<(NodeIndex, Option<NodeIndex>)> {
        let mut order = Vec::new();
        let mut stack = vec![(root, None)];
        while let Some((current, parent)) = stack.pop() {
            order.push((current, parent));
            for &(child, _) in self.nodes[current].neighbors.iter().rev() {
                if Some(child) != parent {
                    stack.push((child, Some(current)));
                }
            }
        }
        order
    }

    pub fn min_delay(&self, root: NodeIndex) -> isize {
        self.tree_nodes(root)
            .iter()
            .map(|&(node_index, _)| self.nodes[node_index].delay)
            .min()
            .unwrap_or(0)
    }

    /// nodes allowed to grow in this round; every other node waits one more round.
    /// `<=` selects the same nodes as `==` unless a delay recomputation raised `min_delay` above a node that was
    /// already waiting, in which case that node grows instead of being skipped forever
    pub fn select_growing(&mut self, root: NodeIndex, min_delay: isize) -> Vec<NodeIndex> {
        let mut growing = Vec::new();
        for (node_index, _) in self.tree_nodes(root) {
            let node = &mut self.nodes[node_index];
            if node.delay - node.waited <= min_delay {
                growing.push(node_index);
            } else {
                node.waited += 1;
            }
        }
        growing
    }

    /// whether any node of the tree still has something to grow
    pub fn has_boundary(&self, root: NodeIndex) -> bool {
        self.tree_nodes(root)
            .iter()
            .any(|&(node_index, _)| !self.nodes[node_index].new_bound.is_empty())
    }
}
