//! Cluster
//!
//! The payload of a union-find set during decoding: a connected region of the decoding graph grown from defects.
//!

use super::union_find::*;
use super::util::*;
use crate::derivative::Derivative;

/// a growth front entry: `inner` belongs to the cluster, `outer` is reached through `edge`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryEntry {
    pub inner: VertexIndex,
    pub edge: EdgeIndex,
    pub outer: VertexIndex,
}

impl BoundaryEntry {
    pub fn new(inner: VertexIndex, edge: EdgeIndex, outer: VertexIndex) -> Self {
        Self { inner, edge, outer }
    }
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Cluster {
    /// the index of this cluster in the current round, also its key in the union-find forest
    pub index: ClusterIndex,
    /// the round in which this cluster was created
    pub instance: FastClearTimestamp,
    /// number of real vertices absorbed
    pub size: usize,
    /// number of defect vertices absorbed, only its parity is meaningful
    pub parity: usize,
    /// growth-stage parity, toggled on every growth
    pub support: usize,
    /// the scheduled bucket, `None` if not schedulable or retired
    pub bucket: Option<usize>,
    /// the growth front being processed
    #[derivative(Debug = "ignore")]
    pub bound: Vec<BoundaryEntry>,
    /// the growth front discovered by the last growth
    #[derivative(Debug = "ignore")]
    pub new_bound: Vec<BoundaryEntry>,
    /// whether a virtual vertex has been absorbed
    pub on_bound: bool,
    /// the root of the node-suspension tree
    pub root_node: Option<NodeIndex>,
    /// minimum node delay in the node-suspension tree
    pub min_delay: isize,
    /// all vertices absorbed by this set, in absorption order
    #[derivative(Debug = "ignore")]
    pub vertices: Vec<VertexIndex>,
}

impl Cluster {
    pub fn new(index: ClusterIndex, instance: FastClearTimestamp) -> Self {
        Self {
            index,
            instance,
            size: 0,
            parity: 0,
            support: 0,
            bucket: None,
            bound: Vec::new(),
            new_bound: Vec::new(),
            on_bound: false,
            root_node: None,
            min_delay: 0,
            vertices: Vec::new(),
        }
    }

    #[inline]
    pub fn is_odd(&self) -> bool {
        self.parity % 2 == 1
    }

    /// a cluster grows only when it has an odd number of defects and hasn't reached a boundary
    #[inline]
    pub fn is_schedulable(&self) -> bool {
        self.is_odd() && !self.on_bound
    }
}

impl UnionNodeTrait for Cluster {
    #[inline]
    fn prefer_left(left: &Self, right: &Self) -> bool {
        left.size >= right.size
    }

    fn merge(parent: &mut Self, child: &mut Self) {
        debug_assert_eq!(parent.instance, child.instance, "clusters from different rounds");
        parent.size += child.size;
        parent.parity += child.parity;
        parent.bound.append(&mut child.bound);
        parent.new_bound.append(&mut child.new_bound);
        parent.on_bound |= child.on_bound;
        parent.min_delay = parent.min_delay.min(child.min_delay);
        parent.vertices.append(&mut child.vertices);
        child.bucket = None;
    }
}

impl std::fmt::Display for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let separator = if self.on_bound { "|" } else { ":" };
        write!(f, "C{}({}{}{})", self.index, self.size, separator, self.parity)
    }
}
