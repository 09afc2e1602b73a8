//! Union-Find Decoder
//!
//! Clusters are discovered from the defect vertices, grown bucket by bucket with half-edge growth, merged when a
//! fully grown edge connects them and finally peeled from the leaves inward to produce a correction.
//!
//! All per-round fields of vertices and edges are reset lazily with [`FastClear`] timestamps, so a new round starts
//! in O(1) time regardless of the lattice size. Clusters and suspension nodes live in arenas that are simply truncated.
//!
//! With `node_suspension` enabled the flat cluster boundary is replaced by a tree of nodes (see [`crate::node_suspension`])
//! so that parts of a cluster grow at different paces (balanced bloom).
//!

use super::cluster::*;
use super::node_suspension::*;
use super::union_find::*;
use super::util::*;
use super::visualize::*;
use crate::derivative::Derivative;
use crate::priority_queue::PriorityQueue;
use crate::serde::{Deserialize, Serialize};
use std::cmp::Reverse;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecoderConfig {
    /// bucket of a cluster is `2 * (size - 1) + support`; otherwise every odd cluster grows in every bucket
    #[serde(default = "decoder_default_configs::weighted_growth")]
    pub weighted_growth: bool,
    /// the larger cluster becomes the root on union; otherwise the growing cluster does
    #[serde(default = "decoder_default_configs::weighted_union")]
    pub weighted_union: bool,
    /// cut cycles as soon as they appear; otherwise a spanning forest is built right before peeling
    #[serde(default = "decoder_default_configs::dynamic_forest")]
    pub dynamic_forest: bool,
    /// merge the most connected pairs of a bucket first
    #[serde(default = "decoder_default_configs::degenerate_fusion")]
    pub degenerate_fusion: bool,
    /// balanced bloom: grow clusters through a delay-scheduled node tree
    #[serde(default = "decoder_default_configs::node_suspension")]
    pub node_suspension: bool,
    /// the number of buckets; clusters scheduled beyond it are retired, by default `8 * vertex_num`
    #[serde(default = "decoder_default_configs::bucket_num")]
    pub bucket_num: Option<usize>,
    /// print every decision
    #[serde(default = "decoder_default_configs::print_steps")]
    pub print_steps: bool,
    /// take a visualizer snapshot after each bucket
    #[serde(default = "decoder_default_configs::step_bucket")]
    pub step_bucket: bool,
    /// take a visualizer snapshot after each cluster growth
    #[serde(default = "decoder_default_configs::step_cluster")]
    pub step_cluster: bool,
    /// take a visualizer snapshot after each peeled edge
    #[serde(default = "decoder_default_configs::step_peel")]
    pub step_peel: bool,
}

pub mod decoder_default_configs {
    pub fn weighted_growth() -> bool { true }
    pub fn weighted_union() -> bool { true }
    pub fn dynamic_forest() -> bool { true }
    pub fn degenerate_fusion() -> bool { false }
    pub fn node_suspension() -> bool { false }
    pub fn bucket_num() -> Option<usize> { None }  // derived from the number of vertices
    pub fn print_steps() -> bool { false }
    pub fn step_bucket() -> bool { false }
    pub fn step_cluster() -> bool { false }
    pub fn step_peel() -> bool { false }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            weighted_growth: decoder_default_configs::weighted_growth(),
            weighted_union: decoder_default_configs::weighted_union(),
            dynamic_forest: decoder_default_configs::dynamic_forest(),
            degenerate_fusion: decoder_default_configs::degenerate_fusion(),
            node_suspension: decoder_default_configs::node_suspension(),
            bucket_num: decoder_default_configs::bucket_num(),
            print_steps: decoder_default_configs::print_steps(),
            step_bucket: decoder_default_configs::step_bucket(),
            step_cluster: decoder_default_configs::step_cluster(),
            step_peel: decoder_default_configs::step_peel(),
        }
    }
}

impl DecoderConfig {
    pub fn node_suspension() -> Self {
        Self {
            node_suspension: true,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub enum DecoderError {
    /// a fully grown edge is left in a cluster after peeling, i.e. the cluster was not a tree
    PeelingInvariant {
        edge_index: EdgeIndex,
        cluster: ClusterIndex,
    },
    /// failed to write a visualizer snapshot
    Visualizer(std::io::Error),
}

impl std::fmt::Display for DecoderError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::PeelingInvariant { edge_index, cluster } => write!(
                f,
                "peeling invariant violated: edge {} remains fully grown in cluster {} after peeling",
                edge_index, cluster
            ),
            Self::Visualizer(error) => write!(f, "visualizer error: {}", error),
        }
    }
}

impl std::error::Error for DecoderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Visualizer(error) => Some(error),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DecoderError {
    fn from(error: std::io::Error) -> Self {
        Self::Visualizer(error)
    }
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Vertex {
    /// the index of this vertex in the decoding graph
    pub vertex_index: VertexIndex,
    /// a virtual vertex is a boundary pseudo-ancilla: never a defect, it terminates the cluster that absorbs it
    pub is_virtual: bool,
    /// (peer, edge) pairs in the order of the edge list
    #[derivative(Debug = "ignore")]
    pub neighbors: Vec<(VertexIndex, EdgeIndex)>,
    /// current syndrome, flipped while peeling
    pub is_defect: bool,
    /// the cluster that absorbed this vertex, not necessarily a root
    pub cluster: Option<ClusterIndex>,
    /// the suspension node owning the boundary of this vertex
    pub node: Option<NodeIndex>,
    /// number of union candidates touching this vertex in the current bucket
    pub fusion_degree: usize,
    /// visited by the static forest construction
    pub forest_visited: bool,
    /// for fast clear
    pub timestamp: FastClearTimestamp,
}

impl FastClear for Vertex {
    fn hard_clear(&mut self) {
        self.is_defect = false;
        self.cluster = None;
        self.node = None;
        self.fusion_degree = 0;
        self.forest_visited = false;
    }

    #[inline(always)]
    fn get_timestamp(&self) -> FastClearTimestamp {
        self.timestamp
    }
    #[inline(always)]
    fn set_timestamp(&mut self, timestamp: FastClearTimestamp) {
        self.timestamp = timestamp;
    }
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Edge {
    /// the index of this edge in the decoding graph
    pub edge_index: EdgeIndex,
    pub vertices: (VertexIndex, VertexIndex),
    /// erased edges are absorbed without growth
    pub is_erasure: bool,
    /// 0: ungrown, 1: half grown, 2: fully grown
    pub support: usize,
    /// part of the correction
    pub matching: bool,
    /// removed from the spanning forest, either by peeling or by cutting a cycle
    pub peeled: bool,
    /// tree edge of the static forest
    pub forest: bool,
    /// for fast clear
    pub timestamp: FastClearTimestamp,
}

impl FastClear for Edge {
    fn hard_clear(&mut self) {
        self.is_erasure = false;
        self.support = 0;
        self.matching = false;
        self.peeled = false;
        self.forest = false;
    }

    #[inline(always)]
    fn get_timestamp(&self) -> FastClearTimestamp {
        self.timestamp
    }
    #[inline(always)]
    fn set_timestamp(&mut self, timestamp: FastClearTimestamp) {
        self.timestamp = timestamp;
    }
}

/// counters of a single decoding round
#[derive(Debug, Clone, Default, Serialize)]
pub struct DecoderProfile {
    pub cluster_count: usize,
    pub bucket_iterations: usize,
    pub growth_count: usize,
    pub absorb_count: usize,
    pub cut_count: usize,
    pub union_count: usize,
    pub wastebasket_count: usize,
    pub max_bucket: usize,
    pub peel_count: usize,
}

/// how a fully grown edge is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FusionChoice {
    /// the outer vertex is not in any cluster yet
    Absorb(ClusterIndex),
    /// both sides are already in the same cluster
    Cycle(ClusterIndex),
    /// the cluster already reached a boundary and would reach another one
    BoundaryCut(ClusterIndex),
    Union(ClusterIndex, ClusterIndex),
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct UnionFindDecoder {
    pub config: DecoderConfig,
    /// all vertices including virtual ones
    #[derivative(Debug = "ignore")]
    pub vertices: Vec<Vertex>,
    #[derivative(Debug = "ignore")]
    pub edges: Vec<Edge>,
    /// current timestamp
    pub active_timestamp: FastClearTimestamp,
    /// clusters of the current round
    pub clusters: UnionFindGeneric<Cluster>,
    /// suspension nodes of the current round
    #[derivative(Debug = "ignore")]
    pub forest: NodeForest,
    /// the number of buckets
    pub bucket_num: usize,
    #[derivative(Debug = "ignore")]
    buckets: Vec<Vec<ClusterIndex>>,
    /// the highest bucket a cluster was placed in
    pub bucket_max_filled: usize,
    /// retired clusters that stopped growing while still odd
    pub wastebasket: Vec<ClusterIndex>,
    /// defect vertices of the current round, sorted
    defect_vertices: Vec<VertexIndex>,
    /// every edge that reached full support this round
    #[derivative(Debug = "ignore")]
    fully_grown: Vec<EdgeIndex>,
    /// the correction
    matching_edges: Vec<EdgeIndex>,
    /// defects that no peeling could cancel
    unresolved: Vec<VertexIndex>,
    /// boundary entries waiting to be handed to suspension nodes
    #[derivative(Debug = "ignore")]
    pending_boundaries: Vec<BoundaryEntry>,
    /// temporary variable to reduce reallocation
    #[derivative(Debug = "ignore")]
    expand_stack: Vec<(VertexIndex, VertexIndex)>,
    pub profile: DecoderProfile,
}

impl Clone for UnionFindDecoder {
    fn clone(&self) -> Self {
        Self::new(&self.initializer(), self.config.clone()) // create independent instances of the decoder
    }
}

#[allow(clippy::unnecessary_cast)]
impl UnionFindDecoder {
    /// create a new decoder; panics on malformed graphs
    pub fn new(initializer: &SolverInitializer, config: DecoderConfig) -> Self {
        if let Err(message) = initializer.sanity_check() {
            panic!("invalid decoding graph: {}", message);
        }
        let active_timestamp = 0;
        let mut vertices: Vec<Vertex> = (0..initializer.vertex_num)
            .map(|vertex_index| Vertex {
                vertex_index,
                is_virtual: false,
                neighbors: Vec::new(),
                is_defect: false,
                cluster: None,
                node: None,
                fusion_degree: 0,
                forest_visited: false,
                timestamp: active_timestamp,
            })
            .collect();
        for &virtual_vertex in initializer.virtual_vertices.iter() {
            vertices[virtual_vertex as usize].is_virtual = true;
        }
        let mut edges = Vec::with_capacity(initializer.edges.len());
        for (edge_index, &(left, right)) in initializer.edges.iter().enumerate() {
            let edge_index = edge_index as EdgeIndex;
            vertices[left as usize].neighbors.push((right, edge_index));
            vertices[right as usize].neighbors.push((left, edge_index));
            edges.push(Edge {
                edge_index,
                vertices: (left, right),
                is_erasure: false,
                support: 0,
                matching: false,
                peeled: false,
                forest: false,
                timestamp: active_timestamp,
            });
        }
        let bucket_num = config.bucket_num.unwrap_or(8 * initializer.vertex_num as usize).max(1);
        Self {
            config,
            vertices,
            edges,
            active_timestamp,
            clusters: UnionFindGeneric::new(),
            forest: NodeForest::new(),
            bucket_num,
            buckets: Vec::new(),
            bucket_max_filled: 0,
            wastebasket: Vec::new(),
            defect_vertices: Vec::new(),
            fully_grown: Vec::new(),
            matching_edges: Vec::new(),
            unresolved: Vec::new(),
            pending_boundaries: Vec::new(),
            expand_stack: Vec::new(),
            profile: DecoderProfile::default(),
        }
    }

    /// the decoding graph this decoder was built from
    pub fn initializer(&self) -> SolverInitializer {
        SolverInitializer::new(
            self.vertices.len() as VertexNum,
            self.edges.iter().map(|edge| edge.vertices).collect(),
            self.vertices
                .iter()
                .filter(|vertex| vertex.is_virtual)
                .map(|vertex| vertex.vertex_index)
                .collect(),
        )
    }

    /// reset all vertices and edges, only needed when the timestamp overflows
    pub fn hard_clear_graph(&mut self) {
        for vertex in self.vertices.iter_mut() {
            vertex.hard_clear();
            vertex.timestamp = 0;
        }
        for edge in self.edges.iter_mut() {
            edge.hard_clear();
            edge.timestamp = 0;
        }
        self.active_timestamp = 0;
    }

    /// start a new round in constant time: stale vertex and edge fields are cleared on first access
    pub fn clear(&mut self) {
        if self.active_timestamp == FastClearTimestamp::MAX {
            // rarely happens
            self.hard_clear_graph();
        }
        self.active_timestamp += 1;
        self.clusters.clear();
        self.forest.clear();
        for bucket in self.buckets.iter_mut() {
            bucket.clear();
        }
        self.bucket_max_filled = 0;
        self.wastebasket.clear();
        self.defect_vertices.clear();
        self.fully_grown.clear();
        self.matching_edges.clear();
        self.unresolved.clear();
        self.pending_boundaries.clear();
        self.profile = DecoderProfile::default();
    }

    pub fn decode(&mut self, syndrome_pattern: &SyndromePattern) -> Result<(), DecoderError> {
        self.decode_visualizer(syndrome_pattern, None)
    }

    /// decode a syndrome; the correction is available from [`Self::subgraph`] afterwards
    pub fn decode_visualizer(
        &mut self,
        syndrome_pattern: &SyndromePattern,
        mut visualizer: Option<&mut Visualizer>,
    ) -> Result<(), DecoderError> {
        self.clear();
        self.load(syndrome_pattern);
        self.find_clusters();
        self.take_snapshot(&mut visualizer, || "clusters found".to_string())?;
        self.grow_clusters(&mut visualizer)?;
        self.take_snapshot(&mut visualizer, || "grown".to_string())?;
        self.peel_clusters(&mut visualizer)?;
        self.take_snapshot(&mut visualizer, || "peeled".to_string())?;
        Ok(())
    }

    /// the correction of the last round, sorted by edge index
    pub fn subgraph(&self) -> Vec<EdgeIndex> {
        let mut subgraph = self.matching_edges.clone();
        subgraph.sort_unstable();
        subgraph
    }

    /// defects left after peeling, e.g. an isolated defect on a closed lattice; empty on success
    pub fn unresolved_defects(&self) -> &[VertexIndex] {
        &self.unresolved
    }

    fn load(&mut self, syndrome_pattern: &SyndromePattern) {
        for &vertex_index in syndrome_pattern.defect_vertices.iter() {
            assert!(
                (vertex_index as usize) < self.vertices.len(),
                "invalid defect vertex {}",
                vertex_index
            );
            let vertex = self.vertex_mut(vertex_index);
            assert!(!vertex.is_virtual, "virtual vertex {} cannot be a defect", vertex_index);
            assert!(!vertex.is_defect, "duplicate defect vertex {}", vertex_index);
            vertex.is_defect = true;
            self.defect_vertices.push(vertex_index);
        }
        self.defect_vertices.sort_unstable();
        for &edge_index in syndrome_pattern.erasures.iter() {
            assert!((edge_index as usize) < self.edges.len(), "invalid erasure edge {}", edge_index);
            self.edge_mut(edge_index).is_erasure = true;
        }
    }

    #[inline]
    fn vertex_mut(&mut self, vertex_index: VertexIndex) -> &mut Vertex {
        let vertex = &mut self.vertices[vertex_index as usize];
        vertex.dynamic_clear(self.active_timestamp);
        vertex
    }

    #[inline]
    fn edge_mut(&mut self, edge_index: EdgeIndex) -> &mut Edge {
        let edge = &mut self.edges[edge_index as usize];
        edge.dynamic_clear(self.active_timestamp);
        edge
    }

    #[inline]
    fn is_virtual(&self, vertex_index: VertexIndex) -> bool {
        self.vertices[vertex_index as usize].is_virtual
    }

    /// the root of the cluster a vertex belongs to in the current round
    pub fn get_cluster(&mut self, vertex_index: VertexIndex) -> Option<ClusterIndex> {
        let vertex = &self.vertices[vertex_index as usize];
        if !vertex.is_live(self.active_timestamp) {
            return None;
        }
        let root = self.clusters.find(vertex.cluster?);
        debug_assert_eq!(self.clusters.payload[root].instance, self.active_timestamp);
        self.vertices[vertex_index as usize].cluster = Some(root);
        Some(root)
    }

    /// the same as [`Self::get_cluster`] without path compression
    pub fn live_cluster(&self, vertex_index: VertexIndex) -> Option<ClusterIndex> {
        let vertex = &self.vertices[vertex_index as usize];
        if !vertex.is_live(self.active_timestamp) {
            return None;
        }
        vertex.cluster.map(|cluster| self.clusters.immutable_find(cluster))
    }

    /// the vertex's suspension node, which exists whenever the vertex is in a cluster
    fn vertex_node(&self, vertex_index: VertexIndex) -> NodeIndex {
        let vertex = &self.vertices[vertex_index as usize];
        debug_assert!(vertex.is_live(self.active_timestamp));
        vertex.node.expect("vertex in a cluster must own a suspension node")
    }

    fn take_snapshot<F: FnOnce() -> String>(
        &self,
        visualizer: &mut Option<&mut Visualizer>,
        name: F,
    ) -> Result<(), DecoderError> {
        if let Some(visualizer) = visualizer.as_mut() {
            visualizer.snapshot(name(), self)?;
        }
        Ok(())
    }

    /*
     * cluster discovery
     */

    /// create a singleton cluster for every defect not yet covered, then schedule them
    fn find_clusters(&mut self) {
        for defect_index in 0..self.defect_vertices.len() {
            let vertex_index = self.defect_vertices[defect_index];
            if self.get_cluster(vertex_index).is_some() {
                continue; // already absorbed through an erasure
            }
            let index = self.clusters.size();
            let key = self.clusters.insert(Cluster::new(index, self.active_timestamp));
            if self.config.node_suspension {
                let node = self.forest.add_node(NodeKind::Syndrome, vertex_index);
                self.clusters.payload[key].root_node = Some(node);
                self.vertex_mut(vertex_index).node = Some(node);
            }
            self.cluster_add_vertex(key, vertex_index, None);
            self.profile.cluster_count += 1;
            if self.config.print_steps {
                println!("found {} at vertex {}", self.clusters.payload[key], vertex_index);
            }
        }
        self.flush_pending_boundaries();
        for key in 0..self.clusters.size() {
            if self.clusters.is_root(key) {
                self.place_cluster(key, None);
            }
        }
    }

    /// absorb a single vertex into the cluster rooted at `root`
    fn absorb_vertex(&mut self, root: ClusterIndex, vertex_index: VertexIndex) {
        let vertex = self.vertex_mut(vertex_index);
        debug_assert!(vertex.cluster.is_none(), "vertex {} absorbed twice", vertex_index);
        vertex.cluster = Some(root);
        let (is_virtual, is_defect) = (vertex.is_virtual, vertex.is_defect);
        let cluster = &mut self.clusters.payload[root];
        cluster.vertices.push(vertex_index);
        if is_virtual {
            cluster.on_bound = true;
        } else {
            cluster.size += 1;
            if is_defect {
                cluster.parity += 1;
            }
        }
    }

    fn full_edge(&mut self, edge_index: EdgeIndex) {
        self.edge_mut(edge_index).support = 2;
        self.fully_grown.push(edge_index);
    }

    /// remove an edge from the spanning forest
    fn cut_edge(&mut self, edge_index: EdgeIndex) {
        let edge = self.edge_mut(edge_index);
        edge.support = 0;
        edge.peeled = true;
        self.profile.cut_count += 1;
        if self.config.print_steps {
            println!("cut edge {}", edge_index);
        }
    }

    fn push_boundary(&mut self, root: ClusterIndex, entry: BoundaryEntry) {
        if self.config.node_suspension {
            self.pending_boundaries.push(entry);
        } else {
            self.clusters.payload[root].new_bound.push(entry);
        }
    }

    /// hand boundary entries discovered since the last flush to the node owning their inner vertex
    fn flush_pending_boundaries(&mut self) {
        if !self.config.node_suspension {
            return;
        }
        let mut pending = std::mem::take(&mut self.pending_boundaries);
        for entry in pending.drain(..) {
            let node = self.vertex_node(entry.inner);
            self.forest.nodes[node].new_bound.push(entry);
        }
        self.pending_boundaries = pending;
    }

    /// give a vertex reached from `via` its suspension node: a fresh node of `kind` hanging below the node of `via`,
    /// or the node of `via` itself
    fn assign_node(&mut self, root: ClusterIndex, vertex_index: VertexIndex, via: VertexIndex, kind: Option<NodeKind>) {
        if !self.config.node_suspension {
            return;
        }
        let parent_node = self.vertex_node(via);
        let node = match kind {
            Some(kind) => {
                let (node, request) = self.forest.attach(parent_node, kind, vertex_index);
                let root_node = self.clusters.payload[root]
                    .root_node
                    .expect("cluster must have a node tree");
                self.forest.nodes[root_node].root_list.push(request);
                node
            }
            None => parent_node,
        };
        self.vertex_mut(vertex_index).node = Some(node);
    }

    /// whether an erased edge other than `through` may still be absorbed from this vertex
    fn has_erasure_frontier(&self, vertex_index: VertexIndex, through: EdgeIndex) -> bool {
        self.vertices[vertex_index as usize]
            .neighbors
            .iter()
            .any(|&(_, edge_index)| {
                let edge = &self.edges[edge_index as usize];
                edge_index != through
                    && edge.is_live(self.active_timestamp)
                    && edge.is_erasure
                    && edge.support < 2
                    && !edge.peeled
            })
    }

    /// absorb `start` (reached from `parent`) and everything connected to it through erased edges, registering the
    /// rest of its neighborhood as the cluster's growth front
    fn cluster_add_vertex(&mut self, root: ClusterIndex, start: VertexIndex, parent: Option<VertexIndex>) {
        self.absorb_vertex(root, start);
        let mut stack = std::mem::take(&mut self.expand_stack);
        stack.push((start, parent.unwrap_or(start)));
        while let Some((vertex_index, parent)) = stack.pop() {
            if self.is_virtual(vertex_index) {
                continue; // a boundary never expands
            }
            for neighbor_index in 0..self.vertices[vertex_index as usize].neighbors.len() {
                let (peer, edge_index) = self.vertices[vertex_index as usize].neighbors[neighbor_index];
                if peer == parent {
                    continue;
                }
                let edge = self.edge_mut(edge_index);
                let (is_erasure, support, peeled) = (edge.is_erasure, edge.support, edge.peeled);
                let peer_cluster = self.get_cluster(peer);
                if is_erasure && support < 2 && !peeled {
                    let peer_is_virtual = self.is_virtual(peer);
                    if peer_cluster == Some(root) {
                        if self.config.dynamic_forest {
                            self.cut_edge(edge_index);
                        } else {
                            self.full_edge(edge_index);
                        }
                    } else if peer_is_virtual && self.clusters.payload[root].on_bound {
                        self.cut_edge(edge_index);
                    } else if peer_cluster.is_none() {
                        self.full_edge(edge_index);
                        let kind = if peer_is_virtual { Some(NodeKind::Boundary) } else { None };
                        self.assign_node(root, peer, vertex_index, kind);
                        self.absorb_vertex(root, peer);
                        self.profile.absorb_count += 1;
                        stack.push((peer, vertex_index));
                    } else {
                        self.push_boundary(root, BoundaryEntry::new(vertex_index, edge_index, peer));
                    }
                } else if peer_cluster != Some(root)
                    && !(self.is_virtual(peer) && self.clusters.payload[root].on_bound)
                    && !peeled
                {
                    self.push_boundary(root, BoundaryEntry::new(vertex_index, edge_index, peer));
                }
            }
        }
        self.expand_stack = stack;
    }

    /*
     * bucket scheduling
     */

    /// put a cluster root into the bucket it should grow in next, after it was grown in `current`
    fn place_cluster(&mut self, root: ClusterIndex, current: Option<usize>) -> Option<usize> {
        let has_boundary = self.cluster_has_boundary(root);
        let weighted_growth = self.config.weighted_growth;
        let cluster = &mut self.clusters.payload[root];
        if !cluster.is_schedulable() {
            cluster.bucket = None;
            return None;
        }
        let mut bucket = if weighted_growth {
            2 * (cluster.size - 1) + cluster.support
        } else {
            let bucket = current.map_or(0, |current| current + 1);
            cluster.support = bucket % 2;
            bucket
        };
        if let Some(current) = current {
            while bucket <= current {
                bucket += 2; // keep the support parity
            }
        }
        if !has_boundary || bucket >= self.bucket_num {
            cluster.bucket = None;
            if self.config.print_steps {
                println!("retire {} to wastebasket", cluster);
            }
            self.wastebasket.push(root);
            self.profile.wastebasket_count += 1;
            return None;
        }
        if cluster.bucket != Some(bucket) {
            cluster.bucket = Some(bucket);
            if bucket >= self.buckets.len() {
                self.buckets.resize_with(bucket + 1, Vec::new);
            }
            self.buckets[bucket].push(root);
            self.bucket_max_filled = self.bucket_max_filled.max(bucket);
            self.profile.max_bucket = self.profile.max_bucket.max(bucket);
        }
        Some(bucket)
    }

    fn cluster_has_boundary(&self, root: ClusterIndex) -> bool {
        let cluster = &self.clusters.payload[root];
        if self.config.node_suspension {
            match cluster.root_node {
                Some(root_node) => self.forest.has_boundary(root_node),
                None => false,
            }
        } else {
            !cluster.new_bound.is_empty()
        }
    }

    fn grow_clusters(&mut self, visualizer: &mut Option<&mut Visualizer>) -> Result<(), DecoderError> {
        let mut bucket_index = 0;
        while bucket_index <= self.bucket_max_filled {
            self.process_bucket(bucket_index, visualizer)?;
            bucket_index += 1;
        }
        Ok(())
    }

    /// grow every cluster scheduled in this bucket, resolve the fusions and re-schedule the grown clusters;
    /// returns the roots that were re-scheduled
    fn process_bucket(
        &mut self,
        bucket_index: usize,
        visualizer: &mut Option<&mut Visualizer>,
    ) -> Result<Vec<ClusterIndex>, DecoderError> {
        if bucket_index >= self.buckets.len() || self.buckets[bucket_index].is_empty() {
            return Ok(vec![]);
        }
        self.profile.bucket_iterations += 1;
        let bucket = std::mem::take(&mut self.buckets[bucket_index]);
        let mut fusion = Vec::new();
        let mut grown = Vec::new();
        for &cluster_index in bucket.iter() {
            let root = self.clusters.find(cluster_index);
            let cluster = &self.clusters.payload[root];
            // stale entries: re-scheduled by a fusion or already grown in this bucket
            if cluster.bucket != Some(bucket_index) || cluster.support != bucket_index % 2 {
                continue;
            }
            if self.config.print_steps {
                println!("bucket {}: grow {}", bucket_index, cluster);
            }
            if self.config.node_suspension {
                self.grow_node_tree(root, &mut fusion);
            } else {
                self.grow_cluster(root, &mut fusion);
            }
            self.profile.growth_count += 1;
            grown.push(root);
            if self.config.step_cluster {
                self.take_snapshot(visualizer, || format!("bucket {} grow cluster {}", bucket_index, root))?;
            }
        }
        self.fuse(fusion);
        self.flush_pending_boundaries();
        let mut placed = Vec::with_capacity(grown.len());
        for cluster_index in grown {
            let root = self.clusters.find(cluster_index);
            if !placed.contains(&root) {
                self.place_cluster(root, Some(bucket_index));
                placed.push(root);
            }
        }
        if self.config.step_bucket {
            self.take_snapshot(visualizer, || format!("bucket {}", bucket_index))?;
        }
        Ok(placed)
    }

    /// half-edge growth of a whole cluster boundary
    fn grow_cluster(&mut self, root: ClusterIndex, fusion: &mut Vec<BoundaryEntry>) {
        let cluster = &mut self.clusters.payload[root];
        cluster.support = 1 - cluster.support;
        std::mem::swap(&mut cluster.bound, &mut cluster.new_bound);
        cluster.new_bound.clear();
        grow_front(
            &mut self.edges,
            self.active_timestamp,
            &mut cluster.bound,
            &mut cluster.new_bound,
            fusion,
            &mut self.fully_grown,
        );
    }

    /// refresh the pending delays of the node tree and grow the nodes that are furthest behind
    fn grow_node_tree(&mut self, root: ClusterIndex, fusion: &mut Vec<BoundaryEntry>) {
        let cluster = &mut self.clusters.payload[root];
        cluster.support = 1 - cluster.support;
        let root_node = cluster.root_node.expect("cluster must have a node tree");
        let requests = std::mem::take(&mut self.forest.nodes[root_node].root_list);
        if !requests.is_empty() {
            self.forest.ns_parity(root_node, None);
            for request in requests.iter() {
                self.forest.ns_delay(request.node, request.parent, request.edge);
            }
            self.clusters.payload[root].min_delay = self.forest.min_delay(root_node);
        }
        let min_delay = self.clusters.payload[root].min_delay;
        for node_index in self.forest.select_growing(root_node, min_delay) {
            let node = &mut self.forest.nodes[node_index];
            node.radius += 1;
            std::mem::swap(&mut node.old_bound, &mut node.new_bound);
            node.new_bound.clear();
            grow_front(
                &mut self.edges,
                self.active_timestamp,
                &mut node.old_bound,
                &mut node.new_bound,
                fusion,
                &mut self.fully_grown,
            );
        }
    }

    /*
     * fusion
     */

    fn fusion_choice(&mut self, entry: &BoundaryEntry) -> FusionChoice {
        let cluster_a = self
            .get_cluster(entry.inner)
            .expect("a growing vertex must belong to a live cluster");
        let cluster_b = self.get_cluster(entry.outer);
        if cluster_b == Some(cluster_a) {
            return FusionChoice::Cycle(cluster_a);
        }
        if self.clusters.payload[cluster_a].on_bound
            && (self.is_virtual(entry.outer) || cluster_b.map_or(false, |b| self.clusters.payload[b].on_bound))
        {
            return FusionChoice::BoundaryCut(cluster_a);
        }
        match cluster_b {
            None => FusionChoice::Absorb(cluster_a),
            Some(cluster_b) => FusionChoice::Union(cluster_a, cluster_b),
        }
    }

    fn fuse(&mut self, fusion: Vec<BoundaryEntry>) {
        if self.config.degenerate_fusion {
            self.fuse_degenerate(fusion);
        } else {
            for entry in fusion.iter() {
                self.fuse_edge(entry);
            }
        }
    }

    /// absorptions and cuts first, then unions in decreasing order of how many unions their endpoints take part in
    fn fuse_degenerate(&mut self, fusion: Vec<BoundaryEntry>) {
        let mut candidates = Vec::new();
        for entry in fusion.into_iter() {
            match self.fusion_choice(&entry) {
                FusionChoice::Union(..) => candidates.push(entry),
                _ => self.fuse_edge(&entry),
            }
        }
        for entry in candidates.iter() {
            self.vertex_mut(entry.inner).fusion_degree = 0;
            self.vertex_mut(entry.outer).fusion_degree = 0;
        }
        for entry in candidates.iter() {
            self.vertex_mut(entry.inner).fusion_degree += 1;
            self.vertex_mut(entry.outer).fusion_degree += 1;
        }
        let mut queue = PriorityQueue::with_capacity(candidates.len());
        for (order, entry) in candidates.iter().enumerate() {
            let degree =
                self.vertices[entry.inner as usize].fusion_degree + self.vertices[entry.outer as usize].fusion_degree;
            queue.push(order, (degree, Reverse(order)));
        }
        while let Some((order, _)) = queue.pop() {
            self.fuse_edge(&candidates[order]);
        }
    }

    fn fuse_edge(&mut self, entry: &BoundaryEntry) {
        match self.fusion_choice(entry) {
            FusionChoice::Absorb(cluster_a) => {
                if self.config.print_steps {
                    println!("absorb vertex {} into {}", entry.outer, self.clusters.payload[cluster_a]);
                }
                let kind = if self.is_virtual(entry.outer) {
                    Some(NodeKind::Boundary)
                } else if self.has_erasure_frontier(entry.outer, entry.edge) {
                    Some(NodeKind::Filler)
                } else {
                    None
                };
                self.assign_node(cluster_a, entry.outer, entry.inner, kind);
                self.cluster_add_vertex(cluster_a, entry.outer, Some(entry.inner));
                self.profile.absorb_count += 1;
            }
            FusionChoice::Cycle(cluster_a) => {
                if self.config.print_steps {
                    println!("edge {} closes a cycle in {}", entry.edge, self.clusters.payload[cluster_a]);
                }
                if self.config.dynamic_forest {
                    self.cut_edge(entry.edge);
                }
            }
            FusionChoice::BoundaryCut(cluster_a) => {
                if self.config.print_steps {
                    println!("edge {} reaches a second boundary of {}", entry.edge, self.clusters.payload[cluster_a]);
                }
                self.cut_edge(entry.edge);
            }
            FusionChoice::Union(cluster_a, cluster_b) => {
                self.union_clusters(cluster_a, cluster_b, entry);
            }
        }
    }

    fn union_clusters(&mut self, cluster_a: ClusterIndex, cluster_b: ClusterIndex, entry: &BoundaryEntry) {
        let node_join = if self.config.node_suspension {
            Some(self.join_node_trees(cluster_a, cluster_b, entry))
        } else {
            None
        };
        let merged = if self.config.weighted_union {
            self.clusters.union(cluster_a, cluster_b)
        } else {
            self.clusters.union_into(cluster_a, cluster_b)
        };
        let root = merged.expect("union of distinct clusters");
        if let Some((root_node, other_root_node, request)) = node_join {
            let mut pending = std::mem::take(&mut self.forest.nodes[other_root_node].root_list);
            let root_list = &mut self.forest.nodes[root_node].root_list;
            root_list.append(&mut pending);
            root_list.extend(request);
            self.clusters.payload[root].root_node = Some(root_node);
        }
        self.profile.union_count += 1;
        if self.config.print_steps {
            println!("union through edge {} into {}", entry.edge, self.clusters.payload[root]);
        }
    }

    /// connect the node trees of two merging clusters; an even side always hangs below the odd side, two balanced
    /// sides hang the smaller below the larger. Returns the new root node, the old root node of the other tree and
    /// the delay request if the merged cluster keeps growing
    fn join_node_trees(
        &mut self,
        cluster_a: ClusterIndex,
        cluster_b: ClusterIndex,
        entry: &BoundaryEntry,
    ) -> (NodeIndex, NodeIndex, Option<DelayRequest>) {
        let (parity_a, size_a, root_a) = {
            let cluster = &self.clusters.payload[cluster_a];
            (cluster.parity % 2, cluster.size, cluster.root_node)
        };
        let (parity_b, size_b, root_b) = {
            let cluster = &self.clusters.payload[cluster_b];
            (cluster.parity % 2, cluster.size, cluster.root_node)
        };
        let root_a = root_a.expect("cluster must have a node tree");
        let root_b = root_b.expect("cluster must have a node tree");
        let merged_odd = (parity_a + parity_b) % 2 == 1;
        let a_is_parent = if merged_odd { parity_a == 1 } else { size_a >= size_b };
        let node_a = self.vertex_node(entry.inner);
        let node_b = self.vertex_node(entry.outer);
        let (request, junction) = self.forest.join(node_a, node_b, a_is_parent, entry.outer);
        if let Some(junction) = junction {
            self.vertex_mut(entry.outer).node = Some(junction);
        }
        let (root_node, other_root_node) = if a_is_parent { (root_a, root_b) } else { (root_b, root_a) };
        (root_node, other_root_node, if merged_odd { Some(request) } else { None })
    }

    /*
     * peeling
     */

    /// depth-first spanning tree of every cluster, cutting the fully grown edges that close a cycle
    fn build_static_forest(&mut self) {
        let mut stack = Vec::new();
        for key in 0..self.clusters.size() {
            if !self.clusters.is_root(key) {
                continue;
            }
            let cluster_vertices = std::mem::take(&mut self.clusters.payload[key].vertices);
            for &start in cluster_vertices.iter() {
                if self.vertex_mut(start).forest_visited {
                    continue;
                }
                self.vertex_mut(start).forest_visited = true;
                stack.push(start);
                while let Some(vertex_index) = stack.pop() {
                    for neighbor_index in 0..self.vertices[vertex_index as usize].neighbors.len() {
                        let (peer, edge_index) = self.vertices[vertex_index as usize].neighbors[neighbor_index];
                        let edge = self.edge_mut(edge_index);
                        if edge.support != 2 || edge.peeled || edge.forest {
                            continue;
                        }
                        if self.get_cluster(peer) != Some(key) {
                            continue;
                        }
                        if self.vertex_mut(peer).forest_visited {
                            self.cut_edge(edge_index);
                        } else {
                            self.vertex_mut(peer).forest_visited = true;
                            self.edge_mut(edge_index).forest = true;
                            stack.push(peer);
                        }
                    }
                }
            }
            self.clusters.payload[key].vertices = cluster_vertices;
        }
    }

    fn peel_clusters(&mut self, visualizer: &mut Option<&mut Visualizer>) -> Result<(), DecoderError> {
        if !self.config.dynamic_forest {
            self.build_static_forest();
        }
        for key in 0..self.clusters.size() {
            if !self.clusters.is_root(key) {
                continue;
            }
            let cluster_vertices = std::mem::take(&mut self.clusters.payload[key].vertices);
            let mut result = Ok(());
            for &vertex_index in cluster_vertices.iter() {
                result = self.peel_leaf(key, vertex_index, visualizer);
                if result.is_err() {
                    break;
                }
            }
            for &vertex_index in cluster_vertices.iter() {
                let vertex = &self.vertices[vertex_index as usize];
                if !vertex.is_virtual && vertex.is_defect {
                    self.unresolved.push(vertex_index);
                }
            }
            self.clusters.payload[key].vertices = cluster_vertices;
            result?;
        }
        self.unresolved.sort_unstable();
        self.check_peeled()
    }

    /// peel pendant vertices starting from `vertex_index` and moving inward
    fn peel_leaf(
        &mut self,
        cluster: ClusterIndex,
        vertex_index: VertexIndex,
        visualizer: &mut Option<&mut Visualizer>,
    ) -> Result<(), DecoderError> {
        let mut current = vertex_index;
        while !self.is_virtual(current) {
            let (peer, edge_index) = match self.find_leaf(cluster, current) {
                Some(leaf) => leaf,
                None => break,
            };
            self.edge_mut(edge_index).peeled = true;
            self.profile.peel_count += 1;
            if self.vertex_mut(current).is_defect {
                self.edge_mut(edge_index).matching = true;
                self.vertex_mut(current).is_defect = false;
                let peer_vertex = self.vertex_mut(peer);
                peer_vertex.is_defect = !peer_vertex.is_defect;
                self.matching_edges.push(edge_index);
                if self.config.print_steps {
                    println!("peel edge {} ({} -> {}) as matching", edge_index, current, peer);
                }
            } else if self.config.print_steps {
                println!("peel edge {} ({} -> {})", edge_index, current, peer);
            }
            if self.config.step_peel {
                self.take_snapshot(visualizer, || format!("peel edge {}", edge_index))?;
            }
            current = peer;
        }
        Ok(())
    }

    /// the only remaining forest edge of a pendant vertex
    fn find_leaf(&mut self, cluster: ClusterIndex, vertex_index: VertexIndex) -> Option<(VertexIndex, EdgeIndex)> {
        let mut leaf = None;
        for neighbor_index in 0..self.vertices[vertex_index as usize].neighbors.len() {
            let (peer, edge_index) = self.vertices[vertex_index as usize].neighbors[neighbor_index];
            let edge = &self.edges[edge_index as usize];
            if !edge.is_live(self.active_timestamp) || edge.support != 2 || edge.peeled {
                continue;
            }
            if self.get_cluster(peer) != Some(cluster) {
                continue;
            }
            if leaf.is_some() {
                return None;
            }
            leaf = Some((peer, edge_index));
        }
        leaf
    }

    /// no fully grown edge may be left inside a cluster after peeling
    fn check_peeled(&mut self) -> Result<(), DecoderError> {
        for index in 0..self.fully_grown.len() {
            let edge_index = self.fully_grown[index];
            let edge = &self.edges[edge_index as usize];
            if edge.support != 2 || edge.peeled {
                continue;
            }
            let (left, right) = edge.vertices;
            let left_cluster = self.get_cluster(left);
            if left_cluster.is_some() && left_cluster == self.get_cluster(right) {
                return Err(DecoderError::PeelingInvariant {
                    edge_index,
                    cluster: left_cluster.unwrap_or_default(),
                });
            }
        }
        Ok(())
    }
}

/// grow every entry of `front` by half an edge: fully grown edges go to `fusion`, the rest to `next_front`
fn grow_front(
    edges: &mut [Edge],
    active_timestamp: FastClearTimestamp,
    front: &mut Vec<BoundaryEntry>,
    next_front: &mut Vec<BoundaryEntry>,
    fusion: &mut Vec<BoundaryEntry>,
    fully_grown: &mut Vec<EdgeIndex>,
) {
    for entry in front.drain(..) {
        let edge = &mut edges[entry.edge as usize];
        edge.dynamic_clear(active_timestamp);
        if edge.support == 2 || edge.peeled {
            continue;
        }
        edge.support += 1;
        if edge.support == 2 {
            fully_grown.push(entry.edge);
            fusion.push(entry);
        } else {
            next_front.push(entry);
        }
    }
}

impl UnionFindVisualizer for UnionFindDecoder {
    #[allow(clippy::unnecessary_cast)]
    fn snapshot(&self, abbrev: bool) -> serde_json::Value {
        let active_timestamp = self.active_timestamp;
        let mut vertices = Vec::<serde_json::Value>::with_capacity(self.vertices.len());
        for vertex in self.vertices.iter() {
            let live = vertex.is_live(active_timestamp);
            vertices.push(json!({
                if abbrev { "v" } else { "is_virtual" }: i32::from(vertex.is_virtual),
                if abbrev { "s" } else { "is_defect" }: i32::from(live && vertex.is_defect),
                if abbrev { "c" } else { "cluster" }: self.live_cluster(vertex.vertex_index),
                if abbrev { "n" } else { "node" }: if live { vertex.node } else { None },
            }));
        }
        let mut edges = Vec::<serde_json::Value>::with_capacity(self.edges.len());
        for edge in self.edges.iter() {
            let live = edge.is_live(active_timestamp);
            edges.push(json!({
                if abbrev { "l" } else { "left" }: edge.vertices.0,
                if abbrev { "r" } else { "right" }: edge.vertices.1,
                if abbrev { "g" } else { "support" }: if live { edge.support } else { 0 },
                if abbrev { "m" } else { "matching" }: i32::from(live && edge.matching),
                if abbrev { "p" } else { "peeled" }: i32::from(live && edge.peeled),
                if abbrev { "e" } else { "is_erasure" }: i32::from(live && edge.is_erasure),
            }));
        }
        let mut clusters = Vec::<serde_json::Value>::new();
        for (key, cluster) in self.clusters.payload.iter().enumerate() {
            if !self.clusters.is_root(key) {
                continue;
            }
            clusters.push(json!({
                if abbrev { "i" } else { "index" }: cluster.index,
                if abbrev { "z" } else { "size" }: cluster.size,
                if abbrev { "y" } else { "parity" }: cluster.parity,
                if abbrev { "u" } else { "support" }: cluster.support,
                if abbrev { "b" } else { "bucket" }: cluster.bucket,
                if abbrev { "o" } else { "on_bound" }: i32::from(cluster.on_bound),
                if abbrev { "rn" } else { "root_node" }: cluster.root_node,
            }));
        }
        let mut nodes = Vec::<serde_json::Value>::with_capacity(self.forest.len());
        for node in self.forest.nodes.iter() {
            nodes.push(json!({
                if abbrev { "k" } else { "kind" }: node.kind.abbrev(),
                if abbrev { "pr" } else { "primer" }: node.primer,
                if abbrev { "ra" } else { "radius" }: node.radius,
                if abbrev { "y" } else { "parity" }: node.parity,
                if abbrev { "d" } else { "delay" }: node.delay,
                if abbrev { "w" } else { "waited" }: node.waited,
                if abbrev { "nb" } else { "neighbors" }: node.neighbors,
            }));
        }
        json!({
            "vertices": vertices,
            "edges": edges,
            "clusters": clusters,
            "nodes": nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::example_codes::*;
    use super::*;
    use std::collections::BTreeSet;

    fn all_configs() -> Vec<(&'static str, DecoderConfig)> {
        vec![
            ("default", DecoderConfig::default()),
            (
                "non-weighted",
                DecoderConfig {
                    weighted_growth: false,
                    weighted_union: false,
                    ..Default::default()
                },
            ),
            (
                "static forest",
                DecoderConfig {
                    dynamic_forest: false,
                    ..Default::default()
                },
            ),
            (
                "degenerate fusion",
                DecoderConfig {
                    degenerate_fusion: true,
                    ..Default::default()
                },
            ),
            ("node suspension", DecoderConfig::node_suspension()),
            (
                "node suspension static forest",
                DecoderConfig {
                    node_suspension: true,
                    dynamic_forest: false,
                    degenerate_fusion: true,
                    ..Default::default()
                },
            ),
        ]
    }

    /// decode random errors and check that the correction cancels every defect
    fn decoder_standard_test<Code: ExampleCode>(code: &mut Code, config: DecoderConfig, rounds: u64) {
        let initializer = code.get_initializer();
        let mut decoder = UnionFindDecoder::new(&initializer, config);
        for seed in 0..rounds {
            let syndrome = code.generate_random_errors(seed);
            decoder.decode(&syndrome).unwrap();
            let correction = decoder.subgraph();
            let expected: BTreeSet<VertexIndex> = syndrome.defect_vertices.iter().cloned().collect();
            assert_eq!(initializer.syndrome_of(&correction), expected, "seed {}", seed);
            assert!(decoder.unresolved_defects().is_empty(), "seed {}", seed);
            assert!(decoder.profile.bucket_iterations <= decoder.bucket_num);
        }
    }

    #[test]
    fn decoder_trivial_syndrome() {
        // cargo test decoder_trivial_syndrome -- --nocapture
        let code = CodeCapacityPlanarCode::new(3, 0.1);
        for (_, config) in all_configs() {
            let mut decoder = UnionFindDecoder::new(&code.get_initializer(), config);
            decoder.decode(&SyndromePattern::new_empty()).unwrap();
            assert!(decoder.subgraph().is_empty());
            assert!(decoder.unresolved_defects().is_empty());
            assert_eq!(decoder.profile.cluster_count, 0);
        }
    }

    #[test]
    fn decoder_adjacent_defects_toric() {
        // cargo test decoder_adjacent_defects_toric -- --nocapture
        let code = CodeCapacityToricCode::new(5, 0.1);
        for (name, config) in all_configs() {
            let mut decoder = UnionFindDecoder::new(&code.get_initializer(), config);
            // vertex 0 and 1 are connected by the first horizontal edge
            decoder.decode(&SyndromePattern::new_vertices(vec![0, 1])).unwrap();
            assert_eq!(decoder.subgraph(), vec![0], "{}", name);
            assert!(!code.logical_error(&decoder.subgraph()));
        }
    }

    #[test]
    fn decoder_planar_boundary_absorption() {
        // cargo test decoder_planar_boundary_absorption -- --nocapture
        let code = CodeCapacityPlanarCode::new(3, 0.1);
        let boundary_edge = code
            .edges
            .iter()
            .position(|edge| edge.vertices == (0, 3))
            .expect("left boundary edge of the first row") as EdgeIndex;
        let mut decoder = UnionFindDecoder::new(
            &code.get_initializer(),
            DecoderConfig {
                print_steps: true,
                ..Default::default()
            },
        );
        decoder.decode(&SyndromePattern::new_vertices(vec![0])).unwrap();
        let root = decoder.get_cluster(0).unwrap();
        assert!(decoder.clusters.payload[root].on_bound);
        assert_eq!(decoder.get_cluster(3), Some(root));
        assert_eq!(decoder.subgraph(), vec![boundary_edge]);
        assert!(decoder.unresolved_defects().is_empty());
    }

    #[test]
    fn decoder_toric_isolated_defect() {
        // cargo test decoder_toric_isolated_defect -- --nocapture
        let code = CodeCapacityToricCode::new(3, 0.1);
        for (name, config) in all_configs() {
            let mut decoder = UnionFindDecoder::new(&code.get_initializer(), config);
            decoder.decode(&SyndromePattern::new_vertices(vec![0])).unwrap();
            assert_eq!(decoder.unresolved_defects().len(), 1, "{}", name);
            assert!(!decoder.wastebasket.is_empty(), "{}", name);
        }
        // a tiny bucket cap retires the cluster right after its first full growth
        let mut decoder = UnionFindDecoder::new(
            &code.get_initializer(),
            DecoderConfig {
                bucket_num: Some(2),
                ..Default::default()
            },
        );
        decoder.decode(&SyndromePattern::new_vertices(vec![0])).unwrap();
        assert_eq!(decoder.unresolved_defects(), &[0]);
        assert!(decoder.subgraph().is_empty());
        assert_eq!(decoder.wastebasket.len(), 1);
    }

    #[test]
    fn decoder_random_planar_codes() {
        // cargo test decoder_random_planar_codes -- --nocapture
        for (name, config) in all_configs() {
            println!("config: {}", name);
            decoder_standard_test(&mut CodeCapacityRepetitionCode::new(7, 0.2), config.clone(), 50);
            decoder_standard_test(&mut CodeCapacityPlanarCode::new(7, 0.1), config.clone(), 50);
            decoder_standard_test(&mut PhenomenologicalPlanarCode::new(5, 3, 0.03), config, 30);
        }
    }

    #[test]
    fn decoder_random_erasures() {
        // cargo test decoder_random_erasures -- --nocapture
        for (name, config) in all_configs() {
            println!("config: {}", name);
            let mut code = CodeCapacityPlanarCode::new(7, 0.02);
            code.set_erasure_probability(0.1);
            decoder_standard_test(&mut code, config.clone(), 50);
            let mut code = PhenomenologicalPlanarCode::new(5, 2, 0.01);
            code.set_erasure_probability(0.05);
            decoder_standard_test(&mut code, config, 20);
        }
    }

    #[test]
    fn decoder_random_toric_codes() {
        // cargo test decoder_random_toric_codes -- --nocapture
        // defects on a closed lattice come in pairs, so every cluster eventually turns even
        for (name, config) in all_configs() {
            println!("config: {}", name);
            decoder_standard_test(&mut CodeCapacityToricCode::new(7, 0.08), config.clone(), 50);
            decoder_standard_test(&mut PhenomenologicalToricCode::new(5, 3, 0.03), config.clone(), 30);
            let mut code = CodeCapacityToricCode::new(7, 0.02);
            code.set_erasure_probability(0.1);
            decoder_standard_test(&mut code, config.clone(), 50);
            let mut code = PhenomenologicalToricCode::new(5, 2, 0.01);
            code.set_erasure_probability(0.05);
            decoder_standard_test(&mut code, config, 20);
        }
    }

    /// every live cluster is a tree after growth: its fully grown, unpeeled edges number one less than its vertices
    fn assert_cluster_trees(decoder: &UnionFindDecoder, context: &str) {
        let mut tree_edges = vec![0usize; decoder.clusters.size()];
        for edge in decoder.edges.iter() {
            if !edge.is_live(decoder.active_timestamp) || edge.support != 2 || edge.peeled {
                continue;
            }
            let (left, right) = edge.vertices;
            let cluster = decoder.live_cluster(left).expect("fully grown edge outside of any cluster");
            assert_eq!(decoder.live_cluster(right), Some(cluster), "{} edge {}", context, edge.edge_index);
            tree_edges[cluster] += 1;
        }
        for key in 0..decoder.clusters.size() {
            if decoder.clusters.is_root(key) {
                let vertex_count = decoder.clusters.payload[key].vertices.len();
                assert_eq!(tree_edges[key] + 1, vertex_count, "{} cluster {}", context, key);
            }
        }
    }

    #[test]
    fn decoder_dynamic_forest_has_no_cycle() {
        // cargo test decoder_dynamic_forest_has_no_cycle -- --nocapture
        let mut toric = CodeCapacityToricCode::new(7, 0.1);
        toric.set_erasure_probability(0.03);
        let mut planar = PhenomenologicalPlanarCode::new(5, 3, 0.05);
        for (name, config) in all_configs().into_iter().filter(|(_, config)| config.dynamic_forest) {
            let mut decoder = UnionFindDecoder::new(&toric.get_initializer(), config.clone());
            for seed in 0..50 {
                let syndrome = toric.generate_random_errors(seed);
                decoder.clear();
                decoder.load(&syndrome);
                decoder.find_clusters();
                decoder.grow_clusters(&mut None).unwrap();
                assert_cluster_trees(&decoder, &format!("toric {} seed {}", name, seed));
            }
            let mut decoder = UnionFindDecoder::new(&planar.get_initializer(), config);
            for seed in 0..30 {
                let syndrome = planar.generate_random_errors(seed);
                decoder.clear();
                decoder.load(&syndrome);
                decoder.find_clusters();
                decoder.grow_clusters(&mut None).unwrap();
                assert_cluster_trees(&decoder, &format!("planar {} seed {}", name, seed));
            }
        }
    }

    #[test]
    fn decoder_low_error_rate_is_logically_correct() {
        // cargo test decoder_low_error_rate_is_logically_correct -- --nocapture
        // at most one error on a distance-5 code is always corrected
        let mut code = CodeCapacityPlanarCode::new(5, 0.);
        for (_, config) in all_configs() {
            let mut decoder = UnionFindDecoder::new(&code.get_initializer(), config);
            for edge_index in 0..code.edges.len() as EdgeIndex {
                code.set_errors(&[edge_index]);
                decoder.decode(&code.get_syndrome()).unwrap();
                assert!(!code.logical_error(&decoder.subgraph()), "error on edge {}", edge_index);
            }
        }
    }

    #[test]
    fn decoder_monotone_buckets() {
        // cargo test decoder_monotone_buckets -- --nocapture
        let mut code = PhenomenologicalPlanarCode::new(5, 3, 0.05);
        for (name, config) in all_configs() {
            let mut decoder = UnionFindDecoder::new(&code.get_initializer(), config);
            for seed in 0..10 {
                let syndrome = code.generate_random_errors(seed);
                decoder.clear();
                decoder.load(&syndrome);
                decoder.find_clusters();
                let mut bucket_index = 0;
                while bucket_index <= decoder.bucket_max_filled {
                    let placed = decoder.process_bucket(bucket_index, &mut None).unwrap();
                    for root in placed {
                        if let Some(bucket) = decoder.clusters.payload[root].bucket {
                            assert!(bucket > bucket_index, "{} seed {}", name, seed);
                            assert!(bucket < decoder.bucket_num);
                        }
                    }
                    bucket_index += 1;
                }
                // every cluster ends up even, on a boundary or retired
                for key in 0..decoder.clusters.size() {
                    if decoder.clusters.is_root(key) {
                        let cluster = &decoder.clusters.payload[key];
                        assert!(!cluster.is_schedulable() || decoder.wastebasket.contains(&key));
                    }
                }
                decoder.peel_clusters(&mut None).unwrap();
            }
        }
    }

    #[test]
    fn decoder_fast_clear_reuse() {
        // cargo test decoder_fast_clear_reuse -- --nocapture
        let mut code = CodeCapacityPlanarCode::new(7, 0.1);
        code.set_erasure_probability(0.02);
        for (name, config) in all_configs() {
            let mut reused = UnionFindDecoder::new(&code.get_initializer(), config.clone());
            for seed in 0..20 {
                let syndrome = code.generate_random_errors(seed);
                if seed == 10 {
                    reused.active_timestamp = FastClearTimestamp::MAX; // force a hard clear
                }
                reused.decode(&syndrome).unwrap();
                let mut fresh = UnionFindDecoder::new(&code.get_initializer(), config.clone());
                fresh.decode(&syndrome).unwrap();
                assert_eq!(reused.subgraph(), fresh.subgraph(), "{} seed {}", name, seed);
            }
        }
    }

    #[test]
    fn decoder_node_suspension_forest() {
        // cargo test decoder_node_suspension_forest -- --nocapture
        let mut code = CodeCapacityPlanarCode::new(9, 0.08);
        let mut decoder = UnionFindDecoder::new(&code.get_initializer(), DecoderConfig::node_suspension());
        for seed in 0..20 {
            let syndrome = code.generate_random_errors(seed);
            decoder.decode(&syndrome).unwrap();
            let syndrome_nodes = decoder
                .forest
                .nodes
                .iter()
                .filter(|node| node.kind == NodeKind::Syndrome)
                .count();
            assert_eq!(syndrome_nodes, syndrome.defect_vertices.len());
            // every live root owns a node tree
            for key in 0..decoder.clusters.size() {
                if decoder.clusters.is_root(key) {
                    assert!(decoder.clusters.payload[key].root_node.is_some());
                }
            }
            // boundary nodes only appear for absorbed virtual vertices
            for node in decoder.forest.nodes.iter() {
                if node.kind == NodeKind::Boundary {
                    assert!(code.is_virtual(node.primer as usize));
                }
            }
        }
    }

    #[test]
    fn decoder_degenerate_fusion_deterministic() {
        // cargo test decoder_degenerate_fusion_deterministic -- --nocapture
        let mut code = PhenomenologicalPlanarCode::new(5, 4, 0.05);
        let config = DecoderConfig {
            degenerate_fusion: true,
            ..Default::default()
        };
        let mut decoder_1 = UnionFindDecoder::new(&code.get_initializer(), config);
        let mut decoder_2 = decoder_1.clone();
        for seed in 0..10 {
            let syndrome = code.generate_random_errors(seed);
            decoder_1.decode(&syndrome).unwrap();
            decoder_2.decode(&syndrome).unwrap();
            assert_eq!(decoder_1.subgraph(), decoder_2.subgraph());
        }
    }

    #[test]
    fn decoder_config_deserialize() {
        // cargo test decoder_config_deserialize -- --nocapture
        let config: DecoderConfig = serde_json::from_value(json!({})).unwrap();
        assert!(config.weighted_growth && config.weighted_union && config.dynamic_forest);
        assert!(!config.node_suspension && !config.degenerate_fusion);
        assert_eq!(config.bucket_num, None);
        let config: DecoderConfig =
            serde_json::from_value(json!({"node_suspension": true, "bucket_num": 100})).unwrap();
        assert!(config.node_suspension);
        assert_eq!(config.bucket_num, Some(100));
        assert!(serde_json::from_value::<DecoderConfig>(json!({"unknown_field": 1})).is_err());
        let decoder = UnionFindDecoder::new(&CodeCapacityPlanarCode::new(3, 0.1).get_initializer(), config);
        assert_eq!(decoder.bucket_num, 100);
    }

    #[test]
    #[should_panic]
    fn decoder_rejects_virtual_defect() {
        // cargo test decoder_rejects_virtual_defect -- --nocapture
        let code = CodeCapacityPlanarCode::new(3, 0.1);
        let mut decoder = UnionFindDecoder::new(&code.get_initializer(), DecoderConfig::default());
        let _ = decoder.decode(&SyndromePattern::new_vertices(vec![2]));
    }

    #[test]
    #[should_panic]
    fn decoder_rejects_invalid_graph() {
        // cargo test decoder_rejects_invalid_graph -- --nocapture
        UnionFindDecoder::new(&SolverInitializer::new(2, vec![(0, 2)], vec![]), DecoderConfig::default());
    }
}
