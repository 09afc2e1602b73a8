//! Example Codes
//!
//! This module contains several decoding graphs of surface codes together with a randomized error simulator.
//! Every code knows its logical cuts: sets of edges that any logical operator crosses an odd number of times,
//! so a correction is checked by the parity of error plus correction on each cut.
//!
//! The errors are independent per edge; this helps to debug and benchmark but doesn't correspond to a
//! circuit-level noise model.
//!

use super::util::*;
use super::visualize::*;
use crate::derivative::Derivative;
use crate::rand_xoshiro::rand_core::SeedableRng;
use crate::serde_json;
use std::collections::HashMap;

/// Vertex corresponds to a stabilizer measurement bit
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct CodeVertex {
    /// position helps to visualize
    pub position: VisualizePosition,
    /// neighbor edges helps to set find individual edge
    pub neighbor_edges: Vec<EdgeIndex>,
    /// virtual vertex won't report measurement results
    pub is_virtual: bool,
    /// whether it's a defect, note that virtual vertices should NOT be defects
    pub is_defect: bool,
}

/// Edge flips the measurement result of two vertices
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct CodeEdge {
    /// the two vertices incident to this edge
    pub vertices: (VertexIndex, VertexIndex),
    /// probability of flipping the results of these two vertices
    pub p: f64,
    /// probability of having a reported event of error on this edge
    pub pe: f64,
    /// whether this edge is erased
    pub is_erasure: bool,
    /// whether the last generated error flipped this edge
    pub is_error: bool,
}

impl CodeEdge {
    pub fn new(a: VertexIndex, b: VertexIndex) -> Self {
        Self {
            vertices: (a, b),
            p: 0.,
            pe: 0.,
            is_erasure: false,
            is_error: false,
        }
    }
}

#[allow(clippy::unnecessary_cast)]
pub trait ExampleCode {
    /// get mutable references to vertices and edges
    fn vertices_edges(&mut self) -> (&mut Vec<CodeVertex>, &mut Vec<CodeEdge>);
    fn immutable_vertices_edges(&self) -> (&Vec<CodeVertex>, &Vec<CodeEdge>);

    /// edge sets crossed an odd number of times by each logical operator
    fn logical_cuts(&self) -> &[Vec<EdgeIndex>];

    /// get the number of vertices
    fn vertex_num(&self) -> VertexNum {
        self.immutable_vertices_edges().0.len() as VertexNum
    }

    /// sanity check to avoid duplicate edges that are hard to debug
    fn sanity_check(&self) -> Result<(), String> {
        let (vertices, edges) = self.immutable_vertices_edges();
        if vertices.is_empty() || edges.is_empty() {
            return Err("empty graph".to_string());
        }
        let mut existing_edges = HashMap::<(VertexIndex, VertexIndex), EdgeIndex>::with_capacity(edges.len() * 2);
        for (edge_idx, edge) in edges.iter().enumerate() {
            let (v1, v2) = edge.vertices;
            let unique_edge = if v1 < v2 { (v1, v2) } else { (v2, v1) };
            if let Some(previous_idx) = existing_edges.get(&unique_edge) {
                return Err(format!(
                    "duplicate edge {} and {} with incident vertices {} and {}",
                    previous_idx, edge_idx, v1, v2
                ));
            }
            existing_edges.insert(unique_edge, edge_idx as EdgeIndex);
        }
        for (vertex_idx, vertex) in vertices.iter().enumerate() {
            if vertex.neighbor_edges.is_empty() {
                return Err(format!("vertex {} do not have any neighbor edges", vertex_idx));
            }
            if vertex.is_virtual && vertex.is_defect {
                return Err(format!("virtual vertex {} cannot be a defect", vertex_idx));
            }
        }
        for cut in self.logical_cuts().iter() {
            if cut.iter().any(|&edge_index| edge_index as usize >= edges.len()) {
                return Err("logical cut refers to an invalid edge".to_string());
            }
        }
        Ok(())
    }

    /// set probability of all edges; user can set individual probabilities
    fn set_probability(&mut self, p: f64) {
        let (_vertices, edges) = self.vertices_edges();
        for edge in edges.iter_mut() {
            edge.p = p;
        }
    }

    /// set erasure probability of all edges; user can set individual probabilities
    fn set_erasure_probability(&mut self, pe: f64) {
        let (_vertices, edges) = self.vertices_edges();
        for edge in edges.iter_mut() {
            edge.pe = pe;
        }
    }

    /// automatically create vertices given edges
    fn fill_vertices(&mut self, vertex_num: VertexNum) {
        let (vertices, edges) = self.vertices_edges();
        vertices.clear();
        vertices.reserve(vertex_num as usize);
        for _ in 0..vertex_num {
            vertices.push(CodeVertex {
                position: VisualizePosition::new(0., 0., 0.),
                neighbor_edges: Vec::new(),
                is_virtual: false,
                is_defect: false,
            });
        }
        for (edge_idx, edge) in edges.iter().enumerate() {
            vertices[edge.vertices.0 as usize].neighbor_edges.push(edge_idx as EdgeIndex);
            vertices[edge.vertices.1 as usize].neighbor_edges.push(edge_idx as EdgeIndex);
        }
    }

    /// gather all positions of vertices
    fn get_positions(&self) -> Vec<VisualizePosition> {
        let (vertices, _edges) = self.immutable_vertices_edges();
        vertices.iter().map(|vertex| vertex.position.clone()).collect()
    }

    /// generate standard interface to instantiate the decoder
    fn get_initializer(&self) -> SolverInitializer {
        let (vertices, edges) = self.immutable_vertices_edges();
        let vertex_num = vertices.len() as VertexNum;
        let graph_edges = edges.iter().map(|edge| edge.vertices).collect();
        let mut virtual_vertices = Vec::new();
        for (vertex_idx, vertex) in vertices.iter().enumerate() {
            if vertex.is_virtual {
                virtual_vertices.push(vertex_idx as VertexIndex);
            }
        }
        SolverInitializer::new(vertex_num, graph_edges, virtual_vertices)
    }

    /// set defect vertices (non-trivial measurement result in case of single round of measurement,
    /// or different result from the previous round in case of multiple rounds of measurement)
    fn set_defect_vertices(&mut self, defect_vertices: &[VertexIndex]) {
        let (vertices, _edges) = self.vertices_edges();
        for vertex in vertices.iter_mut() {
            vertex.is_defect = false;
        }
        for vertex_idx in defect_vertices.iter() {
            vertices[*vertex_idx as usize].is_defect = true;
        }
    }

    /// set erasure edges
    fn set_erasures(&mut self, erasures: &[EdgeIndex]) {
        let (_vertices, edges) = self.vertices_edges();
        for edge in edges.iter_mut() {
            edge.is_erasure = false;
        }
        for edge_idx in erasures.iter() {
            edges[*edge_idx as usize].is_erasure = true;
        }
    }

    /// set the error edges and the resulting defects
    fn set_errors(&mut self, errors: &[EdgeIndex]) {
        let (vertices, edges) = self.vertices_edges();
        for vertex in vertices.iter_mut() {
            vertex.is_defect = false;
        }
        for edge in edges.iter_mut() {
            edge.is_error = false;
        }
        for &edge_idx in errors.iter() {
            let edge = &mut edges[edge_idx as usize];
            edge.is_error = !edge.is_error;
            let (v1, v2) = edge.vertices;
            for vertex_idx in [v1, v2] {
                let vertex = &mut vertices[vertex_idx as usize];
                if !vertex.is_virtual {
                    vertex.is_defect = !vertex.is_defect;
                }
            }
        }
    }

    /// set syndrome
    fn set_syndrome(&mut self, syndrome_pattern: &SyndromePattern) {
        self.set_defect_vertices(&syndrome_pattern.defect_vertices);
        self.set_erasures(&syndrome_pattern.erasures);
    }

    /// get current defect vertices
    fn get_defect_vertices(&self) -> Vec<VertexIndex> {
        let (vertices, _edges) = self.immutable_vertices_edges();
        let mut defects = Vec::new();
        for (vertex_idx, vertex) in vertices.iter().enumerate() {
            if vertex.is_defect {
                defects.push(vertex_idx as VertexIndex);
            }
        }
        defects
    }

    /// get current erasure edges
    fn get_erasures(&self) -> Vec<EdgeIndex> {
        let (_vertices, edges) = self.immutable_vertices_edges();
        let mut erasures = Vec::new();
        for (edge_idx, edge) in edges.iter().enumerate() {
            if edge.is_erasure {
                erasures.push(edge_idx as EdgeIndex);
            }
        }
        erasures
    }

    /// get current error edges
    fn get_errors(&self) -> Vec<EdgeIndex> {
        let (_vertices, edges) = self.immutable_vertices_edges();
        let mut errors = Vec::new();
        for (edge_idx, edge) in edges.iter().enumerate() {
            if edge.is_error {
                errors.push(edge_idx as EdgeIndex);
            }
        }
        errors
    }

    /// get current syndrome
    fn get_syndrome(&self) -> SyndromePattern {
        SyndromePattern::new(self.get_defect_vertices(), self.get_erasures())
    }

    /// generate random errors based on the edge probabilities and a seed for pseudo number generator
    fn generate_random_errors(&mut self, seed: u64) -> SyndromePattern {
        let mut rng = DeterministicRng::seed_from_u64(seed);
        let (vertices, edges) = self.vertices_edges();
        for vertex in vertices.iter_mut() {
            vertex.is_defect = false;
        }
        for edge in edges.iter_mut() {
            let p = if rng.next_f64() < edge.pe {
                edge.is_erasure = true;
                0.5 // when erasure happens, there are 50% chance of error
            } else {
                edge.is_erasure = false;
                edge.p
            };
            edge.is_error = rng.next_f64() < p;
            if edge.is_error {
                let (v1, v2) = edge.vertices;
                let vertex_1 = &mut vertices[v1 as usize];
                if !vertex_1.is_virtual {
                    vertex_1.is_defect = !vertex_1.is_defect;
                }
                let vertex_2 = &mut vertices[v2 as usize];
                if !vertex_2.is_virtual {
                    vertex_2.is_defect = !vertex_2.is_defect;
                }
            }
        }
        self.get_syndrome()
    }

    /// whether the last generated error combined with `correction` is a logical operator
    fn logical_error(&self, correction: &[EdgeIndex]) -> bool {
        let (_vertices, edges) = self.immutable_vertices_edges();
        let mut flipped: Vec<bool> = edges.iter().map(|edge| edge.is_error).collect();
        for &edge_index in correction.iter() {
            flipped[edge_index as usize] = !flipped[edge_index as usize];
        }
        self.logical_cuts().iter().any(|cut| {
            cut.iter().filter(|&&edge_index| flipped[edge_index as usize]).count() % 2 == 1
        })
    }

    fn is_virtual(&self, vertex_idx: usize) -> bool {
        let (vertices, _edges) = self.immutable_vertices_edges();
        vertices[vertex_idx].is_virtual
    }

    fn is_defect(&self, vertex_idx: usize) -> bool {
        let (vertices, _edges) = self.immutable_vertices_edges();
        vertices[vertex_idx].is_defect
    }
}

impl<T> UnionFindVisualizer for T
where
    T: ExampleCode,
{
    fn snapshot(&self, abbrev: bool) -> serde_json::Value {
        let (self_vertices, self_edges) = self.immutable_vertices_edges();
        let mut vertices = Vec::<serde_json::Value>::new();
        for vertex in self_vertices.iter() {
            vertices.push(json!({
                if abbrev { "v" } else { "is_virtual" }: i32::from(vertex.is_virtual),
                if abbrev { "s" } else { "is_defect" }: i32::from(vertex.is_defect),
            }));
        }
        let mut edges = Vec::<serde_json::Value>::new();
        for edge in self_edges.iter() {
            edges.push(json!({
                if abbrev { "l" } else { "left" }: edge.vertices.0,
                if abbrev { "r" } else { "right" }: edge.vertices.1,
                if abbrev { "e" } else { "is_erasure" }: i32::from(edge.is_erasure),
                if abbrev { "x" } else { "is_error" }: i32::from(edge.is_error),
                // code itself is not capable of calculating growth
            }));
        }
        json!({
            "vertices": vertices,
            "edges": edges,
        })
    }
}

macro_rules! impl_example_code {
    ($struct_name:ident) => {
        impl ExampleCode for $struct_name {
            fn vertices_edges(&mut self) -> (&mut Vec<CodeVertex>, &mut Vec<CodeEdge>) {
                (&mut self.vertices, &mut self.edges)
            }
            fn immutable_vertices_edges(&self) -> (&Vec<CodeVertex>, &Vec<CodeEdge>) {
                (&self.vertices, &self.edges)
            }
            fn logical_cuts(&self) -> &[Vec<EdgeIndex>] {
                &self.logical_cuts
            }
        }
    };
}

/// perfect quantum repetition code
#[derive(Clone, Debug)]
pub struct CodeCapacityRepetitionCode {
    /// vertices in the code
    pub vertices: Vec<CodeVertex>,
    /// nearest-neighbor edges in the decoding graph
    pub edges: Vec<CodeEdge>,
    /// the left-most edge
    pub logical_cuts: Vec<Vec<EdgeIndex>>,
}

impl_example_code!(CodeCapacityRepetitionCode);

#[allow(clippy::unnecessary_cast)]
impl CodeCapacityRepetitionCode {
    pub fn new(d: VertexNum, p: f64) -> Self {
        let mut code = Self::create_code(d);
        code.set_probability(p);
        code
    }

    pub fn create_code(d: VertexNum) -> Self {
        assert!(d >= 3 && d % 2 == 1, "d must be odd integer >= 3");
        let vertex_num = (d - 1) + 2; // two virtual vertices at left and right
        let mut edges = Vec::new();
        for i in 0..d - 1 {
            edges.push(CodeEdge::new(i, i + 1));
        }
        edges.push(CodeEdge::new(0, d)); // the left-most edge
        let logical_cuts = vec![vec![(edges.len() - 1) as EdgeIndex]];
        let mut code = Self {
            vertices: Vec::new(),
            edges,
            logical_cuts,
        };
        code.fill_vertices(vertex_num);
        code.vertices[d as usize - 1].is_virtual = true;
        code.vertices[d as usize].is_virtual = true;
        let mut positions = Vec::new();
        for i in 0..d {
            positions.push(VisualizePosition::new(0., i as f64, 0.));
        }
        positions.push(VisualizePosition::new(0., -1., 0.));
        for (i, position) in positions.into_iter().enumerate() {
            code.vertices[i].position = position;
        }
        code
    }
}

/// code capacity noise model is a single measurement round with perfect stabilizer measurements;
/// e.g. this is the decoding graph of a CSS surface code (standard one, not rotated one) with X-type stabilizers
#[derive(Clone, Debug)]
pub struct CodeCapacityPlanarCode {
    /// vertices in the code
    pub vertices: Vec<CodeVertex>,
    /// nearest-neighbor edges in the decoding graph
    pub edges: Vec<CodeEdge>,
    /// the left-most edges of all rows
    pub logical_cuts: Vec<Vec<EdgeIndex>>,
}

impl_example_code!(CodeCapacityPlanarCode);

#[allow(clippy::unnecessary_cast)]
impl CodeCapacityPlanarCode {
    pub fn new(d: VertexNum, p: f64) -> Self {
        let mut code = Self::create_code(d);
        code.set_probability(p);
        code
    }

    pub fn create_code(d: VertexNum) -> Self {
        let mut code = PhenomenologicalPlanarCode::create_code(d, 0);
        for vertex in code.vertices.iter_mut() {
            vertex.position.t = 0.;
            vertex.position.j -= 0.5;
        }
        Self {
            vertices: code.vertices,
            edges: code.edges,
            logical_cuts: code.logical_cuts,
        }
    }
}

/// phenomenological noise model is multiple measurement rounds adding only measurement errors
/// e.g. this is the decoding graph of a CSS surface code (standard one, not rotated one) with X-type stabilizers
#[derive(Clone, Debug)]
pub struct PhenomenologicalPlanarCode {
    /// vertices in the code
    pub vertices: Vec<CodeVertex>,
    /// nearest-neighbor edges in the decoding graph
    pub edges: Vec<CodeEdge>,
    /// the left-most edges of all rows in all layers
    pub logical_cuts: Vec<Vec<EdgeIndex>>,
}

impl_example_code!(PhenomenologicalPlanarCode);

#[allow(clippy::unnecessary_cast)]
impl PhenomenologicalPlanarCode {
    pub fn new(d: VertexNum, noisy_measurements: VertexNum, p: f64) -> Self {
        let mut code = Self::create_code(d, noisy_measurements);
        code.set_probability(p);
        code
    }

    pub fn create_code(d: VertexNum, noisy_measurements: VertexNum) -> Self {
        assert!(d >= 3 && d % 2 == 1, "d must be odd integer >= 3");
        let row_vertex_num = (d - 1) + 2; // two virtual vertices at left and right
        let t_vertex_num = row_vertex_num * d; // `d` rows
        let td = noisy_measurements + 1; // a perfect measurement round is capped at the end
        let vertex_num = t_vertex_num * td; // `td` layers
        let mut edges = Vec::new();
        let mut left_edges = Vec::new();
        for t in 0..td {
            let t_bias = t * t_vertex_num;
            for row in 0..d {
                let bias = t_bias + row * row_vertex_num;
                for i in 0..d - 1 {
                    edges.push(CodeEdge::new(bias + i, bias + i + 1));
                }
                left_edges.push(edges.len() as EdgeIndex);
                edges.push(CodeEdge::new(bias, bias + d)); // left most edge
                if row + 1 < d {
                    for i in 0..d - 1 {
                        edges.push(CodeEdge::new(bias + i, bias + i + row_vertex_num));
                    }
                }
            }
            // inter-layer connection
            if t + 1 < td {
                for row in 0..d {
                    let bias = t_bias + row * row_vertex_num;
                    for i in 0..d - 1 {
                        edges.push(CodeEdge::new(bias + i, bias + i + t_vertex_num));
                    }
                }
            }
        }
        let mut code = Self {
            vertices: Vec::new(),
            edges,
            logical_cuts: vec![left_edges],
        };
        code.fill_vertices(vertex_num);
        for t in 0..td {
            let t_bias = t * t_vertex_num;
            for row in 0..d {
                let bias = t_bias + row * row_vertex_num;
                code.vertices[(bias + d - 1) as usize].is_virtual = true;
                code.vertices[(bias + d) as usize].is_virtual = true;
            }
        }
        let mut positions = Vec::new();
        for t in 0..td {
            let pos_t = t as f64;
            for row in 0..d {
                let pos_i = row as f64;
                for i in 0..d {
                    positions.push(VisualizePosition::new(pos_i, i as f64 + 0.5, pos_t));
                }
                positions.push(VisualizePosition::new(pos_i, -1. + 0.5, pos_t));
            }
        }
        for (i, position) in positions.into_iter().enumerate() {
            code.vertices[i].position = position;
        }
        code
    }
}

/// toric code on a `d x d` torus without any boundary; both logical operators wrap around the torus
#[derive(Clone, Debug)]
pub struct CodeCapacityToricCode {
    /// vertices in the code
    pub vertices: Vec<CodeVertex>,
    /// nearest-neighbor edges in the decoding graph
    pub edges: Vec<CodeEdge>,
    /// the wrapping horizontal edges and the wrapping vertical edges
    pub logical_cuts: Vec<Vec<EdgeIndex>>,
}

impl_example_code!(CodeCapacityToricCode);

#[allow(clippy::unnecessary_cast)]
impl CodeCapacityToricCode {
    pub fn new(d: VertexNum, p: f64) -> Self {
        let mut code = Self::create_code(d);
        code.set_probability(p);
        code
    }

    pub fn create_code(d: VertexNum) -> Self {
        let code = PhenomenologicalToricCode::create_code(d, 0);
        Self {
            vertices: code.vertices,
            edges: code.edges,
            logical_cuts: code.logical_cuts,
        }
    }
}

/// toric code with `noisy_measurements` imperfect measurement rounds capped by a perfect one
#[derive(Clone, Debug)]
pub struct PhenomenologicalToricCode {
    /// vertices in the code
    pub vertices: Vec<CodeVertex>,
    /// nearest-neighbor edges in the decoding graph
    pub edges: Vec<CodeEdge>,
    /// the wrapping horizontal edges and the wrapping vertical edges of all layers
    pub logical_cuts: Vec<Vec<EdgeIndex>>,
}

impl_example_code!(PhenomenologicalToricCode);

#[allow(clippy::unnecessary_cast)]
impl PhenomenologicalToricCode {
    pub fn new(d: VertexNum, noisy_measurements: VertexNum, p: f64) -> Self {
        let mut code = Self::create_code(d, noisy_measurements);
        code.set_probability(p);
        code
    }

    pub fn create_code(d: VertexNum, noisy_measurements: VertexNum) -> Self {
        assert!(d >= 3, "d must be integer >= 3");
        let t_vertex_num = d * d;
        let td = noisy_measurements + 1;
        let vertex_num = t_vertex_num * td;
        let mut edges = Vec::new();
        let mut wrap_horizontal = Vec::new();
        let mut wrap_vertical = Vec::new();
        for t in 0..td {
            let t_bias = t * t_vertex_num;
            for row in 0..d {
                for i in 0..d {
                    let vertex = t_bias + row * d + i;
                    if i + 1 == d {
                        wrap_horizontal.push(edges.len() as EdgeIndex);
                    }
                    edges.push(CodeEdge::new(vertex, t_bias + row * d + (i + 1) % d));
                    if row + 1 == d {
                        wrap_vertical.push(edges.len() as EdgeIndex);
                    }
                    edges.push(CodeEdge::new(vertex, t_bias + ((row + 1) % d) * d + i));
                    if t + 1 < td {
                        edges.push(CodeEdge::new(vertex, vertex + t_vertex_num));
                    }
                }
            }
        }
        let mut code = Self {
            vertices: Vec::new(),
            edges,
            logical_cuts: vec![wrap_horizontal, wrap_vertical],
        };
        code.fill_vertices(vertex_num);
        for t in 0..td {
            for row in 0..d {
                for i in 0..d {
                    let vertex = t * t_vertex_num + row * d + i;
                    code.vertices[vertex as usize].position = VisualizePosition::new(row as f64, i as f64, t as f64);
                }
            }
        }
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visualize_code(code: &mut impl ExampleCode, visualize_filename: String) {
        print_visualize_link(&visualize_filename);
        let mut visualizer = Visualizer::new(Some(visualize_data_folder() + visualize_filename.as_str())).unwrap();
        visualizer.set_positions(code.get_positions(), true);
        visualizer.snapshot("code".to_string(), code).unwrap();
        for round in 0..3 {
            code.generate_random_errors(round);
            visualizer.snapshot(format!("syndrome {}", round + 1), code).unwrap();
        }
    }

    #[test]
    fn example_code_capacity_repetition_code() {
        // cargo test example_code_capacity_repetition_code -- --nocapture
        let mut code = CodeCapacityRepetitionCode::new(7, 0.2);
        code.sanity_check().unwrap();
        assert_eq!(code.vertex_num(), 8);
        assert_eq!(code.get_initializer().virtual_vertices, vec![6, 7]);
        visualize_code(&mut code, "example_code_capacity_repetition_code.json".to_string());
    }

    #[test]
    fn example_code_capacity_planar_code() {
        // cargo test example_code_capacity_planar_code -- --nocapture
        let mut code = CodeCapacityPlanarCode::new(7, 0.1);
        code.sanity_check().unwrap();
        assert_eq!(code.vertex_num(), 8 * 7);
        assert_eq!(code.logical_cuts()[0].len(), 7);
        visualize_code(&mut code, "example_code_capacity_planar_code.json".to_string());
    }

    #[test]
    fn example_phenomenological_planar_code() {
        // cargo test example_phenomenological_planar_code -- --nocapture
        let mut code = PhenomenologicalPlanarCode::new(5, 4, 0.01);
        code.sanity_check().unwrap();
        assert_eq!(code.vertex_num(), 6 * 5 * 5);
        visualize_code(&mut code, "example_phenomenological_planar_code.json".to_string());
    }

    #[test]
    fn example_toric_codes() {
        // cargo test example_toric_codes -- --nocapture
        let mut code = CodeCapacityToricCode::new(5, 0.1);
        code.sanity_check().unwrap();
        assert_eq!(code.edges.len(), 2 * 25);
        assert!(code.get_initializer().virtual_vertices.is_empty());
        visualize_code(&mut code, "example_code_capacity_toric_code.json".to_string());
        let code = PhenomenologicalToricCode::new(3, 2, 0.1);
        code.sanity_check().unwrap();
        assert_eq!(code.edges.len(), 2 * 27 + 2 * 9);
        assert_eq!(code.logical_cuts()[0].len(), 9);
    }

    #[test]
    fn example_code_random_errors_match_defects() {
        // cargo test example_code_random_errors_match_defects -- --nocapture
        let mut code = PhenomenologicalPlanarCode::new(5, 2, 0.1);
        code.set_erasure_probability(0.05);
        let initializer = code.get_initializer();
        for seed in 0..20 {
            let syndrome = code.generate_random_errors(seed);
            let expected: Vec<VertexIndex> = initializer.syndrome_of(&code.get_errors()).into_iter().collect();
            assert_eq!(syndrome.defect_vertices, expected);
            // the same seed gives the same errors
            let again = code.generate_random_errors(seed);
            assert_eq!(again.defect_vertices, syndrome.defect_vertices);
            assert_eq!(again.erasures, syndrome.erasures);
        }
    }

    #[test]
    fn example_code_logical_error() {
        // cargo test example_code_logical_error -- --nocapture
        let mut code = CodeCapacityRepetitionCode::new(5, 0.);
        // a single error next to the left boundary
        code.set_errors(&[4]);
        assert_eq!(code.get_defect_vertices(), vec![0]);
        assert!(!code.logical_error(&[4]));
        // correcting toward the right boundary completes a logical operator
        assert!(code.logical_error(&[0, 1, 2, 3]));
        // toric: a closed loop around one plaquette is trivial, a wrapping loop is not
        let mut toric = CodeCapacityToricCode::new(3, 0.);
        toric.set_errors(&[]);
        // vertex (row, i) has horizontal edge 2 * (3 * row + i) and vertical edge 2 * (3 * row + i) + 1
        let plaquette = vec![0, 1, 3, 2 * 3];
        assert!(toric.get_initializer().syndrome_of(&plaquette).is_empty());
        assert!(!toric.logical_error(&plaquette));
        let wrapping = vec![0, 2, 4];
        assert!(toric.get_initializer().syndrome_of(&wrapping).is_empty());
        assert!(toric.logical_error(&wrapping));
    }
}
