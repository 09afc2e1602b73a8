use super::rand_xoshiro;
use crate::rand_xoshiro::rand_core::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::prelude::*;
use std::time::Instant;

cfg_if::cfg_if! {
    if #[cfg(feature="u32_index")] {
        // use u32 to store index, for less memory usage
        pub type EdgeIndex = u32;
        pub type VertexIndex = u32;  // the vertex index in the decoding graph
        pub type VertexNum = VertexIndex;
    } else {
        pub type EdgeIndex = usize;
        pub type VertexIndex = usize;
        pub type VertexNum = VertexIndex;
    }
}

/// index of a cluster in the per-round cluster arena
pub type ClusterIndex = usize;
/// index of a node in the per-round node-suspension arena
pub type NodeIndex = usize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverInitializer {
    /// the number of vertices
    pub vertex_num: VertexNum,
    /// edges as vertex pairs, where vertex indices are within the range [0, vertex_num)
    pub edges: Vec<(VertexIndex, VertexIndex)>,
    /// the virtual vertices, i.e. boundary pseudo-ancillas of a planar code
    pub virtual_vertices: Vec<VertexIndex>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyndromePattern {
    /// the vertices corresponding to defect measurements
    pub defect_vertices: Vec<VertexIndex>,
    /// the edges that experience erasures, i.e. known error locations
    #[serde(default = "default_erasures")]
    pub erasures: Vec<EdgeIndex>,
}

pub fn default_erasures() -> Vec<EdgeIndex> {
    vec![]
}

impl SyndromePattern {
    pub fn new(defect_vertices: Vec<VertexIndex>, erasures: Vec<EdgeIndex>) -> Self {
        Self {
            defect_vertices,
            erasures,
        }
    }
    pub fn new_vertices(defect_vertices: Vec<VertexIndex>) -> Self {
        Self::new(defect_vertices, vec![])
    }
    pub fn new_empty() -> Self {
        Self::new(vec![], vec![])
    }
}

impl SolverInitializer {
    pub fn new(
        vertex_num: VertexNum,
        edges: Vec<(VertexIndex, VertexIndex)>,
        virtual_vertices: Vec<VertexIndex>,
    ) -> SolverInitializer {
        SolverInitializer {
            vertex_num,
            edges,
            virtual_vertices,
        }
    }

    /// the defects that a correction (a set of edges) would produce on a clean lattice
    #[allow(clippy::unnecessary_cast)]
    pub fn syndrome_of(&self, subgraph: &[EdgeIndex]) -> BTreeSet<VertexIndex> {
        let mut defects = BTreeSet::new();
        for edge_index in subgraph {
            let (left, right) = self.edges[*edge_index as usize];
            for vertex_index in [left, right] {
                if defects.contains(&vertex_index) {
                    defects.remove(&vertex_index);
                } else {
                    defects.insert(vertex_index);
                }
            }
        }
        // remove virtual vertices
        for vertex_index in self.virtual_vertices.iter() {
            defects.remove(vertex_index);
        }
        defects
    }

    /// reject graphs the decoder cannot work on, returning the reason
    #[allow(clippy::unnecessary_cast)]
    pub fn sanity_check(&self) -> Result<(), String> {
        if self.vertex_num == 0 {
            return Err("at least one vertex required".to_string());
        }
        for (edge_index, &(i, j)) in self.edges.iter().enumerate() {
            if i == j {
                return Err(format!("edge {} connects vertex {} to itself", edge_index, i));
            }
            if i >= self.vertex_num || j >= self.vertex_num {
                return Err(format!(
                    "edge {} ({}, {}) connected to an invalid vertex, vertex_num = {}",
                    edge_index, i, j, self.vertex_num
                ));
            }
        }
        for &virtual_vertex in self.virtual_vertices.iter() {
            if virtual_vertex >= self.vertex_num {
                return Err(format!("invalid virtual vertex {}", virtual_vertex));
            }
        }
        Ok(())
    }
}

/// timestamp type determines how many fast clear before a hard clear is required, see [`FastClear`]
pub type FastClearTimestamp = usize;

/// per-round state that is reset lazily: an object whose timestamp differs from the decoder's active timestamp
/// holds stale data from an earlier round and must be cleared before its fields are trusted
pub trait FastClear {
    /// user provided method to actually clear the fields
    fn hard_clear(&mut self);

    /// get timestamp
    fn get_timestamp(&self) -> FastClearTimestamp;

    /// set timestamp
    fn set_timestamp(&mut self, timestamp: FastClearTimestamp);

    /// dynamically clear it if not already cleared; it's safe to call many times
    #[inline(always)]
    fn dynamic_clear(&mut self, active_timestamp: FastClearTimestamp) {
        if self.get_timestamp() != active_timestamp {
            self.hard_clear();
            self.set_timestamp(active_timestamp);
        }
    }

    /// whether the per-round fields belong to the active round
    #[inline(always)]
    fn is_live(&self, active_timestamp: FastClearTimestamp) -> bool {
        self.get_timestamp() == active_timestamp
    }
}

#[allow(dead_code)]
/// use Xoshiro256StarStar for deterministic random number generator
pub type DeterministicRng = rand_xoshiro::Xoshiro256StarStar;

pub trait F64Rng {
    fn next_f64(&mut self) -> f64;
}

impl F64Rng for DeterministicRng {
    fn next_f64(&mut self) -> f64 {
        f64::from_bits(0x3FF << 52 | self.next_u64() >> 12) - 1.
    }
}

/// record the decoding time of multiple syndrome patterns
pub struct BenchmarkProfiler {
    /// each record corresponds to a different syndrome pattern
    pub records: Vec<BenchmarkProfilerEntry>,
    /// summation of all decoding time
    pub sum_round_time: f64,
    /// defect count
    pub sum_defect: usize,
    /// noisy measurement round
    pub noisy_measurements: VertexNum,
    /// the file to output the profiler results
    pub benchmark_profiler_output: Option<File>,
}

impl BenchmarkProfiler {
    pub fn new(noisy_measurements: VertexNum, detail_log_file: Option<String>) -> std::io::Result<Self> {
        let benchmark_profiler_output = match detail_log_file {
            Some(filename) => {
                let mut file = File::create(filename)?;
                file.write_all(
                    serde_json::to_string(&json!({
                        "noisy_measurements": noisy_measurements,
                    }))?
                    .as_bytes(),
                )?;
                file.write_all(b"\n")?;
                Some(file)
            }
            None => None,
        };
        Ok(Self {
            records: vec![],
            sum_round_time: 0.,
            sum_defect: 0,
            noisy_measurements,
            benchmark_profiler_output,
        })
    }
    /// record the beginning of a decoding procedure
    pub fn begin(&mut self, syndrome_pattern: &SyndromePattern) {
        // sanity check last entry, if exists, is complete
        if let Some(last_entry) = self.records.last() {
            assert!(
                last_entry.is_complete(),
                "the last benchmark profiler entry is not complete, make sure to call `begin` and `end` in pairs"
            );
        }
        let mut entry = BenchmarkProfilerEntry::new(syndrome_pattern);
        entry.record_begin();
        self.records.push(entry);
    }
    /// record the ending of a decoding procedure, together with the counters reported by the decoder
    pub fn end(&mut self, decoder_profile: Option<serde_json::Value>) -> std::io::Result<()> {
        let last_entry = self
            .records
            .last_mut()
            .expect("last entry not exists, call `begin` before `end`");
        let round_time = last_entry.record_end();
        self.sum_round_time += round_time;
        self.sum_defect += last_entry.defect_num;
        if let Some(file) = self.benchmark_profiler_output.as_mut() {
            let mut value = json!({
                "round_time": round_time,
                "defect_num": last_entry.defect_num,
            });
            if let (Some(object), Some(decoder_profile)) = (value.as_object_mut(), decoder_profile) {
                object.insert("decoder_profile".to_string(), decoder_profile);
            }
            file.write_all(serde_json::to_string(&value)?.as_bytes())?;
            file.write_all(b"\n")?;
        }
        Ok(())
    }
    /// print out a brief one-line statistics
    pub fn brief(&self) -> String {
        let total = self.sum_round_time / (self.records.len() as f64);
        let per_round = total / (1. + self.noisy_measurements as f64);
        let per_defect = self.sum_round_time / (self.sum_defect as f64);
        format!("total: {total:.3e}, round: {per_round:.3e}, defect: {per_defect:.3e},")
    }
}

pub struct BenchmarkProfilerEntry {
    /// the number of defects of this decoding problem
    pub defect_num: usize,
    /// the time of beginning a decoding procedure
    begin_time: Option<Instant>,
    /// interval between calling [`Self::record_begin`] to calling [`Self::record_end`]
    pub round_time: Option<f64>,
}

impl BenchmarkProfilerEntry {
    pub fn new(syndrome_pattern: &SyndromePattern) -> Self {
        Self {
            defect_num: syndrome_pattern.defect_vertices.len(),
            begin_time: None,
            round_time: None,
        }
    }
    /// record the beginning of a decoding procedure
    pub fn record_begin(&mut self) {
        assert_eq!(self.begin_time, None, "do not call `record_begin` twice on the same entry");
        self.begin_time = Some(Instant::now());
    }
    /// record the ending of a decoding procedure
    pub fn record_end(&mut self) -> f64 {
        let begin_time = self
            .begin_time
            .as_ref()
            .expect("make sure to call `record_begin` before calling `record_end`");
        let round_time = begin_time.elapsed().as_secs_f64();
        self.round_time = Some(round_time);
        round_time
    }
    pub fn is_complete(&self) -> bool {
        self.round_time.is_some()
    }
}
