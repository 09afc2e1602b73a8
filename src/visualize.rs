//! Visualizer
//!
//! This module records the progress of the union-find decoder as a sequence of JSON snapshots
//!

use crate::chrono::Local;
use crate::serde::{Deserialize, Serialize};
use crate::serde_json;
use crate::urlencoding;
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};

pub trait UnionFindVisualizer {
    /// take a snapshot, set `abbrev` to true to save space
    fn snapshot(&self, abbrev: bool) -> serde_json::Value;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizePosition {
    /// vertical axis, -i is up, +i is down (left-up corner is smallest i,j)
    pub i: f64,
    /// horizontal axis, -j is left, +j is right (left-up corner is smallest i,j)
    pub j: f64,
    /// time axis, top and bottom (orthogonal to the initial view, which looks at -t direction)
    pub t: f64,
}

impl VisualizePosition {
    /// create a visualization position
    pub fn new(i: f64, j: f64, t: f64) -> Self {
        Self { i, j, t }
    }
}

#[derive(Debug)]
pub struct Visualizer {
    /// save to file if applicable
    file: Option<File>,
    /// positions of the vertices
    positions: Vec<VisualizePosition>,
    /// all snapshots
    snapshots: Vec<(String, serde_json::Value)>,
}

/// fill in the optional fields so that every vertex and edge has the same shape
pub fn snapshot_fix_missing_fields(value: &mut serde_json::Value, abbrev: bool) {
    let value = value.as_object_mut().expect("snapshot must be an object");
    let vertices = value
        .get_mut("vertices")
        .expect("missing unrecoverable field")
        .as_array_mut()
        .expect("vertices must be an array");
    for vertex in vertices {
        let vertex = vertex.as_object_mut().expect("each vertex must be an object");
        let key_is_virtual = if abbrev { "v" } else { "is_virtual" };
        let key_is_defect = if abbrev { "s" } else { "is_defect" };
        assert!(vertex.contains_key(key_is_virtual), "missing unrecoverable field");
        if !vertex.contains_key(key_is_defect) {
            vertex.insert(key_is_defect.to_string(), json!(0)); // by default no defect
        }
    }
    let edges = value
        .get_mut("edges")
        .expect("missing unrecoverable field")
        .as_array_mut()
        .expect("edges must be an array");
    for edge in edges {
        let edge = edge.as_object_mut().expect("each edge must be an object");
        let key_left = if abbrev { "l" } else { "left" };
        let key_right = if abbrev { "r" } else { "right" };
        let key_support = if abbrev { "g" } else { "support" };
        assert!(edge.contains_key(key_left), "missing unrecoverable field");
        assert!(edge.contains_key(key_right), "missing unrecoverable field");
        if !edge.contains_key(key_support) {
            edge.insert(key_support.to_string(), json!(0)); // by default no growth
        }
    }
}

impl Visualizer {
    /// create a new visualizer with target filename; the parent folder is created if missing
    pub fn new(mut filename: Option<String>) -> std::io::Result<Self> {
        if cfg!(feature = "disable_visualizer") {
            filename = None; // do not open file
        }
        let file = match filename {
            Some(filename) => {
                if let Some(parent) = std::path::Path::new(&filename).parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Some(File::create(filename)?)
            }
            None => None,
        };
        Ok(Self {
            file,
            positions: Vec::new(),
            snapshots: Vec::new(),
        })
    }

    /// append another snapshot, and also update the file in case the program crashes
    pub fn snapshot(&mut self, name: String, object: &impl UnionFindVisualizer) -> std::io::Result<()> {
        if cfg!(feature = "disable_visualizer") {
            return Ok(());
        }
        let abbrev = true;
        let mut value = object.snapshot(abbrev);
        snapshot_fix_missing_fields(&mut value, abbrev);
        self.snapshots.push((name, value));
        self.save()?;
        Ok(())
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn snapshot_names(&self) -> impl Iterator<Item = &str> {
        self.snapshots.iter().map(|(name, _)| name.as_str())
    }

    /// save to file
    pub fn save(&mut self) -> std::io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.set_len(0)?; // truncate the file
            file.seek(SeekFrom::Start(0))?; // move the cursor to the front
            file.write_all(
                json!({
                    "snapshots": &self.snapshots,
                    "positions": &self.positions,
                })
                .to_string()
                .as_bytes(),
            )?;
            file.sync_all()?;
        }
        Ok(())
    }

    /// set positions of the vertices and optionally center all positions
    pub fn set_positions(&mut self, mut positions: Vec<VisualizePosition>, center: bool) {
        if center && !positions.is_empty() {
            let (mut ci, mut cj, mut ct) = (0., 0., 0.);
            for position in positions.iter() {
                ci += position.i;
                cj += position.j;
                ct += position.t;
            }
            ci /= positions.len() as f64;
            cj /= positions.len() as f64;
            ct /= positions.len() as f64;
            for position in positions.iter_mut() {
                position.i -= ci;
                position.j -= cj;
                position.t -= ct;
            }
        }
        self.positions = positions;
    }
}

const DEFAULT_VISUALIZE_DATA_FOLDER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/visualize/data/");

pub fn visualize_data_folder() -> String {
    DEFAULT_VISUALIZE_DATA_FOLDER.to_string()
}

pub fn static_visualize_data_filename() -> String {
    "static.json".to_string()
}

pub fn auto_visualize_data_filename() -> String {
    format!("{}.json", Local::now().format("%Y%m%d-%H-%M-%S%.3f"))
}

pub fn print_visualize_link_with_parameters(filename: &str, parameters: Vec<(String, String)>) {
    let mut link = format!("http://localhost:8066?filename={}", urlencoding::encode(filename));
    for (key, value) in parameters.iter() {
        link.push('&');
        link.push_str(&urlencoding::encode(key));
        link.push('=');
        link.push_str(&urlencoding::encode(value));
    }
    println!("snapshots saved, open link {} with a local viewer of {}", link, visualize_data_folder())
}

pub fn print_visualize_link(filename: &str) {
    print_visualize_link_with_parameters(filename, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::super::decoder::*;
    use super::super::example_codes::*;
    use super::*;

    #[test]
    fn visualize_decoder_steps() {
        // cargo test visualize_decoder_steps -- --nocapture
        let visualize_filename = "visualize_decoder_steps.json".to_string();
        let mut code = CodeCapacityPlanarCode::new(5, 0.1);
        let mut visualizer = Visualizer::new(Some(visualize_data_folder() + visualize_filename.as_str())).unwrap();
        visualizer.set_positions(code.get_positions(), true); // automatic center all vertices
        print_visualize_link(&visualize_filename);
        code.set_defect_vertices(&[1, 2, 13]);
        visualizer.snapshot("code".to_string(), &code).unwrap();
        let config = DecoderConfig {
            step_bucket: true,
            step_cluster: true,
            step_peel: true,
            ..Default::default()
        };
        let mut decoder = UnionFindDecoder::new(&code.get_initializer(), config);
        decoder
            .decode_visualizer(&code.get_syndrome(), Some(&mut visualizer))
            .unwrap();
        if cfg!(not(feature = "disable_visualizer")) {
            let names: Vec<&str> = visualizer.snapshot_names().collect();
            assert_eq!(names[0], "code");
            assert_eq!(names[1], "clusters found");
            assert!(names.iter().any(|name| name.starts_with("bucket ")));
            assert!(names.iter().any(|name| name.starts_with("peel edge")));
            assert_eq!(names.last().copied(), Some("peeled"));
        }
    }

    #[test]
    fn visualize_fix_missing_fields() {
        // cargo test visualize_fix_missing_fields -- --nocapture
        let mut value = json!({
            "vertices": [{ "v": 0 }, { "v": 1, "s": 0 }],
            "edges": [{ "l": 0, "r": 1 }],
        });
        snapshot_fix_missing_fields(&mut value, true);
        assert_eq!(value["vertices"][0]["s"], json!(0));
        assert_eq!(value["edges"][0]["g"], json!(0));
        // no file: snapshots are still kept in memory
        let code = CodeCapacityRepetitionCode::new(3, 0.1);
        let mut visualizer = Visualizer::new(None).unwrap();
        visualizer.snapshot("repetition".to_string(), &code).unwrap();
        if cfg!(not(feature = "disable_visualizer")) {
            assert_eq!(visualizer.snapshot_count(), 1);
        }
    }
}
