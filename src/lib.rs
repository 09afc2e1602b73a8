extern crate cfg_if;
extern crate rand_xoshiro;
extern crate priority_queue;
extern crate serde;
#[macro_use]
extern crate serde_json;
extern crate chrono;
extern crate derivative;
extern crate urlencoding;
extern crate rayon;

pub mod util;
pub mod union_find;
pub mod cluster;
pub mod node_suspension;
pub mod decoder;
pub mod visualize;
pub mod example_codes;
pub mod simulation;

use decoder::*;
use util::*;

/// decode with the default union-find configuration (to optimize speed, consider reuse a [`decoder::UnionFindDecoder`] object)
pub fn union_find_decode(
    initializer: &SolverInitializer,
    syndrome_pattern: &SyndromePattern,
) -> Result<Vec<EdgeIndex>, DecoderError> {
    // sanity check
    if let Err(message) = initializer.sanity_check() {
        panic!("invalid decoding graph: {}", message);
    }
    let mut decoder = UnionFindDecoder::new(initializer, DecoderConfig::default());
    decoder.decode(syndrome_pattern)?;
    Ok(decoder.subgraph())
}

#[cfg(test)]
mod tests {
    use super::example_codes::*;
    use super::*;

    #[test]
    fn lib_union_find_decode_repetition() {
        // cargo test lib_union_find_decode_repetition -- --nocapture
        let mut code = CodeCapacityRepetitionCode::new(7, 0.1);
        code.set_errors(&[2, 3]);
        let syndrome_pattern = code.get_syndrome();
        let initializer = code.get_initializer();
        let correction = union_find_decode(&initializer, &syndrome_pattern).unwrap();
        let defects: std::collections::BTreeSet<VertexIndex> =
            syndrome_pattern.defect_vertices.iter().cloned().collect();
        assert_eq!(initializer.syndrome_of(&correction), defects);
        assert!(!code.logical_error(&correction));
    }

    #[test]
    fn lib_union_find_decode_empty() {
        // cargo test lib_union_find_decode_empty -- --nocapture
        let code = CodeCapacityPlanarCode::new(3, 0.1);
        let correction = union_find_decode(&code.get_initializer(), &SyndromePattern::new_empty()).unwrap();
        assert!(correction.is_empty());
    }
}
