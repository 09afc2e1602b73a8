//! Simulation
//!
//! Monte-Carlo estimation of the logical error rate: random errors are drawn from an example code, decoded, and the
//! correction is checked against the code's logical cuts. Trials are split over independent workers, each owning a
//! clone of the code and its own decoder, so the results only need to be summed.
//!

use super::decoder::*;
use super::example_codes::*;
use super::util::*;
use crate::rayon::prelude::*;
use crate::serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Range;

/// seeds of different workers never collide as long as a worker runs fewer rounds than this
pub const WORKER_SEED_STRIDE: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    Success,
    /// the correction cancels the syndrome but completes a logical operator
    LogicalError,
    /// some defects could not be matched, e.g. an odd cluster retired to the wastebasket
    Unresolved,
    /// the correction does not reproduce the syndrome
    Invalid,
}

/// aggregated counters; merging is commutative and associative
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub total: usize,
    /// every failed trial, including unresolved and invalid ones
    pub logical_errors: usize,
    pub unresolved: usize,
    pub invalid: usize,
}

impl BenchmarkResult {
    pub fn record(&mut self, outcome: TrialOutcome) {
        self.total += 1;
        match outcome {
            TrialOutcome::Success => {}
            TrialOutcome::LogicalError => {
                self.logical_errors += 1;
            }
            TrialOutcome::Unresolved => {
                self.logical_errors += 1;
                self.unresolved += 1;
            }
            TrialOutcome::Invalid => {
                self.logical_errors += 1;
                self.invalid += 1;
            }
        }
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.total += other.total;
        self.logical_errors += other.logical_errors;
        self.unresolved += other.unresolved;
        self.invalid += other.invalid;
        self
    }

    pub fn logical_error_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.;
        }
        self.logical_errors as f64 / self.total as f64
    }

    /// relative standard deviation of the estimated logical error rate
    pub fn relative_deviation(&self) -> f64 {
        let p = self.logical_error_rate();
        if p == 0. {
            return f64::INFINITY;
        }
        ((1. - p) / (p * self.total as f64)).sqrt()
    }
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "total: {}, logical errors: {}, rate: {:.3e} (±{:.1}%), unresolved: {}, invalid: {}",
            self.total,
            self.logical_errors,
            self.logical_error_rate(),
            100. * self.relative_deviation(),
            self.unresolved,
            self.invalid
        )
    }
}

/// run a single decoding trial with the errors generated from `seed`
pub fn run_trial<Code: ExampleCode>(
    code: &mut Code,
    decoder: &mut UnionFindDecoder,
    seed: u64,
) -> Result<TrialOutcome, DecoderError> {
    let syndrome_pattern = code.generate_random_errors(seed);
    decoder.decode(&syndrome_pattern)?;
    Ok(classify(code, decoder, &syndrome_pattern))
}

/// judge the correction of the last decoding round
pub fn classify<Code: ExampleCode>(
    code: &Code,
    decoder: &UnionFindDecoder,
    syndrome_pattern: &SyndromePattern,
) -> TrialOutcome {
    if !decoder.unresolved_defects().is_empty() {
        return TrialOutcome::Unresolved;
    }
    let correction = decoder.subgraph();
    let defects: BTreeSet<VertexIndex> = syndrome_pattern.defect_vertices.iter().cloned().collect();
    if code.get_initializer().syndrome_of(&correction) != defects {
        return TrialOutcome::Invalid;
    }
    if code.logical_error(&correction) {
        TrialOutcome::LogicalError
    } else {
        TrialOutcome::Success
    }
}

/// run `rounds` on each of `workers` workers; worker `w` decodes round `r` with seed `seed + w * WORKER_SEED_STRIDE + r`
pub fn run_trials<Code>(
    code: &Code,
    config: &DecoderConfig,
    workers: usize,
    rounds: Range<u64>,
    seed: u64,
) -> Result<BenchmarkResult, DecoderError>
where
    Code: ExampleCode + Clone + Send + Sync,
{
    assert!(workers > 0, "at least one worker required");
    let initializer = code.get_initializer();
    let run = || {
        (0..workers)
            .into_par_iter()
            .map(|worker| {
                let mut code = code.clone();
                let mut decoder = UnionFindDecoder::new(&initializer, config.clone());
                let mut result = BenchmarkResult::default();
                for round in rounds.clone() {
                    let trial_seed = seed + worker as u64 * WORKER_SEED_STRIDE + round;
                    result.record(run_trial(&mut code, &mut decoder, trial_seed)?);
                }
                Ok(result)
            })
            .try_reduce(BenchmarkResult::default, |a, b| Ok(a.merge(b)))
    };
    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(thread_pool) => thread_pool.install(run),
        Err(_) => run(), // fall back to the global pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_parallel_matches_serial() {
        // cargo test simulation_parallel_matches_serial -- --nocapture
        let code = CodeCapacityPlanarCode::new(5, 0.08);
        let config = DecoderConfig::default();
        let parallel = run_trials(&code, &config, 3, 0..40, 7).unwrap();
        assert_eq!(parallel.total, 120);
        // the same trials one worker at a time
        let mut serial = BenchmarkResult::default();
        for worker in 0..3 {
            let single = run_trials(&code, &config, 1, 0..40, 7 + worker * WORKER_SEED_STRIDE).unwrap();
            serial = serial.merge(single);
        }
        assert_eq!(parallel, serial);
        assert_eq!(parallel.invalid, 0);
        assert_eq!(parallel.unresolved, 0);
        println!("{}", parallel);
    }

    #[test]
    fn simulation_toric_unresolved_counted() {
        // cargo test simulation_toric_unresolved_counted -- --nocapture
        let mut code = CodeCapacityToricCode::new(3, 0.);
        let mut decoder = UnionFindDecoder::new(&code.get_initializer(), DecoderConfig::default());
        code.set_defect_vertices(&[4]);
        let syndrome_pattern = code.get_syndrome();
        decoder.decode(&syndrome_pattern).unwrap();
        let outcome = classify(&code, &decoder, &syndrome_pattern);
        assert_eq!(outcome, TrialOutcome::Unresolved);
        let mut result = BenchmarkResult::default();
        result.record(outcome);
        result.record(TrialOutcome::Success);
        assert_eq!(result.logical_errors, 1);
        assert_eq!(result.unresolved, 1);
        assert!((result.logical_error_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn simulation_node_suspension_not_worse() {
        // cargo test --release simulation_node_suspension_not_worse -- --nocapture
        // balanced bloom must not lose against uniform growth on the same errors
        let code = CodeCapacityPlanarCode::new(9, 0.08);
        let uniform = run_trials(&code, &DecoderConfig::default(), 4, 0..2500, 1).unwrap();
        let balanced = run_trials(&code, &DecoderConfig::node_suspension(), 4, 0..2500, 1).unwrap();
        println!("uniform: {}", uniform);
        println!("balanced: {}", balanced);
        assert_eq!(balanced.total, uniform.total);
        assert_eq!(balanced.invalid + balanced.unresolved, 0);
        assert!(balanced.logical_errors <= uniform.logical_errors);
    }

    #[test]
    fn simulation_low_noise_node_suspension() {
        // cargo test simulation_low_noise_node_suspension -- --nocapture
        let code = PhenomenologicalPlanarCode::new(5, 4, 0.005);
        let result = run_trials(&code, &DecoderConfig::node_suspension(), 2, 0..50, 0).unwrap();
        assert_eq!(result.total, 100);
        assert_eq!(result.invalid, 0);
        assert_eq!(result.unresolved, 0);
        assert!(result.logical_error_rate() < 0.2);
    }
}
