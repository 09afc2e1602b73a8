extern crate clap;
extern crate pbr;
extern crate rand;

use balanced_bloom::decoder::*;
use balanced_bloom::example_codes::*;
use balanced_bloom::simulation::*;
use balanced_bloom::util::*;
use balanced_bloom::visualize::*;
use clap::{Parser, Subcommand, ValueEnum};
use pbr::ProgressBar;

#[derive(Parser, Clone)]
#[clap(author = clap::crate_authors!(", "))]
#[clap(version = env!("CARGO_PKG_VERSION"))]
#[clap(about = "Union-Find decoder with balanced bloom for surface code error correction")]
#[clap(color = clap::ColorChoice::Auto)]
#[clap(propagate_version = true)]
#[clap(subcommand_required = true)]
#[clap(arg_required_else_help = true)]
pub struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
#[allow(clippy::large_enum_variant)]
enum Commands {
    /// estimate the logical error rate of a code with random errors
    Benchmark {
        /// code distance
        #[clap(value_parser)]
        d: VertexNum,
        /// physical error rate of each edge
        #[clap(value_parser)]
        p: f64,
        /// erasure rate of each edge
        #[clap(long, default_value_t = 0.)]
        pe: f64,
        /// rounds of noisy measurement, valid only for phenomenological codes
        #[clap(short = 'n', long, default_value_t = 0)]
        noisy_measurements: VertexNum,
        /// code type
        #[clap(short = 'c', long, value_enum, default_value_t = CodeType::Planar)]
        code_type: CodeType,
        /// the number of decoding rounds, evenly split between workers
        #[clap(short = 'r', long, default_value_t = 1000)]
        total_rounds: usize,
        /// random seed; a random one is drawn if not given
        #[clap(short = 's', long)]
        seed: Option<u64>,
        /// decoder configuration as json, e.g. `{"node_suspension":true}`
        #[clap(long, default_value_t = ("{}").to_string())]
        decoder_config: String,
        /// number of independent workers
        #[clap(short = 'w', long, default_value_t = 1)]
        workers: usize,
        /// write the steps of the first round into the default visualizer file
        #[clap(long, action)]
        enable_visualizer: bool,
        /// print the decoding time of every round into this file, only with a single worker
        #[clap(long)]
        benchmark_profiler_output: Option<String>,
    },
    /// testing features
    #[clap(subcommand)]
    Test(TestCommands),
}

#[derive(Subcommand, Clone)]
enum TestCommands {
    /// decode random errors with every decoder configuration and check the correction cancels the syndrome
    Serial {
        /// the number of decoding rounds per code and configuration
        #[clap(short = 'r', long, default_value_t = 1000)]
        total_rounds: u64,
        /// write the steps of the last round into the default visualizer file
        #[clap(long, action)]
        enable_visualizer: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CodeType {
    Repetition,
    Planar,
    PhenomenologicalPlanar,
    Toric,
    PhenomenologicalToric,
}

fn test_configs() -> Vec<(&'static str, DecoderConfig)> {
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
    ]
}

/// decode a single round while recording every step
fn visualize_round(code: &mut impl ExampleCode, config: &DecoderConfig, seed: u64) -> Result<(), DecoderError> {
    let mut visualizer = Visualizer::new(Some(visualize_data_folder() + static_visualize_data_filename().as_str()))?;
    visualizer.set_positions(code.get_positions(), true); // automatic center all vertices
    let syndrome_pattern = code.generate_random_errors(seed);
    visualizer.snapshot("syndrome".to_string(), &*code)?;
    let config = DecoderConfig {
        step_bucket: true,
        step_cluster: true,
        step_peel: true,
        ..config.clone()
    };
    let mut decoder = UnionFindDecoder::new(&code.get_initializer(), config);
    decoder.decode_visualizer(&syndrome_pattern, Some(&mut visualizer))?;
    print_visualize_link(&static_visualize_data_filename());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn benchmark<Code>(
    mut code: Code,
    config: DecoderConfig,
    total_rounds: usize,
    seed: u64,
    workers: usize,
    enable_visualizer: bool,
    benchmark_profiler_output: Option<String>,
    noisy_measurements: VertexNum,
) -> Result<BenchmarkResult, DecoderError>
where
    Code: ExampleCode + Clone + Send + Sync,
{
    if let Err(message) = code.sanity_check() {
        panic!("invalid code: {}", message);
    }
    if enable_visualizer {
        visualize_round(&mut code, &config, seed)?;
    }
    let rounds_per_worker = (total_rounds + workers - 1) / workers;
    let mut pb = ProgressBar::on(std::io::stderr(), (rounds_per_worker * workers) as u64);
    let mut result = BenchmarkResult::default();
    if workers == 1 {
        // decode in place to record the time of each round
        let mut profiler = BenchmarkProfiler::new(noisy_measurements, benchmark_profiler_output)?;
        let mut decoder = UnionFindDecoder::new(&code.get_initializer(), config);
        for round in 0..rounds_per_worker as u64 {
            pb.set(round);
            let syndrome_pattern = code.generate_random_errors(seed + round);
            profiler.begin(&syndrome_pattern);
            decoder.decode(&syndrome_pattern)?;
            profiler.end(serde_json::to_value(&decoder.profile).ok())?;
            result.record(classify(&code, &decoder, &syndrome_pattern));
            if round % 100 == 0 {
                pb.message(format!("{} ", profiler.brief()).as_str());
            }
        }
        pb.finish();
        println!();
        println!("{}", profiler.brief());
    } else {
        if benchmark_profiler_output.is_some() {
            eprintln!("[warning] benchmark profiler output ignored with {} workers", workers);
        }
        let chunk = std::cmp::max(1, rounds_per_worker / 100) as u64;
        let mut begin = 0;
        while begin < rounds_per_worker as u64 {
            let end = std::cmp::min(begin + chunk, rounds_per_worker as u64);
            let partial = run_trials(&code, &config, workers, begin..end, seed)?;
            result = result.merge(partial);
            begin = end;
            pb.set(begin * workers as u64);
            pb.message(format!("{:.3e} ", result.logical_error_rate()).as_str());
        }
        pb.finish();
        println!();
    }
    Ok(result)
}

impl Cli {
    pub fn run(self) -> Result<(), DecoderError> {
        match self.command {
            Commands::Benchmark {
                d,
                p,
                pe,
                noisy_measurements,
                code_type,
                total_rounds,
                seed,
                decoder_config,
                workers,
                enable_visualizer,
                benchmark_profiler_output,
            } => {
                assert!(workers > 0, "at least one worker required");
                let config: DecoderConfig =
                    serde_json::from_str(&decoder_config).expect("decoder config not recognized");
                let seed = seed.unwrap_or_else(rand::random);
                println!("seed: {}", seed);
                macro_rules! run_benchmark {
                    ($code:expr) => {{
                        let mut code = $code;
                        code.set_erasure_probability(pe);
                        benchmark(
                            code,
                            config,
                            total_rounds,
                            seed,
                            workers,
                            enable_visualizer,
                            benchmark_profiler_output,
                            noisy_measurements,
                        )?
                    }};
                }
                let result = match code_type {
                    CodeType::Repetition => run_benchmark!(CodeCapacityRepetitionCode::new(d, p)),
                    CodeType::Planar => run_benchmark!(CodeCapacityPlanarCode::new(d, p)),
                    CodeType::PhenomenologicalPlanar => {
                        run_benchmark!(PhenomenologicalPlanarCode::new(d, noisy_measurements, p))
                    }
                    CodeType::Toric => run_benchmark!(CodeCapacityToricCode::new(d, p)),
                    CodeType::PhenomenologicalToric => {
                        run_benchmark!(PhenomenologicalToricCode::new(d, noisy_measurements, p))
                    }
                };
                println!("{}", result);
                println!("{}", serde_json::json!(result));
            }
            Commands::Test(TestCommands::Serial {
                total_rounds,
                enable_visualizer,
            }) => {
                let mut codes = Vec::<(String, Box<dyn ExampleCode>)>::new();
                for p in [0.01, 0.03, 0.1, 0.3] {
                    for d in [3, 5, 9] {
                        codes.push((format!("repetition {d} {p}"), Box::new(CodeCapacityRepetitionCode::new(d, p))));
                        codes.push((format!("planar {d} {p}"), Box::new(CodeCapacityPlanarCode::new(d, p))));
                        codes.push((
                            format!("phenomenological {d} {p}"),
                            Box::new(PhenomenologicalPlanarCode::new(d, d, p)),
                        ));
                        codes.push((format!("toric {d} {p}"), Box::new(CodeCapacityToricCode::new(d, p))));
                        codes.push((
                            format!("phenomenological toric {d} {p}"),
                            Box::new(PhenomenologicalToricCode::new(d, d, p)),
                        ));
                    }
                }
                let configs = test_configs();
                let codes_len = codes.len();
                for (code_idx, (code_name, code)) in codes.iter_mut().enumerate() {
                    for (config_name, config) in configs.iter() {
                        let mut pb = ProgressBar::on(std::io::stderr(), total_rounds);
                        pb.message(format!("{code_name} {config_name} [{code_idx}/{codes_len}] ").as_str());
                        let mut decoder = UnionFindDecoder::new(&code.get_initializer(), config.clone());
                        for round in 0..total_rounds {
                            pb.set(round);
                            let syndrome_pattern = code.generate_random_errors(round);
                            decoder.decode(&syndrome_pattern)?;
                            let defects: std::collections::BTreeSet<VertexIndex> =
                                syndrome_pattern.defect_vertices.iter().cloned().collect();
                            assert!(
                                decoder.unresolved_defects().is_empty(),
                                "unresolved defects, round {round}"
                            );
                            assert_eq!(
                                code.get_initializer().syndrome_of(&decoder.subgraph()),
                                defects,
                                "correction does not cancel the syndrome, round {round}"
                            );
                        }
                        pb.finish();
                        println!();
                    }
                }
                if enable_visualizer {
                    let mut code = CodeCapacityPlanarCode::new(7, 0.1);
                    visualize_round(&mut code, &DecoderConfig::node_suspension(), total_rounds)?;
                }
            }
        }
        Ok(())
    }
}

pub fn main() {
    if let Err(error) = Cli::parse().run() {
        eprintln!("[error] {}", error);
        std::process::exit(1);
    }
}
