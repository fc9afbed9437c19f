/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Command line interface
//!
//! Every subcommand reads one JSON configuration (see
//! [`AnalysisConfig`](crate::input::AnalysisConfig)) and writes its result as
//! pretty-printed JSON, to a file with `-o` or to standard output.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::input::{self, AnalysisConfig};
use crate::pipeline::Pipeline;
use crate::refine::Parameters;

#[derive(Parser, Debug)]
#[command(name = "lasdia", version, about = "Liquid and amorphous structure from diffraction data")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the normalized, smoothed and damped S(Q)
    Sq(RunArgs),
    /// Compute the Kaplow-refined F(r), g(r) and back-transformed S(Q)
    Fr(RunArgs),
    /// Minimize chi-square over scale factor and density
    Optimize(RunArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Analysis configuration (JSON)
    pub config: PathBuf,

    /// Output file, standard output when absent
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the scale factor of the configuration
    #[arg(long)]
    pub scale_factor: Option<f64>,

    /// Override the density of the configuration (atoms/nm³)
    #[arg(long)]
    pub density: Option<f64>,
}

impl Cli {
    /// Log filter matching the number of `-v` flags
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Serialize)]
struct StructureFactorReport {
    parameters: Parameters,
    alpha: f64,
    asymptote: f64,
    q: Vec<f64>,
    s_q: Vec<f64>,
    q_smoothed: Vec<f64>,
    s_q_smoothed: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct RealSpaceReport {
    parameters: Parameters,
    chi_square: f64,
    r: Vec<f64>,
    f_r: Vec<f64>,
    g_r: Vec<f64>,
    q: Vec<f64>,
    s_q: Vec<f64>,
    s_q_back_transformed: Vec<f64>,
}

/// Execute a parsed command line
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Sq(args) => {
            let (_, pipeline, parameters) = prepare(args)?;
            let state = pipeline
                .evaluate(&parameters)
                .context("Failed to evaluate S(Q)")?;
            write_json(
                args,
                &StructureFactorReport {
                    parameters,
                    alpha: state.alpha,
                    asymptote: state.asymptote,
                    q: state.q,
                    s_q: state.s_q,
                    q_smoothed: state.q_smoothed,
                    s_q_smoothed: state.s_q_smoothed,
                },
            )
        }
        Command::Fr(args) => {
            let (_, pipeline, parameters) = prepare(args)?;
            let state = pipeline
                .evaluate(&parameters)
                .context("Failed to evaluate F(r)")?;
            let rule = pipeline.settings().transform.rule;
            let report = RealSpaceReport {
                parameters,
                chi_square: state.chi_square,
                g_r: state.pair_distribution(),
                s_q: state.refined_structure_factor(),
                s_q_back_transformed: state.back_transformed_structure_factor(rule),
                r: state.f_r.r,
                f_r: state.f_r.f,
                q: state.q_smoothed,
            };
            write_json(args, &report)
        }
        Command::Optimize(args) => {
            let (config, pipeline, parameters) = prepare(args)?;
            let analysis = pipeline
                .optimize(parameters, config.search, config.driver)
                .context("Failed to minimize chi-square")?;
            if !analysis.minimization.converged {
                log::warn!(
                    "Minimization stopped after {} iterations without converging",
                    analysis.minimization.iterations
                );
            }
            write_json(args, &analysis)
        }
    }
}

fn prepare(args: &RunArgs) -> anyhow::Result<(AnalysisConfig, Pipeline, Parameters)> {
    let (config, inputs) = input::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let pipeline =
        Pipeline::from_config(&config, &inputs).context("Failed to set up the analysis")?;

    let mut parameters = config.initial_parameters();
    if let Some(scale_factor) = args.scale_factor {
        parameters.scale_factor = scale_factor;
    }
    if let Some(density) = args.density {
        parameters.density = density;
    }
    Ok((config, pipeline, parameters))
}

fn write_json<T: Serialize>(args: &RunArgs, value: &T) -> anyhow::Result<()> {
    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            log::info!("Wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optimize() {
        let cli = Cli::try_parse_from([
            "lasdia", "-vv", "optimize", "run.json", "-o", "out.json", "--density", "21.5",
        ])
        .unwrap();
        assert_eq!(cli.log_level(), log::LevelFilter::Debug);
        match cli.command {
            Command::Optimize(args) => {
                assert_eq!(args.config, PathBuf::from("run.json"));
                assert_eq!(args.output, Some(PathBuf::from("out.json")));
                assert_eq!(args.density, Some(21.5));
                assert_eq!(args.scale_factor, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_config_is_required() {
        assert!(Cli::try_parse_from(["lasdia", "sq"]).is_err());
        let cli = Cli::try_parse_from(["lasdia", "fr", "run.json"]).unwrap();
        assert_eq!(cli.log_level(), log::LevelFilter::Warn);
    }
}
