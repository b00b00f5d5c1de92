//! # Tensile CLI
//!
//! Command-line front end for `tensile_core`.
//!
//! ```text
//! tensile analyze -i data/group_A/10in/*.csv --plot-type multi
//! tensile visualize -i out/individual_results.csv --x-param D --y-param KE
//! tensile batch -d data --summary
//! ```
//!
//! Logging goes to stderr. `RUST_LOG` takes precedence over `-v`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use tracing_subscriber::EnvFilter;

use tensile_core::analysis::{analyze_file, AnalyzedSpecimen};
use tensile_core::batch::run_batch;
use tensile_core::calculations::Channel;
use tensile_core::plot::{plot_multi_trace, plot_output_data, plot_single_trace, OutputParam};
use tensile_core::report::{
    append_individual_results, append_multi_run_averages, render_multi_line,
    render_specimen_line, MultiRunRow,
};
use tensile_core::settings::OutputSettings;
use tensile_core::summary::MultiRunSummary;

#[derive(Parser, Debug)]
#[command(
    name = "tensile",
    author,
    version,
    about = "Fishing-line tensile test analysis"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze rig CSV exports
    Analyze(AnalyzeArgs),

    /// Plot columns of an individual_results.csv file
    Visualize(VisualizeArgs),

    /// Analyze a group_*/<n>in/*.csv data tree
    Batch(BatchArgs),
}

/// Output options shared by every subcommand.
#[derive(Args, Debug)]
struct OutputArgs {
    /// Output directory [default: out]
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    output: Option<PathBuf>,

    /// JSON settings file; command-line flags override it
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
}

impl OutputArgs {
    fn settings(&self) -> Result<OutputSettings> {
        let mut settings = match &self.config {
            Some(path) => OutputSettings::load(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => OutputSettings::default(),
        };
        if let Some(dir) = &self.output {
            settings.output_dir = dir.clone();
        }
        Ok(settings)
    }
}

/// Output options for subcommands that render plots as a side product.
#[derive(Args, Debug)]
struct AnalysisOutputArgs {
    #[command(flatten)]
    output: OutputArgs,

    /// Skip SVG plot rendering
    #[arg(long)]
    no_plots: bool,
}

impl AnalysisOutputArgs {
    fn settings(&self) -> Result<OutputSettings> {
        let mut settings = self.output.settings()?;
        if self.no_plots {
            settings.write_plots = false;
        }
        Ok(settings)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum PlotType {
    Single,
    Multi,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Input CSV files
    #[arg(short, long, required = true, num_args = 1.., value_hint = ValueHint::FilePath)]
    input: Vec<PathBuf>,

    #[command(flatten)]
    output: AnalysisOutputArgs,

    /// One plot per file, or all files overlaid
    #[arg(long, value_enum, default_value_t = PlotType::Single)]
    plot_type: PlotType,

    /// X axis: Time, Force, Stroke, Stress or Strain
    #[arg(long, default_value = "Strain")]
    x_param: Channel,

    /// Y axis: Time, Force, Stroke, Stress or Strain
    #[arg(long, default_value = "Stress")]
    y_param: Channel,
}

#[derive(Args, Debug)]
struct VisualizeArgs {
    /// individual_results.csv files to plot
    #[arg(short, long, required = true, num_args = 1.., value_hint = ValueHint::FilePath)]
    input: Vec<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,

    /// X axis: KE, V, D or L
    #[arg(long, default_value = "D")]
    x_param: OutputParam,

    /// Y axis: KE, V, D or L
    #[arg(long, default_value = "KE")]
    y_param: OutputParam,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Root of the group_*/<n>in/ data tree
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    data_dir: PathBuf,

    #[command(flatten)]
    output: AnalysisOutputArgs,

    /// Also write summary_report.txt and the comparison plot
    #[arg(long)]
    summary: bool,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Analyze each file on its own; failures are reported and left out.
fn analyze_each(paths: &[PathBuf]) -> (Vec<AnalyzedSpecimen>, usize) {
    let mut specimens = Vec::with_capacity(paths.len());
    let mut failed = 0;
    for path in paths {
        match analyze_file(path) {
            Ok(specimen) => specimens.push(specimen),
            Err(err) => {
                failed += 1;
                tracing::error!(
                    path = %path.display(),
                    code = err.error_code(),
                    "analysis failed"
                );
                eprintln!("Error processing {}: {}", path.display(), err);
            }
        }
    }
    (specimens, failed)
}

fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let settings = args.output.settings()?;
    let (specimens, failed) = analyze_each(&args.input);

    if !specimens.is_empty() {
        write_analysis_outputs(args, &settings, &specimens)?;
    }

    if failed > 0 {
        bail!("{} of {} file(s) could not be analyzed", failed, args.input.len());
    }
    Ok(())
}

fn write_analysis_outputs(
    args: &AnalyzeArgs,
    settings: &OutputSettings,
    specimens: &[AnalyzedSpecimen],
) -> Result<()> {
    match args.plot_type {
        PlotType::Single => {
            for specimen in specimens {
                println!("{}", render_specimen_line(specimen));
                if settings.write_plots {
                    plot_single_trace(specimen, args.x_param, args.y_param, settings)?;
                }
            }
        }
        PlotType::Multi => {
            if let Some(summary) = MultiRunSummary::from_specimens(specimens) {
                println!("{}", render_multi_line(&summary));
                let row = MultiRunRow::new(&specimens[0], &summary);
                append_multi_run_averages(&settings.output_dir, &row)?;
            }
            if settings.write_plots {
                plot_multi_trace(specimens, args.x_param, args.y_param, None, settings)?;
            }
        }
    }

    append_individual_results(&settings.output_dir, specimens)?;
    tracing::info!(output = %settings.output_dir.display(), "analysis complete");
    Ok(())
}

fn run_visualize(args: &VisualizeArgs) -> Result<()> {
    let settings = args.output.settings()?;
    for input in &args.input {
        plot_output_data(input, args.x_param, args.y_param, &settings)
            .with_context(|| format!("plotting {}", input.display()))?;
    }
    tracing::info!(output = %settings.output_dir.display(), "visualization complete");
    Ok(())
}

fn run_batch_command(args: &BatchArgs) -> Result<()> {
    let settings = args.output.settings()?;
    let outcome = run_batch(&args.data_dir, &settings, args.summary)
        .with_context(|| format!("batch processing {}", args.data_dir.display()))?;

    for skipped in &outcome.skipped {
        eprintln!("skipped {}: {}", skipped.path, skipped.error);
    }
    println!(
        "Analyzed {} file(s), skipped {}. Results saved to {}",
        outcome.analyzed,
        outcome.skipped.len(),
        settings.output_dir.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    tracing::debug!(command = ?cli.command, "starting");

    let result = match &cli.command {
        Command::Analyze(args) => run_analyze(args),
        Command::Visualize(args) => run_visualize(args),
        Command::Batch(args) => run_batch_command(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_defaults() {
        let cli = Cli::try_parse_from(["tensile", "analyze", "-i", "a.csv", "b.csv"]).unwrap();
        match cli.command {
            Command::Analyze(args) => {
                assert_eq!(args.input.len(), 2);
                assert_eq!(args.plot_type, PlotType::Single);
                assert_eq!(args.x_param, Channel::Strain);
                assert_eq!(args.y_param, Channel::Stress);
                let settings = args.output.settings().unwrap();
                assert_eq!(settings.output_dir, PathBuf::from("out"));
                assert!(settings.write_plots);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_output_overrides() {
        let cli = Cli::try_parse_from([
            "tensile", "-vv", "analyze", "-i", "a.csv", "-o", "results", "--no-plots",
            "--plot-type", "multi", "--x-param", "Time", "--y-param", "Force",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Analyze(args) => {
                assert_eq!(args.plot_type, PlotType::Multi);
                assert_eq!(args.x_param, Channel::Time);
                let settings = args.output.settings().unwrap();
                assert_eq!(settings.output_dir, PathBuf::from("results"));
                assert!(!settings.write_plots);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_visualize_and_batch() {
        let cli = Cli::try_parse_from(["tensile", "visualize", "-i", "r.csv"]).unwrap();
        match cli.command {
            Command::Visualize(args) => {
                assert_eq!(args.x_param, OutputParam::D);
                assert_eq!(args.y_param, OutputParam::KE);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["tensile", "batch", "-d", "data", "--summary"]).unwrap();
        match cli.command {
            Command::Batch(args) => {
                assert_eq!(args.data_dir, PathBuf::from("data"));
                assert!(args.summary);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("settings.json");
        std::fs::write(&config, r#"{"output_dir": "from_config", "plot_width": 640}"#).unwrap();
        let config_arg = config.display().to_string();

        let cli = Cli::try_parse_from(["tensile", "batch", "-d", "data", "--config", &config_arg])
            .unwrap();
        let Command::Batch(args) = cli.command else {
            panic!("expected batch");
        };
        let settings = args.output.settings().unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("from_config"));
        assert_eq!(settings.plot_size(), (640, 800));

        let cli = Cli::try_parse_from([
            "tensile", "batch", "-d", "data", "--config", &config_arg, "-o", "flag_dir",
        ])
        .unwrap();
        let Command::Batch(args) = cli.command else {
            panic!("expected batch");
        };
        assert_eq!(args.output.settings().unwrap().output_dir, PathBuf::from("flag_dir"));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Cli::try_parse_from(["tensile", "analyze"]).is_err());
        let lowercase = ["tensile", "analyze", "-i", "a.csv", "--x-param", "strain"];
        assert!(Cli::try_parse_from(lowercase).is_err());
        let unknown = ["tensile", "visualize", "-i", "r.csv", "--x-param", "Q"];
        assert!(Cli::try_parse_from(unknown).is_err());
    }

    #[test]
    fn test_visualize_has_no_plot_switch() {
        let args = ["tensile", "visualize", "-i", "r.csv", "--no-plots"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    fn rig_csv() -> String {
        let mut text = String::from("Test 1 _ 1,,\nTime,Force,Stroke\nsec,N,mm\n");
        for i in 0..150 {
            let force = (i as f64).min(90.0 + 0.1 * i as f64);
            text.push_str(&format!("{},{},{}\n", i as f64 * 0.1, force, i as f64 * 0.4));
        }
        text
    }

    #[test]
    fn test_analyze_keeps_going_after_bad_file() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let bad = data.path().join("pull--mono-crimp-21--1.csv");
        let good = data.path().join("pull--mono-crimp-21--2.csv");
        std::fs::write(&bad, "title\nTime,Load\ns,N\n0,1\n").unwrap();
        std::fs::write(&good, rig_csv()).unwrap();

        let out_arg = out.path().display().to_string();
        let bad_arg = bad.display().to_string();
        let good_arg = good.display().to_string();
        let cli = Cli::try_parse_from([
            "tensile", "analyze", "-i", &bad_arg, &good_arg, "-o", &out_arg, "--no-plots",
        ])
        .unwrap();
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };

        let err = run_analyze(&args).unwrap_err();
        assert!(err.to_string().contains("1 of 2"), "{err}");

        let results = std::fs::read_to_string(out.path().join("individual_results.csv")).unwrap();
        assert_eq!(results.lines().count(), 2, "header and the good file:\n{results}");
        assert!(results.contains("pull--mono-crimp-21--2.csv"));
    }
}
