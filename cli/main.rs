use anyhow::Result;
use boosttune_core::Progress;
use clap::Clap;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Clap)]
#[clap(
	about = "Tune gradient boosted classifiers.",
	version = clap::crate_version!(),
	setting = clap::AppSettings::DisableHelpSubcommand
)]
enum Options {
	#[clap(name = "tune")]
	Tune(Box<TuneOptions>),
}

#[derive(Clap)]
#[clap(about = "Run a tuning pass described by a config file.")]
struct TuneOptions {
	#[clap(short, long, about = "the path to the tuning config YAML file")]
	config: PathBuf,
	#[clap(
		short,
		long,
		default_value = "output",
		about = "the directory to write artifacts to"
	)]
	output: PathBuf,
	#[clap(long, about = "print progress while tuning")]
	progress: bool,
}

fn main() {
	let options = Options::parse();
	let result = match options {
		Options::Tune(options) => tune(*options),
	};
	if let Err(error) = result {
		eprintln!("{}: {:#}", "error".red().bold(), error);
		std::process::exit(1);
	}
}

fn tune(options: TuneOptions) -> Result<()> {
	let config = boosttune_core::Config::load(&options.config)?;
	let print_progress = options.progress;
	let mut update_progress = |progress: Progress| {
		if !print_progress {
			return;
		}
		match progress {
			Progress::Loading => eprintln!("loading {}", config.dataset.display()),
			Progress::Tuning(counter) => {
				eprintln!("tuning, {} trials", counter.total())
			}
			Progress::Training => eprintln!("training final model"),
			Progress::Evaluating => eprintln!("evaluating on the test split"),
			Progress::Writing => eprintln!("writing artifacts"),
		}
	};
	let report = boosttune_core::tune(&config, &options.output, &mut update_progress)?;
	let comparison_metric = config.comparison_metric();
	for outcome in report.strategies.iter() {
		println!(
			"{}: best trial #{} with cv loss {:.6}, test {} {:.6}",
			outcome.optimizer,
			outcome.best.index,
			outcome.best.loss,
			comparison_metric,
			outcome.test_metrics.comparison_value(comparison_metric),
		);
	}
	println!(
		"winner: {} with test {} {:.6}",
		report.best_optimizer,
		comparison_metric,
		report.test_metrics.comparison_value(comparison_metric),
	);
	for (name, value) in report.best.params.iter() {
		println!("  {} = {}", name, value);
	}
	for artifact in report.artifacts.iter() {
		println!("wrote {}", artifact.display());
	}
	Ok(())
}
