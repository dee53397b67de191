use crate::config::{ComparisonMetric, Config, ModelFamily, OptimizationMethod};
use crate::cv::{cross_validate, CvSettings};
use crate::progress::Progress;
use crate::random_search::optimize_random;
use crate::report::{compute_test_metrics, render_evaluation_charts, TestMetrics};
use crate::space::{
	default_perpetual_space, default_pkboost_space, perpetual_options_from_params,
	pkboost_options_from_params, ParamSet,
};
use crate::study::optimize_study;
use crate::tpe_search::optimize_tpe;
use crate::trial::Trial;
use anyhow::{format_err, Context, Result};
use boosttune_dataset::{positive_class_weight, Dataset};
use boosttune_models::{PerpetualModel, PkBoostModel, TrainedModel};
use boosttune_util::progress_counter::ProgressCounter;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// What one optimization strategy ended up with: its best trial and that configuration's test metrics.
pub struct StrategyOutcome {
	pub optimizer: OptimizationMethod,
	pub best: Trial,
	pub test_metrics: TestMetrics,
	pub n_estimators: usize,
}

pub struct TuneReport {
	/// The strategy whose final model won on the comparison metric.
	pub best_optimizer: OptimizationMethod,
	pub best: Trial,
	pub test_metrics: TestMetrics,
	pub strategies: Vec<StrategyOutcome>,
	pub artifacts: Vec<PathBuf>,
}

/**
Run a full tuning pass: load the dataset, drive every requested optimization strategy over stratified cross-validation on the training split, retrain each strategy's best configuration, compare the final models on the held-out test split, and write the artifacts into `output_dir`. The winner by the comparison metric gets the saved model and the evaluation charts.
*/
pub fn tune(
	config: &Config,
	output_dir: &Path,
	update_progress: &mut dyn FnMut(Progress),
) -> Result<TuneReport> {
	config.validate()?;
	update_progress(Progress::Loading);
	let mut dataset = Dataset::from_csv(&config.dataset, &config.target)?;
	dataset.shuffle(config.seed());
	let (train, test) = dataset.train_test_split(config.test_fraction());
	check_split(&train, &test)?;
	let space = match config.model {
		ModelFamily::Perpetual => default_perpetual_space(),
		ModelFamily::Pkboost => default_pkboost_space(positive_class_weight(&train.labels)?),
	};
	let settings = CvSettings {
		n_folds: config.n_folds(),
		seed: config.seed(),
		num_boost_rounds: config.num_boost_rounds(),
		early_stopping_rounds: config.early_stopping_rounds(),
	};
	let methods = config.optimizers();
	let progress = ProgressCounter::new((config.max_evals() * methods.len()) as u64);
	update_progress(Progress::Tuning(progress.clone()));
	let family = config.model;
	let mut evaluate =
		|params: &ParamSet| cross_validate(family, &train, params, &settings);
	std::fs::create_dir_all(output_dir)
		.with_context(|| format!("failed to create {}", output_dir.display()))?;
	let mut artifacts = Vec::new();
	// every strategy searches the same space with the same seed and fold assignment
	let mut bests: Vec<(OptimizationMethod, Trial)> = Vec::new();
	for method in methods {
		let history = match method {
			OptimizationMethod::Tpe => optimize_tpe(
				&space,
				config.max_evals(),
				config.seed(),
				&mut evaluate,
				&progress,
			)?,
			OptimizationMethod::Study => optimize_study(
				&space,
				config.max_evals(),
				config.seed(),
				&mut evaluate,
				&progress,
			)?,
			OptimizationMethod::Random => optimize_random(
				&space,
				config.max_evals(),
				config.seed(),
				&mut evaluate,
				&progress,
			)?,
		};
		let trials_path = output_dir.join(format!("trials_{}.csv", method));
		history.write_csv(&trials_path)?;
		artifacts.push(trials_path);
		if let Some(best) = history.best() {
			bests.push((method, best.clone()));
		}
	}
	if bests.is_empty() {
		return Err(format_err!("every trial failed"));
	}
	update_progress(Progress::Training);
	let mut finalists = Vec::with_capacity(bests.len());
	for (method, best) in bests {
		let model = train_final(config, &train, &best)?;
		finalists.push((method, best, model));
	}
	update_progress(Progress::Evaluating);
	let mut evaluated: Vec<(OptimizationMethod, Trial, TrainedModel, TestMetrics)> =
		Vec::with_capacity(finalists.len());
	for (method, best, model) in finalists {
		let test_metrics = compute_test_metrics(&model, &test)?;
		evaluated.push((method, best, model, test_metrics));
	}
	let metric = config.comparison_metric();
	let values: Vec<f64> = evaluated
		.iter()
		.map(|(_, _, _, test_metrics)| test_metrics.comparison_value(metric))
		.collect();
	let winner = winner_index(metric, &values);
	update_progress(Progress::Writing);
	let strategies: Vec<StrategyOutcome> = evaluated
		.iter()
		.map(|(method, best, model, test_metrics)| StrategyOutcome {
			optimizer: *method,
			best: best.clone(),
			test_metrics: test_metrics.clone(),
			n_estimators: model.n_estimators(),
		})
		.collect();
	let summary_path = output_dir.join("summary.csv");
	write_summary(&summary_path, &strategies)?;
	artifacts.push(summary_path);
	let (best_optimizer, best, model, test_metrics) = evaluated.swap_remove(winner);
	artifacts.extend(render_evaluation_charts(&model, &test, output_dir, config.seed())?);
	let model_path = output_dir.join("model.json");
	model.save(&model_path)?;
	artifacts.push(model_path);
	Ok(TuneReport {
		best_optimizer,
		best,
		test_metrics,
		strategies,
		artifacts,
	})
}

/// A valid test fraction can still floor to an empty split on a tiny dataset.
fn check_split(train: &Dataset, test: &Dataset) -> Result<()> {
	if train.n_rows() == 0 || test.n_rows() == 0 {
		return Err(format_err!(
			"splitting produced {} train rows and {} test rows, need at least 1 of each",
			train.n_rows(),
			test.n_rows()
		));
	}
	Ok(())
}

/// The index of the best test value, first requested strategy winning ties.
fn winner_index(metric: ComparisonMetric, values: &[f64]) -> usize {
	let mut winner = 0;
	for (index, value) in values.iter().enumerate().skip(1) {
		if metric.is_improvement(*value, values[winner]) {
			winner = index;
		}
	}
	winner
}

/// Retrain on the full training split with the best parameters found.
fn train_final(config: &Config, train: &Dataset, best: &Trial) -> Result<TrainedModel> {
	match config.model {
		ModelFamily::Perpetual => {
			let options = perpetual_options_from_params(
				&best.params,
				config.early_stopping_rounds(),
				config.num_boost_rounds(),
				config.seed(),
			)?;
			Ok(TrainedModel::Perpetual(PerpetualModel::train(
				train, &options,
			)?))
		}
		ModelFamily::Pkboost => {
			// the boosting round count settled on during cross-validation
			let n_estimators = if best.n_estimators > 0 {
				best.n_estimators
			} else {
				config.num_boost_rounds()
			};
			let options = pkboost_options_from_params(&best.params, n_estimators)?;
			Ok(TrainedModel::PkBoost(PkBoostModel::train(
				train, None, &options,
			)?))
		}
	}
}

/// One row per strategy: the test metrics followed by that strategy's best parameters. The parameter columns are the sorted union over strategies.
fn write_summary(path: &Path, strategies: &[StrategyOutcome]) -> Result<()> {
	let param_names: BTreeSet<&str> = strategies
		.iter()
		.flat_map(|outcome| outcome.best.params.keys().map(|name| name.as_str()))
		.collect();
	let mut writer = csv::Writer::from_path(path)
		.with_context(|| format!("failed to create {}", path.display()))?;
	let mut header: Vec<String> = [
		"optimizer",
		"cv_loss",
		"test_auc_roc",
		"test_auc_precision_recall",
		"test_logloss",
		"test_accuracy",
		"test_f1_score",
		"n_estimators",
	]
	.iter()
	.map(|name| (*name).to_owned())
	.collect();
	header.extend(param_names.iter().map(|name| (*name).to_owned()));
	writer.write_record(&header)?;
	for outcome in strategies {
		let mut record = vec![
			outcome.optimizer.to_string(),
			outcome.best.loss.to_string(),
			outcome.test_metrics.auc_roc.to_string(),
			outcome.test_metrics.auc_precision_recall.to_string(),
			outcome.test_metrics.logloss.to_string(),
			outcome.test_metrics.threshold_metrics.accuracy.to_string(),
			outcome.test_metrics.threshold_metrics.f1_score.to_string(),
			outcome.n_estimators.to_string(),
		];
		for name in param_names.iter() {
			record.push(
				outcome
					.best
					.params
					.get(*name)
					.map(|value| value.to_string())
					.unwrap_or_default(),
			);
		}
		writer.write_record(&record)?;
	}
	writer.flush()?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn load_csv(name: &str, text: &str) -> Dataset {
		let path = std::env::temp_dir().join(name);
		std::fs::write(&path, text).unwrap();
		Dataset::from_csv(&path, "label").unwrap()
	}

	#[test]
	fn test_check_split_rejects_an_empty_test_split() {
		let dataset = load_csv(
			"boosttune_tune_tiny_split.csv",
			"a,label\n1.0,0\n2.0,1\n3.0,0\n",
		);
		let (train, test) = dataset.train_test_split(0.2);
		assert_eq!(test.n_rows(), 0);
		assert!(check_split(&train, &test).is_err());
	}

	#[test]
	fn test_check_split_accepts_a_populated_split() {
		let dataset = load_csv(
			"boosttune_tune_split_ok.csv",
			"a,label\n1.0,0\n2.0,1\n3.0,0\n4.0,1\n5.0,0\n",
		);
		let (train, test) = dataset.train_test_split(0.2);
		assert_eq!(test.n_rows(), 1);
		assert!(check_split(&train, &test).is_ok());
	}

	#[test]
	fn test_winner_index() {
		assert_eq!(winner_index(ComparisonMetric::AucRoc, &[0.7, 0.9, 0.8]), 1);
		assert_eq!(winner_index(ComparisonMetric::Logloss, &[0.5, 0.3, 0.4]), 1);
		// ties go to the first strategy requested
		assert_eq!(winner_index(ComparisonMetric::AucRoc, &[0.9, 0.9]), 0);
	}
}
