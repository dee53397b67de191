use ::perpetual::booster::config::{BoosterIO, ContributionsMethod, MissingNodeTreatment};
use ::perpetual::objective::Objective;
use ::perpetual::{Matrix, PerpetualBooster};
use anyhow::{format_err, Result};
use boosttune_dataset::Dataset;
use serde::Serialize;
use std::path::Path;

/// How the booster handles missing feature values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum MissingStrategy {
	/// Missing values follow the branch that minimizes the loss.
	Impute,
	/// Grow ternary trees with an explicit missing branch.
	Branch { node_treatment: MissingTreatment },
}

/// The weight given to the missing branch. Only meaningful with [`MissingStrategy::Branch`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum MissingTreatment {
	AssignToParent,
	AverageLeafWeight,
	AverageNodeWeight,
}

impl MissingTreatment {
	fn to_backend(self) -> MissingNodeTreatment {
		match self {
			MissingTreatment::AssignToParent => MissingNodeTreatment::AssignToParent,
			MissingTreatment::AverageLeafWeight => MissingNodeTreatment::AverageLeafWeight,
			MissingTreatment::AverageNodeWeight => MissingNodeTreatment::AverageNodeWeight,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct PerpetualTrainOptions {
	/// The fitting budget. Larger budgets grow more trees.
	pub budget: f32,
	/// The maximum number of bins used to discretize each feature.
	pub max_bin: u16,
	pub missing_strategy: MissingStrategy,
	/// Stop when the validation loss has not improved for this many rounds.
	pub stopping_rounds: Option<usize>,
	/// Hard cap on the number of boosting rounds.
	pub iteration_limit: Option<usize>,
	pub seed: u64,
}

impl Default for PerpetualTrainOptions {
	fn default() -> Self {
		Self {
			budget: 0.5,
			max_bin: 256,
			missing_strategy: MissingStrategy::Impute,
			stopping_rounds: None,
			iteration_limit: None,
			seed: 0,
		}
	}
}

pub struct PerpetualModel {
	booster: PerpetualBooster,
	n_features: usize,
}

impl PerpetualModel {
	/// Fit a booster on the training rows. The booster tunes itself within the budget, so there is no eval set.
	pub fn train(train: &Dataset, options: &PerpetualTrainOptions) -> Result<PerpetualModel> {
		let mut booster = PerpetualBooster::default()
			.set_objective(Objective::LogLoss)
			.set_budget(options.budget);
		booster.cfg.max_bin = options.max_bin;
		booster.cfg.seed = options.seed;
		booster.cfg.stopping_rounds = options.stopping_rounds;
		booster.cfg.iteration_limit = options.iteration_limit;
		match &options.missing_strategy {
			MissingStrategy::Impute => {
				booster.cfg.create_missing_branch = false;
			}
			MissingStrategy::Branch { node_treatment } => {
				booster.cfg.create_missing_branch = true;
				booster.cfg.missing_node_treatment = node_treatment.to_backend();
			}
		}
		let values = train.to_column_major();
		let matrix = Matrix::new(&values, train.n_rows(), train.n_features());
		let labels = train.labels.as_slice().ok_or_else(|| {
			format_err!("labels are not contiguous")
		})?;
		booster
			.fit(&matrix, labels, None, None)
			.map_err(|error| format_err!("perpetual fit failed: {}", error))?;
		Ok(PerpetualModel {
			booster,
			n_features: train.n_features(),
		})
	}

	pub fn predict_proba(&self, dataset: &Dataset) -> Result<Vec<f64>> {
		if dataset.n_features() != self.n_features {
			return Err(format_err!(
				"expected {} features, got {}",
				self.n_features,
				dataset.n_features()
			));
		}
		let values = dataset.to_column_major();
		let matrix = Matrix::new(&values, dataset.n_rows(), dataset.n_features());
		// predict returns log odds for the log loss objective
		let log_odds = self.booster.predict(&matrix, false);
		Ok(log_odds
			.iter()
			.map(|value| 1.0 / (1.0 + (-value).exp()))
			.collect())
	}

	pub fn n_estimators(&self) -> usize {
		self.booster.get_prediction_trees().len()
	}

	/// Mean absolute Shapley contribution of each feature, in feature order.
	pub fn mean_abs_contributions(&self, dataset: &Dataset) -> Result<Vec<f64>> {
		let values = dataset.to_column_major();
		let matrix = Matrix::new(&values, dataset.n_rows(), dataset.n_features());
		let contributions =
			self.booster
				.predict_contributions(&matrix, ContributionsMethod::Shapley, false);
		// one row per sample, n_features contributions plus the bias term
		let row_width = dataset.n_features() + 1;
		let mut totals = vec![0.0; dataset.n_features()];
		for row in contributions.chunks(row_width) {
			for (total, contribution) in totals.iter_mut().zip(row.iter()) {
				*total += contribution.abs();
			}
		}
		let n_rows = dataset.n_rows() as f64;
		Ok(totals.into_iter().map(|total| total / n_rows).collect())
	}

	pub fn save(&self, path: &Path) -> Result<()> {
		self.booster
			.save_booster(path)
			.map_err(|error| format_err!("failed to save model: {}", error))
	}
}

#[test]
fn test_default_options() {
	let options = PerpetualTrainOptions::default();
	assert_eq!(options.max_bin, 256);
	assert_eq!(options.missing_strategy, MissingStrategy::Impute);
}
