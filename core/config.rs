use anyhow::{format_err, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_EVALS: usize = 5;
pub const DEFAULT_N_FOLDS: usize = 5;
pub const DEFAULT_NUM_BOOST_ROUNDS: usize = 100;
pub const DEFAULT_EARLY_STOPPING_ROUNDS: usize = 25;
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// The tuning run configuration, loaded from a YAML file. Every knob has a default, so a minimal config names only the dataset, target, model family, and optimizer. `optimizer` accepts a single strategy or a list of strategies to run and compare.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	/// Path to the CSV file to tune on.
	pub dataset: PathBuf,
	/// The name of the label column.
	pub target: String,
	pub model: ModelFamily,
	pub optimizer: OptimizerChoice,
	pub max_evals: Option<usize>,
	pub n_folds: Option<usize>,
	pub num_boost_rounds: Option<usize>,
	pub early_stopping_rounds: Option<usize>,
	pub test_fraction: Option<f64>,
	pub seed: Option<u64>,
	pub comparison_metric: Option<ComparisonMetric>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
	Perpetual,
	Pkboost,
}

impl std::fmt::Display for ModelFamily {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			ModelFamily::Perpetual => write!(f, "perpetual"),
			ModelFamily::Pkboost => write!(f, "pkboost"),
		}
	}
}

/// One strategy or several. A YAML scalar parses as `One`, a YAML sequence as `Many`.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum OptimizerChoice {
	One(OptimizationMethod),
	Many(Vec<OptimizationMethod>),
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMethod {
	/// Tree-structured Parzen estimator over a pre-built space.
	Tpe,
	/// The imperative study driver, which only models parameters on the active branch.
	Study,
	/// Seeded uniform random search.
	Random,
}

impl std::fmt::Display for OptimizationMethod {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			OptimizationMethod::Tpe => write!(f, "tpe"),
			OptimizationMethod::Study => write!(f, "study"),
			OptimizationMethod::Random => write!(f, "random"),
		}
	}
}

/// The headline metric reported for the final model on the test split.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMetric {
	AucRoc,
	AucPrecisionRecall,
	Logloss,
}

impl std::fmt::Display for ComparisonMetric {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			ComparisonMetric::AucRoc => write!(f, "auc_roc"),
			ComparisonMetric::AucPrecisionRecall => write!(f, "auc_precision_recall"),
			ComparisonMetric::Logloss => write!(f, "logloss"),
		}
	}
}

impl ComparisonMetric {
	/// Whether `a` is a better test value than `b`. Losses are minimized, the AUCs are maximized.
	pub fn is_improvement(self, a: f64, b: f64) -> bool {
		match self {
			ComparisonMetric::Logloss => a < b,
			ComparisonMetric::AucRoc | ComparisonMetric::AucPrecisionRecall => a > b,
		}
	}
}

impl Config {
	/// Load and validate a configuration file.
	pub fn load(path: &Path) -> Result<Config> {
		let text = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read {}", path.display()))?;
		let config: Config = serde_yaml::from_str(&text)
			.with_context(|| format!("failed to parse {}", path.display()))?;
		config.validate()?;
		Ok(config)
	}

	/// Reject bad settings before any data is loaded.
	pub fn validate(&self) -> Result<()> {
		let optimizers = self.optimizers();
		if optimizers.is_empty() {
			return Err(format_err!("the optimizer list is empty"));
		}
		for (index, method) in optimizers.iter().enumerate() {
			if optimizers[..index].contains(method) {
				return Err(format_err!("optimizer \"{}\" is listed twice", method));
			}
		}
		if self.max_evals() == 0 {
			return Err(format_err!("max_evals must be at least 1"));
		}
		if self.n_folds() < 2 {
			return Err(format_err!(
				"n_folds must be at least 2, got {}",
				self.n_folds()
			));
		}
		if self.num_boost_rounds() == 0 {
			return Err(format_err!("num_boost_rounds must be at least 1"));
		}
		let test_fraction = self.test_fraction();
		if !(test_fraction > 0.0 && test_fraction < 1.0) {
			return Err(format_err!(
				"test_fraction must be between 0 and 1, got {}",
				test_fraction
			));
		}
		Ok(())
	}

	/// The strategies to run, in the order they were requested.
	pub fn optimizers(&self) -> Vec<OptimizationMethod> {
		match &self.optimizer {
			OptimizerChoice::One(method) => vec![*method],
			OptimizerChoice::Many(methods) => methods.clone(),
		}
	}

	pub fn max_evals(&self) -> usize {
		self.max_evals.unwrap_or(DEFAULT_MAX_EVALS)
	}

	pub fn n_folds(&self) -> usize {
		self.n_folds.unwrap_or(DEFAULT_N_FOLDS)
	}

	pub fn num_boost_rounds(&self) -> usize {
		self.num_boost_rounds.unwrap_or(DEFAULT_NUM_BOOST_ROUNDS)
	}

	pub fn early_stopping_rounds(&self) -> usize {
		self.early_stopping_rounds
			.unwrap_or(DEFAULT_EARLY_STOPPING_ROUNDS)
	}

	pub fn test_fraction(&self) -> f64 {
		self.test_fraction.unwrap_or(DEFAULT_TEST_FRACTION)
	}

	pub fn seed(&self) -> u64 {
		self.seed.unwrap_or(boosttune_dataset::DEFAULT_SEED)
	}

	pub fn comparison_metric(&self) -> ComparisonMetric {
		self.comparison_metric.unwrap_or(ComparisonMetric::AucRoc)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn example() -> Config {
		serde_yaml::from_str(
			r#"
dataset: heart_disease.csv
target: diagnosis
model: perpetual
optimizer: tpe
"#,
		)
		.unwrap()
	}

	#[test]
	fn test_defaults() {
		let config = example();
		assert!(config.validate().is_ok());
		assert_eq!(config.max_evals(), 5);
		assert_eq!(config.n_folds(), 5);
		assert_eq!(config.num_boost_rounds(), 100);
		assert_eq!(config.early_stopping_rounds(), 25);
		assert_eq!(config.seed(), 47);
		assert_eq!(config.comparison_metric(), ComparisonMetric::AucRoc);
	}

	#[test]
	fn test_validate_rejects_bad_settings() {
		let mut config = example();
		config.max_evals = Some(0);
		assert!(config.validate().is_err());
		let mut config = example();
		config.n_folds = Some(1);
		assert!(config.validate().is_err());
		let mut config = example();
		config.test_fraction = Some(1.5);
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_enum_parsing() {
		let config: Config = serde_yaml::from_str(
			r#"
dataset: data.csv
target: label
model: pkboost
optimizer: random
comparison_metric: logloss
"#,
		)
		.unwrap();
		assert_eq!(config.model, ModelFamily::Pkboost);
		assert_eq!(config.optimizers(), vec![OptimizationMethod::Random]);
		assert_eq!(config.comparison_metric(), ComparisonMetric::Logloss);
	}

	#[test]
	fn test_optimizer_list() {
		let config: Config = serde_yaml::from_str(
			r#"
dataset: data.csv
target: label
model: perpetual
optimizer: [tpe, study, random]
"#,
		)
		.unwrap();
		assert!(config.validate().is_ok());
		assert_eq!(
			config.optimizers(),
			vec![
				OptimizationMethod::Tpe,
				OptimizationMethod::Study,
				OptimizationMethod::Random,
			]
		);
	}

	#[test]
	fn test_validate_rejects_duplicate_optimizers() {
		let config: Config = serde_yaml::from_str(
			r#"
dataset: data.csv
target: label
model: perpetual
optimizer: [tpe, tpe]
"#,
		)
		.unwrap();
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_comparison_metric_direction() {
		assert!(ComparisonMetric::AucRoc.is_improvement(0.9, 0.8));
		assert!(!ComparisonMetric::AucRoc.is_improvement(0.8, 0.9));
		assert!(ComparisonMetric::Logloss.is_improvement(0.2, 0.3));
		assert!(!ComparisonMetric::Logloss.is_improvement(0.3, 0.2));
	}
}
