use anyhow::{format_err, Context, Result};
use boosttune_dataset::Dataset;
use pkboost::*;
use serde::Serialize;
use std::path::Path;

/// The two ways to assemble a pkboost classifier. Partitioned mode trades one large ensemble for many small specialists.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum PkBoostMode {
	Single {
		n_estimators: usize,
		scale_pos_weight: f64,
	},
	Partitioned {
		n_partitions: usize,
		specialist_estimators: usize,
		specialist_max_depth: usize,
	},
}

#[derive(Clone, Debug, Serialize)]
pub struct PkBoostTrainOptions {
	pub mode: PkBoostMode,
}

impl Default for PkBoostTrainOptions {
	fn default() -> Self {
		Self {
			mode: PkBoostMode::Single {
				n_estimators: 100,
				scale_pos_weight: 1.0,
			},
		}
	}
}

pub enum PkBoostModel {
	Single {
		model: OptimizedPKBoostShannon,
		options: PkBoostTrainOptions,
	},
	Partitioned {
		model: PartitionedClassifier,
		options: PkBoostTrainOptions,
	},
}

impl PkBoostModel {
	/// Fit a classifier on the training rows. In single mode the eval set drives early stopping.
	pub fn train(
		train: &Dataset,
		eval: Option<&Dataset>,
		options: &PkBoostTrainOptions,
	) -> Result<PkBoostModel> {
		let x_train = train.to_rows();
		let y_train = train.labels.to_vec();
		match &options.mode {
			PkBoostMode::Single {
				n_estimators,
				scale_pos_weight,
			} => {
				let mut model = OptimizedPKBoostShannon::auto(&x_train, &y_train);
				model.n_estimators = *n_estimators;
				model.scale_pos_weight = *scale_pos_weight;
				let eval_rows = eval.map(|eval| (eval.to_rows(), eval.labels.to_vec()));
				match &eval_rows {
					Some((x_eval, y_eval)) => model.fit(&x_train, &y_train, Some((x_eval, y_eval)), false),
					None => model.fit(&x_train, &y_train, None, false),
				}
				.map_err(|error| format_err!("pkboost fit failed: {}", error))?;
				Ok(PkBoostModel::Single {
					model,
					options: options.clone(),
				})
			}
			PkBoostMode::Partitioned {
				n_partitions,
				specialist_estimators,
				specialist_max_depth,
			} => {
				let mut model = PartitionedClassifierBuilder::new()
					.n_partitions(*n_partitions)
					.specialist_estimators(*specialist_estimators)
					.specialist_max_depth(*specialist_max_depth)
					.task_type(TaskType::Binary)
					.build();
				model.partition_data(&x_train, &y_train, false);
				model
					.train_specialists(&x_train, &y_train, false)
					.map_err(|error| format_err!("pkboost specialist training failed: {}", error))?;
				Ok(PkBoostModel::Partitioned {
					model,
					options: options.clone(),
				})
			}
		}
	}

	pub fn predict_proba(&self, dataset: &Dataset) -> Result<Vec<f64>> {
		let x = dataset.to_rows();
		match self {
			PkBoostModel::Single { model, .. } => model
				.predict_proba(&x)
				.map_err(|error| format_err!("pkboost predict failed: {}", error)),
			PkBoostModel::Partitioned { model, .. } => {
				let probabilities = model
					.predict_proba(&x)
					.map_err(|error| format_err!("pkboost predict failed: {}", error))?;
				// per-class probabilities, positive class second
				Ok(probabilities
					.iter()
					.map(|class_probabilities| class_probabilities[1])
					.collect())
			}
		}
	}

	pub fn n_estimators(&self) -> usize {
		match self.options().mode {
			PkBoostMode::Single { n_estimators, .. } => n_estimators,
			PkBoostMode::Partitioned {
				specialist_estimators,
				..
			} => specialist_estimators,
		}
	}

	fn options(&self) -> &PkBoostTrainOptions {
		match self {
			PkBoostModel::Single { options, .. } => options,
			PkBoostModel::Partitioned { options, .. } => options,
		}
	}

	/// The backend has no serializer, so persist the training options instead.
	pub fn save(&self, path: &Path) -> Result<()> {
		let json = serde_json::to_string_pretty(self.options())?;
		std::fs::write(path, json)
			.with_context(|| format!("failed to write {}", path.display()))?;
		Ok(())
	}
}

#[test]
fn test_default_options() {
	let options = PkBoostTrainOptions::default();
	match options.mode {
		PkBoostMode::Single {
			n_estimators,
			scale_pos_weight,
		} => {
			assert_eq!(n_estimators, 100);
			assert!((scale_pos_weight - 1.0).abs() < f64::EPSILON);
		}
		_ => panic!(),
	}
}
