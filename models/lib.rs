/*!
This crate wraps the two gradient boosting backends behind a common surface: train with a domain-level options struct, predict positive-class probabilities, and persist the trained model. The tuning loop never touches a backend type directly.
*/

pub mod perpetual;
pub mod pkboost;

pub use self::perpetual::{
	MissingStrategy, MissingTreatment, PerpetualModel, PerpetualTrainOptions,
};
pub use self::pkboost::{PkBoostMode, PkBoostModel, PkBoostTrainOptions};

use anyhow::Result;
use boosttune_dataset::Dataset;
use std::path::Path;

/// A trained model from either backend family.
pub enum TrainedModel {
	Perpetual(PerpetualModel),
	PkBoost(PkBoostModel),
}

impl TrainedModel {
	pub fn predict_proba(&self, dataset: &Dataset) -> Result<Vec<f64>> {
		match self {
			TrainedModel::Perpetual(model) => model.predict_proba(dataset),
			TrainedModel::PkBoost(model) => model.predict_proba(dataset),
		}
	}

	/// The number of boosting rounds the model actually grew.
	pub fn n_estimators(&self) -> usize {
		match self {
			TrainedModel::Perpetual(model) => model.n_estimators(),
			TrainedModel::PkBoost(model) => model.n_estimators(),
		}
	}

	pub fn save(&self, path: &Path) -> Result<()> {
		match self {
			TrainedModel::Perpetual(model) => model.save(path),
			TrainedModel::PkBoost(model) => model.save(path),
		}
	}
}
