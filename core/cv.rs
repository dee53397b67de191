use crate::config::ModelFamily;
use crate::space::{perpetual_options_from_params, pkboost_options_from_params, ParamSet};
use anyhow::Result;
use boosttune_dataset::{stratified_k_fold, Dataset};
use boosttune_metrics::{auc_roc, BinaryCrossEntropy, BinaryCrossEntropyInput, Mean, MeanVariance, StreamingMetric};
use boosttune_models::{PerpetualModel, PkBoostModel};
use std::time::{Duration, Instant};

/// The result of evaluating one candidate configuration with k-fold cross-validation.
#[derive(Clone, Debug)]
pub struct CvOutput {
	/// The minimized quantity: 1 - mean validation AUC for the perpetual family, mean validation log loss for the pkboost family.
	pub loss: f64,
	/// The variance of the per-fold losses.
	pub variance: f64,
	/// The mean number of boosting rounds the folds actually grew.
	pub n_estimators: usize,
	pub duration: Duration,
}

#[derive(Clone, Debug)]
pub struct CvSettings {
	pub n_folds: usize,
	pub seed: u64,
	pub num_boost_rounds: usize,
	pub early_stopping_rounds: usize,
}

/// Evaluate one candidate with stratified k-fold cross-validation. Any fold failure aborts the whole candidate.
pub fn cross_validate(
	family: ModelFamily,
	dataset: &Dataset,
	params: &ParamSet,
	settings: &CvSettings,
) -> Result<CvOutput> {
	let start = Instant::now();
	let folds = stratified_k_fold(&dataset.labels, settings.n_folds, settings.seed)?;
	let mut fold_losses = MeanVariance::default();
	let mut fold_n_estimators = Mean::default();
	match family {
		ModelFamily::Perpetual => {
			let options = perpetual_options_from_params(
				params,
				settings.early_stopping_rounds,
				settings.num_boost_rounds,
				settings.seed,
			)?;
			for (train_indices, validation_indices) in folds.iter() {
				let train = dataset.select_rows(train_indices);
				let validation = dataset.select_rows(validation_indices);
				let model = PerpetualModel::train(&train, &options)?;
				let probabilities = model.predict_proba(&validation)?;
				let auc = auc_roc(&probabilities, &validation.labels.to_vec());
				fold_losses.update(1.0 - auc);
				fold_n_estimators.update(model.n_estimators() as f64);
			}
		}
		ModelFamily::Pkboost => {
			let options = pkboost_options_from_params(params, settings.num_boost_rounds)?;
			for (train_indices, validation_indices) in folds.iter() {
				let train = dataset.select_rows(train_indices);
				let validation = dataset.select_rows(validation_indices);
				let model = PkBoostModel::train(&train, Some(&validation), &options)?;
				let probabilities = model.predict_proba(&validation)?;
				let mut fold_loss = BinaryCrossEntropy::default();
				for (probability, label) in
					probabilities.iter().zip(validation.labels.iter())
				{
					fold_loss.update(BinaryCrossEntropyInput {
						probability: *probability,
						label: *label,
					});
				}
				if let Some(loss) = fold_loss.finalize() {
					fold_losses.update(loss);
				}
				fold_n_estimators.update(model.n_estimators() as f64);
			}
		}
	}
	let (loss, variance) = fold_losses
		.finalize()
		.ok_or_else(|| anyhow::format_err!("cross-validation produced no folds"))?;
	let n_estimators = fold_n_estimators
		.finalize()
		.map(|mean| mean.round() as usize)
		.unwrap_or(0);
	Ok(CvOutput {
		loss,
		variance,
		n_estimators,
		duration: start.elapsed(),
	})
}
