use crate::config::ComparisonMetric;
use anyhow::{format_err, Context, Result};
use boosttune_charts::{
	render_bar_chart, render_line_chart, write_svg, BarChartOptions, BarChartPoint,
	LineChartOptions, LineChartPoint, LineChartSeries, LineStyle,
};
use boosttune_dataset::Dataset;
use boosttune_metrics::{
	auc_precision_recall, auc_roc, compute_precision_recall_curve, compute_roc_curve,
	compute_threshold_metrics, compute_threshold_metrics_curve, BinaryCrossEntropy,
	BinaryCrossEntropyInput, StreamingMetric, ThresholdMetrics,
};
use boosttune_models::TrainedModel;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::path::{Path, PathBuf};

const BLUE: &str = "#0a84ff";
const RED: &str = "#ff453a";
const GREEN: &str = "#30d158";
const GRAY: &str = "#8e8e93";

/// How many features appear in the importance chart.
const MAX_IMPORTANCE_BARS: usize = 20;

/// The final model's metrics on the held-out test split. The threshold metrics are computed at 0.5.
#[derive(Clone, Debug)]
pub struct TestMetrics {
	pub auc_roc: f64,
	pub auc_precision_recall: f64,
	pub logloss: f64,
	pub threshold_metrics: ThresholdMetrics,
}

impl TestMetrics {
	pub fn comparison_value(&self, metric: ComparisonMetric) -> f64 {
		match metric {
			ComparisonMetric::AucRoc => self.auc_roc,
			ComparisonMetric::AucPrecisionRecall => self.auc_precision_recall,
			ComparisonMetric::Logloss => self.logloss,
		}
	}
}

/// Score the model on the held-out test split.
pub fn compute_test_metrics(model: &TrainedModel, test: &Dataset) -> Result<TestMetrics> {
	let probabilities = model.predict_proba(test)?;
	let labels = test.labels.to_vec();
	let mut cross_entropy = BinaryCrossEntropy::default();
	for (probability, label) in probabilities.iter().zip(labels.iter()) {
		cross_entropy.update(BinaryCrossEntropyInput {
			probability: *probability,
			label: *label,
		});
	}
	let logloss = cross_entropy
		.finalize()
		.ok_or_else(|| format_err!("the test split is empty"))?;
	Ok(TestMetrics {
		auc_roc: auc_roc(&probabilities, &labels),
		auc_precision_recall: auc_precision_recall(&probabilities, &labels),
		logloss,
		threshold_metrics: compute_threshold_metrics(&probabilities, &labels, 0.5),
	})
}

/// Render the four evaluation charts for the chosen model into the output directory.
pub fn render_evaluation_charts(
	model: &TrainedModel,
	test: &Dataset,
	output_dir: &Path,
	seed: u64,
) -> Result<Vec<PathBuf>> {
	let probabilities = model.predict_proba(test)?;
	let labels = test.labels.to_vec();
	Ok(vec![
		write_roc_chart(&probabilities, &labels, output_dir)?,
		write_precision_recall_chart(&probabilities, &labels, output_dir)?,
		write_fpr_fnr_chart(&probabilities, &labels, output_dir)?,
		write_feature_importance_chart(model, test, output_dir, seed)?,
	])
}

fn write_chart(path: PathBuf, svg: &str) -> Result<PathBuf> {
	write_svg(&path, svg).with_context(|| format!("failed to write {}", path.display()))?;
	Ok(path)
}

fn write_roc_chart(probabilities: &[f64], labels: &[f64], output_dir: &Path) -> Result<PathBuf> {
	let curve = compute_roc_curve(probabilities, labels);
	let options = LineChartOptions {
		series: vec![
			LineChartSeries {
				color: BLUE.to_owned(),
				data: curve
					.iter()
					.map(|point| LineChartPoint {
						x: point.false_positive_rate,
						y: Some(point.true_positive_rate),
					})
					.collect(),
				line_style: Some(LineStyle::Solid),
				title: Some("ROC".to_owned()),
			},
			LineChartSeries {
				color: GRAY.to_owned(),
				data: vec![
					LineChartPoint { x: 0.0, y: Some(0.0) },
					LineChartPoint { x: 1.0, y: Some(1.0) },
				],
				line_style: Some(LineStyle::Dashed),
				title: Some("Reference".to_owned()),
			},
		],
		title: Some("Receiver Operating Characteristic Curve".to_owned()),
		x_axis_title: Some("False Positive Rate".to_owned()),
		y_axis_title: Some("True Positive Rate".to_owned()),
		x_min: Some(0.0),
		x_max: Some(1.0),
		y_min: Some(0.0),
		y_max: Some(1.0),
		..Default::default()
	};
	write_chart(output_dir.join("roc.svg"), &render_line_chart(&options))
}

fn write_precision_recall_chart(
	probabilities: &[f64],
	labels: &[f64],
	output_dir: &Path,
) -> Result<PathBuf> {
	let curve = compute_precision_recall_curve(probabilities, labels);
	let options = LineChartOptions {
		series: vec![LineChartSeries {
			color: BLUE.to_owned(),
			data: curve
				.iter()
				.map(|point| LineChartPoint {
					x: point.recall,
					y: Some(point.precision),
				})
				.collect(),
			line_style: Some(LineStyle::Solid),
			title: Some("PR".to_owned()),
		}],
		title: Some("Precision Recall Curve".to_owned()),
		x_axis_title: Some("Recall".to_owned()),
		y_axis_title: Some("Precision".to_owned()),
		x_min: Some(0.0),
		x_max: Some(1.0),
		y_min: Some(0.0),
		y_max: Some(1.0),
		..Default::default()
	};
	write_chart(
		output_dir.join("precision_recall.svg"),
		&render_line_chart(&options),
	)
}

fn write_fpr_fnr_chart(
	probabilities: &[f64],
	labels: &[f64],
	output_dir: &Path,
) -> Result<PathBuf> {
	let curve = compute_threshold_metrics_curve(probabilities, labels);
	let options = LineChartOptions {
		series: vec![
			LineChartSeries {
				color: BLUE.to_owned(),
				data: curve
					.iter()
					.map(|point| LineChartPoint {
						x: point.threshold,
						y: Some(point.false_positive_rate),
					})
					.collect(),
				line_style: Some(LineStyle::Solid),
				title: Some("FPR".to_owned()),
			},
			LineChartSeries {
				color: RED.to_owned(),
				data: curve
					.iter()
					.map(|point| LineChartPoint {
						x: point.threshold,
						y: Some(point.false_negative_rate),
					})
					.collect(),
				line_style: Some(LineStyle::Solid),
				title: Some("FNR".to_owned()),
			},
		],
		title: Some("Error Rates by Threshold".to_owned()),
		x_axis_title: Some("Threshold".to_owned()),
		y_axis_title: Some("Rate".to_owned()),
		y_min: Some(0.0),
		y_max: Some(1.0),
		..Default::default()
	};
	write_chart(output_dir.join("fpr_fnr.svg"), &render_line_chart(&options))
}

fn write_feature_importance_chart(
	model: &TrainedModel,
	test: &Dataset,
	output_dir: &Path,
	seed: u64,
) -> Result<PathBuf> {
	let (mut importances, x_axis_title) = match model {
		TrainedModel::Perpetual(model) => {
			let contributions = model.mean_abs_contributions(test)?;
			let importances: Vec<(String, f64)> = test
				.feature_names
				.iter()
				.cloned()
				.zip(contributions)
				.collect();
			(importances, "Mean |SHAP contribution|")
		}
		TrainedModel::PkBoost(_) => (
			permutation_importance(model, test, seed)?,
			"Permutation importance (AUC drop)",
		),
	};
	importances.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
	importances.truncate(MAX_IMPORTANCE_BARS);
	let options = BarChartOptions {
		color: GREEN.to_owned(),
		data: importances
			.into_iter()
			.map(|(label, value)| BarChartPoint { label, value })
			.collect(),
		title: Some("Feature Importance".to_owned()),
		x_axis_title: Some(x_axis_title.to_owned()),
		x_max: None,
	};
	write_chart(
		output_dir.join("feature_importance.svg"),
		&render_bar_chart(&options),
	)
}

/// Importance as the AUC drop when one feature's column is shuffled, for backends without a native attribution method.
fn permutation_importance(
	model: &TrainedModel,
	test: &Dataset,
	seed: u64,
) -> Result<Vec<(String, f64)>> {
	let labels = test.labels.to_vec();
	let baseline = auc_roc(&model.predict_proba(test)?, &labels);
	let mut importances = Vec::with_capacity(test.n_features());
	for feature_index in 0..test.n_features() {
		let mut rng = Xoshiro256Plus::seed_from_u64(seed.wrapping_add(feature_index as u64));
		let mut column: Vec<f64> = test.features.column(feature_index).to_vec();
		column.shuffle(&mut rng);
		let mut permuted = test.clone();
		for (row_index, value) in column.into_iter().enumerate() {
			permuted.features[[row_index, feature_index]] = value;
		}
		let auc = auc_roc(&model.predict_proba(&permuted)?, &labels);
		importances.push((test.feature_names[feature_index].clone(), baseline - auc));
	}
	Ok(importances)
}

#[test]
fn test_comparison_value() {
	let metrics = TestMetrics {
		auc_roc: 0.9,
		auc_precision_recall: 0.8,
		logloss: 0.3,
		threshold_metrics: compute_threshold_metrics(&[0.9, 0.1], &[1.0, 0.0], 0.5),
	};
	assert!((metrics.comparison_value(ComparisonMetric::AucRoc) - 0.9).abs() < f64::EPSILON);
	assert!((metrics.comparison_value(ComparisonMetric::Logloss) - 0.3).abs() < f64::EPSILON);
}
