use super::roc::compute_tps_fps_by_threshold;
use super::Metric;

/// The confusion matrix and derived metrics at a single classification threshold.
#[derive(Clone, Debug)]
pub struct ThresholdMetrics {
	pub threshold: f64,
	pub true_positives: u64,
	pub false_positives: u64,
	pub true_negatives: u64,
	pub false_negatives: u64,
	pub accuracy: f64,
	pub precision: f64,
	pub recall: f64,
	pub f1_score: f64,
	pub false_positive_rate: f64,
	pub false_negative_rate: f64,
}

pub struct ThresholdMetricsInput<'a> {
	pub probabilities: &'a [f64],
	pub labels: &'a [f64],
	pub threshold: f64,
}

impl<'a> Metric<'a> for ThresholdMetrics {
	type Input = ThresholdMetricsInput<'a>;
	type Output = ThresholdMetrics;

	fn compute(input: ThresholdMetricsInput<'a>) -> ThresholdMetrics {
		let ThresholdMetricsInput {
			probabilities,
			labels,
			threshold,
		} = input;
		let mut true_positives = 0;
		let mut false_positives = 0;
		let mut true_negatives = 0;
		let mut false_negatives = 0;
		for (probability, label) in probabilities.iter().zip(labels.iter()) {
			let predicted_positive = *probability >= threshold;
			let actual_positive = *label == 1.0;
			match (predicted_positive, actual_positive) {
				(true, true) => true_positives += 1,
				(true, false) => false_positives += 1,
				(false, false) => true_negatives += 1,
				(false, true) => false_negatives += 1,
			}
		}
		finalize_threshold_metrics(
			threshold,
			true_positives,
			false_positives,
			true_negatives,
			false_negatives,
		)
	}
}

/// Compute the confusion metrics at one threshold. A probability equal to the threshold counts as a positive prediction.
pub fn compute_threshold_metrics(
	probabilities: &[f64],
	labels: &[f64],
	threshold: f64,
) -> ThresholdMetrics {
	ThresholdMetrics::compute(ThresholdMetricsInput {
		probabilities,
		labels,
		threshold,
	})
}

/// Compute threshold metrics at every distinct predicted probability, in descending threshold order.
pub fn compute_threshold_metrics_curve(
	probabilities: &[f64],
	labels: &[f64],
) -> Vec<ThresholdMetrics> {
	let count_positives = labels.iter().filter(|label| **label == 1.0).count() as u64;
	let count_negatives = labels.len() as u64 - count_positives;
	compute_tps_fps_by_threshold(probabilities, labels)
		.iter()
		.map(|point| {
			finalize_threshold_metrics(
				point.threshold,
				point.true_positives,
				point.false_positives,
				count_negatives - point.false_positives,
				count_positives - point.true_positives,
			)
		})
		.collect()
}

fn finalize_threshold_metrics(
	threshold: f64,
	true_positives: u64,
	false_positives: u64,
	true_negatives: u64,
	false_negatives: u64,
) -> ThresholdMetrics {
	let total = true_positives + false_positives + true_negatives + false_negatives;
	let accuracy = (true_positives + true_negatives) as f64 / total as f64;
	let predicted_positives = true_positives + false_positives;
	let precision = if predicted_positives > 0 {
		true_positives as f64 / predicted_positives as f64
	} else {
		1.0
	};
	let actual_positives = true_positives + false_negatives;
	let recall = if actual_positives > 0 {
		true_positives as f64 / actual_positives as f64
	} else {
		0.0
	};
	let f1_score = if precision + recall > 0.0 {
		2.0 * precision * recall / (precision + recall)
	} else {
		0.0
	};
	let actual_negatives = false_positives + true_negatives;
	let false_positive_rate = if actual_negatives > 0 {
		false_positives as f64 / actual_negatives as f64
	} else {
		0.0
	};
	let false_negative_rate = if actual_positives > 0 {
		false_negatives as f64 / actual_positives as f64
	} else {
		0.0
	};
	ThresholdMetrics {
		threshold,
		true_positives,
		false_positives,
		true_negatives,
		false_negatives,
		accuracy,
		precision,
		recall,
		f1_score,
		false_positive_rate,
		false_negative_rate,
	}
}

#[test]
fn test_threshold_metrics() {
	let probabilities = vec![0.9, 0.8, 0.7, 0.6, 0.5];
	let labels = vec![1.0, 0.0, 1.0, 1.0, 0.0];
	let metrics = compute_threshold_metrics(&probabilities, &labels, 0.65);
	assert_eq!(metrics.true_positives, 2);
	assert_eq!(metrics.false_positives, 1);
	assert_eq!(metrics.true_negatives, 1);
	assert_eq!(metrics.false_negatives, 1);
	assert!((metrics.accuracy - 0.6).abs() < 1e-12);
	assert!((metrics.precision - 2.0 / 3.0).abs() < 1e-12);
	assert!((metrics.recall - 2.0 / 3.0).abs() < 1e-12);
	assert!((metrics.f1_score - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_threshold_metrics_curve() {
	let probabilities = vec![0.9, 0.8, 0.7, 0.6, 0.5];
	let labels = vec![1.0, 0.0, 1.0, 1.0, 0.0];
	let curve = compute_threshold_metrics_curve(&probabilities, &labels);
	assert_eq!(curve.len(), 5);
	// rates are monotone in the right directions as the threshold falls
	assert!(curve
		.windows(2)
		.all(|pair| pair[1].false_positive_rate >= pair[0].false_positive_rate));
	assert!(curve
		.windows(2)
		.all(|pair| pair[1].false_negative_rate <= pair[0].false_negative_rate));
	let last = curve.last().unwrap();
	assert_eq!(last.false_negatives, 0);
	assert_eq!(last.true_negatives, 0);
}
