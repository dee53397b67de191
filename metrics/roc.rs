use itertools::Itertools;

/// A point on the receiver operating characteristic curve.
#[derive(Clone, Debug, PartialEq)]
pub struct RocCurvePoint {
	/// The classification threshold this point was computed at.
	pub threshold: f64,
	/// true_positives / (true_positives + false_negatives)
	pub true_positive_rate: f64,
	/// false_positives / (false_positives + true_negatives)
	pub false_positive_rate: f64,
}

/// Cumulative true and false positive counts at a given threshold, for rows whose predicted probability is >= the threshold.
#[derive(Clone, Debug)]
pub(crate) struct TpsFpsPoint {
	pub threshold: f64,
	pub true_positives: u64,
	pub false_positives: u64,
}

/// Compute cumulative true and false positives for each distinct predicted probability, descending. Rows with equal probabilities share one entry.
pub(crate) fn compute_tps_fps_by_threshold(
	probabilities: &[f64],
	labels: &[f64],
) -> Vec<TpsFpsPoint> {
	let mut pairs: Vec<(f64, f64)> = probabilities
		.iter()
		.copied()
		.zip(labels.iter().copied())
		.collect();
	pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
	let mut points: Vec<TpsFpsPoint> = Vec::new();
	for (probability, label) in pairs {
		let true_positive = if label == 1.0 { 1 } else { 0 };
		let false_positive = 1 - true_positive;
		if let Some(last) = points.last_mut() {
			if last.threshold == probability {
				last.true_positives += true_positive;
				last.false_positives += false_positive;
				continue;
			}
		}
		let (previous_true_positives, previous_false_positives) = points
			.last()
			.map(|point| (point.true_positives, point.false_positives))
			.unwrap_or((0, 0));
		points.push(TpsFpsPoint {
			threshold: probability,
			true_positives: previous_true_positives + true_positive,
			false_positives: previous_false_positives + false_positive,
		});
	}
	points
}

/// Compute the ROC curve. The first point is always (0, 0) at threshold 1.0.
pub fn compute_roc_curve(probabilities: &[f64], labels: &[f64]) -> Vec<RocCurvePoint> {
	let count_positives = labels.iter().filter(|label| **label == 1.0).count() as f64;
	let count_negatives = labels.len() as f64 - count_positives;
	let tps_fps = compute_tps_fps_by_threshold(probabilities, labels);
	let mut curve = Vec::with_capacity(tps_fps.len() + 1);
	curve.push(RocCurvePoint {
		threshold: 1.0,
		true_positive_rate: 0.0,
		false_positive_rate: 0.0,
	});
	for point in tps_fps {
		curve.push(RocCurvePoint {
			threshold: point.threshold,
			true_positive_rate: point.true_positives as f64 / count_positives,
			false_positive_rate: point.false_positives as f64 / count_negatives,
		});
	}
	curve
}

/// The area under the ROC curve, computed with the trapezoid rule.
pub fn auc_roc(probabilities: &[f64], labels: &[f64]) -> f64 {
	compute_roc_curve(probabilities, labels)
		.iter()
		.tuple_windows()
		.map(|(a, b)| {
			let width = b.false_positive_rate - a.false_positive_rate;
			let height = (a.true_positive_rate + b.true_positive_rate) / 2.0;
			width * height
		})
		.sum()
}

#[test]
fn test_roc_curve() {
	let probabilities = vec![0.9, 0.8, 0.7, 0.6, 0.5];
	let labels = vec![1.0, 0.0, 1.0, 1.0, 0.0];
	let curve = compute_roc_curve(&probabilities, &labels);
	assert_eq!(curve.len(), 6);
	assert_eq!(
		curve[0],
		RocCurvePoint {
			threshold: 1.0,
			true_positive_rate: 0.0,
			false_positive_rate: 0.0,
		}
	);
	assert_eq!(
		curve[4],
		RocCurvePoint {
			threshold: 0.6,
			true_positive_rate: 1.0,
			false_positive_rate: 0.5,
		}
	);
	let auc = auc_roc(&probabilities, &labels);
	assert!((auc - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_roc_curve_buckets_equal_probabilities() {
	let probabilities = vec![0.6, 0.6, 0.4, 0.4];
	let labels = vec![1.0, 1.0, 0.0, 0.0];
	let curve = compute_roc_curve(&probabilities, &labels);
	assert_eq!(curve.len(), 3);
	assert_eq!(curve[1].threshold, 0.6);
	assert_eq!(curve[1].true_positive_rate, 1.0);
	assert_eq!(curve[1].false_positive_rate, 0.0);
	let auc = auc_roc(&probabilities, &labels);
	assert!((auc - 1.0).abs() < f64::EPSILON);
}
