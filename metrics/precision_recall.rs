use super::roc::compute_tps_fps_by_threshold;
use itertools::Itertools;

/// A point on the precision-recall curve.
#[derive(Clone, Debug, PartialEq)]
pub struct PrecisionRecallCurvePoint {
	pub threshold: f64,
	pub precision: f64,
	pub recall: f64,
}

/// Compute the precision-recall curve. The first point is always (recall 0, precision 1) at threshold 1.0.
pub fn compute_precision_recall_curve(
	probabilities: &[f64],
	labels: &[f64],
) -> Vec<PrecisionRecallCurvePoint> {
	let count_positives = labels.iter().filter(|label| **label == 1.0).count() as f64;
	let tps_fps = compute_tps_fps_by_threshold(probabilities, labels);
	let mut curve = Vec::with_capacity(tps_fps.len() + 1);
	curve.push(PrecisionRecallCurvePoint {
		threshold: 1.0,
		precision: 1.0,
		recall: 0.0,
	});
	for point in tps_fps {
		let predicted_positives = point.true_positives + point.false_positives;
		curve.push(PrecisionRecallCurvePoint {
			threshold: point.threshold,
			precision: point.true_positives as f64 / predicted_positives as f64,
			recall: point.true_positives as f64 / count_positives,
		});
	}
	curve
}

/// The area under the precision-recall curve, computed with the trapezoid rule over recall.
pub fn auc_precision_recall(probabilities: &[f64], labels: &[f64]) -> f64 {
	compute_precision_recall_curve(probabilities, labels)
		.iter()
		.tuple_windows()
		.map(|(a, b)| {
			let width = b.recall - a.recall;
			let height = (a.precision + b.precision) / 2.0;
			width * height
		})
		.sum()
}

#[test]
fn test_precision_recall_curve() {
	let probabilities = vec![0.9, 0.8, 0.7, 0.6, 0.5];
	let labels = vec![1.0, 0.0, 1.0, 1.0, 0.0];
	let curve = compute_precision_recall_curve(&probabilities, &labels);
	assert_eq!(curve.len(), 6);
	assert_eq!(
		curve[0],
		PrecisionRecallCurvePoint {
			threshold: 1.0,
			precision: 1.0,
			recall: 0.0,
		}
	);
	assert_eq!(
		curve[1],
		PrecisionRecallCurvePoint {
			threshold: 0.9,
			precision: 1.0,
			recall: 1.0 / 3.0,
		}
	);
	let auc = auc_precision_recall(&probabilities, &labels);
	assert!((auc - 55.0 / 72.0).abs() < 1e-12);
}

#[test]
fn test_perfect_classifier_has_unit_pr_auc() {
	let probabilities = vec![0.9, 0.8, 0.2, 0.1];
	let labels = vec![1.0, 1.0, 0.0, 0.0];
	let auc = auc_precision_recall(&probabilities, &labels);
	assert!((auc - 1.0).abs() < f64::EPSILON);
}
