use super::mean::Mean;
use super::StreamingMetric;
use num_traits::clamp;

/// BinaryCrossEntropy is the loss function used for binary classification. [Learn more](https://en.wikipedia.org/wiki/Cross_entropy#Cross-entropy_loss_function_and_logistic_regression).
#[derive(Clone, Debug, Default)]
pub struct BinaryCrossEntropy(Mean);

/// The input to [BinaryCrossEntropy](struct.BinaryCrossEntropy.html). `label` is 0.0 or 1.0.
pub struct BinaryCrossEntropyInput {
	pub probability: f64,
	pub label: f64,
}

impl StreamingMetric<'_> for BinaryCrossEntropy {
	type Input = BinaryCrossEntropyInput;
	type Output = Option<f64>;

	fn update(&mut self, value: BinaryCrossEntropyInput) {
		let BinaryCrossEntropyInput { probability, label } = value;
		// Binary cross entropy is undefined when the probability = 0 or probability = 1.
		// We clamp the probability to be between (std::f64::EPSILON, 1.0-std::f64::EPSILON).
		let probability_clamped = clamp(probability, std::f64::EPSILON, 1.0 - std::f64::EPSILON);
		let binary_cross_entropy = -1.0 * label * probability_clamped.ln()
			+ -1.0 * (1.0 - label) * (1.0 - probability_clamped).ln();
		self.0.update(binary_cross_entropy);
	}

	fn merge(&mut self, other: Self) {
		self.0.merge(other.0)
	}

	fn finalize(self) -> Option<f64> {
		self.0.finalize()
	}
}

#[test]
fn test_binary_cross_entropy() {
	let mut metric = BinaryCrossEntropy::default();
	metric.update(BinaryCrossEntropyInput {
		probability: 0.9,
		label: 1.0,
	});
	metric.update(BinaryCrossEntropyInput {
		probability: 0.1,
		label: 0.0,
	});
	let loss = metric.finalize().unwrap();
	assert!((loss - (-(0.9f64.ln()))).abs() < 1e-12);
}

#[test]
fn test_binary_cross_entropy_is_finite_at_the_boundaries() {
	let mut metric = BinaryCrossEntropy::default();
	metric.update(BinaryCrossEntropyInput {
		probability: 0.0,
		label: 1.0,
	});
	metric.update(BinaryCrossEntropyInput {
		probability: 1.0,
		label: 0.0,
	});
	assert!(metric.finalize().unwrap().is_finite());
}
