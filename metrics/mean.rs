use super::StreamingMetric;
use num_traits::cast::ToPrimitive;

/// The streaming mean of a sequence of f64s.
#[derive(Clone, Debug, Default)]
pub struct Mean {
	n: u64,
	sum: f64,
}

impl StreamingMetric<'_> for Mean {
	type Input = f64;
	type Output = Option<f64>;

	fn update(&mut self, input: f64) {
		self.n += 1;
		self.sum += input;
	}

	fn merge(&mut self, other: Self) {
		self.n += other.n;
		self.sum += other.sum;
	}

	fn finalize(self) -> Option<f64> {
		if self.n == 0 {
			None
		} else {
			Some(self.sum / self.n.to_f64().unwrap())
		}
	}
}

/// The streaming mean and population variance of a sequence of f64s, using Welford's algorithm.
/// https://en.wikipedia.org/wiki/Algorithms_for_calculating_variance#Parallel_algorithm
#[derive(Clone, Debug, Default)]
pub struct MeanVariance {
	n: u64,
	mean: f64,
	m2: f64,
}

impl StreamingMetric<'_> for MeanVariance {
	type Input = f64;
	type Output = Option<(f64, f64)>;

	fn update(&mut self, input: f64) {
		self.n += 1;
		let delta = input - self.mean;
		self.mean += delta / self.n.to_f64().unwrap();
		let delta_2 = input - self.mean;
		self.m2 += delta * delta_2;
	}

	fn merge(&mut self, other: Self) {
		if other.n == 0 {
			return;
		}
		if self.n == 0 {
			*self = other;
			return;
		}
		let n_a = self.n.to_f64().unwrap();
		let n_b = other.n.to_f64().unwrap();
		let mean = ((n_a * self.mean) + (n_b * other.mean)) / (n_a + n_b);
		let delta = other.mean - self.mean;
		self.m2 += other.m2 + delta * delta * (n_a * n_b / (n_a + n_b));
		self.mean = mean;
		self.n += other.n;
	}

	fn finalize(self) -> Option<(f64, f64)> {
		if self.n == 0 {
			None
		} else {
			Some((self.mean, self.m2 / self.n.to_f64().unwrap()))
		}
	}
}

#[test]
fn test_mean() {
	let mut mean = Mean::default();
	for value in &[1.0, 2.0, 3.0, 4.0] {
		mean.update(*value);
	}
	assert_eq!(mean.finalize(), Some(2.5));
	assert_eq!(Mean::default().finalize(), None);
}

#[test]
fn test_mean_variance() {
	let mut metric = MeanVariance::default();
	for value in &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
		metric.update(*value);
	}
	let (mean, variance) = metric.finalize().unwrap();
	assert!((mean - 5.0).abs() < 1e-12);
	assert!((variance - 4.0).abs() < 1e-12);
}

#[test]
fn test_mean_variance_merge() {
	let mut a = MeanVariance::default();
	let mut b = MeanVariance::default();
	for value in &[2.0, 4.0, 4.0, 4.0] {
		a.update(*value);
	}
	for value in &[5.0, 5.0, 7.0, 9.0] {
		b.update(*value);
	}
	a.merge(b);
	let (mean, variance) = a.finalize().unwrap();
	assert!((mean - 5.0).abs() < 1e-12);
	assert!((variance - 4.0).abs() < 1e-12);
}
