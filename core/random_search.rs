use crate::cv::CvOutput;
use crate::space::{ParamSet, Space};
use crate::trial::{Trial, TrialHistory, TrialStatus};
use anyhow::Result;
use boosttune_util::progress_counter::ProgressCounter;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::time::Instant;

/// Seeded uniform random search. Sampling is two-phase: top-level dimensions first, then the parameters of whichever branch was drawn.
pub fn optimize_random(
	space: &Space,
	max_evals: usize,
	seed: u64,
	evaluate: &mut dyn FnMut(&ParamSet) -> Result<CvOutput>,
	progress: &ProgressCounter,
) -> Result<TrialHistory> {
	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	let mut history = TrialHistory::default();
	for index in 0..max_evals {
		let start = Instant::now();
		let params = space.sample(&mut rng);
		let trial = match evaluate(&params) {
			Ok(output) => Trial {
				index,
				params,
				loss: output.loss,
				variance: output.variance,
				n_estimators: output.n_estimators,
				duration: output.duration,
				status: TrialStatus::Ok,
			},
			Err(_) => Trial::failed(index, params, start.elapsed()),
		};
		history.push(trial);
		progress.inc(1);
	}
	Ok(history)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::space::default_perpetual_space;
	use std::time::Duration;

	fn fake_output(loss: f64) -> CvOutput {
		CvOutput {
			loss,
			variance: 0.0,
			n_estimators: 10,
			duration: Duration::from_millis(1),
		}
	}

	#[test]
	fn test_optimize_random_is_deterministic() {
		let space = default_perpetual_space();
		let run = |seed| {
			let progress = ProgressCounter::new(5);
			optimize_random(&space, 5, seed, &mut |params| {
				Ok(fake_output(
					params.get("budget").and_then(|value| value.as_f64()).unwrap(),
				))
			}, &progress)
			.unwrap()
		};
		let a = run(47);
		let b = run(47);
		for (trial_a, trial_b) in a.trials().iter().zip(b.trials().iter()) {
			assert_eq!(trial_a.params, trial_b.params);
		}
		assert!((a.best().unwrap().loss - b.best().unwrap().loss).abs() < f64::EPSILON);
	}

	#[test]
	fn test_optimize_random_swallows_failures() {
		let space = default_perpetual_space();
		let progress = ProgressCounter::new(6);
		let mut calls = 0;
		let history = optimize_random(
			&space,
			6,
			47,
			&mut |_| {
				calls += 1;
				if calls == 1 {
					Err(anyhow::format_err!("first candidate failed"))
				} else {
					Ok(fake_output(0.4))
				}
			},
			&progress,
		)
		.unwrap();
		assert_eq!(history.len(), 6);
		assert_eq!(history.trials()[0].status, TrialStatus::Failed);
		assert!(history.trials()[0].loss.is_infinite());
		assert_eq!(history.best().unwrap().index, 1);
	}
}
