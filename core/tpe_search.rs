use crate::cv::CvOutput;
use crate::space::{Dimension, ParamSet, ParamValue, Space};
use crate::trial::{Trial, TrialHistory, TrialStatus};
use anyhow::Result;
use boosttune_util::progress_counter::ProgressCounter;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::collections::BTreeMap;
use std::time::Instant;
use tpe::{categorical_range, histogram_estimator, parzen_estimator, range, TpeOptimizer};

/// The loss told back to the optimizers for a failed trial. It must be finite.
pub(crate) const FAILED_TRIAL_PENALTY: f64 = 1e9;

struct FlatDimension {
	name: String,
	optimizer: TpeOptimizer,
}

/// Build one optimizer per dimension, including the sub-dimensions of every branch. Log-scaled floats are optimized in ln space.
fn flatten(dimensions: &[Dimension], out: &mut Vec<FlatDimension>) -> Result<()> {
	for dimension in dimensions {
		match dimension {
			Dimension::Float(float_range) => {
				let param_range = if float_range.log {
					range(float_range.min.ln(), float_range.max.ln())?
				} else {
					range(float_range.min, float_range.max)?
				};
				out.push(FlatDimension {
					name: float_range.name.clone(),
					optimizer: TpeOptimizer::new(parzen_estimator(), param_range),
				});
			}
			Dimension::Int(int_range) => {
				let param_range = range(int_range.min as f64, (int_range.max + 1) as f64)?;
				out.push(FlatDimension {
					name: int_range.name.clone(),
					optimizer: TpeOptimizer::new(parzen_estimator(), param_range),
				});
			}
			Dimension::Choice(choice) => {
				out.push(FlatDimension {
					name: choice.name.clone(),
					optimizer: TpeOptimizer::new(
						histogram_estimator(),
						categorical_range(choice.options.len())?,
					),
				});
				for option in choice.options.iter() {
					flatten(&option.dimensions, out)?;
				}
			}
		}
	}
	Ok(())
}

/// Turn the asked values into a flat assignment, following only the active branch of each choice.
fn assign(dimensions: &[Dimension], asked: &BTreeMap<String, f64>, params: &mut ParamSet) {
	for dimension in dimensions {
		let raw = match asked.get(dimension.name()) {
			Some(raw) => *raw,
			None => continue,
		};
		match dimension {
			Dimension::Float(float_range) => {
				let value = if float_range.log { raw.exp() } else { raw };
				params.insert(float_range.name.clone(), ParamValue::Float(value));
			}
			Dimension::Int(int_range) => {
				let value = (raw.floor() as i64).clamp(int_range.min, int_range.max);
				params.insert(int_range.name.clone(), ParamValue::Int(value));
			}
			Dimension::Choice(choice) => {
				let index = (raw.floor() as usize).min(choice.options.len() - 1);
				let option = &choice.options[index];
				params.insert(choice.name.clone(), ParamValue::Str(option.value.clone()));
				assign(&option.dimensions, asked, params);
			}
		}
	}
}

/**
The declarative TPE driver: every dimension gets its own optimizer up front, each iteration asks all of them, and the observed loss is told back to all of them. A candidate whose evaluation fails is recorded as a failed trial and the loop continues.
*/
pub fn optimize_tpe(
	space: &Space,
	max_evals: usize,
	seed: u64,
	evaluate: &mut dyn FnMut(&ParamSet) -> Result<CvOutput>,
	progress: &ProgressCounter,
) -> Result<TrialHistory> {
	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	let mut flat = Vec::new();
	flatten(&space.dimensions, &mut flat)?;
	let mut history = TrialHistory::default();
	for index in 0..max_evals {
		let start = Instant::now();
		let mut asked = BTreeMap::new();
		for dimension in flat.iter_mut() {
			let value = dimension.optimizer.ask(&mut rng)?;
			asked.insert(dimension.name.clone(), value);
		}
		let mut params = ParamSet::new();
		assign(&space.dimensions, &asked, &mut params);
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
		let tell_loss = if trial.status == TrialStatus::Ok {
			trial.loss
		} else {
			FAILED_TRIAL_PENALTY
		};
		for dimension in flat.iter_mut() {
			if let Some(value) = asked.get(&dimension.name) {
				dimension.optimizer.tell(*value, tell_loss)?;
			}
		}
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
	fn test_optimize_tpe_runs_every_trial() {
		let space = default_perpetual_space();
		let progress = ProgressCounter::new(8);
		let mut losses = Vec::new();
		let history = optimize_tpe(
			&space,
			8,
			47,
			&mut |params| {
				let budget = params.get("budget").and_then(|value| value.as_f64()).unwrap();
				losses.push(budget);
				Ok(fake_output(budget))
			},
			&progress,
		)
		.unwrap();
		assert_eq!(history.len(), 8);
		assert_eq!(progress.get(), 8);
		let best = history.best().unwrap();
		let lowest = losses.iter().cloned().fold(f64::INFINITY, f64::min);
		assert!((best.loss - lowest).abs() < 1e-12);
	}

	#[test]
	fn test_optimize_tpe_swallows_failed_trials() {
		let space = default_perpetual_space();
		let progress = ProgressCounter::new(4);
		let mut calls = 0;
		let history = optimize_tpe(
			&space,
			4,
			47,
			&mut |_| {
				calls += 1;
				if calls % 2 == 0 {
					Err(anyhow::format_err!("backend exploded"))
				} else {
					Ok(fake_output(0.5))
				}
			},
			&progress,
		)
		.unwrap();
		assert_eq!(history.len(), 4);
		let failed = history
			.trials()
			.iter()
			.filter(|trial| trial.status == TrialStatus::Failed)
			.count();
		assert_eq!(failed, 2);
		assert!(history.best().is_some());
	}

	#[test]
	fn test_assignment_follows_active_branch_only() {
		let space = default_perpetual_space();
		let progress = ProgressCounter::new(10);
		let history = optimize_tpe(
			&space,
			10,
			47,
			&mut |_| Ok(fake_output(0.5)),
			&progress,
		)
		.unwrap();
		for trial in history.trials() {
			let missing = trial.params.get("missing").and_then(|value| value.as_str());
			match missing {
				Some("impute") => assert!(!trial.params.contains_key("missing_node_treatment")),
				Some("branch") => assert!(trial.params.contains_key("missing_node_treatment")),
				other => panic!("unexpected missing strategy {:?}", other),
			}
		}
	}
}
