use crate::cv::CvOutput;
use crate::space::{Dimension, ParamSet, ParamValue, Space};
use crate::tpe_search::FAILED_TRIAL_PENALTY;
use crate::trial::{Trial, TrialHistory, TrialStatus};
use anyhow::Result;
use boosttune_util::progress_counter::ProgressCounter;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::time::Instant;
use tpe::{categorical_range, histogram_estimator, parzen_estimator, range, TpeOptimizer};

/**
The imperative Bayesian driver. Unlike [`optimize_tpe`](crate::tpe_search::optimize_tpe), optimizers are created lazily the first time a parameter is suggested, and a trial only asks and tells the parameters it actually touched. Parameters on inactive branches never enter the model.
*/
pub struct Study {
	rng: Xoshiro256Plus,
	optimizers: BTreeMap<String, TpeOptimizer>,
}

impl Study {
	pub fn new(seed: u64) -> Study {
		Study {
			rng: Xoshiro256Plus::seed_from_u64(seed),
			optimizers: BTreeMap::new(),
		}
	}

	pub fn trial(&mut self) -> StudyTrial {
		StudyTrial {
			study: self,
			asked: Vec::new(),
			params: ParamSet::new(),
		}
	}
}

pub struct StudyTrial<'a> {
	study: &'a mut Study,
	asked: Vec<(String, f64)>,
	params: ParamSet,
}

impl StudyTrial<'_> {
	pub fn suggest_float(&mut self, name: &str, min: f64, max: f64, log: bool) -> Result<f64> {
		let Study { rng, optimizers } = &mut *self.study;
		let optimizer = match optimizers.entry(name.to_owned()) {
			Entry::Occupied(entry) => entry.into_mut(),
			Entry::Vacant(entry) => {
				let param_range = if log {
					range(min.ln(), max.ln())?
				} else {
					range(min, max)?
				};
				entry.insert(TpeOptimizer::new(parzen_estimator(), param_range))
			}
		};
		let raw = optimizer.ask(rng)?;
		let value = if log { raw.exp() } else { raw };
		self.asked.push((name.to_owned(), raw));
		self.params.insert(name.to_owned(), ParamValue::Float(value));
		Ok(value)
	}

	pub fn suggest_int(&mut self, name: &str, min: i64, max: i64) -> Result<i64> {
		let Study { rng, optimizers } = &mut *self.study;
		let optimizer = match optimizers.entry(name.to_owned()) {
			Entry::Occupied(entry) => entry.into_mut(),
			Entry::Vacant(entry) => {
				let param_range = range(min as f64, (max + 1) as f64)?;
				entry.insert(TpeOptimizer::new(parzen_estimator(), param_range))
			}
		};
		let raw = optimizer.ask(rng)?;
		let value = (raw.floor() as i64).clamp(min, max);
		self.asked.push((name.to_owned(), raw));
		self.params.insert(name.to_owned(), ParamValue::Int(value));
		Ok(value)
	}

	pub fn suggest_str<'s>(&mut self, name: &str, choices: &[&'s str]) -> Result<&'s str> {
		let Study { rng, optimizers } = &mut *self.study;
		let optimizer = match optimizers.entry(name.to_owned()) {
			Entry::Occupied(entry) => entry.into_mut(),
			Entry::Vacant(entry) => entry.insert(TpeOptimizer::new(
				histogram_estimator(),
				categorical_range(choices.len())?,
			)),
		};
		let raw = optimizer.ask(rng)?;
		let index = (raw.floor() as usize).min(choices.len() - 1);
		let choice = choices[index];
		self.asked.push((name.to_owned(), raw));
		self.params.insert(name.to_owned(), ParamValue::Str(choice.to_owned()));
		Ok(choice)
	}

	pub fn params(&self) -> &ParamSet {
		&self.params
	}

	/// Report the loss back to every optimizer this trial touched.
	pub fn finish(self, loss: f64) -> Result<()> {
		for (name, raw) in self.asked {
			if let Some(optimizer) = self.study.optimizers.get_mut(&name) {
				optimizer.tell(raw, loss)?;
			}
		}
		Ok(())
	}
}

fn suggest_dimensions(trial: &mut StudyTrial, dimensions: &[Dimension]) -> Result<()> {
	for dimension in dimensions {
		match dimension {
			Dimension::Float(float_range) => {
				trial.suggest_float(
					&float_range.name,
					float_range.min,
					float_range.max,
					float_range.log,
				)?;
			}
			Dimension::Int(int_range) => {
				trial.suggest_int(&int_range.name, int_range.min, int_range.max)?;
			}
			Dimension::Choice(choice) => {
				let values: Vec<&str> =
					choice.options.iter().map(|option| option.value.as_str()).collect();
				let chosen = trial.suggest_str(&choice.name, &values)?;
				if let Some(option) = choice.options.iter().find(|option| option.value == chosen) {
					suggest_dimensions(trial, &option.dimensions)?;
				}
			}
		}
	}
	Ok(())
}

pub fn optimize_study(
	space: &Space,
	max_evals: usize,
	seed: u64,
	evaluate: &mut dyn FnMut(&ParamSet) -> Result<CvOutput>,
	progress: &ProgressCounter,
) -> Result<TrialHistory> {
	let mut study = Study::new(seed);
	let mut history = TrialHistory::default();
	for index in 0..max_evals {
		let start = Instant::now();
		let mut trial = study.trial();
		suggest_dimensions(&mut trial, &space.dimensions)?;
		let params = trial.params().clone();
		match evaluate(&params) {
			Ok(output) => {
				trial.finish(output.loss)?;
				history.push(Trial {
					index,
					params,
					loss: output.loss,
					variance: output.variance,
					n_estimators: output.n_estimators,
					duration: output.duration,
					status: TrialStatus::Ok,
				});
			}
			Err(_) => {
				trial.finish(FAILED_TRIAL_PENALTY)?;
				history.push(Trial::failed(index, params, start.elapsed()));
			}
		}
		progress.inc(1);
	}
	Ok(history)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::space::default_pkboost_space;
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
	fn test_study_only_models_touched_parameters() {
		let mut study = Study::new(47);
		let mut trial = study.trial();
		let mode = trial.suggest_str("mode", &["single", "partitioned"]).unwrap();
		if mode == "single" {
			trial.suggest_float("scale_pos_weight", 0.5, 8.0, true).unwrap();
		} else {
			trial.suggest_int("n_partitions", 4, 40).unwrap();
		}
		let params = trial.params().clone();
		trial.finish(0.5).unwrap();
		assert!(params.contains_key("mode"));
		// exactly one branch was suggested
		assert_eq!(
			params.contains_key("scale_pos_weight") as usize
				+ params.contains_key("n_partitions") as usize,
			1
		);
	}

	#[test]
	fn test_optimize_study_over_a_conditional_space() {
		let space = default_pkboost_space(3.0);
		let progress = ProgressCounter::new(8);
		let history = optimize_study(
			&space,
			8,
			47,
			&mut |params| {
				let mode = params.get("mode").and_then(|value| value.as_str()).unwrap();
				if mode == "partitioned" {
					Err(anyhow::format_err!("partitioned training failed"))
				} else {
					Ok(fake_output(0.25))
				}
			},
			&progress,
		)
		.unwrap();
		assert_eq!(history.len(), 8);
		assert_eq!(progress.get(), 8);
		for trial in history.trials() {
			let mode = trial.params.get("mode").and_then(|value| value.as_str());
			match (mode, trial.status) {
				(Some("single"), TrialStatus::Ok) => {
					assert!(trial.params.contains_key("scale_pos_weight"));
					assert!(!trial.params.contains_key("n_partitions"));
				}
				(Some("partitioned"), TrialStatus::Failed) => {
					assert!(trial.params.contains_key("n_partitions"));
					assert!(!trial.params.contains_key("scale_pos_weight"));
				}
				other => panic!("unexpected trial shape {:?}", other),
			}
		}
	}
}
