use crate::space::ParamSet;
use anyhow::{Context, Result};
use boosttune_util::finite::Finite;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrialStatus {
	Ok,
	Failed,
}

impl std::fmt::Display for TrialStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			TrialStatus::Ok => write!(f, "ok"),
			TrialStatus::Failed => write!(f, "failed"),
		}
	}
}

/// One evaluated candidate configuration. Failed trials keep their parameters and duration, with the loss set to infinity.
#[derive(Clone, Debug)]
pub struct Trial {
	pub index: usize,
	pub params: ParamSet,
	pub loss: f64,
	pub variance: f64,
	pub n_estimators: usize,
	pub duration: Duration,
	pub status: TrialStatus,
}

impl Trial {
	pub fn failed(index: usize, params: ParamSet, duration: Duration) -> Trial {
		Trial {
			index,
			params,
			loss: f64::INFINITY,
			variance: 0.0,
			n_estimators: 0,
			duration,
			status: TrialStatus::Failed,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct TrialHistory {
	trials: Vec<Trial>,
}

impl TrialHistory {
	pub fn push(&mut self, trial: Trial) {
		self.trials.push(trial);
	}

	pub fn trials(&self) -> &[Trial] {
		&self.trials
	}

	pub fn len(&self) -> usize {
		self.trials.len()
	}

	pub fn is_empty(&self) -> bool {
		self.trials.is_empty()
	}

	/// The trial with the lowest finite loss, ignoring failed trials.
	pub fn best(&self) -> Option<&Trial> {
		self.trials
			.iter()
			.filter(|trial| trial.status == TrialStatus::Ok)
			.filter_map(|trial| Finite::new(trial.loss).ok().map(|loss| (loss, trial)))
			.min_by_key(|(loss, _)| *loss)
			.map(|(_, trial)| trial)
	}

	/// Write one row per trial. The parameter columns are the sorted union over all trials, with inactive parameters left empty.
	pub fn to_csv(&self, writer: impl std::io::Write) -> Result<()> {
		let param_names: BTreeSet<&str> = self
			.trials
			.iter()
			.flat_map(|trial| trial.params.keys().map(|name| name.as_str()))
			.collect();
		let mut writer = csv::Writer::from_writer(writer);
		let mut header = vec![
			"trial".to_owned(),
			"status".to_owned(),
			"loss".to_owned(),
			"variance".to_owned(),
			"n_estimators".to_owned(),
			"duration_s".to_owned(),
		];
		header.extend(param_names.iter().map(|name| (*name).to_owned()));
		writer.write_record(&header)?;
		for trial in self.trials.iter() {
			let mut record = vec![
				trial.index.to_string(),
				trial.status.to_string(),
				trial.loss.to_string(),
				trial.variance.to_string(),
				trial.n_estimators.to_string(),
				format!("{:.3}", trial.duration.as_secs_f64()),
			];
			for name in param_names.iter() {
				record.push(
					trial
						.params
						.get(*name)
						.map(|value| value.to_string())
						.unwrap_or_default(),
				);
			}
			writer.write_record(&record)?;
		}
		writer.flush()?;
		Ok(())
	}

	pub fn write_csv(&self, path: &Path) -> Result<()> {
		let file = std::fs::File::create(path)
			.with_context(|| format!("failed to create {}", path.display()))?;
		self.to_csv(file)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::space::ParamValue;

	fn trial(index: usize, loss: f64, status: TrialStatus, mode: &str) -> Trial {
		let mut params = ParamSet::new();
		params.insert("mode".to_owned(), ParamValue::Str(mode.to_owned()));
		if mode == "single" {
			params.insert("scale_pos_weight".to_owned(), ParamValue::Float(2.0));
		}
		Trial {
			index,
			params,
			loss,
			variance: 0.01,
			n_estimators: 80,
			duration: Duration::from_millis(1500),
			status,
		}
	}

	#[test]
	fn test_best_ignores_failed_trials() {
		let mut history = TrialHistory::default();
		history.push(trial(0, 0.4, TrialStatus::Ok, "single"));
		history.push(trial(1, f64::INFINITY, TrialStatus::Failed, "partitioned"));
		history.push(trial(2, 0.2, TrialStatus::Ok, "partitioned"));
		assert_eq!(history.best().unwrap().index, 2);
	}

	#[test]
	fn test_best_is_none_when_everything_failed() {
		let mut history = TrialHistory::default();
		history.push(trial(0, f64::INFINITY, TrialStatus::Failed, "single"));
		assert!(history.best().is_none());
	}

	#[test]
	fn test_to_csv() {
		let mut history = TrialHistory::default();
		history.push(trial(0, 0.4, TrialStatus::Ok, "single"));
		history.push(trial(1, 0.3, TrialStatus::Ok, "partitioned"));
		let mut buffer = Vec::new();
		history.to_csv(&mut buffer).unwrap();
		let text = String::from_utf8(buffer).unwrap();
		let mut lines = text.lines();
		assert_eq!(
			lines.next().unwrap(),
			"trial,status,loss,variance,n_estimators,duration_s,mode,scale_pos_weight"
		);
		assert_eq!(lines.next().unwrap(), "0,ok,0.4,0.01,80,1.500,single,2");
		// the inactive parameter column is empty for the partitioned trial
		assert_eq!(lines.next().unwrap(), "1,ok,0.3,0.01,80,1.500,partitioned,");
	}
}
