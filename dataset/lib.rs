/*!
This crate loads all-numeric CSV files into an in-memory dataset, and provides the shuffling, splitting, and fold-generation primitives the tuning loop is built on. Labels are binary and must be 0 or 1.
*/

use anyhow::{format_err, Context, Result};
use ndarray::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_SEED: u64 = 47;

#[derive(Clone, Debug)]
pub struct Dataset {
	pub feature_names: Vec<String>,
	pub features: Array2<f64>,
	pub labels: Array1<f64>,
}

impl Dataset {
	/// Read a CSV file with a header row, parsing every column except the target as an f64 feature.
	pub fn from_csv(path: &Path, target_column: &str) -> Result<Dataset> {
		let mut reader = csv::ReaderBuilder::new()
			.has_headers(true)
			.from_path(path)
			.with_context(|| format!("failed to open {}", path.display()))?;
		let headers = reader.headers()?.clone();
		let target_index = headers
			.iter()
			.position(|h| h == target_column)
			.ok_or_else(|| format_err!("target column \"{}\" not found", target_column))?;
		let feature_names: Vec<String> = headers
			.iter()
			.enumerate()
			.filter(|(index, _)| *index != target_index)
			.map(|(_, name)| name.to_owned())
			.collect();
		let n_features = feature_names.len();
		let mut features = Vec::new();
		let mut labels = Vec::new();
		for (row_index, record) in reader.records().enumerate() {
			let record = record?;
			for (column_index, field) in record.iter().enumerate() {
				let value: f64 = field.parse().with_context(|| {
					format!(
						"failed to parse \"{}\" at row {} column \"{}\"",
						field,
						row_index + 1,
						&headers[column_index],
					)
				})?;
				if column_index == target_index {
					if value != 0.0 && value != 1.0 {
						return Err(format_err!(
							"label at row {} is {}, expected 0 or 1",
							row_index + 1,
							value
						));
					}
					labels.push(value);
				} else {
					features.push(value);
				}
			}
		}
		if labels.is_empty() {
			return Err(format_err!("{} contains no rows", path.display()));
		}
		let n_rows = labels.len();
		let features = Array2::from_shape_vec((n_rows, n_features), features)
			.map_err(|_| format_err!("{} has rows with inconsistent column counts", path.display()))?;
		Ok(Dataset {
			feature_names,
			features,
			labels: Array1::from(labels),
		})
	}

	pub fn n_rows(&self) -> usize {
		self.labels.len()
	}

	pub fn n_features(&self) -> usize {
		self.features.ncols()
	}

	/// Permute the rows in place with a seeded Xoshiro256Plus.
	pub fn shuffle(&mut self, seed: u64) {
		let mut rng = Xoshiro256Plus::seed_from_u64(seed);
		let mut indices: Vec<usize> = (0..self.n_rows()).collect();
		indices.shuffle(&mut rng);
		self.features = self.features.select(Axis(0), &indices);
		self.labels = self.labels.select(Axis(0), &indices);
	}

	/// Split off the last `test_fraction` of rows as the test set. Call `shuffle` first.
	pub fn train_test_split(&self, test_fraction: f64) -> (Dataset, Dataset) {
		let n_rows = self.n_rows();
		let split_index = n_rows - ((n_rows as f64) * test_fraction).floor() as usize;
		let train_indices: Vec<usize> = (0..split_index).collect();
		let test_indices: Vec<usize> = (split_index..n_rows).collect();
		(
			self.select_rows(&train_indices),
			self.select_rows(&test_indices),
		)
	}

	pub fn select_rows(&self, indices: &[usize]) -> Dataset {
		Dataset {
			feature_names: self.feature_names.clone(),
			features: self.features.select(Axis(0), indices),
			labels: self.labels.select(Axis(0), indices),
		}
	}

	/// Row-major layout, one `Vec<f64>` per row.
	pub fn to_rows(&self) -> Vec<Vec<f64>> {
		self.features
			.axis_iter(Axis(0))
			.map(|row| row.to_vec())
			.collect()
	}

	/// Flat column-major layout.
	pub fn to_column_major(&self) -> Vec<f64> {
		let mut values = Vec::with_capacity(self.n_rows() * self.n_features());
		for column in self.features.axis_iter(Axis(1)) {
			values.extend(column.iter().copied());
		}
		values
	}
}

/// The ratio of negative to positive labels, used to reweight the positive class.
pub fn positive_class_weight(labels: &Array1<f64>) -> Result<f64> {
	let n_positive = labels.iter().filter(|label| **label == 1.0).count();
	let n_negative = labels.len() - n_positive;
	if n_positive == 0 || n_negative == 0 {
		return Err(format_err!("labels contain only one class"));
	}
	Ok(n_negative as f64 / n_positive as f64)
}

/**
Generate stratified k-fold splits. Rows of each class are pooled, shuffled, and dealt round-robin into folds, so every fold sees approximately the same class balance. Returns one `(train_indices, validation_indices)` pair per fold, and every row appears in exactly one validation fold.
*/
pub fn stratified_k_fold(
	labels: &Array1<f64>,
	n_folds: usize,
	seed: u64,
) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
	if n_folds < 2 {
		return Err(format_err!("n_folds must be at least 2, got {}", n_folds));
	}
	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	let mut class_indices: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
	for (index, label) in labels.iter().enumerate() {
		class_indices.entry(*label as u64).or_default().push(index);
	}
	for indices in class_indices.values() {
		if indices.len() < n_folds {
			return Err(format_err!(
				"class with {} rows cannot be split into {} folds",
				indices.len(),
				n_folds
			));
		}
	}
	let mut fold_validation: Vec<Vec<usize>> = vec![Vec::new(); n_folds];
	for indices in class_indices.values_mut() {
		indices.shuffle(&mut rng);
		for (position, index) in indices.iter().enumerate() {
			fold_validation[position % n_folds].push(*index);
		}
	}
	let folds = fold_validation
		.into_iter()
		.map(|mut validation| {
			validation.sort_unstable();
			let train = (0..labels.len())
				.filter(|index| validation.binary_search(index).is_err())
				.collect();
			(train, validation)
		})
		.collect();
	Ok(folds)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn example() -> Dataset {
		let features = Array2::from_shape_vec(
			(10, 2),
			(0..20).map(|value| value as f64).collect(),
		)
		.unwrap();
		let labels = Array1::from(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
		Dataset {
			feature_names: vec!["a".to_owned(), "b".to_owned()],
			features,
			labels,
		}
	}

	#[test]
	fn test_train_test_split() {
		let dataset = example();
		let (train, test) = dataset.train_test_split(0.2);
		assert_eq!(train.n_rows(), 8);
		assert_eq!(test.n_rows(), 2);
		assert_eq!(train.n_features(), 2);
	}

	#[test]
	fn test_stratified_k_fold_covers_every_row() {
		let dataset = example();
		let folds = stratified_k_fold(&dataset.labels, 3, DEFAULT_SEED).unwrap();
		assert_eq!(folds.len(), 3);
		let mut seen = vec![0usize; dataset.n_rows()];
		for (train, validation) in folds.iter() {
			assert_eq!(train.len() + validation.len(), dataset.n_rows());
			for index in validation {
				seen[*index] += 1;
			}
			// every validation fold keeps at least one positive row
			assert!(validation.iter().any(|index| dataset.labels[*index] == 1.0));
		}
		assert!(seen.iter().all(|count| *count == 1));
	}

	#[test]
	fn test_stratified_k_fold_rejects_tiny_class() {
		let labels = Array1::from(vec![0.0, 0.0, 0.0, 1.0]);
		assert!(stratified_k_fold(&labels, 3, DEFAULT_SEED).is_err());
	}

	#[test]
	fn test_positive_class_weight() {
		let dataset = example();
		let weight = positive_class_weight(&dataset.labels).unwrap();
		assert!((weight - 7.0 / 3.0).abs() < f64::EPSILON);
		assert!(positive_class_weight(&Array1::from(vec![1.0, 1.0])).is_err());
	}

	#[test]
	fn test_to_column_major() {
		let dataset = example();
		let values = dataset.to_column_major();
		assert_eq!(values.len(), 20);
		assert_eq!(values[0], 0.0);
		assert_eq!(values[1], 2.0);
		assert_eq!(values[10], 1.0);
	}

	#[test]
	fn test_shuffle_is_deterministic() {
		let mut a = example();
		let mut b = example();
		a.shuffle(DEFAULT_SEED);
		b.shuffle(DEFAULT_SEED);
		assert_eq!(a.labels, b.labels);
	}

	fn write_temp_csv(name: &str, text: &str) -> std::path::PathBuf {
		let path = std::env::temp_dir().join(name);
		std::fs::write(&path, text).unwrap();
		path
	}

	#[test]
	fn test_from_csv() {
		let path = write_temp_csv(
			"boosttune_dataset_ok.csv",
			"a,diagnosis,b\n1.0,0,2.0\n3.0,1,4.0\n",
		);
		let dataset = Dataset::from_csv(&path, "diagnosis").unwrap();
		assert_eq!(dataset.feature_names, vec!["a".to_owned(), "b".to_owned()]);
		assert_eq!(dataset.n_rows(), 2);
		assert_eq!(dataset.n_features(), 2);
		assert_eq!(dataset.features[[1, 1]], 4.0);
		assert_eq!(dataset.labels[1], 1.0);
	}

	#[test]
	fn test_from_csv_rejects_missing_target_column() {
		let path = write_temp_csv("boosttune_dataset_no_target.csv", "a,b\n1.0,2.0\n");
		let error = Dataset::from_csv(&path, "diagnosis").unwrap_err();
		assert!(error
			.to_string()
			.contains("target column \"diagnosis\" not found"));
	}

	#[test]
	fn test_from_csv_rejects_unparseable_cell() {
		let path = write_temp_csv(
			"boosttune_dataset_bad_cell.csv",
			"a,diagnosis\n1.0,0\noops,1\n",
		);
		let error = Dataset::from_csv(&path, "diagnosis").unwrap_err();
		let message = error.to_string();
		assert!(message.contains("\"oops\""));
		assert!(message.contains("row 2"));
		assert!(message.contains("column \"a\""));
	}

	#[test]
	fn test_from_csv_rejects_non_binary_labels() {
		let path = write_temp_csv(
			"boosttune_dataset_bad_label.csv",
			"a,diagnosis\n1.0,0\n2.0,3\n",
		);
		let error = Dataset::from_csv(&path, "diagnosis").unwrap_err();
		assert!(error.to_string().contains("label at row 2 is 3"));
	}

	#[test]
	fn test_from_csv_rejects_empty_file() {
		let path = write_temp_csv("boosttune_dataset_empty.csv", "a,diagnosis\n");
		let error = Dataset::from_csv(&path, "diagnosis").unwrap_err();
		assert!(error.to_string().contains("contains no rows"));
	}
}
