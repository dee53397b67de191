use anyhow::{format_err, Result};
use boosttune_models::{
	MissingStrategy, MissingTreatment, PerpetualTrainOptions, PkBoostMode, PkBoostTrainOptions,
};
use rand::Rng;
use std::collections::BTreeMap;

/// A single sampled hyperparameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
	Float(f64),
	Int(i64),
	Str(String),
}

impl ParamValue {
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			ParamValue::Float(value) => Some(*value),
			ParamValue::Int(value) => Some(*value as f64),
			ParamValue::Str(_) => None,
		}
	}
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			ParamValue::Int(value) => Some(*value),
			_ => None,
		}
	}
	pub fn as_str(&self) -> Option<&str> {
		match self {
			ParamValue::Str(value) => Some(value),
			_ => None,
		}
	}
}

impl std::fmt::Display for ParamValue {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			ParamValue::Float(value) => write!(f, "{}", value),
			ParamValue::Int(value) => write!(f, "{}", value),
			ParamValue::Str(value) => write!(f, "{}", value),
		}
	}
}

/// A flat assignment of parameter names to values. Only parameters on the active branch of a conditional choice are present.
pub type ParamSet = BTreeMap<String, ParamValue>;

#[derive(Clone, Debug)]
pub struct FloatRange {
	pub name: String,
	pub min: f64,
	pub max: f64,
	/// Sample in log space, for scale-like parameters.
	pub log: bool,
}

#[derive(Clone, Debug)]
pub struct IntRange {
	pub name: String,
	pub min: i64,
	pub max: i64,
}

/// A categorical choice. Each option can carry sub-dimensions that only exist when that option is chosen.
#[derive(Clone, Debug)]
pub struct Choice {
	pub name: String,
	pub options: Vec<ChoiceOption>,
}

#[derive(Clone, Debug)]
pub struct ChoiceOption {
	pub value: String,
	pub dimensions: Vec<Dimension>,
}

#[derive(Clone, Debug)]
pub enum Dimension {
	Float(FloatRange),
	Int(IntRange),
	Choice(Choice),
}

impl Dimension {
	pub fn name(&self) -> &str {
		match self {
			Dimension::Float(range) => &range.name,
			Dimension::Int(range) => &range.name,
			Dimension::Choice(choice) => &choice.name,
		}
	}
}

#[derive(Clone, Debug)]
pub struct Space {
	pub dimensions: Vec<Dimension>,
}

impl Space {
	/// Sample uniformly. Top-level dimensions are drawn first, then the sub-dimensions of each chosen branch.
	pub fn sample(&self, rng: &mut impl Rng) -> ParamSet {
		let mut params = ParamSet::new();
		sample_dimensions(&self.dimensions, rng, &mut params);
		params
	}
}

fn sample_dimensions(dimensions: &[Dimension], rng: &mut impl Rng, params: &mut ParamSet) {
	for dimension in dimensions {
		match dimension {
			Dimension::Float(range) => {
				let value = if range.log {
					rng.gen_range(range.min.ln()..range.max.ln()).exp()
				} else {
					rng.gen_range(range.min..range.max)
				};
				params.insert(range.name.clone(), ParamValue::Float(value));
			}
			Dimension::Int(range) => {
				let value = rng.gen_range(range.min..=range.max);
				params.insert(range.name.clone(), ParamValue::Int(value));
			}
			Dimension::Choice(choice) => {
				let index = rng.gen_range(0..choice.options.len());
				let option = &choice.options[index];
				params.insert(choice.name.clone(), ParamValue::Str(option.value.clone()));
				sample_dimensions(&option.dimensions, rng, params);
			}
		}
	}
}

/// The search space for the perpetual family. The missing-value choice is conditional: the node treatment only exists on the branch variant.
pub fn default_perpetual_space() -> Space {
	Space {
		dimensions: vec![
			Dimension::Float(FloatRange {
				name: "budget".to_owned(),
				min: 0.1,
				max: 2.0,
				log: false,
			}),
			Dimension::Int(IntRange {
				name: "max_bin".to_owned(),
				min: 64,
				max: 512,
			}),
			Dimension::Choice(Choice {
				name: "missing".to_owned(),
				options: vec![
					ChoiceOption {
						value: "impute".to_owned(),
						dimensions: vec![],
					},
					ChoiceOption {
						value: "branch".to_owned(),
						dimensions: vec![Dimension::Choice(Choice {
							name: "missing_node_treatment".to_owned(),
							options: vec![
								ChoiceOption {
									value: "assign_to_parent".to_owned(),
									dimensions: vec![],
								},
								ChoiceOption {
									value: "average_leaf_weight".to_owned(),
									dimensions: vec![],
								},
								ChoiceOption {
									value: "average_node_weight".to_owned(),
									dimensions: vec![],
								},
							],
						})],
					},
				],
			}),
		],
	}
}

/// The search space for the pkboost family. The positive class weight range is centered on the observed negative/positive ratio.
pub fn default_pkboost_space(positive_class_weight: f64) -> Space {
	Space {
		dimensions: vec![Dimension::Choice(Choice {
			name: "mode".to_owned(),
			options: vec![
				ChoiceOption {
					value: "single".to_owned(),
					dimensions: vec![Dimension::Float(FloatRange {
						name: "scale_pos_weight".to_owned(),
						min: positive_class_weight / 4.0,
						max: positive_class_weight * 4.0,
						log: true,
					})],
				},
				ChoiceOption {
					value: "partitioned".to_owned(),
					dimensions: vec![
						Dimension::Int(IntRange {
							name: "n_partitions".to_owned(),
							min: 4,
							max: 40,
						}),
						Dimension::Int(IntRange {
							name: "specialist_estimators".to_owned(),
							min: 20,
							max: 100,
						}),
						Dimension::Int(IntRange {
							name: "specialist_max_depth".to_owned(),
							min: 2,
							max: 8,
						}),
					],
				},
			],
		})],
	}
}

fn require_f64(params: &ParamSet, name: &str) -> Result<f64> {
	params
		.get(name)
		.and_then(ParamValue::as_f64)
		.ok_or_else(|| format_err!("parameter \"{}\" is missing or not a number", name))
}

fn require_i64(params: &ParamSet, name: &str) -> Result<i64> {
	params
		.get(name)
		.and_then(ParamValue::as_i64)
		.ok_or_else(|| format_err!("parameter \"{}\" is missing or not an integer", name))
}

fn require_str<'a>(params: &'a ParamSet, name: &str) -> Result<&'a str> {
	params
		.get(name)
		.and_then(ParamValue::as_str)
		.ok_or_else(|| format_err!("parameter \"{}\" is missing or not a string", name))
}

/// Turn a sampled assignment into perpetual train options.
pub fn perpetual_options_from_params(
	params: &ParamSet,
	early_stopping_rounds: usize,
	num_boost_rounds: usize,
	seed: u64,
) -> Result<PerpetualTrainOptions> {
	let missing_strategy = match require_str(params, "missing")? {
		"impute" => MissingStrategy::Impute,
		"branch" => {
			let node_treatment = match require_str(params, "missing_node_treatment")? {
				"assign_to_parent" => MissingTreatment::AssignToParent,
				"average_leaf_weight" => MissingTreatment::AverageLeafWeight,
				"average_node_weight" => MissingTreatment::AverageNodeWeight,
				other => {
					return Err(format_err!("unknown missing_node_treatment \"{}\"", other))
				}
			};
			MissingStrategy::Branch { node_treatment }
		}
		other => return Err(format_err!("unknown missing strategy \"{}\"", other)),
	};
	Ok(PerpetualTrainOptions {
		budget: require_f64(params, "budget")? as f32,
		max_bin: require_i64(params, "max_bin")? as u16,
		missing_strategy,
		stopping_rounds: Some(early_stopping_rounds),
		iteration_limit: Some(num_boost_rounds),
		seed,
	})
}

/// Turn a sampled assignment into pkboost train options.
pub fn pkboost_options_from_params(
	params: &ParamSet,
	num_boost_rounds: usize,
) -> Result<PkBoostTrainOptions> {
	let mode = match require_str(params, "mode")? {
		"single" => PkBoostMode::Single {
			n_estimators: num_boost_rounds,
			scale_pos_weight: require_f64(params, "scale_pos_weight")?,
		},
		"partitioned" => PkBoostMode::Partitioned {
			n_partitions: require_i64(params, "n_partitions")? as usize,
			specialist_estimators: require_i64(params, "specialist_estimators")? as usize,
			specialist_max_depth: require_i64(params, "specialist_max_depth")? as usize,
		},
		other => return Err(format_err!("unknown mode \"{}\"", other)),
	};
	Ok(PkBoostTrainOptions { mode })
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand_xoshiro::Xoshiro256Plus;

	#[test]
	fn test_sample_respects_conditional_branches() {
		let space = default_perpetual_space();
		let mut rng = Xoshiro256Plus::seed_from_u64(47);
		for _ in 0..50 {
			let params = space.sample(&mut rng);
			match params.get("missing").and_then(ParamValue::as_str) {
				Some("impute") => assert!(!params.contains_key("missing_node_treatment")),
				Some("branch") => assert!(params.contains_key("missing_node_treatment")),
				other => panic!("unexpected missing strategy {:?}", other),
			}
			let budget = params.get("budget").and_then(ParamValue::as_f64).unwrap();
			assert!(budget >= 0.1 && budget < 2.0);
		}
	}

	#[test]
	fn test_perpetual_options_from_params() {
		let mut params = ParamSet::new();
		params.insert("budget".to_owned(), ParamValue::Float(1.0));
		params.insert("max_bin".to_owned(), ParamValue::Int(128));
		params.insert("missing".to_owned(), ParamValue::Str("branch".to_owned()));
		params.insert(
			"missing_node_treatment".to_owned(),
			ParamValue::Str("average_leaf_weight".to_owned()),
		);
		let options = perpetual_options_from_params(&params, 25, 100, 47).unwrap();
		assert_eq!(options.max_bin, 128);
		assert_eq!(
			options.missing_strategy,
			MissingStrategy::Branch {
				node_treatment: MissingTreatment::AverageLeafWeight
			}
		);
		assert_eq!(options.stopping_rounds, Some(25));
	}

	#[test]
	fn test_perpetual_options_require_branch_parameters() {
		let mut params = ParamSet::new();
		params.insert("budget".to_owned(), ParamValue::Float(1.0));
		params.insert("max_bin".to_owned(), ParamValue::Int(128));
		params.insert("missing".to_owned(), ParamValue::Str("branch".to_owned()));
		assert!(perpetual_options_from_params(&params, 25, 100, 47).is_err());
	}

	#[test]
	fn test_pkboost_options_from_params() {
		let mut params = ParamSet::new();
		params.insert("mode".to_owned(), ParamValue::Str("single".to_owned()));
		params.insert("scale_pos_weight".to_owned(), ParamValue::Float(3.5));
		let options = pkboost_options_from_params(&params, 100).unwrap();
		match options.mode {
			PkBoostMode::Single {
				n_estimators,
				scale_pos_weight,
			} => {
				assert_eq!(n_estimators, 100);
				assert!((scale_pos_weight - 3.5).abs() < f64::EPSILON);
			}
			_ => panic!(),
		}
	}
}
