/// The grid line interval is k * 10 ** p. k will always be 1, 2, or 5.
#[derive(Clone, Copy, Debug)]
pub struct GridLineInterval {
	pub k: f64,
	pub p: i32,
}

impl GridLineInterval {
	pub fn value(self) -> f64 {
		self.k * 10.0f64.powi(self.p)
	}
}

/// Choose the grid line interval that produces at most `target_count` grid lines over [min, max].
pub fn compute_grid_line_interval(min: f64, max: f64, target_count: usize) -> GridLineInterval {
	let raw = (max - min) / target_count as f64;
	let p = raw.log10().floor() as i32;
	let base = 10.0f64.powi(p);
	for k in &[1.0, 2.0, 5.0] {
		if k * base >= raw {
			return GridLineInterval { k: *k, p };
		}
	}
	GridLineInterval { k: 1.0, p: p + 1 }
}

/// The grid line values covering [min, max], aligned to multiples of the interval.
pub fn compute_grid_lines(min: f64, max: f64, interval: GridLineInterval) -> Vec<f64> {
	let interval = interval.value();
	let mut lines = Vec::new();
	let mut value = (min / interval).ceil() * interval;
	while value <= max + interval * 1e-9 {
		lines.push(value);
		value += interval;
	}
	lines
}

pub fn format_number(value: f64) -> String {
	// round away float noise introduced by repeated interval addition
	let rounded = (value * 1e6).round() / 1e6;
	if rounded == 0.0 {
		return "0".to_owned();
	}
	lexical::to_string(rounded)
}

pub fn escape_xml(value: &str) -> String {
	value
		.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
}

/// The min and max over a sequence of values, with Nones skipped and equal bounds nudged apart.
pub fn compute_bounds(
	values: impl Iterator<Item = Option<f64>>,
	min_override: Option<f64>,
	max_override: Option<f64>,
) -> (f64, f64) {
	let mut min = f64::INFINITY;
	let mut max = f64::NEG_INFINITY;
	for value in values.flatten() {
		min = min.min(value);
		max = max.max(value);
	}
	if !min.is_finite() || !max.is_finite() {
		min = 0.0;
		max = 1.0;
	}
	let mut min = min_override.unwrap_or(min);
	let mut max = max_override.unwrap_or(max);
	if max <= min {
		max = min + 1.0;
		min -= if min == 0.0 { 0.0 } else { 1.0 };
	}
	(min, max)
}

#[test]
fn test_grid_line_interval() {
	let interval = compute_grid_line_interval(0.0, 1.0, 5);
	assert!((interval.value() - 0.2).abs() < 1e-12);
	let interval = compute_grid_line_interval(0.0, 100.0, 4);
	assert!((interval.value() - 50.0).abs() < 1e-12);
}

#[test]
fn test_grid_lines() {
	let interval = compute_grid_line_interval(0.0, 1.0, 5);
	let lines = compute_grid_lines(0.0, 1.0, interval);
	assert_eq!(lines.len(), 6);
	assert!((lines[0] - 0.0).abs() < 1e-12);
	assert!((lines[5] - 1.0).abs() < 1e-12);
}

#[test]
fn test_format_number() {
	assert_eq!(format_number(0.0), "0");
	assert_eq!(format_number(0.30000000000000004), "0.3");
	assert_eq!(format_number(50.0), "50.0");
}
