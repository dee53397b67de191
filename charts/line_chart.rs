use crate::common::{
	compute_bounds, compute_grid_line_interval, compute_grid_lines, escape_xml, format_number,
};
use std::fmt::Write;

#[derive(Clone, Debug, Default)]
pub struct LineChartOptions {
	pub hide_legend: Option<bool>,
	pub series: Vec<LineChartSeries>,
	pub title: Option<String>,
	pub x_axis_title: Option<String>,
	pub x_max: Option<f64>,
	pub x_min: Option<f64>,
	pub y_axis_title: Option<String>,
	pub y_max: Option<f64>,
	pub y_min: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct LineChartSeries {
	pub color: String,
	pub data: Vec<LineChartPoint>,
	pub line_style: Option<LineStyle>,
	pub title: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LineChartPoint {
	pub x: f64,
	pub y: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStyle {
	Solid,
	Dashed,
}

const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 400.0;
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 48.0;
const MARGIN_BOTTOM: f64 = 56.0;
const FONT_SIZE: f64 = 12.0;

/// Render the chart as a standalone SVG document.
pub fn render_line_chart(options: &LineChartOptions) -> String {
	let (x_min, x_max) = compute_bounds(
		options
			.series
			.iter()
			.flat_map(|series| series.data.iter().map(|point| Some(point.x))),
		options.x_min,
		options.x_max,
	);
	let (y_min, y_max) = compute_bounds(
		options
			.series
			.iter()
			.flat_map(|series| series.data.iter().map(|point| point.y)),
		options.y_min,
		options.y_max,
	);
	let chart_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
	let chart_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
	let x_to_pixels =
		|x: f64| MARGIN_LEFT + (x - x_min) / (x_max - x_min) * chart_width;
	let y_to_pixels =
		|y: f64| MARGIN_TOP + chart_height - (y - y_min) / (y_max - y_min) * chart_height;
	let mut svg = String::new();
	writeln!(
		svg,
		"<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" font-family=\"sans-serif\" font-size=\"{}\">",
		WIDTH, HEIGHT, WIDTH, HEIGHT, FONT_SIZE,
	)
	.unwrap();
	writeln!(
		svg,
		"\t<rect width=\"{}\" height=\"{}\" fill=\"white\"/>",
		WIDTH, HEIGHT,
	)
	.unwrap();
	if let Some(title) = &options.title {
		writeln!(
			svg,
			"\t<text x=\"{}\" y=\"20\" text-anchor=\"middle\" font-size=\"14\" font-weight=\"bold\">{}</text>",
			WIDTH / 2.0,
			escape_xml(title),
		)
		.unwrap();
	}
	// grid lines and axis labels
	let x_interval = compute_grid_line_interval(x_min, x_max, 6);
	for grid_line in compute_grid_lines(x_min, x_max, x_interval) {
		let x = x_to_pixels(grid_line);
		writeln!(
			svg,
			"\t<line x1=\"{:.2}\" y1=\"{}\" x2=\"{:.2}\" y2=\"{}\" stroke=\"#e5e5e5\"/>",
			x,
			MARGIN_TOP,
			x,
			MARGIN_TOP + chart_height,
		)
		.unwrap();
		writeln!(
			svg,
			"\t<text x=\"{:.2}\" y=\"{}\" text-anchor=\"middle\">{}</text>",
			x,
			MARGIN_TOP + chart_height + FONT_SIZE + 6.0,
			format_number(grid_line),
		)
		.unwrap();
	}
	let y_interval = compute_grid_line_interval(y_min, y_max, 5);
	for grid_line in compute_grid_lines(y_min, y_max, y_interval) {
		let y = y_to_pixels(grid_line);
		writeln!(
			svg,
			"\t<line x1=\"{}\" y1=\"{:.2}\" x2=\"{}\" y2=\"{:.2}\" stroke=\"#e5e5e5\"/>",
			MARGIN_LEFT,
			y,
			MARGIN_LEFT + chart_width,
			y,
		)
		.unwrap();
		writeln!(
			svg,
			"\t<text x=\"{}\" y=\"{:.2}\" text-anchor=\"end\">{}</text>",
			MARGIN_LEFT - 8.0,
			y + FONT_SIZE / 2.0 - 2.0,
			format_number(grid_line),
		)
		.unwrap();
	}
	// axes
	writeln!(
		svg,
		"\t<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#222\"/>",
		MARGIN_LEFT,
		MARGIN_TOP + chart_height,
		MARGIN_LEFT + chart_width,
		MARGIN_TOP + chart_height,
	)
	.unwrap();
	writeln!(
		svg,
		"\t<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#222\"/>",
		MARGIN_LEFT,
		MARGIN_TOP,
		MARGIN_LEFT,
		MARGIN_TOP + chart_height,
	)
	.unwrap();
	if let Some(x_axis_title) = &options.x_axis_title {
		writeln!(
			svg,
			"\t<text x=\"{}\" y=\"{}\" text-anchor=\"middle\">{}</text>",
			MARGIN_LEFT + chart_width / 2.0,
			HEIGHT - 12.0,
			escape_xml(x_axis_title),
		)
		.unwrap();
	}
	if let Some(y_axis_title) = &options.y_axis_title {
		writeln!(
			svg,
			"\t<text x=\"16\" y=\"{}\" text-anchor=\"middle\" transform=\"rotate(-90 16 {})\">{}</text>",
			MARGIN_TOP + chart_height / 2.0,
			MARGIN_TOP + chart_height / 2.0,
			escape_xml(y_axis_title),
		)
		.unwrap();
	}
	// series
	for series in options.series.iter() {
		let dash = if series.line_style == Some(LineStyle::Dashed) {
			" stroke-dasharray=\"4 4\""
		} else {
			""
		};
		// a None y breaks the line into segments
		let mut segment: Vec<(f64, f64)> = Vec::new();
		let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
		for point in series.data.iter() {
			match point.y {
				Some(y) => segment.push((x_to_pixels(point.x), y_to_pixels(y))),
				None => {
					if !segment.is_empty() {
						segments.push(std::mem::take(&mut segment));
					}
				}
			}
		}
		if !segment.is_empty() {
			segments.push(segment);
		}
		for segment in segments {
			let points = segment
				.iter()
				.map(|(x, y)| format!("{:.2},{:.2}", x, y))
				.collect::<Vec<_>>()
				.join(" ");
			writeln!(
				svg,
				"\t<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"{}/>",
				points, series.color, dash,
			)
			.unwrap();
		}
	}
	// legend
	if !options.hide_legend.unwrap_or(false) {
		let mut legend_x = MARGIN_LEFT;
		for series in options.series.iter() {
			if let Some(title) = &series.title {
				writeln!(
					svg,
					"\t<rect x=\"{:.2}\" y=\"30\" width=\"10\" height=\"10\" fill=\"{}\"/>",
					legend_x, series.color,
				)
				.unwrap();
				writeln!(
					svg,
					"\t<text x=\"{:.2}\" y=\"39\">{}</text>",
					legend_x + 14.0,
					escape_xml(title),
				)
				.unwrap();
				legend_x += 14.0 + (title.len() as f64) * FONT_SIZE * 0.6 + 16.0;
			}
		}
	}
	svg.push_str("</svg>\n");
	svg
}

#[cfg(test)]
mod tests {
	use super::*;

	fn example_options() -> LineChartOptions {
		LineChartOptions {
			series: vec![LineChartSeries {
				color: "#0a84ff".to_owned(),
				data: vec![
					LineChartPoint { x: 0.0, y: Some(0.0) },
					LineChartPoint { x: 0.5, y: Some(0.75) },
					LineChartPoint { x: 1.0, y: Some(1.0) },
				],
				line_style: Some(LineStyle::Solid),
				title: Some("roc".to_owned()),
			}],
			title: Some("ROC".to_owned()),
			x_axis_title: Some("False Positive Rate".to_owned()),
			y_axis_title: Some("True Positive Rate".to_owned()),
			x_min: Some(0.0),
			x_max: Some(1.0),
			y_min: Some(0.0),
			y_max: Some(1.0),
			..Default::default()
		}
	}

	#[test]
	fn test_render_line_chart() {
		let svg = render_line_chart(&example_options());
		assert!(svg.starts_with("<svg"));
		assert!(svg.ends_with("</svg>\n"));
		assert!(svg.contains("polyline"));
		assert!(svg.contains("False Positive Rate"));
	}

	#[test]
	fn test_render_is_deterministic() {
		let options = example_options();
		assert_eq!(render_line_chart(&options), render_line_chart(&options));
	}

	#[test]
	fn test_none_y_breaks_the_line() {
		let mut options = example_options();
		options.series[0].data[1].y = None;
		let svg = render_line_chart(&options);
		assert_eq!(svg.matches("polyline").count(), 2);
	}
}
