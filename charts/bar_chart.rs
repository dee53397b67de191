use crate::common::{compute_bounds, escape_xml, format_number};
use std::fmt::Write;

/// A horizontal bar chart, one bar per labeled value.
#[derive(Clone, Debug, Default)]
pub struct BarChartOptions {
	pub color: String,
	pub data: Vec<BarChartPoint>,
	pub title: Option<String>,
	pub x_axis_title: Option<String>,
	pub x_max: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct BarChartPoint {
	pub label: String,
	pub value: f64,
}

const WIDTH: f64 = 600.0;
const BAR_HEIGHT: f64 = 20.0;
const BAR_GAP: f64 = 8.0;
const MARGIN_LEFT: f64 = 180.0;
const MARGIN_RIGHT: f64 = 48.0;
const MARGIN_TOP: f64 = 48.0;
const MARGIN_BOTTOM: f64 = 40.0;
const FONT_SIZE: f64 = 12.0;

/// Render the chart as a standalone SVG document. The height grows with the number of bars.
pub fn render_bar_chart(options: &BarChartOptions) -> String {
	let n_bars = options.data.len();
	let height = MARGIN_TOP + MARGIN_BOTTOM + (n_bars as f64) * (BAR_HEIGHT + BAR_GAP);
	let (_, x_max) = compute_bounds(
		options.data.iter().map(|point| Some(point.value)),
		Some(0.0),
		options.x_max,
	);
	let chart_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
	let mut svg = String::new();
	writeln!(
		svg,
		"<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" font-family=\"sans-serif\" font-size=\"{}\">",
		WIDTH, height, WIDTH, height, FONT_SIZE,
	)
	.unwrap();
	writeln!(
		svg,
		"\t<rect width=\"{}\" height=\"{}\" fill=\"white\"/>",
		WIDTH, height,
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
	for (index, point) in options.data.iter().enumerate() {
		let y = MARGIN_TOP + (index as f64) * (BAR_HEIGHT + BAR_GAP);
		let bar_width = if x_max > 0.0 {
			(point.value.max(0.0) / x_max) * chart_width
		} else {
			0.0
		};
		writeln!(
			svg,
			"\t<text x=\"{}\" y=\"{:.2}\" text-anchor=\"end\">{}</text>",
			MARGIN_LEFT - 8.0,
			y + BAR_HEIGHT / 2.0 + FONT_SIZE / 2.0 - 2.0,
			escape_xml(&point.label),
		)
		.unwrap();
		writeln!(
			svg,
			"\t<rect x=\"{}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{}\" fill=\"{}\"/>",
			MARGIN_LEFT, y, bar_width, BAR_HEIGHT, options.color,
		)
		.unwrap();
		writeln!(
			svg,
			"\t<text x=\"{:.2}\" y=\"{:.2}\">{}</text>",
			MARGIN_LEFT + bar_width + 6.0,
			y + BAR_HEIGHT / 2.0 + FONT_SIZE / 2.0 - 2.0,
			format_number(point.value),
		)
		.unwrap();
	}
	if let Some(x_axis_title) = &options.x_axis_title {
		writeln!(
			svg,
			"\t<text x=\"{}\" y=\"{:.2}\" text-anchor=\"middle\">{}</text>",
			MARGIN_LEFT + chart_width / 2.0,
			height - 12.0,
			escape_xml(x_axis_title),
		)
		.unwrap();
	}
	svg.push_str("</svg>\n");
	svg
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_render_bar_chart() {
		let options = BarChartOptions {
			color: "#30d158".to_owned(),
			data: vec![
				BarChartPoint {
					label: "age".to_owned(),
					value: 0.5,
				},
				BarChartPoint {
					label: "income".to_owned(),
					value: 0.25,
				},
			],
			title: Some("Feature Importance".to_owned()),
			x_axis_title: Some("mean |contribution|".to_owned()),
			x_max: None,
		};
		let svg = render_bar_chart(&options);
		assert!(svg.starts_with("<svg"));
		assert_eq!(svg.matches("<rect").count(), 3);
		assert!(svg.contains("income"));
	}

	#[test]
	fn test_label_is_escaped() {
		let options = BarChartOptions {
			color: "#30d158".to_owned(),
			data: vec![BarChartPoint {
				label: "a<b".to_owned(),
				value: 1.0,
			}],
			..Default::default()
		};
		assert!(render_bar_chart(&options).contains("a&lt;b"));
	}
}
