/*!
This crate renders line and bar charts as standalone SVG documents. The chart types describe what to draw; rendering is deterministic, so the same options always produce the same bytes.
*/

mod bar_chart;
mod common;
mod line_chart;

pub use self::bar_chart::{render_bar_chart, BarChartOptions, BarChartPoint};
pub use self::line_chart::{
	render_line_chart, LineChartOptions, LineChartPoint, LineChartSeries, LineStyle,
};

use std::path::Path;

/// Write a rendered chart to disk.
pub fn write_svg(path: &Path, svg: &str) -> std::io::Result<()> {
	std::fs::write(path, svg)
}
