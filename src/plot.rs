//! Line charts rendered to PNG.

use std::{fmt::Display, ops::Range, path::Path, process::Command};

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDateTime};
use log::warn;
use plotters::prelude::*;

use crate::series::Series;

/// Image size in pixels.
pub const DIMENSIONS: (u32, u32) = (1200, 600);

/// One labelled line of a chart.
#[derive(Debug, Clone)]
pub struct Curve {
    pub label: String,
    pub points: Vec<(NaiveDateTime, f64)>,
}

impl Curve {
    pub fn new(label: &str, series: &Series) -> Self {
        Curve {
            label: label.to_string(),
            points: series.to_points(),
        }
    }
}

/// A time chart with any number of curves sharing the axes.
#[derive(Debug, Clone)]
pub struct Chart {
    pub title: String,
    pub y_desc: String,
    pub curves: Vec<Curve>,
}

impl Chart {
    pub fn new(title: &str, y_desc: &str) -> Self {
        Chart {
            title: title.to_string(),
            y_desc: y_desc.to_string(),
            curves: Vec::new(),
        }
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curves.push(curve);
        self
    }

    /// Draws the chart into `file_path`.
    pub fn render(&self, file_path: &Path) -> Result<()> {
        let (x_range, y_range) = axis_ranges(&self.curves)
            .ok_or_else(|| anyhow!("nothing to plot in `{}`", self.title))?;

        let root = BitMapBackend::new(file_path, DIMENSIONS).into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", 28).into_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, y_range)
            .map_err(draw_error)?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc(self.y_desc.as_str())
            .x_labels(12)
            .x_label_formatter(&|x| format_epoch(*x))
            .draw()
            .map_err(draw_error)?;

        for (idx, curve) in self.curves.iter().enumerate() {
            let color = Palette99::pick(idx).to_rgba();
            chart
                .draw_series(LineSeries::new(
                    curve.points.iter().map(|(ts, v)| (epoch(ts), *v)),
                    color.stroke_width(2),
                ))
                .map_err(draw_error)?
                .label(curve.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_error)?;

        root.present().map_err(draw_error)?;

        Ok(())
    }
}

fn draw_error<E: Display>(e: E) -> anyhow::Error {
    anyhow!("chart drawing failed: {}", e)
}

fn epoch(ts: &NaiveDateTime) -> f64 {
    ts.and_utc().timestamp() as f64
}

fn format_epoch(x: f64) -> String {
    DateTime::from_timestamp(x as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Axis ranges covering every point, padded so flat data stays visible.
fn axis_ranges(curves: &[Curve]) -> Option<(Range<f64>, Range<f64>)> {
    let mut points = curves.iter().flat_map(|c| c.points.iter());
    let (ts, v) = points.next()?;
    let (mut x0, mut x1, mut y0, mut y1) = (epoch(ts), epoch(ts), *v, *v);
    for (ts, v) in points {
        let x = epoch(ts);
        x0 = x0.min(x);
        x1 = x1.max(x);
        y0 = y0.min(*v);
        y1 = y1.max(*v);
    }

    if x1 - x0 < 1.0 {
        x0 -= 3600.0;
        x1 += 3600.0;
    }
    let margin = match y1 - y0 {
        span if span > 0.0 => 0.05 * span,
        _ => (0.05 * y0.abs()).max(1e-3),
    };

    Some((x0..x1, (y0 - margin)..(y1 + margin)))
}

/// Opens a rendered chart with the desktop image viewer.
pub fn show(file_path: &Path) {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };

    if let Err(e) = Command::new(opener).arg(file_path).spawn() {
        warn!("cannot open `{}` with {}: {}", file_path.display(), opener, e);
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn should_cover_all_curves() {
        let curves = vec![
            Curve {
                label: "a".to_string(),
                points: vec![(ts(0), 1.0), (ts(2), 3.0)],
            },
            Curve {
                label: "b".to_string(),
                points: vec![(ts(1), -1.0)],
            },
        ];

        let (x, y) = axis_ranges(&curves).unwrap();

        assert_eq!(x, epoch(&ts(0))..epoch(&ts(2)));
        assert!((y.start - -1.2).abs() < 1e-9);
        assert!((y.end - 3.2).abs() < 1e-9);
    }

    #[test]
    fn should_pad_flat_data() {
        let curves = vec![Curve {
            label: "flat".to_string(),
            points: vec![(ts(5), 10.0)],
        }];

        let (x, y) = axis_ranges(&curves).unwrap();

        assert_eq!(x.end - x.start, 7200.0);
        assert!(y.start < 10.0 && y.end > 10.0);
    }

    #[test]
    fn should_have_no_range_without_points() {
        assert!(axis_ranges(&[]).is_none());
        assert!(axis_ranges(&[Curve {
            label: "empty".to_string(),
            points: vec![]
        }])
        .is_none());
    }

    #[test]
    fn should_format_dates() {
        assert_eq!(format_epoch(epoch(&ts(13))), "2025-01-01");
    }
}
