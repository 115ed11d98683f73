//! Backend-neutral figure model for spectra and event-count series.

use crate::signal::{PeakSet, Spectrum, TimeSeries};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

/// Unconnected points, drawn as crosses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub size: u32,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Markers(MarkerSeries),
}

impl Series {
    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            Series::Line(line) => &line.points,
            Series::Markers(markers) => &markers.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn with_labels(mut self, x: &str, y: &str) -> Self {
        self.x.label = Some(x.into());
        self.y.label = Some(y.into());
        self
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// `(x_min, x_max, y_min, y_max)` over all finite points, if any.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for p in self.series.iter().flat_map(|s| s.points().iter()) {
            if !(p[0].is_finite() && p[1].is_finite()) {
                continue;
            }
            bounds = Some(match bounds {
                None => (p[0], p[0], p[1], p[1]),
                Some((x0, x1, y0, y1)) => (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1])),
            });
        }
        bounds
    }
}

pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure) -> anyhow::Result<()>;
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        result.push(points[start]);
    }
    result
}

/// Spectrum up to `max_hz` with the detected peaks marked.
///
/// Bins with non-finite amplitude (log of an exact zero) are left out.
pub fn figure_from_spectrum(spectrum: &Spectrum, peaks: &PeakSet, max_hz: f64) -> Figure {
    let title = match peaks.dominant {
        Some(i) => format!("a peak is {:.1} [Hz]", spectrum.frequencies[i]),
        None => "no peak".to_string(),
    };
    let mut fig = Figure::new(Some(title)).with_labels("Frequency [Hz]", "Amplitude");
    let points: Vec<[f64; 2]> = spectrum
        .points()
        .into_iter()
        .filter(|p| p[0] <= max_hz && p[1].is_finite())
        .collect();
    fig.add_series(Series::Line(LineSeries {
        name: "spectrum".into(),
        points,
        style: Style {
            width: 1.5,
            dash: None,
            color: Color(0x1F77B4),
        },
    }));
    let marks: Vec<[f64; 2]> = peaks
        .indices
        .iter()
        .map(|&i| [spectrum.frequencies[i], spectrum.amplitudes[i]])
        .filter(|p| p[1].is_finite())
        .collect();
    if !marks.is_empty() {
        fig.add_series(Series::Markers(MarkerSeries {
            name: "peaks".into(),
            points: marks,
            size: 6,
            color: Color(0xD62728),
        }));
    }
    fig
}

/// Event counts against time in milliseconds.
pub fn figure_from_timeseries(
    title: &str,
    series: &TimeSeries,
    max_points: usize,
    color: u32,
) -> Figure {
    let dt_ms = 1000.0 / series.fs.max(f64::MIN_POSITIVE);
    let points: Vec<[f64; 2]> = series
        .data
        .iter()
        .enumerate()
        .map(|(i, value)| [i as f64 * dt_ms, *value])
        .collect();
    let mut fig = Figure::new(Some(title.into())).with_labels("Time [ms]", "Number of events");
    fig.add_series(Series::Line(LineSeries {
        name: title.into(),
        points: decimate_points(&points, max_points),
        style: Style {
            width: 1.4,
            dash: None,
            color: Color(color),
        },
    }));
    fig
}
