use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;
use plotters::prelude::*;
use serde::Serialize;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};
use wingbeat_lib::{
    batch::{run_batch, SkippedFile},
    config::PipelineConfig,
    detectors::DetectorKind,
    io::{
        events::load_event_series,
        results::{summarize_by_group, write_results_csv, GroupSummary},
        text as text_io,
    },
    pipeline::{analysis_spectrogram, analysis_spectrum, detect_peaks, estimate_wingbeat},
    plot::{figure_from_spectrum, figure_from_timeseries, Figure, PlotBackend, Series},
    signal::{AmplitudeScale, PeakInfo, TimeSeries},
};

#[derive(Parser)]
#[command(
    name = "wingbeat",
    version,
    about = "Wingbeat frequency estimation from event-camera counts"
)]
struct Cli {
    /// Pipeline configuration (TOML); flags below override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DetectorArg {
    #[value(name = "threshold")]
    Threshold,
    #[value(name = "heuristic")]
    Heuristic,
}

impl From<DetectorArg> for DetectorKind {
    fn from(arg: DetectorArg) -> Self {
        match arg {
            DetectorArg::Threshold => DetectorKind::Threshold,
            DetectorArg::Heuristic => DetectorKind::Heuristic,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ScaleArg {
    #[value(name = "linear")]
    Linear,
    #[value(name = "natural-log")]
    NaturalLog,
}

impl From<ScaleArg> for AmplitudeScale {
    fn from(arg: ScaleArg) -> Self {
        match arg {
            ScaleArg::Linear => AmplitudeScale::Linear,
            ScaleArg::NaturalLog => AmplitudeScale::NaturalLog,
        }
    }
}

/// Where the series comes from: samples (file or stdin) or an event CSV to bin.
#[derive(Args, Clone)]
struct InputArgs {
    /// Newline-delimited samples; stdin when neither this nor --events is given
    #[arg(long, conflicts_with = "events")]
    input: Option<PathBuf>,
    /// Event CSV with timestamps in microseconds, binned into counts
    #[arg(long)]
    events: Option<PathBuf>,
    /// Sampling rate of --input samples (Hz); event input takes it from binning.bin_ms
    #[arg(long, conflicts_with = "events")]
    fs: Option<f64>,
}

impl InputArgs {
    fn none() -> Self {
        Self {
            input: None,
            events: None,
            fs: None,
        }
    }
}

#[derive(Args, Clone, Default)]
struct PipelineArgs {
    #[arg(long)]
    window_length: Option<usize>,
    #[arg(long)]
    detector: Option<DetectorArg>,
    #[arg(long)]
    scale: Option<ScaleArg>,
    #[arg(long)]
    band_low: Option<f64>,
    #[arg(long)]
    band_high: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Amplitude spectrum of a series
    Spectrum {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        pipeline: PipelineArgs,
        /// Only emit bins at or below this frequency
        #[arg(long)]
        max_hz: Option<f64>,
    },
    /// Spectral peaks inside the wingbeat band
    Peaks {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Full wingbeat estimate with harmonic resolution
    Estimate {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Short-time power spectral density
    Spectrogram {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        segment_length: Option<usize>,
        #[arg(long)]
        overlap: Option<usize>,
    },
    /// Estimate every event CSV under a directory and write a results table
    Batch {
        dir: PathBuf,
        /// Results CSV (group,file,frequency_hz)
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Render the spectrum with its peaks to a PNG via plotters
    Plot {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        pipeline: PipelineArgs,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 30.0)]
        max_hz: f64,
        /// Also render the count series to this PNG
        #[arg(long)]
        series_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    let base = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    match cli.command {
        Commands::Spectrum {
            input,
            pipeline,
            max_hz,
        } => cmd_spectrum(&configure(base, &input, &pipeline)?, &input, max_hz)?,
        Commands::Peaks { input, pipeline } => {
            cmd_peaks(&configure(base, &input, &pipeline)?, &input)?
        }
        Commands::Estimate { input, pipeline } => {
            cmd_estimate(&configure(base, &input, &pipeline)?, &input)?
        }
        Commands::Spectrogram {
            input,
            segment_length,
            overlap,
        } => {
            let mut cfg = configure(base, &input, &PipelineArgs::default())?;
            if let Some(len) = segment_length {
                cfg.spectrogram.segment_length = len;
            }
            if let Some(overlap) = overlap {
                cfg.spectrogram.overlap = overlap;
            }
            cmd_spectrogram(&cfg, &input)?
        }
        Commands::Batch { dir, out, pipeline } => {
            let cfg = configure(base, &InputArgs::none(), &pipeline)?;
            cmd_batch(&cfg, &dir, &out)?
        }
        Commands::Plot {
            input,
            pipeline,
            out,
            max_hz,
            series_out,
        } => {
            let cfg = configure(base, &input, &pipeline)?;
            cmd_plot(&cfg, &input, &out, max_hz, series_out.as_deref())?
        }
    }
    Ok(())
}

fn configure(
    mut cfg: PipelineConfig,
    input: &InputArgs,
    args: &PipelineArgs,
) -> Result<PipelineConfig> {
    if let Some(fs) = input.fs {
        cfg.sample_rate_hz = fs;
    }
    if let Some(len) = args.window_length {
        cfg.window_length = len;
    }
    if let Some(detector) = args.detector {
        cfg.detector = detector.into();
    }
    if let Some(scale) = args.scale {
        cfg.amplitude_scale = scale.into();
    }
    if let Some(low) = args.band_low {
        cfg.band.low_hz = low;
    }
    if let Some(high) = args.band_high {
        cfg.band.high_hz = high;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn read_stdin_samples() -> Result<Vec<f64>> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    text_io::parse_f64_series(&buf)
}

fn load_series(cfg: &PipelineConfig, input: &InputArgs) -> Result<TimeSeries> {
    let ts = match (&input.events, &input.input) {
        (Some(path), _) => load_event_series(path, &cfg.binning)?,
        (None, Some(path)) => text_io::read_time_series(path, cfg.sample_rate_hz)?,
        (None, None) => TimeSeries::new(cfg.sample_rate_hz, read_stdin_samples()?),
    };
    info!("loaded {} samples ({:.3} s at {} Hz)", ts.len(), ts.duration(), ts.fs);
    Ok(ts)
}

fn cmd_spectrum(cfg: &PipelineConfig, input: &InputArgs, max_hz: Option<f64>) -> Result<()> {
    let ts = load_series(cfg, input)?;
    let mut spectrum = analysis_spectrum(&ts, cfg)?;
    if let Some(max_hz) = max_hz {
        let keep = spectrum.frequencies.partition_point(|&f| f <= max_hz);
        spectrum.frequencies.truncate(keep);
        spectrum.amplitudes.truncate(keep);
    }
    println!("{}", serde_json::to_string(&spectrum)?);
    Ok(())
}

#[derive(Serialize)]
struct PeaksOutput {
    peaks: Vec<PeakInfo>,
    dominant: Option<PeakInfo>,
}

fn cmd_peaks(cfg: &PipelineConfig, input: &InputArgs) -> Result<()> {
    let ts = load_series(cfg, input)?;
    let spectrum = analysis_spectrum(&ts, cfg)?;
    let peak_set = detect_peaks(&spectrum, cfg);
    let out = PeaksOutput {
        peaks: peak_set.peak_info(&spectrum),
        dominant: peak_set.dominant.map(|i| PeakInfo::at(&spectrum, i)),
    };
    println!("{}", serde_json::to_string(&out)?);
    Ok(())
}

fn cmd_estimate(cfg: &PipelineConfig, input: &InputArgs) -> Result<()> {
    let ts = load_series(cfg, input)?;
    let analysis = estimate_wingbeat(&ts, cfg)?;
    match analysis.report.estimate.rounded() {
        Some(hz) => info!("wingbeat frequency {hz} Hz"),
        None => info!("no wingbeat peak in band"),
    }
    println!("{}", serde_json::to_string(&analysis.report)?);
    Ok(())
}

fn cmd_spectrogram(cfg: &PipelineConfig, input: &InputArgs) -> Result<()> {
    let ts = load_series(cfg, input)?;
    let sg = analysis_spectrogram(&ts, cfg)?;
    println!("{}", serde_json::to_string(&sg)?);
    Ok(())
}

#[derive(Serialize)]
struct BatchOutput {
    results: PathBuf,
    rows: usize,
    skipped: Vec<SkippedFile>,
    groups: Vec<GroupSummary>,
}

fn cmd_batch(cfg: &PipelineConfig, dir: &Path, out: &Path) -> Result<()> {
    let outcome = run_batch(dir, cfg)?;
    write_results_csv(out, &outcome.rows)?;
    let summary = BatchOutput {
        results: out.to_path_buf(),
        rows: outcome.rows.len(),
        groups: summarize_by_group(&outcome.rows),
        skipped: outcome.skipped,
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn cmd_plot(
    cfg: &PipelineConfig,
    input: &InputArgs,
    out: &Path,
    max_hz: f64,
    series_out: Option<&Path>,
) -> Result<()> {
    let ts = load_series(cfg, input)?;
    let analysis = estimate_wingbeat(&ts, cfg)?;
    let fig = figure_from_spectrum(&analysis.spectrum, &analysis.peak_set, max_hz);
    PngBackend::new(out).draw(&fig)?;
    if let Some(path) = series_out {
        let fig = figure_from_timeseries("event counts", &ts, 2048, 0x2CA02C);
        PngBackend::new(path).draw(&fig)?;
    }
    Ok(())
}

struct PngBackend {
    path: PathBuf,
    size: (u32, u32),
}

impl PngBackend {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            size: (800, 480),
        }
    }
}

impl PlotBackend for PngBackend {
    fn draw(&mut self, fig: &Figure) -> Result<()> {
        let (x_min, x_max, y_min, y_max) = fig
            .bounds()
            .ok_or_else(|| anyhow!("figure has no finite points to draw"))?;
        let (x_min, x_max) = widen(x_min, x_max);
        let (y_min, y_max) = widen(y_min, y_max);

        let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                fig.title.clone().unwrap_or_else(|| "Plot".into()),
                ("sans-serif", 24),
            )
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        chart
            .configure_mesh()
            .x_desc(fig.x.label.clone().unwrap_or_default())
            .y_desc(fig.y.label.clone().unwrap_or_default())
            .draw()?;
        for series in &fig.series {
            match series {
                Series::Line(line) => {
                    let (r, g, b) = line.style.color.rgb();
                    let style = RGBColor(r, g, b).stroke_width(line.style.width.round() as u32);
                    chart.draw_series(LineSeries::new(
                        line.points.iter().map(|p| (p[0], p[1])),
                        style,
                    ))?;
                }
                Series::Markers(markers) => {
                    let (r, g, b) = markers.color.rgb();
                    let style = RGBColor(r, g, b).stroke_width(2);
                    chart.draw_series(
                        markers
                            .points
                            .iter()
                            .map(|p| Cross::new((p[0], p[1]), markers.size, style)),
                    )?;
                }
            }
        }
        root.present()
            .with_context(|| format!("writing {}", self.path.display()))?;
        info!("wrote {}", self.path.display());
        Ok(())
    }
}

fn widen(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 0.5, hi + 0.5)
    }
}
