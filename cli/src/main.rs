use std::path::{Path, PathBuf};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use slide_sift_common::config::Config;
use slide_sift_engine::compare::HistogramComparator;
use slide_sift_engine::error::EngineResult;
use slide_sift_engine::media::VideoStream;
use slide_sift_engine::output::TimestampImageWriter;
use slide_sift_engine::progress::ProgressSink;
use slide_sift_engine::slides::SlideExtractor;
use slide_sift_engine::timeline::{step_from_rate, FrameSource, Timeline};

/// Extract distinct slides from a video recording.
#[derive(Debug, Parser)]
#[command(name = "slide-sift", version, about)]
struct Args {
    /// Path to the video file to analyze.
    video: PathBuf,

    /// Directory for the extracted slide images.
    #[arg(short, long)]
    outpath: Option<PathBuf>,

    /// Image format extension for the output files, e.g. "png" or "jpg".
    #[arg(short = 'f', long)]
    format: Option<String>,

    /// Frames per second to analyze.
    #[arg(short = 'r', long)]
    framerate: Option<f64>,

    /// Comparison threshold in (0, 1].
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Optional TOML config file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// indicatif-backed progress sink.
struct BarProgress {
    bar: Option<ProgressBar>,
}

impl BarProgress {
    fn new() -> Self {
        Self { bar: None }
    }
}

impl ProgressSink for BarProgress {
    fn begin(&mut self, total: u64) {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
                .expect("static template")
                .progress_chars("=> "),
        );
        bar.set_message("Analyzing video");
        self.bar = Some(bar);
    }

    fn update(&mut self, position: u64) {
        if let Some(bar) = &self.bar {
            bar.set_position(position);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config from {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    let framerate = args.framerate.unwrap_or(config.analysis.framerate);
    let threshold = args.threshold.unwrap_or(config.analysis.threshold);
    let format = args.format.unwrap_or(config.output.format);
    let outpath = args
        .outpath
        .unwrap_or_else(|| PathBuf::from(&config.output.dir));

    if let Err(e) = run(&args.video, framerate, threshold, &outpath, &format) {
        error!(error = %e, "detection failed");
        std::process::exit(1);
    }
}

fn run(
    video: &Path,
    framerate: f64,
    threshold: f64,
    outpath: &Path,
    format: &str,
) -> EngineResult<()> {
    let stream = VideoStream::open(video)?;
    let step = step_from_rate(stream.frame_rate(), framerate);
    let timeline = Timeline::new(stream, step);

    info!(
        frames = timeline.len(),
        fps = timeline.fps(),
        step = timeline.step(),
        threshold,
        outpath = %outpath.display(),
        "opened video"
    );

    let writer = TimestampImageWriter::new(timeline.fps(), outpath, format)?;
    let mut extractor = SlideExtractor::new(
        timeline,
        Box::new(HistogramComparator::new(threshold)),
        Box::new(writer),
    );

    let slides = extractor.detect_slides(&mut BarProgress::new())?;
    for slide in &slides {
        info!(position = slide.position, label = %slide.label, "slide");
    }
    info!(count = slides.len(), "done");
    Ok(())
}
