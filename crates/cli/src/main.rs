use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;

use facetrack_core::bridge::lifecycle_bridge::TrackerBridge;
use facetrack_core::bridge::tracker_session::TrackerSession;
use facetrack_core::detection::infrastructure::template_classifier::TemplateClassifierLoader;
use facetrack_core::shared::config::TrackerConfig;
use facetrack_core::shared::constants::{
    DEFAULT_MATCH_THRESHOLD, DEFAULT_RELATIVE_FACE_SIZE, IMAGE_EXTENSIONS,
};
use facetrack_core::shared::frame::Frame;
use facetrack_core::shared::rect::Rect;
use facetrack_core::shared::size::relative_face_size;

/// Detection-based object tracking over a sequence of images.
#[derive(Parser)]
#[command(name = "facetrack")]
struct Cli {
    /// Input images, fed to the tracker in order.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Classifier template image.
    #[arg(long)]
    classifier: PathBuf,

    /// Minimum face size in pixels (overrides --relative-face-size).
    #[arg(long)]
    min_face_size: Option<i32>,

    /// Minimum face size as a fraction of the first frame's height.
    #[arg(long, default_value_t = DEFAULT_RELATIVE_FACE_SIZE)]
    relative_face_size: f32,

    /// Tracker configuration file (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Classifier match threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
    match_threshold: f32,

    /// Number of consecutive frames each image is shown for.
    #[arg(long, default_value = "10")]
    repeat: usize,

    /// Delay between frames in milliseconds.
    #[arg(long, default_value = "33")]
    frame_interval_ms: u64,
}

#[derive(Serialize)]
struct FrameReport<'a> {
    frame: usize,
    source: &'a Path,
    objects: &'a [Rect],
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = match &cli.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };
    let bridge = TrackerBridge::new(
        Box::new(TemplateClassifierLoader::new(cli.match_threshold)),
        config,
    );

    let session = TrackerSession::open(&bridge, &cli.classifier, cli.min_face_size.unwrap_or(0))?;
    session.start()?;

    let interval = Duration::from_millis(cli.frame_interval_ms);
    let mut face_size_known = cli.min_face_size.is_some();
    let mut out = io::stdout().lock();
    let mut frame_count = 0;

    for (index, path) in cli.images.iter().enumerate() {
        let image = image::open(path)
            .map_err(|e| format!("Failed to open {}: {e}", path.display()))?;
        let frame = Frame::from_image(&image, index);

        if !face_size_known {
            let size = relative_face_size(frame.height(), cli.relative_face_size);
            log::info!("Minimum face size: {size}px");
            session.set_face_size(size)?;
            face_size_known = true;
        }

        for _ in 0..cli.repeat {
            let objects = session.detect(&frame)?;
            let report = FrameReport {
                frame: frame_count,
                source: path,
                objects: &objects,
            };
            serde_json::to_writer(&mut out, &report)?;
            writeln!(out)?;
            frame_count += 1;
            std::thread::sleep(interval);
        }
    }

    session.stop()?;
    session.release()?;
    log::info!("Processed {frame_count} frames");
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.classifier.exists() {
        return Err(format!("Classifier not found: {}", cli.classifier.display()).into());
    }
    for path in &cli.images {
        if !path.exists() {
            return Err(format!("Input file not found: {}", path.display()).into());
        }
        if !is_image(path) {
            return Err(format!("Unsupported image format: {}", path.display()).into());
        }
    }
    if let Some(size) = cli.min_face_size {
        if size <= 0 {
            return Err(format!("Minimum face size must be positive, got {size}").into());
        }
    }
    if !(cli.relative_face_size > 0.0 && cli.relative_face_size <= 1.0) {
        return Err(format!(
            "Relative face size must be in (0.0, 1.0], got {}",
            cli.relative_face_size
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.match_threshold) {
        return Err(format!(
            "Match threshold must be between 0.0 and 1.0, got {}",
            cli.match_threshold
        )
        .into());
    }
    if cli.repeat == 0 {
        return Err("Repeat count must be at least 1".into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cli_for(dir: &Path, extra: &[&str]) -> Cli {
        let template = dir.join("template.png");
        let frame = dir.join("frame.png");
        std::fs::write(&template, b"").unwrap();
        std::fs::write(&frame, b"").unwrap();

        let mut args = vec![
            "facetrack".to_string(),
            "--classifier".to_string(),
            template.display().to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        args.push(frame.display().to_string());
        Cli::parse_from(args)
    }

    #[rstest]
    #[case("frame.png", true)]
    #[case("frame.JPG", true)]
    #[case("frame.pgm", true)]
    #[case("clip.mp4", false)]
    #[case("noext", false)]
    fn test_is_image(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_image(Path::new(name)), expected);
    }

    #[test]
    fn test_defaults_are_valid() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli_for(dir.path(), &[]);

        assert!(validate(&cli).is_ok());
        assert_eq!(cli.repeat, 10);
        assert_eq!(cli.min_face_size, None);
    }

    #[rstest]
    #[case::zero_face_size(&["--min-face-size", "0"])]
    #[case::relative_too_large(&["--relative-face-size", "1.5"])]
    #[case::relative_zero(&["--relative-face-size", "0"])]
    #[case::threshold_out_of_range(&["--match-threshold", "2"])]
    #[case::no_repeat(&["--repeat", "0"])]
    fn test_invalid_options_are_rejected(#[case] extra: &[&str]) {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli_for(dir.path(), extra);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_missing_classifier_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli = cli_for(dir.path(), &[]);
        cli.classifier = dir.path().join("absent.png");

        let err = validate(&cli).unwrap_err();

        assert!(err.to_string().contains("Classifier not found"));
    }
}
