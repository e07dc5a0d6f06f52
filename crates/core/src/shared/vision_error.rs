use std::path::PathBuf;

use thiserror::Error;

/// Failures raised inside the detection engine.
///
/// This is the structured error category the boundary reports with its own
/// kind; everything else is surfaced as a generic failure.
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("failed to load classifier from {path}: {source}")]
    ClassifierLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("classifier template in {0} has no contrast")]
    EmptyTemplate(PathBuf),
    #[error("classifier is empty")]
    EmptyClassifier,
    #[error("invalid detection parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error("failed to spawn detection worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
    #[error("detector panicked: {0}")]
    DetectorPanicked(String),
    #[error("detection worker disconnected")]
    WorkerDisconnected,
}
