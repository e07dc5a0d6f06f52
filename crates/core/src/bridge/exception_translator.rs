//! Converts every failure raised behind the boundary into a [`BoundaryError`].
//!
//! Two categories reach the caller: structured vision errors keep their own
//! kind and message, everything else (handle misuse, poisoned locks, panics)
//! is reported as a generic failure naming the operation. Each failure is
//! logged before it is translated. Side effects performed before the failure
//! are not rolled back.

use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::bridge::handle::Handle;
use crate::shared::panic::panic_message;
use crate::shared::vision_error::VisionError;

/// Failures produced while serving one bridge call.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error(transparent)]
    Vision(#[from] VisionError),
    #[error("no tracker for handle {0}")]
    InvalidHandle(Handle),
    #[error("no free tracker slots")]
    TableFull,
    #[error("{0} lock poisoned")]
    Poisoned(&'static str),
    #[error("null pointer passed for {0}")]
    NullPointer(&'static str),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Error category as seen by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structured failure from the detection engine.
    Vision,
    /// Anything else.
    Generic,
}

impl ErrorKind {
    /// Kind to report to a caller that only understands generic failures.
    pub fn fallback(self) -> ErrorKind {
        ErrorKind::Generic
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Vision => write!(f, "vision"),
            ErrorKind::Generic => write!(f, "generic"),
        }
    }
}

/// A failure translated into the caller's error model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} error: {message}")]
pub struct BoundaryError {
    pub kind: ErrorKind,
    pub message: String,
}

impl BoundaryError {
    pub fn generic(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Generic,
            message: message.into(),
        }
    }
}

/// Runs `f` for the entry point `op`, catching errors and panics.
pub fn translate<T, F>(op: &str, f: F) -> Result<T, BoundaryError>
where
    F: FnOnce() -> Result<T, BridgeError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(BridgeError::Vision(e))) => {
            log::error!("{op} caught vision error: {e}");
            Err(BoundaryError {
                kind: ErrorKind::Vision,
                message: e.to_string(),
            })
        }
        Ok(Err(other)) => Err(unknown(op, &other.to_string())),
        Err(payload) => Err(unknown(op, &panic_message(payload.as_ref()))),
    }
}

fn unknown(op: &str, detail: &str) -> BoundaryError {
    let message = format!("{op} caught unknown exception: {detail}");
    log::error!("{message}");
    BoundaryError::generic(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_passes_through() {
        assert_eq!(translate("op", || Ok::<_, BridgeError>(42)), Ok(42));
    }

    #[test]
    fn test_vision_error_keeps_kind_and_message() {
        let err = translate::<(), _>("nativeDetect", || Err(VisionError::EmptyClassifier.into()))
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Vision);
        assert_eq!(err.message, VisionError::EmptyClassifier.to_string());
    }

    #[test]
    fn test_other_error_is_generic_and_names_operation() {
        let err = translate::<(), _>("nativeStart", || {
            Err(BridgeError::InvalidHandle(Handle::from_raw(9)))
        })
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Generic);
        assert!(err.message.starts_with("nativeStart caught unknown exception"));
        assert!(err.message.contains("0x9"));
    }

    #[test]
    fn test_panic_becomes_generic_error() {
        let err = translate::<(), _>("nativeCreate", || panic!("boom")).unwrap_err();

        assert_eq!(err.kind, ErrorKind::Generic);
        assert!(err.message.contains("nativeCreate caught unknown exception"));
        assert!(err.message.contains("boom"));
    }

    #[test]
    fn test_formatted_panic_message_is_kept() {
        let err = translate::<(), _>("op", || panic!("bad {}", 7)).unwrap_err();
        assert!(err.message.ends_with("bad 7"));
    }

    #[test]
    fn test_fallback_is_generic() {
        assert_eq!(ErrorKind::Vision.fallback(), ErrorKind::Generic);
        assert_eq!(ErrorKind::Generic.fallback(), ErrorKind::Generic);
    }
}
