use std::panic::{self, AssertUnwindSafe};
use std::sync::PoisonError;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::detection::domain::object_detector::SharedDetector;
use crate::shared::frame::Frame;
use crate::shared::panic::panic_message;
use crate::shared::rect::Rect;
use crate::shared::vision_error::VisionError;

type DetectResult = Result<Vec<Rect>, VisionError>;

/// Background thread running the main (full-frame) detector.
///
/// Layout: `offer(frame) → [worker: main detect] → take_result()`
///
/// At most one frame waits in the hand-over slot, so the caller never
/// blocks on a slow detection. Dropping the stop sender is the shutdown
/// signal; `shutdown` then joins the thread. A panicking detector is
/// reported as a [`VisionError::DetectorPanicked`] result and the worker
/// keeps serving frames.
pub struct DetectionWorker {
    frame_tx: Sender<Frame>,
    result_rx: Receiver<DetectResult>,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl DetectionWorker {
    pub fn spawn(detector: SharedDetector, min_period: Duration) -> Result<Self, VisionError> {
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Frame>(1);
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<DetectResult>();
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);

        let handle = std::thread::Builder::new()
            .name("facetrack-detector".into())
            .spawn(move || run_worker(detector, frame_rx, result_tx, stop_rx, min_period))
            .map_err(VisionError::WorkerSpawn)?;

        log::debug!("Detection worker started");
        Ok(Self {
            frame_tx,
            result_rx,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Hands a frame to the worker unless one is already waiting.
    pub fn offer(&self, frame: &Frame) -> bool {
        self.frame_tx.try_send(frame.clone()).is_ok()
    }

    /// Newest finished detection, if any arrived since the last call.
    pub fn take_result(&self) -> Result<Option<Vec<Rect>>, VisionError> {
        let mut latest = None;
        loop {
            match self.result_rx.try_recv() {
                Ok(result) => latest = Some(result),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if latest.is_none() {
                        return Err(VisionError::WorkerDisconnected);
                    }
                    break;
                }
            }
        }
        latest.transpose()
    }

    /// Whether the worker thread is still serving frames.
    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signals the worker and blocks until it has exited.
    pub fn shutdown(&mut self) {
        drop(self.stop_tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Detection worker panicked");
            } else {
                log::debug!("Detection worker stopped");
            }
        }
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    detector: SharedDetector,
    frame_rx: Receiver<Frame>,
    result_tx: Sender<DetectResult>,
    stop_rx: Receiver<()>,
    min_period: Duration,
) {
    let mut last_start: Option<Instant> = None;
    loop {
        let frame = crossbeam_channel::select! {
            recv(stop_rx) -> _ => break,
            recv(frame_rx) -> msg => match msg {
                Ok(frame) => frame,
                Err(_) => break,
            },
        };

        if let Some(started) = last_start {
            let elapsed = started.elapsed();
            if elapsed < min_period {
                match stop_rx.recv_timeout(min_period - elapsed) {
                    Err(RecvTimeoutError::Timeout) => {}
                    _ => break,
                }
            }
        }

        last_start = Some(Instant::now());
        log::trace!("Main detection on frame {}", frame.index());
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            detector
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .detect(&frame)
        }))
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            log::error!("Main detector panicked: {message}");
            Err(VisionError::DetectorPanicked(message))
        });
        if result_tx.send(result).is_err() {
            break;
        }
    }
}
