use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::bridge::detector_aggregator::DetectorAggregator;
use crate::bridge::exception_translator::{translate, BoundaryError, BridgeError};
use crate::bridge::handle::Handle;
use crate::bridge::handle_table::HandleTable;
use crate::detection::domain::classifier::ClassifierLoader;
use crate::detection::infrastructure::classifier_detector_adapter::DetectorAdapter;
use crate::detection::infrastructure::template_classifier::TemplateClassifierLoader;
use crate::shared::config::TrackerConfig;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::shared::size::ObjectSize;

type SharedAggregator = Arc<Mutex<DetectorAggregator>>;

/// Entry points a foreign caller drives trackers through.
///
/// Trackers are named by [`Handle`]s. Every call is translated: it either
/// succeeds or returns a [`BoundaryError`], and never unwinds. The null
/// handle turns every call except `create` into a no-op.
pub struct TrackerBridge {
    loader: Box<dyn ClassifierLoader>,
    config: TrackerConfig,
    trackers: Mutex<HandleTable<SharedAggregator>>,
}

impl Default for TrackerBridge {
    fn default() -> Self {
        Self::new(
            Box::new(TemplateClassifierLoader::default()),
            TrackerConfig::default(),
        )
    }
}

impl TrackerBridge {
    pub fn new(loader: Box<dyn ClassifierLoader>, config: TrackerConfig) -> Self {
        Self {
            loader,
            config,
            trackers: Mutex::new(HandleTable::new()),
        }
    }

    /// Loads the classifier for both detection roles and registers a new
    /// tracker. A positive `initial_min_face_size` is applied to the main
    /// detector.
    pub fn create(
        &self,
        classifier_path: &Path,
        initial_min_face_size: i32,
    ) -> Result<Handle, BoundaryError> {
        translate("create", || {
            self.config.validate()?;
            let main = self.loader.load(classifier_path)?;
            let tracking = self.loader.load(classifier_path)?;

            let aggregator = DetectorAggregator::new(
                DetectorAdapter::with_params(main, self.config.main),
                DetectorAdapter::with_params(tracking, self.config.tracking),
                self.config.tracker.clone(),
            );
            if initial_min_face_size > 0 {
                aggregator.set_main_min_object_size(ObjectSize::square(initial_min_face_size));
            }

            let handle = self
                .table()?
                .insert(Arc::new(Mutex::new(aggregator)))
                .ok_or(BridgeError::TableFull)?;
            log::info!(
                "Created tracker {handle} from {}",
                classifier_path.display()
            );
            Ok(handle)
        })
    }

    /// Stops and releases the tracker. The handle is dead afterwards.
    pub fn destroy(&self, handle: Handle) -> Result<(), BoundaryError> {
        translate("destroy", || {
            if handle.is_null() {
                return Ok(());
            }
            let aggregator = self
                .trackers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(handle)
                .ok_or(BridgeError::InvalidHandle(handle))?;

            aggregator
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .stop();
            drop(aggregator);
            log::info!("Destroyed tracker {handle}");
            Ok(())
        })
    }

    pub fn start(&self, handle: Handle) -> Result<(), BoundaryError> {
        translate("start", || {
            self.with_aggregator(handle, |aggregator| {
                aggregator.start()?;
                Ok(())
            })
        })
    }

    pub fn stop(&self, handle: Handle) -> Result<(), BoundaryError> {
        translate("stop", || {
            self.with_aggregator(handle, |aggregator| {
                aggregator.stop();
                Ok(())
            })
        })
    }

    /// Sets the main detector's minimum object size. Non-positive sizes are
    /// ignored.
    pub fn set_face_size(&self, handle: Handle, size: i32) -> Result<(), BoundaryError> {
        translate("setFaceSize", || {
            if size <= 0 {
                return Ok(());
            }
            self.with_aggregator(handle, |aggregator| {
                aggregator.set_main_min_object_size(ObjectSize::square(size));
                Ok(())
            })
        })
    }

    /// Feeds `frame` to the tracker and replaces the contents of `out` with
    /// the objects currently shown. `out` is left untouched on failure.
    pub fn detect(
        &self,
        handle: Handle,
        frame: &Frame,
        out: &mut Vec<Rect>,
    ) -> Result<(), BoundaryError> {
        translate("detect", || {
            if handle.is_null() {
                return Ok(());
            }
            let objects =
                self.with_aggregator(handle, |aggregator| Ok(aggregator.process(frame)?))?;
            out.clear();
            out.extend(objects);
            Ok(())
        })
    }

    /// Number of trackers created and not yet destroyed.
    pub fn live_handles(&self) -> usize {
        self.trackers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn table(&self) -> Result<MutexGuard<'_, HandleTable<SharedAggregator>>, BridgeError> {
        self.trackers
            .lock()
            .map_err(|_| BridgeError::Poisoned("tracker table"))
    }

    /// Runs `f` on the tracker behind `handle`. The table lock is released
    /// before `f` runs, so calls on different handles do not serialize.
    fn with_aggregator<T: Default>(
        &self,
        handle: Handle,
        f: impl FnOnce(&mut DetectorAggregator) -> Result<T, BridgeError>,
    ) -> Result<T, BridgeError> {
        if handle.is_null() {
            return Ok(T::default());
        }
        let aggregator = self
            .table()?
            .get(handle)
            .cloned()
            .ok_or(BridgeError::InvalidHandle(handle))?;
        let mut guard = aggregator
            .lock()
            .map_err(|_| BridgeError::Poisoned("tracker"))?;
        f(&mut guard)
    }
}

impl Drop for TrackerBridge {
    fn drop(&mut self) {
        let remaining = self
            .trackers
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .drain();
        if !remaining.is_empty() {
            log::warn!("Releasing {} trackers that were never destroyed", remaining.len());
        }
    }
}
