use std::path::Path;

use crate::bridge::exception_translator::BoundaryError;
use crate::bridge::handle::Handle;
use crate::bridge::lifecycle_bridge::TrackerBridge;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Owns one tracker handle and destroys it when dropped.
pub struct TrackerSession<'a> {
    bridge: &'a TrackerBridge,
    handle: Handle,
}

impl<'a> TrackerSession<'a> {
    pub fn open(
        bridge: &'a TrackerBridge,
        classifier_path: &Path,
        min_face_size: i32,
    ) -> Result<Self, BoundaryError> {
        let handle = bridge.create(classifier_path, min_face_size)?;
        Ok(Self { bridge, handle })
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn start(&self) -> Result<(), BoundaryError> {
        self.bridge.start(self.handle)
    }

    pub fn stop(&self) -> Result<(), BoundaryError> {
        self.bridge.stop(self.handle)
    }

    pub fn set_face_size(&self, size: i32) -> Result<(), BoundaryError> {
        self.bridge.set_face_size(self.handle, size)
    }

    pub fn detect(&self, frame: &Frame) -> Result<Vec<Rect>, BoundaryError> {
        let mut objects = Vec::new();
        self.bridge.detect(self.handle, frame, &mut objects)?;
        Ok(objects)
    }

    /// Destroys the tracker now and reports the outcome.
    pub fn release(mut self) -> Result<(), BoundaryError> {
        let handle = std::mem::replace(&mut self.handle, Handle::NULL);
        self.bridge.destroy(handle)
    }
}

impl Drop for TrackerSession<'_> {
    fn drop(&mut self) {
        if self.handle.is_null() {
            return;
        }
        if let Err(e) = self.bridge.destroy(self.handle) {
            log::warn!("Failed to release tracker {}: {}", self.handle, e);
        }
    }
}
