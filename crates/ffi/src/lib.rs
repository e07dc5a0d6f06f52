//! C ABI over [`TrackerBridge`].
//!
//! Every entry point returns a status code (or `0` from `facetrack_create`)
//! and records the failure in a thread-local slot that
//! `facetrack_last_error_kind` / `facetrack_last_error_message` read back.
//! The slot is cleared at the start of every call except those two.
//! Handle `0` is the null tracker: calls on it succeed and do nothing.
//!
//! Callers without a handler for vision failures can turn them off per
//! thread with `facetrack_report_vision_errors(0)`; those failures are then
//! reported with the generic kind.

use std::cell::{Cell, RefCell};
use std::ffi::{c_char, CStr};
use std::path::Path;
use std::sync::OnceLock;

use facetrack_core::bridge::exception_translator::{
    translate, BoundaryError, BridgeError, ErrorKind,
};
use facetrack_core::bridge::handle::Handle;
use facetrack_core::bridge::lifecycle_bridge::TrackerBridge;
use facetrack_core::shared::frame::Frame;
use facetrack_core::shared::rect::Rect;

pub const FT_OK: i32 = 0;
pub const FT_ERR_VISION: i32 = 1;
pub const FT_ERR_GENERIC: i32 = 2;

/// Rectangle layout shared with C callers.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FtRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl From<Rect> for FtRect {
    fn from(r: Rect) -> Self {
        Self {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }
    }
}

static BRIDGE: OnceLock<TrackerBridge> = OnceLock::new();

thread_local! {
    static LAST_ERROR: RefCell<Option<BoundaryError>> = const { RefCell::new(None) };
    static VISION_ERRORS: Cell<bool> = const { Cell::new(true) };
}

fn bridge() -> &'static TrackerBridge {
    BRIDGE.get_or_init(TrackerBridge::default)
}

fn clear_last_error() {
    LAST_ERROR.with(|slot| slot.borrow_mut().take());
}

fn fail(mut error: BoundaryError) -> i32 {
    if !VISION_ERRORS.with(Cell::get) {
        error.kind = error.kind.fallback();
    }
    let code = match error.kind {
        ErrorKind::Vision => FT_ERR_VISION,
        ErrorKind::Generic => FT_ERR_GENERIC,
    };
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(error));
    code
}

fn status(result: Result<(), BoundaryError>) -> i32 {
    match result {
        Ok(()) => FT_OK,
        Err(e) => fail(e),
    }
}

/// Routes argument validation failures through the same translation as the
/// bridge calls themselves.
fn checked<T>(op: &str, arg: Result<T, BridgeError>) -> Result<T, BoundaryError> {
    translate(op, || arg)
}

/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn string_arg(ptr: *const c_char, name: &'static str) -> Result<String, BridgeError> {
    if ptr.is_null() {
        return Err(BridgeError::NullPointer(name));
    }
    // SAFETY: non-null, and the caller guarantees NUL termination.
    let s = CStr::from_ptr(ptr);
    s.to_str()
        .map(str::to_owned)
        .map_err(|_| BridgeError::InvalidArgument(format!("{name} is not valid UTF-8")))
}

/// # Safety
///
/// `pixels` must be null or valid for reads of
/// `stride * (height - 1) + width * channels` bytes.
unsafe fn frame_arg(
    pixels: *const u8,
    width: u32,
    height: u32,
    stride: usize,
    channels: u32,
) -> Result<Frame, BridgeError> {
    if pixels.is_null() {
        return Err(BridgeError::NullPointer("pixels"));
    }
    let channels = u8::try_from(channels)
        .map_err(|_| BridgeError::InvalidArgument(format!("channel count {channels}")))?;
    let row_len = width as usize * channels as usize;
    let len = match height {
        0 => 0,
        h => stride
            .checked_mul(h as usize - 1)
            .and_then(|n| n.checked_add(row_len))
            .ok_or_else(|| BridgeError::InvalidArgument("image size overflows".into()))?,
    };
    // SAFETY: non-null, and the caller guarantees `len` readable bytes.
    let data = std::slice::from_raw_parts(pixels, len);
    Ok(Frame::from_strided(data, width, height, stride, channels, 0)?)
}

/// Installs the `env_logger` logger (configured by `RUST_LOG`). Later
/// calls keep the first logger.
#[no_mangle]
pub extern "C" fn facetrack_init_logging() -> i32 {
    clear_last_error();
    if env_logger::try_init().is_err() {
        log::debug!("Logger already installed");
    }
    FT_OK
}

/// Chooses whether failures on this thread may use the vision kind.
/// With `enabled == 0` every failure is reported as generic.
#[no_mangle]
pub extern "C" fn facetrack_report_vision_errors(enabled: i32) -> i32 {
    clear_last_error();
    VISION_ERRORS.with(|flag| flag.set(enabled != 0));
    FT_OK
}

/// Creates a tracker from the classifier at `path`.
///
/// Returns the new handle, or `0` when creation failed.
///
/// # Safety
///
/// `path` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn facetrack_create(path: *const c_char, min_face_size: i32) -> u64 {
    clear_last_error();
    let result = checked("create", string_arg(path, "path"))
        .and_then(|path| bridge().create(Path::new(&path), min_face_size));
    match result {
        Ok(handle) => handle.as_raw(),
        Err(e) => {
            fail(e);
            0
        }
    }
}

/// Stops and releases the tracker. The handle must not be used afterwards.
#[no_mangle]
pub extern "C" fn facetrack_destroy(handle: u64) -> i32 {
    clear_last_error();
    status(bridge().destroy(Handle::from_raw(handle)))
}

#[no_mangle]
pub extern "C" fn facetrack_start(handle: u64) -> i32 {
    clear_last_error();
    status(bridge().start(Handle::from_raw(handle)))
}

#[no_mangle]
pub extern "C" fn facetrack_stop(handle: u64) -> i32 {
    clear_last_error();
    status(bridge().stop(Handle::from_raw(handle)))
}

/// Sets the minimum face size of the main detector. `size <= 0` is ignored.
#[no_mangle]
pub extern "C" fn facetrack_set_face_size(handle: u64, size: i32) -> i32 {
    clear_last_error();
    status(bridge().set_face_size(Handle::from_raw(handle), size))
}

/// Feeds one image and writes the currently tracked objects to `out`.
///
/// At most `capacity` rects are written; `*out_len` receives the total
/// number of objects. On failure `out` and `out_len` are left untouched.
///
/// # Safety
///
/// `pixels` must be valid for `stride * (height - 1) + width * channels`
/// bytes, `out` for `capacity` writes, and `out_len` for one write.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn facetrack_detect(
    handle: u64,
    pixels: *const u8,
    width: u32,
    height: u32,
    stride: usize,
    channels: u32,
    out: *mut FtRect,
    capacity: usize,
    out_len: *mut usize,
) -> i32 {
    clear_last_error();
    let handle = Handle::from_raw(handle);
    if handle.is_null() {
        return FT_OK;
    }

    let output = if out_len.is_null() {
        Err(BridgeError::NullPointer("out_len"))
    } else if out.is_null() && capacity > 0 {
        Err(BridgeError::NullPointer("out"))
    } else {
        Ok(())
    };
    let args = match output {
        Ok(()) => frame_arg(pixels, width, height, stride, channels),
        Err(e) => Err(e),
    };
    let frame = match checked("detect", args) {
        Ok(frame) => frame,
        Err(e) => return fail(e),
    };

    let mut objects = Vec::new();
    if let Err(e) = bridge().detect(handle, &frame, &mut objects) {
        return fail(e);
    }

    let written = objects.len().min(capacity);
    if written > 0 {
        // SAFETY: `out` is non-null when `capacity > 0` and the caller
        // guarantees room for `capacity` rects.
        let dst = std::slice::from_raw_parts_mut(out, written);
        for (slot, rect) in dst.iter_mut().zip(&objects) {
            *slot = (*rect).into();
        }
    }
    // SAFETY: checked non-null above.
    *out_len = objects.len();
    FT_OK
}

/// Kind of the last failure on this thread: 0 none, 1 vision, 2 generic.
#[no_mangle]
pub extern "C" fn facetrack_last_error_kind() -> i32 {
    LAST_ERROR.with(|slot| match slot.borrow().as_ref().map(|e| e.kind) {
        None => FT_OK,
        Some(ErrorKind::Vision) => FT_ERR_VISION,
        Some(ErrorKind::Generic) => FT_ERR_GENERIC,
    })
}

/// Copies the last failure message on this thread into `buf` as a
/// NUL-terminated string, truncated to `len - 1` bytes.
///
/// Returns the full message length, excluding the terminator, so callers can
/// retry with a larger buffer. Returns 0 when there is no error.
///
/// # Safety
///
/// `buf` must be null or valid for `len` writes.
#[no_mangle]
pub unsafe extern "C" fn facetrack_last_error_message(buf: *mut c_char, len: usize) -> usize {
    LAST_ERROR.with(|slot| {
        let slot = slot.borrow();
        let message = slot.as_ref().map(|e| e.message.as_bytes()).unwrap_or_default();
        if !buf.is_null() && len > 0 {
            let n = message.len().min(len - 1);
            // SAFETY: `buf` holds `len` bytes and `n + 1 <= len`.
            std::ptr::copy_nonoverlapping(message.as_ptr(), buf.cast::<u8>(), n);
            *buf.add(n) = 0;
        }
        message.len()
    })
}
