//! C-compatible FFI interface for the detector registry
//!
//! This module exposes the detector lifecycle and detection entry points
//! through a C ABI, enabling integration with Go via CGO or any other
//! language with C FFI.
//!
//! # Memory Ownership Rules
//!
//! - `qrscan_registry_new()` allocates on Rust heap, caller owns pointer
//! - `qrscan_registry_free()` must be called to deallocate
//! - `ScanResultC` and its strings are owned by caller after return
//! - `qrscan_result_free()` must be called to deallocate results
//!
//! # Thread Safety
//!
//! The registry is internally synchronized. Multiple threads can call
//! init/detect/release concurrently on the same registry pointer.
//!
//! # Safety
//!
//! All public FFI functions handle null pointer checks internally.
//! The caller is responsible for passing valid pointers as documented.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::slice;

use crate::error::BridgeError;
use crate::frame::FrameBuffer;
use crate::registry::DetectorRegistry;
use crate::types::{DecodedCode, DetectorConfig};

// Safety limits
const MAX_PATH_LEN: usize = 4096;
const MAX_FRAME_PIXELS: usize = 25_000_000; // packed-RGB words (100MB)
const MAX_FRAME_BYTES: usize = 100_000_000; // NV21 bytes

/// C-compatible axis-aligned rectangle
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RectC {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// C-compatible decoded code
#[repr(C)]
pub struct DecodedCodeC {
    /// Decoded payload, UTF-8 (owned, must be freed)
    pub text: *mut c_char,
    /// Bounding rectangle in source-image coordinates
    pub rect: RectC,
}

/// C-compatible result wrapper for the detect entry points
#[repr(C)]
pub struct ScanResultC {
    /// True if the call succeeded (an unknown handle is a success with
    /// zero codes, not an error)
    pub success: bool,
    /// Error message if success is false (owned, must be freed)
    pub error_msg: *mut c_char,
    /// Array of decoded codes (owned, must be freed with qrscan_result_free)
    pub codes: *mut DecodedCodeC,
    /// Number of codes in array
    pub codes_len: usize,
}

impl ScanResultC {
    fn empty() -> Self {
        Self {
            success: true,
            error_msg: ptr::null_mut(),
            codes: ptr::null_mut(),
            codes_len: 0,
        }
    }

    fn error(msg: &str) -> Self {
        Self {
            success: false,
            error_msg: cstring_or_fallback(msg, "unknown error"),
            codes: ptr::null_mut(),
            codes_len: 0,
        }
    }

    fn from_codes(codes: Vec<DecodedCode>) -> Self {
        if codes.is_empty() {
            return Self::empty();
        }

        let c_codes: Vec<DecodedCodeC> = codes
            .into_iter()
            .map(|code| DecodedCodeC {
                text: CString::new(code.text).unwrap_or_default().into_raw(),
                rect: RectC {
                    left: code.rect.left,
                    top: code.rect.top,
                    right: code.rect.right,
                    bottom: code.rect.bottom,
                },
            })
            .collect();

        let codes_len = c_codes.len();
        let codes_ptr = Box::into_raw(c_codes.into_boxed_slice()) as *mut DecodedCodeC;

        Self {
            success: true,
            error_msg: ptr::null_mut(),
            codes: codes_ptr,
            codes_len,
        }
    }
}

// ============================================================================
// Registry Lifecycle
// ============================================================================

#[no_mangle]
pub extern "C" fn qrscan_init_logger() {
    crate::init_logger();
}

/// Create a new detector registry.
///
/// # Returns
/// Pointer to the registry. Caller owns the pointer and must call
/// `qrscan_registry_free` to deallocate; freeing the registry drops every
/// engine still registered in it.
#[no_mangle]
pub extern "C" fn qrscan_registry_new() -> *mut DetectorRegistry {
    crate::init_logger();
    Box::into_raw(Box::new(DetectorRegistry::new()))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn qrscan_registry_free(registry: *mut DetectorRegistry) {
    if !registry.is_null() {
        unsafe {
            let _ = Box::from_raw(registry);
        }
    }
}

// ============================================================================
// Detector Lifecycle
// ============================================================================

/// Create a detector from four model file paths and register it.
///
/// # Returns
/// A fresh positive handle, or -1 on failure (null registry, invalid path
/// strings, model loading error). Failures are logged, never propagated.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn qrscan_detector_init(
    registry: *const DetectorRegistry,
    detect_proto: *const c_char,
    detect_model: *const c_char,
    sr_proto: *const c_char,
    sr_model: *const c_char,
) -> i32 {
    if registry.is_null() {
        error!("detector init failed: null registry pointer");
        return -1;
    }
    let registry = unsafe { &*registry };

    let config = match (
        path_arg(detect_proto, "detect_proto"),
        path_arg(detect_model, "detect_model"),
        path_arg(sr_proto, "sr_proto"),
        path_arg(sr_model, "sr_model"),
    ) {
        (Ok(dp), Ok(dm), Ok(sp), Ok(sm)) => DetectorConfig::new(dp, dm, sp, sm),
        (dp, dm, sp, sm) => {
            for err in [dp.err(), dm.err(), sp.err(), sm.err()].into_iter().flatten() {
                error!("detector init failed: {}", err);
            }
            return -1;
        }
    };

    match registry.create(config) {
        Ok(handle) => handle,
        Err(e) => {
            error!("detector init failed: {}", e);
            -1
        }
    }
}

/// Drop the detector registered under `handle`. Unknown handles are a
/// logged no-op.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn qrscan_detector_release(registry: *const DetectorRegistry, handle: i32) {
    if registry.is_null() {
        return;
    }
    let registry = unsafe { &*registry };
    registry.release(handle);
}

/// Check whether a handle still resolves to a live detector.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn qrscan_detector_alive(registry: *const DetectorRegistry, handle: i32) -> bool {
    if registry.is_null() {
        return false;
    }
    let registry = unsafe { &*registry };
    registry.lookup(handle).is_some()
}

/// Number of live detectors in the registry, or 0 for a null registry.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn qrscan_detector_count(registry: *const DetectorRegistry) -> usize {
    if registry.is_null() {
        return 0;
    }
    let registry = unsafe { &*registry };
    registry.len()
}

// ============================================================================
// Detection
// ============================================================================

/// Detect and decode QR codes in a packed-RGB frame.
///
/// # Arguments
/// - `registry`: valid registry pointer
/// - `handle`: detector handle from `qrscan_detector_init`
/// - `pixels`: one 32-bit word per pixel, `0xRRGGBB` packing
/// - `pixels_len`: number of words, must equal `width * height`
/// - `width`, `height`: frame dimensions in pixels
///
/// # Returns
/// ScanResultC with decoded codes. An unknown handle yields an empty
/// successful result. Caller must call `qrscan_result_free`.
///
/// # Safety
/// `pixels` must point to at least `pixels_len` words.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn qrscan_detect_rgb(
    registry: *const DetectorRegistry,
    handle: i32,
    pixels: *const i32,
    pixels_len: usize,
    width: u32,
    height: u32,
) -> ScanResultC {
    if registry.is_null() {
        return ScanResultC::error("null registry pointer");
    }
    if pixels.is_null() {
        return ScanResultC::error("null pixel pointer");
    }
    if pixels_len > MAX_FRAME_PIXELS {
        return ScanResultC::error("frame size exceeds maximum");
    }
    let registry = unsafe { &*registry };

    let engine = match registry.lookup(handle) {
        Some(engine) => engine,
        None => {
            debug!("detect_rgb on unknown handle {}", handle);
            return ScanResultC::empty();
        }
    };

    let words = unsafe { slice::from_raw_parts(pixels, pixels_len) };
    let frame = match FrameBuffer::from_packed_rgb(words, width, height) {
        Ok(frame) => frame,
        Err(e) => return detect_failure("detect_rgb", &e),
    };

    match engine.detect_and_decode(&frame) {
        Ok(codes) => ScanResultC::from_codes(codes),
        Err(e) => detect_failure("detect_rgb", &e),
    }
}

/// Detect and decode QR codes in an NV21 (YUV 4:2:0 semi-planar) frame.
///
/// # Arguments
/// - `registry`: valid registry pointer
/// - `handle`: detector handle from `qrscan_detector_init`
/// - `data`: luma plane followed by interleaved VU plane
/// - `data_len`: number of bytes, must equal `width * height * 3/2`
/// - `width`, `height`: frame dimensions in pixels
///
/// # Returns
/// ScanResultC with decoded codes. An unknown handle yields an empty
/// successful result. Caller must call `qrscan_result_free`.
///
/// # Safety
/// `data` must point to at least `data_len` bytes.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn qrscan_detect_nv21(
    registry: *const DetectorRegistry,
    handle: i32,
    data: *const u8,
    data_len: usize,
    width: u32,
    height: u32,
) -> ScanResultC {
    if registry.is_null() {
        return ScanResultC::error("null registry pointer");
    }
    if data.is_null() {
        return ScanResultC::error("null frame pointer");
    }
    if data_len > MAX_FRAME_BYTES {
        return ScanResultC::error("frame size exceeds maximum");
    }
    let registry = unsafe { &*registry };

    let engine = match registry.lookup(handle) {
        Some(engine) => engine,
        None => {
            debug!("detect_nv21 on unknown handle {}", handle);
            return ScanResultC::empty();
        }
    };

    let bytes = unsafe { slice::from_raw_parts(data, data_len) };
    let frame = match FrameBuffer::from_nv21(bytes, width, height) {
        Ok(frame) => frame,
        Err(e) => return detect_failure("detect_nv21", &e),
    };

    match engine.detect_and_decode(&frame) {
        Ok(codes) => ScanResultC::from_codes(codes),
        Err(e) => detect_failure("detect_nv21", &e),
    }
}

/// Free a ScanResultC and all contained data.
///
/// # Safety
/// - `result` must be from a `qrscan_detect_*` call
/// - `result` must not be used after this call
#[no_mangle]
pub extern "C" fn qrscan_result_free(result: ScanResultC) {
    if !result.error_msg.is_null() {
        unsafe {
            let _ = CString::from_raw(result.error_msg);
        }
    }

    if !result.codes.is_null() && result.codes_len > 0 {
        let codes_slice = unsafe { slice::from_raw_parts_mut(result.codes, result.codes_len) };
        for code in codes_slice.iter() {
            if !code.text.is_null() {
                unsafe {
                    let _ = CString::from_raw(code.text);
                }
            }
        }
        unsafe {
            let _ = Box::from_raw(ptr::slice_from_raw_parts_mut(
                result.codes,
                result.codes_len,
            ));
        }
    }
}

// ============================================================================
// Utilities
// ============================================================================

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn qrscan_string_free(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            let _ = CString::from_raw(s);
        }
    }
}

#[no_mangle]
pub extern "C" fn qrscan_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// ============================================================================
// Helpers
// ============================================================================

fn cstring_or_fallback(s: &str, fallback: &'static str) -> *mut c_char {
    CString::new(s)
        .unwrap_or_else(|_| CString::new(fallback).expect("fallback must be valid"))
        .into_raw()
}

fn path_arg(ptr: *const c_char, name: &str) -> Result<String, String> {
    if ptr.is_null() {
        return Err(format!("null {}", name));
    }
    let s = unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| format!("invalid UTF-8 in {}", name))?;
    if s.len() > MAX_PATH_LEN {
        return Err(format!("{} exceeds maximum length", name));
    }
    Ok(s.to_string())
}

fn detect_failure(entry: &str, err: &BridgeError) -> ScanResultC {
    error!("{} failed: {}", entry, err);
    ScanResultC::error(&err.to_string())
}
