//! QR Code Detection Bridge (CGO)
//!
//! Handle-based bridge exposing a native QR-code detector to a managed
//! runtime over a C ABI. The detection itself (CNN localization,
//! super-resolution, decoding) is delegated to OpenCV's WeChat QR module;
//! this crate owns the detector lifecycle, the pixel-format conversion of
//! raw camera buffers, and the result marshalling.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌─────────────┐
//! │ Caller frame │────▶│ DetectorRegistry │────▶│ ScanResultC │
//! │ (RGB / NV21) │     │  -> ScanEngine   │     │ (text+rect) │
//! └──────────────┘     └──────────────────┘     └─────────────┘
//! ```
//!
//! ## Usage from Go via CGO
//!
//! ```go
//! registry := qrscan.NewRegistry()
//! defer registry.Free()
//!
//! handle := registry.InitDetector(detectProto, detectModel, srProto, srModel)
//! if handle < 0 {
//!     log.Fatal("detector init failed")
//! }
//! defer registry.ReleaseDetector(handle)
//!
//! result := registry.DetectNV21(handle, frame, width, height)
//! for _, code := range result.Codes {
//!     // code.Text, code.Rect
//! }
//! ```
//!
//! ## Memory Ownership
//!
//! - `qrscan_registry_new()` allocates on Rust heap, caller owns pointer
//! - `qrscan_registry_free()` must be called to deallocate
//! - `ScanResultC` and its strings are owned by caller after return
//! - `qrscan_result_free()` must be called to deallocate results

// Import logging macros
#[macro_use]
extern crate log;

pub mod engine;
pub mod error;
pub mod frame;
pub mod registry;
pub mod types;

// FFI module for C/CGO integration
pub mod ffi;

/// Initialize the logger for the bridge library.
/// This should be called once at startup, typically from FFI.
///
/// The log level can be controlled via the RUST_LOG environment variable:
/// - RUST_LOG=qrscan_bridge=debug
/// - RUST_LOG=qrscan_bridge=trace
pub fn init_logger() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        env_logger::init();
        info!("QR scan bridge library initialized");
    });
}

// Re-export main types
pub use engine::ScanEngine;
pub use error::BridgeError;
pub use frame::FrameBuffer;
pub use registry::DetectorRegistry;
pub use types::{DecodedCode, DetectorConfig, Quad, Rect};

// Re-export FFI types for C consumers
pub use ffi::{DecodedCodeC, RectC, ScanResultC};
