//! Bridge error type
//!
//! Every fallible operation in the crate returns `Result<_, BridgeError>`.
//! Nothing crosses the C boundary as a panic: the FFI layer converts these
//! into the documented sentinels (-1 for init, an error result for detect).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Invalid detector configuration (missing or unreadable model paths)
    #[error("invalid detector configuration: {0}")]
    Config(String),

    /// The external detector library failed during construction or detection
    #[error("detector backend error: {0}")]
    Detector(String),

    /// Caller-supplied frame does not match the declared dimensions
    #[error("bad frame: {0}")]
    BadFrame(String),
}
