// SPDX-License-Identifier: MPL-2.0

//! Error types for Vulkan hardware decode interop
//!
//! Every failure here is local: it makes the caller decline hardware decode
//! (and fall back to software decoding), it never aborts the process.

use std::fmt;

/// Result type alias using HwdecError
pub type HwdecResult<T> = Result<T, HwdecError>;

/// Hardware decode interop errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HwdecError {
    /// The render context lacks a required capability (e.g. not Vulkan)
    Unsupported(String),
    /// A required Vulkan extension is not enabled on the device
    ExtensionMissing(String),
    /// Queue family enumeration or descriptor allocation failed
    AllocationFailed(String),
    /// The decoder rejected the populated device context
    BackendInitFailed(String),
    /// The mapper's owner is not backed by a Vulkan renderer
    NoContext,
    /// The frame or its format cannot be mapped
    FormatUnsupported(String),
    /// Wrapping a plane as a renderer texture failed
    WrapFailed {
        /// Logical plane that failed to wrap
        plane: usize,
    },
    /// No plane descriptor exists for the pixel format
    UnknownFormat(String),
    /// Configuration file could not be read or parsed
    Config(String),
}

impl HwdecError {
    /// Whether this error means hardware decode must be disabled
    ///
    /// All core failures are non-fatal to the process; configuration errors
    /// are the only ones that do not affect decode availability.
    pub fn disables_hwdec(&self) -> bool {
        !matches!(self, HwdecError::Config(_))
    }
}

impl fmt::Display for HwdecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HwdecError::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
            HwdecError::ExtensionMissing(ext) => write!(f, "Extension missing: {}", ext),
            HwdecError::AllocationFailed(msg) => write!(f, "Allocation failed: {}", msg),
            HwdecError::BackendInitFailed(msg) => {
                write!(f, "Decoder device initialization failed: {}", msg)
            }
            HwdecError::NoContext => write!(f, "Renderer is not a Vulkan context"),
            HwdecError::FormatUnsupported(msg) => write!(f, "Format not supported: {}", msg),
            HwdecError::WrapFailed { plane } => {
                write!(f, "Failed to wrap plane {} as a texture", plane)
            }
            HwdecError::UnknownFormat(name) => write!(f, "Unknown pixel format: {}", name),
            HwdecError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for HwdecError {}

impl From<std::io::Error> for HwdecError {
    fn from(err: std::io::Error) -> Self {
        HwdecError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for HwdecError {
    fn from(err: serde_json::Error) -> Self {
        HwdecError::Config(err.to_string())
    }
}
