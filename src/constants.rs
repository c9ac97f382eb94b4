// SPDX-License-Identifier: GPL-3.0-only

//! Crate-wide constants

use ash::vk;
use std::ffi::CStr;

/// Maximum number of logical planes per frame
///
/// Mirrors the decoder's per-frame image arrays; frames with more planes are
/// rejected rather than truncated.
pub const MAX_PLANES: usize = 4;

/// Maximum number of physical images backing one decoded frame
pub const MAX_IMAGES: usize = 4;

/// Maximum number of queue family entries the decoder hook table accepts
pub const MAX_QUEUE_FAMILIES: usize = 64;

/// Name under which the decode device is registered
pub const DRIVER_NAME: &str = "vulkan";

/// Device extension the decoder needs for its decode queue
pub const VIDEO_DECODE_QUEUE_EXTENSION: &CStr = ash::khr::video_decode_queue::NAME;

/// Queue family placeholder for "no ownership transfer"
pub const QUEUE_FAMILY_IGNORED: u32 = vk::QUEUE_FAMILY_IGNORED;

/// Vulkan API version requested by the probe instance
pub const PROBE_API_VERSION: u32 = vk::API_VERSION_1_3;

/// Build information
pub mod build {
    /// Version string from the build script
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

/// Logging defaults
pub mod logging {
    /// Filter used when neither RUST_LOG nor the config sets one
    pub const DEFAULT_FILTER: &str = "warn";

    /// Environment variable holding the tracing filter
    pub const FILTER_ENV: &str = "RUST_LOG";
}
