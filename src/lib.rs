// SPDX-License-Identifier: GPL-3.0-only

//! Vulkan hardware decode interop
//!
//! This library lets a video decoder share the renderer's Vulkan device and
//! hands decoded frames to the renderer as textures, without copying pixel
//! data.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`gpu`]: What the renderer exposes (device, queues, texture handshake)
//! - [`media`]: What the decoder exposes (device hooks, frames, pixel formats)
//! - [`hwdec`]: Device setup, queue arbitration and frame mapping
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! let registry = Arc::new(HwdecDevices::new());
//! let hwdec = HwdecVulkan::init(render, &decoder, registry, &Config::default())?;
//! let mut mapper = hwdec.create_mapper(&params)?;
//! mapper.map(&frame)?;
//! // ... draw mapper.planes() ...
//! mapper.unmap();
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod gpu;
pub mod hwdec;
pub mod media;

// Re-export commonly used types
pub use config::{Config, QueueFamilyApi};
pub use errors::{HwdecError, HwdecResult};
pub use gpu::{RenderBackend, Texture, VulkanContext};
pub use hwdec::{HwdecDevices, HwdecVulkan, Mapper};
pub use media::{DecoderBackend, PixelFormat};
