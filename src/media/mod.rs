// SPDX-License-Identifier: MPL-2.0

//! Media-side types shared with the hardware decoder
//!
//! # Formats
//!
//! The [`formats`] module maps software pixel formats (NV12, P010, planar
//! YUV, ...) to the Vulkan formats and subsampling of each plane.
//!
//! # Decoders
//!
//! The [`decoders`] module models what the video decoder exposes: the
//! device hook table it is initialized with, the frame pool description,
//! and the lockable per-frame image state.

pub mod decoders;
pub mod formats;

pub use decoders::{DecodeDeviceContext, DecoderBackend, FrameState, FramesContext, VkFrame};
pub use formats::{PixelFormat, describe};
