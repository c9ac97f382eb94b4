// SPDX-License-Identifier: GPL-3.0-only

//! Video decoder interfaces
//!
//! This module describes the parts of the hardware video decoder that the
//! interop layer talks to: the device context the decoder is initialized
//! with, and the frames it produces.

mod device;
mod frame;

pub use device::{DecodeDeviceContext, DecoderBackend, QueueHooks};
pub use frame::{FrameState, FramesContext, HwImage, ImageFormat, ImageParams, VkFrame};
