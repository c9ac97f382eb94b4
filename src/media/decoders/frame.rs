// SPDX-License-Identifier: GPL-3.0-only

//! Decoder-owned Vulkan frames
//!
//! A decoded frame is backed by one to [`MAX_IMAGES`] Vulkan images. Its
//! synchronization state (layouts, timeline semaphores and their counters)
//! is shared between the decoder and every consumer, so it is only ever read
//! or written under the frame's own lock.

use crate::constants::MAX_IMAGES;
use crate::media::formats::PixelFormat;
use ash::vk;
use std::sync::{Arc, Mutex, MutexGuard};

/// Frame pool description shared by all frames of a decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramesContext {
    /// Allocated image width (may exceed the displayed width)
    pub width: u32,
    /// Allocated image height (1088 for most 1080p streams)
    pub height: u32,
    /// Software format of the image contents
    pub sw_format: PixelFormat,
    /// Usage flags the images were created with
    pub usage: vk::ImageUsageFlags,
}

/// Per-image state of a decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameState {
    /// Backing images; unused slots are null
    pub img: [vk::Image; MAX_IMAGES],
    /// Current layout of each image
    pub layout: [vk::ImageLayout; MAX_IMAGES],
    /// Timeline semaphore of each image
    pub sem: [vk::Semaphore; MAX_IMAGES],
    /// Last counter value scheduled on each semaphore
    pub sem_value: [u64; MAX_IMAGES],
    /// Access mask of the last use of each image
    pub access: [vk::AccessFlags; MAX_IMAGES],
}

impl FrameState {
    /// Number of backing images (leading non-null entries)
    pub fn num_images(&self) -> usize {
        self.img
            .iter()
            .take_while(|img| **img != vk::Image::null())
            .count()
    }
}

/// A frame owned by the decoder
///
/// Consumers hold it by reference; the decoder may recycle it as soon as
/// every consumer has unmapped it.
#[derive(Debug)]
pub struct VkFrame {
    frames: Arc<FramesContext>,
    state: Mutex<FrameState>,
}

impl VkFrame {
    pub fn new(frames: Arc<FramesContext>, state: FrameState) -> Self {
        Self {
            frames,
            state: Mutex::new(state),
        }
    }

    /// Pool this frame was allocated from
    pub fn frames(&self) -> &FramesContext {
        &self.frames
    }

    /// Lock the frame's state for a short read or update
    pub fn lock(&self) -> MutexGuard<'_, FrameState> {
        // The state is plain data; a panic elsewhere cannot leave it torn
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Image format tag of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Opaque Vulkan hardware frame
    Vulkan,
    /// Software frame in the given pixel format
    Software(PixelFormat),
}

/// Frame parameters as seen by the video output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageParams {
    pub imgfmt: ImageFormat,
    /// Pixel format of hardware frame contents
    pub hw_subfmt: Option<PixelFormat>,
    /// Displayed width
    pub w: u32,
    /// Displayed height
    pub h: u32,
}

/// A hardware frame submitted for display
#[derive(Debug, Clone)]
pub struct HwImage {
    pub params: ImageParams,
    pub frame: Arc<VkFrame>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn test_num_images_stops_at_first_null() {
        let mut state = FrameState::default();
        assert_eq!(state.num_images(), 0);

        state.img[0] = vk::Image::from_raw(1);
        state.img[1] = vk::Image::from_raw(2);
        state.img[3] = vk::Image::from_raw(4);
        assert_eq!(state.num_images(), 2);
    }

    #[test]
    fn test_lock_updates_shared_state() {
        let frames = Arc::new(FramesContext {
            width: 64,
            height: 64,
            sw_format: PixelFormat::Nv12,
            usage: vk::ImageUsageFlags::SAMPLED,
        });
        let frame = VkFrame::new(frames, FrameState::default());

        frame.lock().sem_value[0] = 7;
        assert_eq!(frame.lock().sem_value[0], 7);
        assert_eq!(frame.frames().width, 64);
    }
}
