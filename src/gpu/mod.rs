// SPDX-License-Identifier: GPL-3.0-only

//! Renderer-side Vulkan interfaces.
//!
//! The renderer owns the Vulkan instance, the logical device and its queues.
//! Hardware decode borrows all of them: the decoder shares the renderer's
//! device rather than creating its own, and decoded images are imported into
//! the renderer as textures without copying pixel data.
//!
//! # Texture ownership handshake
//!
//! ```text
//!   wrap ──► release (renderer owns, waits on sem@value)
//!                       │  ... renderer draws ...
//!   free ◄── hold  ◄────┘ (renderer signals sem@reserved, reports layout)
//! ```

pub mod instance;

use crate::hwdec::queue_families::QueueFamilyDescriptor;
use ash::vk;
use std::ffi::CString;
use std::sync::Arc;

/// Queue family index plus number of queues the renderer created in it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueInfo {
    /// Queue family index
    pub index: u32,
    /// Number of queues in use from this family
    pub count: u32,
}

/// Device features the renderer enabled, including the versioned structs
///
/// Owned copies without a `p_next` chain; [`DeviceFeatures::chained`] links
/// them for a Vulkan call. Timeline semaphores (`vulkan12`) and
/// synchronization2 (`vulkan13`) are what frame mapping relies on.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceFeatures {
    pub core: vk::PhysicalDeviceFeatures,
    pub vulkan11: vk::PhysicalDeviceVulkan11Features<'static>,
    pub vulkan12: vk::PhysicalDeviceVulkan12Features<'static>,
    pub vulkan13: vk::PhysicalDeviceVulkan13Features<'static>,
}

// SAFETY: the `p_next` links are only set while `chained` holds a mutable
// borrow, so shared or sent copies never follow them.
unsafe impl Send for DeviceFeatures {}
unsafe impl Sync for DeviceFeatures {}

impl DeviceFeatures {
    /// Link the versioned structs into a `VkPhysicalDeviceFeatures2` chain
    ///
    /// Call [`DeviceFeatures::detach`] once the chain is no longer used.
    pub fn chained(&mut self) -> vk::PhysicalDeviceFeatures2<'_> {
        self.detach();
        vk::PhysicalDeviceFeatures2::default()
            .features(self.core)
            .push_next(&mut self.vulkan11)
            .push_next(&mut self.vulkan12)
            .push_next(&mut self.vulkan13)
    }

    /// Clear the `p_next` links set by [`DeviceFeatures::chained`]
    pub fn detach(&mut self) {
        self.vulkan11.p_next = std::ptr::null_mut();
        self.vulkan12.p_next = std::ptr::null_mut();
        self.vulkan13.p_next = std::ptr::null_mut();
    }
}

/// Native queue locking exposed by the renderer.
///
/// The renderer serializes its own submissions with these; the decoder must
/// go through the same calls before touching a queue.
pub trait QueueOwner: Send + Sync {
    /// Lock queue `index` of `family` for submission
    fn lock_queue(&self, family: u32, index: u32);

    /// Unlock a queue previously locked with [`QueueOwner::lock_queue`]
    fn unlock_queue(&self, family: u32, index: u32);
}

/// The renderer's Vulkan device, as shared with the decoder
#[derive(Clone)]
pub struct VulkanContext {
    /// Instance handle
    pub instance: vk::Instance,
    /// Loader entry point used to resolve every other function
    pub get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
    /// Physical device backing the logical device
    pub physical_device: vk::PhysicalDevice,
    /// Logical device shared with the decoder
    pub device: vk::Device,
    /// Feature set the device was created with
    pub features: DeviceFeatures,
    /// Enabled instance extensions
    pub instance_extensions: Vec<CString>,
    /// Enabled device extensions
    pub device_extensions: Vec<CString>,
    /// Graphics queue family in use
    pub queue_graphics: QueueInfo,
    /// Transfer queue family in use
    pub queue_transfer: QueueInfo,
    /// Compute queue family in use
    pub queue_compute: QueueInfo,
    /// Queue locking implementation
    pub queues: Arc<dyn QueueOwner>,
}

impl VulkanContext {
    /// Whether a device extension is enabled
    pub fn has_device_extension(&self, name: &std::ffi::CStr) -> bool {
        self.device_extensions.iter().any(|ext| ext.as_c_str() == name)
    }
}

impl std::fmt::Debug for VulkanContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VulkanContext")
            .field("instance", &self.instance)
            .field("physical_device", &self.physical_device)
            .field("device", &self.device)
            .field("device_extensions", &self.device_extensions)
            .field("queue_graphics", &self.queue_graphics)
            .field("queue_transfer", &self.queue_transfer)
            .field("queue_compute", &self.queue_compute)
            .finish_non_exhaustive()
    }
}

/// Opaque renderer texture handle
///
/// Not `Clone`: each handle is released back to the renderer exactly once
/// through [`RenderBackend::free`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Texture(u64);

impl Texture {
    /// Create a handle from a renderer-assigned id
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// The renderer-assigned id
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A semaphore together with the counter value to wait on or signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SemaphoreValue {
    pub sem: vk::Semaphore,
    pub value: u64,
}

/// Parameters for wrapping an existing image as a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapParams {
    pub image: vk::Image,
    pub width: u32,
    pub height: u32,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
    pub aspect: vk::ImageAspectFlags,
}

/// Hands a wrapped texture to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseParams {
    /// Layout the image is currently in
    pub layout: vk::ImageLayout,
    /// Queue family that currently owns the image
    pub queue_family: u32,
    /// Renderer waits for this before first use
    pub semaphore: SemaphoreValue,
}

/// Takes a texture back from the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldParams {
    /// Queue family to transfer ownership to
    pub queue_family: u32,
    /// Renderer signals this once it is done with the image
    pub semaphore: SemaphoreValue,
}

/// Renderer backend used by hardware decode
pub trait RenderBackend: Send + Sync {
    /// The Vulkan device behind this renderer, or `None` for other APIs
    fn vulkan(&self) -> Option<&VulkanContext>;

    /// Enumerate the physical device's queue families with their video
    /// decode capabilities
    fn queue_families(&self) -> Vec<QueueFamilyDescriptor>;

    /// Wrap an externally owned image as a texture
    ///
    /// Returns `None` if the renderer rejects the image.
    fn wrap(&self, params: &WrapParams) -> Option<Texture>;

    /// Hand a wrapped texture to the renderer for use
    fn release(&self, texture: &Texture, params: &ReleaseParams);

    /// Take a texture back from the renderer
    ///
    /// Returns the layout the image was left in, or `None` if the renderer
    /// failed to schedule the semaphore signal.
    fn hold(&self, texture: &Texture, params: &HoldParams) -> Option<vk::ImageLayout>;

    /// Destroy the renderer-side texture object (the image itself is untouched)
    fn free(&self, texture: Texture);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_len(features: &vk::PhysicalDeviceFeatures2<'_>) -> usize {
        let mut len = 0;
        let mut next = features.p_next as *const vk::BaseOutStructure<'_>;
        while !next.is_null() {
            len += 1;
            // SAFETY: every link points into the DeviceFeatures borrowed by
            // the chain.
            next = unsafe { (*next).p_next as *const vk::BaseOutStructure<'_> };
        }
        len
    }

    #[test]
    fn test_chain_links_every_versioned_struct() {
        let mut features = DeviceFeatures::default();
        features.core.sampler_anisotropy = vk::TRUE;
        features.vulkan12.timeline_semaphore = vk::TRUE;

        let chain = features.chained();
        assert_eq!(chain.features.sampler_anisotropy, vk::TRUE);
        assert_eq!(chain_len(&chain), 3);

        // Linking twice must not grow the chain
        let chain = features.chained();
        assert_eq!(chain_len(&chain), 3);

        features.detach();
        assert!(features.vulkan11.p_next.is_null());
        assert!(features.vulkan12.p_next.is_null());
        assert!(features.vulkan13.p_next.is_null());
        assert_eq!(features.vulkan12.timeline_semaphore, vk::TRUE);
    }
}
