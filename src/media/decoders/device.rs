// SPDX-License-Identifier: GPL-3.0-only

//! Device hook table handed to the video decoder

use crate::gpu::{DeviceFeatures, QueueOwner, VulkanContext};
use crate::hwdec::queue_families::QueueAssignment;
use crate::hwdec::queue_lock::QueueArbiter;
use ash::vk;
use std::ffi::CString;
use std::sync::{Arc, Weak};
use tracing::warn;

/// Queue lock hooks installed in the decoder's device context
///
/// The arbiter is owned by the hardware decode context; the decoder only
/// holds a weak reference to it.
#[derive(Clone)]
pub struct QueueHooks {
    arbiter: Weak<QueueArbiter>,
    fallback: Arc<dyn QueueOwner>,
}

impl QueueHooks {
    pub(crate) fn new(arbiter: &Arc<QueueArbiter>, fallback: Arc<dyn QueueOwner>) -> Self {
        Self {
            arbiter: Arc::downgrade(arbiter),
            fallback,
        }
    }

    /// Lock a queue before the decoder submits to it
    pub fn lock_queue(&self, family: u32, index: u32) {
        match self.arbiter.upgrade() {
            Some(arbiter) => arbiter.lock(family, index),
            None => {
                warn!(family, index, "Queue lock hook used after teardown");
                self.fallback.lock_queue(family, index);
            }
        }
    }

    /// Unlock a queue after the decoder's submission
    pub fn unlock_queue(&self, family: u32, index: u32) {
        match self.arbiter.upgrade() {
            Some(arbiter) => arbiter.unlock(family, index),
            None => {
                warn!(family, index, "Queue unlock hook used after teardown");
                self.fallback.unlock_queue(family, index);
            }
        }
    }
}

/// Vulkan device description the decoder is initialized with
///
/// Populated from the renderer's device: the decoder never creates a
/// device of its own.
#[derive(Clone)]
pub struct DecodeDeviceContext {
    pub instance: vk::Instance,
    pub get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
    pub physical_device: vk::PhysicalDevice,
    pub device: vk::Device,
    /// Core and Vulkan 1.1 to 1.3 features, copied from the renderer
    pub features: DeviceFeatures,
    pub instance_extensions: Vec<CString>,
    pub device_extensions: Vec<CString>,
    /// Queue families the decoder may use
    pub queues: QueueAssignment,
    /// Submission lock hooks, if installed
    pub queue_hooks: Option<QueueHooks>,
}

impl DecodeDeviceContext {
    /// Copy instance, device, features and extensions from the renderer
    pub fn from_renderer(vk: &VulkanContext, queues: QueueAssignment) -> Self {
        Self {
            instance: vk.instance,
            get_instance_proc_addr: vk.get_instance_proc_addr,
            physical_device: vk.physical_device,
            device: vk.device,
            features: vk.features,
            instance_extensions: vk.instance_extensions.clone(),
            device_extensions: vk.device_extensions.clone(),
            queues,
            queue_hooks: None,
        }
    }

    /// Lock a queue through the installed hooks (no-op without hooks)
    pub fn lock_queue(&self, family: u32, index: u32) {
        if let Some(hooks) = &self.queue_hooks {
            hooks.lock_queue(family, index);
        }
    }

    /// Unlock a queue through the installed hooks (no-op without hooks)
    pub fn unlock_queue(&self, family: u32, index: u32) {
        if let Some(hooks) = &self.queue_hooks {
            hooks.unlock_queue(family, index);
        }
    }
}

impl std::fmt::Debug for DecodeDeviceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeDeviceContext")
            .field("instance", &self.instance)
            .field("physical_device", &self.physical_device)
            .field("device", &self.device)
            .field("device_extensions", &self.device_extensions)
            .field("queues", &self.queues)
            .field("queue_hooks", &self.queue_hooks.is_some())
            .finish_non_exhaustive()
    }
}

/// Video decoder's device initialization entry point
pub trait DecoderBackend: Send + Sync {
    /// Validate and initialize the decoder against a populated device context
    ///
    /// # Returns
    /// * `Ok(())` - The decoder can decode on this device
    /// * `Err(String)` - The decoder rejected the device
    fn init_device(&self, device: &DecodeDeviceContext) -> Result<(), String>;
}
