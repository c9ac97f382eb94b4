// SPDX-License-Identifier: GPL-3.0-only

//! Standalone Vulkan instance for probing decode support.
//!
//! Used by the command line tool to inspect what the system's devices would
//! hand to the decoder, without creating a renderer.

use crate::constants::{PROBE_API_VERSION, VIDEO_DECODE_QUEUE_EXTENSION};
use crate::errors::{HwdecError, HwdecResult};
use crate::gpu::{DeviceFeatures, QueueInfo, QueueOwner, VulkanContext};
use crate::hwdec::queue_families::QueueFamilyDescriptor;
use ash::vk;
use std::sync::Arc;
use tracing::{debug, info};

/// Summary of one physical device
#[derive(Debug, Clone)]
pub struct PhysicalDeviceSummary {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    /// Whether `VK_KHR_video_decode_queue` is available
    pub video_decode: bool,
}

/// A Vulkan instance created only for probing
pub struct ProbeInstance {
    // Keeps the loader library alive for as long as the instance exists
    entry: ash::Entry,
    instance: ash::Instance,
}

impl ProbeInstance {
    /// Load the system Vulkan loader and create an instance
    pub fn new() -> HwdecResult<Self> {
        // SAFETY: loading the system loader has no preconditions beyond the
        // library being a conforming Vulkan loader.
        let entry = unsafe { ash::Entry::load() }
            .map_err(|e| HwdecError::Unsupported(format!("failed to load Vulkan: {}", e)))?;

        let app_info = vk::ApplicationInfo::default()
            .application_name(c"vulkan-hwdec")
            .api_version(PROBE_API_VERSION);
        let create_info = vk::InstanceCreateInfo::default().application_info(&app_info);

        // SAFETY: create_info and everything it points to outlive the call.
        let instance = unsafe { entry.create_instance(&create_info, None) }.map_err(|e| {
            HwdecError::Unsupported(format!("failed to create Vulkan instance: {:?}", e))
        })?;

        info!("Created Vulkan probe instance");

        Ok(Self { entry, instance })
    }

    /// Enumerate physical devices
    pub fn physical_devices(&self) -> HwdecResult<Vec<PhysicalDeviceSummary>> {
        // SAFETY: the instance is valid for the lifetime of self.
        let handles = unsafe { self.instance.enumerate_physical_devices() }.map_err(|e| {
            HwdecError::AllocationFailed(format!("failed to enumerate devices: {:?}", e))
        })?;

        let devices = handles
            .into_iter()
            .map(|handle| {
                // SAFETY: handle was just returned by this instance.
                let props = unsafe { self.instance.get_physical_device_properties(handle) };
                let name = props
                    .device_name_as_c_str()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|_| "unknown".to_string());

                PhysicalDeviceSummary {
                    handle,
                    name,
                    device_type: props.device_type,
                    video_decode: self.has_video_decode(handle),
                }
            })
            .collect();

        Ok(devices)
    }

    /// Whether the device offers the video decode queue extension
    fn has_video_decode(&self, device: vk::PhysicalDevice) -> bool {
        // SAFETY: device belongs to this instance.
        let extensions =
            match unsafe { self.instance.enumerate_device_extension_properties(device) } {
                Ok(extensions) => extensions,
                Err(e) => {
                    debug!(error = ?e, "Failed to enumerate device extensions");
                    return false;
                }
            };

        extensions.iter().any(|ext| {
            ext.extension_name_as_c_str()
                .is_ok_and(|name| name == VIDEO_DECODE_QUEUE_EXTENSION)
        })
    }

    /// Enumerate queue families together with their video codec operations
    pub fn queue_families(&self, device: vk::PhysicalDevice) -> Vec<QueueFamilyDescriptor> {
        // SAFETY: device belongs to this instance.
        let count = unsafe {
            self.instance
                .get_physical_device_queue_family_properties2_len(device)
        };

        let mut video = vec![vk::QueueFamilyVideoPropertiesKHR::default(); count];
        let basic: Vec<vk::QueueFamilyProperties> = {
            let mut props: Vec<vk::QueueFamilyProperties2<'_>> = video
                .iter_mut()
                .map(|v| vk::QueueFamilyProperties2::default().push_next(v))
                .collect();

            // SAFETY: props has exactly `count` entries, each with a valid
            // pNext chain into `video`.
            unsafe {
                self.instance
                    .get_physical_device_queue_family_properties2(device, &mut props)
            };

            props.iter().map(|p| p.queue_family_properties).collect()
        };

        basic
            .iter()
            .zip(video.iter())
            .enumerate()
            .map(|(index, (props, video))| QueueFamilyDescriptor {
                index: index as u32,
                count: props.queue_count,
                flags: props.queue_flags,
                video_caps: video.video_codec_operations,
            })
            .collect()
    }

    /// Query core and Vulkan 1.1 to 1.3 features of a device
    pub fn device_features(&self, device: vk::PhysicalDevice) -> DeviceFeatures {
        let mut features = DeviceFeatures::default();
        let core = {
            let mut chain = features.chained();
            // SAFETY: device belongs to this instance and the chain only
            // points into `features`, which outlives the call.
            unsafe {
                self.instance
                    .get_physical_device_features2(device, &mut chain)
            };
            chain.features
        };
        features.detach();
        features.core = core;
        features
    }

    /// Describe a physical device the way a renderer using it would
    ///
    /// No logical device is created: the device handle is null and queue
    /// locking does nothing. Role queues are picked the way renderers
    /// usually do, preferring dedicated transfer and compute families.
    pub fn renderer_view(
        &self,
        device: &PhysicalDeviceSummary,
        families: &[QueueFamilyDescriptor],
    ) -> VulkanContext {
        let graphics = pick_family(families, vk::QueueFlags::GRAPHICS, vk::QueueFlags::empty());
        let transfer = pick_family(families, vk::QueueFlags::TRANSFER, vk::QueueFlags::GRAPHICS)
            .or(graphics);
        let compute = pick_family(families, vk::QueueFlags::COMPUTE, vk::QueueFlags::GRAPHICS)
            .or(graphics);

        let mut device_extensions = Vec::new();
        if device.video_decode {
            device_extensions.push(VIDEO_DECODE_QUEUE_EXTENSION.to_owned());
        }

        VulkanContext {
            instance: self.instance.handle(),
            get_instance_proc_addr: self.entry.static_fn().get_instance_proc_addr,
            physical_device: device.handle,
            device: vk::Device::null(),
            features: self.device_features(device.handle),
            instance_extensions: Vec::new(),
            device_extensions,
            queue_graphics: graphics.unwrap_or_default(),
            queue_transfer: transfer.unwrap_or_default(),
            queue_compute: compute.unwrap_or_default(),
            queues: Arc::new(NoSubmission),
        }
    }
}

/// First family with `wanted`, preferring one without `avoid`
fn pick_family(
    families: &[QueueFamilyDescriptor],
    wanted: vk::QueueFlags,
    avoid: vk::QueueFlags,
) -> Option<QueueInfo> {
    let candidates = || families.iter().filter(|f| f.flags.contains(wanted));
    candidates()
        .find(|f| !f.flags.intersects(avoid))
        .or_else(|| candidates().next())
        .map(|f| QueueInfo {
            index: f.index,
            count: f.count,
        })
}

/// Queue owner of a context that never submits work
struct NoSubmission;

impl QueueOwner for NoSubmission {
    fn lock_queue(&self, _family: u32, _index: u32) {}

    fn unlock_queue(&self, _family: u32, _index: u32) {}
}

impl Drop for ProbeInstance {
    fn drop(&mut self) {
        // SAFETY: no child objects were created from this instance.
        unsafe { self.instance.destroy_instance(None) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(index: u32, flags: vk::QueueFlags) -> QueueFamilyDescriptor {
        QueueFamilyDescriptor {
            index,
            count: 2,
            flags,
            video_caps: vk::VideoCodecOperationFlagsKHR::empty(),
        }
    }

    #[test]
    fn test_pick_family_prefers_dedicated() {
        let families = [
            family(0, vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
            family(1, vk::QueueFlags::TRANSFER),
            family(2, vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
        ];

        let transfer = pick_family(&families, vk::QueueFlags::TRANSFER, vk::QueueFlags::GRAPHICS);
        assert_eq!(transfer.map(|q| q.index), Some(1));

        let compute = pick_family(&families, vk::QueueFlags::COMPUTE, vk::QueueFlags::GRAPHICS);
        assert_eq!(compute.map(|q| q.index), Some(2));
    }

    #[test]
    fn test_pick_family_falls_back_to_shared() {
        let families = [family(0, vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)];
        let compute = pick_family(&families, vk::QueueFlags::COMPUTE, vk::QueueFlags::GRAPHICS);
        assert_eq!(compute, Some(QueueInfo { index: 0, count: 2 }));
        assert_eq!(
            pick_family(&families, vk::QueueFlags::VIDEO_DECODE_KHR, vk::QueueFlags::empty()),
            None
        );
    }
}
