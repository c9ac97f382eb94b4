// SPDX-License-Identifier: GPL-3.0-only

//! Registry of initialized hardware decode devices
//!
//! The player's decoders look devices up here by driver name. The registry
//! is passed around explicitly; there is no global instance.

use crate::media::decoders::{DecodeDeviceContext, ImageFormat};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// One registered device
#[derive(Debug, Clone)]
pub struct HwdecDevice {
    pub driver_name: &'static str,
    pub device: Arc<DecodeDeviceContext>,
    /// Image format of frames decoded on this device
    pub hw_imgfmt: ImageFormat,
}

/// Thread-safe list of registered devices
#[derive(Debug, Default)]
pub struct HwdecDevices {
    devices: Mutex<Vec<HwdecDevice>>,
}

impl HwdecDevices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device
    pub fn add(&self, device: HwdecDevice) {
        debug!(driver = device.driver_name, "Registering hwdec device");
        self.lock().push(device);
    }

    /// Deregister a device, matched by identity of its device handle
    ///
    /// Returns whether the device was registered.
    pub fn remove(&self, device: &Arc<DecodeDeviceContext>) -> bool {
        let mut devices = self.lock();
        let before = devices.len();
        devices.retain(|d| !Arc::ptr_eq(&d.device, device));
        let removed = devices.len() != before;
        if removed {
            debug!("Deregistered hwdec device");
        }
        removed
    }

    /// First device registered under a driver name
    pub fn get(&self, driver_name: &str) -> Option<HwdecDevice> {
        self.lock()
            .iter()
            .find(|d| d.driver_name == driver_name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<HwdecDevice>> {
        self.devices.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::QueueInfo;
    use crate::hwdec::queue_families::{LegacyQueues, QueueAssignment};
    use ash::vk;

    unsafe extern "system" fn no_proc_addr(
        _instance: vk::Instance,
        _name: *const std::ffi::c_char,
    ) -> vk::PFN_vkVoidFunction {
        None
    }

    fn device() -> Arc<DecodeDeviceContext> {
        Arc::new(DecodeDeviceContext {
            instance: vk::Instance::null(),
            get_instance_proc_addr: no_proc_addr,
            physical_device: vk::PhysicalDevice::null(),
            device: vk::Device::null(),
            features: Default::default(),
            instance_extensions: Vec::new(),
            device_extensions: Vec::new(),
            queues: QueueAssignment::Legacy(LegacyQueues {
                graphics: QueueInfo::default(),
                transfer: QueueInfo::default(),
                compute: QueueInfo::default(),
                decode: None,
            }),
            queue_hooks: None,
        })
    }

    fn entry(device: &Arc<DecodeDeviceContext>) -> HwdecDevice {
        HwdecDevice {
            driver_name: "vulkan",
            device: device.clone(),
            hw_imgfmt: ImageFormat::Vulkan,
        }
    }

    #[test]
    fn test_remove_matches_by_identity() {
        let registry = HwdecDevices::new();
        let first = device();
        let second = device();
        registry.add(entry(&first));
        registry.add(entry(&second));

        assert!(registry.remove(&first));
        assert_eq!(registry.len(), 1);
        let remaining = registry.get("vulkan").unwrap();
        assert!(Arc::ptr_eq(&remaining.device, &second));

        assert!(!registry.remove(&first));
    }

    #[test]
    fn test_get_unknown_driver() {
        let registry = HwdecDevices::new();
        registry.add(entry(&device()));
        assert!(registry.get("vaapi").is_none());
    }
}
