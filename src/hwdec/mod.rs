// SPDX-License-Identifier: GPL-3.0-only

//! Vulkan hardware decode support
//!
//! Sets up a decode device that shares the renderer's Vulkan device, and
//! maps decoded frames into the renderer as textures without copies.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  init   ┌─────────────┐  registers  ┌──────────────┐
//! │ RenderBackend│ ──────► │ HwdecVulkan │ ──────────► │ HwdecDevices │
//! └──────────────┘         └──────┬──────┘             └──────────────┘
//!        ▲                        │ owns QueueArbiter,
//!        │ wrap/release/hold      │ hooks it into the decoder's device
//!        │                        ▼
//! ┌──────┴───────┐  map/unmap ┌─────────┐
//! │    Mapper    │ ◄───────── │ VkFrame │ (decoder-owned)
//! └──────────────┘            └─────────┘
//! ```

pub mod mapper;
pub mod planes;
pub mod queue_families;
pub mod queue_lock;
pub mod registry;

pub use mapper::{MappedPlane, Mapper};
pub use queue_families::{QueueAssignment, QueueFamilyDescriptor, QueueFamilyStrategy};
pub use queue_lock::QueueArbiter;
pub use registry::{HwdecDevice, HwdecDevices};

use crate::config::Config;
use crate::constants::{DRIVER_NAME, VIDEO_DECODE_QUEUE_EXTENSION};
use crate::errors::{HwdecError, HwdecResult};
use crate::gpu::RenderBackend;
use crate::media::decoders::{
    DecodeDeviceContext, DecoderBackend, ImageFormat, ImageParams, QueueHooks,
};
use queue_families::enumerate_queue_families;
use std::sync::Arc;
use tracing::debug;

/// Log at debug level while probing, at error level otherwise
macro_rules! probe_log {
    ($probing:expr, $($arg:tt)+) => {
        if $probing {
            tracing::debug!($($arg)+)
        } else {
            tracing::error!($($arg)+)
        }
    };
}

/// Initialized Vulkan hardware decode context
///
/// Dropping it deregisters the device, then releases the device handle,
/// then the queue arbiter.
pub struct HwdecVulkan {
    registry: Arc<HwdecDevices>,
    device: Arc<DecodeDeviceContext>,
    render: Arc<dyn RenderBackend>,
    arbiter: Option<Arc<QueueArbiter>>,
}

impl HwdecVulkan {
    /// Build the decode device from the renderer's Vulkan device
    ///
    /// # Arguments
    /// * `render` - The renderer; must be Vulkan-backed
    /// * `decoder` - Decoder that will be initialized with the device
    /// * `registry` - Where the device is published on success
    /// * `config` - Queue family strategy and probe mode
    ///
    /// # Returns
    /// * `Ok(HwdecVulkan)` - Device built, hooked and registered
    /// * `Err(HwdecError)` - Hardware decode is unavailable; nothing is registered
    pub fn init(
        render: Arc<dyn RenderBackend>,
        decoder: &dyn DecoderBackend,
        registry: Arc<HwdecDevices>,
        config: &Config,
    ) -> HwdecResult<Self> {
        let probing = config.probing;
        debug!("Initializing Vulkan hardware decode support");

        let Some(vulkan) = render.vulkan() else {
            probe_log!(probing, "Renderer is not a Vulkan context");
            return Err(HwdecError::Unsupported(
                "renderer is not a Vulkan context".to_string(),
            ));
        };

        debug!(
            count = vulkan.device_extensions.len(),
            "Checking for video decode extensions"
        );
        if !vulkan.has_device_extension(VIDEO_DECODE_QUEUE_EXTENSION) {
            let name = VIDEO_DECODE_QUEUE_EXTENSION.to_string_lossy();
            probe_log!(
                probing,
                "Vulkan device does not have the {} extension enabled",
                name
            );
            return Err(HwdecError::ExtensionMissing(name.into_owned()));
        }

        let families = enumerate_queue_families(&render.queue_families())?;
        debug!(count = families.len(), "Found queue families");

        if !families.iter().any(|f| f.is_decode()) {
            probe_log!(probing, "No queue family supports video decode");
            return Err(HwdecError::Unsupported(
                "no queue family supports video decode".to_string(),
            ));
        }

        let strategy = config.queue_strategy();
        debug!(strategy = strategy.name(), "Assigning queue families");
        let queues = strategy.assign_queue_families(vulkan, &families)?;

        let arbiter = Arc::new(QueueArbiter::new(vulkan.queues.clone()));
        let mut device = DecodeDeviceContext::from_renderer(vulkan, queues);
        device.queue_hooks = Some(QueueHooks::new(&arbiter, vulkan.queues.clone()));

        debug!("Initializing decoder device context");
        if let Err(e) = decoder.init_device(&device) {
            probe_log!(probing, error = %e, "Decoder device initialization failed");
            // device and arbiter are released here
            return Err(HwdecError::BackendInitFailed(e));
        }
        debug!("Decoder device context initialized");

        let device = Arc::new(device);
        registry.add(HwdecDevice {
            driver_name: DRIVER_NAME,
            device: device.clone(),
            hw_imgfmt: ImageFormat::Vulkan,
        });

        Ok(Self {
            registry,
            device,
            render,
            arbiter: Some(arbiter),
        })
    }

    /// Device handle shared with the decoder
    pub fn device(&self) -> &Arc<DecodeDeviceContext> {
        &self.device
    }

    /// Arbiter serializing decoder queue submissions
    pub fn queue_arbiter(&self) -> Option<&Arc<QueueArbiter>> {
        self.arbiter.as_ref()
    }

    /// Create a mapper for frames with the given parameters
    pub fn create_mapper(&self, src_params: &ImageParams) -> HwdecResult<Mapper> {
        Mapper::new(self.render.clone(), src_params)
    }
}

impl Drop for HwdecVulkan {
    fn drop(&mut self) {
        self.registry.remove(&self.device);
        debug!("Vulkan hardware decode support shut down");
    }
}
