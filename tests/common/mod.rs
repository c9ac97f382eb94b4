// SPDX-License-Identifier: GPL-3.0-only

//! Mock renderer and decoder shared by the integration tests

#![allow(dead_code)]

use ash::vk;
use ash::vk::Handle;
use std::collections::HashSet;
use std::ffi::CString;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use vulkan_hwdec::constants::VIDEO_DECODE_QUEUE_EXTENSION;
use vulkan_hwdec::gpu::{
    DeviceFeatures, HoldParams, QueueInfo, QueueOwner, ReleaseParams, RenderBackend, Texture,
    VulkanContext, WrapParams,
};
use vulkan_hwdec::hwdec::QueueFamilyDescriptor;
use vulkan_hwdec::media::decoders::{
    DecodeDeviceContext, DecoderBackend, FrameState, FramesContext, HwImage, ImageFormat,
    ImageParams, VkFrame,
};
use vulkan_hwdec::media::formats::PixelFormat;

unsafe extern "system" fn null_proc_addr(
    _instance: vk::Instance,
    _name: *const std::ffi::c_char,
) -> vk::PFN_vkVoidFunction {
    None
}

/// Records native queue lock calls
#[derive(Default)]
pub struct RecordingQueues {
    pub calls: Mutex<Vec<(&'static str, u32, u32)>>,
}

impl QueueOwner for RecordingQueues {
    fn lock_queue(&self, family: u32, index: u32) {
        self.calls.lock().unwrap().push(("lock", family, index));
    }

    fn unlock_queue(&self, family: u32, index: u32) {
        self.calls.lock().unwrap().push(("unlock", family, index));
    }
}

pub fn family(index: u32, flags: vk::QueueFlags) -> QueueFamilyDescriptor {
    QueueFamilyDescriptor {
        index,
        count: 1,
        flags,
        video_caps: vk::VideoCodecOperationFlagsKHR::empty(),
    }
}

pub fn decode_family(
    index: u32,
    flags: vk::QueueFlags,
    caps: vk::VideoCodecOperationFlagsKHR,
) -> QueueFamilyDescriptor {
    QueueFamilyDescriptor {
        index,
        count: 1,
        flags: flags | vk::QueueFlags::VIDEO_DECODE_KHR,
        video_caps: caps,
    }
}

/// Codecs of the decode family at index 2
pub const H264_ONLY: vk::VideoCodecOperationFlagsKHR = vk::VideoCodecOperationFlagsKHR::DECODE_H264;

/// Codecs of the decode family at index 4
pub const H265_ONLY: vk::VideoCodecOperationFlagsKHR = vk::VideoCodecOperationFlagsKHR::DECODE_H265;

/// Graphics at 0, transfer at 1, decode at 2
pub fn one_decode_family() -> Vec<QueueFamilyDescriptor> {
    vec![
        family(0, vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
        family(1, vk::QueueFlags::TRANSFER),
        decode_family(2, vk::QueueFlags::TRANSFER, H264_ONLY),
    ]
}

/// Graphics at 0, transfer at 1, compute at 3, decode at 2 (H.264) and 4 (H.265)
pub fn two_decode_families() -> Vec<QueueFamilyDescriptor> {
    let mut families = one_decode_family();
    families.push(family(3, vk::QueueFlags::COMPUTE));
    families.push(decode_family(4, vk::QueueFlags::empty(), H265_ONLY));
    families
}

/// Features a video-capable renderer enables
pub fn renderer_features() -> DeviceFeatures {
    let mut features = DeviceFeatures::default();
    features.core.sampler_anisotropy = vk::TRUE;
    features.vulkan11.sampler_ycbcr_conversion = vk::TRUE;
    features.vulkan12.timeline_semaphore = vk::TRUE;
    features.vulkan13.synchronization2 = vk::TRUE;
    features
}

pub fn vulkan_context(with_decode_ext: bool, queues: Arc<dyn QueueOwner>) -> VulkanContext {
    let mut device_extensions = vec![CString::from(c"VK_KHR_swapchain")];
    if with_decode_ext {
        device_extensions.push(VIDEO_DECODE_QUEUE_EXTENSION.to_owned());
    }

    VulkanContext {
        instance: vk::Instance::from_raw(0x10),
        get_instance_proc_addr: null_proc_addr,
        physical_device: vk::PhysicalDevice::from_raw(0x20),
        device: vk::Device::from_raw(0x30),
        features: renderer_features(),
        instance_extensions: Vec::new(),
        device_extensions,
        queue_graphics: QueueInfo { index: 0, count: 1 },
        queue_transfer: QueueInfo { index: 1, count: 1 },
        queue_compute: QueueInfo { index: 3, count: 1 },
        queues,
    }
}

/// Renderer double that tracks live textures and every call made to it
pub struct MockRenderer {
    pub vulkan: Option<VulkanContext>,
    pub families: Vec<QueueFamilyDescriptor>,
    next_id: AtomicU64,
    pub live: Mutex<HashSet<u64>>,
    pub wraps: Mutex<Vec<WrapParams>>,
    pub releases: Mutex<Vec<ReleaseParams>>,
    pub holds: Mutex<Vec<HoldParams>>,
    /// Fail the wrap of this many-th call (0-based)
    pub fail_wrap_at: Option<usize>,
    /// Fail holds of textures wrapping this image
    pub fail_hold_image: Option<vk::Image>,
    /// Layout reported by successful holds
    pub hold_layout: vk::ImageLayout,
    images: Mutex<Vec<(u64, vk::Image)>>,
}

impl MockRenderer {
    pub fn new(vulkan: Option<VulkanContext>, families: Vec<QueueFamilyDescriptor>) -> Self {
        Self {
            vulkan,
            families,
            next_id: AtomicU64::new(1),
            live: Mutex::new(HashSet::new()),
            wraps: Mutex::new(Vec::new()),
            releases: Mutex::new(Vec::new()),
            holds: Mutex::new(Vec::new()),
            fail_wrap_at: None,
            fail_hold_image: None,
            hold_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            images: Mutex::new(Vec::new()),
        }
    }

    /// Vulkan renderer with the decode extension and two decode families
    pub fn vulkan() -> Self {
        Self::new(
            Some(vulkan_context(true, Arc::new(RecordingQueues::default()))),
            two_decode_families(),
        )
    }

    pub fn live_textures(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    fn image_of(&self, texture: &Texture) -> Option<vk::Image> {
        self.images
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| *id == texture.raw())
            .map(|(_, image)| *image)
    }
}

impl RenderBackend for MockRenderer {
    fn vulkan(&self) -> Option<&VulkanContext> {
        self.vulkan.as_ref()
    }

    fn queue_families(&self) -> Vec<QueueFamilyDescriptor> {
        self.families.clone()
    }

    fn wrap(&self, params: &WrapParams) -> Option<Texture> {
        let mut wraps = self.wraps.lock().unwrap();
        let call = wraps.len();
        wraps.push(*params);
        if self.fail_wrap_at == Some(call) {
            return None;
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.live.lock().unwrap().insert(id);
        self.images.lock().unwrap().push((id, params.image));
        Some(Texture::from_raw(id))
    }

    fn release(&self, _texture: &Texture, params: &ReleaseParams) {
        self.releases.lock().unwrap().push(*params);
    }

    fn hold(&self, texture: &Texture, params: &HoldParams) -> Option<vk::ImageLayout> {
        self.holds.lock().unwrap().push(*params);
        if self.fail_hold_image.is_some() && self.image_of(texture) == self.fail_hold_image {
            return None;
        }
        Some(self.hold_layout)
    }

    fn free(&self, texture: Texture) {
        assert!(
            self.live.lock().unwrap().remove(&texture.raw()),
            "texture {} freed twice or never wrapped",
            texture.raw()
        );
    }
}

/// Decoder double that records the device it was initialized with
#[derive(Default)]
pub struct MockDecoder {
    pub reject: Option<String>,
    pub seen: Mutex<Option<DecodeDeviceContext>>,
}

impl MockDecoder {
    pub fn rejecting(reason: &str) -> Self {
        Self {
            reject: Some(reason.to_string()),
            seen: Mutex::new(None),
        }
    }
}

impl DecoderBackend for MockDecoder {
    fn init_device(&self, device: &DecodeDeviceContext) -> Result<(), String> {
        *self.seen.lock().unwrap() = Some(device.clone());
        match &self.reject {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }
}

/// A decoded frame with `num_images` images starting at handle 0x100
pub fn decoded_frame(
    sw_format: PixelFormat,
    pool: (u32, u32),
    num_images: usize,
    sem_value: u64,
) -> Arc<VkFrame> {
    let frames = Arc::new(FramesContext {
        width: pool.0,
        height: pool.1,
        sw_format,
        usage: vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::VIDEO_DECODE_DST_KHR,
    });

    let mut state = FrameState::default();
    for i in 0..num_images {
        state.img[i] = vk::Image::from_raw(0x100 + i as u64);
        state.layout[i] = vk::ImageLayout::VIDEO_DECODE_DPB_KHR;
        state.sem[i] = vk::Semaphore::from_raw(0x200 + i as u64);
        state.sem_value[i] = sem_value;
        state.access[i] = vk::AccessFlags::TRANSFER_WRITE;
    }

    Arc::new(VkFrame::new(frames, state))
}

pub fn hw_params(sw_format: PixelFormat, w: u32, h: u32) -> ImageParams {
    ImageParams {
        imgfmt: ImageFormat::Vulkan,
        hw_subfmt: Some(sw_format),
        w,
        h,
    }
}

pub fn hw_image(params: ImageParams, frame: &Arc<VkFrame>) -> HwImage {
    HwImage {
        params,
        frame: frame.clone(),
    }
}
