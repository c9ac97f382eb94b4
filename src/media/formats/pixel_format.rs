// SPDX-License-Identifier: GPL-3.0-only

//! Pixel formats decoded frames can carry, and their per-plane layout

use crate::constants::MAX_PLANES;
use crate::errors::{HwdecError, HwdecResult};
use ash::vk;
use std::fmt;

/// Software pixel formats of decoded Vulkan frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    // ===== Semi-planar YUV =====
    /// NV12 4:2:0 - Y plane + interleaved UV, 8-bit
    Nv12,
    /// NV16 4:2:2 - Y plane + interleaved UV, 8-bit
    Nv16,
    /// NV24 4:4:4 - Y plane + interleaved UV, 8-bit
    Nv24,
    /// P010 4:2:0 - Y plane + interleaved UV, 10-bit in 16-bit words
    P010,
    /// P012 4:2:0 - Y plane + interleaved UV, 12-bit in 16-bit words
    P012,
    /// P016 4:2:0 - Y plane + interleaved UV, 16-bit
    P016,

    // ===== Planar YUV =====
    /// YUV 4:2:0 with three separate planes, 8-bit
    Yuv420p,
    /// YUV 4:2:2 with three separate planes, 8-bit
    Yuv422p,
    /// YUV 4:4:4 with three separate planes, 8-bit
    Yuv444p,
    /// YUV 4:2:0 with three separate planes, 16-bit
    Yuv420p16,
    /// YUV 4:4:4 with three separate planes, 16-bit
    Yuv444p16,

    // ===== Planar RGB =====
    /// Planar G, B, R, A, 8-bit
    Gbrap,

    // ===== Packed RGB =====
    /// RGBA 32-bit
    Rgba,
    /// BGRA 32-bit
    Bgra,
}

/// Layout of one plane of a pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneDescriptor {
    /// Per-plane Vulkan format used when wrapping the plane as a texture
    pub format: vk::Format,
    /// Number of components stored in this plane
    pub components: u8,
    /// Horizontal subsampling as a power of two
    pub shift_x: u8,
    /// Vertical subsampling as a power of two
    pub shift_y: u8,
}

impl PlaneDescriptor {
    const fn new(format: vk::Format, components: u8, shift_x: u8, shift_y: u8) -> Self {
        Self {
            format,
            components,
            shift_x,
            shift_y,
        }
    }

    /// Plane width for a frame of the given width, rounding up
    pub fn plane_width(&self, width: u32) -> u32 {
        let align = (1u32 << self.shift_x) - 1;
        (width + align) >> self.shift_x
    }

    /// Plane height for a frame of the given height, rounding up
    pub fn plane_height(&self, height: u32) -> u32 {
        let align = (1u32 << self.shift_y) - 1;
        (height + align) >> self.shift_y
    }
}

/// Full plane layout of a pixel format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub format: PixelFormat,
    /// Multi-planar Vulkan format when all planes live in one image
    pub multiplane_format: Option<vk::Format>,
    pub planes: Vec<PlaneDescriptor>,
}

impl FormatDescriptor {
    /// Number of logical planes
    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }
}

impl PixelFormat {
    /// Every known format, for listing
    pub const ALL: [PixelFormat; 14] = [
        PixelFormat::Nv12,
        PixelFormat::Nv16,
        PixelFormat::Nv24,
        PixelFormat::P010,
        PixelFormat::P012,
        PixelFormat::P016,
        PixelFormat::Yuv420p,
        PixelFormat::Yuv422p,
        PixelFormat::Yuv444p,
        PixelFormat::Yuv420p16,
        PixelFormat::Yuv444p16,
        PixelFormat::Gbrap,
        PixelFormat::Rgba,
        PixelFormat::Bgra,
    ];

    /// Parse a format from its lowercase name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Short lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nv12 => "nv12",
            Self::Nv16 => "nv16",
            Self::Nv24 => "nv24",
            Self::P010 => "p010",
            Self::P012 => "p012",
            Self::P016 => "p016",
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
            Self::Yuv420p16 => "yuv420p16",
            Self::Yuv444p16 => "yuv444p16",
            Self::Gbrap => "gbrap",
            Self::Rgba => "rgba",
            Self::Bgra => "bgra",
        }
    }

    /// Whether this is a YUV format
    pub fn is_yuv(&self) -> bool {
        !matches!(self, Self::Gbrap | Self::Rgba | Self::Bgra)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Describe the planes of a pixel format
///
/// Pure lookup, consumed once per mapper to get plane count, per-plane
/// texture formats and chroma subsampling.
pub fn describe(format: PixelFormat) -> HwdecResult<FormatDescriptor> {
    use PlaneDescriptor as P;
    use vk::Format as F;

    let (multiplane_format, planes): (Option<vk::Format>, Vec<PlaneDescriptor>) = match format {
        PixelFormat::Nv12 => (
            Some(F::G8_B8R8_2PLANE_420_UNORM),
            vec![P::new(F::R8_UNORM, 1, 0, 0), P::new(F::R8G8_UNORM, 2, 1, 1)],
        ),
        PixelFormat::Nv16 => (
            Some(F::G8_B8R8_2PLANE_422_UNORM),
            vec![P::new(F::R8_UNORM, 1, 0, 0), P::new(F::R8G8_UNORM, 2, 1, 0)],
        ),
        PixelFormat::Nv24 => (
            Some(F::G8_B8R8_2PLANE_444_UNORM),
            vec![P::new(F::R8_UNORM, 1, 0, 0), P::new(F::R8G8_UNORM, 2, 0, 0)],
        ),
        PixelFormat::P010 => (
            Some(F::G10X6_B10X6R10X6_2PLANE_420_UNORM_3PACK16),
            vec![P::new(F::R16_UNORM, 1, 0, 0), P::new(F::R16G16_UNORM, 2, 1, 1)],
        ),
        PixelFormat::P012 => (
            Some(F::G12X4_B12X4R12X4_2PLANE_420_UNORM_3PACK16),
            vec![P::new(F::R16_UNORM, 1, 0, 0), P::new(F::R16G16_UNORM, 2, 1, 1)],
        ),
        PixelFormat::P016 => (
            Some(F::G16_B16R16_2PLANE_420_UNORM),
            vec![P::new(F::R16_UNORM, 1, 0, 0), P::new(F::R16G16_UNORM, 2, 1, 1)],
        ),
        PixelFormat::Yuv420p => (
            Some(F::G8_B8_R8_3PLANE_420_UNORM),
            vec![
                P::new(F::R8_UNORM, 1, 0, 0),
                P::new(F::R8_UNORM, 1, 1, 1),
                P::new(F::R8_UNORM, 1, 1, 1),
            ],
        ),
        PixelFormat::Yuv422p => (
            Some(F::G8_B8_R8_3PLANE_422_UNORM),
            vec![
                P::new(F::R8_UNORM, 1, 0, 0),
                P::new(F::R8_UNORM, 1, 1, 0),
                P::new(F::R8_UNORM, 1, 1, 0),
            ],
        ),
        PixelFormat::Yuv444p => (
            Some(F::G8_B8_R8_3PLANE_444_UNORM),
            vec![
                P::new(F::R8_UNORM, 1, 0, 0),
                P::new(F::R8_UNORM, 1, 0, 0),
                P::new(F::R8_UNORM, 1, 0, 0),
            ],
        ),
        PixelFormat::Yuv420p16 => (
            Some(F::G16_B16_R16_3PLANE_420_UNORM),
            vec![
                P::new(F::R16_UNORM, 1, 0, 0),
                P::new(F::R16_UNORM, 1, 1, 1),
                P::new(F::R16_UNORM, 1, 1, 1),
            ],
        ),
        PixelFormat::Yuv444p16 => (
            Some(F::G16_B16_R16_3PLANE_444_UNORM),
            vec![
                P::new(F::R16_UNORM, 1, 0, 0),
                P::new(F::R16_UNORM, 1, 0, 0),
                P::new(F::R16_UNORM, 1, 0, 0),
            ],
        ),
        // No multi-planar Vulkan format has four planes
        PixelFormat::Gbrap => (
            None,
            vec![
                P::new(F::R8_UNORM, 1, 0, 0),
                P::new(F::R8_UNORM, 1, 0, 0),
                P::new(F::R8_UNORM, 1, 0, 0),
                P::new(F::R8_UNORM, 1, 0, 0),
            ],
        ),
        PixelFormat::Rgba => (None, vec![P::new(F::R8G8B8A8_UNORM, 4, 0, 0)]),
        PixelFormat::Bgra => (None, vec![P::new(F::B8G8R8A8_UNORM, 4, 0, 0)]),
    };

    if planes.len() > MAX_PLANES {
        return Err(HwdecError::FormatUnsupported(format!(
            "{} has {} planes (max {})",
            format,
            planes.len(),
            MAX_PLANES
        )));
    }

    Ok(FormatDescriptor {
        format,
        multiplane_format,
        planes,
    })
}

/// Describe a pixel format given by name
pub fn describe_by_name(name: &str) -> HwdecResult<FormatDescriptor> {
    let format =
        PixelFormat::from_name(name).ok_or_else(|| HwdecError::UnknownFormat(name.to_string()))?;
    describe(format)
}
