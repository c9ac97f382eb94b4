// SPDX-License-Identifier: GPL-3.0-only

//! Per-frame import of decoder images as renderer textures
//!
//! A [`Mapper`] is either unmapped or holds one mapped frame. Mapping wraps
//! each plane's image as a texture and hands it to the renderer with the
//! frame's current layout and semaphore value. Unmapping takes the textures
//! back and publishes the new layout and semaphore value to the frame, so
//! the decoder (or the next consumer) waits for the renderer to finish.
//!
//! # Semaphore bookkeeping on unmap
//!
//! 1. Under the frame lock, bump the semaphore value of every touched image
//!    and remember it as reserved.
//! 2. Ask the renderer to signal the reserved value when done.
//! 3. Under the frame lock again, commit the reported layout, or restore the
//!    previous value if the renderer could not schedule the signal.
//!
//! Reserving first makes the new value visible to other consumers before the
//! signal is submitted; restoring it keeps waiters from blocking forever.

use crate::constants::{MAX_IMAGES, MAX_PLANES, QUEUE_FAMILY_IGNORED};
use crate::errors::{HwdecError, HwdecResult};
use crate::gpu::{HoldParams, ReleaseParams, RenderBackend, SemaphoreValue, Texture, WrapParams};
use crate::hwdec::planes::{plane_image, plane_source, touched_images};
use crate::media::decoders::{FrameState, HwImage, ImageFormat, ImageParams, VkFrame};
use crate::media::formats::{FormatDescriptor, describe};
use ash::vk;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// One plane of a mapped frame
#[derive(Debug)]
pub struct MappedPlane {
    pub texture: Texture,
    /// Texture width (padded frame pool geometry)
    pub width: u32,
    /// Texture height (padded frame pool geometry, so 1088 for a 1080p
    /// stream; the displayed size is in `visible_height`)
    pub height: u32,
    /// Displayed width of this plane
    pub visible_width: u32,
    /// Displayed height of this plane
    pub visible_height: u32,
    /// Index of the backing image within the frame
    pub image: usize,
    pub aspect: vk::ImageAspectFlags,
}

/// Maps decoder frames of one format into renderer textures
pub struct Mapper {
    render: Arc<dyn RenderBackend>,
    src_params: ImageParams,
    dst_params: ImageParams,
    layout: FormatDescriptor,

    planes: [Option<MappedPlane>; MAX_PLANES],
    /// Image state read under the frame lock at map time
    snapshot: FrameState,
    num_images: usize,
    /// Frame currently mapped; set only once every plane is wrapped
    frame: Option<Arc<VkFrame>>,
}

impl Mapper {
    /// Create a mapper for Vulkan frames with the given parameters
    ///
    /// The textures use the frames' software sub-format.
    pub fn new(render: Arc<dyn RenderBackend>, src_params: &ImageParams) -> HwdecResult<Self> {
        if src_params.imgfmt != ImageFormat::Vulkan {
            return Err(HwdecError::FormatUnsupported(
                "not a Vulkan hardware frame".to_string(),
            ));
        }
        let Some(sw_format) = src_params.hw_subfmt else {
            return Err(HwdecError::FormatUnsupported(
                "hardware frame without a sub-format".to_string(),
            ));
        };

        let dst_params = ImageParams {
            imgfmt: ImageFormat::Software(sw_format),
            hw_subfmt: None,
            ..*src_params
        };
        let layout = describe(sw_format)?;

        debug!(
            format = %sw_format,
            width = dst_params.w,
            height = dst_params.h,
            planes = layout.num_planes(),
            "Mapper initialized"
        );

        Ok(Self {
            render,
            src_params: *src_params,
            dst_params,
            layout,
            planes: Default::default(),
            snapshot: FrameState::default(),
            num_images: 0,
            frame: None,
        })
    }

    /// Parameters of the frames this mapper accepts
    pub fn src_params(&self) -> &ImageParams {
        &self.src_params
    }

    /// Parameters of the mapped textures
    pub fn dst_params(&self) -> &ImageParams {
        &self.dst_params
    }

    /// Plane layout of the mapped format
    pub fn layout(&self) -> &FormatDescriptor {
        &self.layout
    }

    /// Whether a frame is currently mapped
    pub fn is_mapped(&self) -> bool {
        self.frame.is_some()
    }

    /// Number of images backing the mapped frame
    pub fn num_images(&self) -> usize {
        self.num_images
    }

    /// A mapped plane
    pub fn plane(&self, index: usize) -> Option<&MappedPlane> {
        self.planes.get(index).and_then(Option::as_ref)
    }

    /// All mapped planes in order
    pub fn planes(&self) -> impl Iterator<Item = &MappedPlane> {
        self.planes.iter().flatten()
    }

    /// Import a decoded frame
    ///
    /// Any previously mapped frame is unmapped first. The frame must have
    /// the parameters the mapper was created with. On failure every texture
    /// created so far is released and the mapper is left unmapped.
    pub fn map(&mut self, src: &HwImage) -> HwdecResult<()> {
        self.unmap();

        if self.render.vulkan().is_none() {
            return Err(HwdecError::NoContext);
        }

        if src.params != self.src_params {
            return Err(HwdecError::FormatUnsupported(format!(
                "frame parameters {:?} do not match mapper parameters {:?}",
                src.params, self.src_params
            )));
        }

        let frames = src.frame.frames();
        if frames.sw_format != self.layout.format {
            return Err(HwdecError::FormatUnsupported(format!(
                "frame pool format {} does not match mapper format {}",
                frames.sw_format, self.layout.format
            )));
        }

        // Images can be larger than the displayed frame (1088 rows for
        // 1080p), so textures take the pool's size.
        let (pool_w, pool_h) = (frames.width, frames.height);

        {
            let state = src.frame.lock();
            self.snapshot = *state;
            self.num_images = state.num_images();
        }

        let num_planes = self.layout.num_planes();
        trace!(
            planes = num_planes,
            images = self.num_images,
            "Mapping frame"
        );

        for plane in 0..num_planes {
            if let Err(e) = self.map_plane(plane, pool_w, pool_h, frames.usage) {
                self.unmap();
                return Err(e);
            }
        }

        self.frame = Some(src.frame.clone());
        Ok(())
    }

    fn map_plane(
        &mut self,
        plane: usize,
        pool_w: u32,
        pool_h: u32,
        usage: vk::ImageUsageFlags,
    ) -> HwdecResult<()> {
        let num_planes = self.layout.num_planes();
        let source = plane_source(plane, num_planes, self.num_images).ok_or_else(|| {
            HwdecError::FormatUnsupported(format!(
                "plane {} cannot be addressed in a multi-planar image",
                plane
            ))
        })?;
        if source.image >= self.num_images {
            return Err(HwdecError::FormatUnsupported(format!(
                "plane {} has no backing image ({} images)",
                plane, self.num_images
            )));
        }

        let desc = self.layout.planes[plane];
        let params = WrapParams {
            image: self.snapshot.img[source.image],
            width: desc.plane_width(pool_w),
            height: desc.plane_height(pool_h),
            format: desc.format,
            usage,
            aspect: source.aspect,
        };

        let Some(texture) = self.render.wrap(&params) else {
            warn!(plane, image = source.image, "Failed to wrap plane image");
            return Err(HwdecError::WrapFailed { plane });
        };

        self.render.release(
            &texture,
            &ReleaseParams {
                layout: self.snapshot.layout[source.image],
                queue_family: QUEUE_FAMILY_IGNORED,
                semaphore: SemaphoreValue {
                    sem: self.snapshot.sem[source.image],
                    value: self.snapshot.sem_value[source.image],
                },
            },
        );

        self.planes[plane] = Some(MappedPlane {
            texture,
            width: params.width,
            height: params.height,
            visible_width: desc.plane_width(self.dst_params.w),
            visible_height: desc.plane_height(self.dst_params.h),
            image: source.image,
            aspect: source.aspect,
        });
        Ok(())
    }

    /// Return the mapped frame to the decoder
    ///
    /// Never fails and is safe to call on an unmapped or partially mapped
    /// mapper.
    pub fn unmap(&mut self) {
        let Some(frame) = self.frame.clone() else {
            self.free_textures();
            return;
        };

        let num_planes = self.layout.num_planes();
        let num_images = self.num_images.min(MAX_IMAGES);
        let mapped: Vec<usize> = (0..num_planes)
            .filter(|p| self.planes[*p].is_some())
            .collect();
        let touched = touched_images(mapped.iter().copied(), num_planes, num_images);

        let mut reserved = [0u64; MAX_IMAGES];
        {
            let mut state = frame.lock();
            for image in (0..num_images).filter(|i| touched[*i]) {
                state.sem_value[image] += 1;
                reserved[image] = state.sem_value[image];
            }
        }

        let mut new_layout = [vk::ImageLayout::UNDEFINED; MAX_IMAGES];
        let mut ok = [false; MAX_IMAGES];
        let mut processed = [false; MAX_IMAGES];
        for &plane in &mapped {
            let image = plane_image(plane, num_planes, num_images);
            if image >= num_images || processed[image] {
                continue;
            }
            processed[image] = true;

            let Some(mapped_plane) = &self.planes[plane] else {
                continue;
            };
            let params = HoldParams {
                queue_family: QUEUE_FAMILY_IGNORED,
                semaphore: SemaphoreValue {
                    sem: self.snapshot.sem[image],
                    value: reserved[image],
                },
            };
            match self.render.hold(&mapped_plane.texture, &params) {
                Some(layout) => {
                    new_layout[image] = layout;
                    ok[image] = true;
                }
                None => {
                    warn!(
                        image,
                        value = reserved[image],
                        "Failed to hold texture, restoring semaphore value"
                    );
                }
            }
        }

        {
            let mut state = frame.lock();
            for image in 0..num_images {
                if touched[image] {
                    if ok[image] {
                        state.layout[image] = new_layout[image];
                    } else {
                        state.sem_value[image] = reserved[image] - 1;
                    }
                }
                state.access[image] = vk::AccessFlags::empty();
            }
        }

        trace!("Unmapped frame");
        self.free_textures();
        self.frame = None;
    }

    fn free_textures(&mut self) {
        for slot in self.planes.iter_mut() {
            if let Some(plane) = slot.take() {
                self.render.free(plane.texture);
            }
        }
    }
}

impl Drop for Mapper {
    fn drop(&mut self) {
        self.unmap();
    }
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("dst_params", &self.dst_params)
            .field("planes", &self.planes)
            .field("num_images", &self.num_images)
            .field("mapped", &self.frame.is_some())
            .finish_non_exhaustive()
    }
}
