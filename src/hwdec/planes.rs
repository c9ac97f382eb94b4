// SPDX-License-Identifier: GPL-3.0-only

//! Which physical image and aspect each logical plane lives in
//!
//! A frame with several planes but a single image is a multi-planar image:
//! every plane maps to image 0 and is selected by a plane aspect. Anything
//! else is one image per plane. Import and export must agree on this, so
//! both go through [`plane_source`].

use crate::constants::MAX_IMAGES;
use ash::vk;

/// Source image of a logical plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneSource {
    /// Index into the frame's image arrays
    pub image: usize,
    /// Aspect selecting the plane within that image
    pub aspect: vk::ImageAspectFlags,
}

/// Whether all planes share one multi-planar image
pub fn is_multiplane(num_planes: usize, num_images: usize) -> bool {
    num_planes > 1 && num_images == 1
}

/// Map a logical plane to its source image
///
/// Returns `None` for a plane a multi-planar image cannot address (a fourth
/// plane: Vulkan has plane aspects 0 to 2 only).
pub fn plane_source(plane: usize, num_planes: usize, num_images: usize) -> Option<PlaneSource> {
    if !is_multiplane(num_planes, num_images) {
        return Some(PlaneSource {
            image: plane,
            aspect: vk::ImageAspectFlags::COLOR,
        });
    }

    let aspect = match plane {
        0 => vk::ImageAspectFlags::PLANE_0,
        1 => vk::ImageAspectFlags::PLANE_1,
        2 => vk::ImageAspectFlags::PLANE_2,
        _ => return None,
    };
    Some(PlaneSource { image: 0, aspect })
}

/// Image index touched by a plane, without the aspect
pub fn plane_image(plane: usize, num_planes: usize, num_images: usize) -> usize {
    if is_multiplane(num_planes, num_images) {
        0
    } else {
        plane
    }
}

/// Which images are touched by the given planes
pub fn touched_images(
    planes: impl IntoIterator<Item = usize>,
    num_planes: usize,
    num_images: usize,
) -> [bool; MAX_IMAGES] {
    let mut touched = [false; MAX_IMAGES];
    for plane in planes {
        let image = plane_image(plane, num_planes, num_images);
        if image < num_images.min(MAX_IMAGES) {
            touched[image] = true;
        }
    }
    touched
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplane_maps_to_image_zero_with_distinct_aspects() {
        let sources: Vec<_> = (0..3).map(|p| plane_source(p, 3, 1).unwrap()).collect();
        assert!(sources.iter().all(|s| s.image == 0));
        assert_eq!(sources[0].aspect, vk::ImageAspectFlags::PLANE_0);
        assert_eq!(sources[1].aspect, vk::ImageAspectFlags::PLANE_1);
        assert_eq!(sources[2].aspect, vk::ImageAspectFlags::PLANE_2);
    }

    #[test]
    fn test_one_image_per_plane_is_identity() {
        for plane in 0..3 {
            let source = plane_source(plane, 3, 3).unwrap();
            assert_eq!(source.image, plane);
            assert_eq!(source.aspect, vk::ImageAspectFlags::COLOR);
        }
    }

    #[test]
    fn test_fourth_plane_in_shared_image_is_unaddressable() {
        assert_eq!(plane_source(3, 4, 1), None);
        assert!(plane_source(3, 4, 4).is_some());
    }

    #[test]
    fn test_single_plane_single_image_uses_color_aspect() {
        let source = plane_source(0, 1, 1).unwrap();
        assert_eq!(source.aspect, vk::ImageAspectFlags::COLOR);
    }

    #[test]
    fn test_touched_images_collapse() {
        let touched = touched_images(0..2, 2, 1);
        assert_eq!(touched, [true, false, false, false]);

        let touched = touched_images([0, 2], 3, 3);
        assert_eq!(touched, [true, false, true, false]);
    }
}
