// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use vulkan_hwdec::constants::{self, MAX_IMAGES, MAX_PLANES, MAX_QUEUE_FAMILIES};
use vulkan_hwdec::media::formats::{PixelFormat, describe};

#[test]
fn test_every_format_fits_plane_limit() {
    // Test that no pixel format needs more planes than a frame can hold
    for format in PixelFormat::ALL {
        let layout = describe(format).unwrap();
        assert!(
            layout.num_planes() <= MAX_PLANES,
            "{} has too many planes",
            format
        );
    }
}

#[test]
fn test_queue_family_limit_leaves_room_for_roles() {
    // Graphics, transfer and compute entries always come first
    assert!(MAX_QUEUE_FAMILIES > 3);
    assert!(MAX_IMAGES >= 1);
}

#[test]
fn test_driver_name() {
    assert_eq!(constants::DRIVER_NAME, "vulkan");
}

#[test]
fn test_version_is_set() {
    assert!(!constants::build::version().is_empty());
}
