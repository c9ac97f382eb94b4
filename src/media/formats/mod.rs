// SPDX-License-Identifier: MPL-2.0

//! Format utilities
//!
//! This module translates pixel formats into the per-plane layout used when
//! importing decoded frames as textures.

pub mod pixel_format;

pub use pixel_format::{FormatDescriptor, PixelFormat, PlaneDescriptor, describe, describe_by_name};
