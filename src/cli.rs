// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for inspecting hardware decode support
//!
//! This module provides command-line functionality for:
//! - Listing Vulkan devices and the queue families a decoder would get
//! - Listing supported pixel formats and their plane layout

use ash::vk;
use vulkan_hwdec::Config;
use vulkan_hwdec::gpu::instance::ProbeInstance;
use vulkan_hwdec::hwdec::queue_families::{
    LegacyQueueFamilies, QueueAssignment, QueueFamilyStrategy, enumerate_queue_families,
};
use vulkan_hwdec::media::formats::{PixelFormat, describe};

/// List Vulkan devices and their decoder queue family assignment
pub fn probe_devices(config: &Config, legacy: bool) -> Result<(), Box<dyn std::error::Error>> {
    let strategy: &dyn QueueFamilyStrategy = if legacy {
        &LegacyQueueFamilies
    } else {
        config.queue_strategy()
    };

    let instance = ProbeInstance::new()?;
    let devices = instance.physical_devices()?;

    if devices.is_empty() {
        println!("No Vulkan devices found.");
        return Ok(());
    }

    println!("Vulkan devices ({} queue family API):", strategy.name());
    println!();
    for (index, device) in devices.iter().enumerate() {
        println!("  [{}] {} ({:?})", index, device.name, device.device_type);

        if !device.video_decode {
            println!("      Video decode: not supported");
            println!();
            continue;
        }

        let families = match enumerate_queue_families(&instance.queue_families(device.handle)) {
            Ok(families) => families,
            Err(e) => {
                println!("      Queue families: {}", e);
                println!();
                continue;
            }
        };
        for family in &families {
            println!("      {}", family);
        }

        if !families.iter().any(|f| f.is_decode()) {
            println!("      Video decode: no decode queue family");
            println!();
            continue;
        }

        let renderer = instance.renderer_view(device, &families);
        let features = &renderer.features;
        println!(
            "      Timeline semaphores: {}, synchronization2: {}",
            features.vulkan12.timeline_semaphore == vk::TRUE,
            features.vulkan13.synchronization2 == vk::TRUE
        );
        match strategy.assign_queue_families(&renderer, &families)? {
            QueueAssignment::Multi(entries) => {
                println!("      Decoder queue families:");
                for entry in entries {
                    println!(
                        "        family {} x{} {:?} {:?}",
                        entry.index, entry.count, entry.flags, entry.video_caps
                    );
                }
            }
            QueueAssignment::Legacy(queues) => {
                println!(
                    "      Decoder queues: graphics={} transfer={} compute={} decode={}",
                    queues.graphics.index,
                    queues.transfer.index,
                    queues.compute.index,
                    queues
                        .decode
                        .map(|q| q.index.to_string())
                        .unwrap_or_else(|| "none".to_string())
                );
            }
        }
        println!();
    }

    Ok(())
}

/// List supported pixel formats with their per-plane Vulkan formats
pub fn list_formats() -> Result<(), Box<dyn std::error::Error>> {
    println!("Supported pixel formats:");
    println!();
    for format in PixelFormat::ALL {
        let layout = describe(format)?;
        let planes: Vec<String> = layout
            .planes
            .iter()
            .map(|p| {
                format!(
                    "{:?}/{}c 1/{}x1/{}",
                    p.format,
                    p.components,
                    1u32 << p.shift_x,
                    1u32 << p.shift_y
                )
            })
            .collect();

        let family = if format.is_yuv() { "YUV" } else { "RGB" };
        println!(
            "  {:<10} {} {} plane(s)",
            format.name(),
            family,
            layout.num_planes()
        );
        match layout.multiplane_format {
            Some(mp) => println!("      Multi-planar: {:?}", mp),
            None => println!("      Multi-planar: none"),
        }
        println!("      Planes: {}", planes.join(", "));
    }

    Ok(())
}
