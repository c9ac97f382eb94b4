// SPDX-License-Identifier: GPL-3.0-only

//! Queue family discovery and assignment for the decoder
//!
//! The renderer already created every queue the decoder may use. What is
//! left is telling the decoder which families those are, including which
//! ones can run video decode. Decoders expose this in one of two shapes,
//! each implemented as a [`QueueFamilyStrategy`]:
//!
//! - [`MultiQueueFamilies`]: a list of families, each tagged with its role
//!   and, for decode families, its codec operations
//! - [`LegacyQueueFamilies`]: one family index per role

use crate::constants::MAX_QUEUE_FAMILIES;
use crate::errors::{HwdecError, HwdecResult};
use crate::gpu::{QueueInfo, VulkanContext};
use ash::vk;
use std::fmt;
use tracing::{debug, warn};

/// One queue family of the physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyDescriptor {
    pub index: u32,
    pub count: u32,
    pub flags: vk::QueueFlags,
    /// Codec operations supported by this family's decode queues
    pub video_caps: vk::VideoCodecOperationFlagsKHR,
}

impl QueueFamilyDescriptor {
    /// Whether queues of this family can run video decode
    pub fn is_decode(&self) -> bool {
        self.flags.contains(vk::QueueFlags::VIDEO_DECODE_KHR)
    }
}

impl fmt::Display for QueueFamilyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "family {}: count={} flags=", self.index, self.count)?;
        let names = [
            (vk::QueueFlags::GRAPHICS, "GRAPHICS"),
            (vk::QueueFlags::COMPUTE, "COMPUTE"),
            (vk::QueueFlags::TRANSFER, "TRANSFER"),
            (vk::QueueFlags::VIDEO_DECODE_KHR, "VIDEO_DECODE"),
        ];
        let present: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.flags.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if present.is_empty() {
            write!(f, "none")?;
        } else {
            write!(f, "{}", present.join("|"))?;
        }
        if self.is_decode() {
            write!(f, " codecs={:?}", self.video_caps)?;
        }
        Ok(())
    }
}

/// One entry of the multi-queue family list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyEntry {
    pub index: u32,
    pub count: u32,
    /// Role of this entry (graphics, transfer, compute or video decode)
    pub flags: vk::QueueFlags,
    pub video_caps: vk::VideoCodecOperationFlagsKHR,
}

/// Fixed-role family indices of the legacy API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyQueues {
    pub graphics: QueueInfo,
    pub transfer: QueueInfo,
    pub compute: QueueInfo,
    /// `None` if no family supports video decode
    pub decode: Option<QueueInfo>,
}

/// Queue families handed to the decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueAssignment {
    Multi(Vec<QueueFamilyEntry>),
    Legacy(LegacyQueues),
}

impl QueueAssignment {
    /// Family indices the decoder may decode on
    pub fn decode_families(&self) -> Vec<u32> {
        match self {
            QueueAssignment::Multi(entries) => entries
                .iter()
                .filter(|e| e.flags.contains(vk::QueueFlags::VIDEO_DECODE_KHR))
                .map(|e| e.index)
                .collect(),
            QueueAssignment::Legacy(queues) => queues.decode.iter().map(|q| q.index).collect(),
        }
    }
}

/// Turns the device's queue families into the decoder's assignment
pub trait QueueFamilyStrategy: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Build the assignment from the renderer's queues and all families
    fn assign_queue_families(
        &self,
        renderer: &VulkanContext,
        families: &[QueueFamilyDescriptor],
    ) -> HwdecResult<QueueAssignment>;
}

/// Every role family plus every decode-capable family
pub struct MultiQueueFamilies;

impl QueueFamilyStrategy for MultiQueueFamilies {
    fn name(&self) -> &'static str {
        "multi-queue"
    }

    fn assign_queue_families(
        &self,
        renderer: &VulkanContext,
        families: &[QueueFamilyDescriptor],
    ) -> HwdecResult<QueueAssignment> {
        let mut entries: Vec<QueueFamilyEntry> = Vec::new();
        entries
            .try_reserve_exact(3 + families.len())
            .map_err(|e| HwdecError::AllocationFailed(format!("queue family entries: {}", e)))?;

        let roles = [
            (renderer.queue_graphics, vk::QueueFlags::GRAPHICS, "Graphics"),
            (renderer.queue_transfer, vk::QueueFlags::TRANSFER, "Transfer"),
            (renderer.queue_compute, vk::QueueFlags::COMPUTE, "Compute"),
        ];
        for (queue, flags, role) in roles {
            debug!(family = queue.index, count = queue.count, "{} queue", role);
            entries.push(QueueFamilyEntry {
                index: queue.index,
                count: queue.count,
                flags,
                video_caps: vk::VideoCodecOperationFlagsKHR::empty(),
            });
        }

        for family in families.iter().filter(|f| f.is_decode()) {
            if entries.len() >= MAX_QUEUE_FAMILIES {
                warn!(
                    family = family.index,
                    "Queue family list full, skipping decode family"
                );
                break;
            }
            debug!(
                family = family.index,
                count = family.count,
                caps = ?family.video_caps,
                "Video decode queue"
            );
            entries.push(QueueFamilyEntry {
                index: family.index,
                count: family.count,
                flags: vk::QueueFlags::VIDEO_DECODE_KHR,
                video_caps: family.video_caps,
            });
        }

        debug!(count = entries.len(), "Configured queue families for decoder");
        Ok(QueueAssignment::Multi(entries))
    }
}

/// One family per role; the decode family is the last decode-capable one
pub struct LegacyQueueFamilies;

impl QueueFamilyStrategy for LegacyQueueFamilies {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn assign_queue_families(
        &self,
        renderer: &VulkanContext,
        families: &[QueueFamilyDescriptor],
    ) -> HwdecResult<QueueAssignment> {
        // Families are scanned in ascending order and later matches replace
        // earlier ones.
        let mut decode = None;
        for family in families.iter().filter(|f| f.is_decode()) {
            debug!(family = family.index, "Found decode queue");
            decode = Some(QueueInfo {
                index: family.index,
                count: family.count,
            });
        }

        let queues = LegacyQueues {
            graphics: renderer.queue_graphics,
            transfer: renderer.queue_transfer,
            compute: renderer.queue_compute,
            decode,
        };
        debug!(
            graphics = queues.graphics.index,
            transfer = queues.transfer.index,
            compute = queues.compute.index,
            decode = ?queues.decode.map(|q| q.index),
            "Configured legacy queue families"
        );

        Ok(QueueAssignment::Legacy(queues))
    }
}

/// Copy the renderer's family list into a fallibly allocated array
pub fn enumerate_queue_families(
    source: &[QueueFamilyDescriptor],
) -> HwdecResult<Vec<QueueFamilyDescriptor>> {
    if source.is_empty() {
        return Err(HwdecError::AllocationFailed(
            "no queue families found".to_string(),
        ));
    }

    let mut families = Vec::new();
    families
        .try_reserve_exact(source.len())
        .map_err(|e| HwdecError::AllocationFailed(format!("queue family array: {}", e)))?;
    families.extend_from_slice(source);

    for family in &families {
        debug!("Queue {}", family);
    }

    Ok(families)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(index: u32, flags: vk::QueueFlags) -> QueueFamilyDescriptor {
        QueueFamilyDescriptor {
            index,
            count: 1,
            flags,
            video_caps: vk::VideoCodecOperationFlagsKHR::empty(),
        }
    }

    #[test]
    fn test_decode_detection() {
        assert!(family(0, vk::QueueFlags::VIDEO_DECODE_KHR | vk::QueueFlags::TRANSFER).is_decode());
        assert!(!family(0, vk::QueueFlags::GRAPHICS).is_decode());
    }

    #[test]
    fn test_display_lists_flags() {
        let f = family(3, vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE);
        assert_eq!(f.to_string(), "family 3: count=1 flags=GRAPHICS|COMPUTE");
    }

    #[test]
    fn test_enumerate_rejects_empty_device() {
        assert!(matches!(
            enumerate_queue_families(&[]),
            Err(HwdecError::AllocationFailed(_))
        ));
    }

    #[test]
    fn test_legacy_decode_families() {
        let assignment = QueueAssignment::Legacy(LegacyQueues {
            graphics: QueueInfo::default(),
            transfer: QueueInfo::default(),
            compute: QueueInfo::default(),
            decode: None,
        });
        assert!(assignment.decode_families().is_empty());
    }
}
