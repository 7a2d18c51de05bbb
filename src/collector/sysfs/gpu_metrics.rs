//! Decoder for the amdgpu `gpu_metrics` binary block.
//!
//! Layout:
//!
//! ```text
//! byte 0..2  structure size
//! byte 2     format revision, must be 1
//! byte 3     content revision, selects the temperature/power offsets
//! byte 4..   payload, fields at fixed offsets below
//! ```
//!
//! Two historical payload layouts coexist. They differ only in where the six
//! temperatures and the average socket power sit; every other field keeps its
//! offset regardless of the content revision.

use tracing::warn;

use crate::model::{ByteOrder, GpuMetrics};

/// Bytes before the payload.
pub const HEADER_LEN: usize = 4;

/// Required format revision (byte 2).
pub const FORMAT_REVISION: u8 = 1;

/// Payload offsets that depend on the content revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantOffsets {
    pub temperature_edge: usize,
    pub temperature_hotspot: usize,
    pub temperature_mem: usize,
    pub temperature_vrgfx: usize,
    pub temperature_vrsoc: usize,
    pub temperature_vrmem: usize,
    pub average_socket_power: usize,
}

const BASE_OFFSETS: VariantOffsets = VariantOffsets {
    temperature_edge: 8,
    temperature_hotspot: 10,
    temperature_mem: 12,
    temperature_vrgfx: 14,
    temperature_vrsoc: 16,
    temperature_vrmem: 18,
    average_socket_power: 26,
};

const REVISED_OFFSETS: VariantOffsets = VariantOffsets {
    temperature_edge: 0,
    temperature_hotspot: 2,
    temperature_mem: 4,
    temperature_vrgfx: 6,
    temperature_vrsoc: 8,
    temperature_vrmem: 10,
    average_socket_power: 18,
};

// Payload offsets shared by both layouts.
const AVERAGE_GFXCLK: usize = 36;
const AVERAGE_SOCCLK: usize = 38;
const AVERAGE_UCLK: usize = 40;
const CURRENT_GFXCLK: usize = 50;
const CURRENT_SOCCLK: usize = 52;
const THROTTLE_STATUS: usize = 64;
const CURRENT_FAN_SPEED: usize = 68;
const PCIE_LINK_WIDTH: usize = 70;
const PCIE_LINK_SPEED: usize = 72;

/// Smallest payload that holds every field.
pub const MIN_PAYLOAD_LEN: usize = PCIE_LINK_SPEED + 2;

/// Payload layout chosen by the content revision byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsLayout {
    /// Content revision 0.
    Base,
    /// Any non-zero content revision.
    Revised,
}

impl MetricsLayout {
    pub fn from_content_revision(content: u8) -> Self {
        if content == 0 {
            MetricsLayout::Base
        } else {
            MetricsLayout::Revised
        }
    }

    pub fn offsets(&self) -> &'static VariantOffsets {
        match self {
            MetricsLayout::Base => &BASE_OFFSETS,
            MetricsLayout::Revised => &REVISED_OFFSETS,
        }
    }
}

/// Folds a big-endian-ordered slice into an integer, reversing it first when
/// the data is little-endian.
pub fn fold_bytes(bytes: &[u8], order: ByteOrder) -> u64 {
    let fold = |value: u64, byte: &u8| (value << 8) | *byte as u64;
    match order {
        ByteOrder::LittleEndian => bytes.iter().rev().fold(0, fold),
        ByteOrder::BigEndian => bytes.iter().fold(0, fold),
    }
}

/// Decodes a `gpu_metrics` buffer in host byte order.
///
/// Returns `None` for a wrong format revision or a truncated buffer.
pub fn decode_gpu_metrics(buffer: &[u8]) -> Option<GpuMetrics> {
    decode_gpu_metrics_with_order(buffer, ByteOrder::native())
}

/// Decodes a `gpu_metrics` buffer in the given byte order.
pub fn decode_gpu_metrics_with_order(buffer: &[u8], order: ByteOrder) -> Option<GpuMetrics> {
    let format_revision = *buffer.get(2)?;
    if format_revision != FORMAT_REVISION {
        warn!(format_revision, "unsupported gpu_metrics format revision");
        return None;
    }

    let content_revision = *buffer.get(3)?;
    let payload = &buffer[HEADER_LEN..];
    if payload.len() < MIN_PAYLOAD_LEN {
        warn!(len = buffer.len(), "truncated gpu_metrics block");
        return None;
    }

    let u16_at = |offset: usize| fold_bytes(&payload[offset..offset + 2], order) as u16;
    let u32_at = |offset: usize| fold_bytes(&payload[offset..offset + 4], order) as u32;

    let variant = MetricsLayout::from_content_revision(content_revision).offsets();

    Some(GpuMetrics {
        temperature_edge: u16_at(variant.temperature_edge),
        temperature_hotspot: u16_at(variant.temperature_hotspot),
        temperature_mem: u16_at(variant.temperature_mem),
        temperature_vrgfx: u16_at(variant.temperature_vrgfx),
        temperature_vrsoc: u16_at(variant.temperature_vrsoc),
        temperature_vrmem: u16_at(variant.temperature_vrmem),
        average_socket_power: u16_at(variant.average_socket_power),
        average_gfxclk_frequency: u16_at(AVERAGE_GFXCLK),
        average_socclk_frequency: u16_at(AVERAGE_SOCCLK),
        average_uclk_frequency: u16_at(AVERAGE_UCLK),
        current_gfxclk: u16_at(CURRENT_GFXCLK),
        current_socclk: u16_at(CURRENT_SOCCLK),
        throttle_status: u32_at(THROTTLE_STATUS),
        current_fan_speed: u16_at(CURRENT_FAN_SPEED),
        pcie_link_width: u16_at(PCIE_LINK_WIDTH),
        pcie_link_speed: u16_at(PCIE_LINK_SPEED),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a little-endian block with distinct values in every field.
    pub(crate) fn sample_block(content_revision: u8) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_LEN + 120];
        let len = buf.len() as u16;
        buf[0..2].copy_from_slice(&len.to_le_bytes());
        buf[2] = FORMAT_REVISION;
        buf[3] = content_revision;

        let variant = MetricsLayout::from_content_revision(content_revision).offsets();
        let mut put16 = |offset: usize, value: u16| {
            buf[HEADER_LEN + offset..HEADER_LEN + offset + 2].copy_from_slice(&value.to_le_bytes());
        };
        put16(variant.temperature_edge, 4500);
        put16(variant.temperature_hotspot, 5200);
        put16(variant.temperature_mem, 6000);
        put16(variant.temperature_vrgfx, 4100);
        put16(variant.temperature_vrsoc, 4200);
        put16(variant.temperature_vrmem, 4300);
        put16(variant.average_socket_power, 35);
        put16(AVERAGE_GFXCLK, 2100);
        put16(AVERAGE_SOCCLK, 1200);
        put16(AVERAGE_UCLK, 875);
        put16(CURRENT_GFXCLK, 2250);
        put16(CURRENT_SOCCLK, 1250);
        put16(CURRENT_FAN_SPEED, 1650);
        put16(PCIE_LINK_WIDTH, 16);
        put16(PCIE_LINK_SPEED, 4);
        buf[HEADER_LEN + THROTTLE_STATUS..HEADER_LEN + THROTTLE_STATUS + 4]
            .copy_from_slice(&0x0001_0204u32.to_le_bytes());
        buf
    }

    fn assert_sample(metrics: &GpuMetrics) {
        assert_eq!(metrics.temperature_edge, 4500);
        assert_eq!(metrics.temperature_hotspot, 5200);
        assert_eq!(metrics.temperature_mem, 6000);
        assert_eq!(metrics.temperature_vrgfx, 4100);
        assert_eq!(metrics.temperature_vrsoc, 4200);
        assert_eq!(metrics.temperature_vrmem, 4300);
        assert_eq!(metrics.average_socket_power, 35);
        assert_eq!(metrics.average_gfxclk_frequency, 2100);
        assert_eq!(metrics.average_socclk_frequency, 1200);
        assert_eq!(metrics.average_uclk_frequency, 875);
        assert_eq!(metrics.current_gfxclk, 2250);
        assert_eq!(metrics.current_socclk, 1250);
        assert_eq!(metrics.throttle_status, 0x0001_0204);
        assert_eq!(metrics.current_fan_speed, 1650);
        assert_eq!(metrics.pcie_link_width, 16);
        assert_eq!(metrics.pcie_link_speed, 4);
    }

    #[test]
    fn test_fold_bytes() {
        assert_eq!(fold_bytes(&[0x12, 0x34], ByteOrder::BigEndian), 0x1234);
        assert_eq!(fold_bytes(&[0x12, 0x34], ByteOrder::LittleEndian), 0x3412);
        assert_eq!(
            fold_bytes(&[0x04, 0x02, 0x01, 0x00], ByteOrder::LittleEndian),
            0x0001_0204
        );
        assert_eq!(fold_bytes(&[], ByteOrder::BigEndian), 0);
    }

    #[test]
    fn test_decode_base_layout() {
        let metrics =
            decode_gpu_metrics_with_order(&sample_block(0), ByteOrder::LittleEndian).unwrap();
        assert_sample(&metrics);
    }

    #[test]
    fn test_decode_revised_layout() {
        let metrics =
            decode_gpu_metrics_with_order(&sample_block(1), ByteOrder::LittleEndian).unwrap();
        assert_sample(&metrics);
    }

    #[test]
    fn test_layouts_read_different_offsets() {
        // A base block read as revised picks up the wrong temperatures.
        let mut block = sample_block(0);
        block[3] = 2;
        let metrics = decode_gpu_metrics_with_order(&block, ByteOrder::LittleEndian).unwrap();
        assert_ne!(metrics.temperature_edge, 4500);
        assert_eq!(metrics.current_gfxclk, 2250);
    }

    #[test]
    fn test_rejects_wrong_format_revision() {
        for revision in [0u8, 2, 0xff] {
            let mut block = sample_block(1);
            block[2] = revision;
            assert_eq!(decode_gpu_metrics(&block), None);
        }
    }

    #[test]
    fn test_rejects_truncated_buffers() {
        assert_eq!(decode_gpu_metrics(&[]), None);
        assert_eq!(decode_gpu_metrics(&[0, 0, 1]), None);

        let block = sample_block(1);
        assert_eq!(decode_gpu_metrics(&block[..HEADER_LEN + MIN_PAYLOAD_LEN - 1]), None);
        assert!(decode_gpu_metrics(&block[..HEADER_LEN + MIN_PAYLOAD_LEN]).is_some());
    }

    #[test]
    fn test_native_order_matches_host() {
        let block = sample_block(1);
        let native = decode_gpu_metrics(&block).unwrap();
        if cfg!(target_endian = "little") {
            assert_sample(&native);
        } else {
            assert_eq!(native.temperature_edge, 4500u16.swap_bytes());
        }
    }
}
