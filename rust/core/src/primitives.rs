// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Primitive Decoder
//!
//! Stateless readers for the fixed-size little-endian records found in VXB
//! buffers. Every reader decodes exactly `count` records from the start of
//! the view and fails with [`Error::TruncatedBuffer`] when the view is too
//! short.

use crate::error::{Error, Result};
use crate::manifest::Uv1Quantization;
use crate::profile::{FormatProfile, UvEncoding};

/// Bytes per position record (`f32 x 3`)
pub const POSITION_STRIDE: usize = 12;
/// Bytes per `u32` index
pub const U32_STRIDE: usize = 4;
/// Bytes per `u16` face corner count
pub const U16_STRIDE: usize = 2;
/// Bytes per loop attribute record (`f32 x 3` normal + `u8 x 4` color)
pub const LOOP_ATTR_STRIDE: usize = 16;

/// Largest value of a unorm16 coordinate
const UNORM16_MAX: f32 = 65535.0;

/// Per-loop normal and color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopAttribute {
    /// Exported normal; kept for completeness, the importer does not use it
    pub normal: [f32; 3],
    /// RGBA in 0..1
    pub color: [f32; 4],
}

/// Validate the view length and return exactly the bytes of `count` records
#[inline]
fn records<'a>(
    view: &'a [u8],
    count: usize,
    stride: usize,
    what: &'static str,
) -> Result<&'a [u8]> {
    let truncated = |needed| Error::TruncatedBuffer {
        what,
        count,
        needed,
        available: view.len(),
    };
    let needed = count
        .checked_mul(stride)
        .ok_or_else(|| truncated(usize::MAX))?;
    view.get(..needed).ok_or_else(|| truncated(needed))
}

#[inline(always)]
fn f32_at(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[inline(always)]
fn u16_at(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

/// Decode `count` float triples
pub fn read_f32x3(view: &[u8], count: usize) -> Result<Vec<[f32; 3]>> {
    let bytes = records(view, count, POSITION_STRIDE, "f32x3")?;
    Ok(bytes
        .chunks_exact(POSITION_STRIDE)
        .map(|r| [f32_at(r, 0), f32_at(r, 4), f32_at(r, 8)])
        .collect())
}

/// Decode `count` u32 values
pub fn read_u32(view: &[u8], count: usize) -> Result<Vec<u32>> {
    let bytes = records(view, count, U32_STRIDE, "u32")?;
    Ok(bytes
        .chunks_exact(U32_STRIDE)
        .map(|r| u32::from_le_bytes([r[0], r[1], r[2], r[3]]))
        .collect())
}

/// Decode `count` u16 values
pub fn read_u16(view: &[u8], count: usize) -> Result<Vec<u16>> {
    let bytes = records(view, count, U16_STRIDE, "u16")?;
    Ok(bytes.chunks_exact(U16_STRIDE).map(|r| u16_at(r, 0)).collect())
}

/// Decode `count` loop attribute records
pub fn read_loop_attr(view: &[u8], count: usize) -> Result<Vec<LoopAttribute>> {
    let bytes = records(view, count, LOOP_ATTR_STRIDE, "loop attribute")?;
    Ok(bytes
        .chunks_exact(LOOP_ATTR_STRIDE)
        .map(|r| LoopAttribute {
            normal: [f32_at(r, 0), f32_at(r, 4), f32_at(r, 8)],
            color: [
                r[12] as f32 / 255.0,
                r[13] as f32 / 255.0,
                r[14] as f32 / 255.0,
                r[15] as f32 / 255.0,
            ],
        })
        .collect())
}

/// Decode `count` UV0 loop records.
///
/// Float records are divided by the atlas size unless `normalized`; unorm16
/// records are divided by 65535 when `normalized`, by the atlas size
/// otherwise.
pub fn read_uv_loop(
    view: &[u8],
    count: usize,
    profile: FormatProfile,
    atlas_size: u32,
    normalized: bool,
) -> Result<Vec<[f32; 2]>> {
    let encoding = profile.uv_encoding();
    let stride = encoding.stride();
    let bytes = records(view, count, stride, "UV")?;
    let atlas = atlas_size as f32;

    Ok(match encoding {
        UvEncoding::Float32 => bytes
            .chunks_exact(stride)
            .map(|r| {
                let (u, v) = (f32_at(r, 0), f32_at(r, 4));
                if normalized {
                    [u, v]
                } else {
                    [u / atlas, v / atlas]
                }
            })
            .collect(),
        UvEncoding::Unorm16 => {
            let scale = if normalized { UNORM16_MAX } else { atlas };
            bytes
                .chunks_exact(stride)
                .map(|r| [u16_at(r, 0) as f32 / scale, u16_at(r, 2) as f32 / scale])
                .collect()
        }
    })
}

/// Decode `count` UV1 loop records.
///
/// Float records carry a packed tile index after the coordinates. In
/// colormap mode it selects a tile of a 10-wide grid: `u += packed % 10`,
/// `v -= packed / 10`. The subtraction on V matches the exporter's tile
/// origin and must not be "fixed".
pub fn read_uv1_loop(
    view: &[u8],
    count: usize,
    profile: FormatProfile,
    atlas_size: u32,
    quantization: &Uv1Quantization,
    colormap_mode: bool,
) -> Result<Vec<[f32; 2]>> {
    let encoding = profile.uv_encoding();
    let stride = encoding.stride();
    let bytes = records(view, count, stride, "UV1")?;
    let atlas = atlas_size as f32;

    Ok(match encoding {
        UvEncoding::Float32 => {
            let atlas_space = matches!(quantization, Uv1Quantization::AtlasF32);
            bytes
                .chunks_exact(stride)
                .map(|r| {
                    let (mut u, mut v) = (f32_at(r, 0), f32_at(r, 4));
                    if atlas_space {
                        u /= atlas;
                        v /= atlas;
                    }
                    if colormap_mode {
                        let packed = u16_at(r, 8);
                        u += (packed % 10) as f32;
                        v -= (packed / 10) as f32;
                    }
                    [u, v]
                })
                .collect()
        }
        UvEncoding::Unorm16 => {
            let scale = if quantization.is_atlas_space() {
                atlas
            } else {
                UNORM16_MAX
            };
            bytes
                .chunks_exact(stride)
                .map(|r| [u16_at(r, 0) as f32 / scale, u16_at(r, 2) as f32 / scale])
                .collect()
        }
    })
}
