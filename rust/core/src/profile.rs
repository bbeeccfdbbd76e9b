// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary format profiles
//!
//! Two generations of VXB writers exist. They disagree on the width of the
//! per-loop UV records and on whether positions are stored Y-up or Z-up, so
//! one profile is chosen per import session and every decoder dispatches on
//! it instead of carrying its own flags.

use std::fmt;
use std::str::FromStr;

/// Record layout of the `UV_LOOP` / `UV1_LOOP` views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvEncoding {
    /// 12 bytes: `u: f32, v: f32, packed: u16, pad: u16`
    Float32,
    /// 8 bytes: `u: u16, v: u16, aux: u16, pad: u16`
    Unorm16,
}

impl UvEncoding {
    /// Size of one loop record in bytes
    #[inline]
    pub const fn stride(self) -> usize {
        match self {
            UvEncoding::Float32 => 12,
            UvEncoding::Unorm16 => 8,
        }
    }
}

/// Format profile selected once per decode session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatProfile {
    /// Float UV records with a trailing packed tile index; positions are
    /// rotated from the exporter's Y-up space into Z-up.
    #[default]
    Float32Tiled,
    /// Quantized u16 UV records; positions are used as stored.
    Quantized16,
}

impl FormatProfile {
    #[inline]
    pub const fn uv_encoding(self) -> UvEncoding {
        match self {
            FormatProfile::Float32Tiled => UvEncoding::Float32,
            FormatProfile::Quantized16 => UvEncoding::Unorm16,
        }
    }

    /// Whether positions are remapped with `(x, y, z) -> (x, -z, y)`
    #[inline]
    pub const fn rotates_axes(self) -> bool {
        matches!(self, FormatProfile::Float32Tiled)
    }

    /// Apply the profile's axis rotation to one position
    #[inline]
    pub fn orient(self, [x, y, z]: [f32; 3]) -> [f32; 3] {
        if self.rotates_axes() {
            [x, -z, y]
        } else {
            [x, y, z]
        }
    }
}

impl fmt::Display for FormatProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatProfile::Float32Tiled => f.write_str("float32"),
            FormatProfile::Quantized16 => f.write_str("quantized16"),
        }
    }
}

impl FromStr for FormatProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float32" | "float32_tiled" | "legacy" => Ok(FormatProfile::Float32Tiled),
            "quantized16" | "u16" | "compact" => Ok(FormatProfile::Quantized16),
            other => Err(format!("unknown format profile '{}'", other)),
        }
    }
}
