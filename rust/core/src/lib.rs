// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # VXB Core
//!
//! Reading side of the VXB mesh interchange format: a JSON manifest plus
//! flat little-endian binary buffers.
//!
//! ## Overview
//!
//! - **Manifest**: serde model of the `.vxb` document, including the legacy
//!   flat-mesh layout
//! - **Buffer Store**: memory-mapped, read-only buffers with zero-copy views
//! - **Primitive Decoder**: positions, indices, loop attributes and the two
//!   UV record encodings
//! - **Format Profile**: the per-session choice between the float and the
//!   quantized writer generations
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vxb_core::{manifest_dir, BufferStore, FormatProfile, Manifest};
//!
//! let path = std::path::Path::new("export/scene.vxb");
//! let manifest = Manifest::load(path)?;
//! let buffers = BufferStore::load(&manifest, &manifest_dir(path))?;
//!
//! for entry in manifest.sections()? {
//!     let view = &entry.info.views.position;
//!     let bytes = buffers.view(view, entry.info.vertex_count as usize, 12)?;
//!     let positions = vxb_core::read_f32x3(bytes, entry.info.vertex_count as usize)?;
//!     println!("{}: {} vertices", entry.name, positions.len());
//! }
//! ```

pub mod buffer;
pub mod error;
pub mod manifest;
pub mod primitives;
pub mod profile;

pub use buffer::{Buffer, BufferStore};
pub use error::{Error, Result};
pub use manifest::{
    manifest_dir, BufferDecl, ColorMode, Manifest, MeshInfo, SectionEntry, SectionInfo,
    SectionViews, Uv1Quantization, ViewRef, DEFAULT_ATLAS_SIZE,
};
pub use primitives::{
    read_f32x3, read_loop_attr, read_u16, read_u32, read_uv1_loop, read_uv_loop, LoopAttribute,
    LOOP_ATTR_STRIDE, POSITION_STRIDE, U16_STRIDE, U32_STRIDE,
};
pub use profile::{FormatProfile, UvEncoding};
