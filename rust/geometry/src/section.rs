// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Section Decoder - one manifest section into vertices, faces and loops.

use crate::faces::{assemble_faces, Face, FaceEncoding};
use crate::{Error, Result};
use serde::Serialize;
use vxb_core::{
    read_f32x3, read_loop_attr, read_uv1_loop, read_uv_loop, BufferStore, FormatProfile, Manifest,
    SectionEntry, Uv1Quantization, LOOP_ATTR_STRIDE, POSITION_STRIDE,
};

/// Attributes of one (face, corner) pair.
///
/// UV0, UV1 and color live in one record so they cannot drift out of
/// alignment with each other.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LoopData {
    pub uv0: [f32; 2],
    /// `[0, 0]` when the contributing section has no UV1 channel
    pub uv1: [f32; 2],
    /// RGBA in 0..1
    pub color: [f32; 4],
}

/// A fully decoded section, ready for merging
#[derive(Debug, Clone)]
pub struct DecodedSection {
    /// Display name (mesh name, plus `_<n>` for multi-section meshes)
    pub name: String,
    pub vertices: Vec<[f32; 3]>,
    pub faces: Vec<Face>,
    /// Loop records in face-major, corner-minor order
    pub loops: Vec<LoopData>,
    pub has_uv1: bool,
    pub double_sided: bool,
    pub encoding: FaceEncoding,
}

impl DecodedSection {
    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }
}

/// Decodes sections against one loaded buffer set.
///
/// Holds only shared borrows, so a single decoder can be used from many
/// worker threads at once.
#[derive(Debug, Clone, Copy)]
pub struct SectionDecoder<'a> {
    buffers: &'a BufferStore,
    profile: FormatProfile,
    atlas_size: u32,
    uv1_quantization: &'a Uv1Quantization,
    colormap_mode: bool,
}

impl<'a> SectionDecoder<'a> {
    pub fn new(buffers: &'a BufferStore, manifest: &'a Manifest, profile: FormatProfile) -> Self {
        Self {
            buffers,
            profile,
            atlas_size: manifest.atlas_size,
            uv1_quantization: &manifest.uv1_quantization,
            colormap_mode: manifest.colormap_mode(),
        }
    }

    pub fn profile(&self) -> FormatProfile {
        self.profile
    }

    pub fn decode(&self, entry: &SectionEntry<'_>) -> Result<DecodedSection> {
        let info = &entry.info;
        let views = &info.views;
        let name = entry.name.as_str();
        let ctx = |e| Error::decode(name, e);

        let vertex_count = info.vertex_count as usize;
        let vertices: Vec<[f32; 3]> = self
            .buffers
            .view(&views.position, vertex_count, POSITION_STRIDE)
            .and_then(|bytes| read_f32x3(bytes, vertex_count))
            .map_err(ctx)?
            .into_iter()
            .map(|p| self.profile.orient(p))
            .collect();

        let assembled = assemble_faces(self.buffers, info, name)?;
        let loop_count = assembled.loop_count;
        let uv_stride = self.profile.uv_encoding().stride();

        let uv0 = self
            .buffers
            .view(&views.uv, loop_count, uv_stride)
            .and_then(|bytes| read_uv_loop(bytes, loop_count, self.profile, self.atlas_size, false))
            .map_err(ctx)?;
        // Readers return exactly `loop_count` records or fail; the check that
        // can fire on real data is the one in `MeshBucket::absorb`.
        Error::ensure_aligned(name, "UV0", loop_count, uv0.len())?;

        let uv1 = match &views.uv1 {
            Some(view) => {
                let uv1 = self
                    .buffers
                    .view(view, loop_count, uv_stride)
                    .and_then(|bytes| {
                        read_uv1_loop(
                            bytes,
                            loop_count,
                            self.profile,
                            self.atlas_size,
                            self.uv1_quantization,
                            self.colormap_mode,
                        )
                    })
                    .map_err(ctx)?;
                Error::ensure_aligned(name, "UV1", loop_count, uv1.len())?;
                Some(uv1)
            }
            None => None,
        };

        let attributes = self
            .buffers
            .view(&views.loop_attr, loop_count, LOOP_ATTR_STRIDE)
            .and_then(|bytes| read_loop_attr(bytes, loop_count))
            .map_err(ctx)?;
        Error::ensure_aligned(name, "color", loop_count, attributes.len())?;

        let loops = uv0
            .iter()
            .zip(&attributes)
            .enumerate()
            .map(|(i, (&uv0, attr))| LoopData {
                uv0,
                uv1: uv1.as_ref().map_or([0.0, 0.0], |uv1| uv1[i]),
                color: attr.color,
            })
            .collect();

        tracing::debug!(
            section = name,
            vertices = vertices.len(),
            faces = assembled.faces.len(),
            loops = loop_count,
            encoding = ?assembled.encoding,
            has_uv1 = uv1.is_some(),
            "Decoded section"
        );

        Ok(DecodedSection {
            name: entry.name.clone(),
            vertices,
            faces: assembled.faces,
            loops,
            has_uv1: uv1.is_some(),
            double_sided: info.double_sided,
            encoding: assembled.encoding,
        })
    }
}
