// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Filter & Merge Engine
//!
//! Exporters split one logical object into many per-chunk sections
//! (`"grass__0"`, `"grass__1"`, `"dirt_2"`, ...). The engine folds them into
//! one bucket per merge key and drops faces that would only confuse a host
//! mesh builder:
//!
//! - **transparent**: every corner has alpha exactly `0.0`
//! - **degenerate**: the face repeats a vertex index
//!
//! Vertices are appended to a bucket unconditionally and only faces are
//! filtered, so a section's indices are renumbered with a single running
//! offset. Vertices referenced only by dropped faces stay in the bucket.

use crate::faces::Face;
use crate::mesh::ImportedMesh;
use crate::section::{DecodedSection, LoopData};
use crate::{Error, Result};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Separator the exporter places between an object name and its chunk id
pub const CHUNK_SEPARATOR: &str = "__";

/// Canonical object name for a section display name.
///
/// Cuts at the first [`CHUNK_SEPARATOR`], then strips every trailing
/// `_<digits>` or `<digits>` group: `"rock__3"`, `"rock_3"`, `"rock3"` and
/// `"rock_1_2"` all become `"rock"`. Only ASCII digits count as a suffix.
pub fn merge_key(name: &str) -> &str {
    let mut key = match name.find(CHUNK_SEPARATOR) {
        Some(at) => &name[..at],
        None => name,
    };
    loop {
        let stripped = key.trim_end_matches(|c: char| c.is_ascii_digit());
        if stripped.len() == key.len() {
            return key;
        }
        key = stripped.strip_suffix('_').unwrap_or(stripped);
    }
}

/// Why a face was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceClass {
    Keep,
    Transparent,
    Degenerate,
}

/// Classify one face from its indices and its loop records.
/// Transparency is checked first, so a transparent face is never also
/// counted as degenerate.
pub fn classify_face(face: &[u32], loops: &[LoopData]) -> FaceClass {
    if loops.iter().all(|l| l.color[3] == 0.0) {
        FaceClass::Transparent
    } else if has_duplicate_indices(face) {
        FaceClass::Degenerate
    } else {
        FaceClass::Keep
    }
}

#[inline]
fn has_duplicate_indices(face: &[u32]) -> bool {
    face.iter()
        .enumerate()
        .any(|(i, index)| face[i + 1..].contains(index))
}

/// Session-wide counts of dropped faces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterStats {
    pub transparent_faces: usize,
    pub degenerate_faces: usize,
}

impl FilterStats {
    pub fn total(&self) -> usize {
        self.transparent_faces + self.degenerate_faces
    }
}

/// Mutable accumulator for one merge key
#[derive(Debug, Default)]
pub struct MeshBucket {
    name: String,
    vertices: Vec<[f32; 3]>,
    faces: Vec<Face>,
    loops: Vec<LoopData>,
    has_uv1: bool,
    double_sided: bool,
    sections: usize,
}

impl MeshBucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of sections merged so far
    pub fn section_count(&self) -> usize {
        self.sections
    }

    /// Append a section, filtering its faces into `stats`
    fn absorb(&mut self, section: DecodedSection, stats: &mut FilterStats) -> Result<()> {
        // Loop alignment is enforced here for every section entering a bucket
        let corners: usize = section.faces.iter().map(|f| f.len()).sum();
        Error::ensure_aligned(&section.name, "loops", corners, section.loops.len())?;

        let base = self.vertices.len();
        let section_vertices = section.vertices.len();
        if base + section_vertices > u32::MAX as usize {
            return Err(Error::malformed(
                &section.name,
                format!(
                    "bucket '{}' would exceed the u32 index range with {} vertices",
                    self.name,
                    base + section_vertices
                ),
            ));
        }
        let base = base as u32;
        self.vertices.extend(section.vertices);
        self.has_uv1 |= section.has_uv1;
        self.double_sided |= section.double_sided;
        self.sections += 1;

        let mut cursor = 0;
        for face in &section.faces {
            let face_loops = &section.loops[cursor..cursor + face.len()];
            cursor += face.len();

            match classify_face(face, face_loops) {
                FaceClass::Transparent => stats.transparent_faces += 1,
                FaceClass::Degenerate => stats.degenerate_faces += 1,
                FaceClass::Keep => {
                    if let Some(&bad) = face.iter().find(|&&i| i as usize >= section_vertices) {
                        return Err(Error::malformed(
                            &section.name,
                            format!(
                                "index {} out of range for {} vertices",
                                bad, section_vertices
                            ),
                        ));
                    }
                    self.faces.push(face.iter().map(|&i| i + base).collect());
                    self.loops.extend_from_slice(face_loops);
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<ImportedMesh> {
        let mesh = ImportedMesh {
            name: self.name,
            vertices: self.vertices,
            faces: self.faces,
            loops: self.loops,
            has_uv1: self.has_uv1,
            double_sided: self.double_sided,
        };
        mesh.validate()?;
        Ok(mesh)
    }
}

/// Buckets keyed by merge key, kept in first-seen order
#[derive(Debug, Default)]
pub struct MergeEngine {
    index: FxHashMap<String, usize>,
    buckets: Vec<MeshBucket>,
    stats: FilterStats,
}

impl MergeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a decoded section into the bucket for its merge key
    pub fn merge(&mut self, section: DecodedSection) -> Result<()> {
        let key = merge_key(&section.name);
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => {
                let slot = self.buckets.len();
                self.index.insert(key.to_string(), slot);
                self.buckets.push(MeshBucket::new(key));
                slot
            }
        };
        let bucket = &mut self.buckets[slot];
        let before = self.stats;
        bucket.absorb(section, &mut self.stats)?;

        tracing::trace!(
            bucket = bucket.name(),
            vertices = bucket.vertex_count(),
            faces = bucket.face_count(),
            transparent = self.stats.transparent_faces - before.transparent_faces,
            degenerate = self.stats.degenerate_faces - before.degenerate_faces,
            "Merged section"
        );
        Ok(())
    }

    pub fn stats(&self) -> FilterStats {
        self.stats
    }

    pub fn bucket(&self, key: &str) -> Option<&MeshBucket> {
        self.index.get(key).map(|&slot| &self.buckets[slot])
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Finalize every bucket in first-seen order
    pub fn finish(self) -> Result<(Vec<ImportedMesh>, FilterStats)> {
        let meshes = self
            .buckets
            .into_iter()
            .map(MeshBucket::finish)
            .collect::<Result<Vec<_>>>()?;
        Ok((meshes, self.stats))
    }
}
