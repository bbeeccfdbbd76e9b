// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Finalized mesh records handed to the emitter

use crate::faces::Face;
use crate::section::LoopData;
use crate::{Error, Result};
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// One merged mesh, immutable once produced by the merge engine.
///
/// Vertex indices in `faces` address `vertices`; `loops` holds one record per
/// face corner in face order.
#[derive(Debug, Clone, Default)]
pub struct ImportedMesh {
    /// Merge key shared by every contributing section
    pub name: String,
    pub vertices: Vec<[f32; 3]>,
    pub faces: Vec<Face>,
    pub loops: Vec<LoopData>,
    /// Any contributing section declared a UV1 channel
    pub has_uv1: bool,
    pub double_sided: bool,
}

impl ImportedMesh {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Loop-ordered UV0 coordinates
    pub fn uv0(&self) -> Vec<[f32; 2]> {
        self.loops.iter().map(|l| l.uv0).collect()
    }

    /// Loop-ordered UV1 coordinates, present iff `has_uv1`
    pub fn uv1(&self) -> Option<Vec<[f32; 2]>> {
        self.has_uv1
            .then(|| self.loops.iter().map(|l| l.uv1).collect())
    }

    /// Loop-ordered RGBA colors in 0..1
    pub fn colors(&self) -> Vec<[f32; 4]> {
        self.loops.iter().map(|l| l.color).collect()
    }

    /// Check the loop and index invariants
    pub fn validate(&self) -> Result<()> {
        let corners: usize = self.faces.iter().map(|f| f.len()).sum();
        Error::ensure_aligned(&self.name, "loops", corners, self.loops.len())?;

        let vertex_count = self.vertices.len();
        if let Some(bad) = self
            .faces
            .iter()
            .flatten()
            .find(|&&i| i as usize >= vertex_count)
        {
            return Err(Error::malformed(
                &self.name,
                format!("index {} out of range for {} vertices", bad, vertex_count),
            ));
        }
        Ok(())
    }

    /// Drop vertices that no face references and renumber the faces.
    /// Loop data is per corner and is not affected. Returns the number of
    /// vertices removed.
    pub fn compact_vertices(&mut self) -> usize {
        const UNUSED: u32 = u32::MAX;

        let mut remap = vec![UNUSED; self.vertices.len()];
        let mut kept = Vec::with_capacity(self.vertices.len());
        for face in &mut self.faces {
            for index in face.iter_mut() {
                let slot = &mut remap[*index as usize];
                if *slot == UNUSED {
                    *slot = kept.len() as u32;
                    kept.push(self.vertices[*index as usize]);
                }
                *index = *slot;
            }
        }

        let removed = self.vertices.len() - kept.len();
        self.vertices = kept;
        removed
    }
}

/// Serializes to the emitter boundary shape:
/// `{name, vertices, faces, uv0, uv1?, colors, doubleSided}`
impl Serialize for ImportedMesh {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let faces: Vec<&[u32]> = self.faces.iter().map(|f| f.as_slice()).collect();
        let mut state = serializer.serialize_struct("ImportedMesh", 7)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("vertices", &self.vertices)?;
        state.serialize_field("faces", &faces)?;
        state.serialize_field("uv0", &self.uv0())?;
        state.serialize_field("uv1", &self.uv1())?;
        state.serialize_field("colors", &self.colors())?;
        state.serialize_field("doubleSided", &self.double_sided)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_with_orphans() -> ImportedMesh {
        let loop_data = |a: f32| LoopData {
            uv0: [a, a],
            uv1: [0.0, 0.0],
            color: [1.0, 1.0, 1.0, 1.0],
        };
        ImportedMesh {
            name: "grass".into(),
            vertices: vec![
                [9.0, 9.0, 9.0],
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [8.0, 8.0, 8.0],
                [1.0, 1.0, 0.0],
            ],
            faces: vec![Face::from_slice(&[1, 2, 4])],
            loops: vec![loop_data(0.0), loop_data(0.5), loop_data(1.0)],
            has_uv1: false,
            double_sided: false,
        }
    }

    #[test]
    fn test_compact_vertices() {
        let mut mesh = quad_with_orphans();
        assert_eq!(mesh.compact_vertices(), 2);
        assert_eq!(mesh.vertices, vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]);
        assert_eq!(mesh.faces[0].as_slice(), &[0, 1, 2]);
        assert_eq!(mesh.loop_count(), 3);
        mesh.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let mut mesh = quad_with_orphans();
        mesh.faces[0][2] = 5;
        assert!(matches!(
            mesh.validate(),
            Err(Error::MalformedIndexStream { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_loop_mismatch() {
        let mut mesh = quad_with_orphans();
        mesh.loops.pop();
        assert!(matches!(mesh.validate(), Err(Error::LoopAlignment { .. })));
    }

    #[test]
    fn test_attribute_views() {
        let mut mesh = quad_with_orphans();
        assert!(mesh.uv1().is_none());
        assert_eq!(mesh.uv0()[1], [0.5, 0.5]);
        assert_eq!(mesh.colors().len(), 3);
        mesh.has_uv1 = true;
        assert_eq!(mesh.uv1().map(|uv| uv.len()), Some(3));
    }

    #[test]
    fn test_serialize_shape() {
        let json = serde_json::to_value(quad_with_orphans()).unwrap();
        assert_eq!(json["name"], "grass");
        assert_eq!(json["faces"], serde_json::json!([[1, 2, 4]]));
        assert!(json["uv1"].is_null());
        assert_eq!(json["colors"].as_array().map(|c| c.len()), Some(3));
        assert_eq!(json["doubleSided"], false);
    }
}
