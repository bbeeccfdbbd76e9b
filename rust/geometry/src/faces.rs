// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face Assembler - rebuilds polygon index lists from a section's views.
//!
//! Two encodings exist:
//! - **Polygon**: `FACE_COUNT` (u16 corners per face) + `FACE_INDEX` (flat
//!   u32 corner indices). Preferred whenever both views are declared and both
//!   counts are positive.
//! - **Triangle**: the `INDEX` view read as consecutive u32 triples.
//!
//! Faces come out in stream order, which is also the loop order every per-loop
//! attribute array is aligned to.

use crate::{Error, Result};
use smallvec::SmallVec;
use vxb_core::{read_u16, read_u32, BufferStore, SectionInfo, U16_STRIDE, U32_STRIDE};

/// Vertex indices of one face, in corner order
pub type Face = SmallVec<[u32; 4]>;

/// Which encoding a section's faces were read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceEncoding {
    Polygon,
    Triangle,
}

/// Faces of one section
#[derive(Debug, Clone)]
pub struct AssembledFaces {
    pub faces: Vec<Face>,
    pub encoding: FaceEncoding,
    /// Total corners over all faces
    pub loop_count: usize,
}

/// Decode the faces of `info`, choosing the encoding from its views.
/// Every index is checked against the section's vertex count.
pub fn assemble_faces(
    buffers: &BufferStore,
    info: &SectionInfo,
    section: &str,
) -> Result<AssembledFaces> {
    let views = &info.views;
    let ctx = |e| Error::decode(section, e);

    let (faces, encoding) = match (&views.face_count, &views.face_index) {
        (Some(count_view), Some(index_view))
            if info.face_count > 0 && info.face_index_count > 0 =>
        {
            let face_count = info.face_count as usize;
            let index_count = info.face_index_count as usize;
            let counts = buffers
                .view(count_view, face_count, U16_STRIDE)
                .and_then(|bytes| read_u16(bytes, face_count))
                .map_err(ctx)?;
            let indices = buffers
                .view(index_view, index_count, U32_STRIDE)
                .and_then(|bytes| read_u32(bytes, index_count))
                .map_err(ctx)?;
            (partition_polygons(&counts, &indices, section)?, FaceEncoding::Polygon)
        }
        _ => {
            let index_count = info.index_count as usize;
            let indices = buffers
                .view(&views.index, index_count, U32_STRIDE)
                .and_then(|bytes| read_u32(bytes, index_count))
                .map_err(ctx)?;
            (partition_triangles(&indices, section)?, FaceEncoding::Triangle)
        }
    };

    check_index_range(&faces, info.vertex_count, section)?;
    let loop_count = faces.iter().map(|f| f.len()).sum();

    Ok(AssembledFaces {
        faces,
        encoding,
        loop_count,
    })
}

/// Split a flat index stream into faces using per-face corner counts as
/// consecutive run lengths.
pub fn partition_polygons(counts: &[u16], indices: &[u32], section: &str) -> Result<Vec<Face>> {
    let total: usize = counts.iter().map(|&c| c as usize).sum();
    if total != indices.len() {
        return Err(Error::malformed(
            section,
            format!(
                "face corner counts sum to {} but {} face indices were declared",
                total,
                indices.len()
            ),
        ));
    }

    let mut faces = Vec::with_capacity(counts.len());
    let mut cursor = 0;
    for (face_index, &corners) in counts.iter().enumerate() {
        let corners = corners as usize;
        if corners < 3 {
            return Err(Error::malformed(
                section,
                format!("face {} has {} corners, at least 3 required", face_index, corners),
            ));
        }
        faces.push(Face::from_slice(&indices[cursor..cursor + corners]));
        cursor += corners;
    }
    Ok(faces)
}

/// Split a flat index stream into triangles
pub fn partition_triangles(indices: &[u32], section: &str) -> Result<Vec<Face>> {
    if indices.len() % 3 != 0 {
        return Err(Error::malformed(
            section,
            format!("triangle index count {} is not a multiple of 3", indices.len()),
        ));
    }
    Ok(indices.chunks_exact(3).map(Face::from_slice).collect())
}

fn check_index_range(faces: &[Face], vertex_count: u32, section: &str) -> Result<()> {
    for (face_index, face) in faces.iter().enumerate() {
        if let Some(&bad) = face.iter().find(|&&i| i >= vertex_count) {
            return Err(Error::malformed(
                section,
                format!(
                    "face {} references vertex {} but the section has {} vertices",
                    face_index, bad, vertex_count
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vxb_core::{Buffer, SectionViews, ViewRef};

    fn view(offset: u64) -> ViewRef {
        ViewRef {
            buffer: "bin".into(),
            offset,
        }
    }

    fn le_bytes_u32(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn section(
        vertex_count: u32,
        index_count: u32,
        face_count: u32,
        face_index_count: u32,
        polygon_views: bool,
    ) -> SectionInfo {
        SectionInfo {
            vertex_count,
            face_count,
            face_index_count,
            index_count,
            double_sided: false,
            views: SectionViews {
                position: view(0),
                index: view(0),
                uv: view(0),
                uv1: None,
                loop_attr: view(0),
                face_count: polygon_views.then(|| view(64)),
                face_index: polygon_views.then(|| view(128)),
            },
        }
    }

    fn store(bytes: Vec<u8>) -> BufferStore {
        let mut store = BufferStore::new();
        store.insert(Buffer::from_bytes("bin", bytes));
        store
    }

    fn polygon_store(counts: &[u16], indices: &[u32]) -> BufferStore {
        let mut bytes = le_bytes_u32(&[0, 1, 2, 2, 1, 3]);
        bytes.resize(64, 0);
        bytes.extend(counts.iter().flat_map(|c| c.to_le_bytes()));
        bytes.resize(128, 0);
        bytes.extend(le_bytes_u32(indices));
        store(bytes)
    }

    #[test]
    fn test_triangle_stream() {
        let buffers = store(le_bytes_u32(&[0, 1, 2, 2, 1, 3]));
        let info = section(4, 6, 0, 0, false);
        let assembled = assemble_faces(&buffers, &info, "s").unwrap();
        assert_eq!(assembled.encoding, FaceEncoding::Triangle);
        assert_eq!(assembled.loop_count, 6);
        assert_eq!(assembled.faces.len(), 2);
        assert!(assembled.faces.iter().all(|f| f.len() == 3));
        assert_eq!(assembled.faces[1].as_slice(), &[2, 1, 3]);
    }

    #[test]
    fn test_polygon_stream() {
        let buffers = polygon_store(&[4, 3], &[0, 1, 2, 3, 3, 2, 4]);
        let info = section(5, 6, 2, 7, true);
        let assembled = assemble_faces(&buffers, &info, "s").unwrap();
        assert_eq!(assembled.encoding, FaceEncoding::Polygon);
        assert_eq!(assembled.faces.len(), info.face_count as usize);
        assert_eq!(assembled.loop_count, info.face_index_count as usize);
        assert_eq!(assembled.faces[0].as_slice(), &[0, 1, 2, 3]);
        assert_eq!(assembled.faces[1].as_slice(), &[3, 2, 4]);
    }

    #[test]
    fn test_polygon_views_with_zero_counts_fall_back() {
        let buffers = polygon_store(&[], &[]);
        let info = section(4, 6, 0, 0, true);
        let assembled = assemble_faces(&buffers, &info, "s").unwrap();
        assert_eq!(assembled.encoding, FaceEncoding::Triangle);
        assert_eq!(assembled.faces.len(), 2);
    }

    #[test]
    fn test_partial_triangle_is_malformed() {
        let err = partition_triangles(&[0, 1, 2, 3], "rock").unwrap_err();
        match err {
            Error::MalformedIndexStream { section, .. } => assert_eq!(section, "rock"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_polygon_count_mismatch() {
        assert!(matches!(
            partition_polygons(&[3, 3], &[0, 1, 2, 0, 1], "s"),
            Err(Error::MalformedIndexStream { .. })
        ));
        assert!(matches!(
            partition_polygons(&[2, 3], &[0, 1, 0, 1, 2], "s"),
            Err(Error::MalformedIndexStream { .. })
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let buffers = store(le_bytes_u32(&[0, 1, 4]));
        let info = section(4, 3, 0, 0, false);
        assert!(matches!(
            assemble_faces(&buffers, &info, "s"),
            Err(Error::MalformedIndexStream { .. })
        ));
    }

    #[test]
    fn test_truncated_index_view() {
        let buffers = store(le_bytes_u32(&[0, 1, 2]));
        let info = section(4, 6, 0, 0, false);
        match assemble_faces(&buffers, &info, "leaves") {
            Err(Error::Decode { section, source }) => {
                assert_eq!(section, "leaves");
                assert!(matches!(source, vxb_core::Error::BufferRange { .. }));
            }
            other => panic!("expected Decode error, got {:?}", other),
        }
    }
}
