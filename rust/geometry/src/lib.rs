// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! VXB Geometry
//!
//! Turns manifest sections into merged polygon meshes: faces are rebuilt from
//! either index encoding, per-loop attributes are decoded in lockstep with
//! them, and sections sharing a merge key are concatenated with their
//! indices renumbered.

pub mod error;
pub mod faces;
pub mod merge;
pub mod mesh;
pub mod section;

pub use error::{Error, Result};
pub use faces::{
    assemble_faces, partition_polygons, partition_triangles, AssembledFaces, Face, FaceEncoding,
};
pub use merge::{
    classify_face, merge_key, FaceClass, FilterStats, MergeEngine, MeshBucket, CHUNK_SEPARATOR,
};
pub use mesh::ImportedMesh;
pub use section::{DecodedSection, LoopData, SectionDecoder};
