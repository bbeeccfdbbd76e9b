// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host boundary for finalized meshes

use vxb_geometry::ImportedMesh;

/// Receives finalized meshes, one call per merge key, in first-seen order.
pub trait MeshEmitter {
    fn emit(&mut self, mesh: ImportedMesh);
}

impl MeshEmitter for Vec<ImportedMesh> {
    fn emit(&mut self, mesh: ImportedMesh) {
        self.push(mesh);
    }
}

impl<E: MeshEmitter + ?Sized> MeshEmitter for &mut E {
    fn emit(&mut self, mesh: ImportedMesh) {
        (**self).emit(mesh);
    }
}
