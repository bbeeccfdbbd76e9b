// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! VXB import pipeline shared by hosts.
//!
//! ```rust,ignore
//! use vxb_processing::{import_vxb, ImportConfig};
//!
//! let result = import_vxb("scene.vxb".as_ref(), &ImportConfig::from_env())?;
//! let mut meshes = Vec::new();
//! let summary = result.emit_into(&mut meshes);
//! ```

pub mod config;
pub mod emitter;
pub mod error;
pub mod pipeline;

pub use config::ImportConfig;
pub use emitter::MeshEmitter;
pub use error::{Error, Result};
pub use pipeline::{import_into, import_loaded, import_vxb, ImportResult, ImportSummary};

pub use vxb_core::FormatProfile;
pub use vxb_geometry::{FilterStats, ImportedMesh};
