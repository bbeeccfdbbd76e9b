// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Import failures. Any error aborts the whole import; nothing is emitted.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] vxb_core::Error),

    #[error(transparent)]
    Geometry(#[from] vxb_geometry::Error),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// The selected file is not a usable manifest (wrong file, bad JSON,
    /// missing required fields), as opposed to a fault in the binary data.
    pub fn is_manifest_error(&self) -> bool {
        match self {
            Error::Core(e) => e.is_manifest_error(),
            Error::Geometry(vxb_geometry::Error::CoreError(e)) => e.is_manifest_error(),
            _ => false,
        }
    }
}
