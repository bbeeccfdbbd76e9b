// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for manifest, buffer and primitive decoding operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a VXB manifest and its buffers
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Failed to read {path} as UTF-8. Make sure the exported .vxb manifest was selected, \
         not one of its binary buffer files"
    )]
    ManifestNotUtf8 { path: PathBuf },

    #[error("Invalid manifest {path}: {source}")]
    ManifestDecode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("View references undeclared buffer '{0}'")]
    UndeclaredBuffer(String),

    #[error("Missing buffer '{name}': {path}")]
    MissingBuffer { name: String, path: PathBuf },

    #[error(
        "Range {offset}+{length} is out of bounds for buffer '{buffer}' ({size} bytes, {path})"
    )]
    BufferRange {
        buffer: String,
        path: PathBuf,
        offset: u64,
        length: usize,
        size: usize,
    },

    #[error(
        "Truncated {what} data: {count} records need {needed} bytes, only {available} available"
    )]
    TruncatedBuffer {
        what: &'static str,
        count: usize,
        needed: usize,
        available: usize,
    },
}

impl Error {
    /// True for failures caused by the manifest document itself rather than
    /// by the binary buffers it references.
    pub fn is_manifest_error(&self) -> bool {
        matches!(
            self,
            Error::ManifestNotUtf8 { .. }
                | Error::ManifestDecode { .. }
                | Error::InvalidManifest(_)
                | Error::UndeclaredBuffer(_)
        )
    }
}
