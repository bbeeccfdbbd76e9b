// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for section decoding and merging
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning sections into merged meshes
#[derive(Error, Debug)]
pub enum Error {
    #[error("Section '{section}': {source}")]
    Decode {
        section: String,
        #[source]
        source: vxb_core::Error,
    },

    #[error(
        "Loop alignment mismatch in '{section}': {attribute} has {actual} loops, \
         faces need {expected}"
    )]
    LoopAlignment {
        section: String,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Malformed index stream in '{section}': {reason}")]
    MalformedIndexStream { section: String, reason: String },

    #[error("Core error: {0}")]
    CoreError(#[from] vxb_core::Error),
}

impl Error {
    /// Attach the section name to a core decoding failure
    pub fn decode(section: &str, source: vxb_core::Error) -> Self {
        Error::Decode {
            section: section.to_string(),
            source,
        }
    }

    pub fn malformed(section: &str, reason: impl Into<String>) -> Self {
        Error::MalformedIndexStream {
            section: section.to_string(),
            reason: reason.into(),
        }
    }

    /// Fail unless an attribute array covers exactly `expected` loops
    pub fn ensure_aligned(
        section: &str,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    ) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Error::LoopAlignment {
                section: section.to_string(),
                attribute,
                expected,
                actual,
            })
        }
    }
}
