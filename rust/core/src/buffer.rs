// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Buffer Store - read-only byte buffers referenced by the manifest
//!
//! Buffer files are memory-mapped once per import session and shared by all
//! section decoders as plain `&[u8]` views. Nothing writes to a buffer after
//! it is loaded, so views can be handed to worker threads without locking.

use crate::error::{Error, Result};
use crate::manifest::{BufferDecl, Manifest, ViewRef};
use memmap2::Mmap;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Backing storage of a loaded buffer
#[derive(Debug)]
enum BufferData {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for BufferData {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        match self {
            BufferData::Mapped(map) => map,
            BufferData::Owned(bytes) => bytes,
        }
    }
}

/// A loaded buffer and the file it came from
#[derive(Debug)]
pub struct Buffer {
    name: String,
    path: PathBuf,
    data: BufferData,
}

impl Buffer {
    /// Memory-map a buffer file read-only
    #[allow(unsafe_code)]
    pub fn map(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let name = name.into();
        let path = path.into();
        if !path.is_file() {
            return Err(Error::MissingBuffer { name, path });
        }
        let io_err = |source| Error::Io {
            path: path.clone(),
            source,
        };
        let file = File::options()
            .read(true)
            .write(false)
            .open(&path)
            .map_err(io_err)?;
        let len = file.metadata().map_err(io_err)?.len();

        // Mapping an empty file fails on some platforms
        let data = if len == 0 {
            BufferData::Owned(Vec::new())
        } else {
            tracing::trace!(buffer = %name, path = %path.display(), len, "memory-mapping buffer");
            // SAFETY: the map is read-only and the store never hands out
            // mutable access; external truncation of the file during an
            // import is outside what the importer can guard against.
            BufferData::Mapped(unsafe { Mmap::map(&file) }.map_err(io_err)?)
        };
        Ok(Self { name, path, data })
    }

    /// Wrap bytes that are already in memory
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(format!("<memory:{}>", name)),
            name,
            data: BufferData::Owned(bytes),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Zero-copy view of `length` bytes starting at `offset`
    pub fn slice(&self, offset: u64, length: usize) -> Result<&[u8]> {
        let range_err = || Error::BufferRange {
            buffer: self.name.clone(),
            path: self.path.clone(),
            offset,
            length,
            size: self.len(),
        };
        let start = usize::try_from(offset).map_err(|_| range_err())?;
        let end = start.checked_add(length).ok_or_else(range_err)?;
        self.data.get(start..end).ok_or_else(range_err)
    }
}

/// All buffers of one import session, keyed by manifest name
#[derive(Debug, Default)]
pub struct BufferStore {
    buffers: FxHashMap<String, Buffer>,
}

impl BufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every declared buffer, resolving URIs against `base_dir`.
    /// Files are mapped in parallel; the first failure aborts the load.
    pub fn load(manifest: &Manifest, base_dir: &Path) -> Result<Self> {
        let buffers = manifest
            .buffers
            .par_iter()
            .map(|decl| Self::load_one(decl, base_dir))
            .collect::<Result<Vec<_>>>()?;

        let mut store = Self::new();
        // Preserve "later declaration wins" for duplicate names
        for buffer in buffers {
            store.insert(buffer);
        }
        tracing::debug!(buffers = store.len(), bytes = store.total_bytes(), "Buffers loaded");
        Ok(store)
    }

    fn load_one(decl: &BufferDecl, base_dir: &Path) -> Result<Buffer> {
        let path = base_dir.join(&decl.uri);
        let buffer = Buffer::map(decl.name.clone(), path)?;
        if let Some(declared) = decl.byte_length {
            if declared != buffer.len() as u64 {
                tracing::warn!(
                    buffer = %decl.name,
                    declared,
                    actual = buffer.len(),
                    "Declared byteLength disagrees with file size"
                );
            }
        }
        tracing::debug!(
            buffer = %decl.name,
            path = %buffer.path().display(),
            len = buffer.len(),
            "Loaded buffer"
        );
        Ok(buffer)
    }

    pub fn insert(&mut self, buffer: Buffer) {
        self.buffers.insert(buffer.name.clone(), buffer);
    }

    pub fn get(&self, name: &str) -> Option<&Buffer> {
        self.buffers.get(name)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.buffers.values().map(Buffer::len).sum()
    }

    /// Zero-copy view into a named buffer
    pub fn slice(&self, buffer: &str, offset: u64, length: usize) -> Result<&[u8]> {
        self.get(buffer)
            .ok_or_else(|| Error::UndeclaredBuffer(buffer.to_string()))?
            .slice(offset, length)
    }

    /// View of `count` records of `stride` bytes at a manifest view
    pub fn view(&self, view: &ViewRef, count: usize, stride: usize) -> Result<&[u8]> {
        let length = count.checked_mul(stride).ok_or_else(|| Error::BufferRange {
            buffer: view.buffer.clone(),
            path: self
                .get(&view.buffer)
                .map(|b| b.path().to_path_buf())
                .unwrap_or_default(),
            offset: view.offset,
            length: usize::MAX,
            size: self.get(&view.buffer).map_or(0, Buffer::len),
        })?;
        self.slice(&view.buffer, view.offset, length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_slice_in_range() {
        let buffer = Buffer::from_bytes("bin", (0u8..16).collect());
        assert_eq!(buffer.slice(4, 4).unwrap(), &[4, 5, 6, 7]);
        assert_eq!(buffer.slice(16, 0).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn test_slice_out_of_range() {
        let buffer = Buffer::from_bytes("bin", vec![0; 8]);
        match buffer.slice(6, 4) {
            Err(Error::BufferRange {
                buffer,
                offset,
                length,
                size,
                ..
            }) => {
                assert_eq!(buffer, "bin");
                assert_eq!((offset, length, size), (6, 4, 8));
            }
            other => panic!("expected BufferRange, got {:?}", other),
        }
        assert!(matches!(
            buffer.slice(u64::MAX, 1),
            Err(Error::BufferRange { .. })
        ));
    }

    #[test]
    fn test_store_view() {
        let mut store = BufferStore::new();
        store.insert(Buffer::from_bytes("bin", vec![1; 24]));
        let view = ViewRef {
            buffer: "bin".into(),
            offset: 12,
        };
        assert_eq!(store.view(&view, 1, 12).unwrap().len(), 12);
        assert!(store.view(&view, 2, 12).is_err());
        assert!(store.view(&view, usize::MAX, 12).is_err());

        let missing = ViewRef {
            buffer: "uv".into(),
            offset: 0,
        };
        assert!(matches!(
            store.view(&missing, 1, 4),
            Err(Error::UndeclaredBuffer(_))
        ));
    }

    #[test]
    fn test_map_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.bin");
        File::create(&path)
            .unwrap()
            .write_all(&[9, 8, 7, 6])
            .unwrap();

        let buffer = Buffer::map("bin", &path).unwrap();
        assert_eq!(buffer.bytes(), &[9, 8, 7, 6]);
        assert_eq!(buffer.path(), path.as_path());

        let empty = dir.path().join("empty.bin");
        File::create(&empty).unwrap();
        assert!(Buffer::map("empty", &empty).unwrap().is_empty());
    }

    #[test]
    fn test_map_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Buffer::map("bin", dir.path().join("nope.bin"));
        assert!(matches!(result, Err(Error::MissingBuffer { .. })));
    }
}
