// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Import pipeline with parallel section decoding.
//!
//! manifest -> buffers -> per-section decode (worker pool) -> serial merge in
//! manifest order -> finalized meshes. The merge runs on one thread so bucket
//! contents and emission order do not depend on scheduling.

use crate::{ImportConfig, MeshEmitter, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use vxb_core::{manifest_dir, BufferStore, Manifest};
use vxb_geometry::{DecodedSection, FilterStats, ImportedMesh, MergeEngine, SectionDecoder};

/// Session statistics for one import
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Format profile the buffers were decoded with
    pub profile: String,
    pub buffers: usize,
    pub buffer_bytes: usize,
    /// Sections decoded across all manifest meshes
    pub sections: usize,
    /// Meshes emitted, one per merge key
    pub meshes: usize,
    pub vertices: usize,
    pub faces: usize,
    pub loops: usize,
    pub skipped: FilterStats,
    /// Vertices dropped by compaction, 0 when compaction is off
    pub compacted_vertices: usize,
    pub load_time_ms: u64,
    pub decode_time_ms: u64,
    pub merge_time_ms: u64,
    pub total_time_ms: u64,
}

/// Finalized meshes plus the session summary
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub meshes: Vec<ImportedMesh>,
    pub summary: ImportSummary,
}

impl ImportResult {
    /// Hand every mesh to `emitter` in first-seen merge-key order
    pub fn emit_into<E: MeshEmitter>(self, mut emitter: E) -> ImportSummary {
        for mesh in self.meshes {
            emitter.emit(mesh);
        }
        self.summary
    }
}

/// Import a `.vxb` manifest and its buffers from disk.
pub fn import_vxb(path: &Path, config: &ImportConfig) -> Result<ImportResult> {
    let total_start = Instant::now();
    tracing::info!(path = %path.display(), profile = %config.profile, "Starting VXB import");

    let manifest = Manifest::load(path)?;
    tracing::info!(
        version = manifest.version,
        atlas_size = manifest.atlas_size,
        buffers = manifest.buffers.len(),
        meshes = manifest.meshes.len(),
        "Manifest parsed"
    );

    let buffers = BufferStore::load(&manifest, &manifest_dir(path))?;
    let load_time = total_start.elapsed();
    tracing::info!(
        buffers = buffers.len(),
        bytes = buffers.total_bytes(),
        load_time_ms = load_time.as_millis(),
        "Buffers loaded"
    );

    let mut result = import_loaded(&manifest, &buffers, config)?;
    result.summary.load_time_ms = load_time.as_millis() as u64;
    result.summary.total_time_ms = total_start.elapsed().as_millis() as u64;

    tracing::info!(
        meshes = result.summary.meshes,
        sections = result.summary.sections,
        vertices = result.summary.vertices,
        faces = result.summary.faces,
        total_time_ms = result.summary.total_time_ms,
        "VXB import complete"
    );
    Ok(result)
}

/// Import from disk and emit straight into `emitter`. Nothing is emitted if
/// any section fails.
pub fn import_into<E: MeshEmitter>(
    path: &Path,
    config: &ImportConfig,
    emitter: E,
) -> Result<ImportSummary> {
    Ok(import_vxb(path, config)?.emit_into(emitter))
}

/// Decode and merge an already loaded manifest and buffer set.
pub fn import_loaded(
    manifest: &Manifest,
    buffers: &BufferStore,
    config: &ImportConfig,
) -> Result<ImportResult> {
    let entries = manifest.sections()?;
    let decoder = SectionDecoder::new(buffers, manifest, config.profile);

    let decode_start = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads.max(1))
        .build()?;
    let sections: Vec<DecodedSection> = pool.install(|| {
        entries
            .par_iter()
            .map(|entry| decoder.decode(entry))
            .collect::<vxb_geometry::Result<Vec<_>>>()
    })?;
    let decode_time = decode_start.elapsed();
    tracing::debug!(
        sections = sections.len(),
        threads = pool.current_num_threads(),
        decode_time_ms = decode_time.as_millis(),
        "Sections decoded"
    );

    let merge_start = Instant::now();
    let section_count = sections.len();
    let mut engine = MergeEngine::new();
    for section in sections {
        engine.merge(section)?;
    }
    let (mut meshes, skipped) = engine.finish()?;

    let compacted_vertices = if config.compact_vertices {
        meshes.iter_mut().map(ImportedMesh::compact_vertices).sum()
    } else {
        0
    };
    let merge_time = merge_start.elapsed();

    if config.report_skipped_faces && skipped.total() > 0 {
        tracing::info!(
            transparent = skipped.transparent_faces,
            degenerate = skipped.degenerate_faces,
            "Skipped faces"
        );
    }

    let summary = ImportSummary {
        profile: config.profile.to_string(),
        buffers: buffers.len(),
        buffer_bytes: buffers.total_bytes(),
        sections: section_count,
        meshes: meshes.len(),
        vertices: meshes.iter().map(ImportedMesh::vertex_count).sum(),
        faces: meshes.iter().map(ImportedMesh::face_count).sum(),
        loops: meshes.iter().map(ImportedMesh::loop_count).sum(),
        skipped,
        compacted_vertices,
        load_time_ms: 0,
        decode_time_ms: decode_time.as_millis() as u64,
        merge_time_ms: merge_time.as_millis() as u64,
        total_time_ms: (decode_time + merge_time).as_millis() as u64,
    };

    Ok(ImportResult { meshes, summary })
}
