// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! VXB manifest model
//!
//! The manifest is the JSON half of a VXB export. It declares the binary
//! buffers, and for every mesh the sections whose views point into them.
//! Byte lengths are never stored; they follow from the section counts and the
//! fixed record sizes of the active [`FormatProfile`](crate::FormatProfile).

use crate::error::{Error, Result};
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Atlas size assumed when the manifest does not declare one
pub const DEFAULT_ATLAS_SIZE: u32 = 8192;

fn default_atlas_size() -> u32 {
    DEFAULT_ATLAS_SIZE
}

/// Top-level manifest document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub endian: Option<String>,
    #[serde(default = "default_atlas_size")]
    pub atlas_size: u32,
    #[serde(default)]
    pub uv1_quantization: Uv1Quantization,
    #[serde(default)]
    pub color_mode: ColorMode,
    pub buffers: Vec<BufferDecl>,
    pub meshes: Vec<MeshInfo>,
}

/// Declared binary buffer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferDecl {
    pub name: String,
    /// Path relative to the manifest's directory
    pub uri: String,
    /// Informational only; the file size on disk is authoritative
    #[serde(default)]
    pub byte_length: Option<u64>,
}

/// How the UV1 channel was quantized by the exporter
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Uv1Quantization {
    /// Float coordinates in atlas pixel space
    AtlasF32,
    /// Float coordinates already in 0..1
    #[default]
    NormalizedF32,
    /// u16 coordinates in atlas pixel space
    AtlasU16,
    /// u16 coordinates scaled to 0..65535
    NormalizedU16,
    /// Unrecognized tag, decoded like the normalized variants
    Other(String),
}

/// Tags are matched exactly; any other spelling decodes as raw.
impl From<String> for Uv1Quantization {
    fn from(value: String) -> Self {
        match value.as_str() {
            "atlas_f32" => Uv1Quantization::AtlasF32,
            "normalized_f32" => Uv1Quantization::NormalizedF32,
            "atlas_u16" => Uv1Quantization::AtlasU16,
            "normalized_u16" => Uv1Quantization::NormalizedU16,
            _ => Uv1Quantization::Other(value),
        }
    }
}

impl Uv1Quantization {
    /// Whether coordinates are stored in atlas pixel space and must be
    /// divided by the atlas size.
    #[inline]
    pub fn is_atlas_space(&self) -> bool {
        matches!(self, Uv1Quantization::AtlasF32 | Uv1Quantization::AtlasU16)
    }
}

/// Color interpretation selected at export time
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum ColorMode {
    #[default]
    VertexColor,
    /// UV1 addresses a tile grid of colormap textures
    Colormap,
    Other(String),
}

impl From<String> for ColorMode {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "VERTEX_COLOR" => ColorMode::VertexColor,
            "COLORMAP" => ColorMode::Colormap,
            _ => ColorMode::Other(value),
        }
    }
}

impl ColorMode {
    #[inline]
    pub fn is_colormap(&self) -> bool {
        matches!(self, ColorMode::Colormap)
    }
}

/// A byte offset into a named buffer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewRef {
    pub buffer: String,
    pub offset: u64,
}

/// Views of one section. Extra keys written by the exporter (`stride`,
/// `type`) are ignored; the active profile fixes record sizes.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionViews {
    #[serde(rename = "POSITION")]
    pub position: ViewRef,
    #[serde(rename = "INDEX")]
    pub index: ViewRef,
    #[serde(rename = "UV_LOOP")]
    pub uv: ViewRef,
    #[serde(rename = "UV1_LOOP", default)]
    pub uv1: Option<ViewRef>,
    #[serde(rename = "LOOP_ATTR")]
    pub loop_attr: ViewRef,
    #[serde(rename = "FACE_COUNT", default)]
    pub face_count: Option<ViewRef>,
    #[serde(rename = "FACE_INDEX", default)]
    pub face_index: Option<ViewRef>,
}

impl SectionViews {
    /// Every view in declaration order, paired with its manifest key
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ViewRef)> {
        [
            ("POSITION", Some(&self.position)),
            ("INDEX", Some(&self.index)),
            ("UV_LOOP", Some(&self.uv)),
            ("UV1_LOOP", self.uv1.as_ref()),
            ("LOOP_ATTR", Some(&self.loop_attr)),
            ("FACE_COUNT", self.face_count.as_ref()),
            ("FACE_INDEX", self.face_index.as_ref()),
        ]
        .into_iter()
        .filter_map(|(key, view)| view.map(|v| (key, v)))
    }
}

/// One explicit section of a mesh
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionInfo {
    pub vertex_count: u32,
    #[serde(default)]
    pub face_count: u32,
    #[serde(default)]
    pub face_index_count: u32,
    #[serde(default)]
    pub index_count: u32,
    #[serde(default)]
    pub double_sided: bool,
    pub views: SectionViews,
}

/// A mesh entry. Older writers put the section fields directly on the mesh
/// instead of in a `sections` array.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sections: Vec<SectionInfo>,
    #[serde(default)]
    pub vertex_count: u32,
    #[serde(default)]
    pub face_count: u32,
    #[serde(default)]
    pub face_index_count: u32,
    #[serde(default)]
    pub index_count: u32,
    #[serde(default)]
    pub double_sided: bool,
    #[serde(default)]
    pub views: Option<SectionViews>,
}

impl MeshInfo {
    /// Sections of this mesh, with a flat legacy mesh normalized into one
    /// implicit section.
    pub fn sections(&self, mesh_index: usize) -> Result<Cow<'_, [SectionInfo]>> {
        if !self.sections.is_empty() {
            return Ok(Cow::Borrowed(&self.sections));
        }
        let views = self.views.clone().ok_or_else(|| {
            Error::InvalidManifest(format!(
                "mesh '{}' has neither sections nor views",
                self.display_name(mesh_index)
            ))
        })?;
        Ok(Cow::Owned(vec![SectionInfo {
            vertex_count: self.vertex_count,
            face_count: self.face_count,
            face_index_count: self.face_index_count,
            index_count: self.index_count,
            double_sided: self.double_sided,
            views,
        }]))
    }

    pub fn display_name(&self, mesh_index: usize) -> Cow<'_, str> {
        match &self.name {
            Some(name) => Cow::Borrowed(name.as_str()),
            None => Cow::Owned(format!("mesh_{}", mesh_index)),
        }
    }
}

/// A section flattened out of its mesh, carrying the names used for
/// diagnostics and merging.
#[derive(Debug, Clone)]
pub struct SectionEntry<'a> {
    pub mesh_index: usize,
    pub section_index: usize,
    /// Display name: the mesh name, suffixed with `_<section>` when the
    /// mesh has more than one section.
    pub name: String,
    pub info: Cow<'a, SectionInfo>,
}

impl Manifest {
    /// Read and parse a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| Error::ManifestNotUtf8 {
            path: path.to_path_buf(),
        })?;
        Self::parse(&text, path)
    }

    /// Parse manifest text. `origin` is only used in error messages.
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let manifest: Manifest =
            serde_json::from_str(text).map_err(|source| Error::ManifestDecode {
                path: origin.to_path_buf(),
                source,
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        if self.atlas_size == 0 {
            return Err(Error::InvalidManifest("atlasSize must be positive".into()));
        }
        if let Some(endian) = self.endian.as_deref() {
            if !endian.eq_ignore_ascii_case("LE") {
                tracing::warn!(endian, "Manifest declares non-LE endianness, decoding as LE");
            }
        }
        for entry in self.sections()? {
            for (key, view) in entry.info.views.iter() {
                if self.buffer(&view.buffer).is_none() {
                    tracing::debug!(section = %entry.name, view = key, "Undeclared buffer");
                    return Err(Error::UndeclaredBuffer(view.buffer.clone()));
                }
            }
        }
        Ok(())
    }

    /// Look up a buffer declaration by name. Later declarations win.
    pub fn buffer(&self, name: &str) -> Option<&BufferDecl> {
        self.buffers.iter().rev().find(|b| b.name == name)
    }

    /// All sections of all meshes in manifest order
    pub fn sections(&self) -> Result<Vec<SectionEntry<'_>>> {
        let mut entries = Vec::with_capacity(self.meshes.len());
        for (mesh_index, mesh) in self.meshes.iter().enumerate() {
            let base_name = mesh.display_name(mesh_index);
            let infos: Vec<Cow<'_, SectionInfo>> = match mesh.sections(mesh_index)? {
                Cow::Borrowed(list) => list.iter().map(Cow::Borrowed).collect(),
                Cow::Owned(list) => list.into_iter().map(Cow::Owned).collect(),
            };
            let multi = infos.len() > 1;
            for (section_index, info) in infos.into_iter().enumerate() {
                let name = if multi {
                    format!("{}_{}", base_name, section_index)
                } else {
                    base_name.to_string()
                };
                entries.push(SectionEntry {
                    mesh_index,
                    section_index,
                    name,
                    info,
                });
            }
        }
        Ok(entries)
    }

    /// UV1 colormap tiling is active
    #[inline]
    pub fn colormap_mode(&self) -> bool {
        self.color_mode.is_colormap()
    }
}

/// Directory that buffer URIs are resolved against
pub fn manifest_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTION_VIEWS: &str = r#"{
        "POSITION": {"buffer": "bin", "offset": 0, "stride": 12, "type": "f32x3"},
        "INDEX": {"buffer": "bin", "offset": 48},
        "UV_LOOP": {"buffer": "uv", "offset": 0},
        "LOOP_ATTR": {"buffer": "bin", "offset": 72}
    }"#;

    fn parse(text: &str) -> Result<Manifest> {
        Manifest::parse(text, Path::new("test.vxb"))
    }

    #[test]
    fn test_defaults() {
        let text = r#"{"buffers": [], "meshes": []}"#;
        let manifest = parse(text).unwrap();
        assert_eq!(manifest.atlas_size, DEFAULT_ATLAS_SIZE);
        assert_eq!(manifest.uv1_quantization, Uv1Quantization::NormalizedF32);
        assert_eq!(manifest.color_mode, ColorMode::VertexColor);
        assert!(!manifest.colormap_mode());
    }

    #[test]
    fn test_enum_tags() {
        let text = r#"{"buffers": [], "meshes": [], "atlasSize": 4096,
            "uv1Quantization": "atlas_f32", "colorMode": "colormap"}"#;
        let manifest = parse(text).unwrap();
        assert_eq!(manifest.atlas_size, 4096);
        assert_eq!(manifest.uv1_quantization, Uv1Quantization::AtlasF32);
        assert!(manifest.colormap_mode());

        let upper = Uv1Quantization::from("ATLAS_F32".to_string());
        assert_eq!(upper, Uv1Quantization::Other("ATLAS_F32".into()));
        assert!(!upper.is_atlas_space());

        assert_eq!(
            Uv1Quantization::from("mystery".to_string()),
            Uv1Quantization::Other("mystery".into())
        );
        assert!(!Uv1Quantization::Other("x".into()).is_atlas_space());
        assert!(Uv1Quantization::AtlasU16.is_atlas_space());
    }

    #[test]
    fn test_missing_required_fields() {
        let err = parse(r#"{"meshes": []}"#).unwrap_err();
        assert!(matches!(err, Error::ManifestDecode { .. }));
        assert!(err.is_manifest_error());

        let text = r#"{"buffers": [{"name": "bin", "uri": "a.bin"}], "meshes": [
            {"name": "m", "sections": [{"vertexCount": 1, "views": {
                "POSITION": {"buffer": "bin", "offset": 0}}}]}]}"#;
        assert!(matches!(parse(text), Err(Error::ManifestDecode { .. })));
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(
            parse("this is not json"),
            Err(Error::ManifestDecode { .. })
        ));
    }

    #[test]
    fn test_legacy_mesh_normalized() {
        let text = format!(
            r#"{{"buffers": [{{"name": "bin", "uri": "a.bin"}}, {{"name": "uv", "uri": "a.uv.bin"}}],
                "meshes": [{{"name": "stone", "vertexCount": 4, "indexCount": 6, "views": {}}}]}}"#,
            SECTION_VIEWS
        );
        let manifest = parse(&text).unwrap();
        let sections = manifest.sections().unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "stone");
        assert_eq!(sections[0].info.vertex_count, 4);
        assert_eq!(sections[0].info.index_count, 6);
        assert_eq!(sections[0].info.views.index.offset, 48);
        assert!(sections[0].info.views.uv1.is_none());
    }

    #[test]
    fn test_legacy_mesh_without_views() {
        let text = r#"{"buffers": [], "meshes": [{"name": "ghost", "vertexCount": 3}]}"#;
        assert!(matches!(parse(text), Err(Error::InvalidManifest(_))));
    }

    #[test]
    fn test_section_display_names() {
        let text = format!(
            r#"{{"buffers": [{{"name": "bin", "uri": "a.bin"}}, {{"name": "uv", "uri": "a.uv.bin"}}],
                "meshes": [
                    {{"name": "dirt", "sections": [
                        {{"vertexCount": 1, "views": {v}}},
                        {{"vertexCount": 2, "views": {v}}}]}},
                    {{"sections": [{{"vertexCount": 3, "views": {v}}}]}}
                ]}}"#,
            v = SECTION_VIEWS
        );
        let manifest = parse(&text).unwrap();
        let names: Vec<_> = manifest
            .sections()
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["dirt_0", "dirt_1", "mesh_1"]);
    }

    #[test]
    fn test_undeclared_buffer() {
        let text = format!(
            r#"{{"buffers": [{{"name": "bin", "uri": "a.bin"}}],
                "meshes": [{{"name": "m", "sections": [{{"vertexCount": 1, "views": {}}}]}}]}}"#,
            SECTION_VIEWS
        );
        match parse(&text) {
            Err(Error::UndeclaredBuffer(name)) => assert_eq!(name, "uv"),
            other => panic!("expected UndeclaredBuffer, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_atlas_rejected() {
        let text = r#"{"buffers": [], "meshes": [], "atlasSize": 0}"#;
        assert!(matches!(parse(text), Err(Error::InvalidManifest(_))));
    }

    #[test]
    fn test_manifest_dir() {
        assert_eq!(manifest_dir(Path::new("scene.vxb")), PathBuf::from("."));
        assert_eq!(
            manifest_dir(Path::new("/exports/scene.vxb")),
            PathBuf::from("/exports")
        );
    }
}
