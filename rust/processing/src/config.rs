// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Import configuration loaded from environment variables.

use vxb_core::FormatProfile;

/// Import configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Binary layout of the buffers, fixed for the whole import.
    pub profile: FormatProfile,
    /// Number of worker threads for section decoding.
    pub worker_threads: usize,
    /// Drop vertices no surviving face references.
    pub compact_vertices: bool,
    /// Log the skipped transparent/degenerate face counts once per import.
    pub report_skipped_faces: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            profile: FormatProfile::default(),
            worker_threads: num_cpus::get(),
            compact_vertices: false,
            report_skipped_faces: true,
        }
    }
}

impl ImportConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup, falling back to the
    /// defaults for missing or unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            profile: lookup("VXB_PROFILE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.profile),
            worker_threads: lookup("VXB_WORKER_THREADS")
                .and_then(|v| v.trim().parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.worker_threads),
            compact_vertices: lookup("VXB_COMPACT_VERTICES")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.compact_vertices),
            report_skipped_faces: lookup("VXB_REPORT_SKIPPED")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.report_skipped_faces),
        }
    }

    pub fn with_profile(mut self, profile: FormatProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Values below 1 are clamped to 1.
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(1);
        self
    }

    pub fn with_compact_vertices(mut self, enabled: bool) -> Self {
        self.compact_vertices = enabled;
        self
    }

    pub fn with_report_skipped_faces(mut self, enabled: bool) -> Self {
        self.report_skipped_faces = enabled;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ImportConfig::from_lookup(lookup(&[]));
        assert_eq!(config.profile, FormatProfile::Float32Tiled);
        assert!(config.worker_threads >= 1);
        assert!(!config.compact_vertices);
        assert!(config.report_skipped_faces);
    }

    #[test]
    fn test_overrides() {
        let config = ImportConfig::from_lookup(lookup(&[
            ("VXB_PROFILE", "Compact"),
            ("VXB_WORKER_THREADS", "3"),
            ("VXB_COMPACT_VERTICES", "yes"),
            ("VXB_REPORT_SKIPPED", "0"),
        ]));
        assert_eq!(config.profile, FormatProfile::Quantized16);
        assert_eq!(config.worker_threads, 3);
        assert!(config.compact_vertices);
        assert!(!config.report_skipped_faces);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = ImportConfig::from_lookup(lookup(&[
            ("VXB_PROFILE", "bc7"),
            ("VXB_WORKER_THREADS", "0"),
            ("VXB_COMPACT_VERTICES", "maybe"),
        ]));
        let defaults = ImportConfig::default();
        assert_eq!(config.profile, defaults.profile);
        assert_eq!(config.worker_threads, defaults.worker_threads);
        assert_eq!(config.compact_vertices, defaults.compact_vertices);
    }

    #[test]
    fn test_builders() {
        let config = ImportConfig::default()
            .with_profile(FormatProfile::Quantized16)
            .with_worker_threads(0)
            .with_compact_vertices(true)
            .with_report_skipped_faces(false);
        assert_eq!(config.profile, FormatProfile::Quantized16);
        assert_eq!(config.worker_threads, 1);
        assert!(config.compact_vertices);
        assert!(!config.report_skipped_faces);
    }
}
