//! Reads the bundler's metafile and emits `entrypoints.json`: which
//! css/js files each entry point needs, plus a subresource-integrity
//! hash per emitted file.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use actilog_core::{ActilogError, Result};
use serde::{Deserialize, Serialize};

use crate::integrity::integrity_hash;

/// The slice of a bundler metafile this crate reads: the outputs table,
/// keyed by output path. Only outputs carrying an `entryPoint` take part
/// in the manifest; chunks and sourcemaps do not.
#[derive(Debug, Deserialize)]
pub struct Metafile {
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputMeta>,
}

#[derive(Debug, Deserialize)]
pub struct OutputMeta {
    #[serde(rename = "entryPoint")]
    pub entry_point: Option<String>,
}

impl Metafile {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ActilogError::Parse(e.to_string()))
    }
}

pub struct ManifestConfig {
    /// Name the manifest groups assets under.
    pub entry_name: String,
    /// URL prefix public paths are rooted at.
    pub public_prefix: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            entry_name: "app".to_string(),
            public_prefix: "/build".to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct EntryAssets {
    pub css: Vec<String>,
    pub js: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct AssetManifest {
    pub entrypoints: BTreeMap<String, EntryAssets>,
    pub integrity: BTreeMap<String, String>,
}

/// Last two path segments of a metafile output path. Both the public
/// path and the location under the build directory use this shape, so
/// the metafile may be rooted anywhere.
fn tail_path(output_path: &str) -> String {
    let segments: Vec<&str> = output_path.split('/').filter(|s| !s.is_empty()).collect();
    let keep = segments.len().saturating_sub(2);
    segments[keep..].join("/")
}

/// Builds the manifest for the entry outputs in `metafile`. Outputs are
/// classified css when their entry point is namespaced `css/`, js
/// otherwise, and listed css-first in entry-point order. Outputs whose
/// file is absent under `build_dir` are skipped. The configured entry
/// name is always present, even with nothing to list.
pub fn build_manifest(
    build_dir: &Path,
    metafile: &Metafile,
    config: &ManifestConfig,
) -> Result<AssetManifest> {
    let mut outputs: Vec<(&str, &str)> = metafile
        .outputs
        .iter()
        .filter_map(|(path, meta)| meta.entry_point.as_deref().map(|ep| (path.as_str(), ep)))
        .collect();
    outputs.sort_by(|a, b| {
        let a_css = a.1.starts_with("css/");
        let b_css = b.1.starts_with("css/");
        b_css.cmp(&a_css).then_with(|| a.1.cmp(b.1))
    });

    let mut manifest = AssetManifest::default();
    manifest
        .entrypoints
        .entry(config.entry_name.clone())
        .or_default();

    let prefix = config.public_prefix.trim_end_matches('/');
    for (output_path, entry_point) in outputs {
        let tail = tail_path(output_path);
        let bytes = match fs::read(build_dir.join(&tail)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(output = output_path, "skipping missing output file");
                continue;
            }
            Err(e) => return Err(ActilogError::Io(e.to_string())),
        };

        let public_path = format!("{prefix}/{tail}");
        let assets = manifest
            .entrypoints
            .entry(config.entry_name.clone())
            .or_default();
        if entry_point.starts_with("css/") {
            assets.css.push(public_path.clone());
        } else {
            assets.js.push(public_path.clone());
        }
        manifest
            .integrity
            .insert(public_path, integrity_hash(&bytes));
    }

    Ok(manifest)
}

/// Writes the manifest as pretty-printed JSON to
/// `<build_dir>/entrypoints.json`.
pub fn write_manifest(build_dir: &Path, manifest: &AssetManifest) -> Result<PathBuf> {
    fs::create_dir_all(build_dir).map_err(|e| ActilogError::Io(e.to_string()))?;
    let path = build_dir.join("entrypoints.json");
    let json =
        serde_json::to_string_pretty(manifest).map_err(|e| ActilogError::Parse(e.to_string()))?;
    fs::write(&path, format!("{json}\n")).map_err(|e| ActilogError::Io(e.to_string()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metafile_keeps_entry_outputs_and_ignores_extras() {
        let metafile = Metafile::from_json(
            r#"{
                "inputs": {"src/app.js": {"bytes": 10}},
                "outputs": {
                    "build/js/app.js": {"entryPoint": "js/app", "bytes": 123},
                    "build/js/chunk-XYZ.js": {"bytes": 45}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(metafile.outputs.len(), 2);
        assert_eq!(
            metafile.outputs["build/js/app.js"].entry_point.as_deref(),
            Some("js/app")
        );
        assert!(metafile.outputs["build/js/chunk-XYZ.js"]
            .entry_point
            .is_none());
    }

    #[test]
    fn tail_path_keeps_last_two_segments() {
        assert_eq!(tail_path("themes/admin/build/js/app.js"), "js/app.js");
        assert_eq!(tail_path("js/app.js"), "js/app.js");
        assert_eq!(tail_path("app.js"), "app.js");
    }

    #[test]
    fn classifies_and_orders_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path();
        fs::create_dir_all(build.join("js")).unwrap();
        fs::create_dir_all(build.join("css")).unwrap();
        fs::write(build.join("js/app.js"), "console.log(\"app\");\n").unwrap();
        fs::write(build.join("js/vendor.js"), "window.vendor = 1;\n").unwrap();
        fs::write(build.join("css/app.css"), "body{margin:0}\n").unwrap();

        let metafile = Metafile::from_json(
            r#"{"outputs": {
                "build/js/vendor.js": {"entryPoint": "js/vendor"},
                "build/js/app.js": {"entryPoint": "js/app"},
                "build/css/app.css": {"entryPoint": "css/app"}
            }}"#,
        )
        .unwrap();

        let manifest = build_manifest(build, &metafile, &ManifestConfig::default()).unwrap();
        let app = &manifest.entrypoints["app"];
        assert_eq!(app.css, vec!["/build/css/app.css"]);
        assert_eq!(app.js, vec!["/build/js/app.js", "/build/js/vendor.js"]);
    }

    #[test]
    fn integrity_is_keyed_by_public_path() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path();
        fs::create_dir_all(build.join("css")).unwrap();
        fs::write(build.join("css/app.css"), "body{margin:0}\n").unwrap();

        let metafile = Metafile::from_json(
            r#"{"outputs": {"build/css/app.css": {"entryPoint": "css/app"}}}"#,
        )
        .unwrap();

        let manifest = build_manifest(build, &metafile, &ManifestConfig::default()).unwrap();
        assert_eq!(
            manifest.integrity["/build/css/app.css"],
            integrity_hash(b"body{margin:0}\n")
        );
    }

    #[test]
    fn missing_output_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let metafile = Metafile::from_json(
            r#"{"outputs": {"build/js/gone.js": {"entryPoint": "js/gone"}}}"#,
        )
        .unwrap();

        let manifest =
            build_manifest(dir.path(), &metafile, &ManifestConfig::default()).unwrap();
        assert!(manifest.entrypoints["app"].js.is_empty());
        assert!(manifest.integrity.is_empty());
    }

    #[test]
    fn entry_name_is_present_even_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let metafile = Metafile::from_json(r#"{"outputs": {}}"#).unwrap();
        let config = ManifestConfig {
            entry_name: "admin".to_string(),
            ..ManifestConfig::default()
        };

        let manifest = build_manifest(dir.path(), &metafile, &config).unwrap();
        assert!(manifest.entrypoints.contains_key("admin"));
        assert!(manifest.entrypoints["admin"].css.is_empty());
        assert!(manifest.entrypoints["admin"].js.is_empty());
    }

    #[test]
    fn written_manifest_is_pretty_json_with_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = AssetManifest::default();

        let path = write_manifest(dir.path(), &manifest).unwrap();
        assert_eq!(path, dir.path().join("entrypoints.json"));
        let written = fs::read_to_string(path).unwrap();
        assert!(written.ends_with('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert!(parsed["entrypoints"].is_object());
        assert!(parsed["integrity"].is_object());
    }
}
