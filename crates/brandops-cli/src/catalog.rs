//! Catalog files: a JSON array of items, read whole and written back whole.

use anyhow::{Context, Result};
use brandops_core::Item;
use std::path::{Path, PathBuf};

/// Why a catalog could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to parse catalog {}: {1}", .0.display())]
    Parse(PathBuf, serde_json::Error),

    #[error("failed to read catalog {}: {1}", .0.display())]
    Io(PathBuf, std::io::Error),
}

pub fn load(path: &Path) -> Result<Vec<Item>, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::NotFound(path.to_path_buf()));
    }
    let content =
        std::fs::read_to_string(path).map_err(|e| CatalogError::Io(path.to_path_buf(), e))?;
    serde_json::from_str(&content).map_err(|e| CatalogError::Parse(path.to_path_buf(), e))
}

/// Write `items` as a JSON array, replacing the file atomically.
pub fn save(path: &Path, items: &[Item], pretty: bool) -> Result<()> {
    let mut body = if pretty {
        serde_json::to_string_pretty(items)?
    } else {
        serde_json::to_string(items)?
    };
    body.push('\n');

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, body).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Default export target: `<stem>.export.json` next to the catalog.
pub fn default_export_path(catalog: &Path) -> PathBuf {
    let stem = catalog
        .file_stem()
        .map_or_else(|| "catalog".into(), |s| s.to_string_lossy().into_owned());
    catalog.with_file_name(format!("{stem}.export.json"))
}

/// Parse a `field=value` filter. Both sides are trimmed and must be non-empty.
pub fn parse_filter(raw: &str) -> Option<(String, String)> {
    let (field, value) = raw.split_once('=')?;
    let (field, value) = (field.trim(), value.trim());
    if field.is_empty() || value.is_empty() {
        return None;
    }
    Some((field.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[test]
    fn load_rejects_non_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.json");
        std::fs::write(&path, r#"{"id":"a"}"#).unwrap();
        assert!(matches!(load(&path).unwrap_err(), CatalogError::Parse(..)));
    }

    #[test]
    fn save_then_load_keeps_extra_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.json");
        std::fs::write(&path, r#"[{"id":"a","name":"Brand Pyramid","qualityScore":71}]"#).unwrap();

        let mut items = load(&path).unwrap();
        items[0].status = Some("validated".into());
        save(&path, &items, false).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["name"], "Brand Pyramid");
        assert_eq!(raw[0]["qualityScore"], 71);
        assert_eq!(raw[0]["status"], "validated");
        assert!(!dir.path().join("c.json.tmp").exists());
    }

    #[test]
    fn export_path_sits_next_to_catalog() {
        let p = default_export_path(Path::new("/data/assets.json"));
        assert_eq!(p, PathBuf::from("/data/assets.export.json"));
    }

    #[test]
    fn filters_need_both_sides() {
        assert_eq!(
            parse_filter(" status = draft "),
            Some(("status".into(), "draft".into()))
        );
        assert_eq!(parse_filter("tag=a=b"), Some(("tag".into(), "a=b".into())));
        assert!(parse_filter("status").is_none());
        assert!(parse_filter("=draft").is_none());
        assert!(parse_filter("status=").is_none());
    }
}
