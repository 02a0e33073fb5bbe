use anyhow::{Context, Result};
use log::{info, warn};
use lookalike_engine::{Catalog, CatalogEntry, DisplayMetadata, Embedding, Method, Query};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const CATALOG_FILE: &str = "catalog.bin";

fn catalog_path(prefix: &Path) -> PathBuf {
    prefix.join(CATALOG_FILE)
}

/// Loads the stored catalog; an absent store is an empty catalog.
pub fn load_catalog(prefix: &Path) -> Result<Catalog> {
    let file = catalog_path(prefix);

    if !file.exists() {
        return Ok(Catalog::new());
    }

    let data = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
    postcard::from_bytes(&data).with_context(|| format!("decoding {}", file.display()))
}

pub fn save_catalog(prefix: &Path, catalog: &Catalog) -> Result<()> {
    std::fs::create_dir_all(prefix)
        .with_context(|| format!("creating {}", prefix.display()))?;
    let file = catalog_path(prefix);
    let data = postcard::to_allocvec(catalog)?;
    std::fs::write(&file, data).with_context(|| format!("writing {}", file.display()))?;
    Ok(())
}

pub fn purge(prefix: &Path) -> Result<()> {
    let file = catalog_path(prefix);
    if file.exists() {
        std::fs::remove_file(&file).with_context(|| format!("removing {}", file.display()))?;
    }
    Ok(())
}

/// Reads a catalog in the native JSON layout.
pub fn read_json_catalog(path: &Path) -> Result<Catalog> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing catalog {}", path.display()))
}

pub fn read_query(path: &Path) -> Result<Query> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading query {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing query {}", path.display()))
}

/// One record of a per-method player embedding export.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerRecord {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    team: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    descriptor: Option<Vec<f32>>,
}

impl PlayerRecord {
    fn into_entry(self, method: Method) -> Result<Option<CatalogEntry>> {
        let Some(values) = self.descriptor else {
            warn!("{}: no descriptor, skipping", self.name);
            return Ok(None);
        };
        let embedding =
            Embedding::new(values).with_context(|| format!("{}: bad descriptor", self.name))?;
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let entry = CatalogEntry::new(
            id,
            DisplayMetadata {
                name: self.name,
                group: self.team.filter(|t| !t.is_empty()),
                image_url: self.image_url,
            },
        )
        .with_embedding(method, embedding);
        Ok(Some(entry))
    }
}

/// Merges a per-method player export into `catalog`.
///
/// Records join existing entries on `imageUrl`, since every export run
/// assigns fresh ids to the same images. Records without an image URL join
/// on id. Returns how many records were merged.
pub fn import_players(catalog: &mut Catalog, raw: &str, method: Method) -> Result<usize> {
    let records: Vec<PlayerRecord> = serde_json::from_str(raw).context("parsing player export")?;
    let mut by_image: HashMap<String, String> = catalog
        .entries()
        .iter()
        .filter_map(|e| Some((e.metadata.image_url.clone()?, e.id.clone())))
        .collect();
    let mut merged = 0;
    for record in records {
        if let Some(mut entry) = record.into_entry(method)? {
            if let Some(url) = entry.metadata.image_url.clone() {
                match by_image.get(&url) {
                    Some(id) => entry.id = id.clone(),
                    None => {
                        by_image.insert(url, entry.id.clone());
                    }
                }
            }
            let dim = entry.embedding(method).map_or(0, Embedding::len);
            if dim != method.typical_dim() {
                warn!(
                    "{}: {} has {} values, expected {}",
                    entry.id,
                    method,
                    dim,
                    method.typical_dim()
                );
            }
            catalog.merge(entry);
            merged += 1;
        }
    }
    info!("Merged {} {} record(s)", merged, method);
    Ok(merged)
}

pub fn import_players_file(catalog: &mut Catalog, path: &Path, method: Method) -> Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    import_players(catalog, &raw, method).with_context(|| format!("importing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACE_API_EXPORT: &str = r#"[
        {"id": "1", "name": "Choi", "team": "SSG Landers", "imageUrl": "/images/choi.jpg",
         "descriptor": [0.1, 0.2, 0.3]},
        {"id": "2", "name": "Han", "team": "", "imageUrl": "/images/han.jpg",
         "descriptor": [0.3, 0.2, 0.1]},
        {"name": "No Face", "imageUrl": "/images/none.jpg"}
    ]"#;

    const MESH_EXPORT: &str = r#"[
        {"id": "2", "name": "Han", "descriptor": [0.5, 0.5, 0.0, 0.5, 0.5, 0.0]},
        {"name": "Anonymous", "descriptor": [0.1, 0.1, 0.1, 0.1, 0.1, 0.1]}
    ]"#;

    #[test]
    fn imports_join_on_id() -> Result<()> {
        let mut catalog = Catalog::new();
        assert_eq!(import_players(&mut catalog, FACE_API_EXPORT, Method::Descriptor)?, 2);
        assert_eq!(import_players(&mut catalog, MESH_EXPORT, Method::Landmarks)?, 2);

        assert_eq!(catalog.len(), 3);
        let han = catalog.get("2").expect("han");
        assert_eq!(han.embeddings.len(), 2);
        assert_eq!(han.metadata.group, None);
        assert_eq!(
            catalog.get("1").and_then(|e| e.metadata.group.as_deref()),
            Some("SSG Landers")
        );
        // generated id for the record without one
        let anon = &catalog.entries()[2];
        assert!(uuid::Uuid::parse_str(&anon.id).is_ok());
        Ok(())
    }

    #[test]
    fn exports_with_fresh_ids_join_on_image_url() -> Result<()> {
        let face_api = r#"[
            {"id": "k3j9x2a1b", "name": "Choi", "team": "SSG Landers",
             "imageUrl": "/images/choi.jpg", "descriptor": [0.1, 0.2, 0.3]},
            {"id": "p0q8r7s6t", "name": "Han", "team": "SSG Landers",
             "imageUrl": "/images/han.jpg", "descriptor": [0.3, 0.2, 0.1]}
        ]"#;
        let mesh = r#"[
            {"id": "zz81mm2nn", "name": "Choi", "imageUrl": "/images/choi.jpg",
             "descriptor": [0.5, 0.5, 0.0, 0.5, 0.5, 0.0]},
            {"id": "aa12bb34c", "name": "Han", "imageUrl": "/images/han.jpg",
             "descriptor": [0.4, 0.5, 0.0, 0.4, 0.5, 0.0]}
        ]"#;

        let mut catalog = Catalog::new();
        import_players(&mut catalog, face_api, Method::Descriptor)?;
        import_players(&mut catalog, mesh, Method::Landmarks)?;

        let coverage = catalog.coverage();
        assert_eq!(coverage.total, 2);
        assert_eq!(coverage.both, 2);
        let choi = catalog.get("k3j9x2a1b").expect("choi");
        assert_eq!(choi.embedding(Method::Landmarks).map(Embedding::len), Some(6));
        assert!(catalog.get("zz81mm2nn").is_none());
        Ok(())
    }

    #[test]
    fn rejects_non_numeric_descriptor() {
        let mut catalog = Catalog::new();
        let bad = r#"[{"id": "x", "name": "X", "descriptor": [0.1, "a"]}]"#;
        assert!(import_players(&mut catalog, bad, Method::Descriptor).is_err());
    }

    #[test]
    fn store_round_trip_and_purge() -> Result<()> {
        let prefix =
            std::env::temp_dir().join(format!("lookalike-store-{}", uuid::Uuid::new_v4()));
        assert!(load_catalog(&prefix)?.is_empty());

        let mut catalog = Catalog::new();
        import_players(&mut catalog, FACE_API_EXPORT, Method::Descriptor)?;
        save_catalog(&prefix, &catalog)?;
        assert_eq!(load_catalog(&prefix)?, catalog);

        purge(&prefix)?;
        assert!(load_catalog(&prefix)?.is_empty());
        std::fs::remove_dir_all(&prefix)?;
        Ok(())
    }
}
