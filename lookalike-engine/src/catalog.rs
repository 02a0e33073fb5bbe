use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::embedding::{Embedding, Method};
use crate::error::{MatchError, Result};

/// What presentation shows for an entry; never used for scoring.
///
/// Optional fields are always serialized so the record also works with
/// non-self-describing formats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayMetadata {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogEntry {
    pub id: String,
    pub metadata: DisplayMetadata,
    #[serde(default)]
    pub embeddings: BTreeMap<Method, Embedding>,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, metadata: DisplayMetadata) -> Self {
        Self {
            id: id.into(),
            metadata,
            embeddings: BTreeMap::new(),
        }
    }

    pub fn with_embedding(mut self, method: Method, embedding: Embedding) -> Self {
        self.embeddings.insert(method, embedding);
        self
    }

    pub fn embedding(&self, method: Method) -> Option<&Embedding> {
        self.embeddings.get(&method)
    }
}

/// Number of entries carrying each method, and both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coverage {
    pub total: usize,
    pub descriptor: usize,
    pub landmarks: usize,
    pub both: usize,
}

/// Reference set with unique ids, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CatalogEntry>", into = "Vec<CatalogEntry>")]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn insert(&mut self, entry: CatalogEntry) -> Result<()> {
        if self.index.contains_key(&entry.id) {
            return Err(MatchError::DuplicateId(entry.id));
        }
        self.index.insert(entry.id.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Adds the entry, or folds its embeddings into the existing entry with
    /// the same id. Existing embeddings for the same method are replaced;
    /// existing metadata is kept.
    pub fn merge(&mut self, entry: CatalogEntry) {
        match self.index.get(&entry.id) {
            Some(&i) => self.entries[i].embeddings.extend(entry.embeddings),
            None => {
                self.index.insert(entry.id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn coverage(&self) -> Coverage {
        self.entries.iter().fold(
            Coverage {
                total: self.entries.len(),
                ..Coverage::default()
            },
            |mut c, e| {
                let d = e.embedding(Method::Descriptor).is_some();
                let l = e.embedding(Method::Landmarks).is_some();
                c.descriptor += d as usize;
                c.landmarks += l as usize;
                c.both += (d && l) as usize;
                c
            },
        )
    }
}

impl TryFrom<Vec<CatalogEntry>> for Catalog {
    type Error = MatchError;

    fn try_from(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut catalog = Catalog::new();
        for entry in entries {
            catalog.insert(entry)?;
        }
        Ok(catalog)
    }
}

impl From<Catalog> for Vec<CatalogEntry> {
    fn from(c: Catalog) -> Self {
        c.entries
    }
}

impl AsRef<[CatalogEntry]> for Catalog {
    fn as_ref(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> CatalogEntry {
        CatalogEntry::new(
            id,
            DisplayMetadata {
                name: id.to_uppercase(),
                ..Default::default()
            },
        )
    }

    fn emb(v: &[f32]) -> Embedding {
        Embedding::new(v.to_vec()).unwrap()
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let mut c = Catalog::new();
        c.insert(entry("a")).unwrap();
        assert_eq!(
            c.insert(entry("a")),
            Err(MatchError::DuplicateId("a".to_string()))
        );
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn merge_joins_methods_by_id() {
        let mut c = Catalog::new();
        c.merge(entry("a").with_embedding(Method::Descriptor, emb(&[1.0, 0.0])));
        c.merge(entry("b").with_embedding(Method::Descriptor, emb(&[0.0, 1.0])));
        c.merge(entry("a").with_embedding(Method::Landmarks, emb(&[0.1, 0.2, 0.3])));

        assert_eq!(c.len(), 2);
        assert_eq!(c.entries()[0].id, "a");
        assert_eq!(c.get("a").unwrap().embeddings.len(), 2);
        assert_eq!(
            c.coverage(),
            Coverage {
                total: 2,
                descriptor: 2,
                landmarks: 1,
                both: 1
            }
        );
    }

    #[test]
    fn json_boundary_rejects_unknown_methods() {
        let ok = r#"[{"id":"a","metadata":{"name":"A","group":"SSG"},
                      "embeddings":{"descriptor":[0.5,0.5]}}]"#;
        let c: Catalog = serde_json::from_str(ok).unwrap();
        assert_eq!(c.get("a").unwrap().metadata.group.as_deref(), Some("SSG"));

        let unknown = r#"[{"id":"a","metadata":{"name":"A"},"embeddings":{"mesh":[0.5]}}]"#;
        assert!(serde_json::from_str::<Catalog>(unknown).is_err());

        let dup = r#"[{"id":"a","metadata":{"name":"A"}},{"id":"a","metadata":{"name":"B"}}]"#;
        assert!(serde_json::from_str::<Catalog>(dup).is_err());
    }
}
