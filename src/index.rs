//! Storybook index schema adapter.
//!
//! Storybook publishes its catalog in one of two incompatible JSON shapes:
//! the v3 `stories.json` format and the v5 `index.json` format. Both are
//! folded into one tagged [`StorybookIndex`] so that every consumer works
//! against a single query surface. The `v` discriminator is read exactly
//! once, in [`StorybookIndex::from_value`]; everything downstream
//! pattern-matches the variant instead of probing fields.
//!
//! All functions here are pure: no I/O, no mutation of the document.

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

/// A single story in a v3 `stories.json` document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryEntry {
    /// Story ID, e.g. `button--primary`.
    #[serde(default)]
    pub id: String,
    /// Component title.
    #[serde(default)]
    pub title: String,
    /// Story name within the component.
    #[serde(default)]
    pub name: String,
    /// Source path of the story file.
    #[serde(rename = "importPath", default)]
    pub import_path: String,
    /// Hierarchical component path, e.g. `Components/Button`. The last
    /// segment is the component name.
    #[serde(default)]
    pub kind: String,
    /// Story label.
    #[serde(default)]
    pub story: String,
    /// Story parameters. Stories without a parameters object are not listed
    /// as components.
    #[serde(default)]
    pub parameters: Option<StoryParameters>,
}

/// The subset of v3 story parameters the adapter cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryParameters {
    /// Internal story ID.
    #[serde(rename = "__id", default)]
    pub id: String,
    /// True for docs-only pages, which are excluded from the component list.
    #[serde(rename = "docsOnly", default)]
    pub docs_only: bool,
    /// Source file name.
    #[serde(rename = "fileName", default)]
    pub file_name: String,
}

/// A single entry in a v5 `index.json` document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexEntry {
    /// Entry type: `"docs"` for documentation pages, `"story"` otherwise.
    #[serde(rename = "type", default)]
    pub entry_type: String,
    /// Entry ID, e.g. `button--docs`.
    #[serde(default)]
    pub id: String,
    /// Entry name.
    #[serde(default)]
    pub name: String,
    /// Component title. This is the component name for docs entries.
    #[serde(default)]
    pub title: String,
    /// Source path of the story file.
    #[serde(rename = "importPath", default)]
    pub import_path: String,
    /// Entry tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A fetched Storybook index, discriminated by schema version.
#[derive(Debug, Clone)]
pub enum StorybookIndex {
    /// The v3 `stories.json` shape.
    V3 {
        /// Stories keyed by story ID, in document order.
        stories: IndexMap<String, StoryEntry>,
    },
    /// The v5 `index.json` shape.
    V5 {
        /// Entries keyed by entry ID, in document order.
        entries: IndexMap<String, IndexEntry>,
    },
}

impl StorybookIndex {
    /// Build an index from a raw JSON document.
    ///
    /// The `v` discriminator is consulted here and nowhere else. A document
    /// without `v` is a legacy index and is treated as v5-shaped `entries`;
    /// an unsupported version behaves as an empty catalog, matching how each
    /// upstream format adapter rejects foreign documents. A missing or
    /// malformed collection degrades to an empty one rather than failing.
    pub fn from_value(value: serde_json::Value) -> Self {
        match value.get("v").and_then(serde_json::Value::as_u64) {
            Some(3) => Self::V3 {
                stories: collection(&value, "stories"),
            },
            Some(5) | None => Self::V5 {
                entries: collection(&value, "entries"),
            },
            Some(other) => {
                tracing::warn!(version = other, "unsupported Storybook index version");
                Self::V5 {
                    entries: IndexMap::new(),
                }
            }
        }
    }

    /// The schema version of this index.
    pub fn version(&self) -> u64 {
        match self {
            Self::V3 { .. } => 3,
            Self::V5 { .. } => 5,
        }
    }

    /// List the unique component names in this index.
    ///
    /// For v3, names are the last `/`-segment of each non-docs-only story's
    /// `kind`, in first-seen document order. For v5, names are the sorted
    /// titles of `docs` entries. The ordering asymmetry is inherited from
    /// the upstream format adapters and preserved for output compatibility.
    pub fn component_list(&self) -> Vec<String> {
        match self {
            Self::V3 { stories } => {
                let mut names = IndexSet::new();
                for story in stories.values() {
                    let listed = matches!(&story.parameters, Some(p) if !p.docs_only);
                    if !listed {
                        continue;
                    }
                    let name = story.kind.rsplit('/').next().unwrap_or_default().trim();
                    names.insert(name.to_string());
                }
                names.into_iter().collect()
            }
            Self::V5 { entries } => {
                let mut names: Vec<String> = entries
                    .values()
                    .filter(|entry| entry.entry_type == "docs")
                    .map(|entry| entry.title.clone())
                    .filter(|title| !title.is_empty())
                    .collect();
                names.sort();
                names.dedup();
                names
            }
        }
    }

    /// Resolve the documentation page URL for a component.
    ///
    /// The page is `{base}/iframe.html?viewMode=<mode>&id=<id>` where `base`
    /// is the index URL with its trailing path segment stripped. v3 always
    /// links with `viewMode=docs`; v5 uses the entry's own type. A name with
    /// no matching entry yields [`Error::NotFound`], which callers treat as
    /// recoverable.
    pub fn resolve_doc_url(&self, component_name: &str, index_url: &Url) -> Result<Url> {
        let (id, view_mode) = match self {
            Self::V3 { stories } => {
                let suffix = format!("/{component_name}");
                let entry = stories
                    .values()
                    .find(|story| story.kind.ends_with(&suffix))
                    .ok_or_else(|| Error::NotFound(component_name.to_string()))?;
                (entry.id.as_str(), "docs")
            }
            Self::V5 { entries } => {
                let entry = entries
                    .values()
                    .find(|entry| entry.entry_type == "docs" && entry.title == component_name)
                    .ok_or_else(|| Error::NotFound(component_name.to_string()))?;
                (entry.id.as_str(), entry.entry_type.as_str())
            }
        };

        let mut doc_url = index_url.clone();
        {
            let mut segments = doc_url
                .path_segments_mut()
                .map_err(|()| Error::Config(format!("Storybook URL cannot be a base: {index_url}")))?;
            segments.pop().push("iframe.html");
        }
        doc_url.set_query(Some(&format!("viewMode={view_mode}&id={id}")));
        Ok(doc_url)
    }
}

/// Deserialize a top-level collection, tolerating its absence or a foreign
/// shape by returning an empty map.
fn collection<T>(value: &serde_json::Value, key: &str) -> IndexMap<String, T>
where
    T: for<'de> Deserialize<'de>,
{
    value
        .get(key)
        .cloned()
        .and_then(|raw| serde_json::from_value(raw).ok())
        .unwrap_or_default()
}
