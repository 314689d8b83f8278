//! Domain/category labels taken from the input folder layout.
//!
//! Inputs may be organised as `<root>/<DOMAIN>/<CATEGORY>/<file>`. A label
//! structure file (JSON, `{"DOMAIN": {"CATEGORY": "description"}}`) names the
//! known domains and categories; documents in known folders carry the
//! matching labels into their sidecar.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("Cannot read label structure {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid label structure {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Labels attached to a document's sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLabels {
    pub domain: String,
    pub category: String,
    pub domain_description: String,
    pub category_description: String,
}

/// Known domains, each mapping category names to descriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct LabelStructure {
    domains: BTreeMap<String, BTreeMap<String, String>>,
}

impl LabelStructure {
    /// Load a label structure JSON file.
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        let contents = fs::read_to_string(path).map_err(|source| LabelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let structure: Self =
            serde_json::from_str(&contents).map_err(|source| LabelError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::info!(
            "Loaded {} domains with {} categories from {}",
            structure.domain_count(),
            structure.category_count(),
            path.display()
        );
        Ok(structure)
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    pub fn category_count(&self) -> usize {
        self.domains.values().map(BTreeMap::len).sum()
    }

    /// Labels for a document at `.../<DOMAIN>/<CATEGORY>/<file>`.
    ///
    /// `None` when the path is too shallow or names an unknown domain or
    /// category.
    pub fn labels_for(&self, path: &Path) -> Option<DocumentLabels> {
        let category_dir = path.parent()?;
        let category = category_dir.file_name()?.to_str()?;
        let domain = category_dir.parent()?.file_name()?.to_str()?;

        let Some(categories) = self.domains.get(domain) else {
            tracing::debug!("Unknown domain '{}' for {}", domain, path.display());
            return None;
        };
        let Some(description) = categories.get(category) else {
            tracing::debug!(
                "Unknown category '{}' in domain '{}' for {}",
                category,
                domain,
                path.display()
            );
            return None;
        };

        Some(DocumentLabels {
            domain: domain.to_string(),
            category: category.to_string(),
            domain_description: format!(
                "Domain containing {} document categories",
                categories.len()
            ),
            category_description: description.clone(),
        })
    }

    /// Files under `<root>/<DOMAIN>/<CATEGORY>/` for every known pair.
    ///
    /// Missing folders are skipped with a warning. Within a category, regular
    /// non-hidden files are returned sorted by name; folders outside the
    /// structure are ignored.
    pub fn discover(&self, root: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for (domain, categories) in &self.domains {
            let domain_dir = root.join(domain);
            if !domain_dir.is_dir() {
                tracing::warn!("Domain folder not found: {}", domain_dir.display());
                continue;
            }

            for category in categories.keys() {
                let category_dir = domain_dir.join(category);
                if !category_dir.is_dir() {
                    tracing::warn!("Category folder not found: {}", category_dir.display());
                    continue;
                }

                let mut found = Vec::new();
                for entry in fs::read_dir(&category_dir)? {
                    let entry = entry?;
                    let hidden = entry.file_name().to_string_lossy().starts_with('.');
                    if !hidden && entry.file_type()?.is_file() {
                        found.push(entry.path());
                    }
                }
                found.sort();
                tracing::debug!("{}/{}: {} files", domain, category, found.len());
                files.extend(found);
            }
        }

        Ok(files)
    }
}
