use std::str::FromStr;

use indexmap::IndexMap;
use pep508_rs::Requirement;
use serde::Deserialize;

/// PEP 503 canonical form: lowercase, runs of `-`/`_`/`.` collapse to `-`.
/// Every registry lookup goes through this key.
pub fn canonical_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.trim().chars() {
        if matches!(ch, '-' | '_' | '.') {
            pending_sep = !key.is_empty();
        } else {
            if pending_sep {
                key.push('-');
                pending_sep = false;
            }
            key.push(ch.to_ascii_lowercase());
        }
    }
    key
}

/// Extract the package name from a PEP 508 requirement string, falling back to
/// a bare-name head parse for lines the strict parser rejects.
pub fn requirement_name(spec: &str) -> String {
    Requirement::from_str(spec.trim())
        .map_or_else(|_| bare_requirement_name(spec), |req| req.name.to_string())
}

fn bare_requirement_name(spec: &str) -> String {
    let trimmed = spec.trim();
    let mut end = trimmed.len();
    for (idx, ch) in trimmed.char_indices() {
        if ch.is_ascii_whitespace() || matches!(ch, '<' | '>' | '=' | '!' | '~' | ';' | '[' | '(')
        {
            end = idx;
            break;
        }
    }
    trimmed[..end].to_string()
}

/// One row of `uv pip list --format json`.
#[derive(Debug, Clone, Deserialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    /// Direct install URL (from `direct_url.json`), absent for index installs.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub editable: bool,
}

impl InstalledPackage {
    #[must_use]
    pub fn pin(&self) -> String {
        format!("{}=={}", self.name, self.version)
    }

    /// How this package came to be installed. Editable wins over every
    /// URL-derived kind; the URL kinds are mutually exclusive by scheme.
    #[must_use]
    pub fn provenance(&self) -> Provenance {
        if self.editable {
            return Provenance::Editable;
        }
        let Some(url) = self.url.as_deref() else {
            return Provenance::Unknown;
        };
        if url.starts_with("file://") {
            Provenance::LocalFile
        } else if url.starts_with("git+") {
            Provenance::Vcs
        } else if (url.starts_with("http://") || url.starts_with("https://"))
            && url.to_ascii_lowercase().ends_with(".whl")
        {
            Provenance::WheelDownload
        } else {
            Provenance::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Editable,
    LocalFile,
    Vcs,
    WheelDownload,
    Unknown,
}

/// Installed packages keyed by canonical name, in enumeration order.
#[derive(Debug, Default)]
pub struct PackageRegistry {
    packages: IndexMap<String, InstalledPackage>,
}

impl PackageRegistry {
    #[must_use]
    pub fn from_installed(rows: Vec<InstalledPackage>) -> Self {
        let mut packages = IndexMap::new();
        for row in rows {
            let key = canonical_key(&row.name);
            if key.is_empty() {
                tracing::debug!("skipping installed row with empty name");
                continue;
            }
            packages.insert(key, row);
        }
        Self { packages }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&InstalledPackage> {
        self.packages.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.packages.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &InstalledPackage)> {
        self.packages.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
