use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use url::Url;

use crate::manifest::{BaseSections, IndexEntry};
use crate::registry::{canonical_key, PackageRegistry};

/// Filler for an inferred index with no known source URL. Structurally valid
/// TOML, guaranteed unresolvable, so the gap is visible to whoever completes
/// the snapshot by hand.
pub const PLACEHOLDER_INDEX_URL: &str = "https://example.invalid/simple";

/// Derive an index name from a source URL: the host, lowercased, with `.` and
/// the port-separating `:` turned into `-`. Empty when the URL has no host.
#[must_use]
pub fn index_name_from_url(raw: &str) -> String {
    let netloc = match Url::parse(raw) {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default().to_lowercase();
            match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host,
            }
        }
        Err(_) => raw
            .split("//")
            .nth(1)
            .and_then(|rest| rest.split('/').next())
            .unwrap_or_default()
            .to_lowercase(),
    };
    netloc.replace(['.', ':'], "-")
}

/// Index attribution for the keep set, plus the merged index table.
#[derive(Debug, Default)]
pub struct IndexResolution {
    /// Package display name to resolved index name, sorted for stable output.
    pub sources: BTreeMap<String, String>,
    /// Declared entries verbatim and in order, then inferred entries appended
    /// in sorted name order.
    pub merged: Vec<IndexEntry>,
}

/// Resolve which index each keep-set package is attributed to and merge any
/// newly referenced index names into the declared index table.
///
/// A base-declared `tool.uv.sources` mapping always wins; otherwise the name
/// is derived from the package's install URL; otherwise the package carries no
/// index. Merging is idempotent by index name.
#[must_use]
pub fn resolve_indexes(
    registry: &PackageRegistry,
    base: &BaseSections,
    keep: &BTreeSet<String>,
) -> IndexResolution {
    let mut resolved: HashMap<String, String> = HashMap::new();
    for (name, index) in &base.sources {
        let key = canonical_key(name);
        if registry.contains(&key) {
            resolved.insert(key, index.clone());
        }
    }
    for (key, pkg) in registry.iter() {
        if resolved.contains_key(key) {
            continue;
        }
        if let Some(url) = pkg.url.as_deref() {
            let name = index_name_from_url(url);
            if !name.is_empty() {
                resolved.insert(key.clone(), name);
            }
        }
    }

    let mut sources = BTreeMap::new();
    let mut known_urls: BTreeMap<String, String> = BTreeMap::new();
    for key in keep {
        let Some(pkg) = registry.get(key) else {
            continue;
        };
        let Some(index) = resolved.get(key).filter(|name| !name.is_empty()) else {
            continue;
        };
        sources.insert(pkg.name.clone(), index.clone());
        if let Some(url) = pkg.url.as_deref() {
            known_urls
                .entry(index.clone())
                .or_insert_with(|| url.to_string());
        }
    }

    let mut merged = base.indexes.clone();
    let declared: HashSet<String> = merged
        .iter()
        .filter_map(|entry| entry.name().map(str::to_string))
        .collect();
    let required: BTreeSet<&String> = sources.values().collect();
    for name in required {
        if declared.contains(name.as_str()) {
            continue;
        }
        let url = known_urls.get(name).cloned().unwrap_or_else(|| {
            tracing::warn!(
                "no source URL known for inferred index `{name}`; writing placeholder"
            );
            PLACEHOLDER_INDEX_URL.to_string()
        });
        merged.push(IndexEntry::inferred(name, &url));
    }

    IndexResolution { sources, merged }
}
