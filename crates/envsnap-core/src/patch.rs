use std::str::FromStr;

use pep440_rs::Version;
use toml_edit::{DocumentMut, Item, Table, Value};

use envsnap_domain::PackageRegistry;

/// PyTorch wheel index for the installed build, derived from the local
/// version segment (`2.0.1+cu118` selects `.../whl/cu118`). `None` when torch
/// is not installed or carries no local segment.
pub fn torch_download_url(registry: &PackageRegistry) -> Option<String> {
    let torch = registry.get("torch")?;
    let version = Version::from_str(&torch.version).ok()?;
    let local = version.local();
    if local.is_empty() {
        return None;
    }
    let tag = local
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".");
    Some(format!("https://download.pytorch.org/whl/{tag}"))
}

/// Rewrite `tool.uv.index` entries whose URL still holds the `XXX`
/// placeholder to the real PyTorch index for the installed torch build.
/// No-op when torch is absent, has no local segment, or no index table exists.
pub fn apply_torch_index_patch(doc: &mut DocumentMut, registry: &PackageRegistry) {
    let Some(url) = torch_download_url(registry) else {
        return;
    };
    let Some(uv) = doc
        .get_mut("tool")
        .and_then(Item::as_table_mut)
        .and_then(|tool| tool.get_mut("uv"))
        .and_then(Item::as_table_mut)
    else {
        return;
    };
    match uv.get_mut("index") {
        Some(Item::ArrayOfTables(tables)) => {
            for table in tables.iter_mut() {
                patch_table(table, &url);
            }
        }
        Some(Item::Value(Value::Array(array))) => {
            for value in array.iter_mut() {
                if let Value::InlineTable(table) = value {
                    let placeholder = table
                        .get("url")
                        .and_then(Value::as_str)
                        .is_some_and(|u| u.contains("XXX"));
                    if placeholder {
                        table.insert("url", Value::from(url.as_str()));
                    }
                }
            }
        }
        _ => {}
    }
}

fn patch_table(table: &mut Table, url: &str) {
    let placeholder = table
        .get("url")
        .and_then(Item::as_str)
        .is_some_and(|u| u.contains("XXX"));
    if placeholder {
        tracing::debug!("patching placeholder index url to {url}");
        table.insert("url", toml_edit::value(url));
    }
}
