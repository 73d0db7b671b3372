use std::collections::BTreeSet;

use anyhow::Result;
use toml_edit::{Array, ArrayOfTables, DocumentMut, InlineTable, Item, Table, Value};

use crate::classify::{GroupAssignments, GROUP_PROJECT_DEPENDENCY};
use crate::index::IndexResolution;
use crate::manifest::{project_table_mut, uv_table_mut};
use crate::registry::PackageRegistry;

/// Rewrite the four snapshot sections of `doc` from the classified registry:
/// `project.dependencies`, `project.optional-dependencies`, `tool.uv.sources`
/// and `tool.uv.index`. Everything else in the document, formatting and
/// comments included, is left untouched.
///
/// Iteration is in canonical-name order, so identical inputs render
/// byte-identical sections regardless of enumeration order.
pub fn render_snapshot(
    doc: &mut DocumentMut,
    registry: &PackageRegistry,
    assignments: &GroupAssignments,
    keep: &BTreeSet<String>,
    resolution: &IndexResolution,
) -> Result<()> {
    // Fail on a malformed document before any section is replaced.
    project_table_mut(doc)?;
    uv_table_mut(doc)?;

    let mut dependencies = Array::new();
    let mut optional = Table::new();
    for key in keep {
        let Some(pkg) = registry.get(key) else {
            continue;
        };
        match assignments.group_of(key) {
            Some(GROUP_PROJECT_DEPENDENCY) => {
                dependencies.push(pkg.pin());
            }
            Some(group) => {
                let entry = optional
                    .entry(group)
                    .or_insert(Item::Value(Value::Array(Array::new())));
                if let Some(array) = entry.as_array_mut() {
                    array.push(pkg.pin());
                }
            }
            // Kept only because the base source mapping names it; it still
            // shows up in tool.uv.sources but pins nothing.
            None => {}
        }
    }

    let project = project_table_mut(doc)?;
    project.insert("dependencies", Item::Value(Value::Array(dependencies)));
    project.insert("optional-dependencies", Item::Table(optional));

    let mut sources = Table::new();
    for (display_name, index_name) in &resolution.sources {
        let mut spec = InlineTable::new();
        spec.insert("index", Value::from(index_name.as_str()));
        sources.insert(display_name, Item::Value(Value::InlineTable(spec)));
    }

    let mut indexes = ArrayOfTables::new();
    for entry in &resolution.merged {
        indexes.push(entry.to_table());
    }

    let uv = uv_table_mut(doc)?;
    uv.insert("sources", Item::Table(sources));
    uv.insert("index", Item::ArrayOfTables(indexes));

    Ok(())
}
