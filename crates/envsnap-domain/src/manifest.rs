use anyhow::{anyhow, Result};
use indexmap::IndexMap;
use toml_edit::{DocumentMut, Item, Table, TableLike, Value};

/// One entry of the `tool.uv.index` array. Declared entries keep every key the
/// base document carried, not just the ones this crate understands.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    entry: Table,
}

impl IndexEntry {
    pub fn declared<T: TableLike + ?Sized>(source: &T) -> Self {
        let mut entry = Table::new();
        for (key, item) in source.iter() {
            if let Some(value) = item.as_value() {
                entry.insert(key, Item::Value(value.clone().decorated(" ", "")));
            } else {
                entry.insert(key, item.clone());
            }
        }
        Self { entry }
    }

    pub fn inferred(name: &str, url: &str) -> Self {
        let mut entry = Table::new();
        entry.insert("name", toml_edit::value(name));
        entry.insert("url", toml_edit::value(url));
        entry.insert("explicit", toml_edit::value(true));
        Self { entry }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.entry.get("name").and_then(Item::as_str)
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.entry.get("url").and_then(Item::as_str)
    }

    #[must_use]
    pub fn is_explicit(&self) -> bool {
        self.entry
            .get("explicit")
            .and_then(Item::as_bool)
            .unwrap_or(false)
    }

    #[must_use]
    pub fn to_table(&self) -> Table {
        self.entry.clone()
    }
}

/// The four base-document sections the snapshot pass reads.
#[derive(Debug, Default)]
pub struct BaseSections {
    /// `project.dependencies`, verbatim requirement strings.
    pub dependencies: Vec<String>,
    /// `project.optional-dependencies`, group name to requirement strings.
    pub optional_dependencies: IndexMap<String, Vec<String>>,
    /// `tool.uv.sources`, package display name to declared index name.
    pub sources: IndexMap<String, String>,
    /// `tool.uv.index`, declared order preserved.
    pub indexes: Vec<IndexEntry>,
}

/// Read the snapshot-relevant sections out of a base `pyproject.toml`.
///
/// `[project]` and `[tool.uv]` must exist: without them the renderer has
/// nowhere to write. Arrays and tables missing inside them default to empty.
pub fn read_base_sections(doc: &DocumentMut) -> Result<BaseSections> {
    let project = doc
        .get("project")
        .and_then(Item::as_table_like)
        .ok_or_else(|| anyhow!("base pyproject missing [project] table"))?;
    let uv = uv_table(doc)?;

    let dependencies = project
        .get("dependencies")
        .and_then(Item::as_array)
        .map(string_array)
        .unwrap_or_default();

    let mut optional_dependencies = IndexMap::new();
    if let Some(groups) = project
        .get("optional-dependencies")
        .and_then(Item::as_table_like)
    {
        for (group, item) in groups.iter() {
            let specs = item.as_array().map(string_array).unwrap_or_default();
            optional_dependencies.insert(group.to_string(), specs);
        }
    }

    let mut sources = IndexMap::new();
    if let Some(declared) = uv.get("sources").and_then(Item::as_table_like) {
        for (name, item) in declared.iter() {
            match item
                .as_table_like()
                .and_then(|spec| spec.get("index"))
                .and_then(Item::as_str)
            {
                Some(index) => {
                    sources.insert(name.to_string(), index.to_string());
                }
                None => {
                    tracing::debug!("source `{name}` declares no index; ignoring");
                }
            }
        }
    }

    let indexes = read_index_entries(uv);

    Ok(BaseSections {
        dependencies,
        optional_dependencies,
        sources,
        indexes,
    })
}

fn read_index_entries(uv: &dyn TableLike) -> Vec<IndexEntry> {
    match uv.get("index") {
        Some(Item::ArrayOfTables(tables)) => tables.iter().map(IndexEntry::declared).collect(),
        Some(Item::Value(Value::Array(array))) => array
            .iter()
            .filter_map(Value::as_inline_table)
            .map(IndexEntry::declared)
            .collect(),
        _ => Vec::new(),
    }
}

fn string_array(array: &toml_edit::Array) -> Vec<String> {
    array
        .iter()
        .filter_map(|val| val.as_str().map(std::string::ToString::to_string))
        .collect()
}

pub(crate) fn uv_table(doc: &DocumentMut) -> Result<&dyn TableLike> {
    doc.get("tool")
        .and_then(Item::as_table_like)
        .and_then(|tool| tool.get("uv"))
        .and_then(Item::as_table_like)
        .ok_or_else(|| anyhow!("base pyproject missing [tool.uv] table"))
}

pub(crate) fn project_table_mut(doc: &mut DocumentMut) -> Result<&mut Table> {
    doc.get_mut("project")
        .and_then(Item::as_table_mut)
        .ok_or_else(|| anyhow!("base pyproject missing [project] table"))
}

pub(crate) fn uv_table_mut(doc: &mut DocumentMut) -> Result<&mut Table> {
    doc.get_mut("tool")
        .and_then(Item::as_table_mut)
        .and_then(|tool| tool.get_mut("uv"))
        .and_then(Item::as_table_mut)
        .ok_or_else(|| anyhow!("base pyproject missing [tool.uv] table"))
}
