use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use toml_edit::DocumentMut;

use envsnap_domain::{
    assign_groups, keep_set, read_base_sections, render_snapshot, resolve_indexes, PackageRegistry,
};

use crate::env::EnvironmentProbe;

/// What the snapshot pass saw and kept. The registry is handed back so
/// post-processing (the torch index patch) does not have to re-probe the
/// environment.
#[derive(Debug)]
pub struct SnapshotSummary {
    pub registry: PackageRegistry,
    pub installed: usize,
    pub pinned: usize,
}

pub fn load_base_document(path: &Path) -> Result<DocumentMut> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading base pyproject from {}", path.display()))?;
    contents
        .parse()
        .with_context(|| format!("parsing {}", path.display()))
}

pub fn write_snapshot(doc: &DocumentMut, path: &Path) -> Result<()> {
    fs::write(path, doc.to_string())
        .with_context(|| format!("writing snapshot to {}", path.display()))
}

/// Run the whole snapshot pass over `doc` in place: probe the environment,
/// classify, resolve indexes, render. One synchronous pass, no re-probing.
pub fn create_snapshot(
    doc: &mut DocumentMut,
    probe: &dyn EnvironmentProbe,
    requirements: &[String],
) -> Result<SnapshotSummary> {
    let registry = PackageRegistry::from_installed(probe.installed_packages()?);
    let roots = probe.root_packages()?;

    let base = read_base_sections(doc)?;
    let assignments = assign_groups(&registry, &base, requirements, &roots);
    let keep = keep_set(&registry, &assignments, &base);
    let resolution = resolve_indexes(&registry, &base, &keep);
    render_snapshot(doc, &registry, &assignments, &keep, &resolution)?;

    tracing::debug!(
        installed = registry.len(),
        pinned = keep.len(),
        groups = assignments.len(),
        "snapshot rendered"
    );
    Ok(SnapshotSummary {
        installed: registry.len(),
        pinned: keep.len(),
        registry,
    })
}
