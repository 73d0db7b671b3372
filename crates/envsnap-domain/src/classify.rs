use std::collections::{BTreeSet, HashMap};

use crate::manifest::BaseSections;
use crate::registry::{canonical_key, requirement_name, PackageRegistry, Provenance};

/// Snapshot-visible group names.
pub const GROUP_PROJECT_DEPENDENCY: &str = "project-dependency";
pub const GROUP_USER_COMPILED: &str = "user-compiled";
pub const GROUP_USER_DOWNLOAD: &str = "user-download";
pub const GROUP_OTHER_VCS: &str = "other-vcs";

/// Rule priorities, higher overrides lower. The comparison is strictly
/// greater-than, so within one level the first assignment sticks.
pub const PRIORITY_ROOT_DEPENDENCY: u8 = 10;
pub const PRIORITY_BASE_TOML: u8 = 20;
pub const PRIORITY_REQUIREMENTS: u8 = 30;
pub const PRIORITY_ENV_INFERENCE: u8 = 40;

#[derive(Debug, Clone)]
struct AssignedGroup {
    group: String,
    priority: u8,
}

/// Per-package group decisions, reduced from candidate `(name, group,
/// priority)` events. Only the highest-priority event per canonical key
/// survives.
#[derive(Debug, Default)]
pub struct GroupAssignments {
    assigned: HashMap<String, AssignedGroup>,
}

impl GroupAssignments {
    /// Record a candidate assignment. Names not present in the registry are a
    /// silent no-op: rule inputs routinely mention packages that are not
    /// installed.
    pub fn assign(&mut self, registry: &PackageRegistry, name: &str, group: &str, priority: u8) {
        let key = canonical_key(name);
        if !registry.contains(&key) {
            tracing::debug!("`{name}` is not installed; skipping `{group}` assignment");
            return;
        }
        let replace = self
            .assigned
            .get(&key)
            .is_none_or(|current| priority > current.priority);
        if replace {
            self.assigned.insert(
                key,
                AssignedGroup {
                    group: group.to_string(),
                    priority,
                },
            );
        }
    }

    #[must_use]
    pub fn group_of(&self, key: &str) -> Option<&str> {
        self.assigned.get(key).map(|a| a.group.as_str())
    }

    pub fn assigned_keys(&self) -> impl Iterator<Item = &String> {
        self.assigned.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

/// Group implied by installation provenance, if any.
#[must_use]
pub fn infer_group(provenance: Provenance) -> Option<&'static str> {
    match provenance {
        Provenance::Editable | Provenance::LocalFile => Some(GROUP_USER_COMPILED),
        Provenance::Vcs => Some(GROUP_OTHER_VCS),
        Provenance::WheelDownload => Some(GROUP_USER_DOWNLOAD),
        Provenance::Unknown => None,
    }
}

/// Run every classification rule in priority order and reduce to one group per
/// package. Packages no rule matches stay unassigned and are dropped from the
/// snapshot.
#[must_use]
pub fn assign_groups(
    registry: &PackageRegistry,
    base: &BaseSections,
    requirements: &[String],
    roots: &[String],
) -> GroupAssignments {
    let mut assignments = GroupAssignments::default();

    for name in roots {
        assignments.assign(registry, name, GROUP_USER_DOWNLOAD, PRIORITY_ROOT_DEPENDENCY);
    }

    for spec in &base.dependencies {
        assignments.assign(
            registry,
            &requirement_name(spec),
            GROUP_PROJECT_DEPENDENCY,
            PRIORITY_BASE_TOML,
        );
    }
    for (group, specs) in &base.optional_dependencies {
        for spec in specs {
            assignments.assign(registry, &requirement_name(spec), group, PRIORITY_BASE_TOML);
        }
    }

    for name in requirements {
        assignments.assign(
            registry,
            name,
            GROUP_PROJECT_DEPENDENCY,
            PRIORITY_REQUIREMENTS,
        );
    }

    for (key, pkg) in registry.iter() {
        if let Some(group) = infer_group(pkg.provenance()) {
            assignments.assign(registry, key, group, PRIORITY_ENV_INFERENCE);
        }
    }

    assignments
}

/// Packages eligible for rendering: anything with an assigned group, plus
/// installed packages the base document already names in `tool.uv.sources`.
#[must_use]
pub fn keep_set(
    registry: &PackageRegistry,
    assignments: &GroupAssignments,
    base: &BaseSections,
) -> BTreeSet<String> {
    let mut keep: BTreeSet<String> = assignments.assigned_keys().cloned().collect();
    for name in base.sources.keys() {
        let key = canonical_key(name);
        if registry.contains(&key) {
            keep.insert(key);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InstalledPackage;

    fn registry(rows: &[(&str, &str)]) -> PackageRegistry {
        PackageRegistry::from_installed(
            rows.iter()
                .map(|(name, version)| InstalledPackage {
                    name: (*name).to_string(),
                    version: (*version).to_string(),
                    url: None,
                    editable: false,
                })
                .collect(),
        )
    }

    #[test]
    fn higher_priority_overwrites_lower() {
        let registry = registry(&[("demo", "1.0")]);
        let mut assignments = GroupAssignments::default();
        assignments.assign(&registry, "demo", GROUP_USER_DOWNLOAD, PRIORITY_ROOT_DEPENDENCY);
        assignments.assign(&registry, "demo", GROUP_USER_COMPILED, PRIORITY_ENV_INFERENCE);
        assert_eq!(assignments.group_of("demo"), Some(GROUP_USER_COMPILED));
    }

    #[test]
    fn lower_priority_never_overwrites_higher() {
        let registry = registry(&[("demo", "1.0")]);
        let mut assignments = GroupAssignments::default();
        assignments.assign(&registry, "demo", GROUP_USER_COMPILED, PRIORITY_ENV_INFERENCE);
        assignments.assign(&registry, "demo", GROUP_USER_DOWNLOAD, PRIORITY_ROOT_DEPENDENCY);
        assert_eq!(assignments.group_of("demo"), Some(GROUP_USER_COMPILED));
    }

    #[test]
    fn equal_priority_keeps_first_assignment() {
        let registry = registry(&[("demo", "1.0")]);
        let mut assignments = GroupAssignments::default();
        assignments.assign(&registry, "demo", "gpu", PRIORITY_BASE_TOML);
        assignments.assign(&registry, "demo", "cpu", PRIORITY_BASE_TOML);
        assert_eq!(assignments.group_of("demo"), Some("gpu"));
    }

    #[test]
    fn uninstalled_names_are_ignored() {
        let registry = registry(&[("demo", "1.0")]);
        let mut assignments = GroupAssignments::default();
        assignments.assign(&registry, "ghost", GROUP_USER_DOWNLOAD, PRIORITY_ROOT_DEPENDENCY);
        assert!(assignments.is_empty());
    }

    #[test]
    fn requirements_override_base_optional_group() {
        let registry = registry(&[("numpy", "1.24.0")]);
        let mut base = BaseSections::default();
        base.optional_dependencies
            .insert("science".to_string(), vec!["numpy".to_string()]);
        let assignments =
            assign_groups(&registry, &base, &["numpy".to_string()], &["numpy".to_string()]);
        assert_eq!(assignments.group_of("numpy"), Some(GROUP_PROJECT_DEPENDENCY));
    }

    #[test]
    fn roots_without_other_evidence_become_user_download() {
        let registry = registry(&[("requests", "2.31.0")]);
        let base = BaseSections::default();
        let assignments = assign_groups(&registry, &base, &[], &["requests".to_string()]);
        assert_eq!(assignments.group_of("requests"), Some(GROUP_USER_DOWNLOAD));
    }

    #[test]
    fn editable_install_beats_every_membership_rule() {
        let registry = PackageRegistry::from_installed(vec![InstalledPackage {
            name: "my-local-pkg".to_string(),
            version: "0.1.0".to_string(),
            url: None,
            editable: true,
        }]);
        let mut base = BaseSections::default();
        base.dependencies.push("my-local-pkg".to_string());
        let assignments = assign_groups(
            &registry,
            &base,
            &["my-local-pkg".to_string()],
            &["my-local-pkg".to_string()],
        );
        assert_eq!(assignments.group_of("my-local-pkg"), Some(GROUP_USER_COMPILED));
    }

    #[test]
    fn vcs_checkout_lands_in_other_vcs() {
        let registry = PackageRegistry::from_installed(vec![InstalledPackage {
            name: "libfoo".to_string(),
            version: "0.3.0".to_string(),
            url: Some("git+https://github.com/me/libfoo".to_string()),
            editable: false,
        }]);
        let assignments = assign_groups(&registry, &BaseSections::default(), &[], &[]);
        assert_eq!(assignments.group_of("libfoo"), Some(GROUP_OTHER_VCS));
    }

    #[test]
    fn unmatched_packages_stay_unassigned() {
        let registry = registry(&[("transitive-noise", "0.0.1")]);
        let assignments = assign_groups(&registry, &BaseSections::default(), &[], &[]);
        assert!(assignments.group_of("transitive-noise").is_none());
    }

    #[test]
    fn keep_set_includes_base_declared_sources() {
        let registry = registry(&[("torch", "2.0.1"), ("numpy", "1.24.0")]);
        let mut base = BaseSections::default();
        base.sources
            .insert("Torch".to_string(), "pytorch-cuda".to_string());
        base.sources
            .insert("ghost".to_string(), "nowhere".to_string());
        let assignments = assign_groups(&registry, &base, &["numpy".to_string()], &[]);
        let keep = keep_set(&registry, &assignments, &base);
        assert!(keep.contains("torch"));
        assert!(keep.contains("numpy"));
        assert!(!keep.contains("ghost"));
    }
}
