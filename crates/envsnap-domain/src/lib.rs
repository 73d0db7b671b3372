#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod classify;
pub mod index;
pub mod manifest;
pub mod registry;
pub mod render;

pub use classify::{
    assign_groups, infer_group, keep_set, GroupAssignments, GROUP_OTHER_VCS,
    GROUP_PROJECT_DEPENDENCY, GROUP_USER_COMPILED, GROUP_USER_DOWNLOAD, PRIORITY_BASE_TOML,
    PRIORITY_ENV_INFERENCE, PRIORITY_REQUIREMENTS, PRIORITY_ROOT_DEPENDENCY,
};
pub use index::{index_name_from_url, resolve_indexes, IndexResolution, PLACEHOLDER_INDEX_URL};
pub use manifest::{read_base_sections, BaseSections, IndexEntry};
pub use registry::{canonical_key, requirement_name, InstalledPackage, PackageRegistry, Provenance};
pub use render::render_snapshot;
