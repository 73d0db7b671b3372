#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

mod env;
mod patch;
mod requirements;
mod snapshot;

pub use env::{EnvironmentProbe, ProbeError, UvProbe};
pub use patch::{apply_torch_index_patch, torch_download_url};
pub use requirements::read_requirements_file;
pub use snapshot::{create_snapshot, load_base_document, write_snapshot, SnapshotSummary};
