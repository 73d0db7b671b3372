use std::path::PathBuf;
use std::process::Command;

use envsnap_domain::InstalledPackage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("`uv` executable not found on PATH")]
    UvMissing(#[from] which::Error),
    #[error("failed to run `uv {command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`uv {command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("failed to parse `uv {command}` output")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Seam between the snapshot pass and the live environment. The pass calls
/// each method exactly once, before classification starts.
pub trait EnvironmentProbe {
    /// Every installed package in the target environment.
    fn installed_packages(&self) -> Result<Vec<InstalledPackage>, ProbeError>;

    /// Names of the packages the user installed directly (the roots of the
    /// dependency tree).
    fn root_packages(&self) -> Result<Vec<String>, ProbeError>;
}

/// Probes the active environment through `uv`. `uv pip list` and `uv pip tree`
/// both respect the caller's context (an activated virtualenv, for instance),
/// so the snapshot reflects what the user actually runs against.
#[derive(Debug)]
pub struct UvProbe {
    binary: PathBuf,
}

impl UvProbe {
    pub fn locate() -> Result<Self, ProbeError> {
        Ok(Self {
            binary: which::which("uv")?,
        })
    }

    #[must_use]
    pub fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }

    fn run(&self, args: &[&str]) -> Result<String, ProbeError> {
        let command = args.join(" ");
        tracing::debug!("running `uv {command}`");
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|source| ProbeError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl EnvironmentProbe for UvProbe {
    fn installed_packages(&self) -> Result<Vec<InstalledPackage>, ProbeError> {
        let stdout = self.run(&["pip", "list", "--format", "json"])?;
        parse_pip_list(&stdout)
    }

    fn root_packages(&self) -> Result<Vec<String>, ProbeError> {
        let stdout = self.run(&["pip", "tree", "--depth", "0"])?;
        Ok(parse_pip_tree(&stdout))
    }
}

/// Parse `uv pip list --format json`. A row that fails to deserialize is
/// skipped with a warning so one broken provenance record cannot abort the
/// whole snapshot.
fn parse_pip_list(stdout: &str) -> Result<Vec<InstalledPackage>, ProbeError> {
    let rows: Vec<serde_json::Value> =
        serde_json::from_str(stdout).map_err(|source| ProbeError::Parse {
            command: "pip list --format json".to_string(),
            source,
        })?;
    let mut packages = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<InstalledPackage>(row) {
            Ok(pkg) => packages.push(pkg),
            Err(err) => tracing::warn!(%err, "skipping unreadable `uv pip list` row"),
        }
    }
    Ok(packages)
}

/// Parse `uv pip tree --depth 0`: one `name vX.Y.Z` line per root, with
/// box-drawing prefixes on nested output variants.
fn parse_pip_tree(stdout: &str) -> Vec<String> {
    let mut roots = Vec::new();
    for line in stdout.lines() {
        let clean = line.replace("├── ", "").replace("└── ", "");
        let clean = clean.trim();
        if let Some((name, _)) = clean.split_once(" v") {
            roots.push(name.to_string());
        }
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pip_list_rows() -> Result<(), ProbeError> {
        let stdout = r#"[
            {"name": "flask", "version": "3.0.0"},
            {"name": "torch", "version": "2.0.1+cu118", "url": "https://download.pytorch.org/whl/torch.whl"},
            {"name": "my-local-pkg", "version": "0.1.0", "editable": true}
        ]"#;
        let packages = parse_pip_list(stdout)?;
        assert_eq!(packages.len(), 3);
        assert_eq!(packages[0].name, "flask");
        assert!(packages[1].url.is_some());
        assert!(packages[2].editable);
        Ok(())
    }

    #[test]
    fn broken_rows_are_skipped_not_fatal() -> Result<(), ProbeError> {
        let stdout = r#"[
            {"name": "flask", "version": "3.0.0"},
            {"version": "1.0.0"},
            {"name": "numpy"}
        ]"#;
        let packages = parse_pip_list(stdout)?;
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "flask");
        Ok(())
    }

    #[test]
    fn non_json_output_is_a_parse_error() {
        let err = parse_pip_list("uv: command failed").unwrap_err();
        assert!(matches!(err, ProbeError::Parse { .. }));
    }

    #[test]
    fn parses_tree_roots() {
        let stdout = "flask v3.0.0\n├── requests v2.31.0\n└── my-local-pkg v0.1.0\nnoise\n";
        assert_eq!(
            parse_pip_tree(stdout),
            vec!["flask", "requests", "my-local-pkg"]
        );
    }
}
