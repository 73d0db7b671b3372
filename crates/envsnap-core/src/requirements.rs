use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use envsnap_domain::requirement_name;

/// Read the package names out of a requirements listing. A missing file is an
/// empty list: the snapshot simply has no requirement-forced packages then.
pub fn read_requirements_file(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading requirements from {}", path.display()))?;
    let mut names = Vec::new();
    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        names.push(requirement_name(trimmed));
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_empty_list() -> Result<()> {
        let names = read_requirements_file(&PathBuf::from("/nonexistent/requirements.txt"))?;
        assert!(names.is_empty());
        Ok(())
    }

    #[test]
    fn extracts_names_and_skips_comments() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("requirements.txt");
        fs::write(
            &path,
            "# pinned by CI\nflask>=2.0\n\nnumpy==1.24.0\ntorch==2.0.1+cu118\n",
        )?;

        let names = read_requirements_file(&path)?;
        assert_eq!(names, vec!["flask", "numpy", "torch"]);
        Ok(())
    }
}
