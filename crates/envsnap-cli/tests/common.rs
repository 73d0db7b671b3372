#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub fn write_file(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write fixture");
}

/// Drop a stub `uv` script into `dir/bin` that answers `pip list` and
/// `pip tree` with canned output, and return the bin directory for PATH.
#[cfg(unix)]
pub fn install_fake_uv(dir: &Path, pip_list_json: &str, pip_tree: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let bin = dir.join("bin");
    fs::create_dir_all(&bin).expect("create bin dir");
    let script = format!(
        "#!/bin/sh\n\
         case \"$*\" in\n\
           *\"pip list\"*)\n\
             cat <<'EOF'\n\
         {pip_list_json}\n\
         EOF\n\
             ;;\n\
           *\"pip tree\"*)\n\
             cat <<'EOF'\n\
         {pip_tree}\n\
         EOF\n\
             ;;\n\
         esac\n"
    );
    let uv = bin.join("uv");
    fs::write(&uv, script).expect("write uv stub");
    let mut perms = fs::metadata(&uv).expect("stat uv stub").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&uv, perms).expect("chmod uv stub");
    bin
}

pub fn path_with(bin: &Path) -> String {
    format!(
        "{}:{}",
        bin.display(),
        std::env::var("PATH").unwrap_or_default()
    )
}
