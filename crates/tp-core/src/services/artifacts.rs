use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{ProvisionError, Result};
use crate::models::{BuildProfile, LocatedArtifacts, ProvisionConfig};

pub const SEARCH_MAX_DEPTH: usize = 4;

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

pub fn fixed_path(output_root: &Path, profile: BuildProfile, name: &str) -> PathBuf {
    output_root.join(profile.output_dir()).join(name)
}

/// First executable regular file named exactly `name` under `output_root`.
pub fn search(output_root: &Path, name: &str) -> Option<PathBuf> {
    WalkDir::new(output_root)
        .max_depth(SEARCH_MAX_DEPTH)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == name)
        .map(|entry| entry.into_path())
        .find(|path| is_executable(path))
}

/// Fixed profile path first, bounded search second.
pub fn locate(output_root: &Path, profile: BuildProfile, name: &str) -> Result<PathBuf> {
    let expected = fixed_path(output_root, profile, name);
    if is_executable(&expected) {
        return Ok(expected);
    }
    tracing::warn!(
        expected = %expected.display(),
        "binary not at the profile path, searching the build output"
    );
    search(output_root, name).ok_or_else(|| ProvisionError::ArtifactNotFound(name.to_string()))
}

pub fn locate_binaries(config: &ProvisionConfig) -> Result<LocatedArtifacts> {
    let root = config.build_output_root();
    let client_bin = locate(&root, config.build_profile, &config.client_bin_name)?;
    let server_bin = locate(&root, config.build_profile, &config.server_bin_name)?;
    tracing::info!(
        client = %client_bin.display(),
        server = %server_bin.display(),
        "binaries located"
    );
    Ok(LocatedArtifacts {
        client_bin,
        server_bin,
    })
}
