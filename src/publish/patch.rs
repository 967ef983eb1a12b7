//! Offline publishing: commit the updates on the update branch and write
//! a `git format-patch` file instead of opening a pull request.
use color_eyre::eyre::WrapErr;
use log::*;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{git::Git, result::Result};

const PATCH_COMMIT_MESSAGE: &str =
    "chore(depfresh): update dependencies [offline-mode]";

/// Commits `files` on `branch` and writes the resulting patch to `output`.
/// The original branch is checked out again afterwards, on failure too.
pub fn create_patch(
    git: &Git,
    branch: &str,
    files: &[PathBuf],
    output: &Path,
) -> Result<PathBuf> {
    let original_branch = git.show_current_branch()?;

    match build_patch(git, branch, files, output) {
        Ok(path) => {
            git.checkout(&original_branch)?;
            info!("restored branch {}", original_branch);
            Ok(path)
        }
        Err(err) => {
            if !original_branch.is_empty()
                && let Err(restore_err) = git.checkout(&original_branch)
            {
                error!(
                    "failed to restore branch {}: {}",
                    original_branch, restore_err
                );
            }
            Err(err)
        }
    }
}

fn build_patch(
    git: &Git,
    branch: &str,
    files: &[PathBuf],
    output: &Path,
) -> Result<PathBuf> {
    if git.checkout_new(branch).is_err() {
        debug!("branch {} already exists, checking it out", branch);
        git.checkout(branch)?;
    }

    for file in files {
        git.add(file)?;
    }

    git.commit(PATCH_COMMIT_MESSAGE)?;

    let patch = git.format_patch_head()?;

    let path = std::path::absolute(output).wrap_err_with(|| {
        format!("could not resolve patch path {}", output.display())
    })?;

    fs::write(&path, patch).wrap_err_with(|| {
        format!("could not write patch to {}", path.display())
    })?;

    Ok(path)
}
