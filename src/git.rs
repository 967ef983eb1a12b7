//! Thin wrapper over the git CLI.
//!
//! Commands run through the [`CommandRunner`] trait so tests can script
//! process output instead of spawning real subprocesses.
use color_eyre::eyre::{WrapErr, eyre};
use log::*;
use std::{
    path::{Path, PathBuf},
    process::Command,
    sync::Arc,
};

use crate::result::Result;

/// Captured output of one subprocess invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external programs. The production implementation spawns real
/// processes; tests substitute scripted responses.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        program: &str,
        args: &[String],
        dir: &Path,
        envs: &[(String, String)],
    ) -> Result<CommandOutput>;
}

/// Spawns the requested program and captures its output.
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        dir: &Path,
        envs: &[(String, String)],
    ) -> Result<CommandOutput> {
        debug!("running {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .envs(envs.iter().map(|(key, value)| (key.as_str(), value.as_str())))
            .output()
            .wrap_err_with(|| format!("failed to execute {program}"))?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Git operations scoped to one repository checkout.
pub struct Git {
    runner: Arc<dyn CommandRunner>,
    path: PathBuf,
}

impl Git {
    pub fn new(path: &Path, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let args: Vec<String> =
            args.iter().map(|arg| arg.to_string()).collect();
        self.runner.run("git", &args, &self.path, &[])
    }

    fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;

        if !output.success {
            return Err(eyre!(
                "git {} failed: {}",
                args.join(" "),
                output.stderr.trim()
            ));
        }

        Ok(output.stdout.trim().to_string())
    }

    pub fn remote_origin_url(&self) -> Result<String> {
        self.run_checked(&["config", "--get", "remote.origin.url"])
    }

    pub fn current_branch(&self) -> Result<String> {
        self.run_checked(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Unlike [`Self::current_branch`] this returns an empty string on a
    /// detached HEAD instead of the literal "HEAD".
    pub fn show_current_branch(&self) -> Result<String> {
        self.run_checked(&["branch", "--show-current"])
    }

    pub fn branch_exists(&self, branch: &str) -> Result<bool> {
        let output = self.run(&["rev-parse", "--verify", branch])?;
        Ok(output.success)
    }

    pub fn checkout(&self, branch: &str) -> Result<()> {
        self.run_checked(&["checkout", branch])?;
        Ok(())
    }

    pub fn checkout_new(&self, branch: &str) -> Result<()> {
        self.run_checked(&["checkout", "-b", branch])?;
        Ok(())
    }

    pub fn add(&self, file: &Path) -> Result<()> {
        let file = file.display().to_string();
        self.run_checked(&["add", &file])?;
        Ok(())
    }

    pub fn commit(&self, message: &str) -> Result<()> {
        self.run_checked(&["commit", "-m", message])?;
        Ok(())
    }

    pub fn push_force(&self, branch: &str) -> Result<()> {
        self.run_checked(&["push", "origin", branch, "--force"])?;
        Ok(())
    }

    pub fn has_changes(&self) -> Result<bool> {
        let status = self.run_checked(&["status", "--porcelain"])?;
        Ok(!status.is_empty())
    }

    pub fn config_set(&self, key: &str, value: &str) -> Result<()> {
        self.run_checked(&["config", key, value])?;
        Ok(())
    }

    /// Patch text for the last commit. Stdout is passed through untrimmed
    /// so the patch file keeps its trailing newline.
    pub fn format_patch_head(&self) -> Result<String> {
        let output = self.run(&["format-patch", "HEAD^", "--stdout"])?;

        if !output.success {
            return Err(eyre!(
                "git format-patch failed: {}",
                output.stderr.trim()
            ));
        }

        Ok(output.stdout)
    }
}
