//! depfresh keeps `pyproject.toml` manifests current: it scans a repository
//! for stale dependency and python version constraints, rewrites them in
//! place, and publishes the result as a GitHub pull request or a patch file.

/// Manifest scanning and update discovery.
pub mod analyzer;

/// CLI argument parsing and token resolution.
pub mod cli;

/// Pipeline orchestration: scan, patch, publish.
pub mod command;

/// Subprocess plumbing for git and gh invocations.
pub mod git;

/// Pull request and patch file publication.
pub mod publish;

/// PyPI and endoflife.date registry clients.
pub mod registry;

/// Result type alias used throughout depfresh.
pub mod result;

/// In-place manifest rewriting.
pub mod updater;

#[cfg(test)]
pub mod test_helpers;
