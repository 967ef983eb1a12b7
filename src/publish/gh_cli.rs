//! Pull request backend that shells out to the `gh` CLI.
//!
//! Used as a fallback when the REST API is unavailable, for instance when
//! no token is configured but the CLI is already authenticated.
use async_trait::async_trait;
use color_eyre::eyre::eyre;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    git::{CommandOutput, CommandRunner},
    publish::{
        request::{CreatePrRequest, PullRequest},
        traits::Backend,
    },
    result::Result,
};

#[derive(Debug, Deserialize)]
struct GhPullRequest {
    number: u64,
    url: String,
}

/// Spawns `gh` in the repository checkout.
pub struct GhCli {
    runner: Arc<dyn CommandRunner>,
    repo_path: PathBuf,
    token: Option<SecretString>,
}

impl GhCli {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        repo_path: &Path,
        token: Option<SecretString>,
    ) -> Self {
        Self {
            runner,
            repo_path: repo_path.to_path_buf(),
            token,
        }
    }

    fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let args: Vec<String> =
            args.iter().map(|arg| arg.to_string()).collect();

        let envs: Vec<(String, String)> = match &self.token {
            Some(token) => vec![(
                "GITHUB_TOKEN".to_string(),
                token.expose_secret().to_string(),
            )],
            None => vec![],
        };

        self.runner.run("gh", &args, &self.repo_path, &envs)
    }
}

#[async_trait]
impl Backend for GhCli {
    fn name(&self) -> &'static str {
        "gh-cli"
    }

    async fn find_open_pr(
        &self,
        head_branch: &str,
    ) -> Result<Option<PullRequest>> {
        let output = self.run(&[
            "pr",
            "list",
            "--head",
            head_branch,
            "--json",
            "number,url",
        ])?;

        if !output.success {
            return Err(eyre!(
                "gh pr list failed: {}",
                output.stderr.trim()
            ));
        }

        let prs: Vec<GhPullRequest> =
            serde_json::from_str(output.stdout.trim())?;

        Ok(prs.into_iter().next().map(|pr| PullRequest {
            number: pr.number,
            url: pr.url,
        }))
    }

    async fn create_pr(&self, request: &CreatePrRequest) -> Result<String> {
        // gh resolves the base branch itself from the repository default.
        let output = self.run(&[
            "pr",
            "create",
            "--title",
            &request.title,
            "--body",
            &request.body,
            "--head",
            &request.head_branch,
        ])?;

        if !output.success {
            return Err(eyre!(
                "gh pr create failed: {}",
                output.stderr.trim()
            ));
        }

        Ok(output.stdout.trim().to_string())
    }
}
