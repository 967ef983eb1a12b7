//! Publishes applied updates as a GitHub pull request or an offline patch.
use color_eyre::eyre::eyre;
use git_url_parse::GitUrl;
use log::*;
use std::{env, path::PathBuf};

use crate::{
    git::Git,
    publish::{request::CreatePrRequest, traits::Backend},
    result::Result,
};

/// GitHub CLI backed pull request backend.
pub mod gh_cli;
/// REST API backed pull request backend.
pub mod github;
/// Offline patch generation for air-gapped environments.
pub mod patch;
/// Request and response types shared by the backends.
pub mod request;
/// The pull request backend trait.
pub mod traits;

/// Branch that carries dependency updates. Reused run to run so repeated
/// invocations update one pull request instead of opening new ones.
pub const UPDATE_BRANCH: &str = "depfresh/dependency-updates";

/// Base branch pull requests target.
pub const DEFAULT_BASE_BRANCH: &str = "main";

const BOT_NAME: &str = "depfresh-bot";
const BOT_EMAIL: &str = "depfresh-bot@noreply.github.com";
const COMMIT_MESSAGE: &str =
    "chore(depfresh): update dependencies and python version";
const PR_TITLE: &str = "Update dependencies and Python version";
const PR_BODY: &str = "Automated dependency update.\n\n\
    This pull request bumps outdated package pins in pyproject.toml files \
    and refreshes the requires-python constraint when its floor has fallen \
    out of upstream support.";

/// What publishing produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Published {
    /// The working tree was already clean on the update branch.
    NothingToCommit,
    /// A pull request was created or refreshed.
    PullRequest { url: String },
}

/// Owner and repository name parsed from the origin remote. `None` when
/// the remote is missing, unparseable, or not hosted on github.com.
pub fn repo_identity(git: &Git) -> Option<(String, String)> {
    let remote = match git.remote_origin_url() {
        Ok(remote) => remote,
        Err(err) => {
            warn!("could not read remote.origin.url: {}", err);
            return None;
        }
    };

    let parsed = match GitUrl::parse(&remote) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!("could not parse remote url {}: {}", remote, err);
            return None;
        }
    };

    let host = match parsed.host {
        Some(host) => host,
        None => {
            warn!("remote url {} has no host", remote);
            return None;
        }
    };

    if host != "github.com" {
        warn!("remote host {} is not github.com, skipping api backend", host);
        return None;
    }

    let owner = match parsed.owner {
        Some(owner) => owner,
        None => {
            warn!("remote url {} has no owner", remote);
            return None;
        }
    };

    Some((owner, parsed.name))
}

/// Commits changed files on the update branch and opens or refreshes a
/// pull request through the first backend that succeeds.
pub struct Publisher {
    git: Git,
    backends: Vec<Box<dyn Backend>>,
}

impl Publisher {
    pub fn new(git: Git, backends: Vec<Box<dyn Backend>>) -> Self {
        Self { git, backends }
    }

    pub async fn publish(
        &self,
        branch: &str,
        files: &[PathBuf],
    ) -> Result<Published> {
        self.prepare_branch(branch)?;

        for file in files {
            self.git.add(file)?;
        }

        if !self.git.has_changes()? {
            info!("branch {} already carries these updates", branch);
            return Ok(Published::NothingToCommit);
        }

        self.git.commit(COMMIT_MESSAGE)?;
        self.git.push_force(branch)?;

        let request = CreatePrRequest {
            head_branch: branch.to_string(),
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
            title: PR_TITLE.to_string(),
            body: PR_BODY.to_string(),
        };

        let mut attempted = vec![];

        for backend in &self.backends {
            match open_or_reuse(backend.as_ref(), &request).await {
                Ok(url) => return Ok(Published::PullRequest { url }),
                Err(err) => {
                    warn!("{} backend failed: {err:#}", backend.name());
                    attempted.push(backend.name());
                }
            }
        }

        Err(eyre!(
            "could not create a pull request, attempted backends: {}",
            attempted.join(", ")
        ))
    }

    fn prepare_branch(&self, branch: &str) -> Result<()> {
        self.git.config_set("user.name", BOT_NAME)?;
        self.git.config_set("user.email", BOT_EMAIL)?;

        if env::var("GITHUB_ACTIONS").as_deref() == Ok("true") {
            info!("running inside github actions");
        }

        if self.git.current_branch()? != branch {
            if self.git.branch_exists(branch)? {
                self.git.checkout(branch)?;
            } else {
                self.git.checkout_new(branch)?;
            }
        }

        Ok(())
    }
}

async fn open_or_reuse(
    backend: &dyn Backend,
    request: &CreatePrRequest,
) -> Result<String> {
    if let Some(existing) =
        backend.find_open_pr(&request.head_branch).await?
    {
        info!("updating existing pull request #{}", existing.number);
        return Ok(existing.url);
    }

    let url = backend.create_pr(request).await?;
    info!("created pull request: {url}");

    Ok(url)
}
