use async_trait::async_trait;

use crate::{
    publish::request::{CreatePrRequest, PullRequest},
    result::Result,
};

#[cfg(test)]
use mockall::automock;

/// A way of opening pull requests against GitHub. Backends are tried in
/// order; the first one to succeed wins.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name used in log output when a backend is skipped or fails.
    fn name(&self) -> &'static str;

    /// Looks for an open pull request whose head is `head_branch`.
    async fn find_open_pr(
        &self,
        head_branch: &str,
    ) -> Result<Option<PullRequest>>;

    /// Opens a new pull request and returns its URL.
    async fn create_pr(&self, request: &CreatePrRequest) -> Result<String>;
}
