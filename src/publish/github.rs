//! Pull request backend backed by the GitHub REST API via octocrab.
use async_trait::async_trait;
use octocrab::{Octocrab, params};
use secrecy::SecretString;

use crate::{
    publish::{
        request::{CreatePrRequest, PullRequest},
        traits::Backend,
    },
    result::Result,
};

/// Talks to api.github.com with a personal access token.
pub struct GithubApi {
    owner: String,
    repo: String,
    instance: Octocrab,
}

impl GithubApi {
    pub fn new(
        owner: String,
        repo: String,
        token: SecretString,
    ) -> Result<Self> {
        let instance =
            Octocrab::builder().personal_token(token).build()?;

        Ok(Self {
            owner,
            repo,
            instance,
        })
    }

    // The API omits html_url in some responses.
    fn pr_url(&self, number: u64) -> String {
        format!(
            "https://github.com/{}/{}/pull/{}",
            self.owner, self.repo, number
        )
    }
}

#[async_trait]
impl Backend for GithubApi {
    fn name(&self) -> &'static str {
        "github-api"
    }

    async fn find_open_pr(
        &self,
        head_branch: &str,
    ) -> Result<Option<PullRequest>> {
        let prs = self
            .instance
            .pulls(&self.owner, &self.repo)
            .list()
            .state(params::State::Open)
            .head(head_branch)
            .send()
            .await?;

        Ok(prs.into_iter().next().map(|pr| {
            let url = pr
                .html_url
                .map(|url| url.to_string())
                .unwrap_or_else(|| self.pr_url(pr.number));

            PullRequest {
                number: pr.number,
                url,
            }
        }))
    }

    async fn create_pr(&self, request: &CreatePrRequest) -> Result<String> {
        let pr = self
            .instance
            .pulls(&self.owner, &self.repo)
            .create(
                request.title.clone(),
                request.head_branch.clone(),
                request.base_branch.clone(),
            )
            .body(request.body.clone())
            .send()
            .await?;

        let url = pr
            .html_url
            .map(|url| url.to_string())
            .unwrap_or_else(|| self.pr_url(pr.number));

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn api_for(server: &Server) -> GithubApi {
        let instance = Octocrab::builder()
            .personal_token(SecretString::from("test-token".to_string()))
            .base_uri(server.url())
            .unwrap()
            .build()
            .unwrap();

        GithubApi {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            instance,
        }
    }

    #[tokio::test]
    async fn queries_open_pulls_with_the_head_filter() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/acme/widgets/pulls")
            .match_query(Matcher::UrlEncoded(
                "head".into(),
                "depfresh/dependency-updates".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let api = api_for(&server);
        let found = api
            .find_open_pr("depfresh/dependency-updates")
            .await
            .unwrap();

        assert!(found.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn maps_the_filtered_pull_request() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/acme/widgets/pulls")
            .match_query(Matcher::UrlEncoded(
                "head".into(),
                "depfresh/dependency-updates".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{
                    "url": "https://api.github.com/repos/acme/widgets/pulls/7",
                    "id": 1,
                    "number": 7,
                    "html_url": "https://github.com/acme/widgets/pull/7",
                    "head": {"ref": "depfresh/dependency-updates", "sha": "abc123"},
                    "base": {"ref": "main", "sha": "def456"}
                }]"#,
            )
            .create_async()
            .await;

        let api = api_for(&server);
        let found = api
            .find_open_pr("depfresh/dependency-updates")
            .await
            .unwrap();

        assert_eq!(
            found,
            Some(PullRequest {
                number: 7,
                url: "https://github.com/acme/widgets/pull/7".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn builds_a_url_when_the_api_omits_html_url() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/acme/widgets/pulls")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{
                    "url": "https://api.github.com/repos/acme/widgets/pulls/7",
                    "id": 1,
                    "number": 7,
                    "head": {"ref": "depfresh/dependency-updates", "sha": "abc123"},
                    "base": {"ref": "main", "sha": "def456"}
                }]"#,
            )
            .create_async()
            .await;

        let api = api_for(&server);
        let found = api
            .find_open_pr("depfresh/dependency-updates")
            .await
            .unwrap();

        assert_eq!(
            found.map(|pr| pr.url),
            Some("https://github.com/acme/widgets/pull/7".to_string())
        );
    }
}
