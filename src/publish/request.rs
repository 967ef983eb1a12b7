#[derive(Debug, Clone, PartialEq)]
/// An open pull request found on the forge.
pub struct PullRequest {
    pub number: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
/// Everything a backend needs to open a pull request.
pub struct CreatePrRequest {
    pub head_branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
}
