//! CLI argument parsing and GitHub token resolution.
use clap::Parser;
use secrecy::SecretString;
use std::{env, path::PathBuf};

/// Arguments controlling the scan and publish pipeline.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(default_value = ".")]
    /// Path to the repository to scan for pyproject.toml files.
    pub repo_path: PathBuf,

    #[arg(long, default_value_t = false)]
    /// Update files locally without creating a pull request.
    pub no_pr: bool,

    #[arg(long, default_value_t = false)]
    /// Write a git patch file instead of contacting GitHub.
    pub offline_pr: bool,

    #[arg(long, default_value = "depfresh-changes.patch")]
    /// Output path for the patch file written by --offline-pr.
    pub patch_output: PathBuf,

    #[arg(long, default_value_t = false)]
    /// Report planned updates without modifying any file.
    pub dry_run: bool,

    #[arg(long, default_value = "")]
    /// GitHub personal access token. Falls back to GITHUB_TOKEN env var.
    pub token: String,

    #[arg(long, default_value_t = false)]
    /// Enable debug logging.
    pub debug: bool,
}

impl Args {
    /// Resolve the GitHub token from the --token flag or the GITHUB_TOKEN
    /// environment variable. The explicit flag wins.
    pub fn github_token(&self) -> Option<SecretString> {
        resolve_token(&self.token, env::var("GITHUB_TOKEN").ok())
    }
}

fn resolve_token(
    flag: &str,
    env_token: Option<String>,
) -> Option<SecretString> {
    let mut token = flag.to_string();

    if token.is_empty()
        && let Some(env_token) = env_token
    {
        token = env_token;
    }

    if token.is_empty() {
        return None;
    }

    Some(SecretString::from(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn parses_defaults() {
        let args = Args::parse_from(["depfresh"]);

        assert_eq!(args.repo_path, PathBuf::from("."));
        assert!(!args.no_pr);
        assert!(!args.offline_pr);
        assert_eq!(
            args.patch_output,
            PathBuf::from("depfresh-changes.patch")
        );
        assert!(!args.dry_run);
        assert!(args.token.is_empty());
        assert!(!args.debug);
    }

    #[test]
    fn parses_repo_path_argument() {
        let args = Args::parse_from(["depfresh", "/some/repo"]);
        assert_eq!(args.repo_path, PathBuf::from("/some/repo"));
    }

    #[test]
    fn parses_flags() {
        let args = Args::parse_from([
            "depfresh",
            "/some/repo",
            "--no-pr",
            "--offline-pr",
            "--patch-output",
            "changes.patch",
            "--dry-run",
            "--token",
            "secret-token",
            "--debug",
        ]);

        assert!(args.no_pr);
        assert!(args.offline_pr);
        assert_eq!(args.patch_output, PathBuf::from("changes.patch"));
        assert!(args.dry_run);
        assert_eq!(args.token, "secret-token");
        assert!(args.debug);
    }

    #[test]
    fn resolves_token_from_flag() {
        let token = resolve_token("flag-token", Some("env-token".into()));
        assert_eq!(token.unwrap().expose_secret(), "flag-token");
    }

    #[test]
    fn resolves_token_from_env_when_flag_empty() {
        let token = resolve_token("", Some("env-token".into()));
        assert_eq!(token.unwrap().expose_secret(), "env-token");
    }

    #[test]
    fn resolves_no_token() {
        assert!(resolve_token("", None).is_none());
    }
}
