//! Wires the scan, rewrite, and publish stages together for one run.
use log::*;
use secrecy::SecretString;
use std::{path::PathBuf, sync::Arc};

use crate::{
    analyzer::{Analyzer, FileAnalysis},
    cli::Args,
    git::{CommandRunner, Git},
    publish::{
        self, Publisher, gh_cli::GhCli, github::GithubApi, repo_identity,
        traits::Backend,
    },
    registry::VersionRegistry,
    result::Result,
    updater,
};

/// Runs a full update pass: scan the tree, rewrite stale manifests, then
/// publish according to the selected mode. Dry run stops after the scan;
/// offline mode writes a patch file instead of opening a pull request.
pub async fn execute(
    args: &Args,
    registry: Box<dyn VersionRegistry>,
    runner: Arc<dyn CommandRunner>,
) -> Result<()> {
    info!("analyzing {}", args.repo_path.display());

    let analyzer = Analyzer::new(registry);
    let results = analyzer.scan_repository(&args.repo_path).await?;

    if results.is_empty() {
        info!("no dependencies need updating");
        return Ok(());
    }

    if args.dry_run {
        report_planned(&results);
        return Ok(());
    }

    let outcomes = updater::apply_updates(&results);

    let updated: Vec<PathBuf> = outcomes
        .into_iter()
        .filter(|outcome| outcome.modified)
        .map(|outcome| outcome.file_path)
        .collect();

    if updated.is_empty() {
        info!("no files were modified");
        return Ok(());
    }

    let git = Git::new(&args.repo_path, runner.clone());

    if args.offline_pr {
        let patch = publish::patch::create_patch(
            &git,
            publish::UPDATE_BRANCH,
            &updated,
            &args.patch_output,
        )?;
        info!("created patch file: {}", patch.display());
        info!("apply it with: git apply {}", patch.display());
        return Ok(());
    }

    if args.no_pr {
        info!("updated dependencies in {} files", updated.len());
        return Ok(());
    }

    let backends = build_backends(&git, runner, args.github_token());
    let publisher = Publisher::new(git, backends);

    match publisher.publish(publish::UPDATE_BRANCH, &updated).await? {
        publish::Published::NothingToCommit => {
            info!("nothing new to publish");
        }
        publish::Published::PullRequest { url } => {
            info!("pull request available at {url}");
        }
    }

    Ok(())
}

fn report_planned(results: &[FileAnalysis]) {
    for analysis in results {
        if let Some(python) = &analysis.python_update {
            info!(
                "{}: requires-python {} -> {}",
                python.file_path.display(),
                python.current_constraint,
                python.recommended_constraint
            );
        }

        for update in &analysis.package_updates {
            info!(
                "{}: {} {} -> {}",
                update.file_path.display(),
                update.name,
                update.current_version,
                update.latest_version
            );
        }
    }

    info!("dry run: would update dependencies in {} files", results.len());
}

/// The API backend goes first when a token and a github.com remote are
/// both available; the gh CLI is always registered as the fallback.
fn build_backends(
    git: &Git,
    runner: Arc<dyn CommandRunner>,
    token: Option<SecretString>,
) -> Vec<Box<dyn Backend>> {
    let mut backends: Vec<Box<dyn Backend>> = vec![];

    match (repo_identity(git), &token) {
        (Some((owner, repo)), Some(token)) => {
            match GithubApi::new(owner, repo, token.clone()) {
                Ok(api) => backends.push(Box::new(api)),
                Err(err) => {
                    warn!("github api backend unavailable: {}", err);
                }
            }
        }
        (None, Some(_)) => {
            warn!(
                "could not determine repository owner and name, skipping github api backend"
            );
        }
        (_, None) => {
            info!("no github token configured, skipping github api backend");
        }
    }

    backends.push(Box::new(GhCli::new(runner, git.path(), token)));

    backends
}
