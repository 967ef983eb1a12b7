//! Rewrites stale version strings in pyproject.toml files in place.
//!
//! Edits are textual rather than a parse and re-serialize round trip so
//! that comments, quoting style, and formatting survive untouched.
use log::*;
use regex::{Captures, Regex};
use std::{fs, path::PathBuf};

use crate::analyzer::FileAnalysis;

/// Result of rewriting one manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub file_path: PathBuf,
    pub modified: bool,
}

/// Applies every planned update to disk. Files that cannot be read or
/// written are skipped and produce no outcome entry.
pub fn apply_updates(results: &[FileAnalysis]) -> Vec<UpdateOutcome> {
    let mut outcomes = vec![];

    for analysis in results {
        let path = &analysis.file_path;

        let mut content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                error!("failed to read {}: {}", path.display(), err);
                continue;
            }
        };

        let original = content.clone();

        if let Some(python) = &analysis.python_update {
            content = content.replace(
                &format!(
                    "requires-python = \"{}\"",
                    python.current_constraint
                ),
                &format!(
                    "requires-python = \"{}\"",
                    python.recommended_constraint
                ),
            );
        }

        for update in &analysis.package_updates {
            // Matches the name, operator, and pinned version while keeping
            // the quoting and any trailing comment or comma intact.
            let pattern = format!(
                r#"(?m)(["']?{}["']?\s*(?:>=|==)\s*["']?){}(["']?[^\n]*)$"#,
                regex::escape(&update.name),
                regex::escape(&update.current_version),
            );

            let re = match Regex::new(&pattern) {
                Ok(re) => re,
                Err(err) => {
                    warn!(
                        "skipping {} in {}: bad pattern: {}",
                        update.name,
                        path.display(),
                        err
                    );
                    continue;
                }
            };

            content = re
                .replace_all(&content, |caps: &Captures| {
                    format!(
                        "{}{}{}",
                        &caps[1], update.latest_version, &caps[2]
                    )
                })
                .into_owned();

            info!(
                "{}: {} -> {}",
                update.name, update.current_version, update.latest_version
            );
        }

        let modified = content != original;

        if modified {
            if let Err(err) = fs::write(path, &content) {
                error!("failed to write {}: {}", path.display(), err);
                continue;
            }
            info!("updated {}", path.display());
        }

        outcomes.push(UpdateOutcome {
            file_path: path.clone(),
            modified,
        });
    }

    outcomes
}
