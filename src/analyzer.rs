//! Scans a repository tree for pyproject.toml manifests and compares
//! declared dependency versions against the registries.
use color_eyre::eyre::eyre;
use log::*;
use pep508_rs::pep440_rs::Version;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{registry::VersionRegistry, result::Result};

/// Manifest file recognized by the scanner.
pub const MANIFEST_FILE_NAME: &str = "pyproject.toml";

/// A dependency declaration that is behind the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageUpdate {
    pub name: String,
    pub current_version: String,
    pub latest_version: String,
    pub file_path: PathBuf,
}

/// A requires-python constraint whose floor has fallen out of support.
#[derive(Debug, Clone, PartialEq)]
pub struct PythonVersionUpdate {
    pub current_constraint: String,
    pub recommended_constraint: String,
    pub file_path: PathBuf,
}

/// Everything the scanner found out of date in one manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAnalysis {
    pub file_path: PathBuf,
    pub package_updates: Vec<PackageUpdate>,
    pub python_update: Option<PythonVersionUpdate>,
}

#[derive(Debug, Deserialize)]
struct PyProject {
    project: Option<Project>,
}

#[derive(Debug, Deserialize)]
struct Project {
    #[serde(rename = "requires-python")]
    requires_python: Option<String>,

    #[serde(default)]
    dependencies: Vec<String>,

    #[serde(rename = "optional-dependencies", default)]
    optional_dependencies: BTreeMap<String, Vec<String>>,
}

/// Splits a PEP 508 style declaration like `"requests>=2.25.0"` into the
/// package name and pinned version. Declarations without a `>=` or `==`
/// pin come back with an empty version and are skipped by the scanner.
pub fn parse_dependency(declaration: &str) -> (String, String) {
    let mut spec = declaration.trim();

    if spec.len() >= 2 && spec.starts_with('"') && spec.ends_with('"') {
        spec = &spec[1..spec.len() - 1];
    }

    for operator in [">=", "=="] {
        if let Some((name, version)) = spec.split_once(operator) {
            return (name.trim().to_string(), version.trim().to_string());
        }
    }

    (spec.trim().to_string(), String::new())
}

/// Extracts the minimum minor version from a requires-python constraint.
/// Only `>=` floors are considered; anything else is left alone.
pub fn min_python_version(constraint: &str) -> Option<String> {
    let floor = constraint.trim().strip_prefix(">=")?;
    let floor = floor.split(',').next()?.trim();

    let mut parts = floor.split('.');
    let major = parts.next()?;
    let minor = parts.next()?;

    if major.is_empty() || minor.is_empty() {
        return None;
    }

    Some(format!("{major}.{minor}"))
}

/// Walks a repository and reports which manifests have stale versions.
pub struct Analyzer {
    registry: Box<dyn VersionRegistry>,
}

impl Analyzer {
    pub fn new(registry: Box<dyn VersionRegistry>) -> Self {
        Self { registry }
    }

    /// Scans every pyproject.toml under `root`. Manifests that cannot be
    /// read or parsed are skipped with a warning; a missing root is fatal.
    pub async fn scan_repository(
        &self,
        root: &Path,
    ) -> Result<Vec<FileAnalysis>> {
        if !root.is_dir() {
            return Err(eyre!(
                "repository path {} is not a directory",
                root.display()
            ));
        }

        let supported = self.registry.supported_python_versions().await;
        debug!("supported python versions: {:?}", supported);

        let manifests = find_manifests(root);
        info!("found {} pyproject.toml files", manifests.len());

        let mut results = vec![];

        for manifest in manifests {
            if let Some(analysis) = self.scan_file(&manifest, &supported).await
            {
                results.push(analysis);
            }
        }

        Ok(results)
    }

    /// Scans one manifest. Returns `None` when there is nothing to update
    /// or the file cannot be analyzed.
    pub async fn scan_file(
        &self,
        path: &Path,
        supported: &[String],
    ) -> Option<FileAnalysis> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) => {
                warn!("failed to read {}: {}", path.display(), err);
                return None;
            }
        };

        let manifest: PyProject = match toml::from_str(&content) {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!("failed to parse {}: {}", path.display(), err);
                return None;
            }
        };

        let Some(project) = manifest.project else {
            warn!("no [project] section in {}", path.display());
            return None;
        };

        let python_update = match &project.requires_python {
            Some(constraint) => {
                self.check_python_constraint(constraint, supported, path)
            }
            None => None,
        };

        let mut declarations: Vec<&String> =
            project.dependencies.iter().collect();

        for group in project.optional_dependencies.values() {
            declarations.extend(group.iter());
        }

        let mut package_updates = vec![];

        for declaration in declarations {
            let (name, current_version) = parse_dependency(declaration);

            if current_version.is_empty() {
                continue;
            }

            let Some(latest_version) =
                self.registry.latest_package_version(&name).await
            else {
                continue;
            };

            let Ok(current) = Version::from_str(&current_version) else {
                debug!(
                    "skipping {}: cannot parse pinned version {}",
                    name, current_version
                );
                continue;
            };

            let Ok(latest) = Version::from_str(&latest_version) else {
                debug!(
                    "skipping {}: cannot parse registry version {}",
                    name, latest_version
                );
                continue;
            };

            if latest > current {
                debug!(
                    "{}: {} -> {} in {}",
                    name,
                    current_version,
                    latest_version,
                    path.display()
                );
                package_updates.push(PackageUpdate {
                    name,
                    current_version,
                    latest_version,
                    file_path: path.to_path_buf(),
                });
            }
        }

        if package_updates.is_empty() && python_update.is_none() {
            debug!("{} is up to date", path.display());
            return None;
        }

        Some(FileAnalysis {
            file_path: path.to_path_buf(),
            package_updates,
            python_update,
        })
    }

    fn check_python_constraint(
        &self,
        constraint: &str,
        supported: &[String],
        path: &Path,
    ) -> Option<PythonVersionUpdate> {
        let minimum = min_python_version(constraint)?;

        if supported.iter().any(|version| *version == minimum) {
            return None;
        }

        let lowest = lowest_supported(supported)?;

        debug!(
            "python floor {} is out of support in {}, recommending >={}",
            minimum,
            path.display(),
            lowest
        );

        Some(PythonVersionUpdate {
            current_constraint: constraint.to_string(),
            recommended_constraint: format!(">={lowest}"),
            file_path: path.to_path_buf(),
        })
    }
}

fn lowest_supported(supported: &[String]) -> Option<String> {
    supported
        .iter()
        .filter_map(|cycle| {
            Version::from_str(cycle)
                .ok()
                .map(|version| (version, cycle))
        })
        .min_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, cycle)| cycle.clone())
}

/// Collects every pyproject.toml under `root` in a stable order.
fn find_manifests(root: &Path) -> Vec<PathBuf> {
    let mut found = vec![];
    walk_directory(root, &mut found);
    found
}

fn walk_directory(dir: &Path, found: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("failed to read directory {}: {}", dir.display(), err);
            return;
        }
    };

    let mut entries: Vec<_> = entries.flatten().collect();
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            walk_directory(&entry.path(), found);
        } else if entry.file_name() == MANIFEST_FILE_NAME {
            found.push(entry.path());
        }
    }
}
