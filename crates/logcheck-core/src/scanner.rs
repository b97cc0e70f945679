//! Artifact directory discovery and pairing.
//!
//! Two layouts are understood:
//!
//! - reference mode: `<root>/<config-name>/log.atmosphere.*.out`, each paired
//!   with one shared reference log;
//! - decomposition mode: `<root>/logs-<N>proc-<config-key>/log.atmosphere.*.out`,
//!   each multi-rank run paired with the `logs-1proc-<config-key>` run.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::LogFilePattern;
use crate::domain::ComparisonResult;
use crate::error::{LogcheckError, Result};

/// Reason recorded when a configuration directory holds no run log.
pub const REASON_NO_LOG_FILE: &str = "No log file found";

/// Reason recorded when an expected configuration never produced a directory.
pub const REASON_RUN_FAILED: &str = "Run failed or skipped";

/// A named configuration ready for comparison, or already known to be missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactPairing {
    Compare {
        name: String,
        test_log: PathBuf,
        reference_log: PathBuf,
    },
    Missing {
        name: String,
        reason: String,
    },
}

impl ArtifactPairing {
    pub fn name(&self) -> &str {
        match self {
            ArtifactPairing::Compare { name, .. } | ArtifactPairing::Missing { name, .. } => name,
        }
    }
}

/// A directory following the `logs-<N>proc-<config-key>` convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompositionDir {
    pub ranks: u64,
    pub config_key: String,
    pub path: PathBuf,
}

/// Split `logs-<N>proc-<config-key>` into its rank count and config key.
/// `N` must be a positive integer and the key non-empty.
pub fn parse_decomposition_name(name: &str) -> Option<(u64, &str)> {
    let rest = name.strip_prefix("logs-")?;
    let (ranks, key) = rest.split_once("proc-")?;
    if ranks.is_empty() || !ranks.bytes().all(|b| b.is_ascii_digit()) || key.is_empty() {
        return None;
    }
    let ranks: u64 = ranks.parse().ok()?;
    (ranks > 0).then_some((ranks, key))
}

/// Name given to a decomposition comparison.
pub fn decomposition_result_name(ranks: u64, config_key: &str) -> String {
    format!("{}proc vs 1proc: {}", ranks, config_key)
}

/// Append a NO_LOG result for every expected name absent from `results`.
pub fn backfill_expected(results: &mut Vec<ComparisonResult>, expected: &[String]) {
    let found: BTreeSet<String> = results.iter().map(|r| r.name.clone()).collect();
    let mut seen = BTreeSet::new();
    for name in expected {
        let name = name.trim();
        if name.is_empty() || found.contains(name) || !seen.insert(name.to_string()) {
            continue;
        }
        warn!(config = %name, "expected configuration produced no artifacts");
        results.push(ComparisonResult::no_log(name, REASON_RUN_FAILED));
    }
}

/// Discovers run logs under a logs root.
#[derive(Debug, Clone, Default)]
pub struct DirectoryScanner {
    log_pattern: LogFilePattern,
}

impl DirectoryScanner {
    pub fn new(log_pattern: LogFilePattern) -> Self {
        Self { log_pattern }
    }

    /// Immediate subdirectories of `root`, sorted by name.
    pub fn list_subdirs(&self, root: &Path) -> Result<Vec<(String, PathBuf)>> {
        let entries = fs::read_dir(root).map_err(|e| LogcheckError::io(root, e))?;
        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| LogcheckError::io(root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            dirs.push((name, path));
        }
        dirs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(dirs)
    }

    /// First run log in `dir`, in lexicographic order.
    ///
    /// An unreadable directory counts as having no log.
    pub fn find_log_file(&self, dir: &Path) -> Option<PathBuf> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot list artifact directory");
                return None;
            }
        };
        let mut logs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                self.log_pattern
                    .matches(&entry.file_name().to_string_lossy())
            })
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        logs.sort();
        logs.into_iter().next()
    }

    /// Pair every configuration directory under `root` with `reference_log`.
    pub fn scan_reference(
        &self,
        root: &Path,
        reference_log: &Path,
        filter: Option<&str>,
    ) -> Result<Vec<ArtifactPairing>> {
        let mut pairings = Vec::new();
        for (name, dir) in self.list_subdirs(root)? {
            if let Some(f) = filter {
                if !name.contains(f) {
                    debug!(config = %name, filter = %f, "skipping filtered configuration");
                    continue;
                }
            }
            match self.find_log_file(&dir) {
                Some(test_log) => pairings.push(ArtifactPairing::Compare {
                    name,
                    test_log,
                    reference_log: reference_log.to_path_buf(),
                }),
                None => pairings.push(ArtifactPairing::Missing {
                    name,
                    reason: REASON_NO_LOG_FILE.to_string(),
                }),
            }
        }
        Ok(pairings)
    }

    /// Split `root`'s subdirectories into single-rank runs keyed by config key
    /// and multi-rank runs sorted by `(ranks, config_key)`.
    pub fn partition_decomposition(
        &self,
        root: &Path,
    ) -> Result<(BTreeMap<String, PathBuf>, Vec<DecompositionDir>)> {
        let mut single = BTreeMap::new();
        let mut multi = Vec::new();
        for (name, path) in self.list_subdirs(root)? {
            let Some((ranks, key)) = parse_decomposition_name(&name) else {
                debug!(dir = %name, "ignoring directory outside decomposition layout");
                continue;
            };
            if ranks == 1 {
                single.insert(key.to_string(), path);
            } else {
                multi.push(DecompositionDir {
                    ranks,
                    config_key: key.to_string(),
                    path,
                });
            }
        }
        multi.sort_by(|a, b| {
            a.ranks
                .cmp(&b.ranks)
                .then_with(|| a.config_key.cmp(&b.config_key))
        });
        Ok((single, multi))
    }

    /// Pair every multi-rank run under `root` with its single-rank counterpart.
    /// Returns an empty list when there are no multi-rank runs.
    pub fn scan_decomposition(&self, root: &Path) -> Result<Vec<ArtifactPairing>> {
        let (single, multi) = self.partition_decomposition(root)?;
        let mut pairings = Vec::with_capacity(multi.len());

        for entry in multi {
            let name = decomposition_result_name(entry.ranks, &entry.config_key);

            let Some(single_dir) = single.get(&entry.config_key) else {
                pairings.push(ArtifactPairing::Missing {
                    name,
                    reason: format!("No matching 1proc log for {}", entry.config_key),
                });
                continue;
            };
            let Some(reference_log) = self.find_log_file(single_dir) else {
                pairings.push(ArtifactPairing::Missing {
                    name,
                    reason: "1proc log file missing".to_string(),
                });
                continue;
            };
            let Some(test_log) = self.find_log_file(&entry.path) else {
                pairings.push(ArtifactPairing::Missing {
                    name,
                    reason: format!("{}proc log file missing", entry.ranks),
                });
                continue;
            };

            pairings.push(ArtifactPairing::Compare {
                name,
                test_log,
                reference_log,
            });
        }

        Ok(pairings)
    }
}
