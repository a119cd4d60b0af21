// sweep output folder structure:
// {root}/
// \- {run-name}/                  e.g. o3_issue4_rob192_l1d32kB_se
//    |- config.ini
//    |- stats.txt                 or stats.txt.zst
//    \- ...
// a root may also be a glob pattern (out/p1_*), a single run directory or a
// stats file itself; run directories may be nested at any depth

use crate::StatsError;
use log::{trace, warn};
use std::path::{Path, PathBuf};

/// The statistics file of a run directory, plain or zstd-compressed
pub fn get_stats_path<P: AsRef<Path>>(run_dir: P, stats_name: &str) -> Option<PathBuf> {
    let plain = run_dir.as_ref().join(stats_name);
    if plain.is_file() {
        return Some(plain);
    }
    let compressed = run_dir.as_ref().join(format!("{stats_name}.zst"));
    compressed.is_file().then_some(compressed)
}

/// The run directory owning a statistics file
pub fn get_run_dir<P: AsRef<Path>>(stats_path: P) -> PathBuf {
    match stats_path.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Display name of a run: its directory's last component
pub fn get_run_name<P: AsRef<Path>>(run_dir: P) -> String {
    let run_dir = run_dir.as_ref();
    if let Some(name) = run_dir.file_name() {
        return name.to_string_lossy().to_string();
    }
    // `.` and friends
    std::fs::canonicalize(run_dir)
        .ok()
        .and_then(|path| path.file_name().map(|name| name.to_string_lossy().to_string()))
        .unwrap_or_else(|| run_dir.display().to_string())
}

fn is_glob(root: &str) -> bool {
    root.contains(['*', '?', '['])
}

/// Expand one root into existing paths, sorted.
///
/// A plain root that does not exist expands to nothing.
pub fn expand_root(root: &str) -> Result<Vec<PathBuf>, StatsError> {
    if !is_glob(root) {
        let path = PathBuf::from(root);
        return Ok(if path.exists() { vec![path] } else { vec![] });
    }

    let entries = glob::glob(root).map_err(|err| StatsError::Discovery {
        pattern: root.to_string(),
        reason: err.to_string(),
    })?;
    let mut paths = vec![];
    for entry in entries {
        match entry {
            Ok(path) => paths.push(path),
            Err(err) => warn!("skipping {}: {}", err.path().display(), err.error()),
        }
    }
    paths.sort();
    Ok(paths)
}

/// Result of scanning one directory tree
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StatsScan {
    pub found: Vec<PathBuf>,
    /// directories without subdirectories and without a statistics file
    pub empty_leaves: Vec<PathBuf>,
}

/// Find statistics files below `dir`.
///
/// A directory holding a statistics file is a run directory and is not
/// descended into. Otherwise subdirectories are searched recursively in name
/// order. Symbolic links to directories are not followed.
pub fn find_stats_files<P: AsRef<Path>>(dir: P, stats_name: &str) -> StatsScan {
    let mut scan = StatsScan::default();
    find_stats_files_into(dir.as_ref(), stats_name, &mut scan);
    scan
}

fn find_stats_files_into(dir: &Path, stats_name: &str, scan: &mut StatsScan) {
    if let Some(stats_path) = get_stats_path(dir, stats_name) {
        scan.found.push(stats_path);
        return;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("unable to list {}: {}", dir.display(), err);
            return;
        }
    };
    let mut subdirs = vec![];
    for entry in entries.flatten() {
        if entry.file_type().is_ok_and(|file_type| file_type.is_dir()) {
            subdirs.push(entry.path());
        }
    }
    if subdirs.is_empty() {
        scan.empty_leaves.push(dir.to_path_buf());
        return;
    }
    subdirs.sort();
    trace!("{}: {} subdirectories", dir.display(), subdirs.len());
    for subdir in subdirs {
        find_stats_files_into(&subdir, stats_name, scan);
    }
}
