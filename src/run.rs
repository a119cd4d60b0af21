use crate::{
    Block, BlockMarkers, Flavor, Resolver, RoiMode, RoiPolicy, RuleSet, RunMetrics, StatsError,
    expand_root, find_stats_files, get_run_dir, get_run_name, load_blocks, select_roi,
};
use indicatif::ProgressBar;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

/// Configuration knobs encoded in a run directory name, e.g.
/// `o3_issue4_rob192_lq32_sq32_l1d32kB_l2256kB_se`
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunParams {
    /// cpu model: o3, timing, atomic, minor or kvm
    pub cpu: Option<String>,
    /// se or fs
    pub mode: Option<String>,
    pub issue_width: Option<u32>,
    pub rob_entries: Option<u32>,
    pub lq_entries: Option<u32>,
    pub sq_entries: Option<u32>,
    pub cores: Option<u32>,
    pub l1d_size: Option<String>,
    pub l1i_size: Option<String>,
    pub l2_size: Option<String>,
}

const CPU_MODELS: [&str; 5] = ["o3", "timing", "atomic", "minor", "kvm"];

impl RunParams {
    /// Parse `_`-separated tokens, the first token matching a knob wins
    pub fn from_run_name(name: &str) -> Self {
        let mut params = Self::default();
        for token in name.split('_') {
            let lower = token.to_ascii_lowercase();
            if CPU_MODELS.contains(&lower.as_str()) {
                params.cpu.get_or_insert(lower);
                continue;
            }
            if lower == "se" || lower == "fs" {
                params.mode.get_or_insert(lower);
                continue;
            }

            for (prefix, field) in [
                ("issue", &mut params.issue_width),
                ("rob", &mut params.rob_entries),
                ("lq", &mut params.lq_entries),
                ("sq", &mut params.sq_entries),
                ("cores", &mut params.cores),
            ] {
                if let Some(value) = lower.strip_prefix(prefix).and_then(|v| v.parse().ok()) {
                    field.get_or_insert(value);
                }
            }
            for (prefix, field) in [
                ("l1d", &mut params.l1d_size),
                ("l1i", &mut params.l1i_size),
                ("l2", &mut params.l2_size),
            ] {
                if !lower.starts_with(prefix) {
                    continue;
                }
                // size is kept as spelled, e.g. 32kB
                match token.get(prefix.len()..) {
                    Some(size) if size.starts_with(|c: char| c.is_ascii_digit()) => {
                        field.get_or_insert_with(|| size.to_string());
                    }
                    _ => {}
                }
            }
        }
        params
    }
}

/// A statistics file and the run directory it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSource {
    pub dir: PathBuf,
    pub stats_path: PathBuf,
}

impl RunSource {
    pub fn from_stats_path<P: AsRef<Path>>(stats_path: P) -> Self {
        Self {
            dir: get_run_dir(&stats_path),
            stats_path: stats_path.as_ref().to_path_buf(),
        }
    }
}

/// Located runs, plus a notice for every root that yielded nothing
#[derive(Debug, Default)]
pub struct Discovery {
    pub runs: Vec<RunSource>,
    pub notices: Vec<StatsError>,
}

/// Locate statistics files.
///
/// `stats_file` names one log explicitly; every root is a run directory, a
/// parent of run directories, a statistics file, or a glob pattern of those.
/// Fails only when nothing at all was found.
pub fn discover_runs(
    roots: &[String],
    stats_file: Option<&Path>,
    stats_name: &str,
) -> Result<Discovery, StatsError> {
    let mut discovery = Discovery::default();
    let mut seen = HashSet::new();
    let mut add = |discovery: &mut Discovery, stats_path: PathBuf| {
        if seen.insert(stats_path.clone()) {
            discovery.runs.push(RunSource::from_stats_path(stats_path));
        }
    };

    if let Some(stats_file) = stats_file {
        if stats_file.is_file() {
            add(&mut discovery, stats_file.to_path_buf());
        } else {
            discovery.notices.push(StatsError::MissingFile {
                dir: get_run_dir(stats_file),
                stats_name: stats_file
                    .file_name()
                    .map_or(stats_name.to_string(), |name| name.to_string_lossy().to_string()),
            });
        }
    }

    for root in roots {
        let paths = match expand_root(root) {
            Ok(paths) => paths,
            Err(err) => {
                discovery.notices.push(err);
                continue;
            }
        };
        if paths.is_empty() {
            discovery.notices.push(StatsError::MissingFile {
                dir: PathBuf::from(root),
                stats_name: stats_name.to_string(),
            });
            continue;
        }

        for path in paths {
            if path.is_file() {
                add(&mut discovery, path);
                continue;
            }
            let scan = find_stats_files(&path, stats_name);
            debug!("{}: {} statistics files", path.display(), scan.found.len());
            // run directories that never produced a log, plus the root itself
            // when nothing below it could be listed
            let mut missing = scan.empty_leaves;
            if scan.found.is_empty() && missing.is_empty() {
                missing.push(path);
            }
            for dir in missing {
                warn!("no {stats_name} in {}", dir.display());
                discovery.notices.push(StatsError::MissingFile {
                    dir,
                    stats_name: stats_name.to_string(),
                });
            }
            for stats_path in scan.found {
                add(&mut discovery, stats_path);
            }
        }
    }

    if discovery.runs.is_empty() {
        let mut requested = roots.to_vec();
        if let Some(stats_file) = stats_file {
            requested.insert(0, stats_file.display().to_string());
        }
        return Err(StatsError::NoInputFound { roots: requested });
    }
    info!(
        "found {} runs, {} notices",
        discovery.runs.len(),
        discovery.notices.len()
    );
    Ok(discovery)
}

/// One output row
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub run: String,
    pub outdir: PathBuf,
    /// `None` when the log had no counters to detect it from
    pub flavor: Option<Flavor>,
    pub roi_mode: RoiMode,
    pub blocks: usize,
    pub params: RunParams,
    pub metrics: RunMetrics,
}

impl RunRecord {
    /// A row with only identity columns, for unreadable logs
    pub fn empty<P: AsRef<Path>>(run_dir: P) -> Self {
        let run = get_run_name(&run_dir);
        Self {
            params: RunParams::from_run_name(&run),
            run,
            outdir: run_dir.as_ref().to_path_buf(),
            flavor: None,
            roi_mode: RoiMode::Empty,
            blocks: 0,
            metrics: RunMetrics::default(),
        }
    }
}

/// Turns statistics files into records
pub struct Aggregator {
    pub resolver: Resolver,
    pub markers: BlockMarkers,
    pub policy: RoiPolicy,
    /// skip detection and use this flavor for every run
    pub flavor: Option<Flavor>,
}

impl Aggregator {
    pub fn new(rules: &RuleSet, policy: RoiPolicy) -> Result<Self, StatsError> {
        Ok(Self {
            resolver: Resolver::new(rules)?,
            markers: BlockMarkers::default(),
            policy,
            flavor: None,
        })
    }

    pub fn with_flavor(mut self, flavor: Option<Flavor>) -> Self {
        self.flavor = flavor;
        self
    }

    pub fn record<P: AsRef<Path>>(&self, run_dir: P, blocks: &[Block]) -> RunRecord {
        let mut record = RunRecord::empty(run_dir);
        let view = select_roi(blocks, self.policy, &self.resolver, self.flavor);
        record.flavor = view.flavor;
        record.roi_mode = view.mode;
        record.blocks = blocks.len();
        record.metrics = RunMetrics::derive(&view, &self.resolver);
        record
    }

    /// Process one run, an unreadable log still yields an identity-only record
    pub fn process(&self, source: &RunSource) -> (RunRecord, Option<StatsError>) {
        match load_blocks(&source.stats_path, &self.markers) {
            Ok(blocks) => (self.record(&source.dir, &blocks), None),
            Err(err) => {
                warn!("{err}, reporting {} without counters", source.dir.display());
                (RunRecord::empty(&source.dir), Some(err))
            }
        }
    }

    /// Process every run, in input order
    pub fn process_all(
        &self,
        sources: &[RunSource],
        parallel: bool,
        progress: &ProgressBar,
    ) -> (Vec<RunRecord>, Vec<StatsError>) {
        let process = |source: &RunSource| {
            let outcome = self.process(source);
            progress.inc(1);
            outcome
        };
        let outcomes: Vec<_> = if parallel {
            sources.par_iter().map(process).collect()
        } else {
            sources.iter().map(process).collect()
        };
        progress.finish();

        let mut records = vec![];
        let mut notices = vec![];
        for (record, notice) in outcomes {
            records.push(record);
            notices.extend(notice);
        }
        (records, notices)
    }
}
