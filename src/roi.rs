use crate::{Block, Flavor, Metric, Resolver};
use serde::{Deserialize, Serialize};

/// How the simulator's time counters behave across statistics dumps
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum RoiPolicy {
    /// time counters are cumulative, the region of interest is final minus previous
    #[default]
    Delta,
    /// every dump resets time counters, the region of interest is the final block
    Reset,
}

/// Which block layout a run's region of interest was selected from
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoiMode {
    /// no counters at all
    Empty,
    Single,
    /// several blocks, reset policy
    MultiFinal,
    /// several blocks, delta policy
    MultiDelta,
}

impl RoiMode {
    pub fn select(blocks: usize, policy: RoiPolicy) -> Self {
        match (blocks, policy) {
            (0, _) => RoiMode::Empty,
            (1, _) => RoiMode::Single,
            (_, RoiPolicy::Reset) => RoiMode::MultiFinal,
            (_, RoiPolicy::Delta) => RoiMode::MultiDelta,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RoiMode::Empty => "empty",
            RoiMode::Single => "single",
            RoiMode::MultiFinal => "multi_final",
            RoiMode::MultiDelta => "multi_delta",
        }
    }
}

/// Host and simulated seconds, for the region of interest and the whole run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RoiTimes {
    pub host_seconds_roi: Option<f64>,
    pub host_seconds_total: Option<f64>,
    pub sim_seconds_roi: Option<f64>,
    pub sim_seconds_total: Option<f64>,
}

/// `(roi, total)` of one time counter, given its value in every block
fn split_time(values: &[Option<f64>], mode: RoiMode) -> (Option<f64>, Option<f64>) {
    let last = values.last().copied().flatten();
    match mode {
        RoiMode::Empty => (None, None),
        RoiMode::Single => (last, last),
        RoiMode::MultiDelta => {
            let previous = values.iter().rev().nth(1).copied().flatten();
            let roi = match (last, previous) {
                (Some(last), Some(previous)) => Some(last - previous),
                _ => None,
            };
            (roi, last)
        }
        RoiMode::MultiFinal => {
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            let total = (!present.is_empty()).then(|| present.iter().sum());
            (last, total)
        }
    }
}

/// The block counters are read from, plus the time split
#[derive(Debug, Clone, Copy)]
pub struct RoiView<'a> {
    pub mode: RoiMode,
    /// the final block, `None` for an empty log
    pub block: Option<&'a Block>,
    pub flavor: Option<Flavor>,
    pub times: RoiTimes,
}

/// Pick the region of interest of a run.
///
/// Counters are always taken from the final block. Only the time counters
/// depend on `policy`.
pub fn select_roi<'a>(
    blocks: &'a [Block],
    policy: RoiPolicy,
    resolver: &Resolver,
    flavor: Option<Flavor>,
) -> RoiView<'a> {
    let mode = RoiMode::select(blocks.len(), policy);
    let block = blocks.last();
    let flavor = block.map(|block| flavor.unwrap_or_else(|| resolver.detect_flavor(&block.counters)));

    let mut times = RoiTimes::default();
    if let Some(flavor) = flavor {
        let series = |metric| -> Vec<Option<f64>> {
            blocks
                .iter()
                .map(|block| resolver.resolve(&block.counters, flavor, metric))
                .collect()
        };
        (times.host_seconds_roi, times.host_seconds_total) =
            split_time(&series(Metric::HostSeconds), mode);
        (times.sim_seconds_roi, times.sim_seconds_total) =
            split_time(&series(Metric::SimSeconds), mode);
    }

    RoiView {
        mode,
        block,
        flavor,
        times,
    }
}
