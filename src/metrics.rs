use crate::{LatencySample, Metric, Resolver, RoiView};
use serde::{Deserialize, Serialize};

/// gem5 ticks per nanosecond (1 tick = 1 ps)
pub const TICKS_PER_NS: f64 = 1000.0;

/// `numerator / denominator`, undefined unless the denominator is positive
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(numerator), Some(denominator)) if denominator > 0.0 => Some(numerator / denominator),
        _ => None,
    }
}

fn invert(value: Option<f64>) -> Option<f64> {
    value.filter(|value| *value > 0.0).map(|value| 1.0 / value)
}

/// Compute `(IPC, CPI)`.
///
/// Counters reported by the core win over the derived form; when only one of
/// them is reported the other is its inverse. A `nan` counter (printed by the
/// simulator for an empty interval) counts as not reported.
pub fn ipc_cpi(
    instructions: Option<f64>,
    cycles: Option<f64>,
    ipc_counter: Option<f64>,
    cpi_counter: Option<f64>,
) -> (Option<f64>, Option<f64>) {
    let ipc_counter = ipc_counter.filter(|value| value.is_finite());
    let cpi_counter = cpi_counter.filter(|value| value.is_finite());

    let ipc = ipc_counter
        .or_else(|| invert(cpi_counter))
        .or_else(|| ratio(instructions, cycles));
    let cpi = cpi_counter.or_else(|| invert(ipc));
    (ipc, cpi)
}

/// Misses per kilo instructions
pub fn mpki(misses: Option<f64>, instructions: Option<f64>) -> Option<f64> {
    ratio(misses.map(|misses| misses * 1000.0), instructions)
}

/// L1 instruction plus data MPKI.
///
/// This combined figure is best-effort: an unresolved side counts as zero
/// misses. It is the only derived metric that does so.
pub fn l1_total_mpki(
    l1i_misses: Option<f64>,
    l1d_misses: Option<f64>,
    instructions: Option<f64>,
) -> Option<f64> {
    mpki(
        Some(l1i_misses.unwrap_or(0.0) + l1d_misses.unwrap_or(0.0)),
        instructions,
    )
}

/// Sum of the instruction-side and data-side TLB counters, `None` only when
/// neither side is instrumented
pub fn tlb_total(instruction_side: Option<f64>, data_side: Option<f64>) -> Option<f64> {
    match (instruction_side, data_side) {
        (None, None) => None,
        (itb, dtb) => Some(itb.unwrap_or(0.0) + dtb.unwrap_or(0.0)),
    }
}

/// Mean latency over all agents, weighted by their access counts.
///
/// Falls back to the plain mean when no agent reports a positive weight and
/// is `None` when no agent reports a finite latency.
pub fn weighted_latency(samples: &[LatencySample]) -> Option<f64> {
    let samples: Vec<(f64, f64)> = samples
        .iter()
        .filter(|sample| sample.latency.is_finite())
        .map(|sample| {
            let weight = sample.weight.filter(|weight| weight.is_finite()).unwrap_or(0.0);
            (sample.latency, weight)
        })
        .collect();
    if samples.is_empty() {
        return None;
    }

    let total_weight: f64 = samples.iter().map(|(_, weight)| weight).sum();
    if total_weight > 0.0 {
        let weighted: f64 = samples.iter().map(|(latency, weight)| latency * weight).sum();
        Some(weighted / total_weight)
    } else {
        Some(samples.iter().map(|(latency, _)| latency).sum::<f64>() / samples.len() as f64)
    }
}

/// Counters and rates of one cache level
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheMetrics {
    pub accesses: Option<f64>,
    pub misses: Option<f64>,
    pub mpki: Option<f64>,
    pub miss_rate: Option<f64>,
}

impl CacheMetrics {
    pub fn new(accesses: Option<f64>, misses: Option<f64>, instructions: Option<f64>) -> Self {
        Self {
            accesses,
            misses,
            mpki: mpki(misses, instructions),
            miss_rate: ratio(misses, accesses),
        }
    }
}

/// Every primary and derived value of one run's region of interest
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RunMetrics {
    pub host_seconds_total: Option<f64>,
    pub host_seconds_roi: Option<f64>,
    pub sim_seconds_total: Option<f64>,
    pub sim_seconds_roi: Option<f64>,

    pub instructions: Option<f64>,
    pub cycles: Option<f64>,
    pub ipc: Option<f64>,
    pub cpi: Option<f64>,

    pub l1i: CacheMetrics,
    pub l1d: CacheMetrics,
    pub l2: CacheMetrics,
    pub l1_total_mpki: Option<f64>,

    pub tlb_accesses: Option<f64>,
    pub tlb_misses: Option<f64>,
    pub tlb_miss_rate: Option<f64>,

    pub bytes_read: Option<f64>,
    pub bytes_written: Option<f64>,
    pub bytes_total: Option<f64>,
    /// bytes per simulated second
    pub throughput: Option<f64>,
    pub avg_mem_latency_ticks: Option<f64>,
    pub avg_mem_latency_ns: Option<f64>,
}

impl RunMetrics {
    /// Resolve and derive everything from a region of interest
    pub fn derive(view: &RoiView, resolver: &Resolver) -> Self {
        let times = view.times;
        let mut metrics = Self {
            host_seconds_total: times.host_seconds_total,
            host_seconds_roi: times.host_seconds_roi,
            sim_seconds_total: times.sim_seconds_total,
            sim_seconds_roi: times.sim_seconds_roi,
            ..Default::default()
        };
        let (Some(block), Some(flavor)) = (view.block, view.flavor) else {
            return metrics;
        };
        let get = |metric| resolver.resolve(&block.counters, flavor, metric);

        let instructions = get(Metric::Instructions);
        let cycles = get(Metric::Cycles);
        let (ipc, cpi) = ipc_cpi(instructions, cycles, get(Metric::Ipc), get(Metric::Cpi));
        metrics.instructions = instructions;
        metrics.cycles = cycles;
        metrics.ipc = ipc;
        metrics.cpi = cpi;

        metrics.l1i = CacheMetrics::new(
            get(Metric::L1iAccesses),
            get(Metric::L1iMisses),
            instructions,
        );
        metrics.l1d = CacheMetrics::new(
            get(Metric::L1dAccesses),
            get(Metric::L1dMisses),
            instructions,
        );
        metrics.l2 = CacheMetrics::new(
            get(Metric::L2Accesses),
            get(Metric::L2Misses),
            instructions,
        );
        metrics.l1_total_mpki =
            l1_total_mpki(metrics.l1i.misses, metrics.l1d.misses, instructions);

        metrics.tlb_accesses = tlb_total(get(Metric::ItbAccesses), get(Metric::DtbAccesses));
        metrics.tlb_misses = tlb_total(get(Metric::ItbMisses), get(Metric::DtbMisses));
        metrics.tlb_miss_rate = ratio(metrics.tlb_misses, metrics.tlb_accesses);

        metrics.bytes_read = get(Metric::BytesRead);
        metrics.bytes_written = get(Metric::BytesWritten);
        metrics.bytes_total = match (metrics.bytes_read, metrics.bytes_written) {
            (Some(read), Some(written)) => Some(read + written),
            _ => None,
        };
        metrics.throughput = ratio(metrics.bytes_total, metrics.sim_seconds_roi);

        let latency = weighted_latency(&resolver.latency_samples(&block.counters, flavor));
        metrics.avg_mem_latency_ticks = latency;
        metrics.avg_mem_latency_ns = latency.map(|ticks| ticks / TICKS_PER_NS);

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(latency: f64, weight: Option<f64>) -> LatencySample {
        LatencySample {
            agent: "mem_ctrl".to_string(),
            latency,
            weight,
        }
    }

    #[test]
    fn ipc_from_instructions_and_cycles() {
        assert_eq!(
            ipc_cpi(Some(1000.0), Some(500.0), None, None),
            (Some(2.0), Some(0.5))
        );
    }

    #[test]
    fn ipc_from_cpi_counter_only() {
        assert_eq!(ipc_cpi(None, None, None, Some(0.25)), (Some(4.0), Some(0.25)));
    }

    #[test]
    fn counters_win_over_derived_values() {
        assert_eq!(
            ipc_cpi(Some(1000.0), Some(500.0), Some(1.5), None),
            (Some(1.5), Some(1.0 / 1.5))
        );
        assert_eq!(
            ipc_cpi(Some(1000.0), Some(500.0), Some(1.25), Some(0.5)),
            (Some(1.25), Some(0.5))
        );
    }

    #[test]
    fn ipc_guards() {
        assert_eq!(ipc_cpi(Some(1000.0), Some(0.0), None, None), (None, None));
        assert_eq!(ipc_cpi(Some(0.0), Some(10.0), None, None), (Some(0.0), None));
        assert_eq!(ipc_cpi(None, Some(10.0), None, None), (None, None));
        assert_eq!(
            ipc_cpi(Some(30.0), Some(10.0), Some(f64::NAN), Some(f64::NAN)),
            (Some(3.0), Some(1.0 / 3.0))
        );
    }

    #[test]
    fn mpki_guards() {
        assert_eq!(mpki(Some(10.0), Some(5000.0)), Some(2.0));
        assert_eq!(mpki(Some(10.0), Some(0.0)), None);
        assert_eq!(mpki(Some(10.0), None), None);
        assert_eq!(mpki(None, Some(5000.0)), None);
    }

    #[test]
    fn l1_total_treats_missing_side_as_zero() {
        assert_eq!(l1_total_mpki(Some(5.0), Some(5.0), Some(1000.0)), Some(10.0));
        assert_eq!(l1_total_mpki(None, Some(5.0), Some(1000.0)), Some(5.0));
        assert_eq!(l1_total_mpki(None, None, Some(1000.0)), Some(0.0));
        assert_eq!(l1_total_mpki(Some(5.0), Some(5.0), Some(0.0)), None);
    }

    #[test]
    fn tlb_sides() {
        assert_eq!(tlb_total(Some(3.0), Some(4.0)), Some(7.0));
        assert_eq!(tlb_total(None, Some(4.0)), Some(4.0));
        assert_eq!(tlb_total(None, None), None);
        assert_eq!(ratio(Some(7.0), Some(0.0)), None);
        assert_eq!(ratio(Some(7.0), Some(70.0)), Some(0.1));
    }

    #[test]
    fn cache_metrics() {
        let cache = CacheMetrics::new(Some(200.0), Some(20.0), Some(2000.0));
        assert_eq!(cache.mpki, Some(10.0));
        assert_eq!(cache.miss_rate, Some(0.1));
        let unknown = CacheMetrics::new(None, Some(20.0), None);
        assert_eq!(unknown.mpki, None);
        assert_eq!(unknown.miss_rate, None);
    }

    #[test]
    fn latency_weighted_mean() {
        let samples = [sample(100.0, Some(3.0)), sample(200.0, Some(1.0))];
        assert_eq!(weighted_latency(&samples), Some(125.0));
    }

    #[test]
    fn latency_unweighted_fallback() {
        let samples = [sample(100.0, None), sample(200.0, Some(0.0))];
        assert_eq!(weighted_latency(&samples), Some(150.0));
    }

    #[test]
    fn latency_without_agents() {
        assert_eq!(weighted_latency(&[]), None);
        assert_eq!(weighted_latency(&[sample(f64::NAN, Some(4.0))]), None);
        assert_eq!(
            weighted_latency(&[sample(f64::NAN, Some(4.0)), sample(80.0, Some(2.0))]),
            Some(80.0)
        );
    }
}
