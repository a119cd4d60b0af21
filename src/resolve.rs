use crate::{CounterMap, StatsError};
use log::trace;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Return the value of the first name present in `map`
pub fn resolve_first<S: AsRef<str>>(map: &CounterMap, ordered_names: &[S]) -> Option<f64> {
    ordered_names
        .iter()
        .find_map(|name| map.get(name.as_ref()).copied())
}

/// Sum every counter whose name matches `pattern`.
///
/// Returns `None` when nothing matched, so that a counter that is not
/// instrumented can be told apart from one that is legitimately zero.
pub fn resolve_sum(map: &CounterMap, pattern: &Regex) -> Option<f64> {
    let mut matched = false;
    let mut sum = 0.0;
    for (_, value) in map.iter().filter(|(name, _)| pattern.is_match(name)) {
        matched = true;
        sum += value;
    }
    matched.then_some(sum)
}

/// Flavor-independent identity of a counter
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    SimSeconds,
    HostSeconds,
    Instructions,
    Cycles,
    /// IPC as reported by the core itself
    Ipc,
    /// CPI as reported by the core itself
    Cpi,
    L1iMisses,
    L1iAccesses,
    L1dMisses,
    L1dAccesses,
    L2Misses,
    L2Accesses,
    ItbMisses,
    ItbAccesses,
    DtbMisses,
    DtbAccesses,
    BytesRead,
    BytesWritten,
}

/// Cache hierarchy counter naming scheme
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    /// directory-based (Ruby) hierarchy
    Ruby,
    /// classic caches
    Classic,
}

impl Flavor {
    pub fn name(&self) -> &'static str {
        match self {
            Flavor::Ruby => "ruby",
            Flavor::Classic => "classic",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Candidate {
    /// a single counter name
    Exact(String),
    /// a regex, all matching counters are summed
    Sum(String),
}

/// What an unresolved metric turns into
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Absent {
    #[default]
    Missing,
    /// the counter is legitimately not printed in some configurations
    Zero,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResolutionRule {
    pub metric: Metric,
    /// tried in order, the first candidate that resolves wins
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub absent: Absent,
}

/// How per-agent memory latency samples are found
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LatencyRule {
    /// suffix of the average latency counter, e.g. `.avgMemAccLat`
    pub latency_suffix: String,
    /// counters (relative to the agent prefix) summed as the sample weight
    pub weight_suffixes: Vec<String>,
    /// used when none of `weight_suffixes` is reported
    pub fallback_weight_suffix: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FlavorRules {
    pub rules: Vec<ResolutionRule>,
    pub latency: LatencyRule,
}

/// Every resolution table, serializable so it can be edited as JSON
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RuleSet {
    /// substring of a counter name that identifies the Ruby flavor
    pub ruby_marker: String,
    /// flavor-independent metrics (time, instructions, cycles, TLB, traffic)
    pub common: Vec<ResolutionRule>,
    pub ruby: FlavorRules,
    pub classic: FlavorRules,
}

fn rule(metric: Metric, candidates: &[Candidate]) -> ResolutionRule {
    ResolutionRule {
        metric,
        candidates: candidates.to_vec(),
        absent: Absent::Missing,
    }
}

fn exact(name: &str) -> Candidate {
    Candidate::Exact(name.to_string())
}

fn sum(pattern: &str) -> Candidate {
    Candidate::Sum(pattern.to_string())
}

/// Flat counter names of hand-written or post-processed logs, tried last
fn short_name(metric: Metric) -> Option<Candidate> {
    let name = match metric {
        Metric::L1iMisses => "l1iMisses",
        Metric::L1iAccesses => "l1iAccesses",
        Metric::L1dMisses => "l1dMisses",
        Metric::L1dAccesses => "l1dAccesses",
        Metric::L2Misses => "l2Misses",
        Metric::L2Accesses => "l2Accesses",
        _ => return None,
    };
    Some(exact(name))
}

/// Classic cache rule: aggregated stdlib group first (demand before overall),
/// then per-instance caches summed, then the legacy `system.*` names, then the
/// flat short name
fn classic_cache(metric: Metric, group: &str, instance: &str, legacy: &[Candidate]) -> ResolutionRule {
    let counter = match metric {
        Metric::L1iMisses | Metric::L1dMisses | Metric::L2Misses => "Misses",
        _ => "Accesses",
    };
    let mut candidates = vec![
        exact(&format!("board.cache_hierarchy.{group}.demand{counter}::total")),
        exact(&format!("board.cache_hierarchy.{group}.overall{counter}::total")),
        sum(&format!(
            r"^board\.cache_hierarchy\.{instance}-\d+\.demand{counter}::total$"
        )),
        sum(&format!(
            r"^board\.cache_hierarchy\.{instance}-\d+\.overall{counter}::total$"
        )),
    ];
    candidates.extend_from_slice(legacy);
    candidates.extend(short_name(metric));
    rule(metric, &candidates)
}

/// Ruby cache rule: exact single-controller name, else summed over
/// controllers, then the flat short name
fn ruby_cache(metric: Metric, controller: &str, level: &str, counter: &str) -> ResolutionRule {
    let mut candidates = vec![
        exact(&format!(
            "board.cache_hierarchy.ruby_system.{controller}.{level}cache.{counter}"
        )),
        sum(&format!(r"(?i)ruby_system\..*{level}.*cache\.{counter}$")),
    ];
    candidates.extend(short_name(metric));
    rule(metric, &candidates)
}

fn memory_latency() -> LatencyRule {
    LatencyRule {
        latency_suffix: ".avgMemAccLat".to_string(),
        weight_suffixes: vec![".numReads".to_string(), ".numWrites".to_string()],
        fallback_weight_suffix: Some(".numReqs".to_string()),
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        let common = vec![
            rule(Metric::SimSeconds, &[exact("simSeconds"), exact("board.simSeconds")]),
            rule(Metric::HostSeconds, &[exact("hostSeconds")]),
            rule(
                Metric::Instructions,
                &[
                    exact("simInsts"),
                    exact("simOps"),
                    exact("board.processor.cores.core.commitStats0.numInsts"),
                    exact("system.cpu.commit.committedInsts"),
                    exact("sim_insts"),
                    sum(r"\.core\.(?:committedInsts|thread_\d+\.numInsts)$"),
                ],
            ),
            rule(
                Metric::Cycles,
                &[
                    exact("board.processor.cores0.core.numCycles"),
                    exact("board.processor.cores.core.numCycles"),
                    exact("system.cpu.numCycles"),
                    exact("simCycles"),
                    sum(r"(?:^|\.)numCycles$"),
                ],
            ),
            rule(
                Metric::Ipc,
                &[exact("board.processor.cores.core.ipc"), exact("system.cpu.ipc")],
            ),
            rule(
                Metric::Cpi,
                &[exact("board.processor.cores.core.cpi"), exact("system.cpu.cpi")],
            ),
            // newer per-direction mmu counters win over the legacy family
            rule(
                Metric::ItbAccesses,
                &[
                    sum(r"\.mmu\.itb\.(?:rdAccesses|wrAccesses)(?:::total)?$"),
                    sum(r"\.itb\.(?:accesses|lookups|inst_lookups)(?:::total)?$"),
                ],
            ),
            rule(
                Metric::DtbAccesses,
                &[
                    sum(r"\.mmu\.dtb\.(?:rdAccesses|wrAccesses)(?:::total)?$"),
                    sum(r"\.dtb\.(?:accesses|lookups|data_lookups)(?:::total)?$"),
                ],
            ),
            rule(
                Metric::ItbMisses,
                &[
                    sum(r"\.mmu\.itb\.(?:rdMisses|wrMisses)(?:::total)?$"),
                    sum(r"\.itb\.(?:misses|walk_misses|inst_misses)(?:::total)?$"),
                ],
            ),
            rule(
                Metric::DtbMisses,
                &[
                    sum(r"\.mmu\.dtb\.(?:rdMisses|wrMisses)(?:::total)?$"),
                    sum(r"\.dtb\.(?:misses|walk_misses|data_misses)(?:::total)?$"),
                ],
            ),
            rule(
                Metric::BytesRead,
                &[sum(r"^board\.processor\.cores\d*\.generator\.bytesRead$")],
            ),
            ResolutionRule {
                metric: Metric::BytesWritten,
                candidates: vec![sum(r"^board\.processor\.cores\d*\.generator\.bytesWritten$")],
                // read-only traffic generators do not always print it
                absent: Absent::Zero,
            },
        ];

        let ruby = FlavorRules {
            rules: vec![
                ruby_cache(Metric::L1iMisses, "l1_controllers", "L1I", "m_demand_misses"),
                ruby_cache(Metric::L1iAccesses, "l1_controllers", "L1I", "m_demand_accesses"),
                ruby_cache(Metric::L1dMisses, "l1_controllers", "L1D", "m_demand_misses"),
                ruby_cache(Metric::L1dAccesses, "l1_controllers", "L1D", "m_demand_accesses"),
                ruby_cache(Metric::L2Misses, "l2_controllers", "L2", "m_demand_misses"),
                ruby_cache(Metric::L2Accesses, "l2_controllers", "L2", "m_demand_accesses"),
            ],
            latency: memory_latency(),
        };

        let classic = FlavorRules {
            rules: vec![
                classic_cache(
                    Metric::L1iMisses,
                    "l1icaches",
                    "l1i-cache",
                    &[
                        exact("system.cpu.icache.overall_misses::total"),
                        exact("system.cpu.icache.ReadReq_misses::total"),
                        exact("system.cpu.icache.Overall_Misses"),
                    ],
                ),
                classic_cache(
                    Metric::L1iAccesses,
                    "l1icaches",
                    "l1i-cache",
                    &[exact("system.cpu.icache.overall_accesses::total")],
                ),
                classic_cache(
                    Metric::L1dMisses,
                    "l1dcaches",
                    "l1d-cache",
                    &[
                        exact("system.cpu.dcache.overall_misses::total"),
                        exact("system.cpu.dcache.Overall_Misses"),
                        sum(r"^system\.cpu\.dcache\.(?:ReadReq|WriteReq)_misses::total$"),
                    ],
                ),
                classic_cache(
                    Metric::L1dAccesses,
                    "l1dcaches",
                    "l1d-cache",
                    &[exact("system.cpu.dcache.overall_accesses::total")],
                ),
                classic_cache(
                    Metric::L2Misses,
                    "l2cache",
                    "l2-cache",
                    &[
                        exact("system.l2cache.overall_misses::total"),
                        exact("system.l2.overall_misses::total"),
                        exact("system.l2cache.Overall_Misses"),
                        exact("system.l2.Overall_Misses"),
                    ],
                ),
                classic_cache(
                    Metric::L2Accesses,
                    "l2cache",
                    "l2-cache",
                    &[
                        exact("system.l2cache.overall_accesses::total"),
                        exact("system.l2.overall_accesses::total"),
                    ],
                ),
            ],
            latency: memory_latency(),
        };

        Self {
            ruby_marker: "ruby_system".to_string(),
            common,
            ruby,
            classic,
        }
    }
}

enum CompiledCandidate {
    Exact(String),
    Sum(Regex),
}

impl CompiledCandidate {
    fn describe(&self) -> &str {
        match self {
            CompiledCandidate::Exact(name) => name.as_str(),
            CompiledCandidate::Sum(pattern) => pattern.as_str(),
        }
    }
}

struct CompiledRule {
    metric: Metric,
    candidates: Vec<CompiledCandidate>,
    absent: Absent,
}

impl CompiledRule {
    fn compile(rule: &ResolutionRule) -> Result<Self, StatsError> {
        let mut candidates = vec![];
        for candidate in &rule.candidates {
            candidates.push(match candidate {
                Candidate::Exact(name) => CompiledCandidate::Exact(name.clone()),
                Candidate::Sum(pattern) => CompiledCandidate::Sum(Regex::new(pattern).map_err(
                    |source| StatsError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    },
                )?),
            });
        }
        Ok(Self {
            metric: rule.metric,
            candidates,
            absent: rule.absent,
        })
    }

    fn resolve(&self, map: &CounterMap) -> Option<f64> {
        for (i, candidate) in self.candidates.iter().enumerate() {
            let value = match candidate {
                CompiledCandidate::Exact(name) => map.get(name).copied(),
                CompiledCandidate::Sum(pattern) => resolve_sum(map, pattern),
            };
            if value.is_some() {
                if i > 0 {
                    trace!(
                        "{:?} resolved with fallback candidate #{i} {:?}",
                        self.metric,
                        candidate.describe()
                    );
                }
                return value;
            }
        }
        match self.absent {
            Absent::Missing => None,
            Absent::Zero => Some(0.0),
        }
    }
}

/// One `avgMemAccLat`-like sample reported by a memory agent
#[derive(Debug, Clone, PartialEq)]
pub struct LatencySample {
    pub agent: String,
    pub latency: f64,
    /// `None` when the agent reports no access count at all
    pub weight: Option<f64>,
}

/// Compiled rule tables, built once and shared by every run
pub struct Resolver {
    ruby_marker: String,
    tables: HashMap<Flavor, HashMap<Metric, CompiledRule>>,
    latency: HashMap<Flavor, LatencyRule>,
}

impl Resolver {
    pub fn new(rules: &RuleSet) -> Result<Self, StatsError> {
        let mut tables = HashMap::new();
        let mut latency = HashMap::new();
        for (flavor, flavor_rules) in [
            (Flavor::Ruby, &rules.ruby),
            (Flavor::Classic, &rules.classic),
        ] {
            let mut table = HashMap::new();
            // flavor rows are inserted last so they override common rows
            for rule in rules.common.iter().chain(&flavor_rules.rules) {
                table.insert(rule.metric, CompiledRule::compile(rule)?);
            }
            tables.insert(flavor, table);
            latency.insert(flavor, flavor_rules.latency.clone());
        }
        Ok(Self {
            ruby_marker: rules.ruby_marker.clone(),
            tables,
            latency,
        })
    }

    pub fn detect_flavor(&self, map: &CounterMap) -> Flavor {
        if map.keys().any(|name| name.contains(&self.ruby_marker)) {
            Flavor::Ruby
        } else {
            Flavor::Classic
        }
    }

    pub fn resolve(&self, map: &CounterMap, flavor: Flavor, metric: Metric) -> Option<f64> {
        let value = self
            .tables
            .get(&flavor)
            .and_then(|table| table.get(&metric))
            .and_then(|rule| rule.resolve(map));
        if value.is_none() {
            trace!("{metric:?} unresolved for {} flavor", flavor.name());
        }
        value
    }

    /// Collect latency samples of every memory agent in `map`
    pub fn latency_samples(&self, map: &CounterMap, flavor: Flavor) -> Vec<LatencySample> {
        let Some(rule) = self.latency.get(&flavor) else {
            return vec![];
        };
        let mut samples = vec![];
        for (name, latency) in map {
            let Some(agent) = name.strip_suffix(rule.latency_suffix.as_str()) else {
                continue;
            };
            let weights: Vec<f64> = rule
                .weight_suffixes
                .iter()
                .filter_map(|suffix| map.get(&format!("{agent}{suffix}")).copied())
                .collect();
            let weight = if !weights.is_empty() {
                Some(weights.iter().sum())
            } else {
                rule.fallback_weight_suffix
                    .as_ref()
                    .and_then(|suffix| map.get(&format!("{agent}{suffix}")).copied())
            };
            samples.push(LatencySample {
                agent: agent.to_string(),
                latency: *latency,
                weight,
            });
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, f64)]) -> CounterMap {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    fn resolver() -> Resolver {
        Resolver::new(&RuleSet::default()).unwrap()
    }

    #[test]
    fn first_follows_name_order_not_map_order() {
        let counters = map(&[("b", 2.0), ("a", 1.0)]);
        assert_eq!(resolve_first(&counters, &["a", "b"]), Some(1.0));
        assert_eq!(resolve_first(&counters, &["c", "b"]), Some(2.0));
        assert_eq!(resolve_first(&counters, &["c"]), None);
    }

    #[test]
    fn sum_over_matches() {
        let counters = map(&[("cache0.misses", 3.0), ("cache1.misses", 5.0), ("other", 9.0)]);
        let pattern = Regex::new(r"cache\d+\.misses").unwrap();
        assert_eq!(resolve_sum(&counters, &pattern), Some(8.0));
        let nothing = Regex::new(r"^l3\.misses$").unwrap();
        assert_eq!(resolve_sum(&counters, &nothing), None);
        let zero = map(&[("cache0.misses", 0.0)]);
        assert_eq!(resolve_sum(&zero, &pattern), Some(0.0));
    }

    #[test]
    fn flavor_detection() {
        let resolver = resolver();
        let ruby = map(&[(
            "board.cache_hierarchy.ruby_system.l1_controllers.L1Dcache.m_demand_misses",
            4.0,
        )]);
        assert_eq!(resolver.detect_flavor(&ruby), Flavor::Ruby);
        let classic = map(&[("board.cache_hierarchy.l1dcaches.demandMisses::total", 4.0)]);
        assert_eq!(resolver.detect_flavor(&classic), Flavor::Classic);
        assert_eq!(resolver.detect_flavor(&CounterMap::new()), Flavor::Classic);
    }

    #[test]
    fn demand_before_overall() {
        let resolver = resolver();
        let counters = map(&[
            ("board.cache_hierarchy.l1dcaches.overallMisses::total", 30.0),
            ("board.cache_hierarchy.l1dcaches.demandMisses::total", 20.0),
        ]);
        assert_eq!(
            resolver.resolve(&counters, Flavor::Classic, Metric::L1dMisses),
            Some(20.0)
        );
    }

    #[test]
    fn classic_per_instance_caches_are_summed() {
        let resolver = resolver();
        let counters = map(&[
            ("board.cache_hierarchy.l1d-cache-0.demandMisses::total", 7.0),
            ("board.cache_hierarchy.l1d-cache-1.demandMisses::total", 9.0),
            ("board.cache_hierarchy.l1d-cache-1.overallMisses::total", 100.0),
        ]);
        assert_eq!(
            resolver.resolve(&counters, Flavor::Classic, Metric::L1dMisses),
            Some(16.0)
        );
    }

    #[test]
    fn legacy_read_write_split() {
        let resolver = resolver();
        let counters = map(&[
            ("system.cpu.dcache.ReadReq_misses::total", 11.0),
            ("system.cpu.dcache.WriteReq_misses::total", 4.0),
        ]);
        assert_eq!(
            resolver.resolve(&counters, Flavor::Classic, Metric::L1dMisses),
            Some(15.0)
        );
    }

    #[test]
    fn compiled_candidates_name_their_counter() {
        let compiled = CompiledRule::compile(&rule(
            Metric::L2Misses,
            &[exact("l2Misses"), sum(r"\.l2\.misses$")],
        ))
        .unwrap();
        assert_eq!(compiled.metric, Metric::L2Misses);
        let described: Vec<&str> = compiled
            .candidates
            .iter()
            .map(|candidate| candidate.describe())
            .collect();
        assert_eq!(described, ["l2Misses", r"\.l2\.misses$"]);
        assert_eq!(
            compiled.resolve(&map(&[("system.l2.misses", 3.0)])),
            Some(3.0)
        );
    }

    #[test]
    fn flat_short_names_come_last() {
        let resolver = resolver();
        let counters = map(&[("l1dMisses", 20.0), ("l1iMisses", 4.0), ("l2Misses", 8.0)]);
        for flavor in [Flavor::Classic, Flavor::Ruby] {
            assert_eq!(
                resolver.resolve(&counters, flavor, Metric::L1dMisses),
                Some(20.0)
            );
            assert_eq!(
                resolver.resolve(&counters, flavor, Metric::L1iMisses),
                Some(4.0)
            );
            assert_eq!(
                resolver.resolve(&counters, flavor, Metric::L2Misses),
                Some(8.0)
            );
        }

        let both = map(&[
            ("l1dMisses", 20.0),
            ("board.cache_hierarchy.l1dcaches.demandMisses::total", 6.0),
        ]);
        assert_eq!(
            resolver.resolve(&both, Flavor::Classic, Metric::L1dMisses),
            Some(6.0)
        );
    }

    #[test]
    fn ruby_controllers_are_summed() {
        let resolver = resolver();
        let counters = map(&[
            ("board.cache_hierarchy.ruby_system.l1_controllers0.L1Dcache.m_demand_misses", 5.0),
            ("board.cache_hierarchy.ruby_system.l1_controllers1.L1Dcache.m_demand_misses", 6.0),
            ("board.cache_hierarchy.ruby_system.l1_controllers0.L1Icache.m_demand_misses", 1.0),
            ("board.cache_hierarchy.ruby_system.l2_controllers0.L2cache.m_demand_misses", 2.0),
        ]);
        assert_eq!(
            resolver.resolve(&counters, Flavor::Ruby, Metric::L1dMisses),
            Some(11.0)
        );
        assert_eq!(
            resolver.resolve(&counters, Flavor::Ruby, Metric::L1iMisses),
            Some(1.0)
        );
        assert_eq!(
            resolver.resolve(&counters, Flavor::Ruby, Metric::L2Misses),
            Some(2.0)
        );
        // the classic table does not know Ruby names
        assert_eq!(
            resolver.resolve(&counters, Flavor::Classic, Metric::L1dMisses),
            None
        );
    }

    #[test]
    fn time_and_instructions_are_flavor_independent() {
        let resolver = resolver();
        let counters = map(&[("simInsts", 2000.0), ("simOps", 2500.0), ("hostSeconds", 3.0)]);
        for flavor in [Flavor::Ruby, Flavor::Classic] {
            assert_eq!(
                resolver.resolve(&counters, flavor, Metric::Instructions),
                Some(2000.0)
            );
            assert_eq!(
                resolver.resolve(&counters, flavor, Metric::HostSeconds),
                Some(3.0)
            );
        }
    }

    #[test]
    fn per_core_fallbacks() {
        let resolver = resolver();
        let counters = map(&[
            ("board.processor.cores0.core.committedInsts", 100.0),
            ("board.processor.cores1.core.committedInsts", 50.0),
            ("board.processor.cores1.core.numCycles", 400.0),
            ("board.processor.cores2.core.numCycles", 200.0),
        ]);
        assert_eq!(
            resolver.resolve(&counters, Flavor::Classic, Metric::Instructions),
            Some(150.0)
        );
        assert_eq!(
            resolver.resolve(&counters, Flavor::Classic, Metric::Cycles),
            Some(600.0)
        );
    }

    #[test]
    fn newer_tlb_family_wins() {
        let resolver = resolver();
        let counters = map(&[
            ("board.processor.cores.core.mmu.dtb.rdAccesses", 80.0),
            ("board.processor.cores.core.mmu.dtb.wrAccesses", 20.0),
            ("system.cpu.dtb.accesses", 999.0),
            ("system.cpu.itb.accesses", 40.0),
        ]);
        assert_eq!(
            resolver.resolve(&counters, Flavor::Classic, Metric::DtbAccesses),
            Some(100.0)
        );
        assert_eq!(
            resolver.resolve(&counters, Flavor::Classic, Metric::ItbAccesses),
            Some(40.0)
        );
    }

    #[test]
    fn absent_policy() {
        let resolver = resolver();
        let empty = CounterMap::new();
        assert_eq!(resolver.resolve(&empty, Flavor::Classic, Metric::BytesRead), None);
        assert_eq!(
            resolver.resolve(&empty, Flavor::Classic, Metric::BytesWritten),
            Some(0.0)
        );
    }

    #[test]
    fn latency_samples_and_weights() {
        let resolver = resolver();
        let counters = map(&[
            ("board.memory.mem_ctrl0.avgMemAccLat", 30000.0),
            ("board.memory.mem_ctrl0.numReads", 10.0),
            ("board.memory.mem_ctrl0.numWrites", 5.0),
            ("board.memory.mem_ctrl1.avgMemAccLat", 50000.0),
            ("board.memory.mem_ctrl1.numReqs", 7.0),
            ("board.memory.mem_ctrl2.avgMemAccLat", 10000.0),
        ]);
        let samples = resolver.latency_samples(&counters, Flavor::Classic);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].agent, "board.memory.mem_ctrl0");
        assert_eq!(samples[0].weight, Some(15.0));
        assert_eq!(samples[1].weight, Some(7.0));
        assert_eq!(samples[2].weight, None);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let mut rules = RuleSet::default();
        rules.common.push(rule(Metric::Cycles, &[sum("(unclosed")]));
        assert!(matches!(
            Resolver::new(&rules),
            Err(StatsError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn rules_round_trip_through_json() {
        let json = serde_json::to_string(&RuleSet::default()).unwrap();
        let rules: RuleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(rules.ruby_marker, "ruby_system");
        assert!(Resolver::new(&rules).is_ok());
    }
}
