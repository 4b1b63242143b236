use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub mod candidates;
mod driver;
pub mod penalty;
pub mod search;
pub mod stats;

pub use candidates::{CandidateGraph, CandidatePair, PairIdx, PersonSlot};
pub use penalty::{Baggage, PenaltyModel};
pub use search::CancelToken;
pub use stats::{Statistics, write_statistics};

use crate::error::SolveError;
use crate::roster::{DataStore, History, PersonRef};
use search::Interrupt;

// -------------------------------------------------------------------------------------
// Configuration
// -------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    pub penalty: PenaltyModel,
    /// Fan the first level out over the rayon pool.
    pub parallel: bool,
    pub progress: bool,
    pub deadline: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = raw, "ignoring unparsable setting");
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    let flag = parse_flag(&raw);
    if flag.is_none() {
        warn!(key, value = %raw, "ignoring unparsable flag");
    }
    flag
}

impl SolverConfig {
    /// Defaults overridden by `GIFTING_PARALLEL`, `GIFTING_PROGRESS`,
    /// `GIFTING_DEADLINE_SECS` and `GIFTING_BASE_YEAR`.
    pub fn from_env() -> Self {
        let mut cfg = SolverConfig::default();
        if let Some(p) = env_flag("GIFTING_PARALLEL") {
            cfg.parallel = p;
        }
        if let Some(p) = env_flag("GIFTING_PROGRESS") {
            cfg.progress = p;
        }
        if let Some(secs) = env_parse::<f64>("GIFTING_DEADLINE_SECS") {
            cfg.deadline = Duration::try_from_secs_f64(secs).ok();
        }
        if let Some(year) = env_parse::<i32>("GIFTING_BASE_YEAR") {
            cfg.penalty.base_year = year;
        }
        cfg
    }
}

// -------------------------------------------------------------------------------------
// Outcome
// -------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub giver: String,
    pub recipient: String,
    pub penalty: i64,
    pub giver_at: PersonRef,
}

/// Search statistics for one level, named after the giver decided there.
#[derive(Debug, Clone)]
pub struct LevelReport {
    pub name: String,
    pub at: PersonRef,
    pub stats: Statistics,
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub year: i32,
    /// One per person, in search order.
    pub assignments: Vec<Assignment>,
    pub score: i64,
    pub levels: Vec<LevelReport>,
    pub elapsed: Duration,
    pub legal_pairs: usize,
    pub possible_solutions: u128,
    /// Calls of the recursive step.
    pub steps: u64,
    /// Complete assignments accepted as a new best.
    pub solutions: u64,
}

impl SolveOutcome {
    pub fn total(&self) -> Statistics {
        Statistics::total(self.levels.iter().map(|l| &l.stats))
    }

    pub fn recipient_of(&self, giver: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|a| a.giver == giver)
            .map(|a| a.recipient.as_str())
    }

    /// Record this year's gifts in everyone's history.
    pub fn apply(&self, store: &mut DataStore) {
        for a in &self.assignments {
            match store.person_mut(a.giver_at) {
                Some(p) => p.history.push(History {
                    recipient: a.recipient.clone(),
                    year: self.year,
                }),
                None => warn!(giver = %a.giver, "giver no longer in the store"),
            }
        }
    }
}

// -------------------------------------------------------------------------------------
// Solver
// -------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Solver { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve the year after the latest recorded one.
    pub fn solve(&self, store: &DataStore) -> Result<SolveOutcome, SolveError> {
        self.solve_year(store, store.next_year()?)
    }

    pub fn solve_year(&self, store: &DataStore, year: i32) -> Result<SolveOutcome, SolveError> {
        store.validate()?;
        let graph = CandidateGraph::build(store, &self.config.penalty)?;
        let order = graph.search_order();
        info!(
            year,
            people = graph.len(),
            families = store.families.len(),
            legal_pairs = graph.legal_pairs(),
            parallel = self.config.parallel,
            "solving"
        );

        let t0 = Instant::now();
        let interrupt = Interrupt::new(
            self.config.cancel.clone(),
            self.config.deadline.map(|d| t0 + d),
        );
        if interrupt.tripped() {
            return Err(SolveError::Interrupted { steps: 0 });
        }
        let found = if self.config.parallel {
            driver::run_parallel(&graph, &order, &interrupt, self.config.progress)?
        } else {
            driver::run_sequential(&graph, &order, &interrupt)?
        };
        let elapsed = t0.elapsed();

        if !found.found() {
            warn!(people = graph.len(), steps = found.steps, "search exhausted");
            return Err(SolveError::NoSolution {
                people: graph.len(),
            });
        }

        let mut assignments = Vec::with_capacity(order.len());
        // a complete leaf fills every level
        for &pi in found.best.iter().flatten() {
            let pair = &graph.pairs[pi];
            let giver = &graph.people[pair.giver];
            assignments.push(Assignment {
                giver: giver.name.clone(),
                recipient: graph.people[pair.recipient].name.clone(),
                penalty: pair.penalty,
                giver_at: giver.at,
            });
        }

        let levels = order
            .iter()
            .zip(found.stats)
            .map(|(&p, stats)| LevelReport {
                name: graph.people[p].name.clone(),
                at: graph.people[p].at,
                stats,
            })
            .collect();

        info!(
            score = found.best_score,
            steps = found.steps,
            solutions = found.solutions,
            elapsed_ms = elapsed.as_millis() as u64,
            "solution found"
        );

        Ok(SolveOutcome {
            year,
            assignments,
            score: found.best_score,
            levels,
            elapsed,
            legal_pairs: graph.legal_pairs(),
            possible_solutions: graph.possible_solutions(),
            steps: found.steps,
            solutions: found.solutions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse_loosely() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" Yes "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag(""), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn unset_settings_are_ignored() {
        assert_eq!(env_parse::<i32>("GIFTING_TEST_NEVER_SET"), None);
        assert_eq!(env_flag("GIFTING_TEST_NEVER_SET"), None);
    }

    #[test]
    fn default_config_is_sequential_and_unbounded() {
        let cfg = SolverConfig::default();
        assert!(!cfg.parallel);
        assert!(cfg.deadline.is_none());
        assert_eq!(cfg.penalty, PenaltyModel::default());
    }
}
