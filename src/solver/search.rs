use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Instant;

use super::candidates::{CandidateGraph, PairIdx};
use super::stats::Statistics;
use crate::error::SolveError;

/// Larger than any attainable total penalty.
pub const NO_SCORE: i64 = i64::MAX;

/// The deadline / cancel flag are only looked at every this many steps.
const POLL_MASK: u64 = 0xFFF;

/// Shareable cancellation flag; clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Interrupt {
    token: Option<CancelToken>,
    deadline: Option<Instant>,
}

impl Interrupt {
    pub(crate) fn new(token: Option<CancelToken>, deadline: Option<Instant>) -> Self {
        Interrupt { token, deadline }
    }

    pub(crate) fn tripped(&self) -> bool {
        self.token.as_ref().is_some_and(CancelToken::is_cancelled)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Stop sibling branches once one of them has given up.
    pub(crate) fn trip(&self) {
        if let Some(t) = &self.token {
            t.cancel();
        }
    }
}

/// Mutable working set of one depth-first search (or one parallel branch).
///
/// Levels follow `order`: level i decides the recipient of `order[i]`.
/// `recipient_used` and `pair_used` are the in-solution flags, set on the
/// way down and cleared on the way back up.
#[derive(Debug, Clone)]
pub(crate) struct SearchState<'g> {
    graph: &'g CandidateGraph,
    order: &'g [usize],
    shared_bound: Option<&'g AtomicI64>,
    interrupt: &'g Interrupt,
    recipient_used: Vec<bool>,
    pair_used: Vec<bool>,
    working: Vec<Option<PairIdx>>,
    pub best: Vec<Option<PairIdx>>,
    pub best_score: i64,
    pub stats: Vec<Statistics>,
    pub steps: u64,
    pub solutions: u64,
}

impl<'g> SearchState<'g> {
    pub(crate) fn new(
        graph: &'g CandidateGraph,
        order: &'g [usize],
        shared_bound: Option<&'g AtomicI64>,
        interrupt: &'g Interrupt,
    ) -> Self {
        let n = order.len();
        SearchState {
            graph,
            order,
            shared_bound,
            interrupt,
            recipient_used: vec![false; graph.len()],
            pair_used: vec![false; graph.legal_pairs()],
            working: vec![None; n],
            best: vec![None; n],
            best_score: NO_SCORE,
            stats: vec![Statistics::default(); n],
            steps: 0,
            solutions: 0,
        }
    }

    /// Can a partial assignment scoring `score` still improve on what is known?
    ///
    /// The local bound is strict. The shared one (parallel mode) lets ties
    /// through so that the earliest branch keeps its equal-score answer.
    #[inline]
    pub(crate) fn within_bound(&self, score: i64) -> bool {
        score < self.best_score
            && self
                .shared_bound
                .is_none_or(|b| score <= b.load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn place(&mut self, level: usize, pi: PairIdx) {
        let pair = &self.graph.pairs[pi];
        self.working[level] = Some(pi);
        self.recipient_used[pair.recipient] = true;
        self.pair_used[pi] = true;
    }

    #[inline]
    pub(crate) fn unplace(&mut self, level: usize, pi: PairIdx) {
        let pair = &self.graph.pairs[pi];
        self.working[level] = None;
        self.recipient_used[pair.recipient] = false;
        self.pair_used[pi] = false;
    }

    pub(crate) fn step(&mut self, level: usize, running: i64) -> Result<(), SolveError> {
        self.steps += 1;
        if self.steps & POLL_MASK == 0 && self.interrupt.tripped() {
            return Err(SolveError::Interrupted { steps: self.steps });
        }

        // out of levels: a complete assignment, which must be the new best
        if level >= self.order.len() {
            if running >= self.best_score {
                return Err(SolveError::InconsistentBound {
                    score: running,
                    best: self.best_score,
                });
            }
            self.solutions += 1;
            self.best_score = running;
            self.best.copy_from_slice(&self.working);
            if let Some(b) = self.shared_bound {
                b.fetch_min(running, Ordering::Relaxed);
            }
            return Ok(());
        }

        let graph = self.graph;
        let giver = self.order[level];
        for &pi in &graph.people[giver].candidates {
            let pair = &graph.pairs[pi];
            self.stats[level].offered += 1;

            if self.recipient_used[pair.recipient] {
                self.stats[level].already_in_solution += 1;
                continue;
            }
            if pair.reciprocal.is_some_and(|r| self.pair_used[r]) {
                self.stats[level].reciprocal_in_solution += 1;
                continue;
            }
            let score = running.saturating_add(pair.penalty);
            if !self.within_bound(score) {
                // candidates are ascending, every later one fails too
                self.stats[level].score_too_high += 1;
                break;
            }

            self.stats[level].accepted += 1;
            self.place(level, pi);
            let res = self.step(level + 1, score);
            self.unplace(level, pi);
            res?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{DataStore, Family, Person};
    use crate::solver::penalty::PenaltyModel;

    fn graph(store: &DataStore) -> CandidateGraph {
        CandidateGraph::build(store, &PenaltyModel::default()).unwrap()
    }

    #[test]
    fn finds_free_assignment_for_two_families() {
        let store = DataStore::new(vec![
            Family::new(vec![Person::new("A"), Person::new("B")]),
            Family::new(vec![Person::new("C"), Person::new("D")]),
        ]);
        let g = graph(&store);
        let order = g.search_order();
        let interrupt = Interrupt::default();
        let mut st = SearchState::new(&g, &order, None, &interrupt);
        st.step(0, 0).unwrap();

        assert_ne!(st.best_score, NO_SCORE);
        assert_eq!(st.best_score, 0);
        // the first zero-score leaf ends the search: every other branch is cut
        assert_eq!(st.solutions, 1);
        assert!(st.best.iter().all(Option::is_some));
        assert!(st.stats.iter().all(Statistics::is_balanced));
        // flags are restored once the search unwinds
        assert!(st.recipient_used.iter().all(|u| !u));
        assert!(st.pair_used.iter().all(|u| !u));
    }

    #[test]
    fn three_singletons_cannot_avoid_reciprocals() {
        // A, B, C in separate families: any cycle of length 3 works.
        let store = DataStore::new(vec![
            Family::new(vec![Person::new("A")]),
            Family::new(vec![Person::new("B")]),
            Family::new(vec![Person::new("C")]),
        ]);
        let g = graph(&store);
        let order = g.search_order();
        let interrupt = Interrupt::default();
        let mut st = SearchState::new(&g, &order, None, &interrupt);
        st.step(0, 0).unwrap();
        assert_ne!(st.best_score, NO_SCORE);
        let total = Statistics::total(&st.stats);
        assert!(total.is_balanced());
        assert!(total.reciprocal_in_solution > 0);
    }

    #[test]
    fn two_singletons_have_no_solution() {
        let store = DataStore::new(vec![
            Family::new(vec![Person::new("A")]),
            Family::new(vec![Person::new("B")]),
        ]);
        let g = graph(&store);
        let order = g.search_order();
        let interrupt = Interrupt::default();
        let mut st = SearchState::new(&g, &order, None, &interrupt);
        st.step(0, 0).unwrap();
        assert_eq!(st.best_score, NO_SCORE);
        assert_eq!(st.stats[1].reciprocal_in_solution, 1);
    }

    #[test]
    fn leaf_that_does_not_improve_is_an_error() {
        let store = DataStore::new(vec![Family::new(vec![Person::new("A")])]);
        let g = graph(&store);
        let order: Vec<usize> = Vec::new();
        let interrupt = Interrupt::default();
        let mut st = SearchState::new(&g, &order, None, &interrupt);
        st.best_score = 5;
        assert_eq!(
            st.step(0, 5),
            Err(SolveError::InconsistentBound { score: 5, best: 5 })
        );
    }

    #[test]
    fn shared_bound_admits_ties_only() {
        let store = DataStore::new(vec![Family::new(vec![Person::new("A")])]);
        let g = graph(&store);
        let order = g.search_order();
        let interrupt = Interrupt::default();
        let shared = AtomicI64::new(10);
        let st = SearchState::new(&g, &order, Some(&shared), &interrupt);
        assert!(st.within_bound(10));
        assert!(!st.within_bound(11));
    }

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let t = CancelToken::new();
        let i = Interrupt::new(Some(t.clone()), None);
        assert!(!i.tripped());
        t.cancel();
        assert!(i.tripped());
        assert!(Interrupt::new(None, Some(Instant::now())).tripped());
    }
}
