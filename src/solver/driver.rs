use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::sync::atomic::AtomicI64;
use tracing::debug;

use super::candidates::{CandidateGraph, PairIdx};
use super::search::{Interrupt, NO_SCORE, SearchState};
use super::stats::Statistics;
use crate::error::SolveError;

/// What a finished search hands back to the solver.
#[derive(Debug, Clone)]
pub(crate) struct SearchResult {
    pub best: Vec<Option<PairIdx>>,
    pub best_score: i64,
    pub stats: Vec<Statistics>,
    pub steps: u64,
    pub solutions: u64,
}

impl SearchResult {
    #[inline]
    pub fn found(&self) -> bool {
        self.best_score != NO_SCORE
    }
}

impl From<SearchState<'_>> for SearchResult {
    fn from(st: SearchState<'_>) -> Self {
        SearchResult {
            best: st.best,
            best_score: st.best_score,
            stats: st.stats,
            steps: st.steps,
            solutions: st.solutions,
        }
    }
}

pub(crate) fn run_sequential(
    graph: &CandidateGraph,
    order: &[usize],
    interrupt: &Interrupt,
) -> Result<SearchResult, SolveError> {
    let mut st = SearchState::new(graph, order, None, interrupt);
    st.step(0, 0)?;
    Ok(st.into())
}

fn progress_bar(len: u64, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} branches {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

/// Fan the first level out over the rayon pool.
///
/// Every branch owns its own in-solution flags; the bound is shared through
/// an atomic. Branch winners are reduced by (score, branch index), which
/// picks the same assignment the sequential search would.
pub(crate) fn run_parallel(
    graph: &CandidateGraph,
    order: &[usize],
    interrupt: &Interrupt,
    show_progress: bool,
) -> Result<SearchResult, SolveError> {
    let Some(&first) = order.first() else {
        return run_sequential(graph, order, interrupt);
    };
    if order.len() < 2 {
        return run_sequential(graph, order, interrupt);
    }

    let branches: Vec<PairIdx> = graph.people[first].candidates.to_vec();
    let shared = AtomicI64::new(NO_SCORE);
    let pb = progress_bar(branches.len() as u64, show_progress);
    debug!(branches = branches.len(), "fanning out first level");

    let results: Vec<SearchResult> = branches
        .par_iter()
        .enumerate()
        .map(|(b, &pi)| {
            let mut st = SearchState::new(graph, order, Some(&shared), interrupt);
            // level 0 holds nothing yet, so only the bound can refuse
            st.stats[0].offered += 1;
            let penalty = graph.pairs[pi].penalty;
            if !st.within_bound(penalty) {
                st.stats[0].score_too_high += 1;
            } else {
                st.stats[0].accepted += 1;
                st.place(0, pi);
                let res = st.step(1, penalty);
                st.unplace(0, pi);
                if let Err(e) = res {
                    interrupt.trip();
                    return Err(e);
                }
            }
            pb.inc(1);
            pb.set_message(format!("branch={b} best={}", display_score(st.best_score)));
            Ok(SearchResult::from(st))
        })
        .collect::<Result<_, SolveError>>()?;
    pb.finish_and_clear();

    let mut merged = SearchResult {
        best: vec![None; order.len()],
        best_score: NO_SCORE,
        stats: vec![Statistics::default(); order.len()],
        // the root call that the fan-out stands in for
        steps: 1,
        solutions: 0,
    };
    for r in &results {
        for (m, s) in merged.stats.iter_mut().zip(&r.stats) {
            m.add(s);
        }
        merged.steps += r.steps;
        merged.solutions += r.solutions;
    }
    // ties keep the earlier branch
    if let Some(win) = results.into_iter().fold(None::<SearchResult>, |acc, r| match acc {
        Some(a) if a.best_score <= r.best_score => Some(a),
        _ => Some(r),
    }) {
        merged.best = win.best;
        merged.best_score = win.best_score;
    }
    Ok(merged)
}

fn display_score(score: i64) -> String {
    if score == NO_SCORE {
        "-".to_string()
    } else {
        score.to_string()
    }
}
