use indicatif::{HumanCount, HumanDuration};
use std::io::{self, Write};

use super::SolveOutcome;
use crate::roster::DataStore;

/// Search-tree outcomes for one level (one giver).
///
/// offered = already_in_solution + reciprocal_in_solution + score_too_high + accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub offered: u64,
    pub already_in_solution: u64,
    pub reciprocal_in_solution: u64,
    pub score_too_high: u64,
    pub accepted: u64,
}

impl Statistics {
    pub fn add(&mut self, o: &Statistics) {
        self.offered += o.offered;
        self.already_in_solution += o.already_in_solution;
        self.reciprocal_in_solution += o.reciprocal_in_solution;
        self.score_too_high += o.score_too_high;
        self.accepted += o.accepted;
    }

    pub fn total<'a>(all: impl IntoIterator<Item = &'a Statistics>) -> Statistics {
        let mut sum = Statistics::default();
        for s in all {
            sum.add(s);
        }
        sum
    }

    #[inline]
    pub fn is_balanced(&self) -> bool {
        self.offered
            == self.already_in_solution
                + self.reciprocal_in_solution
                + self.score_too_high
                + self.accepted
    }

    pub fn one_line(&self) -> String {
        format!(
            "{:>12}  {:>12}  {:>12}  {:>12}  {:>12}",
            HumanCount(self.offered).to_string(),
            HumanCount(self.already_in_solution).to_string(),
            HumanCount(self.reciprocal_in_solution).to_string(),
            HumanCount(self.score_too_high).to_string(),
            HumanCount(self.accepted).to_string(),
        )
    }

    pub fn report(&self, out: &mut impl Write) -> io::Result<()> {
        row(out, "Offered", HumanCount(self.offered))?;
        row(out, "Already In Solution", HumanCount(self.already_in_solution))?;
        row(out, "Reciprocal", HumanCount(self.reciprocal_in_solution))?;
        row(out, "Score Too High", HumanCount(self.score_too_high))?;
        row(out, "Accepted", HumanCount(self.accepted))
    }
}

const LEN_TITLE: usize = 25;
const LEN_VALUE: usize = 40;

fn row(out: &mut impl Write, title: &str, value: impl std::fmt::Display) -> io::Result<()> {
    writeln!(
        out,
        "{:<w$} : {:>v$}",
        title,
        value.to_string(),
        w = LEN_TITLE,
        v = LEN_VALUE
    )
}

pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

fn possible_solutions(n: u128) -> String {
    match u64::try_from(n) {
        Ok(v) => HumanCount(v).to_string(),
        Err(_) => format!("{:.3e}", n as f64),
    }
}

/// Full statistics block printed after a solve: some history, this year's
/// figures, the aggregate counters, and one line per level.
pub fn write_statistics(
    outcome: &SolveOutcome,
    store: &DataStore,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out)?;

    // longest history before this year's gifts were applied
    let years = outcome
        .levels
        .iter()
        .filter_map(|l| store.person(l.at))
        .map(|p| p.history.iter().filter(|h| h.year < outcome.year).count())
        .max()
        .unwrap_or(0);
    let gifts = store.gifts_before(outcome.year);

    writeln!(out, "Some History")?;
    row(out, "Year", ordinal(years + 1))?;
    row(out, "Total Gifts", HumanCount(gifts as u64))?;
    writeln!(out)?;

    writeln!(out, "Calculating {}", outcome.year)?;
    row(out, "Time to calculate", HumanDuration(outcome.elapsed))?;
    row(out, "Folks", outcome.levels.len())?;
    row(out, "Families", store.families.len())?;
    row(out, "Possible Pairs", HumanCount(outcome.legal_pairs as u64))?;
    row(out, "Possible Solutions", possible_solutions(outcome.possible_solutions))?;
    writeln!(out)?;

    writeln!(out, "Statistics")?;
    outcome.total().report(out)?;
    row(out, "Steps", HumanCount(outcome.steps))?;
    row(out, "Solutions considered", HumanCount(outcome.solutions))?;
    writeln!(out)?;

    writeln!(out, "Details")?;
    writeln!(
        out,
        "    {:<10}  {:>12}  {:>12}  {:>12}  {:>12}  {:>12}",
        "Giver", "Offered", "In Solution", "Reciprocal", "Score", "Accepted"
    )?;
    for (idx, l) in outcome.levels.iter().enumerate() {
        writeln!(out, "{:2}  {:<10}  {}", idx, l.name, l.stats.one_line())?;
    }
    Ok(())
}
