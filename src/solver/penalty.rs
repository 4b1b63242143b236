use ahash::AHashMap;
use std::io::{self, Write};

use crate::error::MAX_PEOPLE;
use crate::roster::History;

/// Years are weighted relative to this epoch; anything at or before it is free.
pub const BASE_YEAR: i32 = 1990;
pub const HISTORY_EXPONENT: f64 = 2.5;
pub const BAGGAGE_EXPONENT: f64 = 1.5;

/// Largest price of a single pair. A full assignment of `MAX_PEOPLE` pairs at
/// this price still scores below `search::NO_SCORE`.
pub const PENALTY_CEILING: i64 = i64::MAX / (2 * MAX_PEOPLE as i64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenaltyModel {
    pub base_year: i32,
    pub history_exponent: f64,
    pub baggage_exponent: f64,
}

impl Default for PenaltyModel {
    fn default() -> Self {
        PenaltyModel {
            base_year: BASE_YEAR,
            history_exponent: HISTORY_EXPONENT,
            baggage_exponent: BAGGAGE_EXPONENT,
        }
    }
}

/// What a giver carries from their own history.
///
/// `past` counts gifts per recipient name, `past_repeats` is the number of
/// history records minus the number of distinct recipients, and `multiplier`
/// is `1 + past_repeats ^ baggage_exponent` (exactly 1 with no repeats).
#[derive(Debug, Clone)]
pub struct Baggage<'a> {
    pub past: AHashMap<&'a str, u32>,
    pub past_repeats: u32,
    pub multiplier: f64,
}

impl PenaltyModel {
    /// `floor((year - base_year) ^ history_exponent)`; the more recent, the heavier.
    #[inline]
    pub fn year_penalty(&self, year: i32) -> i64 {
        let y = year.saturating_sub(self.base_year);
        if y <= 0 {
            return 0;
        }
        (y as f64).powf(self.history_exponent).floor() as i64
    }

    pub fn baggage<'a>(&self, history: &'a [History]) -> Baggage<'a> {
        let mut past: AHashMap<&'a str, u32> = AHashMap::with_capacity(history.len());
        for h in history {
            *past.entry(h.recipient.as_str()).or_insert(0) += 1;
        }
        let past_repeats = (history.len() - past.len()) as u32;
        let multiplier = 1.0 + (past_repeats as f64).powf(self.baggage_exponent);
        Baggage {
            past,
            past_repeats,
            multiplier,
        }
    }

    /// Penalty for `giver` gifting `recipient` again.
    ///
    /// Every past gift to the same recipient contributes its weighted year
    /// penalty, scaled by the total repeat count, so a pair given k times
    /// accumulates k terms each multiplied by k. Far-future years saturate at
    /// `PENALTY_CEILING`.
    pub fn pair_penalty(&self, history: &[History], baggage: &Baggage<'_>, recipient: &str) -> i64 {
        let repeats = baggage.past.get(recipient).copied().unwrap_or(0) as i64;
        if repeats == 0 {
            return 0;
        }
        history
            .iter()
            .filter(|h| h.recipient == recipient)
            .map(|h| {
                let weighted = (self.year_penalty(h.year) as f64 * baggage.multiplier).floor() as i64;
                repeats.saturating_mul(weighted)
            })
            .fold(0i64, i64::saturating_add)
            .min(PENALTY_CEILING)
    }

    /// Year-by-year penalty table, newest first.
    pub fn write_table(&self, newest: i32, years: usize, out: &mut impl Write) -> io::Result<()> {
        for y in (0..years as i32).map(|k| newest - k) {
            writeln!(out, "{:4}  :  {:7}", y, self.year_penalty(y))?;
        }
        Ok(())
    }
}
