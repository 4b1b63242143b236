use ahash::AHashMap;
use itertools::Itertools;
use smallvec::SmallVec;
use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::io::{self, Write};

use super::penalty::PenaltyModel;
use crate::error::{MAX_PEOPLE, SolveError};
use crate::roster::{DataStore, PersonRef};

pub type PairIdx = usize;

/// A person as the solver sees them.
///
/// `id` is a single bit (`1 << k` for the k-th person in file order), so the
/// union of two ids names an unordered pair.
#[derive(Debug, Clone)]
pub struct PersonSlot {
    pub name: String,
    pub at: PersonRef,
    pub id: u64,
    pub family: usize,
    /// Legal outgoing pairs, ascending by penalty (stable).
    pub candidates: SmallVec<[PairIdx; 16]>,
    pub baggage: f64,
    pub past_repeats: u32,
}

/// A legal directed (giver -> recipient) option.
#[derive(Debug, Clone)]
pub struct CandidatePair {
    pub giver: usize,
    pub recipient: usize,
    pub penalty: i64,
    /// `giver.id | recipient.id`; identical for A->B and B->A.
    pub flag: u64,
    pub reciprocal: Option<PairIdx>,
}

#[derive(Debug, Clone)]
pub struct CandidateGraph {
    pub people: Vec<PersonSlot>,
    pub pairs: Vec<CandidatePair>,
}

impl CandidateGraph {
    pub fn build(store: &DataStore, model: &PenaltyModel) -> Result<Self, SolveError> {
        let count = store.population();
        if count > MAX_PEOPLE {
            return Err(SolveError::TooManyPeople {
                count,
                max: MAX_PEOPLE,
            });
        }

        // ids and baggage, computed once up front
        let mut people = Vec::with_capacity(count);
        let mut carried = Vec::with_capacity(count);
        for (k, (at, p)) in store.people().enumerate() {
            let bag = model.baggage(&p.history);
            people.push(PersonSlot {
                name: p.name.clone(),
                at,
                id: 1u64 << k,
                family: at.family,
                candidates: SmallVec::new(),
                baggage: bag.multiplier,
                past_repeats: bag.past_repeats,
            });
            carried.push((p, bag));
        }

        // temporary flag -> first pair seen with that flag
        let mut by_flag: AHashMap<u64, PairIdx> = AHashMap::with_capacity(count * count / 2);
        let mut pairs: Vec<CandidatePair> = Vec::new();

        for g in 0..count {
            let (person, bag) = &carried[g];
            for r in 0..count {
                if people[g].family == people[r].family {
                    // same family, self included
                    continue;
                }
                let penalty = model.pair_penalty(&person.history, bag, &people[r].name);
                let flag = people[g].id | people[r].id;
                let idx = pairs.len();
                pairs.push(CandidatePair {
                    giver: g,
                    recipient: r,
                    penalty,
                    flag,
                    reciprocal: None,
                });
                people[g].candidates.push(idx);

                match by_flag.entry(flag) {
                    Entry::Occupied(e) => {
                        let other = *e.get();
                        pairs[idx].reciprocal = Some(other);
                        pairs[other].reciprocal = Some(idx);
                    }
                    Entry::Vacant(e) => {
                        e.insert(idx);
                    }
                }
            }
        }

        // cheapest first, so a good bound turns up early
        for slot in &mut people {
            slot.candidates.sort_by_key(|&i| pairs[i].penalty);
        }

        Ok(CandidateGraph { people, pairs })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.people.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    #[inline]
    pub fn legal_pairs(&self) -> usize {
        self.pairs.len()
    }

    /// Level order for the search: most past repeats first, file order on ties.
    pub fn search_order(&self) -> Vec<usize> {
        (0..self.people.len())
            .sorted_by_key(|&i| Reverse(self.people[i].past_repeats))
            .collect()
    }

    /// Size of the unconstrained search space (product of candidate counts).
    pub fn possible_solutions(&self) -> u128 {
        self.people
            .iter()
            .fold(1u128, |acc, p| acc.saturating_mul(p.candidates.len() as u128))
    }

    pub fn write_baggage_report(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{:<10}  {}", "Name", "baggage")?;
        for p in &self.people {
            writeln!(out, "{:<10}  {:8.2}", p.name, p.baggage)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{Family, Person};

    fn two_by_two() -> DataStore {
        DataStore::new(vec![
            Family::new(vec![Person::new("A"), Person::new("B")]),
            Family::new(vec![Person::new("C"), Person::new("D")]),
        ])
    }

    fn names(g: &CandidateGraph, p: &CandidatePair) -> (String, String) {
        (g.people[p.giver].name.clone(), g.people[p.recipient].name.clone())
    }

    #[test]
    fn two_families_have_eight_free_pairs() {
        let g = CandidateGraph::build(&two_by_two(), &PenaltyModel::default()).unwrap();
        assert_eq!(g.legal_pairs(), 8);
        assert!(g.pairs.iter().all(|p| p.penalty == 0));
        let mut got: Vec<_> = g.pairs.iter().map(|p| names(&g, p)).collect();
        got.sort();
        let want: Vec<_> = [
            ("A", "C"),
            ("A", "D"),
            ("B", "C"),
            ("B", "D"),
            ("C", "A"),
            ("C", "B"),
            ("D", "A"),
            ("D", "B"),
        ]
        .iter()
        .map(|&(a, b)| (a.to_string(), b.to_string()))
        .collect();
        assert_eq!(got, want);
        assert_eq!(g.possible_solutions(), 16);
    }

    #[test]
    fn pairs_never_stay_in_family() {
        let store = DataStore::new(vec![
            Family::new(vec![Person::new("A"), Person::new("B"), Person::new("C")]),
            Family::new(vec![Person::new("D")]),
            Family::new(vec![Person::new("E"), Person::new("F")]),
        ]);
        let g = CandidateGraph::build(&store, &PenaltyModel::default()).unwrap();
        for p in &g.pairs {
            assert_ne!(g.people[p.giver].family, g.people[p.recipient].family);
            assert_ne!(p.giver, p.recipient);
        }
        // A: D,E,F  D: A,B,C,E,F  E: A,B,C,D
        assert_eq!(g.people[0].candidates.len(), 3);
        assert_eq!(g.people[3].candidates.len(), 5);
        assert_eq!(g.people[4].candidates.len(), 4);
    }

    #[test]
    fn reciprocals_are_mutual() {
        let store = DataStore::new(vec![
            Family::new(vec![Person::new("A"), Person::new("B")]),
            Family::new(vec![Person::new("C")]),
            Family::new(vec![Person::new("D"), Person::new("E")]),
        ]);
        let g = CandidateGraph::build(&store, &PenaltyModel::default()).unwrap();
        for (i, p) in g.pairs.iter().enumerate() {
            let r = p.reciprocal.expect("symmetric families always resolve");
            let q = &g.pairs[r];
            assert_eq!(q.flag, p.flag);
            assert_eq!(q.reciprocal, Some(i));
            assert_eq!(q.giver, p.recipient);
            assert_eq!(q.recipient, p.giver);
        }
    }

    #[test]
    fn ids_are_distinct_bits() {
        let g = CandidateGraph::build(&two_by_two(), &PenaltyModel::default()).unwrap();
        let ids: Vec<u64> = g.people.iter().map(|p| p.id).collect();
        assert_eq!(ids, [1, 2, 4, 8]);
    }

    #[test]
    fn candidates_are_cheapest_first() {
        let store = DataStore::new(vec![
            Family::new(vec![Person::new("A").gave(2020, "C").gave(2010, "D")]),
            Family::new(vec![Person::new("C")]),
            Family::new(vec![Person::new("D")]),
            Family::new(vec![Person::new("E")]),
        ]);
        let g = CandidateGraph::build(&store, &PenaltyModel::default()).unwrap();
        let order: Vec<_> = g.people[0]
            .candidates
            .iter()
            .map(|&i| g.people[g.pairs[i].recipient].name.as_str())
            .collect();
        assert_eq!(order, ["E", "D", "C"]);
    }

    #[test]
    fn search_order_puts_repeaters_first() {
        let store = DataStore::new(vec![
            Family::new(vec![Person::new("A"), Person::new("B").gave(2020, "C").gave(2021, "C")]),
            Family::new(vec![
                Person::new("C"),
                Person::new("D").gave(2019, "A").gave(2020, "A").gave(2021, "A"),
                Person::new("E").gave(2020, "A").gave(2021, "A"),
            ]),
        ]);
        let g = CandidateGraph::build(&store, &PenaltyModel::default()).unwrap();
        assert_eq!(g.search_order(), [3, 1, 4, 0, 2]);
    }

    #[test]
    fn population_limit_is_enforced() {
        let members = (0..=MAX_PEOPLE).map(|i| Family::new(vec![Person::new(format!("p{i}"))]));
        let store = DataStore::new(members.collect());
        let err = CandidateGraph::build(&store, &PenaltyModel::default()).unwrap_err();
        assert_eq!(
            err,
            SolveError::TooManyPeople {
                count: MAX_PEOPLE + 1,
                max: MAX_PEOPLE
            }
        );
    }

    #[test]
    fn baggage_report_lists_everyone() {
        let store = DataStore::new(vec![
            Family::new(vec![Person::new("A").gave(2020, "B").gave(2021, "B")]),
            Family::new(vec![Person::new("B")]),
        ]);
        let g = CandidateGraph::build(&store, &PenaltyModel::default()).unwrap();
        let mut buf = Vec::new();
        g.write_baggage_report(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("A               2.00"));
        assert!(text.contains("B               1.00"));
    }
}
