use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::error::SolveError;

/// One past gift: who received it, and in which year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    pub recipient: String,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    #[serde(rename = "history", default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<History>,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Person {
            name: name.into(),
            history: Vec::new(),
        }
    }

    /// Builder-style helper, mostly for tests and fixtures.
    pub fn gave(mut self, year: i32, recipient: impl Into<String>) -> Self {
        self.history.push(History {
            recipient: recipient.into(),
            year,
        });
        self
    }

    /// Recipient recorded for `year`, if any. A missing year is a normal outcome.
    pub fn recipient(&self, year: i32) -> Option<&str> {
        self.history
            .iter()
            .find(|h| h.year == year)
            .map(|h| h.recipient.as_str())
    }
}

/// People who may not gift each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "person", default)]
    pub members: Vec<Person>,
}

impl Family {
    pub fn new(members: Vec<Person>) -> Self {
        Family {
            name: None,
            members,
        }
    }

    pub fn named(name: impl Into<String>, members: Vec<Person>) -> Self {
        Family {
            name: Some(name.into()),
            members,
        }
    }
}

/// Position of a person inside the store: (family index, member index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PersonRef {
    pub family: usize,
    pub member: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataStore {
    #[serde(rename = "family", default)]
    pub families: Vec<Family>,
}

impl DataStore {
    pub fn new(families: Vec<Family>) -> Self {
        DataStore { families }
    }

    /// Everyone, in file order.
    pub fn people(&self) -> impl Iterator<Item = (PersonRef, &Person)> + '_ {
        self.families.iter().enumerate().flat_map(|(f, fam)| {
            fam.members
                .iter()
                .enumerate()
                .map(move |(m, p)| (PersonRef { family: f, member: m }, p))
        })
    }

    pub fn population(&self) -> usize {
        self.families.iter().map(|f| f.members.len()).sum()
    }

    pub fn person(&self, at: PersonRef) -> Option<&Person> {
        self.families.get(at.family)?.members.get(at.member)
    }

    pub fn person_mut(&mut self, at: PersonRef) -> Option<&mut Person> {
        self.families.get_mut(at.family)?.members.get_mut(at.member)
    }

    pub fn find(&self, name: &str) -> Option<(PersonRef, &Person)> {
        self.people().find(|(_, p)| p.name == name)
    }

    /// Newest year present in any history record.
    pub fn latest_year(&self) -> Option<i32> {
        self.people()
            .flat_map(|(_, p)| p.history.iter().map(|h| h.year))
            .max()
    }

    /// The year a new solve is for: the one after the latest recorded, or the
    /// current calendar year when nobody has any history yet.
    pub fn next_year(&self) -> Result<i32, SolveError> {
        match self.latest_year() {
            Some(latest) => latest
                .checked_add(1)
                .ok_or(SolveError::YearOverflow { latest }),
            None => Ok(current_year()),
        }
    }

    /// Gifts recorded for years before `year`.
    pub fn gifts_before(&self, year: i32) -> usize {
        self.people()
            .map(|(_, p)| p.history.iter().filter(|h| h.year < year).count())
            .sum()
    }

    /// Names key the history, so they must be unique across families.
    pub fn validate(&self) -> Result<(), SolveError> {
        let mut seen = AHashSet::with_capacity(self.population());
        for (_, p) in self.people() {
            if !seen.insert(p.name.as_str()) {
                return Err(SolveError::DuplicatePerson {
                    name: p.name.clone(),
                });
            }
        }
        Ok(())
    }
}

pub fn current_year() -> i32 {
    time::OffsetDateTime::now_utc().year()
}
