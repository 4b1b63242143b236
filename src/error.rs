use thiserror::Error;

/// Largest population the bit-flag identifiers can represent.
pub const MAX_PEOPLE: usize = u64::BITS as usize;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    #[error("{count} people exceed the supported maximum of {max}")]
    TooManyPeople { count: usize, max: usize },

    #[error("person name {name:?} appears more than once")]
    DuplicatePerson { name: String },

    #[error("no year follows {latest}, the latest one on record")]
    YearOverflow { latest: i32 },

    #[error("no legal assignment exists for {people} people")]
    NoSolution { people: usize },

    /// A complete assignment reached the leaves without beating the bound,
    /// which means pruning let through a branch it should have cut.
    #[error("internal error: complete assignment scored {score}, not better than {best}")]
    InconsistentBound { score: i64, best: i64 },

    #[error("search interrupted after {steps} steps")]
    Interrupted { steps: u64 },
}
