use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use super::Id;

/// Source of transaction ids, swappable for deterministic tests.
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> Id;
}

#[derive(Debug, Clone, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn new_id(&self) -> Id {
        Id::new()
    }
}

/// Hands out a pre-seeded sequence of ids.
///
/// Panics once the sequence is exhausted.
#[derive(Debug, Default)]
pub struct FixedIdGenerator {
    ids: Mutex<VecDeque<Id>>,
}

impl FixedIdGenerator {
    pub fn new(ids: impl IntoIterator<Item = Id>) -> Self {
        Self {
            ids: Mutex::new(ids.into_iter().collect()),
        }
    }

    /// Convenience for `tx-1`, `tx-2`, ... `tx-{count}`.
    pub fn sequential(count: usize) -> Self {
        Self::new((1..=count).map(|n| Id::from_string(format!("tx-{n}"))))
    }
}

impl IdGenerator for FixedIdGenerator {
    fn new_id(&self) -> Id {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .expect("fixed id generator exhausted")
    }
}
