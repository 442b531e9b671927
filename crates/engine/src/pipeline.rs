//! Equivalence tiers.
//!
//! A pipeline is an ordered list of (predicate, projection) pairs, most
//! specific first. Consolidation runs the tiers in order; a record consumed by
//! an earlier tier is never offered to a later one.

use std::fmt;

use crate::record::Record;

pub type MatchFn<T> = fn(&T, &T) -> bool;
pub type ProjectFn<T> = fn(&T) -> <T as Record>::View;

pub struct Tier<T: Record> {
    pub name: &'static str,
    /// Should be an equivalence relation; the engine does not check.
    pub matches: MatchFn<T>,
    pub project: ProjectFn<T>,
}

impl<T: Record> Tier<T> {
    pub fn new(name: &'static str, matches: MatchFn<T>, project: ProjectFn<T>) -> Self {
        Self {
            name,
            matches,
            project,
        }
    }
}

impl<T: Record> Clone for Tier<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            matches: self.matches,
            project: self.project,
        }
    }
}

impl<T: Record> fmt::Debug for Tier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tier").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline<T: Record> {
    tiers: Vec<Tier<T>>,
}

impl<T: Record> Pipeline<T> {
    pub fn new(tiers: Vec<Tier<T>>) -> Self {
        Self { tiers }
    }

    pub fn empty() -> Self {
        Self { tiers: Vec::new() }
    }

    pub fn tiers(&self) -> &[Tier<T>] {
        &self.tiers
    }

    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name).collect()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}
