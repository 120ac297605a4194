//! Correlation between inner positions and outer candidates.

use std::collections::{HashMap, HashSet};

use crate::error::EngineError;

/// Maps inner positions `0..n` of a value list to outer candidate indexes.
///
/// Several inner positions may share one outer index: that is how a single
/// candidate fans out into many values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexMap {
    outer: Vec<usize>,
    present: HashSet<usize>,
}

impl IndexMap {
    pub fn new(outer: Vec<usize>) -> Self {
        let present = outer.iter().copied().collect();
        Self { outer, present }
    }

    /// Identity map of the given length.
    pub fn identity(len: usize) -> Self {
        Self::new((0..len).collect())
    }

    pub fn len(&self) -> usize {
        self.outer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outer.is_empty()
    }

    pub fn outer_index(&self, inner: usize) -> Result<usize, EngineError> {
        self.outer
            .get(inner)
            .copied()
            .ok_or(EngineError::OuterIndexNotFound(inner))
    }

    pub fn outer_index_exists(&self, outer: usize) -> bool {
        self.present.contains(&outer)
    }

    /// Makes every inner position its own candidate.
    pub fn split(&self) -> Self {
        Self::identity(self.outer.len())
    }

    /// Re-associates this map with a parent map: entry `i` becomes
    /// `parent.outer_index(self.outer_index(i))`.
    pub fn join(&self, parent: &IndexMap) -> Result<Self, EngineError> {
        let outer = self
            .outer
            .iter()
            .map(|&index| parent.outer_index(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(outer))
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.outer
    }

    /// Outer indexes in first-seen order, each once.
    pub fn distinct(&self) -> Vec<usize> {
        let mut seen = HashSet::with_capacity(self.present.len());
        self.outer
            .iter()
            .copied()
            .filter(|&outer| seen.insert(outer))
            .collect()
    }

    /// Inner positions grouped by outer index, each group in inner order.
    pub fn groups(&self) -> HashMap<usize, Vec<usize>> {
        let mut groups: HashMap<usize, Vec<usize>> = HashMap::with_capacity(self.present.len());
        for (inner, &outer) in self.outer.iter().enumerate() {
            groups.entry(outer).or_default().push(inner);
        }
        groups
    }
}

impl From<Vec<usize>> for IndexMap {
    fn from(outer: Vec<usize>) -> Self {
        Self::new(outer)
    }
}
