//! Values paired with their candidate map.

use crate::error::EngineError;
use crate::index_map::IndexMap;
use crate::value::Value;

/// The unit of computation: `values[i]` belongs to candidate
/// `index_map.outer_index(i)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueList<'a> {
    values: Vec<Value<'a>>,
    index_map: IndexMap,
}

impl<'a> ValueList<'a> {
    pub fn new(values: Vec<Value<'a>>, index_map: IndexMap) -> Result<Self, EngineError> {
        if values.len() != index_map.len() {
            return Err(EngineError::ValueListMismatch {
                values: values.len(),
                indexes: index_map.len(),
            });
        }
        Ok(Self { values, index_map })
    }

    /// A single value for candidate 0.
    pub fn root(value: Value<'a>) -> Self {
        Self {
            values: vec![value],
            index_map: IndexMap::new(vec![0]),
        }
    }

    pub(crate) fn from_pairs(pairs: Vec<(Value<'a>, usize)>) -> Self {
        let (values, outer): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self {
            values,
            index_map: IndexMap::new(outer),
        }
    }

    pub fn values(&self) -> &[Value<'a>] {
        &self.values
    }

    pub fn index_map(&self) -> &IndexMap {
        &self.index_map
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, inner: usize) -> Result<&Value<'a>, EngineError> {
        self.values.get(inner).ok_or(EngineError::ValueNotFound(inner))
    }

    pub fn outer_index(&self, inner: usize) -> Result<usize, EngineError> {
        self.index_map.outer_index(inner)
    }

    pub fn outer_index_exists(&self, outer: usize) -> bool {
        self.index_map.outer_index_exists(outer)
    }

    /// Same values, each in its own candidate.
    pub fn split(&self) -> Self {
        Self {
            values: self.values.clone(),
            index_map: self.index_map.split(),
        }
    }

    /// Value/outer pairs in inner order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value<'a>, usize)> + '_ {
        self.values
            .iter()
            .zip(self.index_map.as_slice().iter().copied())
    }

    pub fn into_values(self) -> Vec<Value<'a>> {
        self.values
    }
}
