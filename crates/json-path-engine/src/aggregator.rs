//! Aggregate functions over array values.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::{Number, Value as Json};

use crate::comparator::compare_numbers;
use crate::error::EngineError;
use crate::fetcher::Fetcher;
use crate::matcher::Matcher;
use crate::value::Value;

/// A reduction of one array to a single value.
///
/// Non-array inputs produce no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregator {
    /// Smallest numeric element; the first one wins ties.
    Min,
    /// Largest numeric element; the first one wins ties.
    Max,
    /// Mean of the numeric elements.
    Avg,
    /// Sample standard deviation of the numeric elements.
    Stddev,
    /// Number of elements of any type.
    Length,
}

impl Aggregator {
    pub fn name(&self) -> &'static str {
        match self {
            Aggregator::Min => "min",
            Aggregator::Max => "max",
            Aggregator::Avg => "avg",
            Aggregator::Stddev => "stddev",
            Aggregator::Length => "length",
        }
    }

    pub fn aggregate<'a>(&self, value: &Value<'a>) -> Result<Option<Value<'a>>, EngineError> {
        if !value.is_array() {
            return Ok(None);
        }
        let elements = Fetcher::value_children(&Matcher::AnyChild, value)?;
        if *self == Aggregator::Length {
            return Value::computed(Json::from(elements.len())).map(Some);
        }
        let numeric: Vec<(&Value<'a>, &Number)> = elements
            .iter()
            .filter_map(|element| match element.data() {
                Json::Number(number) => Some((element, number)),
                _ => None,
            })
            .collect();
        if numeric.is_empty() {
            return Ok(None);
        }
        match self {
            Aggregator::Min => Ok(Self::pick(&numeric, Ordering::Less)),
            Aggregator::Max => Ok(Self::pick(&numeric, Ordering::Greater)),
            Aggregator::Avg => self.computed(mean(&numeric)),
            Aggregator::Stddev => {
                let mean = mean(&numeric);
                let squares: f64 = numeric
                    .iter()
                    .map(|(_, number)| (as_f64(number) - mean).powi(2))
                    .sum();
                let deviation = if numeric.len() > 1 {
                    (squares / (numeric.len() - 1) as f64).sqrt()
                } else {
                    0.0
                };
                self.computed(deviation)
            }
            Aggregator::Length => Ok(None),
        }
    }

    fn pick<'a>(numeric: &[(&Value<'a>, &Number)], wanted: Ordering) -> Option<Value<'a>> {
        let mut best = numeric.first()?;
        for candidate in &numeric[1..] {
            if compare_numbers(candidate.1, best.1) == Some(wanted) {
                best = candidate;
            }
        }
        Some(best.0.clone())
    }

    fn computed<'a>(&self, result: f64) -> Result<Option<Value<'a>>, EngineError> {
        let number = Number::from_f64(result)
            .ok_or_else(|| EngineError::AggregateFunctionFailed(self.name().to_string()))?;
        Value::computed(Json::Number(number)).map(Some)
    }
}

fn as_f64(number: &Number) -> f64 {
    number.as_f64().unwrap_or(f64::NAN)
}

fn mean(numeric: &[(&Value<'_>, &Number)]) -> f64 {
    numeric.iter().map(|(_, number)| as_f64(number)).sum::<f64>() / numeric.len() as f64
}

/// Name-keyed aggregator registry.
#[derive(Debug, Clone)]
pub struct AggregatorCollection {
    aggregators: HashMap<String, Aggregator>,
}

impl Default for AggregatorCollection {
    fn default() -> Self {
        [
            Aggregator::Min,
            Aggregator::Max,
            Aggregator::Avg,
            Aggregator::Stddev,
            Aggregator::Length,
        ]
        .into_iter()
        .fold(Self::empty(), |collection, aggregator| {
            collection.with(aggregator.name(), aggregator)
        })
    }
}

impl AggregatorCollection {
    pub fn empty() -> Self {
        Self {
            aggregators: HashMap::new(),
        }
    }

    /// Registers `aggregator` under `name`, replacing any previous entry.
    pub fn with(mut self, name: impl Into<String>, aggregator: Aggregator) -> Self {
        self.aggregators.insert(name.into(), aggregator);
        self
    }

    pub fn get(&self, name: &str) -> Result<Aggregator, EngineError> {
        self.aggregators
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::UnknownAggregator(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.aggregators.contains_key(name)
    }
}
