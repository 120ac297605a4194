//! Lowers a [`JSONPath`] syntax tree to an evaluation [`Plan`].

use json_path_engine::{AggregatorCollection, EngineError, NodeId, Plan, PlanBuilder, PlanError, RegExpMatcher};
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use crate::types::*;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TranslateError {
    #[error("Unsupported construct: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    InvalidRegExp(EngineError),
    #[error("Unknown aggregate function: {0}")]
    UnknownAggregate(String),
}

/// Emits plan nodes for a query, one syntax node at a time.
///
/// Filters follow a fixed shape: the filtered values become a filter
/// context, the context is split into one candidate per value, the
/// predicate is built on the split, and its verdict is evaluated against
/// the split before filtering the context.
pub struct QueryTranslator<'c> {
    builder: PlanBuilder,
    aggregators: &'c AggregatorCollection,
}

impl<'c> QueryTranslator<'c> {
    /// Aggregate calls are checked against `aggregators`.
    pub fn new(aggregators: &'c AggregatorCollection) -> Self {
        Self {
            builder: PlanBuilder::new(),
            aggregators,
        }
    }

    pub fn translate(mut self, path: &JSONPath) -> Result<Plan, TranslateError> {
        let input = self.builder.get_input()?;
        let output = self.translate_path(input, path)?;
        Ok(self.builder.set_output(output)?)
    }

    fn translate_path(&mut self, source: NodeId, path: &JSONPath) -> Result<NodeId, TranslateError> {
        let mut current = source;
        for segment in &path.segments {
            current = self.translate_segment(current, segment)?;
        }
        if let Some(name) = &path.aggregate {
            if !self.aggregators.contains(name) {
                return Err(TranslateError::UnknownAggregate(name.clone()));
            }
            current = self.builder.aggregate(name.as_str(), current)?;
        }
        Ok(current)
    }

    fn translate_segment(&mut self, source: NodeId, segment: &PathSegment) -> Result<NodeId, TranslateError> {
        if let [Selector::Filter(expr)] = segment.selectors.as_slice() {
            if segment.recursive {
                return Err(TranslateError::Unsupported("filter in descendant segment".into()));
            }
            return self.translate_filter(source, expr);
        }
        let matcher = self.translate_matcher(&segment.selectors)?;
        let node = if segment.recursive {
            self.builder.fetch_children_deep(source, matcher)?
        } else {
            self.builder.fetch_children(source, matcher)?
        };
        Ok(node)
    }

    fn translate_matcher(&mut self, selectors: &[Selector]) -> Result<NodeId, TranslateError> {
        let b = &mut self.builder;
        match selectors {
            [] => Err(TranslateError::Unsupported("empty selector list".into())),
            [Selector::Wildcard] => Ok(b.match_any_child()?),
            [Selector::Slice { start, end, step }] => {
                let slice = b.populate_index_slice(*start, *end, *step)?;
                Ok(b.match_element_strictly(slice)?)
            }
            _ => {
                if let Some(names) = collect(selectors, |s| match s {
                    Selector::Name(name) => Some(name.clone()),
                    _ => None,
                }) {
                    let list = b.populate_name_list(names)?;
                    return Ok(b.match_property_strictly(list)?);
                }
                if let Some(indexes) = collect(selectors, |s| match s {
                    Selector::Index(index) => Some(*index),
                    _ => None,
                }) {
                    let list = b.populate_index_list(indexes)?;
                    return Ok(b.match_element_strictly(list)?);
                }
                Err(TranslateError::Unsupported("mixed selector union".into()))
            }
        }
    }

    fn translate_filter(&mut self, source: NodeId, expr: &FilterExpression) -> Result<NodeId, TranslateError> {
        let context = self.builder.create_filter_context(source)?;
        let split = self.builder.split(context)?;
        let verdict = self.translate_predicate(split, expr)?;
        let evaluated = self.builder.evaluate(split, verdict)?;
        trace!(%context, %evaluated, "filter");
        Ok(self.builder.filter(context, evaluated)?)
    }

    /// Builds a list that holds a value at every candidate of `split` for
    /// which `expr` holds.
    fn translate_predicate(&mut self, split: NodeId, expr: &FilterExpression) -> Result<NodeId, TranslateError> {
        match expr {
            FilterExpression::Paren(inner) => self.translate_predicate(split, inner),
            FilterExpression::Negation(inner) => {
                let operand = self.translate_predicate(split, inner)?;
                Ok(self.builder.evaluate_logical_not(operand, split)?)
            }
            FilterExpression::Logical {
                operator,
                left,
                right,
            } => {
                let left = self.translate_predicate(split, left)?;
                let right = self.translate_predicate(split, right)?;
                let node = match operator {
                    LogicalOperator::And => self.builder.evaluate_logical_and(left, right)?,
                    LogicalOperator::Or => self.builder.evaluate_logical_or(left, right)?,
                };
                Ok(node)
            }
            FilterExpression::Existence { value } => self.translate_value(split, value),
            FilterExpression::RegExp { value, pattern } => {
                RegExpMatcher::new(pattern).map_err(TranslateError::InvalidRegExp)?;
                let source = self.translate_value(split, value)?;
                Ok(self.builder.calculate_is_reg_exp(pattern.as_str(), source)?)
            }
            FilterExpression::Comparison {
                operator,
                left,
                right,
            } => {
                let left = self.translate_value(split, left)?;
                let right = self.translate_value(split, right)?;
                self.translate_comparison(split, *operator, left, right)
            }
        }
    }

    fn translate_comparison(
        &mut self,
        split: NodeId,
        operator: ComparisonOperator,
        left: NodeId,
        right: NodeId,
    ) -> Result<NodeId, TranslateError> {
        let b = &mut self.builder;
        let node = match operator {
            ComparisonOperator::Equal => b.calculate_is_equal(left, right)?,
            ComparisonOperator::NotEqual => {
                let equal = b.calculate_is_equal(left, right)?;
                b.evaluate_logical_not(equal, split)?
            }
            ComparisonOperator::Greater => b.calculate_is_greater(left, right)?,
            ComparisonOperator::Less => b.calculate_is_greater(right, left)?,
            ComparisonOperator::GreaterEqual => {
                let greater = b.calculate_is_greater(left, right)?;
                let equal = b.calculate_is_equal(left, right)?;
                b.evaluate_logical_or(greater, equal)?
            }
            ComparisonOperator::LessEqual => {
                let less = b.calculate_is_greater(right, left)?;
                let equal = b.calculate_is_equal(left, right)?;
                b.evaluate_logical_or(less, equal)?
            }
        };
        Ok(node)
    }

    fn translate_value(&mut self, split: NodeId, value: &ValueExpression) -> Result<NodeId, TranslateError> {
        match value {
            ValueExpression::Current => Ok(split),
            ValueExpression::Path(path) => self.translate_path(split, path),
            ValueExpression::Root(_) => Err(TranslateError::Unsupported(
                "root-relative path inside filter".into(),
            )),
            ValueExpression::Literal(Value::Array(items)) => {
                // An array literal stands for its elements, so `==` tests
                // membership.
                let mut array = self.builder.create_array()?;
                for item in items {
                    let scalar = self.builder.create_scalar(item.clone())?;
                    array = self.builder.append_to_array(array, scalar)?;
                }
                let literal = self.builder.populate_literal_array(split, array)?;
                let any = self.builder.match_any_child()?;
                Ok(self.builder.fetch_children(literal, any)?)
            }
            ValueExpression::Literal(Value::Object(_)) => {
                Err(TranslateError::Unsupported("object literal".into()))
            }
            ValueExpression::Literal(scalar) => {
                let literal = self.builder.create_scalar(scalar.clone())?;
                Ok(self.builder.populate_literal(split, literal)?)
            }
        }
    }
}

/// `Some` when every selector maps to a value.
fn collect<T>(selectors: &[Selector], f: impl Fn(&Selector) -> Option<T>) -> Option<Vec<T>> {
    selectors.iter().map(f).collect()
}
