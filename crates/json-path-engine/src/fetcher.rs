//! Traversal and candidate algebra over value lists.
//!
//! Every operation is pure: inputs are never modified and each call builds a
//! fresh [`ValueList`].

use std::collections::HashSet;

use serde_json::Value as Json;

use crate::comparator::Comparators;
use crate::error::EngineError;
use crate::event::{Event, Events};
use crate::matcher::Matcher;
use crate::path::Path;
use crate::value::{is_scalar, Value};
use crate::value_list::ValueList;

fn invalid_event(expected: &Path, event: &Event<'_>) -> EngineError {
    EngineError::InvalidDataEvent {
        expected: expected.clone(),
        actual: event.path().clone(),
    }
}

fn container_len(value: &Value<'_>) -> usize {
    match value.data() {
        Json::Array(items) => items.len(),
        Json::Object(entries) => entries.len(),
        _ => 0,
    }
}

fn scalar_data<'v>(list: &'v ValueList<'_>, inners: &[usize]) -> Vec<&'v Json> {
    inners
        .iter()
        .map(|&inner| &list.values()[inner])
        .filter(|value| value.is_scalar())
        .map(|value| value.data())
        .collect()
}

/// Stateless event-stream and value-list operations.
pub struct Fetcher;

impl Fetcher {
    /// Pulls the next event. When `expected` is given the event must belong
    /// to that path.
    pub fn fetch_event<'a>(
        events: &mut Events<'a>,
        expected: Option<&Path>,
    ) -> Result<Event<'a>, EngineError> {
        let event = events.next().ok_or(EngineError::UnexpectedEndOfData)?;
        match expected {
            Some(path) if event.path() != path => Err(invalid_event(path, &event)),
            _ => Ok(event),
        }
    }

    /// Consumes one complete value.
    pub fn skip_value(events: &mut Events<'_>, path: &Path) -> Result<(), EngineError> {
        Self::fetch_value(events, path).map(|_| ())
    }

    /// Consumes one complete value and returns the value its opening event
    /// describes.
    pub fn fetch_value<'a>(events: &mut Events<'a>, path: &Path) -> Result<Value<'a>, EngineError> {
        match Self::fetch_event(events, Some(path))? {
            Event::Scalar(value) => Ok(value),
            Event::BeforeArray(value) | Event::BeforeObject(value) => {
                Self::skip_children(events, path)?;
                Ok(value)
            }
            event => Err(invalid_event(path, &event)),
        }
    }

    fn skip_children(events: &mut Events<'_>, path: &Path) -> Result<(), EngineError> {
        loop {
            match Self::fetch_event(events, Some(path))? {
                Event::Element { child_path, .. } | Event::Property { child_path, .. } => {
                    Self::skip_value(events, &child_path)?
                }
                Event::AfterArray { .. } | Event::AfterObject { .. } => return Ok(()),
                event => return Err(invalid_event(path, &event)),
            }
        }
    }

    /// Immediate children of one value accepted by `matcher`, in document
    /// order. Scalars have no children.
    pub fn value_children<'a>(
        matcher: &Matcher,
        value: &Value<'a>,
    ) -> Result<Vec<Value<'a>>, EngineError> {
        let mut events = value.events();
        let len = match Self::fetch_event(&mut events, Some(value.path()))? {
            Event::Scalar(_) => return Ok(Vec::new()),
            Event::BeforeArray(container) | Event::BeforeObject(container) => {
                container_len(&container)
            }
            event => return Err(invalid_event(value.path(), &event)),
        };
        let mut children = Vec::new();
        loop {
            let event = Self::fetch_event(&mut events, Some(value.path()))?;
            let matched = matcher.matches(&event, len);
            match event {
                Event::Element { child_path, .. } | Event::Property { child_path, .. } => {
                    if matched {
                        children.push(Self::fetch_value(&mut events, &child_path)?);
                    } else {
                        Self::skip_value(&mut events, &child_path)?;
                    }
                }
                Event::AfterArray { .. } | Event::AfterObject { .. } => return Ok(children),
                event => return Err(invalid_event(value.path(), &event)),
            }
        }
    }

    /// Matched immediate children of every source value; each child keeps
    /// its parent's outer index.
    pub fn fetch_children<'a>(
        matcher: &Matcher,
        source: &ValueList<'a>,
    ) -> Result<ValueList<'a>, EngineError> {
        let mut pairs = Vec::new();
        for (value, outer) in source.iter() {
            for child in Self::value_children(matcher, value)? {
                pairs.push((child, outer));
            }
        }
        Ok(ValueList::from_pairs(pairs))
    }

    /// Matched descendants at any depth below each source value, pre-order.
    pub fn fetch_children_deep<'a>(
        matcher: &Matcher,
        source: &ValueList<'a>,
    ) -> Result<ValueList<'a>, EngineError> {
        let mut pairs = Vec::new();
        for (value, outer) in source.iter() {
            let mut lens: Vec<usize> = Vec::new();
            let mut capture = false;
            for event in value.events() {
                match &event {
                    Event::Element { .. } | Event::Property { .. } => {
                        capture = matcher.matches(&event, lens.last().copied().unwrap_or(0));
                        continue;
                    }
                    Event::AfterArray { .. } | Event::AfterObject { .. } => {
                        lens.pop();
                        continue;
                    }
                    Event::BeforeArray(container) | Event::BeforeObject(container) => {
                        lens.push(container_len(container));
                    }
                    Event::Scalar(_) => {}
                }
                if std::mem::take(&mut capture) {
                    if let Some(child) = event.into_value() {
                        pairs.push((child, outer));
                    }
                }
            }
        }
        Ok(ValueList::from_pairs(pairs))
    }

    /// Arrays are replaced by their elements; anything else passes through.
    pub fn fetch_filter_context<'a>(source: &ValueList<'a>) -> Result<ValueList<'a>, EngineError> {
        let mut pairs = Vec::new();
        for (value, outer) in source.iter() {
            if value.is_array() {
                for child in Self::value_children(&Matcher::AnyChild, value)? {
                    pairs.push((child, outer));
                }
            } else {
                pairs.push((value.clone(), outer));
            }
        }
        Ok(ValueList::from_pairs(pairs))
    }

    fn truths<'a>(outers: impl IntoIterator<Item = usize>) -> ValueList<'a> {
        ValueList::from_pairs(outers.into_iter().map(|outer| (Value::truth(), outer)).collect())
    }

    /// Outers present in either list, left first, each once.
    pub fn logical_or<'a>(left: &ValueList<'_>, right: &ValueList<'_>) -> ValueList<'a> {
        let mut outers = left.index_map().distinct();
        outers.extend(
            right
                .index_map()
                .distinct()
                .into_iter()
                .filter(|&outer| !left.outer_index_exists(outer)),
        );
        Self::truths(outers)
    }

    /// Outers present in both lists, in left order.
    pub fn logical_and<'a>(left: &ValueList<'_>, right: &ValueList<'_>) -> ValueList<'a> {
        Self::truths(
            left.index_map()
                .distinct()
                .into_iter()
                .filter(|&outer| right.outer_index_exists(outer)),
        )
    }

    /// Outers of `universe` absent from `operand`, in universe order.
    pub fn logical_not<'a>(operand: &ValueList<'_>, universe: &ValueList<'_>) -> ValueList<'a> {
        Self::truths(
            universe
                .index_map()
                .distinct()
                .into_iter()
                .filter(|&outer| !operand.outer_index_exists(outer)),
        )
    }

    /// `true` at every outer where some scalar pair from both lists satisfies
    /// `predicate`. Containers never take part.
    pub fn compare<'a, F>(left: &ValueList<'_>, right: &ValueList<'_>, predicate: F) -> ValueList<'a>
    where
        F: Fn(&Json, &Json) -> bool,
    {
        let left_groups = left.index_map().groups();
        let right_groups = right.index_map().groups();
        let outers = left.index_map().distinct().into_iter().filter(|outer| {
            let (Some(lefts), Some(rights)) = (left_groups.get(outer), right_groups.get(outer))
            else {
                return false;
            };
            let rights = scalar_data(right, rights);
            scalar_data(left, lefts)
                .into_iter()
                .any(|l| rights.iter().any(|&r| predicate(l, r)))
        });
        Self::truths(outers.collect::<Vec<_>>())
    }

    pub fn is_equal<'a>(
        left: &ValueList<'_>,
        right: &ValueList<'_>,
        comparators: &Comparators,
    ) -> ValueList<'a> {
        Self::compare(left, right, |l, r| comparators.is_equal(l, r))
    }

    /// `true` at every outer where some scalar satisfies `predicate`.
    pub fn test_each<'a, F>(source: &ValueList<'_>, predicate: F) -> ValueList<'a>
    where
        F: Fn(&Json) -> bool,
    {
        let satisfied: HashSet<usize> = source
            .iter()
            .filter(|(value, _)| value.is_scalar() && predicate(value.data()))
            .map(|(_, outer)| outer)
            .collect();
        Self::truths(
            source
                .index_map()
                .distinct()
                .into_iter()
                .filter(|outer| satisfied.contains(outer)),
        )
    }

    /// One copy of a scalar literal per distinct outer of `template`.
    pub fn create_scalar_list<'a>(
        template: &ValueList<'_>,
        literal: &'a Json,
    ) -> Result<ValueList<'a>, EngineError> {
        if !is_scalar(literal) {
            return Err(EngineError::NonScalarData(literal.to_string()));
        }
        Ok(Self::create_literal_list(template, literal))
    }

    /// Like [`Fetcher::create_scalar_list`] for literals of any shape.
    pub fn create_literal_list<'a>(template: &ValueList<'_>, literal: &'a Json) -> ValueList<'a> {
        ValueList::from_pairs(
            template
                .index_map()
                .distinct()
                .into_iter()
                .map(|outer| (Value::node(literal, Path::root()), outer))
                .collect(),
        )
    }

    /// `true` at every source outer covered by `result`.
    pub fn evaluate<'a>(source: &ValueList<'_>, result: &ValueList<'_>) -> ValueList<'a> {
        Self::truths(
            source
                .index_map()
                .distinct()
                .into_iter()
                .filter(|&outer| result.outer_index_exists(outer)),
        )
    }

    /// Keeps the context values whose position carries a truth in
    /// `evaluated`, re-associated with the context's candidates.
    pub fn filter<'a>(
        context: &ValueList<'a>,
        evaluated: &ValueList<'_>,
    ) -> Result<ValueList<'a>, EngineError> {
        let values = evaluated
            .index_map()
            .as_slice()
            .iter()
            .map(|&position| context.value(position).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        let index_map = evaluated.index_map().join(context.index_map())?;
        ValueList::new(values, index_map)
    }
}
