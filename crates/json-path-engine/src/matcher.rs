//! Child matchers.

use crate::event::Event;

/// Decides which children of a container are fetched.
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    /// Every property and every element.
    AnyChild,
    /// Properties with one of the given names.
    NameSet(Vec<String>),
    /// Elements at the given indexes; negative indexes count from the end.
    IndexSet(Vec<isize>),
    /// Elements selected by a `[start:end:step]` slice.
    IndexSlice {
        start: Option<isize>,
        end: Option<isize>,
        step: Option<isize>,
    },
}

impl Matcher {
    /// Tests a `Property` or `Element` event. `len` is the length of the
    /// container the event belongs to.
    pub fn matches(&self, event: &Event<'_>, len: usize) -> bool {
        match (self, event) {
            (Matcher::AnyChild, Event::Property { .. } | Event::Element { .. }) => true,
            (Matcher::NameSet(names), Event::Property { name, .. }) => {
                names.iter().any(|candidate| candidate == name)
            }
            (Matcher::IndexSet(indexes), Event::Element { index, .. }) => indexes
                .iter()
                .any(|&candidate| normalize_index(candidate, len) == Some(*index)),
            (Matcher::IndexSlice { start, end, step }, Event::Element { index, .. }) => {
                slice_contains(*start, *end, step.unwrap_or(1), len, *index)
            }
            _ => false,
        }
    }

    /// True when at most one child of any container can match.
    pub fn is_single(&self) -> bool {
        match self {
            Matcher::NameSet(names) => names.len() == 1,
            Matcher::IndexSet(indexes) => indexes.len() == 1,
            Matcher::AnyChild | Matcher::IndexSlice { .. } => false,
        }
    }
}

fn normalize_index(index: isize, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        len as isize + index
    } else {
        index
    };
    (0..len as isize).contains(&resolved).then_some(resolved as usize)
}

fn slice_contains(
    start: Option<isize>,
    end: Option<isize>,
    step: isize,
    len: usize,
    index: usize,
) -> bool {
    if step == 0 {
        return false;
    }
    let len = len as isize;
    let index = index as isize;
    let resolve = |bound: isize| if bound < 0 { len + bound } else { bound };
    if step > 0 {
        let lower = start.map_or(0, resolve).clamp(0, len);
        let upper = end.map_or(len, resolve).clamp(0, len);
        lower <= index && index < upper && (index - lower) % step == 0
    } else {
        let upper = start.map_or(len - 1, resolve).clamp(-1, len - 1);
        let lower = end.map_or(-1, resolve).clamp(-1, len - 1);
        lower < index && index <= upper && (upper - index) as usize % step.unsigned_abs() == 0
    }
}
