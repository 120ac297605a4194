//! Traversal events and the pull cursor that produces them.

use std::borrow::Cow;

use serde_json::Value as Json;

use crate::path::Path;
use crate::value::Value;

/// A traversal notification.
///
/// `Element` and `Property` report the container's path in `path`; the child
/// itself follows as the next value in the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<'a> {
    Scalar(Value<'a>),
    BeforeArray(Value<'a>),
    AfterArray {
        path: Path,
    },
    Element {
        index: usize,
        child_path: Path,
        path: Path,
    },
    BeforeObject(Value<'a>),
    AfterObject {
        path: Path,
    },
    Property {
        name: &'a str,
        child_path: Path,
        path: Path,
    },
}

impl<'a> Event<'a> {
    pub fn path(&self) -> &Path {
        match self {
            Event::Scalar(value) | Event::BeforeArray(value) | Event::BeforeObject(value) => {
                value.path()
            }
            Event::AfterArray { path }
            | Event::AfterObject { path }
            | Event::Element { path, .. }
            | Event::Property { path, .. } => path,
        }
    }

    /// The value an opening event describes.
    pub fn into_value(self) -> Option<Value<'a>> {
        match self {
            Event::Scalar(value) | Event::BeforeArray(value) | Event::BeforeObject(value) => {
                Some(value)
            }
            _ => None,
        }
    }
}

enum Frame<'a> {
    Array {
        path: Path,
        items: std::iter::Enumerate<std::slice::Iter<'a, Json>>,
    },
    Object {
        path: Path,
        entries: serde_json::map::Iter<'a>,
    },
}

/// Lazy, depth-first event stream over one value.
///
/// Each call to `next` produces exactly one event; containers are only
/// descended into as far as the consumer pulls.
pub struct Events<'a> {
    pending: Option<Value<'a>>,
    frames: Vec<Frame<'a>>,
}

impl<'a> Events<'a> {
    pub fn new(value: Value<'a>) -> Self {
        Self {
            pending: Some(value),
            frames: Vec::new(),
        }
    }

    fn open(&mut self, value: Value<'a>) -> Event<'a> {
        let (data, path) = value.into_parts();
        let node = match data {
            Cow::Borrowed(node) => node,
            // Owned values are computed scalars.
            Cow::Owned(data) => return Event::Scalar(Value::from_owned(data, path)),
        };
        match node {
            Json::Array(items) => {
                self.frames.push(Frame::Array {
                    path: path.clone(),
                    items: items.iter().enumerate(),
                });
                Event::BeforeArray(Value::node(node, path))
            }
            Json::Object(entries) => {
                self.frames.push(Frame::Object {
                    path: path.clone(),
                    entries: entries.iter(),
                });
                Event::BeforeObject(Value::node(node, path))
            }
            _ => Event::Scalar(Value::node(node, path)),
        }
    }
}

impl<'a> Iterator for Events<'a> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Event<'a>> {
        if let Some(value) = self.pending.take() {
            return Some(self.open(value));
        }
        let event = match self.frames.last_mut()? {
            Frame::Array { path, items } => match items.next() {
                Some((index, child)) => {
                    let child_path = path.with_element(index);
                    self.pending = Some(Value::node(child, child_path.clone()));
                    return Some(Event::Element {
                        index,
                        child_path,
                        path: path.clone(),
                    });
                }
                None => Event::AfterArray { path: path.clone() },
            },
            Frame::Object { path, entries } => match entries.next() {
                Some((name, child)) => {
                    let child_path = path.with_property(name.as_str());
                    self.pending = Some(Value::node(child, child_path.clone()));
                    return Some(Event::Property {
                        name: name.as_str(),
                        child_path,
                        path: path.clone(),
                    });
                }
                None => Event::AfterObject { path: path.clone() },
            },
        };
        self.frames.pop();
        Some(event)
    }
}
