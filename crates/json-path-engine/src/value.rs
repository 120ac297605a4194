//! Document values.

use std::borrow::Cow;

use serde_json::Value as Json;

use crate::error::EngineError;
use crate::event::Events;
use crate::path::Path;

/// A JSON node together with its location.
///
/// Document nodes borrow the decoded tree. Computed values (aggregate
/// results, boolean indicators, literals copied out of a plan) are always
/// scalars; only those may be owned.
#[derive(Debug, Clone, PartialEq)]
pub struct Value<'a> {
    data: Cow<'a, Json>,
    path: Path,
}

impl<'a> Value<'a> {
    /// Wraps a document node found at `path`.
    pub fn node(data: &'a Json, path: Path) -> Self {
        Self {
            data: Cow::Borrowed(data),
            path,
        }
    }

    /// Wraps the document root.
    pub fn root(data: &'a Json) -> Self {
        Self::node(data, Path::root())
    }

    /// Creates an owned scalar with the root path.
    pub fn computed(data: Json) -> Result<Self, EngineError> {
        if !is_scalar(&data) {
            return Err(EngineError::NonScalarData(data.to_string()));
        }
        Ok(Self {
            data: Cow::Owned(data),
            path: Path::root(),
        })
    }

    /// The `true` indicator produced by predicates.
    pub fn truth() -> Self {
        Self {
            data: Cow::Owned(Json::Bool(true)),
            path: Path::root(),
        }
    }

    pub fn data(&self) -> &Json {
        &self.data
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_scalar(&self) -> bool {
        is_scalar(&self.data)
    }

    pub fn is_array(&self) -> bool {
        self.data.is_array()
    }

    /// Starts a fresh traversal of this value.
    pub fn events(&self) -> Events<'a> {
        Events::new(self.clone())
    }

    pub fn into_json(self) -> Json {
        self.data.into_owned()
    }

    pub(crate) fn from_owned(data: Json, path: Path) -> Self {
        Self {
            data: Cow::Owned(data),
            path,
        }
    }

    pub(crate) fn into_parts(self) -> (Cow<'a, Json>, Path) {
        (self.data, self.path)
    }
}

pub(crate) fn is_scalar(data: &Json) -> bool {
    !matches!(data, Json::Array(_) | Json::Object(_))
}
