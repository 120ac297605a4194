//! Results returned by the `select*` entry points.

use serde_json::Value as Json;

use crate::path::Path;
use crate::value::Value;

/// Every matched value.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectResult<'a> {
    values: Vec<Value<'a>>,
}

impl<'a> SelectResult<'a> {
    pub(crate) fn new(values: Vec<Value<'a>>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value<'a>] {
        &self.values
    }

    /// Owned copies of the matched JSON.
    pub fn decode(&self) -> Vec<Json> {
        self.values.iter().map(|value| value.data().clone()).collect()
    }

    /// Each match serialized as compact JSON text.
    pub fn encode(&self) -> Vec<String> {
        self.values.iter().map(|value| value.data().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// At most one matched value.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOneResult<'a> {
    value: Option<Value<'a>>,
}

impl<'a> SelectOneResult<'a> {
    pub(crate) fn new(value: Option<Value<'a>>) -> Self {
        Self { value }
    }

    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Value<'a>> {
        self.value.as_ref()
    }

    pub fn decode(&self) -> Option<Json> {
        self.value.as_ref().map(|value| value.data().clone())
    }

    pub fn encode(&self) -> Option<String> {
        self.value.as_ref().map(|value| value.data().to_string())
    }
}

/// Locations of every matched value.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectPathsResult {
    paths: Vec<Path>,
}

impl SelectPathsResult {
    pub(crate) fn new(paths: Vec<Path>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// Normalized path strings such as `$['a'][0]`.
    pub fn encode(&self) -> Vec<String> {
        self.paths.iter().map(Path::to_string).collect()
    }
}

/// Location of at most one matched value.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOnePathResult {
    path: Option<Path>,
}

impl SelectOnePathResult {
    pub(crate) fn new(path: Option<Path>) -> Self {
        Self { path }
    }

    pub fn exists(&self) -> bool {
        self.path.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    pub fn encode(&self) -> Option<String> {
        self.path.as_ref().map(Path::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_result_encoding() {
        let doc = json!({"a": [1, "x"]});
        let result = SelectResult::new(vec![Value::node(&doc["a"], Path::root().with_property("a"))]);
        assert_eq!(result.decode(), vec![json!([1, "x"])]);
        assert_eq!(result.encode(), vec![r#"[1,"x"]"#.to_string()]);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_missing_results() {
        let one = SelectOneResult::new(None);
        assert!(!one.exists());
        assert_eq!(one.decode(), None);
        let path = SelectOnePathResult::new(None);
        assert_eq!(path.encode(), None);
    }

    #[test]
    fn test_paths_encoding() {
        let result = SelectPathsResult::new(vec![
            Path::root(),
            Path::root().with_property("a").with_element(1),
        ]);
        assert_eq!(result.encode(), vec!["$", "$['a'][1]"]);
    }
}
