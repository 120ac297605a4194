//! Command-line entry point helpers.

use json_path_engine::{EngineError, Processor};
use thiserror::Error;

use crate::query::{Query, QueryError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid JSON input: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// What `json-path` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputMode {
    /// Only the first match; the query must be definite.
    pub one: bool,
    /// Normalized paths instead of values.
    pub paths: bool,
}

/// Runs `query` over the JSON text `input`, returning one line per result.
pub fn select(query: &str, input: &str, mode: OutputMode) -> Result<Vec<String>, CliError> {
    let query = Query::compile(query)?;
    let doc: serde_json::Value = serde_json::from_str(input)?;
    let processor = Processor::new();
    let plan = query.plan();

    let lines = match (mode.one, mode.paths) {
        (false, false) => processor.select(plan, &doc)?.encode(),
        (false, true) => processor.select_paths(plan, &doc)?.encode(),
        (true, false) => processor.select_one(plan, &doc)?.encode().into_iter().collect(),
        (true, true) => processor.select_one_path(plan, &doc)?.encode().into_iter().collect(),
    };
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_values_and_paths() {
        let input = r#"{"a": [1, {"b": true}]}"#;
        assert_eq!(
            select("$.a[*]", input, OutputMode::default()).unwrap(),
            vec!["1", r#"{"b":true}"#]
        );
        let paths = OutputMode {
            paths: true,
            ..OutputMode::default()
        };
        assert_eq!(select("$.a[*]", input, paths).unwrap(), vec!["$['a'][0]", "$['a'][1]"]);
    }

    #[test]
    fn test_select_one() {
        let one = OutputMode {
            one: true,
            paths: false,
        };
        assert_eq!(select("$.a", r#"{"a": "x"}"#, one).unwrap(), vec![r#""x""#]);
        assert!(select("$.b", r#"{"a": "x"}"#, one).unwrap().is_empty());
        assert!(matches!(
            select("$.*", r#"{"a": "x"}"#, one),
            Err(CliError::Engine(EngineError::IndefiniteQuery))
        ));
    }

    #[test]
    fn test_select_errors() {
        assert!(matches!(
            select("$", "{", OutputMode::default()),
            Err(CliError::InvalidJson(_))
        ));
        assert!(matches!(
            select("x", "{}", OutputMode::default()),
            Err(CliError::Query(QueryError::Parse(_)))
        ));
    }
}
