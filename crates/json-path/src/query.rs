//! Compiled queries.

use std::str::FromStr;

use json_path_engine::{AggregatorCollection, Capabilities, Plan};
use thiserror::Error;
use tracing::debug;

use crate::parser::{JsonPathParser, ParseError};
use crate::translator::{QueryTranslator, TranslateError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("Failed to parse query: {0}")]
    Parse(#[from] ParseError),
    #[error("Failed to translate query {query}: {reason}")]
    TranslationFailed {
        query: String,
        #[source]
        reason: TranslateError,
    },
}

/// A query text together with the plan it compiles to.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    source: String,
    plan: Plan,
}

impl Query {
    /// Compiles `source` with the built-in aggregate functions.
    pub fn compile(source: &str) -> Result<Self, QueryError> {
        Self::compile_with(source, &AggregatorCollection::default())
    }

    /// Compiles `source`, accepting the aggregate names in `aggregators`.
    pub fn compile_with(source: &str, aggregators: &AggregatorCollection) -> Result<Self, QueryError> {
        let path = JsonPathParser::parse(source)?;
        let plan = QueryTranslator::new(aggregators)
            .translate(&path)
            .map_err(|reason| QueryError::TranslationFailed {
                query: source.to_string(),
                reason,
            })?;
        debug!(
            query = source,
            nodes = plan.nodes().len(),
            definite = plan.capabilities().is_definite,
            "compiled query"
        );
        Ok(Self {
            source: source.to_string(),
            plan,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn capabilities(&self) -> Capabilities {
        self.plan.capabilities()
    }
}

impl FromStr for Query {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}
