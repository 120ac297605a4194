//! JSONPath query syntax tree.

use serde_json::Value;

/// Selector types for JSONPath.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Named selector for property access: `.name`, `['key']`
    Name(String),
    /// Index selector for array element access: `[0]`, `[-1]`
    Index(isize),
    /// Slice selector for array slicing: `[start:end:step]`
    Slice {
        start: Option<isize>,
        end: Option<isize>,
        step: Option<isize>,
    },
    /// Wildcard selector for selecting all children: `.*`, `[*]`
    Wildcard,
    /// Filter expression for conditional selection: `[?(@.price < 10)]`
    Filter(FilterExpression),
}

/// Path segment containing one or more selectors.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub selectors: Vec<Selector>,
    /// Whether this is a descendant segment (`..`).
    pub recursive: bool,
}

impl PathSegment {
    pub fn new(selectors: Vec<Selector>, recursive: bool) -> Self {
        Self {
            selectors,
            recursive,
        }
    }
}

/// Complete JSONPath expression.
#[derive(Debug, Clone, PartialEq)]
pub struct JSONPath {
    pub segments: Vec<PathSegment>,
    /// Trailing aggregate call such as `.min()`.
    pub aggregate: Option<String>,
}

impl JSONPath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self {
            segments,
            aggregate: None,
        }
    }

    pub fn with_aggregate(mut self, name: impl Into<String>) -> Self {
        self.aggregate = Some(name.into());
        self
    }
}

/// Filter expression types.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    /// Comparison expression: `@.price < 10`
    Comparison {
        operator: ComparisonOperator,
        left: ValueExpression,
        right: ValueExpression,
    },
    /// Regular expression match: `@.author =~ /rees/i`
    RegExp {
        value: ValueExpression,
        pattern: String,
    },
    /// Logical expression: `@.a && @.b`
    Logical {
        operator: LogicalOperator,
        left: Box<FilterExpression>,
        right: Box<FilterExpression>,
    },
    /// Existence test: `@.name`, `@`
    Existence { value: ValueExpression },
    /// Parenthesized expression: `(@.a || @.b)`
    Paren(Box<FilterExpression>),
    /// Negation: `!@.flag`
    Negation(Box<FilterExpression>),
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Equal,        // ==
    NotEqual,     // !=
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And, // &&
    Or,  // ||
}

/// Value expressions in filters.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpression {
    /// Current node: `@`
    Current,
    /// Root-relative path: `$.name`
    Root(JSONPath),
    /// Literal value: `"string"`, `42`, `true`, `null`, `[1, 2]`
    Literal(Value),
    /// Path relative to the current node: `@.name`
    Path(JSONPath),
}
