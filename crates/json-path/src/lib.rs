//! JSONPath queries compiled to evaluation plans.
//!
//! The parser produces a [`JSONPath`] syntax tree, [`QueryTranslator`]
//! lowers it to a [`json_path_engine::Plan`], and [`Query`] bundles both
//! steps. Evaluation is done by [`json_path_engine::Processor`].
//!
//! ```
//! use json_path::Query;
//! use json_path_engine::Processor;
//! use serde_json::json;
//!
//! let query = Query::compile("$.items[?(@.price > 10)].name").unwrap();
//! let doc = json!({"items": [
//!     {"name": "pen", "price": 2},
//!     {"name": "lamp", "price": 40},
//! ]});
//! let result = Processor::new().select(query.plan(), &doc).unwrap();
//! assert_eq!(result.decode(), vec![json!("lamp")]);
//! ```

pub mod cli;
pub mod parser;
pub mod query;
pub mod translator;
pub mod types;

pub use parser::{JsonPathParser, ParseError};
pub use query::{Query, QueryError};
pub use translator::{QueryTranslator, TranslateError};
pub use types::*;
