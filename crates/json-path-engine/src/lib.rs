//! Event-driven JSONPath evaluation.
//!
//! Queries arrive as a [`Plan`]: a small DAG of operations built with
//! [`PlanBuilder`]. The [`Processor`] interprets the plan over a
//! `serde_json::Value`, walking the document through lazy [`Event`] streams
//! and tracking which input candidate every intermediate value belongs to
//! with an [`IndexMap`].
//!
//! # Example
//!
//! ```
//! use json_path_engine::{PlanBuilder, Processor};
//! use serde_json::json;
//!
//! // $.books[*]
//! let mut builder = PlanBuilder::new();
//! let input = builder.get_input().unwrap();
//! let names = builder.populate_name_list(vec!["books".into()]).unwrap();
//! let books = builder.match_property_strictly(names).unwrap();
//! let books = builder.fetch_children(input, books).unwrap();
//! let any = builder.match_any_child().unwrap();
//! let output = builder.fetch_children(books, any).unwrap();
//! let plan = builder.set_output(output).unwrap();
//!
//! let doc = json!({"books": ["a", "b"]});
//! let processor = Processor::new();
//! let result = processor.select(&plan, &doc).unwrap();
//! assert_eq!(result.decode(), vec![json!("a"), json!("b")]);
//!
//! let paths = processor.select_paths(&plan, &doc).unwrap();
//! assert_eq!(paths.encode(), vec!["$['books'][0]", "$['books'][1]"]);
//! ```

mod path;
pub use path::{Path, PathSegment};

mod error;
pub use error::{EngineError, ErrorClass};

mod value;
pub use value::Value;

mod event;
pub use event::{Event, Events};

mod index_map;
pub use index_map::IndexMap;

mod value_list;
pub use value_list::ValueList;

mod matcher;
pub use matcher::Matcher;

mod comparator;
pub use comparator::{
    CaseInsensitiveCollation, CodepointCollation, Collation, Comparators, RegExpMatcher,
    UnicodeCollation,
};

mod aggregator;
pub use aggregator::{Aggregator, AggregatorCollection};

mod fetcher;
pub use fetcher::Fetcher;

mod plan;
pub use plan::{Capabilities, Node, NodeId, NodeKind, Plan, PlanBuilder, PlanError};

mod runtime;
pub use runtime::Runtime;

mod result;
pub use result::{SelectOnePathResult, SelectOneResult, SelectPathsResult, SelectResult};

mod processor;
pub use processor::{Processor, ProcessorBuilder};
