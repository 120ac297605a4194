//! Entry points: run a plan and shape its output.

use std::sync::Arc;

use serde_json::Value as Json;
use tracing::debug;

use crate::aggregator::AggregatorCollection;
use crate::comparator::{Collation, Comparators, UnicodeCollation};
use crate::error::EngineError;
use crate::plan::Plan;
use crate::result::{SelectOnePathResult, SelectOneResult, SelectPathsResult, SelectResult};
use crate::runtime::Runtime;
use crate::value_list::ValueList;

/// Configuration for a [`Processor`].
#[derive(Debug, Clone)]
pub struct ProcessorBuilder {
    collation: Arc<dyn Collation>,
    aggregators: AggregatorCollection,
}

impl Default for ProcessorBuilder {
    fn default() -> Self {
        Self {
            collation: Arc::new(UnicodeCollation::default()),
            aggregators: AggregatorCollection::default(),
        }
    }
}

impl ProcessorBuilder {
    /// String ordering used by `<`, `>` and friends.
    pub fn collation(mut self, collation: impl Collation + 'static) -> Self {
        self.collation = Arc::new(collation);
        self
    }

    /// Aggregate functions available to plans.
    pub fn aggregators(mut self, aggregators: AggregatorCollection) -> Self {
        self.aggregators = aggregators;
        self
    }

    pub fn build(self) -> Processor {
        Processor {
            runtime: Runtime::new(Comparators::new(self.collation), self.aggregators),
        }
    }
}

/// Runs plans against documents.
#[derive(Debug, Clone, Default)]
pub struct Processor {
    runtime: Runtime,
}

impl Processor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ProcessorBuilder {
        ProcessorBuilder::default()
    }

    /// Raw evaluation: every output value with its candidate map.
    pub fn evaluate<'a>(&self, plan: &'a Plan, root: &'a Json) -> Result<ValueList<'a>, EngineError> {
        self.runtime.run(plan, root)
    }

    pub fn select<'a>(&self, plan: &'a Plan, root: &'a Json) -> Result<SelectResult<'a>, EngineError> {
        let values = self.evaluate(plan, root)?;
        Ok(SelectResult::new(values.into_values()))
    }

    /// Requires a definite plan. No match is `Ok` with an empty result.
    pub fn select_one<'a>(
        &self,
        plan: &'a Plan,
        root: &'a Json,
    ) -> Result<SelectOneResult<'a>, EngineError> {
        Self::require_definite(plan)?;
        let values = self.evaluate(plan, root)?;
        Ok(SelectOneResult::new(values.into_values().into_iter().next()))
    }

    /// Requires a plan whose results are document nodes.
    pub fn select_paths(&self, plan: &Plan, root: &Json) -> Result<SelectPathsResult, EngineError> {
        Self::require_path(plan)?;
        let values = self.evaluate(plan, root)?;
        Ok(SelectPathsResult::new(
            values.values().iter().map(|value| value.path().clone()).collect(),
        ))
    }

    pub fn select_one_path(
        &self,
        plan: &Plan,
        root: &Json,
    ) -> Result<SelectOnePathResult, EngineError> {
        Self::require_definite(plan)?;
        Self::require_path(plan)?;
        let values = self.evaluate(plan, root)?;
        Ok(SelectOnePathResult::new(
            values.values().first().map(|value| value.path().clone()),
        ))
    }

    fn require_definite(plan: &Plan) -> Result<(), EngineError> {
        if plan.capabilities().is_definite {
            Ok(())
        } else {
            debug!("rejecting indefinite plan");
            Err(EngineError::IndefiniteQuery)
        }
    }

    fn require_path(plan: &Plan) -> Result<(), EngineError> {
        if plan.capabilities().is_path {
            Ok(())
        } else {
            debug!("rejecting plan without addressable results");
            Err(EngineError::PathNotSelectable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregator;
    use crate::comparator::CaseInsensitiveCollation;
    use crate::plan::PlanBuilder;
    use serde_json::json;

    fn wildcard_plan() -> Plan {
        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let any = builder.match_any_child().unwrap();
        let output = builder.fetch_children(input, any).unwrap();
        builder.set_output(output).unwrap()
    }

    fn property_plan(name: &str) -> Plan {
        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let names = builder.populate_name_list(vec![name.to_string()]).unwrap();
        let matcher = builder.match_property_strictly(names).unwrap();
        let output = builder.fetch_children(input, matcher).unwrap();
        builder.set_output(output).unwrap()
    }

    #[test]
    fn test_select_one_requires_definite() {
        let doc = json!({"a": 1});
        let processor = Processor::new();
        assert_eq!(
            processor.select_one(&wildcard_plan(), &doc),
            Err(EngineError::IndefiniteQuery)
        );
        assert_eq!(
            processor.select_one_path(&wildcard_plan(), &doc),
            Err(EngineError::IndefiniteQuery)
        );
        let plan_a = property_plan("a");
        let one = processor.select_one(&plan_a, &doc).unwrap();
        assert_eq!(one.decode(), Some(json!(1)));
    }

    #[test]
    fn test_zero_matches_are_empty_successes() {
        let doc = json!({"a": 1});
        let processor = Processor::new();
        let plan = property_plan("missing");
        assert!(processor.select(&plan, &doc).unwrap().is_empty());
        assert!(!processor.select_one(&plan, &doc).unwrap().exists());
        assert!(!processor.select_one_path(&plan, &doc).unwrap().exists());
    }

    #[test]
    fn test_select_paths_requires_path_plan() {
        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let length = builder.aggregate("length", input).unwrap();
        let plan = builder.set_output(length).unwrap();
        let doc = json!([1, 2]);
        let processor = Processor::new();
        assert_eq!(
            processor.select_paths(&plan, &doc),
            Err(EngineError::PathNotSelectable)
        );
        assert_eq!(processor.select(&plan, &doc).unwrap().decode(), vec![json!(2)]);
    }

    #[test]
    fn test_select_paths() {
        let doc = json!({"a": 1, "b": 2});
        let result = Processor::new().select_paths(&wildcard_plan(), &doc).unwrap();
        assert_eq!(result.encode(), vec!["$['a']", "$['b']"]);
    }

    #[test]
    fn test_builder_configuration() {
        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let lowest = builder.aggregate("lowest", input).unwrap();
        let plan = builder.set_output(lowest).unwrap();
        let doc = json!([4, 2, 8]);

        let processor = Processor::builder()
            .collation(CaseInsensitiveCollation)
            .aggregators(AggregatorCollection::default().with("lowest", Aggregator::Min))
            .build();
        assert_eq!(processor.select(&plan, &doc).unwrap().decode(), vec![json!(2)]);
        assert_eq!(
            Processor::new().select(&plan, &doc),
            Err(EngineError::UnknownAggregator("lowest".into()))
        );
    }
}
