//! Plan interpreter.

use serde_json::Value as Json;
use tracing::{debug, trace};

use crate::aggregator::AggregatorCollection;
use crate::comparator::{Comparators, RegExpMatcher};
use crate::error::EngineError;
use crate::fetcher::Fetcher;
use crate::matcher::Matcher;
use crate::plan::{Node, NodeId, Plan};
use crate::value::Value;
use crate::value_list::ValueList;

/// Intermediate result of one node.
#[derive(Debug)]
enum Slot<'a> {
    List(ValueList<'a>),
    Matcher(Matcher),
    Names(&'a [String]),
    Indexes(&'a [isize]),
    Slice {
        start: Option<isize>,
        end: Option<isize>,
        step: Option<isize>,
    },
    Literal(&'a Json),
}

impl Slot<'_> {
    fn describe(&self) -> &'static str {
        match self {
            Slot::List(_) => "value list",
            Slot::Matcher(_) => "matcher",
            Slot::Names(_) => "name list",
            Slot::Indexes(_) => "index list",
            Slot::Slice { .. } => "index slice",
            Slot::Literal(_) => "literal",
        }
    }
}

fn mismatch(id: NodeId, wanted: &str, slot: Option<&Slot<'_>>) -> EngineError {
    EngineError::InvalidPlan(format!(
        "node {id} produced {}, expected {wanted}",
        slot.map_or("nothing", Slot::describe)
    ))
}

/// Evaluated slots, indexed by node id.
struct Slots<'a>(Vec<Option<Slot<'a>>>);

impl<'a> Slots<'a> {
    fn get(&self, id: NodeId) -> Option<&Slot<'a>> {
        self.0.get(id.index()).and_then(Option::as_ref)
    }

    fn list(&self, id: NodeId) -> Result<&ValueList<'a>, EngineError> {
        match self.get(id) {
            Some(Slot::List(list)) => Ok(list),
            other => Err(mismatch(id, "value list", other)),
        }
    }

    fn matcher(&self, id: NodeId) -> Result<&Matcher, EngineError> {
        match self.get(id) {
            Some(Slot::Matcher(matcher)) => Ok(matcher),
            other => Err(mismatch(id, "matcher", other)),
        }
    }

    fn literal(&self, id: NodeId) -> Result<&'a Json, EngineError> {
        match self.get(id) {
            Some(Slot::Literal(literal)) => Ok(*literal),
            other => Err(mismatch(id, "literal", other)),
        }
    }
}

/// Executes plans against documents.
///
/// Holds the comparison and aggregation registries; both are fixed at
/// construction.
#[derive(Debug, Clone, Default)]
pub struct Runtime {
    comparators: Comparators,
    aggregators: AggregatorCollection,
}

impl Runtime {
    pub fn new(comparators: Comparators, aggregators: AggregatorCollection) -> Self {
        Self {
            comparators,
            aggregators,
        }
    }

    /// Evaluates the plan's output node against `root`.
    ///
    /// Nodes are visited post-order from the output; each reachable node is
    /// computed once and its result reused by every parent.
    pub fn run<'a>(&self, plan: &'a Plan, root: &'a Json) -> Result<ValueList<'a>, EngineError> {
        debug!(nodes = plan.nodes().len(), output = %plan.output(), "running plan");
        let mut slots = Slots(plan.nodes().iter().map(|_| None).collect());
        let mut stack = vec![(plan.output(), false)];
        while let Some((id, expanded)) = stack.pop() {
            if slots.get(id).is_some() {
                continue;
            }
            let node = plan
                .node(id)
                .ok_or_else(|| EngineError::InvalidPlan(format!("unknown node {id}")))?;
            if !expanded {
                stack.push((id, true));
                for child in node.children().into_iter().rev() {
                    if child >= id {
                        return Err(EngineError::InvalidPlan(format!(
                            "node {id} refers forward to {child}"
                        )));
                    }
                    if slots.get(child).is_none() {
                        stack.push((child, false));
                    }
                }
                continue;
            }
            let slot = self.execute(node, &slots, root)?;
            trace!(node = %id, kind = ?node.kind(), result = slot.describe(), "evaluated");
            slots.0[id.index()] = Some(slot);
        }
        match slots.0[plan.output().index()].take() {
            Some(Slot::List(list)) => {
                debug!(values = list.len(), "plan finished");
                Ok(list)
            }
            other => Err(mismatch(plan.output(), "value list", other.as_ref())),
        }
    }

    fn execute<'a>(
        &self,
        node: &'a Node,
        slots: &Slots<'a>,
        root: &'a Json,
    ) -> Result<Slot<'a>, EngineError> {
        let slot = match node {
            Node::GetInput => Slot::List(ValueList::root(Value::root(root))),
            Node::SetOutput(source) => Slot::List(slots.list(*source)?.clone()),
            Node::CreateFilterContext(source) => {
                Slot::List(Fetcher::fetch_filter_context(slots.list(*source)?)?)
            }
            Node::Split(source) => Slot::List(slots.list(*source)?.split()),
            Node::Evaluate { source, result } => {
                Slot::List(Fetcher::evaluate(slots.list(*source)?, slots.list(*result)?))
            }
            Node::Filter { context, evaluated } => {
                Slot::List(Fetcher::filter(slots.list(*context)?, slots.list(*evaluated)?)?)
            }
            Node::EvaluateLogicalOr(left, right) => {
                Slot::List(Fetcher::logical_or(slots.list(*left)?, slots.list(*right)?))
            }
            Node::EvaluateLogicalAnd(left, right) => {
                Slot::List(Fetcher::logical_and(slots.list(*left)?, slots.list(*right)?))
            }
            Node::EvaluateLogicalNot { operand, context } => {
                Slot::List(Fetcher::logical_not(slots.list(*operand)?, slots.list(*context)?))
            }
            Node::CalculateIsEqual(left, right) => {
                Slot::List(Fetcher::is_equal(
                    slots.list(*left)?,
                    slots.list(*right)?,
                    &self.comparators,
                ))
            }
            Node::CalculateIsGreater(left, right) => Slot::List(Fetcher::compare(
                slots.list(*left)?,
                slots.list(*right)?,
                |l, r| self.comparators.is_greater(l, r),
            )),
            Node::CalculateIsRegExp { source, pattern } => {
                let regex = RegExpMatcher::new(pattern)?;
                Slot::List(Fetcher::test_each(slots.list(*source)?, |data| {
                    regex.is_match(data)
                }))
            }
            Node::FetchChildren { source, matcher } => Slot::List(Fetcher::fetch_children(
                slots.matcher(*matcher)?,
                slots.list(*source)?,
            )?),
            Node::FetchChildrenDeep { source, matcher } => Slot::List(
                Fetcher::fetch_children_deep(slots.matcher(*matcher)?, slots.list(*source)?)?,
            ),
            Node::MatchAnyChild => Slot::Matcher(Matcher::AnyChild),
            Node::MatchPropertyStrictly(names) => match slots.get(*names) {
                Some(Slot::Names(names)) => Slot::Matcher(Matcher::NameSet(names.to_vec())),
                other => return Err(mismatch(*names, "name list", other)),
            },
            Node::MatchElementStrictly(indexes) => match slots.get(*indexes) {
                Some(Slot::Indexes(list)) => Slot::Matcher(Matcher::IndexSet(list.to_vec())),
                Some(Slot::Slice { start, end, step }) => Slot::Matcher(Matcher::IndexSlice {
                    start: *start,
                    end: *end,
                    step: *step,
                }),
                other => return Err(mismatch(*indexes, "index list or slice", other)),
            },
            Node::Aggregate { source, name } => {
                let aggregator = self.aggregators.get(name)?;
                let mut pairs = Vec::new();
                for (value, outer) in slots.list(*source)?.iter() {
                    if let Some(result) = aggregator.aggregate(value)? {
                        pairs.push((result, outer));
                    }
                }
                Slot::List(ValueList::from_pairs(pairs))
            }
            Node::PopulateLiteral { template, literal } => Slot::List(
                Fetcher::create_scalar_list(slots.list(*template)?, slots.literal(*literal)?)?,
            ),
            Node::PopulateLiteralArray { template, array } => Slot::List(
                Fetcher::create_literal_list(slots.list(*template)?, slots.literal(*array)?),
            ),
            Node::PopulateIndexList(indexes) => Slot::Indexes(indexes),
            Node::PopulateIndexSlice { start, end, step } => Slot::Slice {
                start: *start,
                end: *end,
                step: *step,
            },
            Node::PopulateNameList(names) => Slot::Names(names),
            Node::CreateScalar(literal) | Node::CreateArray(literal) => Slot::Literal(literal),
            Node::AppendToArray { literal, .. } => Slot::Literal(literal),
        };
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregator;
    use crate::plan::PlanBuilder;
    use serde_json::json;

    fn data(list: &ValueList<'_>) -> Vec<Json> {
        list.values().iter().map(|value| value.data().clone()).collect()
    }

    fn child(builder: &mut PlanBuilder, source: NodeId, name: &str) -> NodeId {
        let names = builder.populate_name_list(vec![name.to_string()]).unwrap();
        let matcher = builder.match_property_strictly(names).unwrap();
        builder.fetch_children(source, matcher).unwrap()
    }

    #[test]
    fn test_runs_property_chain() {
        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let a = child(&mut builder, input, "a");
        let b = child(&mut builder, a, "b");
        let plan = builder.set_output(b).unwrap();
        let doc = json!({"a": {"b": 42}});
        let result = Runtime::default().run(&plan, &doc).unwrap();
        assert_eq!(data(&result), vec![json!(42)]);
        assert_eq!(result.values()[0].path().to_string(), "$['a']['b']");
    }

    #[test]
    fn test_filter_with_greater_than_literal() {
        // $.items[?(@.price > 10)]
        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let items = child(&mut builder, input, "items");
        let context = builder.create_filter_context(items).unwrap();
        let split = builder.split(context).unwrap();
        let price = child(&mut builder, split, "price");
        let ten = builder.create_scalar(json!(10)).unwrap();
        let literal = builder.populate_literal(split, ten).unwrap();
        let greater = builder.calculate_is_greater(price, literal).unwrap();
        let evaluated = builder.evaluate(split, greater).unwrap();
        let filtered = builder.filter(context, evaluated).unwrap();
        let plan = builder.set_output(filtered).unwrap();

        let doc = json!({"items": [{"price": 5}, {"price": 12}, {"name": "x"}, {"price": 30.5}]});
        let result = Runtime::default().run(&plan, &doc).unwrap();
        assert_eq!(data(&result), vec![json!({"price": 12}), json!({"price": 30.5})]);
        assert_eq!(result.index_map().as_slice(), &[0, 0]);
    }

    #[test]
    fn test_not_uses_filter_candidates_as_universe() {
        // $[?(!@.flag)]
        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let context = builder.create_filter_context(input).unwrap();
        let split = builder.split(context).unwrap();
        let flag = child(&mut builder, split, "flag");
        let not = builder.evaluate_logical_not(flag, split).unwrap();
        let evaluated = builder.evaluate(split, not).unwrap();
        let filtered = builder.filter(context, evaluated).unwrap();
        let plan = builder.set_output(filtered).unwrap();

        let doc = json!([{"flag": 1}, {}, {"other": 2}]);
        let result = Runtime::default().run(&plan, &doc).unwrap();
        assert_eq!(data(&result), vec![json!({}), json!({"other": 2})]);
    }

    #[test]
    fn test_shared_nodes_are_evaluated_once() {
        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let any = builder.match_any_child().unwrap();
        let children = builder.fetch_children(input, any).unwrap();
        let both = builder.evaluate_logical_or(children, children).unwrap();
        let plan = builder.set_output(both).unwrap();
        let doc = json!([1, 2]);
        let result = Runtime::default().run(&plan, &doc).unwrap();
        assert_eq!(result.index_map().as_slice(), &[0]);
    }

    #[test]
    fn test_regexp_node() {
        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let context = builder.create_filter_context(input).unwrap();
        let split = builder.split(context).unwrap();
        let matched = builder.calculate_is_reg_exp("/^b/i", split).unwrap();
        let evaluated = builder.evaluate(split, matched).unwrap();
        let filtered = builder.filter(context, evaluated).unwrap();
        let plan = builder.set_output(filtered).unwrap();
        let doc = json!(["apple", "Banana", 3, "berry"]);
        let result = Runtime::default().run(&plan, &doc).unwrap();
        assert_eq!(data(&result), vec![json!("Banana"), json!("berry")]);

        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let broken = builder.calculate_is_reg_exp("/(/", input).unwrap();
        let plan = builder.set_output(broken).unwrap();
        assert!(matches!(
            Runtime::default().run(&plan, &doc),
            Err(EngineError::InvalidRegExp { .. })
        ));
    }

    #[test]
    fn test_aggregate_node_and_unknown_name() {
        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let max = builder.aggregate("max", input).unwrap();
        let plan = builder.set_output(max).unwrap();
        let doc = json!([1, 9, 4]);
        let result = Runtime::default().run(&plan, &doc).unwrap();
        assert_eq!(data(&result), vec![json!(9)]);

        let runtime = Runtime::new(
            Comparators::default(),
            AggregatorCollection::empty().with("min", Aggregator::Min),
        );
        assert_eq!(
            runtime.run(&plan, &doc),
            Err(EngineError::UnknownAggregator("max".into()))
        );
    }

    #[test]
    fn test_literal_array_and_index_slice() {
        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let slice = builder.populate_index_slice(Some(-2), None, None).unwrap();
        let matcher = builder.match_element_strictly(slice).unwrap();
        let tail = builder.fetch_children(input, matcher).unwrap();
        let plan = builder.set_output(tail).unwrap();
        let doc = json!([1, 2, 3]);
        assert_eq!(data(&Runtime::default().run(&plan, &doc).unwrap()), vec![json!(2), json!(3)]);

        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let array = builder.create_array().unwrap();
        let one = builder.create_scalar(json!(1)).unwrap();
        let array = builder.append_to_array(array, one).unwrap();
        let populated = builder.populate_literal_array(input, array).unwrap();
        let plan = builder.set_output(populated).unwrap();
        assert_eq!(data(&Runtime::default().run(&plan, &doc).unwrap()), vec![json!([1])]);
    }

    #[test]
    fn test_kind_mismatch_is_invalid_plan() {
        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let bogus = builder.fetch_children(input, input).unwrap();
        let plan = builder.set_output(bogus).unwrap();
        let doc = json!({});
        assert!(matches!(
            Runtime::default().run(&plan, &doc),
            Err(EngineError::InvalidPlan(_))
        ));

        let mut builder = PlanBuilder::new();
        let any = builder.match_any_child().unwrap();
        let plan = builder.set_output(any).unwrap();
        assert!(matches!(
            Runtime::default().run(&plan, &doc),
            Err(EngineError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_scalar_literal_required() {
        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let array = builder.create_array().unwrap();
        let populated = builder.populate_literal(input, array).unwrap();
        let plan = builder.set_output(populated).unwrap();
        let doc = json!(null);
        assert_eq!(
            Runtime::default().run(&plan, &doc),
            Err(EngineError::NonScalarData("[]".into()))
        );
    }
}
