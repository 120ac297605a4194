//! Query plans: a DAG of operations assembled through [`PlanBuilder`].

use std::fmt;

use serde_json::Value as Json;
use thiserror::Error;

/// Handle to a node inside a plan under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlanError {
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),
    #[error("Slice step must not be zero")]
    ZeroSliceStep,
    #[error("Node {0} is not a literal")]
    NotALiteral(NodeId),
}

/// One operation. Child ids always refer to nodes created earlier.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    GetInput,
    SetOutput(NodeId),
    CreateFilterContext(NodeId),
    Split(NodeId),
    Evaluate { source: NodeId, result: NodeId },
    Filter { context: NodeId, evaluated: NodeId },
    EvaluateLogicalOr(NodeId, NodeId),
    EvaluateLogicalAnd(NodeId, NodeId),
    EvaluateLogicalNot { operand: NodeId, context: NodeId },
    CalculateIsEqual(NodeId, NodeId),
    CalculateIsGreater(NodeId, NodeId),
    CalculateIsRegExp { source: NodeId, pattern: String },
    FetchChildren { source: NodeId, matcher: NodeId },
    FetchChildrenDeep { source: NodeId, matcher: NodeId },
    MatchAnyChild,
    MatchPropertyStrictly(NodeId),
    MatchElementStrictly(NodeId),
    Aggregate { source: NodeId, name: String },
    PopulateLiteral { template: NodeId, literal: NodeId },
    PopulateLiteralArray { template: NodeId, array: NodeId },
    PopulateIndexList(Vec<isize>),
    PopulateIndexSlice {
        start: Option<isize>,
        end: Option<isize>,
        step: Option<isize>,
    },
    PopulateNameList(Vec<String>),
    CreateScalar(Json),
    CreateArray(Json),
    /// `literal` holds the array node's items followed by the appended value.
    AppendToArray {
        array: NodeId,
        value: NodeId,
        literal: Json,
    },
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::GetInput => NodeKind::GetInput,
            Node::SetOutput(_) => NodeKind::SetOutput,
            Node::CreateFilterContext(_) => NodeKind::CreateFilterContext,
            Node::Split(_) => NodeKind::Split,
            Node::Evaluate { .. } => NodeKind::Evaluate,
            Node::Filter { .. } => NodeKind::Filter,
            Node::EvaluateLogicalOr(..) => NodeKind::EvaluateLogicalOr,
            Node::EvaluateLogicalAnd(..) => NodeKind::EvaluateLogicalAnd,
            Node::EvaluateLogicalNot { .. } => NodeKind::EvaluateLogicalNot,
            Node::CalculateIsEqual(..) => NodeKind::CalculateIsEqual,
            Node::CalculateIsGreater(..) => NodeKind::CalculateIsGreater,
            Node::CalculateIsRegExp { .. } => NodeKind::CalculateIsRegExp,
            Node::FetchChildren { .. } => NodeKind::FetchChildren,
            Node::FetchChildrenDeep { .. } => NodeKind::FetchChildrenDeep,
            Node::MatchAnyChild => NodeKind::MatchAnyChild,
            Node::MatchPropertyStrictly(_) => NodeKind::MatchPropertyStrictly,
            Node::MatchElementStrictly(_) => NodeKind::MatchElementStrictly,
            Node::Aggregate { .. } => NodeKind::Aggregate,
            Node::PopulateLiteral { .. } => NodeKind::PopulateLiteral,
            Node::PopulateLiteralArray { .. } => NodeKind::PopulateLiteralArray,
            Node::PopulateIndexList(_) => NodeKind::PopulateIndexList,
            Node::PopulateIndexSlice { .. } => NodeKind::PopulateIndexSlice,
            Node::PopulateNameList(_) => NodeKind::PopulateNameList,
            Node::CreateScalar(_) => NodeKind::CreateScalar,
            Node::CreateArray(_) => NodeKind::CreateArray,
            Node::AppendToArray { .. } => NodeKind::AppendToArray,
        }
    }

    /// Child references in evaluation order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Node::SetOutput(a)
            | Node::CreateFilterContext(a)
            | Node::Split(a)
            | Node::MatchPropertyStrictly(a)
            | Node::MatchElementStrictly(a)
            | Node::CalculateIsRegExp { source: a, .. }
            | Node::Aggregate { source: a, .. } => vec![*a],
            Node::Evaluate {
                source: a,
                result: b,
            }
            | Node::Filter {
                context: a,
                evaluated: b,
            }
            | Node::EvaluateLogicalOr(a, b)
            | Node::EvaluateLogicalAnd(a, b)
            | Node::EvaluateLogicalNot {
                operand: a,
                context: b,
            }
            | Node::CalculateIsEqual(a, b)
            | Node::CalculateIsGreater(a, b)
            | Node::FetchChildren {
                source: a,
                matcher: b,
            }
            | Node::FetchChildrenDeep {
                source: a,
                matcher: b,
            }
            | Node::PopulateLiteral {
                template: a,
                literal: b,
            }
            | Node::PopulateLiteralArray {
                template: a,
                array: b,
            } => vec![*a, *b],
            Node::GetInput
            | Node::MatchAnyChild
            | Node::PopulateIndexList(_)
            | Node::PopulateIndexSlice { .. }
            | Node::PopulateNameList(_)
            | Node::CreateScalar(_)
            | Node::CreateArray(_)
            // The appended value is already folded into `literal`.
            | Node::AppendToArray { .. } => Vec::new(),
        }
    }

    /// Literal JSON held by literal-building nodes.
    pub fn literal(&self) -> Option<&Json> {
        match self {
            Node::CreateScalar(literal)
            | Node::CreateArray(literal)
            | Node::AppendToArray { literal, .. } => Some(literal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    GetInput,
    SetOutput,
    CreateFilterContext,
    Split,
    Evaluate,
    Filter,
    EvaluateLogicalOr,
    EvaluateLogicalAnd,
    EvaluateLogicalNot,
    CalculateIsEqual,
    CalculateIsGreater,
    CalculateIsRegExp,
    FetchChildren,
    FetchChildrenDeep,
    MatchAnyChild,
    MatchPropertyStrictly,
    MatchElementStrictly,
    Aggregate,
    PopulateLiteral,
    PopulateLiteralArray,
    PopulateIndexList,
    PopulateIndexSlice,
    PopulateNameList,
    CreateScalar,
    CreateArray,
    AppendToArray,
}

/// Static properties of a plan's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// At most one result per input.
    pub is_definite: bool,
    /// Every result is a document node with a meaningful path.
    pub is_path: bool,
}

/// A finished, immutable plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    nodes: Vec<Node>,
    output: NodeId,
    capabilities: Capabilities,
}

impl Plan {
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The node whose result is returned, i.e. the `SetOutput` source.
    pub fn output(&self) -> NodeId {
        self.output
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

/// Assembles plan nodes one operation at a time.
///
/// Every method validates its child references and returns the new node's
/// id; [`PlanBuilder::set_output`] finishes the plan.
#[derive(Debug, Default)]
pub struct PlanBuilder {
    nodes: Vec<Node>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, id: NodeId) -> Result<NodeId, PlanError> {
        if id.0 < self.nodes.len() {
            Ok(id)
        } else {
            Err(PlanError::UnknownNode(id))
        }
    }

    fn push(&mut self, node: Node) -> Result<NodeId, PlanError> {
        for child in node.children() {
            self.check(child)?;
        }
        self.nodes.push(node);
        Ok(NodeId(self.nodes.len() - 1))
    }

    fn literal_of(&self, id: NodeId) -> Result<&Json, PlanError> {
        self.nodes
            .get(self.check(id)?.0)
            .and_then(Node::literal)
            .ok_or(PlanError::NotALiteral(id))
    }

    pub fn get_input(&mut self) -> Result<NodeId, PlanError> {
        self.push(Node::GetInput)
    }

    pub fn create_filter_context(&mut self, source: NodeId) -> Result<NodeId, PlanError> {
        self.push(Node::CreateFilterContext(source))
    }

    pub fn split(&mut self, source: NodeId) -> Result<NodeId, PlanError> {
        self.push(Node::Split(source))
    }

    pub fn evaluate(&mut self, source: NodeId, result: NodeId) -> Result<NodeId, PlanError> {
        self.push(Node::Evaluate { source, result })
    }

    pub fn filter(&mut self, context: NodeId, evaluated: NodeId) -> Result<NodeId, PlanError> {
        self.push(Node::Filter { context, evaluated })
    }

    pub fn evaluate_logical_or(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, PlanError> {
        self.push(Node::EvaluateLogicalOr(left, right))
    }

    pub fn evaluate_logical_and(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, PlanError> {
        self.push(Node::EvaluateLogicalAnd(left, right))
    }

    /// Negates `operand` within the candidates of `context`.
    pub fn evaluate_logical_not(&mut self, operand: NodeId, context: NodeId) -> Result<NodeId, PlanError> {
        self.push(Node::EvaluateLogicalNot { operand, context })
    }

    pub fn calculate_is_equal(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, PlanError> {
        self.push(Node::CalculateIsEqual(left, right))
    }

    pub fn calculate_is_greater(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, PlanError> {
        self.push(Node::CalculateIsGreater(left, right))
    }

    pub fn calculate_is_reg_exp(
        &mut self,
        pattern: impl Into<String>,
        source: NodeId,
    ) -> Result<NodeId, PlanError> {
        self.push(Node::CalculateIsRegExp {
            source,
            pattern: pattern.into(),
        })
    }

    pub fn fetch_children(&mut self, source: NodeId, matcher: NodeId) -> Result<NodeId, PlanError> {
        self.push(Node::FetchChildren { source, matcher })
    }

    pub fn fetch_children_deep(&mut self, source: NodeId, matcher: NodeId) -> Result<NodeId, PlanError> {
        self.push(Node::FetchChildrenDeep { source, matcher })
    }

    pub fn match_any_child(&mut self) -> Result<NodeId, PlanError> {
        self.push(Node::MatchAnyChild)
    }

    pub fn match_property_strictly(&mut self, names: NodeId) -> Result<NodeId, PlanError> {
        self.push(Node::MatchPropertyStrictly(names))
    }

    pub fn match_element_strictly(&mut self, indexes: NodeId) -> Result<NodeId, PlanError> {
        self.push(Node::MatchElementStrictly(indexes))
    }

    pub fn aggregate(&mut self, name: impl Into<String>, source: NodeId) -> Result<NodeId, PlanError> {
        self.push(Node::Aggregate {
            source,
            name: name.into(),
        })
    }

    pub fn populate_literal(&mut self, template: NodeId, literal: NodeId) -> Result<NodeId, PlanError> {
        self.literal_of(literal)?;
        self.push(Node::PopulateLiteral { template, literal })
    }

    pub fn populate_literal_array(&mut self, template: NodeId, array: NodeId) -> Result<NodeId, PlanError> {
        self.literal_of(array)?;
        self.push(Node::PopulateLiteralArray { template, array })
    }

    pub fn populate_index_list(&mut self, indexes: Vec<isize>) -> Result<NodeId, PlanError> {
        self.push(Node::PopulateIndexList(indexes))
    }

    pub fn populate_index_slice(
        &mut self,
        start: Option<isize>,
        end: Option<isize>,
        step: Option<isize>,
    ) -> Result<NodeId, PlanError> {
        if step == Some(0) {
            return Err(PlanError::ZeroSliceStep);
        }
        self.push(Node::PopulateIndexSlice { start, end, step })
    }

    pub fn populate_name_list(&mut self, names: Vec<String>) -> Result<NodeId, PlanError> {
        self.push(Node::PopulateNameList(names))
    }

    pub fn create_scalar(&mut self, value: Json) -> Result<NodeId, PlanError> {
        self.push(Node::CreateScalar(value))
    }

    pub fn create_array(&mut self) -> Result<NodeId, PlanError> {
        self.push(Node::CreateArray(Json::Array(Vec::new())))
    }

    /// Returns a new array node holding `array`'s items plus `value`.
    pub fn append_to_array(&mut self, array: NodeId, value: NodeId) -> Result<NodeId, PlanError> {
        let mut items = match self.literal_of(array)? {
            Json::Array(items) => items.clone(),
            _ => return Err(PlanError::NotALiteral(array)),
        };
        items.push(self.literal_of(value)?.clone());
        self.push(Node::AppendToArray {
            array,
            value,
            literal: Json::Array(items),
        })
    }

    /// Marks `source` as the plan result and computes the capabilities.
    ///
    /// Consumes the builder, so a plan has exactly one output.
    pub fn set_output(mut self, source: NodeId) -> Result<Plan, PlanError> {
        self.check(source)?;
        let capabilities = self.capabilities_of(source);
        self.push(Node::SetOutput(source))?;
        Ok(Plan {
            nodes: self.nodes,
            output: source,
            capabilities,
        })
    }

    fn capabilities_of(&self, output: NodeId) -> Capabilities {
        // Children precede parents, so a single forward pass suffices.
        let mut caps: Vec<Capabilities> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let of = |id: NodeId| caps[id.0];
            let value = |is_definite| Capabilities {
                is_definite,
                is_path: false,
            };
            let current = match node {
                Node::GetInput => Capabilities {
                    is_definite: true,
                    is_path: true,
                },
                Node::Split(source) => of(*source),
                Node::CreateFilterContext(source) => Capabilities {
                    is_definite: false,
                    is_path: of(*source).is_path,
                },
                Node::Filter { context, .. } => Capabilities {
                    is_definite: false,
                    is_path: of(*context).is_path,
                },
                Node::FetchChildren { source, matcher } => Capabilities {
                    is_definite: of(*source).is_definite && self.is_single_matcher(*matcher),
                    is_path: of(*source).is_path,
                },
                Node::FetchChildrenDeep { source, .. } => Capabilities {
                    is_definite: false,
                    is_path: of(*source).is_path,
                },
                Node::Aggregate { source, .. }
                | Node::CalculateIsRegExp { source, .. }
                | Node::Evaluate { source, .. } => value(of(*source).is_definite),
                Node::PopulateLiteral { template, .. }
                | Node::PopulateLiteralArray { template, .. } => value(of(*template).is_definite),
                Node::EvaluateLogicalOr(left, right)
                | Node::EvaluateLogicalAnd(left, right)
                | Node::CalculateIsEqual(left, right)
                | Node::CalculateIsGreater(left, right) => {
                    value(of(*left).is_definite && of(*right).is_definite)
                }
                Node::EvaluateLogicalNot { context, .. } => value(of(*context).is_definite),
                Node::SetOutput(source) => of(*source),
                Node::MatchAnyChild
                | Node::MatchPropertyStrictly(_)
                | Node::MatchElementStrictly(_)
                | Node::PopulateIndexList(_)
                | Node::PopulateIndexSlice { .. }
                | Node::PopulateNameList(_)
                | Node::CreateScalar(_)
                | Node::CreateArray(_)
                | Node::AppendToArray { .. } => value(true),
            };
            caps.push(current);
        }
        caps[output.0]
    }

    fn is_single_matcher(&self, matcher: NodeId) -> bool {
        let list = match self.nodes.get(matcher.0) {
            Some(Node::MatchPropertyStrictly(list) | Node::MatchElementStrictly(list)) => *list,
            _ => return false,
        };
        match self.nodes.get(list.0) {
            Some(Node::PopulateNameList(names)) => names.len() == 1,
            Some(Node::PopulateIndexList(indexes)) => indexes.len() == 1,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn property_chain(builder: &mut PlanBuilder, names: &[&str]) -> NodeId {
        let mut current = builder.get_input().unwrap();
        for name in names {
            let list = builder.populate_name_list(vec![name.to_string()]).unwrap();
            let matcher = builder.match_property_strictly(list).unwrap();
            current = builder.fetch_children(current, matcher).unwrap();
        }
        current
    }

    #[test]
    fn test_single_property_is_definite_path() {
        let mut builder = PlanBuilder::new();
        let output = property_chain(&mut builder, &["a"]);
        let plan = builder.set_output(output).unwrap();
        assert_eq!(
            plan.capabilities(),
            Capabilities {
                is_definite: true,
                is_path: true
            }
        );
        assert_eq!(plan.output(), output);
        assert_eq!(plan.nodes().last().map(Node::kind), Some(NodeKind::SetOutput));
    }

    #[test]
    fn test_wildcard_is_indefinite() {
        let mut builder = PlanBuilder::new();
        let source = property_chain(&mut builder, &["a"]);
        let any = builder.match_any_child().unwrap();
        let output = builder.fetch_children(source, any).unwrap();
        let caps = builder.set_output(output).unwrap().capabilities();
        assert!(!caps.is_definite);
        assert!(caps.is_path);
    }

    #[test]
    fn test_multi_index_and_slice_are_indefinite() {
        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let indexes = builder.populate_index_list(vec![0, 1]).unwrap();
        let matcher = builder.match_element_strictly(indexes).unwrap();
        let output = builder.fetch_children(input, matcher).unwrap();
        assert!(!builder.set_output(output).unwrap().capabilities().is_definite);

        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let slice = builder.populate_index_slice(Some(0), Some(1), None).unwrap();
        let matcher = builder.match_element_strictly(slice).unwrap();
        let output = builder.fetch_children(input, matcher).unwrap();
        assert!(!builder.set_output(output).unwrap().capabilities().is_definite);
    }

    #[test]
    fn test_aggregate_is_not_path() {
        let mut builder = PlanBuilder::new();
        let source = property_chain(&mut builder, &["a"]);
        let output = builder.aggregate("min", source).unwrap();
        let caps = builder.set_output(output).unwrap().capabilities();
        assert!(caps.is_definite);
        assert!(!caps.is_path);
    }

    #[test]
    fn test_literal_output_is_not_path() {
        let mut builder = PlanBuilder::new();
        let input = builder.get_input().unwrap();
        let scalar = builder.create_scalar(json!(1)).unwrap();
        let output = builder.populate_literal(input, scalar).unwrap();
        assert!(!builder.set_output(output).unwrap().capabilities().is_path);
    }

    #[test]
    fn test_rejects_unknown_nodes_and_zero_step() {
        let mut builder = PlanBuilder::new();
        assert_eq!(
            builder.split(NodeId(3)),
            Err(PlanError::UnknownNode(NodeId(3)))
        );
        assert_eq!(
            builder.populate_index_slice(None, None, Some(0)),
            Err(PlanError::ZeroSliceStep)
        );
        assert_eq!(builder.set_output(NodeId(0)), Err(PlanError::UnknownNode(NodeId(0))));
    }

    #[test]
    fn test_append_to_array_accumulates_literals() {
        let mut builder = PlanBuilder::new();
        let array = builder.create_array().unwrap();
        let one = builder.create_scalar(json!(1)).unwrap();
        let two = builder.create_scalar(json!("two")).unwrap();
        let first = builder.append_to_array(array, one).unwrap();
        let second = builder.append_to_array(first, two).unwrap();
        let input = builder.get_input().unwrap();
        assert_eq!(
            builder.append_to_array(input, one),
            Err(PlanError::NotALiteral(input))
        );
        let output = builder.populate_literal_array(input, second).unwrap();
        let plan = builder.set_output(output).unwrap();
        assert_eq!(
            plan.node(second).and_then(Node::literal),
            Some(&json!([1, "two"]))
        );
        assert_eq!(plan.node(array).and_then(Node::literal), Some(&json!([])));
    }
}
