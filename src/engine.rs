//! The difference engine walks two trees in lockstep and reports every
//! comparison it makes to its listeners.

use std::sync::Arc;

use ahash::{HashMap, HashSet};
use log::{debug, trace};

use crate::comparison::{
    Comparison, ComparisonResult, ComparisonType, ComparisonValue, Detail, Difference,
};
use crate::controller::{self, ComparisonController};
use crate::error::Error;
use crate::evaluator::{self, DifferenceEvaluator};
use crate::matcher::{DefaultNodeMatcher, NodeMatcher};
use crate::name::{QName, XMLNS_NAMESPACE, XML_SCHEMA_INSTANCE_NAMESPACE};
use crate::state::ComparisonState;
use crate::xmldata::{Node, XmlData};
use crate::xmlvalue::{NodeType, Value};
use crate::xpath_context::{NodeInfo, XPathContext};

/// Decides whether a node takes part in the comparison at all.
pub type NodeFilter = Arc<dyn Fn(&XmlData, Node) -> bool + Send + Sync>;

/// Decides whether an attribute takes part in the comparison at all.
pub type AttributeFilter = Arc<dyn Fn(&XmlData, Node) -> bool + Send + Sync>;

/// Receives every comparison together with its evaluated outcome.
pub type ComparisonListener = Box<dyn FnMut(&Comparison, ComparisonResult)>;

/// Excludes document type declarations and XML declarations; they're
/// compared as part of their document instead.
pub fn default_node_filter() -> NodeFilter {
    Arc::new(|data: &XmlData, node: Node| {
        !matches!(
            data.node_type(node),
            NodeType::DocumentType | NodeType::Declaration
        )
    })
}

/// Accepts every attribute.
pub fn default_attribute_filter() -> AttributeFilter {
    Arc::new(|_: &XmlData, _: Node| true)
}

struct PathContexts {
    control: XPathContext,
    test: XPathContext,
}

struct Children {
    all: Vec<Node>,
    filtered: Vec<Node>,
}

#[derive(Default)]
struct SplitAttributes {
    schema_location: Option<Node>,
    no_namespace_schema_location: Option<Node>,
    xsi_type: Option<Node>,
    remaining: Vec<Node>,
}

fn detail(node: Node, context: &XPathContext, value: impl Into<ComparisonValue>) -> Detail {
    Detail::new(
        Some(node),
        Some(context.xpath()),
        value,
        Some(context.parent_xpath()),
    )
}

fn positions(nodes: &[Node]) -> HashMap<Node, usize> {
    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (*node, index))
        .collect()
}

fn position(positions: &HashMap<Node, usize>, node: Node) -> Result<usize, Error> {
    positions.get(&node).copied().ok_or_else(|| {
        Error::Navigation(format!(
            "node {:?} is not among the children being compared",
            node
        ))
    })
}

fn attribute_value(data: &XmlData, attribute: Option<Node>) -> Option<&str> {
    attribute.and_then(|a| data.attribute(a)).map(|a| a.value())
}

fn specified(data: &XmlData, attribute: Node) -> bool {
    data.attribute(attribute)
        .map(|a| a.specified())
        .unwrap_or(true)
}

// `prefix:local` resolved against the namespaces in scope at the attribute
fn value_as_qname(data: &XmlData, attribute: Node) -> QName {
    let value = attribute_value(data, Some(attribute)).unwrap_or("");
    let (prefix, local) = match value.split_once(':') {
        Some((prefix, local)) => (Some(prefix).filter(|p| !p.is_empty()), local),
        None => (None, value),
    };
    let namespace = data
        .lookup_namespace_uri(attribute, prefix)
        .unwrap_or_default();
    QName::new(namespace, local)
}

fn declaration_values(data: &XmlData, document: Node) -> (String, String, String) {
    match data.declaration(document).map(|d| data.value(d)) {
        Some(Value::Declaration(declaration)) => (
            declaration.version().to_string(),
            match declaration.standalone() {
                Some(true) => "yes".to_string(),
                Some(false) => "no".to_string(),
                None => String::new(),
            },
            declaration.encoding().unwrap_or("").to_string(),
        ),
        _ => ("1.0".to_string(), String::new(), String::new()),
    }
}

/// Compares two trees node by node.
///
/// Configure it with the setters, register listeners, then call
/// [`DomDifferenceEngine::compare`]. Everything the engine finds is
/// reported to the listeners as it goes; the engine keeps no results.
pub struct DomDifferenceEngine {
    node_matcher: Arc<dyn NodeMatcher>,
    difference_evaluator: DifferenceEvaluator,
    comparison_controller: ComparisonController,
    namespace_context: HashMap<String, String>,
    attribute_filter: AttributeFilter,
    node_filter: NodeFilter,
    comparison_listeners: Vec<ComparisonListener>,
    match_listeners: Vec<ComparisonListener>,
    difference_listeners: Vec<ComparisonListener>,
}

impl Default for DomDifferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DomDifferenceEngine {
    /// An engine with the default policies: document order matching, the
    /// default evaluator, a controller that never stops, no namespace
    /// prefixes, all attributes and the default node filter.
    pub fn new() -> Self {
        DomDifferenceEngine {
            node_matcher: Arc::new(DefaultNodeMatcher::default()),
            difference_evaluator: evaluator::default(),
            comparison_controller: controller::never_stop(),
            namespace_context: HashMap::default(),
            attribute_filter: default_attribute_filter(),
            node_filter: default_node_filter(),
            comparison_listeners: Vec::new(),
            match_listeners: Vec::new(),
            difference_listeners: Vec::new(),
        }
    }

    /// How children are paired.
    pub fn set_node_matcher(&mut self, node_matcher: Arc<dyn NodeMatcher>) {
        self.node_matcher = node_matcher;
    }

    /// How outcomes are graded.
    pub fn set_difference_evaluator(&mut self, difference_evaluator: DifferenceEvaluator) {
        self.difference_evaluator = difference_evaluator;
    }

    /// When to stop.
    pub fn set_comparison_controller(&mut self, comparison_controller: ComparisonController) {
        self.comparison_controller = comparison_controller;
    }

    /// Prefixes used when rendering XPaths, mapped to their namespace URIs.
    pub fn set_namespace_context(&mut self, prefix_to_uri: HashMap<String, String>) {
        self.namespace_context = prefix_to_uri;
    }

    /// Which attributes to compare.
    pub fn set_attribute_filter(&mut self, attribute_filter: AttributeFilter) {
        self.attribute_filter = attribute_filter;
    }

    /// Which nodes to compare.
    pub fn set_node_filter(&mut self, node_filter: NodeFilter) {
        self.node_filter = node_filter;
    }

    /// Called for every comparison.
    pub fn add_comparison_listener(
        &mut self,
        listener: impl FnMut(&Comparison, ComparisonResult) + 'static,
    ) {
        self.comparison_listeners.push(Box::new(listener));
    }

    /// Called for comparisons that came out `Equal`.
    pub fn add_match_listener(&mut self, listener: impl FnMut(&Comparison, ComparisonResult) + 'static) {
        self.match_listeners.push(Box::new(listener));
    }

    /// Called for comparisons that didn't come out `Equal`.
    pub fn add_difference_listener(
        &mut self,
        listener: impl FnMut(&Comparison, ComparisonResult) + 'static,
    ) {
        self.difference_listeners.push(Box::new(listener));
    }

    /// Compare the tree at `control` with the tree at `test`.
    ///
    /// Both nodes may be documents or any node within a document. Any
    /// failure during the walk abandons the run and is returned wrapped in
    /// [`Error::Comparison`]; listeners will have seen the comparisons
    /// made up to that point.
    pub fn compare(&mut self, data: &XmlData, control: Node, test: Node) -> Result<(), Error> {
        debug!("comparing {:?} with {:?}", control, test);
        let mut contexts = PathContexts {
            control: XPathContext::for_node(&self.namespace_context, data, control),
            test: XPathContext::for_node(&self.namespace_context, data, test),
        };
        match self.compare_nodes(data, control, test, &mut contexts) {
            Ok(state) => {
                debug!(
                    "comparison {} with {}",
                    if state.is_finished() { "stopped" } else { "completed" },
                    state.result()
                );
                Ok(())
            }
            Err(error) => {
                debug!("comparison failed: {}", error);
                Err(Error::Comparison {
                    source: Box::new(error),
                })
            }
        }
    }

    fn compare_one(&mut self, comparison: Comparison) -> ComparisonState {
        let outcome = (self.difference_evaluator)(&comparison, comparison.raw_result());
        trace!(
            "{:?} at {}: '{}' vs '{}' -> {}",
            comparison.comparison_type(),
            comparison.control().xpath().unwrap_or("-"),
            comparison.control().value(),
            comparison.test().value(),
            outcome
        );
        for listener in &mut self.comparison_listeners {
            listener(&comparison, outcome);
        }
        if outcome == ComparisonResult::Equal {
            for listener in &mut self.match_listeners {
                listener(&comparison, outcome);
            }
            return ComparisonState::Ongoing(outcome);
        }
        for listener in &mut self.difference_listeners {
            listener(&comparison, outcome);
        }
        let difference = Difference::new(comparison, outcome);
        if (self.comparison_controller)(&difference) {
            debug!(
                "controller stopped at {:?} ({})",
                difference.comparison().comparison_type(),
                outcome
            );
            ComparisonState::Finished(outcome)
        } else {
            ComparisonState::Ongoing(outcome)
        }
    }

    fn children(&self, data: &XmlData, node: Node) -> Children {
        let all = data.children(node).collect::<Vec<_>>();
        let filtered = all
            .iter()
            .copied()
            .filter(|child| (self.node_filter)(data, *child))
            .collect();
        Children { all, filtered }
    }

    fn compare_nodes(
        &mut self,
        data: &XmlData,
        control: Node,
        test: Node,
        contexts: &mut PathContexts,
    ) -> Result<ComparisonState, Error> {
        let control_children = self.children(data, control);
        let test_children = self.children(data, test);
        let control_type = data.node_type(control);
        let not_attribute = control_type != NodeType::Attribute;

        let state = self
            .compare_one(Comparison::new(
                ComparisonType::NodeType,
                detail(control, &contexts.control, control_type),
                detail(test, &contexts.test, data.node_type(test)),
            ))
            .and_compare(|| {
                self.compare_one(Comparison::new(
                    ComparisonType::NamespaceUri,
                    detail(control, &contexts.control, data.namespace_uri(control)),
                    detail(test, &contexts.test, data.namespace_uri(test)),
                ))
            })
            .and_compare(|| {
                self.compare_one(Comparison::new(
                    ComparisonType::NamespacePrefix,
                    detail(control, &contexts.control, data.prefix(control)),
                    detail(test, &contexts.test, data.prefix(test)),
                ))
            })
            .and_if_true_compare(not_attribute, || {
                self.compare_one(Comparison::new(
                    ComparisonType::ChildNodelistLength,
                    detail(control, &contexts.control, control_children.filtered.len()),
                    detail(test, &contexts.test, test_children.filtered.len()),
                ))
            })
            .and_then(|| self.compare_node_type_specific(data, control, test, contexts))?;

        state.and_if_true_then(not_attribute, || {
            contexts
                .control
                .set_children(control_children.all.iter().map(|n| NodeInfo::from_node(data, *n)));
            contexts
                .test
                .set_children(test_children.all.iter().map(|n| NodeInfo::from_node(data, *n)));
            self.compare_node_lists(data, &control_children, &test_children, contexts)
        })
    }

    fn compare_node_type_specific(
        &mut self,
        data: &XmlData,
        control: Node,
        test: Node,
        contexts: &mut PathContexts,
    ) -> Result<ComparisonState, Error> {
        let control_value = data.value(control);
        let test_value = data.value(test);
        if let (Some(control_text), Some(test_text)) =
            (control_value.character_data(), test_value.character_data())
        {
            return Ok(self.compare_one(Comparison::new(
                ComparisonType::TextValue,
                detail(control, &contexts.control, control_text),
                detail(test, &contexts.test, test_text),
            )));
        }
        match (control_value, test_value) {
            (Value::Document, Value::Document) => {
                self.compare_documents(data, control, test, contexts)
            }
            (Value::DocumentType(control_doctype), Value::DocumentType(test_doctype)) => {
                Ok(self
                    .compare_one(Comparison::new(
                        ComparisonType::DoctypeName,
                        detail(control, &contexts.control, control_doctype.name()),
                        detail(test, &contexts.test, test_doctype.name()),
                    ))
                    .and_compare(|| {
                        self.compare_one(Comparison::new(
                            ComparisonType::DoctypePublicId,
                            detail(control, &contexts.control, control_doctype.public_id()),
                            detail(test, &contexts.test, test_doctype.public_id()),
                        ))
                    })
                    .and_compare(|| {
                        self.compare_one(Comparison::new(
                            ComparisonType::DoctypeSystemId,
                            detail(control, &contexts.control, control_doctype.system_id()),
                            detail(test, &contexts.test, test_doctype.system_id()),
                        ))
                    }))
            }
            (Value::Element(control_element), Value::Element(test_element)) => self
                .compare_one(Comparison::new(
                    ComparisonType::ElementTagName,
                    detail(
                        control,
                        &contexts.control,
                        control_element.name().local_name(),
                    ),
                    detail(test, &contexts.test, test_element.name().local_name()),
                ))
                .and_then(|| self.compare_element_attributes(data, control, test, contexts)),
            (Value::ProcessingInstruction(control_pi), Value::ProcessingInstruction(test_pi)) => {
                Ok(self
                    .compare_one(Comparison::new(
                        ComparisonType::ProcessingInstructionTarget,
                        detail(control, &contexts.control, control_pi.target()),
                        detail(test, &contexts.test, test_pi.target()),
                    ))
                    .and_compare(|| {
                        self.compare_one(Comparison::new(
                            ComparisonType::ProcessingInstructionData,
                            detail(control, &contexts.control, control_pi.data()),
                            detail(test, &contexts.test, test_pi.data()),
                        ))
                    }))
            }
            (Value::Attribute(control_attribute), Value::Attribute(test_attribute)) => Ok(self
                .compare_one(Comparison::new(
                    ComparisonType::AttrValueExplicitlySpecified,
                    detail(control, &contexts.control, control_attribute.specified()),
                    detail(test, &contexts.test, test_attribute.specified()),
                ))
                .and_compare(|| {
                    self.compare_one(Comparison::new(
                        ComparisonType::AttrValue,
                        detail(control, &contexts.control, control_attribute.value()),
                        detail(test, &contexts.test, test_attribute.value()),
                    ))
                })),
            _ => Ok(ComparisonState::default()),
        }
    }

    fn compare_documents(
        &mut self,
        data: &XmlData,
        control: Node,
        test: Node,
        contexts: &mut PathContexts,
    ) -> Result<ComparisonState, Error> {
        let control_doctype = data
            .doctype(control)
            .filter(|n| (self.node_filter)(data, *n));
        let test_doctype = data.doctype(test).filter(|n| (self.node_filter)(data, *n));
        let state = self.compare_one(Comparison::new(
            ComparisonType::HasDoctypeDeclaration,
            detail(control, &contexts.control, control_doctype.is_some()),
            detail(test, &contexts.test, test_doctype.is_some()),
        ));
        let state = match (control_doctype, test_doctype) {
            (Some(control_doctype), Some(test_doctype)) => state
                .and_then(|| self.compare_nodes(data, control_doctype, test_doctype, contexts))?,
            _ => state,
        };

        let (control_version, control_standalone, control_encoding) =
            declaration_values(data, control);
        let (test_version, test_standalone, test_encoding) = declaration_values(data, test);
        Ok(state
            .and_compare(|| {
                self.compare_one(Comparison::new(
                    ComparisonType::XmlVersion,
                    detail(control, &contexts.control, control_version),
                    detail(test, &contexts.test, test_version),
                ))
            })
            .and_compare(|| {
                self.compare_one(Comparison::new(
                    ComparisonType::XmlStandalone,
                    detail(control, &contexts.control, control_standalone),
                    detail(test, &contexts.test, test_standalone),
                ))
            })
            .and_compare(|| {
                self.compare_one(Comparison::new(
                    ComparisonType::XmlEncoding,
                    detail(control, &contexts.control, control_encoding),
                    detail(test, &contexts.test, test_encoding),
                ))
            }))
    }

    fn split_attributes(&self, data: &XmlData, element: Node) -> SplitAttributes {
        let mut split = SplitAttributes::default();
        for attribute in data
            .attributes(element)
            .filter(|a| (self.attribute_filter)(data, *a))
        {
            let name = data.node_name(attribute);
            match (name.namespace(), name.local_name()) {
                (XML_SCHEMA_INSTANCE_NAMESPACE, "schemaLocation") => {
                    split.schema_location = Some(attribute)
                }
                (XML_SCHEMA_INSTANCE_NAMESPACE, "noNamespaceSchemaLocation") => {
                    split.no_namespace_schema_location = Some(attribute)
                }
                (XML_SCHEMA_INSTANCE_NAMESPACE, "type") => split.xsi_type = Some(attribute),
                (XMLNS_NAMESPACE, _) => {}
                _ => split.remaining.push(attribute),
            }
        }
        split
    }

    fn compare_element_attributes(
        &mut self,
        data: &XmlData,
        control: Node,
        test: Node,
        contexts: &mut PathContexts,
    ) -> Result<ComparisonState, Error> {
        let control_attributes = self.split_attributes(data, control);
        let test_attributes = self.split_attributes(data, test);
        contexts.control.add_attributes(
            control_attributes
                .remaining
                .iter()
                .map(|a| data.node_name(*a)),
        );
        contexts
            .test
            .add_attributes(test_attributes.remaining.iter().map(|a| data.node_name(*a)));

        let mut found = HashSet::default();
        self.compare_one(Comparison::new(
            ComparisonType::ElementNumAttributes,
            detail(control, &contexts.control, control_attributes.remaining.len()),
            detail(test, &contexts.test, test_attributes.remaining.len()),
        ))
        .and_then(|| {
            self.compare_xsi_type(
                data,
                (control, control_attributes.xsi_type),
                (test, test_attributes.xsi_type),
                contexts,
            )
        })?
        .and_compare(|| {
            self.compare_one(Comparison::new(
                ComparisonType::SchemaLocation,
                detail(
                    control,
                    &contexts.control,
                    attribute_value(data, control_attributes.schema_location),
                ),
                detail(
                    test,
                    &contexts.test,
                    attribute_value(data, test_attributes.schema_location),
                ),
            ))
        })
        .and_compare(|| {
            self.compare_one(Comparison::new(
                ComparisonType::NoNamespaceSchemaLocation,
                detail(
                    control,
                    &contexts.control,
                    attribute_value(data, control_attributes.no_namespace_schema_location),
                ),
                detail(
                    test,
                    &contexts.test,
                    attribute_value(data, test_attributes.no_namespace_schema_location),
                ),
            ))
        })
        .and_then(|| {
            self.compare_remaining_attributes(
                data,
                (control, &control_attributes.remaining),
                (test, &test_attributes.remaining),
                contexts,
                &mut found,
            )
        })?
        .and_then(|| {
            self.compare_unmatched_test_attributes(
                data,
                control,
                (test, &test_attributes.remaining),
                contexts,
                &found,
            )
        })
    }

    fn compare_xsi_type(
        &mut self,
        data: &XmlData,
        (control, control_type): (Node, Option<Node>),
        (test, test_type): (Node, Option<Node>),
        contexts: &mut PathContexts,
    ) -> Result<ComparisonState, Error> {
        if control_type.is_none() && test_type.is_none() {
            return Ok(ComparisonState::default());
        }
        let control_name = control_type.map(|a| data.node_name(a));
        let test_name = test_type.map(|a| data.node_name(a));
        if let Some(name) = &control_name {
            contexts.control.add_attribute(name.clone());
            contexts.control.navigate_to_attribute(name)?;
        }
        if let Some(name) = &test_name {
            contexts.test.add_attribute(name.clone());
            contexts.test.navigate_to_attribute(name)?;
        }

        let state = self.compare_one(Comparison::new(
            ComparisonType::AttrNameLookup,
            detail(control, &contexts.control, control_name.clone()),
            detail(test, &contexts.test, test_name.clone()),
        ));
        let state = match (control_type, test_type) {
            (Some(control_type), Some(test_type)) => state
                .and_compare(|| {
                    self.compare_one(Comparison::new(
                        ComparisonType::AttrValueExplicitlySpecified,
                        detail(control_type, &contexts.control, specified(data, control_type)),
                        detail(test_type, &contexts.test, specified(data, test_type)),
                    ))
                })
                .and_compare(|| {
                    self.compare_one(Comparison::new(
                        ComparisonType::AttrValue,
                        detail(
                            control_type,
                            &contexts.control,
                            value_as_qname(data, control_type),
                        ),
                        detail(test_type, &contexts.test, value_as_qname(data, test_type)),
                    ))
                }),
            _ => state,
        };

        if control_name.is_some() {
            contexts.control.navigate_to_parent()?;
        }
        if test_name.is_some() {
            contexts.test.navigate_to_parent()?;
        }
        Ok(state)
    }

    fn compare_remaining_attributes(
        &mut self,
        data: &XmlData,
        (control, control_attributes): (Node, &[Node]),
        (test, test_attributes): (Node, &[Node]),
        contexts: &mut PathContexts,
        found: &mut HashSet<Node>,
    ) -> Result<ComparisonState, Error> {
        let mut state = ComparisonState::default();
        for control_attribute in control_attributes {
            let control_name = data.node_name(*control_attribute);
            let test_attribute = test_attributes
                .iter()
                .copied()
                .find(|a| data.name(*a) == Some(&control_name));
            let test_name = test_attribute.map(|a| data.node_name(a));

            contexts.control.navigate_to_attribute(&control_name)?;
            state = state.and_compare(|| {
                self.compare_one(Comparison::new(
                    ComparisonType::AttrNameLookup,
                    detail(control, &contexts.control, control_name.clone()),
                    detail(test, &contexts.test, test_name.clone()),
                ))
            });
            if let (Some(test_attribute), Some(test_name)) = (test_attribute, &test_name) {
                contexts.test.navigate_to_attribute(test_name)?;
                state = state.and_then(|| {
                    self.compare_nodes(data, *control_attribute, test_attribute, contexts)
                })?;
                found.insert(test_attribute);
                contexts.test.navigate_to_parent()?;
            }
            contexts.control.navigate_to_parent()?;
        }
        Ok(state)
    }

    fn compare_unmatched_test_attributes(
        &mut self,
        data: &XmlData,
        control: Node,
        (test, test_attributes): (Node, &[Node]),
        contexts: &mut PathContexts,
        found: &HashSet<Node>,
    ) -> Result<ComparisonState, Error> {
        let mut state = ComparisonState::default();
        for test_attribute in test_attributes.iter().filter(|a| !found.contains(*a)) {
            let test_name = data.node_name(*test_attribute);
            contexts.test.navigate_to_attribute(&test_name)?;
            state = state.and_compare(|| {
                self.compare_one(Comparison::new(
                    ComparisonType::AttrNameLookup,
                    detail(control, &contexts.control, ComparisonValue::Null),
                    detail(test, &contexts.test, test_name.clone()),
                ))
            });
            contexts.test.navigate_to_parent()?;
        }
        Ok(state)
    }

    fn compare_node_lists(
        &mut self,
        data: &XmlData,
        control: &Children,
        test: &Children,
        contexts: &mut PathContexts,
    ) -> Result<ComparisonState, Error> {
        let pairs = self
            .node_matcher
            .match_nodes(data, &control.filtered, &test.filtered);
        let control_path_positions = positions(&control.all);
        let test_path_positions = positions(&test.all);
        let control_positions = positions(&control.filtered);
        let test_positions = positions(&test.filtered);
        let mut seen_control = HashSet::default();
        let mut seen_test = HashSet::default();

        let mut state = ComparisonState::default();
        for (control_child, test_child) in pairs {
            seen_control.insert(control_child);
            seen_test.insert(test_child);
            let control_index = position(&control_positions, control_child)?;
            let test_index = position(&test_positions, test_child)?;

            contexts
                .control
                .navigate_to_child(position(&control_path_positions, control_child)?)?;
            contexts
                .test
                .navigate_to_child(position(&test_path_positions, test_child)?)?;
            state = state
                .and_compare(|| {
                    self.compare_one(Comparison::new(
                        ComparisonType::ChildNodelistSequence,
                        detail(control_child, &contexts.control, control_index),
                        detail(test_child, &contexts.test, test_index),
                    ))
                })
                .and_then(|| self.compare_nodes(data, control_child, test_child, contexts))?;
            contexts.test.navigate_to_parent()?;
            contexts.control.navigate_to_parent()?;
        }

        for control_child in control.filtered.iter().copied() {
            if state.is_finished() {
                break;
            }
            if seen_control.contains(&control_child) {
                continue;
            }
            contexts
                .control
                .navigate_to_child(position(&control_path_positions, control_child)?)?;
            state = self.compare_one(Comparison::new(
                ComparisonType::ChildLookup,
                detail(control_child, &contexts.control, data.node_name(control_child)),
                Detail::new(None, None, ComparisonValue::Null, Some(contexts.test.xpath())),
            ));
            contexts.control.navigate_to_parent()?;
        }

        for test_child in test.filtered.iter().copied() {
            if state.is_finished() {
                break;
            }
            if seen_test.contains(&test_child) {
                continue;
            }
            contexts
                .test
                .navigate_to_child(position(&test_path_positions, test_child)?)?;
            state = self.compare_one(Comparison::new(
                ComparisonType::ChildLookup,
                Detail::new(
                    None,
                    None,
                    ComparisonValue::Null,
                    Some(contexts.control.xpath()),
                ),
                detail(test_child, &contexts.test, data.node_name(test_child)),
            ));
            contexts.test.navigate_to_parent()?;
        }
        Ok(state)
    }
}
