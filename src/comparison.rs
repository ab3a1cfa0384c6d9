use std::fmt::{Display, Formatter};

use crate::name::QName;
use crate::xmldata::Node;
use crate::xmlvalue::NodeType;

/// The kinds of atomic comparisons the engine performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComparisonType {
    /// Do both documents have a document type declaration?
    HasDoctypeDeclaration,
    /// Name of the document type.
    DoctypeName,
    /// Public identifier of the document type.
    DoctypePublicId,
    /// System identifier of the document type.
    DoctypeSystemId,
    /// `xsi:schemaLocation`.
    SchemaLocation,
    /// `xsi:noNamespaceSchemaLocation`.
    NoNamespaceSchemaLocation,
    /// Node type.
    NodeType,
    /// Namespace prefix.
    NamespacePrefix,
    /// Namespace URI.
    NamespaceUri,
    /// Content of text, CDATA and comment nodes.
    TextValue,
    /// Target of a processing instruction.
    ProcessingInstructionTarget,
    /// Data of a processing instruction.
    ProcessingInstructionData,
    /// Local name of an element.
    ElementTagName,
    /// Number of attributes, not counting namespace declarations and the
    /// special schema instance attributes.
    ElementNumAttributes,
    /// Was the attribute value written in the document?
    AttrValueExplicitlySpecified,
    /// Attribute value.
    AttrValue,
    /// Number of (filtered) child nodes.
    ChildNodelistLength,
    /// Position of a matched child among its siblings.
    ChildNodelistSequence,
    /// A child node without a counterpart on the other side.
    ChildLookup,
    /// An attribute without a counterpart on the other side.
    AttrNameLookup,
    /// XML version of the declaration.
    XmlVersion,
    /// `standalone` of the declaration.
    XmlStandalone,
    /// `encoding` of the declaration.
    XmlEncoding,
}

/// The outcome of a comparison.
///
/// Ordered by severity: `Equal < Similar < Different`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComparisonResult {
    /// The two values are the same.
    Equal,
    /// The values differ in a way that's usually irrelevant.
    Similar,
    /// The values are different.
    Different,
}

impl Display for ComparisonResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ComparisonResult::Equal => "EQUAL",
            ComparisonResult::Similar => "SIMILAR",
            ComparisonResult::Different => "DIFFERENT",
        };
        write!(f, "{}", s)
    }
}

/// One side's value in a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComparisonValue {
    /// Absent, e.g. the missing side of a lookup.
    Null,
    /// A string such as a text value or a namespace URI.
    String(String),
    /// A flag such as "has a doctype".
    Bool(bool),
    /// A count or a position.
    Integer(usize),
    /// A qualified name.
    QName(QName),
    /// A node type.
    NodeType(NodeType),
}

impl ComparisonValue {
    /// True for [`ComparisonValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, ComparisonValue::Null)
    }
}

impl From<&str> for ComparisonValue {
    fn from(s: &str) -> Self {
        ComparisonValue::String(s.to_string())
    }
}

impl From<String> for ComparisonValue {
    fn from(s: String) -> Self {
        ComparisonValue::String(s)
    }
}

impl From<Option<&str>> for ComparisonValue {
    fn from(s: Option<&str>) -> Self {
        s.map(ComparisonValue::from).unwrap_or(ComparisonValue::Null)
    }
}

impl From<bool> for ComparisonValue {
    fn from(b: bool) -> Self {
        ComparisonValue::Bool(b)
    }
}

impl From<usize> for ComparisonValue {
    fn from(i: usize) -> Self {
        ComparisonValue::Integer(i)
    }
}

impl From<QName> for ComparisonValue {
    fn from(name: QName) -> Self {
        ComparisonValue::QName(name)
    }
}

impl From<Option<QName>> for ComparisonValue {
    fn from(name: Option<QName>) -> Self {
        name.map(ComparisonValue::QName)
            .unwrap_or(ComparisonValue::Null)
    }
}

impl From<NodeType> for ComparisonValue {
    fn from(node_type: NodeType) -> Self {
        ComparisonValue::NodeType(node_type)
    }
}

impl Display for ComparisonValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparisonValue::Null => write!(f, "null"),
            ComparisonValue::String(s) => write!(f, "{}", s),
            ComparisonValue::Bool(b) => write!(f, "{}", b),
            ComparisonValue::Integer(i) => write!(f, "{}", i),
            ComparisonValue::QName(name) => write!(f, "{}", name),
            ComparisonValue::NodeType(node_type) => write!(f, "{}", node_type),
        }
    }
}

/// What a comparison looked at on one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    target: Option<Node>,
    xpath: Option<String>,
    parent_xpath: Option<String>,
    value: ComparisonValue,
}

impl Detail {
    /// Describe one side of a comparison.
    pub fn new(
        target: Option<Node>,
        xpath: Option<String>,
        value: impl Into<ComparisonValue>,
        parent_xpath: Option<String>,
    ) -> Self {
        Detail {
            target,
            xpath,
            parent_xpath,
            value: value.into(),
        }
    }

    /// The node compared, if any.
    pub fn target(&self) -> Option<Node> {
        self.target
    }

    /// The XPath of the node compared, if any.
    pub fn xpath(&self) -> Option<&str> {
        self.xpath.as_deref()
    }

    /// The XPath of the parent of the node compared.
    pub fn parent_xpath(&self) -> Option<&str> {
        self.parent_xpath.as_deref()
    }

    /// The value compared.
    pub fn value(&self) -> &ComparisonValue {
        &self.value
    }
}

/// One atomic comparison between a control and a test detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    comparison_type: ComparisonType,
    control: Detail,
    test: Detail,
}

impl Comparison {
    /// Create a comparison.
    pub fn new(comparison_type: ComparisonType, control: Detail, test: Detail) -> Self {
        Comparison {
            comparison_type,
            control,
            test,
        }
    }

    /// The kind of comparison.
    pub fn comparison_type(&self) -> ComparisonType {
        self.comparison_type
    }

    /// The control side.
    pub fn control(&self) -> &Detail {
        &self.control
    }

    /// The test side.
    pub fn test(&self) -> &Detail {
        &self.test
    }

    /// The raw outcome before any evaluator ran.
    pub fn raw_result(&self) -> ComparisonResult {
        if self.control.value == self.test.value {
            ComparisonResult::Equal
        } else {
            ComparisonResult::Different
        }
    }
}

/// A comparison together with its evaluated outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    comparison: Comparison,
    result: ComparisonResult,
}

impl Difference {
    /// Pair a comparison with its outcome.
    pub fn new(comparison: Comparison, result: ComparisonResult) -> Self {
        Difference { comparison, result }
    }

    /// The comparison.
    pub fn comparison(&self) -> &Comparison {
        &self.comparison
    }

    /// The outcome.
    pub fn result(&self) -> ComparisonResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparison(control: ComparisonValue, test: ComparisonValue) -> Comparison {
        Comparison::new(
            ComparisonType::TextValue,
            Detail::new(None, None, control, None),
            Detail::new(None, None, test, None),
        )
    }

    #[test]
    fn test_raw_result() {
        assert_eq!(
            comparison("a".into(), "a".into()).raw_result(),
            ComparisonResult::Equal
        );
        assert_eq!(
            comparison("a".into(), "b".into()).raw_result(),
            ComparisonResult::Different
        );
        assert_eq!(
            comparison(ComparisonValue::Null, ComparisonValue::Null).raw_result(),
            ComparisonResult::Equal
        );
        assert_eq!(
            comparison(ComparisonValue::Null, "".into()).raw_result(),
            ComparisonResult::Different
        );
    }

    #[test]
    fn test_result_severity_order() {
        assert!(ComparisonResult::Equal < ComparisonResult::Similar);
        assert!(ComparisonResult::Similar < ComparisonResult::Different);
    }
}
