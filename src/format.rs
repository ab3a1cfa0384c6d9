//! Human readable descriptions of comparisons.

use crate::comparison::{Comparison, ComparisonType, Detail};
use crate::xmldata::{Node, XmlData};
use crate::xmlvalue::Value;

/// Turns comparisons into text.
pub trait ComparisonFormatter: Send + Sync {
    /// A one line description of a comparison.
    fn description(&self, data: &XmlData, comparison: &Comparison) -> String;

    /// The XML surrounding one side of a comparison.
    fn details(&self, data: &XmlData, detail: &Detail, comparison_type: ComparisonType) -> String;
}

/// What a comparison type compares, in words.
pub fn describe(comparison_type: ComparisonType) -> &'static str {
    use ComparisonType::*;
    match comparison_type {
        AttrValueExplicitlySpecified => "attribute value explicitly specified",
        HasDoctypeDeclaration => "has doctype declaration",
        DoctypeName => "doctype name",
        DoctypePublicId => "doctype public id",
        DoctypeSystemId => "doctype system id",
        SchemaLocation => "schema location",
        NoNamespaceSchemaLocation => "no namespace schema location",
        NodeType => "node type",
        NamespacePrefix => "namespace prefix",
        NamespaceUri => "namespace URI",
        TextValue => "text value",
        ProcessingInstructionTarget => "processing instruction target",
        ProcessingInstructionData => "processing instruction data",
        ElementTagName => "element tag name",
        ElementNumAttributes => "number of attributes",
        AttrValue => "attribute value",
        ChildNodelistLength => "number of child nodes",
        ChildNodelistSequence => "child nodelist sequence",
        ChildLookup => "child",
        AttrNameLookup => "attribute name",
        XmlVersion => "xml version",
        XmlStandalone => "xml standalone",
        XmlEncoding => "xml encoding",
    }
}

/// The standard formatter.
///
/// Descriptions look like
/// `Expected attribute value 'a' but was 'b' - comparing <x y="a"...> at /x[1]/@y to <x y="b"...> at /x[1]/@y`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultComparisonFormatter;

fn qualified(data: &XmlData, node: Node) -> String {
    let local = data.node_name(node).local_name().to_string();
    match data.prefix(node) {
        "" => local,
        prefix => format!("{}:{}", prefix, local),
    }
}

fn document_element_indication(data: &XmlData, document: Node) -> String {
    data.document_element(document)
        .map(|element| format!("<{}...>", qualified(data, element)))
        .unwrap_or_default()
}

impl DefaultComparisonFormatter {
    fn short_string(
        &self,
        data: &XmlData,
        detail: &Detail,
        comparison_type: ComparisonType,
    ) -> String {
        let mut s = match detail.target() {
            None => "<NULL>".to_string(),
            Some(node) => self.short_node_string(data, node, comparison_type),
        };
        if let Some(xpath) = detail.xpath().filter(|xpath| !xpath.is_empty()) {
            s.push_str(" at ");
            s.push_str(xpath);
        }
        s
    }

    fn short_node_string(
        &self,
        data: &XmlData,
        node: Node,
        comparison_type: ComparisonType,
    ) -> String {
        match data.value(node) {
            Value::Document if comparison_type == ComparisonType::HasDoctypeDeclaration => {
                let doctype = data
                    .doctype(node)
                    .map(|doctype| data.to_string(doctype))
                    .unwrap_or_default();
                format!("{}{}", doctype, document_element_indication(data, node))
            }
            Value::Document => {
                let declaration = data
                    .declaration(node)
                    .map(|declaration| data.to_string(declaration))
                    .unwrap_or_default();
                format!("{}{}", declaration, document_element_indication(data, node))
            }
            Value::Declaration(_) | Value::DocumentType(_) => data.to_string(node),
            Value::Element(_) => format!("<{}...>", qualified(data, node)),
            Value::Attribute(attribute) => {
                let element = data
                    .parent(node)
                    .map(|parent| qualified(data, parent))
                    .unwrap_or_default();
                format!(
                    "<{} {}=\"{}\"...>",
                    element,
                    qualified(data, node),
                    attribute.value()
                )
            }
            Value::Text(_) | Value::CData(_) => {
                let parent = data
                    .parent(node)
                    .map(|parent| qualified(data, parent))
                    .unwrap_or_default();
                format!("<{} ...>{}</{}>", parent, data.to_string(node), parent)
            }
            Value::Comment(_) | Value::ProcessingInstruction(_) => data.to_string(node),
        }
    }
}

impl ComparisonFormatter for DefaultComparisonFormatter {
    fn description(&self, data: &XmlData, comparison: &Comparison) -> String {
        let comparison_type = comparison.comparison_type();
        let control = comparison.control();
        let test = comparison.test();
        let control_target = self.short_string(data, control, comparison_type);
        let test_target = self.short_string(data, test, comparison_type);
        if comparison_type == ComparisonType::AttrNameLookup {
            return format!(
                "Expected {} '{}' - comparing {} to {}",
                describe(comparison_type),
                control.xpath().unwrap_or(""),
                control_target,
                test_target
            );
        }
        format!(
            "Expected {} '{}' but was '{}' - comparing {} to {}",
            describe(comparison_type),
            control.value(),
            test.value(),
            control_target,
            test_target
        )
    }

    fn details(&self, data: &XmlData, detail: &Detail, comparison_type: ComparisonType) -> String {
        let Some(target) = detail.target() else {
            return "<NULL>".to_string();
        };
        let node = match data.value(target) {
            Value::Document | Value::Element(_) | Value::DocumentType(_) | Value::Declaration(_)
                if comparison_type != ComparisonType::ChildNodelistSequence =>
            {
                target
            }
            _ => data.parent(target).unwrap_or(target),
        };
        if data.attribute(target).is_some() {
            // the element without its content
            let mut element = data.to_string(node);
            if let Some(end) = element.find('>') {
                element.truncate(end + 1);
            }
            return element;
        }
        data.to_string(node)
    }
}
