//! Proptest support.
//!
//! Lets you generate arbitrary XML documents to check properties of a
//! comparison that must hold for any input, such as a document never
//! differing from itself.
//!
//! This can be enabled by adding the `proptest` feature to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! xmlcompare = { version = "0.1", features = ["proptest"] }
//! ```
//!
//! See the [`proptest`](https://docs.rs/proptest/latest/proptest/)
//! documentation for more information.

use std::fmt::{self, Display, Formatter};

use ahash::HashSet;
use proptest::prelude::*;

const NAMESPACES: &[&str] = &["", "http://example.com/x", "http://example.com/y"];
const ELEMENT_NAMES: &[&str] = &["a", "b", "c", "d", "e"];
const ATTRIBUTE_NAMES: &[&str] = &["q", "r", "s"];
const PI_NAMES: &[&str] = &["pi1", "pi2", "pi3"];
const TEXT: &str = "[a-z0-9 &<>\"'\n\t]{0,8}";
const MARKUP_TEXT: &str = "[a-z0-9 &<>\"']{0,8}";

/// An arbitrary element with its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbitraryElement {
    /// Local name.
    pub name: String,
    /// Default namespace declared on the element, if any.
    pub namespace: Option<String>,
    /// Attribute names and values, without duplicates.
    pub attributes: Vec<(String, String)>,
    /// Child content.
    pub children: Vec<ArbitraryContent>,
}

/// Arbitrary element content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbitraryContent {
    /// Text, escaped when written.
    Text(String),
    /// A CDATA section.
    CData(String),
    /// A comment.
    Comment(String),
    /// A processing instruction with optional data.
    ProcessingInstruction(String, Option<String>),
    /// A nested element.
    Element(ArbitraryElement),
}

/// An arbitrary document. Its `Display` is the XML text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbitraryDocument {
    /// Comments before the document element.
    pub before: Vec<String>,
    /// The document element.
    pub document_element: ArbitraryElement,
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl Display for ArbitraryElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        if let Some(namespace) = &self.namespace {
            write!(f, " xmlns=\"{}\"", namespace)?;
        }
        for (name, value) in &self.attributes {
            write!(f, " {}=\"{}\"", name, escape(value))?;
        }
        if self.children.is_empty() {
            return write!(f, "/>");
        }
        write!(f, ">")?;
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.name)
    }
}

impl Display for ArbitraryContent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ArbitraryContent::Text(text) => write!(f, "{}", escape(text)),
            ArbitraryContent::CData(text) => write!(f, "<![CDATA[{}]]>", text),
            ArbitraryContent::Comment(text) => write!(f, "<!--{}-->", text),
            ArbitraryContent::ProcessingInstruction(target, Some(data)) => {
                write!(f, "<?{} {}?>", target, data)
            }
            ArbitraryContent::ProcessingInstruction(target, None) => write!(f, "<?{}?>", target),
            ArbitraryContent::Element(element) => write!(f, "{}", element),
        }
    }
}

impl Display for ArbitraryDocument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for comment in &self.before {
            write!(f, "<!--{}-->", comment)?;
        }
        write!(f, "{}", self.document_element)
    }
}

fn arb_comment() -> impl Strategy<Value = String> {
    MARKUP_TEXT.prop_filter("comment", |s| !s.contains('-'))
}

fn arb_processing_instruction() -> impl Strategy<Value = ArbitraryContent> {
    (
        prop::sample::select(PI_NAMES),
        prop::option::of("[a-z0-9]{1,8}"),
    )
        .prop_map(|(target, data)| ArbitraryContent::ProcessingInstruction(target.to_string(), data))
}

fn arb_namespace() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::sample::select(NAMESPACES).prop_map(str::to_string))
}

fn arb_attributes() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(
        (prop::sample::select(ATTRIBUTE_NAMES), MARKUP_TEXT),
        0..4,
    )
    .prop_map(|attributes| {
        let mut seen = HashSet::default();
        attributes
            .into_iter()
            .filter(|(name, _)| seen.insert(*name))
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    })
}

fn arb_content() -> impl Strategy<Value = ArbitraryContent> {
    let leaf = prop_oneof![
        TEXT.prop_map(ArbitraryContent::Text),
        "[a-z0-9 <>&]{0,8}".prop_map(ArbitraryContent::CData),
        arb_comment().prop_map(ArbitraryContent::Comment),
        arb_processing_instruction(),
    ];

    leaf.prop_recursive(
        6,  // levels deep
        64, // maximum number of nodes
        6,  // items per collection
        |inner| {
            (
                prop::sample::select(ELEMENT_NAMES),
                arb_namespace(),
                arb_attributes(),
                prop::collection::vec(inner, 0..6),
            )
                .prop_map(|(name, namespace, attributes, children)| {
                    ArbitraryContent::Element(ArbitraryElement {
                        name: name.to_string(),
                        namespace,
                        attributes,
                        children,
                    })
                })
        },
    )
}

prop_compose! {
    fn arb_element()(name in prop::sample::select(ELEMENT_NAMES),
                     namespace in arb_namespace(),
                     attributes in arb_attributes(),
                     children in prop::collection::vec(arb_content(), 0..6)) -> ArbitraryElement {
        ArbitraryElement {
            name: name.to_string(),
            namespace,
            attributes,
            children,
        }
    }
}

/// Generate a random XML document.
///
/// ```notrust
/// use xmlcompare::proptest::arb_xml_document;
/// use xmlcompare::DiffBuilder;
///
/// proptest! {
///   #[test]
///   fn test_document_equals_itself(document in arb_xml_document()) {
///     let xml = document.to_string();
///     let diff = DiffBuilder::compare(xml.as_str()).with_test(xml.as_str()).build().unwrap();
///     prop_assert!(!diff.has_differences());
///   }
/// }
/// ```
pub fn arb_xml_document() -> impl Strategy<Value = ArbitraryDocument> {
    (prop::collection::vec(arb_comment(), 0..3), arb_element()).prop_map(
        |(before, document_element)| ArbitraryDocument {
            before,
            document_element,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffBuilder;
    use crate::xmldata::XmlData;

    proptest! {
        #[test]
        fn test_arb_xml_parses(document in arb_xml_document()) {
            let xml = document.to_string();
            let mut data = XmlData::new();
            let parsed = data.parse(&xml);
            prop_assert!(parsed.is_ok(), "Cannot parse: {} {:?}", xml, parsed.err());
        }
    }

    proptest! {
        #[test]
        fn test_document_equals_itself(document in arb_xml_document()) {
            let xml = document.to_string();
            let diff = DiffBuilder::compare(xml.as_str())
                .with_test(xml.as_str())
                .build()
                .unwrap();
            prop_assert!(!diff.has_differences(), "{}: {}", xml, diff);
        }
    }

    proptest! {
        #[test]
        fn test_same_tree_equals_itself(document in arb_xml_document()) {
            let xml = document.to_string();
            let mut data = XmlData::new();
            let root = data.parse(&xml).unwrap();
            let mut engine = crate::engine::DomDifferenceEngine::new();
            let count = std::rc::Rc::new(std::cell::Cell::new(0usize));
            let sink = count.clone();
            engine.add_difference_listener(
                move |_: &crate::comparison::Comparison, _: crate::comparison::ComparisonResult| {
                    sink.set(sink.get() + 1)
                },
            );
            engine.compare(&data, root, root).unwrap();
            prop_assert_eq!(count.get(), 0);
        }
    }

    proptest! {
        #[test]
        fn test_whitespace_options_keep_reflexivity(document in arb_xml_document()) {
            let xml = document.to_string();
            let diff = DiffBuilder::compare(xml.as_str())
                .with_test(xml.as_str())
                .normalize_whitespace()
                .ignore_comments()
                .build()
                .unwrap();
            prop_assert!(!diff.has_differences(), "{}: {}", xml, diff);
        }
    }
}
