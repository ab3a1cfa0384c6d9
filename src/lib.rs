#![forbid(unsafe_code)]

//! Compare two XML documents and find out how they differ.
//!
//! Documents are parsed into an [`XmlData`] tree. A
//! [`DomDifferenceEngine`] walks a control and a test tree side by side and
//! reports every comparison it makes (node types, names, namespaces,
//! attributes, text, child order and more) to listeners, each graded as
//! `Equal`, `Similar` or `Different` and located with an XPath on both
//! sides.
//!
//! Most of the time you'll want the [`DiffBuilder`], which parses, optionally
//! normalizes and compares two documents in one go:
//!
//! ```rust
//! use xmlcompare::{ComparisonType, DiffBuilder};
//!
//! let diff = DiffBuilder::compare(r#"<a attr1="abc" attr2="def"/>"#)
//!     .with_test(r#"<a attr1="uvw" attr2="xyz"/>"#)
//!     .build()?;
//!
//! assert_eq!(diff.differences().len(), 2);
//! let first = diff.differences()[0].comparison();
//! assert_eq!(first.comparison_type(), ComparisonType::AttrValue);
//! assert_eq!(first.control().xpath(), Some("/a[1]/@attr1"));
//! # Ok::<(), xmlcompare::Error>(())
//! ```
//!
//! How children are paired up is decided by a [`NodeMatcher`]; the default
//! one pairs elements in document order, but [`selector`] has element
//! selectors that pair by name, attributes, text or XPath. How a raw
//! outcome is graded is decided by an [`evaluator`], and when to stop by a
//! [`controller`].
//!
//! ```rust
//! use xmlcompare::{selector, DefaultNodeMatcher, DiffBuilder};
//!
//! let diff = DiffBuilder::compare("<a><c/><b/></a>")
//!     .with_test("<a><b/><c/></a>")
//!     .with_node_matcher(DefaultNodeMatcher::new(vec![selector::by_name()]))
//!     .check_for_similar()
//!     .build()?;
//! assert!(!diff.has_differences());
//! # Ok::<(), xmlcompare::Error>(())
//! ```

mod comparison;
pub mod controller;
mod diff;
mod encoding;
mod engine;
mod entity;
mod error;
pub mod evaluator;
mod format;
mod input;
mod matcher;
mod name;
mod parse;
pub mod selector;
mod serialize;
mod state;
pub mod transform;
mod xmldata;
mod xmlvalue;
mod xpath;
mod xpath_context;

#[cfg(any(test, feature = "proptest"))]
pub mod proptest;

pub use comparison::{
    Comparison, ComparisonResult, ComparisonType, ComparisonValue, Detail, Difference,
};
pub use controller::ComparisonController;
pub use diff::{Diff, DiffBuilder};
pub use engine::{
    default_attribute_filter, default_node_filter, AttributeFilter, ComparisonListener,
    DomDifferenceEngine, NodeFilter,
};
pub use error::{Error, Result};
pub use evaluator::DifferenceEvaluator;
pub use format::{describe, ComparisonFormatter, DefaultComparisonFormatter};
pub use input::Input;
pub use matcher::{default_node_type_matcher, DefaultNodeMatcher, NodeMatcher, NodeTypeMatcher};
pub use name::{QName, XML_NAMESPACE, XML_SCHEMA_INSTANCE_NAMESPACE, XMLNS_NAMESPACE};
pub use selector::{ElementPredicate, ElementSelector};
pub use serialize::XmlDisplay;
pub use xmldata::{Node, XmlData};
pub use xmlvalue::{
    Attribute, Declaration, DocumentType, Element, NodeType, ProcessingInstruction, Value,
};
pub use xpath::XPath;
pub use xpath_context::{NodeInfo, XPathContext};
