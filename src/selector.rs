//! Element selectors decide which control and test elements may be
//! compared with each other.
//!
//! A selector is a plain predicate over two elements. The node matcher
//! only consults it for element pairs; other node kinds are paired by
//! type. Selectors combine with [`and`], [`or`], [`not`], [`xor`] and
//! [`conditional`], or with the [`when`] builder.

use std::sync::Arc;

use ahash::HashMap;

use crate::error::Error;
use crate::matcher::{DefaultNodeMatcher, NodeMatcher};
use crate::name::QName;
use crate::xmldata::{Node, XmlData};
use crate::xmlvalue::NodeType;
use crate::xpath::XPath;

/// Decides whether a control element and a test element can be compared.
pub type ElementSelector = Arc<dyn Fn(&XmlData, Node, Node) -> bool + Send + Sync>;

/// A predicate over a single (control) element.
pub type ElementPredicate = Arc<dyn Fn(&XmlData, Node) -> bool + Send + Sync>;

fn same_name(data: &XmlData, control: Node, test: Node) -> bool {
    match (data.name(control), data.name(test)) {
        (Some(control), Some(test)) => control == test,
        _ => false,
    }
}

/// Pair elements in document order, whatever their names.
pub fn default() -> ElementSelector {
    Arc::new(|_: &XmlData, _: Node, _: Node| true)
}

/// Elements with the same local name and namespace URI.
pub fn by_name() -> ElementSelector {
    Arc::new(|data: &XmlData, control: Node, test: Node| same_name(data, control, test))
}

/// Elements with the same name and the same direct text content.
///
/// Text and CDATA children are concatenated; nested elements don't
/// contribute.
pub fn by_name_and_text() -> ElementSelector {
    Arc::new(|data: &XmlData, control: Node, test: Node| {
        same_name(data, control, test)
            && data.merged_nested_text(control) == data.merged_nested_text(test)
    })
}

fn attributes_match(data: &XmlData, control: Node, test: Node, names: &[QName]) -> bool {
    names
        .iter()
        .all(|name| data.attribute_value(control, name) == data.attribute_value(test, name))
}

/// Elements with the same name and equal values for the named
/// attributes. The names are local names in no namespace. An attribute
/// missing on both sides counts as equal.
pub fn by_name_and_attributes<S: AsRef<str>>(
    names: impl IntoIterator<Item = S>,
) -> ElementSelector {
    let names = names
        .into_iter()
        .map(|name| QName::local(name.as_ref()))
        .collect::<Vec<_>>();
    Arc::new(move |data: &XmlData, control: Node, test: Node| {
        same_name(data, control, test) && attributes_match(data, control, test, &names)
    })
}

/// Like [`by_name_and_attributes`], but the named attributes are looked
/// up in the namespace of the control element.
pub fn by_name_and_attributes_control_ns<S: AsRef<str>>(
    names: impl IntoIterator<Item = S>,
) -> ElementSelector {
    let locals = names
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .collect::<Vec<_>>();
    Arc::new(move |data: &XmlData, control: Node, test: Node| {
        if !same_name(data, control, test) {
            return false;
        }
        let namespace = data.namespace_uri(control);
        let names = locals
            .iter()
            .map(|local| QName::new(namespace, local.as_str()))
            .collect::<Vec<_>>();
        attributes_match(data, control, test, &names)
    })
}

/// Elements with the same name and exactly the same attributes.
///
/// Namespace declarations are ignored.
pub fn by_name_and_all_attributes() -> ElementSelector {
    Arc::new(|data: &XmlData, control: Node, test: Node| {
        same_name(data, control, test) && data.attribute_map(control) == data.attribute_map(test)
    })
}

/// Negate a selector.
pub fn not(selector: ElementSelector) -> ElementSelector {
    Arc::new(move |data: &XmlData, control: Node, test: Node| !selector(data, control, test))
}

/// True if any of the selectors is.
pub fn or(selectors: impl IntoIterator<Item = ElementSelector>) -> ElementSelector {
    let selectors = selectors.into_iter().collect::<Vec<_>>();
    Arc::new(move |data: &XmlData, control: Node, test: Node| {
        selectors.iter().any(|s| s(data, control, test))
    })
}

/// True if all of the selectors are.
pub fn and(selectors: impl IntoIterator<Item = ElementSelector>) -> ElementSelector {
    let selectors = selectors.into_iter().collect::<Vec<_>>();
    Arc::new(move |data: &XmlData, control: Node, test: Node| {
        selectors.iter().all(|s| s(data, control, test))
    })
}

/// True if exactly one of the two selectors is.
pub fn xor(a: ElementSelector, b: ElementSelector) -> ElementSelector {
    Arc::new(move |data: &XmlData, control: Node, test: Node| {
        a(data, control, test) ^ b(data, control, test)
    })
}

/// Apply `selector` only where `predicate` holds for the control
/// element; everywhere else the elements can't be compared.
pub fn conditional(predicate: ElementPredicate, selector: ElementSelector) -> ElementSelector {
    Arc::new(move |data: &XmlData, control: Node, test: Node| {
        predicate(data, control) && selector(data, control, test)
    })
}

fn is_named(name: QName) -> ElementPredicate {
    Arc::new(move |data: &XmlData, node: Node| data.name(node) == Some(&name))
}

/// Apply `selector` only to control elements with the given name.
pub fn selector_for_element_named(name: QName, selector: ElementSelector) -> ElementSelector {
    conditional(is_named(name), selector)
}

/// Elements whose children selected by `expression` can all be matched up
/// by a node matcher using `child_selector`.
///
/// `prefix_to_uri` resolves prefixes used in the expression. Compile
/// errors are reported here rather than during comparison.
pub fn by_xpath(
    expression: &str,
    prefix_to_uri: &HashMap<String, String>,
    child_selector: ElementSelector,
) -> Result<ElementSelector, Error> {
    let xpath = XPath::compile(expression, prefix_to_uri)?;
    let matcher = DefaultNodeMatcher::new([child_selector]);
    Ok(Arc::new(move |data: &XmlData, control: Node, test: Node| {
        let control_nodes = xpath.select(data, control);
        let test_nodes = xpath.select(data, test);
        matcher.match_nodes(data, &control_nodes, &test_nodes).len() == control_nodes.len()
    }))
}

fn structural_children(data: &XmlData, node: Node) -> Vec<Node> {
    data.children(node)
        .filter(|child| !data.node_type(*child).is_text())
        .collect()
}

fn name_and_text_recursive(data: &XmlData, control: Node, test: Node) -> bool {
    if !(same_name(data, control, test)
        && data.merged_nested_text(control) == data.merged_nested_text(test))
    {
        return false;
    }
    let control_children = structural_children(data, control);
    let test_children = structural_children(data, test);
    if control_children.len() != test_children.len() {
        return false;
    }
    control_children
        .iter()
        .zip(test_children.iter())
        .all(|(c, t)| {
            let control_type = data.node_type(*c);
            if control_type != data.node_type(*t) {
                return false;
            }
            control_type != NodeType::Element || name_and_text_recursive(data, *c, *t)
        })
}

/// [`by_name_and_text`] applied to the elements and, pairwise, to all of
/// their descendant elements. Apart from text and CDATA, which only count
/// through the merged text, both trees must have the same shape.
pub fn by_name_and_text_recursive() -> ElementSelector {
    Arc::new(|data: &XmlData, control: Node, test: Node| {
        name_and_text_recursive(data, control, test)
    })
}

fn is_empty_text(data: &XmlData, node: Node) -> bool {
    data.node_type(node).is_text() && data.text_str(node).unwrap_or("").trim().is_empty()
}

fn first_eligible_child(data: &XmlData, node: Node, ignore_empty_texts: bool) -> Option<Node> {
    data.children(node)
        .find(|child| !(ignore_empty_texts && is_empty_text(data, *child)))
        .filter(|child| data.node_type(*child) == NodeType::Element)
}

/// Elements that match by name down `levels` levels of first children,
/// with the innermost pair also matching by text.
///
/// With `ignore_empty_texts`, whitespace-only text is skipped when
/// looking for the first child. The innermost pair is compared like
/// [`by_name_and_text`]. `levels` must be at least 1.
pub fn multi_level_by_name_and_text(
    levels: usize,
    ignore_empty_texts: bool,
) -> Result<ElementSelector, Error> {
    if levels < 1 {
        return Err(Error::InvalidConfiguration(
            "levels must be equal or greater than 1".to_string(),
        ));
    }
    Ok(Arc::new(move |data: &XmlData, control: Node, test: Node| {
        let mut control = control;
        let mut test = test;
        for _ in 0..levels - 1 {
            if !same_name(data, control, test) {
                return false;
            }
            match (
                first_eligible_child(data, control, ignore_empty_texts),
                first_eligible_child(data, test, ignore_empty_texts),
            ) {
                (Some(c), Some(t)) => {
                    control = c;
                    test = t;
                }
                _ => return false,
            }
        }
        same_name(data, control, test)
            && data.merged_nested_text(control) == data.merged_nested_text(test)
    }))
}

/// Start a conditional selector: the selector given to
/// [`When::then_use`] applies to control elements satisfying `predicate`.
pub fn when(predicate: ElementPredicate) -> When {
    ConditionalSelectorBuilder::new().when(predicate)
}

/// Start a conditional selector for control elements with a given name.
pub fn when_element_is_named(name: QName) -> When {
    ConditionalSelectorBuilder::new().when_element_is_named(name)
}

/// Builds a selector out of predicate/selector pairs.
///
/// The first pair whose predicate holds for the control element decides.
/// If none applies, the `else_use` selector decides; without one the
/// elements can't be compared.
#[derive(Clone, Default)]
pub struct ConditionalSelectorBuilder {
    conditionals: Vec<(ElementPredicate, ElementSelector)>,
    default: Option<ElementSelector>,
    pending: Option<ElementPredicate>,
}

/// A builder with a condition still waiting for its selector.
pub struct When {
    builder: ConditionalSelectorBuilder,
}

impl When {
    /// The selector to use where the pending condition holds.
    pub fn then_use(mut self, selector: ElementSelector) -> ConditionalSelectorBuilder {
        if let Some(predicate) = self.builder.pending.take() {
            self.builder.conditionals.push((predicate, selector));
        }
        self.builder
    }
}

impl ConditionalSelectorBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition.
    pub fn when(mut self, predicate: ElementPredicate) -> When {
        self.pending = Some(predicate);
        When { builder: self }
    }

    /// Add a condition on the control element's name.
    pub fn when_element_is_named(self, name: QName) -> When {
        self.when(is_named(name))
    }

    /// The selector to use where no condition applies.
    pub fn else_use(mut self, selector: ElementSelector) -> Result<Self, Error> {
        if self.default.is_some() {
            return Err(Error::InvalidConfiguration(
                "can't have more than one default selector".to_string(),
            ));
        }
        self.default = Some(selector);
        Ok(self)
    }

    /// Build the selector.
    pub fn build(self) -> Result<ElementSelector, Error> {
        if self.pending.is_some() {
            return Err(Error::InvalidConfiguration(
                "a condition is missing its selector".to_string(),
            ));
        }
        let conditionals = self.conditionals;
        let default = self.default;
        Ok(Arc::new(move |data: &XmlData, control: Node, test: Node| {
            match conditionals
                .iter()
                .find(|(predicate, _)| predicate(data, control))
            {
                Some((_, selector)) => selector(data, control, test),
                None => default
                    .as_ref()
                    .map(|selector| selector(data, control, test))
                    .unwrap_or(false),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pair(control: &str, test: &str) -> (XmlData, Node, Node) {
        let mut data = XmlData::new();
        let control = data.parse(control).unwrap();
        let test = data.parse(test).unwrap();
        let control = data.document_element(control).unwrap();
        let test = data.document_element(test).unwrap();
        (data, control, test)
    }

    fn check(selector: &ElementSelector, control: &str, test: &str) -> bool {
        let (data, control, test) = pair(control, test);
        selector(&data, control, test)
    }

    #[rstest]
    #[case("<a/>", "<b/>", false)]
    #[case("<a/>", "<a>x</a>", true)]
    #[case(r#"<a xmlns="urn:x"/>"#, "<a/>", false)]
    #[case(r#"<p:a xmlns:p="urn:x"/>"#, r#"<q:a xmlns:q="urn:x"/>"#, true)]
    fn test_by_name(#[case] control: &str, #[case] test: &str, #[case] expected: bool) {
        assert_eq!(check(&by_name(), control, test), expected);
    }

    #[rstest]
    #[case("<a>x</a>", "<a>x</a>", true)]
    #[case("<a>x</a>", "<a><![CDATA[x]]></a>", true)]
    #[case("<a>x<b>y</b></a>", "<a>x</a>", true)]
    #[case("<a>x</a>", "<a>y</a>", false)]
    fn test_by_name_and_text(#[case] control: &str, #[case] test: &str, #[case] expected: bool) {
        assert_eq!(check(&by_name_and_text(), control, test), expected);
    }

    #[rstest]
    #[case(r#"<a id="1" x="1"/>"#, r#"<a id="1" x="2"/>"#, true)]
    #[case(r#"<a id="1"/>"#, r#"<a id="2"/>"#, false)]
    #[case(r#"<a/>"#, r#"<a/>"#, true)]
    #[case(r#"<a id="1"/>"#, r#"<a/>"#, false)]
    fn test_by_name_and_attributes(
        #[case] control: &str,
        #[case] test: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(check(&by_name_and_attributes(["id"]), control, test), expected);
    }

    #[test]
    fn test_by_name_and_attributes_control_ns() {
        let selector = by_name_and_attributes_control_ns(["id"]);
        assert!(check(
            &selector,
            r#"<p:a xmlns:p="urn:x" p:id="1" id="2"/>"#,
            r#"<p:a xmlns:p="urn:x" p:id="1" id="3"/>"#
        ));
        assert!(!check(
            &selector,
            r#"<p:a xmlns:p="urn:x" p:id="1"/>"#,
            r#"<p:a xmlns:p="urn:x" p:id="2"/>"#
        ));
    }

    #[rstest]
    #[case(r#"<a x="1" y="2"/>"#, r#"<a y="2" x="1"/>"#, true)]
    #[case(r#"<a x="1"/>"#, r#"<a x="1" y="2"/>"#, false)]
    #[case(r#"<a x="1"/>"#, r#"<a xmlns:p="urn:p" x="1"/>"#, true)]
    fn test_by_name_and_all_attributes(
        #[case] control: &str,
        #[case] test: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(check(&by_name_and_all_attributes(), control, test), expected);
    }

    #[test]
    fn test_combinators() {
        assert!(!check(&not(default()), "<a/>", "<a/>"));
        assert!(check(&or([by_name(), default()]), "<a/>", "<b/>"));
        assert!(!check(&and([by_name(), default()]), "<a/>", "<b/>"));
        assert!(check(&xor(by_name(), default()), "<a/>", "<b/>"));
        assert!(!check(&xor(by_name(), default()), "<a/>", "<a/>"));
    }

    #[test]
    fn test_selector_for_element_named() {
        let selector = selector_for_element_named(QName::local("a"), default());
        assert!(check(&selector, "<a/>", "<b/>"));
        assert!(!check(&selector, "<b/>", "<b/>"));
    }

    #[test]
    fn test_conditional_builder() {
        let selector = when_element_is_named(QName::local("a"))
            .then_use(by_name_and_text())
            .else_use(by_name())
            .unwrap()
            .build()
            .unwrap();
        assert!(!check(&selector, "<a>x</a>", "<a>y</a>"));
        assert!(check(&selector, "<b>x</b>", "<b>y</b>"));
        assert!(!check(&selector, "<b/>", "<c/>"));
    }

    #[test]
    fn test_conditional_builder_first_match_wins() {
        let selector = when_element_is_named(QName::local("a"))
            .then_use(default())
            .when_element_is_named(QName::local("a"))
            .then_use(not(default()))
            .build()
            .unwrap();
        assert!(check(&selector, "<a/>", "<b/>"));
        // no default selector
        assert!(!check(&selector, "<b/>", "<b/>"));
    }

    #[test]
    fn test_conditional_builder_errors() {
        let builder = ConditionalSelectorBuilder::new().else_use(default()).unwrap();
        assert!(builder.else_use(default()).is_err());
        let pending = ConditionalSelectorBuilder::new()
            .when(Arc::new(|_: &XmlData, _: Node| true))
            .builder;
        assert!(matches!(
            pending.build(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_by_xpath() {
        let selector = by_xpath("./b", &HashMap::default(), by_name_and_text()).unwrap();
        assert!(check(
            &selector,
            "<a><b>1</b><b>2</b></a>",
            "<a><b>2</b><b>1</b></a>"
        ));
        assert!(!check(
            &selector,
            "<a><b>1</b><b>2</b></a>",
            "<a><b>2</b><b>3</b></a>"
        ));
        assert!(by_xpath("./b[", &HashMap::default(), default()).is_err());
    }

    #[rstest]
    #[case("<a><b>x</b></a>", "<a><b>x</b></a>", true)]
    #[case("<a><b>x</b></a>", "<a><b>y</b></a>", false)]
    #[case("<a><b>x</b></a>", "<a><c>x</c></a>", false)]
    #[case("<a><b>x</b></a>", "<a><b>x</b><b/></a>", false)]
    #[case("<a><b><![CDATA[x]]></b></a>", "<a><b>x</b></a>", true)]
    #[case("<a>x<b>y</b></a>", "<a><b>y</b>x</a>", true)]
    #[case("<a>x<![CDATA[y]]></a>", "<a>xy</a>", true)]
    #[case("<a>x<b>y</b></a>", "<a><b>y</b>z</a>", false)]
    #[case("<a><b/><!--c--></a>", "<a><!--c--><b/></a>", false)]
    fn test_by_name_and_text_recursive(
        #[case] control: &str,
        #[case] test: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(
            check(&by_name_and_text_recursive(), control, test),
            expected
        );
    }

    #[test]
    fn test_multi_level_by_name_and_text() {
        let selector = multi_level_by_name_and_text(2, false).unwrap();
        assert!(check(&selector, "<a><b>x</b></a>", "<a><b>x</b></a>"));
        assert!(!check(&selector, "<a><b>x</b></a>", "<a><b>y</b></a>"));
        assert!(!check(&selector, "<a> <b>x</b></a>", "<a><b>x</b></a>"));

        let selector = multi_level_by_name_and_text(2, true).unwrap();
        assert!(check(&selector, "<a> <b>x</b></a>", "<a><b>x</b></a>"));
        assert!(!check(&selector, "<a><b> </b></a>", "<a><b/></a>"));

        let selector = multi_level_by_name_and_text(1, false).unwrap();
        assert!(!check(&selector, "<a>x</a>", "<a>y</a>"));

        assert!(matches!(
            multi_level_by_name_and_text(0, false),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
