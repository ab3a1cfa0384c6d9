//! Pairing of control and test children.

use std::fmt;
use std::sync::Arc;

use ahash::HashSet;

use crate::selector::{self, ElementSelector};
use crate::xmldata::{Node, XmlData};
use crate::xmlvalue::NodeType;

/// Decides whether nodes of two types may be paired.
pub type NodeTypeMatcher = Arc<dyn Fn(NodeType, NodeType) -> bool + Send + Sync>;

/// Pairs up control and test nodes.
///
/// The result doesn't have to cover all nodes; whatever isn't paired is
/// reported by the engine as missing on the other side.
pub trait NodeMatcher: Send + Sync {
    /// Pair nodes from `control` with nodes from `test`. No node may occur
    /// in more than one pair.
    fn match_nodes(&self, data: &XmlData, control: &[Node], test: &[Node]) -> Vec<(Node, Node)>;
}

/// Identical types match, and so do text and CDATA.
pub fn default_node_type_matcher() -> NodeTypeMatcher {
    Arc::new(|control: NodeType, test: NodeType| {
        control == test || (control.is_text() && test.is_text())
    })
}

/// The standard matcher.
///
/// For each control node in order the test nodes are searched for the
/// first unpaired candidate, starting right after the previous match and
/// wrapping around to the start. Element selectors are tried in order of
/// priority: the next selector is only consulted when the previous one
/// finds no candidate anywhere. Other nodes are candidates if the node type
/// matcher accepts them.
#[derive(Clone)]
pub struct DefaultNodeMatcher {
    selectors: Vec<ElementSelector>,
    node_type_matcher: NodeTypeMatcher,
}

impl fmt::Debug for DefaultNodeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultNodeMatcher")
            .field("selectors", &self.selectors.len())
            .finish()
    }
}

impl Default for DefaultNodeMatcher {
    fn default() -> Self {
        DefaultNodeMatcher::new([selector::default()])
    }
}

impl DefaultNodeMatcher {
    /// A matcher using the given element selectors. Without any selector
    /// elements are paired in document order.
    pub fn new(selectors: impl IntoIterator<Item = ElementSelector>) -> Self {
        let mut selectors = selectors.into_iter().collect::<Vec<_>>();
        if selectors.is_empty() {
            selectors.push(selector::default());
        }
        DefaultNodeMatcher {
            selectors,
            node_type_matcher: default_node_type_matcher(),
        }
    }

    /// Replace the node type matcher.
    pub fn with_node_type_matcher(mut self, node_type_matcher: NodeTypeMatcher) -> Self {
        self.node_type_matcher = node_type_matcher;
        self
    }

    fn can_be_paired(
        &self,
        data: &XmlData,
        selector: &ElementSelector,
        control: Node,
        test: Node,
    ) -> bool {
        let control_type = data.node_type(control);
        let test_type = data.node_type(test);
        if control_type == NodeType::Element && test_type == NodeType::Element {
            selector(data, control, test)
        } else {
            (self.node_type_matcher)(control_type, test_type)
        }
    }

    fn find_match(
        &self,
        data: &XmlData,
        control: Node,
        test: &[Node],
        used: &HashSet<usize>,
        last_match: Option<usize>,
    ) -> Option<usize> {
        let start = last_match.map(|index| index + 1).unwrap_or(0);
        self.selectors.iter().find_map(|selector| {
            (start..test.len())
                .chain(0..start.min(test.len()))
                .filter(|index| !used.contains(index))
                .find(|index| self.can_be_paired(data, selector, control, test[*index]))
        })
    }
}

impl NodeMatcher for DefaultNodeMatcher {
    fn match_nodes(&self, data: &XmlData, control: &[Node], test: &[Node]) -> Vec<(Node, Node)> {
        let mut pairs = Vec::new();
        let mut used = HashSet::default();
        let mut last_match = None;
        for control_node in control {
            if let Some(index) = self.find_match(data, *control_node, test, &used, last_match) {
                used.insert(index);
                last_match = Some(index);
                pairs.push((*control_node, test[index]));
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn children(data: &mut XmlData, xml: &str) -> Vec<Node> {
        let root = data.parse(xml).unwrap();
        let element = data.document_element(root).unwrap();
        data.children(element).collect()
    }

    fn local_names(data: &XmlData, pairs: &[(Node, Node)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(c, t)| {
                (
                    data.node_name(*c).local_name().to_string(),
                    data.node_name(*t).local_name().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_document_order() {
        let mut data = XmlData::new();
        let control = children(&mut data, "<r><a/><b/></r>");
        let test = children(&mut data, "<r><b/><a/></r>");
        let pairs = DefaultNodeMatcher::default().match_nodes(&data, &control, &test);
        assert_eq!(
            local_names(&data, &pairs),
            vec![
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "a".to_string())
            ]
        );
    }

    #[test]
    fn test_by_name_wraps_around() {
        let mut data = XmlData::new();
        let control = children(&mut data, "<r><c/><a/><b/></r>");
        let test = children(&mut data, "<r><a/><b/><c/></r>");
        let pairs = DefaultNodeMatcher::new([selector::by_name()]).match_nodes(&data, &control, &test);
        assert_eq!(
            local_names(&data, &pairs),
            vec![
                ("c".to_string(), "c".to_string()),
                ("a".to_string(), "a".to_string()),
                ("b".to_string(), "b".to_string())
            ]
        );
    }

    #[test]
    fn test_unmatched_are_left_out() {
        let mut data = XmlData::new();
        let control = children(&mut data, "<r><a/><x/></r>");
        let test = children(&mut data, "<r><a/><y/>text</r>");
        let pairs = DefaultNodeMatcher::new([selector::by_name()]).match_nodes(&data, &control, &test);
        assert_eq!(
            local_names(&data, &pairs),
            vec![("a".to_string(), "a".to_string())]
        );
    }

    #[test]
    fn test_text_and_cdata_pair() {
        let mut data = XmlData::new();
        let control = children(&mut data, "<r>x<!--c--></r>");
        let test = children(&mut data, "<r><!--c--><![CDATA[x]]></r>");
        let pairs = DefaultNodeMatcher::default().match_nodes(&data, &control, &test);
        assert_eq!(pairs.len(), 2);
        assert_eq!(data.node_type(pairs[0].1), NodeType::CData);
        assert_eq!(data.node_type(pairs[1].1), NodeType::Comment);

        let strict = DefaultNodeMatcher::default()
            .with_node_type_matcher(Arc::new(|c: NodeType, t: NodeType| c == t));
        let pairs = strict.match_nodes(&data, &control, &test);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_later_selector_used_as_fallback() {
        let mut data = XmlData::new();
        let control = children(&mut data, r#"<r><a id="1"/><b/></r>"#);
        let test = children(&mut data, r#"<r><b/><a id="2"/></r>"#);
        let matcher = DefaultNodeMatcher::new([
            selector::by_name_and_attributes(["id"]),
            selector::by_name(),
        ]);
        let pairs = matcher.match_nodes(&data, &control, &test);
        assert_eq!(
            local_names(&data, &pairs),
            vec![
                ("a".to_string(), "a".to_string()),
                ("b".to_string(), "b".to_string())
            ]
        );
    }

    #[test]
    fn test_earlier_selector_takes_priority() {
        let mut data = XmlData::new();
        let control = children(&mut data, r#"<r><a id="1"/></r>"#);
        let test = children(&mut data, r#"<r><a id="2"/><a id="1"/></r>"#);
        let matcher = DefaultNodeMatcher::new([
            selector::by_name_and_attributes(["id"]),
            selector::by_name(),
        ]);
        let pairs = matcher.match_nodes(&data, &control, &test);
        assert_eq!(pairs, vec![(control[0], test[1])]);
    }

    #[test]
    fn test_deterministic() {
        let mut data = XmlData::new();
        let control = children(&mut data, "<r><a/><a/><b/><a/></r>");
        let test = children(&mut data, "<r><a/><b/><a/><a/></r>");
        let matcher = DefaultNodeMatcher::new([selector::by_name()]);
        let first = matcher.match_nodes(&data, &control, &test);
        for _ in 0..10 {
            assert_eq!(matcher.match_nodes(&data, &control, &test), first);
        }
    }
}
