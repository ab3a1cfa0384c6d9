//! Tracks the XPath of the node currently being compared.
//!
//! Every level of the traversal caches its own expression fragment
//! (`foo[3]`, `text()[2]`, `@bar`) and, once asked, its full XPath. The
//! children and attributes of a level are registered up front so that
//! navigating to them is a cheap push.

use std::cell::OnceCell;

use ahash::HashMap;

use crate::error::Error;
use crate::name::QName;
use crate::xmldata::{Node, XmlData};
use crate::xmlvalue::NodeType;

const COMMENT: &str = "comment()";
const PI: &str = "processing-instruction()";
const TEXT: &str = "text()";
const DOCTYPE: &str = "doctype()";
const DECLARATION: &str = "xml-declaration()";
const SEP: &str = "/";
const ATTR: &str = "@";

/// The minimal description of a node the path context needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    name: QName,
    node_type: NodeType,
}

impl NodeInfo {
    /// Describe a node by name and type.
    pub fn new(name: QName, node_type: NodeType) -> Self {
        NodeInfo { name, node_type }
    }

    /// Describe a node of a tree.
    pub fn from_node(data: &XmlData, node: Node) -> Self {
        NodeInfo::new(data.node_name(node), data.node_type(node))
    }

    /// The node's name.
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// The node's type.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }
}

#[derive(Debug, Clone)]
struct Level {
    expression: String,
    xpath: OnceCell<String>,
    children: Vec<Level>,
    attributes: HashMap<QName, Level>,
}

impl Level {
    fn new(expression: String) -> Self {
        Level {
            expression,
            xpath: OnceCell::new(),
            children: Vec::new(),
            attributes: HashMap::default(),
        }
    }

    // a fresh copy for pushing onto the path; registered grandchildren
    // don't travel along
    fn enter(&self) -> Self {
        Level::new(self.expression.clone())
    }
}

/// A cursor over one side of a comparison that knows the XPath of the
/// node it points to.
///
/// Cloning copies the whole level stack, so a clone can be navigated
/// without affecting the original.
#[derive(Debug, Clone)]
pub struct XPathContext {
    path: Vec<Level>,
    uri_to_prefix: HashMap<String, String>,
}

impl XPathContext {
    /// Create a context positioned at the document root.
    pub fn new() -> Self {
        Self::with_namespaces(&HashMap::default())
    }

    /// Create a context positioned at the document root, rendering names in
    /// the given namespaces with the given prefixes.
    ///
    /// `prefix_to_uri` maps prefixes to namespace URIs.
    pub fn with_namespaces(prefix_to_uri: &HashMap<String, String>) -> Self {
        let uri_to_prefix = prefix_to_uri
            .iter()
            .map(|(prefix, uri)| (uri.clone(), prefix.clone()))
            .collect();
        XPathContext {
            path: vec![Level::new(String::new())],
            uri_to_prefix,
        }
    }

    /// Create a context positioned at `root`, which may sit anywhere in its
    /// tree: the path from the top of the tree down to it is registered and
    /// walked.
    pub fn for_node(prefix_to_uri: &HashMap<String, String>, data: &XmlData, root: Node) -> Self {
        let mut context = Self::with_namespaces(prefix_to_uri);
        let mut root_to_node = data.ancestors(root).collect::<Vec<_>>();
        root_to_node.reverse();
        for node in root_to_node {
            context.set_children([NodeInfo::from_node(data, node)]);
            // the single child registered above is always there
            let level = context.current().children[0].enter();
            context.path.push(level);
        }
        context
    }

    fn current(&self) -> &Level {
        // the root level is never popped
        &self.path[self.path.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Level {
        let last = self.path.len() - 1;
        &mut self.path[last]
    }

    /// Move to the child at `index` among the registered children.
    pub fn navigate_to_child(&mut self, index: usize) -> Result<(), Error> {
        let level = self
            .current()
            .children
            .get(index)
            .map(Level::enter)
            .ok_or_else(|| {
                Error::Navigation(format!(
                    "no child {} registered at {}",
                    index,
                    self.xpath()
                ))
            })?;
        self.path.push(level);
        Ok(())
    }

    /// Move to a registered attribute of the current node.
    pub fn navigate_to_attribute(&mut self, name: &QName) -> Result<(), Error> {
        let level = self
            .current()
            .attributes
            .get(name)
            .map(Level::enter)
            .ok_or_else(|| {
                Error::Navigation(format!(
                    "no attribute {} registered at {}",
                    name,
                    self.xpath()
                ))
            })?;
        self.path.push(level);
        Ok(())
    }

    /// Move back up one level.
    pub fn navigate_to_parent(&mut self) -> Result<(), Error> {
        if self.path.len() <= 1 {
            return Err(Error::Navigation(
                "cannot navigate above the root".to_string(),
            ));
        }
        self.path.pop();
        Ok(())
    }

    /// Register an attribute of the current node.
    pub fn add_attribute(&mut self, name: QName) {
        let expression = format!("{}{}", ATTR, self.render_name(&name));
        self.current_mut()
            .attributes
            .insert(name, Level::new(expression));
    }

    /// Register several attributes of the current node.
    pub fn add_attributes(&mut self, names: impl IntoIterator<Item = QName>) {
        for name in names {
            self.add_attribute(name);
        }
    }

    /// Replace the registered children of the current node.
    pub fn set_children(&mut self, children: impl IntoIterator<Item = NodeInfo>) {
        self.current_mut().children.clear();
        self.append_children(children);
    }

    /// Register more children after the ones already known.
    ///
    /// Positional counters continue where the existing children left off.
    pub fn append_children(&mut self, children: impl IntoIterator<Item = NodeInfo>) {
        let mut comments = 0usize;
        let mut pis = 0usize;
        let mut texts = 0usize;
        let mut elements: HashMap<String, usize> = HashMap::default();
        for level in &self.current().children {
            let expression = &level.expression;
            if expression.starts_with(COMMENT) {
                comments += 1;
            } else if expression.starts_with(PI) {
                pis += 1;
            } else if expression.starts_with(TEXT) {
                texts += 1;
            } else if let Some(open) = expression.find('[') {
                *elements.entry(expression[..open].to_string()).or_default() += 1;
            }
        }

        let mut new_levels = Vec::new();
        for child in children {
            let expression = match child.node_type {
                NodeType::Comment => {
                    comments += 1;
                    format!("{}[{}]", COMMENT, comments)
                }
                NodeType::ProcessingInstruction => {
                    pis += 1;
                    format!("{}[{}]", PI, pis)
                }
                NodeType::Text | NodeType::CData => {
                    texts += 1;
                    format!("{}[{}]", TEXT, texts)
                }
                NodeType::Element => {
                    let name = self.render_name(&child.name);
                    let count = elements.entry(name.clone()).or_default();
                    *count += 1;
                    format!("{}[{}]", name, count)
                }
                // at most one of each per document
                NodeType::DocumentType => DOCTYPE.to_string(),
                NodeType::Declaration => DECLARATION.to_string(),
                // never a child
                NodeType::Document | NodeType::Attribute => String::new(),
            };
            new_levels.push(Level::new(expression));
        }
        self.current_mut().children.extend(new_levels);
    }

    /// The XPath of the current node.
    pub fn xpath(&self) -> String {
        Self::xpath_of(&self.path).to_string()
    }

    /// The XPath of the parent of the current node.
    pub fn parent_xpath(&self) -> String {
        Self::xpath_of(&self.path[..self.path.len() - 1]).to_string()
    }

    fn xpath_of(levels: &[Level]) -> &str {
        match levels.split_last() {
            None => "",
            Some((last, rest)) => last.xpath.get_or_init(|| {
                let previous = Self::xpath_of(rest);
                if previous == SEP {
                    format!("{}{}", previous, last.expression)
                } else {
                    format!("{}{}{}", previous, SEP, last.expression)
                }
            }),
        }
    }

    fn render_name(&self, name: &QName) -> String {
        match self
            .uri_to_prefix
            .get(name.namespace())
            .filter(|_| name.has_namespace())
        {
            Some(prefix) => format!("{}:{}", prefix, name.local_name()),
            None => name.local_name().to_string(),
        }
    }
}

impl Default for XPathContext {
    fn default() -> Self {
        Self::new()
    }
}
