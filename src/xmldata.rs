use indextree::{Arena, NodeId};

use crate::error::Error;
use crate::name::{QName, XMLNS_NAMESPACE, XML_NAMESPACE};
use crate::xmlvalue::{
    Attribute, Declaration, DocumentType, Element, NodeType, ProcessingInstruction, Value,
};

pub(crate) type XmlArena = Arena<Value>;

/// A node in the XML tree.
/// This is a lightweight value and can be copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node(NodeId);

impl Node {
    #[inline]
    pub(crate) fn new(node_id: NodeId) -> Self {
        Node(node_id)
    }

    #[inline]
    pub(crate) fn get(&self) -> NodeId {
        self.0
    }
}

/// `XmlData` holds the nodes of one or more XML documents.
///
/// Both sides of a comparison typically live in the same `XmlData`, but
/// they're independent trees. Nodes are never shared between trees.
pub struct XmlData {
    pub(crate) arena: XmlArena,
}

/// ## Read-only access
impl XmlData {
    /// Create an empty store.
    pub fn new() -> Self {
        XmlData {
            arena: XmlArena::new(),
        }
    }

    #[inline]
    pub(crate) fn arena(&self) -> &XmlArena {
        &self.arena
    }

    /// The value of a node.
    #[inline]
    pub fn value(&self, node: Node) -> &Value {
        self.arena[node.0].get()
    }

    /// Mutable access to the value of a node.
    #[inline]
    pub fn value_mut(&mut self, node: Node) -> &mut Value {
        self.arena[node.0].get_mut()
    }

    /// The type of a node.
    #[inline]
    pub fn node_type(&self, node: Node) -> NodeType {
        self.value(node).node_type()
    }

    /// Get parent node.
    ///
    /// Attributes have their element as parent even though they're not
    /// among its children.
    pub fn parent(&self, node: Node) -> Option<Node> {
        self.arena[node.0].parent().map(Node::new)
    }

    /// Iterator over ancestor nodes, including this one.
    pub fn ancestors(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.0.ancestors(self.arena()).map(Node::new)
    }

    /// Iterator over the child nodes of this node.
    ///
    /// Attribute nodes aren't considered child nodes.
    pub fn children(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.0
            .children(self.arena())
            .filter(|n| !matches!(self.arena[*n].get(), Value::Attribute(_)))
            .map(Node::new)
    }

    /// Iterator over the attribute nodes of an element, in document order.
    ///
    /// Namespace declarations are included; they're in the
    /// [`XMLNS_NAMESPACE`] namespace.
    pub fn attributes(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.0
            .children(self.arena())
            .filter(|n| matches!(self.arena[*n].get(), Value::Attribute(_)))
            .map(Node::new)
    }

    /// Get first child.
    pub fn first_child(&self, node: Node) -> Option<Node> {
        self.children(node).next()
    }

    /// Get next sibling, skipping attributes.
    pub fn next_sibling(&self, node: Node) -> Option<Node> {
        node.0
            .following_siblings(self.arena())
            .skip(1)
            .find(|n| !matches!(self.arena[*n].get(), Value::Attribute(_)))
            .map(Node::new)
    }

    /// Iterator over this node and its descendants in document order.
    ///
    /// Attributes aren't included.
    pub fn descendants(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.0
            .descendants(self.arena())
            .filter(|n| !matches!(self.arena[*n].get(), Value::Attribute(_)))
            .map(Node::new)
    }

    /// Obtain the document element from the document node.
    pub fn document_element(&self, node: Node) -> Option<Node> {
        self.children(node)
            .find(|n| self.node_type(*n) == NodeType::Element)
    }

    /// The document type declaration of a document, if any.
    pub fn doctype(&self, document: Node) -> Option<Node> {
        self.children(document)
            .find(|n| self.node_type(*n) == NodeType::DocumentType)
    }

    /// The XML declaration of a document, if any. It's always the first child.
    pub fn declaration(&self, document: Node) -> Option<Node> {
        self.first_child(document)
            .filter(|n| self.node_type(*n) == NodeType::Declaration)
    }

    /// The element value, if this node is an element.
    pub fn element(&self, node: Node) -> Option<&Element> {
        match self.value(node) {
            Value::Element(element) => Some(element),
            _ => None,
        }
    }

    /// The attribute value, if this node is an attribute.
    pub fn attribute(&self, node: Node) -> Option<&Attribute> {
        match self.value(node) {
            Value::Attribute(attribute) => Some(attribute),
            _ => None,
        }
    }

    /// The text of a text, CDATA or comment node.
    pub fn text_str(&self, node: Node) -> Option<&str> {
        self.value(node).character_data()
    }

    /// Name of an element or attribute.
    pub fn name(&self, node: Node) -> Option<&QName> {
        match self.value(node) {
            Value::Element(element) => Some(element.name()),
            Value::Attribute(attribute) => Some(attribute.name()),
            _ => None,
        }
    }

    /// A name for any node.
    ///
    /// Elements and attributes give their qualified name, other nodes a
    /// fixed name like `#text`. Processing instructions are named after
    /// their target and document types after the element they declare.
    pub fn node_name(&self, node: Node) -> QName {
        match self.value(node) {
            Value::Document => QName::local("#document"),
            Value::DocumentType(doctype) => QName::local(doctype.name()),
            Value::Declaration(_) => QName::local("xml"),
            Value::Element(element) => element.name().clone(),
            Value::Attribute(attribute) => attribute.name().clone(),
            Value::Text(_) => QName::local("#text"),
            Value::CData(_) => QName::local("#cdata-section"),
            Value::Comment(_) => QName::local("#comment"),
            Value::ProcessingInstruction(pi) => QName::local(pi.target()),
        }
    }

    /// Namespace URI of an element or attribute; empty for everything else.
    pub fn namespace_uri(&self, node: Node) -> &str {
        self.name(node).map(|name| name.namespace()).unwrap_or("")
    }

    /// Prefix of an element or attribute; empty for everything else.
    pub fn prefix(&self, node: Node) -> &str {
        match self.value(node) {
            Value::Element(element) => element.prefix(),
            Value::Attribute(attribute) => attribute.prefix(),
            _ => "",
        }
    }

    /// Resolve a prefix in scope at `node`.
    ///
    /// `None` asks for the default namespace. Attributes resolve through
    /// their element. Returns `None` if the prefix isn't declared.
    pub fn lookup_namespace_uri(&self, node: Node, prefix: Option<&str>) -> Option<String> {
        match prefix {
            Some("xml") => return Some(XML_NAMESPACE.to_string()),
            Some("xmlns") => return Some(XMLNS_NAMESPACE.to_string()),
            _ => {}
        }
        let wanted = QName::new(XMLNS_NAMESPACE, prefix.unwrap_or("xmlns"));
        for ancestor in self.ancestors(node) {
            if self.node_type(ancestor) != NodeType::Element {
                continue;
            }
            for attribute in self.attributes(ancestor) {
                if let Some(attribute) = self.attribute(attribute) {
                    if attribute.name() == &wanted {
                        let uri = attribute.value();
                        // xmlns="" undeclares the default namespace
                        return if uri.is_empty() {
                            None
                        } else {
                            Some(uri.to_string())
                        };
                    }
                }
            }
        }
        None
    }

    /// Find an attribute node of an element by name.
    pub fn attribute_node(&self, element: Node, name: &QName) -> Option<Node> {
        self.attributes(element)
            .find(|a| self.attribute(*a).map(|a| a.name() == name).unwrap_or(false))
    }

    /// Get an attribute value of an element by name.
    pub fn attribute_value(&self, element: Node, name: &QName) -> Option<&str> {
        self.attribute_node(element, name)
            .and_then(|a| self.attribute(a))
            .map(|a| a.value())
    }

    /// Attributes of an element as name/value pairs, without namespace
    /// declarations.
    pub fn attribute_map(&self, element: Node) -> ahash::HashMap<QName, String> {
        self.attributes(element)
            .filter_map(|a| self.attribute(a))
            .filter(|a| a.name().namespace() != XMLNS_NAMESPACE)
            .map(|a| (a.name().clone(), a.value().to_string()))
            .collect()
    }

    /// The direct text and CDATA children of a node, concatenated.
    pub fn merged_nested_text(&self, node: Node) -> String {
        self.children(node)
            .filter_map(|child| match self.value(child) {
                Value::Text(text) | Value::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// ## Creation and manipulation
impl XmlData {
    fn new_node(&mut self, value: Value) -> Node {
        Node::new(self.arena.new_node(value))
    }

    /// Create an unattached document node.
    pub fn new_document(&mut self) -> Node {
        self.new_node(Value::Document)
    }

    /// Create an unattached element.
    pub fn new_element(&mut self, name: QName, prefix: impl Into<String>) -> Node {
        self.new_node(Value::Element(Element::new(name, prefix.into())))
    }

    /// Create an unattached attribute; append it to an element to use it.
    pub fn new_attribute(
        &mut self,
        name: QName,
        prefix: impl Into<String>,
        value: impl Into<String>,
    ) -> Node {
        self.new_node(Value::Attribute(Attribute::new(
            name,
            prefix.into(),
            value.into(),
        )))
    }

    /// Create a text node.
    pub fn new_text(&mut self, text: impl Into<String>) -> Node {
        self.new_node(Value::Text(text.into()))
    }

    /// Create a CDATA section.
    pub fn new_cdata(&mut self, text: impl Into<String>) -> Node {
        self.new_node(Value::CData(text.into()))
    }

    /// Create a comment.
    pub fn new_comment(&mut self, text: impl Into<String>) -> Node {
        self.new_node(Value::Comment(text.into()))
    }

    /// Create a processing instruction.
    pub fn new_processing_instruction(
        &mut self,
        target: impl Into<String>,
        data: Option<String>,
    ) -> Node {
        self.new_node(Value::ProcessingInstruction(ProcessingInstruction::new(
            target.into(),
            data,
        )))
    }

    /// Create a document type declaration.
    pub fn new_doctype(
        &mut self,
        name: impl Into<String>,
        public_id: Option<String>,
        system_id: Option<String>,
    ) -> Node {
        self.new_node(Value::DocumentType(DocumentType::new(
            name.into(),
            public_id,
            system_id,
        )))
    }

    /// Create an XML declaration.
    pub fn new_declaration(
        &mut self,
        version: impl Into<String>,
        encoding: Option<String>,
        standalone: Option<bool>,
    ) -> Node {
        self.new_node(Value::Declaration(Declaration::new(
            version.into(),
            encoding,
            standalone,
        )))
    }

    /// Append a node to a parent.
    ///
    /// Only documents and elements hold children, only elements hold
    /// attributes. Attributes are kept ahead of normal children.
    pub fn append(&mut self, parent: Node, child: Node) -> Result<(), Error> {
        let parent_type = self.node_type(parent);
        let child_type = self.node_type(child);
        let allowed = match child_type {
            NodeType::Attribute => parent_type == NodeType::Element,
            NodeType::Document => false,
            NodeType::DocumentType | NodeType::Declaration => parent_type == NodeType::Document,
            NodeType::Text | NodeType::CData => parent_type == NodeType::Element,
            _ => matches!(parent_type, NodeType::Element | NodeType::Document),
        };
        if !allowed {
            return Err(Error::InvalidAppend(parent));
        }
        if child_type == NodeType::Attribute {
            if let Some(first) = self.first_child(parent) {
                first.0.insert_before(child.0, &mut self.arena);
                return Ok(());
            }
        }
        parent.0.append(child.0, &mut self.arena);
        Ok(())
    }

    /// Detach a node and everything below it.
    pub fn remove(&mut self, node: Node) {
        node.0.remove_subtree(&mut self.arena);
    }

    /// Replace the character data of a text, CDATA or comment node.
    pub fn set_text(&mut self, node: Node, text: impl Into<String>) {
        match self.value_mut(node) {
            Value::Text(t) | Value::CData(t) | Value::Comment(t) => *t = text.into(),
            _ => {}
        }
    }

    /// Copy a node and its subtree, including attributes. The copy is
    /// unattached.
    pub fn deep_copy(&mut self, node: Node) -> Node {
        let copy = self.new_node(self.value(node).clone());
        let children = node.0.children(self.arena()).collect::<Vec<_>>();
        for child in children {
            let child_copy = self.deep_copy(Node::new(child));
            copy.0.append(child_copy.0, &mut self.arena);
        }
        copy
    }
}

impl Default for XmlData {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_are_not_children() {
        let mut data = XmlData::new();
        let root = data.parse(r#"<a x="1"><b/></a>"#).unwrap();
        let a = data.document_element(root).unwrap();
        assert_eq!(data.children(a).count(), 1);
        assert_eq!(data.attributes(a).count(), 1);
    }

    #[test]
    fn test_append_attribute_after_children() {
        let mut data = XmlData::new();
        let a = data.new_element(QName::local("a"), "");
        let b = data.new_element(QName::local("b"), "");
        data.append(a, b).unwrap();
        let x = data.new_attribute(QName::local("x"), "", "1");
        data.append(a, x).unwrap();
        assert_eq!(data.first_child(a), Some(b));
        assert_eq!(data.attributes(a).collect::<Vec<_>>(), vec![x]);
        assert_eq!(data.next_sibling(b), None);
    }

    #[test]
    fn test_append_text_to_document_fails() {
        let mut data = XmlData::new();
        let doc = data.new_document();
        let text = data.new_text("x");
        assert!(matches!(data.append(doc, text), Err(Error::InvalidAppend(_))));
    }

    #[test]
    fn test_lookup_namespace_uri() {
        let mut data = XmlData::new();
        let root = data
            .parse(r#"<a xmlns="urn:d" xmlns:p="urn:p"><b xmlns=""/></a>"#)
            .unwrap();
        let a = data.document_element(root).unwrap();
        let b = data.first_child(a).unwrap();
        assert_eq!(data.lookup_namespace_uri(a, None).as_deref(), Some("urn:d"));
        assert_eq!(data.lookup_namespace_uri(b, Some("p")).as_deref(), Some("urn:p"));
        assert_eq!(data.lookup_namespace_uri(b, None), None);
        assert_eq!(
            data.lookup_namespace_uri(b, Some("xml")).as_deref(),
            Some(XML_NAMESPACE)
        );
    }

    #[test]
    fn test_merged_nested_text() {
        let mut data = XmlData::new();
        let root = data
            .parse(r#"<a>x<!--c--><![CDATA[y]]><b>z</b></a>"#)
            .unwrap();
        let a = data.document_element(root).unwrap();
        assert_eq!(data.merged_nested_text(a), "xy");
    }

    #[test]
    fn test_deep_copy() {
        let mut data = XmlData::new();
        let root = data.parse(r#"<a x="1"><b>t</b></a>"#).unwrap();
        let a = data.document_element(root).unwrap();
        let copy = data.deep_copy(a);
        assert_ne!(copy, a);
        assert_eq!(data.parent(copy), None);
        assert_eq!(
            data.attribute_value(copy, &QName::local("x")),
            Some("1")
        );
        let b = data.first_child(copy).unwrap();
        assert_eq!(data.merged_nested_text(b), "t");
    }
}
