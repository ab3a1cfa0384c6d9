use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};

use indextree::NodeEdge;

use crate::name::XMLNS_NAMESPACE;
use crate::xmldata::{Node, XmlData};
use crate::xmlvalue::Value;

fn escape<'a>(text: &'a str, quote: bool) -> Cow<'a, str> {
    let needs_escape = |c: char| matches!(c, '&' | '<' | '>') || (quote && c == '"');
    if !text.chars().any(needs_escape) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if quote => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Displays a node as XML. Obtain it with [`XmlData::display`].
pub struct XmlDisplay<'a> {
    data: &'a XmlData,
    node: Node,
}

impl<'a> XmlDisplay<'a> {
    fn qualified(&self, node: Node) -> String {
        let local = self.data.node_name(node).local_name().to_string();
        match self.data.prefix(node) {
            "" => local,
            prefix => format!("{}:{}", prefix, local),
        }
    }

    fn attribute(&self, f: &mut Formatter<'_>, node: Node) -> fmt::Result {
        let Some(attribute) = self.data.attribute(node) else {
            return Ok(());
        };
        let name = attribute.name();
        if name.namespace() == XMLNS_NAMESPACE {
            if attribute.prefix().is_empty() {
                write!(f, "xmlns")?;
            } else {
                write!(f, "xmlns:{}", name.local_name())?;
            }
        } else {
            write!(f, "{}", self.qualified(node))?;
        }
        write!(f, "=\"{}\"", escape(attribute.value(), true))
    }

    fn start(&self, f: &mut Formatter<'_>, node: Node) -> fmt::Result {
        match self.data.value(node) {
            Value::Document | Value::Attribute(_) => Ok(()),
            Value::Declaration(declaration) => {
                write!(f, "<?xml version=\"{}\"", declaration.version())?;
                if let Some(encoding) = declaration.encoding() {
                    write!(f, " encoding=\"{}\"", encoding)?;
                }
                if let Some(standalone) = declaration.standalone() {
                    write!(f, " standalone=\"{}\"", if standalone { "yes" } else { "no" })?;
                }
                write!(f, "?>")
            }
            Value::DocumentType(doctype) => {
                write!(f, "<!DOCTYPE {}", doctype.name())?;
                match (doctype.public_id(), doctype.system_id()) {
                    (Some(public_id), Some(system_id)) => {
                        write!(f, " PUBLIC \"{}\" \"{}\"", public_id, system_id)?
                    }
                    (None, Some(system_id)) => write!(f, " SYSTEM \"{}\"", system_id)?,
                    _ => {}
                }
                write!(f, ">")
            }
            Value::Element(_) => {
                write!(f, "<{}", self.qualified(node))?;
                for attribute in self.data.attributes(node) {
                    write!(f, " ")?;
                    self.attribute(f, attribute)?;
                }
                if self.data.first_child(node).is_none() {
                    write!(f, "/>")
                } else {
                    write!(f, ">")
                }
            }
            Value::Text(text) => write!(f, "{}", escape(text, false)),
            Value::CData(text) => write!(f, "<![CDATA[{}]]>", text),
            Value::Comment(text) => write!(f, "<!--{}-->", text),
            Value::ProcessingInstruction(pi) => match pi.data() {
                Some(data) => write!(f, "<?{} {}?>", pi.target(), data),
                None => write!(f, "<?{}?>", pi.target()),
            },
        }
    }

    fn end(&self, f: &mut Formatter<'_>, node: Node) -> fmt::Result {
        if let Value::Element(_) = self.data.value(node) {
            if self.data.first_child(node).is_some() {
                write!(f, "</{}>", self.qualified(node))?;
            }
        }
        Ok(())
    }
}

impl<'a> Display for XmlDisplay<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.data.attribute(self.node).is_some() {
            return self.attribute(f, self.node);
        }
        let mut inside_attribute = None;
        for edge in self.node.get().traverse(self.data.arena()) {
            match edge {
                NodeEdge::Start(node_id) => {
                    let node = Node::new(node_id);
                    if inside_attribute.is_some() {
                        continue;
                    }
                    if self.data.attribute(node).is_some() {
                        inside_attribute = Some(node);
                        continue;
                    }
                    self.start(f, node)?;
                }
                NodeEdge::End(node_id) => {
                    let node = Node::new(node_id);
                    if inside_attribute == Some(node) {
                        inside_attribute = None;
                        continue;
                    }
                    self.end(f, node)?;
                }
            }
        }
        Ok(())
    }
}

/// ## Serialization
impl XmlData {
    /// Display a node and everything below it as XML.
    ///
    /// Namespace declarations are written where they were declared, so a
    /// node taken out of its document may use prefixes it doesn't declare.
    pub fn display(&self, node: Node) -> XmlDisplay<'_> {
        XmlDisplay { data: self, node }
    }

    /// Serialize a node and everything below it to a string.
    ///
    /// ```rust
    /// use xmlcompare::XmlData;
    ///
    /// let mut data = XmlData::new();
    /// let root = data.parse(r#"<a x="1"><b>&amp;</b><c/></a>"#)?;
    /// assert_eq!(data.to_string(root), r#"<a x="1"><b>&amp;</b><c/></a>"#);
    /// # Ok::<(), xmlcompare::Error>(())
    /// ```
    pub fn to_string(&self, node: Node) -> String {
        self.display(node).to_string()
    }
}
