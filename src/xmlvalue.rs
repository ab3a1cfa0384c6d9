use std::fmt::{Display, Formatter};

use crate::name::QName;

/// The type of an XML node.
///
/// Access it using [`Value::node_type`] or
/// [`XmlData::node_type`](crate::XmlData::node_type).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeType {
    /// Document node that holds everything. Note that this is not the same
    /// as the document element.
    Document,
    /// `<!DOCTYPE ...>`
    DocumentType,
    /// `<?xml version="1.0"?>`
    Declaration,
    /// Element.
    Element,
    /// Attribute, including namespace declarations.
    Attribute,
    /// Text.
    Text,
    /// `<![CDATA[...]]>`
    CData,
    /// Comment.
    Comment,
    /// Processing instruction.
    ProcessingInstruction,
}

impl NodeType {
    /// Text, CDATA and comments all carry character data.
    pub fn is_character_data(&self) -> bool {
        matches!(self, NodeType::Text | NodeType::CData | NodeType::Comment)
    }

    /// Text and CDATA.
    pub fn is_text(&self) -> bool {
        matches!(self, NodeType::Text | NodeType::CData)
    }
}

impl Display for NodeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeType::Document => "Document Node",
            NodeType::DocumentType => "Document Type Node",
            NodeType::Declaration => "XML Declaration",
            NodeType::Element => "Element",
            NodeType::Attribute => "Attribute",
            NodeType::Text => "Text",
            NodeType::CData => "CDATA Section",
            NodeType::Comment => "Comment",
            NodeType::ProcessingInstruction => "Processing Instruction",
        };
        write!(f, "{}", s)
    }
}

/// An XML value stored in the arena.
///
/// Access it using [`XmlData::value`](crate::XmlData::value).
#[derive(Debug, Clone)]
pub enum Value {
    /// Document node.
    Document,
    /// Document type declaration.
    DocumentType(DocumentType),
    /// XML declaration.
    Declaration(Declaration),
    /// Element; it has a name and a prefix. Its attributes are separate nodes.
    Element(Element),
    /// Attribute.
    Attribute(Attribute),
    /// Text.
    Text(String),
    /// CDATA section.
    CData(String),
    /// Comment.
    Comment(String),
    /// Processing instruction.
    ProcessingInstruction(ProcessingInstruction),
}

impl Value {
    /// Returns the type of the XML value.
    pub fn node_type(&self) -> NodeType {
        match self {
            Value::Document => NodeType::Document,
            Value::DocumentType(_) => NodeType::DocumentType,
            Value::Declaration(_) => NodeType::Declaration,
            Value::Element(_) => NodeType::Element,
            Value::Attribute(_) => NodeType::Attribute,
            Value::Text(_) => NodeType::Text,
            Value::CData(_) => NodeType::CData,
            Value::Comment(_) => NodeType::Comment,
            Value::ProcessingInstruction(_) => NodeType::ProcessingInstruction,
        }
    }

    /// Character data of text, CDATA and comment nodes.
    pub fn character_data(&self) -> Option<&str> {
        match self {
            Value::Text(text) | Value::CData(text) | Value::Comment(text) => Some(text),
            _ => None,
        }
    }
}

/// XML element value.
///
/// Example: `<foo/>` or `<x:foo xmlns:x="..."/>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub(crate) name: QName,
    pub(crate) prefix: String,
}

impl Element {
    pub(crate) fn new(name: QName, prefix: String) -> Self {
        Element { name, prefix }
    }

    /// The name of the element.
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// The prefix used in the source; empty if none.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// XML attribute value.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub(crate) name: QName,
    pub(crate) prefix: String,
    pub(crate) value: String,
    pub(crate) specified: bool,
}

impl Attribute {
    pub(crate) fn new(name: QName, prefix: String, value: String) -> Self {
        Attribute {
            name,
            prefix,
            value,
            specified: true,
        }
    }

    /// The name of the attribute.
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// The prefix used in the source; empty if none.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The attribute value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the value was written in the document rather than defaulted.
    pub fn specified(&self) -> bool {
        self.specified
    }

    /// Mark the value as defaulted (or explicit again).
    pub fn set_specified(&mut self, specified: bool) {
        self.specified = specified;
    }
}

/// XML processing instruction value.
///
/// Example: `<?foo?>` or `<?foo bar?>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingInstruction {
    pub(crate) target: String,
    pub(crate) data: Option<String>,
}

impl ProcessingInstruction {
    pub(crate) fn new(target: String, data: Option<String>) -> Self {
        ProcessingInstruction { target, data }
    }

    /// Get processing instruction target.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Get processing instruction data.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

/// Document type declaration.
///
/// Example: `<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0//EN" "xhtml1.dtd">`.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentType {
    pub(crate) name: String,
    pub(crate) public_id: Option<String>,
    pub(crate) system_id: Option<String>,
}

impl DocumentType {
    pub(crate) fn new(name: String, public_id: Option<String>, system_id: Option<String>) -> Self {
        DocumentType {
            name,
            public_id,
            system_id,
        }
    }

    /// The name of the document element this declares.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The public identifier, if any.
    pub fn public_id(&self) -> Option<&str> {
        self.public_id.as_deref()
    }

    /// The system identifier, if any.
    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }
}

/// XML declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub(crate) version: String,
    pub(crate) encoding: Option<String>,
    pub(crate) standalone: Option<bool>,
}

impl Declaration {
    pub(crate) fn new(version: String, encoding: Option<String>, standalone: Option<bool>) -> Self {
        Declaration {
            version,
            encoding,
            standalone,
        }
    }

    /// `version` pseudo-attribute.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// `encoding` pseudo-attribute, if present.
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// `standalone` pseudo-attribute, if present.
    pub fn standalone(&self) -> Option<bool> {
        self.standalone
    }
}
