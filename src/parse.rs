use xmlparser::{ElementEnd, ExternalId, StrSpan, Token, Tokenizer};

use crate::encoding::decode;
use crate::entity::{normalize_attribute_value, parse_entities};
use crate::error::Error;
use crate::name::{QName, XMLNS_NAMESPACE, XML_NAMESPACE};
use crate::xmldata::{Node, XmlData};

struct PendingElement<'a> {
    prefix: &'a str,
    local: &'a str,
    attributes: Vec<(&'a str, &'a str, &'a str)>,
}

struct OpenElement {
    node: Node,
    qualified_name: String,
}

struct DocumentBuilder<'d, 'a> {
    data: &'d mut XmlData,
    document: Node,
    open: Vec<OpenElement>,
    scopes: Vec<Vec<(String, String)>>,
    pending: Option<PendingElement<'a>>,
}

fn qualified_name(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

fn external_ids(external_id: Option<ExternalId<'_>>) -> (Option<String>, Option<String>) {
    match external_id {
        Some(ExternalId::System(system)) => (None, Some(system.as_str().to_string())),
        Some(ExternalId::Public(public, system)) => (
            Some(public.as_str().to_string()),
            Some(system.as_str().to_string()),
        ),
        None => (None, None),
    }
}

impl<'d, 'a> DocumentBuilder<'d, 'a> {
    fn new(data: &'d mut XmlData) -> Self {
        let document = data.new_document();
        DocumentBuilder {
            data,
            document,
            open: Vec::new(),
            scopes: Vec::new(),
            pending: None,
        }
    }

    fn current(&self) -> Node {
        self.open
            .last()
            .map(|open| open.node)
            .unwrap_or(self.document)
    }

    fn namespace_for(&self, prefix: &str) -> Result<String, Error> {
        if prefix == "xml" {
            return Ok(XML_NAMESPACE.to_string());
        }
        for scope in self.scopes.iter().rev() {
            if let Some((_, uri)) = scope.iter().find(|(p, _)| p == prefix) {
                return Ok(uri.clone());
            }
        }
        if prefix.is_empty() {
            Ok(String::new())
        } else {
            Err(Error::UnknownPrefix(prefix.to_string()))
        }
    }

    fn add(&mut self, node: Node) -> Result<(), Error> {
        let parent = self.current();
        self.data.append(parent, node)
    }

    fn element_start(&mut self, prefix: &'a str, local: &'a str) {
        self.pending = Some(PendingElement {
            prefix,
            local,
            attributes: Vec::new(),
        });
    }

    fn attribute(&mut self, prefix: &'a str, local: &'a str, value: &'a str) {
        if let Some(pending) = &mut self.pending {
            pending.attributes.push((prefix, local, value));
        }
    }

    fn element_end(&mut self, empty: bool) -> Result<(), Error> {
        let pending = match self.pending.take() {
            Some(pending) => pending,
            None => return Ok(()),
        };
        let mut scope = Vec::new();
        for (prefix, local, value) in &pending.attributes {
            if *prefix == "xmlns" {
                scope.push((local.to_string(), parse_entities(value)?.into_owned()));
            } else if prefix.is_empty() && *local == "xmlns" {
                scope.push((String::new(), parse_entities(value)?.into_owned()));
            }
        }
        self.scopes.push(scope);

        let namespace = self.namespace_for(pending.prefix)?;
        let element = self
            .data
            .new_element(QName::new(namespace, pending.local), pending.prefix);
        self.add(element)?;

        for (prefix, local, value) in pending.attributes {
            let value = normalize_attribute_value(value)?;
            let name = if prefix == "xmlns" || (prefix.is_empty() && local == "xmlns") {
                QName::new(XMLNS_NAMESPACE, local)
            } else if prefix.is_empty() {
                QName::local(local)
            } else {
                QName::new(self.namespace_for(prefix)?, local)
            };
            let attribute = self.data.new_attribute(name, prefix, value);
            self.data.append(element, attribute)?;
        }

        if empty {
            self.scopes.pop();
        } else {
            self.open.push(OpenElement {
                node: element,
                qualified_name: qualified_name(pending.prefix, pending.local),
            });
        }
        Ok(())
    }

    fn element_close(&mut self, prefix: &str, local: &str) -> Result<(), Error> {
        let closing = qualified_name(prefix, local);
        match self.open.pop() {
            Some(open) if open.qualified_name == closing => {
                self.scopes.pop();
                Ok(())
            }
            Some(open) => Err(Error::InvalidCloseTag(open.qualified_name, closing)),
            None => Err(Error::InvalidCloseTag(String::new(), closing)),
        }
    }

    fn text(&mut self, text: StrSpan<'a>) -> Result<(), Error> {
        if self.open.is_empty() {
            // whitespace between prolog items isn't part of the tree
            return Ok(());
        }
        let text = parse_entities(text.as_str())?;
        let text = if text.contains('\r') {
            text.replace("\r\n", "\n").replace('\r', "\n")
        } else {
            text.into_owned()
        };
        let node = self.data.new_text(text);
        self.add(node)
    }

    fn finish(self) -> Result<Node, Error> {
        if !self.open.is_empty() {
            return Err(Error::UnclosedTag);
        }
        if self.data.document_element(self.document).is_none() {
            return Err(Error::NoDocumentElement);
        }
        Ok(self.document)
    }
}

/// ## Parsing
impl XmlData {
    /// Parse a string containing an XML document into a tree.
    ///
    /// Returns the document node. The document element, its prolog and
    /// any comments and processing instructions after it are children of
    /// the document node; so are the XML declaration and the document type
    /// declaration if present.
    ///
    /// ```rust
    /// use xmlcompare::{NodeType, XmlData};
    ///
    /// let mut data = XmlData::new();
    /// let root = data.parse(r#"<?xml version="1.0"?><a>text</a>"#)?;
    /// let a = data.document_element(root).unwrap();
    /// assert_eq!(data.node_type(a), NodeType::Element);
    /// assert!(data.declaration(root).is_some());
    /// # Ok::<(), xmlcompare::Error>(())
    /// ```
    pub fn parse(&mut self, xml: &str) -> Result<Node, Error> {
        let mut builder = DocumentBuilder::new(self);

        for token in Tokenizer::from(xml) {
            match token? {
                Token::Declaration {
                    version,
                    encoding,
                    standalone,
                    ..
                } => {
                    let node = builder.data.new_declaration(
                        version.as_str(),
                        encoding.map(|e| e.as_str().to_string()),
                        standalone,
                    );
                    builder.add(node)?;
                }
                Token::ProcessingInstruction {
                    target, content, ..
                } => {
                    let node = builder.data.new_processing_instruction(
                        target.as_str(),
                        content.map(|c| c.as_str().to_string()),
                    );
                    builder.add(node)?;
                }
                Token::Comment { text, .. } => {
                    let node = builder.data.new_comment(text.as_str());
                    builder.add(node)?;
                }
                Token::DtdStart {
                    name, external_id, ..
                }
                | Token::EmptyDtd {
                    name, external_id, ..
                } => {
                    let (public_id, system_id) = external_ids(external_id);
                    let node = builder
                        .data
                        .new_doctype(name.as_str(), public_id, system_id);
                    builder.add(node)?;
                }
                Token::ElementStart { prefix, local, .. } => {
                    builder.element_start(prefix.as_str(), local.as_str());
                }
                Token::Attribute {
                    prefix,
                    local,
                    value,
                    ..
                } => {
                    builder.attribute(prefix.as_str(), local.as_str(), value.as_str());
                }
                Token::ElementEnd { end, .. } => match end {
                    ElementEnd::Open => builder.element_end(false)?,
                    ElementEnd::Empty => builder.element_end(true)?,
                    ElementEnd::Close(prefix, local) => {
                        builder.element_close(prefix.as_str(), local.as_str())?
                    }
                },
                Token::Text { text } => builder.text(text)?,
                Token::Cdata { text, .. } => {
                    let node = builder.data.new_cdata(text.as_str());
                    builder.add(node)?;
                }
                Token::EntityDeclaration { .. } | Token::DtdEnd { .. } => {}
            }
        }

        builder.finish()
    }

    /// Parse raw bytes, detecting their encoding first.
    pub fn parse_bytes(&mut self, bytes: &[u8]) -> Result<Node, Error> {
        let xml = decode(bytes)?;
        self.parse(&xml)
    }
}
