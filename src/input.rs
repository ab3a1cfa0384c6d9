use crate::error::Error;
use crate::xmldata::{Node, XmlData};

/// A document to compare, as text or as raw bytes.
///
/// Bytes are decoded according to their byte order mark or XML
/// declaration before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// XML text.
    Text(String),
    /// Encoded XML.
    Bytes(Vec<u8>),
}

impl Input {
    /// Parse the input into `data`, returning the document node.
    pub fn parse(&self, data: &mut XmlData) -> Result<Node, Error> {
        match self {
            Input::Text(text) => data.parse(text),
            Input::Bytes(bytes) => data.parse_bytes(bytes),
        }
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::Text(text.to_string())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Text(text)
    }
}

impl From<&[u8]> for Input {
    fn from(bytes: &[u8]) -> Self {
        Input::Bytes(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Input::Bytes(bytes)
    }
}
