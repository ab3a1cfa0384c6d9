use thiserror::Error;

use crate::xmldata::Node;

/// Errors produced while building trees, configuring policies or comparing.
#[derive(Debug, Error)]
pub enum Error {
    /// An entity reference was opened with `&` but never closed with `;`.
    #[error("unclosed entity: {0}")]
    UnclosedEntity(String),
    /// An entity reference that is neither predefined nor a character reference.
    #[error("invalid entity: {0}")]
    InvalidEntity(String),
    /// A prefix was used that no ancestor declares.
    #[error("unknown namespace prefix: {0}")]
    UnknownPrefix(String),
    /// A close tag doesn't match the open element.
    #[error("close tag {1} doesn't match open element {0}")]
    InvalidCloseTag(String, String),
    /// The input ended while elements were still open.
    #[error("unclosed tag")]
    UnclosedTag,
    /// The input has no document element.
    #[error("no document element")]
    NoDocumentElement,
    /// A node was appended under a node that cannot hold it.
    #[error("cannot append a node here: {0:?}")]
    InvalidAppend(Node),
    /// A policy object was configured with an unusable argument.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// An XPath expression could not be compiled.
    #[error("invalid XPath expression '{expression}': {message}")]
    XPath { expression: String, message: String },
    /// The path context was asked to navigate somewhere it never registered.
    #[error("path context navigation error: {0}")]
    Navigation(String),
    /// The comparison run was abandoned.
    #[error("caught error during comparison")]
    Comparison {
        #[source]
        source: Box<Error>,
    },
    /// The tokenizer rejected the input.
    #[error("XML parsing error: {0}")]
    Parser(#[from] xmlparser::Error),
    /// Bytes could not be decoded.
    #[error("cannot decode input as {0}")]
    Encoding(String),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
