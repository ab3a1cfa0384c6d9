use std::fmt::{Display, Formatter};

/// The namespace used for namespace declaration attributes.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";
/// The namespace bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
/// The XML Schema instance namespace (`xsi:type` and friends).
pub const XML_SCHEMA_INSTANCE_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// A qualified name: a namespace URI plus a local name.
///
/// The empty namespace means "no namespace". Prefixes are not part of
/// the name; they're kept on the node they were parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QName {
    namespace: String,
    local: String,
}

impl QName {
    /// Create a name in a namespace.
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        QName {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// Create a name in no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        QName::new("", local)
    }

    /// The namespace URI; empty if the name is in no namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The local part.
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// True if the name has a namespace.
    pub fn has_namespace(&self) -> bool {
        !self.namespace.is_empty()
    }
}

/// Clark notation: `{namespace}local`, or just `local`.
impl Display for QName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}
