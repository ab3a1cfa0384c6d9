//! A small XPath subset used to select nodes for element selectors.
//!
//! Supported are location paths made of child (`/`), descendant (`//`),
//! self (`.`), parent (`..`) and attribute (`@`) steps with name tests,
//! `*` and the `text()`, `comment()`, `node()` and
//! `processing-instruction()` node tests. Each step may carry predicates:
//! a position (`[2]`), an attribute test (`[@id]`) or an attribute value
//! test (`[@id='x']`).

use std::iter::Peekable;
use std::str::Chars;

use ahash::{HashMap, HashSet};

use crate::error::Error;
use crate::name::{QName, XMLNS_NAMESPACE};
use crate::xmldata::{Node, XmlData};
use crate::xmlvalue::NodeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    DescendantOrSelf,
    Attribute,
    SelfNode,
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Name(QName),
    AnyName,
    Text,
    Comment,
    ProcessingInstruction,
    AnyNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    HasAttribute(QName),
    AttributeEquals(QName, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

/// A compiled XPath expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPath {
    expression: String,
    absolute: bool,
    steps: Vec<Step>,
}

struct Parser<'a> {
    expression: &'a str,
    chars: Peekable<Chars<'a>>,
    prefixes: &'a HashMap<String, String>,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || c == '.'
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::XPath {
            expression: self.expression.to_string(),
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().map(|c| c.is_whitespace()).unwrap_or(false) {
            self.chars.next();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.chars.peek() == Some(&expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), Error> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", expected)))
        }
    }

    fn name_part(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.chars.peek().copied() {
            if !is_name_char(c) {
                break;
            }
            name.push(c);
            self.chars.next();
        }
        name
    }

    // a possibly prefixed name; the prefix is returned separately
    fn prefixed_name(&mut self) -> Result<(Option<String>, String), Error> {
        self.skip_whitespace();
        let first = self.name_part();
        if first.is_empty() {
            return Err(self.error("expected a name"));
        }
        if self.chars.peek() == Some(&':') {
            self.chars.next();
            if self.chars.peek() == Some(&'*') {
                self.chars.next();
                return Ok((Some(first), "*".to_string()));
            }
            let local = self.name_part();
            if local.is_empty() {
                return Err(self.error("expected a local name after ':'"));
            }
            return Ok((Some(first), local));
        }
        Ok((None, first))
    }

    fn resolve(&self, prefix: Option<String>, local: String) -> Result<QName, Error> {
        match prefix {
            None => Ok(QName::local(local)),
            Some(prefix) => match self.prefixes.get(&prefix) {
                Some(uri) => Ok(QName::new(uri.clone(), local)),
                None => Err(self.error(format!("unknown prefix '{}'", prefix))),
            },
        }
    }

    fn path(&mut self) -> Result<XPath, Error> {
        self.skip_whitespace();
        let mut steps = Vec::new();
        let mut absolute = false;
        if self.eat('/') {
            absolute = true;
            if self.eat('/') {
                steps.push(Step::descendant_or_self());
            } else {
                self.skip_whitespace();
                if self.chars.peek().is_none() {
                    return Ok(XPath {
                        expression: self.expression.to_string(),
                        absolute,
                        steps,
                    });
                }
            }
        }
        steps.push(self.step()?);
        while self.eat('/') {
            if self.eat('/') {
                steps.push(Step::descendant_or_self());
            }
            steps.push(self.step()?);
        }
        self.skip_whitespace();
        if let Some(c) = self.chars.peek().copied() {
            return Err(self.error(format!("unexpected '{}'", c)));
        }
        Ok(XPath {
            expression: self.expression.to_string(),
            absolute,
            steps,
        })
    }

    fn step(&mut self) -> Result<Step, Error> {
        self.skip_whitespace();
        if self.eat('.') {
            if self.chars.peek() == Some(&'.') {
                self.chars.next();
                return Ok(Step::new(Axis::Parent, NodeTest::AnyNode));
            }
            return Ok(Step::new(Axis::SelfNode, NodeTest::AnyNode));
        }
        let (axis, test) = if self.eat('@') {
            let test = if self.eat('*') {
                NodeTest::AnyName
            } else {
                let (prefix, local) = self.prefixed_name()?;
                NodeTest::Name(self.resolve(prefix, local)?)
            };
            (Axis::Attribute, test)
        } else if self.eat('*') {
            (Axis::Child, NodeTest::AnyName)
        } else {
            let (prefix, local) = self.prefixed_name()?;
            if prefix.is_none() && self.eat('(') {
                self.expect(')')?;
                let test = match local.as_str() {
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    "node" => NodeTest::AnyNode,
                    "processing-instruction" => NodeTest::ProcessingInstruction,
                    other => return Err(self.error(format!("unsupported function '{}'", other))),
                };
                (Axis::Child, test)
            } else if local == "*" {
                return Err(self.error("namespace wildcards are not supported"));
            } else {
                (Axis::Child, NodeTest::Name(self.resolve(prefix, local)?))
            }
        };
        let mut step = Step::new(axis, test);
        while self.eat('[') {
            step.predicates.push(self.predicate()?);
            self.expect(']')?;
        }
        Ok(step)
    }

    fn predicate(&mut self) -> Result<Predicate, Error> {
        self.skip_whitespace();
        if self.eat('@') {
            let (prefix, local) = self.prefixed_name()?;
            let name = self.resolve(prefix, local)?;
            if self.eat('=') {
                let value = self.literal()?;
                return Ok(Predicate::AttributeEquals(name, value));
            }
            return Ok(Predicate::HasAttribute(name));
        }
        let mut digits = String::new();
        while let Some(c) = self.chars.peek().copied() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.chars.next();
        }
        match digits.parse::<usize>() {
            Ok(position) if position > 0 => Ok(Predicate::Position(position)),
            _ => Err(self.error("unsupported predicate")),
        }
    }

    fn literal(&mut self) -> Result<String, Error> {
        self.skip_whitespace();
        let quote = match self.chars.next() {
            Some(c @ ('\'' | '"')) => c,
            _ => return Err(self.error("expected a quoted string")),
        };
        let mut value = String::new();
        for c in self.chars.by_ref() {
            if c == quote {
                return Ok(value);
            }
            value.push(c);
        }
        Err(self.error("unterminated string"))
    }
}

impl Step {
    fn new(axis: Axis, test: NodeTest) -> Self {
        Step {
            axis,
            test,
            predicates: Vec::new(),
        }
    }

    fn descendant_or_self() -> Self {
        Step::new(Axis::DescendantOrSelf, NodeTest::AnyNode)
    }

    fn candidates(&self, data: &XmlData, node: Node) -> Vec<Node> {
        match self.axis {
            Axis::Child => data.children(node).collect(),
            Axis::DescendantOrSelf => data.descendants(node).collect(),
            Axis::Attribute => data
                .attributes(node)
                .filter(|a| data.namespace_uri(*a) != XMLNS_NAMESPACE)
                .collect(),
            Axis::SelfNode => vec![node],
            Axis::Parent => data.parent(node).into_iter().collect(),
        }
    }

    fn matches(&self, data: &XmlData, node: Node) -> bool {
        let node_type = data.node_type(node);
        let principal = if self.axis == Axis::Attribute {
            NodeType::Attribute
        } else {
            NodeType::Element
        };
        match &self.test {
            NodeTest::Name(name) => node_type == principal && data.name(node) == Some(name),
            NodeTest::AnyName => node_type == principal,
            NodeTest::Text => node_type.is_text(),
            NodeTest::Comment => node_type == NodeType::Comment,
            NodeTest::ProcessingInstruction => node_type == NodeType::ProcessingInstruction,
            NodeTest::AnyNode => true,
        }
    }

    fn select(&self, data: &XmlData, node: Node) -> Vec<Node> {
        let mut selected = self
            .candidates(data, node)
            .into_iter()
            .filter(|candidate| self.matches(data, *candidate))
            .collect::<Vec<_>>();
        for predicate in &self.predicates {
            selected = match predicate {
                Predicate::Position(position) => {
                    selected.get(position - 1).copied().into_iter().collect()
                }
                Predicate::HasAttribute(name) => selected
                    .into_iter()
                    .filter(|n| data.attribute_value(*n, name).is_some())
                    .collect(),
                Predicate::AttributeEquals(name, value) => selected
                    .into_iter()
                    .filter(|n| data.attribute_value(*n, name) == Some(value.as_str()))
                    .collect(),
            };
        }
        selected
    }
}

impl XPath {
    /// Compile an expression. Prefixes resolve through `prefix_to_uri`.
    pub fn compile(expression: &str, prefix_to_uri: &HashMap<String, String>) -> Result<Self, Error> {
        let mut parser = Parser {
            expression,
            chars: expression.chars().peekable(),
            prefixes: prefix_to_uri,
        };
        parser.path()
    }

    /// The source text.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Select nodes, using `context` as the context node.
    ///
    /// Results are in the order the steps produce them, without duplicates.
    pub fn select(&self, data: &XmlData, context: Node) -> Vec<Node> {
        let start = if self.absolute {
            data.ancestors(context).last().unwrap_or(context)
        } else {
            context
        };
        let mut current = vec![start];
        for step in &self.steps {
            let mut seen = HashSet::default();
            current = current
                .into_iter()
                .flat_map(|node| step.select(data, node))
                .filter(|node| seen.insert(*node))
                .collect();
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn names(data: &XmlData, nodes: &[Node]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| match data.name(*n) {
                Some(name) => name.local_name().to_string(),
                None => data.text_str(*n).unwrap_or("").to_string(),
            })
            .collect()
    }

    const DOC: &str = r#"<root><a id="1">x</a><b/><a id="2"><c/></a><!--note--></root>"#;

    #[rstest]
    #[case("a", vec!["a", "a"])]
    #[case("*", vec!["a", "b", "a"])]
    #[case("a[2]", vec!["a"])]
    #[case("a[@id='2']/c", vec!["c"])]
    #[case("a[@id]", vec!["a", "a"])]
    #[case("./b", vec!["b"])]
    #[case("a/text()", vec!["x"])]
    #[case("comment()", vec!["note"])]
    #[case("//c", vec!["c"])]
    #[case("/root/b", vec!["b"])]
    #[case("b/..", vec!["root"])]
    #[case("a/@id", vec!["id", "id"])]
    #[case("d", vec![])]
    fn test_select(#[case] expression: &str, #[case] expected: Vec<&str>) {
        let mut data = XmlData::new();
        let root = data.parse(DOC).unwrap();
        let element = data.document_element(root).unwrap();
        let xpath = XPath::compile(expression, &HashMap::default()).unwrap();
        let selected = xpath.select(&data, element);
        assert_eq!(names(&data, &selected), expected);
    }

    #[test]
    fn test_namespaced_name() {
        let mut data = XmlData::new();
        let root = data
            .parse(r#"<root xmlns:p="urn:p"><p:a/><a/></root>"#)
            .unwrap();
        let element = data.document_element(root).unwrap();
        let mut prefixes = HashMap::default();
        prefixes.insert("q".to_string(), "urn:p".to_string());
        let xpath = XPath::compile("q:a", &prefixes).unwrap();
        let selected = xpath.select(&data, element);
        assert_eq!(selected.len(), 1);
        assert_eq!(data.namespace_uri(selected[0]), "urn:p");
    }

    #[rstest]
    #[case("")]
    #[case("a[")]
    #[case("a[0]")]
    #[case("x:a")]
    #[case("foo()")]
    #[case("a[@b='c]")]
    #[case("a b")]
    fn test_compile_errors(#[case] expression: &str) {
        assert!(matches!(
            XPath::compile(expression, &HashMap::default()),
            Err(Error::XPath { .. })
        ));
    }
}
