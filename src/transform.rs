//! Tree transformations applied before a comparison.
//!
//! Each of these changes the tree in place. They're what
//! [`DiffBuilder`](crate::DiffBuilder)'s `ignore_*` and `normalize_*`
//! options do to its copies of the documents.

use crate::xmldata::{Node, XmlData};
use crate::xmlvalue::NodeType;

fn is_whitespace(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace())
}

fn text_nodes(data: &XmlData, node: Node) -> Vec<Node> {
    data.descendants(node)
        .filter(|n| data.node_type(*n).is_text())
        .collect()
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim all text and CDATA nodes, removing those that end up empty.
pub fn strip_whitespace(data: &mut XmlData, node: Node) {
    for text_node in text_nodes(data, node) {
        let text = data.text_str(text_node).unwrap_or("");
        let trimmed = text.trim();
        if trimmed.is_empty() {
            data.remove(text_node);
        } else if trimmed.len() != text.len() {
            let trimmed = trimmed.to_string();
            data.set_text(text_node, trimmed);
        }
    }
}

/// Like [`strip_whitespace`], and also collapse every run of whitespace
/// inside text to a single space.
pub fn normalize_whitespace(data: &mut XmlData, node: Node) {
    for text_node in text_nodes(data, node) {
        let normalized = normalize(data.text_str(text_node).unwrap_or(""));
        if normalized.is_empty() {
            data.remove(text_node);
        } else {
            data.set_text(text_node, normalized);
        }
    }
}

/// Remove text and CDATA nodes that consist of whitespace only. Other text
/// is left alone.
pub fn strip_element_content_whitespace(data: &mut XmlData, node: Node) {
    let to_remove = text_nodes(data, node)
        .into_iter()
        .filter(|n| is_whitespace(data.text_str(*n).unwrap_or("")))
        .collect::<Vec<_>>();
    for node in to_remove {
        data.remove(node);
    }
}

/// Remove all comments. Text left adjacent by a removed comment is merged
/// into a single text node.
pub fn strip_comments(data: &mut XmlData, node: Node) {
    let to_remove = data
        .descendants(node)
        .filter(|n| data.node_type(*n) == NodeType::Comment)
        .collect::<Vec<_>>();
    let mut parents = Vec::new();
    for node in to_remove {
        if let Some(parent) = data.parent(node) {
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        }
        data.remove(node);
    }
    for parent in parents {
        merge_adjacent_text(data, parent);
    }
}

fn merge_adjacent_text(data: &mut XmlData, parent: Node) {
    let children = data.children(parent).collect::<Vec<_>>();
    let mut previous: Option<Node> = None;
    for child in children {
        if data.node_type(child) != NodeType::Text {
            previous = None;
            continue;
        }
        match previous {
            Some(text_node) => {
                let merged = format!(
                    "{}{}",
                    data.text_str(text_node).unwrap_or(""),
                    data.text_str(child).unwrap_or("")
                );
                data.set_text(text_node, merged);
                data.remove(child);
            }
            None => previous = Some(child),
        }
    }
}
