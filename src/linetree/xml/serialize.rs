//! [`XmlTree`] → text: the persisted XML form and a diagnostic tree dump.

use super::{NodeId, XmlElement, XmlTree, ID_ATTRIBUTE};
use std::borrow::Cow;

pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const GAP: &str = "    ";

/// Escapes `& < > " '` for use in text and attribute values.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Serializes the tree with an XML declaration, one `indent` per depth.
pub fn to_xml(tree: &XmlTree, indent: &str) -> String {
    let mut out = String::from(XML_DECLARATION);
    write_element(tree, tree.root(), indent, 0, &mut out);
    out
}

fn write_element(tree: &XmlTree, node: NodeId, indent: &str, depth: usize, out: &mut String) {
    let element = tree.element(node);
    let pad = indent.repeat(depth);

    out.push_str(&pad);
    out.push('<');
    out.push_str(element.tag());
    for (name, value) in element.attributes() {
        out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
    }

    if !element.has_text() && element.is_leaf() {
        out.push_str("/>\n");
        return;
    }
    out.push_str(">\n");

    if element.has_text() {
        out.push_str(&indent.repeat(depth + 1));
        out.push_str(&escape(element.text()));
        out.push('\n');
    }

    for child in element.children() {
        write_element(tree, *child, indent, depth + 1, out);
    }

    out.push_str(&pad);
    out.push_str("</");
    out.push_str(element.tag());
    out.push_str(">\n");
}

/// Renders the tree as an ASCII outline for display.
///
/// ```text
/// bookstore [id="root"]
/// ├── book [id="b1", category="COOKING"]
/// │   ├── "Intro"
/// │   └── title [id="t1"]
/// │       └── "Everyday Italian"
/// └── book [id="b2"]
/// ```
pub fn tree_dump(tree: &XmlTree) -> String {
    let mut out = String::new();
    dump_element(tree, tree.root(), "", true, true, &mut out);
    out
}

fn dump_element(
    tree: &XmlTree,
    node: NodeId,
    prefix: &str,
    is_last: bool,
    is_root: bool,
    out: &mut String,
) {
    let element = tree.element(node);

    if !is_root {
        out.push_str(prefix);
        out.push_str(if is_last { LAST_BRANCH } else { BRANCH });
    }
    out.push_str(&label(element));
    out.push('\n');

    let child_prefix = if is_root {
        String::new()
    } else {
        format!("{}{}", prefix, if is_last { GAP } else { PIPE })
    };

    if element.has_text() {
        out.push_str(&child_prefix);
        out.push_str(if element.is_leaf() { LAST_BRANCH } else { BRANCH });
        out.push_str(&format!("\"{}\"\n", escape(element.text())));
    }

    let count = element.children().len();
    for (i, child) in element.children().iter().enumerate() {
        dump_element(tree, *child, &child_prefix, i + 1 == count, false, out);
    }
}

fn label(element: &XmlElement) -> String {
    let mut attrs = Vec::new();
    if let Some(id) = element.id() {
        attrs.push(format!("{}=\"{}\"", ID_ATTRIBUTE, escape(id)));
    }
    attrs.extend(
        element
            .attributes()
            .iter()
            .filter(|(name, _)| name.as_str() != ID_ATTRIBUTE)
            .map(|(name, value)| format!("{}=\"{}\"", name, escape(value))),
    );

    if attrs.is_empty() {
        element.tag().to_string()
    } else {
        format!("{} [{}]", element.tag(), attrs.join(", "))
    }
}
