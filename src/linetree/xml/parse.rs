//! XML text → [`XmlTree`].
//!
//! Comments are stripped up front, then the remaining text is streamed
//! through `quick-xml`. Only elements, attributes and character data are
//! kept; each element holds the last non-blank run of text seen inside it.
//! Tag and attribute names are kept qualified (`x:tag`, `xml:lang`), and only
//! the unprefixed `id` attribute is an identifier. An empty `id=""` is dropped.

use super::{XmlElement, XmlTree, ID_ATTRIBUTE};
use crate::error::{EditError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// Parses `content` into a tree and builds its identifier index.
pub fn parse(content: &str) -> Result<XmlTree> {
    let content = strip_comments(content)?;
    let mut reader = Reader::from_str(&content);

    let mut tree: Option<XmlTree> = None;
    let mut stack = Vec::new();

    loop {
        let event = reader.read_event().map_err(|err| {
            EditError::MalformedContent(format!(
                "at byte {}: {}",
                reader.buffer_position(),
                err
            ))
        })?;

        match event {
            Event::Start(start) => {
                let node = open_element(&mut tree, &stack, &start)?;
                stack.push(node);
            }
            Event::Empty(start) => {
                open_element(&mut tree, &stack, &start)?;
            }
            Event::End(_) => {
                if stack.pop().is_none() {
                    return Err(EditError::MalformedContent(
                        "closing tag without an open element".into(),
                    ));
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|err| EditError::MalformedContent(err.to_string()))?;
                attach_text(&mut tree, &stack, text.trim())?;
            }
            Event::CData(data) => {
                let raw = data.into_inner();
                let text = String::from_utf8_lossy(&raw);
                attach_text(&mut tree, &stack, text.trim())?;
            }
            Event::Eof => break,
            // declarations, processing instructions, doctypes
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(EditError::MalformedContent(format!(
            "{} element(s) left unclosed at end of input",
            stack.len()
        )));
    }

    let mut tree =
        tree.ok_or_else(|| EditError::MalformedContent("document has no root element".into()))?;
    tree.rebuild_index()?;
    Ok(tree)
}

/// Removes every `<!-- ... -->` block in one forward pass.
///
/// Each opener is closed by the first `-->` after it, so a stray `-->` in
/// ordinary text is left untouched.
pub fn strip_comments(content: &str) -> Result<Cow<'_, str>> {
    if !content.contains(COMMENT_OPEN) {
        return Ok(Cow::Borrowed(content));
    }

    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(start) = rest.find(COMMENT_OPEN) {
        out.push_str(&rest[..start]);
        let body = &rest[start + COMMENT_OPEN.len()..];
        let end = body
            .find(COMMENT_CLOSE)
            .ok_or_else(|| EditError::MalformedContent("unterminated comment".into()))?;
        rest = &body[end + COMMENT_CLOSE.len()..];
    }
    out.push_str(rest);
    Ok(Cow::Owned(out))
}

fn open_element(
    tree: &mut Option<XmlTree>,
    stack: &[super::NodeId],
    start: &BytesStart<'_>,
) -> Result<super::NodeId> {
    let element = element_from(start)?;

    match (tree.as_mut(), stack.last()) {
        (None, _) => {
            let created = XmlTree::new(element);
            let root = created.root();
            *tree = Some(created);
            Ok(root)
        }
        (Some(tree), Some(parent)) => {
            let node = tree.alloc(element);
            tree.append(*parent, node);
            Ok(node)
        }
        (Some(_), None) => Err(EditError::MalformedContent(format!(
            "second top-level element <{}>",
            element.tag
        ))),
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement> {
    let tag = utf8(start.name().as_ref())?;
    let mut element = XmlElement::new(tag);

    for attr in start.attributes() {
        let attr = attr.map_err(|err| EditError::MalformedContent(err.to_string()))?;
        let name = utf8(attr.key.as_ref())?;
        let value = attr
            .unescape_value()
            .map_err(|err| EditError::MalformedContent(err.to_string()))?
            .into_owned();
        if name == ID_ATTRIBUTE {
            if value.is_empty() {
                continue;
            }
            element.id = Some(value.clone());
        }
        element.attributes.insert(name, value);
    }
    Ok(element)
}

fn attach_text(tree: &mut Option<XmlTree>, stack: &[super::NodeId], text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    match (tree.as_mut(), stack.last()) {
        (Some(tree), Some(current)) => {
            tree.set_text(*current, text.to_string());
            Ok(())
        }
        _ => Err(EditError::MalformedContent(format!(
            "text outside the root element: {:?}",
            text
        ))),
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|err| EditError::MalformedContent(err.to_string()))
}
