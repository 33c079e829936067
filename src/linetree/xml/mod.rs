//! # XML Element Tree
//!
//! The tree is an arena: every [`XmlElement`] lives in a `Vec` owned by the
//! [`XmlTree`] and is addressed by a [`NodeId`]. Ownership is the arena's;
//! the parent link and child lists are plain ids, so there are no reference
//! cycles to manage.
//!
//! Structural edits never re-parent a node in place. They *detach* a node
//! (remove it from its parent's child list) and *attach* it somewhere, which
//! is what lets undo put a deleted subtree back exactly where it was. A
//! detached node stays in the arena, unreachable from the root and absent
//! from the identifier index, until a command reattaches it. Once no history
//! entry can reattach it, its command hands the slots back with
//! `XmlTree::release` and later allocations reuse them.
//!
//! ## Identifier index
//!
//! `identifier → NodeId` for every attached element with a non-empty
//! identifier. The index is the single source of truth for lookups: commands
//! never fall back to scanning the tree. [`XmlTree::repair_index`] exists as
//! an explicit consistency repair for hosts that want one.
//!
//! The canonical identifier of an element is mirrored in its `id` attribute;
//! [`XmlTree::set_identifier`] keeps both in step.

use crate::error::{EditError, Result};
use indexmap::IndexMap;
use std::collections::HashMap;

pub mod parse;
pub mod serialize;

pub use parse::parse;
pub use serialize::{escape, to_xml, tree_dump, XML_DECLARATION};

pub const ID_ATTRIBUTE: &str = "id";

/// Element text is stored trimmed of surrounding whitespace.
///
/// The serialized form puts text on its own indented line and parsing trims
/// character data, so only trimmed text survives a save/load cycle unchanged.
pub fn normalize_text(text: String) -> String {
    let trimmed = text.trim();
    if trimmed.len() == text.len() {
        text
    } else {
        trimmed.to_string()
    }
}

/// Handle to an element inside one [`XmlTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    tag: String,
    id: Option<String>,
    attributes: IndexMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl XmlElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            attributes: IndexMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Sets the identifier and its `id` attribute. An empty id clears both.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if id.is_empty() {
            self.attributes.shift_remove(ID_ATTRIBUTE);
            self.id = None;
            return self;
        }
        self.attributes.insert(ID_ATTRIBUTE.to_string(), id.clone());
        self.id = Some(id);
        self
    }

    /// Sets the text payload, trimmed (see [`normalize_text`])
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = normalize_text(text.into());
        self
    }

    /// Sets an attribute; `id` also becomes the canonical identifier
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if name == ID_ATTRIBUTE {
            return self.with_id(value);
        }
        self.attributes.insert(name, value);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Outcome of [`XmlTree::repair_index`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexRepair {
    /// Identifiers present in the tree but missing from (or stale in) the index
    pub added: Vec<String>,
    /// Index entries that pointed at no attached element
    pub removed: Vec<String>,
}

impl IndexRepair {
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<XmlElement>,
    root: NodeId,
    index: HashMap<String, NodeId>,
    /// Released slots, reused by `alloc`
    free: Vec<NodeId>,
}

impl XmlTree {
    /// A tree holding only `root`. The root's identifier, if any, is indexed.
    pub fn new(root: XmlElement) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            index: HashMap::new(),
            free: Vec::new(),
        };
        let root = tree.alloc(XmlElement {
            parent: None,
            children: Vec::new(),
            ..root
        });
        tree.root = root;
        let root_id = tree
            .element(root)
            .id()
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        if let Some(id) = root_id {
            tree.register(id, root);
        }
        tree
    }

    /// The tree a fresh XML document starts with: `<root id="root"/>`
    pub fn with_default_root() -> Self {
        Self::new(XmlElement::new("root").with_id("root"))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_element(&self) -> &XmlElement {
        self.element(self.root)
    }

    pub fn element(&self, node: NodeId) -> &XmlElement {
        &self.nodes[node.0]
    }

    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    pub fn element_by_id(&self, id: &str) -> Option<&XmlElement> {
        self.lookup(id).map(|node| self.element(node))
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Indexed identifiers, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.index.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_root(&self, node: NodeId) -> bool {
        node == self.root
    }

    pub fn children(&self, node: NodeId) -> impl Iterator<Item = &XmlElement> + '_ {
        self.element(node)
            .children
            .iter()
            .map(move |child| self.element(*child))
    }

    /// `node` and all of its descendants, depth-first, pre-order
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.element(current).children.iter().rev().copied());
        }
        out
    }

    /// Position of `node` in its parent's child list, by identity
    pub fn position_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.element(node).parent?;
        self.element(parent)
            .children
            .iter()
            .position(|child| *child == node)
    }

    /// Number of slots in the arena, released ones included
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of slots holding a live element, attached or detached
    pub fn allocated(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Structural equality of the trees reachable from both roots: tag,
    /// identifier, attributes (order-insensitive), text and child order.
    pub fn same_shape(&self, other: &XmlTree) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }

    fn subtree_eq(&self, a: NodeId, other: &XmlTree, b: NodeId) -> bool {
        let left = self.element(a);
        let right = other.element(b);
        left.tag == right.tag
            && left.id == right.id
            && left.attributes == right.attributes
            && left.text == right.text
            && left.children.len() == right.children.len()
            && left
                .children
                .iter()
                .zip(&right.children)
                .all(|(l, r)| self.subtree_eq(*l, other, *r))
    }

    /// Rebuilds the identifier index from the attached tree.
    ///
    /// Returns what changed. A non-clean result means something mutated the
    /// tree without keeping the index in step, which is a bug elsewhere.
    pub fn repair_index(&mut self) -> IndexRepair {
        let mut rebuilt = HashMap::new();
        for node in self.descendants(self.root) {
            if let Some(id) = self.element(node).id().filter(|id| !id.is_empty()) {
                rebuilt.entry(id.to_string()).or_insert(node);
            }
        }

        let mut repair = IndexRepair::default();
        for (id, node) in &rebuilt {
            if self.index.get(id) != Some(node) {
                repair.added.push(id.clone());
            }
        }
        for id in self.index.keys() {
            if !rebuilt.contains_key(id) {
                repair.removed.push(id.clone());
            }
        }
        repair.added.sort();
        repair.removed.sort();

        if !repair.is_clean() {
            tracing::warn!(
                added = ?repair.added,
                removed = ?repair.removed,
                "identifier index diverged from tree; rebuilt"
            );
        }
        self.index = rebuilt;
        repair
    }

    // --- crate-internal mutation primitives used by parsing and commands ---

    pub(crate) fn alloc(&mut self, element: XmlElement) -> NodeId {
        if let Some(node) = self.free.pop() {
            self.nodes[node.0] = element;
            return node;
        }
        let node = NodeId(self.nodes.len());
        self.nodes.push(element);
        node
    }

    /// Returns a detached subtree's slots to the arena.
    ///
    /// The root and attached nodes are left alone. Ids into the released
    /// subtree must not be used afterwards.
    pub(crate) fn release(&mut self, node: NodeId) {
        if self.is_root(node) || self.element(node).parent.is_some() {
            return;
        }
        for released in self.descendants(node) {
            self.nodes[released.0] = XmlElement::new("");
            self.free.push(released);
        }
    }

    pub(crate) fn element_mut(&mut self, node: NodeId) -> &mut XmlElement {
        &mut self.nodes[node.0]
    }

    pub(crate) fn attach(&mut self, parent: NodeId, position: usize, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(position, child);
    }

    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) {
        let position = self.element(parent).children.len();
        self.attach(parent, position, child);
    }

    /// Removes `node` from its parent's child list.
    /// Returns the former parent and position.
    pub(crate) fn detach(&mut self, node: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.element(node).parent?;
        let position = self.position_in_parent(node)?;
        self.nodes[parent.0].children.remove(position);
        self.nodes[node.0].parent = None;
        Some((parent, position))
    }

    pub(crate) fn register(&mut self, id: String, node: NodeId) {
        self.index.insert(id, node);
    }

    pub(crate) fn unregister(&mut self, id: &str) -> Option<NodeId> {
        self.index.remove(id)
    }

    /// Updates the canonical identifier and its mirrored `id` attribute.
    /// Does not touch the index.
    pub(crate) fn set_identifier(&mut self, node: NodeId, id: Option<String>) {
        let element = self.element_mut(node);
        match &id {
            Some(value) => {
                element
                    .attributes
                    .insert(ID_ATTRIBUTE.to_string(), value.clone());
            }
            None => {
                element.attributes.shift_remove(ID_ATTRIBUTE);
            }
        }
        element.id = id;
    }

    pub(crate) fn set_text(&mut self, node: NodeId, text: String) -> String {
        std::mem::replace(&mut self.element_mut(node).text, text)
    }

    /// Identified elements of the subtree rooted at `node`
    pub(crate) fn identified_in(&self, node: NodeId) -> Vec<(String, NodeId)> {
        self.descendants(node)
            .into_iter()
            .filter_map(|n| {
                self.element(n)
                    .id()
                    .filter(|id| !id.is_empty())
                    .map(|id| (id.to_string(), n))
            })
            .collect()
    }

    /// Builds the index from scratch after parsing. Duplicate identifiers
    /// in the source are rejected.
    pub(crate) fn rebuild_index(&mut self) -> Result<()> {
        self.index.clear();
        for (id, node) in self.identified_in(self.root) {
            if self.index.insert(id.clone(), node).is_some() {
                return Err(EditError::MalformedContent(format!(
                    "identifier {:?} used more than once",
                    id
                )));
            }
        }
        Ok(())
    }
}

impl PartialEq for XmlTree {
    fn eq(&self, other: &Self) -> bool {
        self.same_shape(other)
    }
}
