//! Structural XML commands.
//!
//! All lookups go through the identifier index. Each command validates fully
//! before its first mutation, so a failed command leaves the tree and index
//! exactly as they were.
//!
//! Elements created by a command are allocated once; undo detaches them and
//! redo reattaches the same node. A discarded command releases the detached
//! nodes only it could have reattached.

use super::{quoted, Command, CommandKind};
use crate::error::{EditError, Result};
use crate::xml::{normalize_text, NodeId, XmlElement, XmlTree};

fn check_new_id(tree: &XmlTree, new_id: &str) -> Result<()> {
    if new_id.is_empty() {
        return Err(EditError::InvalidIdentifier(new_id.to_string()));
    }
    if tree.contains_id(new_id) {
        return Err(EditError::DuplicateIdentifier(new_id.to_string()));
    }
    Ok(())
}

fn resolve(tree: &XmlTree, id: &str) -> Result<NodeId> {
    tree.lookup(id)
        .ok_or_else(|| EditError::NotFound(id.to_string()))
}

fn resolve_non_root(tree: &XmlTree, id: &str) -> Result<NodeId> {
    let node = resolve(tree, id)?;
    if tree.is_root(node) {
        return Err(EditError::IllegalRootOperation(id.to_string()));
    }
    Ok(node)
}

#[derive(Debug, Clone)]
pub struct InsertBeforeCommand {
    tag: String,
    new_id: String,
    target_id: String,
    text: String,
    created: Option<NodeId>,
    executed: bool,
}

impl InsertBeforeCommand {
    pub fn new(
        tag: impl Into<String>,
        new_id: impl Into<String>,
        target_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            new_id: new_id.into(),
            target_id: target_id.into(),
            text: normalize_text(text.into()),
            created: None,
            executed: false,
        }
    }
}

impl Command for InsertBeforeCommand {
    type Target = XmlTree;

    fn execute(&mut self, tree: &mut XmlTree) -> Result<()> {
        if self.executed {
            return Ok(());
        }
        check_new_id(tree, &self.new_id)?;
        let target = resolve_non_root(tree, &self.target_id)?;
        let parent = tree
            .element(target)
            .parent()
            .ok_or_else(|| EditError::IllegalRootOperation(self.target_id.clone()))?;
        let position = tree
            .position_in_parent(target)
            .ok_or_else(|| EditError::NotFound(self.target_id.clone()))?;

        let node = match self.created {
            Some(node) => node,
            None => tree.alloc(
                XmlElement::new(self.tag.as_str())
                    .with_id(self.new_id.as_str())
                    .with_text(self.text.as_str()),
            ),
        };
        tree.attach(parent, position, node);
        tree.register(self.new_id.clone(), node);

        self.created = Some(node);
        self.executed = true;
        Ok(())
    }

    fn undo(&mut self, tree: &mut XmlTree) {
        if !self.executed {
            return;
        }
        if let Some(node) = self.created {
            tree.detach(node);
            tree.unregister(&self.new_id);
        }
        self.executed = false;
    }

    fn is_executed(&self) -> bool {
        self.executed
    }

    fn kind(&self) -> CommandKind {
        CommandKind::InsertBefore
    }

    fn release(&mut self, tree: &mut XmlTree) {
        if self.executed {
            return;
        }
        if let Some(node) = self.created.take() {
            tree.release(node);
        }
    }

    fn describe(&self) -> String {
        format!(
            "insert-before {} {} {} {}",
            self.tag,
            self.new_id,
            self.target_id,
            quoted(&self.text)
        )
    }
}

#[derive(Debug, Clone)]
pub struct AppendChildCommand {
    tag: String,
    new_id: String,
    parent_id: String,
    text: String,
    created: Option<NodeId>,
    executed: bool,
}

impl AppendChildCommand {
    pub fn new(
        tag: impl Into<String>,
        new_id: impl Into<String>,
        parent_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            new_id: new_id.into(),
            parent_id: parent_id.into(),
            text: normalize_text(text.into()),
            created: None,
            executed: false,
        }
    }
}

impl Command for AppendChildCommand {
    type Target = XmlTree;

    fn execute(&mut self, tree: &mut XmlTree) -> Result<()> {
        if self.executed {
            return Ok(());
        }
        let parent = resolve(tree, &self.parent_id)?;
        check_new_id(tree, &self.new_id)?;

        let node = match self.created {
            Some(node) => node,
            None => tree.alloc(
                XmlElement::new(self.tag.as_str())
                    .with_id(self.new_id.as_str())
                    .with_text(self.text.as_str()),
            ),
        };
        tree.append(parent, node);
        tree.register(self.new_id.clone(), node);

        self.created = Some(node);
        self.executed = true;
        Ok(())
    }

    fn undo(&mut self, tree: &mut XmlTree) {
        if !self.executed {
            return;
        }
        if let Some(node) = self.created {
            tree.detach(node);
            tree.unregister(&self.new_id);
        }
        self.executed = false;
    }

    fn is_executed(&self) -> bool {
        self.executed
    }

    fn kind(&self) -> CommandKind {
        CommandKind::AppendChild
    }

    fn release(&mut self, tree: &mut XmlTree) {
        if self.executed {
            return;
        }
        if let Some(node) = self.created.take() {
            tree.release(node);
        }
    }

    fn describe(&self) -> String {
        format!(
            "append-child {} {} {} {}",
            self.tag,
            self.new_id,
            self.parent_id,
            quoted(&self.text)
        )
    }
}

#[derive(Debug, Clone)]
pub struct EditIdCommand {
    old_id: String,
    new_id: String,
    renamed: Option<NodeId>,
}

impl EditIdCommand {
    pub fn new(old_id: impl Into<String>, new_id: impl Into<String>) -> Self {
        Self {
            old_id: old_id.into(),
            new_id: new_id.into(),
            renamed: None,
        }
    }
}

impl Command for EditIdCommand {
    type Target = XmlTree;

    fn execute(&mut self, tree: &mut XmlTree) -> Result<()> {
        if self.renamed.is_some() {
            return Ok(());
        }
        let node = resolve_non_root(tree, &self.old_id)?;
        check_new_id(tree, &self.new_id)?;

        tree.unregister(&self.old_id);
        tree.set_identifier(node, Some(self.new_id.clone()));
        tree.register(self.new_id.clone(), node);

        self.renamed = Some(node);
        Ok(())
    }

    fn undo(&mut self, tree: &mut XmlTree) {
        if let Some(node) = self.renamed.take() {
            tree.unregister(&self.new_id);
            tree.set_identifier(node, Some(self.old_id.clone()));
            tree.register(self.old_id.clone(), node);
        }
    }

    fn is_executed(&self) -> bool {
        self.renamed.is_some()
    }

    fn kind(&self) -> CommandKind {
        CommandKind::EditId
    }

    fn describe(&self) -> String {
        format!("edit-id {} {}", self.old_id, self.new_id)
    }
}

#[derive(Debug, Clone)]
pub struct EditTextCommand {
    element_id: String,
    text: String,
    /// Edited node and the text it held before; present only while executed
    previous: Option<(NodeId, String)>,
}

impl EditTextCommand {
    pub fn new(element_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            text: normalize_text(text.into()),
            previous: None,
        }
    }
}

impl Command for EditTextCommand {
    type Target = XmlTree;

    fn execute(&mut self, tree: &mut XmlTree) -> Result<()> {
        if self.previous.is_some() {
            return Ok(());
        }
        let node = resolve(tree, &self.element_id)?;
        let old = tree.set_text(node, self.text.clone());
        self.previous = Some((node, old));
        Ok(())
    }

    fn undo(&mut self, tree: &mut XmlTree) {
        if let Some((node, old)) = self.previous.take() {
            tree.set_text(node, old);
        }
    }

    fn is_executed(&self) -> bool {
        self.previous.is_some()
    }

    fn kind(&self) -> CommandKind {
        CommandKind::EditText
    }

    fn describe(&self) -> String {
        format!("edit-text {} {}", self.element_id, quoted(&self.text))
    }
}

#[derive(Debug, Clone)]
struct Removal {
    node: NodeId,
    parent: NodeId,
    position: usize,
    identifiers: Vec<(String, NodeId)>,
}

#[derive(Debug, Clone)]
pub struct DeleteElementCommand {
    element_id: String,
    removal: Option<Removal>,
}

impl DeleteElementCommand {
    pub fn new(element_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            removal: None,
        }
    }

    /// Number of indexed identifiers removed with the subtree, while executed
    pub fn removed_count(&self) -> usize {
        self.removal
            .as_ref()
            .map(|removal| removal.identifiers.len())
            .unwrap_or(0)
    }
}

impl Command for DeleteElementCommand {
    type Target = XmlTree;

    fn execute(&mut self, tree: &mut XmlTree) -> Result<()> {
        if self.removal.is_some() {
            return Ok(());
        }
        let node = resolve_non_root(tree, &self.element_id)?;
        let identifiers = tree.identified_in(node);
        let (parent, position) = tree
            .detach(node)
            .ok_or_else(|| EditError::IllegalRootOperation(self.element_id.clone()))?;
        for (id, _) in &identifiers {
            tree.unregister(id);
        }

        self.removal = Some(Removal {
            node,
            parent,
            position,
            identifiers,
        });
        Ok(())
    }

    fn undo(&mut self, tree: &mut XmlTree) {
        if let Some(removal) = self.removal.take() {
            tree.attach(removal.parent, removal.position, removal.node);
            for (id, node) in removal.identifiers {
                tree.register(id, node);
            }
        }
    }

    fn is_executed(&self) -> bool {
        self.removal.is_some()
    }

    fn kind(&self) -> CommandKind {
        CommandKind::DeleteElement
    }

    fn release(&mut self, tree: &mut XmlTree) {
        if let Some(removal) = self.removal.take() {
            tree.release(removal.node);
        }
    }

    fn describe(&self) -> String {
        format!("delete {}", self.element_id)
    }
}

#[derive(Debug, Clone)]
pub enum XmlCommand {
    InsertBefore(InsertBeforeCommand),
    AppendChild(AppendChildCommand),
    EditId(EditIdCommand),
    EditText(EditTextCommand),
    Delete(DeleteElementCommand),
}

impl XmlCommand {
    fn inner(&self) -> &dyn Command<Target = XmlTree> {
        match self {
            XmlCommand::InsertBefore(cmd) => cmd,
            XmlCommand::AppendChild(cmd) => cmd,
            XmlCommand::EditId(cmd) => cmd,
            XmlCommand::EditText(cmd) => cmd,
            XmlCommand::Delete(cmd) => cmd,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Command<Target = XmlTree> {
        match self {
            XmlCommand::InsertBefore(cmd) => cmd,
            XmlCommand::AppendChild(cmd) => cmd,
            XmlCommand::EditId(cmd) => cmd,
            XmlCommand::EditText(cmd) => cmd,
            XmlCommand::Delete(cmd) => cmd,
        }
    }
}

impl Command for XmlCommand {
    type Target = XmlTree;

    fn execute(&mut self, tree: &mut XmlTree) -> Result<()> {
        self.inner_mut().execute(tree)
    }

    fn undo(&mut self, tree: &mut XmlTree) {
        self.inner_mut().undo(tree)
    }

    fn is_executed(&self) -> bool {
        self.inner().is_executed()
    }

    fn kind(&self) -> CommandKind {
        self.inner().kind()
    }

    fn describe(&self) -> String {
        self.inner().describe()
    }

    fn release(&mut self, tree: &mut XmlTree) {
        self.inner_mut().release(tree)
    }
}

impl From<InsertBeforeCommand> for XmlCommand {
    fn from(cmd: InsertBeforeCommand) -> Self {
        XmlCommand::InsertBefore(cmd)
    }
}

impl From<AppendChildCommand> for XmlCommand {
    fn from(cmd: AppendChildCommand) -> Self {
        XmlCommand::AppendChild(cmd)
    }
}

impl From<EditIdCommand> for XmlCommand {
    fn from(cmd: EditIdCommand) -> Self {
        XmlCommand::EditId(cmd)
    }
}

impl From<EditTextCommand> for XmlCommand {
    fn from(cmd: EditTextCommand) -> Self {
        XmlCommand::EditText(cmd)
    }
}

impl From<DeleteElementCommand> for XmlCommand {
    fn from(cmd: DeleteElementCommand) -> Self {
        XmlCommand::Delete(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse;

    fn library() -> XmlTree {
        parse(
            r#"<library id="root">
                <shelf id="s1">
                    <book id="b1"><title id="t1">One</title></book>
                    <book id="b2"/>
                </shelf>
                <shelf id="s2"/>
            </library>"#,
        )
        .unwrap()
    }

    fn child_ids(tree: &XmlTree, id: &str) -> Vec<String> {
        tree.children(tree.lookup(id).unwrap())
            .map(|e| e.id().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn append_child_adds_last_child_and_indexes_it() {
        let mut tree = XmlTree::with_default_root();
        let mut cmd = AppendChildCommand::new("book", "b2", "root", "Title");
        cmd.execute(&mut tree).unwrap();

        let root = tree.root_element();
        assert_eq!(root.children().len(), 1);
        let book = tree.element_by_id("b2").unwrap();
        assert_eq!(book.tag(), "book");
        assert_eq!(book.text(), "Title");
        assert_eq!(book.attribute("id"), Some("b2"));
        assert_eq!(book.parent(), Some(tree.root()));

        cmd.undo(&mut tree);
        assert!(tree.root_element().is_leaf());
        assert!(!tree.contains_id("b2"));
    }

    #[test]
    fn append_child_errors() {
        let mut tree = library();
        let before = tree.clone();

        let err = AppendChildCommand::new("x", "new", "missing", "")
            .execute(&mut tree)
            .unwrap_err();
        assert!(matches!(err, EditError::NotFound(_)));

        let err = AppendChildCommand::new("x", "b1", "s2", "")
            .execute(&mut tree)
            .unwrap_err();
        assert!(matches!(err, EditError::DuplicateIdentifier(_)));

        let err = AppendChildCommand::new("x", "", "s2", "")
            .execute(&mut tree)
            .unwrap_err();
        assert!(matches!(err, EditError::InvalidIdentifier(_)));

        assert_eq!(tree, before);
        assert_eq!(tree.ids(), before.ids());
    }

    #[test]
    fn insert_before_places_element_ahead_of_target() {
        let mut tree = library();
        let mut cmd = InsertBeforeCommand::new("book", "b0", "b2", "Zero");
        cmd.execute(&mut tree).unwrap();
        assert_eq!(child_ids(&tree, "s1"), vec!["b1", "b0", "b2"]);
        assert_eq!(tree.element_by_id("b0").unwrap().text(), "Zero");

        cmd.undo(&mut tree);
        assert_eq!(child_ids(&tree, "s1"), vec!["b1", "b2"]);
        assert!(!tree.contains_id("b0"));
    }

    #[test]
    fn insert_before_root_is_illegal() {
        let mut tree = XmlTree::with_default_root();
        let mut cmd = InsertBeforeCommand::new("tag", "x", "root", "");
        let err = cmd.execute(&mut tree).unwrap_err();
        assert!(matches!(err, EditError::IllegalRootOperation(_)));
        assert!(!cmd.is_executed());
        assert_eq!(tree, XmlTree::with_default_root());
        assert!(!tree.contains_id("x"));
    }

    #[test]
    fn insert_before_error_precedence() {
        let mut tree = library();
        assert!(matches!(
            InsertBeforeCommand::new("x", "b1", "missing", "").execute(&mut tree),
            Err(EditError::DuplicateIdentifier(_))
        ));
        assert!(matches!(
            InsertBeforeCommand::new("x", "fresh", "missing", "").execute(&mut tree),
            Err(EditError::NotFound(_))
        ));
    }

    #[test]
    fn redo_reuses_created_node() {
        let mut tree = library();
        let mut cmd = InsertBeforeCommand::new("book", "b0", "b1", "");
        cmd.execute(&mut tree).unwrap();
        let first = tree.lookup("b0").unwrap();
        cmd.undo(&mut tree);
        cmd.execute(&mut tree).unwrap();
        assert_eq!(tree.lookup("b0"), Some(first));
        assert_eq!(child_ids(&tree, "s1"), vec!["b0", "b1", "b2"]);
    }

    #[test]
    fn edit_id_rekeys_index_and_attribute() {
        let mut tree = XmlTree::with_default_root();
        AppendChildCommand::new("book", "b2", "root", "Title")
            .execute(&mut tree)
            .unwrap();

        let mut cmd = EditIdCommand::new("b2", "b3");
        cmd.execute(&mut tree).unwrap();
        assert!(!tree.contains_id("b2"));
        let renamed = tree.element_by_id("b3").unwrap();
        assert_eq!(renamed.id(), Some("b3"));
        assert_eq!(renamed.attribute("id"), Some("b3"));

        cmd.undo(&mut tree);
        assert!(tree.contains_id("b2"));
        assert!(!tree.contains_id("b3"));
        assert_eq!(tree.element_by_id("b2").unwrap().attribute("id"), Some("b2"));
    }

    #[test]
    fn edit_id_errors() {
        let mut tree = library();
        assert!(matches!(
            EditIdCommand::new("nope", "x").execute(&mut tree),
            Err(EditError::NotFound(_))
        ));
        assert!(matches!(
            EditIdCommand::new("root", "x").execute(&mut tree),
            Err(EditError::IllegalRootOperation(_))
        ));
        assert!(matches!(
            EditIdCommand::new("b1", "b2").execute(&mut tree),
            Err(EditError::DuplicateIdentifier(_))
        ));
        assert!(matches!(
            EditIdCommand::new("b1", "b1").execute(&mut tree),
            Err(EditError::DuplicateIdentifier(_))
        ));
        assert_eq!(tree, library());
    }

    #[test]
    fn edit_text_undo_restores_empty_previous_text() {
        let mut tree = library();
        let mut cmd = EditTextCommand::new("b2", "Now titled");
        cmd.execute(&mut tree).unwrap();
        assert_eq!(tree.element_by_id("b2").unwrap().text(), "Now titled");

        cmd.undo(&mut tree);
        assert_eq!(tree.element_by_id("b2").unwrap().text(), "");
        assert!(!cmd.is_executed());
    }

    #[test]
    fn edit_text_on_root_is_allowed() {
        let mut tree = library();
        let mut cmd = EditTextCommand::new("root", "catalog");
        cmd.execute(&mut tree).unwrap();
        assert_eq!(tree.root_element().text(), "catalog");
        cmd.undo(&mut tree);
        assert_eq!(tree, library());
    }

    #[test]
    fn text_is_stored_trimmed() {
        let mut tree = library();
        AppendChildCommand::new("note", "n1", "s2", "  padded ")
            .execute(&mut tree)
            .unwrap();
        InsertBeforeCommand::new("note", "n0", "n1", "\n\tleading")
            .execute(&mut tree)
            .unwrap();
        let mut edit = EditTextCommand::new("b2", " two  words\n");
        edit.execute(&mut tree).unwrap();

        assert_eq!(tree.element_by_id("n1").unwrap().text(), "padded");
        assert_eq!(tree.element_by_id("n0").unwrap().text(), "leading");
        assert_eq!(tree.element_by_id("b2").unwrap().text(), "two  words");
        assert_eq!(edit.describe(), "edit-text b2 \"two  words\"");

        let reparsed = parse(&crate::xml::to_xml(&tree, "    ")).unwrap();
        assert_eq!(reparsed, tree);
    }

    #[test]
    fn edit_text_missing_element() {
        let mut tree = library();
        assert!(matches!(
            EditTextCommand::new("ghost", "x").execute(&mut tree),
            Err(EditError::NotFound(_))
        ));
    }

    #[test]
    fn delete_removes_subtree_and_undo_restores_it() {
        let mut tree = library();
        let mut cmd = DeleteElementCommand::new("b1");
        cmd.execute(&mut tree).unwrap();
        assert_eq!(cmd.removed_count(), 2);
        assert_eq!(child_ids(&tree, "s1"), vec!["b2"]);
        assert!(!tree.contains_id("b1"));
        assert!(!tree.contains_id("t1"));

        cmd.undo(&mut tree);
        assert_eq!(child_ids(&tree, "s1"), vec!["b1", "b2"]);
        assert_eq!(tree.element_by_id("t1").unwrap().text(), "One");
        assert_eq!(tree.position_in_parent(tree.lookup("b1").unwrap()), Some(0));
        assert_eq!(tree, library());
        assert_eq!(tree.ids(), library().ids());
    }

    #[test]
    fn release_frees_only_unreachable_nodes() {
        let mut tree = XmlTree::with_default_root();
        let mut append = AppendChildCommand::new("book", "b1", "root", "");
        append.execute(&mut tree).unwrap();
        append.release(&mut tree);
        assert_eq!(tree.allocated(), 2);

        append.undo(&mut tree);
        append.release(&mut tree);
        assert_eq!(tree.allocated(), 1);

        let mut tree = library();
        let before = tree.allocated();
        let mut delete = DeleteElementCommand::new("b1");
        delete.execute(&mut tree).unwrap();
        delete.undo(&mut tree);
        delete.release(&mut tree);
        assert_eq!(tree.allocated(), before);

        delete.execute(&mut tree).unwrap();
        XmlCommand::from(delete).release(&mut tree);
        assert_eq!(tree.allocated(), before - 2);
        assert!(tree.repair_index().is_clean());
    }

    #[test]
    fn delete_whole_shelf_then_undo() {
        let mut tree = library();
        let mut cmd = DeleteElementCommand::new("s1");
        cmd.execute(&mut tree).unwrap();
        assert_eq!(tree.ids(), vec!["root", "s2"]);

        cmd.undo(&mut tree);
        assert_eq!(tree.ids(), vec!["b1", "b2", "root", "s1", "s2", "t1"]);
        assert!(tree.repair_index().is_clean());
    }

    #[test]
    fn delete_errors() {
        let mut tree = library();
        assert!(matches!(
            DeleteElementCommand::new("root").execute(&mut tree),
            Err(EditError::IllegalRootOperation(_))
        ));
        assert!(matches!(
            DeleteElementCommand::new("ghost").execute(&mut tree),
            Err(EditError::NotFound(_))
        ));
        assert_eq!(tree, library());
    }

    #[test]
    fn identifiers_stay_unique_across_command_sequences() {
        let mut tree = library();
        let mut applied: Vec<XmlCommand> = Vec::new();
        let attempts: Vec<XmlCommand> = vec![
            AppendChildCommand::new("book", "b3", "s2", "").into(),
            AppendChildCommand::new("book", "b3", "s1", "").into(),
            InsertBeforeCommand::new("book", "b4", "b3", "").into(),
            EditIdCommand::new("b4", "b1").into(),
            EditIdCommand::new("b4", "b5").into(),
            DeleteElementCommand::new("s1").into(),
            AppendChildCommand::new("book", "b1", "s2", "").into(),
            InsertBeforeCommand::new("note", "t1", "b1", "").into(),
        ];

        for mut cmd in attempts {
            if cmd.execute(&mut tree).is_ok() {
                applied.push(cmd);
            }
            assert!(tree.repair_index().is_clean(), "index drifted");
        }
        assert_eq!(applied.len(), 6);

        for mut cmd in applied.into_iter().rev() {
            cmd.undo(&mut tree);
        }
        assert_eq!(tree, library());
        assert_eq!(tree.ids(), library().ids());
    }

    #[test]
    fn describe_renders_canonical_form() {
        let cmd: XmlCommand = AppendChildCommand::new("book", "b2", "root", "Title").into();
        assert_eq!(cmd.describe(), "append-child book b2 root \"Title\"");
        assert_eq!(cmd.kind(), CommandKind::AppendChild);
        assert_eq!(
            XmlCommand::from(DeleteElementCommand::new("b2")).describe(),
            "delete b2"
        );
    }
}
