use linetree::{Document, EditError, TextDocument, XmlDocument, XmlTree};

fn text(content: &str) -> TextDocument {
    TextDocument::from_content(content, &Default::default())
}

fn with_book() -> XmlDocument {
    let mut doc = XmlDocument::default();
    doc.append_child("book", "b2", "root", "Title").unwrap();
    doc
}

#[test]
fn test_multiline_insert_and_undo() {
    let mut doc = text("X");
    doc.insert(1, 1, "AB\nCD").unwrap();
    assert_eq!(doc.lines(), ["AB", "CDX"]);

    doc.undo().unwrap();
    assert_eq!(doc.lines(), ["X"]);
}

#[test]
fn test_single_char_delete_and_undo() {
    let mut doc = text("Hello");
    doc.delete(1, 1, 1).unwrap();
    assert_eq!(doc.lines(), ["ello"]);

    doc.undo().unwrap();
    assert_eq!(doc.lines(), ["Hello"]);
}

#[test]
fn test_append_child_to_root() {
    let doc = with_book();
    let tree = doc.tree();
    let root = tree.root_element();
    let last = *root.children().last().unwrap();
    let book = tree.element(last);

    assert_eq!(book.tag(), "book");
    assert_eq!(book.id(), Some("b2"));
    assert_eq!(book.text(), "Title");
    assert!(tree.contains_id("b2"));
}

#[test]
fn test_edit_id_and_undo() {
    let mut doc = with_book();
    doc.edit_id("b2", "b3").unwrap();
    assert!(!doc.tree().contains_id("b2"));
    assert!(doc.tree().contains_id("b3"));

    doc.undo().unwrap();
    assert!(doc.tree().contains_id("b2"));
    assert!(!doc.tree().contains_id("b3"));
}

#[test]
fn test_delete_element_and_undo() {
    let mut doc = with_book();
    let before = doc.tree().clone();

    doc.delete("b2").unwrap();
    assert!(doc.tree().root_element().children().is_empty());
    assert!(!doc.tree().contains_id("b2"));

    doc.undo().unwrap();
    assert_eq!(doc.tree(), &before);
    assert_eq!(doc.tree().ids(), before.ids());
}

#[test]
fn test_insert_before_root_is_rejected() {
    let mut doc = XmlDocument::default();
    let result = doc.insert_before("tag", "x", "root", "");

    assert!(matches!(result, Err(EditError::IllegalRootOperation(_))));
    assert_eq!(doc.tree(), &XmlTree::with_default_root());
    assert!(!doc.is_modified());
    assert!(doc.undo().unwrap().is_none());
}

#[test]
fn test_mixed_text_session_round_trips_through_undo() {
    let mut doc = text("alpha\nbeta\ngamma");
    let original = doc.get_content();

    doc.append("delta").unwrap();
    doc.insert(2, 3, "--\n--").unwrap();
    doc.replace(1, 1, 5, "ALPHA").unwrap();
    doc.delete(4, 1, 2).unwrap();
    assert_eq!(doc.get_content(), "ALPHA\nbe--\n--ta\nmma\ndelta");

    while doc.undo().unwrap().is_some() {}
    assert_eq!(doc.get_content(), original);

    while doc.redo().unwrap().is_some() {}
    assert_eq!(doc.get_content(), "ALPHA\nbe--\n--ta\nmma\ndelta");
}

#[test]
fn test_xml_serialized_form_reparses_equal() {
    let mut doc = XmlDocument::default();
    doc.append_child("shelf", "s1", "root", "").unwrap();
    doc.append_child("book", "b1", "s1", "Dune & <Sequels>").unwrap();
    doc.insert_before("book", "b0", "b1", "").unwrap();
    doc.edit_text("root", "catalog").unwrap();

    let reloaded = XmlDocument::from_content(&doc.get_content(), &Default::default()).unwrap();
    assert_eq!(reloaded.tree(), doc.tree());
    assert_eq!(reloaded.tree().ids(), doc.tree().ids());
}

#[test]
fn test_padded_text_reparses_equal() {
    let mut doc = XmlDocument::default();
    doc.append_child("note", "n", "root", "  padded ").unwrap();
    doc.append_child("note", "m", "root", "").unwrap();
    doc.edit_text("m", "\tline one\n  line two \n").unwrap();

    let tree = doc.tree();
    assert_eq!(tree.element_by_id("n").unwrap().text(), "padded");
    assert_eq!(tree.element_by_id("m").unwrap().text(), "line one\n  line two");

    let reloaded = XmlDocument::from_content(&doc.get_content(), &Default::default()).unwrap();
    assert_eq!(reloaded.tree(), doc.tree());
}
