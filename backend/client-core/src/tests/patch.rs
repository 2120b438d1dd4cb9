// Unit tests for the patch engine

use crate::dom::{Document, Element};
use crate::patch::{PatchMiss, PatchOutcome, apply_batch, apply_entry};
use crate::protocol::{DiffEntry, DiffStatus, ServerMessage};

const PAGE: &str = r#"<html><head></head><body uuid="body"><div uuid="root"><p uuid="a">A</p><p uuid="b">B</p></div></body></html>"#;

fn entry(target: &str, status: DiffStatus, parent: Option<&str>, element: &str) -> DiffEntry {
    DiffEntry {
        target: target.to_string(),
        status,
        parent: parent.map(str::to_string),
        element: element.to_string(),
    }
}

fn child_ids(document: &Document, parent: &str) -> Vec<String> {
    document
        .find(parent)
        .map(|element| element.child_uuids().into_iter().map(str::to_string).collect())
        .unwrap_or_default()
}

/// **VALUE**: Verifies the canonical "Added" message lands under its parent.
///
/// **WHY THIS MATTERS**: This is the most common diff the server sends when state grows.
#[test]
fn given_added_template_message_when_applied_then_div_becomes_child_of_root() {
    // GIVEN: A page with an element identified as `root`
    let mut document = Document::parse(PAGE);
    let message = ServerMessage::from_wire(
        r#"{"template": {"e1": {"status":"Added","parent":"root","element":"<div uuid=\"e1\">hi</div>"}}}"#,
    )
    .expect("decodes");
    let batch = match message {
        ServerMessage::Patch(batch) => batch,
        other => panic!("expected a patch, got {other:?}"),
    };

    // WHEN: Applying the batch
    let report = apply_batch(&mut document, &batch);

    // THEN: A div with uuid e1 and text hi is the last child of root
    assert_eq!(report.applied, 1);
    let root = document.find("root").expect("root");
    let added = root.child_elements().last().expect("a child");
    assert_eq!(added.tag(), "div");
    assert_eq!(added.uuid(), Some("e1"));
    assert_eq!(added.text_content(), "hi");
}

/// **VALUE**: Verifies Added followed by Removed restores the original child set.
///
/// **BUG THIS CATCHES**: Would catch if Removed looked the child up by the entry key
/// instead of the identifier carried in the payload.
#[test]
fn given_added_then_removed_same_id_when_applied_then_children_match_original() {
    // GIVEN: The original children of root
    let mut document = Document::parse(PAGE);
    let before = child_ids(&document, "root");

    // WHEN: Adding then removing the same identifier
    let added = apply_entry(
        &mut document,
        &entry("x", DiffStatus::Added, Some("root"), r#"<span uuid="x">new</span>"#),
    );
    let removed = apply_entry(&mut document, &entry("x", DiffStatus::Removed, Some("root"), "x"));

    // THEN: The child set is back to what it was
    assert_eq!(added, PatchOutcome::Applied);
    assert_eq!(removed, PatchOutcome::Applied);
    assert_eq!(child_ids(&document, "root"), before);
}

/// **VALUE**: Verifies a Changed entry is idempotent.
///
/// **WHY THIS MATTERS**: Diffs may be resent after reconnects; applying twice must not
/// duplicate or lose nodes.
#[test]
fn given_changed_entry_when_applied_twice_then_state_equals_single_application() {
    // GIVEN: Two copies of the page and a Changed entry for `a`
    let change = entry("a", DiffStatus::Changed, Some("root"), r#"<p uuid="a" class="hot">A2</p>"#);
    let mut once = Document::parse(PAGE);
    let mut twice = Document::parse(PAGE);

    // WHEN: Applying once and twice
    apply_entry(&mut once, &change);
    apply_entry(&mut twice, &change);
    apply_entry(&mut twice, &change);

    // THEN: Both documents are identical and the change is visible
    assert_eq!(once, twice);
    assert_eq!(once.find("a").and_then(|p| p.attr("class")), Some("hot"));
    assert_eq!(child_ids(&once, "root"), vec!["a", "b"]);
}

#[test]
fn given_changed_entry_when_applied_then_siblings_keep_live_state() {
    // GIVEN: A sibling input with a value typed by the user
    let mut document = Document::parse(
        r#"<body><div uuid="root"><input uuid="in"><p uuid="a">A</p></div></body>"#,
    );
    if let Some(input) = document.find_mut("in") {
        input.set_value("typed");
    }

    // WHEN: Replacing the paragraph
    apply_entry(
        &mut document,
        &entry("a", DiffStatus::Changed, Some("root"), r#"<p uuid="a">changed</p>"#),
    );

    // THEN: The untouched input keeps its live value
    assert_eq!(document.find("in").map(Element::value), Some("typed".to_string()));
    assert_eq!(document.find("a").map(Element::text_content), Some("changed".to_string()));
}

#[test]
fn given_changed_markup_without_identifier_when_applied_then_entry_key_locates_child() {
    let mut document = Document::parse(PAGE);

    let outcome = apply_entry(&mut document, &entry("b", DiffStatus::Changed, Some("root"), "<p>plain</p>"));

    assert_eq!(outcome, PatchOutcome::Applied);
    assert_eq!(child_ids(&document, "root"), vec!["a"]);
    let root = document.find("root").expect("root");
    assert_eq!(root.child_elements().nth(1).map(Element::text_content), Some("plain".into()));
}

#[test]
fn given_root_level_changed_when_applied_then_whole_document_is_replaced() {
    let mut document = Document::parse(PAGE);

    let outcome = apply_entry(
        &mut document,
        &DiffEntry::root_replacement(r#"<html><body><main uuid="m"></main></body></html>"#),
    );

    assert_eq!(outcome, PatchOutcome::Applied);
    assert!(document.find("root").is_none());
    assert!(document.find("m").is_some());
}

#[test]
fn given_unknown_parent_when_applied_then_entry_is_skipped_silently() {
    let mut document = Document::parse(PAGE);
    let before = document.clone();

    let outcome = apply_entry(
        &mut document,
        &entry("z", DiffStatus::Added, Some("ghost"), r#"<i uuid="z"></i>"#),
    );

    assert_eq!(outcome, PatchOutcome::Skipped(PatchMiss::ParentNotFound("ghost".into())));
    assert_eq!(document, before);
}

#[test]
fn given_removed_child_already_gone_when_applied_then_skipped_without_change() {
    let mut document = Document::parse(PAGE);
    let before = document.clone();

    let outcome = apply_entry(&mut document, &entry("q", DiffStatus::Removed, Some("root"), "q"));

    assert!(matches!(outcome, PatchOutcome::Skipped(PatchMiss::ChildNotFound { .. })));
    assert_eq!(document, before);
}

#[test]
fn given_added_without_parent_when_applied_then_skipped() {
    let mut document = Document::parse(PAGE);

    let outcome = apply_entry(&mut document, &entry("n", DiffStatus::Added, None, "<i></i>"));

    assert_eq!(outcome, PatchOutcome::Skipped(PatchMiss::MissingParent));
}

#[test]
fn given_batch_with_stale_entry_when_applied_then_other_entries_still_apply() {
    // GIVEN: One entry pointing at a removed parent and one valid entry
    let mut document = Document::parse(PAGE);
    let batch = vec![
        entry("z", DiffStatus::Added, Some("gone"), "<i uuid=\"z\"></i>"),
        entry("c", DiffStatus::Added, Some("root"), "<p uuid=\"c\">C</p>"),
    ];

    // WHEN: Applying the batch
    let report = apply_batch(&mut document, &batch);

    // THEN: The valid entry applied and the stale one was reported
    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(child_ids(&document, "root"), vec!["a", "b", "c"]);
}

#[test]
fn given_row_added_to_table_body_when_applied_then_row_is_appended() {
    // GIVEN: A table with an identified body
    let mut document = Document::parse(
        r#"<body><table><tbody uuid="tb"><tr uuid="r1"><td>1</td></tr></tbody></table></body>"#,
    );

    // WHEN: Adding a row fragment
    let outcome = apply_entry(
        &mut document,
        &entry("r2", DiffStatus::Added, Some("tb"), r#"<tr uuid="r2"><td>2</td></tr>"#),
    );

    // THEN: The row is a real tr child of the body
    assert_eq!(outcome, PatchOutcome::Applied);
    assert_eq!(child_ids(&document, "tb"), vec!["r1", "r2"]);
    assert_eq!(document.find("r2").map(Element::tag), Some("tr"));
}
