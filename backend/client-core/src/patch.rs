//! Applies server-computed diff entries to the live document.
//!
//! Entries are independent: each one either applies or is skipped, and a
//! skipped entry never aborts the rest of the batch. Only the targeted nodes
//! are touched, so unaffected elements keep their live form state.

use crate::dom::{Document, Node, build_element};
use crate::protocol::{DiffEntry, DiffStatus};

use log::debug;

/// Why an entry had nothing to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchMiss {
    ParentNotFound(String),
    ChildNotFound { parent: String, child: String },
    MissingParent,
    EmptyMarkup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    Skipped(PatchMiss),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub applied: usize,
    pub skipped: Vec<(String, PatchMiss)>,
}

pub fn apply_batch(document: &mut Document, batch: &[DiffEntry]) -> PatchReport {
    let mut report = PatchReport::default();
    for entry in batch {
        match apply_entry(document, entry) {
            PatchOutcome::Applied => report.applied += 1,
            PatchOutcome::Skipped(miss) => {
                debug!("Skipped diff entry {:?} ({:?}): {miss:?}", entry.target, entry.status);
                report.skipped.push((entry.target.clone(), miss));
            }
        }
    }
    report
}

pub fn apply_entry(document: &mut Document, entry: &DiffEntry) -> PatchOutcome {
    if entry.is_root_replacement() {
        document.replace_with(Document::parse(&entry.element));
        return PatchOutcome::Applied;
    }

    let Some(parent_id) = entry.parent.as_deref() else {
        return PatchOutcome::Skipped(PatchMiss::MissingParent);
    };

    let Some(parent) = document.find_mut(parent_id) else {
        return PatchOutcome::Skipped(PatchMiss::ParentNotFound(parent_id.to_string()));
    };

    match entry.status {
        DiffStatus::Added => {
            let Some(element) = build_element(&entry.element) else {
                return PatchOutcome::Skipped(PatchMiss::EmptyMarkup);
            };
            parent.append_child(Node::Element(element));
            PatchOutcome::Applied
        }
        DiffStatus::Removed => match parent.remove_descendant(&entry.element) {
            Some(_) => PatchOutcome::Applied,
            None => PatchOutcome::Skipped(PatchMiss::ChildNotFound {
                parent: parent_id.to_string(),
                child: entry.element.clone(),
            }),
        },
        DiffStatus::Changed => {
            let Some(element) = build_element(&entry.element) else {
                return PatchOutcome::Skipped(PatchMiss::EmptyMarkup);
            };
            let child_id = element
                .uuid()
                .map(str::to_string)
                .unwrap_or_else(|| entry.target.clone());

            match parent.replace_descendant(&child_id, element) {
                Ok(()) => PatchOutcome::Applied,
                Err(_) => PatchOutcome::Skipped(PatchMiss::ChildNotFound {
                    parent: parent_id.to_string(),
                    child: child_id,
                }),
            }
        }
    }
}
