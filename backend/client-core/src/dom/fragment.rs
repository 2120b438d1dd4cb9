//! Node construction from a markup fragment.
//!
//! Elements such as `tr`, `td`, `li` or `option` are not legal as direct
//! children of a generic container, and parsing them in isolation drops or
//! reshapes them. The fragment is therefore parsed inside the ancestor chain
//! its first element requires, and the first element built at that depth is
//! returned.

use crate::dom::node::{Element, Node};
use crate::dom::parser::parse_fragment;

/// Synthetic ancestors (outermost first) a fragment starting with `tag` needs.
pub fn context_for(tag: &str) -> &'static [&'static str] {
    match tag {
        "tr" => &["table", "tbody"],
        "td" | "th" => &["table", "tbody", "tr"],
        "tbody" | "thead" | "tfoot" | "caption" | "colgroup" => &["table"],
        "col" => &["table", "colgroup"],
        "li" => &["ul"],
        "option" | "optgroup" => &["select"],
        "dt" | "dd" => &["dl"],
        "legend" => &["fieldset"],
        "area" => &["map"],
        _ => &[],
    }
}

/// Tag name of the first element in `markup`, lower-cased.
pub fn leading_tag(markup: &str) -> Option<String> {
    let mut rest = markup;
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("<!--") {
            rest = &after[after.find("-->")? + 3..];
            continue;
        }
        let after = rest.strip_prefix('<')?;
        let end = after
            .find(|ch: char| ch.is_ascii_whitespace() || ch == '>' || ch == '/')
            .unwrap_or(after.len());
        let name = &after[..end];
        if name.is_empty() || !name.starts_with(|ch: char| ch.is_ascii_alphabetic()) {
            return None;
        }
        return Some(name.to_ascii_lowercase());
    }
}

/// Build the first element described by `markup`.
pub fn build_element(markup: &str) -> Option<Element> {
    let context = leading_tag(markup)
        .map(|tag| context_for(&tag))
        .unwrap_or(&[]);

    parse_fragment(markup, context)
        .into_iter()
        .find_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
}
