//! Markup serialization, matching what `outerHTML` produces.

use crate::dom::node::{Element, Node};
use crate::dom::parser::{is_raw_text, is_void};

impl Element {
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(element.tag());
    for (name, value) in element.attributes() {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_into(value, true, out);
        out.push('"');
    }
    out.push('>');

    if is_void(element.tag()) {
        return;
    }

    let raw = is_raw_text(element.tag());
    for child in element.children() {
        write_node(child, raw, out);
    }

    out.push_str("</");
    out.push_str(element.tag());
    out.push('>');
}

fn write_node(node: &Node, raw: bool, out: &mut String) {
    match node {
        Node::Element(element) => write_element(element, out),
        Node::Text(text) if raw => out.push_str(text),
        Node::Text(text) => escape_into(text, false, out),
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}
