//! Lenient HTML tokenizer and tree builder.
//!
//! Covers what server-rendered markup needs: attributes in any quoting style,
//! void and self-closed elements, raw text elements, comments, doctype,
//! character references, and the implied end tags of lists, options and
//! tables. Like a browser, table-structure tags are dropped when no `table`
//! is open; [`crate::dom::fragment`] supplies the ancestor chain that keeps them.

use crate::dom::node::{Element, Node};

use std::mem::take;

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];
const ESCAPABLE_RAW_TEXT_ELEMENTS: [&str; 2] = ["textarea", "title"];

const TABLE_STRUCTURE: [&str; 9] = [
    "caption", "col", "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr",
];
const TABLE_SECTIONS: [&str; 3] = ["tbody", "thead", "tfoot"];

const CLOSES_PARAGRAPH: [&str; 24] = [
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol",
    "p", "section",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    StartTag {
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag(String),
    Text(String),
    Comment(String),
    Doctype(String),
}

/// Parse a whole document into its doctype and top-level nodes.
pub(crate) fn parse_document_nodes(markup: &str) -> (Option<String>, Vec<Node>) {
    let mut doctype = None;
    let mut builder = TreeBuilder::new(Vec::new());
    for token in tokenize(markup) {
        match token {
            Token::Doctype(value) => {
                doctype.get_or_insert(value);
            }
            other => builder.feed(other),
        }
    }
    (doctype, builder.finish())
}

/// Parse markup as the content of the given ancestor chain (outermost first).
pub fn parse_fragment(markup: &str, context: &[&str]) -> Vec<Node> {
    let context = context.iter().map(|tag| Element::new(tag)).collect();
    let mut builder = TreeBuilder::new(context);
    for token in tokenize(markup) {
        builder.feed(token);
    }
    builder.finish()
}

struct TreeBuilder {
    stack: Vec<Element>,
    base: usize,
    top_level: Vec<Node>,
}

impl TreeBuilder {
    fn new(context: Vec<Element>) -> Self {
        Self {
            base: context.len(),
            stack: context,
            top_level: Vec::new(),
        }
    }

    fn feed(&mut self, token: Token) {
        match token {
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => self.start_tag(name, attributes, self_closing),
            Token::EndTag(name) => self.end_tag(&name),
            Token::Text(text) => self.insert(Node::Text(text)),
            Token::Comment(text) => self.insert(Node::Comment(text)),
            Token::Doctype(_) => {}
        }
    }

    fn start_tag(&mut self, name: String, attributes: Vec<(String, String)>, self_closing: bool) {
        let tag = name.as_str();

        if TABLE_STRUCTURE.contains(&tag) && !self.has_open("table") {
            return;
        }

        self.imply_end_tags(tag);

        match tag {
            "tr" if self.current_is(&["table"]) => self.stack.push(Element::new("tbody")),
            "td" | "th" if self.current_is(&["table"]) => {
                self.stack.push(Element::new("tbody"));
                self.stack.push(Element::new("tr"));
            }
            "td" | "th" if self.current_is(&TABLE_SECTIONS) => self.stack.push(Element::new("tr")),
            _ => {}
        }

        let element = Element::from_parts(name.clone(), attributes);
        if is_void(&name) || self_closing {
            self.insert(Node::Element(element));
        } else {
            self.stack.push(element);
        }
    }

    fn imply_end_tags(&mut self, tag: &str) {
        match tag {
            "li" => self.close_open("li", &["ul", "ol", "menu"]),
            "dt" | "dd" => {
                self.close_open("dt", &["dl"]);
                self.close_open("dd", &["dl"]);
            }
            "option" => self.close_current(&["option"]),
            "optgroup" => {
                self.close_current(&["option"]);
                self.close_current(&["optgroup"]);
            }
            "tr" => self.close_above(&["tbody", "thead", "tfoot", "table"]),
            "td" | "th" => self.close_above(&["tr", "table"]),
            "tbody" | "thead" | "tfoot" | "caption" | "colgroup" => self.close_above(&["table"]),
            _ if CLOSES_PARAGRAPH.contains(&tag) => self.close_current(&["p"]),
            _ => {}
        }
    }

    fn end_tag(&mut self, name: &str) {
        if let Some(index) = self.open_index(name, &[]) {
            self.pop_to(index);
        }
    }

    fn insert(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.append_child(node),
            None => self.top_level.push(node),
        }
    }

    fn has_open(&self, tag: &str) -> bool {
        self.stack.iter().any(|element| element.tag() == tag)
    }

    fn current_is(&self, tags: &[&str]) -> bool {
        self.stack
            .last()
            .is_some_and(|element| tags.contains(&element.tag()))
    }

    /// Index of the nearest open `tag` that is not hidden behind a `barrier`.
    fn open_index(&self, tag: &str, barriers: &[&str]) -> Option<usize> {
        for index in (self.base..self.stack.len()).rev() {
            let current = self.stack[index].tag();
            if current == tag {
                return Some(index);
            }
            if barriers.contains(&current) {
                return None;
            }
        }
        None
    }

    fn close_open(&mut self, tag: &str, barriers: &[&str]) {
        if let Some(index) = self.open_index(tag, barriers) {
            self.pop_to(index);
        }
    }

    fn close_current(&mut self, tags: &[&str]) {
        if self.stack.len() > self.base && self.current_is(tags) {
            self.pop_one();
        }
    }

    /// Close everything above the nearest open element named in `anchors`.
    fn close_above(&mut self, anchors: &[&str]) {
        let anchor = (0..self.stack.len())
            .rev()
            .find(|index| anchors.contains(&self.stack[*index].tag()));
        if let Some(anchor) = anchor {
            while self.stack.len() > anchor + 1 && self.stack.len() > self.base {
                self.pop_one();
            }
        }
    }

    /// Pop elements until the one at `index` has been closed.
    fn pop_to(&mut self, index: usize) {
        while self.stack.len() > index && self.stack.len() > self.base {
            self.pop_one();
        }
    }

    fn pop_one(&mut self) {
        if let Some(element) = self.stack.pop() {
            self.insert(Node::Element(element));
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while self.stack.len() > self.base {
            self.pop_one();
        }
        match self.stack.last_mut() {
            Some(context) => take(context.children_mut()),
            None => self.top_level,
        }
    }
}

fn tokenize(input: &str) -> Vec<Token> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }

        let rest = &input[pos..];
        let next = bytes.get(pos + 1).copied();

        if rest.starts_with("<!--") {
            flush_text(input, text_start, pos, &mut tokens);
            let body_start = pos + 4;
            let (body_end, resume) = match input[body_start..].find("-->") {
                Some(offset) => (body_start + offset, body_start + offset + 3),
                None => (bytes.len(), bytes.len()),
            };
            tokens.push(Token::Comment(input[body_start..body_end].to_string()));
            pos = resume;
            text_start = pos;
        } else if matches!(next, Some(b'!') | Some(b'?')) {
            flush_text(input, text_start, pos, &mut tokens);
            let close = input[pos..].find('>').map_or(bytes.len(), |offset| pos + offset);
            let body = &input[pos + 2..close];
            if body.get(..7).is_some_and(|prefix| prefix.eq_ignore_ascii_case("doctype")) {
                let name = body.get(7..).unwrap_or_default();
                tokens.push(Token::Doctype(name.trim().to_string()));
            }
            pos = (close + 1).min(bytes.len());
            text_start = pos;
        } else if next == Some(b'/') && bytes.get(pos + 2).is_some_and(u8::is_ascii_alphabetic) {
            flush_text(input, text_start, pos, &mut tokens);
            let name_end = scan_name(bytes, pos + 2);
            let name = input[pos + 2..name_end].to_ascii_lowercase();
            let close = input[name_end..].find('>').map_or(bytes.len(), |offset| name_end + offset);
            tokens.push(Token::EndTag(name));
            pos = (close + 1).min(bytes.len());
            text_start = pos;
        } else if next.is_some_and(|byte| byte.is_ascii_alphabetic()) {
            let Some((token, after)) = parse_start_tag(input, pos) else {
                pos += 1;
                continue;
            };
            flush_text(input, text_start, pos, &mut tokens);

            let raw_name = match &token {
                Token::StartTag {
                    name, self_closing, ..
                } if !self_closing
                    && (is_raw_text(name) || ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&name.as_str())) =>
                {
                    Some(name.clone())
                }
                _ => None,
            };
            tokens.push(token);
            pos = after;

            if let Some(name) = raw_name {
                let closing = format!("</{name}");
                let end = input[pos..]
                    .to_ascii_lowercase()
                    .find(&closing)
                    .map_or(bytes.len(), |offset| pos + offset);
                let raw = &input[pos..end];
                if !raw.is_empty() {
                    let text = if is_raw_text(&name) {
                        raw.to_string()
                    } else {
                        decode_entities(raw)
                    };
                    tokens.push(Token::Text(text));
                }
                pos = end;
            }
            text_start = pos;
        } else {
            pos += 1;
        }
    }

    flush_text(input, text_start, bytes.len(), &mut tokens);
    tokens
}

fn flush_text(input: &str, start: usize, end: usize, tokens: &mut Vec<Token>) {
    if start < end {
        tokens.push(Token::Text(decode_entities(&input[start..end])));
    }
}

fn scan_name(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && !bytes[end].is_ascii_whitespace() && !matches!(bytes[end], b'/' | b'>') {
        end += 1;
    }
    end
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Parse `<name attr=...>` starting at the `<`. `None` when the tag never closes.
fn parse_start_tag(input: &str, start: usize) -> Option<(Token, usize)> {
    let bytes = input.as_bytes();
    let name_end = scan_name(bytes, start + 1);
    let name = input[start + 1..name_end].to_ascii_lowercase();
    let mut attributes: Vec<(String, String)> = Vec::new();
    let mut pos = name_end;

    loop {
        pos = skip_whitespace(bytes, pos);
        match bytes.get(pos)? {
            b'>' => {
                return Some((
                    Token::StartTag {
                        name,
                        attributes,
                        self_closing: false,
                    },
                    pos + 1,
                ));
            }
            b'/' if bytes.get(pos + 1) == Some(&b'>') => {
                return Some((
                    Token::StartTag {
                        name,
                        attributes,
                        self_closing: true,
                    },
                    pos + 2,
                ));
            }
            b'/' => {
                pos += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = pos;
        while pos < bytes.len()
            && !bytes[pos].is_ascii_whitespace()
            && !matches!(bytes[pos], b'=' | b'>')
            && !(bytes[pos] == b'/' && bytes.get(pos + 1) == Some(&b'>'))
        {
            pos += 1;
        }
        let attr_name = input[attr_start..pos].to_ascii_lowercase();

        pos = skip_whitespace(bytes, pos);
        let mut value = String::new();
        if bytes.get(pos) == Some(&b'=') {
            pos = skip_whitespace(bytes, pos + 1);
            match bytes.get(pos)? {
                quote @ (b'"' | b'\'') => {
                    let value_start = pos + 1;
                    let offset = input[value_start..].find(*quote as char)?;
                    value = decode_entities(&input[value_start..value_start + offset]);
                    pos = value_start + offset + 1;
                }
                _ => {
                    let value_start = pos;
                    while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'>' {
                        pos += 1;
                    }
                    value = decode_entities(&input[value_start..pos]);
                }
            }
        }

        if !attr_name.is_empty() && !attributes.iter().any(|(existing, _)| *existing == attr_name) {
            attributes.push((attr_name, value));
        }
    }
}

/// Decode the character references server markup actually uses.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        decoded.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let reference = candidate
            .get(1..)
            .and_then(|tail| tail.find(';').filter(|end| *end > 0 && *end <= 10))
            .and_then(|end| resolve_reference(&candidate[1..=end]).map(|ch| (ch, end + 2)));

        match reference {
            Some((ch, consumed)) => {
                decoded.push(ch);
                rest = &candidate[consumed..];
            }
            None => {
                decoded.push('&');
                rest = &candidate[1..];
            }
        }
    }

    decoded.push_str(rest);
    decoded
}

fn resolve_reference(name: &str) -> Option<char> {
    if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(decimal) = name.strip_prefix('#') {
        return decimal.parse::<u32>().ok().and_then(char::from_u32);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "copy" => Some('©'),
        "reg" => Some('®'),
        "hellip" => Some('…'),
        "mdash" => Some('—'),
        "ndash" => Some('–'),
        _ => None,
    }
}
