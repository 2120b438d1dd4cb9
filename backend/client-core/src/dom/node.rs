use crate::dom::parser;

/// Attribute carrying the server-assigned element identifier.
pub const ID_ATTRIBUTE: &str = "uuid";

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// An element with its attributes in source order.
///
/// `value` and `checked` are live form properties. They start unset and
/// shadow the corresponding markup attributes once the user edits the field.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
    value: Option<String>,
    checked: Option<bool>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
            value: None,
            checked: None,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.iter().any(|(key, _)| key == name)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attributes.retain(|(key, _)| key != name);
    }

    pub fn uuid(&self) -> Option<&str> {
        self.attr(ID_ATTRIBUTE)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    pub fn append_child(&mut self, node: Node) {
        self.children.push(node);
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, node: Node) -> Self {
        self.children.push(node);
        self
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Identifiers of direct children, in order.
    pub fn child_uuids(&self) -> Vec<&str> {
        self.child_elements().filter_map(Element::uuid).collect()
    }

    pub fn text_content(&self) -> String {
        let mut text = String::new();
        collect_text(self, &mut text);
        text
    }

    /// Depth-first search of this element and its descendants.
    pub fn find(&self, uuid: &str) -> Option<&Element> {
        if self.uuid() == Some(uuid) {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find(uuid))
    }

    pub fn find_mut(&mut self, uuid: &str) -> Option<&mut Element> {
        if self.uuid() == Some(uuid) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find_map(|child| child.find_mut(uuid))
    }

    /// Detach the descendant carrying `uuid`, preferring direct children.
    pub fn remove_descendant(&mut self, uuid: &str) -> Option<Element> {
        if let Some(index) = self.direct_child_index(uuid) {
            return match self.children.remove(index) {
                Node::Element(element) => Some(element),
                _ => None,
            };
        }
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find_map(|child| child.remove_descendant(uuid))
    }

    /// Swap the descendant carrying `uuid` for `replacement`, preferring direct children.
    ///
    /// Hands `replacement` back when no such descendant exists.
    pub fn replace_descendant(&mut self, uuid: &str, replacement: Element) -> Result<(), Element> {
        if let Some(index) = self.direct_child_index(uuid) {
            self.children[index] = Node::Element(replacement);
            return Ok(());
        }

        let mut replacement = replacement;
        for child in self.children.iter_mut().filter_map(Node::as_element_mut) {
            match child.replace_descendant(uuid, replacement) {
                Ok(()) => return Ok(()),
                Err(returned) => replacement = returned,
            }
        }
        Err(replacement)
    }

    fn direct_child_index(&self, uuid: &str) -> Option<usize> {
        self.children.iter().position(|node| {
            node.as_element()
                .and_then(Element::uuid)
                .is_some_and(|id| id == uuid)
        })
    }

    /// Visit this element and every descendant element, parents first.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Element)) {
        visit(self);
        for child in self.children.iter_mut().filter_map(Node::as_element_mut) {
            child.walk_mut(visit);
        }
    }

    /// Lower-cased `type` attribute of an `input`, `"text"` when absent.
    pub fn input_type(&self) -> String {
        self.attr("type")
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| String::from("text"))
    }

    /// Current value of a form control.
    pub fn value(&self) -> String {
        if let Some(value) = &self.value {
            return value.clone();
        }

        match self.tag.as_str() {
            "textarea" => self.text_content(),
            "option" => self
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| self.text_content().trim().to_string()),
            "select" => self
                .selected_option()
                .map(Element::value)
                .unwrap_or_default(),
            "input" if matches!(self.input_type().as_str(), "checkbox" | "radio") => {
                self.attr("value").unwrap_or("on").to_string()
            }
            _ => self.attr("value").unwrap_or_default().to_string(),
        }
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }

    pub fn is_checked(&self) -> bool {
        self.checked.unwrap_or_else(|| self.has_attr("checked"))
    }

    pub fn set_checked(&mut self, checked: bool) {
        self.checked = Some(checked);
    }

    /// Options of a `select`, including those nested in `optgroup`.
    pub fn options(&self) -> Vec<&Element> {
        let mut options = Vec::new();
        collect_options(self, &mut options);
        options
    }

    pub fn options_mut(&mut self) -> Vec<&mut Element> {
        let mut options = Vec::new();
        collect_options_mut(self, &mut options);
        options
    }

    fn selected_option(&self) -> Option<&Element> {
        let options = self.options();
        options
            .iter()
            .rev()
            .find(|option| option.has_attr("selected"))
            .or_else(|| options.first())
            .copied()
    }

    pub(crate) fn from_parts(tag: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            tag,
            attributes,
            children: Vec::new(),
            value: None,
            checked: None,
        }
    }
}

fn collect_text(element: &Element, text: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(content) => text.push_str(content),
            Node::Element(inner) => collect_text(inner, text),
            Node::Comment(_) => {}
        }
    }
}

fn collect_options<'a>(element: &'a Element, options: &mut Vec<&'a Element>) {
    for child in element.child_elements() {
        match child.tag() {
            "option" => options.push(child),
            "optgroup" => collect_options(child, options),
            _ => {}
        }
    }
}

fn collect_options_mut<'a>(element: &'a mut Element, options: &mut Vec<&'a mut Element>) {
    for child in element.children.iter_mut().filter_map(Node::as_element_mut) {
        if child.tag == "option" {
            options.push(child);
        } else if child.tag == "optgroup" {
            collect_options_mut(child, options);
        }
    }
}

/// The mirrored document: a doctype plus the `html` root element.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    doctype: Option<String>,
    root: Element,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            doctype: None,
            root: Element::new("html")
                .with_child(Node::Element(Element::new("head")))
                .with_child(Node::Element(Element::new("body"))),
        }
    }
}

impl Document {
    /// Parse a complete document. Markup without an `html` element is wrapped in one.
    pub fn parse(markup: &str) -> Self {
        let (doctype, nodes) = parser::parse_document_nodes(markup);
        Self {
            doctype,
            root: into_html_root(nodes),
        }
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Replace the whole tree, discarding every node and its form state.
    pub fn replace_with(&mut self, other: Document) {
        if other.doctype.is_some() {
            self.doctype = other.doctype;
        }
        self.root = other.root;
    }

    pub fn find(&self, uuid: &str) -> Option<&Element> {
        self.root.find(uuid)
    }

    pub fn find_mut(&mut self, uuid: &str) -> Option<&mut Element> {
        self.root.find_mut(uuid)
    }

    pub fn body(&self) -> Option<&Element> {
        self.root.child_elements().find(|child| child.tag() == "body")
    }

    /// `documentElement.outerHTML`.
    pub fn outer_html(&self) -> String {
        self.root.outer_html()
    }
}

fn into_html_root(nodes: Vec<Node>) -> Element {
    let mut stray = Vec::new();
    for node in nodes {
        match node {
            Node::Element(element) if element.tag() == "html" => return element,
            other => stray.push(other),
        }
    }

    let mut head = None;
    let mut body = None;
    let mut loose = Vec::new();
    for node in stray {
        match node {
            Node::Element(element) if element.tag() == "head" && head.is_none() => head = Some(element),
            Node::Element(element) if element.tag() == "body" && body.is_none() => body = Some(element),
            Node::Text(text) if text.trim().is_empty() => {}
            Node::Comment(_) => {}
            other => loose.push(other),
        }
    }

    let mut body = body.unwrap_or_else(|| Element::new("body"));
    body.children_mut().extend(loose);

    Element::new("html")
        .with_child(Node::Element(head.unwrap_or_else(|| Element::new("head"))))
        .with_child(Node::Element(body))
}
