//! Tolerant HTML fragment tree.
//!
//! # Responsibility
//! - Tokenize markup with regexes and build a nested node tree.
//! - Serialize the tree back to the exact source text.
//!
//! # Invariants
//! - Parsed elements keep their raw open/close tag text, so untouched
//!   regions serialize byte-for-byte.
//! - Unmatched closing tags are kept as `Node::Raw`; unclosed elements end at
//!   end of input without a synthesized closing tag.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::ops::Range;

static MARKUP_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?P<comment><!--(?s:.*?)-->)|(?P<decl><![^>]*>)|</(?P<close>[A-Za-z][A-Za-z0-9:-]*)\s*>|<(?P<open>[A-Za-z][A-Za-z0-9:-]*)(?P<attrs>(?:[^>"']|"[^"]*"|'[^']*')*)>"#,
    )
    .expect("valid markup token regex")
});
static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?P<name>[^\s"'<>/=]+)(?:\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^\s"'=<>`]+)))?"#,
    )
    .expect("valid attribute regex")
});
static ENTITY_SPAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]*);")
        .expect("valid entity span regex")
});
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z]+);").expect("valid entity regex")
});

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// One node of a parsed fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Character data, kept exactly as written (entities stay encoded).
    Text(String),
    Element(Element),
    /// Comments, declarations and stray closing tags.
    Raw(String),
}

impl Node {
    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    fn write_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Element(element) => {
                for child in &element.children {
                    child.write_text(out);
                }
            }
            Self::Raw(_) => {}
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Self::Text(text) | Self::Raw(text) => out.push_str(text),
            Self::Element(element) => element.write_html(out),
        }
    }
}

/// Element node with its source tag text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    open_tag: String,
    attributes: Vec<(String, String)>,
    close_tag: Option<String>,
    pub children: Vec<Node>,
}

impl Element {
    /// Builds a new element with synthesized, escaped tag text.
    pub fn new(name: &str, attributes: &[(&str, &str)]) -> Self {
        let name = name.to_ascii_lowercase();
        let mut open_tag = format!("<{name}");
        for (key, value) in attributes {
            open_tag.push_str(&format!(" {key}=\"{}\"", escape_attribute(value)));
        }
        open_tag.push('>');
        let close_tag = if is_void_name(&name) {
            None
        } else {
            Some(format!("</{name}>"))
        };

        Self {
            attributes: attributes
                .iter()
                .map(|(key, value)| (key.to_ascii_lowercase(), (*value).to_string()))
                .collect(),
            name,
            open_tag,
            close_tag,
            children: Vec::new(),
        }
    }

    /// Lowercase tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn open_tag(&self) -> &str {
        &self.open_tag
    }

    pub fn close_tag(&self) -> Option<&str> {
        self.close_tag.as_deref()
    }

    /// Entity-decoded attribute value, matched case-insensitively.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|value| value.split_ascii_whitespace().any(|item| item == class))
            .unwrap_or(false)
    }

    pub fn is_void(&self) -> bool {
        is_void_name(&self.name)
    }

    /// Copy of this element without its children.
    ///
    /// Used when a boundary splits an element in two.
    pub fn shell(&self) -> Self {
        Self {
            name: self.name.clone(),
            open_tag: self.open_tag.clone(),
            attributes: self.attributes.clone(),
            close_tag: self.close_tag.clone(),
            children: Vec::new(),
        }
    }

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        write_nodes(&self.children, &mut out);
        out
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_text(&mut out);
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push_str(&self.open_tag);
        write_nodes(&self.children, out);
        if let Some(close_tag) = &self.close_tag {
            out.push_str(close_tag);
        }
    }
}

/// Parsed HTML fragment addressed by child-index paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichDoc {
    children: Vec<Node>,
}

impl RichDoc {
    /// Parses a fragment. Never fails; malformed markup degrades to raw nodes.
    pub fn parse(html: &str) -> Self {
        let mut root = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut cursor = 0;

        for caps in MARKUP_TOKEN_RE.captures_iter(html) {
            let Some(token) = caps.get(0) else {
                continue;
            };
            if token.start() > cursor {
                attach(
                    &mut root,
                    &mut stack,
                    Node::Text(html[cursor..token.start()].to_string()),
                );
            }
            cursor = token.end();
            handle_token(&mut root, &mut stack, &caps, token.as_str());
        }

        if cursor < html.len() {
            attach(&mut root, &mut stack, Node::Text(html[cursor..].to_string()));
        }
        while let Some(unclosed) = stack.pop() {
            attach(&mut root, &mut stack, Node::Element(unclosed));
        }

        Self { children: root }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_nodes(&self.children, &mut out);
        out
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_text(&mut out);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Re-parses the serialized form so adjacent text nodes merge and paths
    /// match what a renderer would build from `to_html()`.
    pub fn normalize(&mut self) {
        *self = Self::parse(&self.to_html());
    }

    /// Node at `path`. The empty path addresses the root, which is not a node.
    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        node_in(&self.children, path)
    }

    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        node_in_mut(&mut self.children, path)
    }

    /// Child list of the container at `path` (root when empty).
    pub fn child_list(&self, path: &[usize]) -> Option<&Vec<Node>> {
        if path.is_empty() {
            return Some(&self.children);
        }
        match self.node(path)? {
            Node::Element(element) => Some(&element.children),
            _ => None,
        }
    }

    pub fn child_list_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Node>> {
        if path.is_empty() {
            return Some(&mut self.children);
        }
        match self.node_mut(path)? {
            Node::Element(element) => Some(&mut element.children),
            _ => None,
        }
    }

    /// Pre-order paths of all elements matching `predicate`.
    pub fn find_elements(&self, predicate: impl Fn(&Element) -> bool) -> Vec<Vec<usize>> {
        let mut found = Vec::new();
        let mut prefix = Vec::new();
        collect_matching(&self.children, &mut prefix, &predicate, &mut found);
        found
    }
}

/// Byte ranges of every markup token (tags, comments, declarations).
pub fn markup_token_spans(html: &str) -> Vec<Range<usize>> {
    MARKUP_TOKEN_RE
        .find_iter(html)
        .map(|token| token.range())
        .collect()
}

/// Byte ranges of every character reference (`&amp;`, `&#38;`, ...).
pub fn entity_spans(text: &str) -> Vec<Range<usize>> {
    ENTITY_SPAN_RE
        .find_iter(text)
        .map(|entity| entity.range())
        .collect()
}

/// Escapes a value for use inside a double-quoted attribute.
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// Decodes named (basic set) and numeric character references.
pub fn decode_entities(value: &str) -> String {
    ENTITY_RE
        .replace_all(value, |caps: &Captures<'_>| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body
                .strip_prefix("#x")
                .or_else(|| body.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(decimal) = body.strip_prefix('#') {
                decimal.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn handle_token(root: &mut Vec<Node>, stack: &mut Vec<Element>, caps: &Captures<'_>, raw: &str) {
    if caps.name("comment").is_some() || caps.name("decl").is_some() {
        attach(root, stack, Node::Raw(raw.to_string()));
        return;
    }

    if let Some(name) = caps.name("close") {
        let name = name.as_str().to_ascii_lowercase();
        let Some(position) = stack.iter().rposition(|open| open.name == name) else {
            attach(root, stack, Node::Raw(raw.to_string()));
            return;
        };
        while stack.len() > position + 1 {
            if let Some(unclosed) = stack.pop() {
                attach(root, stack, Node::Element(unclosed));
            }
        }
        if let Some(mut element) = stack.pop() {
            element.close_tag = Some(raw.to_string());
            attach(root, stack, Node::Element(element));
        }
        return;
    }

    if let Some(name) = caps.name("open") {
        let attributes_src = caps.name("attrs").map_or("", |m| m.as_str());
        let element = Element {
            name: name.as_str().to_ascii_lowercase(),
            open_tag: raw.to_string(),
            attributes: parse_attributes(attributes_src),
            close_tag: None,
            children: Vec::new(),
        };
        if element.is_void() || attributes_src.trim_end().ends_with('/') {
            attach(root, stack, Node::Element(element));
        } else {
            stack.push(element);
        }
    }
}

fn attach(root: &mut Vec<Node>, stack: &mut [Element], node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => root.push(node),
    }
}

fn parse_attributes(source: &str) -> Vec<(String, String)> {
    ATTRIBUTE_RE
        .captures_iter(source)
        .filter_map(|caps| {
            let name = caps.name("name")?.as_str().to_ascii_lowercase();
            let value = caps
                .name("dq")
                .or_else(|| caps.name("sq"))
                .or_else(|| caps.name("bare"))
                .map_or_else(String::new, |m| decode_entities(m.as_str()));
            Some((name, value))
        })
        .collect()
}

fn is_void_name(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        node.write_html(out);
    }
}

fn node_in<'a>(nodes: &'a [Node], path: &[usize]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let node = nodes.get(*first)?;
    if rest.is_empty() {
        return Some(node);
    }
    match node {
        Node::Element(element) => node_in(&element.children, rest),
        _ => None,
    }
}

fn node_in_mut<'a>(nodes: &'a mut [Node], path: &[usize]) -> Option<&'a mut Node> {
    let (first, rest) = path.split_first()?;
    let node = nodes.get_mut(*first)?;
    if rest.is_empty() {
        return Some(node);
    }
    match node {
        Node::Element(element) => node_in_mut(&mut element.children, rest),
        _ => None,
    }
}

fn collect_matching(
    nodes: &[Node],
    prefix: &mut Vec<usize>,
    predicate: &impl Fn(&Element) -> bool,
    found: &mut Vec<Vec<usize>>,
) {
    for (index, node) in nodes.iter().enumerate() {
        if let Node::Element(element) = node {
            prefix.push(index);
            if predicate(element) {
                found.push(prefix.clone());
            }
            collect_matching(&element.children, prefix, predicate, found);
            prefix.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_entities, escape_attribute, Element, Node, RichDoc};

    #[test]
    fn parse_and_serialize_is_byte_exact() {
        let sources = [
            "",
            "plain text only",
            "<p class='a'>Hello <b>world</b></p><ul><li>one<li>two</ul>",
            "<p>broken</span> tail",
            "<div>unclosed <em>forever",
            "<!-- note --><br/><img src=\"x.png\"> a &amp; b",
            "<p title=\"a > b\">quoted gt</p>",
        ];
        for source in sources {
            assert_eq!(RichDoc::parse(source).to_html(), source, "source: {source}");
        }
    }

    #[test]
    fn stray_closing_tag_becomes_raw_node() {
        let doc = RichDoc::parse("a</span>b");
        assert_eq!(doc.children().len(), 3);
        assert_eq!(doc.children()[1], Node::Raw("</span>".to_string()));
    }

    #[test]
    fn void_elements_take_no_children() {
        let doc = RichDoc::parse("<p>a<br>b</p>");
        let paragraph = doc.node(&[0]).and_then(Node::as_element).unwrap();
        assert_eq!(paragraph.children.len(), 3);
        assert_eq!(doc.text_content(), "ab");
    }

    #[test]
    fn attributes_are_entity_decoded() {
        let doc = RichDoc::parse("<span data-question=\"Why &quot;Y&quot; &amp; Z?\">x</span>");
        let span = doc.node(&[0]).and_then(Node::as_element).unwrap();
        assert_eq!(span.attr("DATA-QUESTION"), Some("Why \"Y\" & Z?"));
    }

    #[test]
    fn new_element_escapes_attribute_values() {
        let element = Element::new("span", &[("data-question", "a \"b\" <c>")]);
        assert_eq!(
            element.open_tag(),
            "<span data-question=\"a &quot;b&quot; &lt;c&gt;\">"
        );
        assert_eq!(element.attr("data-question"), Some("a \"b\" <c>"));
    }

    #[test]
    fn escape_then_decode_restores_value() {
        let value = "x < y & \"z\"";
        assert_eq!(decode_entities(&escape_attribute(value)), value);
        assert_eq!(decode_entities("&#65;&#x42;&unknown;"), "AB&unknown;");
    }

    #[test]
    fn find_elements_walks_in_document_order() {
        let doc = RichDoc::parse("<p><b>1</b></p><b>2</b>");
        assert_eq!(
            doc.find_elements(|element| element.name() == "b"),
            vec![vec![0, 0], vec![1]]
        );
    }
}
