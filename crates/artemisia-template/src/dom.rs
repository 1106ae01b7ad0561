//! A small HTML node tree: lenient parsing, attribute editing, serialization.
//!
//! Text and attribute values are kept as raw source (entities are not
//! decoded), so `serialize(&parse(html))` reproduces well-formed input apart
//! from attribute quoting, which is normalized to double quotes.

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose content is not parsed as markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Raw source text, entities intact.
    Text(String),
    /// Comment body without `<!--` / `-->`.
    Comment(String),
    /// Declaration body without `<!` / `>`, e.g. `DOCTYPE html`.
    Doctype(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: String,
    /// `None` for valueless attributes like `disabled`.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<Attr>,
    pub children: Vec<Node>,
    /// Written as `<tag ... />` in the source.
    pub self_closing: bool,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    /// Case-insensitive tag name comparison.
    pub fn is(&self, tag: &str) -> bool {
        self.name.eq_ignore_ascii_case(tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Replace an attribute's value in place, or append it.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = Some(value.into());
        match self
            .attrs
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(attr) => attr.value = value,
            None => self.attrs.push(Attr {
                name: name.to_string(),
                value,
            }),
        }
    }
}

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

pub fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Parse an HTML fragment or document into nodes.
///
/// Never fails: unclosed elements are closed at end of input, stray closing
/// tags are dropped, and a closing tag for an ancestor implicitly closes the
/// elements in between.
pub fn parse(html: &str) -> Vec<Node> {
    let mut parser = Parser {
        src: html,
        pos: 0,
        open: Vec::new(),
    };
    parser.parse_children()
}

pub fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

/// Visit every element in document order.
pub fn walk_elements_mut<F: FnMut(&mut Element)>(nodes: &mut [Node], f: &mut F) {
    for node in nodes {
        if let Node::Element(el) = node {
            f(el);
            walk_elements_mut(&mut el.children, f);
        }
    }
}

/// First element in document order matching `pred`.
pub fn find_element_mut<'a>(
    nodes: &'a mut [Node],
    pred: &dyn Fn(&Element) -> bool,
) -> Option<&'a mut Element> {
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            if pred(el) {
                return Some(el);
            }
            if let Some(found) = find_element_mut(&mut el.children, pred) {
                return Some(found);
            }
        }
    }
    None
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    /// Names of the currently open elements, outermost first.
    open: Vec<String>,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn parse_children(&mut self) -> Vec<Node> {
        let mut nodes = Vec::new();
        while self.pos < self.src.len() {
            let rest = self.rest();
            if let Some(body) = rest.strip_prefix("<!--") {
                match body.find("-->") {
                    Some(end) => {
                        nodes.push(Node::Comment(body[..end].to_string()));
                        self.pos += 4 + end + 3;
                    }
                    None => {
                        nodes.push(Node::Comment(body.to_string()));
                        self.pos = self.src.len();
                    }
                }
            } else if let Some(body) = rest.strip_prefix("</") {
                let name_end = body
                    .find(|c: char| c == '>' || c.is_whitespace())
                    .unwrap_or(body.len());
                let name = &body[..name_end];
                let close_len = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
                if self.open.last().is_some_and(|top| top.eq_ignore_ascii_case(name)) {
                    self.pos += close_len;
                    return nodes;
                }
                if self.open.iter().any(|o| o.eq_ignore_ascii_case(name)) {
                    // Closes an ancestor; leave it for that level to consume.
                    return nodes;
                }
                self.pos += close_len;
            } else if let Some(body) = rest.strip_prefix("<!") {
                let end = body.find('>').unwrap_or(body.len());
                nodes.push(Node::Doctype(body[..end].to_string()));
                self.pos += (2 + end + 1).min(rest.len());
            } else if rest.len() > 1
                && rest.starts_with('<')
                && rest.as_bytes()[1].is_ascii_alphabetic()
            {
                let element = self.parse_element();
                nodes.push(Node::Element(element));
            } else {
                let skip = usize::from(rest.starts_with('<'));
                let end = rest[skip..]
                    .find('<')
                    .map(|i| i + skip)
                    .unwrap_or(rest.len());
                push_text(&mut nodes, &rest[..end]);
                self.pos += end;
            }
        }
        nodes
    }

    fn parse_element(&mut self) -> Element {
        let rest = self.rest();
        let name_len = rest[1..]
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len() - 1);
        let mut element = Element::new(&rest[1..1 + name_len]);
        self.pos += 1 + name_len;

        let (attrs, self_closing) = self.parse_attrs();
        element.attrs = attrs;
        element.self_closing = self_closing;
        if self_closing || is_void(&element.name) {
            return element;
        }

        if is_raw_text(&element.name) {
            let rest = self.rest();
            let close = format!("</{}", element.name.to_ascii_lowercase());
            match rest.to_ascii_lowercase().find(&close) {
                Some(end) => {
                    if end > 0 {
                        element.children.push(Node::Text(rest[..end].to_string()));
                    }
                    let after = &rest[end..];
                    let close_len = after.find('>').map(|i| i + 1).unwrap_or(after.len());
                    self.pos += end + close_len;
                }
                None => {
                    if !rest.is_empty() {
                        element.children.push(Node::Text(rest.to_string()));
                    }
                    self.pos = self.src.len();
                }
            }
            return element;
        }

        self.open.push(element.name.clone());
        element.children = self.parse_children();
        self.open.pop();
        element
    }

    /// Parse attributes up to and including the end of the start tag.
    /// Returns the attributes and whether the tag was self-closing.
    fn parse_attrs(&mut self) -> (Vec<Attr>, bool) {
        let mut attrs = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return (attrs, false);
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                return (attrs, true);
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return (attrs, false);
            }

            let name_len = rest
                .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
                .unwrap_or(rest.len());
            if name_len == 0 {
                // Stray '/' or '=': skip one byte (both are ASCII).
                self.pos += 1;
                continue;
            }
            let name = rest[..name_len].to_string();
            self.pos += name_len;

            let rest = self.rest();
            let after_ws = rest.trim_start();
            if !after_ws.starts_with('=') {
                attrs.push(Attr { name, value: None });
                continue;
            }
            self.pos += rest.len() - after_ws.len() + 1;
            self.skip_whitespace();

            let rest = self.rest();
            let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'');
            let value = match quote {
                Some(q) => {
                    let body = &rest[1..];
                    let end = body.find(q).unwrap_or(body.len());
                    let consumed = 1 + end + usize::from(end < body.len());
                    self.pos += consumed;
                    body[..end].to_string()
                }
                None => {
                    let end = rest
                        .find(|c: char| c.is_whitespace() || c == '>')
                        .unwrap_or(rest.len());
                    self.pos += end;
                    rest[..end].to_string()
                }
            };
            attrs.push(Attr {
                name,
                value: Some(value),
            });
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(prev)) = nodes.last_mut() {
        prev.push_str(text);
    } else {
        nodes.push(Node::Text(text.to_string()));
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Comment(body) => {
            out.push_str("<!--");
            out.push_str(body);
            out.push_str("-->");
        }
        Node::Doctype(body) => {
            out.push_str("<!");
            out.push_str(body);
            out.push('>');
        }
        Node::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for attr in &el.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                if let Some(value) = &attr.value {
                    out.push_str("=\"");
                    out.push_str(&value.replace('"', "&quot;"));
                    out.push('"');
                }
            }
            if el.self_closing && el.children.is_empty() {
                out.push_str(" />");
                return;
            }
            out.push('>');
            if is_void(&el.name) {
                return;
            }
            for child in &el.children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(&el.name);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(nodes: &[Node]) -> &Element {
        nodes
            .iter()
            .find_map(|n| match n {
                Node::Element(el) => Some(el),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_serialize_reproduces_document() {
        let html = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8" /><link rel="stylesheet" href="/styles.css"></head>
<body>
  <!-- hero -->
  <p class="reveal">Pellets &amp; granules<br>since 2005</p>
  <script src="/app.js"></script>
</body>
</html>"#;
        assert_eq!(serialize(&parse(html)), html);
    }

    #[test]
    fn test_attributes() {
        let nodes = parse(r#"<input type=email required name='email' :value="user.email">"#);
        let input = first_element(&nodes);
        assert!(input.is("INPUT"));
        assert_eq!(input.attr("type"), Some("email"));
        assert_eq!(input.attr("required"), Some(""));
        assert_eq!(input.attr("name"), Some("email"));
        assert_eq!(input.attr(":value"), Some("user.email"));
        assert!(input.children.is_empty());
    }

    #[test]
    fn test_single_quoted_value_with_double_quotes() {
        let nodes = parse(r#"<form onsubmit='say("hi")'></form>"#);
        assert_eq!(
            serialize(&nodes),
            r#"<form onsubmit="say(&quot;hi&quot;)"></form>"#
        );
    }

    #[test]
    fn test_raw_text_is_not_parsed() {
        let nodes = parse("<script>if (a < b && c > d) { x('</div>'); }</script><p>after</p>");
        let script = first_element(&nodes);
        assert_eq!(
            script.children,
            vec![Node::Text("if (a < b && c > d) { x('</div>'); }".into())]
        );
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_lenient_structure() {
        // Stray close is dropped; ancestor close ends the open <span>.
        let nodes = parse("<div><span>a</em>b</div><p>c");
        assert_eq!(serialize(&nodes), "<div><span>ab</span></div><p>c</p>");
    }

    #[test]
    fn test_literal_less_than_in_text() {
        let nodes = parse("<p>5 < 6</p>");
        assert_eq!(serialize(&nodes), "<p>5 < 6</p>");
    }

    #[test]
    fn test_set_attr_replaces_or_appends() {
        let mut nodes = parse(r#"<form method="POST" action="/contact"></form>"#);
        walk_elements_mut(&mut nodes, &mut |el: &mut Element| {
            if el.is("form") {
                el.set_attr("action", "#");
                el.set_attr("data-static", "1");
            }
        });
        assert_eq!(
            serialize(&nodes),
            r##"<form method="POST" action="#" data-static="1"></form>"##
        );
    }

    #[test]
    fn test_find_element_mut_nested() {
        let mut nodes = parse("<html><head><title>x</title></head><body></body></html>");
        let head = find_element_mut(&mut nodes, &|e: &Element| e.is("head")).unwrap();
        head.children.push(Node::Element(Element::new("style")));
        assert!(serialize(&nodes).contains("<title>x</title><style></style></head>"));
    }
}
