#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use anyhow::{Context, Result};

/// One element of an XML-like report, with its attributes and children in
/// document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name
    pub name:       String,
    /// Attributes in the order they appear
    pub attributes: Vec<(String, String)>,
    /// Child nodes
    pub children:   Vec<Node>,
}

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A nested element
    Element(Element),
    /// Character data, already unescaped
    Text(String),
}

impl Element {
    /// Returns the value of attribute `name`, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// All descendant elements named `tag`, in document order. The element
    /// itself is not included.
    pub fn descendants<'a>(&'a self, tag: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_descendants(tag, &mut found);
        found
    }

    /// Depth-first helper for [`Element::descendants`].
    fn collect_descendants<'a>(&'a self, tag: &str, found: &mut Vec<&'a Element>) {
        for child in self.elements() {
            if child.name == tag {
                found.push(child);
            }
            child.collect_descendants(tag, found);
        }
    }

    /// Number of elements named `tag` in the whole tree, the root included.
    pub fn count(&self, tag: &str) -> usize {
        usize::from(self.name == tag) + self.descendants(tag).len()
    }

    /// Concatenated text of this element and everything below it.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for child in &self.children {
            match child {
                Node::Text(t) => text.push_str(t),
                Node::Element(e) => text.push_str(&e.text_content()),
            }
        }
        text
    }
}

/// Replaces the predefined and numeric XML entities.
fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..end];
        let decoded = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => out.push(c),
            None => out.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    out
}

peg::parser! {
    /// A forgiving grammar for the XML written by test runners and lint tools.
    pub grammar xml() for str {
        /// matches any number of whitespace characters
        rule whitespace() = quiet!{[' ' | '\n' | '\t' | '\r']*}

        /// matches a tag or attribute name
        rule name() -> String
            = n:$(['a'..='z' | 'A'..='Z' | '_' | ':']
                  ['a'..='z' | 'A'..='Z' | '0'..='9' | '_' | ':' | '-' | '.']*)
            { n.to_string() }

        /// matches a quoted attribute value
        rule attr_value() -> String
            = "\"" v:$([^ '"']*) "\"" { unescape(v) }
            / "'" v:$([^ '\'']*) "'" { unescape(v) }

        /// matches `name="value"`
        rule attribute() -> (String, String)
            = n:name() whitespace() "=" whitespace() v:attr_value() { (n, v) }

        /// matches the attribute list of an opening tag
        rule attributes() -> Vec<(String, String)>
            = attrs:(whitespace() a:attribute() { a })* whitespace() { attrs }

        /// matches `<!-- ... -->`
        rule comment() = "<!--" (!"-->" [_])* "-->"

        /// matches processing instructions such as `<?xml ... ?>`
        rule instruction() = "<?" (!"?>" [_])* "?>"

        /// matches a doctype declaration
        rule doctype() = "<!DOCTYPE" (!">" [_])* ">"

        /// matches anything allowed around the root element
        rule misc() = comment() / instruction() / doctype() / [' ' | '\n' | '\t' | '\r']

        /// matches a CDATA section
        rule cdata() -> Node
            = "<![CDATA[" t:$((!"]]>" [_])*) "]]>" { Node::Text(t.to_string()) }

        /// matches character data up to the next tag
        rule text() -> Node
            = t:$([^ '<']+) { Node::Text(unescape(t)) }

        /// matches one piece of element content
        rule content() -> Option<Node>
            = e:element() { Some(Node::Element(e)) }
            / c:cdata() { Some(c) }
            / comment() { None }
            / instruction() { None }
            / t:text() { Some(t) }

        /// parses an element and everything inside it
        pub rule element() -> Element
            = "<" n:name() a:attributes() "/>"
            { Element { name: n, attributes: a, children: Vec::new() } }
            / "<" n:name() a:attributes() ">" c:content()* "</" close:name() whitespace() ">"
            {?
                if close == n {
                    let children = c.into_iter().flatten().collect();
                    Ok(Element { name: n, attributes: a, children })
                } else {
                    Err("matching closing tag")
                }
            }

        /// parses a whole document and returns its root element
        pub rule document() -> Element
            = "\u{feff}"? misc()* e:element() misc()* { e }
    }
}

/// Parses an XML-like report into its root element.
pub fn parse_document(input: &str) -> Result<Element> {
    xml::document(input).context("Could not parse XML report")
}
