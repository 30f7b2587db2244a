use std::collections::HashMap;

use crate::dom::{Dom, NodeId};
use crate::{Error, Result};

/// Elements whose body is kept verbatim as a single text node.
const RAW_TEXT_TAGS: [&str; 2] = ["script", "style"];

const VOID_TAGS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Builds a [`Dom`] from markup. The parser is tolerant about structure
/// (stray end tags, unclosed elements at EOF) but rejects markup it cannot
/// tokenize, such as an unterminated comment or attribute quote.
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut cursor = Cursor { src: html, pos: 0 };
    let mut tree = TreeBuilder::new();

    while !cursor.is_done() {
        if cursor.eat("<!--") {
            cursor
                .take_until("-->")
                .ok_or_else(|| parse_error("unclosed HTML comment"))?;
        } else if cursor.eat("<!") {
            cursor
                .take_until(">")
                .ok_or_else(|| parse_error("unclosed markup declaration"))?;
        } else if cursor.rest().starts_with("</") {
            let tag = end_tag(&mut cursor)?;
            tree.close(&tag);
        } else if cursor.peek() == Some(b'<') {
            let tag = start_tag(&mut cursor)?;
            tree.open(tag, &mut cursor)?;
        } else {
            let text = cursor.take_while(|b| b != b'<');
            tree.text(text);
        }
    }

    let mut dom = tree.dom;
    dom.initialize_form_control_values();
    Ok(dom)
}

fn parse_error(message: impl Into<String>) -> Error {
    Error::HtmlParse(message.into())
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        let src = self.src;
        src.get(self.pos..).unwrap_or_default()
    }

    fn is_done(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<u8> {
        self.rest().bytes().next()
    }

    fn eat(&mut self, prefix: &str) -> bool {
        let matched = self.rest().starts_with(prefix);
        if matched {
            self.pos += prefix.len();
        }
        matched
    }

    fn skip_ws(&mut self) {
        self.take_while(|b| b.is_ascii_whitespace());
    }

    /// Predicates only ever stop on ASCII bytes, so the cut stays on a char
    /// boundary.
    fn take_while(&mut self, keep: impl Fn(u8) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.bytes().take_while(|b| keep(*b)).count();
        self.pos += len;
        &rest[..len]
    }

    /// Text before the next `needle`; the cursor ends up past the needle.
    fn take_until(&mut self, needle: &str) -> Option<&'a str> {
        let rest = self.rest();
        let at = rest.find(needle)?;
        self.pos += at + needle.len();
        Some(&rest[..at])
    }

    /// Body of a raw-text element; the cursor stops at its `</tag`.
    fn raw_text(&mut self, tag: &str) -> Option<&'a str> {
        let rest = self.rest();
        let at = rest.to_ascii_lowercase().find(&format!("</{tag}"))?;
        self.pos += at;
        Some(&rest[..at])
    }

    fn unquoted_value(&mut self) -> &'a str {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let len = (0..bytes.len())
            .find(|&i| {
                bytes[i].is_ascii_whitespace()
                    || bytes[i] == b'>'
                    || bytes[i..].starts_with(b"/>")
            })
            .unwrap_or(bytes.len());
        self.pos += len;
        &rest[..len]
    }
}

struct StartTag {
    name: String,
    attrs: HashMap<String, String>,
    self_closing: bool,
}

fn start_tag(cursor: &mut Cursor<'_>) -> Result<StartTag> {
    cursor.eat("<");
    cursor.skip_ws();
    let name = cursor.take_while(is_name_byte).to_ascii_lowercase();
    if name.is_empty() {
        return Err(parse_error("empty tag name"));
    }

    let mut attrs = HashMap::new();
    loop {
        cursor.skip_ws();
        let self_closing = if cursor.eat(">") {
            false
        } else if cursor.eat("/>") {
            true
        } else if cursor.is_done() {
            return Err(parse_error(format!("unclosed start tag <{name}>")));
        } else {
            let attr = cursor
                .take_while(|b| is_name_byte(b) || b == b':')
                .to_ascii_lowercase();
            if attr.is_empty() {
                return Err(parse_error(format!("invalid attribute name in <{name}>")));
            }
            cursor.skip_ws();
            let value = if cursor.eat("=") {
                cursor.skip_ws();
                decode_entities(attr_value(cursor)?)
            } else {
                String::new()
            };
            // Duplicate attributes keep the first occurrence.
            attrs.entry(attr).or_insert(value);
            continue;
        };
        return Ok(StartTag {
            name,
            attrs,
            self_closing,
        });
    }
}

fn attr_value<'a>(cursor: &mut Cursor<'a>) -> Result<&'a str> {
    match cursor.peek() {
        None => Err(parse_error("missing attribute value")),
        Some(quote @ (b'"' | b'\'')) => {
            cursor.pos += 1;
            let closing = if quote == b'"' { "\"" } else { "'" };
            cursor
                .take_until(closing)
                .ok_or_else(|| parse_error("unclosed quoted attribute value"))
        }
        Some(_) => Ok(cursor.unquoted_value()),
    }
}

fn end_tag(cursor: &mut Cursor<'_>) -> Result<String> {
    cursor.eat("</");
    cursor.skip_ws();
    let name = cursor.take_while(is_name_byte).to_ascii_lowercase();
    cursor
        .take_until(">")
        .ok_or_else(|| parse_error("unclosed end tag"))?;
    Ok(name)
}

/// Open-element stack over the document being built.
struct TreeBuilder {
    dom: Dom,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    fn new() -> Self {
        let dom = Dom::new();
        let stack = vec![dom.root];
        Self { dom, stack }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(self.dom.root)
    }

    fn open(&mut self, tag: StartTag, cursor: &mut Cursor<'_>) -> Result<()> {
        let parent = self.current();
        let is_raw = RAW_TEXT_TAGS.contains(&tag.name.as_str());
        let is_void = VOID_TAGS.contains(&tag.name.as_str());
        let node = self
            .dom
            .create_element(parent, tag.name.clone(), tag.attrs);
        if tag.self_closing || is_void {
            return Ok(());
        }
        if is_raw {
            let body = cursor
                .raw_text(&tag.name)
                .ok_or_else(|| parse_error(format!("unclosed <{}>", tag.name)))?;
            if !body.is_empty() {
                self.dom.create_text(node, body.to_string());
            }
            end_tag(cursor)?;
            return Ok(());
        }
        self.stack.push(node);
        Ok(())
    }

    /// Pops up to and including the nearest open `tag`. End tags with no
    /// open counterpart are ignored.
    fn close(&mut self, tag: &str) {
        let Some(depth) = self
            .stack
            .iter()
            .skip(1)
            .rposition(|node| self.dom.has_tag(*node, tag))
        else {
            return;
        };
        self.stack.truncate(depth + 1);
    }

    fn text(&mut self, text: &str) {
        if !text.is_empty() {
            let parent = self.current();
            self.dom.create_text(parent, decode_entities(text));
        }
    }
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    [
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&nbsp;", "\u{a0}"),
        ("&amp;", "&"),
    ]
    .iter()
    .fold(raw.to_string(), |text, &(entity, ch)| text.replace(entity, ch))
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}
