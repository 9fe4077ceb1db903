//! Owned XML element tree built on `quick-xml` events.
//!
//! The OOXML parts we edit (`word/document.xml`, worksheets) need a mutable
//! tree that round-trips everything we do not touch: declaration, comments,
//! whitespace text nodes and attribute order all survive a parse/serialize
//! cycle. Names are kept exactly as written (`w:tc`), no namespace
//! resolution is performed.

pub mod path;

use quick_xml::Reader as XmlReader;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};

use crate::{DocfillError, Result};

/// Name of the synthetic wrapper used when parsing free-standing snippets.
const FRAGMENT_WRAPPER: &str = "docfill-fragment";

/// A node inside an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Unescaped character data.
    Text(String),
    CData(String),
    /// Raw comment body, written back verbatim.
    Comment(String),
    /// Raw processing instruction body, written back verbatim.
    ProcessingInstruction(String),
}

/// An element with its attributes (in source order) and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// A parsed XML part: prolog, root element and trailing misc nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    declaration: Option<String>,
    doctype: Option<String>,
    prolog: Vec<XmlNode>,
    pub root: XmlElement,
    epilog: Vec<XmlNode>,
}

impl XmlElement {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Name without its namespace prefix.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.attributes.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.attributes.push((key, value));
        }
    }

    pub fn remove_attr(&mut self, key: &str) {
        self.attributes.retain(|(k, _)| k != key);
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// First direct child element with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.is(name))
    }

    /// All direct child elements with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.child_elements().filter(move |el| el.is(name))
    }

    /// First descendant (excluding `self`) with the given name, in document order.
    #[must_use]
    pub fn find_descendant(&self, name: &str) -> Option<&XmlElement> {
        for child in self.child_elements() {
            if child.is(name) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Every descendant (excluding `self`) with the given name, in document order.
    #[must_use]
    pub fn descendants(&self, name: &str) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        self.collect_descendants(name, &mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        for child in self.child_elements() {
            if child.is(name) {
                out.push(child);
            }
            child.collect_descendants(name, out);
        }
    }

    /// Mutable access to every descendant with the given name, in document order.
    pub fn for_each_descendant_mut<F>(&mut self, name: &str, visit: &mut F) -> bool
    where
        F: FnMut(&mut XmlElement) -> bool,
    {
        for child in self.child_elements_mut() {
            if child.is(name) && visit(child) {
                return true;
            }
            if child.for_each_descendant_mut(name, visit) {
                return true;
            }
        }
        false
    }

    /// Character data held directly by this element.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                XmlNode::Text(text) | XmlNode::CData(text) => out.push_str(text),
                _ => {}
            }
        }
        out
    }

    /// Replace all children by a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        let text = text.into();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
    }

    /// Concatenated direct text of every descendant named `text_tag`.
    #[must_use]
    pub fn collect_text(&self, text_tag: &str) -> String {
        self.descendants(text_tag)
            .into_iter()
            .map(XmlElement::text)
            .collect()
    }

    /// Serialize this element (and its subtree) without a declaration.
    #[must_use]
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }

    /// Parse a free-standing snippet that may hold several top-level elements.
    ///
    /// Prefixes such as `w:` do not need to be declared. Top-level text and
    /// comments are dropped.
    pub fn parse_fragment(snippet: &str) -> Result<Vec<XmlElement>> {
        let wrapped = format!("<{FRAGMENT_WRAPPER}>{snippet}</{FRAGMENT_WRAPPER}>");
        let doc = XmlDocument::parse(wrapped.as_bytes())?;
        Ok(doc
            .root
            .children
            .into_iter()
            .filter_map(|node| match node {
                XmlNode::Element(el) => Some(el),
                _ => None,
            })
            .collect())
    }
}

impl XmlDocument {
    /// Parse a complete XML part.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = XmlReader::from_reader(bytes);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut declaration = None;
        let mut doctype = None;
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|err| DocfillError::Xml {
                reason: format!("at byte {}: {err}", reader.buffer_position()),
            })?;
            let node = match event {
                Event::Start(start) => {
                    stack.push(element_from_start(&start)?);
                    None
                }
                Event::Empty(start) => Some(XmlNode::Element(element_from_start(&start)?)),
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| DocfillError::Xml {
                        reason: "closing tag without an open element".into(),
                    })?;
                    Some(XmlNode::Element(element))
                }
                Event::Text(text) => Some(XmlNode::Text(text.unescape()?.into_owned())),
                Event::CData(data) => Some(XmlNode::CData(
                    String::from_utf8_lossy(&data.into_inner()).into_owned(),
                )),
                Event::Comment(comment) => {
                    Some(XmlNode::Comment(String::from_utf8_lossy(&comment).into_owned()))
                }
                Event::PI(pi) => Some(XmlNode::ProcessingInstruction(
                    String::from_utf8_lossy(&pi).into_owned(),
                )),
                Event::Decl(decl) => {
                    declaration = Some(String::from_utf8_lossy(&decl).into_owned());
                    None
                }
                Event::DocType(dt) => {
                    doctype = Some(String::from_utf8_lossy(&dt).into_owned());
                    None
                }
                Event::Eof => break,
            };
            buf.clear();

            let Some(node) = node else { continue };
            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
                continue;
            }
            match node {
                XmlNode::Element(element) => {
                    if root.is_some() {
                        return Err(DocfillError::Xml {
                            reason: "document has more than one root element".into(),
                        });
                    }
                    root = Some(element);
                }
                XmlNode::Text(text) if text.trim().is_empty() => {
                    if root.is_some() {
                        epilog.push(XmlNode::Text(text));
                    } else {
                        prolog.push(XmlNode::Text(text));
                    }
                }
                XmlNode::Text(_) | XmlNode::CData(_) => {
                    return Err(DocfillError::Xml {
                        reason: "character data outside the root element".into(),
                    });
                }
                other => {
                    if root.is_some() {
                        epilog.push(other);
                    } else {
                        prolog.push(other);
                    }
                }
            }
        }

        if !stack.is_empty() {
            return Err(DocfillError::Xml {
                reason: format!("unexpected end of input inside <{}>", stack[stack.len() - 1].name),
            });
        }
        let root = root.ok_or_else(|| DocfillError::Xml {
            reason: "document has no root element".into(),
        })?;

        Ok(Self {
            declaration,
            doctype,
            prolog,
            root,
            epilog,
        })
    }

    /// Serialize back to bytes, keeping the original declaration.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        if let Some(decl) = &self.declaration {
            out.push_str("<?");
            out.push_str(decl);
            out.push_str("?>");
        }
        if let Some(doctype) = &self.doctype {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype);
            out.push('>');
        }
        for node in &self.prolog {
            write_node(node, &mut out);
        }
        write_element(&self.root, &mut out);
        for node in &self.epilog {
            write_node(node, &mut out);
        }
        out.into_bytes()
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|err| DocfillError::Xml {
            reason: format!("element name is not UTF-8: {err}"),
        })?
        .to_string();
    let mut element = XmlElement::new(name);
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn write_element(element: &XmlElement, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value));
        out.push('"');
    }
    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn write_node(node: &XmlNode, out: &mut String) {
    match node {
        XmlNode::Element(el) => write_element(el, out),
        XmlNode::Text(text) => out.push_str(&partial_escape(text)),
        XmlNode::CData(data) => {
            out.push_str("<![CDATA[");
            out.push_str(data);
            out.push_str("]]>");
        }
        XmlNode::Comment(raw) => {
            out.push_str("<!--");
            out.push_str(raw);
            out.push_str("-->");
        }
        XmlNode::ProcessingInstruction(raw) => {
            out.push_str("<?");
            out.push_str(raw);
            out.push_str("?>");
        }
    }
}
