//! Mutable XML tree for package parts.
//!
//! Parts are parsed into a tree of [`Element`]s that keeps every node the
//! source contained (declarations, comments, processing instructions,
//! whitespace) along with the tag form of childless elements, so that
//! writing an untouched tree reproduces the original markup. Attributes are
//! always written double-quoted. Text and attribute values are stored in
//! their escaped form and only unescaped on access.
//!
//! Each element carries the namespace bindings in scope at its position,
//! which lets callers match elements by namespace URI regardless of the
//! prefixes a particular producer chose, and lets newly created elements
//! pick the prefix already bound in their surroundings.

use std::borrow::Cow;
use std::sync::Arc;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};

/// Namespace URIs used by word-processing packages.
pub mod ns {
    /// WordprocessingML main namespace.
    pub const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
    /// Drawing placement (inline / anchor) namespace.
    pub const WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
    /// DrawingML main namespace.
    pub const A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
    /// DrawingML picture namespace.
    pub const PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
    /// Package relationships namespace.
    pub const PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
    /// Core properties namespace.
    pub const CP: &str =
        "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
    /// Dublin Core elements.
    pub const DC: &str = "http://purl.org/dc/elements/1.1/";
    /// Dublin Core terms.
    pub const DCTERMS: &str = "http://purl.org/dc/terms/";
    /// The reserved `xml` prefix.
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

    /// Conventional prefix for a namespace, used when a new element needs a
    /// binding that is not yet in scope.
    pub fn preferred_prefix(uri: &str) -> &'static str {
        match uri {
            W => "w",
            WP => "wp",
            A => "a",
            PIC => "pic",
            CP => "cp",
            DC => "dc",
            DCTERMS => "dcterms",
            _ => "ns",
        }
    }
}

/// Namespace bindings in scope at an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespaces {
    default: Option<String>,
    prefixes: Vec<(String, String)>,
}

impl Namespaces {
    /// Resolve a prefix (`None` for unprefixed element names).
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            None => self.default.as_deref(),
            Some("xml") => Some(ns::XML),
            Some(p) => self
                .prefixes
                .iter()
                .rev()
                .find(|(name, _)| name == p)
                .map(|(_, uri)| uri.as_str()),
        }
    }

    /// Find the prefix bound to a namespace URI. `Some("")` means the URI is
    /// the default namespace.
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        if self.default.as_deref() == Some(uri) {
            return Some("");
        }
        self.prefixes
            .iter()
            .rev()
            .find(|(prefix, bound)| {
                bound == uri && self.resolve(Some(prefix.as_str())) == Some(uri)
            })
            .map(|(prefix, _)| prefix.as_str())
    }

    fn declare(&mut self, attr_name: &str, uri: &str) -> bool {
        if attr_name == "xmlns" {
            self.default = if uri.is_empty() {
                None
            } else {
                Some(uri.to_string())
            };
            true
        } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
            self.prefixes.push((prefix.to_string(), uri.to_string()));
            true
        } else {
            false
        }
    }
}

/// A node in the tree.
#[derive(Debug, Clone)]
pub enum Node {
    /// A child element
    Element(Element),
    /// Character data, stored escaped
    Text(String),
    /// Anything else (comments, CDATA, declarations, processing instructions)
    Other(Event<'static>),
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
    scope: Arc<Namespaces>,
    /// Written as `<a/>` rather than `<a></a>` when childless
    self_closing: bool,
}

impl Element {
    /// Create an element with no namespace bindings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            scope: Arc::new(Namespaces::default()),
            self_closing: true,
        }
    }

    /// Create an element in namespace `uri` that will live under `self`.
    ///
    /// The prefix already bound to `uri` at this position is reused; when
    /// none is bound, the conventional prefix is declared on the new element.
    pub fn create_child(&self, uri: &str, local: &str) -> Element {
        let mut child = Element {
            name: String::new(),
            attributes: Vec::new(),
            children: Vec::new(),
            scope: Arc::clone(&self.scope),
            self_closing: true,
        };
        child.name = child.qualify(uri, local);
        child
    }

    /// Qualified name as written in the source (`w:p`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local part of the name (`p` for `w:p`).
    pub fn local_name(&self) -> &str {
        split_qname(&self.name).1
    }

    /// Prefix of the name, if any.
    pub fn prefix(&self) -> Option<&str> {
        split_qname(&self.name).0
    }

    /// Namespace URI of the element.
    pub fn namespace(&self) -> Option<&str> {
        self.scope.resolve(self.prefix())
    }

    /// Check namespace URI and local name.
    pub fn is(&self, uri: &str, local: &str) -> bool {
        self.local_name() == local && self.namespace() == Some(uri)
    }

    /// Namespace bindings in scope.
    pub fn namespaces(&self) -> &Namespaces {
        &self.scope
    }

    /// Raw attribute list in source order (values escaped).
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Unescaped value of the attribute with this exact qualified name.
    pub fn attribute(&self, qname: &str) -> Option<Cow<'_, str>> {
        self.attributes
            .iter()
            .find(|(k, _)| k == qname)
            .map(|(_, v)| unescape_lossy(v))
    }

    /// Unescaped value of a namespaced attribute (`w:val`).
    pub fn attribute_ns(&self, uri: &str, local: &str) -> Option<Cow<'_, str>> {
        self.attributes
            .iter()
            .find(|(k, _)| {
                let (prefix, name) = split_qname(k);
                name == local
                    && prefix.is_some_and(|p| p != "xmlns")
                    && self.scope.resolve(prefix) == Some(uri)
            })
            .map(|(_, v)| unescape_lossy(v))
    }

    /// Set an attribute by qualified name, escaping the value.
    pub fn set_attribute(&mut self, qname: &str, value: &str) {
        if qname == "xmlns" || qname.starts_with("xmlns:") {
            Arc::make_mut(&mut self.scope).declare(qname, value);
        }
        let escaped = quick_xml::escape::escape(value).into_owned();
        match self.attributes.iter_mut().find(|(k, _)| k == qname) {
            Some((_, v)) => *v = escaped,
            None => self.attributes.push((qname.to_string(), escaped)),
        }
    }

    /// Set a namespaced attribute, reusing an existing spelling if present.
    pub fn set_attribute_ns(&mut self, uri: &str, local: &str, value: &str) {
        let existing = self
            .attributes
            .iter()
            .map(|(k, _)| k.as_str())
            .find(|k| {
                let (prefix, name) = split_qname(k);
                name == local && prefix.is_some() && self.scope.resolve(prefix) == Some(uri)
            })
            .map(str::to_string);
        let qname = match existing {
            Some(q) => q,
            None => {
                let qualified = self.qualify(uri, local);
                if qualified.contains(':') {
                    qualified
                } else {
                    // Unprefixed attributes carry no namespace; bind one.
                    let prefix = ns::preferred_prefix(uri);
                    self.set_attribute(&format!("xmlns:{prefix}"), uri);
                    format!("{prefix}:{local}")
                }
            }
        };
        self.set_attribute(&qname, value);
    }

    /// Remove an attribute by qualified name.
    pub fn remove_attribute(&mut self, qname: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|(k, _)| k != qname);
        before != self.attributes.len()
    }

    /// Remove a namespaced attribute.
    pub fn remove_attribute_ns(&mut self, uri: &str, local: &str) -> bool {
        let scope = Arc::clone(&self.scope);
        let before = self.attributes.len();
        self.attributes.retain(|(k, _)| {
            let (prefix, name) = split_qname(k);
            !(name == local && prefix.is_some() && scope.resolve(prefix) == Some(uri))
        });
        before != self.attributes.len()
    }

    /// All child nodes.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child element iterator.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Mutable child element iterator.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with this namespace and local name.
    pub fn child(&self, uri: &str, local: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(uri, local))
    }

    /// Mutable first child element with this namespace and local name.
    pub fn child_mut(&mut self, uri: &str, local: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.is(uri, local))
    }

    /// Child elements with this namespace and local name.
    pub fn children_named<'a>(
        &'a self,
        uri: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.is(uri, local))
    }

    /// Append a child element.
    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Insert a child element before the first child element matching
    /// `before`, or at the end when none matches. Returns the inserted
    /// element.
    pub fn insert_before<F>(&mut self, child: Element, before: F) -> &mut Element
    where
        F: Fn(&Element) -> bool,
    {
        let position = self.insert_position(before);
        self.children.insert(position, Node::Element(child));
        self.element_at(position)
    }

    /// First child element with this name, created and inserted before the
    /// first child matching `before` when absent.
    pub fn child_or_insert<F>(&mut self, uri: &str, local: &str, before: F) -> &mut Element
    where
        F: Fn(&Element) -> bool,
    {
        let existing = self
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.is(uri, local)));
        let position = match existing {
            Some(position) => position,
            None => {
                let child = self.create_child(uri, local);
                let position = self.insert_position(before);
                self.children.insert(position, Node::Element(child));
                position
            }
        };
        self.element_at(position)
    }

    fn insert_position<F>(&self, before: F) -> usize
    where
        F: Fn(&Element) -> bool,
    {
        self.children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if before(e)))
            .unwrap_or(self.children.len())
    }

    fn element_at(&mut self, position: usize) -> &mut Element {
        match &mut self.children[position] {
            Node::Element(e) => e,
            _ => unreachable!("position refers to an element node"),
        }
    }

    /// Remove child elements with this namespace and local name. Returns the
    /// number removed.
    pub fn remove_children(&mut self, uri: &str, local: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|n| !matches!(n, Node::Element(e) if e.is(uri, local)));
        before - self.children.len()
    }

    /// Depth-first search for the first descendant matching the name.
    pub fn find(&self, uri: &str, local: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.is(uri, local) {
                return Some(child);
            }
            if let Some(found) = child.find(uri, local) {
                return Some(found);
            }
        }
        None
    }

    /// Mutable depth-first search for the first descendant matching the name.
    pub fn find_mut(&mut self, uri: &str, local: &str) -> Option<&mut Element> {
        for child in self.elements_mut() {
            if child.is(uri, local) {
                return Some(child);
            }
            if let Some(found) = child.find_mut(uri, local) {
                return Some(found);
            }
        }
        None
    }

    /// Whether any descendant matches the name.
    pub fn contains(&self, uri: &str, local: &str) -> bool {
        self.find(uri, local).is_some()
    }

    /// Count descendants matching the name. Matches are not searched further.
    pub fn count(&self, uri: &str, local: &str) -> usize {
        self.elements()
            .map(|child| {
                if child.is(uri, local) {
                    1
                } else {
                    child.count(uri, local)
                }
            })
            .sum()
    }

    /// Visit every descendant accepted by `matches`, outermost first.
    /// Matched elements are handed to `visit` and not searched further.
    pub fn visit_mut(
        &mut self,
        matches: &dyn Fn(&Element) -> bool,
        visit: &mut dyn FnMut(&mut Element),
    ) {
        for child in self.elements_mut() {
            if matches(child) {
                visit(child);
            } else {
                child.visit_mut(matches, visit);
            }
        }
    }

    /// Unescaped text of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(unescape_lossy(t)),
                Node::Other(Event::CData(c)) => {
                    Some(Cow::Owned(String::from_utf8_lossy(c).into_owned()))
                }
                _ => None,
            })
            .collect()
    }

    fn qualify(&mut self, uri: &str, local: &str) -> String {
        match self.scope.prefix_for(uri) {
            Some("") => local.to_string(),
            Some(prefix) => format!("{prefix}:{local}"),
            None => {
                let prefix = ns::preferred_prefix(uri);
                self.set_attribute(&format!("xmlns:{prefix}"), uri);
                format!("{prefix}:{local}")
            }
        }
    }
}

/// A parsed XML part.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
}

impl XmlDocument {
    /// Parse a part.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(data);
        reader.trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event_into(&mut buf)?;
            match event {
                Event::Start(ref start) => {
                    let mut element = open_element(start, stack.last())?;
                    element.self_closing = false;
                    stack.push(element);
                }
                Event::Empty(ref start) => {
                    let element = open_element(start, stack.last())?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::Xml("unexpected closing tag".into()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let raw = std::str::from_utf8(&text.into_inner())
                        .map_err(|e| Error::Xml(e.to_string()))?
                        .to_string();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Text(raw)),
                        None if root.is_none() => prolog.push(Node::Text(raw)),
                        None => epilog.push(Node::Text(raw)),
                    }
                }
                Event::Eof => break,
                other => {
                    let node = Node::Other(other.into_owned());
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None if root.is_none() => prolog.push(node),
                        None => epilog.push(node),
                    }
                }
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::Xml(format!(
                "unclosed element <{}>",
                stack.last().map(|e| e.name.as_str()).unwrap_or_default()
            )));
        }
        let root = root.ok_or_else(|| Error::Xml("document has no root element".into()))?;

        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    /// The root element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The root element, mutably.
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Serialize back to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }
        Ok(writer.into_inner())
    }
}

fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

fn unescape_lossy(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::unescape(raw).unwrap_or(Cow::Borrowed(raw))
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::Xml(e.to_string()))
}

fn open_element(start: &BytesStart<'_>, parent: Option<&Element>) -> Result<Element> {
    let name = utf8(start.name().as_ref())?.to_string();
    let mut scope = parent.map(|p| Arc::clone(&p.scope)).unwrap_or_default();
    let mut attributes = Vec::new();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
        let key = utf8(attr.key.as_ref())?.to_string();
        let mut value = utf8(&attr.value)?.to_string();
        if value.contains('"') {
            // Only reachable from single-quoted source values.
            value = value.replace('"', "&quot;");
        }
        if key == "xmlns" || key.starts_with("xmlns:") {
            let uri = unescape_lossy(&value).into_owned();
            Arc::make_mut(&mut scope).declare(&key, &uri);
        }
        attributes.push((key, value));
    }

    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
        scope,
        self_closing: true,
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::Xml("multiple root elements".into())),
    }
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<()> {
    match node {
        Node::Element(e) => write_element(writer, e)?,
        Node::Text(t) => {
            writer.write_event(Event::Text(BytesText::from_escaped(t.as_str())))?;
        }
        Node::Other(event) => {
            writer.write_event(event)?;
        }
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        // Values are stored escaped; write them through untouched.
        start.push_attribute(Attribute {
            key: QName(key.as_bytes()),
            value: Cow::Borrowed(value.as_bytes()),
        });
    }

    if element.children.is_empty() && element.self_closing {
        writer.write_event(Event::Empty(start))?;
    } else {
        writer.write_event(Event::Start(start))?;
        for child in &element.children {
            write_node(writer, child)?;
        }
        writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    }
    Ok(())
}
