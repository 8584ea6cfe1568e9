//! Owned, arena-backed XML element tree.
//!
//! The document owns every element; callers address elements by [`NodeId`].
//! Namespace prefixes are resolved once while parsing, so lookups compare
//! namespace URIs and never depend on the prefix a document happens to use.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::error::{AptxError, AptxResult};

/// Index of an element inside its [`XmlDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A single element.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub prefix: Option<String>,
    pub local_name: String,
    /// Resolved namespace URI, `None` when the element is unqualified
    pub namespace: Option<String>,
    pub attributes: Vec<(String, String)>,
    /// Concatenated character data directly under this element, trimmed
    pub text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl XmlElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn is(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == namespace
    }
}

/// Arena-backed XML document.
///
/// Slots released by [`XmlDocument::replace_with`] are reused by later
/// copies, so repeated edits do not grow the arena.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<XmlElement>,
    root: NodeId,
    free: Vec<NodeId>,
}

impl XmlDocument {
    /// Parse XML text into an owned tree.
    pub fn parse(xml: &str) -> AptxResult<Self> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut nodes: Vec<XmlElement> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();

        loop {
            let (resolved, event) = reader.read_resolved_event()?;
            match event {
                Event::Start(start) => {
                    let namespace = namespace_uri(resolved, &start)?;
                    let id = Self::push_element(&mut nodes, &start, namespace, stack.last().copied())?;
                    stack.push(id);
                }
                Event::Empty(start) => {
                    let namespace = namespace_uri(resolved, &start)?;
                    Self::push_element(&mut nodes, &start, namespace, stack.last().copied())?;
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(text) => {
                    if let Some(&id) = stack.last() {
                        nodes[id.0].text.push_str(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(&id) = stack.last() {
                        let raw = data.into_inner();
                        let content = std::str::from_utf8(&raw)
                            .map_err(|e| AptxError::Xml(format!("CDATA is not UTF-8: {}", e)))?;
                        nodes[id.0].text.push_str(content);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(&open) = stack.last() {
            return Err(AptxError::Xml(format!(
                "unclosed element <{}>",
                nodes[open.0].local_name
            )));
        }
        if nodes.is_empty() {
            return Err(AptxError::Xml("document has no root element".to_string()));
        }

        Ok(Self {
            nodes,
            root: NodeId(0),
            free: Vec::new(),
        })
    }

    fn push_element(
        nodes: &mut Vec<XmlElement>,
        start: &BytesStart,
        namespace: Option<String>,
        parent: Option<NodeId>,
    ) -> AptxResult<NodeId> {
        let name = start.name();
        let prefix = name
            .prefix()
            .map(|p| utf8(p.as_ref(), "element prefix").map(str::to_string))
            .transpose()?;
        let local_name = utf8(name.local_name().as_ref(), "element name")?.to_string();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| AptxError::Xml(e.to_string()))?;
            // xmlns declarations are consumed by the reader's resolver
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = utf8(attr.key.as_ref(), "attribute name")?.to_string();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        let id = NodeId(nodes.len());
        nodes.push(XmlElement {
            prefix,
            local_name,
            namespace,
            attributes,
            text: String::new(),
            children: Vec::new(),
            parent,
        });
        if let Some(p) = parent {
            nodes[p.0].children.push(id);
        }
        Ok(id)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn element(&self, id: NodeId) -> &XmlElement {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn text(&self, id: NodeId) -> &str {
        self.nodes[id.0].text.trim()
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attribute(name)
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            document: self,
            pending: self.children(id).iter().rev().copied().collect(),
        }
    }

    /// Number of arena slots, including released ones.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// First descendant of `id` with the given namespace and local name.
    pub fn find_descendant(&self, id: NodeId, namespace: Option<&str>, local_name: &str) -> Option<NodeId> {
        self.descendants(id)
            .find(|&d| self.nodes[d.0].is(namespace, local_name))
    }

    /// All descendants of `id` with the given namespace and local name.
    pub fn find_descendants(&self, id: NodeId, namespace: Option<&str>, local_name: &str) -> Vec<NodeId> {
        self.descendants(id)
            .filter(|&d| self.nodes[d.0].is(namespace, local_name))
            .collect()
    }

    /// First direct child of `id` with the given namespace and local name.
    pub fn find_child(&self, id: NodeId, namespace: Option<&str>, local_name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].is(namespace, local_name))
    }

    /// `id` itself or its first descendant with the given local name, in any
    /// namespace.
    pub fn find_by_local_name(&self, id: NodeId, local_name: &str) -> Option<NodeId> {
        if self.nodes[id.0].local_name == local_name {
            return Some(id);
        }
        self.descendants(id)
            .find(|&d| self.nodes[d.0].local_name == local_name)
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.nodes[id.0].text = text.into();
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let attributes = &mut self.nodes[id.0].attributes;
        match attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => attributes.push((name.to_string(), value)),
        }
    }

    /// Copy the subtree rooted at `id` into a standalone document.
    pub fn extract(&self, id: NodeId) -> XmlDocument {
        let mut copy = XmlDocument {
            nodes: Vec::new(),
            root: NodeId(0),
            free: Vec::new(),
        };
        copy.copy_subtree(self, id, None);
        copy
    }

    /// Replace the subtree at `old` with a copy of `source`'s subtree rooted
    /// at `id`.
    ///
    /// The copy's root takes over `old`'s id, so handles to `old` stay valid
    /// and point at the new content. Ids of `old`'s former descendants are
    /// released and reused by later copies.
    pub fn replace_with(&mut self, old: NodeId, source: &XmlDocument, id: NodeId) {
        let released: Vec<NodeId> = self.descendants(old).collect();
        self.free.extend(released);

        let mut element = source.nodes[id.0].clone();
        element.parent = self.nodes[old.0].parent;
        element.children = Vec::new();
        self.nodes[old.0] = element;

        for &child in source.children(id) {
            self.copy_subtree(source, child, Some(old));
        }
    }

    fn copy_subtree(&mut self, source: &XmlDocument, id: NodeId, parent: Option<NodeId>) -> NodeId {
        let mut element = source.nodes[id.0].clone();
        element.parent = parent;
        element.children = Vec::new();

        let new_id = self.alloc(element);
        if let Some(p) = parent {
            self.nodes[p.0].children.push(new_id);
        }
        for &child in source.children(id) {
            self.copy_subtree(source, child, Some(new_id));
        }
        new_id
    }

    fn alloc(&mut self, element: XmlElement) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = element;
                id
            }
            None => {
                let id = NodeId(self.nodes.len());
                self.nodes.push(element);
                id
            }
        }
    }
}

/// Preorder walk below an element. See [`XmlDocument::descendants`].
pub struct Descendants<'d> {
    document: &'d XmlDocument,
    pending: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.pending.pop()?;
        self.pending
            .extend(self.document.children(next).iter().rev().copied());
        Some(next)
    }
}

fn utf8<'a>(bytes: &'a [u8], what: &str) -> AptxResult<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| AptxError::Xml(format!("{} is not UTF-8: {}", what, e)))
}

/// Namespace URI the reader resolved for an element. An empty default
/// namespace means unqualified.
fn namespace_uri(resolved: ResolveResult<'_>, start: &BytesStart) -> AptxResult<Option<String>> {
    match resolved {
        ResolveResult::Bound(ns) => utf8(ns.as_ref(), "namespace URI").map(|uri| Some(uri.to_string())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(AptxError::Xml(format!(
            "undeclared namespace prefix '{}' on <{}>",
            String::from_utf8_lossy(&prefix),
            String::from_utf8_lossy(start.name().as_ref())
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Root xmlns="urn:default" xmlns:t="urn:tmpl" version="3">
  <Item><Number>2</Number></Item>
  <Item><Number> 1 </Number><t:Thing kind="a &amp; b"/></Item>
  <Plain xmlns="">text &lt;escaped&gt;</Plain>
  <Data><![CDATA[<inner attr="x"/>]]></Data>
</Root>"#;

    #[test]
    fn test_parse_structure() {
        let doc = XmlDocument::parse(DOC).unwrap();
        let root = doc.root();

        assert_eq!(doc.element(root).local_name, "Root");
        assert_eq!(doc.element(root).namespace.as_deref(), Some("urn:default"));
        assert_eq!(doc.attribute(root, "version"), Some("3"));
        assert_eq!(doc.children(root).len(), 4);
        // xmlns declarations are not plain attributes
        assert_eq!(doc.element(root).attributes.len(), 1);
    }

    #[test]
    fn test_namespace_resolution() {
        let doc = XmlDocument::parse(DOC).unwrap();
        let root = doc.root();

        let thing = doc.find_descendant(root, Some("urn:tmpl"), "Thing").unwrap();
        assert_eq!(doc.element(thing).prefix.as_deref(), Some("t"));
        assert_eq!(doc.attribute(thing, "kind"), Some("a & b"));

        assert!(doc.find_descendant(root, Some("urn:default"), "Plain").is_none());
        let plain = doc.find_descendant(root, None, "Plain").unwrap();
        assert_eq!(doc.text(plain), "text <escaped>");
    }

    #[test]
    fn test_cdata_text() {
        let doc = XmlDocument::parse(DOC).unwrap();
        let data = doc.find_by_local_name(doc.root(), "Data").unwrap();
        assert_eq!(doc.text(data), r#"<inner attr="x"/>"#);
    }

    #[test]
    fn test_descendants_document_order() {
        let doc = XmlDocument::parse(DOC).unwrap();
        let numbers: Vec<&str> = doc
            .find_descendants(doc.root(), Some("urn:default"), "Number")
            .into_iter()
            .map(|n| doc.text(n))
            .collect();
        assert_eq!(numbers, vec!["2", "1"]);
    }

    #[test]
    fn test_extract_and_replace() {
        let mut doc = XmlDocument::parse(DOC).unwrap();
        let root = doc.root();
        let items = doc.find_descendants(root, Some("urn:default"), "Item");

        let mut copy = doc.extract(items[1]);
        let number = copy.find_child(copy.root(), Some("urn:default"), "Number").unwrap();
        copy.set_text(number, "9");

        doc.replace_with(items[0], &copy, copy.root());

        let numbers: Vec<&str> = doc
            .find_descendants(root, Some("urn:default"), "Number")
            .into_iter()
            .map(|n| doc.text(n))
            .collect();
        assert_eq!(numbers, vec!["9", "1"]);
        assert_eq!(doc.parent(items[0]), Some(root));
        assert!(doc.find_child(items[0], Some("urn:tmpl"), "Thing").is_some());
    }

    #[test]
    fn test_repeated_replacement_reuses_slots() {
        let mut doc = XmlDocument::parse(DOC).unwrap();
        let root = doc.root();
        let items = doc.find_descendants(root, Some("urn:default"), "Item");
        let copy = doc.extract(items[1]);

        doc.replace_with(items[0], &copy, copy.root());
        let settled = doc.capacity();
        for _ in 0..50 {
            doc.replace_with(items[0], &copy, copy.root());
        }

        assert_eq!(doc.capacity(), settled);
        assert_eq!(doc.descendants(root).count(), 8);
        assert_eq!(doc.children(root).len(), 4);
    }

    #[test]
    fn test_nested_namespace_scopes() {
        let doc = XmlDocument::parse(
            r#"<a:Outer xmlns:a="urn:one"><a:Inner xmlns:a="urn:two"/><a:Back/></a:Outer>"#,
        )
        .unwrap();
        let root = doc.root();

        assert!(doc.find_child(root, Some("urn:two"), "Inner").is_some());
        assert!(doc.find_child(root, Some("urn:one"), "Back").is_some());
        assert!(doc.element(root).attributes.is_empty());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(XmlDocument::parse("").is_err());
        assert!(XmlDocument::parse("<a><b></a>").is_err());
        assert!(XmlDocument::parse("<a>").is_err());
        assert!(XmlDocument::parse("<x:a/>").is_err());
    }
}
