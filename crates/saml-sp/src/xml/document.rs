use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{SamlError, SamlResult};

/// Namespace bound to the reserved `xml` prefix.
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Index of a node inside an [`XmlDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An attribute with its namespace resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Local part of the name.
    pub local_name: String,
    /// Resolved namespace URI. Unprefixed attributes have none.
    pub namespace: Option<String>,
    /// Normalized, unescaped value.
    pub value: String,
}

/// An element with its namespace resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Prefix as written, if any.
    pub prefix: Option<String>,
    /// Local part of the name.
    pub local_name: String,
    /// Resolved namespace URI.
    pub namespace: Option<String>,
    /// Attributes in document order, namespace declarations excluded.
    pub attributes: Vec<Attribute>,
    /// Namespace declarations made on this element; `""` is the default namespace.
    pub namespace_decls: Vec<(String, String)>,
    /// Byte range from `<` of the start tag to `>` of the end tag.
    pub span: Range<usize>,
    /// Byte offset just past the start tag.
    pub content_start: usize,
}

impl Element {
    /// Returns the name as written (`prefix:local` or `local`).
    #[must_use]
    pub fn qualified_name(&self) -> Cow<'_, str> {
        match &self.prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}:{}", self.local_name)),
            None => Cow::Borrowed(&self.local_name),
        }
    }

    /// Returns the value of an unqualified attribute.
    #[must_use]
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }
}

/// Node payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element.
    Element(Element),
    /// Character data (text and CDATA sections), line endings normalized.
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed XML document.
///
/// Only the document element and its content are kept. DOCTYPE
/// declarations are refused, which also rules out custom entities.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    source: String,
    nodes: Vec<Node>,
    root: NodeId,
}

impl XmlDocument {
    /// Parses a document.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::XmlParse`] if the input is not well-formed,
    /// uses an undeclared prefix, or contains a DOCTYPE.
    pub fn parse(xml: &str) -> SamlResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut nodes: Vec<Node> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root = None;

        loop {
            let start = reader.buffer_position() as usize;
            let event = reader.read_event()?;
            let end = reader.buffer_position() as usize;

            match event {
                Event::Start(_) | Event::Empty(_) if root.is_some() && stack.is_empty() => {
                    return Err(SamlError::XmlParse(
                        "document has more than one root element".to_string(),
                    ));
                }
                Event::Start(e) => {
                    let id = push_element(&mut nodes, &stack, &e, start, end)?;
                    root.get_or_insert(id);
                    stack.push(id);
                }
                Event::Empty(e) => {
                    let id = push_element(&mut nodes, &stack, &e, start, end)?;
                    root.get_or_insert(id);
                    if let NodeKind::Element(el) = &mut nodes[id.0].kind {
                        el.span.end = end;
                    }
                }
                Event::End(_) => {
                    let id = stack.pop().ok_or_else(|| {
                        SamlError::XmlParse("unexpected closing tag".to_string())
                    })?;
                    if let NodeKind::Element(el) = &mut nodes[id.0].kind {
                        el.span.end = end;
                    }
                }
                Event::Text(t) => {
                    let raw = utf8(&t)?;
                    if let Some(&parent) = stack.last() {
                        let text = quick_xml::escape::unescape(&normalize_line_endings(raw))
                            .map_err(|e| SamlError::XmlParse(e.to_string()))?
                            .into_owned();
                        push_node(&mut nodes, parent, NodeKind::Text(text));
                    } else if !raw.trim().is_empty() {
                        return Err(SamlError::XmlParse(
                            "text outside the document element".to_string(),
                        ));
                    }
                }
                Event::CData(c) => {
                    let parent = *stack.last().ok_or_else(|| {
                        SamlError::XmlParse("CDATA outside the document element".to_string())
                    })?;
                    let text = normalize_line_endings(utf8(&c)?);
                    push_node(&mut nodes, parent, NodeKind::Text(text));
                }
                Event::Comment(_) => {}
                Event::PI(_) => {
                    if !stack.is_empty() {
                        return Err(SamlError::XmlParse(
                            "processing instructions inside the document element are not supported"
                                .to_string(),
                        ));
                    }
                }
                Event::DocType(_) => {
                    return Err(SamlError::XmlParse("DOCTYPE is not allowed".to_string()));
                }
                Event::Decl(_) => {}
                Event::Eof => break,
            }
        }

        if !stack.is_empty() {
            return Err(SamlError::XmlParse("unclosed element at end of input".to_string()));
        }

        let root = root.ok_or_else(|| SamlError::XmlParse("document is empty".to_string()))?;

        Ok(Self {
            source: xml.to_string(),
            nodes,
            root,
        })
    }

    /// Returns the text the document was parsed from; element spans index into it.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the document element.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Returns the element payload of a node, if it is an element.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Returns true if the node is an element with the given namespace and local name.
    #[must_use]
    pub fn is_element(&self, id: NodeId, namespace: &str, local_name: &str) -> bool {
        self.element(id).is_some_and(|el| {
            el.local_name == local_name && el.namespace.as_deref() == Some(namespace)
        })
    }

    /// Iterates over the element children of a node.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
    }

    /// Iterates over the element children with the given name.
    pub fn children_named<'s>(
        &'s self,
        id: NodeId,
        namespace: &'s str,
        local_name: &'s str,
    ) -> impl Iterator<Item = NodeId> + 's {
        self.child_elements(id)
            .filter(move |&c| self.is_element(c, namespace, local_name))
    }

    /// Returns the first element child with the given name.
    #[must_use]
    pub fn first_child_named(&self, id: NodeId, namespace: &str, local_name: &str) -> Option<NodeId> {
        self.children_named(id, namespace, local_name).next()
    }

    /// Follows a path of child element names from `id`, taking the first match at each step.
    #[must_use]
    pub fn find_path(&self, id: NodeId, path: &[(&str, &str)]) -> Option<NodeId> {
        path.iter()
            .try_fold(id, |node, (ns, name)| self.first_child_named(node, ns, name))
    }

    /// Returns the node and all its descendants in document order.
    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending = vec![id];
        while let Some(node) = pending.pop() {
            out.push(node);
            pending.extend(self.children(node).iter().rev());
        }
        out
    }

    /// Returns the descendant elements (excluding `id`) with the given name.
    pub fn descendants_named<'s>(
        &'s self,
        id: NodeId,
        namespace: &'s str,
        local_name: &'s str,
    ) -> impl Iterator<Item = NodeId> + 's {
        self.descendants(id)
            .into_iter()
            .skip(1)
            .filter(move |&d| self.is_element(d, namespace, local_name))
    }

    /// Concatenates all descendant character data.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|d| match self.kind(d) {
                NodeKind::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Returns the value of an unqualified attribute on an element.
    #[must_use]
    pub fn attribute(&self, id: NodeId, local_name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attribute(local_name))
    }

    /// Returns every namespace binding in scope at `id`, keyed by prefix.
    ///
    /// A default namespace undeclared with `xmlns=""` is omitted.
    #[must_use]
    pub fn in_scope_namespaces(&self, id: NodeId) -> BTreeMap<String, String> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            chain.push(node);
            cursor = self.parent(node);
        }

        let mut scope = BTreeMap::new();
        for node in chain.into_iter().rev() {
            if let Some(el) = self.element(node) {
                for (prefix, uri) in &el.namespace_decls {
                    scope.insert(prefix.clone(), uri.clone());
                }
            }
        }
        scope.retain(|_, uri| !uri.is_empty());
        scope
    }

    /// Finds the element whose `ID` attribute equals `id_value`.
    #[must_use]
    pub fn element_by_id(&self, id_value: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.attribute(n, "ID") == Some(id_value))
    }

    /// Returns the first `ID` value that occurs on more than one element.
    #[must_use]
    pub fn duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.descendants(self.root)
            .into_iter()
            .filter_map(|n| self.attribute(n, "ID"))
            .find(|id| !seen.insert(*id))
    }
}

fn utf8(bytes: &[u8]) -> SamlResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| SamlError::XmlParse(format!("invalid UTF-8: {e}")))
}

fn normalize_line_endings(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Attribute value normalization for CDATA-typed attributes: literal
/// whitespace becomes a space before references are expanded.
fn normalize_attribute_value(raw: &str) -> SamlResult<String> {
    let spaced = normalize_line_endings(raw).replace(['\n', '\t'], " ");
    quick_xml::escape::unescape(&spaced)
        .map(Cow::into_owned)
        .map_err(|e| SamlError::XmlParse(e.to_string()))
}

fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

fn lookup_in<'n>(nodes: &'n [Node], mut cursor: Option<NodeId>, prefix: &str) -> Option<&'n str> {
    if prefix == "xml" {
        return Some(XML_NS);
    }
    while let Some(id) = cursor {
        if let NodeKind::Element(el) = &nodes[id.0].kind {
            if let Some((_, uri)) = el.namespace_decls.iter().find(|(p, _)| p == prefix) {
                return (!uri.is_empty()).then_some(uri.as_str());
            }
        }
        cursor = nodes[id.0].parent;
    }
    None
}

fn push_node(nodes: &mut Vec<Node>, parent: NodeId, kind: NodeKind) -> NodeId {
    let id = NodeId(nodes.len());
    nodes.push(Node {
        kind,
        parent: Some(parent),
        children: Vec::new(),
    });
    nodes[parent.0].children.push(id);
    id
}

fn push_element(
    nodes: &mut Vec<Node>,
    stack: &[NodeId],
    start_tag: &BytesStart<'_>,
    start: usize,
    end: usize,
) -> SamlResult<NodeId> {
    let name = utf8(start_tag.name().as_ref())?.to_string();
    let (prefix, local_name) = split_qname(&name);

    let mut namespace_decls = Vec::new();
    let mut raw_attributes = Vec::new();
    for attr in start_tag.attributes() {
        let attr = attr?;
        let key = utf8(attr.key.as_ref())?;
        let value = normalize_attribute_value(utf8(&attr.value)?)?;

        if key == "xmlns" {
            namespace_decls.push((String::new(), value));
        } else if let Some(declared) = key.strip_prefix("xmlns:") {
            if value.is_empty() {
                return Err(SamlError::XmlParse(format!(
                    "prefix '{declared}' cannot be bound to an empty namespace"
                )));
            }
            namespace_decls.push((declared.to_string(), value));
        } else {
            raw_attributes.push((key.to_string(), value));
        }
    }

    let parent = stack.last().copied();
    let id = NodeId(nodes.len());
    nodes.push(Node {
        kind: NodeKind::Element(Element {
            prefix: prefix.map(str::to_string),
            local_name: local_name.to_string(),
            namespace: None,
            attributes: Vec::new(),
            namespace_decls,
            span: start..end,
            content_start: end,
        }),
        parent,
        children: Vec::new(),
    });
    if let Some(parent) = parent {
        nodes[parent.0].children.push(id);
    }

    let namespace = match prefix {
        Some(p) => Some(
            lookup_in(nodes, Some(id), p)
                .ok_or_else(|| SamlError::XmlParse(format!("undeclared namespace prefix '{p}'")))?
                .to_string(),
        ),
        None => lookup_in(nodes, Some(id), "").map(str::to_string),
    };

    let mut attributes = Vec::with_capacity(raw_attributes.len());
    for (key, value) in raw_attributes {
        let (attr_prefix, attr_local) = split_qname(&key);
        let attr_namespace = match attr_prefix {
            Some(p) => Some(
                lookup_in(nodes, Some(id), p)
                    .ok_or_else(|| {
                        SamlError::XmlParse(format!("undeclared namespace prefix '{p}'"))
                    })?
                    .to_string(),
            ),
            None => None,
        };
        attributes.push(Attribute {
            local_name: attr_local.to_string(),
            namespace: attr_namespace,
            value,
        });
    }

    if let NodeKind::Element(el) = &mut nodes[id.0].kind {
        el.namespace = namespace;
        el.attributes = attributes;
    }

    Ok(id)
}
