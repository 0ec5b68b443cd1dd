//! Minimal owned XML tree for OOXML parts
//!
//! Parts are small enough to keep fully in memory, and an owned tree makes it
//! straightforward to collapse runs or insert properties in schema order.
//! Qualified names are kept verbatim (`w:p`), so a part written back out keeps
//! the prefixes it was read with.

use crate::{DocxError, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A node inside an element
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
}

/// An XML element with ordered attributes and children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Qualified name (e.g., "w:p")
    pub name: String,
    /// Attributes in document order, values unescaped
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Name without its namespace prefix
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Get an attribute value by qualified name
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Append a child element
    pub fn push_element(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Append a text node
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::Text(text.into()));
    }

    /// Iterate over child elements
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Iterate mutably over child elements
    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// First child element with the given qualified name
    pub fn find_child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.name == name)
    }

    /// First child element with the given qualified name (mutable)
    pub fn find_child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.child_elements_mut().find(|el| el.name == name)
    }

    /// Concatenated text of this element's direct text and CDATA children
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                _ => {}
            }
        }
        out
    }

    /// Insert `child` before the first existing child whose name is in
    /// `successors`, or append it when none is present.
    ///
    /// OOXML property containers are sequences with a fixed element order;
    /// this keeps inserted properties valid against that order.
    pub fn insert_before_any(&mut self, child: XmlElement, successors: &[String]) {
        let position = self.children.iter().position(|node| match node {
            XmlNode::Element(el) => successors.iter().any(|s| *s == el.name),
            _ => false,
        });
        match position {
            Some(index) => self.children.insert(index, XmlNode::Element(child)),
            None => self.children.push(XmlNode::Element(child)),
        }
    }

    /// Depth-first search (pre-order) for the first element matching `pred`
    pub fn find_first_mut<'a>(
        &'a mut self,
        pred: &dyn Fn(&XmlElement) -> bool,
    ) -> Option<&'a mut XmlElement> {
        if pred(self) {
            return Some(self);
        }
        for child in self.children.iter_mut() {
            if let XmlNode::Element(el) = child {
                if let Some(found) = el.find_first_mut(pred) {
                    return Some(found);
                }
            }
        }
        None
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut element = XmlElement::new(name);
        for attr in start.attributes() {
            let attr = attr.map_err(|e| DocxError::XmlError(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| DocxError::XmlError(e.to_string()))?
                .into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }
}

/// The `<?xml ...?>` declaration of a part
#[derive(Debug, Clone, PartialEq)]
struct Declaration {
    version: String,
    encoding: Option<String>,
    standalone: Option<String>,
}

impl Declaration {
    fn from_event(decl: &BytesDecl<'_>) -> Result<Self> {
        let version = decl
            .version()
            .map(|v| String::from_utf8_lossy(&v).into_owned())
            .map_err(|e| DocxError::XmlError(e.to_string()))?;
        let encoding = match decl.encoding() {
            Some(Ok(v)) => Some(String::from_utf8_lossy(&v).into_owned()),
            _ => None,
        };
        let standalone = match decl.standalone() {
            Some(Ok(v)) => Some(String::from_utf8_lossy(&v).into_owned()),
            _ => None,
        };
        Ok(Self {
            version,
            encoding,
            standalone,
        })
    }
}

/// A parsed XML document (one package part)
#[derive(Debug, Clone, PartialEq)]
pub struct XmlTree {
    declaration: Option<Declaration>,
    /// Comments preceding the root element
    prolog: Vec<XmlNode>,
    /// Document element
    pub root: XmlElement,
}

impl XmlTree {
    /// Wrap a root element in a tree with a standard OOXML declaration
    pub fn new(root: XmlElement) -> Self {
        Self {
            declaration: Some(Declaration {
                version: "1.0".to_string(),
                encoding: Some("UTF-8".to_string()),
                standalone: Some("yes".to_string()),
            }),
            prolog: Vec::new(),
            root,
        }
    }

    /// Parse a part from raw bytes (UTF-8, optional BOM)
    pub fn parse_bytes(data: &[u8]) -> Result<Self> {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        let xml = std::str::from_utf8(data).map_err(|e| DocxError::XmlError(e.to_string()))?;
        Self::parse(xml)
    }

    /// Parse a part from a string
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut declaration = None;
        let mut prolog = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                DocxError::XmlError(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                ))
            })?;

            match event {
                Event::Decl(decl) => declaration = Some(Declaration::from_event(&decl)?),
                Event::Start(start) => stack.push(XmlElement::from_start(&start)?),
                Event::Empty(start) => {
                    let element = XmlElement::from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| DocxError::XmlError("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = text
                            .unescape()
                            .map_err(|e| DocxError::XmlError(e.to_string()))?;
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        parent.children.push(XmlNode::CData(text));
                    }
                }
                Event::Comment(comment) => {
                    let text = String::from_utf8_lossy(&comment).into_owned();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Comment(text)),
                        None if root.is_none() => prolog.push(XmlNode::Comment(text)),
                        None => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(DocxError::XmlError(format!(
                "unclosed element <{}>",
                stack[stack.len() - 1].name
            )));
        }

        let root = root.ok_or_else(|| DocxError::XmlError("document has no root".to_string()))?;

        Ok(Self {
            declaration,
            prolog,
            root,
        })
    }

    /// Prefix bound to `namespace` on the root element.
    ///
    /// Returns `Some("")` for a default namespace declaration.
    pub fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.root.attributes.iter().find_map(|(key, value)| {
            if value != namespace {
                return None;
            }
            if key == "xmlns" {
                Some("")
            } else {
                key.strip_prefix("xmlns:")
            }
        })
    }

    /// Serialize back to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());

        if let Some(decl) = &self.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new(
                    &decl.version,
                    decl.encoding.as_deref(),
                    decl.standalone.as_deref(),
                )))
                .map_err(|e| DocxError::XmlError(e.to_string()))?;
            writer.get_mut().extend_from_slice(b"\r\n");
        }

        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;

        Ok(writer.into_inner())
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(DocxError::XmlError(format!(
                "second root element <{}>",
                element.name
            )))
        }
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| DocxError::XmlError(e.to_string()));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| DocxError::XmlError(e.to_string()))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| DocxError::XmlError(e.to_string()))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<()> {
    let result = match node {
        XmlNode::Element(el) => return write_element(writer, el),
        XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text))),
        XmlNode::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str()))),
        XmlNode::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
        }
    };
    result.map_err(|e| DocxError::XmlError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_keeps_structure() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="urn:w"><w:body><w:p><w:r><w:t xml:space="preserve"> a &amp; b </w:t></w:r></w:p></w:body></w:document>"#;
        let tree = XmlTree::parse(xml).unwrap();

        assert_eq!(tree.root.name, "w:document");
        assert_eq!(tree.root.local_name(), "document");
        let body = tree.root.find_child("w:body").unwrap();
        let t = body
            .find_child("w:p")
            .and_then(|p| p.find_child("w:r"))
            .and_then(|r| r.find_child("w:t"))
            .unwrap();
        assert_eq!(t.text(), " a & b ");
        assert_eq!(t.attribute("xml:space"), Some("preserve"));
    }

    #[test]
    fn test_roundtrip_escapes_text() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<root a="x &quot;y&quot;"><!-- note --><child>1 &lt; 2</child><empty/></root>"#;
        let tree = XmlTree::parse(xml).unwrap();
        let bytes = tree.to_bytes().unwrap();
        let reparsed = XmlTree::parse_bytes(&bytes).unwrap();

        assert_eq!(reparsed, tree);
        assert_eq!(reparsed.root.attribute("a"), Some("x \"y\""));
        assert_eq!(reparsed.root.find_child("child").unwrap().text(), "1 < 2");
    }

    #[test]
    fn test_prefix_for() {
        let tree =
            XmlTree::parse(r#"<x:doc xmlns:x="urn:a" xmlns="urn:b"></x:doc>"#).unwrap();
        assert_eq!(tree.prefix_for("urn:a"), Some("x"));
        assert_eq!(tree.prefix_for("urn:b"), Some(""));
        assert_eq!(tree.prefix_for("urn:c"), None);
    }

    #[test]
    fn test_insert_before_any() {
        let mut parent = XmlElement::new("rPr");
        parent.push_element(XmlElement::new("b"));
        parent.push_element(XmlElement::new("lang"));

        parent.insert_before_any(
            XmlElement::new("sz"),
            &["szCs".to_string(), "lang".to_string()],
        );
        let names: Vec<_> = parent.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "sz", "lang"]);

        parent.insert_before_any(XmlElement::new("oMath"), &[]);
        let names: Vec<_> = parent.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "sz", "lang", "oMath"]);
    }

    #[test]
    fn test_unbalanced_document_is_error() {
        assert!(XmlTree::parse("<a><b></a>").is_err());
        assert!(XmlTree::parse("").is_err());
    }
}
