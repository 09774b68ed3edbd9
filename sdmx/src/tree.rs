use std::fmt;

use roxmltree::Node;

/// The namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QName {
    pub namespace_name: Option<String>,
    pub local_name: String,
}

/// Renders in ElementTree notation, i.e. `{namespace}local`.
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace_name) = self.namespace_name.as_ref() {
            write!(f, "{{{}}}{}", namespace_name, self.local_name)
        } else {
            write!(f, "{}", self.local_name)
        }
    }
}

impl QName {
    pub fn with_optional_namespace(
        namespace_name: Option<impl Into<String>>,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            namespace_name: namespace_name.map(Into::into),
            local_name: local_name.into(),
        }
    }

    pub fn matches(&self, namespace_name: Option<&str>, local_name: &str) -> bool {
        self.namespace_name.as_deref() == namespace_name && self.local_name == local_name
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// An owned XML element, detached from the source buffer it was parsed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub tag: QName,
    pub attributes: Vec<Attribute>,
    /// Character data preceding the first child element, if any.
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn parse(source: &str) -> Result<Self, roxmltree::Error> {
        let document = roxmltree::Document::parse(source)?;
        Ok(Self::map_from_xml(document.root_element()))
    }

    fn map_from_xml(node: Node) -> Self {
        let tag_name = node.tag_name();
        let tag = QName::with_optional_namespace(tag_name.namespace(), tag_name.name());

        let attributes = node
            .attributes()
            .map(|attribute| Attribute {
                name: QName::with_optional_namespace(attribute.namespace(), attribute.name()),
                value: attribute.value().to_string(),
            })
            .collect();

        let mut text: Option<String> = None;
        for child in node.children().take_while(|child| !child.is_element()) {
            if !child.is_text() {
                continue;
            }
            if let Some(chunk) = child.text() {
                text.get_or_insert_with(String::new).push_str(chunk);
            }
        }

        let children = node
            .children()
            .filter(Node::is_element)
            .map(Self::map_from_xml)
            .collect();

        Self {
            tag,
            attributes,
            text,
            children,
        }
    }

    /// Pre-order traversal, starting with `self`.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Pre-order traversal of everything below `self`.
    pub fn descendants(&self) -> impl Iterator<Item = &Element> {
        self.iter().skip(1)
    }

    pub fn children_named<'a>(
        &'a self,
        namespace_name: Option<&'a str>,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a Element> {
        self.children
            .iter()
            .filter(move |child| child.tag.matches(namespace_name, local_name))
    }

    pub fn child_named(&self, namespace_name: Option<&str>, local_name: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|child| child.tag.matches(namespace_name, local_name))
    }

    pub fn attribute(&self, namespace_name: Option<&str>, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name.matches(namespace_name, local_name))
            .map(|attribute| attribute.value.as_str())
    }

    /// Number of elements in the subtree rooted at `self`.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }
}

pub struct Iter<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter().rev());
        Some(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"<root xmlns="urn:a" xmlns:b="urn:b">
    <b:first id="1" xml:lang="en">one<!-- skipped --> more</b:first>
    <second><third/></second>
    <fourth>tail</fourth>
</root>"#;

    #[test]
    fn parse_maps_tags_and_attributes() {
        let root = Element::parse(SOURCE).unwrap();
        assert_eq!(root.tag, QName::with_optional_namespace(Some("urn:a"), "root"));
        assert_eq!(root.children.len(), 3);

        let first = &root.children[0];
        assert_eq!(first.tag.to_string(), "{urn:b}first");
        assert_eq!(first.attribute(None, "id"), Some("1"));
        assert_eq!(first.attribute(Some(XML_NAMESPACE), "lang"), Some("en"));
        assert_eq!(first.text.as_deref(), Some("one more"));
    }

    #[test]
    fn text_stops_at_first_child_element() {
        let root = Element::parse("<a>lead<b/>trail</a>").unwrap();
        assert_eq!(root.text.as_deref(), Some("lead"));
        let root = Element::parse("<a><b/>trail</a>").unwrap();
        assert_eq!(root.text, None);
        let root = Element::parse("<a/>").unwrap();
        assert_eq!(root.text, None);
    }

    #[test]
    fn iter_is_pre_order() {
        let root = Element::parse(SOURCE).unwrap();
        let names: Vec<_> = root.iter().map(|e| e.tag.local_name.as_str()).collect();
        assert_eq!(names, vec!["root", "first", "second", "third", "fourth"]);
        assert_eq!(root.node_count(), 5);
        assert_eq!(root.descendants().count(), 4);
    }

    #[test]
    fn children_lookup_respects_namespace() {
        let root = Element::parse(SOURCE).unwrap();
        assert!(root.child_named(Some("urn:b"), "first").is_some());
        assert!(root.child_named(Some("urn:a"), "first").is_none());
        assert!(root.child_named(Some("urn:a"), "third").is_none());
        assert_eq!(root.children_named(Some("urn:a"), "second").count(), 1);
    }
}
