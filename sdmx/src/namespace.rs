use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::tree::Element;

lazy_static! {
    /// SDMX 2.1 namespaces end in `/v2_1/<description>`.
    static ref DESCRIPTION: Regex = Regex::new(r"/v2_1/(.+)$").unwrap();
}

/// Short description of an SDMX namespace URI, e.g. `structure` for
/// `http://www.sdmx.org/resources/sdmxml/schemas/v2_1/structure`.
pub fn describe(uri: &str) -> Option<&str> {
    DESCRIPTION
        .captures(uri)
        .and_then(|captures| captures.get(1))
        .map(|description| description.as_str())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace {
    pub uri: String,
    pub description: Option<String>,
}

/// The namespaces prefixing element tags of a document, in order of first appearance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Namespaces(Vec<Namespace>);

impl Namespaces {
    pub fn discover(root: &Element) -> Self {
        let mut namespaces: Vec<Namespace> = Vec::new();
        for element in root.iter() {
            let Some(uri) = element.tag.namespace_name.as_deref() else {
                continue;
            };
            if namespaces.iter().any(|namespace| namespace.uri == uri) {
                continue;
            }
            namespaces.push(Namespace {
                uri: uri.to_string(),
                description: describe(uri).map(str::to_string),
            });
        }
        log::debug!("discovered {} namespaces", namespaces.len());
        Self(namespaces)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Namespace> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn find_description(&self, uri: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|namespace| namespace.uri == uri)
            .and_then(|namespace| namespace.description.as_deref())
    }

    pub fn find_namespace(&self, description: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|namespace| namespace.description.as_deref() == Some(description))
            .map(|namespace| namespace.uri.as_str())
    }
}

impl fmt::Display for Namespaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "XPath namespaces: ")?;
        for namespace in &self.0 {
            writeln!(f, "-> {}", namespace.uri)?;
        }
        Ok(())
    }
}
