use std::{fmt::Write as _, io, path::Path};

use encoding_rs::{Encoding, UTF_8};
use lazy_static::lazy_static;
use regex::bytes::Regex;

use crate::{
    error::{ExtractError, RequestError},
    hierarchy,
    namespace::Namespaces,
    records::{self, CodelistRecord, DataflowRecord},
    session::RawResponse,
    tree::Element,
};

/// A successful answer to a query, with its body parsed into an element tree.
#[derive(Clone, Debug)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    hierarchy: Element,
    namespaces: Namespaces,
}

lazy_static! {
    /// The `encoding` pseudo-attribute of a leading XML declaration.
    static ref DECLARED_ENCODING: Regex = Regex::new(
        r#"^(?-u:\xEF\xBB\xBF)?<\?xml\s[^>]*?encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#
    )
    .unwrap();
}

/// The encoding named by the `charset` parameter of a `Content-Type` value.
fn charset(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .filter_map(|parameter| parameter.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, label)| Encoding::for_label(label.trim().trim_matches('"').as_bytes()))
}

/// The encoding named in the body's own `<?xml ...?>` declaration.
fn declared_encoding(body: &[u8]) -> Option<&'static Encoding> {
    DECLARED_ENCODING
        .captures(body)
        .and_then(|captures| captures.get(1))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
}

impl Response {
    /// Decodes and parses a raw answer. The `Content-Type` charset takes precedence over the
    /// XML declaration; without either the body is read as UTF-8.
    pub fn from_raw(raw: RawResponse) -> Result<Self, RequestError> {
        let encoding = raw
            .header("Content-Type")
            .and_then(charset)
            .or_else(|| declared_encoding(&raw.body))
            .unwrap_or(UTF_8);
        let (decoded, used, had_errors) = encoding.decode(&raw.body);
        if had_errors {
            log::warn!("response body contains malformed {} sequences", used.name());
        }

        let hierarchy = Element::parse(&decoded)?;
        let namespaces = Namespaces::discover(&hierarchy);
        log::debug!(
            "parsed {} elements in {} namespaces",
            hierarchy.node_count(),
            namespaces.len()
        );
        Ok(Self {
            status: raw.status,
            headers: raw.headers,
            body: raw.body,
            hierarchy,
            namespaces,
        })
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn hierarchy(&self) -> &Element {
        &self.hierarchy
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    pub fn find_description(&self, namespace: &str) -> Option<&str> {
        self.namespaces.find_description(namespace)
    }

    pub fn find_namespace(&self, description: &str) -> Option<&str> {
        self.namespaces.find_namespace(description)
    }

    /// Status code and headers, one per line.
    pub fn details(&self) -> String {
        let mut details = String::from("\nResponse details: \n");
        let _ = writeln!(details, "    - Code: {}\t", self.status);
        let _ = writeln!(details, "    - Headers: ");
        for (key, value) in &self.headers {
            let _ = writeln!(details, "        -> {key} : {value}");
        }
        details
    }

    /// The element tree as indented lines, namespaces replaced by their descriptions.
    pub fn printable_hierarchy(&self) -> Vec<String> {
        hierarchy::annotate(
            hierarchy::printable_hierarchy(&self.hierarchy, 0),
            &self.namespaces,
        )
    }

    pub fn write_hierarchy(&self, path: &Path, limit: Option<usize>) -> io::Result<()> {
        hierarchy::write_hierarchy(path, &self.printable_hierarchy(), limit)
    }

    pub fn dataflows(&self) -> Result<Vec<DataflowRecord>, ExtractError> {
        records::dataflows(&self.hierarchy, &self.namespaces)
    }

    pub fn codelists(&self) -> Result<Vec<CodelistRecord>, ExtractError> {
        records::codelists(&self.hierarchy, &self.namespaces)
    }
}
