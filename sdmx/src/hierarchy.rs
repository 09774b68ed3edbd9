use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use lazy_static::lazy_static;
use regex::Regex;

use crate::{namespace::Namespaces, tree::Element};

pub const HIERARCHY_FILE: &str = "hierarchy.txt";

/// Rendered in place of absent attributes or text.
pub const NONE: &str = "None";

const INDENT: &str = "    ";

lazy_static! {
    static ref SPACES: Regex = Regex::new(" +").unwrap();
}

/// Removes line breaks and collapses runs of spaces into one.
pub fn collapse_whitespace(text: &str) -> String {
    let text = text.replace(['\n', '\r'], "");
    SPACES.replace_all(&text, " ").into_owned()
}

fn render(element: &Element, depth: usize) -> String {
    let attributes = if element.attributes.is_empty() {
        NONE.to_string()
    } else {
        element
            .attributes
            .iter()
            .map(|attribute| format!("{}=\"{}\"", attribute.name.local_name, attribute.value))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let text = element
        .text
        .as_deref()
        .map(collapse_whitespace)
        .unwrap_or_else(|| NONE.to_string());
    format!(
        "{}{} [Attributes: {}]: {}",
        INDENT.repeat(depth),
        element.tag,
        attributes,
        text
    )
}

/// One line per element of the subtree rooted at `element`, in pre-order.
pub fn printable_hierarchy(element: &Element, depth: usize) -> Vec<String> {
    let mut lines = vec![render(element, depth)];
    for child in &element.children {
        lines.extend(printable_hierarchy(child, depth + 1));
    }
    lines
}

/// Replaces the `{uri}` prefix of each rendered tag with `-> (<description>) `.
pub fn annotate(lines: Vec<String>, namespaces: &Namespaces) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| {
            let tag_start = line.len() - line.trim_start_matches(' ').len();
            let (indent, rest) = line.split_at(tag_start);
            for namespace in namespaces.iter() {
                let Some(description) = namespace.description.as_deref() else {
                    continue;
                };
                let prefix = format!("{{{}}}", namespace.uri);
                if let Some(tail) = rest.strip_prefix(prefix.as_str()) {
                    return format!("{indent}-> ({description}) {tail}");
                }
            }
            line
        })
        .collect()
}

/// Writes the report header followed by `lines`, or only the first `limit` of them.
pub fn write_hierarchy(path: &Path, lines: &[String], limit: Option<usize>) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "XPath resource hierarchy:")?;
    writeln!(file, "{}", "=".repeat(50))?;
    let limit = limit.unwrap_or(lines.len());
    for line in lines.iter().take(limit) {
        writeln!(file, "{line}")?;
    }
    file.flush()
}
