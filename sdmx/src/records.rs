//! Flat records extracted from SDMX structure messages.
//!
//! Both extractors look elements up through the namespaces discovered in the response: the
//! `structure` namespace qualifies `Dataflow`, `Codelist`, `Code`, `Structure` and `Parent`,
//! the `common` namespace qualifies `Name`. References (`Ref`) are unqualified.

use crate::{
    error::ExtractError,
    hierarchy::{collapse_whitespace, NONE},
    namespace::Namespaces,
    report::Tabular,
    tree::{Element, XML_NAMESPACE},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataflowRecord {
    pub dataflow_id: String,
    pub agency_id: String,
    pub dataflow_name: String,
    pub reference_id: String,
    pub reference_agency_id: String,
    pub reference_class: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodelistRecord {
    pub agency_id: String,
    pub codelist_id: String,
    pub codelist_name: String,
    pub code_id: String,
    pub code_name: String,
    pub code_parent: String,
}

struct Aliases<'a> {
    structure: &'a str,
    common: Option<&'a str>,
}

impl<'a> Aliases<'a> {
    fn resolve(namespaces: &'a Namespaces) -> Option<Self> {
        Some(Self {
            structure: namespaces.find_namespace("structure")?,
            common: namespaces.find_namespace("common"),
        })
    }

    /// The `xml:lang="en"` label among the `common:Name` children, or an empty string.
    fn english_name(&self, element: &Element) -> String {
        let Some(common) = self.common else {
            return String::new();
        };
        element
            .children_named(Some(common), "Name")
            .find(|name| name.attribute(Some(XML_NAMESPACE), "lang") == Some("en"))
            .and_then(|name| name.text.as_deref())
            .map(collapse_whitespace)
            .unwrap_or_default()
    }

    /// The unqualified `Ref` below `<structure:{wrapper}>`, if present.
    fn reference<'e>(&self, element: &'e Element, wrapper: &str) -> Option<&'e Element> {
        element
            .child_named(Some(self.structure), wrapper)?
            .child_named(None, "Ref")
    }
}

fn required(
    element: &Element,
    element_name: &'static str,
    attribute: &'static str,
) -> Result<String, ExtractError> {
    element
        .attribute(None, attribute)
        .map(str::to_string)
        .ok_or(ExtractError::MissingAttribute {
            element: element_name,
            attribute,
        })
}

fn optional(element: Option<&Element>, attribute: &str) -> String {
    element
        .and_then(|element| element.attribute(None, attribute))
        .unwrap_or(NONE)
        .to_string()
}

pub fn dataflows(
    root: &Element,
    namespaces: &Namespaces,
) -> Result<Vec<DataflowRecord>, ExtractError> {
    let Some(aliases) = Aliases::resolve(namespaces) else {
        log::debug!("no structure namespace, no dataflows to extract");
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for dataflow in root
        .descendants()
        .filter(|element| element.tag.matches(Some(aliases.structure), "Dataflow"))
    {
        let reference = aliases.reference(dataflow, "Structure");
        records.push(DataflowRecord {
            dataflow_id: required(dataflow, "Dataflow", "id")?,
            agency_id: required(dataflow, "Dataflow", "agencyID")?,
            dataflow_name: aliases.english_name(dataflow),
            reference_id: optional(reference, "id"),
            reference_agency_id: optional(reference, "agencyID"),
            reference_class: optional(reference, "class"),
        });
    }
    log::info!("extracted {} dataflows", records.len());
    Ok(records)
}

pub fn codelists(
    root: &Element,
    namespaces: &Namespaces,
) -> Result<Vec<CodelistRecord>, ExtractError> {
    let Some(aliases) = Aliases::resolve(namespaces) else {
        log::debug!("no structure namespace, no codelists to extract");
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for codelist in root
        .descendants()
        .filter(|element| element.tag.matches(Some(aliases.structure), "Codelist"))
    {
        let agency_id = required(codelist, "Codelist", "agencyID")?;
        let codelist_id = required(codelist, "Codelist", "id")?;
        let codelist_name = aliases.english_name(codelist);

        for code in codelist.children_named(Some(aliases.structure), "Code") {
            records.push(CodelistRecord {
                agency_id: agency_id.clone(),
                codelist_id: codelist_id.clone(),
                codelist_name: codelist_name.clone(),
                code_id: required(code, "Code", "id")?,
                code_name: aliases.english_name(code),
                code_parent: optional(aliases.reference(code, "Parent"), "id"),
            });
        }
    }
    log::info!("extracted {} codes", records.len());
    Ok(records)
}

impl Tabular for DataflowRecord {
    const HEADERS: &'static [&'static str] = &[
        "dataflow_id",
        "agency_id",
        "dataflow_name",
        "reference_id",
        "reference_agency_id",
        "reference_class",
    ];

    fn cells(&self) -> Vec<&str> {
        vec![
            self.dataflow_id.as_str(),
            self.agency_id.as_str(),
            self.dataflow_name.as_str(),
            self.reference_id.as_str(),
            self.reference_agency_id.as_str(),
            self.reference_class.as_str(),
        ]
    }
}

impl Tabular for CodelistRecord {
    const HEADERS: &'static [&'static str] = &[
        "agency_id",
        "codelist_id",
        "codelist_name",
        "code_id",
        "code_name",
        "code_parent",
    ];

    fn cells(&self) -> Vec<&str> {
        vec![
            self.agency_id.as_str(),
            self.codelist_id.as_str(),
            self.codelist_name.as_str(),
            self.code_id.as_str(),
            self.code_name.as_str(),
            self.code_parent.as_str(),
        ]
    }
}
