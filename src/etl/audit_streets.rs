use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use log::info;

use crate::clean::street::{is_expected, street_type, update_name, MAPPING};
use crate::data::osm::RawElement;
use crate::data::record::ElementType;
use crate::errors::Result;

use super::parse_osm::{open_osm_file, OsmReader};
use super::Etl;

pub const ETL_NAME: &str = "audit_streets";

/// Street names grouped by their non-canonical street type.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StreetTypes(BTreeMap<String, BTreeSet<String>>);

impl StreetTypes {
    /// Files `street_name` under its street type unless that type is already
    /// canonical.
    pub fn audit(&mut self, street_name: &str) {
        if let Some(street_type) = street_type(street_name) {
            if !is_expected(street_type) {
                self.0.entry(street_type.to_string())
                    .or_default()
                    .insert(street_name.to_string());
            }
        }
    }

    /// Audits every `addr:street` tag of a node or way.
    pub fn audit_element(&mut self, element: &RawElement) {
        if ElementType::from_name(&element.name).is_none() {
            return;
        }
        for child in &element.children {
            if child.name == "tag" && child.attributes.get("k") == Some("addr:street") {
                if let Some(street_name) = child.attributes.get("v") {
                    self.audit(street_name);
                }
            }
        }
    }

    pub fn get(&self, street_type: &str) -> Option<&BTreeSet<String>> {
        self.0.get(street_type)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Writes the buckets, then what the mapping table makes of every name.
    pub fn write_report<W: Write>(&self, out: &mut W) -> Result<()> {
        for (street_type, names) in &self.0 {
            writeln!(out, "{street_type}:")?;
            for name in names {
                writeln!(out, "    {name}")?;
            }
        }
        writeln!(out)?;
        for names in self.0.values() {
            for name in names {
                writeln!(out, "{} => {}", name, update_name(name, &MAPPING))?;
            }
        }
        Ok(())
    }
}

pub struct StreetAuditEtl<W: Write> {
    input_path: PathBuf,
    out: W,
}

impl<W: Write> StreetAuditEtl<W> {
    pub fn new(input_path: PathBuf, out: W) -> Self {
        StreetAuditEtl {
            input_path,
            out,
        }
    }
}

impl<W: Write> Etl for StreetAuditEtl<W> {
    type Input = OsmReader<Box<dyn BufRead>>;
    type Output = StreetTypes;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn extract(&mut self) -> Result<Self::Input> {
        open_osm_file(&self.input_path)
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let mut street_types = StreetTypes::default();
        for element in input {
            street_types.audit_element(&element?);
        }
        Ok(street_types)
    }

    fn load(&mut self, output: Self::Output) -> Result<()> {
        info!(etl_name = ETL_NAME, street_types = output.len(); "Writing street type report");
        output.write_report(&mut self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
