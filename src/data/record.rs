use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Node,
    Way,
}

impl ElementType {
    /// Maps an XML element name onto the kinds of element that get shaped.
    /// Anything else (relations, bounds, ...) is skipped.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "node" => Some(ElementType::Node),
            "way" => Some(ElementType::Way),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Node => "node",
            ElementType::Way => "way",
        }
    }
}

impl Serialize for ElementType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
pub struct Created {
    pub version: String,
    pub changeset: String,
    pub timestamp: String,
    pub user: String,
    pub uid: String,
}

#[derive(serde::Serialize, Debug, Default, Clone, PartialEq)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub housenumber: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.housenumber.is_none() && self.street.is_none() && self.postcode.is_none()
    }
}

/// One flattened map element, ready to be written as a JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedRecord {
    pub id: String,
    pub element_type: ElementType,
    pub visible: Option<String>,
    pub created: Created,
    /// `[lat, lon]`, nodes only.
    pub pos: Option<[f64; 2]>,
    pub address: Address,
    pub node_refs: Vec<String>,
    /// Tag pairs and leftover source attributes, emitted as top-level keys.
    pub fields: BTreeMap<String, String>,
}

impl ShapedRecord {
    pub fn new(id: String, element_type: ElementType, created: Created) -> Self {
        ShapedRecord {
            id,
            element_type,
            visible: None,
            created,
            pos: None,
            address: Address::default(),
            node_refs: Vec::new(),
            fields: BTreeMap::new(),
        }
    }

    fn shadowed(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }
}

impl Serialize for ShapedRecord {
    // Top-level fields win over the structural keys they collide with, except
    // `node_refs`, which is written after them.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.shadowed("id") {
            map.serialize_entry("id", &self.id)?;
        }
        if !self.shadowed("type") {
            map.serialize_entry("type", &self.element_type)?;
        }
        if let Some(visible) = &self.visible {
            if !self.shadowed("visible") {
                map.serialize_entry("visible", visible)?;
            }
        }
        if !self.shadowed("created") {
            map.serialize_entry("created", &self.created)?;
        }
        if let Some(pos) = &self.pos {
            if !self.shadowed("pos") {
                map.serialize_entry("pos", pos)?;
            }
        }
        if !self.address.is_empty() && !self.shadowed("address") {
            map.serialize_entry("address", &self.address)?;
        }
        for (key, value) in &self.fields {
            if key == "node_refs" && !self.node_refs.is_empty() {
                continue;
            }
            map.serialize_entry(key, value)?;
        }
        if !self.node_refs.is_empty() {
            map.serialize_entry("node_refs", &self.node_refs)?;
        }
        map.end()
    }
}
