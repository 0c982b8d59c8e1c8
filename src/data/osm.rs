/// Attributes of an XML element, in document order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Attributes(pub Vec<(String, String)>);

impl Attributes {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Attributes(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A direct child of a map element, e.g. `<tag k=".." v=".."/>` or `<nd ref=".."/>`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChild {
    pub name: String,
    pub attributes: Attributes,
}

/// A top-level element of the .osm file exactly as read from the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    pub name: String,
    pub attributes: Attributes,
    pub children: Vec<RawChild>,
    /// Byte offset of the opening tag in the source.
    pub position: usize,
}

impl RawElement {
    pub fn new(name: String, attributes: Attributes, position: usize) -> Self {
        RawElement {
            name,
            attributes,
            children: Vec::new(),
            position,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key)
    }
}
