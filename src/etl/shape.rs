use crate::clean::{audit_street_type, clean_post};
use crate::data::osm::{RawChild, RawElement};
use crate::data::record::{Created, ElementType, ShapedRecord};
use crate::errors::{Error, Result};

/// Element attributes that end up in a dedicated record field.
const RESERVED_ATTRIBUTES: [&str; 9] = [
    "id", "visible", "lat", "lon", "version", "changeset", "timestamp", "user", "uid",
];

enum ChildKind<'a> {
    Tag { key: &'a str, value: &'a str },
    NodeRef(&'a str),
    Other,
}

enum TagRoute {
    HouseNumber,
    Street,
    Postcode,
    /// Any other `addr*` key. Dropped.
    OtherAddress,
    Field,
}

impl TagRoute {
    fn of(key: &str) -> TagRoute {
        match key {
            "addr:housenumber" => TagRoute::HouseNumber,
            "addr:street" => TagRoute::Street,
            "addr:postcode" => TagRoute::Postcode,
            _ if key.starts_with("addr") => TagRoute::OtherAddress,
            _ => TagRoute::Field,
        }
    }
}

fn required<'a>(element: &'a RawElement, key: &str) -> Result<&'a str> {
    element.attribute(key).ok_or_else(|| {
        Error::malformed(
            &element.name,
            element.attribute("id"),
            element.position,
            format!("missing attribute {key:?}"),
        )
    })
}

fn coordinate(element: &RawElement, key: &str) -> Result<f64> {
    let raw = required(element, key)?;
    let invalid = |reason: String| {
        Error::malformed(
            &element.name,
            element.attribute("id"),
            element.position,
            format!("invalid {key} {raw:?}: {reason}"),
        )
    };
    let value: f64 = raw.trim().parse().map_err(|err| invalid(format!("{err}")))?;
    // "NaN" and "inf" parse fine but would be written out as JSON null.
    if !value.is_finite() {
        return Err(invalid("not a finite number".to_string()));
    }
    Ok(value)
}

fn classify<'a>(element: &RawElement, element_type: ElementType, child: &'a RawChild) -> Result<ChildKind<'a>> {
    let child_attribute = |key: &str| {
        child.attributes.get(key).ok_or_else(|| {
            Error::malformed(
                &element.name,
                element.attribute("id"),
                element.position,
                format!("<{}> child is missing attribute {key:?}", child.name),
            )
        })
    };
    match child.name.as_str() {
        "tag" => Ok(ChildKind::Tag {
            key: child_attribute("k")?,
            value: child_attribute("v")?,
        }),
        "nd" if element_type == ElementType::Way => Ok(ChildKind::NodeRef(child_attribute("ref")?)),
        _ => Ok(ChildKind::Other),
    }
}

fn apply_tag(record: &mut ShapedRecord, key: &str, value: &str) {
    match TagRoute::of(key) {
        TagRoute::HouseNumber => {
            record.address.housenumber = Some(value.to_string());
        },
        TagRoute::Street => {
            record.address.street = Some(audit_street_type(value.trim()));
        },
        TagRoute::Postcode => {
            if let Some(postcode) = clean_post(value) {
                record.address.postcode = Some(postcode);
            }
        },
        TagRoute::OtherAddress => (),
        TagRoute::Field => {
            record.fields.insert(key.to_string(), value.to_string());
        },
    }
}

/// Flattens a `node` or `way` into a [`ShapedRecord`]. Other elements give
/// `Ok(None)`. A missing or unparseable required attribute is an error.
pub fn shape_element(element: &RawElement) -> Result<Option<ShapedRecord>> {
    let Some(element_type) = ElementType::from_name(&element.name) else {
        return Ok(None);
    };

    let created = Created {
        version: required(element, "version")?.to_string(),
        changeset: required(element, "changeset")?.to_string(),
        timestamp: required(element, "timestamp")?.to_string(),
        user: required(element, "user")?.to_string(),
        uid: required(element, "uid")?.to_string(),
    };
    let mut record = ShapedRecord::new(required(element, "id")?.to_string(), element_type, created);
    record.visible = element.attribute("visible").map(str::to_string);
    if element_type == ElementType::Node {
        record.pos = Some([coordinate(element, "lat")?, coordinate(element, "lon")?]);
    }

    for (key, value) in element.attributes.iter() {
        if !RESERVED_ATTRIBUTES.contains(&key) {
            record.fields.insert(key.to_string(), value.to_string());
        }
    }

    for child in &element.children {
        match classify(element, element_type, child)? {
            ChildKind::Tag { key, value } => apply_tag(&mut record, key, value),
            ChildKind::NodeRef(node_ref) => record.node_refs.push(node_ref.to_string()),
            ChildKind::Other => (),
        }
    }

    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use crate::data::osm::Attributes;
    use crate::errors::ErrorKind;

    use super::*;

    const CREATED: [(&str, &str); 5] = [
        ("version", "4"),
        ("changeset", "2001"),
        ("timestamp", "2015-03-02T18:00:00Z"),
        ("user", "boulder_mapper"),
        ("uid", "314"),
    ];

    fn element(name: &str, attributes: &[(&str, &str)], children: &[(&str, &[(&str, &str)])]) -> RawElement {
        let mut element = RawElement::new(
            name.to_string(),
            attributes.iter().copied().chain(CREATED).collect(),
            128,
        );
        element.children = children.iter()
            .map(|(name, attributes)| RawChild {
                name: name.to_string(),
                attributes: attributes.iter().copied().collect::<Attributes>(),
            })
            .collect();
        element
    }

    fn tag<'a>(k: &'a str, v: &'a str) -> [(&'a str, &'a str); 2] {
        [("k", k), ("v", v)]
    }

    #[test]
    fn node_gets_position_and_created() {
        let node = element("node", &[("id", "11"), ("lat", "40.0150"), ("lon", "-105.2705")], &[]);
        let record = shape_element(&node).unwrap().unwrap();

        assert_eq!(record.id, "11");
        assert_eq!(record.element_type, ElementType::Node);
        assert_eq!(record.pos, Some([40.015, -105.2705]));
        assert_eq!(record.created.version, "4");
        assert_eq!(record.created.changeset, "2001");
        assert_eq!(record.created.timestamp, "2015-03-02T18:00:00Z");
        assert_eq!(record.created.user, "boulder_mapper");
        assert_eq!(record.created.uid, "314");
        assert!(record.address.is_empty());
        assert!(record.node_refs.is_empty());
        assert!(record.fields.is_empty());
    }

    #[test]
    fn address_tags_are_routed_and_cleaned() {
        let street = tag("addr:street", " N. Baseline ");
        let postcode = tag("addr:postcode", "CO 80305");
        let number = tag("addr:housenumber", "1600");
        let city = tag("addr:city", "Boulder");
        let amenity = tag("amenity", "library");
        let node = element(
            "node",
            &[("id", "12"), ("lat", "40.0"), ("lon", "-105.2")],
            &[("tag", &street), ("tag", &postcode), ("tag", &number), ("tag", &city), ("tag", &amenity)],
        );
        let record = shape_element(&node).unwrap().unwrap();

        assert_eq!(record.address.street.as_deref(), Some("North Baseline Road"));
        assert_eq!(record.address.postcode.as_deref(), Some("80305"));
        assert_eq!(record.address.housenumber.as_deref(), Some("1600"));
        assert_eq!(record.fields.len(), 1);
        assert_eq!(record.fields["amenity"], "library");
    }

    #[test]
    fn empty_postcode_is_omitted() {
        let postcode = tag("addr:postcode", "CO");
        let way = element("way", &[("id", "13")], &[("tag", &postcode)]);
        let record = shape_element(&way).unwrap().unwrap();
        assert!(record.address.is_empty());
    }

    #[test]
    fn way_collects_node_refs_in_order() {
        let refs = [[("ref", "30")], [("ref", "10")], [("ref", "20")]];
        let highway = tag("highway", "residential");
        let way = element(
            "way",
            &[("id", "14"), ("visible", "true")],
            &[("nd", &refs[0]), ("tag", &highway), ("nd", &refs[1]), ("nd", &refs[2])],
        );
        let record = shape_element(&way).unwrap().unwrap();

        assert_eq!(record.element_type, ElementType::Way);
        assert_eq!(record.pos, None);
        assert_eq!(record.visible.as_deref(), Some("true"));
        assert_eq!(record.node_refs, vec!["30", "10", "20"]);
        assert_eq!(record.fields["highway"], "residential");
    }

    #[test]
    fn way_without_refs_has_none() {
        let way = element("way", &[("id", "15")], &[]);
        let record = shape_element(&way).unwrap().unwrap();
        assert!(record.node_refs.is_empty());
    }

    #[test]
    fn other_elements_are_skipped() {
        let relation = element("relation", &[("id", "16")], &[("member", &[("ref", "14")])]);
        assert_eq!(shape_element(&relation).unwrap(), None);
        let bounds = RawElement::new("bounds".to_string(), Attributes::default(), 0);
        assert_eq!(shape_element(&bounds).unwrap(), None);
    }

    #[test]
    fn extra_attributes_become_fields() {
        let node = element("node", &[("id", "17"), ("lat", "1"), ("lon", "2"), ("action", "modify")], &[]);
        let record = shape_element(&node).unwrap().unwrap();
        assert_eq!(record.fields["action"], "modify");
    }

    #[test]
    fn node_without_lat_is_fatal() {
        let node = element("node", &[("id", "18"), ("lon", "-105.2")], &[]);
        let err = shape_element(&node).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedElement);
        assert_eq!(err.message, "node 18 at byte 128: missing attribute \"lat\"");
    }

    #[test]
    fn unparseable_coordinate_is_fatal() {
        let node = element("node", &[("id", "19"), ("lat", "north"), ("lon", "-105.2")], &[]);
        let err = shape_element(&node).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedElement);
        assert!(err.message.starts_with("node 19 at byte 128: invalid lat \"north\""));
    }

    #[test]
    fn non_finite_coordinate_is_fatal() {
        let node = element("node", &[("id", "21"), ("lat", "NaN"), ("lon", "-105.2")], &[]);
        let err = shape_element(&node).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedElement);
        assert_eq!(err.message, "node 21 at byte 128: invalid lat \"NaN\": not a finite number");

        let node = element("node", &[("id", "22"), ("lat", "40.0"), ("lon", "inf")], &[]);
        let err = shape_element(&node).unwrap_err();
        assert_eq!(err.message, "node 22 at byte 128: invalid lon \"inf\": not a finite number");
    }

    #[test]
    fn missing_id_is_fatal() {
        let way = element("way", &[], &[]);
        let err = shape_element(&way).unwrap_err();
        assert_eq!(err.message, "way at byte 128: missing attribute \"id\"");
    }

    #[test]
    fn tag_without_value_is_fatal() {
        let way = element("way", &[("id", "20")], &[("tag", &[("k", "name")])]);
        let err = shape_element(&way).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedElement);
        assert_eq!(err.message, "way 20 at byte 128: <tag> child is missing attribute \"v\"");
    }

    #[test]
    fn way_node_ref_without_ref_is_fatal() {
        let way = element("way", &[("id", "23")], &[("nd", &[("role", "outer")])]);
        let err = shape_element(&way).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedElement);
        assert_eq!(err.message, "way 23 at byte 128: <nd> child is missing attribute \"ref\"");
    }

    #[test]
    fn node_ignores_nd_children() {
        let node = element("node", &[("id", "24"), ("lat", "40.0"), ("lon", "-105.2")], &[("nd", &[])]);
        let record = shape_element(&node).unwrap().unwrap();
        assert!(record.node_refs.is_empty());
    }
}
