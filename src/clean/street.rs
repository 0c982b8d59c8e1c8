use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

/// Last run of non-whitespace at the end of a name, e.g. "St." in "Pearl St.".
static STREET_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\S+\.?$").expect("street type pattern is valid")
});

static DIRECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<dir>[ESNW])\.?\s").expect("direction pattern is valid")
});

/// Street types that are already in their canonical form.
pub static EXPECTED: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "Street", "Avenue", "Boulevard", "Drive", "Court", "Place", "Square", "Lane", "Road",
        "Trail", "Parkway", "Commons", "Circle", "Highway", "Mall", "Point", "Way", "West",
        "Broadway", "East", "North", "South",
    ]
    .into_iter()
    .collect()
});

/// Replacement for every non-canonical street type seen in the Boulder extract.
///
/// Some entries are abbreviations ("St" -> "Street"); others are bare road
/// names that lack a type altogether ("Baseline" -> "Baseline Road").
/// "Roadaddr" is a data-entry artifact of that extract, not an abbreviation.
pub static MAPPING: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("St", "Street"),
        ("St.", "Street"),
        ("st", "Street"),
        ("Ave", "Avenue"),
        ("Ave.", "Avenue"),
        ("ave.", "Avenue"),
        ("Rd", "Road"),
        ("Rd.", "Road"),
        ("Blvd", "Boulevard"),
        ("Dr", "Drive"),
        ("Ct", "Court"),
        ("Pl", "Place"),
        ("Cir", "Circle"),
        ("trail", "Trail"),
        ("Roadaddr", "Avenue"),
        ("Baseline", "Baseline Road"),
        ("Arapahoe", "Arapahoe Avenue"),
        ("Varra", "Varra Road"),
        ("Walnut", "Walnut Street"),
        ("Appia", "Appia Way"),
        ("Cherryvale", "Cherryvale Road"),
        ("Centennial", "Centennial Trail"),
        ("Etna", "Etna Court"),
        ("Valmont", "Valmont Road"),
    ]
    .into_iter()
    .collect()
});

/// Byte offset where the trailing street type of `name` starts.
fn street_type_start(name: &str) -> Option<usize> {
    STREET_TYPE_RE.find(name).map(|m| m.start())
}

/// The trailing street type of `name`, if it has one.
pub fn street_type(name: &str) -> Option<&str> {
    street_type_start(name).map(|start| &name[start..])
}

pub fn is_expected(street_type: &str) -> bool {
    EXPECTED.contains(street_type)
}

/// Swaps the trailing street type for its entry in `mapping`. Names whose
/// street type has no entry come back unchanged.
pub fn update_name(name: &str, mapping: &HashMap<&str, &str>) -> String {
    street_type_start(name)
        .and_then(|start| {
            mapping.get(&name[start..])
                .map(|replacement| format!("{}{}", &name[..start], replacement))
        })
        .unwrap_or_else(|| name.to_string())
}

/// Expands a leading single-letter direction ("E Main St", "N. Broadway").
pub fn fix_direction(name: &str) -> String {
    let Some(captures) = DIRECTION_RE.captures(name) else {
        return name.to_string();
    };
    let direction = match &captures["dir"] {
        "E" => "East",
        "S" => "South",
        "N" => "North",
        _ => "West",
    };
    let rest = &name[captures.get(0).map_or(0, |m| m.end())..];
    format!("{direction} {rest}")
}

/// Full street name cleanup: map a non-canonical street type, then expand a
/// directional prefix.
pub fn audit_street_type(name: &str) -> String {
    let name = match street_type(name) {
        Some(street_type) if !is_expected(street_type) => update_name(name, &MAPPING),
        _ => name.to_string(),
    };
    fix_direction(&name)
}
