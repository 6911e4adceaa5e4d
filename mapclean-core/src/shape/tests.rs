//! Unit tests for element shaping.

use super::*;
use crate::{CleaningTables, PostcodeOrder};
use rstest::{fixture, rstest};

fn entity_attributes(kind: ElementKind, id: &str) -> Attributes {
    let mut attributes = Attributes::from_iter([("id", id)]);
    if kind == ElementKind::Node {
        attributes.push("lat", "40.7359");
        attributes.push("lon", "-73.9911");
    }
    for (name, value) in [
        ("user", "mapper"),
        ("uid", "1234"),
        ("version", "3"),
        ("changeset", "55"),
        ("timestamp", "2016-05-01T12:00:00Z"),
    ] {
        attributes.push(name, value);
    }
    attributes
}

fn tag(key: &str, value: &str) -> Attributes {
    Attributes::from_iter([("k", key), ("v", value)])
}

#[fixture]
fn shaper() -> ElementShaper {
    ElementShaper::default()
}

#[fixture]
fn node() -> RawElement {
    let mut node = RawElement::new(ElementKind::Node, entity_attributes(ElementKind::Node, "101"));
    node.push_tag(tag("addr:street", "123 W Main St"));
    node.push_tag(tag("addr:postcode", "07302"));
    node.push_tag(tag("addr:housenumber", "123-125"));
    node.push_tag(tag("height", "12"));
    node.push_tag(tag("name", "Corner Deli"));
    node
}

#[fixture]
fn way() -> RawElement {
    let mut way = RawElement::new(ElementKind::Way, entity_attributes(ElementKind::Way, "900"));
    for reference in ["11", "12", "13", "11"] {
        way.push_node_ref(Attributes::from_iter([("ref", reference)]));
    }
    way.push_tag(tag("highway", "residential"));
    way.push_tag(tag("tiger:name_type", "Ave"));
    way
}

fn expect_point(shaped: ShapedElement) -> ShapedPoint {
    match shaped {
        ShapedElement::Point(point) => point,
        ShapedElement::Path(path) => panic!("expected a point, got {path:?}"),
    }
}

fn expect_path(shaped: ShapedElement) -> ShapedPath {
    match shaped {
        ShapedElement::Path(path) => path,
        ShapedElement::Point(point) => panic!("expected a path, got {point:?}"),
    }
}

#[rstest]
fn shapes_node_attributes_verbatim(shaper: ElementShaper, node: RawElement) {
    let point = expect_point(shaper.shape(&node).expect("node shapes"));

    assert_eq!(point.entity.id, "101");
    assert_eq!(point.entity.lat, "40.7359");
    assert_eq!(point.entity.lon, "-73.9911");
    assert_eq!(point.entity.changeset, "55");
}

#[rstest]
fn cleans_and_namespaces_node_tags(shaper: ElementShaper, node: RawElement) {
    let point = expect_point(shaper.shape(&node).expect("node shapes"));

    let tags: Vec<_> = point
        .tags
        .iter()
        .map(|tag| (tag.tag_type.as_str(), tag.key.as_str(), tag.value.as_str()))
        .collect();
    assert_eq!(
        tags,
        [
            ("addr", "street", "123 West Main Street"),
            ("addr", "postcode", "10001"),
            ("addr", "housenumber", "123"),
            ("regular", "height", "12.0"),
            ("regular", "name", "Corner Deli"),
        ]
    );
    assert!(point.tags.iter().all(|tag| tag.owner_id == "101"));
}

#[rstest]
fn numbers_way_references_in_declaration_order(shaper: ElementShaper, way: RawElement) {
    let path = expect_path(shaper.shape(&way).expect("way shapes"));

    let references: Vec<_> = path
        .references
        .iter()
        .map(|reference| (reference.path_id.as_str(), reference.node_id.as_str(), reference.position))
        .collect();
    assert_eq!(
        references,
        [("900", "11", 0), ("900", "12", 1), ("900", "13", 2), ("900", "11", 3)]
    );
}

#[rstest]
fn street_type_keys_are_cleaned_on_ways(shaper: ElementShaper, way: RawElement) {
    let path = expect_path(shaper.shape(&way).expect("way shapes"));

    let name_type = path
        .tags
        .iter()
        .find(|tag| tag.key == "name_type")
        .expect("tiger:name_type survives");
    assert_eq!(name_type.tag_type, "tiger");
    assert_eq!(name_type.value, "Avenue");
}

#[rstest]
#[case("addr.street")]
#[case("name:en fr")]
#[case("k=v")]
#[case("fixme?")]
#[case("cityracks.street")]
fn drops_keys_with_problem_characters(shaper: ElementShaper, #[case] key: &str) {
    let mut node = RawElement::new(ElementKind::Node, entity_attributes(ElementKind::Node, "5"));
    node.push_tag(tag(key, "5th Ave"));
    node.push_tag(tag("amenity", "cafe"));

    let point = expect_point(shaper.shape(&node).expect("node shapes"));

    assert_eq!(point.tags.len(), 1);
    assert_eq!(point.tags[0].key, "amenity");
}

#[rstest]
#[case("addr:street", Some(("addr", "street")))]
#[case("tiger:name_type_1", Some(("tiger", "name_type_1")))]
#[case("name:en:short", Some(("name", "en:short")))]
#[case("_private:x", Some(("_private", "x")))]
#[case("addr:Street", None)]
#[case("ISO3166-1:alpha2", None)]
#[case(":leading", None)]
#[case("trailing:", None)]
#[case("plain", None)]
fn splits_lowercase_namespaces(#[case] key: &str, #[case] expected: Option<(&str, &str)>) {
    assert_eq!(split_namespace(key), expected);
}

#[rstest]
#[case("addr:street", TagCategory::Street)]
#[case("tiger:name_type", TagCategory::Street)]
#[case("tiger:name_type_1", TagCategory::Street)]
#[case("addr:postcode", TagCategory::Postcode)]
#[case("addr:housenumber", TagCategory::HouseNumber)]
#[case("cityracks.housenum", TagCategory::HouseNumber)]
#[case("min_height", TagCategory::Height)]
#[case("name", TagCategory::Other)]
fn classifies_keys(#[case] key: &str, #[case] expected: TagCategory) {
    assert_eq!(TagCategory::of(key), expected);
}

#[rstest]
fn reports_missing_entity_attribute(shaper: ElementShaper) {
    let node = RawElement::new(
        ElementKind::Node,
        Attributes::from_iter([("id", "77"), ("lat", "1.0")]),
    );

    let err = shaper.shape(&node).expect_err("lon is missing");

    assert_eq!(
        err,
        MissingAttributeError {
            kind: ElementKind::Node,
            id: Some("77".into()),
            marker: "node",
            attribute: "lon",
        }
    );
    assert_eq!(err.to_string(), "node 77 is missing attribute `lon` on <node>");
}

#[rstest]
fn reports_missing_reference(shaper: ElementShaper) {
    let mut way = RawElement::new(ElementKind::Way, entity_attributes(ElementKind::Way, "3"));
    way.push_node_ref(Attributes::from_iter([("ref", "1")]));
    way.push_node_ref(Attributes::new());

    let err = shaper.shape(&way).expect_err("second nd has no ref");

    assert_eq!(err.marker, "nd");
    assert_eq!(err.attribute, "ref");
}

#[rstest]
fn reports_missing_tag_value(shaper: ElementShaper) {
    let mut node = RawElement::new(ElementKind::Node, entity_attributes(ElementKind::Node, "8"));
    node.push_tag(Attributes::from_iter([("k", "name")]));

    let err = shaper.shape(&node).expect_err("tag has no value");

    assert_eq!((err.marker, err.attribute), ("tag", "v"));
}

#[rstest]
fn honours_lexicographic_postcodes() {
    let shaper = ElementShaper::new(ValueCleaner::new(
        CleaningTables::default(),
        PostcodeOrder::Lexicographic,
    ));
    let mut node = RawElement::new(ElementKind::Node, entity_attributes(ElementKind::Node, "9"));
    node.push_tag(tag("addr:postcode", "1050"));

    let point = expect_point(shaper.shape(&node).expect("node shapes"));

    assert_eq!(point.tags[0].value, "1050");
}
