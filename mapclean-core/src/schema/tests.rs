//! Unit tests for the schema contract and validator.

use super::*;
use crate::{PathEntity, PathReference, PointEntity, ShapedPath, ShapedPoint, TagRecord};
use rstest::{fixture, rstest};
use serde_json::json;

const TABULAR_ASSET: &str = include_str!("../../schema/tabular.json");

#[fixture]
fn validator() -> SchemaValidator {
    SchemaValidator::default()
}

#[fixture]
fn point() -> ShapedPoint {
    ShapedPoint {
        entity: PointEntity {
            id: "101".into(),
            lat: "40.7359".into(),
            lon: "-73.9911".into(),
            user: "mapper".into(),
            uid: "1234".into(),
            version: "3".into(),
            changeset: "55".into(),
            timestamp: "2016-05-01T12:00:00Z".into(),
        },
        tags: vec![TagRecord {
            owner_id: "101".into(),
            key: "street".into(),
            value: "Main Street".into(),
            tag_type: "addr".into(),
        }],
    }
}

#[fixture]
fn path() -> ShapedPath {
    ShapedPath {
        entity: PathEntity {
            id: "900".into(),
            user: "mapper".into(),
            uid: "1234".into(),
            version: "1".into(),
            changeset: "55".into(),
            timestamp: "2016-05-01T12:00:00Z".into(),
        },
        references: vec![
            PathReference {
                path_id: "900".into(),
                node_id: "101".into(),
                position: 0,
            },
            PathReference {
                path_id: "900".into(),
                node_id: "102".into(),
                position: 1,
            },
        ],
        tags: Vec::new(),
    }
}

#[rstest]
fn bundled_asset_matches_tabular_contract() {
    let parsed = SchemaContract::from_json_str(TABULAR_ASSET).expect("asset parses");
    assert_eq!(parsed, SchemaContract::tabular());
}

#[rstest]
fn accepts_well_formed_bundles(validator: SchemaValidator, point: ShapedPoint, path: ShapedPath) {
    validator
        .validate(&ShapedElement::Point(point))
        .expect("point conforms");
    validator
        .validate(&ShapedElement::Path(path))
        .expect("path conforms");
}

#[rstest]
fn reports_non_numeric_coordinates(validator: SchemaValidator, mut point: ShapedPoint) {
    point.entity.lat = "north".into();

    let err = validator
        .validate(&ShapedElement::Point(point))
        .expect_err("lat is not a float");

    assert_eq!(err.record, "node");
    assert_eq!(
        err.errors,
        [FieldError {
            field: "lat".into(),
            index: None,
            message: "must be of float type".into(),
        }]
    );
    assert_eq!(
        err.to_string(),
        "element of type 'node' has the following errors: lat: must be of float type"
    );
}

#[rstest]
fn reports_list_item_index(validator: SchemaValidator, mut path: ShapedPath) {
    path.references[1].node_id = "n102".into();

    let err = validator
        .validate(&ShapedElement::Path(path))
        .expect_err("node reference is not an integer");

    assert_eq!(err.record, "way_nodes");
    assert_eq!(err.errors[0].index, Some(1));
    assert_eq!(err.errors[0].to_string(), "[1].node_id: must be of integer type");
}

#[rstest]
fn reports_first_failing_group_in_name_order(validator: SchemaValidator, mut point: ShapedPoint) {
    point.entity.uid = "anon".into();
    point.tags[0].owner_id = "x".into();

    let err = validator
        .validate(&ShapedElement::Point(point))
        .expect_err("both groups fail");

    assert_eq!(err.record, "node");
}

#[rstest]
#[case(json!({"node": {"id": "1"}}), "node")]
#[case(json!({"mystery": []}), "mystery")]
#[case(json!({"node_tags": {"id": "1"}}), "node_tags")]
fn rejects_malformed_documents(
    validator: SchemaValidator,
    #[case] document: Value,
    #[case] record: &str,
) {
    let err = validator
        .validate_document(&document)
        .expect_err("document does not conform");
    assert_eq!(err.record, record);
}

#[rstest]
fn reports_unknown_fields() {
    let validator = SchemaValidator::default();
    let document = json!({"way_nodes": [{"id": 1, "node_id": 2, "position": 0, "role": "x"}]});

    let err = validator
        .validate_document(&document)
        .expect_err("role is not declared");

    assert_eq!(err.errors[0].field, "role");
    assert_eq!(err.errors[0].message, "unknown field");
}

#[rstest]
fn coercion_is_opt_in() {
    let contract = SchemaContract::from_json_str(
        r#"{"version": 1, "records": {"way_nodes": {"shape": "list", "fields": {
            "position": {"type": "integer", "required": true}
        }}}}"#,
    )
    .expect("contract parses");
    let validator = SchemaValidator::new(contract);

    assert!(
        validator
            .validate_document(&json!({"way_nodes": [{"position": 3}]}))
            .is_ok()
    );
    assert!(
        validator
            .validate_document(&json!({"way_nodes": [{"position": "3"}]}))
            .is_err()
    );
}

#[rstest]
fn required_groups_must_be_present(point: ShapedPoint) {
    let mut contract = SchemaContract::tabular();
    if let Some(rule) = contract.records.get_mut("way") {
        rule.required = true;
    }
    let validator = SchemaValidator::new(contract);

    let err = validator
        .validate(&ShapedElement::Point(point))
        .expect_err("way group missing");

    assert_eq!(err.record, "way");
}

#[rstest]
#[case(r#"{"version": 2, "records": {}}"#)]
#[case(r#"{"version": 1, "records": {}, "extra": true}"#)]
#[case("not json")]
fn rejects_unusable_contracts(#[case] json: &str) {
    assert!(SchemaContract::from_json_str(json).is_err());
}

#[rstest]
fn reports_unsupported_version() {
    let err = SchemaContract::from_json_str(r#"{"version": 7, "records": {}}"#)
        .expect_err("version 7 is unknown");
    assert!(matches!(
        err,
        SchemaContractError::UnsupportedVersion { found: 7 }
    ));
}
