//! Unit tests for the pipeline driver.

use super::*;
use mapclean_core::{CleaningTables, PostcodeOrder, ValueCleaner, test_support::MemorySink};
use rstest::{fixture, rstest};

const EXPORT: &str = r#"<osm>
  <node id="1" lat="40.71" lon="-73.99" user="a" uid="1" version="1" changeset="5" timestamp="2016-01-01T00:00:00Z">
    <tag k="addr:street" v="W 34th St"/>
    <tag k="addr:postcode" v="1050"/>
    <tag k="fixme?" v="check"/>
  </node>
  <node id="2" lat="40.72" lon="-73.98" user="b" uid="2" version="1" changeset="5" timestamp="2016-01-01T00:00:00Z"/>
  <way id="10" user="a" uid="1" version="2" changeset="6" timestamp="2016-01-02T00:00:00Z">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="highway" v="residential"/>
  </way>
</osm>"#;

#[fixture]
fn options() -> ProcessOptions {
    ProcessOptions::default()
}

#[rstest]
fn reports_counts_for_each_table(options: ProcessOptions) {
    let mut sink = MemorySink::new();

    let report = process_map(EXPORT.as_bytes(), &mut sink, &options).expect("export processes");

    assert_eq!(
        report,
        ProcessReport {
            points: 2,
            paths: 1,
            tags: 3,
            references: 2,
            dropped_tags: 1,
            validated: true,
        }
    );
    assert!(sink.finished);
    assert_eq!(sink.point_entities.len(), 2);
    assert_eq!(sink.path_references.len(), 2);
    assert_eq!(sink.tag_count(), 3);
}

#[rstest]
fn cleans_values_before_writing(options: ProcessOptions) {
    let mut sink = MemorySink::new();

    process_map(EXPORT.as_bytes(), &mut sink, &options).expect("export processes");

    let values: Vec<_> = sink.point_tags.iter().map(|tag| tag.value.as_str()).collect();
    assert_eq!(values, ["West 34th Street", "10001"]);
}

#[rstest]
fn postcode_order_is_configurable(mut options: ProcessOptions) {
    options.shaper = ElementShaper::new(ValueCleaner::new(
        CleaningTables::default(),
        PostcodeOrder::Lexicographic,
    ));
    let mut sink = MemorySink::new();

    process_map(EXPORT.as_bytes(), &mut sink, &options).expect("export processes");

    assert_eq!(sink.point_tags[1].value, "1050");
}

#[rstest]
fn validation_failure_aborts_run(options: ProcessOptions) {
    let xml = r#"<osm>
      <node id="1" lat="40.71" lon="-73.99" user="a" uid="1" version="1" changeset="5" timestamp="t"/>
      <node id="2" lat="north" lon="-73.98" user="b" uid="2" version="1" changeset="5" timestamp="t"/>
      <node id="3" lat="40.73" lon="-73.97" user="c" uid="3" version="1" changeset="5" timestamp="t"/>
    </osm>"#;
    let mut sink = MemorySink::new();

    let err = process_map(xml.as_bytes(), &mut sink, &options).expect_err("node 2 is invalid");

    match err {
        ProcessError::Validation { kind, id, source } => {
            assert_eq!(kind, ElementKind::Node);
            assert_eq!(id, "2");
            assert_eq!(source.record, "node");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(sink.point_entities.len(), 1);
    assert!(!sink.finished);
}

#[rstest]
fn skipping_validation_writes_unchecked_rows(mut options: ProcessOptions) {
    options.validate = false;
    let xml = r#"<osm><node id="1" lat="north" lon="0" user="a" uid="1" version="1" changeset="5" timestamp="t"/></osm>"#;
    let mut sink = MemorySink::new();

    let report = process_map(xml.as_bytes(), &mut sink, &options).expect("validation skipped");

    assert!(!report.validated);
    assert_eq!(sink.point_entities[0].lat, "north");
}

#[rstest]
fn missing_attribute_aborts_run(options: ProcessOptions) {
    let xml = r#"<osm><way id="4" user="a" uid="1" version="1" changeset="5" timestamp="t"><nd/></way></osm>"#;

    let err = process_map(xml.as_bytes(), MemorySink::new(), &options)
        .expect_err("nd without ref");

    assert!(matches!(
        err,
        ProcessError::Shape {
            source: MissingAttributeError {
                attribute: "ref",
                ..
            }
        }
    ));
}

#[rstest]
fn parse_failure_aborts_run(options: ProcessOptions) {
    let xml = r#"<osm><node id="1" lat="0" lon="0" user="a" uid="1" version="1" changeset="5" timestamp="t">"#;

    let err = process_map(xml.as_bytes(), MemorySink::new(), &options).expect_err("truncated");

    assert!(matches!(
        err,
        ProcessError::Parse {
            source: ParseError::Truncated { .. }
        }
    ));
}

#[rstest]
#[case::empty_input("")]
#[case::plain_text("this is not a map export")]
#[case::declaration_only(r#"<?xml version="1.0"?>"#)]
fn input_without_elements_aborts_run(options: ProcessOptions, #[case] xml: &str) {
    let mut sink = MemorySink::new();

    let err = process_map(xml.as_bytes(), &mut sink, &options).expect_err("no elements");

    assert!(matches!(
        err,
        ProcessError::Parse {
            source: ParseError::Empty { .. }
        }
    ));
    assert!(!sink.finished);
}

#[rstest]
fn unreadable_file_leaves_existing_tables(options: ProcessOptions) {
    let tmp = tempfile::TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 tempdir");
    let input = root.join("export.osm");
    let tables = root.join("tables");
    std::fs::write(input.as_std_path(), EXPORT).expect("write export");
    process_file(&input, &tables, &options).expect("first run succeeds");
    let before = std::fs::read_to_string(tables.join("point_tags.csv").as_std_path())
        .expect("read point tags");

    std::fs::write(input.as_std_path(), "").expect("truncate export");
    let err = process_file(&input, &tables, &options).expect_err("empty export");

    assert!(matches!(
        err,
        ProcessError::Parse {
            source: ParseError::Empty { .. }
        }
    ));
    let after = std::fs::read_to_string(tables.join("point_tags.csv").as_std_path())
        .expect("read point tags");
    assert_eq!(after, before);
}

#[rstest]
fn reads_only_requested_kinds(mut options: ProcessOptions) {
    options.kinds = vec![ElementKind::Way];
    let mut sink = MemorySink::new();

    let report = process_map(EXPORT.as_bytes(), &mut sink, &options).expect("export processes");

    assert_eq!((report.points, report.paths), (0, 1));
    assert!(sink.point_entities.is_empty());
}
