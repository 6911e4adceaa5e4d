//! Core domain types for the mapclean pipeline.
//!
//! The crate turns raw map elements into cleaned, flat record bundles and
//! checks them against a declarative schema contract. It performs no I/O:
//! readers produce [`RawElement`] values and sinks implement [`RecordSink`].
//!
//! ```
//! use mapclean_core::{Attributes, ElementKind, ElementShaper, RawElement, SchemaValidator};
//!
//! let mut way = RawElement::new(
//!     ElementKind::Way,
//!     Attributes::from_iter([
//!         ("id", "10"), ("user", "mapper"), ("uid", "7"), ("version", "1"),
//!         ("changeset", "3"), ("timestamp", "2016-01-01T00:00:00Z"),
//!     ]),
//! );
//! way.push_node_ref(Attributes::from_iter([("ref", "1")]));
//! way.push_node_ref(Attributes::from_iter([("ref", "2")]));
//!
//! let shaped = ElementShaper::default().shape(&way)?;
//! SchemaValidator::default().validate(&shaped)?;
//! assert_eq!(shaped.references()[1].position, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod clean;
pub mod element;
pub mod records;
pub mod schema;
pub mod shape;
pub mod sink;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use clean::{
    CleaningTables, DIRECTION_ABBREVIATIONS, POSTCODE_FALLBACK, POSTCODE_MAX, POSTCODE_MIN,
    ParsePostcodeOrderError, PostcodeOrder, STREET_ABBREVIATIONS, ValueCleaner,
    clean_direction, clean_height, clean_house_number, clean_postcode, clean_street,
    postcode_in_range,
};
pub use element::{Attributes, ElementKind, RawElement};
pub use records::{
    DEFAULT_TAG_TYPE, PathEntity, PathReference, PointEntity, ShapedElement, ShapedPath,
    ShapedPoint, TagRecord,
};
pub use schema::{
    CONTRACT_VERSION, FieldError, FieldRule, FieldType, RecordRule, RecordShape,
    SchemaContract, SchemaContractError, SchemaValidator, ValidationError,
};
pub use shape::{
    ElementShaper, MissingAttributeError, PROBLEM_CHARS, TagCategory, has_problem_chars,
    split_namespace,
};
pub use sink::RecordSink;
