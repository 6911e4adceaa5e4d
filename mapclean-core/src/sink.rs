//! Destination for shaped records.
//!
//! A [`RecordSink`] receives the records of one element at a time. Each
//! method is atomic with respect to the records it is given: either all of
//! them are accepted or the call fails without writing any. A bundle spans
//! several calls, so a failure part-way through [`RecordSink::write_shaped`]
//! keeps the calls that already succeeded.

use crate::{ElementKind, PathEntity, PathReference, PointEntity, ShapedElement, TagRecord};

/// Accepts shaped records and persists them somewhere.
pub trait RecordSink {
    /// Error raised when a write fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist one point entity.
    fn write_point_entity(&mut self, entity: &PointEntity) -> Result<(), Self::Error>;

    /// Persist one path entity.
    fn write_path_entity(&mut self, entity: &PathEntity) -> Result<(), Self::Error>;

    /// Persist the tags owned by an entity of `kind`.
    fn write_tags(&mut self, kind: ElementKind, tags: &[TagRecord]) -> Result<(), Self::Error>;

    /// Persist the node references of a path.
    fn write_path_references(&mut self, references: &[PathReference]) -> Result<(), Self::Error>;

    /// Flush buffered output. No writes follow a successful call.
    fn finish(&mut self) -> Result<(), Self::Error>;

    /// Route every record of a bundle to the matching write call.
    ///
    /// The entity row is written before its dependants.
    fn write_shaped(&mut self, shaped: &ShapedElement) -> Result<(), Self::Error> {
        match shaped {
            ShapedElement::Point(point) => {
                self.write_point_entity(&point.entity)?;
                self.write_tags(ElementKind::Node, &point.tags)
            }
            ShapedElement::Path(path) => {
                self.write_path_entity(&path.entity)?;
                self.write_path_references(&path.references)?;
                self.write_tags(ElementKind::Way, &path.tags)
            }
        }
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    type Error = S::Error;

    fn write_point_entity(&mut self, entity: &PointEntity) -> Result<(), Self::Error> {
        (**self).write_point_entity(entity)
    }

    fn write_path_entity(&mut self, entity: &PathEntity) -> Result<(), Self::Error> {
        (**self).write_path_entity(entity)
    }

    fn write_tags(&mut self, kind: ElementKind, tags: &[TagRecord]) -> Result<(), Self::Error> {
        (**self).write_tags(kind, tags)
    }

    fn write_path_references(&mut self, references: &[PathReference]) -> Result<(), Self::Error> {
        (**self).write_path_references(references)
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        (**self).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ShapedPoint, records::DEFAULT_TAG_TYPE};
    use rstest::rstest;

    /// Accepts at most `capacity` tag rows; a call that would exceed it
    /// writes nothing.
    #[derive(Debug, Default)]
    struct BoundedSink {
        capacity: usize,
        entities: Vec<String>,
        tags: Vec<String>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("sink is full")]
    struct Full;

    impl RecordSink for BoundedSink {
        type Error = Full;

        fn write_point_entity(&mut self, entity: &PointEntity) -> Result<(), Full> {
            self.entities.push(entity.id.clone());
            Ok(())
        }

        fn write_path_entity(&mut self, entity: &PathEntity) -> Result<(), Full> {
            self.entities.push(entity.id.clone());
            Ok(())
        }

        fn write_tags(&mut self, _kind: ElementKind, tags: &[TagRecord]) -> Result<(), Full> {
            if self.tags.len() + tags.len() > self.capacity {
                return Err(Full);
            }
            self.tags.extend(tags.iter().map(|tag| tag.key.clone()));
            Ok(())
        }

        fn write_path_references(&mut self, _references: &[PathReference]) -> Result<(), Full> {
            Ok(())
        }

        fn finish(&mut self) -> Result<(), Full> {
            Ok(())
        }
    }

    fn tag(key: &str) -> TagRecord {
        TagRecord {
            owner_id: "1".to_owned(),
            key: key.to_owned(),
            value: "x".to_owned(),
            tag_type: DEFAULT_TAG_TYPE.to_owned(),
        }
    }

    #[rstest]
    fn failing_call_keeps_earlier_calls_only() {
        let point = ShapedElement::Point(ShapedPoint {
            entity: PointEntity {
                id: "1".to_owned(),
                lat: "40.7".to_owned(),
                lon: "-73.9".to_owned(),
                user: "mapper".to_owned(),
                uid: "7".to_owned(),
                version: "1".to_owned(),
                changeset: "3".to_owned(),
                timestamp: "2016-01-01T00:00:00Z".to_owned(),
            },
            tags: vec![tag("amenity"), tag("name"), tag("cuisine")],
        });
        let mut sink = BoundedSink {
            capacity: 2,
            ..BoundedSink::default()
        };

        let result = (&mut sink).write_shaped(&point);

        assert!(result.is_err());
        assert_eq!(sink.entities, ["1"]);
        assert!(sink.tags.is_empty());
    }
}
