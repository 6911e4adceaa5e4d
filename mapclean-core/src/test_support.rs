//! In-memory `RecordSink` used by unit and behaviour tests.

use std::convert::Infallible;

use crate::{ElementKind, PathEntity, PathReference, PointEntity, RecordSink, TagRecord};

/// Collects every record it receives, grouped by table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemorySink {
    /// Rows destined for `point_entities`.
    pub point_entities: Vec<PointEntity>,
    /// Rows destined for `point_tags`.
    pub point_tags: Vec<TagRecord>,
    /// Rows destined for `path_entities`.
    pub path_entities: Vec<PathEntity>,
    /// Rows destined for `path_references`.
    pub path_references: Vec<PathReference>,
    /// Rows destined for `path_tags`.
    pub path_tags: Vec<TagRecord>,
    /// Whether [`RecordSink::finish`] has been called.
    pub finished: bool,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of tag rows across both tag tables.
    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.point_tags.len() + self.path_tags.len()
    }
}

impl RecordSink for MemorySink {
    type Error = Infallible;

    fn write_point_entity(&mut self, entity: &PointEntity) -> Result<(), Self::Error> {
        self.point_entities.push(entity.clone());
        Ok(())
    }

    fn write_path_entity(&mut self, entity: &PathEntity) -> Result<(), Self::Error> {
        self.path_entities.push(entity.clone());
        Ok(())
    }

    fn write_tags(&mut self, kind: ElementKind, tags: &[TagRecord]) -> Result<(), Self::Error> {
        let table = match kind {
            ElementKind::Node => &mut self.point_tags,
            ElementKind::Way => &mut self.path_tags,
        };
        table.extend_from_slice(tags);
        Ok(())
    }

    fn write_path_references(&mut self, references: &[PathReference]) -> Result<(), Self::Error> {
        self.path_references.extend_from_slice(references);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        self.finished = true;
        Ok(())
    }
}
