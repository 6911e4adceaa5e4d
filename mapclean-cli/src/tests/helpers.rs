//! Test helpers for composing CLI inputs and layered overrides.

use super::*;
use camino::{Utf8Path, Utf8PathBuf};
use mapclean_core::PostcodeOrder;
use std::fs;
use tempfile::TempDir;

pub(super) const SAMPLE_EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1" lat="40.71" lon="-74.00" user="mapper" uid="7" version="2" changeset="11" timestamp="2016-01-01T00:00:00Z">
    <tag k="addr:street" v="5th Ave"/>
    <tag k="addr:postcode" v="07302"/>
  </node>
  <node id="2" lat="40.72" lon="-74.01" user="mapper" uid="7" version="1" changeset="11" timestamp="2016-01-01T00:00:00Z"/>
  <way id="10" user="mapper" uid="7" version="1" changeset="12" timestamp="2016-01-02T00:00:00Z">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="highway" v="residential"/>
  </way>
</osm>
"#;

#[derive(Debug, Clone, Default)]
pub(super) struct LayerOverrides {
    pub(super) input: Option<Utf8PathBuf>,
    pub(super) output_dir: Option<Utf8PathBuf>,
    pub(super) postcode_order: Option<PostcodeOrder>,
}

#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root =
            Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace path");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Write the sample export under `name` and return its path.
    pub(super) fn export(&self, name: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        write_utf8(&path, SAMPLE_EXPORT.as_bytes());
        path
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write test file");
}

pub(super) fn read_table(dir: &Utf8Path, table: &str) -> Vec<String> {
    fs::read_to_string(dir.join(format!("{table}.csv")).as_std_path())
        .expect("table should exist")
        .lines()
        .map(str::to_owned)
        .collect()
}

pub(super) fn merge_layers(
    mut cli_args: ProcessArgs,
    file_layer: Option<LayerOverrides>,
    env_layer: Option<LayerOverrides>,
) -> Result<ProcessConfig, CliError> {
    merge_field(
        &mut cli_args.input,
        extract_field(&env_layer, |layer| &layer.input),
        extract_field(&file_layer, |layer| &layer.input),
    );
    merge_field(
        &mut cli_args.output_dir,
        extract_field(&env_layer, |layer| &layer.output_dir),
        extract_field(&file_layer, |layer| &layer.output_dir),
    );
    merge_field(
        &mut cli_args.postcode_order,
        extract_field(&env_layer, |layer| &layer.postcode_order),
        extract_field(&file_layer, |layer| &layer.postcode_order),
    );
    resolve_process_config(cli_args)
}

fn merge_field<T: Clone>(target: &mut Option<T>, env_value: Option<T>, file_value: Option<T>) {
    if target.is_none()
        && let Some(value) = env_value.or(file_value)
    {
        *target = Some(value);
    }
}

fn extract_field<T: Clone>(
    layer: &Option<LayerOverrides>,
    accessor: fn(&LayerOverrides) -> &Option<T>,
) -> Option<T> {
    layer.as_ref().and_then(|entry| accessor(entry).clone())
}
