use std::io::BufRead;
use std::path::{Path, PathBuf};

use log::info;

use crate::errors::Result;
use crate::store::BorderStoreWriter;

use super::graph_builder::{BuildSummary, GraphBuilder};
use super::parse_osm::{open_osm_file, OsmEventReader};
use super::Etl;

pub const ETL_NAME: &str = "build_store";

/// Reads an OSM extract and writes one border record per relation.
pub struct BuildBorderStoreEtl {
    data_path: PathBuf,
    store_path: PathBuf,
    append: bool,
    summary: Option<BuildSummary>,
}

impl BuildBorderStoreEtl {
    pub fn new(data_path: &Path, store_path: &Path, append: bool) -> BuildBorderStoreEtl {
        BuildBorderStoreEtl {
            data_path: data_path.to_path_buf(),
            store_path: store_path.to_path_buf(),
            append,
            summary: None,
        }
    }

    /// Counters of the last successful run.
    pub fn summary(&self) -> Option<BuildSummary> {
        self.summary
    }
}

impl Etl for BuildBorderStoreEtl {
    type Input = OsmEventReader<Box<dyn BufRead>>;
    type Output = (BorderStoreWriter, BuildSummary);

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn extract(&mut self) -> Result<Self::Input> {
        open_osm_file(&self.data_path)
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let mut writer = BorderStoreWriter::open(&self.store_path, self.append)?;
        let mut builder = GraphBuilder::new(&mut writer);
        builder.run(input)?;
        let (_, summary) = builder.finish();
        Ok((writer, summary))
    }

    fn load(&mut self, (writer, summary): Self::Output) -> Result<()> {
        let records = writer.records();
        writer.close()?;
        info!(
            records = records,
            relations = summary.relations,
            written = summary.written,
            failed = summary.failed,
            unnamed = summary.unnamed;
            "Border store written to {}", self.store_path.display()
        );
        self.summary = Some(summary);
        Ok(())
    }
}
