use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;
use xz::write::XzEncoder;

use crate::errors::Result;
use crate::etl::graph_builder::BorderSink;

const COMPRESSION_LEVEL: u32 = 6;

/// Formats one record. The length is the byte length of `content`, which is
/// what the reader skips over.
pub fn format_record(name: &str, content: &str) -> String {
    format!("{{{}}}:{}\n{}\n", name, content.len(), content)
}

/// Appends records to a border store.
///
/// Appending to an existing store adds a new xz stream after the existing one;
/// the reader decodes concatenated streams as a single one. If `close` is never
/// reached the encoder is still finished and the file released on drop.
pub struct BorderStoreWriter {
    encoder: XzEncoder<BufWriter<File>>,
    records: usize,
}

impl BorderStoreWriter {
    pub fn open(path: &Path, append: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;
        info!(append = append; "Opened border store {}", path.display());

        Ok(BorderStoreWriter {
            encoder: XzEncoder::new(BufWriter::new(file), COMPRESSION_LEVEL),
            records: 0,
        })
    }

    pub fn write_record(&mut self, name: &str, content: &str) -> Result<()> {
        self.encoder.write_all(format_record(name, content).as_bytes())?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn close(self) -> Result<()> {
        let mut file_writer = self.encoder.finish()?;
        file_writer.flush()?;
        Ok(())
    }
}

impl BorderSink for BorderStoreWriter {
    fn write_record(&mut self, name: &str, content: &str) -> Result<()> {
        BorderStoreWriter::write_record(self, name, content)
    }
}
