use std::io::BufRead;
use std::path::Path;

use crate::data::osm::Coordinate;
use crate::errors::Result;

use super::reader::{BorderStoreReader, StoreFileReader};

fn split_content(data: &str) -> Vec<Coordinate> {
    if data.is_empty() {
        return Vec::new();
    }
    data.split('\n').map(Coordinate::from).collect()
}

/// Scans `reader` for the first record named exactly `name`.
pub fn find<R: BufRead>(reader: &mut BorderStoreReader<R>, name: &str) -> Result<Option<Vec<Coordinate>>> {
    while reader.read_entry()?.is_some() {
        if reader.current_entry() == Some(name) {
            let data = reader.read_data()?.unwrap_or_default();
            return Ok(Some(split_content(&data)));
        }
    }
    Ok(None)
}

/// Border of the region called `name`, or an empty list if the store has no
/// such region. Every call rescans the store from the start.
pub fn search(path: &Path, name: &str) -> Result<Vec<Coordinate>> {
    let mut reader = StoreFileReader::open(path)?;
    let found = find(&mut reader, name)?;
    reader.close();
    Ok(found.unwrap_or_default())
}
