use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use xz::bufread::XzDecoder;

use crate::errors::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum CursorState {
    NoEntryLoaded,
    HeaderLoaded { name: String, remaining: usize },
}

pub type StoreFileReader = BorderStoreReader<BufReader<XzDecoder<BufReader<File>>>>;

fn header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // The name is greedy so it may itself contain "}:".
    PATTERN.get_or_init(|| {
        Regex::new(r"^\{(?<name>.*)\}:(?<count>[0-9]+)$").expect("header pattern is valid")
    })
}

/// Splits a `{name}:count` header line.
pub fn parse_header(line: &str) -> Result<(String, usize)> {
    let captures = header_pattern()
        .captures(line)
        .ok_or_else(|| Error::from(format!("Malformed border store header: {:?}", line)))?;
    let count = captures["count"].parse()?;
    Ok((captures["name"].to_string(), count))
}

/// Forward-only cursor over the records of a border store.
///
/// `read_entry` returns the next region name and leaves its content unread.
/// `read_data` then returns that content, once. Calling `read_entry` again
/// without `read_data` skips the content.
pub struct BorderStoreReader<R: BufRead> {
    reader: R,
    state: CursorState,
}

impl StoreFileReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let decoder = XzDecoder::new_multi_decoder(BufReader::new(file));
        Ok(BorderStoreReader::new(BufReader::new(decoder)))
    }
}

impl<R: BufRead> BorderStoreReader<R> {
    /// Wraps an already decompressed record stream.
    pub fn new(reader: R) -> Self {
        BorderStoreReader {
            reader,
            state: CursorState::NoEntryLoaded,
        }
    }

    fn skip(&mut self, count: usize) -> Result<()> {
        let skipped = io::copy(&mut (&mut self.reader).take(count as u64), &mut io::sink())?;
        if skipped != count as u64 {
            return Err("Border store ends in the middle of a record".into());
        }
        Ok(())
    }

    /// Name of the next record, or `None` once the store is exhausted.
    pub fn read_entry(&mut self) -> Result<Option<String>> {
        if let CursorState::HeaderLoaded { remaining, .. } = self.state {
            // Unread content plus its trailing newline.
            let count = remaining
                .checked_add(1)
                .ok_or("Border store header announces an impossible length")?;
            self.skip(count)?;
            self.state = CursorState::NoEntryLoaded;
        }

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let header = line.strip_suffix('\n').unwrap_or(&line);
        let (name, remaining) = parse_header(header)?;
        self.state = CursorState::HeaderLoaded {
            name: name.clone(),
            remaining,
        };
        Ok(Some(name))
    }

    /// Content of the record loaded by the last `read_entry`, or `None` if
    /// there is no such record or it was already read.
    pub fn read_data(&mut self) -> Result<Option<String>> {
        let remaining = match &self.state {
            CursorState::HeaderLoaded { remaining, .. } => *remaining,
            CursorState::NoEntryLoaded => return Ok(None),
        };
        self.state = CursorState::NoEntryLoaded;

        // Grows with the bytes actually present, not with the announced length.
        let mut data = Vec::new();
        (&mut self.reader).take(remaining as u64).read_to_end(&mut data)?;
        if data.len() != remaining {
            return Err("Border store ends in the middle of a record".into());
        }
        let mut terminator = [0u8; 1];
        self.reader.read_exact(&mut terminator)?;
        if terminator[0] != b'\n' {
            return Err("Border store record is not terminated by a newline".into());
        }
        Ok(Some(String::from_utf8(data)?))
    }

    /// Name of the record whose content is pending, if any.
    pub fn current_entry(&self) -> Option<&str> {
        match &self.state {
            CursorState::HeaderLoaded { name, .. } => Some(name),
            CursorState::NoEntryLoaded => None,
        }
    }

    pub fn close(self) {
        drop(self.reader);
    }
}
