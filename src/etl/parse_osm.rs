use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::osm::{Coordinate, MemberType, OsmEvent, OsmId};
use crate::errors::{Error, Result};

enum ParserState {
    Top,
    Way,
    Relation,
}

/// Pulls `OsmEvent`s out of an OSM XML document.
///
/// `<nd>` is only meaningful inside a way, `<member>` and `<tag>` only inside a
/// relation; anywhere else they are skipped. The first error ends the stream.
pub struct OsmEventReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    state: ParserState,
    pending: Option<OsmEvent>,
    finished: bool,
}

/// Opens an `.osm` file, decompressing it on the fly when it ends in `.xz`.
pub fn open_osm_file(path: &Path) -> Result<OsmEventReader<Box<dyn BufRead>>> {
    let file = fs::File::open(path)?;
    let file_reader = BufReader::new(file);
    let source: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "xz") {
        Box::new(BufReader::new(XzDecoder::new_multi_decoder(file_reader)))
    } else {
        Box::new(file_reader)
    };
    Ok(OsmEventReader::new(source))
}

fn attribute(el: &BytesStart, key: &[u8]) -> Result<Option<String>> {
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        if attribute.key.as_ref() == key {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn required_attribute(el: &BytesStart, key: &[u8]) -> Result<String> {
    attribute(el, key)?.ok_or_else(|| {
        Error::from(format!(
            "Missing '{}' attribute on <{}>",
            String::from_utf8_lossy(key),
            String::from_utf8_lossy(el.name().as_ref()),
        ))
    })
}

fn id_attribute(el: &BytesStart, key: &[u8]) -> Result<OsmId> {
    Ok(required_attribute(el, key)?.trim().parse()?)
}

fn parse_node(el: &BytesStart) -> Result<OsmEvent> {
    let mut id: Option<OsmId> = None;
    let mut lat: Option<String> = None;
    let mut lon: Option<String> = None;

    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        match attribute.key.as_ref() {
            b"id" => id = Some(str::from_utf8(&attribute.value)?.trim().parse()?),
            b"lat" => lat = Some(attribute.unescape_value()?.into_owned()),
            b"lon" => lon = Some(attribute.unescape_value()?.into_owned()),
            _ => (),
        }
    }

    match (id, lat, lon) {
        (Some(id), Some(lat), Some(lon)) => Ok(OsmEvent::Node {
            id,
            coordinate: Coordinate::new(&lat, &lon),
        }),
        _ => Err("Node is missing one of 'id', 'lat' or 'lon'".into()),
    }
}

fn child_event(state: &ParserState, el: &BytesStart) -> Result<Option<OsmEvent>> {
    match (state, el.name().as_ref()) {
        (ParserState::Way, b"nd") => Ok(Some(OsmEvent::WayNodeRef {
            node: id_attribute(el, b"ref")?,
        })),
        (ParserState::Relation, b"member") => Ok(Some(OsmEvent::RelationMember {
            member_type: MemberType::from(required_attribute(el, b"type")?.as_str()),
            reference: id_attribute(el, b"ref")?,
        })),
        (ParserState::Relation, b"tag") => Ok(Some(OsmEvent::RelationTag {
            key: required_attribute(el, b"k")?,
            value: required_attribute(el, b"v")?,
        })),
        _ => Ok(None),
    }
}

impl<R: BufRead> OsmEventReader<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);

        OsmEventReader {
            reader,
            buf: Vec::new(),
            state: ParserState::Top,
            pending: None,
            finished: false,
        }
    }

    fn next_event(&mut self) -> Result<Option<OsmEvent>> {
        loop {
            // if we don't keep a borrow elsewhere, we can clear the buffer to keep memory usage low
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Eof => return Ok(None),
                Event::Text(_e) => return Err("Didn't expect to see Text in OSM file.".into()),
                Event::Start(e) => match e.name().as_ref() {
                    b"node" => return Ok(Some(parse_node(&e)?)),
                    b"way" => {
                        let id = id_attribute(&e, b"id")?;
                        self.state = ParserState::Way;
                        return Ok(Some(OsmEvent::WayStart { id }));
                    },
                    b"relation" => {
                        self.state = ParserState::Relation;
                        return Ok(Some(OsmEvent::RelationStart));
                    },
                    _ => {
                        if let Some(event) = child_event(&self.state, &e)? {
                            return Ok(Some(event));
                        }
                    },
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"node" => return Ok(Some(parse_node(&e)?)),
                    b"way" => {
                        let id = id_attribute(&e, b"id")?;
                        self.pending = Some(OsmEvent::WayEnd);
                        return Ok(Some(OsmEvent::WayStart { id }));
                    },
                    b"relation" => {
                        self.pending = Some(OsmEvent::RelationEnd);
                        return Ok(Some(OsmEvent::RelationStart));
                    },
                    _ => {
                        if let Some(event) = child_event(&self.state, &e)? {
                            return Ok(Some(event));
                        }
                    },
                },
                Event::End(e) => {
                    let closing = match (&self.state, e.name().as_ref()) {
                        (ParserState::Way, b"way") => Some(OsmEvent::WayEnd),
                        (ParserState::Relation, b"relation") => Some(OsmEvent::RelationEnd),
                        _ => None,
                    };
                    if let Some(event) = closing {
                        self.state = ParserState::Top;
                        return Ok(Some(event));
                    }
                },
                // Declarations, comments and the like carry no map data.
                _ => (),
            }
        }
    }
}

impl<R: BufRead> Iterator for OsmEventReader<R> {
    type Item = Result<OsmEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.pending.take() {
            return Some(Ok(event));
        }
        if self.finished {
            return None;
        }
        match self.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.finished = true;
                None
            },
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            },
        }
    }
}
