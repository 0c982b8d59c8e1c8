use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::osm::{Attributes, RawChild, RawElement};
use crate::errors::{Error, ErrorKind, Result};

/// Depth of the elements yielded by [`OsmReader`], directly below `<osm>`.
const ELEMENT_DEPTH: usize = 1;
const CHILD_DEPTH: usize = 2;

enum Step {
    Open { name: String, attributes: Attributes, empty: bool },
    Close,
    Skip,
    Eof,
}

/// Streams the top-level elements of an .osm document together with their
/// direct children. Elements are handed out one at a time and never kept.
pub struct OsmReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    depth: usize,
    current: Option<RawElement>,
    finished: bool,
}

fn parse_start(el: &BytesStart) -> Result<(String, Attributes)> {
    let name = str::from_utf8(el.name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        let key = str::from_utf8(attribute.key.as_ref())?.to_string();
        let value = attribute.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok((name, Attributes(attributes)))
}

/// Opens an .osm file, decompressing it on the fly when it ends in `.xz`.
pub fn open_osm_file(path: &Path) -> Result<OsmReader<Box<dyn BufRead>>> {
    let file = fs::File::open(path)
        .map_err(|err| Error::new(ErrorKind::Io, format!("{}: {}", path.display(), err)))?;
    let file_reader = BufReader::new(file);
    let reader: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("xz")) {
        Box::new(BufReader::new(XzDecoder::new(file_reader)))
    } else {
        Box::new(file_reader)
    };
    Ok(OsmReader::new(reader))
}

impl<R: BufRead> OsmReader<R> {
    pub fn new(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        reader.trim_text(true);
        OsmReader {
            reader,
            buf: Vec::new(),
            depth: 0,
            current: None,
            finished: false,
        }
    }

    /// Reads until the next complete top-level element, or `None` at the end
    /// of the document.
    pub fn next_element(&mut self) -> Result<Option<RawElement>> {
        loop {
            let position = self.reader.buffer_position();
            let step = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => {
                    let (name, attributes) = parse_start(&e)?;
                    Step::Open { name, attributes, empty: false }
                },
                Event::Empty(e) => {
                    let (name, attributes) = parse_start(&e)?;
                    Step::Open { name, attributes, empty: true }
                },
                Event::End(_) => Step::Close,
                Event::Eof => Step::Eof,
                // Declarations, comments and text carry no map data.
                _ => Step::Skip,
            };
            // if we don't keep a borrow elsewhere, we can clear the buffer to keep memory usage low
            self.buf.clear();

            match step {
                Step::Open { name, attributes, empty } => {
                    let done = self.open(name, attributes, empty, position);
                    if !empty {
                        self.depth += 1;
                    }
                    if done.is_some() {
                        return Ok(done);
                    }
                },
                Step::Close => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == ELEMENT_DEPTH {
                        if let Some(element) = self.current.take() {
                            return Ok(Some(element));
                        }
                    }
                },
                Step::Skip => (),
                Step::Eof => {
                    return match self.current.take() {
                        Some(element) => Err(Error::malformed(
                            &element.name,
                            element.attribute("id"),
                            element.position,
                            "unexpected end of file inside element",
                        )),
                        None => Ok(None),
                    };
                },
            }
        }
    }

    fn open(&mut self, name: String, attributes: Attributes, empty: bool, position: usize) -> Option<RawElement> {
        match self.depth {
            ELEMENT_DEPTH => {
                let element = RawElement::new(name, attributes, position);
                if empty {
                    return Some(element);
                }
                self.current = Some(element);
            },
            CHILD_DEPTH => {
                if let Some(current) = self.current.as_mut() {
                    current.children.push(RawChild { name, attributes });
                }
            },
            _ => (),
        }
        None
    }
}

impl<R: BufRead> Iterator for OsmReader<R> {
    type Item = Result<RawElement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_element() {
            Ok(Some(element)) => Some(Ok(element)),
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
