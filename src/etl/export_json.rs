use std::ffi::OsString;
use std::fs;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::data::record::ShapedRecord;
use crate::errors::{Error, ErrorKind, Result};

use super::parse_osm::{open_osm_file, OsmReader};
use super::shape::shape_element;
use super::Etl;

pub const ETL_NAME: &str = "export_json";
const OUTPUT_EXTENSION: &str = ".json";

/// `boulder.osm` -> `boulder.osm.json`, next to the input.
pub fn output_path(input_path: &Path) -> PathBuf {
    let mut path = OsString::from(input_path.as_os_str());
    path.push(OUTPUT_EXTENSION);
    PathBuf::from(path)
}

/// Lazily shapes the elements of an [`OsmReader`], dropping the ones that are
/// neither nodes nor ways.
pub struct ShapedRecords<R: BufRead> {
    elements: OsmReader<R>,
    skipped: usize,
}

impl<R: BufRead> ShapedRecords<R> {
    pub fn new(elements: OsmReader<R>) -> Self {
        ShapedRecords {
            elements,
            skipped: 0,
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: BufRead> Iterator for ShapedRecords<R> {
    type Item = Result<ShapedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        for element in self.elements.by_ref() {
            match element.and_then(|element| shape_element(&element)) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => self.skipped += 1,
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}

/// Writes one record, as a single line or pretty-printed.
pub fn write_record<W: Write>(out: &mut W, record: &ShapedRecord, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, record)?;
    } else {
        serde_json::to_writer(&mut *out, record)?;
    }
    writeln!(out)?;
    Ok(())
}

pub struct JsonExportEtl {
    input_path: PathBuf,
    pretty: bool,
    progress: bool,
}

impl JsonExportEtl {
    pub fn new(input_path: PathBuf, pretty: bool) -> Self {
        JsonExportEtl {
            input_path,
            pretty,
            progress: false,
        }
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn output_path(&self) -> PathBuf {
        output_path(&self.input_path)
    }

    fn write_all<W, I>(&self, out: &mut W, records: I) -> Result<usize>
    where
        W: Write,
        I: Iterator<Item = Result<ShapedRecord>>,
    {
        let mut written = 0;
        for record in records {
            write_record(out, &record?, self.pretty)?;
            written += 1;
        }
        Ok(written)
    }
}

impl Etl for JsonExportEtl {
    type Input = OsmReader<Box<dyn BufRead>>;
    type Output = ShapedRecords<Box<dyn BufRead>>;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn extract(&mut self) -> Result<Self::Input> {
        open_osm_file(&self.input_path)
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        Ok(ShapedRecords::new(input))
    }

    fn load(&mut self, mut output: Self::Output) -> Result<()> {
        let output_path = self.output_path();
        let file = fs::File::create(&output_path)
            .map_err(|err| Error::new(ErrorKind::Io, format!("{}: {}", output_path.display(), err)))?;
        let mut out = BufWriter::new(file);

        let written = if self.progress {
            self.write_all(&mut out, tqdm::tqdm(output.by_ref()))?
        } else {
            self.write_all(&mut out, output.by_ref())?
        };
        out.flush()?;

        info!(
            etl_name = ETL_NAME,
            records = written,
            skipped = output.skipped(),
            output = output_path.display().to_string().as_str();
            "Wrote shaped records"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    const SAMPLE: &str = r#"<osm>
  <node id="1" lat="40.0" lon="-105.0" version="1" changeset="1" timestamp="t" user="u" uid="2"/>
  <relation id="3" version="1" changeset="1" timestamp="t" user="u" uid="2"/>
  <way id="4" version="1" changeset="1" timestamp="t" user="u" uid="2"><nd ref="1"/></way>
</osm>"#;

    #[test]
    fn output_path_appends_json() {
        assert_eq!(output_path(Path::new("data/boulder.osm")), PathBuf::from("data/boulder.osm.json"));
        assert_eq!(output_path(Path::new("boulder.osm.xz")), PathBuf::from("boulder.osm.xz.json"));
    }

    #[test]
    fn shaped_records_skip_other_elements() {
        let mut records = ShapedRecords::new(OsmReader::new(SAMPLE.as_bytes()));
        let ids: Vec<String> = records.by_ref().map(|r| r.unwrap().id).collect();
        assert_eq!(ids, vec!["1", "4"]);
        assert_eq!(records.skipped(), 1);
    }

    #[test]
    fn compact_record_is_one_line() {
        let mut records = ShapedRecords::new(OsmReader::new(SAMPLE.as_bytes()));
        let record = records.next().unwrap().unwrap();

        let mut out = Vec::new();
        write_record(&mut out, &record, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with('\n'));

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["pos"], serde_json::json!([40.0, -105.0]));
    }

    #[test]
    fn pretty_record_is_indented() {
        let mut records = ShapedRecords::new(OsmReader::new(SAMPLE.as_bytes()));
        let record = records.next().unwrap().unwrap();

        let mut out = Vec::new();
        write_record(&mut out, &record, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().count() > 1);
        assert!(text.contains("\n  \"id\": \"1\""));
    }
}
