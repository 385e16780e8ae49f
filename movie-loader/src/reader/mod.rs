//! Reads the movies CSV into memory as raw records.
//!
//! Fields are split on commas only: quote characters carry no meaning and are
//! stripped from every field, so a quoted field that itself contains a comma
//! will be split apart. The films dataset has no such fields. Bytes that are
//! not valid UTF-8 are replaced rather than failing the load.

use csv::{ByteRecord, ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::IngestError;

/// Read `path` and return its data records, header removed.
///
/// An unreadable file is an error; an empty file yields no records. Each record
/// keeps its position, so `record.position()` gives its line in the file.
pub fn read_csv_into_memory(path: impl AsRef<Path>) -> Result<Vec<StringRecord>, IngestError> {
    let path = path.as_ref();
    info!(path = %path.display(), "Reading file");

    let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
    let records = parse_records(file).map_err(|e| IngestError::csv(path, e))?;

    info!(
        path = %path.display(),
        records = records.len(),
        "Done reading file"
    );
    if let Some(first) = records.first() {
        debug!(sample = ?first, "First record");
    }

    Ok(records)
}

/// Parse CSV data from `input`, dropping the header row.
///
/// Rows may have any number of fields; short rows are left to the mapper.
pub fn parse_records<R: Read>(input: R) -> Result<Vec<StringRecord>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .quoting(false)
        .flexible(true)
        .from_reader(input);

    let mut records = Vec::new();
    let mut raw = ByteRecord::new();
    while reader.read_byte_record(&mut raw)? {
        records.push(decode_record(&raw));
    }
    Ok(records)
}

fn decode_record(raw: &ByteRecord) -> StringRecord {
    let mut record: StringRecord = raw
        .iter()
        .map(|field| String::from_utf8_lossy(field).replace('"', ""))
        .collect();
    record.set_position(raw.position().cloned());
    record
}
