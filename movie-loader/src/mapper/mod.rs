//! Maps raw CSV records into movie documents.
//!
//! Records are positional: `name, directed_by, genre, type, id, initial_release_date`.
//! The directors and genre fields hold pipe-delimited lists.

use chrono::NaiveDate;
use csv::StringRecord;
use movie_loader_shared::{MovieDocument, NUM_ACTORS_UPPER_BOUND};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, instrument, warn};

use crate::errors::IngestError;

const NAME_FIELD: usize = 0;
const DIRECTED_BY_FIELD: usize = 1;
const GENRE_FIELD: usize = 2;
const RELEASE_DATE_FIELD: usize = 5;
const MIN_FIELDS: usize = RELEASE_DATE_FIELD + 1;

/// Appended to the CSV date to form the indexed date-time.
pub const MIDNIGHT_UTC_SUFFIX: &str = "T00:00:00Z";

/// Configuration for the record mapper.
#[derive(Debug, Clone)]
pub struct MapperConfig {
    /// Log and skip rows with too few fields instead of failing the whole load.
    pub skip_malformed: bool,
    /// Only emit a release date when the field parses as `YYYY-MM-DD`.
    pub validate_dates: bool,
    /// Remove every empty entry from the directors and genre lists.
    ///
    /// Off by default, so an empty directors field maps to `[""]`.
    pub drop_empty_list_entries: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            skip_malformed: true,
            validate_dates: true,
            drop_empty_list_entries: false,
        }
    }
}

/// Turns raw CSV records into `MovieDocument`s.
///
/// The random source for `numActors` is injectable so tests can seed it.
pub struct RecordMapper<R = StdRng> {
    config: MapperConfig,
    rng: R,
}

impl RecordMapper<StdRng> {
    /// Create a mapper seeded from OS entropy.
    pub fn new(config: MapperConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> RecordMapper<R> {
    pub fn with_rng(config: MapperConfig, rng: R) -> Self {
        Self { config, rng }
    }

    /// Map every data record into a document.
    ///
    /// Blank records are ignored. Rows with too few fields are skipped with a
    /// warning when `skip_malformed` is set; otherwise the first one aborts the
    /// mapping. Errors carry the record's line in the file, or its 1-based index
    /// among `records` when it has no position.
    #[instrument(skip(self, records), fields(record_count = records.len()))]
    pub fn map_records(
        &mut self,
        records: &[StringRecord],
    ) -> Result<Vec<MovieDocument>, IngestError> {
        info!("Begin mapping documents");

        let mut documents = Vec::with_capacity(records.len());
        let mut skipped = 0usize;

        for (index, record) in records.iter().enumerate() {
            if is_blank(record) {
                continue;
            }

            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(index as u64 + 1);

            match self.map_record(line, record) {
                Ok(document) => documents.push(document),
                Err(e @ IngestError::MalformedRow { .. }) if self.config.skip_malformed => {
                    warn!(error = %e, "Skipping malformed row");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            documents = documents.len(),
            skipped = skipped,
            "Done mapping documents"
        );
        Ok(documents)
    }

    /// Map a single record. `line` is only used for error reporting.
    pub fn map_record(
        &mut self,
        line: u64,
        record: &StringRecord,
    ) -> Result<MovieDocument, IngestError> {
        if record.len() < MIN_FIELDS {
            return Err(IngestError::malformed_row(
                line,
                format!(
                    "expected at least {} fields, found {}",
                    MIN_FIELDS,
                    record.len()
                ),
            ));
        }

        let name = record[NAME_FIELD].trim();
        let name = (!name.is_empty()).then(|| name.to_string());

        let directed_by = self.split_list(&record[DIRECTED_BY_FIELD]);
        let genre = self.split_list(&record[GENRE_FIELD]);
        let initial_release_date = self.release_date(line, &record[RELEASE_DATE_FIELD]);

        Ok(MovieDocument::new(
            name,
            directed_by,
            genre,
            initial_release_date,
            self.rng.gen_range(0..NUM_ACTORS_UPPER_BOUND),
        ))
    }

    /// Split a pipe-delimited list.
    ///
    /// Trailing empty entries are dropped, except that an empty field yields a
    /// single empty entry.
    fn split_list(&self, field: &str) -> Vec<String> {
        if field.is_empty() {
            return if self.config.drop_empty_list_entries {
                Vec::new()
            } else {
                vec![String::new()]
            };
        }

        let mut entries: Vec<String> = field
            .split('|')
            .filter(|entry| !(self.config.drop_empty_list_entries && entry.trim().is_empty()))
            .map(str::to_string)
            .collect();
        while entries.last().is_some_and(|entry| entry.is_empty()) {
            entries.pop();
        }
        entries
    }

    fn release_date(&self, line: u64, field: &str) -> Option<String> {
        let date = field.trim();
        if date.is_empty() {
            return None;
        }

        if self.config.validate_dates && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            warn!(line, date = %date, "Ignoring unparseable release date");
            return None;
        }

        Some(format!("{}{}", date, MIDNIGHT_UTC_SUFFIX))
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty()) && record.len() < MIN_FIELDS
}
