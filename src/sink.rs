//! Output row layout and the CSV sink
//!
//! The row is a fixed-arity ordered record; field order and count are
//! an external contract and must never vary. The sink is owned
//! exclusively by the collector; a write failure is fatal to the run.

use crate::error::FatalError;
use crate::model::{CaseSummary, ChildRecord};
use std::fs::File;
use std::path::Path;

/// Number of fields in every output record.
pub const FIELD_COUNT: usize = 23;

/// One normalized output row.
///
/// Assembled from a [`CaseSummary`] and the first [`ChildRecord`] of
/// its resolved detail. Fields deliberately left blank stay empty
/// strings; `place_of_birth` always carries the literal `"-"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputRow {
    pub id: String,
    pub name: String,
    pub date_of_case: String,
    pub place_of_case: String,
    pub portrait_url: String,
    pub portrait_base64: String,
    pub auxiliary_url: String,
    pub auxiliary_base64: String,
    pub date_of_birth: String,
    pub place_of_birth: String,
    pub hair: String,
    pub eyes: String,
    pub height: String,
    pub weight: String,
    pub sex: String,
    pub race: String,
    pub nationality: String,
    pub reward: String,
    pub remarks: String,
    pub details: String,
    pub field_office: String,
    pub related_case: String,
    pub source: String,
}

impl OutputRow {
    /// Build a row from the listing entry and its resolved child record.
    ///
    /// Image fields start empty; the resolver fills them in when the
    /// corresponding fetch succeeds.
    #[must_use]
    pub fn from_case(summary: &CaseSummary, child: &ChildRecord, source_url: String) -> Self {
        Self {
            id: summary.child_id.clone(),
            name: summary.full_name.clone(),
            date_of_case: summary.missing_since.to_string(),
            place_of_case: format!("{},{},{}", summary.country, summary.state, summary.city),
            date_of_birth: child.birth_date.to_string(),
            place_of_birth: "-".to_string(),
            hair: child.hair_color.clone(),
            eyes: child.eye_color.clone(),
            height: format!("{} {}", child.height, child.height_unit),
            weight: format!("{} {}", child.weight, child.weight_unit),
            sex: child.sex.clone(),
            source: source_url,
            ..Self::default()
        }
    }

    /// Flatten into the fixed record order.
    #[must_use]
    pub fn into_record(self) -> [String; FIELD_COUNT] {
        [
            self.id,
            self.name,
            self.date_of_case,
            self.place_of_case,
            self.portrait_url,
            self.portrait_base64,
            self.auxiliary_url,
            self.auxiliary_base64,
            self.date_of_birth,
            self.place_of_birth,
            self.hair,
            self.eyes,
            self.height,
            self.weight,
            self.sex,
            self.race,
            self.nationality,
            self.reward,
            self.remarks,
            self.details,
            self.field_office,
            self.related_case,
            self.source,
        ]
    }
}

/// CSV sink over a file; no header row.
#[derive(Debug)]
pub struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    /// Create (or truncate) the output file.
    ///
    /// # Errors
    /// `FatalError::SinkOpen` - the run cannot proceed without a sink.
    pub fn create(path: &Path) -> Result<Self, FatalError> {
        let file = File::create(path).map_err(|source| FatalError::SinkOpen {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            writer: csv::Writer::from_writer(file),
        })
    }

    /// Write one row in the fixed column order.
    ///
    /// # Errors
    /// `FatalError::SinkWrite` - any failure here stops the process.
    pub fn write_row(&mut self, row: OutputRow) -> Result<(), FatalError> {
        self.writer.write_record(row.into_record())?;
        Ok(())
    }

    /// Flush buffered rows to disk.
    ///
    /// # Errors
    /// `FatalError::SinkFlush` on I/O failure.
    pub fn flush(&mut self) -> Result<(), FatalError> {
        self.writer.flush().map_err(FatalError::SinkFlush)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Timestamp;
    use pretty_assertions::assert_eq;

    fn sample_summary() -> CaseSummary {
        CaseSummary {
            child_id: "K-1".to_string(),
            full_name: "Jane Roe".to_string(),
            missing_since: Timestamp(1_600_000_000),
            country: "US".to_string(),
            state: "OH".to_string(),
            city: "Akron".to_string(),
            ..CaseSummary::default()
        }
    }

    fn sample_child() -> ChildRecord {
        ChildRecord {
            birth_date: Timestamp(1_077_865_200),
            hair_color: "brown".to_string(),
            eye_color: "green".to_string(),
            height: "52".to_string(),
            height_unit: "in".to_string(),
            weight: "80".to_string(),
            weight_unit: "lb".to_string(),
            sex: "F".to_string(),
            ..ChildRecord::default()
        }
    }

    #[test]
    fn record_has_fixed_arity_and_order() {
        let row = OutputRow::from_case(
            &sample_summary(),
            &sample_child(),
            "http://api.example/cases/C-1".to_string(),
        );
        let record = row.into_record();

        assert_eq!(record.len(), FIELD_COUNT);
        assert_eq!(record[0], "K-1");
        assert_eq!(record[1], "Jane Roe");
        assert_eq!(record[2], "1600000000");
        assert_eq!(record[3], "US,OH,Akron");
        assert_eq!(record[8], "1077865200");
        assert_eq!(record[9], "-");
        assert_eq!(record[10], "brown");
        assert_eq!(record[11], "green");
        assert_eq!(record[12], "52 in");
        assert_eq!(record[13], "80 lb");
        assert_eq!(record[14], "F");
        assert_eq!(record[22], "http://api.example/cases/C-1");
    }

    #[test]
    fn blank_fields_stay_empty() {
        let row = OutputRow::from_case(&sample_summary(), &sample_child(), String::new());
        let record = row.into_record();

        // Image fields before resolution, and the seven trailing placeholders.
        assert_eq!(record[4], "");
        assert_eq!(record[5], "");
        assert_eq!(record[6], "");
        assert_eq!(record[7], "");
        for field in &record[15..22] {
            assert_eq!(field, "");
        }
    }

    #[test]
    fn sink_writes_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut sink = CsvSink::create(&path).unwrap();
        sink.write_row(OutputRow::from_case(
            &sample_summary(),
            &sample_child(),
            "http://s".to_string(),
        ))
        .unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("K-1,Jane Roe,1600000000"));
    }

    #[test]
    fn sink_open_failure_is_fatal() {
        let err = CsvSink::create(Path::new("/nonexistent-dir/out.csv")).unwrap_err();
        assert!(matches!(err, FatalError::SinkOpen { .. }));
    }
}
