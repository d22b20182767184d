//! Delimited-text input and output.
//!
//! One series per record, values separated by commas. Records may differ in
//! length, fields may be quoted, whitespace around fields is ignored and
//! blank lines are skipped.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use log::debug;

use crate::core::error::{Result, SearchError};
use crate::core::series::Series;

fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(false).flexible(true).trim(Trim::All);
    builder
}

/// Convert one record to a series. A record holding a single empty field
/// (a whitespace-only line) yields `None`.
fn parse_record(record: &StringRecord) -> Result<Option<Series>> {
    if record.len() == 1 && record[0].is_empty() {
        return Ok(None);
    }
    let line = record.position().map_or(0, |p| p.line() as usize);
    let values = record
        .iter()
        .enumerate()
        .map(|(col, field)| {
            field.parse::<f64>().map_err(|_| SearchError::Parse {
                line,
                column: col + 1,
                value: field.to_string(),
            })
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(Some(Series::new(values)))
}

/// Parse every non-blank record of `reader` as one series.
pub fn parse_series_csv<R: Read>(reader: R) -> Result<Vec<Series>> {
    let mut series = Vec::new();
    for record in reader_builder().from_reader(reader).records() {
        if let Some(s) = parse_record(&record?)? {
            series.push(s);
        }
    }
    Ok(series)
}

/// Load a collection from a delimited-text file.
pub fn load_series_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Series>> {
    let path = path.as_ref();
    let series = parse_series_csv(File::open(path)?)?;
    debug!("loaded {} series from {}", series.len(), path.display());
    Ok(series)
}

/// Load a query from the first non-blank record of a file.
///
/// A file with no data yields an empty query, which a search rejects with
/// [`SearchError::EmptyQuery`].
pub fn load_query_csv<P: AsRef<Path>>(path: P) -> Result<Series> {
    let mut reader = reader_builder().from_reader(File::open(path.as_ref())?);
    for record in reader.records() {
        if let Some(s) = parse_record(&record?)? {
            return Ok(s);
        }
    }
    Ok(Series::new(Vec::new()))
}

/// Write series to `writer`, one record each.
pub fn write_series_csv_to<W: Write>(writer: W, series: &[Series]) -> Result<()> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);
    for s in series {
        writer.write_record(s.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write series to a file, one record each.
pub fn write_series_csv<P: AsRef<Path>>(path: P, series: &[Series]) -> Result<()> {
    write_series_csv_to(File::create(path)?, series)
}
