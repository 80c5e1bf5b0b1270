use crate::error::LoadError;
use crate::schema::{Column, SchemaIndex};
use crate::types::{Dataset, DemographicColumn, Demographics, Record};
use crate::util::{normalize_value, parse_count, parse_year};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Placeholder for blank categorical cells.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    /// Rows whose `Total` disagrees with `Female Total + Male Total`.
    pub total_mismatches: usize,
    pub ignored_columns: Vec<String>,
}

/// Load the dataset from `path`.
///
/// The file handle is owned by the CSV reader and closed when this function
/// returns, whether or not parsing succeeded.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<(Dataset, LoadReport), LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let (data, report) = load_from_reader(file)?;
    info!(
        path = %path.display(),
        rows = report.rows,
        mismatches = report.total_mismatches,
        "dataset loaded"
    );
    Ok((data, report))
}

/// Load the dataset from any CSV source. Any malformed row aborts the load;
/// a partially loaded dataset is never returned.
pub fn load_from_reader<R: Read>(reader: R) -> Result<(Dataset, LoadReport), LoadError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(LoadError::EmptyHeader);
    }
    let schema = SchemaIndex::from_headers(headers.iter())?;

    let mut records = Vec::new();
    let mut total_mismatches = 0usize;
    for (idx, result) in rdr.records().enumerate() {
        let row = result?;
        if row.len() != headers.len() {
            return Err(LoadError::RowLength {
                row: idx + 1,
                expected: headers.len(),
                found: row.len(),
            });
        }
        let record = parse_row(&schema, &row, idx + 1)?;
        if let Some(sum) = record.gender_mismatch() {
            total_mismatches += 1;
            warn!(
                row = idx + 1,
                total = record.total,
                gender_sum = sum,
                "total does not match gender totals"
            );
        }
        records.push(record);
    }

    let report = LoadReport {
        rows: records.len(),
        total_mismatches,
        ignored_columns: schema.ignored().to_vec(),
    };
    Ok((Dataset::new(records), report))
}

fn parse_row(schema: &SchemaIndex, row: &StringRecord, row_no: usize) -> Result<Record, LoadError> {
    let cell = |col: Column| cell_at(schema, row, col);
    let text = |col: Column| -> String {
        let v = normalize_value(cell(col));
        if v.is_empty() {
            UNKNOWN.to_string()
        } else {
            v
        }
    };
    let invalid = |column: &'static str, value: &str| LoadError::InvalidValue {
        row: row_no,
        column,
        value: value.to_string(),
    };

    let year_raw = cell(Column::Year);
    let year = parse_year(year_raw).ok_or_else(|| invalid("year", year_raw))?;

    let total_raw = cell(Column::Total);
    if total_raw.trim().is_empty() {
        return Err(invalid("total", total_raw));
    }
    let total = parse_count(total_raw).ok_or_else(|| invalid("total", total_raw))?;

    let mut demographics = Demographics::default();
    for col in DemographicColumn::all() {
        let raw = cell(Column::Demographic(col));
        let value = parse_count(raw).ok_or_else(|| invalid("demographic count", raw))?;
        col.set(&mut demographics, value);
    }

    Ok(Record {
        year,
        population_type: text(Column::PopulationType),
        location: text(Column::Location),
        urban_rural: text(Column::UrbanRural),
        accommodation_type: text(Column::AccommodationType),
        country_of_origin: text(Column::CountryOfOrigin),
        country_of_asylum: text(Column::CountryOfAsylum),
        total,
        demographics,
    })
}

fn cell_at<'a>(schema: &SchemaIndex, row: &'a StringRecord, col: Column) -> &'a str {
    schema
        .position(col)
        .and_then(|i| row.get(i))
        .unwrap_or("")
}
