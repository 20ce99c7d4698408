//! CSV loading at the pipeline boundary.
//!
//! A missing or empty input is a hard failure with the path in the
//! message; the pipeline itself only ever sees loaded records.

use crate::{
    error::{ScoreError, ScoreResult},
    record::{LoanApplication, Transaction},
    table::{FeatureTable, FeatureValue},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs::File, io::Read, path::Path};

/// Deserialize every row of a headed CSV stream.
pub fn read_csv<T: DeserializeOwned, R: Read>(reader: R) -> ScoreResult<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let rows = rdr.deserialize().collect::<Result<Vec<T>, _>>()?;
    Ok(rows)
}

/// Load a CSV file, failing when it is absent or has no data rows.
pub fn load_csv<T: DeserializeOwned>(path: &str) -> ScoreResult<Vec<T>> {
    if !Path::new(path).exists() {
        return Err(ScoreError::InputNotFound { path: path.to_string() });
    }
    let rows: Vec<T> = read_csv(File::open(path)?)?;
    if rows.is_empty() {
        return Err(ScoreError::EmptyInput { path: path.to_string() });
    }
    log::info!("Loaded '{path}' successfully: {} rows", rows.len());
    Ok(rows)
}

pub fn load_applications(path: &str) -> ScoreResult<Vec<LoanApplication>> {
    load_csv(path)
}

pub fn load_transactions(path: &str) -> ScoreResult<Vec<Transaction>> {
    load_csv(path)
}

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> ScoreResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    log::info!("Wrote {} rows to '{path}'", rows.len());
    Ok(())
}

pub fn write_applications(path: &str, rows: &[LoanApplication]) -> ScoreResult<()> {
    write_csv(path, rows)
}

pub fn write_transactions(path: &str, rows: &[Transaction]) -> ScoreResult<()> {
    write_csv(path, rows)
}

/// Write a feature table with its column header. Missing cells are empty.
pub fn write_feature_table(path: &str, table: &FeatureTable) -> ScoreResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(table.columns())?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(|v| match v {
            FeatureValue::Number(n) => n.to_string(),
            FeatureValue::Text(s) => s.clone(),
            FeatureValue::Missing => String::new(),
        }))?;
    }
    wtr.flush()?;
    log::info!("Wrote {} feature rows to '{path}'", table.len());
    Ok(())
}
