pub mod raw;
pub mod store_error;

pub use store_error::{LoadError, SchemaError};

use crate::domain::record::{BeneficiaryRecord, RejectionKind, RowValidationError};
use chrono::{NaiveDate, Utc};
use raw::{RawRow, COLUMNS};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

/// What to do with a row that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Drop the row, record why, keep loading.
    #[default]
    Lenient,
    /// Abort the load on the first bad row.
    Strict,
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub strictness: Strictness,
    /// Registrations dated after this day are rejected.
    pub as_of: NaiveDate,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            strictness: Strictness::Lenient,
            as_of: Utc::now().date_naive(),
        }
    }
}

/// The loaded, validated dataset. Immutable once built; a reload builds a new one.
#[derive(Debug, Clone, Default)]
pub struct DatasetStore {
    records: Vec<BeneficiaryRecord>,
    rejected: Vec<RowValidationError>,
    loaded_on: Option<NaiveDate>,
}

impl DatasetStore {
    pub fn load_path(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let store = Self::load(BufReader::new(file), options)?;
        info!(
            path = %path.display(),
            records = store.records.len(),
            rejected = store.rejected.len(),
            "dataset loaded"
        );
        Ok(store)
    }

    pub fn load<R: Read>(source: R, options: &LoadOptions) -> Result<Self, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);

        let headers = reader.headers()?.clone();
        let missing: Vec<String> = COLUMNS
            .iter()
            .filter(|col| !headers.iter().any(|h| h == **col))
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns(missing).into());
        }

        let mut records = Vec::new();
        let mut rejected = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut unparsed_by_column: HashMap<&'static str, usize> = HashMap::new();
        let mut total_rows = 0;

        for (i, result) in reader.deserialize::<RawRow>().enumerate() {
            let row = i + 1;
            total_rows += 1;

            let outcome = result
                .map_err(|e| RowValidationError::parse(row, "record", e.to_string()))
                .and_then(|raw| BeneficiaryRecord::from_raw(&raw, row, options.as_of))
                .and_then(|rec| {
                    if seen_ids.contains(&rec.id) {
                        Err(RowValidationError::constraint(
                            row,
                            "beneficiary_id",
                            format!("duplicate id '{}'", rec.id),
                        ))
                    } else {
                        Ok(rec)
                    }
                });

            match outcome {
                Ok(rec) => {
                    seen_ids.insert(rec.id.clone());
                    records.push(rec);
                }
                Err(e) if options.strictness == Strictness::Strict => return Err(e.into()),
                Err(e) => {
                    warn!(row = e.row, column = e.column, reason = %e.reason, "row rejected");
                    // Only unreadable values count against the column.
                    if e.kind == RejectionKind::Parse {
                        *unparsed_by_column.entry(e.column).or_default() += 1;
                    }
                    rejected.push(e);
                }
            }
        }

        if total_rows > 0 {
            let unparsable: Vec<String> = COLUMNS
                .iter()
                .filter(|col| unparsed_by_column.get(*col) == Some(&total_rows))
                .map(|col| col.to_string())
                .collect();
            if !unparsable.is_empty() {
                return Err(SchemaError::UnparsableColumns(unparsable).into());
            }
        }

        if !rejected.is_empty() {
            warn!(
                rejected = rejected.len(),
                accepted = records.len(),
                "dataset contained invalid rows"
            );
        }

        Ok(DatasetStore {
            records,
            rejected,
            loaded_on: Some(options.as_of),
        })
    }

    /// Records in file order. Callers only ever get shared references.
    pub fn all_records(&self) -> &[BeneficiaryRecord] {
        &self.records
    }

    pub fn schema(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    pub fn rejected(&self) -> &[RowValidationError] {
        &self.rejected
    }

    pub fn loaded_on(&self) -> Option<NaiveDate> {
        self.loaded_on
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
