use crate::assembler::RenderSettings;
use crate::state::AppState;
use crate::store::{DatasetStore, LoadOptions, Strictness};
use astra::{Body, Response};
use chrono::NaiveDate;
use http::{Method, Request};
use std::io::{Read, Write};
use tempfile::NamedTempFile;

pub const HEADER: &str = "beneficiary_id,registration_date,region,district,displacement_status,solutions_pathway,pathway_stage,household_size,gender_hoh,shelter_status,livelihood_support,documentation_status,latitude,longitude";

/// The sample dataset shipped with the server: 48 valid rows and 2 bad ones.
pub const FIXTURE_CSV: &str = include_str!("../../data/sample_data.csv");

/// Fixed "today" so fixtures never age into future-dated rejections.
pub fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

pub fn test_options() -> LoadOptions {
    LoadOptions {
        strictness: Strictness::Lenient,
        as_of: as_of(),
    }
}

pub fn csv_of(rows: &[&str]) -> String {
    let mut s = String::from(HEADER);
    for r in rows {
        s.push('\n');
        s.push_str(r);
    }
    s
}

/// Loads data rows (no header) into a store.
pub fn store_from_rows(rows: &[&str]) -> DatasetStore {
    DatasetStore::load(csv_of(rows).as_bytes(), &test_options())
        .unwrap_or_else(|e| panic!("fixture rows failed to load: {e}"))
}

pub fn fixture_store() -> DatasetStore {
    DatasetStore::load(FIXTURE_CSV.as_bytes(), &test_options())
        .unwrap_or_else(|e| panic!("sample dataset failed to load: {e}"))
}

/// App state backed by a temp copy of the sample dataset. The file handle is
/// returned so the caller can rewrite the data and keep it alive.
pub fn test_state() -> (AppState, NamedTempFile) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(FIXTURE_CSV.as_bytes()).unwrap();
    file.flush().unwrap();

    let state = AppState::new(
        fixture_store(),
        file.path(),
        Strictness::Lenient,
        RenderSettings::default(),
    );
    (state, file)
}

pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn body_string(resp: Response) -> String {
    let mut body = String::new();
    resp.into_body().reader().read_to_string(&mut body).unwrap();
    body
}

pub fn body_json(resp: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(resp)).unwrap()
}
