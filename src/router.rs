use crate::assembler::{compare_periods, render, render_with_records};
use crate::domain::record::{
    parse_yes_no, DisplacementStatus, DocumentationStatus, GenderHoh, PathwayStage,
    ShelterStatus, SolutionsPathway,
};
use crate::domain::{DateRange, FilterSelection, QuickFilter, RowValidationError};
use crate::errors::ServerError;
use crate::filters::filter_options;
use crate::responses::{json_response, xlsx_response, ResultResp};
use crate::spreadsheets::dashboard_workbook;
use crate::state::AppState;
use astra::Request;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Rejections listed per request; the full count is always reported.
const MAX_LISTED_REJECTIONS: usize = 100;

pub fn handle(req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str();
    let path = req.uri().path();
    let params = parse_query(&req);

    match (method, path) {
        ("GET", "/api/dataset") => json_response(&DatasetSummary::of(state)),
        ("GET", "/api/options") => json_response(&filter_options(&state.store())),

        ("GET", "/api/snapshot") => {
            let selection = selection_from_query(&params)?;
            let store = state.store();
            json_response(&render(&selection, &store, &state.settings))
        }

        ("GET", "/api/compare") => {
            let selection = selection_from_query(&params)?;
            let current = DateRange::new(date_param(&params, "from")?, date_param(&params, "to")?);
            let previous = DateRange::new(
                date_param(&params, "prev_from")?,
                date_param(&params, "prev_to")?,
            );
            let store = state.store();
            json_response(&compare_periods(&selection, &store, current, previous))
        }

        ("GET", "/export.xlsx") => {
            let selection = selection_from_query(&params)?;
            let store = state.store();
            let (view, snapshot) = render_with_records(&selection, &store, &state.settings);
            let mut workbook = dashboard_workbook(&view, &snapshot)?;
            let filename = format!("solutions_dashboard_{}.xlsx", Utc::now().format("%Y%m%d"));
            xlsx_response(&mut workbook, &filename)
        }

        ("POST", "/api/reload") => {
            state.reload()?;
            json_response(&DatasetSummary::of(state))
        }

        _ => Err(ServerError::NotFound),
    }
}

#[derive(Debug, Serialize)]
struct DatasetSummary {
    records: usize,
    rejected: usize,
    loaded_on: Option<NaiveDate>,
    schema: &'static [&'static str],
    rejections: Vec<RowValidationError>,
}

impl DatasetSummary {
    fn of(state: &AppState) -> Self {
        let store = state.store();
        Self {
            records: store.len(),
            rejected: store.rejected().len(),
            loaded_on: store.loaded_on(),
            schema: store.schema(),
            rejections: store
                .rejected()
                .iter()
                .take(MAX_LISTED_REJECTIONS)
                .cloned()
                .collect(),
        }
    }
}

/// Query parameters; a key may repeat.
type Params = HashMap<String, Vec<String>>;

fn parse_query(req: &Request) -> Params {
    let mut map: Params = HashMap::new();

    if let Some(q) = req.uri().query() {
        for (k, v) in url::form_urlencoded::parse(q.as_bytes()) {
            let v = v.trim();
            if !v.is_empty() {
                map.entry(k.into_owned()).or_default().push(v.to_string());
            }
        }
    }

    map
}

fn values<'a>(params: &'a Params, key: &str) -> impl Iterator<Item = &'a str> {
    params.get(key).into_iter().flatten().map(String::as_str)
}

fn single<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    values(params, key).next()
}

/// Enum-valued keys also accept comma-separated lists. Free-text keys such as
/// `region` do not, since a place name may itself contain a comma.
fn parse_set<T: Ord>(
    params: &Params,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<BTreeSet<T>, ServerError> {
    values(params, key)
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            parse(v).ok_or_else(|| ServerError::BadRequest(format!("unknown {key} '{v}'")))
        })
        .collect()
}

fn date_param(params: &Params, key: &str) -> Result<Option<NaiveDate>, ServerError> {
    single(params, key)
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d").map_err(|_| {
                ServerError::BadRequest(format!("{key} must be a YYYY-MM-DD date, got '{v}'"))
            })
        })
        .transpose()
}

fn u32_param(params: &Params, key: &str) -> Result<Option<u32>, ServerError> {
    single(params, key)
        .map(|v| {
            v.parse::<u32>()
                .map_err(|_| ServerError::BadRequest(format!("{key} must be a whole number, got '{v}'")))
        })
        .transpose()
}

/// Builds a fresh selection from the request. Missing parameters leave their
/// dimension unrestricted.
pub(crate) fn selection_from_query(params: &Params) -> Result<FilterSelection, ServerError> {
    let livelihood = single(params, "livelihood")
        .map(|v| {
            parse_yes_no(v).ok_or_else(|| {
                ServerError::BadRequest(format!("livelihood must be yes or no, got '{v}'"))
            })
        })
        .transpose()?;

    let selection = FilterSelection {
        regions: values(params, "region").map(str::to_string).collect(),
        pathways: parse_set(params, "pathway", SolutionsPathway::parse)?,
        stages: parse_set(params, "stage", PathwayStage::parse)?,
        date_range: DateRange::new(date_param(params, "from")?, date_param(params, "to")?),
        districts: values(params, "district").map(str::to_string).collect(),
        statuses: parse_set(params, "status", DisplacementStatus::parse)?,
        genders: parse_set(params, "gender", GenderHoh::parse)?,
        shelters: parse_set(params, "shelter", ShelterStatus::parse)?,
        documentation: parse_set(params, "documentation", DocumentationStatus::parse)?,
        livelihood,
        household_size: (u32_param(params, "hh_min")?, u32_param(params, "hh_max")?),
    };

    match single(params, "quick") {
        Some(q) => QuickFilter::parse(q)
            .map(|quick| selection.with_quick(quick))
            .ok_or_else(|| ServerError::BadRequest(format!("unknown quick filter '{q}'"))),
        None => Ok(selection),
    }
}
