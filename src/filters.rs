// filters.rs
use crate::domain::record::{BeneficiaryRecord, DisplacementStatus, PathwayStage, SolutionsPathway};
use crate::domain::selection::FilterSelection;
use crate::store::DatasetStore;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// The records of one store that match one selection, in store order.
///
/// Borrowed from the store, so it cannot outlive it and nothing can change
/// the records underneath it.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    records: Vec<&'a BeneficiaryRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn records(&self) -> &[&'a BeneficiaryRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a BeneficiaryRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Applies `selection` to every record of `store`. Pure and order-preserving.
pub fn apply<'a>(selection: &FilterSelection, store: &'a DatasetStore) -> FilteredView<'a> {
    let records = store
        .all_records()
        .iter()
        .filter(|rec| matches(selection, rec))
        .collect();

    FilteredView { records }
}

/// True iff `rec` passes every dimension of `selection`.
/// An empty set on a dimension lets every record through on that dimension.
pub fn matches(selection: &FilterSelection, rec: &BeneficiaryRecord) -> bool {
    fn allowed<T: Ord>(set: &BTreeSet<T>, value: &T) -> bool {
        set.is_empty() || set.contains(value)
    }

    fn allowed_opt<T: Ord>(set: &BTreeSet<T>, value: Option<T>) -> bool {
        set.is_empty() || value.is_some_and(|v| set.contains(&v))
    }

    let (hh_min, hh_max) = selection.household_size;

    allowed(&selection.regions, &rec.region)
        && allowed_opt(&selection.pathways, rec.solutions_pathway())
        && allowed_opt(&selection.stages, rec.pathway_stage())
        && selection.date_range.contains(rec.registration_date)
        && allowed(&selection.districts, &rec.district)
        && allowed(&selection.statuses, &rec.displacement_status)
        && allowed(&selection.genders, &rec.gender_hoh)
        && allowed(&selection.shelters, &rec.shelter_status)
        && allowed(&selection.documentation, &rec.documentation_status)
        && selection.livelihood.map_or(true, |want| rec.livelihood_support == want)
        && hh_min.map_or(true, |min| rec.household_size >= min)
        && hh_max.map_or(true, |max| rec.household_size <= max)
}

/// Values the filter controls can offer, taken from what is actually in the data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub districts_by_region: BTreeMap<String, Vec<String>>,
    pub pathways: Vec<SolutionsPathway>,
    pub stages: Vec<PathwayStage>,
    pub statuses: Vec<DisplacementStatus>,
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    pub household_size_bounds: Option<(u32, u32)>,
    pub total_records: usize,
}

pub fn filter_options(store: &DatasetStore) -> FilterOptions {
    let records = store.all_records();

    let mut districts: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut pathways = BTreeSet::new();
    let mut stages = BTreeSet::new();
    let mut statuses = BTreeSet::new();

    for rec in records {
        districts
            .entry(rec.region.clone())
            .or_default()
            .insert(rec.district.clone());
        if let Some(p) = rec.pathway {
            pathways.insert(p.kind);
            stages.insert(p.stage);
        }
        statuses.insert(rec.displacement_status);
    }

    let dates = records.iter().map(|r| r.registration_date);
    let date_bounds = dates.clone().min().zip(dates.max());

    let sizes = records.iter().map(|r| r.household_size);
    let household_size_bounds = sizes.clone().min().zip(sizes.max());

    FilterOptions {
        regions: districts.keys().cloned().collect(),
        districts_by_region: districts
            .into_iter()
            .map(|(region, set)| (region, set.into_iter().collect()))
            .collect(),
        pathways: pathways.into_iter().collect(),
        stages: stages.into_iter().collect(),
        statuses: statuses.into_iter().collect(),
        date_bounds,
        household_size_bounds,
        total_records: records.len(),
    }
}
