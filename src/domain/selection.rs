// src/domain/selection.rs

use crate::domain::record::{
    DisplacementStatus, DocumentationStatus, GenderHoh, PathwayStage, ShelterStatus,
    SolutionsPathway,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// Inclusive date bounds. A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    /// A range whose start is after its end contains nothing.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// The active filter state for one render.
///
/// Every set-valued dimension follows the same rule: an empty set places no
/// restriction on that dimension, it never means "match nothing". A selection
/// is rebuilt from the request each time; nothing mutates one that a render is using.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSelection {
    pub regions: BTreeSet<String>,
    pub pathways: BTreeSet<SolutionsPathway>,
    pub stages: BTreeSet<PathwayStage>,
    pub date_range: DateRange,

    // Secondary dimensions from the sidebar's "additional filters".
    pub districts: BTreeSet<String>,
    pub statuses: BTreeSet<DisplacementStatus>,
    pub genders: BTreeSet<GenderHoh>,
    pub shelters: BTreeSet<ShelterStatus>,
    pub documentation: BTreeSet<DocumentationStatus>,
    pub livelihood: Option<bool>,
    pub household_size: (Option<u32>, Option<u32>),
}

impl FilterSelection {
    /// The selection that matches every record.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn is_unrestricted(&self) -> bool {
        *self == Self::default()
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pathways(mut self, pathways: impl IntoIterator<Item = SolutionsPathway>) -> Self {
        self.pathways = pathways.into_iter().collect();
        self
    }

    pub fn with_stages(mut self, stages: impl IntoIterator<Item = PathwayStage>) -> Self {
        self.stages = stages.into_iter().collect();
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    pub fn with_quick(self, quick: QuickFilter) -> Self {
        quick.apply(self)
    }
}

/// One-click presets. Each one narrows a single dimension of an existing selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickFilter {
    Achieved,
    IdpOnly,
    FemaleHoh,
    Emergency,
}

impl QuickFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "achieved" => Some(QuickFilter::Achieved),
            "idp" | "idp_only" => Some(QuickFilter::IdpOnly),
            "female_hoh" => Some(QuickFilter::FemaleHoh),
            "emergency" => Some(QuickFilter::Emergency),
            _ => None,
        }
    }

    pub fn apply(self, mut selection: FilterSelection) -> FilterSelection {
        match self {
            QuickFilter::Achieved => {
                selection.stages = BTreeSet::from([PathwayStage::Achieved]);
            }
            QuickFilter::IdpOnly => {
                selection.statuses = BTreeSet::from([DisplacementStatus::Idp]);
            }
            QuickFilter::FemaleHoh => {
                selection.genders = BTreeSet::from([GenderHoh::Female]);
            }
            QuickFilter::Emergency => {
                selection.shelters = BTreeSet::from([ShelterStatus::Emergency]);
            }
        }
        selection
    }
}
