use crate::domain::record::{
    DisplacementStatus, DocumentationStatus, PathwayStage, ShelterStatus, SolutionsPathway,
};
use crate::filters::FilteredView;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

pub const TOTAL_BENEFICIARIES: &str = "total_beneficiaries";
pub const TOTAL_INDIVIDUALS: &str = "total_individuals";
pub const SOLUTIONS_ACHIEVED: &str = "solutions_achieved";
pub const WITH_PATHWAY: &str = "with_pathway";
pub const PCT_ACHIEVED: &str = "pct_achieved";
pub const ACHIEVEMENT_RATE_OVERALL: &str = "achievement_rate_overall";
pub const FEMALE_HOH_PCT: &str = "female_hoh_pct";
pub const LIVELIHOOD_SUPPORT_PCT: &str = "livelihood_support_pct";
pub const DOCUMENTATION_COMPLETE_PCT: &str = "documentation_complete_pct";
pub const AVG_HOUSEHOLD_SIZE: &str = "avg_household_size";
pub const REGIONS_COVERED: &str = "regions_covered";
/// Distinct district names across the view.
pub const DISTRICTS_COVERED: &str = "districts_covered";

/// Value of one indicator card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KpiValue {
    Count(u64),
    /// 0 to 100.
    Percent(f64),
    Mean(f64),
    /// The formula's denominator was zero.
    NotAvailable,
}

impl KpiValue {
    pub const NA: &'static str = "N/A";

    fn percent(numerator: usize, denominator: usize) -> Self {
        if denominator == 0 {
            KpiValue::NotAvailable
        } else {
            KpiValue::Percent(numerator as f64 * 100.0 / denominator as f64)
        }
    }

    fn mean(sum: u64, n: usize) -> Self {
        if n == 0 {
            KpiValue::NotAvailable
        } else {
            KpiValue::Mean(sum as f64 / n as f64)
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            KpiValue::Count(n) => Some(n as f64),
            KpiValue::Percent(v) | KpiValue::Mean(v) => Some(v),
            KpiValue::NotAvailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, KpiValue::NotAvailable)
    }
}

impl fmt::Display for KpiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KpiValue::Count(n) => write!(f, "{n}"),
            KpiValue::Percent(v) => write!(f, "{v:.1}%"),
            KpiValue::Mean(v) => write!(f, "{v:.1}"),
            KpiValue::NotAvailable => f.write_str(Self::NA),
        }
    }
}

/// Numbers go out as JSON numbers, an unavailable value as the string "N/A".
impl Serialize for KpiValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            KpiValue::Count(n) => serializer.serialize_u64(n),
            KpiValue::Percent(v) | KpiValue::Mean(v) => serializer.serialize_f64(v),
            KpiValue::NotAvailable => serializer.serialize_str(Self::NA),
        }
    }
}

/// KPI name -> value, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Kpis(BTreeMap<String, KpiValue>);

impl Kpis {
    pub fn get(&self, name: &str) -> Option<KpiValue> {
        self.0.get(name).copied()
    }

    /// Count-valued KPI, 0 when absent.
    pub fn count(&self, name: &str) -> u64 {
        match self.get(name) {
            Some(KpiValue::Count(n)) => n,
            _ => 0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, KpiValue)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    fn set(&mut self, name: impl Into<String>, value: KpiValue) {
        self.0.insert(name.into(), value);
    }
}

/// Computes every indicator from the view. Never fails: an empty view gives
/// zero counts and "N/A" for every ratio and mean.
pub fn compute_kpis(view: &FilteredView<'_>) -> Kpis {
    let total = view.len();
    let mut individuals = 0u64;
    let mut achieved = 0;
    let mut with_pathway = 0;
    let mut female_hoh = 0;
    let mut livelihood = 0;
    let mut documented = 0;
    let mut regions = HashSet::new();
    let mut districts = HashSet::new();

    let mut by_status: BTreeMap<DisplacementStatus, usize> = BTreeMap::new();
    let mut by_pathway: BTreeMap<SolutionsPathway, usize> = BTreeMap::new();
    let mut by_stage: BTreeMap<PathwayStage, usize> = BTreeMap::new();
    let mut by_shelter: BTreeMap<ShelterStatus, usize> = BTreeMap::new();
    let mut by_documentation: BTreeMap<DocumentationStatus, usize> = BTreeMap::new();

    for rec in view.iter() {
        individuals += u64::from(rec.household_size);
        if rec.is_achieved() {
            achieved += 1;
        }
        if rec.is_female_hoh() {
            female_hoh += 1;
        }
        if rec.livelihood_support {
            livelihood += 1;
        }
        if rec.has_complete_documentation() {
            documented += 1;
        }
        regions.insert(rec.region.as_str());
        districts.insert(rec.district.as_str());

        *by_status.entry(rec.displacement_status).or_default() += 1;
        *by_shelter.entry(rec.shelter_status).or_default() += 1;
        *by_documentation.entry(rec.documentation_status).or_default() += 1;
        if let Some(p) = rec.pathway {
            with_pathway += 1;
            *by_pathway.entry(p.kind).or_default() += 1;
            *by_stage.entry(p.stage).or_default() += 1;
        }
    }

    let mut kpis = Kpis::default();
    let count = |n: usize| KpiValue::Count(n as u64);

    kpis.set(TOTAL_BENEFICIARIES, count(total));
    kpis.set(TOTAL_INDIVIDUALS, KpiValue::Count(individuals));
    kpis.set(SOLUTIONS_ACHIEVED, count(achieved));
    kpis.set(WITH_PATHWAY, count(with_pathway));
    kpis.set(PCT_ACHIEVED, KpiValue::percent(achieved, with_pathway));
    kpis.set(ACHIEVEMENT_RATE_OVERALL, KpiValue::percent(achieved, total));
    kpis.set(FEMALE_HOH_PCT, KpiValue::percent(female_hoh, total));
    kpis.set(LIVELIHOOD_SUPPORT_PCT, KpiValue::percent(livelihood, total));
    kpis.set(DOCUMENTATION_COMPLETE_PCT, KpiValue::percent(documented, total));
    kpis.set(AVG_HOUSEHOLD_SIZE, KpiValue::mean(individuals, total));
    kpis.set(REGIONS_COVERED, count(regions.len()));
    kpis.set(DISTRICTS_COVERED, count(districts.len()));

    // Breakdown counts are emitted for every category, zero included,
    // so the set of keys does not depend on the filter.
    for s in DisplacementStatus::ALL {
        let n = by_status.get(s).copied().unwrap_or(0);
        kpis.set(format!("status_{}", s.key()), count(n));
    }
    for p in SolutionsPathway::ALL {
        let n = by_pathway.get(p).copied().unwrap_or(0);
        kpis.set(format!("pathway_{}", p.key()), count(n));
    }
    for s in PathwayStage::ALL {
        let n = by_stage.get(s).copied().unwrap_or(0);
        kpis.set(format!("stage_{}", s.key()), count(n));
    }
    for s in ShelterStatus::ALL {
        let n = by_shelter.get(s).copied().unwrap_or(0);
        kpis.set(format!("shelter_{}", s.key()), count(n));
    }
    for d in DocumentationStatus::ALL {
        let n = by_documentation.get(d).copied().unwrap_or(0);
        kpis.set(format!("documentation_{}", d.key()), count(n));
    }

    kpis
}
