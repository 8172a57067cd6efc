use crate::aggregate::kpi::KpiValue;
use crate::aggregate::regional::round1;
use crate::domain::record::{PathwayStage, SolutionsPathway};
use crate::filters::FilteredView;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathwayProgress {
    pub pathway: SolutionsPathway,
    /// Every stage is present, in progress order, zero included.
    pub by_stage: BTreeMap<PathwayStage, usize>,
    pub total: usize,
    pub achievement_rate: KpiValue,
}

/// Stage distribution for each pathway present in the view, in pathway order.
/// Records without a pathway are not part of any row.
pub fn pathway_progress(view: &FilteredView<'_>) -> Vec<PathwayProgress> {
    let mut table: BTreeMap<SolutionsPathway, BTreeMap<PathwayStage, usize>> = BTreeMap::new();

    for p in view.iter().filter_map(|rec| rec.pathway) {
        let row = table
            .entry(p.kind)
            .or_insert_with(|| PathwayStage::ALL.iter().map(|s| (*s, 0)).collect());
        *row.entry(p.stage).or_default() += 1;
    }

    table
        .into_iter()
        .map(|(pathway, by_stage)| {
            let total: usize = by_stage.values().sum();
            let achieved = by_stage.get(&PathwayStage::Achieved).copied().unwrap_or(0);
            let achievement_rate = if total == 0 {
                KpiValue::NotAvailable
            } else {
                KpiValue::Percent(round1(achieved as f64 * 100.0 / total as f64))
            };
            PathwayProgress {
                pathway,
                by_stage,
                total,
                achievement_rate,
            }
        })
        .collect()
}

/// Stage distribution for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStageRow {
    pub region: String,
    /// Every stage is present, in progress order, zero included.
    pub by_stage: BTreeMap<PathwayStage, usize>,
    pub total: usize,
}

/// Region by stage table, regions in name order. Only records with a pathway
/// have a stage, so a region whose records all lack one has no row.
pub fn region_stage_progress(view: &FilteredView<'_>) -> Vec<RegionStageRow> {
    let mut table: BTreeMap<&str, BTreeMap<PathwayStage, usize>> = BTreeMap::new();

    for rec in view.iter() {
        let Some(stage) = rec.pathway_stage() else {
            continue;
        };
        let row = table
            .entry(rec.region.as_str())
            .or_insert_with(|| PathwayStage::ALL.iter().map(|s| (*s, 0)).collect());
        *row.entry(stage).or_default() += 1;
    }

    table
        .into_iter()
        .map(|(region, by_stage)| RegionStageRow {
            region: region.to_string(),
            total: by_stage.values().sum(),
            by_stage,
        })
        .collect()
}
