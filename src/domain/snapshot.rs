// src/domain/snapshot.rs

use crate::aggregate::{
    FlowEdge, FlowNode, HeatPoint, Kpis, LocationCluster, MonthlyPoint, PathwayProgress,
    RegionStageRow, RegionSummary,
};
use crate::domain::selection::FilterSelection;
use serde::Serialize;

/// Everything the presentation layer draws for one filter selection.
///
/// Every field was derived from the same filtered population during one
/// render call; the presentation layer formats these values and never
/// recomputes them from records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSnapshot {
    pub selection: FilterSelection,
    /// Size of the filtered view the snapshot was built from.
    pub matched: usize,

    // === Flow diagram ===
    pub flow_nodes: Vec<FlowNode>,
    pub flow_edges: Vec<FlowEdge>,

    // === Map ===
    pub clusters: Vec<LocationCluster>,
    /// Matched records that have no coordinates and so no marker.
    pub excluded_from_map: usize,
    /// Density layer input, one point per located record.
    pub heat_points: Vec<HeatPoint>,

    // === Indicator cards ===
    pub kpis: Kpis,

    // === Secondary charts ===
    pub monthly_trends: Vec<MonthlyPoint>,
    pub regional_summary: Vec<RegionSummary>,
    pub pathway_progress: Vec<PathwayProgress>,
    pub region_stage_progress: Vec<RegionStageRow>,
}

impl RenderSnapshot {
    pub fn mapped(&self) -> usize {
        self.clusters.iter().map(|c| c.count).sum()
    }
}
