// assembler.rs
use crate::aggregate::{
    aggregate_flow, cluster_locations, compare, compute_kpis, heat_points, monthly_trends,
    pathway_progress, region_stage_progress, regional_summary, PeriodComparison,
};
use crate::domain::{DateRange, FilterSelection, RenderSnapshot};
use crate::filters::{self, FilteredView};
use crate::store::DatasetStore;
use tracing::debug;

/// Knobs that change how aggregates are shaped, not which records they cover.
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings {
    /// Decimal places of the map clustering grid.
    pub grid_precision: u8,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self { grid_precision: 1 }
    }
}

/// Runs one render cycle: filter once, then derive every visual from that one view.
pub fn render(
    selection: &FilterSelection,
    store: &DatasetStore,
    settings: &RenderSettings,
) -> RenderSnapshot {
    render_with_records(selection, store, settings).1
}

/// Same as `render`, also handing back the filtered records the snapshot was
/// built from (the spreadsheet export writes both).
pub fn render_with_records<'a>(
    selection: &FilterSelection,
    store: &'a DatasetStore,
    settings: &RenderSettings,
) -> (FilteredView<'a>, RenderSnapshot) {
    let view = filters::apply(selection, store);
    let snapshot = assemble(selection, &view, settings);

    debug!(
        matched = snapshot.matched,
        of = store.len(),
        clusters = snapshot.clusters.len(),
        excluded_from_map = snapshot.excluded_from_map,
        "render complete"
    );
    (view, snapshot)
}

fn assemble(
    selection: &FilterSelection,
    view: &FilteredView<'_>,
    settings: &RenderSettings,
) -> RenderSnapshot {
    let flow = aggregate_flow(view);
    let geo = cluster_locations(view, settings.grid_precision);

    RenderSnapshot {
        selection: selection.clone(),
        matched: view.len(),
        flow_nodes: flow.nodes,
        flow_edges: flow.edges,
        clusters: geo.clusters,
        excluded_from_map: geo.excluded,
        heat_points: heat_points(view),
        kpis: compute_kpis(view),
        monthly_trends: monthly_trends(view),
        regional_summary: regional_summary(view),
        pathway_progress: pathway_progress(view),
        region_stage_progress: region_stage_progress(view),
    }
}

/// Compares two date windows under the same selection.
/// The selection's own date range is replaced by each window in turn.
pub fn compare_periods(
    selection: &FilterSelection,
    store: &DatasetStore,
    current: DateRange,
    previous: DateRange,
) -> PeriodComparison {
    let current_view = filters::apply(&selection.clone().with_date_range(current), store);
    let previous_view = filters::apply(&selection.clone().with_date_range(previous), store);

    compare(&current_view, &previous_view)
}
