//! Derivations from a `FilteredView` to the shapes each view needs.
//! All of them are pure and accept an empty view.

pub mod comparison;
pub mod flow;
pub mod geo;
pub mod kpi;
pub mod progress;
pub mod regional;
pub mod trends;

pub use comparison::{compare, PeriodComparison};
pub use flow::{aggregate_flow, FlowEdge, FlowNode};
pub use geo::{cluster_locations, heat_points, HeatPoint, LocationCluster};
pub use kpi::{compute_kpis, KpiValue, Kpis};
pub use progress::{pathway_progress, region_stage_progress, PathwayProgress, RegionStageRow};
pub use regional::{regional_summary, RegionSummary};
pub use trends::{monthly_trends, MonthlyPoint};
