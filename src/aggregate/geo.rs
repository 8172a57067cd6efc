use crate::filters::FilteredView;
use serde::Serialize;
use std::collections::BTreeMap;

/// Finest grid supported; 6 decimal places is already ~10 cm.
pub const MAX_GRID_PRECISION: u8 = 6;

/// Summary attributes shown in a map marker's popup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterAttributes {
    /// Most common region in the cluster; ties go to the alphabetically first.
    pub region: String,
    pub district: String,
    pub individuals: u64,
    pub achieved: usize,
    /// Beneficiaries per pathway label, including "Not Yet Determined".
    pub pathways: BTreeMap<String, usize>,
    /// Beneficiaries per displacement status label.
    pub statuses: BTreeMap<String, usize>,
    /// Beneficiaries per stage label; "N/A" for records without a pathway.
    pub stages: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationCluster {
    /// Centroid of the member coordinates.
    pub latitude: f64,
    pub longitude: f64,
    pub count: usize,
    pub attributes: ClusterAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeoSummary {
    pub clusters: Vec<LocationCluster>,
    /// Records in the view without coordinates.
    pub excluded: usize,
}

impl GeoSummary {
    pub fn clustered(&self) -> usize {
        self.clusters.iter().map(|c| c.count).sum()
    }
}

/// One located household for the density layer, weighted by its size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub weight: u32,
}

#[derive(Default)]
struct CellAccumulator<'a> {
    sum_lat: f64,
    sum_lon: f64,
    count: usize,
    individuals: u64,
    achieved: usize,
    regions: BTreeMap<&'a str, usize>,
    districts: BTreeMap<&'a str, usize>,
    pathways: BTreeMap<String, usize>,
    statuses: BTreeMap<&'static str, usize>,
    stages: BTreeMap<&'static str, usize>,
}

fn dominant(counts: &BTreeMap<&str, usize>) -> String {
    counts
        .iter()
        .fold(None::<(&str, usize)>, |best, (name, n)| match best {
            Some((_, best_n)) if best_n >= *n => best,
            _ => Some((*name, *n)),
        })
        .map(|(name, _)| name.to_string())
        .unwrap_or_default()
}

/// Groups located records into grid cells `10^-grid_precision` degrees wide.
///
/// Records without coordinates are counted in `excluded`, so
/// `clustered() + excluded == view.len()` always holds.
pub fn cluster_locations(view: &FilteredView<'_>, grid_precision: u8) -> GeoSummary {
    let scale = 10f64.powi(i32::from(grid_precision.min(MAX_GRID_PRECISION)));
    let mut cells: BTreeMap<(i64, i64), CellAccumulator<'_>> = BTreeMap::new();
    let mut excluded = 0;

    for rec in view.iter() {
        let Some(point) = rec.location else {
            excluded += 1;
            continue;
        };

        let key = (
            (point.latitude * scale).round() as i64,
            (point.longitude * scale).round() as i64,
        );
        let cell = cells.entry(key).or_default();
        cell.sum_lat += point.latitude;
        cell.sum_lon += point.longitude;
        cell.count += 1;
        cell.individuals += u64::from(rec.household_size);
        if rec.is_achieved() {
            cell.achieved += 1;
        }
        *cell.regions.entry(rec.region.as_str()).or_default() += 1;
        *cell.districts.entry(rec.district.as_str()).or_default() += 1;
        let pathway = rec
            .solutions_pathway()
            .map_or("Not Yet Determined", |p| p.label());
        *cell.pathways.entry(pathway.to_string()).or_default() += 1;
        *cell.statuses.entry(rec.displacement_status.label()).or_default() += 1;
        let stage = rec.pathway_stage().map_or("N/A", |s| s.label());
        *cell.stages.entry(stage).or_default() += 1;
    }

    let clusters = cells
        .into_values()
        .map(|cell| LocationCluster {
            latitude: cell.sum_lat / cell.count as f64,
            longitude: cell.sum_lon / cell.count as f64,
            count: cell.count,
            attributes: ClusterAttributes {
                region: dominant(&cell.regions),
                district: dominant(&cell.districts),
                individuals: cell.individuals,
                achieved: cell.achieved,
                pathways: cell.pathways,
                statuses: owned_keys(cell.statuses),
                stages: owned_keys(cell.stages),
            },
        })
        .collect();

    GeoSummary { clusters, excluded }
}

fn owned_keys(counts: BTreeMap<&str, usize>) -> BTreeMap<String, usize> {
    counts.into_iter().map(|(k, n)| (k.to_string(), n)).collect()
}

/// Every located record as a point weighted by household size, in view order.
/// Records without coordinates are left out, as they are from the clusters.
pub fn heat_points(view: &FilteredView<'_>) -> Vec<HeatPoint> {
    view.iter()
        .filter_map(|rec| {
            rec.location.map(|point| HeatPoint {
                latitude: point.latitude,
                longitude: point.longitude,
                weight: rec.household_size,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::selection::FilterSelection;
    use crate::filters::apply;
    use crate::tests::utils::{fixture_store, store_from_rows};

    #[test]
    fn test_nearby_points_share_a_cell() {
        let store = store_from_rows(&[
            "B1,2024-01-10,Bay,Baidoa,IDP,Return,Achieved,5,Female,Emergency,Yes,Partial,3.11,43.61",
            "B2,2024-01-12,Bay,Baidoa,IDP,Relocation,Planning,4,Male,Permanent,No,Complete,3.13,43.63",
            "B3,2024-01-12,Gedo,Luuq,IDP,,,2,Male,Permanent,No,Complete,3.14,43.62",
            "B4,2024-02-01,Lower Juba,Kismayo,Returnee,Return,Assessment,3,Male,Transitional,No,Complete,-0.36,42.54",
            "B5,2024-02-03,Lower Juba,Kismayo,Returnee,,,3,Male,Transitional,No,Complete,,",
        ]);
        let view = apply(&FilterSelection::unrestricted(), &store);
        let geo = cluster_locations(&view, 1);

        assert_eq!(geo.clusters.len(), 2);
        assert_eq!(geo.excluded, 1);
        assert_eq!(geo.clustered() + geo.excluded, view.len());

        // cells are ordered by latitude first, so Kismayo comes before Baidoa
        let kismayo = &geo.clusters[0];
        assert_eq!(kismayo.count, 1);
        assert_eq!(kismayo.attributes.district, "Kismayo");

        let baidoa = &geo.clusters[1];
        assert_eq!(baidoa.count, 3);
        assert_eq!(baidoa.attributes.region, "Bay");
        assert_eq!(baidoa.attributes.individuals, 11);
        assert_eq!(baidoa.attributes.achieved, 1);
        assert_eq!(baidoa.attributes.pathways.get("Not Yet Determined"), Some(&1));
        assert_eq!(baidoa.attributes.statuses.get("IDP"), Some(&3));
        assert_eq!(baidoa.attributes.stages.get("Achieved"), Some(&1));
        assert_eq!(baidoa.attributes.stages.get("Planning"), Some(&1));
        assert_eq!(baidoa.attributes.stages.get("N/A"), Some(&1));
        assert!((baidoa.latitude - 3.1266).abs() < 1e-3);
    }

    #[test]
    fn test_finer_grid_splits_clusters() {
        let store = store_from_rows(&[
            "B1,2024-01-10,Bay,Baidoa,IDP,Return,Achieved,5,Female,Emergency,Yes,Partial,3.11,43.61",
            "B2,2024-01-12,Bay,Baidoa,IDP,Relocation,Planning,4,Male,Permanent,No,Complete,3.13,43.63",
        ]);
        let view = apply(&FilterSelection::unrestricted(), &store);
        assert_eq!(cluster_locations(&view, 1).clusters.len(), 1);
        assert_eq!(cluster_locations(&view, 2).clusters.len(), 2);
    }

    #[test]
    fn test_every_breakdown_sums_to_the_cluster_count() {
        let store = fixture_store();
        let geo = cluster_locations(&apply(&FilterSelection::unrestricted(), &store), 1);

        for cluster in &geo.clusters {
            let attrs = &cluster.attributes;
            for breakdown in [&attrs.pathways, &attrs.statuses, &attrs.stages] {
                assert_eq!(breakdown.values().sum::<usize>(), cluster.count);
            }
        }
    }

    #[test]
    fn test_heat_points_weight_by_household_size() {
        let store = fixture_store();
        let view = apply(&FilterSelection::unrestricted(), &store);
        let points = heat_points(&view);
        let geo = cluster_locations(&view, 1);

        assert_eq!(points.len(), geo.clustered());
        let weight: u64 = points.iter().map(|p| u64::from(p.weight)).sum();
        let individuals: u64 = geo.clusters.iter().map(|c| c.attributes.individuals).sum();
        assert_eq!(weight, individuals);
    }

    #[test]
    fn test_dominant_breaks_ties_alphabetically() {
        let counts = BTreeMap::from([("Gedo", 2), ("Bay", 2), ("Awdal", 1)]);
        assert_eq!(dominant(&counts), "Bay");
        assert_eq!(dominant(&BTreeMap::new()), "");
    }
}
