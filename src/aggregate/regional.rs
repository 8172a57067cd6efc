use crate::filters::FilteredView;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub beneficiaries: usize,
    pub individuals: u64,
    pub female_hoh: usize,
    pub achieved: usize,
    pub livelihood_support: usize,
    /// Percent of beneficiaries, one decimal.
    pub achievement_rate: f64,
    pub female_hoh_rate: f64,
}

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// One row per region in the view, largest first (ties by name).
pub fn regional_summary(view: &FilteredView<'_>) -> Vec<RegionSummary> {
    let mut by_region: BTreeMap<&str, RegionSummary> = BTreeMap::new();

    for rec in view.iter() {
        let row = by_region.entry(rec.region.as_str()).or_default();
        row.beneficiaries += 1;
        row.individuals += u64::from(rec.household_size);
        if rec.is_female_hoh() {
            row.female_hoh += 1;
        }
        if rec.is_achieved() {
            row.achieved += 1;
        }
        if rec.livelihood_support {
            row.livelihood_support += 1;
        }
    }

    let mut rows: Vec<RegionSummary> = by_region
        .into_iter()
        .map(|(region, mut row)| {
            // beneficiaries >= 1 for every region that made it into the map
            let n = row.beneficiaries as f64;
            row.region = region.to_string();
            row.achievement_rate = round1(row.achieved as f64 * 100.0 / n);
            row.female_hoh_rate = round1(row.female_hoh as f64 * 100.0 / n);
            row
        })
        .collect();

    rows.sort_by(|a, b| {
        b.beneficiaries
            .cmp(&a.beneficiaries)
            .then_with(|| a.region.cmp(&b.region))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::selection::FilterSelection;
    use crate::filters::apply;
    use crate::tests::utils::store_from_rows;

    #[test]
    fn test_regions_sorted_by_size_with_rates() {
        let store = store_from_rows(&[
            "B1,2024-01-10,Gedo,Luuq,IDP,Return,Achieved,5,Female,Emergency,Yes,Partial,,",
            "B2,2024-01-12,Bay,Baidoa,IDP,Return,Achieved,4,Male,Permanent,No,Complete,,",
            "B3,2024-02-01,Bay,Baidoa,Returnee,,,3,Female,Transitional,Yes,Complete,,",
            "B4,2024-02-01,Bay,Burhakaba,Returnee,Relocation,Planning,2,Male,Transitional,No,Complete,,",
        ]);
        let rows = regional_summary(&apply(&FilterSelection::unrestricted(), &store));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].region, "Bay");
        assert_eq!(rows[0].beneficiaries, 3);
        assert_eq!(rows[0].individuals, 9);
        assert_eq!(rows[0].achievement_rate, 33.3);
        assert_eq!(rows[0].female_hoh_rate, 33.3);
        assert_eq!(rows[1].region, "Gedo");
        assert_eq!(rows[1].achievement_rate, 100.0);
    }
}
