use crate::filters::FilteredView;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    /// `YYYY-MM`
    pub month: String,
    pub registrations: usize,
    pub cumulative: usize,
}

/// Registrations per calendar month, oldest first, with a running total.
/// Months with no registrations are omitted.
pub fn monthly_trends(view: &FilteredView<'_>) -> Vec<MonthlyPoint> {
    let mut by_month: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for rec in view.iter() {
        *by_month.entry(rec.registration_month()).or_default() += 1;
    }

    let mut cumulative = 0;
    by_month
        .into_iter()
        .map(|((year, month), registrations)| {
            cumulative += registrations;
            MonthlyPoint {
                month: format!("{year:04}-{month:02}"),
                registrations,
                cumulative,
            }
        })
        .collect()
}
