use crate::filters::FilteredView;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PeriodTotals {
    pub beneficiaries: usize,
    pub achieved: usize,
    pub individuals: u64,
}

impl PeriodTotals {
    pub fn of(view: &FilteredView<'_>) -> Self {
        view.iter().fold(PeriodTotals::default(), |mut t, rec| {
            t.beneficiaries += 1;
            t.individuals += u64::from(rec.household_size);
            if rec.is_achieved() {
                t.achieved += 1;
            }
            t
        })
    }
}

/// Current period against a previous one, with signed differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodComparison {
    pub current: PeriodTotals,
    pub previous: PeriodTotals,
    pub beneficiary_change: i64,
    pub achieved_change: i64,
    pub individuals_change: i64,
}

pub fn compare(current: &FilteredView<'_>, previous: &FilteredView<'_>) -> PeriodComparison {
    let current = PeriodTotals::of(current);
    let previous = PeriodTotals::of(previous);

    PeriodComparison {
        current,
        previous,
        beneficiary_change: current.beneficiaries as i64 - previous.beneficiaries as i64,
        achieved_change: current.achieved as i64 - previous.achieved as i64,
        individuals_change: current.individuals as i64 - previous.individuals as i64,
    }
}
