use tracing::debug;

use crate::models::{non_negative, CostBreakdown, CostLine};
use crate::rates::RateTable;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RentShares {
    pub open_enrollment: f64,
    pub private: f64,
}

impl RentShares {
    pub fn total(&self) -> f64 {
        self.open_enrollment + self.private
    }
}

/// Splits the monthly rent pool across on-site programs by their hours.
///
/// Off-site programs never take a share. With no on-site hours the pool is
/// left unallocated.
pub fn allocate_rent(oe_hours: f64, private_hours: f64, total_rent: f64) -> RentShares {
    let on_site = oe_hours + private_hours;
    if on_site <= 0.0 {
        return RentShares::default();
    }

    RentShares {
        open_enrollment: oe_hours / on_site * total_rent,
        private: private_hours / on_site * total_rent,
    }
}

/// Builds the cost side of a scenario from base teacher pay.
///
/// The salary surcharge is applied once to the summed base and reported as its
/// own line. Overhead categories are scaled from teacher pay (after surcharge)
/// plus rent; fixed items are added as they are.
pub fn apply_costs(
    base_teacher_costs: &[f64],
    salary_mix_percent: f64,
    rates: &RateTable,
) -> CostBreakdown {
    let teacher: f64 = base_teacher_costs.iter().sum();
    let mix = non_negative(salary_mix_percent).min(100.0);
    let salary_surcharge = teacher * (mix / 100.0) * rates.salary_surcharge_rate;
    let rent = rates.monthly_rent;

    let direct = teacher + salary_surcharge + rent;
    let overhead: Vec<CostLine> = rates
        .overhead
        .iter()
        .map(|ratio| CostLine {
            name: ratio.name.clone(),
            amount: direct * (ratio.ratio / rates.direct_cost_share),
        })
        .collect();
    let total_overhead: f64 = overhead.iter().map(|line| line.amount).sum();

    let fixed: Vec<CostLine> = rates
        .fixed_costs
        .iter()
        .map(|cost| CostLine {
            name: cost.name.clone(),
            amount: cost.amount,
        })
        .collect();
    let fixed_total: f64 = fixed.iter().map(|line| line.amount).sum();

    let total = direct + total_overhead + fixed_total;
    debug!(teacher, salary_surcharge, total_overhead, total, "costs applied");

    CostBreakdown {
        teacher,
        salary_surcharge,
        overhead,
        total_overhead,
        rent,
        fixed,
        total,
    }
}
