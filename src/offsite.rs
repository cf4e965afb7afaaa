use crate::models::{ProgramTotals, ScenarioInputs};
use crate::rates::{HourlyRate, RateTable};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OffSiteTotals {
    pub corporate: ProgramTotals,
    pub institutional: ProgramTotals,
    /// Private lessons entered by hand; added to any scheduled ones.
    pub private_manual: ProgramTotals,
}

/// Prices the programs that are entered as volumes rather than scheduled.
///
/// Corporate and institutional revenue follows hours alone; participant
/// counts are carried for head-count metrics only.
pub fn aggregate_off_site(inputs: &ScenarioInputs, rates: &RateTable) -> OffSiteTotals {
    let inputs = inputs.normalized();

    OffSiteTotals {
        corporate: hourly(
            &rates.corporate,
            inputs.corp_hours_per_month,
            inputs.corp_groups * inputs.corp_participants_per_group,
        ),
        institutional: hourly(
            &rates.institutional,
            inputs.inst_hours_per_month,
            inputs.inst_groups * inputs.inst_participants_per_group,
        ),
        private_manual: hourly(
            &rates.private,
            inputs.private_students * inputs.private_hours_per_student,
            inputs.private_students,
        ),
    }
}

fn hourly(rate: &HourlyRate, hours: f64, students: f64) -> ProgramTotals {
    ProgramTotals {
        revenue: hours * rate.revenue_per_hour,
        teacher_cost: hours * rate.teacher_cost_per_hour,
        hours,
        students,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corporate_is_billed_by_hours() {
        let rates = RateTable::default();
        let totals = aggregate_off_site(&ScenarioInputs::default(), &rates);

        assert!((totals.corporate.revenue - 8.0 * 34.92).abs() < 1e-9);
        assert!((totals.corporate.teacher_cost - 8.0 * 15.15).abs() < 1e-9);
        assert_eq!(totals.corporate.students, 16.0);
        assert!((totals.institutional.revenue - 6.0 * 34.62).abs() < 1e-9);
        assert_eq!(totals.institutional.students, 12.0);
    }

    #[test]
    fn participants_do_not_change_revenue() {
        let rates = RateTable::default();
        let small = aggregate_off_site(&ScenarioInputs::default().with_corp_groups(1.0), &rates);
        let large = aggregate_off_site(&ScenarioInputs::default().with_corp_groups(40.0), &rates);

        assert_eq!(small.corporate.revenue, large.corporate.revenue);
        assert_eq!(small.corporate.teacher_cost, large.corporate.teacher_cost);
        assert!(large.corporate.students > small.corporate.students);
    }

    #[test]
    fn manual_private_hours_follow_students() {
        let rates = RateTable::default();
        let inputs = ScenarioInputs::empty()
            .with_private_students(3.0)
            .with_private_hours_per_student(4.0);
        let totals = aggregate_off_site(&inputs, &rates);

        assert_eq!(totals.private_manual.hours, 12.0);
        assert!((totals.private_manual.revenue - 360.0).abs() < 1e-9);
        assert!((totals.private_manual.teacher_cost - 12.0 * 14.73).abs() < 1e-9);
        assert_eq!(totals.private_manual.students, 3.0);
    }

    #[test]
    fn negative_hours_price_as_zero() {
        let rates = RateTable::default();
        let inputs = ScenarioInputs::empty()
            .with_corp_hours_per_month(-10.0)
            .with_inst_hours_per_month(f64::NAN);
        let totals = aggregate_off_site(&inputs, &rates);

        assert_eq!(totals, OffSiteTotals::default());
    }
}
