use tracing::debug;

use crate::allocation::{allocate_rent, apply_costs, RentShares};
use crate::models::{
    CostBreakdown, Delta, OpenEnrollmentResult, OpenEnrollmentTotals, Program, ProgramResult,
    ProgramTotals, Results, ScenarioInputs, ScheduleGrid,
};
use crate::offsite::aggregate_off_site;
use crate::rates::RateTable;
use crate::schedule;

/// Per-program totals feeding the rollup.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgramSet {
    pub open_enrollment: OpenEnrollmentTotals,
    pub private: ProgramTotals,
    pub corporate: ProgramTotals,
    pub institutional: ProgramTotals,
}

impl ProgramSet {
    fn base_teacher_costs(&self) -> [f64; 4] {
        [
            self.open_enrollment.totals.teacher_cost,
            self.private.teacher_cost,
            self.corporate.teacher_cost,
            self.institutional.teacher_cost,
        ]
    }
}

/// Computes a full scenario.
///
/// When `grid` is `None`, open enrollment comes from the scenario fields.
/// Inputs are normalized first, so any finite or malformed value produces
/// finite results.
pub fn compute(grid: Option<&ScheduleGrid>, inputs: &ScenarioInputs, rates: &RateTable) -> Results {
    let inputs = inputs.normalized();

    let on_site = match grid {
        Some(grid) => schedule::aggregate(grid, rates),
        None => schedule::aggregate_fields(&inputs, rates),
    };
    let off_site = aggregate_off_site(&inputs, rates);

    let mut private = on_site.private;
    private.add(&off_site.private_manual);

    let programs = ProgramSet {
        open_enrollment: on_site.open_enrollment,
        private,
        corporate: off_site.corporate,
        institutional: off_site.institutional,
    };

    let rent = allocate_rent(
        programs.open_enrollment.totals.hours,
        programs.private.hours,
        rates.monthly_rent,
    );
    let costs = apply_costs(&programs.base_teacher_costs(), inputs.salary_mix_percent, rates);
    let utilization = percent_of(
        on_site.seats_used,
        f64::from(rates.topology.weekly_seat_capacity()),
    );

    rollup(&programs, &rent, costs, utilization)
}

/// Assembles program lines and scenario totals.
pub fn rollup(
    programs: &ProgramSet,
    rent: &RentShares,
    costs: CostBreakdown,
    capacity_utilization: f64,
) -> Results {
    let open_enrollment = OpenEnrollmentResult {
        base: program_result(
            Program::OpenEnrollment,
            &programs.open_enrollment.totals,
            rent.open_enrollment,
        ),
        class_count: programs.open_enrollment.class_count,
        avg_students: programs.open_enrollment.avg_students,
        seat_tier: programs.open_enrollment.seat_tier,
    };
    let private = program_result(Program::Private, &programs.private, rent.private);
    let corporate = program_result(Program::Corporate, &programs.corporate, 0.0);
    let institutional = program_result(Program::Institutional, &programs.institutional, 0.0);

    let lines = [&open_enrollment.base, &private, &corporate, &institutional];
    let total_revenue: f64 = lines.iter().map(|line| line.revenue).sum();
    let total_students: f64 = lines.iter().map(|line| line.students).sum();
    let total_instruction_hours: f64 = lines.iter().map(|line| line.hours).sum();

    let total_costs = costs.total;
    let net_profit = total_revenue - total_costs;

    debug!(total_revenue, total_costs, net_profit, "scenario rolled up");

    Results {
        open_enrollment,
        private,
        corporate,
        institutional,
        costs,
        total_revenue,
        total_costs,
        net_profit,
        profit_margin: percent_of(net_profit, total_revenue),
        total_students,
        total_instruction_hours,
        capacity_utilization,
        revenue_per_student: per_unit(total_revenue, total_students),
        cost_per_student: per_unit(total_costs, total_students),
        profit_per_student: per_unit(net_profit, total_students),
    }
}

/// Differences from `current` to `goal`.
pub fn compare(current: &Results, goal: &Results) -> Delta {
    let revenue_diff = goal.total_revenue - current.total_revenue;
    let profit_diff = goal.net_profit - current.net_profit;

    Delta {
        revenue_diff,
        cost_diff: goal.total_costs - current.total_costs,
        profit_diff,
        margin_diff: goal.profit_margin - current.profit_margin,
        student_diff: goal.total_students - current.total_students,
        hours_diff: goal.total_instruction_hours - current.total_instruction_hours,
        profit_per_student_diff: goal.profit_per_student - current.profit_per_student,
        revenue_growth_pct: growth_pct(revenue_diff, current.total_revenue),
        profit_growth_pct: growth_pct(profit_diff, current.net_profit),
    }
}

fn program_result(program: Program, totals: &ProgramTotals, rent_share: f64) -> ProgramResult {
    let profit = totals.revenue - totals.teacher_cost - rent_share;
    ProgramResult {
        program,
        revenue: totals.revenue,
        teacher_cost: totals.teacher_cost,
        rent_share,
        profit,
        margin: percent_of(profit, totals.revenue),
        hours: totals.hours,
        students: totals.students,
    }
}

/// `part / whole * 100`, or 0 when `whole` is not positive.
fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

fn per_unit(value: f64, units: f64) -> f64 {
    if units > 0.0 {
        value / units
    } else {
        0.0
    }
}

/// Growth relative to a baseline; a zero or negative baseline has no growth rate.
fn growth_pct(delta: f64, baseline: f64) -> f64 {
    percent_of(delta, baseline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassType, SlotKey};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn sample_grid() -> ScheduleGrid {
        let mut grid = ScheduleGrid::new();
        grid.assign(SlotKey::new("small1", "mon-wed", 0), ClassType::OpenEnrollment, 8);
        grid.assign(SlotKey::new("large1", "tue-thu", 1), ClassType::OpenEnrollment, 11);
        grid.assign(SlotKey::new("conference", "mon-wed", 3), ClassType::Private, 1);
        grid
    }

    #[test]
    fn empty_scenario_costs_only_fixed_items() {
        let rates = RateTable::default();
        let results = compute(Some(&ScheduleGrid::new()), &ScenarioInputs::empty(), &rates);

        let rent = rates.monthly_rent;
        let expected = rent + rates.fixed_cost_total() + rent * rates.overhead_multiplier();
        assert_eq!(results.total_revenue, 0.0);
        assert_eq!(results.costs.teacher, 0.0);
        assert_eq!(results.costs.salary_surcharge, 0.0);
        assert!(close(results.total_costs, expected));
        assert_eq!(results.net_profit, -results.total_costs);
        assert_eq!(results.profit_margin, 0.0);
        assert_eq!(results.revenue_per_student, 0.0);
        assert_eq!(results.capacity_utilization, 0.0);
    }

    #[test]
    fn empty_scenario_without_overhead_is_rent_plus_fixed() {
        let rates = RateTable {
            overhead: Vec::new(),
            ..RateTable::default()
        };
        let results = compute(None, &ScenarioInputs::empty(), &rates);
        assert_eq!(results.total_costs, 3400.0 + 500.0 + 1200.0);
        assert_eq!(results.net_profit, -5100.0);
        assert_eq!(results.open_enrollment.base.rent_share, 0.0);
        assert_eq!(results.private.rent_share, 0.0);
    }

    #[test]
    fn single_class_matches_rate_table() {
        let rates = RateTable {
            weeks_per_month: 4.0,
            ..RateTable::default()
        };
        let mut grid = ScheduleGrid::new();
        grid.assign(SlotKey::new("small1", "mon-wed", 0), ClassType::OpenEnrollment, 8);

        let results = compute(Some(&grid), &ScenarioInputs::empty(), &rates);
        let oe = &results.open_enrollment;

        assert!(close(oe.base.hours, 16.0));
        assert!(close(oe.base.revenue, 16.0 * 37.04));
        assert!(close(oe.base.teacher_cost, 16.0 * 11.20));
        assert!(close(oe.base.rent_share, 3400.0));
        assert!(close(oe.base.profit, 16.0 * 37.04 - 16.0 * 11.20 - 3400.0));
        assert_eq!(oe.class_count, 1);
        assert!(close(results.capacity_utilization, 8.0 / 440.0 * 100.0));
    }

    #[test]
    fn salary_mix_appears_as_surcharge_line() {
        let rates = RateTable {
            monthly_rent: 0.0,
            fixed_costs: Vec::new(),
            overhead: Vec::new(),
            ..RateTable::default()
        };
        // 100 corporate hours at 10/h is 1000 of base teacher pay
        let rates = RateTable {
            corporate: crate::rates::HourlyRate::new(50.0, 10.0),
            ..rates
        };
        let inputs = ScenarioInputs::empty()
            .with_corp_hours_per_month(100.0)
            .with_salary_mix_percent(100.0);

        let results = compute(None, &inputs, &rates);
        assert!(close(results.costs.teacher, 1000.0));
        assert!(close(results.costs.salary_surcharge, 400.0));
        assert!(close(results.total_costs, 1400.0));
        assert!(close(results.corporate.teacher_cost, 1000.0));
    }

    #[test]
    fn comparison_reports_profit_growth() {
        let rates = RateTable::default();
        let mut current = compute(None, &ScenarioInputs::default(), &rates);
        let mut goal = current.clone();
        current.net_profit = 1000.0;
        goal.net_profit = 1500.0;

        let delta = compare(&current, &goal);
        assert_eq!(delta.profit_diff, 500.0);
        assert_eq!(delta.profit_growth_pct, 50.0);
        assert_eq!(delta.revenue_diff, 0.0);
        assert_eq!(delta.revenue_growth_pct, 0.0);
    }

    #[test]
    fn comparison_against_loss_has_no_growth_rate() {
        let rates = RateTable::default();
        let current = compute(None, &ScenarioInputs::empty(), &rates);
        let goal = compute(None, &ScenarioInputs::default(), &rates);

        let delta = compare(&current, &goal);
        assert!(current.net_profit < 0.0);
        assert_eq!(delta.profit_growth_pct, 0.0);
        assert_eq!(delta.revenue_growth_pct, 0.0);
        assert!(delta.revenue_diff > 0.0);
    }

    #[test]
    fn manual_private_adds_to_scheduled_private() {
        let rates = RateTable::default();
        let grid = sample_grid();
        let inputs = ScenarioInputs::empty()
            .with_private_students(2.0)
            .with_private_hours_per_student(5.0);

        let scheduled_only = compute(Some(&grid), &ScenarioInputs::empty(), &rates);
        let both = compute(Some(&grid), &inputs, &rates);

        assert!(close(both.private.hours, scheduled_only.private.hours + 10.0));
        assert!(close(both.private.revenue, scheduled_only.private.revenue + 300.0));
        assert_eq!(both.private.students, scheduled_only.private.students + 2.0);
    }

    #[test]
    fn off_site_programs_take_no_rent() {
        let rates = RateTable::default();
        let results = compute(Some(&sample_grid()), &ScenarioInputs::default(), &rates);

        assert_eq!(results.corporate.rent_share, 0.0);
        assert_eq!(results.institutional.rent_share, 0.0);
        assert!(close(
            results.open_enrollment.base.rent_share + results.private.rent_share,
            rates.monthly_rent
        ));
    }

    #[test]
    fn totals_are_sums_of_programs() {
        let rates = RateTable::default();
        let results = compute(None, &ScenarioInputs::default(), &rates);

        let revenue: f64 = results.programs().iter().map(|p| p.revenue).sum();
        let students: f64 = results.programs().iter().map(|p| p.students).sum();
        assert!(close(results.total_revenue, revenue));
        // 80 open enrollment, 9 private, 16 corporate, 12 institutional
        assert_eq!(students, 117.0);
        assert_eq!(results.total_students, 117.0);
        assert!(close(
            results.profit_margin,
            results.net_profit / results.total_revenue * 100.0
        ));
    }

    #[test]
    fn grid_ignores_open_enrollment_fields() {
        let rates = RateTable::default();
        let grid = sample_grid();
        let a = compute(Some(&grid), &ScenarioInputs::default(), &rates);
        let b = compute(Some(&grid), &ScenarioInputs::default().with_oe_classes(40.0), &rates);
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_inputs_give_finite_results() {
        let rates = RateTable::default();
        let inputs = ScenarioInputs::default()
            .with_oe_classes(f64::NAN)
            .with_corp_hours_per_month(-50.0)
            .with_inst_groups(f64::INFINITY)
            .with_salary_mix_percent(-20.0);

        let results = compute(None, &inputs, &rates);
        assert!(results.total_revenue.is_finite());
        assert!(results.total_costs.is_finite());
        assert!(results.profit_per_student.is_finite());
        assert_eq!(results.corporate.revenue, 0.0);
        assert_eq!(results.costs.salary_surcharge, 0.0);
    }

    fn inputs_strategy() -> impl Strategy<Value = ScenarioInputs> {
        (
            (0.0..40.0f64, 0.0..20.0f64, 0.0..20.0f64),
            (0.0..30.0f64, 0.0..20.0f64),
            (0.0..10.0f64, 0.0..20.0f64, 0.0..200.0f64),
            (0.0..10.0f64, 0.0..20.0f64, 0.0..200.0f64),
            0.0..=100.0f64,
        )
            .prop_map(|(oe, private, corp, inst, mix)| ScenarioInputs {
                oe_classes: oe.0,
                oe_students_per_class: oe.1,
                oe_hours_per_week: oe.2,
                private_students: private.0,
                private_hours_per_student: private.1,
                corp_groups: corp.0,
                corp_participants_per_group: corp.1,
                corp_hours_per_month: corp.2,
                inst_groups: inst.0,
                inst_participants_per_group: inst.1,
                inst_hours_per_month: inst.2,
                salary_mix_percent: mix,
            })
    }

    /// Volumes spread up to and past the normalization ceiling.
    fn huge_inputs_strategy() -> impl Strategy<Value = ScenarioInputs> {
        (
            proptest::collection::vec(0.0..=1e12f64, 11),
            0.0..=100.0f64,
        )
            .prop_map(|(v, mix)| ScenarioInputs {
                oe_classes: v[0],
                oe_students_per_class: v[1],
                oe_hours_per_week: v[2],
                private_students: v[3],
                private_hours_per_student: v[4],
                corp_groups: v[5],
                corp_participants_per_group: v[6],
                corp_hours_per_month: v[7],
                inst_groups: v[8],
                inst_participants_per_group: v[9],
                inst_hours_per_month: v[10],
                salary_mix_percent: mix,
            })
    }

    #[test]
    fn extreme_volumes_give_finite_results() {
        let rates = RateTable::default();
        let inputs = ScenarioInputs::empty().with_corp_hours_per_month(1e307);

        let results = compute(None, &inputs, &rates);
        assert!(results.total_revenue.is_finite());
        assert!(results.net_profit.is_finite());
        assert!(results.profit_margin.is_finite());
        assert!(results.corporate.margin.is_finite());
        assert!(results.total_revenue > 0.0);

        let everything = ScenarioInputs {
            oe_classes: f64::MAX,
            oe_students_per_class: f64::MAX,
            oe_hours_per_week: f64::MAX,
            private_students: f64::MAX,
            private_hours_per_student: f64::MAX,
            corp_groups: f64::MAX,
            corp_participants_per_group: f64::MAX,
            corp_hours_per_month: f64::MAX,
            inst_groups: f64::MAX,
            inst_participants_per_group: f64::MAX,
            inst_hours_per_month: f64::MAX,
            salary_mix_percent: f64::MAX,
        };
        let results = compute(None, &everything, &rates);
        assert!(results.net_profit.is_finite());
        assert!(results.profit_per_student.is_finite());
        assert_eq!(results.capacity_utilization, 100.0);
    }

    proptest! {
        #[test]
        fn computing_twice_is_identical(inputs in inputs_strategy()) {
            let rates = RateTable::default();
            let grid = sample_grid();
            prop_assert_eq!(
                compute(Some(&grid), &inputs, &rates),
                compute(Some(&grid), &inputs, &rates)
            );
            prop_assert_eq!(compute(None, &inputs, &rates), compute(None, &inputs, &rates));
        }

        #[test]
        fn rent_is_conserved(inputs in inputs_strategy()) {
            let rates = RateTable::default();
            let results = compute(None, &inputs, &rates);
            let allocated = results.open_enrollment.base.rent_share + results.private.rent_share;
            let on_site = results.open_enrollment.base.hours + results.private.hours;

            if on_site > 0.0 {
                prop_assert!((allocated - rates.monthly_rent).abs() < 1e-6);
            } else {
                prop_assert_eq!(allocated, 0.0);
            }
        }

        #[test]
        fn results_are_finite(
            inputs in prop_oneof![inputs_strategy(), huge_inputs_strategy()]
        ) {
            let results = compute(None, &inputs, &RateTable::default());
            let values = [
                results.total_revenue,
                results.total_costs,
                results.net_profit,
                results.profit_margin,
                results.capacity_utilization,
                results.revenue_per_student,
                results.cost_per_student,
                results.profit_per_student,
                results.open_enrollment.avg_students,
            ];
            prop_assert!(values.iter().all(|value| value.is_finite()));
            prop_assert!(results.programs().iter().all(|p| p.margin.is_finite()));
            prop_assert!(results.capacity_utilization <= 100.0 + 1e-9);
        }

        #[test]
        fn margin_is_zero_without_revenue(mix in 0.0..=100.0f64) {
            let inputs = ScenarioInputs::empty().with_salary_mix_percent(mix);
            let results = compute(None, &inputs, &RateTable::default());
            prop_assert_eq!(results.total_revenue, 0.0);
            prop_assert_eq!(results.profit_margin, 0.0);
        }

        #[test]
        fn more_volume_never_lowers_revenue(inputs in inputs_strategy(), extra in 0.0..50.0f64) {
            let rates = RateTable::default();
            let base = compute(None, &inputs, &rates).total_revenue;
            let bumped = [
                inputs.with_oe_classes(inputs.oe_classes + extra),
                inputs.with_oe_students_per_class(inputs.oe_students_per_class + extra),
                inputs.with_oe_hours_per_week(inputs.oe_hours_per_week + extra),
                inputs.with_private_students(inputs.private_students + extra),
                inputs.with_private_hours_per_student(inputs.private_hours_per_student + extra),
                inputs.with_corp_groups(inputs.corp_groups + extra),
                inputs.with_corp_hours_per_month(inputs.corp_hours_per_month + extra),
                inputs.with_inst_groups(inputs.inst_groups + extra),
                inputs.with_inst_hours_per_month(inputs.inst_hours_per_month + extra),
            ];
            for changed in bumped {
                let revenue = compute(None, &changed, &rates).total_revenue;
                prop_assert!(revenue >= base - 1e-9);
            }
        }

        #[test]
        fn adding_students_to_a_class_never_lowers_revenue(count in 0u32..15, extra in 1u32..10) {
            let rates = RateTable::default();
            let key = SlotKey::new("conference", "mon-wed", 0);
            let mut grid = ScheduleGrid::new();
            grid.assign(key.clone(), ClassType::OpenEnrollment, count);
            let base = compute(Some(&grid), &ScenarioInputs::empty(), &rates).total_revenue;

            grid.assign(key, ClassType::OpenEnrollment, count + extra);
            let bumped = compute(Some(&grid), &ScenarioInputs::empty(), &rates).total_revenue;
            prop_assert!(bumped >= base);
        }
    }
}
