use tracing::{debug, warn};

use crate::models::{
    ClassType, OpenEnrollmentTotals, ProgramTotals, ScenarioInputs, ScheduleGrid, SlotKey,
};
use crate::rates::{seat_tier, RateTable};

/// On-site volumes gathered from the schedule grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OnSiteTotals {
    pub open_enrollment: OpenEnrollmentTotals,
    pub private: ProgramTotals,
    /// Seats filled per week across every occupied cell.
    pub seats_used: f64,
}

/// Sums revenue, teacher cost, hours and head count for each scheduled class.
///
/// Walks every cell the topology defines, so an empty grid yields zeroes.
/// Each open enrollment class is priced at its own seat tier. Cells with no
/// students count as empty.
pub fn aggregate(grid: &ScheduleGrid, rates: &RateTable) -> OnSiteTotals {
    let topology = &rates.topology;
    for (key, _) in grid.iter() {
        let known = topology.room(&key.room).is_some()
            && topology.day_pattern(&key.day_pattern).is_some()
            && key.time_slot < topology.time_slots.len();
        if !known {
            warn!(
                room = %key.room,
                day_pattern = %key.day_pattern,
                time_slot = key.time_slot,
                "skipping grid cell outside the facility topology"
            );
        }
    }

    let mut totals = OnSiteTotals::default();
    let mut oe_students = 0.0;

    for cell in topology.cells() {
        let key = SlotKey::new(
            cell.room.id.as_str(),
            cell.day_pattern.id.as_str(),
            cell.slot_index,
        );
        let Some(assignment) = grid.get(&key) else {
            continue;
        };
        if assignment.student_count == 0 {
            continue;
        }

        let students = assignment.student_count.min(cell.room.max_capacity);
        if students < assignment.student_count {
            debug!(
                room = %cell.room.id,
                requested = assignment.student_count,
                capacity = cell.room.max_capacity,
                "clamping class to room capacity"
            );
        }
        let students = f64::from(students);
        let weekly_hours =
            f64::from(cell.day_pattern.days_per_week) * cell.time_slot.hours_per_session;
        let hours = rates.monthly(weekly_hours);
        totals.seats_used += students;

        match assignment.class_type {
            ClassType::OpenEnrollment => {
                let rate = rates.rate_for_seats(students);
                totals.open_enrollment.totals.add(&ProgramTotals {
                    revenue: hours * rate.revenue_per_hour,
                    teacher_cost: hours * rate.teacher_cost_per_hour,
                    hours,
                    students,
                });
                totals.open_enrollment.class_count += 1;
                oe_students += students;
            }
            ClassType::Private => {
                totals.private.add(&ProgramTotals {
                    revenue: hours * rates.private.revenue_per_hour,
                    teacher_cost: hours * rates.private.teacher_cost_per_hour,
                    hours,
                    students,
                });
            }
        }
    }

    let oe = &mut totals.open_enrollment;
    oe.avg_students = if oe.class_count > 0 {
        oe_students / f64::from(oe.class_count)
    } else {
        0.0
    };
    oe.seat_tier = seat_tier(oe.avg_students);

    debug!(
        oe_classes = oe.class_count,
        oe_hours = oe.totals.hours,
        private_hours = totals.private.hours,
        "aggregated schedule grid"
    );
    totals
}

/// Open enrollment taken from scenario fields when there is no grid.
///
/// The class count is rounded to whole classes and every class is priced at
/// the tier of `oe_students_per_class`. Seats used assumes the weekly class
/// hours fill average-length cells, bounded by the facility.
pub fn aggregate_fields(inputs: &ScenarioInputs, rates: &RateTable) -> OnSiteTotals {
    let inputs = inputs.normalized();
    let topology = &rates.topology;
    let classes = inputs.oe_classes.round();
    let per_class = inputs.oe_students_per_class;
    let rate = rates.rate_for_seats(per_class);
    let weekly_hours = inputs.oe_hours_per_week * classes;
    let hours = rates.monthly(weekly_hours);

    let cell_hours = topology.mean_cell_weekly_hours();
    let occupied = if cell_hours > 0.0 {
        (weekly_hours / cell_hours).min(topology.total_weekly_slots() as f64)
    } else {
        0.0
    };
    let seats_used = (occupied * per_class.min(f64::from(topology.largest_room())))
        .min(f64::from(topology.weekly_seat_capacity()));

    OnSiteTotals {
        open_enrollment: OpenEnrollmentTotals {
            totals: ProgramTotals {
                revenue: hours * rate.revenue_per_hour,
                teacher_cost: hours * rate.teacher_cost_per_hour,
                hours,
                students: classes * per_class,
            },
            class_count: classes as u32,
            avg_students: if classes > 0.0 { per_class } else { 0.0 },
            seat_tier: seat_tier(per_class),
        },
        private: ProgramTotals::default(),
        seats_used,
    }
}
