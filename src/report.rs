use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::engine::compare;
use crate::format::{format_currency, format_currency_detailed, format_diff, format_percent};
use crate::models::{ProgramResult, Results};
use crate::rates::{RateTable, MAX_SEATS, MIN_SEATS};

/// Markdown comparison of a current and a goal scenario.
pub fn build_report(
    generated_at: DateTime<Utc>,
    current: &Results,
    goal: &Results,
    rates: &RateTable,
) -> String {
    let delta = compare(current, goal);
    let mut output = String::new();

    let _ = writeln!(output, "# Revenue & Capacity Plan");
    let _ = writeln!(
        output,
        "Generated {} (monthly figures, {} weeks per month)",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        rates.weeks_per_month
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Impact");
    let _ = writeln!(
        output,
        "- Revenue: {} ({})",
        format_diff(delta.revenue_diff),
        format_percent(delta.revenue_growth_pct)
    );
    let _ = writeln!(output, "- Costs: {}", format_diff(delta.cost_diff));
    let _ = writeln!(
        output,
        "- Net profit: {} ({})",
        format_diff(delta.profit_diff),
        format_percent(delta.profit_growth_pct)
    );
    let _ = writeln!(output, "- Margin: {:+.1} pts", delta.margin_diff);
    let _ = writeln!(output, "- Students: {:+.0}", delta.student_diff);
    let _ = writeln!(output, "- Instruction hours: {:+.0}", delta.hours_diff);
    let _ = writeln!(
        output,
        "- Profit per student: {}",
        format_diff(delta.profit_per_student_diff)
    );

    write_scenario(&mut output, "Current", current);
    write_scenario(&mut output, "Goal", goal);

    output
}

/// Summary of the scenario headline figures used by the `calc` command.
pub fn scenario_summary(results: &Results) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Total revenue:  {}", format_currency(results.total_revenue));
    let _ = writeln!(output, "Total costs:    {}", format_currency(results.total_costs));
    let _ = writeln!(output, "Net profit:     {}", format_currency(results.net_profit));
    let _ = writeln!(output, "Profit margin:  {:.1}%", results.profit_margin);
    let _ = writeln!(
        output,
        "Students:       {:.0} ({:.0} instruction hrs/mo)",
        results.total_students, results.total_instruction_hours
    );
    let _ = writeln!(output, "Utilization:    {:.1}%", results.capacity_utilization);
    let _ = writeln!(output);
    for program in results.programs() {
        let _ = writeln!(
            output,
            "- {}: revenue {}, teacher {}, rent {}, profit {} ({:.1}%)",
            program.program.label(),
            format_currency(program.revenue),
            format_currency(program.teacher_cost),
            format_currency(program.rent_share),
            format_currency(program.profit),
            program.margin
        );
    }
    output
}

/// The pricing and fixed-cost structure of a rate table.
pub fn rate_summary(rates: &RateTable) -> String {
    let mut output = String::new();
    let low = rates.rate_for_seats(f64::from(MIN_SEATS));
    let high = rates.rate_for_seats(f64::from(MAX_SEATS));

    let _ = writeln!(output, "Revenue rates");
    let _ = writeln!(
        output,
        "- Corporate: {}/hr",
        format_currency_detailed(rates.corporate.revenue_per_hour)
    );
    let _ = writeln!(
        output,
        "- Institutional: {}/hr",
        format_currency_detailed(rates.institutional.revenue_per_hour)
    );
    let _ = writeln!(
        output,
        "- Private: {}/hr",
        format_currency_detailed(rates.private.revenue_per_hour)
    );
    let _ = writeln!(
        output,
        "- Open Enrollment: {}-{}/hr ({MIN_SEATS}-{MAX_SEATS} students)",
        format_currency_detailed(low.revenue_per_hour),
        format_currency_detailed(high.revenue_per_hour)
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "Teacher pay");
    let _ = writeln!(
        output,
        "- Corporate: {}/hr",
        format_currency_detailed(rates.corporate.teacher_cost_per_hour)
    );
    let _ = writeln!(
        output,
        "- Institutional: {}/hr",
        format_currency_detailed(rates.institutional.teacher_cost_per_hour)
    );
    let _ = writeln!(
        output,
        "- Private: {}/hr",
        format_currency_detailed(rates.private.teacher_cost_per_hour)
    );
    let _ = writeln!(
        output,
        "- Open Enrollment: {}/hr",
        format_currency_detailed(low.teacher_cost_per_hour)
    );
    let _ = writeln!(
        output,
        "- Salaried surcharge: +{:.0}% at a fully salaried mix",
        rates.salary_surcharge_rate * 100.0
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "Fixed monthly costs");
    let _ = writeln!(output, "- Rent: {}", format_currency(rates.monthly_rent));
    for cost in &rates.fixed_costs {
        let _ = writeln!(output, "- {}: {}", cost.name, format_currency(cost.amount));
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "Overhead (share of direct costs)");
    for overhead in &rates.overhead {
        let _ = writeln!(
            output,
            "- {}: {:.1}%",
            overhead.name,
            overhead.ratio / rates.direct_cost_share * 100.0
        );
    }
    let _ = writeln!(output);

    let topology = &rates.topology;
    let _ = writeln!(
        output,
        "Facility: {} weekly slots ({} rooms x {} times x {} day patterns), {} seats/week",
        topology.total_weekly_slots(),
        topology.rooms.len(),
        topology.time_slots.len(),
        topology.day_patterns.len(),
        topology.weekly_seat_capacity()
    );

    output
}

fn write_scenario(output: &mut String, title: &str, results: &Results) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {title} Scenario");
    let _ = writeln!(
        output,
        "Revenue {}, costs {}, net profit {} ({:.1}% margin)",
        format_currency(results.total_revenue),
        format_currency(results.total_costs),
        format_currency(results.net_profit),
        results.profit_margin
    );
    let _ = writeln!(
        output,
        "{:.0} students, {:.0} instruction hrs/mo, {:.1}% of facility seats used",
        results.total_students, results.total_instruction_hours, results.capacity_utilization
    );
    let _ = writeln!(output);

    let _ = writeln!(
        output,
        "| Program | Hours | Students | Revenue | Teacher | Rent | Profit | Margin |"
    );
    let _ = writeln!(output, "|---|---:|---:|---:|---:|---:|---:|---:|");
    for program in results.programs() {
        write_program_row(output, program);
    }

    let oe = &results.open_enrollment;
    if oe.class_count > 0 {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Open enrollment: {} classes, avg {:.1} students/class ({}-seat tier)",
            oe.class_count, oe.avg_students, oe.seat_tier
        );
    }

    let costs = &results.costs;
    let _ = writeln!(output);
    let _ = writeln!(output, "### Costs");
    let _ = writeln!(output, "- Teacher pay (base): {}", format_currency(costs.teacher));
    if costs.salary_surcharge > 0.0 {
        let _ = writeln!(
            output,
            "- Salaried surcharge: {}",
            format_currency(costs.salary_surcharge)
        );
    }
    let _ = writeln!(output, "- Rent: {}", format_currency(costs.rent));
    for line in costs.overhead.iter().chain(costs.fixed.iter()) {
        let _ = writeln!(output, "- {}: {}", line.name, format_currency(line.amount));
    }
    let _ = writeln!(output, "- Total: {}", format_currency(costs.total));
}

fn write_program_row(output: &mut String, program: &ProgramResult) {
    let _ = writeln!(
        output,
        "| {} | {:.0} | {:.0} | {} | {} | {} | {} | {:.1}% |",
        program.program.label(),
        program.hours,
        program.students,
        format_currency(program.revenue),
        format_currency(program.teacher_cost),
        format_currency(program.rent_share),
        format_currency(program.profit),
        program.margin
    );
}
