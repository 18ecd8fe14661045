/// Reporting and output formatting module
/// Console presentation of a planning report

use crate::models::{AllocationPlan, DeficitResult, MonthProjection, SimulationResult};
use crate::planner::PlanningReport;

pub fn display_header(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════════════════════╗");
    println!("║ {:<76} ║", title);
    println!("╚══════════════════════════════════════════════════════════════════════════════╝\n");
}

/// Display per-zone deficits and recommendations
pub fn display_deficits(deficits: &[DeficitResult]) {
    display_header("ZONE CAPACITY DEFICITS");

    for result in deficits {
        println!(
            "{} | Total deficit: {:+} jobs/day | Urgency: {}/10",
            result.zone_id, result.total_deficit, result.urgency_score
        );
        for category in &result.categories {
            println!(
                "   {:<10} demand {:>7.2} | capacity {:>7.2} jobs/day | deficit {:+}",
                category.category.as_str(),
                category.demand,
                category.capacity.possible_jobs_per_day,
                category.deficit
            );
        }
        for line in &result.recommendations {
            println!("   - {}", line);
        }
        println!();
    }
}

/// Display one projected month
pub fn display_month(label: &str, month: &MonthProjection) {
    println!(
        "{} ({}) | {} days to deadline | seasonal x{:.2} | level: {}",
        label,
        month.month.format("%B %Y"),
        month.days_to_deadline,
        month.seasonal_factor,
        month.urgency_level
    );
    for need in &month.needs {
        println!(
            "   {:<12} required {:>4} | current {:>4} | gap {:>3} + rotation {:>3} = {:>4} | {:<15} | ${:.2}",
            need.zone_name,
            need.required_workers,
            need.current_workers,
            need.current_gap,
            need.rotation_impact,
            need.final_need,
            need.urgency_level.as_str(),
            need.budget
        );
    }
    println!("   Total need: {} | Budget: ${:.2}\n", month.total_need, month.budget);
}

pub fn display_critical_actions(actions: &[String]) {
    println!("Critical actions:");
    if actions.is_empty() {
        println!("   (none)");
    }
    for (rank, action) in actions.iter().enumerate() {
        println!("   {}. {}", rank + 1, action);
    }
}

/// Display the recruitment outcome distribution
pub fn display_simulation(result: &SimulationResult) {
    display_header("MONTE CARLO RECRUITMENT OUTCOMES");

    println!("Trials: {} (seed {})", result.trials, result.seed);
    println!(
        "Expected recruits: {:.2} ± {:.2} (std dev)",
        result.mean_outcome, result.std_dev_outcome
    );
    println!("\nOutcome Distribution:");
    println!("  Minimum:          {:.0}", result.min_outcome);
    println!("  2.5th Percentile: {:.0}", result.confidence_interval_95.0);
    println!("  Median (50th):    {:.0}", result.median_outcome);
    println!("  97.5th Percentile:{:.0}", result.confidence_interval_95.1);
    println!("  Maximum:          {:.0}", result.max_outcome);
    println!(
        "\nP(recruits >= {:.0}) = {:.1}%",
        result.target,
        result.success_probability * 100.0
    );
}

/// Display the channel budget split
pub fn display_allocation(plan: &AllocationPlan) {
    display_header("MARKETING BUDGET ALLOCATION");

    for allocation in &plan.allocations {
        println!(
            "  {:<16} ${:>12.2} | expected recruits {:>8.2}",
            allocation.channel_id, allocation.budget_allocated, allocation.expected_recruits
        );
    }
    println!(
        "\n  Allocated ${:.2} of ${:.2} (unallocated ${:.2}) | Expected recruits: {:.2}",
        plan.total_allocated, plan.total_budget, plan.unallocated_budget, plan.total_expected_recruits
    );
}

/// Display every section of a planning report
pub fn display_report(report: &PlanningReport) {
    display_deficits(&report.deficits);

    display_header("TWO-MONTH RECRUITMENT PROJECTION");
    display_month("Target month", &report.projection.target_month);
    display_month("Next month", &report.projection.next_month);
    println!("Overall budget: ${:.2}\n", report.projection.overall_budget);
    display_critical_actions(&report.projection.critical_actions);

    display_simulation(&report.simulation);
    display_allocation(&report.allocation);
}
