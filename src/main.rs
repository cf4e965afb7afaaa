use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lingua_planner::format::{format_currency, format_diff, format_percent};
use lingua_planner::models::{ScenarioInputs, ScheduleGrid};
use lingua_planner::{compare, compute, io, report, RateTable, Results};

#[derive(Parser)]
#[command(name = "lingua-planner")]
#[command(about = "Revenue and capacity planner for language training programs", long_about = None)]
struct Cli {
    /// Rate table JSON to use instead of the built-in rates
    #[arg(long, global = true)]
    rates: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute one scenario
    Calc {
        /// Scenario JSON; defaults are used when omitted
        #[arg(long)]
        inputs: Option<PathBuf>,
        /// Schedule grid (CSV or JSON); open enrollment comes from the scenario when omitted
        #[arg(long)]
        grid: Option<PathBuf>,
        /// Print the full results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare a current and a goal scenario
    Compare {
        #[arg(long)]
        current: Option<PathBuf>,
        #[arg(long)]
        goal: Option<PathBuf>,
        #[arg(long)]
        current_grid: Option<PathBuf>,
        #[arg(long)]
        goal_grid: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Write a markdown report for a current and a goal scenario
    Report {
        #[arg(long)]
        current: Option<PathBuf>,
        #[arg(long)]
        goal: Option<PathBuf>,
        #[arg(long)]
        current_grid: Option<PathBuf>,
        #[arg(long)]
        goal_grid: Option<PathBuf>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Show the rate table and cost structure
    Rates {
        #[arg(long)]
        json: bool,
    },
    /// Write a default scenario file to edit
    Template {
        /// Write the default goal scenario instead of the current one
        #[arg(long)]
        goal: bool,
        #[arg(long, default_value = "scenario.json")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LINGUA_PLANNER_LOG")
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let rates = match &cli.rates {
        Some(path) => io::load_rates(path)?,
        None => RateTable::default(),
    };

    match cli.command {
        Commands::Calc { inputs, grid, json } => {
            let results = scenario(
                inputs.as_deref(),
                grid.as_deref(),
                ScenarioInputs::default(),
                &rates,
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print!("{}", report::scenario_summary(&results));
            }
        }
        Commands::Compare {
            current,
            goal,
            current_grid,
            goal_grid,
            json,
        } => {
            let (current, goal) =
                current_and_goal(current, current_grid, goal, goal_grid, &rates)?;
            let delta = compare(&current, &goal);

            if json {
                println!("{}", serde_json::to_string_pretty(&delta)?);
            } else {
                println!("Current net profit: {}", format_currency(current.net_profit));
                println!("Goal net profit:    {}", format_currency(goal.net_profit));
                println!(
                    "Profit change:      {} ({})",
                    format_diff(delta.profit_diff),
                    format_percent(delta.profit_growth_pct)
                );
                println!(
                    "Revenue change:     {} ({})",
                    format_diff(delta.revenue_diff),
                    format_percent(delta.revenue_growth_pct)
                );
                println!("Cost change:        {}", format_diff(delta.cost_diff));
                println!("Margin change:      {:+.1} pts", delta.margin_diff);
            }
        }
        Commands::Report {
            current,
            goal,
            current_grid,
            goal_grid,
            out,
        } => {
            let (current, goal) =
                current_and_goal(current, current_grid, goal, goal_grid, &rates)?;
            let report = report::build_report(chrono::Utc::now(), &current, &goal, &rates);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Rates { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&rates)?);
            } else {
                print!("{}", report::rate_summary(&rates));
            }
        }
        Commands::Template { goal, out } => {
            let inputs = if goal {
                ScenarioInputs::default_goal()
            } else {
                ScenarioInputs::default()
            };
            io::save_inputs(&out, &inputs)?;
            println!("Scenario written to {}.", out.display());
        }
    }

    Ok(())
}

fn current_and_goal(
    current: Option<PathBuf>,
    current_grid: Option<PathBuf>,
    goal: Option<PathBuf>,
    goal_grid: Option<PathBuf>,
    rates: &RateTable,
) -> anyhow::Result<(Results, Results)> {
    let current = scenario(
        current.as_deref(),
        current_grid.as_deref(),
        ScenarioInputs::default(),
        rates,
    )?;
    let goal = scenario(
        goal.as_deref(),
        goal_grid.as_deref(),
        ScenarioInputs::default_goal(),
        rates,
    )?;
    Ok((current, goal))
}

fn scenario(
    inputs: Option<&Path>,
    grid: Option<&Path>,
    fallback: ScenarioInputs,
    rates: &RateTable,
) -> anyhow::Result<Results> {
    let inputs = match inputs {
        Some(path) => io::load_inputs(path)?,
        None => fallback,
    };
    let grid: Option<ScheduleGrid> = grid.map(io::load_grid).transpose()?;
    Ok(compute(grid.as_ref(), &inputs, rates))
}
