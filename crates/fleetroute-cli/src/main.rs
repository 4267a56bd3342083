use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use fleetroute_cli::commands::path::{handle_path_command, PathCommandArgs};
use fleetroute_cli::commands::{inspect::handle_inspect_command, plan::handle_plan_command};
use fleetroute_cli::commands::MissionFileArgs;
use fleetroute_cli::logging::{init_logging, LoggingConfig};
use fleetroute_cli::output::OutputFormat;
use fleetroute_lib::{AssignmentMode, ConstraintProfile, PlannerOptions, Severity, WeightKey};

#[derive(Parser, Debug)]
#[command(author, version, about = "Terrain routing and fleet assignment planner")]
struct Cli {
    /// Directory holding terrain.json, units.json, targets.json and hazards.json.
    /// Falls back to FLEETROUTE_DATA_DIR, then the platform data directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarise the terrain graph and the hazards that apply to it.
    Inspect {
        #[command(flatten)]
        files: MissionFileArgs,
        /// Minimum severity that excludes a node.
        #[arg(long, default_value_t = Severity::High)]
        threshold: Severity,
    },
    /// Compute shortest paths from one node to one or more goals.
    Path {
        #[command(flatten)]
        files: MissionFileArgs,
        /// Start node id.
        #[arg(long = "from")]
        from: String,
        /// Goal node id; repeat for several goals.
        #[arg(long = "to", required = true)]
        to: Vec<String>,
        /// Edge attribute to minimise (distance or energy).
        #[arg(long, default_value_t = WeightKey::Distance)]
        weight: WeightKey,
        /// Minimum severity that excludes a node.
        #[arg(long, default_value_t = Severity::High)]
        threshold: Severity,
        /// Check routes against a maximum travel range.
        #[arg(long)]
        max_range: Option<f64>,
        /// Check routes against an energy budget.
        #[arg(long)]
        max_energy: Option<f64>,
        /// Travel speed, used with --max-duration.
        #[arg(long, requires = "max_duration")]
        speed: Option<f64>,
        /// Check routes against a travel time limit.
        #[arg(long, requires = "speed")]
        max_duration: Option<f64>,
    },
    /// Assign units to targets.
    Plan {
        #[command(flatten)]
        files: MissionFileArgs,
        /// Minimum severity that excludes a node.
        #[arg(long, default_value_t = Severity::High)]
        threshold: Severity,
        /// Edge attribute to minimise (distance or energy).
        #[arg(long, default_value_t = WeightKey::Distance)]
        weight: WeightKey,
        /// Allow a unit to take several targets, each from its start node.
        #[arg(long)]
        multi_target: bool,
        /// Cap on targets per unit in multi-target mode.
        #[arg(long, requires = "multi_target")]
        max_per_unit: Option<usize>,
        /// Evaluate unit/target pairs on a single thread.
        #[arg(long)]
        sequential: bool,
    },
}

fn main() -> Result<()> {
    init_logging(&LoggingConfig::from_env());
    let cli = Cli::parse();
    let data_dir = cli.data_dir.as_deref();

    match cli.command {
        Command::Inspect { files, threshold } => {
            handle_inspect_command(&files.sources(data_dir), threshold, cli.format)
        }
        Command::Path {
            files,
            from,
            to,
            weight,
            threshold,
            max_range,
            max_energy,
            speed,
            max_duration,
        } => {
            let args = PathCommandArgs {
                from,
                to,
                weight,
                threshold,
                limits: ConstraintProfile {
                    max_range,
                    max_energy,
                    charge: None,
                    speed,
                    max_duration,
                },
            };
            handle_path_command(&files.sources(data_dir), &args, cli.format)
        }
        Command::Plan {
            files,
            threshold,
            weight,
            multi_target,
            max_per_unit,
            sequential,
        } => {
            let options = PlannerOptions {
                weight,
                threshold,
                assignment: if multi_target {
                    AssignmentMode::MultiTarget { max_per_unit }
                } else {
                    AssignmentMode::Exclusive
                },
                parallel: !sequential,
            };
            handle_plan_command(&files.sources(data_dir), &options, cli.format)
        }
    }
}
