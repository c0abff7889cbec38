pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "studioplan",
    about = "Studioplan operator CLI",
    long_about = "Price planner answers offline, preview installment plans, manage the submission \
                  database, and re-issue acceptance links.",
    after_help = "Examples:\n  studioplan estimate --answers answers.json --region sg\n  \
                  studioplan recommend --goal \"Get more inquiries\" --feature booking\n  \
                  studioplan doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, acceptance secret, email delivery, and DB readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Price a planner answers JSON file without storing or emailing it")]
    Estimate {
        #[arg(long, help = "Path to a planner answers JSON document")]
        answers: PathBuf,
        #[arg(long, help = "Evaluate as of this RFC 3339 timestamp instead of now")]
        now: Option<String>,
        #[arg(long, help = "Display region for converted prices: my, sg, or int")]
        region: Option<String>,
    },
    #[command(about = "Recommend a package for lead-form goals and feature keywords")]
    Recommend {
        #[arg(long = "goal", help = "Goal label; repeat for several goals")]
        goals: Vec<String>,
        #[arg(long = "feature", help = "Feature id or keyword; repeat for several")]
        features: Vec<String>,
    },
    #[command(about = "Preview a 6 or 12 month installment plan for a total in MYR")]
    Installments {
        #[arg(long, help = "Project total in MYR")]
        total: String,
        #[arg(long, default_value_t = 6, help = "Installment term in months (6 or 12)")]
        months: u32,
    },
    #[command(about = "Re-issue the acceptance link for a stored submission")]
    Token {
        #[arg(long = "id", help = "Submission reference id, e.g. sub_3f2a...")]
        submission_id: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Estimate { answers, now, region } => {
            commands::estimate::run(&answers, now.as_deref(), region.as_deref())
        }
        Command::Recommend { goals, features } => commands::recommend::run(&goals, &features),
        Command::Installments { total, months } => commands::installments::run(&total, months),
        Command::Token { submission_id } => commands::token::run(&submission_id),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
