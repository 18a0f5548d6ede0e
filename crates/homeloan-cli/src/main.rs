mod commands;
mod input;
mod output;
mod store;
mod telemetry;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::applications::{AnalyticsArgs, ApplyArgs, ConsultArgs, StatusArgs};
use commands::loans::{BankRatesArgs, CompareArgs, EligibilityArgs, EmiArgs};
use commands::property::FindPropertiesArgs;

/// Home-loan affordability calculations
#[derive(Parser)]
#[command(
    name = "homeloan",
    version,
    about = "Home-loan affordability calculations",
    long_about = "A CLI for home-loan affordability with decimal precision. Supports EMI \
                  calculation, loan eligibility, multi-bank rate comparison, property \
                  affordability search, loan applications and expert consultations."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Lending policy file (JSON or YAML) overriding the built-in rules
    #[arg(long, env = "HOMELOAN_POLICY", global = true)]
    policy: Option<String>,

    /// JSON file holding submitted applications and consultations
    #[arg(long, env = "HOMELOAN_STORE", global = true)]
    store: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the monthly instalment, total payable and interest for a loan
    Emi(EmiArgs),
    /// Work out how much an applicant can borrow
    Eligibility(EligibilityArgs),
    /// Compare a loan across banks
    Compare(CompareArgs),
    /// List the built-in bank rate table
    BankRates(BankRatesArgs),
    /// Find properties within a buyer's budget and rank their affordability
    FindProperties(FindPropertiesArgs),
    /// Submit a loan application
    Apply(ApplyArgs),
    /// Request a call with a loan expert
    Consult(ConsultArgs),
    /// Move a stored application to a new status
    Status(StatusArgs),
    /// Summarise and list stored consultation requests
    Consultations,
    /// Summarise a set of loan applications
    Analytics(AnalyticsArgs),
    /// Print the effective lending policy
    Policy,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = telemetry::init(&cli.log_level) {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }

    let policy = match commands::policy::load(cli.policy.as_deref()) {
        Ok(policy) => policy,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let store = cli.store.as_deref();
    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Emi(args) => commands::loans::run_emi(args),
        Commands::Eligibility(args) => commands::loans::run_eligibility(args, &policy),
        Commands::Compare(args) => commands::loans::run_compare(args, &policy),
        Commands::BankRates(args) => commands::loans::run_bank_rates(args),
        Commands::FindProperties(args) => commands::property::run_find_properties(args, &policy),
        Commands::Apply(args) => commands::applications::run_apply(args, &policy, store),
        Commands::Consult(args) => commands::applications::run_consult(args, &policy, store),
        Commands::Status(args) => commands::applications::run_status(args, store),
        Commands::Consultations => commands::applications::run_consultations(store),
        Commands::Analytics(args) => commands::applications::run_analytics(args, store),
        Commands::Policy => commands::policy::run_policy(&policy),
        Commands::Version => {
            println!("homeloan {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
