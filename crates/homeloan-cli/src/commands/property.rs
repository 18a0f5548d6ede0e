use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use homeloan_core::property::affordability::{self, AffordabilitySearch, PropertyCandidate};
use homeloan_core::LendingPolicy;

use crate::input;

/// Arguments for the property affordability search
#[derive(Args)]
pub struct FindPropertiesArgs {
    /// Full search document (candidates plus buyer figures)
    #[arg(long)]
    pub input: Option<String>,

    /// File holding only the candidate listings (JSON/YAML array)
    #[arg(long)]
    pub candidates: Option<String>,

    /// Total budget for the purchase
    #[arg(long, alias = "budget")]
    pub total_budget: Option<Decimal>,

    /// Loan amount available
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Savings available for the down payment
    #[arg(long)]
    pub savings: Option<Decimal>,

    /// Planned monthly EMI
    #[arg(long)]
    pub emi: Option<Decimal>,

    /// Loan tenure in years
    #[arg(long, alias = "tenure", default_value_t = 20)]
    pub tenure_years: u32,
}

pub fn run_find_properties(
    args: FindPropertiesArgs,
    policy: &LendingPolicy,
) -> Result<Value, Box<dyn std::error::Error>> {
    let search: AffordabilitySearch = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(ref path) = args.candidates {
        let candidates: Vec<PropertyCandidate> = input::file::read_json(path)?;
        AffordabilitySearch {
            candidates,
            total_budget: args
                .total_budget
                .ok_or("--total-budget is required with --candidates")?,
            loan_amount: args
                .loan_amount
                .ok_or("--loan-amount is required with --candidates")?,
            savings: args.savings.ok_or("--savings is required with --candidates")?,
            emi: args.emi.unwrap_or(Decimal::ZERO),
            tenure_years: args.tenure_years,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file>, --candidates <file> or stdin required for find-properties".into());
    };
    let result = affordability::find_affordable_properties(&search, policy)?;
    Ok(serde_json::to_value(result)?)
}
