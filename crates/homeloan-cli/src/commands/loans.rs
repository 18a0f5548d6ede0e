use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use homeloan_core::loans::comparison::{self, ComparisonInput};
use homeloan_core::loans::eligibility::{self, EligibilityAssessmentInput, EligibilityInput};
use homeloan_core::loans::emi::{self, LoanQuote};
use homeloan_core::loans::rates::BankRateTable;
use homeloan_core::{EmploymentCategory, LendingPolicy, LoanType};

use crate::input;

/// Arguments for the EMI calculator
#[derive(Args)]
pub struct EmiArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long, alias = "amount")]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent, e.g. 8.5
    #[arg(long, alias = "rate")]
    pub annual_rate_percent: Option<Decimal>,

    /// Tenure in years
    #[arg(long, alias = "tenure")]
    pub tenure_years: Option<u32>,
}

/// Arguments for loan eligibility
#[derive(Args)]
pub struct EligibilityArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross monthly income
    #[arg(long, alias = "income")]
    pub monthly_income: Option<Decimal>,

    /// EMIs and other fixed monthly debts already being paid
    #[arg(long, alias = "existing-emi", default_value = "0")]
    pub existing_monthly_obligation: Decimal,

    /// salaried, self_employed, business or professional
    #[arg(long, alias = "employment", default_value = "salaried")]
    pub employment_category: EmploymentCategory,

    /// Credit score (300-900)
    #[arg(long)]
    pub credit_score: Option<u32>,

    /// Property value; with --requested-loan-amount adds an LTV assessment
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// Loan amount being asked for
    #[arg(long)]
    pub requested_loan_amount: Option<Decimal>,
}

/// Arguments for the multi-bank comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Tenure in years
    #[arg(long, alias = "tenure")]
    pub tenure_years: Option<u32>,

    /// Quote every bank at this annual rate instead of its published one
    #[arg(long, alias = "rate")]
    pub requested_rate_percent: Option<Decimal>,

    /// Loan product to compare
    #[arg(long, default_value = "home_loan")]
    pub loan_type: LoanType,

    /// Rate table file replacing the built-in one
    #[arg(long)]
    pub rates: Option<String>,
}

/// Arguments for listing published bank rates
#[derive(Args)]
pub struct BankRatesArgs {
    /// Show only this loan product
    #[arg(long)]
    pub loan_type: Option<LoanType>,
}

pub fn run_emi(args: EmiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let quote: LoanQuote = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        LoanQuote {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args
                .annual_rate_percent
                .ok_or("--annual-rate-percent is required (or provide --input)")?,
            tenure_years: args
                .tenure_years
                .ok_or("--tenure-years is required (or provide --input)")?,
        }
    };
    let result = emi::compute_amortization(&quote)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_eligibility(
    args: EligibilityArgs,
    policy: &LendingPolicy,
) -> Result<Value, Box<dyn std::error::Error>> {
    let data: Option<Value> = if let Some(ref path) = args.input {
        Some(input::file::read_json(path)?)
    } else {
        input::stdin::read_stdin()?
    };

    if let Some(data) = data {
        // a property value in the document asks for the LTV assessment
        if data.get("property_value").is_some() {
            let assessment: EligibilityAssessmentInput = serde_json::from_value(data)?;
            let result = eligibility::assess_eligibility(&assessment, policy)?;
            return Ok(serde_json::to_value(result)?);
        }
        let applicant: EligibilityInput = serde_json::from_value(data)?;
        let result = eligibility::check_eligibility(&applicant, policy)?;
        return Ok(serde_json::to_value(result)?);
    }

    let applicant = EligibilityInput {
        monthly_income: args
            .monthly_income
            .ok_or("--monthly-income is required (or provide --input)")?,
        existing_monthly_obligation: args.existing_monthly_obligation,
        employment_category: args.employment_category,
        credit_score: args.credit_score,
    };

    match (args.property_value, args.requested_loan_amount) {
        (Some(property_value), Some(requested_loan_amount)) => {
            let assessment = EligibilityAssessmentInput {
                applicant,
                property_value,
                requested_loan_amount,
            };
            let result = eligibility::assess_eligibility(&assessment, policy)?;
            Ok(serde_json::to_value(result)?)
        }
        (None, None) => {
            let result = eligibility::check_eligibility(&applicant, policy)?;
            Ok(serde_json::to_value(result)?)
        }
        _ => Err("--property-value and --requested-loan-amount must be given together".into()),
    }
}

pub fn run_compare(
    args: CompareArgs,
    policy: &LendingPolicy,
) -> Result<Value, Box<dyn std::error::Error>> {
    let comparison_input: ComparisonInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ComparisonInput {
            loan_amount: args
                .loan_amount
                .ok_or("--loan-amount is required (or provide --input)")?,
            tenure_years: args
                .tenure_years
                .ok_or("--tenure-years is required (or provide --input)")?,
            requested_rate_percent: args.requested_rate_percent,
            loan_type: args.loan_type,
        }
    };

    let custom_table: Option<BankRateTable> = match args.rates {
        Some(ref path) => {
            let table: BankRateTable = input::file::read_json(path)?;
            table.validate()?;
            Some(table)
        }
        None => None,
    };
    let table = custom_table
        .as_ref()
        .unwrap_or(BankRateTable::published());

    let result = comparison::compare_banks(&comparison_input, table, policy)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_bank_rates(args: BankRatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let table = BankRateTable::published();
    let rows: Vec<Value> = table
        .banks
        .iter()
        .map(|bank| {
            let mut row = serde_json::Map::new();
            row.insert("bank_name".into(), Value::String(bank.bank_name.clone()));
            for (loan_type, rate) in &bank.rates_by_loan_type {
                if args.loan_type.map_or(true, |t| t == *loan_type) {
                    row.insert(loan_type.as_str().into(), Value::String(rate.to_string()));
                }
            }
            Value::Object(row)
        })
        .collect();
    Ok(Value::Array(rows))
}
