use chrono::Utc;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use homeloan_core::applications::analytics;
use homeloan_core::applications::consultation::{self, ConsultationRequest};
use homeloan_core::applications::intake::{self, ApplicationRequest, LoanApplication, LoanStatus};
use homeloan_core::applications::repository::{
    ApplicationFilter, ApplicationRepository, ConsultationRepository,
    InMemoryApplicationRepository, MAX_LIST_LIMIT,
};
use homeloan_core::{ComputationOutput, EmploymentCategory, LendingPolicy, LoanType};

use crate::input;
use crate::store::{self, Store};

const NOT_STORED: &str = "Not stored: pass --store <file> to keep this record and assign an id.";

/// Arguments for submitting a loan application
#[derive(Args)]
pub struct ApplyArgs {
    /// Path to JSON/YAML application document (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Applicant's full name
    #[arg(long, alias = "name", default_value = "Guest User")]
    pub applicant_name: String,

    /// Contact email
    #[arg(long)]
    pub email: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Tenure in years
    #[arg(long, alias = "tenure")]
    pub tenure_years: Option<u32>,

    /// Annual interest rate in percent
    #[arg(long, alias = "rate")]
    pub annual_rate_percent: Option<Decimal>,

    /// Loan product
    #[arg(long, default_value = "home_loan")]
    pub loan_type: LoanType,

    /// Property value; assumed from the loan amount when omitted
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// salaried, self_employed, business or professional
    #[arg(long, alias = "employment", default_value = "salaried")]
    pub employment_category: EmploymentCategory,

    /// Gross monthly income
    #[arg(long, alias = "income")]
    pub monthly_income: Option<Decimal>,

    /// Credit score (300-900)
    #[arg(long)]
    pub credit_score: Option<u32>,
}

/// Arguments for requesting an expert consultation
#[derive(Args)]
pub struct ConsultArgs {
    /// Path to JSON/YAML consultation request (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Name to call back
    #[arg(long, default_value = "Guest User")]
    pub name: String,

    /// Contact phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Loan amount being considered
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Total property budget
    #[arg(long, alias = "budget")]
    pub total_budget: Option<Decimal>,

    /// Savings available for the down payment
    #[arg(long)]
    pub savings: Option<Decimal>,

    /// Monthly EMI the buyer can carry
    #[arg(long)]
    pub emi: Option<Decimal>,

    /// Intended loan tenure in years
    #[arg(long, alias = "tenure", default_value_t = 20)]
    pub loan_tenure_years: u32,
}

/// Arguments for moving a stored application to a new status
#[derive(Args)]
pub struct StatusArgs {
    /// Application id
    #[arg(long)]
    pub id: u64,

    /// pending, under_review, approved, rejected or disbursed
    #[arg(long)]
    pub status: LoanStatus,

    /// Note recorded on the application
    #[arg(long)]
    pub remarks: Option<String>,
}

/// Arguments for application portfolio analytics
#[derive(Args)]
pub struct AnalyticsArgs {
    /// JSON/YAML array of applications; the --store file is used when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Only include applications in this status
    #[arg(long)]
    pub status: Option<LoanStatus>,

    /// Only include this loan product
    #[arg(long)]
    pub loan_type: Option<LoanType>,

    /// Maximum applications considered (1-100)
    #[arg(long, default_value_t = MAX_LIST_LIMIT)]
    pub limit: usize,
}

pub fn run_apply(
    args: ApplyArgs,
    policy: &LendingPolicy,
    store_path: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ApplicationRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ApplicationRequest {
            applicant_name: args.applicant_name,
            email: args.email,
            phone: None,
            loan_type: args.loan_type,
            property_value: args.property_value,
            amount: args.amount.ok_or("--amount is required (or provide --input)")?,
            tenure_years: args
                .tenure_years
                .ok_or("--tenure-years is required (or provide --input)")?,
            annual_rate_percent: args
                .annual_rate_percent
                .ok_or("--annual-rate-percent is required (or provide --input)")?,
            employment_category: args.employment_category,
            monthly_income: args.monthly_income,
            existing_emi: Decimal::ZERO,
            credit_score: args.credit_score,
            property_address: None,
            co_applicant_name: None,
            co_applicant_income: None,
        }
    };

    let mut prepared = intake::prepare_application(&request, policy, Utc::now())?;
    let Some(path) = store_path else {
        prepared.warnings.push(NOT_STORED.into());
        return Ok(serde_json::to_value(prepared)?);
    };

    let store = Store::open(path)?;
    let stored = store.applications.insert(prepared.result.clone())?;
    store.save()?;
    tracing::info!(id = stored.id, "application stored");

    Ok(serde_json::to_value(replace_result(prepared, stored))?)
}

pub fn run_consult(
    args: ConsultArgs,
    policy: &LendingPolicy,
    store_path: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ConsultationRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ConsultationRequest {
            name: args.name,
            phone: args.phone,
            email: None,
            preferred_time: None,
            message: None,
            savings: args.savings.ok_or("--savings is required (or provide --input)")?,
            emi: args.emi.ok_or("--emi is required (or provide --input)")?,
            loan_tenure_years: args.loan_tenure_years,
            loan_amount: args
                .loan_amount
                .ok_or("--loan-amount is required (or provide --input)")?,
            total_budget: args
                .total_budget
                .ok_or("--total-budget is required (or provide --input)")?,
        }
    };

    let mut triage = consultation::triage_consultation(&request, policy)?;
    let Some(path) = store_path else {
        triage.warnings.push(NOT_STORED.into());
        return Ok(serde_json::to_value(triage)?);
    };

    let store = Store::open(path)?;
    let record = store
        .consultations
        .insert(request, triage.result.clone(), Utc::now())?;
    store.save()?;
    tracing::info!(id = record.id, "consultation stored");

    Ok(serde_json::to_value(replace_result(triage, record))?)
}

pub fn run_status(args: StatusArgs, store_path: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let store = store::require(store_path, "status")?;
    let change = store
        .applications
        .update_status(args.id, args.status, args.remarks, Utc::now())?;
    store.save()?;

    let application = store.applications.fetch(args.id)?;
    Ok(serde_json::json!({
        "change": change,
        "application": application,
    }))
}

pub fn run_consultations(store_path: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let store = store::require(store_path, "consultations")?;
    Ok(serde_json::json!({
        "summary": store.consultations.summary()?,
        "consultations": store.consultations.all()?,
    }))
}

pub fn run_analytics(
    args: AnalyticsArgs,
    store_path: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let repo = if let Some(ref path) = args.input {
        let applications: Vec<LoanApplication> = input::file::read_json(path)?;
        InMemoryApplicationRepository::from_records(applications)
    } else if let Some(data) = input::stdin::read_stdin()? {
        let applications: Vec<LoanApplication> = serde_json::from_value(data)?;
        InMemoryApplicationRepository::from_records(applications)
    } else if let Some(path) = store_path {
        Store::open(path)?.applications
    } else {
        return Err("--input <file>, stdin or --store required for analytics".into());
    };

    let filter = ApplicationFilter {
        status: args.status,
        loan_type: args.loan_type,
    };
    let selected = repo.list(&filter, args.limit)?;

    let result = analytics::summarize_applications(&selected);
    Ok(serde_json::to_value(result)?)
}

/// Keep the envelope's metadata and warnings but swap in the stored record.
fn replace_result<A: Serialize, B: Serialize>(output: ComputationOutput<A>, result: B) -> ComputationOutput<B> {
    ComputationOutput {
        result,
        methodology: output.methodology,
        assumptions: output.assumptions,
        warnings: output.warnings,
        metadata: output.metadata,
    }
}
