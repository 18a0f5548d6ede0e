use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::HomeLoanError;
use crate::loans::emi::{amortize, LoanQuote};
use crate::policy::LendingPolicy;
use crate::types::{with_metadata, ComputationOutput, EmploymentCategory, LoanType, Money, Percent};
use crate::HomeLoanResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Disbursed,
    Closed,
}

impl LoanStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::UnderReview => "under_review",
            LoanStatus::Approved => "approved",
            LoanStatus::Rejected => "rejected",
            LoanStatus::Disbursed => "disbursed",
            LoanStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LoanStatus {
    type Err = HomeLoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "pending" => Ok(LoanStatus::Pending),
            "under_review" => Ok(LoanStatus::UnderReview),
            "approved" => Ok(LoanStatus::Approved),
            "rejected" => Ok(LoanStatus::Rejected),
            "disbursed" => Ok(LoanStatus::Disbursed),
            "closed" => Ok(LoanStatus::Closed),
            other => Err(HomeLoanError::invalid(
                "status",
                format!("unrecognised loan status '{other}'"),
            )),
        }
    }
}

fn guest_name() -> String {
    "Guest User".into()
}

/// What an applicant submits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRequest {
    #[serde(default = "guest_name")]
    pub applicant_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub loan_type: LoanType,
    /// Defaults to `amount × default_property_value_multiplier` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_value: Option<Money>,
    pub amount: Money,
    pub tenure_years: u32,
    pub annual_rate_percent: Percent,
    #[serde(default = "default_category")]
    pub employment_category: EmploymentCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<Money>,
    #[serde(default)]
    pub existing_emi: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co_applicant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co_applicant_income: Option<Money>,
}

fn default_category() -> EmploymentCategory {
    EmploymentCategory::Salaried
}

/// Everything stored about an application except its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDetails {
    pub applicant_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub loan_type: LoanType,
    pub property_value: Money,
    pub loan_amount: Money,
    pub tenure_years: u32,
    pub annual_rate_percent: Percent,
    pub emi: Money,
    pub total_payable: Money,
    pub employment_category: EmploymentCategory,
    pub monthly_income: Option<Money>,
    pub existing_emi: Money,
    pub credit_score: Option<u32>,
    pub property_address: Option<String>,
    pub co_applicant_name: Option<String>,
    pub co_applicant_income: Option<Money>,
    pub status: LoanStatus,
    pub applied_at: DateTime<Utc>,
    pub approval_date: Option<DateTime<Utc>>,
    pub disbursement_date: Option<DateTime<Utc>>,
    pub processing_fee: Money,
    pub documentation: Vec<String>,
    pub bank_name: Option<String>,
    pub loan_officer: Option<String>,
    pub remarks: Option<String>,
}

/// A persisted application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: u64,
    #[serde(flatten)]
    pub details: ApplicationDetails,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Turn a submission into an application ready to store.
///
/// The EMI and total payable are recomputed from amount, rate and tenure
/// rather than taken from the caller.
pub fn prepare_application(
    request: &ApplicationRequest,
    policy: &LendingPolicy,
    applied_at: DateTime<Utc>,
) -> HomeLoanResult<ComputationOutput<ApplicationDetails>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_request(request)?;

    let amortization = amortize(&LoanQuote {
        principal: request.amount,
        annual_rate_percent: request.annual_rate_percent,
        tenure_years: request.tenure_years,
    })?;

    let property_value = match request.property_value {
        Some(value) => value,
        None => {
            warnings.push(format!(
                "No property value supplied; assumed {}× the loan amount.",
                policy.default_property_value_multiplier
            ));
            (request.amount * policy.default_property_value_multiplier).round_dp(2)
        }
    };

    let ltv = request.amount / property_value * dec!(100);
    if ltv > policy.max_ltv_percent {
        warnings.push(format!(
            "Loan-to-value {}% is above the {}% maximum.",
            ltv.round_dp(2),
            policy.max_ltv_percent
        ));
    }

    let status = if request.amount > policy.review_threshold {
        LoanStatus::UnderReview
    } else {
        LoanStatus::Pending
    };

    let processing_fee = (request.amount * policy.application_fee_percent / dec!(100)).round_dp(2);

    tracing::debug!(
        amount = %request.amount,
        %status,
        fee = %processing_fee,
        "prepared loan application"
    );

    let details = ApplicationDetails {
        applicant_name: request.applicant_name.clone(),
        email: request.email.clone(),
        phone: request.phone.clone(),
        loan_type: request.loan_type,
        property_value,
        loan_amount: request.amount,
        tenure_years: request.tenure_years,
        annual_rate_percent: request.annual_rate_percent,
        emi: amortization.emi,
        total_payable: amortization.total_payable,
        employment_category: request.employment_category,
        monthly_income: request.monthly_income,
        existing_emi: request.existing_emi,
        credit_score: request.credit_score,
        property_address: request.property_address.clone(),
        co_applicant_name: request.co_applicant_name.clone(),
        co_applicant_income: request.co_applicant_income,
        status,
        applied_at,
        approval_date: None,
        disbursement_date: None,
        processing_fee,
        documentation: vec![
            "Application Form".into(),
            "Income Proof Required".into(),
            "Property Documents Required".into(),
        ],
        bank_name: None,
        loan_officer: None,
        remarks: Some("Application submitted successfully".into()),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "application_fee_percent": policy.application_fee_percent.to_string(),
        "review_threshold": policy.review_threshold.to_string(),
    });

    Ok(with_metadata(
        "Loan application intake",
        &assumptions,
        warnings,
        elapsed,
        details,
    ))
}

fn validate_request(request: &ApplicationRequest) -> HomeLoanResult<()> {
    if request.applicant_name.trim().is_empty() {
        return Err(HomeLoanError::invalid(
            "applicant_name",
            "Applicant name cannot be blank.",
        ));
    }
    if let Some(value) = request.property_value {
        if value <= Decimal::ZERO {
            return Err(HomeLoanError::invalid(
                "property_value",
                "Property value must be positive.",
            ));
        }
    }
    if request.existing_emi < Decimal::ZERO {
        return Err(HomeLoanError::invalid(
            "existing_emi",
            "Existing EMI cannot be negative.",
        ));
    }
    if matches!(request.monthly_income, Some(income) if income < Decimal::ZERO) {
        return Err(HomeLoanError::invalid(
            "monthly_income",
            "Monthly income cannot be negative.",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
