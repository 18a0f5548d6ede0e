use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::error::HomeLoanError;
use crate::policy::LendingPolicy;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::HomeLoanResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Standard,
}

impl Priority {
    /// Promised callback window for the tier.
    pub fn response_time(&self) -> &'static str {
        match self {
            Priority::High => "Within 2 hours",
            Priority::Medium => "Within 4 hours",
            Priority::Standard => "Within 24 hours",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Standard => "Standard",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationStatus {
    Pending,
    Scheduled,
    Completed,
}

/// A buyer asking to talk to a loan expert, with the figures from their search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub savings: Money,
    /// Monthly EMI the buyer believes they can carry.
    pub emi: Money,
    pub loan_tenure_years: u32,
    pub loan_amount: Money,
    pub total_budget: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationTriage {
    pub ltv_percent: Percent,
    pub priority: Priority,
    pub expected_response_time: String,
    pub recommendation: String,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationRecord {
    pub id: u64,
    pub request: ConsultationRequest,
    pub triage: ConsultationTriage,
    pub status: ConsultationStatus,
    pub submitted_at: DateTime<Utc>,
    pub assigned_expert: Option<String>,
    pub scheduled_call_time: Option<DateTime<Utc>>,
}

/// Prioritise a consultation by loan size and pick the expert's opening advice.
pub fn triage_consultation(
    request: &ConsultationRequest,
    policy: &LendingPolicy,
) -> HomeLoanResult<ComputationOutput<ConsultationTriage>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let thresholds = &policy.consultation;

    validate_request(request)?;

    let ltv = request.loan_amount / request.total_budget * dec!(100);

    let priority = if request.loan_amount > thresholds.high_priority_above {
        Priority::High
    } else if request.loan_amount > thresholds.medium_priority_above {
        Priority::Medium
    } else {
        Priority::Standard
    };

    let recommendation = if ltv > thresholds.high_ltv_percent {
        warnings.push(format!(
            "Loan covers {}% of the budget; above the {}% comfort level.",
            ltv.round_dp(1),
            thresholds.high_ltv_percent
        ));
        "High LTV - recommend discussing alternative financing options"
    } else if request.emi > request.savings * thresholds.emi_to_savings_ceiling {
        "EMI-to-savings ratio is high - need detailed financial planning"
    } else {
        "Good financial profile - standard loan processing"
    };

    tracing::debug!(%priority, ltv = %ltv.round_dp(2), "triaged consultation");

    let triage = ConsultationTriage {
        ltv_percent: ltv.round_dp(2),
        priority,
        expected_response_time: priority.response_time().into(),
        recommendation: recommendation.into(),
        next_steps: vec![
            "Expert will review your financial profile".into(),
            "Call will be scheduled within response time".into(),
            "Detailed loan options will be discussed".into(),
            "Personalized recommendations will be provided".into(),
        ],
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Consultation triage by loan size and loan-to-budget ratio",
        &serde_json::json!({
            "high_priority_above": thresholds.high_priority_above.to_string(),
            "medium_priority_above": thresholds.medium_priority_above.to_string(),
            "high_ltv_percent": thresholds.high_ltv_percent.to_string(),
        }),
        warnings,
        elapsed,
        triage,
    ))
}

fn validate_request(request: &ConsultationRequest) -> HomeLoanResult<()> {
    if request.total_budget <= Decimal::ZERO {
        return Err(HomeLoanError::invalid(
            "total_budget",
            "Total budget must be positive.",
        ));
    }
    if request.loan_amount < Decimal::ZERO {
        return Err(HomeLoanError::invalid(
            "loan_amount",
            "Loan amount cannot be negative.",
        ));
    }
    if request.savings < Decimal::ZERO || request.emi < Decimal::ZERO {
        return Err(HomeLoanError::invalid(
            "savings",
            "Savings and EMI cannot be negative.",
        ));
    }
    Ok(())
}
