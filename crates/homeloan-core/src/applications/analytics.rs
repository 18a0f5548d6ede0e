use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use super::intake::{LoanApplication, LoanStatus};
use crate::types::{with_metadata, ComputationOutput, LoanType, Money, Percent};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub total_loan_amount: Money,
    pub average_loan_amount: Money,
    pub average_tenure_years: Decimal,
    pub average_interest_rate: Percent,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Share of applications currently approved, as a percentage.
    pub approval_rate: Percent,
    pub pending_applications: usize,
    pub under_review_applications: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplicationAnalytics {
    pub total_applications: usize,
    pub status_distribution: BTreeMap<LoanStatus, usize>,
    pub loan_type_distribution: BTreeMap<LoanType, usize>,
    pub financial_metrics: FinancialMetrics,
    pub performance_metrics: PerformanceMetrics,
}

/// Portfolio statistics over a set of applications. Empty input gives all zeros.
pub fn summarize_applications(
    applications: &[LoanApplication],
) -> ComputationOutput<ApplicationAnalytics> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let analytics = if applications.is_empty() {
        warnings.push("No applications to summarise.".into());
        ApplicationAnalytics::default()
    } else {
        let mut status_distribution: BTreeMap<LoanStatus, usize> = BTreeMap::new();
        let mut loan_type_distribution: BTreeMap<LoanType, usize> = BTreeMap::new();
        let mut total_amount = Decimal::ZERO;
        let mut total_tenure = Decimal::ZERO;
        let mut total_rate = Decimal::ZERO;

        for app in applications {
            let d = &app.details;
            *status_distribution.entry(d.status).or_default() += 1;
            *loan_type_distribution.entry(d.loan_type).or_default() += 1;
            total_amount += d.loan_amount;
            total_tenure += Decimal::from(d.tenure_years);
            total_rate += d.annual_rate_percent;
        }

        let n = Decimal::from(applications.len());
        let count = |s: LoanStatus| status_distribution.get(&s).copied().unwrap_or(0);
        let approved = count(LoanStatus::Approved);

        let performance_metrics = PerformanceMetrics {
            approval_rate: (Decimal::from(approved) / n * dec!(100)).round_dp(2),
            pending_applications: count(LoanStatus::Pending),
            under_review_applications: count(LoanStatus::UnderReview),
        };

        ApplicationAnalytics {
            total_applications: applications.len(),
            financial_metrics: FinancialMetrics {
                total_loan_amount: total_amount.round_dp(2),
                average_loan_amount: (total_amount / n).round_dp(2),
                average_tenure_years: (total_tenure / n).round_dp(1),
                average_interest_rate: (total_rate / n).round_dp(2),
            },
            performance_metrics,
            status_distribution,
            loan_type_distribution,
        }
    };

    tracing::debug!(total = analytics.total_applications, "summarised applications");

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Application portfolio analytics",
        &serde_json::json!({ "approval_rate": "approved / total × 100" }),
        warnings,
        elapsed,
        analytics,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applications::intake::{prepare_application, ApplicationRequest};
    use crate::policy::LendingPolicy;
    use crate::types::EmploymentCategory;
    use chrono::{TimeZone, Utc};

    fn application(id: u64, amount: Money, tenure_years: u32, rate: Percent, status: LoanStatus) -> LoanApplication {
        let request = ApplicationRequest {
            applicant_name: "Amit Patel".into(),
            email: None,
            phone: None,
            loan_type: LoanType::HomeLoan,
            property_value: Some(amount * dec!(2)),
            amount,
            tenure_years,
            annual_rate_percent: rate,
            employment_category: EmploymentCategory::Professional,
            monthly_income: None,
            existing_emi: Decimal::ZERO,
            credit_score: None,
            property_address: None,
            co_applicant_name: None,
            co_applicant_income: None,
        };
        let at = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        let mut details = prepare_application(&request, &LendingPolicy::default(), at)
            .unwrap()
            .result;
        details.status = status;
        LoanApplication { id, details }
    }

    #[test]
    fn test_empty_portfolio_is_all_zero() {
        let out = summarize_applications(&[]);
        assert_eq!(out.result, ApplicationAnalytics::default());
        assert_eq!(out.result.financial_metrics.average_loan_amount, Decimal::ZERO);
    }

    #[test]
    fn test_metrics() {
        let apps = vec![
            application(1, dec!(2_000_000), 20, dec!(8.5), LoanStatus::Approved),
            application(2, dec!(3_000_000), 15, dec!(8.75), LoanStatus::Pending),
            application(3, dec!(4_000_000), 20, dec!(9.0), LoanStatus::Pending),
        ];
        let a = summarize_applications(&apps).result;

        assert_eq!(a.total_applications, 3);
        assert_eq!(a.status_distribution.get(&LoanStatus::Pending), Some(&2));
        assert_eq!(a.loan_type_distribution.get(&LoanType::HomeLoan), Some(&3));
        assert_eq!(a.financial_metrics.total_loan_amount, dec!(9_000_000));
        assert_eq!(a.financial_metrics.average_loan_amount, dec!(3_000_000));
        assert_eq!(a.financial_metrics.average_tenure_years, dec!(18.3));
        assert_eq!(a.financial_metrics.average_interest_rate, dec!(8.75));
        assert_eq!(a.performance_metrics.approval_rate, dec!(33.33));
        assert_eq!(a.performance_metrics.pending_applications, 2);
        assert_eq!(a.performance_metrics.under_review_applications, 0);
    }

    #[test]
    fn test_distribution_serializes_with_wire_names() {
        let apps = vec![application(1, dec!(1_000_000), 10, dec!(8.4), LoanStatus::UnderReview)];
        let json = serde_json::to_value(summarize_applications(&apps).result).unwrap();
        assert_eq!(json["status_distribution"]["under_review"], 1);
        assert_eq!(json["loan_type_distribution"]["home_loan"], 1);
    }
}
