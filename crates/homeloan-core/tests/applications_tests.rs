#![cfg(feature = "applications")]

use chrono::{TimeZone, Utc};
use homeloan_core::applications::analytics::summarize_applications;
use homeloan_core::applications::consultation::{triage_consultation, ConsultationRequest, Priority};
use homeloan_core::applications::intake::{prepare_application, ApplicationRequest, LoanStatus};
use homeloan_core::applications::repository::{
    ApplicationFilter, ApplicationRepository, ConsultationRepository,
    InMemoryApplicationRepository, InMemoryConsultationRepository,
};
use homeloan_core::{LendingPolicy, LoanType};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn submit(repo: &InMemoryApplicationRepository, json: &str) -> u64 {
    let request: ApplicationRequest = serde_json::from_str(json).unwrap();
    let at = Utc.with_ymd_and_hms(2024, 10, 1, 11, 0, 0).unwrap();
    let details = prepare_application(&request, &LendingPolicy::default(), at)
        .unwrap()
        .result;
    repo.insert(details).unwrap().id
}

#[test]
fn test_application_lifecycle_feeds_analytics() {
    let repo = InMemoryApplicationRepository::new();
    let a = submit(
        &repo,
        r#"{ "applicant_name": "Sunita Rao", "amount": "4000000", "tenure_years": 20,
             "annual_rate_percent": "8.5", "property_value": "6000000" }"#,
    );
    let b = submit(
        &repo,
        r#"{ "amount": "15000000", "tenure_years": 25, "annual_rate_percent": "9",
             "loan_type": "property_loan", "property_value": "20000000" }"#,
    );

    let b_app = repo.fetch(b).unwrap().unwrap();
    assert_eq!(b_app.details.status, LoanStatus::UnderReview);
    assert_eq!(b_app.details.applicant_name, "Guest User");
    assert_eq!(b_app.details.processing_fee, dec!(150_000));

    let at = Utc.with_ymd_and_hms(2024, 10, 3, 16, 0, 0).unwrap();
    let change = repo.update_status(a, LoanStatus::Approved, None, at).unwrap();
    assert_eq!(change.old_status, LoanStatus::Pending);

    let approved = repo
        .list(
            &ApplicationFilter {
                status: Some(LoanStatus::Approved),
                loan_type: Some(LoanType::HomeLoan),
            },
            100,
        )
        .unwrap();
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].details.approval_date, Some(at));

    let analytics = summarize_applications(&repo.all().unwrap()).result;
    assert_eq!(analytics.total_applications, 2);
    assert_eq!(analytics.performance_metrics.approval_rate, dec!(50));
    assert_eq!(analytics.performance_metrics.under_review_applications, 1);
    assert_eq!(analytics.financial_metrics.average_loan_amount, dec!(9_500_000));
    assert_eq!(analytics.financial_metrics.average_tenure_years, dec!(22.5));
}

#[test]
fn test_consultations_are_prioritised_and_summarised() {
    let repo = InMemoryConsultationRepository::new();
    let policy = LendingPolicy::default();
    let at = Utc.with_ymd_and_hms(2024, 10, 4, 18, 30, 0).unwrap();

    for (amount, budget) in [
        (dec!(6_500_000), dec!(8_000_000)),
        (dec!(3_000_000), dec!(5_000_000)),
        (dec!(1_500_000), dec!(2_500_000)),
    ] {
        let request = ConsultationRequest {
            name: "Karan Mehta".into(),
            phone: Some("+91-99000-11111".into()),
            email: None,
            preferred_time: None,
            message: Some("Need help with a first home".into()),
            savings: budget - amount,
            emi: dec!(25_000),
            loan_tenure_years: 20,
            loan_amount: amount,
            total_budget: budget,
        };
        let triage = triage_consultation(&request, &policy).unwrap().result;
        repo.insert(request, triage, at).unwrap();
    }

    let records = repo.all().unwrap();
    let priorities: Vec<Priority> = records.iter().map(|r| r.triage.priority).collect();
    assert_eq!(priorities, vec![Priority::High, Priority::Medium, Priority::Standard]);
    // 6.5M of 8M is 81.25%
    assert!(records[0].triage.recommendation.starts_with("High LTV"));

    let summary = repo.summary().unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.pending, 3);
    assert_eq!(summary.high_priority, 1);
    assert_eq!(summary.average_loan_amount, dec!(3_666_666.67));
}
