use homeloan_core::loans::comparison::{compare_banks, compare_published_banks, ComparisonInput};
use homeloan_core::loans::eligibility::{
    assess_eligibility, check_eligibility, EligibilityAssessmentInput, EligibilityInput,
};
use homeloan_core::loans::emi::{compute_amortization, LoanQuote};
use homeloan_core::loans::rates::{BankRate, BankRateTable};
use homeloan_core::{EmploymentCategory, HomeLoanError, LendingPolicy, LoanType};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// EMI
// ===========================================================================

#[test]
fn test_emi_reference_loan() {
    let out = compute_amortization(&LoanQuote {
        principal: dec!(1_000_000),
        annual_rate_percent: dec!(9.2),
        tenure_years: 15,
    })
    .unwrap();
    let r = &out.result;

    assert_eq!(r.tenure_months, 180);
    assert!((r.emi - dec!(10262)).abs() <= dec!(1), "emi was {}", r.emi);
    assert!((r.total_payable - r.emi * dec!(180)).abs() <= dec!(1));
    assert_eq!(r.total_interest, r.total_payable - r.principal);
    assert!(out.warnings.is_empty());
}

#[test]
fn test_emi_zero_rate_is_straight_line() {
    let out = compute_amortization(&LoanQuote {
        principal: dec!(1_200_000),
        annual_rate_percent: Decimal::ZERO,
        tenure_years: 10,
    })
    .unwrap();
    assert_eq!(out.result.emi, dec!(10000));
    assert_eq!(out.result.total_interest, Decimal::ZERO);
    assert_eq!(out.warnings.len(), 1);
}

#[test]
fn test_emi_rejects_zero_tenure() {
    let err = compute_amortization(&LoanQuote {
        principal: dec!(1_000_000),
        annual_rate_percent: dec!(8.5),
        tenure_years: 0,
    })
    .unwrap_err();
    assert!(matches!(err, HomeLoanError::InvalidInput { ref field, .. } if field == "tenure_years"));
}

#[test]
fn test_emi_rejects_millennial_tenure() {
    let err = compute_amortization(&LoanQuote {
        principal: dec!(1_000_000),
        annual_rate_percent: dec!(9.2),
        tenure_years: 1000,
    })
    .unwrap_err();
    assert!(matches!(err, HomeLoanError::InvalidInput { ref field, .. } if field == "tenure_years"));
}

// ===========================================================================
// Eligibility
// ===========================================================================

fn applicant(income: Decimal, obligation: Decimal, score: Option<u32>) -> EligibilityInput {
    EligibilityInput {
        monthly_income: income,
        existing_monthly_obligation: obligation,
        employment_category: EmploymentCategory::Salaried,
        credit_score: score,
    }
}

#[test]
fn test_eligibility_credit_swing() {
    let policy = LendingPolicy::default();
    let good = check_eligibility(&applicant(dec!(100_000), dec!(10_000), Some(760)), &policy)
        .unwrap()
        .result;
    let poor = check_eligibility(&applicant(dec!(100_000), dec!(10_000), Some(600)), &policy)
        .unwrap()
        .result;

    // available = 50,000 - 10,000 = 40,000; multipliers 70 vs 50
    assert_eq!(good.available_income, dec!(40_000));
    assert_eq!(good.max_loan_amount, dec!(2_800_000));
    assert_eq!(poor.max_loan_amount, dec!(2_000_000));
    assert_eq!(good.max_loan_amount - poor.max_loan_amount, dec!(20) * dec!(40_000));
    assert!(good.is_eligible && poor.is_eligible);
}

#[test]
fn test_overcommitted_applicant_never_eligible() {
    let policy = LendingPolicy::default();
    for score in [None, Some(600), Some(720), Some(820)] {
        let r = check_eligibility(&applicant(dec!(20_000), dec!(15_000), score), &policy)
            .unwrap()
            .result;
        assert_eq!(r.available_income, dec!(-5_000));
        assert!(!r.is_eligible);
    }
}

#[test]
fn test_assessment_caps_at_ltv() {
    let input = EligibilityAssessmentInput {
        applicant: applicant(dec!(300_000), Decimal::ZERO, Some(780)),
        property_value: dec!(5_000_000),
        requested_loan_amount: dec!(4_500_000),
    };
    let out = assess_eligibility(&input, &LendingPolicy::default()).unwrap();
    let a = &out.result;

    assert_eq!(a.ltv_analysis.requested_ltv_percent, dec!(90));
    assert!(!a.ltv_analysis.ltv_compliant);
    assert_eq!(a.ltv_analysis.max_loan_on_property, dec!(4_000_000));
    assert_eq!(a.recommendation.recommended_loan_amount, dec!(4_000_000));
    assert!(!a.recommendation.eligible);
}

// ===========================================================================
// Comparison
// ===========================================================================

#[test]
fn test_published_comparison_ordering() {
    let out = compare_published_banks(&ComparisonInput {
        loan_amount: dec!(5_000_000),
        tenure_years: 20,
        requested_rate_percent: None,
        loan_type: LoanType::HomeLoan,
    })
    .unwrap();
    let r = &out.result;

    assert_eq!(r.options.len(), 6);
    assert!(r.options.windows(2).all(|w| w[0].emi <= w[1].emi));
    assert_eq!(r.options[0].bank_name, "PNB");
    assert_eq!(r.recommendations.best_emi.bank_name, r.options[0].bank_name);
    assert!(r.recommendations.best_emi.savings_vs_highest >= Decimal::ZERO);
    // 0.5% of 5M = 25,000, under the cap
    assert_eq!(r.options[0].processing_fee, dec!(25_000));
}

#[test]
fn test_comparison_fee_cap_applies() {
    let out = compare_published_banks(&ComparisonInput {
        loan_amount: dec!(20_000_000),
        tenure_years: 25,
        requested_rate_percent: None,
        loan_type: LoanType::PropertyLoan,
    })
    .unwrap();
    assert!(out.result.options.iter().all(|o| o.processing_fee == dec!(50_000)));
}

#[test]
fn test_comparison_missing_rate_is_reference_error() {
    let table = BankRateTable::new(vec![BankRate::new("Only Home", &[(LoanType::HomeLoan, dec!(8.4))])]);
    let err = compare_banks(
        &ComparisonInput {
            loan_amount: dec!(1_000_000),
            tenure_years: 10,
            requested_rate_percent: None,
            loan_type: LoanType::ConstructionLoan,
        },
        &table,
        &LendingPolicy::default(),
    )
    .unwrap_err();
    assert!(matches!(err, HomeLoanError::ReferenceDataMissing(_)));
}

#[test]
fn test_comparison_is_deterministic() {
    let input = ComparisonInput {
        loan_amount: dec!(3_500_000),
        tenure_years: 15,
        requested_rate_percent: Some(dec!(8.8)),
        loan_type: LoanType::HomeLoan,
    };
    let a = compare_published_banks(&input).unwrap().result;
    let b = compare_published_banks(&input).unwrap().result;
    assert_eq!(a, b);
}

#[test]
fn test_comparison_at_extreme_rate_fails_cleanly() {
    let err = compare_published_banks(&ComparisonInput {
        loan_amount: dec!(5_000_000),
        tenure_years: 100,
        requested_rate_percent: Some(dec!(120)),
        loan_type: LoanType::HomeLoan,
    })
    .unwrap_err();
    assert!(matches!(err, HomeLoanError::FinancialImpossibility(_)));
}
