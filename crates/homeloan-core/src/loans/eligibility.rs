use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::HomeLoanError;
use crate::policy::LendingPolicy;
use crate::types::{with_metadata, ComputationOutput, EmploymentCategory, Money, Percent};
use crate::HomeLoanResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityInput {
    pub monthly_income: Money,
    /// EMIs and other fixed monthly debts already being serviced.
    #[serde(default)]
    pub existing_monthly_obligation: Money,
    pub employment_category: EmploymentCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_score: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub is_eligible: bool,
    pub max_loan_amount: Money,
    /// Ceiling EMI the applicant can service; equal to available income.
    pub max_monthly_emi: Money,
    pub available_income: Money,
    /// Months of available income lent, after the credit-score adjustment.
    pub income_multiplier: i32,
    pub credit_score: Option<u32>,
}

/// Eligibility request tied to a specific property and loan ask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityAssessmentInput {
    #[serde(flatten)]
    pub applicant: EligibilityInput,
    pub property_value: Money,
    pub requested_loan_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LtvAnalysis {
    pub requested_ltv_percent: Percent,
    pub max_allowed_ltv_percent: Percent,
    pub ltv_compliant: bool,
    pub max_loan_on_property: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecommendation {
    pub eligible: bool,
    pub recommended_loan_amount: Money,
    pub recommended_emi: Money,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityAssessment {
    pub eligibility: EligibilityResult,
    pub ltv_analysis: LtvAnalysis,
    pub recommendation: LoanRecommendation,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive the maximum loan and EMI an applicant can carry under the lending policy.
///
/// Available income is `income_share` of monthly income (50% by default) less
/// existing obligations. The loan ceiling is that figure times the employment
/// multiplier, adjusted by credit-score band.
pub fn check_eligibility(
    input: &EligibilityInput,
    policy: &LendingPolicy,
) -> HomeLoanResult<ComputationOutput<EligibilityResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = evaluate(input, policy)?;
    collect_warnings(&result, policy, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "income_share": policy.income_share.to_string(),
        "base_multiplier": policy.income_multipliers.for_category(input.employment_category),
        "minimum_loan_amount": policy.minimum_loan_amount.to_string(),
    });

    Ok(with_metadata(
        "Income-multiplier loan eligibility",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

/// Eligibility plus an LTV check against the property being financed.
pub fn assess_eligibility(
    input: &EligibilityAssessmentInput,
    policy: &LendingPolicy,
) -> HomeLoanResult<ComputationOutput<EligibilityAssessment>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.property_value <= Decimal::ZERO {
        return Err(HomeLoanError::invalid(
            "property_value",
            "Property value must be positive.",
        ));
    }
    if input.requested_loan_amount <= Decimal::ZERO {
        return Err(HomeLoanError::invalid(
            "requested_loan_amount",
            "Requested loan amount must be positive.",
        ));
    }

    let eligibility = evaluate(&input.applicant, policy)?;
    collect_warnings(&eligibility, policy, &mut warnings);

    let requested_ltv = input.requested_loan_amount / input.property_value * dec!(100);
    let ltv_compliant = requested_ltv <= policy.max_ltv_percent;
    let max_loan_on_property = input.property_value * policy.max_ltv_percent / dec!(100);

    if !ltv_compliant {
        warnings.push(format!(
            "Requested LTV {}% exceeds the {}% maximum.",
            requested_ltv.round_dp(2),
            policy.max_ltv_percent
        ));
    }

    let recommended_loan_amount = eligibility
        .max_loan_amount
        .min(max_loan_on_property)
        .max(Decimal::ZERO);

    let ltv_analysis = LtvAnalysis {
        requested_ltv_percent: requested_ltv.round_dp(2),
        max_allowed_ltv_percent: policy.max_ltv_percent,
        ltv_compliant,
        max_loan_on_property: max_loan_on_property.round_dp(2),
    };

    let recommendation = LoanRecommendation {
        eligible: eligibility.is_eligible && ltv_compliant,
        recommended_loan_amount: recommended_loan_amount.round_dp(2),
        recommended_emi: eligibility.max_monthly_emi,
        suggestions: vec![
            "Maintain good credit score for better rates".into(),
            "Consider co-applicant to increase eligibility".into(),
            "Reduce existing EMIs if possible".into(),
        ],
    };

    let output = EligibilityAssessment {
        eligibility,
        ltv_analysis,
        recommendation,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Income-multiplier eligibility with LTV cap",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn evaluate(input: &EligibilityInput, policy: &LendingPolicy) -> HomeLoanResult<EligibilityResult> {
    validate_input(input)?;

    let available_income =
        input.monthly_income * policy.income_share - input.existing_monthly_obligation;

    let multiplier = policy.income_multipliers.for_category(input.employment_category)
        + policy.credit_score_bands.adjustment(input.credit_score);

    let max_loan_amount = available_income * Decimal::from(multiplier);

    let is_eligible =
        available_income > Decimal::ZERO && max_loan_amount > policy.minimum_loan_amount;

    tracing::debug!(
        category = %input.employment_category,
        available = %available_income,
        multiplier,
        is_eligible,
        "evaluated eligibility"
    );

    Ok(EligibilityResult {
        is_eligible,
        max_loan_amount: max_loan_amount.round_dp(2),
        max_monthly_emi: available_income.round_dp(2),
        available_income: available_income.round_dp(2),
        income_multiplier: multiplier,
        credit_score: input.credit_score,
    })
}

fn collect_warnings(result: &EligibilityResult, policy: &LendingPolicy, warnings: &mut Vec<String>) {
    if result.available_income <= Decimal::ZERO {
        warnings.push(
            "Existing obligations consume the entire serviceable income; no EMI capacity remains."
                .into(),
        );
    } else if !result.is_eligible {
        warnings.push(format!(
            "Maximum loan {} does not exceed the {} minimum.",
            result.max_loan_amount, policy.minimum_loan_amount
        ));
    }
    if let Some(score) = result.credit_score {
        if score < policy.credit_score_bands.poor_below {
            warnings.push(format!(
                "Credit score {score} is below {}; the income multiplier was reduced.",
                policy.credit_score_bands.poor_below
            ));
        }
    }
}

fn validate_input(input: &EligibilityInput) -> HomeLoanResult<()> {
    if input.monthly_income < Decimal::ZERO {
        return Err(HomeLoanError::invalid(
            "monthly_income",
            "Monthly income cannot be negative.",
        ));
    }
    if input.existing_monthly_obligation < Decimal::ZERO {
        return Err(HomeLoanError::invalid(
            "existing_monthly_obligation",
            "Existing obligations cannot be negative.",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn applicant(category: EmploymentCategory, score: Option<u32>) -> EligibilityInput {
        EligibilityInput {
            monthly_income: dec!(100_000),
            existing_monthly_obligation: dec!(10_000),
            employment_category: category,
            credit_score: score,
        }
    }

    #[test]
    fn test_salaried_without_score() {
        let out = check_eligibility(
            &applicant(EmploymentCategory::Salaried, None),
            &LendingPolicy::default(),
        )
        .unwrap();
        let r = &out.result;
        // 100k * 0.5 - 10k = 40k
        assert_eq!(r.available_income, dec!(40000));
        assert_eq!(r.max_monthly_emi, dec!(40000));
        assert_eq!(r.income_multiplier, 60);
        assert_eq!(r.max_loan_amount, dec!(2_400_000));
        assert!(r.is_eligible);
    }

    #[test]
    fn test_base_multiplier_per_category() {
        let policy = LendingPolicy::default();
        let expect = [
            (EmploymentCategory::Salaried, 60),
            (EmploymentCategory::SelfEmployed, 55),
            (EmploymentCategory::Business, 50),
            (EmploymentCategory::Professional, 50),
        ];
        for (category, multiplier) in expect {
            let r = evaluate(&applicant(category, Some(680)), &policy).unwrap();
            assert_eq!(r.income_multiplier, multiplier, "{category}");
        }
    }

    #[test]
    fn test_obligations_exceed_half_income() {
        let input = EligibilityInput {
            monthly_income: dec!(20_000),
            existing_monthly_obligation: dec!(15_000),
            employment_category: EmploymentCategory::Salaried,
            credit_score: Some(820),
        };
        let out = check_eligibility(&input, &LendingPolicy::default()).unwrap();
        assert_eq!(out.result.available_income, dec!(-5000));
        assert!(!out.result.is_eligible);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_credit_score_swing_is_twenty_months() {
        let policy = LendingPolicy::default();
        let high = evaluate(&applicant(EmploymentCategory::Salaried, Some(760)), &policy).unwrap();
        let low = evaluate(&applicant(EmploymentCategory::Salaried, Some(600)), &policy).unwrap();
        assert_eq!(high.income_multiplier, 70);
        assert_eq!(low.income_multiplier, 50);
        assert_eq!(
            high.max_loan_amount - low.max_loan_amount,
            dec!(20) * high.available_income
        );
    }

    #[test]
    fn test_floor_is_strict() {
        // 25k available * 50 lands exactly on the floor
        let policy = LendingPolicy {
            minimum_loan_amount: dec!(1_250_000),
            ..LendingPolicy::default()
        };
        let input = EligibilityInput {
            monthly_income: dec!(50_000),
            existing_monthly_obligation: Decimal::ZERO,
            employment_category: EmploymentCategory::Business,
            credit_score: None,
        };
        let r = evaluate(&input, &policy).unwrap();
        assert_eq!(r.max_loan_amount, dec!(1_250_000));
        assert!(!r.is_eligible);
    }

    #[test]
    fn test_negative_income_rejected() {
        let mut input = applicant(EmploymentCategory::Salaried, None);
        input.monthly_income = dec!(-1);
        assert!(check_eligibility(&input, &LendingPolicy::default()).is_err());
    }

    #[test]
    fn test_assessment_ltv_compliant() {
        let input = EligibilityAssessmentInput {
            applicant: applicant(EmploymentCategory::Salaried, Some(780)),
            property_value: dec!(5_000_000),
            requested_loan_amount: dec!(3_500_000),
        };
        let out = assess_eligibility(&input, &LendingPolicy::default()).unwrap();
        let a = &out.result;
        assert_eq!(a.ltv_analysis.requested_ltv_percent, dec!(70));
        assert!(a.ltv_analysis.ltv_compliant);
        assert_eq!(a.ltv_analysis.max_loan_on_property, dec!(4_000_000));
        // 40k * 70 = 2.8M < 4M
        assert_eq!(a.recommendation.recommended_loan_amount, dec!(2_800_000));
        assert!(a.recommendation.eligible);
    }

    #[test]
    fn test_assessment_ltv_breach() {
        let input = EligibilityAssessmentInput {
            applicant: applicant(EmploymentCategory::Salaried, None),
            property_value: dec!(2_000_000),
            requested_loan_amount: dec!(1_900_000),
        };
        let out = assess_eligibility(&input, &LendingPolicy::default()).unwrap();
        assert!(!out.result.ltv_analysis.ltv_compliant);
        assert!(!out.result.recommendation.eligible);
        assert_eq!(out.result.recommendation.recommended_loan_amount, dec!(1_600_000));
        assert!(out.warnings.iter().any(|w| w.contains("LTV")));
    }

    #[test]
    fn test_assessment_rejects_zero_property_value() {
        let input = EligibilityAssessmentInput {
            applicant: applicant(EmploymentCategory::Salaried, None),
            property_value: Decimal::ZERO,
            requested_loan_amount: dec!(1_000_000),
        };
        assert!(assess_eligibility(&input, &LendingPolicy::default()).is_err());
    }
}
