//! Lending policy: every business constant the engine applies.
//!
//! Defaults reproduce the marketplace's published rules. A policy file only
//! needs to name the knobs it overrides; everything else falls back to
//! [`LendingPolicy::default`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::HomeLoanError;
use crate::types::{EmploymentCategory, Fraction, Money, Percent};
use crate::HomeLoanResult;

/// Months of available income a lender is assumed to advance, per employment category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeMultipliers {
    pub salaried: i32,
    pub self_employed: i32,
    pub business: i32,
    pub professional: i32,
}

impl Default for IncomeMultipliers {
    fn default() -> Self {
        Self {
            salaried: 60,
            self_employed: 55,
            business: 50,
            professional: 50,
        }
    }
}

impl IncomeMultipliers {
    pub fn for_category(&self, category: EmploymentCategory) -> i32 {
        match category {
            EmploymentCategory::Salaried => self.salaried,
            EmploymentCategory::SelfEmployed => self.self_employed,
            EmploymentCategory::Business => self.business,
            EmploymentCategory::Professional => self.professional,
        }
    }
}

/// Credit-score bands and the multiplier swing each one earns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditScoreBands {
    pub excellent_min: u32,
    pub excellent_bonus: i32,
    pub good_min: u32,
    pub good_bonus: i32,
    /// Scores strictly below this are penalised.
    pub poor_below: u32,
    pub poor_penalty: i32,
}

impl Default for CreditScoreBands {
    fn default() -> Self {
        Self {
            excellent_min: 750,
            excellent_bonus: 10,
            good_min: 700,
            good_bonus: 5,
            poor_below: 650,
            poor_penalty: 10,
        }
    }
}

impl CreditScoreBands {
    /// Multiplier adjustment for a score; no score means no adjustment.
    pub fn adjustment(&self, score: Option<u32>) -> i32 {
        match score {
            Some(s) if s >= self.excellent_min => self.excellent_bonus,
            Some(s) if s >= self.good_min => self.good_bonus,
            Some(s) if s < self.poor_below => -self.poor_penalty,
            _ => 0,
        }
    }
}

/// Thresholds used to prioritise expert consultations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsultationThresholds {
    pub high_priority_above: Money,
    pub medium_priority_above: Money,
    /// LTV (percent) above which alternative financing is advised.
    pub high_ltv_percent: Percent,
    /// EMI above this share of savings triggers detailed planning advice.
    pub emi_to_savings_ceiling: Fraction,
}

impl Default for ConsultationThresholds {
    fn default() -> Self {
        Self {
            high_priority_above: dec!(5_000_000),
            medium_priority_above: dec!(2_000_000),
            high_ltv_percent: dec!(80),
            emi_to_savings_ceiling: dec!(0.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingPolicy {
    /// Share of monthly income that may go to loan servicing (the 50% rule).
    pub income_share: Fraction,
    pub income_multipliers: IncomeMultipliers,
    pub credit_score_bands: CreditScoreBands,
    /// Eligibility requires the computed maximum loan to exceed this floor.
    pub minimum_loan_amount: Money,
    pub max_ltv_percent: Percent,
    pub processing_fee_percent: Percent,
    pub processing_fee_cap: Money,
    /// Lower edge of the property search band as a fraction of budget.
    pub budget_floor_factor: Fraction,
    /// Upper edge of the property search band as a fraction of budget.
    pub budget_ceiling_factor: Fraction,
    pub insufficient_savings_penalty: i32,
    pub over_budget_penalty: i32,
    pub application_fee_percent: Percent,
    /// Applications above this amount start in review instead of pending.
    pub review_threshold: Money,
    /// Assumed property value per unit of loan when the applicant gives none (≈75% LTV).
    pub default_property_value_multiplier: Decimal,
    pub consultation: ConsultationThresholds,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            income_share: dec!(0.5),
            income_multipliers: IncomeMultipliers::default(),
            credit_score_bands: CreditScoreBands::default(),
            minimum_loan_amount: dec!(500_000),
            max_ltv_percent: dec!(80),
            processing_fee_percent: dec!(0.5),
            processing_fee_cap: dec!(50_000),
            budget_floor_factor: dec!(0.8),
            budget_ceiling_factor: dec!(1.1),
            insufficient_savings_penalty: 30,
            over_budget_penalty: 20,
            application_fee_percent: dec!(1),
            review_threshold: dec!(10_000_000),
            default_property_value_multiplier: dec!(1.33),
            consultation: ConsultationThresholds::default(),
        }
    }
}

impl LendingPolicy {
    /// Reject policies that would make the engine produce nonsense.
    pub fn validate(&self) -> HomeLoanResult<()> {
        if self.income_share <= Decimal::ZERO || self.income_share > Decimal::ONE {
            return Err(HomeLoanError::invalid(
                "income_share",
                "Income share must be in (0, 1].",
            ));
        }
        if self.minimum_loan_amount < Decimal::ZERO {
            return Err(HomeLoanError::invalid(
                "minimum_loan_amount",
                "Minimum loan amount cannot be negative.",
            ));
        }
        if self.max_ltv_percent <= Decimal::ZERO || self.max_ltv_percent > dec!(100) {
            return Err(HomeLoanError::invalid(
                "max_ltv_percent",
                "Maximum LTV must be in (0, 100].",
            ));
        }
        if self.processing_fee_percent < Decimal::ZERO || self.application_fee_percent < Decimal::ZERO
        {
            return Err(HomeLoanError::invalid(
                "processing_fee_percent",
                "Fee percentages cannot be negative.",
            ));
        }
        if self.processing_fee_cap < Decimal::ZERO {
            return Err(HomeLoanError::invalid(
                "processing_fee_cap",
                "Processing fee cap cannot be negative.",
            ));
        }
        if self.budget_floor_factor < Decimal::ZERO
            || self.budget_floor_factor > self.budget_ceiling_factor
        {
            return Err(HomeLoanError::invalid(
                "budget_floor_factor",
                "Budget band floor must be non-negative and not above the ceiling.",
            ));
        }
        if self.default_property_value_multiplier < Decimal::ONE {
            return Err(HomeLoanError::invalid(
                "default_property_value_multiplier",
                "Assumed property value cannot be below the loan amount.",
            ));
        }
        if self.consultation.medium_priority_above > self.consultation.high_priority_above {
            return Err(HomeLoanError::invalid(
                "consultation.medium_priority_above",
                "Medium priority threshold must not exceed the high priority threshold.",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        assert!(LendingPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_credit_adjustment_bands() {
        let bands = CreditScoreBands::default();
        assert_eq!(bands.adjustment(Some(800)), 10);
        assert_eq!(bands.adjustment(Some(750)), 10);
        assert_eq!(bands.adjustment(Some(749)), 5);
        assert_eq!(bands.adjustment(Some(700)), 5);
        assert_eq!(bands.adjustment(Some(699)), 0);
        assert_eq!(bands.adjustment(Some(650)), 0);
        assert_eq!(bands.adjustment(Some(649)), -10);
        assert_eq!(bands.adjustment(None), 0);
    }

    #[test]
    fn test_partial_policy_overrides_only_named_fields() {
        let json = r#"{ "minimum_loan_amount": "750000", "income_multipliers": { "salaried": 65 } }"#;
        let policy: LendingPolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy.minimum_loan_amount, dec!(750000));
        assert_eq!(policy.income_multipliers.salaried, 65);
        assert_eq!(policy.income_multipliers.self_employed, 55);
        assert_eq!(policy.income_share, dec!(0.5));
        assert_eq!(policy.processing_fee_cap, dec!(50000));
    }

    #[test]
    fn test_inverted_budget_band_rejected() {
        let policy = LendingPolicy {
            budget_floor_factor: dec!(1.2),
            ..LendingPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_zero_income_share_rejected() {
        let policy = LendingPolicy {
            income_share: Decimal::ZERO,
            ..LendingPolicy::default()
        };
        assert!(policy.validate().is_err());
    }
}
