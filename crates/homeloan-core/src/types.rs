use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HomeLoanError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates quoted as percentages (9.2 = 9.2% p.a.), the way lenders publish them.
pub type Percent = Decimal;

/// Plain fractions used by policy knobs (0.5 = half).
pub type Fraction = Decimal;

/// How the applicant earns their income. Drives the income multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentCategory {
    Salaried,
    SelfEmployed,
    Business,
    Professional,
}

impl EmploymentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentCategory::Salaried => "salaried",
            EmploymentCategory::SelfEmployed => "self_employed",
            EmploymentCategory::Business => "business",
            EmploymentCategory::Professional => "professional",
        }
    }
}

impl fmt::Display for EmploymentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmploymentCategory {
    type Err = HomeLoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "salaried" => Ok(EmploymentCategory::Salaried),
            "self_employed" => Ok(EmploymentCategory::SelfEmployed),
            "business" => Ok(EmploymentCategory::Business),
            "professional" => Ok(EmploymentCategory::Professional),
            other => Err(HomeLoanError::invalid(
                "employment_category",
                format!("unrecognised employment category '{other}'"),
            )),
        }
    }
}

/// Loan products a bank may quote a rate for.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    #[default]
    HomeLoan,
    PropertyLoan,
    ConstructionLoan,
    LandPurchaseLoan,
    HomeImprovementLoan,
    BalanceTransfer,
}

impl LoanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanType::HomeLoan => "home_loan",
            LoanType::PropertyLoan => "property_loan",
            LoanType::ConstructionLoan => "construction_loan",
            LoanType::LandPurchaseLoan => "land_purchase_loan",
            LoanType::HomeImprovementLoan => "home_improvement_loan",
            LoanType::BalanceTransfer => "balance_transfer",
        }
    }

    /// Human-readable product name.
    pub fn label(&self) -> &'static str {
        match self {
            LoanType::HomeLoan => "Home Loan",
            LoanType::PropertyLoan => "Property Loan",
            LoanType::ConstructionLoan => "Construction Loan",
            LoanType::LandPurchaseLoan => "Land Purchase Loan",
            LoanType::HomeImprovementLoan => "Home Improvement Loan",
            LoanType::BalanceTransfer => "Balance Transfer",
        }
    }
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanType {
    type Err = HomeLoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "home_loan" | "home" => Ok(LoanType::HomeLoan),
            "property_loan" | "property" => Ok(LoanType::PropertyLoan),
            "construction_loan" | "construction" => Ok(LoanType::ConstructionLoan),
            "land_purchase_loan" | "land_purchase" => Ok(LoanType::LandPurchaseLoan),
            "home_improvement_loan" | "home_improvement" => Ok(LoanType::HomeImprovementLoan),
            "balance_transfer" => Ok(LoanType::BalanceTransfer),
            other => Err(HomeLoanError::invalid(
                "loan_type",
                format!("unrecognised loan type '{other}'"),
            )),
        }
    }
}

/// Inclusive min/max pair used in summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    for warning in &warnings {
        tracing::warn!(methodology, "{warning}");
    }
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employment_category_parses_loose_spellings() {
        assert_eq!(
            "Self-Employed".parse::<EmploymentCategory>().unwrap(),
            EmploymentCategory::SelfEmployed
        );
        assert_eq!(
            " salaried ".parse::<EmploymentCategory>().unwrap(),
            EmploymentCategory::Salaried
        );
    }

    #[test]
    fn test_unknown_employment_category_is_invalid_input() {
        let err = "freelancer".parse::<EmploymentCategory>().unwrap_err();
        match err {
            HomeLoanError::InvalidInput { field, .. } => assert_eq!(field, "employment_category"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_wire_names_are_snake_case() {
        let json = serde_json::to_string(&LoanType::LandPurchaseLoan).unwrap();
        assert_eq!(json, "\"land_purchase_loan\"");
        let back: EmploymentCategory = serde_json::from_str("\"self_employed\"").unwrap();
        assert_eq!(back, EmploymentCategory::SelfEmployed);
    }

    #[test]
    fn test_unknown_loan_type_rejected_by_serde() {
        assert!(serde_json::from_str::<LoanType>("\"car_loan\"").is_err());
    }
}
