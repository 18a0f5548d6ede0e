use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::HomeLoanError;
use crate::types::{LoanType, Percent};
use crate::HomeLoanResult;

/// One lender's published annual rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRate {
    pub bank_name: String,
    pub rates_by_loan_type: BTreeMap<LoanType, Percent>,
}

impl BankRate {
    pub fn new(bank_name: impl Into<String>, rates: &[(LoanType, Percent)]) -> Self {
        Self {
            bank_name: bank_name.into(),
            rates_by_loan_type: rates.iter().copied().collect(),
        }
    }

    pub fn rate_for(&self, loan_type: LoanType) -> Option<Percent> {
        self.rates_by_loan_type.get(&loan_type).copied()
    }
}

/// Reference table of bank rates. Read-only once built; a refreshed table is a
/// new value, never an in-place edit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BankRateTable {
    pub banks: Vec<BankRate>,
}

static PUBLISHED: OnceLock<BankRateTable> = OnceLock::new();

impl BankRateTable {
    pub fn new(banks: Vec<BankRate>) -> Self {
        Self { banks }
    }

    /// Built-in indicative rates, shared for the life of the process.
    pub fn published() -> &'static BankRateTable {
        PUBLISHED.get_or_init(|| {
            use LoanType::*;
            BankRateTable::new(vec![
                BankRate::new(
                    "HDFC Bank",
                    &[(HomeLoan, dec!(8.50)), (PropertyLoan, dec!(9.00)), (ConstructionLoan, dec!(9.25))],
                ),
                BankRate::new(
                    "ICICI Bank",
                    &[(HomeLoan, dec!(8.65)), (PropertyLoan, dec!(9.15)), (ConstructionLoan, dec!(9.40))],
                ),
                BankRate::new(
                    "SBI",
                    &[(HomeLoan, dec!(8.40)), (PropertyLoan, dec!(8.90)), (ConstructionLoan, dec!(9.10))],
                ),
                BankRate::new(
                    "Axis Bank",
                    &[(HomeLoan, dec!(8.75)), (PropertyLoan, dec!(9.25)), (ConstructionLoan, dec!(9.50))],
                ),
                BankRate::new(
                    "Kotak Bank",
                    &[(HomeLoan, dec!(8.55)), (PropertyLoan, dec!(9.05)), (ConstructionLoan, dec!(9.30))],
                ),
                BankRate::new(
                    "PNB",
                    &[(HomeLoan, dec!(8.30)), (PropertyLoan, dec!(8.80)), (ConstructionLoan, dec!(9.00))],
                ),
            ])
        })
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    /// Structural checks for tables loaded from outside the process.
    pub fn validate(&self) -> HomeLoanResult<()> {
        for bank in &self.banks {
            if bank.bank_name.trim().is_empty() {
                return Err(HomeLoanError::invalid("bank_name", "Bank name cannot be blank."));
            }
            if let Some((loan_type, rate)) = bank
                .rates_by_loan_type
                .iter()
                .find(|(_, rate)| rate.is_sign_negative())
            {
                return Err(HomeLoanError::invalid(
                    "rates_by_loan_type",
                    format!("{} quotes a negative {loan_type} rate ({rate}).", bank.bank_name),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_table_has_six_banks() {
        let table = BankRateTable::published();
        assert_eq!(table.len(), 6);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_published_table_is_shared() {
        assert!(std::ptr::eq(BankRateTable::published(), BankRateTable::published()));
    }

    #[test]
    fn test_rate_lookup() {
        let sbi = BankRateTable::published()
            .banks
            .iter()
            .find(|b| b.bank_name == "SBI")
            .unwrap();
        assert_eq!(sbi.rate_for(LoanType::PropertyLoan), Some(dec!(8.90)));
        assert_eq!(sbi.rate_for(LoanType::BalanceTransfer), None);
    }

    #[test]
    fn test_table_round_trips_through_json() {
        let json = serde_json::to_string(BankRateTable::published()).unwrap();
        let back: BankRateTable = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, BankRateTable::published());
    }

    #[test]
    fn test_negative_rate_rejected() {
        let table = BankRateTable::new(vec![BankRate::new("Bad", &[(LoanType::HomeLoan, dec!(-1))])]);
        assert!(table.validate().is_err());
    }
}
