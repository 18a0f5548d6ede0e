use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::HomeLoanError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::HomeLoanResult;

/// Longest tenure the calculator accepts.
pub const MAX_TENURE_YEARS: u32 = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single loan to be amortised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanQuote {
    pub principal: Money,
    /// Annual interest rate in percent (9.2 = 9.2% p.a.)
    pub annual_rate_percent: Percent,
    pub tenure_years: u32,
}

/// Equal-instalment amortisation of a [`LoanQuote`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationResult {
    /// Equated monthly instalment
    pub emi: Money,
    pub total_payable: Money,
    pub total_interest: Money,
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub tenure_months: u32,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the EMI, total payable and total interest for a reducing-balance loan.
pub fn compute_amortization(
    quote: &LoanQuote,
) -> HomeLoanResult<ComputationOutput<AmortizationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = amortize(quote)?;

    if quote.annual_rate_percent.is_zero() {
        warnings.push("Zero-rate loan: EMI is straight-line principal repayment.".into());
    }
    if quote.tenure_years > 30 {
        warnings.push(format!(
            "Tenure of {} years exceeds the usual 30-year maximum for home loans.",
            quote.tenure_years
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Reducing-balance EMI (equated monthly instalment)",
        quote,
        warnings,
        elapsed,
        result,
    ))
}

/// Bare amortisation without the computation envelope; used by the comparator
/// and anything else that fans the calculator out.
pub fn amortize(quote: &LoanQuote) -> HomeLoanResult<AmortizationResult> {
    validate_quote(quote)?;

    let monthly_rate = quote.annual_rate_percent / dec!(100) / dec!(12);
    let tenure_months = quote.tenure_years * 12;

    let emi = monthly_installment(quote.principal, monthly_rate, tenure_months)?;
    let total_payable = emi
        .checked_mul(Decimal::from(tenure_months))
        .ok_or_else(|| overflow("total payable"))?;
    let total_interest = total_payable - quote.principal;

    tracing::debug!(
        principal = %quote.principal,
        rate = %quote.annual_rate_percent,
        tenure_months,
        emi = %emi.round_dp(2),
        "amortised loan"
    );

    Ok(AmortizationResult {
        emi: emi.round_dp(2),
        total_payable: total_payable.round_dp(2),
        total_interest: total_interest.round_dp(2),
        principal: quote.principal,
        annual_rate_percent: quote.annual_rate_percent,
        tenure_months,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_quote(quote: &LoanQuote) -> HomeLoanResult<()> {
    if quote.principal <= Decimal::ZERO {
        return Err(HomeLoanError::invalid(
            "principal",
            "Loan principal must be positive.",
        ));
    }
    if quote.annual_rate_percent < Decimal::ZERO {
        return Err(HomeLoanError::invalid(
            "annual_rate_percent",
            "Interest rate cannot be negative.",
        ));
    }
    if quote.tenure_years < 1 {
        return Err(HomeLoanError::invalid(
            "tenure_years",
            "Tenure must be at least one year.",
        ));
    }
    if quote.tenure_years > MAX_TENURE_YEARS {
        return Err(HomeLoanError::invalid(
            "tenure_years",
            format!("Tenure cannot exceed {MAX_TENURE_YEARS} years."),
        ));
    }
    Ok(())
}

fn overflow(what: &str) -> HomeLoanError {
    HomeLoanError::FinancialImpossibility(format!(
        "{what} exceeds the representable range; rate or tenure is too large"
    ))
}

/// Standard fixed-rate instalment: P * r(1+r)^n / ((1+r)^n - 1), unrounded.
fn monthly_installment(
    principal: Money,
    monthly_rate: Decimal,
    total_months: u32,
) -> HomeLoanResult<Money> {
    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(total_months));
    }

    // (1 + r)^n via iterative multiplication
    let growth = Decimal::ONE + monthly_rate;
    let mut compound = Decimal::ONE;
    for _ in 0..total_months {
        compound = compound
            .checked_mul(growth)
            .ok_or_else(|| overflow("compound growth factor"))?;
    }

    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return Err(HomeLoanError::DivisionByZero {
            context: "EMI annuity denominator".into(),
        });
    }

    principal
        .checked_mul(monthly_rate)
        .and_then(|interest| interest.checked_mul(compound / denominator))
        .ok_or_else(|| overflow("monthly instalment"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote(principal: Decimal, rate: Decimal, years: u32) -> LoanQuote {
        LoanQuote {
            principal,
            annual_rate_percent: rate,
            tenure_years: years,
        }
    }

    #[test]
    fn test_emi_ten_lakh_at_9_2_over_15_years() {
        let r = amortize(&quote(dec!(1_000_000), dec!(9.2), 15)).unwrap();
        assert_eq!(r.tenure_months, 180);
        // Closed form gives 10,261.99
        assert!((r.emi - dec!(10262)).abs() <= dec!(1));
        assert!((r.total_payable - r.emi * dec!(180)).abs() < dec!(1));
        assert_eq!(r.total_interest, r.total_payable - r.principal);
    }

    #[test]
    fn test_emi_fifty_lakh_at_8_5_over_20_years() {
        let r = amortize(&quote(dec!(5_000_000), dec!(8.5), 20)).unwrap();
        // 43,391.16 per month
        assert!((r.emi - dec!(43391.16)).abs() <= dec!(0.01));
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let r = amortize(&quote(dec!(1_200_000), Decimal::ZERO, 10)).unwrap();
        assert_eq!(r.emi, dec!(10000));
        assert_eq!(r.total_payable, dec!(1_200_000));
        assert_eq!(r.total_interest, Decimal::ZERO);
    }

    #[test]
    fn test_zero_rate_warning() {
        let out = compute_amortization(&quote(dec!(600_000), Decimal::ZERO, 5)).unwrap();
        assert_eq!(out.result.emi, dec!(10000));
        assert!(out.warnings.iter().any(|w| w.contains("Zero-rate")));
    }

    #[test]
    fn test_emi_strictly_increasing_in_rate() {
        let mut previous = Decimal::ZERO;
        for tenth in 0..=150 {
            let rate = Decimal::from(tenth) / dec!(10);
            let r = amortize(&quote(dec!(2_500_000), rate, 20)).unwrap();
            assert!(r.emi > previous, "EMI did not increase at {rate}%");
            previous = r.emi;
        }
    }

    #[test]
    fn test_deterministic() {
        let q = quote(dec!(3_333_333.33), dec!(8.65), 25);
        assert_eq!(amortize(&q).unwrap(), amortize(&q).unwrap());
    }

    #[test]
    fn test_rejects_non_positive_principal() {
        assert!(matches!(
            amortize(&quote(Decimal::ZERO, dec!(9), 10)),
            Err(HomeLoanError::InvalidInput { ref field, .. }) if field == "principal"
        ));
    }

    #[test]
    fn test_rejects_negative_rate() {
        assert!(amortize(&quote(dec!(100_000), dec!(-0.5), 10)).is_err());
    }

    #[test]
    fn test_rejects_zero_tenure() {
        assert!(matches!(
            amortize(&quote(dec!(100_000), dec!(9), 0)),
            Err(HomeLoanError::InvalidInput { ref field, .. }) if field == "tenure_years"
        ));
    }

    #[test]
    fn test_rejects_tenure_beyond_cap() {
        assert!(matches!(
            amortize(&quote(dec!(1_000_000), dec!(9.2), 1000)),
            Err(HomeLoanError::InvalidInput { ref field, .. }) if field == "tenure_years"
        ));
        assert!(amortize(&quote(dec!(1_000_000), dec!(9.2), MAX_TENURE_YEARS)).is_ok());
    }

    #[test]
    fn test_extreme_rate_is_an_error_not_a_panic() {
        // 1.1^1200 is far outside the decimal range
        assert!(matches!(
            amortize(&quote(dec!(5_000_000), dec!(120), MAX_TENURE_YEARS)),
            Err(HomeLoanError::FinancialImpossibility(_))
        ));
    }

    #[test]
    fn test_huge_principal_overflow_is_an_error() {
        assert!(matches!(
            amortize(&quote(Decimal::MAX, dec!(24), 1)),
            Err(HomeLoanError::FinancialImpossibility(_))
        ));
    }

    #[test]
    fn test_long_tenure_warning() {
        let out = compute_amortization(&quote(dec!(1_000_000), dec!(8.4), 35)).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("35 years")));
    }
}
