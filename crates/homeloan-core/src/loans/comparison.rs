use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::HomeLoanError;
use crate::loans::emi::{amortize, LoanQuote, MAX_TENURE_YEARS};
use crate::loans::rates::BankRateTable;
use crate::policy::LendingPolicy;
use crate::types::{with_metadata, ComputationOutput, LoanType, Money, Percent, Range};
use crate::HomeLoanResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub loan_amount: Money,
    pub tenure_years: u32,
    /// Quote every bank at this rate instead of its published one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_rate_percent: Option<Percent>,
    #[serde(default)]
    pub loan_type: LoanType,
}

/// One bank's quote for the requested loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanOption {
    pub bank_name: String,
    pub loan_type: LoanType,
    pub annual_rate_percent: Percent,
    pub emi: Money,
    pub total_payable: Money,
    pub total_interest: Money,
    pub tenure_months: u32,
    pub processing_fee: Money,
    pub processing_fee_percent: Percent,
}

/// Best bank on one metric and how much it saves against the worst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPick {
    pub bank_name: String,
    pub value: Money,
    pub savings_vs_highest: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub best_emi: BestPick,
    pub best_total_cost: BestPick,
    pub best_processing_fee: BestPick,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub banks_compared: usize,
    pub average_emi: Money,
    pub emi_range: Range<Money>,
    pub rate_range: Range<Percent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub loan_amount: Money,
    pub tenure_years: u32,
    pub requested_rate_percent: Option<Percent>,
    /// Sorted ascending by EMI, ties by bank name.
    pub options: Vec<LoanOption>,
    pub recommendations: Recommendations,
    pub market_analysis: MarketAnalysis,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Quote the loan at every bank in `table` and rank the results.
pub fn compare_banks(
    input: &ComparisonInput,
    table: &BankRateTable,
    policy: &LendingPolicy,
) -> HomeLoanResult<ComputationOutput<ComparisonResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    if table.is_empty() {
        return Err(HomeLoanError::ReferenceDataMissing(
            "bank rate table is empty; no comparison possible".into(),
        ));
    }

    let processing_fee = (input.loan_amount * policy.processing_fee_percent / dec!(100))
        .min(policy.processing_fee_cap)
        .round_dp(2);

    let mut options = Vec::with_capacity(table.len());
    for bank in &table.banks {
        let rate = match input.requested_rate_percent {
            Some(rate) => rate,
            None => bank.rate_for(input.loan_type).ok_or_else(|| {
                HomeLoanError::ReferenceDataMissing(format!(
                    "{} publishes no {} rate; no comparison possible",
                    bank.bank_name, input.loan_type
                ))
            })?,
        };

        let amortization = amortize(&LoanQuote {
            principal: input.loan_amount,
            annual_rate_percent: rate,
            tenure_years: input.tenure_years,
        })?;

        options.push(LoanOption {
            bank_name: bank.bank_name.clone(),
            loan_type: input.loan_type,
            annual_rate_percent: rate,
            emi: amortization.emi,
            total_payable: amortization.total_payable,
            total_interest: amortization.total_interest,
            tenure_months: amortization.tenure_months,
            processing_fee,
            processing_fee_percent: policy.processing_fee_percent,
        });
    }

    options.sort_by(|a, b| a.emi.cmp(&b.emi).then_with(|| a.bank_name.cmp(&b.bank_name)));

    let recommendations = Recommendations {
        best_emi: best_pick(&options, |o| o.emi),
        best_total_cost: best_pick(&options, |o| o.total_payable),
        best_processing_fee: best_pick(&options, |o| o.processing_fee),
    };

    let market_analysis = analyse_market(&options);

    if input.requested_rate_percent.is_some() {
        warnings.push(
            "A requested rate was applied to every bank; options differ only by fees.".into(),
        );
    }
    if processing_fee == policy.processing_fee_cap {
        warnings.push(format!(
            "Processing fee capped at {}.",
            policy.processing_fee_cap
        ));
    }

    tracing::debug!(
        banks = options.len(),
        best = %recommendations.best_emi.bank_name,
        "compared bank quotes"
    );

    let output = ComparisonResult {
        loan_amount: input.loan_amount,
        tenure_years: input.tenure_years,
        requested_rate_percent: input.requested_rate_percent,
        options,
        recommendations,
        market_analysis,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "loan_type": input.loan_type,
        "processing_fee_percent": policy.processing_fee_percent.to_string(),
        "processing_fee_cap": policy.processing_fee_cap.to_string(),
    });

    Ok(with_metadata(
        "Multi-bank EMI comparison",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// [`compare_banks`] against the built-in rate table and default policy.
pub fn compare_published_banks(
    input: &ComparisonInput,
) -> HomeLoanResult<ComputationOutput<ComparisonResult>> {
    compare_banks(input, BankRateTable::published(), &LendingPolicy::default())
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_input(input: &ComparisonInput) -> HomeLoanResult<()> {
    if input.loan_amount <= Decimal::ZERO {
        return Err(HomeLoanError::invalid(
            "loan_amount",
            "Loan amount must be positive.",
        ));
    }
    if input.tenure_years < 1 {
        return Err(HomeLoanError::invalid(
            "tenure_years",
            "Tenure must be at least one year.",
        ));
    }
    if input.tenure_years > MAX_TENURE_YEARS {
        return Err(HomeLoanError::invalid(
            "tenure_years",
            format!("Tenure cannot exceed {MAX_TENURE_YEARS} years."),
        ));
    }
    if let Some(rate) = input.requested_rate_percent {
        if rate < Decimal::ZERO {
            return Err(HomeLoanError::invalid(
                "requested_rate_percent",
                "Requested rate cannot be negative.",
            ));
        }
    }
    Ok(())
}

/// Lowest value wins; the first option in rank order wins ties.
/// `options` must be non-empty.
fn best_pick(options: &[LoanOption], metric: impl Fn(&LoanOption) -> Money) -> BestPick {
    let mut best = &options[0];
    let mut highest = metric(&options[0]);
    for option in &options[1..] {
        let value = metric(option);
        if value < metric(best) {
            best = option;
        }
        if value > highest {
            highest = value;
        }
    }
    let value = metric(best);
    BestPick {
        bank_name: best.bank_name.clone(),
        value,
        savings_vs_highest: (highest - value).round_dp(2),
    }
}

fn analyse_market(options: &[LoanOption]) -> MarketAnalysis {
    let emis: Vec<Money> = options.iter().map(|o| o.emi).collect();
    let rates: Vec<Percent> = options.iter().map(|o| o.annual_rate_percent).collect();

    let total: Money = emis.iter().sum();
    let average_emi = (total / Decimal::from(emis.len())).round_dp(2);

    MarketAnalysis {
        banks_compared: options.len(),
        average_emi,
        emi_range: min_max(&emis),
        rate_range: min_max(&rates),
    }
}

fn min_max(values: &[Decimal]) -> Range<Decimal> {
    let min = values.iter().copied().fold(values[0], |a, b| a.min(b));
    let max = values.iter().copied().fold(values[0], |a, b| a.max(b));
    Range { min, max }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
