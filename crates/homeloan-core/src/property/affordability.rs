use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::HomeLoanError;
use crate::policy::LendingPolicy;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Range};
use crate::HomeLoanResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A listing supplied by the property catalog. Fields other than id, title
/// and price are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyCandidate {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    pub price: Money,
    #[serde(flatten)]
    pub listing: serde_json::Map<String, serde_json::Value>,
}

/// Buyer's financial position plus the catalog slice to search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilitySearch {
    pub candidates: Vec<PropertyCandidate>,
    pub total_budget: Money,
    pub loan_amount: Money,
    pub savings: Money,
    /// Monthly EMI the buyer has already planned for.
    pub emi: Money,
    pub tenure_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingAnnotation {
    pub property_price: Money,
    pub loan_amount: Money,
    pub down_payment_needed: Money,
    pub down_payment_percent: Percent,
    pub monthly_emi: Money,
    pub loan_tenure_years: u32,
    /// 100 minus penalties; intentionally not clamped.
    pub affordability_score: i32,
    pub is_affordable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffordableProperty {
    #[serde(flatten)]
    pub property: PropertyCandidate,
    pub financing: FinancingAnnotation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub total_found: usize,
    pub affordable_count: usize,
    pub budget_range: Range<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_range: Option<Range<Money>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingSummary {
    pub average_down_payment: Money,
    pub properties_within_savings: usize,
    pub recommended_property: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffordabilityMatch {
    /// Best fit first.
    pub properties: Vec<AffordableProperty>,
    pub summary: MatchSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financing_summary: Option<FinancingSummary>,
    /// Populated only when nothing falls inside the budget band.
    pub suggestions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Keep candidates priced inside the budget band and rank them by how well the
/// buyer's savings cover the down payment.
///
/// An empty band is a normal outcome: the result carries no properties and a
/// list of suggestions instead of an error.
pub fn find_affordable_properties(
    search: &AffordabilitySearch,
    policy: &LendingPolicy,
) -> HomeLoanResult<ComputationOutput<AffordabilityMatch>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_search(search)?;

    let band = Range {
        min: search.total_budget * policy.budget_floor_factor,
        max: search.total_budget * policy.budget_ceiling_factor,
    };

    let mut properties: Vec<AffordableProperty> = search
        .candidates
        .iter()
        .filter(|c| band.min <= c.price && c.price <= band.max)
        .map(|c| AffordableProperty {
            property: c.clone(),
            financing: annotate(c, search, policy),
        })
        .collect();

    // stable: equal scores keep catalog order
    properties.sort_by(|a, b| {
        b.financing
            .affordability_score
            .cmp(&a.financing.affordability_score)
    });

    let total_found = properties.len();
    let affordable_count = properties
        .iter()
        .filter(|p| p.financing.is_affordable)
        .count();

    tracing::debug!(
        candidates = search.candidates.len(),
        total_found,
        affordable_count,
        "matched properties to budget band"
    );

    let budget_range = Range {
        min: band.min.round_dp(2),
        max: band.max.round_dp(2),
    };

    let output = if properties.is_empty() {
        warnings.push("No properties found within the budget range.".into());
        AffordabilityMatch {
            properties,
            summary: MatchSummary {
                total_found: 0,
                affordable_count: 0,
                budget_range,
                average_price: None,
                price_range: None,
            },
            financing_summary: None,
            suggestions: vec![
                "Consider increasing your budget".into(),
                "Look for properties in different locations".into(),
                "Consider a higher loan amount if eligible".into(),
                "Explore properties with lower prices".into(),
            ],
        }
    } else {
        if affordable_count == 0 {
            warnings.push(
                "Savings do not cover the down payment on any property in the band.".into(),
            );
        }
        let count = Decimal::from(total_found);
        let prices: Vec<Money> = properties.iter().map(|p| p.property.price).collect();
        let price_sum: Money = prices.iter().sum();
        let down_payment_sum: Money = properties
            .iter()
            .map(|p| p.financing.down_payment_needed)
            .sum();

        let financing_summary = FinancingSummary {
            average_down_payment: whole_units(down_payment_sum / count),
            properties_within_savings: affordable_count,
            recommended_property: properties[0].property.title.clone(),
        };

        AffordabilityMatch {
            summary: MatchSummary {
                total_found,
                affordable_count,
                budget_range,
                average_price: Some(whole_units(price_sum / count)),
                price_range: Some(Range {
                    min: prices.iter().copied().fold(prices[0], Decimal::min),
                    max: prices.iter().copied().fold(prices[0], Decimal::max),
                }),
            },
            properties,
            financing_summary: Some(financing_summary),
            suggestions: Vec::new(),
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "total_budget": search.total_budget.to_string(),
        "loan_amount": search.loan_amount.to_string(),
        "savings": search.savings.to_string(),
        "budget_floor_factor": policy.budget_floor_factor.to_string(),
        "budget_ceiling_factor": policy.budget_ceiling_factor.to_string(),
    });

    Ok(with_metadata(
        "Budget-band property affordability match",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn annotate(
    candidate: &PropertyCandidate,
    search: &AffordabilitySearch,
    policy: &LendingPolicy,
) -> FinancingAnnotation {
    let down_payment_needed = candidate.price - search.loan_amount;
    let down_payment_percent = down_payment_needed / candidate.price * dec!(100);

    let short_on_savings = down_payment_needed > search.savings;
    let mut score: i32 = 100;
    if short_on_savings {
        score -= policy.insufficient_savings_penalty;
    }
    if candidate.price > search.total_budget {
        score -= policy.over_budget_penalty;
    }

    FinancingAnnotation {
        property_price: candidate.price,
        loan_amount: search.loan_amount,
        down_payment_needed: whole_units(down_payment_needed),
        down_payment_percent: down_payment_percent.round_dp(1),
        monthly_emi: search.emi,
        loan_tenure_years: search.tenure_years,
        affordability_score: score,
        is_affordable: !short_on_savings,
    }
}

/// Property money is quoted in whole currency units, halves rounding up.
fn whole_units(amount: Money) -> Money {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn validate_search(search: &AffordabilitySearch) -> HomeLoanResult<()> {
    if search.total_budget <= Decimal::ZERO {
        return Err(HomeLoanError::invalid(
            "total_budget",
            "Total budget must be positive.",
        ));
    }
    if search.loan_amount < Decimal::ZERO {
        return Err(HomeLoanError::invalid(
            "loan_amount",
            "Loan amount cannot be negative.",
        ));
    }
    if search.savings < Decimal::ZERO {
        return Err(HomeLoanError::invalid("savings", "Savings cannot be negative."));
    }
    if search.emi < Decimal::ZERO {
        return Err(HomeLoanError::invalid("emi", "EMI cannot be negative."));
    }
    if search.tenure_years < 1 {
        return Err(HomeLoanError::invalid(
            "tenure_years",
            "Tenure must be at least one year.",
        ));
    }
    if let Some((idx, c)) = search
        .candidates
        .iter()
        .enumerate()
        .find(|(_, c)| c.price <= Decimal::ZERO)
    {
        return Err(HomeLoanError::InvalidInput {
            field: format!("candidates[{idx}].price"),
            reason: format!("Property {} has a non-positive price.", c.id),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
