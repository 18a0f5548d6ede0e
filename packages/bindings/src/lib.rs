use napi::Result as NapiResult;
use napi_derive::napi;

use homeloan_core::LendingPolicy;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse an optional policy override; absent means the built-in policy.
fn policy_from(policy_json: Option<String>) -> NapiResult<LendingPolicy> {
    let policy = match policy_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error)?,
        None => LendingPolicy::default(),
    };
    policy.validate().map_err(to_napi_error)?;
    Ok(policy)
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_emi(input_json: String) -> NapiResult<String> {
    let input: homeloan_core::loans::emi::LoanQuote =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        homeloan_core::loans::emi::compute_amortization(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn check_eligibility(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let input: homeloan_core::loans::eligibility::EligibilityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = policy_from(policy_json)?;
    let output = homeloan_core::loans::eligibility::check_eligibility(&input, &policy)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn assess_eligibility(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let input: homeloan_core::loans::eligibility::EligibilityAssessmentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = policy_from(policy_json)?;
    let output = homeloan_core::loans::eligibility::assess_eligibility(&input, &policy)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_banks(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let input: homeloan_core::loans::comparison::ComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = policy_from(policy_json)?;
    let table = homeloan_core::loans::rates::BankRateTable::published();
    let output = homeloan_core::loans::comparison::compare_banks(&input, table, &policy)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn bank_rates() -> NapiResult<String> {
    serde_json::to_string(homeloan_core::loans::rates::BankRateTable::published())
        .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Property
// ---------------------------------------------------------------------------

#[napi]
pub fn find_affordable_properties(
    input_json: String,
    policy_json: Option<String>,
) -> NapiResult<String> {
    let input: homeloan_core::property::affordability::AffordabilitySearch =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = policy_from(policy_json)?;
    let output =
        homeloan_core::property::affordability::find_affordable_properties(&input, &policy)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------------

#[napi]
pub fn prepare_application(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let input: homeloan_core::applications::intake::ApplicationRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = policy_from(policy_json)?;
    let output = homeloan_core::applications::intake::prepare_application(
        &input,
        &policy,
        chrono::Utc::now(),
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn triage_consultation(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let input: homeloan_core::applications::consultation::ConsultationRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let policy = policy_from(policy_json)?;
    let output = homeloan_core::applications::consultation::triage_consultation(&input, &policy)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn summarize_applications(applications_json: String) -> NapiResult<String> {
    let applications: Vec<homeloan_core::applications::intake::LoanApplication> =
        serde_json::from_str(&applications_json).map_err(to_napi_error)?;
    let output = homeloan_core::applications::analytics::summarize_applications(&applications);
    serde_json::to_string(&output).map_err(to_napi_error)
}
