pub mod comparison;
pub mod eligibility;
pub mod emi;
pub mod rates;
