use serde_json::Value;

use homeloan_core::LendingPolicy;

use crate::input;

/// Load the lending policy from `path`, or the built-in defaults when none is given.
pub fn load(path: Option<&str>) -> Result<LendingPolicy, Box<dyn std::error::Error>> {
    let policy = match path {
        Some(path) => {
            let policy: LendingPolicy = input::file::read_json(path)?;
            tracing::info!(path, "loaded lending policy");
            policy
        }
        None => LendingPolicy::default(),
    };
    policy.validate()?;
    Ok(policy)
}

/// The effective policy after any overrides.
pub fn run_policy(policy: &LendingPolicy) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(policy)?)
}
