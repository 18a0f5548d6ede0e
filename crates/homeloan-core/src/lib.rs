pub mod error;
pub mod policy;
pub mod types;

#[cfg(feature = "loans")]
pub mod loans;

#[cfg(feature = "property")]
pub mod property;

#[cfg(feature = "applications")]
pub mod applications;

pub use error::HomeLoanError;
pub use policy::LendingPolicy;
pub use types::*;

/// Standard result type for all homeloan computations
pub type HomeLoanResult<T> = Result<T, HomeLoanError>;
