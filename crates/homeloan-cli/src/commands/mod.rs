pub mod applications;
pub mod loans;
pub mod policy;
pub mod property;
