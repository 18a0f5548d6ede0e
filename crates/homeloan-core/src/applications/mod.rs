pub mod analytics;
pub mod consultation;
pub mod intake;
pub mod repository;
