pub mod aggregate;
pub mod dashboard;
