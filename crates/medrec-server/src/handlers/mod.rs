pub mod auth;
pub mod diagnoses;
pub mod health;
pub mod patients;
