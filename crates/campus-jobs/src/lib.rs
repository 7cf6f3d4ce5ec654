//! Core of the campus job board: students apply to postings published by employers.

pub mod config;
pub mod error;
pub mod marketplace;
pub mod telemetry;
