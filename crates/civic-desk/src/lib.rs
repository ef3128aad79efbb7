//! Back-office engine for a civil documents office: service catalog with conditional
//! requirements, order intake and pricing, list management, and printable reports.

pub mod catalog;
pub mod config;
pub mod error;
pub mod form;
pub mod money;
pub mod orders;
pub mod pricing;
pub mod report;
pub mod rules;
pub mod telemetry;

pub use error::AppError;
