pub mod advisor;
pub mod api;
pub mod cli;
pub mod database;
pub mod directory;
pub mod models;
pub mod normalizer;
pub mod report;
pub mod service;

pub use normalizer::{build_table, MetricName, MetricTable, TableBuilder, TableOutcome};
