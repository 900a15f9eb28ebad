// Common library shared by the Budget Buddy api and scheduler binaries

pub mod auth;
pub mod bootstrap;
pub mod budget;
pub mod config;
pub mod db;
pub mod errors;
pub mod identity;
pub mod models;
pub mod notification;
pub mod report;
pub mod schedule;
pub mod scheduler;
pub mod telemetry;
pub mod validation;
