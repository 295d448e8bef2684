pub mod config;
pub mod controller;
pub mod domain;
pub mod forecast;
pub mod history;
pub mod telemetry;
