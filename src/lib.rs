pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod lineup;
pub mod llm;
pub mod llms_txt;
pub mod metrics;
pub mod rate_limit;
pub mod seed;
pub mod views;
