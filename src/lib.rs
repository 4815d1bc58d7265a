pub mod api;
pub mod commands;
pub mod config;
pub mod parse;
pub mod records;
pub mod report;
