//! Subcommand implementations

pub mod config;
pub mod delete;
pub mod doctor;
pub mod edit;
pub mod list;
pub mod preview;
pub mod serve;
pub(crate) mod service;
pub mod submit;
