//! gentle-post domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: The transformation pipeline and the submission service
//! - `policy`: Label-to-polarity mapping and rewrite output checks

pub mod model;
pub mod policy;
pub mod ports;
pub mod usecases;

pub use model::*;
pub use ports::*;
