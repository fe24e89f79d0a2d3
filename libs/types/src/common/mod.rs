//! Common building blocks shared across the engine crates

pub mod errors;
pub mod fixed_point;
pub mod identifiers;
