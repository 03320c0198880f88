//! Common types shared across the Perch crates

pub mod errors;
