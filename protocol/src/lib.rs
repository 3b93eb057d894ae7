//! Shared conversation types exchanged between the IETE Bot crates.

pub mod models;
