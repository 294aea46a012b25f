//! Shared types and policy for the Inventory Management Platform
//!
//! This crate contains the domain models, currency arithmetic and the
//! stock-risk policy shared between the backend and the frontend (via WASM).
//! Nothing in here performs I/O.

pub mod currency;
pub mod models;
pub mod risk;
pub mod validation;

pub use currency::*;
pub use models::*;
pub use risk::*;
pub use validation::*;
