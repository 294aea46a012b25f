//! HTTP request handlers

pub mod auth;
pub mod chatbot;
pub mod company;
pub mod health;
pub mod inventory;
pub mod product;

pub use auth::*;
pub use chatbot::*;
pub use company::*;
pub use health::*;
pub use inventory::*;
pub use product::*;
