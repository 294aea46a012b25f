//! Domain models for the Inventory Management Platform

mod company;
mod inventory;
mod product;
mod user;

pub use company::*;
pub use inventory::*;
pub use product::*;
pub use user::*;
