//! Business logic services for the Inventory Management Platform

pub mod alerting;
pub mod auth;
pub mod chatbot;
pub mod company;
pub mod currency;
pub mod inventory;
pub mod prediction;
pub mod product;

pub use alerting::AlertDispatcher;
pub use auth::{AuthService, TokenService};
pub use chatbot::{ChatContext, ChatRequest, ChatResponse};
pub use company::CompanyService;
pub use currency::CurrencyService;
pub use inventory::InventoryService;
pub use prediction::{PredictionReport, StockRiskPipeline};
pub use product::{ProductFilter, ProductService};
