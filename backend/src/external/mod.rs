//! External API integrations

pub mod exchange_rate;
pub mod generative_ai;
pub mod mailer;

pub use exchange_rate::{ExchangeRateClient, RateError, RateSource};
pub use generative_ai::{AiError, GeminiClient, TextGenerator};
pub use mailer::{EmailAttachment, EmailMessage, HttpMailer, MailError, Mailer};
