//! Inventory assistant
//!
//! Questions go to the generative service together with a snapshot of all
//! companies, products and inventory. Without the service, a keyword search
//! over the same data answers instead, and a system summary is the last
//! resort.

use std::fmt::Write as _;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{round_money, Company, InventoryDetail, InventoryTotals, Product, ServiceFailure};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::external::TextGenerator;
use crate::services::{CompanyService, InventoryService, ProductFilter, ProductService};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub question: String,
}

/// Everything the assistant can talk about
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    pub companies: Vec<Company>,
    pub products: Vec<Product>,
    pub inventory: Vec<InventoryDetail>,
    pub totals: InventoryTotals,
}

impl ChatContext {
    /// Load the full data set
    pub async fn load(db: &PgPool, products: &ProductService) -> AppResult<Self> {
        let companies = CompanyService::new(db.clone()).list(None).await?;
        let products = products.list(&ProductFilter::default()).await?;
        let inventory = InventoryService::new(db.clone()).list(None).await?;
        let totals = InventoryTotals::accumulate(companies.len(), products.len(), &inventory);

        Ok(Self {
            companies,
            products,
            inventory,
            totals,
        })
    }

    fn company_name<'a>(&'a self, nit: &'a str) -> &'a str {
        self.companies
            .iter()
            .find(|c| c.nit == nit)
            .map(|c| c.name.as_str())
            .unwrap_or(nit)
    }
}

/// Answer a question; the question must not be blank
pub async fn answer_question(
    request: ChatRequest,
    context: &ChatContext,
    generator: Option<&dyn TextGenerator>,
) -> AppResult<ChatResponse> {
    let question = request.question.trim().to_string();
    if question.is_empty() {
        return Err(AppError::Validation {
            field: "question".to_string(),
            message: "A question is required".to_string(),
            message_es: "Debe proporcionar una pregunta".to_string(),
        });
    }

    let response = respond(&question, context, generator).await;
    Ok(ChatResponse { response, question })
}

async fn respond(
    question: &str,
    context: &ChatContext,
    generator: Option<&dyn TextGenerator>,
) -> String {
    let failure = match generator {
        Some(generator) => match generator.generate(&chat_prompt(question, context)).await {
            Ok(text) => return text.trim().to_string(),
            Err(e) => {
                let failure = e.failure();
                tracing::warn!(error = %e, category = ?failure, "Chat generation failed, using keyword search");
                failure
            }
        },
        None => ServiceFailure::NotConfigured,
    };

    fallback_answer(question, context, &failure)
}

/// Answer without the generative service
pub fn fallback_answer(question: &str, context: &ChatContext, failure: &ServiceFailure) -> String {
    let found = search(question, context);
    let mut out = String::new();

    if let Some(notice) = chat_notice(failure, found.is_some()) {
        out.push_str(notice);
        out.push_str("\n\n");
    }
    match found {
        Some(text) => out.push_str(&text),
        None => out.push_str(&system_summary(&context.totals)),
    }
    out
}

/// Which notice, if any, accompanies a fallback answer
fn chat_notice(failure: &ServiceFailure, found: bool) -> Option<&'static str> {
    if failure.is_persistent() {
        return failure.advisory();
    }
    match failure {
        ServiceFailure::NotConfigured if !found => {
            Some("AI features are not configured (missing API key).")
        }
        ServiceFailure::ModelNotFound if !found => {
            Some("AI service error: no configured model could be reached.")
        }
        _ => None,
    }
}

/// Keyword search over products, then companies
pub fn search(question: &str, context: &ChatContext) -> Option<String> {
    let needle = question.to_lowercase();
    let mut out = String::new();

    let products: Vec<&Product> = context
        .products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.features.to_lowercase().contains(&needle)
                || p.code.to_lowercase().contains(&needle)
        })
        .collect();

    if !products.is_empty() {
        out.push_str("**Products found:**\n\n");
        for p in products {
            let _ = writeln!(out, "**{}** (Code: {})", p.name, p.code);
            let _ = writeln!(out, "   - Company: {}", context.company_name(&p.company_nit));
            let _ = writeln!(out, "   - Price USD: ${}", format_money(p.price_usd));
            let _ = writeln!(out, "   - Price EUR: €{}", format_money(p.price_eur));
            let _ = writeln!(out, "   - Price COP: ${}", format_money(p.price_cop));
            let _ = writeln!(out, "   - Features: {}\n", p.features);

            let stock: Vec<&InventoryDetail> =
                context.inventory.iter().filter(|i| i.product_id == p.id).collect();
            if stock.is_empty() {
                out.push_str("   - No stock in inventory\n\n");
                continue;
            }
            out.push_str("   **In inventory:**\n");
            for i in stock {
                let quantity = Decimal::from(i.quantity);
                let _ = writeln!(out, "   - Company: {}", i.company_name);
                let _ = writeln!(out, "   - Quantity: {} units", i.quantity);
                let _ = writeln!(out, "   - Total value USD: ${}", format_money(i.price_usd * quantity));
                let _ = writeln!(out, "   - Total value EUR: €{}", format_money(i.price_eur * quantity));
                let _ = writeln!(out, "   - Total value COP: ${}\n", format_money(i.price_cop * quantity));
            }
        }
        return Some(out);
    }

    let companies: Vec<&Company> = context
        .companies
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&needle) || c.nit.contains(&needle))
        .collect();

    if companies.is_empty() {
        return None;
    }

    out.push_str("**Companies found:**\n\n");
    for c in companies {
        let _ = writeln!(out, "**{}**", c.name);
        let _ = writeln!(out, "   - NIT: {}", c.nit);
        let _ = writeln!(out, "   - Address: {}", c.address);
        let _ = writeln!(out, "   - Phone: {}\n", c.phone);

        let products: Vec<&Product> =
            context.products.iter().filter(|p| p.company_nit == c.nit).collect();
        if !products.is_empty() {
            let _ = writeln!(out, "   **Products ({}):**", products.len());
            for p in products {
                let _ = writeln!(out, "   - {} (${} USD)", p.name, format_money(p.price_usd));
            }
        }

        let stock: Vec<&InventoryDetail> =
            context.inventory.iter().filter(|i| i.company_nit == c.nit).collect();
        if !stock.is_empty() {
            let units: i64 = stock.iter().map(|i| i64::from(i.quantity)).sum();
            let value: Decimal = stock
                .iter()
                .map(|i| i.price_usd * Decimal::from(i.quantity))
                .sum();
            out.push_str("\n   **Inventory:**\n");
            let _ = writeln!(out, "   - Total units: {}", units);
            let _ = writeln!(out, "   - Total value USD: ${}", format_money(value));
        }
    }
    Some(out)
}

/// Totals overview used when nothing matches
pub fn system_summary(totals: &InventoryTotals) -> String {
    format!(
        "**System summary:**\n\n\
         Companies: {}\n\
         Products: {}\n\
         Units in inventory: {}\n\
         Total inventory value:\n   - USD: ${}\n   - EUR: €{}\n   - COP: ${}\n\n\
         I found no specific information about your question. Try the exact product or company name.",
        totals.companies,
        totals.products,
        totals.units,
        format_money(totals.value_usd),
        format_money(totals.value_eur),
        format_money(totals.value_cop),
    )
}

fn chat_prompt(question: &str, context: &ChatContext) -> String {
    let t = &context.totals;

    format!(
        r#"You are a virtual assistant specialized in inventory, company and product management.

SYSTEM DATA

OVERVIEW:
- Companies: {companies}
- Products: {products}
- Units in inventory: {units}
- Inventory value USD: ${usd}
- Inventory value EUR: €{eur}
- Inventory value COP: ${cop}

COMPANIES ({n_companies}):
{company_json}

PRODUCTS ({n_products}):
{product_json}

INVENTORY ({n_inventory}):
{inventory_json}

INSTRUCTIONS:
1. Answer questions about companies, products, inventory, quantities, values and prices in USD/EUR/COP.
2. Use the data above to give precise, specific answers.
3. When asked about values, mention all three currencies when relevant.
4. If you cannot find specific information, say so clearly.
5. For total values, multiply inventory quantities by prices.

USER QUESTION: {question}

Answer clearly and helpfully using the data provided."#,
        companies = t.companies,
        products = t.products,
        units = t.units,
        usd = format_money(t.value_usd),
        eur = format_money(t.value_eur),
        cop = format_money(t.value_cop),
        n_companies = context.companies.len(),
        company_json = json(&context.companies),
        n_products = context.products.len(),
        product_json = json(&context.products),
        n_inventory = context.inventory.len(),
        inventory_json = json(&context.inventory),
    )
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}

/// Two decimals with thousands separators
pub fn format_money(amount: Decimal) -> String {
    let rounded = round_money(amount);
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((&text, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::AiError;
    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    struct Failing(fn() -> AiError);

    #[async_trait]
    impl TextGenerator for Failing {
        async fn generate(&self, _prompt: &str) -> Result<String, AiError> {
            Err((self.0)())
        }
    }

    struct Answering;

    #[async_trait]
    impl TextGenerator for Answering {
        async fn generate(&self, prompt: &str) -> Result<String, AiError> {
            assert!(prompt.contains("USER QUESTION: how many laptops?"));
            Ok("  You have 4 laptops.  ".to_string())
        }
    }

    fn context() -> ChatContext {
        let now = Utc::now();
        let company = Company {
            nit: "900123456".into(),
            name: "Acme SAS".into(),
            address: "Calle 1".into(),
            phone: "3001234567".into(),
            created_at: now,
            updated_at: now,
        };
        let product = Product {
            id: Uuid::new_v4(),
            code: "LP-01".into(),
            name: "Laptop Pro".into(),
            features: "16GB RAM".into(),
            price_usd: Decimal::new(120000, 2),
            price_eur: Decimal::new(102000, 2),
            price_cop: Decimal::new(468000000, 2),
            company_nit: company.nit.clone(),
            created_at: now,
            updated_at: now,
        };
        let stock = InventoryDetail {
            id: Uuid::new_v4(),
            company_nit: company.nit.clone(),
            company_name: company.name.clone(),
            product_id: product.id,
            product_code: product.code.clone(),
            product_name: product.name.clone(),
            price_usd: product.price_usd,
            price_eur: product.price_eur,
            price_cop: product.price_cop,
            quantity: 4,
            ingress_date: now,
            last_update_date: now,
            transaction_hash: None,
        };
        let totals = InventoryTotals::accumulate(1, 1, std::slice::from_ref(&stock));
        ChatContext {
            companies: vec![company],
            products: vec![product],
            inventory: vec![stock],
            totals,
        }
    }

    #[test]
    fn money_is_grouped() {
        assert_eq!(format_money(Decimal::new(468000000, 2)), "4,680,000.00");
        assert_eq!(format_money(Decimal::new(999, 2)), "9.99");
        assert_eq!(format_money(Decimal::ZERO), "0.00");
        assert_eq!(format_money(Decimal::new(-123456, 1)), "-12,345.60");
    }

    #[test]
    fn search_finds_products_with_stock() {
        let text = search("laptop", &context()).unwrap();
        assert!(text.starts_with("**Products found:**"));
        assert!(text.contains("Quantity: 4 units"));
        assert!(text.contains("Total value USD: $4,800.00"));
    }

    #[test]
    fn company_name_falls_back_to_nit() {
        let context = context();
        assert_eq!(context.company_name("900123456"), "Acme SAS");
        let unknown = String::from("800555444");
        assert_eq!(context.company_name(&unknown), "800555444");
    }

    #[test]
    fn search_falls_through_to_companies() {
        let text = search("acme", &context()).unwrap();
        assert!(text.starts_with("**Companies found:**"));
        assert!(text.contains("Total units: 4"));
    }

    #[test]
    fn unmatched_question_returns_none() {
        assert!(search("weather tomorrow", &context()).is_none());
    }

    #[test]
    fn temporary_failure_hides_notice_when_search_succeeds() {
        let text = fallback_answer("laptop", &context(), &ServiceFailure::RateLimited);
        assert!(text.starts_with("**Products found:**"));
    }

    #[test]
    fn quota_notice_is_always_shown() {
        let text = fallback_answer("laptop", &context(), &ServiceFailure::QuotaExceeded);
        assert!(text.contains("quota"));
        assert!(text.contains("**Products found:**"));
    }

    #[test]
    fn not_configured_notice_only_on_summary() {
        let found = fallback_answer("laptop", &context(), &ServiceFailure::NotConfigured);
        assert!(!found.contains("not configured"));

        let summary = fallback_answer("weather", &context(), &ServiceFailure::NotConfigured);
        assert!(summary.contains("not configured"));
        assert!(summary.contains("**System summary:**"));
        assert!(summary.contains("Units in inventory: 4"));
    }

    #[tokio::test]
    async fn blank_question_is_rejected() {
        let request = ChatRequest {
            question: "   ".into(),
        };
        let result = answer_question(request, &context(), None).await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn generator_answer_is_trimmed() {
        let request = ChatRequest {
            question: " how many laptops? ".into(),
        };
        let response = answer_question(request, &context(), Some(&Answering)).await.unwrap();
        assert_eq!(response.response, "You have 4 laptops.");
        assert_eq!(response.question, "how many laptops?");
    }

    #[tokio::test]
    async fn invalid_key_falls_back_with_notice() {
        let request = ChatRequest {
            question: "LP-01".into(),
        };
        let generator = Failing(|| AiError::Unauthorized);
        let response = answer_question(request, &context(), Some(&generator)).await.unwrap();
        assert!(response.response.contains("API key"));
        assert!(response.response.contains("Laptop Pro"));
    }
}
