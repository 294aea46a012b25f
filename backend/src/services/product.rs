//! Product catalogue service
//!
//! EUR/COP prices are always derived from the USD price through the
//! currency service, on create and whenever the USD price changes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{CreateProductInput, Product, UpdateProductInput};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::external::TextGenerator;
use crate::services::{CompanyService, CurrencyService};

/// Product service for the catalogue and its AI helpers
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
    currency: CurrencyService,
}

/// Filters for listing products
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    /// Company NIT
    pub company: Option<String>,
    /// Fragment of name or code
    pub search: Option<String>,
}

/// Complementary product suggestions
#[derive(Debug, Clone, Serialize)]
pub struct ProductSuggestions {
    pub product: String,
    pub suggestions: String,
}

/// Row for product queries
#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    code: String,
    name: String,
    features: String,
    price_usd: Decimal,
    price_eur: Decimal,
    price_cop: Decimal,
    company_nit: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            code: row.code,
            name: row.name,
            features: row.features,
            price_usd: row.price_usd,
            price_eur: row.price_eur,
            price_cop: row.price_cop,
            company_nit: row.company_nit,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, code, name, features, price_usd, price_eur, price_cop, company_nit, created_at, updated_at";

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool, currency: CurrencyService) -> Self {
        Self { db, currency }
    }

    /// List products, optionally by company and name/code fragment
    pub async fn list(&self, filter: &ProductFilter) -> AppResult<Vec<Product>> {
        let pattern = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::text IS NULL OR company_nit = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR code ILIKE $2)
            ORDER BY name
            "#
        ))
        .bind(filter.company.as_deref())
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by id
    pub async fn get(&self, id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// Create a product; EUR/COP prices are derived from the USD price
    pub async fn create(&self, input: CreateProductInput) -> AppResult<Product> {
        input.validate()?;
        CompanyService::new(self.db.clone())
            .ensure_exists(&input.company_nit)
            .await?;

        let prices = self.currency.product_prices(input.price_usd).await;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (code, name, features, price_usd, price_eur, price_cop, company_nit)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(&input.features)
        .bind(prices.usd)
        .bind(prices.eur)
        .bind(prices.cop)
        .bind(&input.company_nit)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "code"))?;

        tracing::info!(product_id = %row.id, code = %row.code, "Product created");
        Ok(row.into())
    }

    /// Update a product. A changed USD price re-derives EUR/COP; otherwise
    /// explicitly supplied EUR/COP prices are kept as given.
    pub async fn update(&self, id: Uuid, input: UpdateProductInput) -> AppResult<Product> {
        input.validate()?;
        let existing = self.get(id).await?;

        let (price_usd, price_eur, price_cop) = match input.price_usd {
            Some(usd) if usd != existing.price_usd => {
                let prices = self.currency.product_prices(usd).await;
                (prices.usd, prices.eur, prices.cop)
            }
            _ => (
                existing.price_usd,
                input.price_eur.unwrap_or(existing.price_eur),
                input.price_cop.unwrap_or(existing.price_cop),
            ),
        };

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET name = $1, features = $2, price_usd = $3, price_eur = $4, price_cop = $5,
                updated_at = NOW()
            WHERE id = $6
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(input.name.as_deref().map(str::trim).unwrap_or(&existing.name))
        .bind(input.features.as_deref().unwrap_or(&existing.features))
        .bind(price_usd)
        .bind(price_eur)
        .bind(price_cop)
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Delete a product and its inventory records
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }

    /// Suggest three complementary products. Uses the generator when one is
    /// configured and falls back to a keyword table otherwise.
    pub async fn suggestions(
        &self,
        id: Uuid,
        generator: Option<&dyn TextGenerator>,
    ) -> AppResult<ProductSuggestions> {
        let product = self.get(id).await?;
        let suggestions = suggest_complements(&product.name, &product.features, generator).await;

        Ok(ProductSuggestions {
            product: product.name,
            suggestions,
        })
    }
}

/// Ask the generator for complements, falling back to [`basic_suggestions`]
pub async fn suggest_complements(
    name: &str,
    features: &str,
    generator: Option<&dyn TextGenerator>,
) -> String {
    let Some(generator) = generator else {
        return format_suggestions(&basic_suggestions(name, features));
    };

    let prompt = format!(
        "You are an assistant that suggests products for inventories.\n\
         Product name: {}\n\
         Features: {}\n\
         Suggest 3 complementary or related products customers may be interested in. \
         Answer with a short list of product names, one per line, each starting with \"- \".",
        name, features
    );

    match generator.generate(&prompt).await {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Suggestion generation failed, using keyword fallback");
            format_suggestions(&basic_suggestions(name, features))
        }
    }
}

/// Keyword categories and the complements suggested for them. The first
/// category with a keyword contained in the product text wins.
const SUGGESTION_TABLE: &[(&[&str], [&str; 3])] = &[
    (
        &["computador", "computer", "laptop", "pc", "ordenador", "portatil", "notebook"],
        ["Wireless mouse", "Mechanical keyboard", "Additional monitor"],
    ),
    (
        &["telefono", "phone", "smartphone", "celular", "movil", "iphone", "android"],
        ["USB-C/Lightning charging cable", "Protective case", "Wireless earbuds"],
    ),
    (
        &["tablet", "ipad"],
        ["Keyboard case", "Compatible stylus", "Adjustable stand"],
    ),
    (
        &["electronico", "electronic", "tecnologia", "gadget", "dispositivo", "device"],
        ["Compatible charging cable", "Case or protector", "Mounting accessory"],
    ),
    (
        &["camisa", "camiseta", "shirt", "polo", "blusa", "blouse"],
        ["Matching trousers or skirt", "Complementary belt", "Jacket or coat"],
    ),
    (
        &["pantalon", "jeans", "trousers", "pants"],
        ["Leather belt", "Shoes or sneakers", "Shirt or blouse"],
    ),
    (
        &["vestido", "falda", "dress", "skirt"],
        ["Heels or flats", "Handbag", "Jewellery accessories"],
    ),
    (
        &["ropa", "clothing", "moda", "fashion", "prenda", "garment"],
        ["Related fashion accessory", "Clothing accessory", "Fabric care product"],
    ),
    (
        &["bebida", "drink", "refresco", "jugo", "juice", "agua", "water", "cerveza", "beer", "vino", "wine"],
        ["Suitable glass or cup", "Ice or cooler", "Complementary snacks"],
    ),
    (
        &["comida", "food", "alimento", "snack"],
        ["Serving dish or container", "Kitchen utensils", "Complementary drink"],
    ),
    (
        &["herramienta", "tool", "taladro", "drill", "martillo", "hammer", "destornillador", "screwdriver"],
        ["Toolbox", "Protective gloves", "Spare parts and accessories"],
    ),
    (
        &["mueble", "furniture", "silla", "chair", "mesa", "table", "sofa", "cama", "bed"],
        ["Pillows or cushions", "Side table", "Lamp or lighting"],
    ),
    (
        &["libro", "book", "manual", "guia", "guide"],
        ["Bookmark or highlighter", "Notebook", "Folder or case"],
    ),
    (
        &["deporte", "sport", "futbol", "football", "balon", "ball", "gimnasio", "gym"],
        ["Related sports equipment", "Sportswear", "Training accessories"],
    ),
    (
        &["cable", "conexion", "connector", "conector"],
        ["Compatible adapter", "Extension cable", "Cable organizer"],
    ),
    (
        &["bateria", "battery", "pilas", "energia", "power"],
        ["Compatible charger", "Charging cable", "Power bank"],
    ),
    (
        &["limpieza", "cleaning", "detergente", "detergent", "jabon", "soap", "shampoo"],
        ["Sponge or brush", "Container or dispenser", "Complementary care product"],
    ),
];

/// Keyword-based complements for a product
pub fn basic_suggestions(name: &str, features: &str) -> Vec<String> {
    let text = format!("{} {}", name, features).to_lowercase();

    SUGGESTION_TABLE
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, items)| items.iter().map(|s| s.to_string()).collect())
        .unwrap_or_else(|| {
            vec![
                format!("Compatible accessory for {}", name),
                "Related complementary product".to_string(),
                "Recommended add-on".to_string(),
            ]
        })
}

/// Render suggestions as `- item` lines
pub fn format_suggestions(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::AiError;
    use async_trait::async_trait;

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, AiError> {
            Err(AiError::QuotaExceeded)
        }
    }

    #[test]
    fn laptop_gets_computer_accessories() {
        let items = basic_suggestions("Laptop Pro 14", "16GB RAM");
        assert_eq!(items[0], "Wireless mouse");
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn features_are_searched_too() {
        let items = basic_suggestions("Modelo X", "Smartphone con pantalla OLED");
        assert_eq!(items[2], "Wireless earbuds");
    }

    #[test]
    fn unknown_products_get_generic_suggestions() {
        let items = basic_suggestions("Widget", "blue");
        assert_eq!(items[0], "Compatible accessory for Widget");
    }

    #[test]
    fn formats_as_dash_list() {
        let text = format_suggestions(&["A".to_string(), "B".to_string()]);
        assert_eq!(text, "- A\n- B");
    }

    #[tokio::test]
    async fn generator_failure_falls_back() {
        let text = suggest_complements("Silla ergonómica", "", Some(&FailingGenerator)).await;
        assert!(text.starts_with("- Pillows or cushions"));
    }

    #[tokio::test]
    async fn no_generator_uses_table() {
        let text = suggest_complements("Cerveza artesanal", "", None).await;
        assert_eq!(text, "- Suitable glass or cup\n- Ice or cooler\n- Complementary snacks");
    }
}
