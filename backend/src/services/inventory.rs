//! Inventory management service for stock records, adjustments and export

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::{
    CreateInventoryInput, InventoryDetail, InventoryRecord, InventorySnapshot, InventoryTotals,
    UpdateInventoryInput,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::external::{EmailAttachment, EmailMessage, Mailer};
use crate::services::CompanyService;

/// Inventory service for managing stock records
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Input for a relative quantity change
#[derive(Debug, Deserialize)]
pub struct AdjustInventoryInput {
    pub delta: i32,
}

/// Input for emailing an export
#[derive(Debug, Deserialize)]
pub struct ExportEmailInput {
    pub email: Option<String>,
}

/// Generated CSV export
#[derive(Debug, Clone)]
pub struct InventoryExport {
    pub company_name: String,
    pub filename: String,
    pub content: String,
}

/// One CSV export row
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    code: &'a str,
    product: &'a str,
    quantity: i32,
    price_usd: Decimal,
    price_eur: Decimal,
    price_cop: Decimal,
}

/// Row for inventory queries
#[derive(Debug, FromRow)]
struct InventoryRow {
    id: Uuid,
    company_nit: String,
    product_id: Uuid,
    quantity: i32,
    ingress_date: DateTime<Utc>,
    last_update_date: DateTime<Utc>,
    transaction_hash: Option<String>,
}

impl From<InventoryRow> for InventoryRecord {
    fn from(row: InventoryRow) -> Self {
        InventoryRecord {
            id: row.id,
            company_nit: row.company_nit,
            product_id: row.product_id,
            quantity: row.quantity,
            ingress_date: row.ingress_date,
            last_update_date: row.last_update_date,
            transaction_hash: row.transaction_hash,
        }
    }
}

/// Row for joined inventory queries
#[derive(Debug, FromRow)]
struct DetailRow {
    id: Uuid,
    company_nit: String,
    company_name: String,
    product_id: Uuid,
    product_code: String,
    product_name: String,
    price_usd: Decimal,
    price_eur: Decimal,
    price_cop: Decimal,
    quantity: i32,
    ingress_date: DateTime<Utc>,
    last_update_date: DateTime<Utc>,
    transaction_hash: Option<String>,
}

impl From<DetailRow> for InventoryDetail {
    fn from(row: DetailRow) -> Self {
        InventoryDetail {
            id: row.id,
            company_nit: row.company_nit,
            company_name: row.company_name,
            product_id: row.product_id,
            product_code: row.product_code,
            product_name: row.product_name,
            price_usd: row.price_usd,
            price_eur: row.price_eur,
            price_cop: row.price_cop,
            quantity: row.quantity,
            ingress_date: row.ingress_date,
            last_update_date: row.last_update_date,
            transaction_hash: row.transaction_hash,
        }
    }
}

const INVENTORY_COLUMNS: &str =
    "id, company_nit, product_id, quantity, ingress_date, last_update_date, transaction_hash";

const DETAIL_SELECT: &str = r#"
    SELECT i.id, i.company_nit, c.name AS company_name, i.product_id,
           p.code AS product_code, p.name AS product_name,
           p.price_usd, p.price_eur, p.price_cop,
           i.quantity, i.ingress_date, i.last_update_date, i.transaction_hash
    FROM inventory i
    JOIN companies c ON c.nit = i.company_nit
    JOIN products p ON p.id = i.product_id
"#;

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List inventory rows with product and company details
    pub async fn list(&self, company: Option<&str>) -> AppResult<Vec<InventoryDetail>> {
        let rows = sqlx::query_as::<_, DetailRow>(&format!(
            "{DETAIL_SELECT} WHERE ($1::text IS NULL OR i.company_nit = $1) ORDER BY c.name, p.name"
        ))
        .bind(company)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(InventoryDetail::from).collect())
    }

    /// Inventory for one company; 404 when the company is unknown
    pub async fn by_company(&self, nit: &str) -> AppResult<Vec<InventoryDetail>> {
        CompanyService::new(self.db.clone()).ensure_exists(nit).await?;
        self.list(Some(nit)).await
    }

    /// Get one inventory row
    pub async fn get(&self, id: Uuid) -> AppResult<InventoryDetail> {
        let row = sqlx::query_as::<_, DetailRow>(&format!("{DETAIL_SELECT} WHERE i.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory".to_string()))?;

        Ok(row.into())
    }

    /// Snapshots for the stock-risk pipeline
    pub async fn snapshots(&self, company: Option<&str>) -> AppResult<Vec<InventorySnapshot>> {
        Ok(self.list(company).await?.iter().map(InventoryDetail::snapshot).collect())
    }

    /// Totals across all companies, products and stock
    pub async fn totals(&self) -> AppResult<InventoryTotals> {
        let (companies, products) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT (SELECT COUNT(*) FROM companies), (SELECT COUNT(*) FROM products)",
        )
        .fetch_one(&self.db)
        .await?;

        let rows = self.list(None).await?;
        Ok(InventoryTotals::accumulate(
            usize::try_from(companies).unwrap_or(0),
            usize::try_from(products).unwrap_or(0),
            &rows,
        ))
    }

    /// Register stock for a product at a company
    pub async fn create(&self, input: CreateInventoryInput) -> AppResult<InventoryRecord> {
        input.validate()?;
        CompanyService::new(self.db.clone())
            .ensure_exists(&input.company_nit)
            .await?;
        let product_code = self.product_code(input.product_id).await?;

        let hash = transaction_hash(&input.company_nit, &product_code, input.quantity, Utc::now());

        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            r#"
            INSERT INTO inventory (company_nit, product_id, quantity, transaction_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {INVENTORY_COLUMNS}
            "#
        ))
        .bind(&input.company_nit)
        .bind(input.product_id)
        .bind(input.quantity)
        .bind(&hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "product_id"))?;

        tracing::info!(
            inventory_id = %row.id,
            company_nit = %row.company_nit,
            quantity = row.quantity,
            "Inventory created"
        );
        Ok(row.into())
    }

    /// Set the quantity of a record
    pub async fn update(&self, id: Uuid, input: UpdateInventoryInput) -> AppResult<InventoryRecord> {
        input.validate()?;
        self.write_quantity(id, QuantityChange::Set(input.quantity)).await
    }

    /// Apply a relative change; the result may not go below zero
    pub async fn adjust(&self, id: Uuid, input: AdjustInventoryInput) -> AppResult<InventoryRecord> {
        self.write_quantity(id, QuantityChange::Adjust(input.delta)).await
    }

    /// Delete a record
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory".to_string()));
        }
        Ok(())
    }

    /// Export a company's inventory as CSV
    pub async fn export_csv(&self, nit: &str) -> AppResult<InventoryExport> {
        let company = CompanyService::new(self.db.clone()).get(nit).await?;
        let rows = self.list(Some(nit)).await?;
        if rows.is_empty() {
            return Err(AppError::NotFound("Inventory".to_string()));
        }

        Ok(InventoryExport {
            filename: export_filename(&company.name),
            company_name: company.name,
            content: inventory_csv(&rows)?,
        })
    }

    /// Email a company's CSV export to a recipient
    pub async fn email_export(
        &self,
        nit: &str,
        input: ExportEmailInput,
        mailer: Option<&dyn Mailer>,
    ) -> AppResult<String> {
        let recipient = input
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| shared::validate_email(e).is_ok())
            .ok_or_else(|| AppError::Validation {
                field: "email".to_string(),
                message: "A valid recipient email is required".to_string(),
                message_es: "Se requiere un correo de destino válido".to_string(),
            })?
            .to_string();

        let mailer = mailer.ok_or_else(|| {
            AppError::ServiceUnavailable("Email delivery is not configured".to_string())
        })?;

        let export = self.export_csv(nit).await?;
        let message = EmailMessage {
            to: recipient.clone(),
            subject: format!("Inventory of {}", export.company_name),
            text_body: format!(
                "Attached is the inventory of {} generated on {}.",
                export.company_name,
                Utc::now().format("%d/%m/%Y %H:%M:%S")
            ),
            html_body: None,
            attachments: vec![EmailAttachment {
                filename: export.filename,
                content_type: "text/csv".to_string(),
                content: export.content.into_bytes(),
            }],
        };

        mailer.send(&message).await.map_err(|e| {
            tracing::warn!(error = %e, nit = %nit, "Inventory export email failed");
            AppError::ExternalService(format!("Email delivery failed: {}", e))
        })?;

        tracing::info!(nit = %nit, recipient = %recipient, "Inventory export emailed");
        Ok(recipient)
    }

    async fn product_code(&self, product_id: Uuid) -> AppResult<String> {
        sqlx::query_scalar::<_, String>("SELECT code FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Write a new quantity while holding the row lock, so concurrent
    /// adjustments apply in sequence
    async fn write_quantity(&self, id: Uuid, change: QuantityChange) -> AppResult<InventoryRecord> {
        let mut tx = self.db.begin().await?;

        let (current, company_nit, product_code) =
            sqlx::query_as::<_, (i32, String, String)>(LOCK_INVENTORY_ROW)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Inventory".to_string()))?;

        let quantity = change.apply(current)?;
        let hash = transaction_hash(&company_nit, &product_code, quantity, Utc::now());

        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            r#"
            UPDATE inventory
            SET quantity = $1, transaction_hash = $2, last_update_date = NOW()
            WHERE id = $3
            RETURNING {INVENTORY_COLUMNS}
            "#
        ))
        .bind(quantity)
        .bind(&hash)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }
}

const LOCK_INVENTORY_ROW: &str = r#"
    SELECT i.quantity, i.company_nit, p.code
    FROM inventory i
    JOIN products p ON p.id = i.product_id
    WHERE i.id = $1
    FOR UPDATE OF i
"#;

/// Quantity write requested by a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// Replace the quantity
    Set(i32),
    /// Add a signed delta to the locked quantity
    Adjust(i32),
}

impl QuantityChange {
    /// Quantity to store given the current (locked) value
    pub fn apply(self, current: i32) -> AppResult<i32> {
        match self {
            QuantityChange::Set(quantity) => Ok(quantity),
            QuantityChange::Adjust(delta) => apply_delta(current, delta),
        }
    }
}

/// `0x`-prefixed SHA-256 over the canonical (key-sorted) JSON of a transaction
pub fn transaction_hash(
    company_nit: &str,
    product_code: &str,
    quantity: i32,
    timestamp: DateTime<Utc>,
) -> String {
    // serde_json::Map keeps keys sorted
    let payload = serde_json::json!({
        "company_nit": company_nit,
        "product_code": product_code,
        "quantity": quantity.to_string(),
        "timestamp": timestamp.to_rfc3339(),
        "type": "inventory_transaction",
    });

    format!("0x{:x}", Sha256::digest(payload.to_string().as_bytes()))
}

/// New quantity after a relative change
pub fn apply_delta(quantity: i32, delta: i32) -> AppResult<i32> {
    match quantity.checked_add(delta) {
        Some(q) if q >= 0 => Ok(q),
        _ => Err(AppError::InsufficientInventory(format!(
            "cannot apply {} to a quantity of {}",
            delta, quantity
        ))),
    }
}

fn export_filename(company_name: &str) -> String {
    format!("inventory_{}.csv", company_name.trim().replace(' ', "_"))
}

/// Render inventory rows as CSV
pub fn inventory_csv(rows: &[InventoryDetail]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(ExportRow {
            code: &row.product_code,
            product: &row.product_name,
            quantity: row.quantity,
            price_usd: row.price_usd,
            price_eur: row.price_eur,
            price_cop: row.price_cop,
        })
        .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn detail(code: &str, name: &str, quantity: i32) -> InventoryDetail {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        InventoryDetail {
            id: Uuid::new_v4(),
            company_nit: "900123456".into(),
            company_name: "Acme SAS".into(),
            product_id: Uuid::new_v4(),
            product_code: code.into(),
            product_name: name.into(),
            price_usd: Decimal::new(1000, 2),
            price_eur: Decimal::new(850, 2),
            price_cop: Decimal::new(3_900_000, 2),
            quantity,
            ingress_date: now,
            last_update_date: now,
            transaction_hash: None,
        }
    }

    #[test]
    fn hash_is_prefixed_sha256_hex() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let hash = transaction_hash("900123456", "P-001", 5, ts);
        assert!(hash.starts_with("0x"));
        assert_eq!(hash.len(), 66);
        assert!(hash[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_is_deterministic_for_same_transaction() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            transaction_hash("900123456", "P-001", 5, ts),
            transaction_hash("900123456", "P-001", 5, ts)
        );
        assert_ne!(
            transaction_hash("900123456", "P-001", 5, ts),
            transaction_hash("900123456", "P-001", 6, ts)
        );
    }

    #[test]
    fn delta_cannot_go_negative() {
        assert_eq!(apply_delta(10, -4).unwrap(), 6);
        assert_eq!(apply_delta(3, -3).unwrap(), 0);
        assert!(matches!(apply_delta(3, -4), Err(AppError::InsufficientInventory(_))));
        assert!(matches!(apply_delta(i32::MAX, 1), Err(AppError::InsufficientInventory(_))));
    }

    #[test]
    fn adjustment_applies_to_locked_quantity() {
        // two adjustments of -3 against 5 units: the second sees the first's result
        let first = QuantityChange::Adjust(-3).apply(5).unwrap();
        assert_eq!(first, 2);
        assert!(matches!(
            QuantityChange::Adjust(-3).apply(first),
            Err(AppError::InsufficientInventory(_))
        ));
        assert_eq!(QuantityChange::Set(40).apply(first).unwrap(), 40);
    }

    #[test]
    fn quantity_read_takes_row_lock() {
        assert!(LOCK_INVENTORY_ROW.contains("FOR UPDATE OF i"));
    }

    #[test]
    fn csv_has_header_and_rows() {
        let csv = inventory_csv(&[detail("P-001", "Laptop", 4), detail("P-002", "Mouse, wireless", 12)])
            .unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("code,product,quantity,price_usd,price_eur,price_cop")
        );
        assert_eq!(lines.next(), Some("P-001,Laptop,4,10.00,8.50,39000.00"));
        assert_eq!(lines.next(), Some("P-002,\"Mouse, wireless\",12,10.00,8.50,39000.00"));
    }

    #[test]
    fn export_filename_replaces_spaces() {
        assert_eq!(export_filename("Acme SAS"), "inventory_Acme_SAS.csv");
    }
}
