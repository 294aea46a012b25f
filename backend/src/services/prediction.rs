//! Stock-risk prediction pipeline
//!
//! Snapshots are classified locally, optionally enriched by the generative
//! service, reconciled against the classifier and finally handed to the
//! alert dispatcher. The external call never decides on its own: any failure
//! degrades to the classifier baseline.

use std::sync::Arc;

use serde::Serialize;
use shared::{
    decode_predictions, reconcile, AdministratorContact, InventorySnapshot, PredictionSource,
    ServiceFailure, StockAlert,
};
use sqlx::PgPool;

use crate::error::AppResult;
use crate::external::TextGenerator;
use crate::services::alerting::{AlertDispatcher, DispatchReport};
use crate::services::InventoryService;

/// Shown when there is nothing to analyze
pub const EMPTY_INVENTORY_MESSAGE: &str = "No inventory available to analyze";

/// Result of a prediction request
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub alerts: Vec<StockAlert>,
    pub total_alerts: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip)]
    pub dispatch: DispatchReport,
}

impl PredictionReport {
    fn empty() -> Self {
        Self {
            alerts: Vec::new(),
            total_alerts: 0,
            notice: None,
            message: Some(EMPTY_INVENTORY_MESSAGE.to_string()),
            dispatch: DispatchReport::default(),
        }
    }
}

/// Classify, enrich, reconcile and dispatch
#[derive(Clone)]
pub struct StockRiskPipeline {
    generator: Option<Arc<dyn TextGenerator>>,
    dispatcher: AlertDispatcher,
}

impl StockRiskPipeline {
    /// Create a new pipeline
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, dispatcher: AlertDispatcher) -> Self {
        Self {
            generator,
            dispatcher,
        }
    }

    /// Run one prediction cycle over the given snapshots
    pub async fn run(
        &self,
        snapshots: &[InventorySnapshot],
        admins: &[AdministratorContact],
    ) -> PredictionReport {
        if snapshots.is_empty() {
            return PredictionReport::empty();
        }

        let source = self.predict(snapshots).await;
        let alerts = reconcile(snapshots, &source);
        let dispatch = self.dispatcher.dispatch(&alerts, admins).await;

        PredictionReport {
            total_alerts: alerts.len(),
            alerts,
            notice: source.advisory().map(str::to_string),
            message: None,
            dispatch,
        }
    }

    async fn predict(&self, snapshots: &[InventorySnapshot]) -> PredictionSource {
        let Some(generator) = self.generator.as_ref() else {
            return PredictionSource::Unavailable(ServiceFailure::NotConfigured);
        };

        match generator.generate(&prediction_prompt(snapshots)).await {
            Ok(text) => {
                let source = decode_predictions(&text);
                if let PredictionSource::Malformed { reason } = &source {
                    tracing::warn!(reason = %reason, "Prediction response was malformed, using baseline");
                }
                source
            }
            Err(e) => {
                let failure = e.failure();
                tracing::warn!(
                    error = %e,
                    category = ?failure,
                    "Prediction request failed, using baseline"
                );
                PredictionSource::Unavailable(failure)
            }
        }
    }
}

#[derive(Serialize)]
struct PromptItem<'a> {
    producto: &'a str,
    cantidad_actual: u32,
    empresa: &'a str,
    fecha_ingreso: String,
    fecha_actualizacion: String,
}

/// Prompt asking for one prediction per inventory row
pub fn prediction_prompt(snapshots: &[InventorySnapshot]) -> String {
    let items: Vec<PromptItem<'_>> = snapshots
        .iter()
        .map(|s| PromptItem {
            producto: &s.product_name,
            cantidad_actual: s.quantity,
            empresa: &s.company_name,
            fecha_ingreso: s.ingress_date.format("%Y-%m-%d").to_string(),
            fecha_actualizacion: s.last_update_date.format("%Y-%m-%d").to_string(),
        })
        .collect();
    let data = serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"You are an expert in inventory analysis and stock prediction. You MUST detect products with low stock (<= 10 units) and raise alerts. Always answer with valid JSON.

Analyze the following product inventory and predict when each product will run out of stock.

Inventory data:
{data}

RULES:
1. Quantity 0: nivel_riesgo = "HIGH", dias_hasta_quiebre = 0, alerta mentions OUT OF STOCK.
2. Quantity 1-3: nivel_riesgo = "HIGH", dias_hasta_quiebre = 1-2, alerta mentions CRITICAL stock.
3. Quantity 4-5: nivel_riesgo = "HIGH", dias_hasta_quiebre = 3, alerta mentions VERY LOW stock.
4. Quantity 6-10: nivel_riesgo = "MEDIUM", dias_hasta_quiebre = 5-7, alerta mentions LOW stock.
5. Quantity 11-20: nivel_riesgo = "LOW", dias_hasta_quiebre = 10-15.
6. Quantity > 20: nivel_riesgo = "NONE", dias_hasta_quiebre = null.

Every product with quantity <= 10 MUST have nivel_riesgo other than "NONE" and a numeric dias_hasta_quiebre.

Answer ONLY with a JSON array of objects in this format:
{{
    "producto": "product name",
    "empresa": "company name",
    "cantidad_actual": number,
    "dias_hasta_quiebre": number or null,
    "alerta": "descriptive alert message",
    "nivel_riesgo": "HIGH", "MEDIUM", "LOW" or "NONE"
}}

Answer ONLY with the JSON, without additional text."#
    )
}

/// Load snapshots and administrators, then run the pipeline
pub async fn predict_for_inventory(
    db: &PgPool,
    pipeline: &StockRiskPipeline,
    company: Option<&str>,
) -> AppResult<PredictionReport> {
    let snapshots = InventoryService::new(db.clone()).snapshots(company).await?;
    if snapshots.is_empty() {
        return Ok(PredictionReport::empty());
    }

    let admins = administrator_contacts(db).await?;
    let report = pipeline.run(&snapshots, &admins).await;

    tracing::info!(
        snapshots = snapshots.len(),
        alerts = report.total_alerts,
        emails_failed = report.dispatch.failed,
        "Stock predictions computed"
    );
    Ok(report)
}

/// Emails of active administrators
pub async fn administrator_contacts(db: &PgPool) -> AppResult<Vec<AdministratorContact>> {
    let emails = sqlx::query_scalar::<_, String>(
        r#"
        SELECT email FROM users
        WHERE role = 'administrator' AND is_active = true AND email <> ''
        ORDER BY email
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(emails
        .into_iter()
        .map(|email| AdministratorContact { email })
        .collect())
}
