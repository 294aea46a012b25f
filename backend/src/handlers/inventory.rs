//! HTTP handlers for inventory, export and prediction endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{CreateInventoryInput, InventoryDetail, InventoryRecord, UpdateInventoryInput};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::inventory::{AdjustInventoryInput, ExportEmailInput};
use crate::services::prediction::predict_for_inventory;
use crate::services::{AlertDispatcher, InventoryService, PredictionReport, StockRiskPipeline};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct InventoryQuery {
    pub company: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportEmailResponse {
    pub message: String,
}

/// List inventory, optionally for one company
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> AppResult<Json<Vec<InventoryDetail>>> {
    let service = InventoryService::new(state.db);
    Ok(Json(service.list(query.company.as_deref()).await?))
}

/// Get one inventory record
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<InventoryDetail>> {
    let service = InventoryService::new(state.db);
    Ok(Json(service.get(id).await?))
}

/// Inventory of one company
pub async fn company_inventory(
    State(state): State<AppState>,
    Path(nit): Path<String>,
) -> AppResult<Json<Vec<InventoryDetail>>> {
    let service = InventoryService::new(state.db);
    Ok(Json(service.by_company(&nit).await?))
}

/// Register stock
pub async fn create_inventory(
    State(state): State<AppState>,
    Json(input): Json<CreateInventoryInput>,
) -> AppResult<(StatusCode, Json<InventoryRecord>)> {
    let service = InventoryService::new(state.db);
    let record = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Set the quantity of a record
pub async fn update_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateInventoryInput>,
) -> AppResult<Json<InventoryRecord>> {
    let service = InventoryService::new(state.db);
    Ok(Json(service.update(id, input).await?))
}

/// Apply a relative quantity change
pub async fn adjust_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<AdjustInventoryInput>,
) -> AppResult<Json<InventoryRecord>> {
    let service = InventoryService::new(state.db);
    Ok(Json(service.adjust(id, input).await?))
}

/// Delete a record
pub async fn delete_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = InventoryService::new(state.db);
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Download a company's inventory as CSV
pub async fn export_inventory(
    State(state): State<AppState>,
    Path(nit): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = InventoryService::new(state.db);
    let export = service.export_csv(&nit).await?;
    let disposition = format!("attachment; filename=\"{}\"", export.filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.content,
    ))
}

/// Email a company's inventory CSV
pub async fn email_inventory_export(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(nit): Path<String>,
    Json(input): Json<ExportEmailInput>,
) -> AppResult<Json<ExportEmailResponse>> {
    let service = InventoryService::new(state.db.clone());
    let recipient = service
        .email_export(&nit, input, state.mailer.as_deref())
        .await?;

    tracing::info!(user_id = %current_user.0.user_id, nit = %nit, "Inventory export sent");
    Ok(Json(ExportEmailResponse {
        message: format!("Inventory sent to {}", recipient),
    }))
}

/// Stock-risk predictions with alert emails for HIGH items
pub async fn inventory_predictions(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> AppResult<Json<PredictionReport>> {
    let pipeline = StockRiskPipeline::new(
        state.generator.clone(),
        AlertDispatcher::new(state.mailer.clone()),
    );
    let report = predict_for_inventory(&state.db, &pipeline, query.company.as_deref()).await?;
    Ok(Json(report))
}
